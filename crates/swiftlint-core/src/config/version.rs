//! `swiftlint_version` constraints.

use crate::issue::Issue;
use semver::Version;

/// Version of this tool.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Checks a constraint such as `>=0.54.0` against `running`.
///
/// A bare version requires an exact match.
///
/// # Errors
///
/// Returns [`Issue::MalformedVersionConstraint`] for constraints that do not
/// parse and [`Issue::VersionMismatch`] when `running` does not satisfy them.
pub fn check_version_constraint(constraint: &str, running: &Version) -> Result<(), Issue> {
    let trimmed = constraint.trim();
    let (relation, version_text): (&'static str, &str) = [
        (">=", "at least"),
        ("<=", "at most"),
        (">", "greater than"),
        ("<", "less than"),
        ("=", "exactly"),
    ]
    .iter()
    .find_map(|(prefix, relation)| trimmed.strip_prefix(prefix).map(|rest| (*relation, rest)))
    .unwrap_or(("exactly", trimmed));

    let required = Version::parse(version_text.trim()).map_err(|_| {
        Issue::MalformedVersionConstraint {
            value: constraint.to_string(),
        }
    })?;

    let satisfied = match relation {
        "at least" => running >= &required,
        "at most" => running <= &required,
        "greater than" => running > &required,
        "less than" => running < &required,
        _ => running == &required,
    };

    if satisfied {
        Ok(())
    } else {
        Err(Issue::VersionMismatch {
            running: running.to_string(),
            relation,
            required: required.to_string(),
        })
    }
}

/// Checks a constraint against [`CURRENT_VERSION`].
///
/// # Errors
///
/// See [`check_version_constraint`].
pub fn check_current_version(constraint: &str) -> Result<(), Issue> {
    let running = Version::parse(CURRENT_VERSION).map_err(|_| Issue::MalformedVersionConstraint {
        value: CURRENT_VERSION.to_string(),
    })?;
    check_version_constraint(constraint, &running)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(">=0.50.0", true)]
    #[case(">=0.55.0", false)]
    #[case(">0.54.0", false)]
    #[case("<0.55.0", true)]
    #[case("<=0.53.9", false)]
    #[case("0.54.0", true)]
    #[case("=0.54.1", false)]
    fn test_constraints(#[case] constraint: &str, #[case] satisfied: bool) {
        let running = Version::new(0, 54, 0);
        assert_eq!(check_version_constraint(constraint, &running).is_ok(), satisfied);
    }

    #[test]
    fn test_malformed_constraint() {
        let running = Version::new(0, 54, 0);
        assert!(matches!(
            check_version_constraint(">= banana", &running),
            Err(Issue::MalformedVersionConstraint { .. })
        ));
    }

    #[test]
    fn test_mismatch_message() {
        let running = Version::new(0, 54, 0);
        let error = check_version_constraint(">=1.0.0", &running).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Currently running SwiftLint 0.54.0 but configuration specified at least 1.0.0."
        );
    }
}
