//! Suppression regions derived from inline commands.

use crate::command::{Action, Command, ALL_RULES};
use crate::rule::RuleDescription;
use crate::types::Location;
use std::collections::BTreeSet;
use std::path::Path;

/// A contiguous source interval with the rules disabled throughout it.
///
/// Both ends are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// First location covered.
    pub start: Location,
    /// Last location covered.
    pub end: Location,
    /// Identifiers disabled in this region, as written in the commands.
    pub disabled_rule_identifiers: BTreeSet<String>,
}

impl Region {
    /// Returns `true` if `location` lies within the region.
    ///
    /// Only line and character are compared.
    #[must_use]
    pub fn contains(&self, location: &Location) -> bool {
        let position = location.position();
        self.start.position() <= position && position <= self.end.position()
    }

    /// Returns `true` if any of `identifiers`, or `all`, is disabled here.
    #[must_use]
    pub fn is_identifier_disabled<'a>(&self, identifiers: impl IntoIterator<Item = &'a str>) -> bool {
        self.disabled_rule_identifiers.contains(ALL_RULES)
            || identifiers
                .into_iter()
                .any(|id| self.disabled_rule_identifiers.contains(id))
    }

    /// Returns `true` if the rule is disabled under its identifier or an alias.
    #[must_use]
    pub fn is_rule_disabled(&self, description: &RuleDescription) -> bool {
        self.is_identifier_disabled(description.all_identifiers())
    }

    /// Inverse of [`Region::is_rule_disabled`].
    #[must_use]
    pub fn is_rule_enabled(&self, description: &RuleDescription) -> bool {
        !self.is_rule_disabled(description)
    }

    /// Deprecated aliases of the rule that this region disables it through.
    #[must_use]
    pub fn deprecated_aliases_disabling(&self, description: &RuleDescription) -> Vec<&'static str> {
        description
            .deprecated_aliases
            .iter()
            .copied()
            .filter(|alias| self.disabled_rule_identifiers.contains(*alias))
            .collect()
    }
}

/// Builds the regions of a file from its commands.
///
/// `commands` must already be expanded. They are sorted by position and
/// swept left to right while tracking the set of disabled identifiers. The
/// result starts with an all-enabled region ahead of the first command, so
/// every location of the file is covered by exactly one region.
#[must_use]
pub fn build_regions(file: Option<&Path>, commands: &[Command]) -> Vec<Region> {
    let mut sorted: Vec<&Command> = commands.iter().filter(|c| c.is_valid()).collect();
    sorted.sort_by_key(|c| c.position());

    let file = file.map(Path::to_path_buf);
    let mut regions: Vec<Region> = Vec::new();

    let leading_start = Location::from_parts(file.clone(), None, None);
    let leading_end = end_of(file.as_deref(), sorted.first().copied());
    if leading_start.position() <= leading_end.position() {
        regions.push(Region {
            start: leading_start,
            end: leading_end,
            disabled_rule_identifiers: BTreeSet::new(),
        });
    }

    let mut disabled: BTreeSet<String> = BTreeSet::new();
    for (index, command) in sorted.iter().enumerate() {
        match command.action {
            Action::Disable => disabled.extend(command.rule_identifiers.iter().cloned()),
            Action::Enable => {
                if command.addresses_all_rules() {
                    disabled.clear();
                } else {
                    for id in &command.rule_identifiers {
                        disabled.remove(id);
                    }
                }
            }
            Action::Invalid => {}
        }

        let start = Location::from_parts(file.clone(), Some(command.line), command.character);
        let end = end_of(file.as_deref(), sorted.get(index + 1).copied());
        if start.position() > end.position() {
            continue;
        }

        if let Some(existing) = regions
            .iter_mut()
            .find(|r| r.start == start && r.end == end)
        {
            existing
                .disabled_rule_identifiers
                .extend(disabled.iter().cloned());
        } else {
            regions.push(Region {
                start,
                end,
                disabled_rule_identifiers: disabled.clone(),
            });
        }
    }

    regions
}

/// Builds regions considering only commands that mention one of `identifiers`.
#[must_use]
pub fn build_regions_restricted(
    file: Option<&Path>,
    commands: &[Command],
    identifiers: &BTreeSet<String>,
) -> Vec<Region> {
    let restricted: Vec<Command> = commands
        .iter()
        .filter(|c| c.rule_identifiers.iter().any(|id| identifiers.contains(id)))
        .cloned()
        .collect();
    build_regions(file, &restricted)
}

/// The last location before `next` takes effect.
fn end_of(file: Option<&Path>, next: Option<&Command>) -> Location {
    let file = file.map(Path::to_path_buf);
    let Some(next) = next else {
        return Location::from_parts(file, Some(usize::MAX), Some(usize::MAX));
    };
    match next.character {
        Some(character) if character > 0 => {
            Location::from_parts(file, Some(next.line), Some(character - 1))
        }
        Some(_) => Location::from_parts(file, Some(next.line), None),
        None if next.line == 0 => Location::from_parts(file, None, Some(usize::MAX)),
        None => Location::from_parts(file, Some(next.line - 1), Some(usize::MAX)),
    }
}
