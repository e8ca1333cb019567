//! Inline `swiftlint:` commands.
//!
//! Supports directives like:
//! ```text
//! // swiftlint:disable force_try line_length - reason for disabling
//! // swiftlint:enable:next todo
//! ```

use std::collections::BTreeSet;
use std::fmt;

/// Prefix that marks a comment as an inline command.
pub const COMMAND_PREFIX: &str = "swiftlint:";

/// Identifier that addresses every rule at once.
pub const ALL_RULES: &str = "all";

const TRAILING_COMMENT_DELIMITER: &str = " - ";

/// What a command does to the rules it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Re-enables rules.
    Enable,
    /// Disables rules.
    Disable,
    /// The action token was not recognized.
    Invalid,
}

impl Action {
    fn parse(value: &str) -> Self {
        match value {
            "enable" => Self::Enable,
            "disable" => Self::Disable,
            _ => Self::Invalid,
        }
    }

    /// The opposite action. `Invalid` stays invalid.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::Enable => Self::Disable,
            Self::Disable => Self::Enable,
            Self::Invalid => Self::Invalid,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enable => write!(f, "enable"),
            Self::Disable => write!(f, "disable"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// Restricts a command to a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// The line before the command.
    Previous,
    /// The line of the command.
    This,
    /// The line after the command.
    Next,
    /// The modifier token was not recognized.
    Invalid,
}

impl Modifier {
    fn parse(value: &str) -> Self {
        match value {
            "previous" => Self::Previous,
            "this" => Self::This,
            "next" => Self::Next,
            _ => Self::Invalid,
        }
    }
}

/// A parsed inline command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    /// Enable or disable.
    pub action: Action,
    /// Rule identifiers named by the command, as written.
    pub rule_identifiers: BTreeSet<String>,
    /// Line the command applies from (1-indexed).
    pub line: usize,
    /// Character the command applies from. `None` means the start of the line.
    pub character: Option<usize>,
    /// Optional single-line restriction.
    pub modifier: Option<Modifier>,
    /// Text following the ` - ` delimiter.
    pub trailing_comment: Option<String>,
}

impl Command {
    /// Creates an unmodified command.
    #[must_use]
    pub fn new<I, S>(action: Action, rule_identifiers: I, line: usize, character: Option<usize>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action,
            rule_identifiers: rule_identifiers.into_iter().map(Into::into).collect(),
            line,
            character,
            modifier: None,
            trailing_comment: None,
        }
    }

    /// Sets the modifier.
    #[must_use]
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    /// Parses the text of a command.
    ///
    /// `text` may still carry the `swiftlint:` prefix. `line` and
    /// `character` locate the end of the command in the file.
    #[must_use]
    pub fn parse(text: &str, line: usize, character: usize) -> Self {
        let text = text.strip_prefix(COMMAND_PREFIX).unwrap_or(text);
        let (head, rest) = text.split_once(' ').unwrap_or((text, ""));
        let (action_text, modifier_text) = match head.split_once(':') {
            Some((action, modifier)) => (action, Some(modifier)),
            None => (head, None),
        };

        let action = Action::parse(action_text);
        let modifier = modifier_text.map(Modifier::parse);

        // The delimiter search includes the space that separates the action
        // from the identifiers, so `disable - reason` has no identifiers.
        let rest = format!(" {rest}");
        let (rule_text, trailing_comment) = match rest.split_once(TRAILING_COMMENT_DELIMITER) {
            Some((rules, comment)) => (rules.to_string(), Some(comment.trim().to_string())),
            None => (rest.clone(), None),
        };

        let rule_identifiers = rule_text
            .split_whitespace()
            .filter(|token| *token != "*/")
            .map(str::to_string)
            .collect();

        Self {
            action,
            rule_identifiers,
            line,
            character: Some(character),
            modifier,
            trailing_comment,
        }
    }

    /// Returns `true` if the command can take part in region building.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.action != Action::Invalid
            && self.modifier != Some(Modifier::Invalid)
            && !self.rule_identifiers.is_empty()
    }

    /// Returns `true` if the command names `all`.
    #[must_use]
    pub fn addresses_all_rules(&self) -> bool {
        self.rule_identifiers.contains(ALL_RULES)
    }

    /// Expands a modified command into unmodified ones.
    ///
    /// An unmodified command expands to itself. A modified command expands
    /// to its action at the start of the target line followed by the
    /// inverse action at the end of that line. An invalid modifier expands
    /// to nothing.
    #[must_use]
    pub fn expand(&self) -> Vec<Command> {
        let Some(modifier) = self.modifier else {
            return vec![self.clone()];
        };

        let line = match modifier {
            Modifier::Previous => self.line.saturating_sub(1),
            Modifier::This => self.line,
            Modifier::Next => self.line + 1,
            Modifier::Invalid => return Vec::new(),
        };

        vec![
            Command {
                action: self.action,
                rule_identifiers: self.rule_identifiers.clone(),
                line,
                character: None,
                modifier: None,
                trailing_comment: self.trailing_comment.clone(),
            },
            Command {
                action: self.action.inverse(),
                rule_identifiers: self.rule_identifiers.clone(),
                line,
                character: Some(usize::MAX),
                modifier: None,
                trailing_comment: self.trailing_comment.clone(),
            },
        ]
    }

    /// Sort key placing commands in file order.
    #[must_use]
    pub fn position(&self) -> (usize, Option<usize>) {
        (self.line, self.character)
    }
}
