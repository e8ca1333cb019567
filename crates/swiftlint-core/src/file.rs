//! Source files as seen by rules.

use crate::command::{Command, COMMAND_PREFIX};
use crate::parser::{SwiftTokenizer, Token, TokenKind, Tokenizer};
use crate::region::{build_regions, build_regions_restricted, Region};
use crate::types::Location;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// One line of a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Line number (1-indexed).
    pub index: usize,
    /// Text of the line without its terminator.
    pub content: String,
    /// Byte offset of the first byte of the line.
    pub offset: usize,
}

/// A file to lint.
///
/// Tokens, commands and regions are computed lazily and cached for the
/// lifetime of the value.
pub struct SourceFile {
    path: Option<PathBuf>,
    contents: String,
    lines: Vec<Line>,
    tokenizer: Arc<dyn Tokenizer>,
    tokens: OnceLock<Option<Vec<Token>>>,
    commands: OnceLock<Vec<Command>>,
    regions: OnceLock<Vec<Region>>,
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("lines", &self.lines.len())
            .finish_non_exhaustive()
    }
}

impl SourceFile {
    /// Creates a file from contents.
    #[must_use]
    pub fn new(path: Option<PathBuf>, contents: impl Into<String>) -> Self {
        Self::with_tokenizer(path, contents, Arc::new(SwiftTokenizer))
    }

    /// Creates a file without a path.
    #[must_use]
    pub fn virtual_file(contents: impl Into<String>) -> Self {
        Self::new(None, contents)
    }

    /// Creates a file that uses a specific tokenizer.
    #[must_use]
    pub fn with_tokenizer(
        path: Option<PathBuf>,
        contents: impl Into<String>,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Self {
        let contents = contents.into();
        let lines = split_lines(&contents);
        Self {
            path,
            contents,
            lines,
            tokenizer,
            tokens: OnceLock::new(),
            commands: OnceLock::new(),
            regions: OnceLock::new(),
        }
    }

    /// Reads a file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read as UTF-8.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::new(Some(path.to_path_buf()), contents))
    }

    /// Path of the file, if it has one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Full text of the file.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Lines of the file.
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Text of a line (1-indexed).
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(|l| l.content.as_str())
    }

    /// Returns `true` for files without anything to lint.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty() || self.contents == "\n"
    }

    /// Tokens of the file, empty if tokenizing failed.
    pub fn tokens(&self) -> &[Token] {
        self.tokens_or_failure().map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if the tokenizer rejected the file.
    pub fn parser_failed(&self) -> bool {
        self.tokens_or_failure().is_none()
    }

    fn tokens_or_failure(&self) -> Option<&Vec<Token>> {
        self.tokens
            .get_or_init(|| match self.tokenizer.tokenize(&self.contents) {
                Ok(tokens) => Some(tokens),
                Err(error) => {
                    tracing::debug!("Tokenizing {:?} failed: {}", self.path, error);
                    None
                }
            })
            .as_ref()
    }

    /// Returns `true` if the byte offset lies in a comment or string literal.
    pub fn is_in_comment_or_string(&self, offset: usize) -> bool {
        let tokens = self.tokens();
        let index = tokens.partition_point(|t| t.end() <= offset);
        tokens.get(index).is_some_and(|t| t.contains(offset))
    }

    /// Returns `true` if the byte offset lies in a comment.
    pub fn is_in_comment(&self, offset: usize) -> bool {
        let tokens = self.tokens();
        let index = tokens.partition_point(|t| t.end() <= offset);
        tokens
            .get(index)
            .is_some_and(|t| t.kind == TokenKind::Comment && t.contains(offset))
    }

    /// Converts a byte offset into a 1-indexed line and character.
    #[must_use]
    pub fn line_and_character(&self, offset: usize) -> (usize, usize) {
        let index = self.lines.partition_point(|l| l.offset <= offset).max(1) - 1;
        match self.lines.get(index) {
            Some(line) => {
                let column = offset.saturating_sub(line.offset).min(line.content.len());
                let character = line
                    .content
                    .get(..column)
                    .map_or(column, |prefix| prefix.chars().count());
                (line.index, character + 1)
            }
            None => (1, 1),
        }
    }

    /// Location of a byte offset in this file.
    #[must_use]
    pub fn location(&self, offset: usize) -> Location {
        let (line, character) = self.line_and_character(offset);
        Location::from_parts(self.path.clone(), Some(line), Some(character))
    }

    /// Inline commands found in comments, as written and unexpanded.
    ///
    /// Includes invalid commands.
    pub fn raw_commands(&self) -> &[Command] {
        self.commands.get_or_init(|| self.parse_commands())
    }

    /// Valid commands with modifiers expanded, in file order.
    pub fn commands(&self) -> Vec<Command> {
        let mut commands: Vec<Command> = self
            .raw_commands()
            .iter()
            .filter(|c| c.is_valid())
            .flat_map(Command::expand)
            .collect();
        commands.sort_by_key(Command::position);
        commands
    }

    /// Commands that could not be understood.
    pub fn invalid_commands(&self) -> Vec<&Command> {
        self.raw_commands().iter().filter(|c| !c.is_valid()).collect()
    }

    /// Suppression regions of this file.
    pub fn regions(&self) -> &[Region] {
        self.regions
            .get_or_init(|| build_regions(self.path(), &self.commands()))
    }

    /// Regions built only from commands naming one of `identifiers`.
    pub fn regions_restricted_to(&self, identifiers: &BTreeSet<String>) -> Vec<Region> {
        build_regions_restricted(self.path(), &self.commands(), identifiers)
    }

    /// Comment tokens to read commands from.
    ///
    /// Falls back to the `//` tail of every line when the tokenizer
    /// rejected the file, so suppressions survive syntax errors.
    fn command_comments(&self) -> Vec<Token> {
        if !self.parser_failed() {
            return self
                .tokens()
                .iter()
                .filter(|t| t.kind == TokenKind::Comment)
                .cloned()
                .collect();
        }
        self.lines
            .iter()
            .filter_map(|line| {
                let start = line.content.find("//")?;
                Some(Token {
                    kind: TokenKind::Comment,
                    offset: line.offset + start,
                    length: line.content.len() - start,
                })
            })
            .collect()
    }

    fn parse_commands(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        for token in &self.command_comments() {
            let text = &self.contents[token.offset..token.end()];
            let mut line_start = 0;
            for segment in text.split('\n') {
                if let Some(found) = segment.find(COMMAND_PREFIX) {
                    let command_offset = token.offset + line_start + found;
                    let end_offset = token.offset + line_start + segment.len();
                    let (line, end_character) = self.line_and_character(end_offset);
                    let command_text = &segment[found..];
                    commands.push(Command::parse(command_text, line, end_character));
                    tracing::trace!("Command at byte {}: {}", command_offset, command_text);
                }
                line_start += segment.len() + 1;
            }
        }
        commands
    }
}

fn split_lines(contents: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for (i, raw) in contents.split_inclusive('\n').enumerate() {
        let content = raw.strip_suffix('\n').unwrap_or(raw);
        let content = content.strip_suffix('\r').unwrap_or(content);
        lines.push(Line {
            index: i + 1,
            content: content.to_string(),
            offset,
        });
        offset += raw.len();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Action, Modifier};
    use crate::parser::ParseError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_files() {
        assert!(SourceFile::virtual_file("").is_empty());
        assert!(SourceFile::virtual_file("\n").is_empty());
        assert!(!SourceFile::virtual_file("let a = 1\n").is_empty());
    }

    #[test]
    fn test_lines() {
        let file = SourceFile::virtual_file("a\r\nbc\nd");
        assert_eq!(file.lines().len(), 3);
        assert_eq!(file.line(1), Some("a"));
        assert_eq!(file.line(2), Some("bc"));
        assert_eq!(file.line(3), Some("d"));
        assert_eq!(file.line(0), None);
        assert_eq!(file.lines()[2].offset, 6);
    }

    #[test]
    fn test_line_and_character() {
        let file = SourceFile::virtual_file("let a = 1\nlet b = 2\n");
        assert_eq!(file.line_and_character(0), (1, 1));
        assert_eq!(file.line_and_character(14), (2, 5));
    }

    #[test]
    fn test_command_character_points_past_command() {
        let file = SourceFile::virtual_file("// swiftlint:disable rule_id\n");
        assert_eq!(
            file.raw_commands(),
            &[Command::new(Action::Disable, ["rule_id"], 1, Some(29))]
        );

        let file = SourceFile::virtual_file("// swiftlint:enable rule_id\n");
        assert_eq!(file.raw_commands()[0].character, Some(28));
    }

    #[test]
    fn test_trailing_command_is_expanded() {
        let file = SourceFile::virtual_file("let x = try! foo() // swiftlint:disable:this force_try\n");
        let raw = &file.raw_commands()[0];
        assert_eq!(raw.modifier, Some(Modifier::This));
        assert_eq!(
            file.commands(),
            vec![
                Command::new(Action::Disable, ["force_try"], 1, None),
                Command::new(Action::Enable, ["force_try"], 1, Some(usize::MAX)),
            ]
        );
    }

    #[test]
    fn test_commands_in_strings_are_ignored() {
        let file = SourceFile::virtual_file("let s = \"// swiftlint:disable all\"\n");
        assert!(file.raw_commands().is_empty());
    }

    #[test]
    fn test_block_comment_command() {
        let file = SourceFile::virtual_file("/* swiftlint:disable force_cast */\nlet a = b as! C\n");
        let commands = file.raw_commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].is_valid());
        assert!(commands[0].rule_identifiers.contains("force_cast"));
    }

    #[test]
    fn test_invalid_commands() {
        let file = SourceFile::virtual_file("// swiftlint:disbale force_try\n");
        assert_eq!(file.invalid_commands().len(), 1);
        assert!(file.commands().is_empty());
    }

    #[test]
    fn test_comment_and_string_lookup() {
        let source = "let a = \"x\" // y\n";
        let file = SourceFile::virtual_file(source);
        assert!(file.is_in_comment_or_string(source.find('x').unwrap()));
        assert!(file.is_in_comment(source.find('y').unwrap()));
        assert!(!file.is_in_comment_or_string(0));
    }

    struct FailingTokenizer;

    impl Tokenizer for FailingTokenizer {
        fn tokenize(&self, _contents: &str) -> Result<Vec<Token>, ParseError> {
            Err(ParseError {
                message: "boom".to_string(),
                offset: 0,
            })
        }
    }

    #[test]
    fn test_parser_failure() {
        let file = SourceFile::with_tokenizer(None, "let a = 1", Arc::new(FailingTokenizer));
        assert!(file.parser_failed());
        assert!(file.tokens().is_empty());
        assert!(file.raw_commands().is_empty());
    }

    #[test]
    fn test_commands_survive_parser_failure() {
        let file = SourceFile::virtual_file(
            "// swiftlint:disable file_length\nlet a = 1 // swiftlint:disable:this todo\nlet s = \"open\n",
        );
        assert!(file.parser_failed());
        assert_eq!(
            file.raw_commands(),
            &[
                Command::new(Action::Disable, ["file_length"], 1, Some(33)),
                Command::new(Action::Disable, ["todo"], 2, Some(41)).with_modifier(Modifier::This),
            ]
        );
    }
}
