//! Tokenizer boundary.
//!
//! The engine only needs to know where comments and string literals are:
//! inline commands live in comments, and most rules must skip matches
//! inside either. Anything richer is the business of a real parser plugged
//! in through [`Tokenizer`].

use thiserror::Error;

/// Kind of a syntax token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A `//` or `/* */` comment, including its delimiters.
    Comment,
    /// A string literal, including its quotes.
    String,
}

/// A token with its byte range in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Kind of the token.
    pub kind: TokenKind,
    /// Byte offset of the first byte.
    pub offset: usize,
    /// Length in bytes.
    pub length: usize,
}

impl Token {
    /// Byte offset one past the last byte.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Returns `true` if `offset` falls inside this token.
    #[must_use]
    pub fn contains(&self, offset: usize) -> bool {
        self.offset <= offset && offset < self.end()
    }
}

/// Failure reported by a tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct ParseError {
    /// Human readable description.
    pub message: String,
    /// Byte offset at which tokenizing failed.
    pub offset: usize,
}

/// Turns file contents into tokens.
pub trait Tokenizer: Send + Sync {
    /// Tokenizes the given source text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be tokenized. Rules that depend
    /// on the tokenizer are skipped for that file.
    fn tokenize(&self, contents: &str) -> Result<Vec<Token>, ParseError>;
}

/// Lexical scanner for Swift comments and string literals.
///
/// Handles nested block comments, escapes, multi-line (`"""`) strings and
/// raw strings delimited by `#`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SwiftTokenizer;

impl Tokenizer for SwiftTokenizer {
    fn tokenize(&self, contents: &str) -> Result<Vec<Token>, ParseError> {
        let bytes = contents.as_bytes();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    let end = memchr_newline(bytes, i);
                    tokens.push(Token {
                        kind: TokenKind::Comment,
                        offset: i,
                        length: end - i,
                    });
                    i = end;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    let end = scan_block_comment(bytes, i)?;
                    tokens.push(Token {
                        kind: TokenKind::Comment,
                        offset: i,
                        length: end - i,
                    });
                    i = end;
                }
                b'#' | b'"' => {
                    if let Some(end) = scan_string(bytes, i)? {
                        tokens.push(Token {
                            kind: TokenKind::String,
                            offset: i,
                            length: end - i,
                        });
                        i = end;
                    } else {
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }

        Ok(tokens)
    }
}

fn memchr_newline(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| from + p)
}

fn scan_block_comment(bytes: &[u8], start: usize) -> Result<usize, ParseError> {
    let mut depth = 0usize;
    let mut i = start;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'*') => {
                depth += 1;
                i += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => i += 1,
        }
    }
    Err(ParseError {
        message: "unterminated block comment".to_string(),
        offset: start,
    })
}

/// Scans a string literal starting at `start`, which points at `#` or `"`.
///
/// Returns `None` when a `#` does not open a raw string.
fn scan_string(bytes: &[u8], start: usize) -> Result<Option<usize>, ParseError> {
    let hashes = bytes[start..].iter().take_while(|&&b| b == b'#').count();
    let quote = start + hashes;
    if bytes.get(quote) != Some(&b'"') {
        return Ok(None);
    }

    let multiline = bytes.get(quote..quote + 3) == Some(b"\"\"\"".as_slice());
    let delimiter_len = if multiline { 3 } else { 1 };
    let mut i = quote + delimiter_len;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' && hashes == 0 {
            i += 2;
            continue;
        }
        if b == b'\n' && !multiline {
            break;
        }
        let closes = if multiline {
            bytes.get(i..i + 3) == Some(b"\"\"\"".as_slice())
        } else {
            b == b'"'
        };
        if closes {
            let after = i + delimiter_len;
            let trailing = bytes[after..].iter().take(hashes).filter(|&&c| c == b'#').count();
            if trailing == hashes {
                return Ok(Some(after + hashes));
            }
        }
        i += 1;
    }

    Err(ParseError {
        message: "unterminated string literal".to_string(),
        offset: start,
    })
}
