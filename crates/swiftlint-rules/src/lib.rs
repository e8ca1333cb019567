//! # swiftlint-rules
//!
//! Built-in lint rules for SwiftLint.
//!
//! The engine in `swiftlint-core` knows nothing about Swift style; every
//! check it runs comes from a [`RuleCatalog`](swiftlint_core::RuleCatalog).
//! This crate provides the catalog SwiftLint ships with.
//!
//! ## Available Rules
//!
//! | Identifier | Kind | Notes |
//! |------------|------|-------|
//! | `blanket_disable_command` | lint | unbalanced `swiftlint:disable` commands |
//! | `custom_rules` | style | user-defined regex rules |
//! | `empty_count` | performance | opt-in |
//! | `file_length` | metrics | warning/error thresholds |
//! | `force_cast` | idiomatic | |
//! | `force_try` | idiomatic | |
//! | `line_length` | metrics | warning/error thresholds |
//! | `todo` | lint | |
//! | `trailing_whitespace` | style | correctable |
//! | `type_name_collision` | lint | opt-in, collecting |
//! | `unused_import` | lint | analyzer only, correctable |
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use swiftlint_core::{ConfigurationResolver, LintSession, ResolveOptions};
//! use swiftlint_rules::builtin_catalog;
//!
//! let resolver = ConfigurationResolver::new(Arc::new(builtin_catalog()), Arc::new(LintSession::new()));
//! let configuration = resolver.resolve(&ResolveOptions::new(std::path::Path::new(".")))?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod blanket_disable_command;
mod builtin;
mod custom_rules;
mod empty_count;
mod file_length;
mod force_cast;
mod force_try;
mod line_length;
mod todo;
mod trailing_whitespace;
mod type_name_collision;
mod unused_import;
mod utils;

pub use blanket_disable_command::{BlanketDisableCommand, BLANKET_DISABLE_COMMAND};
pub use builtin::builtin_catalog;
pub use custom_rules::{CustomRules, CUSTOM_RULES_DESCRIPTION};
pub use empty_count::{EmptyCount, EMPTY_COUNT};
pub use file_length::{FileLength, FILE_LENGTH};
pub use force_cast::{ForceCast, FORCE_CAST};
pub use force_try::{ForceTry, FORCE_TRY};
pub use line_length::{LineLength, LINE_LENGTH};
pub use todo::{Todo, TODO};
pub use trailing_whitespace::{TrailingWhitespace, TRAILING_WHITESPACE};
pub use type_name_collision::{DeclaredTypes, TypeNameCollision, TYPE_NAME_COLLISION};
pub use unused_import::{UnusedImport, UNUSED_IMPORT};
