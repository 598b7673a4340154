//! Foundation types for the indexer.
//!
//! - [`FileId`] - Compilation unit identifiers
//! - [`TextRange`], [`TextSize`] - Byte positions in source text
//! - [`LineCol`], [`Range`], [`LineIndex`] - Line/column conversion
//!
//! This module has NO dependencies on other crate modules.

mod file_id;
mod span;

pub use file_id::FileId;
pub use span::{LineCol, LineIndex, Range, TextRange, TextSize};
