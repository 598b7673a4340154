//! Java syntax: tokens, typed tree, and the parser that connects them.
//!
//! - [`lexer`] - `logos` tokenizer with doc-comment attachment
//! - [`ast`] - typed syntax tree
//! - [`parser`] - strict recursive-descent parser
//!
//! This module depends only on [`crate::base`]-level crates (`text-size`,
//! `smol_str`).

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::CompilationUnit;
pub use lexer::doc_comment_text;
pub use parser::{SyntaxError, parse};
