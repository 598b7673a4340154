//! Semantic model: symbols, scopes, and resolution.
//!
//! - [`symbols`] - Symbol Naming Scheme ([`name_of`], [`Symbol`])
//! - [`ProjectIndex`] - declarations of every project unit, built up front
//! - [`resolve_unit`] - Scope Resolver, one traversal per unit
//! - [`Diagnostic`] - unresolved names, ambiguous calls, malformed contexts
//!
//! Depends on [`crate::syntax`] and [`crate::classpath`]; nothing here
//! touches the filesystem.

mod diagnostics;
mod env;
mod ids;
mod imports;
mod overload;
mod project;
mod resolve;
mod scope;
pub mod symbols;

pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity, codes};
pub use env::TypeEnv;
pub use ids::{LocalId, LocalIdAllocator};
pub use imports::ImportScope;
pub use overload::{Candidate, Selection, select};
pub use project::ProjectIndex;
pub use resolve::resolve_unit;
pub use scope::{ScopeKind, ScopeStack, TypeBinding, ValueBinding};
pub use symbols::{CONSTRUCTOR_NAME, Declaration, Descriptor, OverloadCounter, Scheme, Symbol, SymbolKind, name_of};
