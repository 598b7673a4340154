//! # javadex
//!
//! Semantic indexer for Java sources. Every identifier that names a program
//! entity is resolved to a stable, hierarchical symbol and emitted as a
//! definition or reference occurrence over its source range.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! project   → Source roots, directory loading, parallel project runs
//!   ↓
//! ide       → Snapshot rendering of a finished index
//!   ↓
//! index     → Occurrence Emitter, occurrence and symbol records
//!   ↓
//! hir       → Symbol Naming Scheme, scopes, Scope Resolver
//!   ↓
//! classpath → External Symbol Table, manifests, jar listings
//!   ↓
//! syntax    → logos lexer + recursive-descent parser
//!   ↓
//! base      → Primitives (FileId, TextRange, LineIndex)
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use javadex::{ExternalSymbolTable, IndexerConfig};
//!
//! let external = ExternalSymbolTable::with_platform();
//! let index = javadex::index_source("class A {}", &external, &IndexerConfig::default())?;
//! println!("{}", javadex::ide::render("class A {}", &index));
//! # Ok::<(), javadex::IndexError>(())
//! ```

/// Foundation types: FileId, byte ranges, line/column conversion
pub mod base;

/// External Symbol Table and the class model it shares with the project
pub mod classpath;

/// Indexer options
pub mod config;

/// Error types
pub mod error;

/// Semantic model: naming, scopes, resolution
pub mod hir;

/// Views over finished indexes
pub mod ide;

/// Occurrence records and the Occurrence Emitter
pub mod index;

/// Project driver
pub mod project;

/// Java front end
pub mod syntax;

pub use base::{FileId, LineCol, LineIndex, Range, TextRange, TextSize};
pub use classpath::{ClasspathManifest, ExternalSymbolTable};
pub use config::{IndexerConfig, LocalNumbering};
pub use error::{IndexError, NamingError};
pub use hir::{Declaration, Diagnostic, ProjectIndex, Scheme, Severity, Symbol, SymbolKind, name_of, resolve_unit};
pub use index::{Occurrence, Role, SymbolInformation, UnitIndex};
pub use project::{Indexer, ProjectRun, SourceRoot};

/// Index a single compilation unit as its own project.
pub fn index_source(
    source: &str,
    external: &ExternalSymbolTable,
    config: &IndexerConfig,
) -> Result<UnitIndex, IndexError> {
    let file = FileId::new(0);
    let unit = syntax::parse(source).map_err(|err| IndexError::Syntax {
        file: file.to_string(),
        message: err.message,
        offset: err.range.start().into(),
    })?;
    let project = ProjectIndex::build(&[(file, &unit)], external, config);
    Ok(resolve_unit(&unit, source, file, &project, external, config))
}
