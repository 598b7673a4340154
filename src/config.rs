//! Indexer configuration.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// How `local<N>` identifiers are allocated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocalNumbering {
    /// One counter for the whole compilation unit.
    #[default]
    PerUnit,
    /// The counter restarts at each method, constructor or initializer body.
    PerMethod,
}

/// Options for one indexing run.
///
/// Every field has a default; a collaborator may also deserialize this from
/// JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Packages imported on demand into every unit.
    pub implicit_imports: Vec<SmolStr>,
    pub local_numbering: LocalNumbering,
    /// Attach signature and doc comment to definition occurrences.
    pub documentation: bool,
    /// Emit a placeholder reference for names that do not resolve.
    pub emit_unresolved: bool,
    /// Worker threads for project runs; `0` uses the rayon default.
    pub threads: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            implicit_imports: vec![SmolStr::new_static("java.lang")],
            local_numbering: LocalNumbering::PerUnit,
            documentation: true,
            emit_unresolved: true,
            threads: 0,
        }
    }
}

impl IndexerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local_numbering(mut self, numbering: LocalNumbering) -> Self {
        self.local_numbering = numbering;
        self
    }

    pub fn with_implicit_import(mut self, package: impl Into<SmolStr>) -> Self {
        let package = package.into();
        if !self.implicit_imports.contains(&package) {
            self.implicit_imports.push(package);
        }
        self
    }

    pub fn with_documentation(mut self, documentation: bool) -> Self {
        self.documentation = documentation;
        self
    }

    pub fn with_unresolved_placeholders(mut self, emit: bool) -> Self {
        self.emit_unresolved = emit;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IndexerConfig::default();
        assert_eq!(config.implicit_imports, vec![SmolStr::new("java.lang")]);
        assert_eq!(config.local_numbering, LocalNumbering::PerUnit);
        assert!(config.documentation);
        assert!(config.emit_unresolved);
    }

    #[test]
    fn test_builder_does_not_duplicate_imports() {
        let config = IndexerConfig::new()
            .with_implicit_import("java.lang")
            .with_implicit_import("android.widget")
            .with_local_numbering(LocalNumbering::PerMethod);
        assert_eq!(config.implicit_imports.len(), 2);
        assert_eq!(config.local_numbering, LocalNumbering::PerMethod);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: IndexerConfig =
            serde_json::from_str(r#"{ "local_numbering": "per-method", "threads": 2 }"#).unwrap();
        assert_eq!(config.local_numbering, LocalNumbering::PerMethod);
        assert_eq!(config.threads, 2);
        assert!(config.documentation);
    }
}
