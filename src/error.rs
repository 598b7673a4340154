//! Error types.
//!
//! Fatal, unit-level failures are [`IndexError`]s. Problems that only affect
//! one declaration or one reference are reported as
//! [`Diagnostic`](crate::hir::Diagnostic)s instead and never abort a unit.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to build a symbol for a declaration in its context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    /// The owner is missing or cannot own this kind of declaration
    /// (for example a method owned by a package).
    #[error("malformed context for `{declaration}`: {reason}")]
    MalformedContext { declaration: String, reason: String },
}

impl NamingError {
    pub(crate) fn malformed(declaration: impl Into<String>, reason: impl Into<String>) -> Self {
        NamingError::MalformedContext {
            declaration: declaration.into(),
            reason: reason.into(),
        }
    }
}

/// Failure to index a unit or to load classpath input.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid classpath manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot name classpath entry in {path}: {source}")]
    Naming {
        path: PathBuf,
        #[source]
        source: NamingError,
    },
    #[cfg(feature = "jars")]
    #[error("cannot read jar {path}: {source}")]
    Jar {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("syntax error in {file} at byte {offset}: {message}")]
    Syntax {
        file: String,
        message: String,
        offset: u32,
    },
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),
}

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return IndexError::MissingFile(path);
        }
        IndexError::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_error_message() {
        let err = NamingError::malformed("foo().", "a method cannot be owned by a package");
        assert_eq!(
            err.to_string(),
            "malformed context for `foo().`: a method cannot be owned by a package"
        );
    }

    #[test]
    fn test_not_found_io_becomes_missing_file() {
        let err = IndexError::io(
            "/nope/A.java",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, IndexError::MissingFile(_)));
        assert_eq!(err.to_string(), "file not found: /nope/A.java");
    }

    #[test]
    fn test_syntax_error_message() {
        let err = IndexError::Syntax {
            file: "A.java".into(),
            message: "expected `;`".into(),
            offset: 42,
        };
        assert_eq!(err.to_string(), "syntax error in A.java at byte 42: expected `;`");
    }
}
