//! Classpath model and the External Symbol Table.
//!
//! - [`ExternalSymbolTable`] - library and platform declarations by qualified name
//! - [`ClassInfo`], [`JavaType`] - the class/member model shared with the project index
//! - [`ClasspathManifest`] - JSON classpath input
//! - `jar` (feature `jars`) - class listings of `.jar` files
//! - [`resources`] - generated `R` classes, synthesized on demand

use std::path::Path;
use std::sync::Arc;

use crate::error::IndexError;

#[cfg(feature = "jars")]
pub mod jar;
pub mod manifest;
mod platform;
pub mod resources;
mod table;
mod types;

pub use manifest::ClasspathManifest;
pub use resources::{RESOURCE_TYPES, ResourceCache, ResourceEntry};
pub use table::{ExternalSymbolTable, LookupKind};
pub use types::{ClassBuilder, ClassInfo, FieldInfo, JavaType, MethodInfo, Origin};

/// Something that knows classes by dotted qualified name.
///
/// Implemented by the external table and the project index; the resolver
/// consults them in that order of precedence (project first).
pub trait TypeSource: Send + Sync {
    fn class(&self, qualified: &str) -> Option<Arc<ClassInfo>>;

    fn has_package(&self, package: &str) -> bool;

    fn has_class(&self, qualified: &str) -> bool {
        self.class(qualified).is_some()
    }
}

impl ExternalSymbolTable {
    /// Load a JSON manifest into this table.
    pub fn load_manifest(&mut self, path: &Path) -> Result<usize, IndexError> {
        let manifest = ClasspathManifest::load(path)?;
        manifest.load_into(self).map_err(|source| IndexError::Naming {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a `.jar` class listing into this table.
    #[cfg(feature = "jars")]
    pub fn load_jar(&mut self, path: &Path) -> Result<usize, IndexError> {
        jar::load_jar(path, self)
    }
}
