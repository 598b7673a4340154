//! Built-in platform surface: `java.lang` essentials, the override marker,
//! `java.util` collections and functional interfaces, Android resource
//! annotations.

use crate::error::NamingError;

use super::manifest::ClasspathManifest;
use super::table::ExternalSymbolTable;

const PLATFORM_MANIFEST: &str = include_str!("platform.json");

#[derive(Debug, thiserror::Error)]
pub(crate) enum PlatformError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Naming(#[from] NamingError),
}

pub(crate) fn load_into(table: &mut ExternalSymbolTable) -> Result<usize, PlatformError> {
    let manifest = ClasspathManifest::from_json(PLATFORM_MANIFEST)?;
    Ok(manifest.load_into(table)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::types::JavaType;
    use crate::hir::symbols::SymbolKind;

    #[test]
    fn test_platform_manifest_loads() {
        let mut table = ExternalSymbolTable::new();
        let count = load_into(&mut table).unwrap();
        assert_eq!(count, table.len());
        assert!(count > 40);
    }

    #[test]
    fn test_platform_essentials() {
        let table = ExternalSymbolTable::with_platform();
        let over = table.class("java.lang.Override").unwrap();
        assert_eq!(over.symbol.to_string(), "java/lang/Override#");
        assert_eq!(over.kind(), SymbolKind::Annotation);

        let out = table.class("java.lang.System").unwrap();
        assert_eq!(out.field("out").unwrap().ty, JavaType::class("java.io.PrintStream"));

        let list = table.class("java.util.List").unwrap();
        assert!(list.is_interface());
        assert_eq!(list.type_params.len(), 1);
        assert_eq!(list.type_params[0], "E");
        assert!(table.class("androidx.annotation.LayoutRes").is_some());
        assert!(table.has_package("java.util.function"));
    }
}
