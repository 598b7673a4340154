//! Class listings of `.jar` archives.
//!
//! Only names are read: every `.class` entry becomes a member-less class
//! entry, and a packaged `R.class` marks its package as a resource package.

use std::path::Path;

use crate::error::{IndexError, NamingError};
use crate::hir::symbols::SymbolKind;

use super::manifest::{owner_symbol, split_binary_name};
use super::table::ExternalSymbolTable;
use super::types::{ClassBuilder, JavaType, Origin};

/// Binary class name for a jar entry path, or `None` for entries that are not
/// nameable classes (resources, `module-info`, anonymous classes).
pub fn class_name_of_entry(entry: &str) -> Option<String> {
    let path = entry.strip_suffix(".class")?;
    let path = match path.strip_prefix("META-INF/versions/") {
        Some(rest) => rest.split_once('/')?.1,
        None => path,
    };
    let simple = path.rsplit('/').next()?;
    if simple == "module-info" || simple == "package-info" {
        return None;
    }
    // Anonymous and local classes: `Outer$1`, `Outer$1Local`.
    if simple
        .split('$')
        .skip(1)
        .any(|part| part.starts_with(|c: char| c.is_ascii_digit()))
    {
        return None;
    }
    Some(path.replace('/', "."))
}

/// Register the classes listed in a jar. Returns the number of classes.
pub fn load_jar(path: &Path, table: &mut ExternalSymbolTable) -> Result<usize, IndexError> {
    let file = std::fs::File::open(path).map_err(|err| IndexError::io(path, err))?;
    let jar_error = |source| IndexError::Jar {
        path: path.to_path_buf(),
        source,
    };
    let archive = zip::ZipArchive::new(file).map_err(jar_error)?;

    let mut count = 0;
    for entry in archive.file_names() {
        let Some(binary) = class_name_of_entry(entry) else {
            continue;
        };
        let (package, chain) = split_binary_name(&binary);
        if chain.first() == Some(&"R") {
            table.register_resource_package(package);
            continue;
        }
        match declare(package, &chain, &binary) {
            Ok(builder) => {
                table.insert(builder.build());
                count += 1;
            }
            Err(err) => tracing::warn!(class = %binary, error = %err, "skipping jar entry"),
        }
    }
    tracing::debug!(jar = %path.display(), count, "loaded jar class listing");
    Ok(count)
}

fn declare(package: &str, chain: &[&str], binary: &str) -> Result<ClassBuilder, NamingError> {
    let owner = owner_symbol(package, chain)?;
    let qualified = binary.replace('$', ".");
    let mut builder = ClassBuilder::new(&owner, package, &qualified, SymbolKind::Class, Origin::External)?;
    if qualified != "java.lang.Object" {
        builder.superclass(JavaType::object());
    }
    Ok(builder)
}
