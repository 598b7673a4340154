use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::IndexError;

use super::SourceRoot;

/// Every `.java` file under `root`, sorted by path.
///
/// Sorting makes file ids, and so every run over the same tree, stable.
pub fn collect_java_files(root: &Path) -> Result<Vec<PathBuf>, IndexError> {
    if !root.is_dir() {
        return Err(IndexError::MissingFile(root.to_path_buf()));
    }
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "java"))
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Read every `.java` file under `root` into a new [`SourceRoot`].
///
/// Files that cannot be read are returned alongside the root instead of
/// failing the whole load.
pub fn load_directory(root: &Path) -> Result<(SourceRoot, Vec<IndexError>), IndexError> {
    let mut sources = SourceRoot::new();
    let mut errors = Vec::new();
    for path in collect_java_files(root)? {
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                sources.insert(path, text);
            }
            Err(err) => errors.push(IndexError::io(path, err)),
        }
    }
    debug!(
        root = %root.display(),
        files = sources.len(),
        failed = errors.len(),
        "loaded source directory"
    );
    Ok((sources, errors))
}
