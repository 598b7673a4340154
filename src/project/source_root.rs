//! The set of Java files in one indexing run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::base::FileId;

/// One compilation unit's path and text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: Arc<str>,
}

/// Path and contents for every [`FileId`] of a run.
///
/// Ids are assigned in insertion order and stay stable for a path: adding a
/// path again replaces its text and keeps its id.
#[derive(Clone, Debug, Default)]
pub struct SourceRoot {
    files: IndexMap<FileId, SourceFile>,
    by_path: FxHashMap<PathBuf, FileId>,
}

impl SourceRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<Arc<str>>) -> FileId {
        let path = path.into();
        let text = text.into();
        if let Some(&id) = self.by_path.get(&path) {
            if let Some(file) = self.files.get_mut(&id) {
                file.text = text;
            }
            return id;
        }
        let id = FileId::new(self.files.len() as u32);
        self.by_path.insert(path.clone(), id);
        self.files.insert(id, SourceFile { path, text });
        id
    }

    pub fn file_id(&self, path: &Path) -> Option<FileId> {
        self.by_path.get(path).copied()
    }

    pub fn get(&self, file: FileId) -> Option<&SourceFile> {
        self.files.get(&file)
    }

    pub fn path(&self, file: FileId) -> Option<&Path> {
        self.files.get(&file).map(|f| f.path.as_path())
    }

    pub fn text(&self, file: FileId) -> Option<&str> {
        self.files.get(&file).map(|f| f.text.as_ref())
    }

    pub fn contains(&self, file: FileId) -> bool {
        self.files.contains_key(&file)
    }

    /// Files in id order.
    pub fn iter(&self) -> impl Iterator<Item = (FileId, &SourceFile)> + '_ {
        self.files.iter().map(|(&id, file)| (id, file))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
