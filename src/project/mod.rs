//! Project driver: source roots, directory loading and parallel indexing.

mod indexer;
mod loader;
mod source_root;

pub use indexer::{Indexer, ProjectRun, UnitResult};
pub use loader::{collect_java_files, load_directory};
pub use source_root::{SourceFile, SourceRoot};
