//! Whole-project runs: parse every unit, build the project table once, then
//! resolve units in parallel.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, debug_span, warn};

use crate::base::FileId;
use crate::classpath::ExternalSymbolTable;
use crate::config::IndexerConfig;
use crate::error::IndexError;
use crate::hir::{ProjectIndex, resolve_unit};
use crate::index::UnitIndex;
use crate::syntax::{self, ast::CompilationUnit};

use super::{SourceRoot, load_directory};

/// Outcome of one unit in a project run.
#[derive(Debug)]
pub struct UnitResult {
    pub file: FileId,
    pub path: PathBuf,
    pub result: Result<UnitIndex, IndexError>,
}

/// Everything a project run produced, in file id order.
#[derive(Debug, Default)]
pub struct ProjectRun {
    pub units: Vec<UnitResult>,
    /// Files found on disk that could not be read.
    pub load_errors: Vec<IndexError>,
}

impl ProjectRun {
    /// Units that indexed successfully.
    pub fn indexed(&self) -> impl Iterator<Item = &UnitIndex> {
        self.units.iter().filter_map(|unit| unit.result.as_ref().ok())
    }

    /// Units that failed, with their paths. Unreadable files are in
    /// `load_errors` instead.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &IndexError)> {
        self.units
            .iter()
            .filter_map(|unit| unit.result.as_ref().err().map(|err| (unit.path.as_path(), err)))
    }

    pub fn unit(&self, path: &Path) -> Option<&UnitResult> {
        self.units.iter().find(|unit| unit.path == path)
    }
}

/// Drives the Scope Resolver over sources with a shared classpath.
#[derive(Clone, Debug)]
pub struct Indexer {
    external: Arc<ExternalSymbolTable>,
    config: IndexerConfig,
}

impl Indexer {
    pub fn new(external: Arc<ExternalSymbolTable>, config: IndexerConfig) -> Self {
        Self { external, config }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn external(&self) -> &ExternalSymbolTable {
        &self.external
    }

    /// Index one unit on its own; its types are the whole project.
    pub fn index_source(&self, source: &str) -> Result<UnitIndex, IndexError> {
        crate::index_source(source, &self.external, &self.config)
    }

    /// Index every file of `sources` against each other and the classpath.
    ///
    /// A unit that fails to parse is reported in its [`UnitResult`]; the
    /// other units still see each other but not the failed one.
    pub fn index_files(&self, sources: &SourceRoot) -> ProjectRun {
        if self.config.threads == 0 {
            return self.run(sources);
        }
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .thread_name(|idx| format!("javadex-{idx}"))
            .build()
        {
            Ok(pool) => pool.install(|| self.run(sources)),
            Err(err) => {
                warn!(threads = self.config.threads, %err, "cannot build worker pool, using the global one");
                self.run(sources)
            }
        }
    }

    /// Load and index every `.java` file under `root`.
    pub fn index_directory(&self, root: &Path) -> Result<ProjectRun, IndexError> {
        let (sources, load_errors) = load_directory(root)?;
        let mut run = self.index_files(&sources);
        run.load_errors = load_errors;
        Ok(run)
    }

    fn run(&self, sources: &SourceRoot) -> ProjectRun {
        let files: Vec<_> = sources.iter().collect();

        let parsed: Vec<(FileId, Result<CompilationUnit, IndexError>)> = files
            .par_iter()
            .map(|(file, source)| {
                let name = source.path.display().to_string();
                (*file, parse_unit(*file, &name, &source.text))
            })
            .collect();

        let units: Vec<(FileId, &CompilationUnit)> = parsed
            .iter()
            .filter_map(|(file, unit)| unit.as_ref().ok().map(|unit| (*file, unit)))
            .collect();
        let project = ProjectIndex::build(&units, &self.external, &self.config);

        let mut results: Vec<UnitResult> = files
            .par_iter()
            .zip(parsed.into_par_iter())
            .map(|((file, source), (_, unit))| {
                let _span = debug_span!("index_unit", file = %file, path = %source.path.display()).entered();
                let result = unit.map(|unit| {
                    resolve_unit(&unit, &source.text, *file, &project, &self.external, &self.config)
                });
                if let Err(err) = &result {
                    warn!(%err, "unit not indexed");
                }
                UnitResult {
                    file: *file,
                    path: source.path.clone(),
                    result,
                }
            })
            .collect();
        results.sort_by_key(|unit| unit.file);

        debug!(
            units = results.len(),
            classes = project.len(),
            failed = results.iter().filter(|unit| unit.result.is_err()).count(),
            "project indexed"
        );
        ProjectRun {
            units: results,
            load_errors: Vec::new(),
        }
    }
}

fn parse_unit(file: FileId, name: &str, source: &str) -> Result<CompilationUnit, IndexError> {
    syntax::parse(source).map_err(|err| {
        debug!(%file, offset = u32::from(err.range.start()), "syntax error");
        IndexError::Syntax {
            file: name.to_string(),
            message: err.message,
            offset: err.range.start().into(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexer() -> Indexer {
        Indexer::new(Arc::new(ExternalSymbolTable::with_platform()), IndexerConfig::default())
    }

    fn symbols(index: &UnitIndex) -> Vec<String> {
        index.occurrences.iter().map(|o| format!("{} {}", o.role.as_str(), o.symbol)).collect()
    }

    #[test]
    fn test_index_source() {
        let index = indexer().index_source("class A { String s; }").unwrap();
        assert_eq!(
            symbols(&index),
            vec!["definition A#", "reference java/lang/String#", "definition A#s."]
        );
    }

    #[test]
    fn test_syntax_error_is_a_unit_failure() {
        let err = indexer().index_source("class A {").unwrap_err();
        assert!(matches!(err, IndexError::Syntax { .. }));
    }

    #[test]
    fn test_cross_file_references() {
        let mut sources = SourceRoot::new();
        sources.insert("a/Base.java", "package a;\npublic class Base { public void run() {} }\n");
        sources.insert(
            "b/Child.java",
            "package b;\nimport a.Base;\nclass Child extends Base { void go() { run(); } }\n",
        );
        let run = indexer().index_files(&sources);
        assert_eq!(run.units.len(), 2);
        let child = run.unit(Path::new("b/Child.java")).unwrap().result.as_ref().unwrap();
        let refs: Vec<String> = child.references().map(|o| o.symbol.to_string()).collect();
        assert!(refs.contains(&"a/Base#".to_string()));
        assert!(refs.contains(&"a/Base#run().".to_string()));
        assert!(child.diagnostics.is_empty());
    }

    #[test]
    fn test_failed_unit_does_not_abort_run() {
        let mut sources = SourceRoot::new();
        sources.insert("A.java", "class A {}");
        sources.insert("Broken.java", "class Broken {");
        let run = indexer().index_files(&sources);
        assert_eq!(run.indexed().count(), 1);
        let failures: Vec<_> = run.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, Path::new("Broken.java"));
    }

    #[test]
    fn test_dedicated_pool_matches_global() {
        let mut sources = SourceRoot::new();
        sources.insert("A.java", "class A { void f(int x) { x++; } }");
        sources.insert("B.java", "class B extends A { void g() { f(1); } }");
        let global = indexer().index_files(&sources);
        let pooled = Indexer::new(
            Arc::new(ExternalSymbolTable::with_platform()),
            IndexerConfig::default().with_threads(2),
        )
        .index_files(&sources);
        let global: Vec<_> = global.indexed().cloned().collect();
        let pooled: Vec<_> = pooled.indexed().cloned().collect();
        assert_eq!(global, pooled);
    }
}
