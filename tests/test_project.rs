//! Project runs over a directory on disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use javadex::{ExternalSymbolTable, IndexError, Indexer, IndexerConfig};

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn indexer_with_manifest(manifest: &Path) -> Indexer {
    let mut table = ExternalSymbolTable::with_platform();
    table.load_manifest(manifest).unwrap();
    Indexer::new(Arc::new(table), IndexerConfig::default())
}

#[test]
fn test_index_directory_with_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("classpath.json");
    fs::write(
        &manifest,
        r#"{ "classes": [ { "name": "com.airbnb.epoxy.EpoxyModel", "type_parameters": ["T"] } ] }"#,
    )
    .unwrap();
    let src = dir.path().join("src");
    write(
        &src,
        "com/example/Model.java",
        "package com.example;\nimport com.airbnb.epoxy.EpoxyModel;\npublic class Model extends EpoxyModel<String> {\n  public Helper helper() { return new Helper(); }\n}\n",
    );
    write(
        &src,
        "com/example/Helper.java",
        "package com.example;\nclass Helper { Model owner; }\n",
    );

    let run = indexer_with_manifest(&manifest).index_directory(&src).unwrap();
    assert_eq!(run.units.len(), 2);
    assert!(run.load_errors.is_empty());
    assert_eq!(run.failures().count(), 0);

    let helper = run
        .unit(&src.join("com/example/Helper.java"))
        .unwrap()
        .result
        .as_ref()
        .unwrap();
    let refs: Vec<String> = helper.references().map(|o| o.symbol.to_string()).collect();
    assert_eq!(refs, vec!["com/example/Model#"]);

    let model = run
        .unit(&src.join("com/example/Model.java"))
        .unwrap()
        .result
        .as_ref()
        .unwrap();
    let refs: Vec<String> = model.references().map(|o| o.symbol.to_string()).collect();
    assert!(refs.contains(&"com/airbnb/epoxy/EpoxyModel#".to_string()));
    assert!(refs.contains(&"com/example/Helper#".to_string()));
    assert!(model.diagnostics.is_empty(), "{:?}", model.diagnostics);
}

#[test]
fn test_file_ids_follow_sorted_paths() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "b/B.java", "package b;\nclass B {}\n");
    write(dir.path(), "a/A.java", "package a;\nclass A {}\n");
    let indexer = Indexer::new(Arc::new(ExternalSymbolTable::with_platform()), IndexerConfig::default());

    let run = indexer.index_directory(dir.path()).unwrap();
    let files: Vec<String> = run
        .units
        .iter()
        .map(|unit| unit.path.strip_prefix(dir.path()).unwrap().display().to_string())
        .collect();
    assert_eq!(files, vec!["a/A.java", "b/B.java"]);
    assert_eq!(run.units[0].file.index(), 0);
    assert_eq!(run.units[1].file.index(), 1);
}

#[test]
fn test_syntax_errors_are_reported_per_unit() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Good.java", "class Good {}\n");
    write(dir.path(), "Bad.java", "class Bad { void f( }\n");
    let indexer = Indexer::new(Arc::new(ExternalSymbolTable::with_platform()), IndexerConfig::default());

    let run = indexer.index_directory(dir.path()).unwrap();
    assert_eq!(run.indexed().count(), 1);
    let (path, err) = run.failures().next().unwrap();
    assert!(path.ends_with("Bad.java"));
    match err {
        IndexError::Syntax { file, .. } => assert!(file.ends_with("Bad.java")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_manifest_and_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut table = ExternalSymbolTable::new();
    let err = table.load_manifest(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, IndexError::MissingFile(_)));

    let indexer = Indexer::new(Arc::new(ExternalSymbolTable::with_platform()), IndexerConfig::default());
    let err = indexer.index_directory(&dir.path().join("src")).unwrap_err();
    assert!(matches!(err, IndexError::MissingFile(_)));
}

#[test]
fn test_invalid_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("broken.json");
    fs::write(&manifest, "{ \"classes\": [ ").unwrap();
    let mut table = ExternalSymbolTable::new();
    let err = table.load_manifest(&manifest).unwrap_err();
    assert!(matches!(err, IndexError::Manifest { .. }));
}
