//! Snapshot tests: index a unit and compare its rendered form with a
//! reviewed expectation under `tests/fixtures`.

use std::path::Path;

use javadex::{ExternalSymbolTable, IndexerConfig, ide};

fn epoxy_classpath() -> ExternalSymbolTable {
    let mut table = ExternalSymbolTable::with_platform();
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/epoxy.json");
    table.load_manifest(&manifest).unwrap();
    table
}

#[test]
fn test_hidden_epoxy_model_snapshot() {
    let source = include_str!("fixtures/HiddenEpoxyModel.java");
    let expected = include_str!("fixtures/HiddenEpoxyModel.snap");

    let index = javadex::index_source(source, &epoxy_classpath(), &IndexerConfig::default()).unwrap();
    let rendered = ide::render(source, &index);

    assert_eq!(
        rendered, expected,
        "snapshot mismatch:\n--- rendered ---\n{rendered}\n--- expected ---\n{expected}"
    );
    assert!(index.diagnostics.is_empty(), "{:?}", index.diagnostics);
}

#[test]
fn test_snapshot_is_stable_across_runs() {
    let source = include_str!("fixtures/HiddenEpoxyModel.java");
    let classpath = epoxy_classpath();
    let config = IndexerConfig::default();
    let first = javadex::index_source(source, &classpath, &config).unwrap();
    let second = javadex::index_source(source, &classpath, &config).unwrap();
    assert_eq!(ide::render(source, &first), ide::render(source, &second));
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_unresolved_names_render_as_placeholders() {
    let source = "class A {\n  int f() { return Missing.value; }\n}\n";
    let index = javadex::index_source(source, &ExternalSymbolTable::with_platform(), &IndexerConfig::default())
        .unwrap();
    let rendered = ide::render(source, &index);
    let line = format!("//{}^^^^^^^ reference Missing/\n", " ".repeat(17));
    assert!(rendered.contains(&line), "{rendered}");
    assert!(rendered.contains("^^^^^ reference Missing/value#\n"), "{rendered}");
    assert_eq!(index.diagnostics.len(), 1);
    assert_eq!(index.diagnostics[0].code, "J0001");
}
