//! Output invariants: determinism, definition coverage, containment and
//! symbol uniqueness, over a fixed corpus and (with the `proptest` feature)
//! over generated units.

use javadex::{ExternalSymbolTable, IndexerConfig, Occurrence, UnitIndex};
use rustc_hash::FxHashSet;

const CORPUS: &[&str] = &[
    "class A { int x; void f(int y) { x = y; } }",
    "import java.util.List;\nclass B<T> { List<T> items; T first() { for (T item : items) { return item; } return null; } }\n",
    "enum Color { RED, GREEN { int shade() { return 1; } }; Color next() { return RED; } }",
    "record Point(int x, int y) { Point { if (x < 0) throw new IllegalArgumentException(); } int sum() { return x + y; } }",
    "interface Shape { double area(); default String name() { return \"shape\"; } }",
    "class C { Runnable r = () -> { int n = 1; }; Object o = new Object() { public String toString() { return \"c\"; } }; }",
    "class D { void f() { class Local { int v; int get() { return v; } } new Local().get(); } }",
    "class E { int f(Object o) { return switch (o) { case String s -> s.length(); default -> 0; }; } }",
    "class F { void f() { try (AutoCloseable c = null) { } catch (Exception e) { e.getMessage(); } } }",
    "class G { @Deprecated static <K> K pick(K a, K b) { return a; } void g() { pick(\"a\", \"b\").trim(); } }",
];

fn index(source: &str) -> UnitIndex {
    javadex::index_source(source, &ExternalSymbolTable::with_platform(), &IndexerConfig::default()).unwrap()
}

/// Source text under a single-line occurrence.
fn text_of<'s>(source: &'s str, occurrence: &Occurrence) -> &'s str {
    let line = source.lines().nth(occurrence.range.start.line as usize).unwrap();
    &line[occurrence.range.start.col as usize..occurrence.range.end.col as usize]
}

fn key(o: &Occurrence) -> ((u32, u32), (u32, u32)) {
    (
        (o.range.start.line, o.range.start.col),
        (o.range.end.line, o.range.end.col),
    )
}

fn assert_invariants(source: &str, index: &UnitIndex) {
    // Sorted by start position.
    for pair in index.occurrences.windows(2) {
        assert!(key(&pair[0]).0 <= key(&pair[1]).0, "unsorted output in {source}");
    }

    // Definitions cover exactly their identifier.
    for definition in index.definitions() {
        let text = text_of(source, definition);
        let info = index.symbol_info(&definition.symbol).unwrap();
        assert_eq!(text, info.display_name, "definition range of {} in {source}", definition.symbol);
    }

    // One definition per symbol.
    let mut defined = FxHashSet::default();
    for definition in index.definitions() {
        assert!(
            defined.insert(definition.symbol.clone()),
            "{} defined twice in {source}",
            definition.symbol
        );
    }

    // Ranges nest or are disjoint.
    for (i, a) in index.occurrences.iter().enumerate() {
        for b in &index.occurrences[i + 1..] {
            let (a_start, a_end) = key(a);
            let (b_start, b_end) = key(b);
            let partial = a_start < b_start && b_start < a_end && a_end < b_end;
            assert!(!partial, "{} overlaps {} in {source}", a.symbol, b.symbol);
        }
    }

    // Documentation at most once per symbol.
    let mut documented = FxHashSet::default();
    for occurrence in index.occurrences.iter().filter(|o| o.documentation.is_some()) {
        assert!(occurrence.is_definition());
        assert!(documented.insert(occurrence.symbol.clone()));
    }
}

#[test]
fn test_corpus_invariants() {
    for source in CORPUS {
        let index = index(source);
        assert_invariants(source, &index);
        assert!(
            index.diagnostics.iter().all(|d| d.code != "J0004"),
            "overlap reported in {source}: {:?}",
            index.diagnostics
        );
    }
}

#[test]
fn test_corpus_is_deterministic() {
    for source in CORPUS {
        assert_eq!(index(source), index(source), "in {source}");
    }
}

#[test]
fn test_definitions_have_distinct_symbols_across_units() {
    let mut seen = FxHashSet::default();
    for source in CORPUS {
        for definition in index(source).definitions() {
            if definition.symbol.is_local() {
                continue;
            }
            assert!(seen.insert(definition.symbol.to_string()), "{} reused", definition.symbol);
        }
    }
}

#[cfg(feature = "proptest")]
mod generated {
    use super::*;
    use proptest::prelude::*;

    // ========================================================================
    // PROPTEST STRATEGIES
    // ========================================================================

    fn arb_type_name() -> impl Strategy<Value = String> {
        "[A-Z][a-zA-Z0-9]{0,8}"
    }

    fn arb_member_name() -> impl Strategy<Value = String> {
        "[a-z][a-zA-Z0-9]{0,8}".prop_filter("not a keyword", |name| !is_keyword(name))
    }

    fn arb_type() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("int"), Just("String"), Just("Object"), Just("long"), Just("Runnable")]
    }

    fn arb_method() -> impl Strategy<Value = (String, Vec<(&'static str, String)>)> {
        (
            arb_member_name(),
            prop::collection::vec((arb_type(), arb_member_name()), 0..4),
        )
    }

    /// A class with fields and methods whose bodies read every parameter.
    fn arb_unit() -> impl Strategy<Value = String> {
        (
            arb_type_name(),
            prop::collection::vec((arb_type(), arb_member_name()), 0..4),
            prop::collection::vec(arb_method(), 0..4),
        )
            .prop_map(|(class, fields, methods)| {
                let mut source = format!("class {class} {{\n");
                let mut field_names = FxHashSet::default();
                for (ty, name) in fields {
                    if field_names.insert(name.clone()) {
                        source.push_str(&format!("  {ty} {name};\n"));
                    }
                }
                for (name, params) in methods {
                    let mut seen = FxHashSet::default();
                    let params: Vec<_> = params
                        .into_iter()
                        .filter(|(_, param)| seen.insert(param.clone()))
                        .collect();
                    let list: Vec<String> = params.iter().map(|(ty, p)| format!("{ty} {p}")).collect();
                    source.push_str(&format!("  void {name}({}) {{\n", list.join(", ")));
                    for (_, param) in &params {
                        source.push_str(&format!("    Object o{param} = {param};\n"));
                    }
                    source.push_str("  }\n");
                }
                source.push_str("}\n");
                source
            })
    }

    fn is_keyword(name: &str) -> bool {
        matches!(
            name,
            "do" | "if" | "for" | "int" | "new" | "try" | "var" | "byte" | "case" | "char" | "else" | "enum"
                | "goto" | "long" | "null" | "this" | "true" | "void" | "break" | "catch" | "class" | "const"
                | "false" | "final" | "float" | "short" | "super" | "throw" | "while" | "yield" | "record"
                | "double" | "import" | "native" | "public" | "return" | "static" | "switch" | "throws"
                | "assert" | "boolean" | "default" | "extends" | "finally" | "package" | "private"
                | "abstract" | "continue" | "strictfp" | "volatile" | "interface" | "protected"
                | "transient" | "implements" | "instanceof" | "synchronized" | "permits" | "sealed"
                | "exports" | "module" | "open" | "opens" | "provides" | "requires" | "to" | "transitive"
                | "uses" | "with"
        )
    }

    proptest! {
        #[test]
        fn test_generated_units_hold_invariants(source in arb_unit()) {
            let first = index(&source);
            let second = index(&source);
            prop_assert_eq!(&first, &second);
            assert_invariants(&source, &first);
            prop_assert!(first.diagnostics.is_empty(), "{:?} in {}", first.diagnostics, source);
        }
    }
}
