//! Snapshot rendering: the textual form used to review an index by eye.
//!
//! Every source line is followed by one comment line per occurrence starting
//! on it:
//!
//! ```text
//! import android.widget.Space;
//! //     ^^^^^^^ reference android/
//! ```
//!
//! Definitions carry their signature after the symbol.

use crate::index::{Occurrence, UnitIndex};

/// Render `source` with the occurrences of `index` beneath each line.
pub fn render(source: &str, index: &UnitIndex) -> String {
    let mut out = String::with_capacity(source.len() * 2);
    for (line_no, line) in source.lines().enumerate() {
        out.push_str(line);
        out.push('\n');
        for occurrence in index.on_line(line_no as u32) {
            out.push_str(&annotation(line, index, occurrence));
            out.push('\n');
        }
    }
    out
}

fn annotation(line: &str, index: &UnitIndex, occurrence: &Occurrence) -> String {
    let start = occurrence.range.start.col as usize;
    // Ranges spanning lines are underlined to the end of their first line.
    let end = if occurrence.range.end.line == occurrence.range.start.line {
        occurrence.range.end.col as usize
    } else {
        line.len()
    };

    let mut text = String::from("//");
    text.push_str(&" ".repeat(start.saturating_sub(2)));
    text.push_str(&"^".repeat(end.saturating_sub(start).max(1)));
    text.push(' ');
    text.push_str(occurrence.role.as_str());
    text.push(' ');
    text.push_str(&occurrence.symbol.to_string());

    if occurrence.is_definition() {
        let signature = index
            .symbol_info(&occurrence.symbol)
            .and_then(|info| info.signature.as_deref())
            .or_else(|| occurrence.documentation.as_ref().map(|doc| doc.signature.as_str()));
        if let Some(signature) = signature {
            text.push(' ');
            text.push_str(signature);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{FileId, LineCol, Range};
    use crate::hir::{Declaration, Scheme, Symbol, SymbolKind, name_of};
    use crate::index::{Role, SymbolInformation};

    fn occurrence(line: u32, start: u32, end: u32, symbol: Symbol, role: Role) -> Occurrence {
        Occurrence {
            range: Range::new(LineCol::new(line, start), LineCol::new(line, end)),
            symbol,
            role,
            enclosing_symbol: None,
            documentation: None,
        }
    }

    #[test]
    fn test_render_carets_and_signatures() {
        let source = "import android.widget.Space;\nclass Foo {}\n";
        let package = Symbol::package("", Scheme::Project);
        let class = name_of(
            &Declaration::Type {
                name: "Foo",
                kind: SymbolKind::Class,
            },
            Some(&package),
        )
        .unwrap();
        let index = UnitIndex {
            file: FileId::new(0),
            occurrences: vec![
                occurrence(0, 7, 14, Symbol::package("android", Scheme::External), Role::Reference),
                occurrence(1, 6, 9, class.clone(), Role::Definition),
            ],
            symbols: vec![SymbolInformation {
                symbol: class,
                kind: SymbolKind::Class,
                display_name: "Foo".to_string(),
                signature: Some("class Foo".to_string()),
                overrides: Vec::new(),
            }],
            diagnostics: Vec::new(),
        };

        let rendered = render(source, &index);
        let expected = "import android.widget.Space;\n\
                        //     ^^^^^^^ reference android/\n\
                        class Foo {}\n\
                        //    ^^^ definition Foo# class Foo\n";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_leading_columns() {
        let source = "@Deprecated\n";
        let index = UnitIndex {
            file: FileId::new(0),
            occurrences: vec![occurrence(
                0,
                1,
                11,
                Symbol::placeholder(&["Deprecated"], false),
                Role::Reference,
            )],
            symbols: Vec::new(),
            diagnostics: Vec::new(),
        };
        assert_eq!(render(source, &index), "@Deprecated\n//^^^^^^^^^^ reference Deprecated#\n");
    }
}
