//! Occurrence records and the per-unit index.

use serde::Serialize;

use crate::base::{FileId, Range};
use crate::hir::Diagnostic;
use crate::hir::symbols::{Symbol, SymbolKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Definition,
    Reference,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Definition => "definition",
            Role::Reference => "reference",
        }
    }
}

/// Hover text attached to a definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Documentation {
    /// `@Override public int getSpanSize(int spanCount, int position, int itemCount)`
    pub signature: String,
    /// Cleaned text of the preceding `/** ... */` comment.
    pub comment: Option<String>,
}

/// One mention of a symbol at a source range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub range: Range,
    pub symbol: Symbol,
    pub role: Role,
    /// Innermost enclosing non-local declaration.
    pub enclosing_symbol: Option<Symbol>,
    pub documentation: Option<Documentation>,
}

impl Occurrence {
    pub fn is_definition(&self) -> bool {
        self.role == Role::Definition
    }
}

/// Per-definition metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SymbolInformation {
    pub symbol: Symbol,
    pub kind: SymbolKind,
    pub display_name: String,
    pub signature: Option<String>,
    /// Methods this one overrides; a relationship, never an identity.
    pub overrides: Vec<Symbol>,
}

/// Everything produced for one compilation unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnitIndex {
    pub file: FileId,
    pub occurrences: Vec<Occurrence>,
    pub symbols: Vec<SymbolInformation>,
    pub diagnostics: Vec<Diagnostic>,
}

impl UnitIndex {
    pub fn definitions(&self) -> impl Iterator<Item = &Occurrence> {
        self.occurrences.iter().filter(|o| o.is_definition())
    }

    pub fn references(&self) -> impl Iterator<Item = &Occurrence> {
        self.occurrences.iter().filter(|o| !o.is_definition())
    }

    /// All occurrences of `symbol`, in output order.
    pub fn occurrences_of<'a>(&'a self, symbol: &'a Symbol) -> impl Iterator<Item = &'a Occurrence> + 'a {
        self.occurrences.iter().filter(move |o| &o.symbol == symbol)
    }

    pub fn definition_of(&self, symbol: &Symbol) -> Option<&Occurrence> {
        self.definitions().find(|o| &o.symbol == symbol)
    }

    pub fn symbol_info(&self, symbol: &Symbol) -> Option<&SymbolInformation> {
        self.symbols.iter().find(|info| &info.symbol == symbol)
    }

    /// Occurrences whose range starts on `line` (zero-based).
    pub fn on_line(&self, line: u32) -> impl Iterator<Item = &Occurrence> {
        self.occurrences
            .iter()
            .filter(move |o| o.range.start.line == line)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
