//! Occurrence Emitter.
//!
//! Occurrences are appended in traversal order and finalized once, at the
//! end of the unit: sorted, deduplicated, documentation trimmed to one
//! definition per symbol, and checked for partial overlap.

use std::cmp::Reverse;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::base::Range;
use crate::hir::DiagnosticCollector;
use crate::hir::symbols::Symbol;

use super::occurrence::{Documentation, Occurrence, Role, SymbolInformation};

#[derive(Debug, Default)]
pub struct OccurrenceEmitter {
    occurrences: Vec<Occurrence>,
    symbols: IndexMap<Symbol, SymbolInformation>,
}

impl OccurrenceEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(
        &mut self,
        range: Range,
        symbol: Symbol,
        role: Role,
        enclosing_symbol: Option<Symbol>,
        documentation: Option<Documentation>,
    ) {
        self.occurrences.push(Occurrence {
            range,
            symbol,
            role,
            enclosing_symbol,
            documentation,
        });
    }

    pub fn reference(&mut self, range: Range, symbol: Symbol, enclosing_symbol: Option<Symbol>) {
        self.emit(range, symbol, Role::Reference, enclosing_symbol, None);
    }

    /// Record per-definition metadata. The first record for a symbol wins.
    pub fn symbol_info(&mut self, info: SymbolInformation) {
        self.symbols.entry(info.symbol.clone()).or_insert(info);
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// Finalize the unit's output.
    pub fn finish(self, diagnostics: &mut DiagnosticCollector) -> (Vec<Occurrence>, Vec<SymbolInformation>) {
        let mut occurrences = self.occurrences;
        occurrences.sort_by_cached_key(|o| {
            (
                o.range.start,
                o.role,
                Reverse(o.range.end),
                o.symbol.to_string(),
            )
        });
        occurrences.dedup_by(|b, a| a.range == b.range && a.role == b.role && a.symbol == b.symbol);

        let mut documented = FxHashSet::default();
        for occurrence in &mut occurrences {
            let keep = occurrence.role == Role::Definition
                && occurrence.documentation.is_some()
                && documented.insert(occurrence.symbol.clone());
            if !keep {
                occurrence.documentation = None;
            }
        }

        for (i, a) in occurrences.iter().enumerate() {
            for b in occurrences[i + 1..]
                .iter()
                .take_while(|b| b.range.start < a.range.end)
            {
                if a.range.partially_overlaps(&b.range) {
                    tracing::debug!(first = %a.symbol, second = %b.symbol, "overlapping occurrences");
                    diagnostics.overlapping_occurrence(b.range, a.range);
                }
            }
        }

        let mut symbols: Vec<SymbolInformation> = self.symbols.into_values().collect();
        symbols.sort_by_cached_key(|info| info.symbol.to_string());
        (occurrences, symbols)
    }
}
