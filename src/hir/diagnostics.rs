//! Diagnostics: non-fatal problems found while indexing a unit.
//!
//! None of these abort a unit: unresolved names still get a placeholder
//! occurrence, ambiguous overloads are settled by the tie-break, and a
//! declaration with a malformed context is skipped with its subtree.

use std::fmt;

use serde::Serialize;

use crate::base::{FileId, Range};
use crate::error::NamingError;

use super::symbols::Symbol;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The unit containing this diagnostic.
    pub file: FileId,
    pub range: Range,
    pub severity: Severity,
    /// Stable code, see [`codes`].
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn error(file: FileId, range: Range, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            file,
            range,
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(file: FileId, range: Range, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            file,
            range,
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}:{}: {}",
            self.severity, self.code, self.file, self.range.start, self.message
        )
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Stable diagnostic codes.
pub mod codes {
    /// A name that resolved to nothing; a placeholder was emitted.
    pub const UNRESOLVED_REFERENCE: &str = "J0001";
    /// Several overloads survived to the declaration-order tie-break.
    pub const AMBIGUOUS_OVERLOAD: &str = "J0002";
    /// A declaration whose owner cannot own it; its subtree was skipped.
    pub const MALFORMED_CONTEXT: &str = "J0003";
    /// Two occurrences partially overlap.
    pub const OVERLAPPING_OCCURRENCE: &str = "J0004";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics for one unit during resolution.
#[derive(Clone, Debug)]
pub struct DiagnosticCollector {
    file: FileId,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new(file: FileId) -> Self {
        Self {
            file,
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn unresolved_reference(&mut self, range: Range, name: &str) {
        self.add(Diagnostic::warning(
            self.file,
            range,
            codes::UNRESOLVED_REFERENCE,
            format!("unresolved reference: '{}'", name),
        ));
    }

    pub fn ambiguous_overload(&mut self, range: Range, name: &str, chosen: &Symbol, candidates: &[Symbol]) {
        let names: Vec<String> = candidates.iter().map(Symbol::to_string).collect();
        self.add(Diagnostic::warning(
            self.file,
            range,
            codes::AMBIGUOUS_OVERLOAD,
            format!(
                "ambiguous call to '{}': chose {} among {}",
                name,
                chosen,
                names.join(", ")
            ),
        ));
    }

    pub fn malformed_context(&mut self, range: Range, error: &NamingError) {
        self.add(Diagnostic::error(
            self.file,
            range,
            codes::MALFORMED_CONTEXT,
            error.to_string(),
        ));
    }

    pub fn overlapping_occurrence(&mut self, range: Range, other: Range) {
        self.add(Diagnostic::error(
            self.file,
            range,
            codes::OVERLAPPING_OCCURRENCE,
            format!("occurrence {:?} partially overlaps {:?}", range, other),
        ));
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Diagnostics in position order (stable for equal positions).
    pub fn finish(mut self) -> Vec<Diagnostic> {
        self.diagnostics.sort_by_key(|d| d.range.start);
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::symbols::Scheme;

    fn range(line: u32) -> Range {
        Range::on_line(line, 0, 3)
    }

    #[test]
    fn test_collector_counts() {
        let mut collector = DiagnosticCollector::new(FileId::new(0));
        collector.unresolved_reference(range(0), "Foo");
        collector.malformed_context(
            range(1),
            &NamingError::malformed("method f", "a method must be owned by a type"),
        );
        collector.overlapping_occurrence(range(2), Range::on_line(2, 1, 5));

        assert_eq!(collector.error_count(), 2);
        assert_eq!(collector.warning_count(), 1);
        assert!(collector.has_errors());
    }

    #[test]
    fn test_codes_are_stable() {
        let mut collector = DiagnosticCollector::new(FileId::new(0));
        collector.unresolved_reference(range(0), "Foo");
        let a = Symbol::package("a", Scheme::Project);
        collector.ambiguous_overload(range(1), "f", &a, &[a.clone()]);
        let codes: Vec<&str> = collector.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(codes, vec!["J0001", "J0002"]);
    }

    #[test]
    fn test_finish_sorts_by_position() {
        let mut collector = DiagnosticCollector::new(FileId::new(4));
        collector.unresolved_reference(range(3), "b");
        collector.unresolved_reference(range(1), "a");
        let diagnostics = collector.finish();
        assert_eq!(diagnostics[0].range.start.line, 1);
        assert_eq!(diagnostics[1].range.start.line, 3);
    }

    #[test]
    fn test_display() {
        let diag = Diagnostic::warning(
            FileId::new(2),
            Range::on_line(4, 6, 9),
            codes::UNRESOLVED_REFERENCE,
            "unresolved reference: 'Foo'",
        );
        assert_eq!(diag.to_string(), "warning[J0001] unit#2:5:7: unresolved reference: 'Foo'");
    }
}
