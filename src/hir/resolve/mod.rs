//! Scope Resolver.
//!
//! One depth-first traversal per compilation unit. Every declaration gets a
//! symbol and a definition occurrence over its identifier; every use is
//! linked to the declaration it denotes, or to a placeholder when nothing
//! does. Scopes live on an explicit [`ScopeStack`] owned by the traversal.
//!
//! ## Lookup order
//!
//! Values: locals and parameters, then fields of each enclosing class
//! (inherited ones included), innermost first, then static imports.
//!
//! Types: type parameters and local classes, member types of each enclosing
//! class, single-type imports, the unit's package, on-demand imports, the
//! implicit imports. Qualified names that do not start with a visible type
//! are read as `package.Type`.

mod decls;
mod exprs;
mod stmts;
mod types;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use text_size::TextRange;

use crate::base::{FileId, LineIndex};
use crate::classpath::{ClassInfo, ExternalSymbolTable, JavaType};
use crate::config::IndexerConfig;
use crate::error::NamingError;
use crate::index::{Documentation, OccurrenceEmitter, Role, SignatureRenderer, SymbolInformation, UnitIndex};
use crate::syntax::ast::{CompilationUnit, Ident, ImportDecl};

use super::diagnostics::DiagnosticCollector;
use super::env::{Segment, TypeEnv};
use super::ids::LocalIdAllocator;
use super::imports::ImportScope;
use super::overload::Candidate;
use super::project::ProjectIndex;
use super::scope::{ScopeKind, ScopeStack, ValueBinding};
use super::symbols::{Declaration, Symbol, SymbolKind, name_of};

/// Resolve one compilation unit against the project and the classpath.
pub fn resolve_unit(
    unit: &CompilationUnit,
    source: &str,
    file: FileId,
    project: &ProjectIndex,
    external: &ExternalSymbolTable,
    config: &IndexerConfig,
) -> UnitIndex {
    let resolver = Resolver {
        file,
        config,
        env: TypeEnv::new(project, external),
        imports: ImportScope::new(unit, &config.implicit_imports),
        lines: LineIndex::new(source),
        signatures: SignatureRenderer::new(source),
        scopes: ScopeStack::new(),
        locals: LocalIdAllocator::new(config.local_numbering),
        emitter: OccurrenceEmitter::new(),
        diagnostics: DiagnosticCollector::new(file),
        enclosing: Vec::new(),
        local_type_params: FxHashMap::default(),
        local_classes: 0,
    };
    resolver.run(unit)
}

/// What the receiver of a member access denotes.
#[derive(Clone, Debug)]
pub(super) enum Receiver {
    /// An expression of this static type.
    Value(JavaType),
    /// A type name, for static members and member types.
    Type(Arc<ClassInfo>),
    Unknown,
}

impl Receiver {
    fn ty(&self) -> JavaType {
        match self {
            Receiver::Value(ty) => ty.clone(),
            Receiver::Type(class) => class.self_type(),
            Receiver::Unknown => JavaType::Unknown,
        }
    }
}

pub(super) struct Resolver<'a> {
    file: FileId,
    config: &'a IndexerConfig,
    env: TypeEnv<'a>,
    imports: ImportScope,
    lines: LineIndex,
    signatures: SignatureRenderer<'a>,
    scopes: ScopeStack,
    locals: LocalIdAllocator,
    emitter: OccurrenceEmitter,
    diagnostics: DiagnosticCollector,
    /// Enclosing declarations, innermost last. Occurrences record the last
    /// one as their enclosing symbol.
    enclosing: Vec<Symbol>,
    /// Type parameter symbols of local and anonymous classes, by class key.
    local_type_params: FxHashMap<SmolStr, Vec<(SmolStr, Symbol)>>,
    /// Local and anonymous classes seen so far, for their registry keys.
    local_classes: u32,
}

impl<'a> Resolver<'a> {
    fn run(mut self, unit: &CompilationUnit) -> UnitIndex {
        let package = self.env.package_symbol(self.imports.package());
        self.scopes.push(ScopeKind::Package, Some(package));

        if let Some(decl) = &unit.package {
            self.annotations(&decl.annotations);
        }
        for import in &unit.imports {
            self.import(import);
        }
        for decl in &unit.types {
            let qualified = ImportScope::qualify(self.imports.package(), decl.name.as_str());
            self.type_decl(decl, &qualified);
        }
        self.scopes.pop();

        let (occurrences, symbols) = self.emitter.finish(&mut self.diagnostics);
        let diagnostics = self.diagnostics.finish();
        tracing::debug!(
            file = %self.file,
            occurrences = occurrences.len(),
            symbols = symbols.len(),
            diagnostics = diagnostics.len(),
            "resolved unit"
        );
        UnitIndex {
            file: self.file,
            occurrences,
            symbols,
            diagnostics,
        }
    }

    // ========================================================================
    // EMISSION
    // ========================================================================

    fn enclosing_symbol(&self) -> Option<Symbol> {
        self.enclosing.last().cloned()
    }

    pub(super) fn reference(&mut self, at: TextRange, symbol: Symbol) {
        let range = self.lines.range(at);
        let enclosing = self.enclosing_symbol();
        self.emitter.reference(range, symbol, enclosing);
    }

    /// Definition occurrence over `name`, with its hover documentation and
    /// symbol information.
    pub(super) fn define(
        &mut self,
        name: &Ident,
        symbol: &Symbol,
        signature: String,
        doc: Option<TextRange>,
        overrides: Vec<Symbol>,
    ) {
        let range = self.lines.range(name.range);
        let documentation = self.config.documentation.then(|| Documentation {
            signature: signature.clone(),
            comment: self.signatures.doc(doc),
        });
        let enclosing = self.enclosing_symbol();
        self.emitter
            .emit(range, symbol.clone(), Role::Definition, enclosing, documentation);
        self.emitter.symbol_info(SymbolInformation {
            symbol: symbol.clone(),
            kind: symbol.kind(),
            display_name: name.text.to_string(),
            signature: Some(signature),
            overrides,
        });
    }

    /// Report a chain of names nothing declares, with one placeholder per
    /// segment.
    pub(super) fn unresolved(&mut self, idents: &[&Ident], is_value: bool) {
        let Some(first) = idents.first() else {
            return;
        };
        let names: Vec<&str> = idents.iter().map(|i| i.as_str()).collect();
        let range = self.lines.range(first.range);
        self.diagnostics
            .unresolved_reference(range, &names.join("."));
        if self.config.emit_unresolved {
            for (ident, symbol) in idents.iter().zip(Symbol::placeholder_chain(&names, is_value)) {
                self.reference(ident.range, symbol);
            }
        }
    }

    pub(super) fn malformed(&mut self, at: TextRange, err: &NamingError) {
        tracing::warn!(file = %self.file, error = %err, "malformed declaration context");
        let range = self.lines.range(at);
        self.diagnostics.malformed_context(range, err);
    }

    /// A fresh `local<N>` symbol owned by the innermost enclosing
    /// declaration.
    pub(super) fn local_symbol(&mut self, kind: SymbolKind, at: TextRange) -> Option<Symbol> {
        let owner = self.enclosing.last().cloned();
        self.local_symbol_in(owner.as_ref(), kind, at)
    }

    /// A fresh `local<N>` symbol owned by `owner`.
    pub(super) fn local_symbol_in(&mut self, owner: Option<&Symbol>, kind: SymbolKind, at: TextRange) -> Option<Symbol> {
        let id = self.locals.fresh();
        match name_of(&Declaration::Local { id: id.index(), kind }, owner) {
            Ok(symbol) => Some(symbol),
            Err(err) => {
                self.malformed(at, &err);
                None
            }
        }
    }

    /// Define a parameter or local variable and bind it in the innermost
    /// scope.
    pub(super) fn declare_local(&mut self, name: &Ident, kind: SymbolKind, ty: JavaType, signature: String) {
        let Some(symbol) = self.local_symbol(kind, name.range) else {
            return;
        };
        self.define(name, &symbol, signature, None, Vec::new());
        self.scopes
            .bind_value(name.text.clone(), ValueBinding { symbol, ty });
    }

    // ========================================================================
    // LOOKUP
    // ========================================================================

    /// Innermost value named `name`: a local, a field of an enclosing class,
    /// or a static import.
    pub(super) fn lookup_value(&self, name: &str) -> Option<ValueBinding> {
        for scope in self.scopes.iter() {
            if let Some(binding) = scope.value(name) {
                return Some(binding.clone());
            }
            if let Some(class) = scope.class() {
                if let Some(field) = self.env.find_field(&class.self_type(), name) {
                    return Some(ValueBinding {
                        symbol: field.symbol,
                        ty: field.ty,
                    });
                }
            }
        }
        self.imports.static_owners(name).iter().find_map(|owner| {
            let class = self.env.class(owner)?;
            let field = self.env.find_field(&class.self_type(), name)?;
            Some(ValueBinding {
                symbol: field.symbol,
                ty: field.ty,
            })
        })
    }

    /// Methods an unqualified call to `name` may invoke: those of the
    /// innermost enclosing class that has any, else static imports.
    pub(super) fn lookup_methods(&self, name: &str) -> Vec<Candidate> {
        for class in self.scopes.enclosing_classes() {
            let candidates = self.env.methods(&class.self_type(), name);
            if !candidates.is_empty() {
                return candidates;
            }
        }
        self.imports
            .static_owners(name)
            .iter()
            .filter_map(|owner| self.env.class(owner))
            .flat_map(|class| self.env.methods(&class.self_type(), name))
            .filter(|candidate| candidate.is_static)
            .collect()
    }

    // ========================================================================
    // IMPORTS
    // ========================================================================

    fn import(&mut self, import: &ImportDecl) {
        let idents: Vec<&Ident> = import.path.segments.iter().collect();
        if import.is_static && !import.on_demand {
            let Some((member, owner)) = idents.split_last() else {
                return;
            };
            if let Some(class) = self.qualified(owner) {
                self.static_member(&class, member);
            }
        } else {
            self.qualified(&idents);
        }
    }

    /// Emit one reference per segment of a fully qualified name. Returns the
    /// class the whole name denotes, if it is one.
    pub(super) fn qualified(&mut self, idents: &[&Ident]) -> Option<Arc<ClassInfo>> {
        let names: Vec<&str> = idents.iter().map(|i| i.as_str()).collect();
        let segments = self.env.resolve_qualified(&names);
        self.emit_segments(idents, segments, false)
    }

    /// Emit the resolved segments of a dotted name; the first unresolved one
    /// and everything after it become placeholders.
    pub(super) fn emit_segments(
        &mut self,
        idents: &[&Ident],
        segments: Vec<Segment>,
        is_value: bool,
    ) -> Option<Arc<ClassInfo>> {
        let mut last = None;
        for (i, segment) in segments.into_iter().enumerate() {
            let Some(ident) = idents.get(i) else {
                break;
            };
            last = match segment {
                Segment::Package(symbol) => {
                    self.reference(ident.range, symbol);
                    None
                }
                Segment::Class(class) => {
                    self.reference(ident.range, class.symbol.clone());
                    Some(class)
                }
                Segment::TypeParam(symbol) => {
                    self.reference(ident.range, symbol);
                    None
                }
                Segment::Unresolved => {
                    self.unresolved(&idents[i..], is_value);
                    return None;
                }
            };
        }
        last
    }

    /// A statically imported member: field, method or member type.
    fn static_member(&mut self, class: &Arc<ClassInfo>, member: &Ident) {
        let name = member.as_str();
        if let Some(field) = self.env.find_field(&class.self_type(), name) {
            self.reference(member.range, field.symbol);
        } else if let Some(method) = self.env.methods(&class.self_type(), name).into_iter().next() {
            self.reference(member.range, method.symbol);
        } else if let Some(inner) = self.env.member_type(class, name) {
            self.reference(member.range, inner.symbol.clone());
        } else {
            self.unresolved(&[member], true);
        }
    }
}
