//! The lexical scope stack used during resolution.
//!
//! Scopes nest strictly: `Package → TypeBody → MethodBody → Block`, with
//! further type bodies for nested, local and anonymous classes. The stack is
//! owned by the traversal and passed by `&mut`; nothing is global.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::classpath::{ClassInfo, JavaType};

use super::symbols::Symbol;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Package,
    TypeBody,
    MethodBody,
    Block,
}

/// A variable, parameter or field binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueBinding {
    pub symbol: Symbol,
    pub ty: JavaType,
}

/// A type name bound lexically.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeBinding {
    /// Local class, or the class whose body this is.
    Class(Arc<ClassInfo>),
    TypeParam { name: SmolStr, symbol: Symbol },
}

#[derive(Clone, Debug)]
pub struct Scope {
    kind: ScopeKind,
    /// Declaration that opened the scope (type or method).
    owner: Option<Symbol>,
    /// Class of a type body.
    class: Option<Arc<ClassInfo>>,
    values: IndexMap<SmolStr, ValueBinding>,
    types: IndexMap<SmolStr, TypeBinding>,
}

impl Scope {
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn owner(&self) -> Option<&Symbol> {
        self.owner.as_ref()
    }

    pub fn class(&self) -> Option<&Arc<ClassInfo>> {
        self.class.as_ref()
    }

    pub fn value(&self, name: &str) -> Option<&ValueBinding> {
        self.values.get(name)
    }

    pub fn type_binding(&self, name: &str) -> Option<&TypeBinding> {
        self.types.get(name)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ScopeKind, owner: Option<Symbol>) {
        tracing::trace!(?kind, depth = self.scopes.len(), "push scope");
        self.scopes.push(Scope {
            kind,
            owner,
            class: None,
            values: IndexMap::new(),
            types: IndexMap::new(),
        });
    }

    /// Enter the body of `class`. Its members become visible through the
    /// class itself; its type parameters are bound here.
    pub fn push_type_body(&mut self, class: Arc<ClassInfo>, type_params: Vec<(SmolStr, Symbol)>) {
        self.push(ScopeKind::TypeBody, Some(class.symbol.clone()));
        if let Some(scope) = self.scopes.last_mut() {
            for (name, symbol) in type_params {
                scope
                    .types
                    .insert(name.clone(), TypeBinding::TypeParam { name, symbol });
            }
            scope.class = Some(class);
        }
    }

    pub fn pop(&mut self) -> Option<Scope> {
        let scope = self.scopes.pop();
        if let Some(scope) = &scope {
            tracing::trace!(kind = ?scope.kind, depth = self.scopes.len(), "pop scope");
        }
        scope
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current_kind(&self) -> Option<ScopeKind> {
        self.scopes.last().map(|s| s.kind)
    }

    /// Bind a value in the innermost scope. A later binding of the same name
    /// in the same scope replaces the earlier one.
    pub fn bind_value(&mut self, name: impl Into<SmolStr>, binding: ValueBinding) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.values.insert(name.into(), binding);
        }
    }

    pub fn bind_type(&mut self, name: impl Into<SmolStr>, binding: TypeBinding) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.types.insert(name.into(), binding);
        }
    }

    /// Scopes from innermost to outermost.
    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter().rev()
    }

    /// Innermost type body's class.
    pub fn enclosing_class(&self) -> Option<&Arc<ClassInfo>> {
        self.iter().find_map(Scope::class)
    }

    /// Classes of all enclosing type bodies, innermost first.
    pub fn enclosing_classes(&self) -> impl Iterator<Item = &Arc<ClassInfo>> {
        self.iter().filter_map(Scope::class)
    }

    /// Innermost declaration that opened a scope.
    pub fn owner(&self) -> Option<&Symbol> {
        self.iter().find_map(Scope::owner)
    }

    /// Innermost lexical type binding for `name`.
    pub fn lookup_type(&self, name: &str) -> Option<&TypeBinding> {
        self.iter().find_map(|scope| scope.type_binding(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::{ClassBuilder, Origin};
    use crate::hir::symbols::{Scheme, SymbolKind};

    fn local(name: &str) -> ValueBinding {
        ValueBinding {
            symbol: Symbol::placeholder(&[name], true),
            ty: JavaType::primitive("int"),
        }
    }

    fn class() -> Arc<ClassInfo> {
        let package = Symbol::package("a", Scheme::Project);
        ClassBuilder::new(&package, "a", "a.Foo", SymbolKind::Class, Origin::External)
            .unwrap()
            .build_arc()
    }

    #[test]
    fn test_lifo_push_pop() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::Package, None);
        stack.push_type_body(class(), Vec::new());
        stack.push(ScopeKind::MethodBody, None);
        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.pop().unwrap().kind(), ScopeKind::MethodBody);
        assert_eq!(stack.current_kind(), Some(ScopeKind::TypeBody));
        assert_eq!(stack.enclosing_class().unwrap().qualified_name, "a.Foo");
    }

    #[test]
    fn test_innermost_binding_wins() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::MethodBody, None);
        stack.bind_value("x", local("outer"));
        stack.push(ScopeKind::Block, None);
        stack.bind_value("x", local("inner"));
        let found = stack.iter().find_map(|s| s.value("x")).unwrap();
        assert_eq!(found.symbol.to_string(), "inner.");
        stack.pop();
        let found = stack.iter().find_map(|s| s.value("x")).unwrap();
        assert_eq!(found.symbol.to_string(), "outer.");
    }

    #[test]
    fn test_type_params_bound_in_type_body() {
        let mut stack = ScopeStack::new();
        let info = class();
        let param = Symbol::placeholder(&["T"], false);
        stack.push_type_body(info.clone(), vec![(SmolStr::new("T"), param.clone())]);
        assert_eq!(
            stack.lookup_type("T"),
            Some(&TypeBinding::TypeParam {
                name: SmolStr::new("T"),
                symbol: param
            })
        );
        assert_eq!(stack.owner(), Some(&info.symbol));
        assert!(stack.lookup_type("U").is_none());
    }
}
