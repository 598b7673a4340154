//! Type, member and local class declarations.
//!
//! Member symbols are taken from the [`ClassInfo`] the declaration was
//! indexed as, so definitions agree with references made from other units.
//! Classes declared inside bodies are described here, on first sight, with
//! local symbols for them and all their members.

use std::sync::Arc;

use smol_str::SmolStr;
use text_size::TextRange;

use crate::classpath::{ClassInfo, FieldInfo, JavaType, MethodInfo, Origin};
use crate::error::NamingError;
use crate::syntax::ast::{EnumConstant, FieldDecl, Member, MethodDecl, Param, TypeDecl, TypeDeclKind};

use super::super::env::array_of;
use super::super::project::{supertypes, type_kind, type_param_bindings};
use super::super::scope::{ScopeKind, TypeBinding};
use super::super::symbols::{CONSTRUCTOR_NAME, Declaration, OverloadCounter, Symbol, SymbolKind, name_of};
use super::Resolver;

/// Hands out the symbols of a class's members as their declarations are
/// visited, in declaration order.
struct MemberNames {
    class: Arc<ClassInfo>,
    counter: OverloadCounter,
    methods: usize,
    constructors: usize,
}

impl MemberNames {
    fn new(class: &Arc<ClassInfo>) -> Self {
        Self {
            class: class.clone(),
            counter: OverloadCounter::new(),
            methods: 0,
            constructors: 0,
        }
    }

    fn field(&self, name: &str, kind: SymbolKind) -> Result<Symbol, NamingError> {
        match self.class.field(name) {
            Some(field) => Ok(field.symbol.clone()),
            None => name_of(&Declaration::Member { name, kind }, Some(&self.class.symbol)),
        }
    }

    fn callable(&mut self, method: &MethodDecl) -> Result<Symbol, NamingError> {
        if self.class.origin == Origin::Local {
            // Local members were given local symbols when the class was
            // described, in this same order.
            let list = if method.is_constructor() {
                self.constructors += 1;
                self.class.constructors.get(self.constructors - 1)
            } else {
                self.methods += 1;
                self.class.methods.get(self.methods - 1)
            };
            return list
                .map(|m| m.symbol.clone())
                .ok_or_else(|| NamingError::malformed(method.name.as_str(), "member of a local class was not described"));
        }
        let name = if method.is_constructor() {
            CONSTRUCTOR_NAME
        } else {
            method.name.as_str()
        };
        let disambiguator = self.counter.next(name);
        let decl = if method.is_constructor() {
            Declaration::Constructor { disambiguator }
        } else {
            Declaration::Method {
                name,
                disambiguator,
            }
        };
        name_of(&decl, Some(&self.class.symbol))
    }
}

impl Resolver<'_> {
    /// A top-level or member type, indexed under `qualified`.
    pub(super) fn type_decl(&mut self, decl: &TypeDecl, qualified: &str) {
        let Some(class) = self.env.class(qualified) else {
            let owner = self
                .enclosing
                .last()
                .cloned()
                .unwrap_or_else(|| self.env.package_symbol(self.imports.package()));
            let named = name_of(
                &Declaration::Type {
                    name: decl.name.as_str(),
                    kind: type_kind(decl.kind),
                },
                Some(&owner),
            );
            if let Err(err) = named {
                self.malformed(decl.name.range, &err);
            }
            return;
        };
        self.annotations(&decl.modifiers.annotations);
        let signature = self.signatures.type_decl(decl);
        self.define(&decl.name, &class.symbol, signature, decl.doc, Vec::new());

        let type_params = match self.local_type_params.get(class.qualified_name.as_str()) {
            Some(params) => params.clone(),
            None => type_param_bindings(&class),
        };
        self.type_body(decl, &class, type_params);
    }

    fn type_body(&mut self, decl: &TypeDecl, class: &Arc<ClassInfo>, type_params: Vec<(SmolStr, Symbol)>) {
        self.enclosing.push(class.symbol.clone());
        self.scopes.push_type_body(class.clone(), type_params.clone());

        for param in &decl.type_params {
            if let Some((_, symbol)) = type_params.iter().find(|(name, _)| *name == param.name.text) {
                self.type_param_def(param, symbol);
            }
        }
        self.type_refs(&decl.extends);
        self.type_refs(&decl.implements);
        self.type_refs(&decl.permits);

        let mut names = MemberNames::new(class);
        for constant in &decl.enum_constants {
            self.enum_constant(class, constant, &names);
        }
        for component in &decl.record_components {
            self.record_component(component, &names);
        }
        self.members(class, &decl.members, &mut names);

        self.scopes.pop();
        self.enclosing.pop();
    }

    fn members(&mut self, class: &Arc<ClassInfo>, members: &[Member], names: &mut MemberNames) {
        for member in members {
            match member {
                Member::Field(field) => self.field_decl(field, names),
                Member::Method(method) => self.method_decl(class, method, names),
                Member::Initializer { body, .. } => {
                    self.in_body(None, |this| this.block(body));
                }
                Member::Type(inner) => {
                    let qualified = format!("{}.{}", class.qualified_name, inner.name.as_str());
                    self.type_decl(inner, &qualified);
                }
            }
        }
    }

    /// Run `f` inside a fresh method-like body: initializer blocks and field
    /// initializers, with `owner` as the enclosing declaration.
    fn in_body(&mut self, owner: Option<Symbol>, f: impl FnOnce(&mut Self)) {
        if let Some(owner) = &owner {
            self.enclosing.push(owner.clone());
        }
        self.locals.enter_body();
        self.scopes.push(ScopeKind::MethodBody, owner.clone());
        f(self);
        self.scopes.pop();
        self.locals.exit_body();
        if owner.is_some() {
            self.enclosing.pop();
        }
    }

    fn field_decl(&mut self, field: &FieldDecl, names: &MemberNames) {
        self.annotations(&field.modifiers.annotations);
        self.type_ref(&field.ty);
        for declarator in &field.declarators {
            let symbol = match names.field(declarator.name.as_str(), SymbolKind::Field) {
                Ok(symbol) => symbol,
                Err(err) => {
                    self.malformed(declarator.name.range, &err);
                    continue;
                }
            };
            let signature = self
                .signatures
                .variable(&field.modifiers, &field.ty, declarator);
            self.define(&declarator.name, &symbol, signature, field.doc, Vec::new());
            if let Some(init) = &declarator.init {
                self.in_body(Some(symbol), |this| {
                    this.expr(init);
                });
            }
        }
    }

    fn enum_constant(&mut self, class: &Arc<ClassInfo>, constant: &EnumConstant, names: &MemberNames) {
        self.annotations(&constant.annotations);
        let symbol = match names.field(constant.name.as_str(), SymbolKind::EnumConstant) {
            Ok(symbol) => symbol,
            Err(err) => {
                self.malformed(constant.name.range, &err);
                return;
            }
        };
        let signature = self.signatures.enum_constant(constant);
        self.define(&constant.name, &symbol, signature, constant.doc, Vec::new());
        self.in_body(Some(symbol), |this| {
            for arg in constant.args.iter().flatten() {
                this.expr(arg);
            }
            if let Some(body) = &constant.body {
                this.anonymous_class(Some(class), class.self_type(), body, constant.name.range);
            }
        });
    }

    fn record_component(&mut self, component: &Param, names: &MemberNames) {
        self.annotations(&component.modifiers.annotations);
        match names.field(component.name.as_str(), SymbolKind::Field) {
            Ok(symbol) => {
                let signature = self.signatures.param(component);
                self.define(&component.name, &symbol, signature, None, Vec::new());
            }
            Err(err) => self.malformed(component.name.range, &err),
        }
        self.type_ref(&component.ty);
    }

    fn method_decl(&mut self, class: &Arc<ClassInfo>, method: &MethodDecl, names: &mut MemberNames) {
        let symbol = match names.callable(method) {
            Ok(symbol) => symbol,
            Err(err) => {
                self.malformed(method.name.range, &err);
                return;
            }
        };
        self.annotations(&method.modifiers.annotations);
        let overrides = if method.is_constructor() || method.modifiers.is_static() {
            Vec::new()
        } else {
            let params = class
                .methods
                .iter()
                .find(|m| m.symbol == symbol)
                .map(|m| m.params.clone())
                .unwrap_or_default();
            self.env.overridden(class, method.name.as_str(), &params)
        };
        let signature = self.signatures.method(method);
        self.define(&method.name, &symbol, signature, method.doc, overrides);

        self.enclosing.push(symbol.clone());
        self.locals.enter_body();
        self.scopes.push(ScopeKind::MethodBody, Some(symbol.clone()));

        // All type parameters are bound before any bound is read.
        let mut params = Vec::new();
        for param in &method.type_params {
            let param_symbol = if symbol.is_local() {
                self.local_symbol(SymbolKind::TypeParameter, param.name.range)
            } else {
                match name_of(&Declaration::TypeParameter { name: param.name.as_str() }, Some(&symbol)) {
                    Ok(param_symbol) => Some(param_symbol),
                    Err(err) => {
                        self.malformed(param.name.range, &err);
                        None
                    }
                }
            };
            if let Some(param_symbol) = param_symbol {
                self.scopes.bind_type(
                    param.name.text.clone(),
                    TypeBinding::TypeParam {
                        name: param.name.text.clone(),
                        symbol: param_symbol.clone(),
                    },
                );
                params.push((param, param_symbol));
            }
        }
        for (param, param_symbol) in params {
            self.type_param_def(param, &param_symbol);
        }

        if let Some(returns) = &method.return_type {
            self.type_ref(returns);
        }
        for param in &method.params {
            self.annotations(&param.modifiers.annotations);
            let ty = self.type_ref(&param.ty);
            let ty = if param.varargs { array_of(ty, 1) } else { ty };
            let signature = self.signatures.param(param);
            self.declare_local(&param.name, SymbolKind::Parameter, ty, signature);
        }
        self.type_refs(&method.throws);
        if let Some(body) = &method.body {
            self.block(body);
        }
        if let Some(default) = &method.default_value {
            self.expr(default);
        }

        self.scopes.pop();
        self.locals.exit_body();
        self.enclosing.pop();
    }

    // ========================================================================
    // LOCAL AND ANONYMOUS CLASSES
    // ========================================================================

    /// A class declared in a statement. Visible in its own body and in the
    /// rest of the enclosing block.
    pub(super) fn local_type_decl(&mut self, decl: &TypeDecl) {
        let Some(symbol) = self.local_symbol(type_kind(decl.kind), decl.name.range) else {
            return;
        };
        let key = format!("<local>{}", self.local_classes);
        self.local_classes += 1;

        let class = self.register_local(decl, key, symbol, true);
        self.annotations(&decl.modifiers.annotations);
        let signature = self.signatures.type_decl(decl);
        self.define(&decl.name, &class.symbol, signature, decl.doc, Vec::new());
        let type_params = self
            .local_type_params
            .get(class.qualified_name.as_str())
            .cloned()
            .unwrap_or_default();
        self.type_body(decl, &class, type_params);
    }

    /// Name, describe and register a class declared inside a body, with its
    /// member types. `bind` makes the simple name visible in the current
    /// scope before the members are described.
    fn register_local(&mut self, decl: &TypeDecl, key: String, symbol: Symbol, bind: bool) -> Arc<ClassInfo> {
        let mut type_params = Vec::new();
        for param in &decl.type_params {
            if let Some(param_symbol) = self.local_symbol_in(Some(&symbol), SymbolKind::TypeParameter, param.name.range) {
                type_params.push((param.name.text.clone(), param_symbol));
            }
        }
        self.local_type_params
            .insert(SmolStr::new(&key), type_params.clone());

        let mut header = local_header(&key, self.imports.package(), symbol);
        header.type_params = type_params.iter().map(|(name, _)| name.clone()).collect();
        let provisional = self.env.add_local_class(header.clone());
        if bind {
            self.scopes
                .bind_type(decl.name.text.clone(), TypeBinding::Class(provisional.clone()));
        }

        self.scopes
            .push_type_body(provisional.clone(), type_params.clone());
        let (superclass, interfaces) = supertypes(&self.env, &self.scopes, &self.imports, decl, &provisional);
        self.scopes.pop();
        header.superclass = superclass;
        header.interfaces = interfaces;
        let header = self.env.add_local_class(header);

        self.scopes.push_type_body(header.clone(), type_params);
        for member in &decl.members {
            if let Member::Type(inner) = member {
                let inner_key = format!("{}.{}", key, inner.name.as_str());
                if let Some(inner_symbol) =
                    self.local_symbol_in(Some(&header.symbol), type_kind(inner.kind), inner.name.range)
                {
                    self.register_local(inner, inner_key, inner_symbol, false);
                }
            }
        }
        let info = self.describe_local(
            (*header).clone(),
            decl.kind,
            &decl.enum_constants,
            &decl.record_components,
            &decl.members,
            decl.name.range,
        );
        self.scopes.pop();

        let class = self.env.add_local_class(info);
        if bind {
            self.scopes
                .bind_type(decl.name.text.clone(), TypeBinding::Class(class.clone()));
        }
        class
    }

    /// Anonymous class body of a `new` expression or an enum constant.
    /// Returns the class so member accesses on the created value resolve.
    pub(super) fn anonymous_class(
        &mut self,
        supertype_class: Option<&Arc<ClassInfo>>,
        supertype: JavaType,
        members: &[Member],
        at: TextRange,
    ) -> Option<Arc<ClassInfo>> {
        let symbol = self.local_symbol(SymbolKind::Class, at)?;
        let key = format!("<anon>{}", self.local_classes);
        self.local_classes += 1;

        let mut header = local_header(&key, self.imports.package(), symbol);
        match supertype_class {
            Some(parent) if parent.is_interface() => {
                header.superclass = Some(JavaType::object());
                header.interfaces = vec![supertype];
            }
            Some(_) => header.superclass = Some(supertype),
            None => header.superclass = Some(JavaType::object()),
        }
        let header = self.env.add_local_class(header);

        self.scopes.push_type_body(header.clone(), Vec::new());
        for member in members {
            if let Member::Type(inner) = member {
                let inner_key = format!("{}.{}", key, inner.name.as_str());
                if let Some(inner_symbol) =
                    self.local_symbol_in(Some(&header.symbol), type_kind(inner.kind), inner.name.range)
                {
                    self.register_local(inner, inner_key, inner_symbol, false);
                }
            }
        }
        let info = self.describe_local((*header).clone(), TypeDeclKind::Class, &[], &[], members, at);
        self.scopes.pop();
        let class = self.env.add_local_class(info);

        self.enclosing.push(class.symbol.clone());
        self.scopes.push_type_body(class.clone(), Vec::new());
        let mut names = MemberNames::new(&class);
        self.members(&class, members, &mut names);
        self.scopes.pop();
        self.enclosing.pop();
        Some(class)
    }

    /// Member model of a local class, every member with a fresh local
    /// symbol. Mirrors what the project index records for named classes.
    fn describe_local(
        &mut self,
        mut info: ClassInfo,
        kind: TypeDeclKind,
        constants: &[EnumConstant],
        components: &[Param],
        members: &[Member],
        at: TextRange,
    ) -> ClassInfo {
        let owner = info.symbol.clone();
        let self_type = info.self_type();
        let is_interface = matches!(kind, TypeDeclKind::Interface | TypeDeclKind::Annotation);

        for constant in constants {
            if let Some(symbol) = self.local_symbol_in(Some(&owner), SymbolKind::EnumConstant, constant.name.range) {
                info.fields.push(FieldInfo {
                    name: constant.name.text.clone(),
                    ty: self_type.clone(),
                    is_static: true,
                    symbol,
                });
            }
        }
        let component_types: Vec<JavaType> = components
            .iter()
            .map(|c| self.env.convert_param(&self.scopes, &self.imports, c))
            .collect();
        for (component, ty) in components.iter().zip(&component_types) {
            if let Some(symbol) = self.local_symbol_in(Some(&owner), SymbolKind::Field, component.name.range) {
                info.fields.push(FieldInfo {
                    name: component.name.text.clone(),
                    ty: ty.clone(),
                    is_static: false,
                    symbol,
                });
            }
        }

        for member in members {
            match member {
                Member::Field(field) => {
                    let ty = self.env.convert(&self.scopes, &self.imports, &field.ty);
                    for declarator in &field.declarators {
                        if let Some(symbol) =
                            self.local_symbol_in(Some(&owner), SymbolKind::Field, declarator.name.range)
                        {
                            info.fields.push(FieldInfo {
                                name: declarator.name.text.clone(),
                                ty: array_of(ty.clone(), declarator.extra_dims),
                                is_static: is_interface || field.modifiers.is_static(),
                                symbol,
                            });
                        }
                    }
                }
                Member::Method(method) => {
                    let kind = if method.is_constructor() {
                        SymbolKind::Constructor
                    } else {
                        SymbolKind::Method
                    };
                    let Some(symbol) = self.local_symbol_in(Some(&owner), kind, method.name.range) else {
                        continue;
                    };
                    // Method type parameters only need to be recognized as
                    // type variables here.
                    self.scopes.push(ScopeKind::MethodBody, None);
                    for param in &method.type_params {
                        self.scopes.bind_type(
                            param.name.text.clone(),
                            TypeBinding::TypeParam {
                                name: param.name.text.clone(),
                                symbol: Symbol::placeholder(&[param.name.as_str()], false),
                            },
                        );
                    }
                    let mut params: Vec<JavaType> = method
                        .params
                        .iter()
                        .map(|p| self.env.convert_param(&self.scopes, &self.imports, p))
                        .collect();
                    let returns = method
                        .return_type
                        .as_ref()
                        .map(|ty| self.env.convert(&self.scopes, &self.imports, ty));
                    self.scopes.pop();

                    if method.is_constructor() {
                        if method.compact {
                            params = component_types.clone();
                        }
                        info.constructors.push(MethodInfo {
                            name: SmolStr::new_static(CONSTRUCTOR_NAME),
                            params,
                            varargs: method.is_varargs(),
                            returns: self_type.clone(),
                            is_static: false,
                            symbol,
                        });
                    } else {
                        info.methods.push(MethodInfo {
                            name: method.name.text.clone(),
                            params,
                            varargs: method.is_varargs(),
                            returns: returns.unwrap_or(JavaType::Unknown),
                            is_static: method.modifiers.is_static(),
                            symbol,
                        });
                    }
                }
                Member::Initializer { .. } | Member::Type(_) => {}
            }
        }

        for (component, ty) in components.iter().zip(component_types) {
            let declared = info
                .methods
                .iter()
                .any(|m| m.name == component.name.text && m.params.is_empty());
            if declared {
                continue;
            }
            if let Some(symbol) = self.local_symbol_in(Some(&owner), SymbolKind::Method, component.name.range) {
                info.methods.push(MethodInfo {
                    name: component.name.text.clone(),
                    params: Vec::new(),
                    varargs: false,
                    returns: ty,
                    is_static: false,
                    symbol,
                });
            }
        }
        if kind == TypeDeclKind::Enum {
            let synthesized = [
                ("values", Vec::new(), array_of(self_type.clone(), 1)),
                ("valueOf", vec![JavaType::string()], self_type.clone()),
            ];
            for (name, params, returns) in synthesized {
                if let Some(symbol) = self.local_symbol_in(Some(&owner), SymbolKind::Method, at) {
                    info.methods.push(MethodInfo {
                        name: SmolStr::new_static(name),
                        params,
                        varargs: false,
                        returns,
                        is_static: true,
                        symbol,
                    });
                }
            }
        }
        info
    }
}

fn local_header(key: &str, package: &str, symbol: Symbol) -> ClassInfo {
    ClassInfo {
        qualified_name: SmolStr::new(key),
        package: SmolStr::new(package),
        symbol,
        origin: Origin::Local,
        type_params: Vec::new(),
        superclass: None,
        interfaces: Vec::new(),
        fields: Vec::new(),
        methods: Vec::new(),
        constructors: Vec::new(),
        synthetic_members: false,
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{at, index, index_with, symbols};
    use crate::config::{IndexerConfig, LocalNumbering};

    #[test]
    fn test_hidden_epoxy_model_definitions() {
        let source = "package com.airbnb.epoxy;\n\
                      \n\
                      import android.widget.Space;\n\
                      import com.airbnb.viewmodeladapter.R;\n\
                      \n\
                      /** Used by the adapter to hide a model. */\n\
                      class HiddenEpoxyModel extends EpoxyModel<Space> {\n\
                      \x20 @Override\n\
                      \x20 public int getDefaultLayout() {\n\
                      \x20   return R.layout.view_holder_empty_view;\n\
                      \x20 }\n\
                      \n\
                      \x20 @Override\n\
                      \x20 public int getSpanSize(int spanCount, int position, int itemCount) {\n\
                      \x20   return 0;\n\
                      \x20 }\n\
                      }\n";
        let index = index(source);
        let defs: Vec<String> = index.definitions().map(|o| o.symbol.to_string()).collect();
        assert_eq!(
            defs,
            vec![
                "com/airbnb/epoxy/HiddenEpoxyModel#",
                "com/airbnb/epoxy/HiddenEpoxyModel#getDefaultLayout().",
                "com/airbnb/epoxy/HiddenEpoxyModel#getSpanSize().",
                "local0",
                "local1",
                "local2",
            ]
        );
        let model = index
            .symbols
            .iter()
            .find(|s| s.symbol.to_string() == "com/airbnb/epoxy/HiddenEpoxyModel#getDefaultLayout().")
            .unwrap();
        assert_eq!(model.signature.as_deref(), Some("@Override public int getDefaultLayout()"));
        assert_eq!(
            model.overrides.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["com/airbnb/epoxy/EpoxyModel#getDefaultLayout()."]
        );
        assert!(index.diagnostics.is_empty());
    }

    #[test]
    fn test_nested_types_and_members() {
        let source = "package a;\nclass Outer { static class Inner { int v; } Inner make() { return new Inner(); } }\n";
        let index = index(source);
        assert_eq!(at(&index, source, "Inner {"), vec!["definition a/Outer#Inner#"]);
        assert_eq!(at(&index, source, "v;"), vec!["definition a/Outer#Inner#v."]);
        assert_eq!(at(&index, source, "Inner make"), vec!["reference a/Outer#Inner#"]);
        assert_eq!(at(&index, source, "make"), vec!["definition a/Outer#make()."]);
    }

    #[test]
    fn test_overloaded_definitions_and_constructors() {
        let source = "class A { A() {} A(int x) {} void f() {} void f(int x) {} }";
        let index = index(source);
        let defs: Vec<String> = symbols(&index)
            .into_iter()
            .filter(|s| s.starts_with("definition A#"))
            .collect();
        assert_eq!(
            defs,
            vec![
                "definition A#",
                "definition A#`<init>`().",
                "definition A#`<init>`(+1).",
                "definition A#f().",
                "definition A#f(+1)."
            ]
        );
    }

    #[test]
    fn test_method_type_parameters() {
        let source = "class A { <T extends Comparable<T>> T max(T a, T b) { return a; } }";
        let index = index(source);
        assert_eq!(at(&index, source, "T extends"), vec!["definition A#max().[T]"]);
        assert_eq!(at(&index, source, "T max"), vec!["reference A#max().[T]"]);
        assert_eq!(at(&index, source, "T a"), vec!["reference A#max().[T]"]);
    }

    #[test]
    fn test_enum_constants_and_bodies() {
        let source = "enum Op {\n\
                      PLUS { int apply(int a, int b) { return a + b; } },\n\
                      MINUS(1);\n\
                      Op() {}\n\
                      Op(int w) {}\n\
                      int apply(int a, int b) { return 0; }\n\
                      }\n";
        let index = index(source);
        assert_eq!(at(&index, source, "PLUS"), vec!["definition Op#PLUS."]);
        assert_eq!(at(&index, source, "MINUS"), vec!["definition Op#MINUS."]);
        // The method of the constant body is local to it.
        let body_apply = at(&index, source, "apply(int a, int b) { return a");
        assert_eq!(body_apply.len(), 1);
        assert!(body_apply[0].starts_with("definition local"));
        assert_eq!(
            at(&index, source, "apply(int a, int b) { return 0"),
            vec!["definition Op#apply()."]
        );
    }

    #[test]
    fn test_record_components_and_accessors() {
        let source = "record Point(int x, int y) { int sum() { return x() + y; } }";
        let index = index(source);
        assert_eq!(at(&index, source, "x, int"), vec!["definition Point#x."]);
        assert_eq!(at(&index, source, "x()"), vec!["reference Point#x()."]);
        assert_eq!(at(&index, source, "y; }"), vec!["reference Point#y."]);
    }

    #[test]
    fn test_local_class_members_are_local() {
        let source = "class A {\n\
                      void f() {\n\
                      class Counter { int n; int next() { return ++n; } }\n\
                      Counter c = new Counter();\n\
                      c.next();\n\
                      }\n\
                      }\n";
        let index = index(source);
        let counter = at(&index, source, "Counter {");
        assert_eq!(counter.len(), 1);
        assert!(counter[0].starts_with("definition local"));
        let next_def = at(&index, source, "next() {");
        let next_ref = at(&index, source, "next();");
        assert_eq!(next_def.len(), 1);
        assert_eq!(
            next_ref[0].trim_start_matches("reference "),
            next_def[0].trim_start_matches("definition ")
        );
        let n_ref = at(&index, source, "n; }");
        assert_eq!(
            n_ref[0].trim_start_matches("reference "),
            at(&index, source, "n; int")[0].trim_start_matches("definition ")
        );
        assert!(index.diagnostics.is_empty());
    }

    #[test]
    fn test_anonymous_class_overrides() {
        let source = "class A { Runnable r = new Runnable() { public void run() { } }; }";
        let index = index(source);
        assert_eq!(at(&index, source, "Runnable()"), vec!["reference java/lang/Runnable#"]);
        let run = index
            .symbols
            .iter()
            .find(|s| s.display_name == "run")
            .unwrap();
        assert!(run.symbol.is_local());
        assert_eq!(
            run.overrides.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["java/lang/Runnable#run()."]
        );
    }

    #[test]
    fn test_field_initializer_locals() {
        let source = "class A { int[] xs = new int[] { 1 }; int n = xs.length; }";
        let index = index(source);
        assert_eq!(at(&index, source, "xs.length"), vec!["reference A#xs."]);
        assert!(at(&index, source, "length").is_empty());
        assert!(index.diagnostics.is_empty());
    }

    #[test]
    fn test_per_method_numbering_continues_into_anonymous_class_bodies() {
        let source = "class A {\n\
                      void f(int a) { Runnable r = new Runnable() { public void run() { int b = 0; } }; }\n\
                      void g(int c) {}\n\
                      }\n";
        let config = IndexerConfig::default().with_local_numbering(LocalNumbering::PerMethod);
        let index = index_with(source, &config);
        assert_eq!(at(&index, source, "a)"), vec!["definition local0"]);
        let r = at(&index, source, "r =");
        let b = at(&index, source, "b =");
        assert_eq!(r.len(), 1);
        assert_eq!(b.len(), 1);
        assert_ne!(r, b);
        assert_ne!(b, vec!["definition local0"]);
        // Each top-level method starts over.
        assert_eq!(at(&index, source, "c)"), vec!["definition local0"]);

        let f_locals: Vec<String> = index
            .symbols
            .iter()
            .filter(|s| s.symbol.is_local() && s.display_name != "c")
            .map(|s| s.symbol.to_string())
            .collect();
        let mut unique = f_locals.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), f_locals.len(), "{f_locals:?}");
    }
}
