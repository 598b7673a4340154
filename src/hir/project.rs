//! Declarations of every project compilation unit, named and typed.
//!
//! Built before any unit is resolved so that a reference in one unit can
//! link to a declaration in another. Construction runs in three passes over
//! the type declarations of all units:
//!
//! 1. skeleton: symbols and type parameters
//! 2. headers: supertypes, resolved against the skeleton
//! 3. members: fields, methods and constructors, resolved against headers
//!
//! Member symbols are assigned by [`ClassBuilder`] in declaration order. The
//! resolver names the same declarations with the same counters, so both
//! agree textually.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::debug;

use crate::base::FileId;
use crate::classpath::{ClassBuilder, ClassInfo, ExternalSymbolTable, JavaType, Origin, TypeSource};
use crate::config::IndexerConfig;
use crate::error::NamingError;
use crate::syntax::ast::{CompilationUnit, Member, TypeDecl, TypeDeclKind};

use super::env::{TypeEnv, array_of};
use super::imports::ImportScope;
use super::scope::{ScopeKind, ScopeStack, TypeBinding};
use super::symbols::{CONSTRUCTOR_NAME, Declaration, Scheme, Symbol, SymbolKind, name_of};

/// Every class declared in the project, keyed by dotted qualified name
/// (`com.airbnb.epoxy.Outer.Inner`).
#[derive(Clone, Debug, Default)]
pub struct ProjectIndex {
    classes: FxHashMap<SmolStr, Arc<ClassInfo>>,
    packages: FxHashSet<SmolStr>,
}

/// A member or top-level type declaration with its place in the project.
struct Site<'u> {
    file: FileId,
    unit: &'u CompilationUnit,
    decl: &'u TypeDecl,
    qualified: String,
    /// Qualified names of the enclosing types, outermost first.
    parents: Vec<String>,
}

impl ProjectIndex {
    pub fn build(
        units: &[(FileId, &CompilationUnit)],
        external: &ExternalSymbolTable,
        config: &IndexerConfig,
    ) -> Self {
        let mut sites = Vec::new();
        let mut packages = FxHashSet::default();
        for (file, unit) in units {
            let package = unit.package_name();
            let mut prefix = String::new();
            for segment in package.split('.').filter(|s| !s.is_empty()) {
                if !prefix.is_empty() {
                    prefix.push('.');
                }
                prefix.push_str(segment);
                packages.insert(SmolStr::new(&prefix));
            }
            for decl in &unit.types {
                collect_sites(*file, unit, decl, ImportScope::qualify(&package, decl.name.as_str()), Vec::new(), &mut sites);
            }
        }

        let skeleton = Self::skeleton(&sites, packages);
        let headers = skeleton.with_headers(&sites, external, config);
        let index = headers.with_members(&sites, external, config);
        debug!(
            classes = index.classes.len(),
            packages = index.packages.len(),
            "project index built"
        );
        index
    }

    fn skeleton(sites: &[Site<'_>], packages: FxHashSet<SmolStr>) -> Self {
        let mut index = Self {
            classes: FxHashMap::default(),
            packages,
        };
        // Sites are in pre-order, so a parent is always named before its
        // member types.
        for site in sites {
            let package = site.unit.package_name();
            let owner = match site.parents.last() {
                Some(parent) => match index.classes.get(parent.as_str()) {
                    Some(parent) => parent.symbol.clone(),
                    None => continue,
                },
                None => Symbol::package(&package, Scheme::Project),
            };
            let built = ClassBuilder::new(
                &owner,
                &package,
                &site.qualified,
                type_kind(site.decl.kind),
                Origin::Project(site.file),
            );
            match built {
                Ok(mut builder) => {
                    for param in &site.decl.type_params {
                        builder.type_param(param.name.as_str());
                    }
                    index.insert(builder.build());
                }
                Err(err) => debug!(class = %site.qualified, %err, "skipping unnameable type"),
            }
        }
        index
    }

    fn with_headers(&self, sites: &[Site<'_>], external: &ExternalSymbolTable, config: &IndexerConfig) -> Self {
        let env = TypeEnv::new(self, external);
        let mut next = Self {
            classes: FxHashMap::default(),
            packages: self.packages.clone(),
        };
        for site in sites {
            let Some(class) = self.classes.get(site.qualified.as_str()) else {
                continue;
            };
            let imports = ImportScope::new(site.unit, &config.implicit_imports);
            let scopes = enclosing_scopes(&env, site);
            let (superclass, interfaces) = supertypes(&env, &scopes, &imports, site.decl, class);
            let mut header = (**class).clone();
            header.superclass = superclass;
            header.interfaces = interfaces;
            next.insert(header);
        }
        next
    }

    fn with_members(&self, sites: &[Site<'_>], external: &ExternalSymbolTable, config: &IndexerConfig) -> Self {
        let env = TypeEnv::new(self, external);
        let mut next = Self {
            classes: FxHashMap::default(),
            packages: self.packages.clone(),
        };
        for site in sites {
            let Some(header) = self.classes.get(site.qualified.as_str()) else {
                continue;
            };
            let imports = ImportScope::new(site.unit, &config.implicit_imports);
            let mut scopes = enclosing_scopes(&env, site);
            let mut builder = ClassBuilder::from_header((**header).clone());
            describe_members(&env, &mut scopes, &imports, site.decl, &mut builder);
            next.insert(builder.build());
        }
        next
    }

    pub fn insert(&mut self, class: ClassInfo) {
        self.classes
            .insert(class.qualified_name.clone(), Arc::new(class));
    }

    pub fn class(&self, qualified: &str) -> Option<Arc<ClassInfo>> {
        self.classes.get(qualified).cloned()
    }

    /// Whether any project unit declares a package named `package` or
    /// nested under it.
    pub fn has_package(&self, package: &str) -> bool {
        self.packages.contains(package)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes declared in `file`.
    pub fn classes_in(&self, file: FileId) -> impl Iterator<Item = &Arc<ClassInfo>> {
        self.classes
            .values()
            .filter(move |c| c.origin == Origin::Project(file))
    }
}

impl TypeSource for ProjectIndex {
    fn class(&self, qualified: &str) -> Option<Arc<ClassInfo>> {
        ProjectIndex::class(self, qualified)
    }

    fn has_package(&self, package: &str) -> bool {
        ProjectIndex::has_package(self, package)
    }
}

fn collect_sites<'u>(
    file: FileId,
    unit: &'u CompilationUnit,
    decl: &'u TypeDecl,
    qualified: String,
    parents: Vec<String>,
    out: &mut Vec<Site<'u>>,
) {
    let mut inner_parents = parents.clone();
    inner_parents.push(qualified.clone());
    out.push(Site {
        file,
        unit,
        decl,
        qualified: qualified.clone(),
        parents,
    });
    for member in &decl.members {
        if let Member::Type(inner) = member {
            let name = format!("{}.{}", qualified, inner.name.as_str());
            collect_sites(file, unit, inner, name, inner_parents.clone(), out);
        }
    }
}

/// Scopes in effect inside `site`'s body: the package, then every enclosing
/// type body including its own.
fn enclosing_scopes(env: &TypeEnv<'_>, site: &Site<'_>) -> ScopeStack {
    let mut scopes = ScopeStack::new();
    scopes.push(
        ScopeKind::Package,
        Some(env.package_symbol(&site.unit.package_name())),
    );
    for qualified in site.parents.iter().chain(std::iter::once(&site.qualified)) {
        if let Some(class) = env.class(qualified) {
            let params = type_param_bindings(&class);
            scopes.push_type_body(class, params);
        }
    }
    scopes
}

pub(crate) fn type_kind(kind: TypeDeclKind) -> SymbolKind {
    match kind {
        TypeDeclKind::Class => SymbolKind::Class,
        TypeDeclKind::Interface => SymbolKind::Interface,
        TypeDeclKind::Enum => SymbolKind::Enum,
        TypeDeclKind::Record => SymbolKind::Record,
        TypeDeclKind::Annotation => SymbolKind::Annotation,
    }
}

/// Symbols of a class's own type parameters.
pub(crate) fn type_param_bindings(class: &ClassInfo) -> Vec<(SmolStr, Symbol)> {
    class
        .type_params
        .iter()
        .filter_map(|name| {
            name_of(&Declaration::TypeParameter { name }, Some(&class.symbol))
                .ok()
                .map(|symbol| (name.clone(), symbol))
        })
        .collect()
}

/// Declared supertypes, with the implicit ones filled in: `Object` for
/// classes, `Enum<Self>` for enums, `Record` for records.
pub(crate) fn supertypes(
    env: &TypeEnv<'_>,
    scopes: &ScopeStack,
    imports: &ImportScope,
    decl: &TypeDecl,
    class: &ClassInfo,
) -> (Option<JavaType>, Vec<JavaType>) {
    let convert = |types: &[crate::syntax::ast::TypeRef]| -> Vec<JavaType> {
        types
            .iter()
            .map(|ty| env.convert(scopes, imports, ty))
            .filter(JavaType::is_known)
            .collect()
    };
    let implements = convert(&decl.implements);
    match decl.kind {
        TypeDeclKind::Class => {
            let superclass = convert(&decl.extends).into_iter().next().or_else(|| {
                (class.qualified_name != "java.lang.Object").then(JavaType::object)
            });
            (superclass, implements)
        }
        TypeDeclKind::Interface | TypeDeclKind::Annotation => (None, convert(&decl.extends)),
        TypeDeclKind::Enum => (
            Some(JavaType::Class {
                name: SmolStr::new_static("java.lang.Enum"),
                args: vec![class.self_type()],
            }),
            implements,
        ),
        TypeDeclKind::Record => (Some(JavaType::class("java.lang.Record")), implements),
    }
}

/// Add the members of `decl` to `builder`, in declaration order, followed
/// by the implicit record accessors and enum methods.
pub(crate) fn describe_members(
    env: &TypeEnv<'_>,
    scopes: &mut ScopeStack,
    imports: &ImportScope,
    decl: &TypeDecl,
    builder: &mut ClassBuilder,
) {
    let self_type = builder.info().self_type();
    let is_interface = matches!(decl.kind, TypeDeclKind::Interface | TypeDeclKind::Annotation);

    for constant in &decl.enum_constants {
        report(builder.field(constant.name.as_str(), self_type.clone(), true, SymbolKind::EnumConstant));
    }
    let components: Vec<(SmolStr, JavaType)> = decl
        .record_components
        .iter()
        .map(|c| (c.name.text.clone(), env.convert_param(scopes, imports, c)))
        .collect();
    for (name, ty) in &components {
        report(builder.field(name, ty.clone(), false, SymbolKind::Field));
    }

    for member in &decl.members {
        match member {
            Member::Field(field) => {
                let ty = env.convert(scopes, imports, &field.ty);
                for declarator in &field.declarators {
                    report(builder.field(
                        declarator.name.as_str(),
                        array_of(ty.clone(), declarator.extra_dims),
                        is_interface || field.modifiers.is_static(),
                        SymbolKind::Field,
                    ));
                }
            }
            Member::Method(method) => {
                let name = if method.is_constructor() {
                    CONSTRUCTOR_NAME
                } else {
                    method.name.as_str()
                };
                scopes.push(ScopeKind::MethodBody, None);
                if let Ok(owner) = builder.next_callable_symbol(name) {
                    for param in &method.type_params {
                        if let Ok(symbol) = name_of(
                            &Declaration::TypeParameter {
                                name: param.name.as_str(),
                            },
                            Some(&owner),
                        ) {
                            scopes.bind_type(
                                param.name.text.clone(),
                                TypeBinding::TypeParam {
                                    name: param.name.text.clone(),
                                    symbol,
                                },
                            );
                        }
                    }
                }
                let mut params: Vec<JavaType> = method
                    .params
                    .iter()
                    .map(|p| env.convert_param(scopes, imports, p))
                    .collect();
                let result = if method.is_constructor() {
                    if method.compact {
                        params = components.iter().map(|(_, ty)| ty.clone()).collect();
                    }
                    builder.constructor(params, method.is_varargs())
                } else {
                    let returns = method
                        .return_type
                        .as_ref()
                        .map(|ty| env.convert(scopes, imports, ty))
                        .unwrap_or(JavaType::Unknown);
                    builder.method(
                        name,
                        params,
                        method.is_varargs(),
                        returns,
                        method.modifiers.is_static(),
                    )
                };
                scopes.pop();
                report(result);
            }
            Member::Initializer { .. } | Member::Type(_) => {}
        }
    }

    for (name, ty) in &components {
        if !builder.has_method(name, 0) {
            report(builder.method(name, Vec::new(), false, ty.clone(), false));
        }
    }
    if decl.kind == TypeDeclKind::Enum {
        report(builder.method(
            "values",
            Vec::new(),
            false,
            array_of(self_type.clone(), 1),
            true,
        ));
        report(builder.method("valueOf", vec![JavaType::string()], false, self_type, true));
    }
}

fn report(result: Result<Symbol, NamingError>) {
    if let Err(err) = result {
        debug!(%err, "skipping unnameable member");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn index(sources: &[&str]) -> ProjectIndex {
        let units: Vec<CompilationUnit> = sources.iter().map(|s| parse(s).unwrap()).collect();
        let refs: Vec<(FileId, &CompilationUnit)> = units
            .iter()
            .enumerate()
            .map(|(i, u)| (FileId::new(i as u32), u))
            .collect();
        ProjectIndex::build(&refs, &ExternalSymbolTable::with_platform(), &IndexerConfig::default())
    }

    #[test]
    fn test_types_and_packages() {
        let index = index(&[
            "package com.example.app; public class Outer { static class Inner {} }",
            "package com.example.util; interface Helper<T> {}",
        ]);
        assert_eq!(index.len(), 3);
        assert!(index.has_package("com"));
        assert!(index.has_package("com.example.util"));
        assert!(!index.has_package("com.ex"));

        let inner = index.class("com.example.app.Outer.Inner").unwrap();
        assert_eq!(inner.symbol.to_string(), "com/example/app/Outer#Inner#");
        assert_eq!(inner.symbol.scheme(), Scheme::Project);

        let helper = index.class("com.example.util.Helper").unwrap();
        assert_eq!(helper.kind(), SymbolKind::Interface);
        assert_eq!(helper.type_params, vec![SmolStr::new("T")]);
        assert_eq!(index.classes_in(FileId::new(1)).count(), 1);
    }

    #[test]
    fn test_headers_resolve_across_units() {
        let index = index(&[
            "package a; public class Base<T> { public T value; }",
            "package b; import a.Base; public class Child extends Base<String> implements Runnable { public void run() {} }",
        ]);
        let child = index.class("b.Child").unwrap();
        assert_eq!(
            child.superclass.as_ref().map(ToString::to_string).as_deref(),
            Some("a.Base<java.lang.String>")
        );
        assert_eq!(child.interfaces, vec![JavaType::class("java.lang.Runnable")]);
        let base = index.class("a.Base").unwrap();
        assert_eq!(base.superclass, Some(JavaType::object()));
        assert_eq!(base.fields[0].ty, JavaType::TypeVar("T".into()));
    }

    #[test]
    fn test_member_symbols_in_declaration_order() {
        let index = index(&[
            "package a; class Foo { Foo() {} Foo(int x) {} void f() {} int f(String s) { return 0; } int count, total[]; }",
        ]);
        let foo = index.class("a.Foo").unwrap();
        let symbols: Vec<String> = foo.methods.iter().map(|m| m.symbol.to_string()).collect();
        assert_eq!(symbols, vec!["a/Foo#f().", "a/Foo#f(+1)."]);
        let ctors: Vec<String> = foo.constructors.iter().map(|m| m.symbol.to_string()).collect();
        assert_eq!(ctors, vec!["a/Foo#`<init>`().", "a/Foo#`<init>`(+1)."]);
        assert_eq!(foo.field("total").unwrap().ty, array_of(JavaType::primitive("int"), 1));
        assert!(!foo.field("count").unwrap().is_static);
    }

    #[test]
    fn test_enum_and_record_members() {
        let index = index(&[
            "package a; enum Color { RED, GREEN; } record Point(int x, int y) { public int x() { return x; } }",
        ]);
        let color = index.class("a.Color").unwrap();
        assert_eq!(color.field("RED").unwrap().symbol.kind(), SymbolKind::EnumConstant);
        assert!(color.methods_named("values").next().unwrap().is_static);
        assert_eq!(
            color.superclass.as_ref().map(ToString::to_string).as_deref(),
            Some("java.lang.Enum<a.Color>")
        );

        let point = index.class("a.Point").unwrap();
        let accessors: Vec<String> = point.methods.iter().map(|m| m.symbol.to_string()).collect();
        assert_eq!(accessors, vec!["a/Point#x().", "a/Point#y()."]);
        assert_eq!(point.field("y").unwrap().ty, JavaType::primitive("int"));
    }

    #[test]
    fn test_interface_fields_are_static() {
        let index = index(&["package a; interface Keys { String NAME = \"n\"; }"]);
        assert!(index.class("a.Keys").unwrap().field("NAME").unwrap().is_static);
    }

    #[test]
    fn test_project_shadows_nothing_outside_its_packages() {
        let index = index(&["package java.lang; class Custom {}"]);
        assert!(index.has_package("java.lang"));
        assert!(index.class("java.lang.String").is_none());
    }
}
