//! Type environment: the project index and the External Symbol Table seen as
//! one class universe, plus the unit's local classes.
//!
//! Lookups consult local classes, then the project, then the classpath, so a
//! project declaration shadows a library class of the same name.

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::classpath::{ClassInfo, ExternalSymbolTable, FieldInfo, JavaType};
use crate::syntax::ast::{Param, TypeArg, TypeRef};

use super::imports::ImportScope;
use super::overload::Candidate;
use super::project::ProjectIndex;
use super::scope::{ScopeStack, TypeBinding};
use super::symbols::{Scheme, Symbol};

/// Type variable bindings of one class in a hierarchy walk.
pub type Bindings = FxHashMap<SmolStr, JavaType>;

/// What one segment of a dotted type name denotes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Package(Symbol),
    Class(Arc<ClassInfo>),
    TypeParam(Symbol),
    Unresolved,
}

pub struct TypeEnv<'a> {
    project: &'a ProjectIndex,
    external: &'a ExternalSymbolTable,
    locals: FxHashMap<SmolStr, Arc<ClassInfo>>,
}

impl<'a> TypeEnv<'a> {
    pub fn new(project: &'a ProjectIndex, external: &'a ExternalSymbolTable) -> Self {
        Self {
            project,
            external,
            locals: FxHashMap::default(),
        }
    }

    pub fn external(&self) -> &'a ExternalSymbolTable {
        self.external
    }

    pub fn class(&self, qualified: &str) -> Option<Arc<ClassInfo>> {
        self.locals
            .get(qualified)
            .cloned()
            .or_else(|| self.project.class(qualified))
            .or_else(|| self.external.class(qualified))
    }

    /// Register a local or anonymous class under its synthetic key.
    pub fn add_local_class(&mut self, class: ClassInfo) -> Arc<ClassInfo> {
        let class = Arc::new(class);
        self.locals
            .insert(class.qualified_name.clone(), class.clone());
        class
    }

    pub fn has_package(&self, package: &str) -> bool {
        self.project.has_package(package) || self.external.has_package(package)
    }

    /// Package symbol, in the project universe when the project declares
    /// anything under it.
    pub fn package_symbol(&self, package: &str) -> Symbol {
        let scheme = if self.project.has_package(package) {
            Scheme::Project
        } else {
            Scheme::External
        };
        Symbol::package(package, scheme)
    }

    // ------------------------------------------------------------------------
    // Type names
    // ------------------------------------------------------------------------

    /// A simple type name: lexical bindings and member types from the
    /// innermost scope outwards, then imports.
    pub fn resolve_simple_type(
        &self,
        scopes: &ScopeStack,
        imports: &ImportScope,
        name: &str,
    ) -> Option<TypeBinding> {
        for scope in scopes.iter() {
            if let Some(binding) = scope.type_binding(name) {
                return Some(binding.clone());
            }
            if let Some(class) = scope.class() {
                if class.simple_name() == name && !class.qualified_name.starts_with('<') {
                    return Some(TypeBinding::Class(class.clone()));
                }
                if let Some(member) = self.member_type(class, name) {
                    return Some(TypeBinding::Class(member));
                }
            }
        }
        imports
            .type_candidates(name)
            .iter()
            .find_map(|qualified| self.class(qualified))
            .map(TypeBinding::Class)
    }

    /// Resolve every segment of a dotted type name. The result has one entry
    /// per segment.
    pub fn resolve_type_path(
        &self,
        scopes: &ScopeStack,
        imports: &ImportScope,
        segments: &[&str],
    ) -> Vec<Segment> {
        let Some((first, rest)) = segments.split_first() else {
            return Vec::new();
        };

        match self.resolve_simple_type(scopes, imports, first) {
            Some(TypeBinding::Class(class)) => {
                let mut out = vec![Segment::Class(class.clone())];
                out.extend(self.member_path(class, rest));
                return out;
            }
            Some(TypeBinding::TypeParam { symbol, .. }) => {
                let mut out = vec![Segment::TypeParam(symbol)];
                out.extend(rest.iter().map(|_| Segment::Unresolved));
                return out;
            }
            None => {}
        }

        if rest.is_empty() {
            return vec![Segment::Unresolved];
        }
        self.resolve_qualified(segments)
    }

    /// Resolve a fully qualified name (an import, or a type name written
    /// with its package): packages, then a top-level class, then member
    /// types.
    pub fn resolve_qualified(&self, segments: &[&str]) -> Vec<Segment> {
        for split in 1..segments.len() {
            let package = segments[..split].join(".");
            if !self.has_package(&package) {
                break;
            }
            let qualified = ImportScope::qualify(&package, segments[split]);
            if let Some(class) = self.class(&qualified) {
                let mut out: Vec<Segment> = (1..=split)
                    .map(|end| Segment::Package(self.package_symbol(&segments[..end].join("."))))
                    .collect();
                out.push(Segment::Class(class.clone()));
                out.extend(self.member_path(class, &segments[split + 1..]));
                return out;
            }
        }
        // No class: a package chain, as far as it is known.
        let mut known = true;
        (1..=segments.len())
            .map(|end| {
                let package = segments[..end].join(".");
                known = known && self.has_package(&package);
                if known {
                    Segment::Package(self.package_symbol(&package))
                } else {
                    Segment::Unresolved
                }
            })
            .collect()
    }

    fn member_path(&self, mut class: Arc<ClassInfo>, rest: &[&str]) -> Vec<Segment> {
        let mut out = Vec::with_capacity(rest.len());
        let mut resolved = true;
        for name in rest {
            let next = if resolved {
                self.member_type(&class, name)
            } else {
                None
            };
            match next {
                Some(member) => {
                    out.push(Segment::Class(member.clone()));
                    class = member;
                }
                None => {
                    resolved = false;
                    out.push(Segment::Unresolved);
                }
            }
        }
        out
    }

    /// The type a type reference denotes. Unresolved names become
    /// [`JavaType::Unknown`].
    pub fn convert(&self, scopes: &ScopeStack, imports: &ImportScope, ty: &TypeRef) -> JavaType {
        match ty {
            TypeRef::Primitive { keyword, .. } => JavaType::primitive(keyword),
            TypeRef::Array { element, dims, .. } => {
                array_of(self.convert(scopes, imports, element), *dims)
            }
            TypeRef::Named(named) => {
                let segments: Vec<&str> = named.segments.iter().map(|s| s.name.as_str()).collect();
                let resolved = self.resolve_type_path(scopes, imports, &segments);
                match resolved.last() {
                    Some(Segment::Class(class)) => {
                        let args = named
                            .segments
                            .last()
                            .and_then(|s| s.args.as_ref())
                            .map(|args| {
                                args.iter()
                                    .map(|arg| self.convert_arg(scopes, imports, arg))
                                    .collect()
                            })
                            .unwrap_or_default();
                        JavaType::Class {
                            name: class.qualified_name.clone(),
                            args,
                        }
                    }
                    Some(Segment::TypeParam(_)) if segments.len() == 1 => {
                        JavaType::TypeVar(SmolStr::new(segments[0]))
                    }
                    _ => JavaType::Unknown,
                }
            }
        }
    }

    fn convert_arg(&self, scopes: &ScopeStack, imports: &ImportScope, arg: &TypeArg) -> JavaType {
        match arg {
            TypeArg::Type(ty) => self.convert(scopes, imports, ty),
            TypeArg::Wildcard {
                bound: Some(bound), ..
            } if bound.is_upper => self.convert(scopes, imports, &bound.ty),
            TypeArg::Wildcard { .. } => JavaType::object(),
        }
    }

    /// Declared type of a parameter; `T...` is `T[]`.
    pub fn convert_param(&self, scopes: &ScopeStack, imports: &ImportScope, param: &Param) -> JavaType {
        let ty = self.convert(scopes, imports, &param.ty);
        if param.varargs { array_of(ty, 1) } else { ty }
    }

    /// Member type `name` of `class`, declared or inherited.
    pub fn member_type(&self, class: &Arc<ClassInfo>, name: &str) -> Option<Arc<ClassInfo>> {
        self.hierarchy(&class.self_type())
            .into_iter()
            .find_map(|(owner, _)| self.class(&format!("{}.{}", owner.qualified_name, name)))
    }

    // ------------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------------

    /// `ty`'s class and its supertypes, class first, then interfaces, breadth
    /// first. Each class appears once. Interfaces end with `java.lang.Object`.
    pub fn hierarchy(&self, ty: &JavaType) -> Vec<(Arc<ClassInfo>, Bindings)> {
        let start = match ty {
            JavaType::Class { name, args } => self
                .class(name)
                .map(|class| {
                    let bindings = class.bindings(args);
                    (class, bindings)
                }),
            JavaType::TypeVar(_) => self.class("java.lang.Object").map(|c| (c, Bindings::default())),
            _ => None,
        };
        let Some(start) = start else {
            return Vec::new();
        };

        let mut visited = FxHashSet::default();
        visited.insert(start.0.qualified_name.clone());
        let mut queue = VecDeque::from([start]);
        let mut out = Vec::new();
        while let Some((class, bindings)) = queue.pop_front() {
            for supertype in class.supertypes() {
                let JavaType::Class { name, args } = supertype.substitute(&bindings) else {
                    continue;
                };
                let Some(parent) = self.class(&name) else {
                    continue;
                };
                if visited.insert(parent.qualified_name.clone()) {
                    let parent_bindings = parent.bindings(&args);
                    queue.push_back((parent, parent_bindings));
                }
            }
            out.push((class, bindings));
        }
        if !visited.contains("java.lang.Object") {
            if let Some(object) = self.class("java.lang.Object") {
                out.push((object, Bindings::default()));
            }
        }
        out
    }

    /// Field `name` as seen from a receiver of type `ty`, with its type
    /// substituted.
    pub fn find_field(&self, ty: &JavaType, name: &str) -> Option<FieldInfo> {
        for (class, bindings) in self.hierarchy(ty) {
            if let Some(field) = class.field(name) {
                let mut field = field.clone();
                field.ty = field.ty.substitute(&bindings);
                return Some(field);
            }
            if let Some(constant) = self.external.resource_constant(&class, name) {
                return Some((*constant).clone());
            }
        }
        None
    }

    /// Methods named `name` visible on `ty`, most derived first. A method
    /// overridden further down the hierarchy is not repeated.
    pub fn methods(&self, ty: &JavaType, name: &str) -> Vec<Candidate> {
        let mut out: Vec<Candidate> = Vec::new();
        for (class, bindings) in self.hierarchy(ty) {
            for method in class.methods_named(name) {
                let mut candidate = Candidate::from_method(method);
                candidate.params = candidate
                    .params
                    .iter()
                    .map(|p| p.substitute(&bindings))
                    .collect();
                candidate.returns = candidate.returns.substitute(&bindings);
                if out.iter().any(|seen| same_erasure(&seen.params, &candidate.params)) {
                    continue;
                }
                out.push(candidate);
            }
        }
        out
    }

    /// Methods of `class` overridden by a method with `params`: the first
    /// match in each supertype branch.
    pub fn overridden(&self, class: &Arc<ClassInfo>, name: &str, params: &[JavaType]) -> Vec<Symbol> {
        let mut out = Vec::new();
        for (parent, bindings) in self.hierarchy(&class.self_type()).into_iter().skip(1) {
            for method in parent.methods_named(name) {
                let substituted: Vec<JavaType> =
                    method.params.iter().map(|p| p.substitute(&bindings)).collect();
                if method.params.len() == params.len()
                    && substituted
                        .iter()
                        .zip(params)
                        .all(|(a, b)| a.erasure_eq(b) || matches!(a, JavaType::TypeVar(_)))
                    && !method.is_static
                {
                    out.push(method.symbol.clone());
                }
            }
        }
        out
    }

    /// Constructors of `class`, parameter types bound by `args`.
    pub fn constructors(&self, class: &ClassInfo, type_args: &[JavaType]) -> Vec<Candidate> {
        let bindings = class.bindings(type_args);
        class
            .constructors
            .iter()
            .map(|ctor| {
                let mut candidate = Candidate::from_method(ctor);
                candidate.params = candidate
                    .params
                    .iter()
                    .map(|p| p.substitute(&bindings))
                    .collect();
                candidate
            })
            .collect()
    }
}

/// `ty` with `dims` array dimensions added.
pub fn array_of(mut ty: JavaType, dims: u32) -> JavaType {
    for _ in 0..dims {
        ty = JavaType::Array(Box::new(ty));
    }
    ty
}

fn same_erasure(a: &[JavaType], b: &[JavaType]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.erasure_eq(y))
}
