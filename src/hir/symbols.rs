//! Symbol naming scheme.
//!
//! Every declared entity, whether it lives in the current unit, elsewhere in
//! the project, or on the classpath, is named by the same pure function
//! ([`name_of`]) so that references and definitions agree textually:
//!
//! ```text
//! com/airbnb/epoxy/                       package
//! com/airbnb/epoxy/HiddenEpoxyModel#      type
//! com/airbnb/epoxy/Outer#Inner#           nested type
//! com/airbnb/epoxy/Foo#count.             field / enum constant
//! com/airbnb/epoxy/Foo#bind().            first method named `bind`
//! com/airbnb/epoxy/Foo#bind(+1).          second overload of `bind`
//! com/airbnb/epoxy/Foo#`<init>`().        constructor
//! com/airbnb/epoxy/Foo#[T]                type parameter
//! local3                                  parameter / local variable
//! ```

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize, Serializer};
use smol_str::SmolStr;

use crate::error::NamingError;

// ============================================================================
// SCHEMES, DESCRIPTORS, KINDS
// ============================================================================

/// Which universe a symbol belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Parameters, locals, and declarations inside method bodies.
    Local,
    /// Declared in a project compilation unit.
    Project,
    /// Supplied by the classpath (libraries, platform, generated resources).
    External,
}

/// One step of a symbol path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Descriptor {
    Package(SmolStr),
    Type(SmolStr),
    /// Field, enum constant, record component, resource constant.
    Term(SmolStr),
    Method { name: SmolStr, disambiguator: u32 },
    TypeParameter(SmolStr),
    Local(u32),
}

impl Descriptor {
    /// The source-level name, if the descriptor has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Descriptor::Package(name)
            | Descriptor::Type(name)
            | Descriptor::Term(name)
            | Descriptor::TypeParameter(name)
            | Descriptor::Method { name, .. } => Some(name),
            Descriptor::Local(_) => None,
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Package(name) => write!(f, "{}/", escape(name)),
            Descriptor::Type(name) => write!(f, "{}#", escape(name)),
            Descriptor::Term(name) => write!(f, "{}.", escape(name)),
            Descriptor::Method {
                name,
                disambiguator: 0,
            } => write!(f, "{}().", escape(name)),
            Descriptor::Method {
                name,
                disambiguator,
            } => write!(f, "{}(+{}).", escape(name), disambiguator),
            Descriptor::TypeParameter(name) => write!(f, "[{}]", escape(name)),
            Descriptor::Local(id) => write!(f, "local{}", id),
        }
    }
}

/// True for names that are valid Java identifiers.
pub fn is_java_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '$' || c == '_' || unicode_ident::is_xid_start(c) => {}
        _ => return false,
    }
    chars.all(|c| c == '$' || unicode_ident::is_xid_continue(c))
}

fn escape(name: &str) -> Cow<'_, str> {
    if is_java_identifier(name) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("`{}`", name))
    }
}

/// The kind of entity a symbol names. Metadata only: it never takes part in
/// symbol identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolKind {
    Package,
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
    Method,
    Constructor,
    Field,
    EnumConstant,
    Parameter,
    LocalVariable,
    TypeParameter,
    /// Synthesized classpath entries (generated resource constants).
    SyntheticMember,
    /// Placeholder for a name that did not resolve.
    Unknown,
}

impl SymbolKind {
    pub fn is_type(self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::Enum
                | SymbolKind::Record
                | SymbolKind::Annotation
        )
    }

    pub fn is_callable(self) -> bool {
        matches!(self, SymbolKind::Method | SymbolKind::Constructor)
    }

    pub fn is_term(self) -> bool {
        matches!(
            self,
            SymbolKind::Field | SymbolKind::EnumConstant | SymbolKind::SyntheticMember
        )
    }

    pub fn display(self) -> &'static str {
        match self {
            SymbolKind::Package => "package",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Enum => "enum",
            SymbolKind::Record => "record",
            SymbolKind::Annotation => "annotation",
            SymbolKind::Method => "method",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Field => "field",
            SymbolKind::EnumConstant => "enum constant",
            SymbolKind::Parameter => "parameter",
            SymbolKind::LocalVariable => "local variable",
            SymbolKind::TypeParameter => "type parameter",
            SymbolKind::SyntheticMember => "synthetic member",
            SymbolKind::Unknown => "unknown",
        }
    }
}

// ============================================================================
// SYMBOL
// ============================================================================

/// Canonical identity of one declared entity.
///
/// Equality, hashing and ordering use `(scheme, path)` only. Cloning is cheap:
/// the path is shared.
#[derive(Clone, Debug)]
pub struct Symbol {
    scheme: Scheme,
    path: Arc<[Descriptor]>,
    kind: SymbolKind,
}

impl Symbol {
    fn from_parts(scheme: Scheme, path: Vec<Descriptor>, kind: SymbolKind) -> Self {
        Self {
            scheme,
            path: path.into(),
            kind,
        }
    }

    /// Package symbol for a dotted name. The empty name is the default
    /// package, which renders as the empty string.
    pub fn package(dotted: &str, scheme: Scheme) -> Self {
        let path = dotted
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(|segment| Descriptor::Package(SmolStr::new(segment)))
            .collect();
        Self::from_parts(scheme, path, SymbolKind::Package)
    }

    /// Placeholder for an unresolved name, shaped from its text: a lone type
    /// is `Foo#`, a lone value is `foo.`, and a dotted chain is rooted at a
    /// package-like head followed by type-like segments (`R/layout#x#`).
    pub fn placeholder(segments: &[&str], is_value: bool) -> Self {
        let path = match segments {
            [] => Vec::new(),
            [single] if is_value => vec![Descriptor::Term(SmolStr::new(single))],
            [single] => vec![Descriptor::Type(SmolStr::new(single))],
            [head, rest @ ..] => std::iter::once(Descriptor::Package(SmolStr::new(head)))
                .chain(rest.iter().map(|s| Descriptor::Type(SmolStr::new(s))))
                .collect(),
        };
        Self::from_parts(Scheme::External, path, SymbolKind::Unknown)
    }

    /// Placeholders for every prefix of an unresolved chain, one per segment:
    /// `R/`, `R/layout#`, `R/layout#x#`.
    pub fn placeholder_chain(segments: &[&str], is_value: bool) -> Vec<Self> {
        (1..=segments.len())
            .map(|len| match &segments[..len] {
                [head] if segments.len() > 1 => Self::from_parts(
                    Scheme::External,
                    vec![Descriptor::Package(SmolStr::new(head))],
                    SymbolKind::Unknown,
                ),
                prefix => Self::placeholder(prefix, is_value),
            })
            .collect()
    }

    fn child(&self, descriptor: Descriptor, kind: SymbolKind) -> Self {
        let mut path = self.path.to_vec();
        path.push(descriptor);
        Self::from_parts(self.scheme, path, kind)
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.path
    }

    pub fn is_local(&self) -> bool {
        self.scheme == Scheme::Local
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == SymbolKind::Unknown
    }

    /// Same identity, different kind metadata.
    pub fn with_kind(mut self, kind: SymbolKind) -> Self {
        self.kind = kind;
        self
    }

    /// The declaration's own name (`HiddenEpoxyModel`, `<init>`, `local3`).
    pub fn display_name(&self) -> String {
        match self.path.last() {
            Some(Descriptor::Local(id)) => format!("local{}", id),
            Some(descriptor) => descriptor.name().unwrap_or_default().to_string(),
            None => String::new(),
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme && self.path == other.path
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scheme.hash(state);
        self.path.hash(state);
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.scheme
            .cmp(&other.scheme)
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Locals carry their owner for identity but print only `localN`.
        if self.scheme == Scheme::Local {
            if let Some(Descriptor::Local(id)) = self.path.last() {
                return write!(f, "local{}", id);
            }
        }
        for descriptor in self.path.iter() {
            write!(f, "{}", descriptor)?;
        }
        Ok(())
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// NAMING
// ============================================================================

/// A declaration as seen by the naming scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Declaration<'a> {
    /// Dotted package name; `scheme` decides the universe of a root package.
    Package { name: &'a str, scheme: Scheme },
    Type { name: &'a str, kind: SymbolKind },
    /// Field, enum constant, record component or synthetic constant.
    Member { name: &'a str, kind: SymbolKind },
    Method { name: &'a str, disambiguator: u32 },
    Constructor { disambiguator: u32 },
    TypeParameter { name: &'a str },
    /// Parameter, local variable, or any declaration inside a method body.
    Local { id: u32, kind: SymbolKind },
}

impl Declaration<'_> {
    fn describe(&self) -> String {
        match self {
            Declaration::Package { name, .. } => format!("package {}", name),
            Declaration::Type { name, kind } => format!("{} {}", kind.display(), name),
            Declaration::Member { name, kind } => format!("{} {}", kind.display(), name),
            Declaration::Method { name, .. } => format!("method {}", name),
            Declaration::Constructor { .. } => "constructor".to_string(),
            Declaration::TypeParameter { name } => format!("type parameter {}", name),
            Declaration::Local { id, kind } => format!("{} local{}", kind.display(), id),
        }
    }
}

/// Canonical symbol of `decl` declared inside `owner`.
///
/// Pure and deterministic: the same declaration in the same context always
/// yields an equal symbol.
pub fn name_of(decl: &Declaration<'_>, owner: Option<&Symbol>) -> Result<Symbol, NamingError> {
    let malformed = |reason: &str| Err(NamingError::malformed(decl.describe(), reason));

    match (*decl, owner) {
        (Declaration::Package { name, scheme }, None) => Ok(Symbol::package(name, scheme)),
        (Declaration::Package { name, .. }, Some(owner)) => {
            if owner.kind != SymbolKind::Package {
                return malformed("a package can only be nested in a package");
            }
            let mut path = owner.path.to_vec();
            path.extend(
                name.split('.')
                    .filter(|s| !s.is_empty())
                    .map(|s| Descriptor::Package(SmolStr::new(s))),
            );
            Ok(Symbol::from_parts(owner.scheme, path, SymbolKind::Package))
        }
        (Declaration::Local { id, kind }, Some(owner)) => {
            if owner.kind == SymbolKind::Package {
                return malformed("a local declaration cannot be owned by a package");
            }
            let mut path = owner.path.to_vec();
            path.push(Descriptor::Local(id));
            Ok(Symbol::from_parts(Scheme::Local, path, kind))
        }
        (_, None) => malformed("missing owner"),
        (_, Some(owner)) if owner.scheme == Scheme::Local => {
            malformed("declarations inside a local scope take local symbols")
        }
        (Declaration::Type { name, kind }, Some(owner)) => {
            if !kind.is_type() {
                return malformed("not a type kind");
            }
            if owner.kind != SymbolKind::Package && !owner.kind.is_type() {
                return malformed("a member type must be owned by a package or a type");
            }
            Ok(owner.child(Descriptor::Type(SmolStr::new(name)), kind))
        }
        (Declaration::Member { name, kind }, Some(owner)) => {
            if !kind.is_term() {
                return malformed("not a member kind");
            }
            if !owner.kind.is_type() {
                return malformed("a field must be owned by a type");
            }
            Ok(owner.child(Descriptor::Term(SmolStr::new(name)), kind))
        }
        (
            Declaration::Method {
                name,
                disambiguator,
            },
            Some(owner),
        ) => {
            if !owner.kind.is_type() {
                return malformed("a method must be owned by a type");
            }
            let descriptor = Descriptor::Method {
                name: SmolStr::new(name),
                disambiguator,
            };
            Ok(owner.child(descriptor, SymbolKind::Method))
        }
        (Declaration::Constructor { disambiguator }, Some(owner)) => {
            if !matches!(
                owner.kind,
                SymbolKind::Class | SymbolKind::Enum | SymbolKind::Record
            ) {
                return malformed("a constructor must be owned by a class, enum or record");
            }
            let descriptor = Descriptor::Method {
                name: SmolStr::new_static(CONSTRUCTOR_NAME),
                disambiguator,
            };
            Ok(owner.child(descriptor, SymbolKind::Constructor))
        }
        (Declaration::TypeParameter { name }, Some(owner)) => {
            if !owner.kind.is_type() && !owner.kind.is_callable() {
                return malformed("a type parameter must be owned by a type or a method");
            }
            Ok(owner.child(
                Descriptor::TypeParameter(SmolStr::new(name)),
                SymbolKind::TypeParameter,
            ))
        }
    }
}

/// Method name used for constructors.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Assigns overload disambiguators in declaration order: `0` for the first
/// method of a name in a type, `N` for the N-th further overload.
#[derive(Clone, Debug, Default)]
pub struct OverloadCounter {
    seen: FxHashMap<SmolStr, u32>,
}

impl OverloadCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, name: &str) -> u32 {
        let count = self.seen.entry(SmolStr::new(name)).or_insert(0);
        let disambiguator = *count;
        *count += 1;
        disambiguator
    }

    /// The disambiguator the next call to [`next`](Self::next) would return.
    pub fn peek(&self, name: &str) -> u32 {
        self.seen.get(name).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str) -> Symbol {
        Symbol::package(name, Scheme::Project)
    }

    fn class(owner: &Symbol, name: &str) -> Symbol {
        name_of(
            &Declaration::Type {
                name,
                kind: SymbolKind::Class,
            },
            Some(owner),
        )
        .unwrap()
    }

    #[test]
    fn test_package_and_type_rendering() {
        let package = pkg("com.airbnb.epoxy");
        assert_eq!(package.to_string(), "com/airbnb/epoxy/");
        let model = class(&package, "HiddenEpoxyModel");
        assert_eq!(model.to_string(), "com/airbnb/epoxy/HiddenEpoxyModel#");
        let inner = class(&model, "Inner");
        assert_eq!(inner.to_string(), "com/airbnb/epoxy/HiddenEpoxyModel#Inner#");
    }

    #[test]
    fn test_default_package_type() {
        let root = Symbol::package("", Scheme::Project);
        assert_eq!(root.to_string(), "");
        assert_eq!(class(&root, "Main").to_string(), "Main#");
    }

    #[test]
    fn test_methods_and_overloads() {
        let owner = class(&pkg("a"), "Foo");
        let mut counter = OverloadCounter::new();
        let first = counter.next("bind");
        let second = counter.next("bind");
        assert_eq!(counter.peek("bind"), 2);
        let other = counter.next("unbind");
        let name = |name, disambiguator| {
            name_of(
                &Declaration::Method {
                    name,
                    disambiguator,
                },
                Some(&owner),
            )
            .unwrap()
            .to_string()
        };
        assert_eq!(name("bind", first), "a/Foo#bind().");
        assert_eq!(name("bind", second), "a/Foo#bind(+1).");
        assert_eq!(name("unbind", other), "a/Foo#unbind().");
    }

    #[test]
    fn test_constructor_is_escaped() {
        let owner = class(&pkg("a"), "Foo");
        let ctor = name_of(&Declaration::Constructor { disambiguator: 0 }, Some(&owner)).unwrap();
        assert_eq!(ctor.to_string(), "a/Foo#`<init>`().");
        assert_eq!(ctor.kind(), SymbolKind::Constructor);
        assert_eq!(ctor.display_name(), "<init>");
    }

    #[test]
    fn test_fields_and_type_parameters() {
        let owner = class(&pkg("a"), "Foo");
        let field = name_of(
            &Declaration::Member {
                name: "count",
                kind: SymbolKind::Field,
            },
            Some(&owner),
        )
        .unwrap();
        assert_eq!(field.to_string(), "a/Foo#count.");
        let param = name_of(&Declaration::TypeParameter { name: "T" }, Some(&owner)).unwrap();
        assert_eq!(param.to_string(), "a/Foo#[T]");
    }

    #[test]
    fn test_locals_render_without_owner_but_keep_identity() {
        let owner = class(&pkg("a"), "Foo");
        let m1 = name_of(&Declaration::Method { name: "f", disambiguator: 0 }, Some(&owner)).unwrap();
        let m2 = name_of(&Declaration::Method { name: "g", disambiguator: 0 }, Some(&owner)).unwrap();
        let local = |owner: &Symbol| {
            name_of(
                &Declaration::Local {
                    id: 0,
                    kind: SymbolKind::Parameter,
                },
                Some(owner),
            )
            .unwrap()
        };
        assert_eq!(local(&m1).to_string(), "local0");
        assert_eq!(local(&m2).to_string(), "local0");
        assert_ne!(local(&m1), local(&m2));
        assert!(local(&m1).is_local());
    }

    #[test]
    fn test_identity_ignores_kind() {
        let a = class(&pkg("a"), "Foo");
        let b = a.clone().with_kind(SymbolKind::Interface);
        assert_eq!(a, b);
    }

    #[test]
    fn test_schemes_are_distinct_universes() {
        let project = class(&Symbol::package("a", Scheme::Project), "Foo");
        let external = class(&Symbol::package("a", Scheme::External), "Foo");
        assert_eq!(project.to_string(), external.to_string());
        assert_ne!(project, external);
    }

    #[test]
    fn test_malformed_contexts() {
        let package = pkg("a");
        let method_in_package = name_of(
            &Declaration::Method {
                name: "f",
                disambiguator: 0,
            },
            Some(&package),
        );
        assert!(matches!(
            method_in_package,
            Err(NamingError::MalformedContext { .. })
        ));
        let orphan = name_of(
            &Declaration::Type {
                name: "Foo",
                kind: SymbolKind::Class,
            },
            None,
        );
        assert!(orphan.is_err());
        let iface = name_of(
            &Declaration::Type {
                name: "I",
                kind: SymbolKind::Interface,
            },
            Some(&package),
        )
        .unwrap();
        assert!(name_of(&Declaration::Constructor { disambiguator: 0 }, Some(&iface)).is_err());
    }

    #[test]
    fn test_naming_is_idempotent() {
        let package = pkg("com.airbnb");
        let decl = Declaration::Type {
            name: "Model",
            kind: SymbolKind::Class,
        };
        let first = name_of(&decl, Some(&package)).unwrap();
        let second = name_of(&decl, Some(&package)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Symbol::placeholder(&["Foo"], false).to_string(), "Foo#");
        assert_eq!(Symbol::placeholder(&["foo"], true).to_string(), "foo.");
        let chain = Symbol::placeholder(&["R", "layout", "view_holder_empty_view"], true);
        assert_eq!(chain.to_string(), "R/layout#view_holder_empty_view#");
        assert!(chain.is_placeholder());
        assert_eq!(chain.scheme(), Scheme::External);

        let prefixes: Vec<String> = Symbol::placeholder_chain(&["R", "layout", "x"], true)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(prefixes, vec!["R/", "R/layout#", "R/layout#x#"]);
        let lone = Symbol::placeholder_chain(&["count"], true);
        assert_eq!(lone[0].to_string(), "count.");
        assert!(lone[0].is_placeholder());
    }

    #[test]
    fn test_identifier_check() {
        assert!(is_java_identifier("spanCount"));
        assert!(is_java_identifier("$adapter_1"));
        assert!(is_java_identifier("ñandú"));
        assert!(!is_java_identifier("<init>"));
        assert!(!is_java_identifier("1abc"));
        assert!(!is_java_identifier(""));
    }

    #[test]
    fn test_serializes_as_string() {
        let symbol = class(&pkg("a.b"), "C");
        assert_eq!(serde_json::to_string(&symbol).unwrap(), "\"a/b/C#\"");
    }
}
