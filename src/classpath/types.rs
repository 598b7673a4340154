//! Class and type model shared by the external table and the project index.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::FileId;
use crate::error::NamingError;
use crate::hir::symbols::{Declaration, OverloadCounter, Symbol, SymbolKind, name_of};

// ============================================================================
// JAVA TYPES
// ============================================================================

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// A static type, as far as the indexer tracks one.
///
/// Class names are dotted and use `.` for nesting (`a.b.Outer.Inner`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum JavaType {
    Primitive(SmolStr),
    Class { name: SmolStr, args: Vec<JavaType> },
    Array(Box<JavaType>),
    TypeVar(SmolStr),
    Null,
    Unknown,
}

impl JavaType {
    pub fn class(name: impl Into<SmolStr>) -> Self {
        JavaType::Class {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::class("java.lang.String")
    }

    pub fn object() -> Self {
        Self::class("java.lang.Object")
    }

    pub fn primitive(keyword: &str) -> Self {
        JavaType::Primitive(SmolStr::new(keyword))
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, JavaType::Unknown | JavaType::Null)
    }

    /// Qualified class name for class types.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            JavaType::Class { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Same type after erasing type arguments.
    pub fn erasure_eq(&self, other: &JavaType) -> bool {
        match (self, other) {
            (JavaType::Primitive(a), JavaType::Primitive(b)) => a == b,
            (JavaType::Class { name: a, .. }, JavaType::Class { name: b, .. }) => a == b,
            (JavaType::Array(a), JavaType::Array(b)) => a.erasure_eq(b),
            (JavaType::TypeVar(a), JavaType::TypeVar(b)) => a == b,
            _ => false,
        }
    }

    /// Replace type variables bound in `bindings`.
    pub fn substitute(&self, bindings: &FxHashMap<SmolStr, JavaType>) -> JavaType {
        if bindings.is_empty() {
            return self.clone();
        }
        match self {
            JavaType::TypeVar(name) => bindings.get(name).cloned().unwrap_or_else(|| self.clone()),
            JavaType::Class { name, args } => JavaType::Class {
                name: name.clone(),
                args: args.iter().map(|arg| arg.substitute(bindings)).collect(),
            },
            JavaType::Array(element) => JavaType::Array(Box::new(element.substitute(bindings))),
            other => other.clone(),
        }
    }

    /// Parse a classpath type string: `int`, `java.lang.String[]`,
    /// `java.util.Map<K, java.util.List<V>>`, `a.b.Outer$Inner`, `? extends T`.
    /// Names in `type_params` become type variables.
    pub fn parse(text: &str, type_params: &[SmolStr]) -> JavaType {
        let text = text.trim();
        if text.is_empty() {
            return JavaType::Unknown;
        }
        if let Some(element) = text.strip_suffix("[]").or_else(|| text.strip_suffix("...")) {
            return JavaType::Array(Box::new(Self::parse(element, type_params)));
        }
        if text == "?" {
            return Self::object();
        }
        if let Some(bound) = text
            .strip_prefix("? extends ")
            .or_else(|| text.strip_prefix("? super "))
        {
            return Self::parse(bound, type_params);
        }
        if PRIMITIVES.contains(&text) {
            return Self::primitive(text);
        }

        let (base, args) = match (text.find('<'), text.strip_suffix('>')) {
            (Some(open), Some(inner)) => {
                let args = split_top_level(&inner[open + 1..])
                    .into_iter()
                    .map(|arg| Self::parse(arg, type_params))
                    .collect();
                (&text[..open], args)
            }
            _ => (text, Vec::new()),
        };
        if type_params.iter().any(|p| p == base) {
            return JavaType::TypeVar(SmolStr::new(base));
        }
        JavaType::Class {
            name: SmolStr::new(base.replace('$', ".")),
            args,
        }
    }
}

fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Primitive(name) | JavaType::TypeVar(name) => f.write_str(name),
            JavaType::Class { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
            JavaType::Array(element) => write!(f, "{}[]", element),
            JavaType::Null => f.write_str("null"),
            JavaType::Unknown => f.write_str("?"),
        }
    }
}

// ============================================================================
// CLASS INFO
// ============================================================================

/// Where a class declaration comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    Project(FileId),
    External,
    /// Local or anonymous class inside a method body.
    Local,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: SmolStr,
    pub ty: JavaType,
    pub is_static: bool,
    pub symbol: Symbol,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: SmolStr,
    pub params: Vec<JavaType>,
    pub varargs: bool,
    pub returns: JavaType,
    pub is_static: bool,
    pub symbol: Symbol,
}

/// A class, interface, enum, record or annotation type with its members.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassInfo {
    /// Dotted name, `.` for nesting.
    pub qualified_name: SmolStr,
    pub package: SmolStr,
    pub symbol: Symbol,
    pub origin: Origin,
    pub type_params: Vec<SmolStr>,
    pub superclass: Option<JavaType>,
    pub interfaces: Vec<JavaType>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub constructors: Vec<MethodInfo>,
    /// Any member name resolves to a synthesized constant (generated
    /// resource classes such as `R.layout`).
    pub synthetic_members: bool,
}

impl ClassInfo {
    pub fn kind(&self) -> SymbolKind {
        self.symbol.kind()
    }

    pub fn simple_name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind(), SymbolKind::Interface | SymbolKind::Annotation)
    }

    /// The class type with its own type parameters as arguments.
    pub fn self_type(&self) -> JavaType {
        JavaType::Class {
            name: self.qualified_name.clone(),
            args: self
                .type_params
                .iter()
                .map(|p| JavaType::TypeVar(p.clone()))
                .collect(),
        }
    }

    /// Superclass first, then interfaces.
    pub fn supertypes(&self) -> impl Iterator<Item = &JavaType> {
        self.superclass.iter().chain(self.interfaces.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodInfo> + 'a {
        self.methods.iter().filter(move |m| m.name == name)
    }

    /// Bindings of this class's type parameters for a parameterized use.
    pub fn bindings(&self, args: &[JavaType]) -> FxHashMap<SmolStr, JavaType> {
        if args.len() != self.type_params.len() {
            return FxHashMap::default();
        }
        self.type_params
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builds a [`ClassInfo`] for a classpath entry, naming members in the
/// order they are added.
#[derive(Debug)]
pub struct ClassBuilder {
    info: ClassInfo,
    counter: OverloadCounter,
}

impl ClassBuilder {
    /// `owner` is the package symbol for a top-level class or the enclosing
    /// class symbol for a nested one.
    pub fn new(
        owner: &Symbol,
        package: &str,
        qualified_name: &str,
        kind: SymbolKind,
        origin: Origin,
    ) -> Result<Self, NamingError> {
        let simple = qualified_name.rsplit('.').next().unwrap_or(qualified_name);
        let symbol = name_of(&Declaration::Type { name: simple, kind }, Some(owner))?;
        Ok(Self {
            info: ClassInfo {
                qualified_name: SmolStr::new(qualified_name),
                package: SmolStr::new(package),
                symbol,
                origin,
                type_params: Vec::new(),
                superclass: None,
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                constructors: Vec::new(),
                synthetic_members: false,
            },
            counter: OverloadCounter::new(),
        })
    }

    /// Continue from an already named class header (symbol, type
    /// parameters and supertypes), with no members yet.
    pub fn from_header(mut info: ClassInfo) -> Self {
        info.fields.clear();
        info.methods.clear();
        info.constructors.clear();
        Self {
            info,
            counter: OverloadCounter::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.info.symbol
    }

    /// The class as built so far.
    pub fn info(&self) -> &ClassInfo {
        &self.info
    }

    /// Symbol the next [`method`](Self::method) (or, for `<init>`,
    /// [`constructor`](Self::constructor)) call with this name will assign.
    pub fn next_callable_symbol(&self, name: &str) -> Result<Symbol, NamingError> {
        let disambiguator = self.counter.peek(name);
        let decl = if name == crate::hir::symbols::CONSTRUCTOR_NAME {
            Declaration::Constructor { disambiguator }
        } else {
            Declaration::Method {
                name,
                disambiguator,
            }
        };
        name_of(&decl, Some(&self.info.symbol))
    }

    /// Whether a method `name` taking `arity` parameters was added.
    pub fn has_method(&self, name: &str, arity: usize) -> bool {
        self.info
            .methods
            .iter()
            .any(|m| m.name == name && m.params.len() == arity)
    }

    pub fn type_params(&self) -> &[SmolStr] {
        &self.info.type_params
    }

    pub fn type_param(&mut self, name: &str) -> &mut Self {
        self.info.type_params.push(SmolStr::new(name));
        self
    }

    pub fn superclass(&mut self, ty: JavaType) -> &mut Self {
        self.info.superclass = Some(ty);
        self
    }

    pub fn interface(&mut self, ty: JavaType) -> &mut Self {
        self.info.interfaces.push(ty);
        self
    }

    pub fn synthetic_members(&mut self) -> &mut Self {
        self.info.synthetic_members = true;
        self
    }

    pub fn field(&mut self, name: &str, ty: JavaType, is_static: bool, kind: SymbolKind) -> Result<Symbol, NamingError> {
        let symbol = name_of(&Declaration::Member { name, kind }, Some(&self.info.symbol))?;
        self.info.fields.push(FieldInfo {
            name: SmolStr::new(name),
            ty,
            is_static,
            symbol: symbol.clone(),
        });
        Ok(symbol)
    }

    pub fn method(
        &mut self,
        name: &str,
        params: Vec<JavaType>,
        varargs: bool,
        returns: JavaType,
        is_static: bool,
    ) -> Result<Symbol, NamingError> {
        let disambiguator = self.counter.next(name);
        let symbol = name_of(
            &Declaration::Method {
                name,
                disambiguator,
            },
            Some(&self.info.symbol),
        )?;
        self.info.methods.push(MethodInfo {
            name: SmolStr::new(name),
            params,
            varargs,
            returns,
            is_static,
            symbol: symbol.clone(),
        });
        Ok(symbol)
    }

    pub fn constructor(&mut self, params: Vec<JavaType>, varargs: bool) -> Result<Symbol, NamingError> {
        let disambiguator = self.counter.next(crate::hir::symbols::CONSTRUCTOR_NAME);
        let symbol = name_of(&Declaration::Constructor { disambiguator }, Some(&self.info.symbol))?;
        self.info.constructors.push(MethodInfo {
            name: SmolStr::new_static(crate::hir::symbols::CONSTRUCTOR_NAME),
            params,
            varargs,
            returns: self.info.self_type(),
            is_static: false,
            symbol: symbol.clone(),
        });
        Ok(symbol)
    }

    pub fn build(self) -> ClassInfo {
        self.info
    }

    pub fn build_arc(self) -> Arc<ClassInfo> {
        Arc::new(self.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::symbols::Scheme;

    #[test]
    fn test_parse_type_strings() {
        let params = [SmolStr::new("E")];
        assert_eq!(JavaType::parse("int", &params), JavaType::primitive("int"));
        assert_eq!(JavaType::parse("E", &params), JavaType::TypeVar("E".into()));
        assert_eq!(
            JavaType::parse("java.util.Map<E, java.util.List<java.lang.String>>", &params).to_string(),
            "java.util.Map<E, java.util.List<java.lang.String>>"
        );
        assert_eq!(
            JavaType::parse("a.b.Outer$Inner[]", &[]),
            JavaType::Array(Box::new(JavaType::class("a.b.Outer.Inner")))
        );
        assert_eq!(
            JavaType::parse("java.util.List<? extends E>", &params),
            JavaType::Class {
                name: "java.util.List".into(),
                args: vec![JavaType::TypeVar("E".into())],
            }
        );
    }

    #[test]
    fn test_substitute_and_erasure() {
        let list_e = JavaType::parse("java.util.List<E>", &[SmolStr::new("E")]);
        let mut bindings = FxHashMap::default();
        bindings.insert(SmolStr::new("E"), JavaType::string());
        let list_string = list_e.substitute(&bindings);
        assert_eq!(list_string.to_string(), "java.util.List<java.lang.String>");
        assert!(list_string.erasure_eq(&list_e));
        assert!(!JavaType::primitive("int").erasure_eq(&JavaType::primitive("long")));
    }

    #[test]
    fn test_builder_names_members_in_order() {
        let package = Symbol::package("java.io", Scheme::External);
        let mut builder =
            ClassBuilder::new(&package, "java.io", "java.io.PrintStream", SymbolKind::Class, Origin::External)
                .unwrap();
        let a = builder
            .method("println", vec![], false, JavaType::primitive("void"), false)
            .unwrap();
        let b = builder
            .method("println", vec![JavaType::string()], false, JavaType::primitive("void"), false)
            .unwrap();
        let ctor = builder.constructor(vec![], false).unwrap();
        let info = builder.build();
        assert_eq!(a.to_string(), "java/io/PrintStream#println().");
        assert_eq!(b.to_string(), "java/io/PrintStream#println(+1).");
        assert_eq!(ctor.to_string(), "java/io/PrintStream#`<init>`().");
        assert_eq!(info.methods_named("println").count(), 2);
        assert_eq!(info.simple_name(), "PrintStream");
    }

    #[test]
    fn test_next_callable_symbol_matches_assignment() {
        let package = Symbol::package("a", Scheme::Project);
        let mut builder =
            ClassBuilder::new(&package, "a", "a.Foo", SymbolKind::Class, Origin::External).unwrap();
        builder
            .method("f", vec![], false, JavaType::primitive("void"), false)
            .unwrap();
        let predicted = builder.next_callable_symbol("f").unwrap();
        let assigned = builder
            .method("f", vec![JavaType::string()], false, JavaType::primitive("void"), false)
            .unwrap();
        assert_eq!(predicted, assigned);
        assert!(builder.has_method("f", 1));

        let ctor = builder.next_callable_symbol("<init>").unwrap();
        assert_eq!(ctor.to_string(), "a/Foo#`<init>`().");
        let rebuilt = ClassBuilder::from_header(builder.build());
        assert!(!rebuilt.has_method("f", 0));
    }
}
