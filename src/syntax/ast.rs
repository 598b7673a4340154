//! Typed Java syntax tree.
//!
//! Every node that can carry an occurrence keeps the byte range of its
//! identifier token (`Ident::range`); larger nodes keep their full extent.

use std::fmt;

use smol_str::SmolStr;
use text_size::TextRange;

// ============================================================================
// NAMES
// ============================================================================

/// An identifier token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub text: SmolStr,
    pub range: TextRange,
}

impl Ident {
    pub fn new(text: impl Into<SmolStr>, range: TextRange) -> Self {
        Self {
            text: text.into(),
            range,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// A dotted name such as `com.airbnb.epoxy` or `android.widget.Space`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub segments: Vec<Ident>,
}

impl QualifiedName {
    pub fn range(&self) -> TextRange {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => first.range.cover(last.range),
            _ => TextRange::default(),
        }
    }

    pub fn last(&self) -> Option<&Ident> {
        self.segments.last()
    }

    pub fn to_dotted(&self) -> String {
        let parts: Vec<&str> = self.segments.iter().map(Ident::as_str).collect();
        parts.join(".")
    }
}

// ============================================================================
// COMPILATION UNIT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompilationUnit {
    pub package: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
}

impl CompilationUnit {
    /// Dotted package name, empty for the default package.
    pub fn package_name(&self) -> String {
        self.package
            .as_ref()
            .map(|p| p.name.to_dotted())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDecl {
    pub annotations: Vec<Annotation>,
    pub name: QualifiedName,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub is_static: bool,
    pub path: QualifiedName,
    /// `import a.b.*;`
    pub on_demand: bool,
    pub range: TextRange,
}

// ============================================================================
// MODIFIERS & ANNOTATIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: QualifiedName,
    pub args: Vec<AnnotationArg>,
    pub range: TextRange,
}

/// `name = value`, or a bare `value` for the single-element shorthand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationArg {
    pub name: Option<Ident>,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Abstract,
    Final,
    Native,
    Synchronized,
    Transient,
    Volatile,
    Strictfp,
    Default,
    Sealed,
}

impl Modifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Abstract => "abstract",
            Modifier::Final => "final",
            Modifier::Native => "native",
            Modifier::Synchronized => "synchronized",
            Modifier::Transient => "transient",
            Modifier::Volatile => "volatile",
            Modifier::Strictfp => "strictfp",
            Modifier::Default => "default",
            Modifier::Sealed => "sealed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub keywords: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
}

impl Modifiers {
    pub fn has(&self, modifier: Modifier) -> bool {
        self.keywords.contains(&modifier)
    }

    pub fn is_static(&self) -> bool {
        self.has(Modifier::Static)
    }
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeDeclKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

impl TypeDeclKind {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeDeclKind::Class => "class",
            TypeDeclKind::Interface => "interface",
            TypeDeclKind::Enum => "enum",
            TypeDeclKind::Record => "record",
            TypeDeclKind::Annotation => "@interface",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub kind: TypeDeclKind,
    pub modifiers: Modifiers,
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub extends: Vec<TypeRef>,
    pub implements: Vec<TypeRef>,
    pub permits: Vec<TypeRef>,
    pub record_components: Vec<Param>,
    pub enum_constants: Vec<EnumConstant>,
    pub members: Vec<Member>,
    pub doc: Option<TextRange>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub annotations: Vec<Annotation>,
    pub name: Ident,
    pub bounds: Vec<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A primitive keyword or `void`.
    Primitive { keyword: SmolStr, range: TextRange },
    Named(NamedType),
    Array {
        element: Box<TypeRef>,
        dims: u32,
        range: TextRange,
    },
}

impl TypeRef {
    pub fn range(&self) -> TextRange {
        match self {
            TypeRef::Primitive { range, .. } | TypeRef::Array { range, .. } => *range,
            TypeRef::Named(named) => named.range,
        }
    }

    /// `var` in a local declaration.
    pub fn is_var(&self) -> bool {
        match self {
            TypeRef::Named(named) => {
                named.segments.len() == 1
                    && named.segments[0].args.is_none()
                    && named.segments[0].name.as_str() == "var"
            }
            _ => false,
        }
    }

    /// Innermost element type of an array, or the type itself.
    pub fn element(&self) -> &TypeRef {
        match self {
            TypeRef::Array { element, .. } => element.element(),
            other => other,
        }
    }

    pub fn array_dims(&self) -> u32 {
        match self {
            TypeRef::Array { element, dims, .. } => dims + element.array_dims(),
            _ => 0,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive { keyword, .. } => f.write_str(keyword),
            TypeRef::Named(named) => write!(f, "{}", named),
            TypeRef::Array { element, dims, .. } => {
                write!(f, "{}", element)?;
                for _ in 0..*dims {
                    f.write_str("[]")?;
                }
                Ok(())
            }
        }
    }
}

/// `a.b.Outer<String>.Inner`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    pub segments: Vec<TypeSegment>,
    pub range: TextRange,
}

impl NamedType {
    pub fn dotted(&self) -> String {
        let parts: Vec<&str> = self.segments.iter().map(|s| s.name.as_str()).collect();
        parts.join(".")
    }
}

impl fmt::Display for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment.name.as_str())?;
            if let Some(args) = &segment.args {
                f.write_str("<")?;
                for (j, arg) in args.iter().enumerate() {
                    if j > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSegment {
    pub annotations: Vec<Annotation>,
    pub name: Ident,
    /// `None` when no `<...>` follows; `Some(vec![])` for the diamond `<>`.
    pub args: Option<Vec<TypeArg>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArg {
    Type(TypeRef),
    Wildcard {
        bound: Option<WildcardBound>,
        range: TextRange,
    },
}

impl fmt::Display for TypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArg::Type(ty) => write!(f, "{}", ty),
            TypeArg::Wildcard { bound: None, .. } => f.write_str("?"),
            TypeArg::Wildcard {
                bound: Some(bound), ..
            } => {
                let keyword = if bound.is_upper { "extends" } else { "super" };
                write!(f, "? {} {}", keyword, bound.ty)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardBound {
    /// `? extends T` when true, `? super T` otherwise.
    pub is_upper: bool,
    pub ty: Box<TypeRef>,
}

// ============================================================================
// MEMBERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Field(FieldDecl),
    Method(MethodDecl),
    Initializer { is_static: bool, body: Block },
    Type(TypeDecl),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub modifiers: Modifiers,
    pub ty: TypeRef,
    pub declarators: Vec<VarDeclarator>,
    pub doc: Option<TextRange>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDeclarator {
    pub name: Ident,
    /// C-style trailing brackets: `int x[]`.
    pub extra_dims: u32,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeParam>,
    /// `None` for constructors.
    pub return_type: Option<TypeRef>,
    pub name: Ident,
    pub params: Vec<Param>,
    pub throws: Vec<TypeRef>,
    pub body: Option<Block>,
    /// Annotation element default: `String value() default "";`
    pub default_value: Option<Expr>,
    /// Compact canonical record constructor (`Point { ... }`).
    pub compact: bool,
    pub doc: Option<TextRange>,
    pub range: TextRange,
}

impl MethodDecl {
    pub fn is_constructor(&self) -> bool {
        self.return_type.is_none()
    }

    pub fn is_varargs(&self) -> bool {
        self.params.last().is_some_and(|p| p.varargs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub modifiers: Modifiers,
    pub ty: TypeRef,
    pub varargs: bool,
    pub name: Ident,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstant {
    pub annotations: Vec<Annotation>,
    pub name: Ident,
    pub args: Option<Vec<Expr>>,
    pub body: Option<Vec<Member>>,
    pub doc: Option<TextRange>,
}

// ============================================================================
// STATEMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVarDecl {
    pub modifiers: Modifiers,
    pub ty: TypeRef,
    pub declarators: Vec<VarDeclarator>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Local(LocalVarDecl),
    LocalType(TypeDecl),
    Expr(Expr),
    Block(Block),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Vec<Stmt>,
        cond: Option<Expr>,
        update: Vec<Expr>,
        body: Box<Stmt>,
    },
    ForEach {
        var: LocalVarDecl,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Throw(Expr),
    Yield(Expr),
    Break(Option<Ident>),
    Continue(Option<Ident>),
    Try {
        resources: Vec<Resource>,
        body: Block,
        catches: Vec<CatchClause>,
        finally: Option<Block>,
    },
    Switch(SwitchBlock),
    Synchronized {
        lock: Expr,
        body: Block,
    },
    Labeled {
        label: Ident,
        body: Box<Stmt>,
    },
    Assert {
        cond: Expr,
        message: Option<Expr>,
    },
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Decl(LocalVarDecl),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchClause {
    pub modifiers: Modifiers,
    pub types: Vec<TypeRef>,
    pub name: Ident,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchBlock {
    pub selector: Box<Expr>,
    pub cases: Vec<SwitchCase>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchCase {
    pub labels: Vec<CaseLabel>,
    pub guard: Option<Expr>,
    pub body: CaseBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseLabel {
    Default,
    Expr(Expr),
    /// `case Circle c ->`
    TypePattern { ty: TypeRef, name: Ident },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseBody {
    /// `case X: stmts...`
    Statements(Vec<Stmt>),
    /// `case X -> stmt`
    Arrow(Box<Stmt>),
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    Boolean,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Shl,
    Shr,
    UShr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// Operators whose result is always `boolean`.
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            BinaryOp::Or
                | BinaryOp::And
                | BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::Gt
                | BinaryOp::LtEq
                | BinaryOp::GtEq
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CtorCallKind {
    This,
    Super,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaParam {
    pub modifiers: Modifiers,
    pub ty: Option<TypeRef>,
    pub name: Ident,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodRefTarget {
    Expr(Box<Expr>),
    Type(TypeRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal {
        kind: LiteralKind,
        range: TextRange,
    },
    Name(Ident),
    FieldAccess {
        target: Box<Expr>,
        name: Ident,
        range: TextRange,
    },
    MethodCall {
        target: Option<Box<Expr>>,
        type_args: Vec<TypeRef>,
        name: Ident,
        args: Vec<Expr>,
        range: TextRange,
    },
    /// `this(...)` / `super(...)` / `outer.super(...)` inside a constructor.
    CtorCall {
        kind: CtorCallKind,
        keyword: TextRange,
        qualifier: Option<Box<Expr>>,
        args: Vec<Expr>,
        range: TextRange,
    },
    New {
        qualifier: Option<Box<Expr>>,
        ty: TypeRef,
        args: Vec<Expr>,
        body: Option<Vec<Member>>,
        range: TextRange,
    },
    NewArray {
        element: TypeRef,
        dims: Vec<Expr>,
        init: Option<Vec<Expr>>,
        range: TextRange,
    },
    ArrayInit {
        elements: Vec<Expr>,
        range: TextRange,
    },
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
        range: TextRange,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        range: TextRange,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        range: TextRange,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
        range: TextRange,
    },
    Conditional {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
        range: TextRange,
    },
    Cast {
        ty: TypeRef,
        extra_bounds: Vec<TypeRef>,
        expr: Box<Expr>,
        range: TextRange,
    },
    InstanceOf {
        expr: Box<Expr>,
        ty: TypeRef,
        binding: Option<Ident>,
        range: TextRange,
    },
    Lambda {
        params: Vec<LambdaParam>,
        body: LambdaBody,
        range: TextRange,
    },
    MethodRef {
        target: MethodRefTarget,
        /// `new` for constructor references.
        name: Ident,
        range: TextRange,
    },
    /// `this` or `Outer.this`.
    This {
        qualifier: Option<Box<Expr>>,
        range: TextRange,
    },
    /// `super` as a member-access receiver, or `Iface.super`.
    Super {
        qualifier: Option<Box<Expr>>,
        range: TextRange,
    },
    ClassLit {
        ty: TypeRef,
        range: TextRange,
    },
    Paren {
        inner: Box<Expr>,
        range: TextRange,
    },
    Switch(Box<SwitchBlock>),
    Annotation(Box<Annotation>),
}

impl Expr {
    pub fn range(&self) -> TextRange {
        match self {
            Expr::Name(ident) => ident.range,
            Expr::Switch(block) => block.range,
            Expr::Annotation(annotation) => annotation.range,
            Expr::Literal { range, .. }
            | Expr::FieldAccess { range, .. }
            | Expr::MethodCall { range, .. }
            | Expr::CtorCall { range, .. }
            | Expr::New { range, .. }
            | Expr::NewArray { range, .. }
            | Expr::ArrayInit { range, .. }
            | Expr::Index { range, .. }
            | Expr::Unary { range, .. }
            | Expr::Binary { range, .. }
            | Expr::Assign { range, .. }
            | Expr::Conditional { range, .. }
            | Expr::Cast { range, .. }
            | Expr::InstanceOf { range, .. }
            | Expr::Lambda { range, .. }
            | Expr::MethodRef { range, .. }
            | Expr::This { range, .. }
            | Expr::Super { range, .. }
            | Expr::ClassLit { range, .. }
            | Expr::Paren { range, .. } => *range,
        }
    }

    /// Flatten `a.b.c` into its identifiers when the expression is a pure
    /// name chain.
    pub fn as_name_chain(&self) -> Option<Vec<&Ident>> {
        match self {
            Expr::Name(ident) => Some(vec![ident]),
            Expr::FieldAccess { target, name, .. } => {
                let mut chain = target.as_name_chain()?;
                chain.push(name);
                Some(chain)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(text: &str, start: u32) -> Ident {
        Ident::new(text, TextRange::at(start.into(), (text.len() as u32).into()))
    }

    #[test]
    fn test_qualified_name_dotted_and_range() {
        let name = QualifiedName {
            segments: vec![ident("android", 7), ident("widget", 15), ident("Space", 22)],
        };
        assert_eq!(name.to_dotted(), "android.widget.Space");
        assert_eq!(name.range(), TextRange::new(7.into(), 27.into()));
    }

    #[test]
    fn test_type_ref_display() {
        let space = TypeRef::Named(NamedType {
            segments: vec![TypeSegment {
                annotations: Vec::new(),
                name: ident("Space", 0),
                args: None,
            }],
            range: TextRange::default(),
        });
        let model = TypeRef::Named(NamedType {
            segments: vec![TypeSegment {
                annotations: Vec::new(),
                name: ident("EpoxyModel", 0),
                args: Some(vec![TypeArg::Type(space)]),
            }],
            range: TextRange::default(),
        });
        let array = TypeRef::Array {
            element: Box::new(model),
            dims: 2,
            range: TextRange::default(),
        };
        assert_eq!(array.to_string(), "EpoxyModel<Space>[][]");
        assert_eq!(array.array_dims(), 2);
    }

    #[test]
    fn test_name_chain_flattening() {
        let chain = Expr::FieldAccess {
            target: Box::new(Expr::FieldAccess {
                target: Box::new(Expr::Name(ident("R", 0))),
                name: ident("layout", 2),
                range: TextRange::default(),
            }),
            name: ident("item", 9),
            range: TextRange::default(),
        };
        let names: Vec<&str> = chain
            .as_name_chain()
            .unwrap()
            .into_iter()
            .map(Ident::as_str)
            .collect();
        assert_eq!(names, vec!["R", "layout", "item"]);
    }
}
