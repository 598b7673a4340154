//! Expressions: name chains, member access, calls and constructor uses.
//!
//! Every expression returns its static type as far as it is known, so that
//! member accesses on its value can be linked.

use text_size::TextRange;

use crate::classpath::JavaType;
use crate::syntax::ast::{
    BinaryOp, CtorCallKind, Expr, Ident, LambdaBody, LambdaParam, LiteralKind, Member,
    MethodRefTarget, TypeRef, UnaryOp,
};

use super::super::env::array_of;
use super::super::imports::ImportScope;
use super::super::overload::{Candidate, Selection, select};
use super::super::scope::{ScopeKind, TypeBinding};
use super::super::symbols::SymbolKind;
use super::{Receiver, Resolver};

impl Resolver<'_> {
    pub(super) fn expr(&mut self, expr: &Expr) -> JavaType {
        match expr {
            Expr::Literal { kind, .. } => literal_type(*kind),
            Expr::Name(_) | Expr::FieldAccess { .. } => {
                if let Some(chain) = expr.as_name_chain() {
                    return self.name_chain(&chain).ty();
                }
                let Expr::FieldAccess { target, name, .. } = expr else {
                    return JavaType::Unknown;
                };
                let receiver = self.receiver(target);
                match self.member(&receiver, name) {
                    Some(member) => member.ty(),
                    None => {
                        self.unresolved(&[name], true);
                        JavaType::Unknown
                    }
                }
            }
            Expr::MethodCall {
                target,
                type_args,
                name,
                args,
                ..
            } => self.method_call(target.as_deref(), type_args, name, args),
            Expr::CtorCall {
                kind,
                keyword,
                qualifier,
                args,
                ..
            } => {
                if let Some(qualifier) = qualifier {
                    self.expr(qualifier);
                }
                self.ctor_call(*kind, *keyword, args);
                JavaType::primitive("void")
            }
            Expr::New {
                qualifier,
                ty,
                args,
                body,
                range,
            } => self.new_object(qualifier.as_deref(), ty, args, body.as_deref(), *range),
            Expr::NewArray {
                element,
                dims,
                init,
                ..
            } => {
                let element = self.type_ref(element);
                for dim in dims {
                    self.expr(dim);
                }
                for value in init.iter().flatten() {
                    self.expr(value);
                }
                array_of(element, dims.len().max(1) as u32)
            }
            Expr::ArrayInit { elements, .. } => {
                for element in elements {
                    self.expr(element);
                }
                JavaType::Unknown
            }
            Expr::Index { array, index, .. } => {
                let array = self.expr(array);
                self.expr(index);
                match array {
                    JavaType::Array(element) => *element,
                    _ => JavaType::Unknown,
                }
            }
            Expr::Unary { op, operand, .. } => {
                let ty = self.expr(operand);
                if *op == UnaryOp::Not {
                    JavaType::primitive("boolean")
                } else {
                    ty
                }
            }
            Expr::Binary { op, lhs, rhs, .. } => {
                let lhs = self.expr(lhs);
                let rhs = self.expr(rhs);
                binary_type(*op, &lhs, &rhs)
            }
            Expr::Assign { target, value, .. } => {
                let ty = self.expr(target);
                self.expr(value);
                ty
            }
            Expr::Conditional {
                cond,
                then_expr,
                else_expr,
                ..
            } => {
                self.expr(cond);
                let then_ty = self.expr(then_expr);
                let else_ty = self.expr(else_expr);
                if then_ty.is_known() { then_ty } else { else_ty }
            }
            Expr::Cast {
                ty,
                extra_bounds,
                expr,
                ..
            } => {
                let ty = self.type_ref(ty);
                self.type_refs(extra_bounds);
                self.expr(expr);
                ty
            }
            Expr::InstanceOf {
                expr, ty, binding, ..
            } => {
                self.expr(expr);
                let checked = self.type_ref(ty);
                if let Some(binding) = binding {
                    let signature = format!("{} {}", ty, binding.as_str());
                    self.declare_local(binding, SymbolKind::LocalVariable, checked, signature);
                }
                JavaType::primitive("boolean")
            }
            Expr::Lambda { params, body, .. } => {
                self.lambda(params, body);
                JavaType::Unknown
            }
            Expr::MethodRef { target, name, .. } => {
                self.method_ref(target, name);
                JavaType::Unknown
            }
            Expr::This { qualifier, .. } => match qualifier {
                Some(qualifier) => self.receiver(qualifier).ty(),
                None => self
                    .scopes
                    .enclosing_class()
                    .map(|class| class.self_type())
                    .unwrap_or(JavaType::Unknown),
            },
            Expr::Super { .. } => self.receiver(expr).ty(),
            Expr::ClassLit { ty, .. } => {
                self.type_ref(ty);
                JavaType::class("java.lang.Class")
            }
            Expr::Paren { inner, .. } => self.expr(inner),
            Expr::Switch(block) => {
                self.switch_block(block);
                JavaType::Unknown
            }
            Expr::Annotation(annotation) => {
                self.annotation(annotation);
                JavaType::Unknown
            }
        }
    }

    // ========================================================================
    // NAMES AND MEMBERS
    // ========================================================================

    /// What the target of a member access denotes. Name chains may denote a
    /// type (`Math.max`), everything else is a value.
    pub(super) fn receiver(&mut self, expr: &Expr) -> Receiver {
        if let Some(chain) = expr.as_name_chain() {
            return self.name_chain(&chain);
        }
        match expr {
            Expr::Super { qualifier, .. } => {
                if let Some(qualifier) = qualifier {
                    // `Iface.super.m()`
                    return match self.receiver(qualifier) {
                        Receiver::Type(class) => Receiver::Value(class.self_type()),
                        other => other,
                    };
                }
                self.scopes
                    .enclosing_class()
                    .and_then(|class| class.superclass.clone())
                    .map(Receiver::Value)
                    .unwrap_or(Receiver::Unknown)
            }
            _ => Receiver::Value(self.expr(expr)),
        }
    }

    /// Resolve `a.b.c`, reading the leading part as a variable, then a type,
    /// then a package. One occurrence per segment.
    pub(super) fn name_chain(&mut self, idents: &[&Ident]) -> Receiver {
        let Some((mut receiver, start)) = self.chain_head(idents) else {
            self.unresolved(idents, true);
            return Receiver::Unknown;
        };
        for (i, ident) in idents.iter().enumerate().skip(start) {
            match self.member(&receiver, ident) {
                Some(next) => receiver = next,
                None => {
                    self.unresolved(&idents[i..], true);
                    return Receiver::Unknown;
                }
            }
        }
        receiver
    }

    /// The leading part of a name chain and how many segments it spans.
    fn chain_head(&mut self, idents: &[&Ident]) -> Option<(Receiver, usize)> {
        let head = idents.first()?;
        if let Some(binding) = self.lookup_value(head.as_str()) {
            self.reference(head.range, binding.symbol);
            return Some((Receiver::Value(binding.ty), 1));
        }
        match self
            .env
            .resolve_simple_type(&self.scopes, &self.imports, head.as_str())
        {
            Some(TypeBinding::Class(class)) => {
                self.reference(head.range, class.symbol.clone());
                return Some((Receiver::Type(class), 1));
            }
            Some(TypeBinding::TypeParam { symbol, .. }) => {
                self.reference(head.range, symbol);
                return Some((Receiver::Unknown, 1));
            }
            None => {}
        }

        let names: Vec<&str> = idents.iter().map(|i| i.as_str()).collect();
        for split in 1..names.len() {
            let package = names[..split].join(".");
            if !self.env.has_package(&package) {
                break;
            }
            let Some(class) = self.env.class(&ImportScope::qualify(&package, names[split])) else {
                continue;
            };
            for end in 1..=split {
                let symbol = self.env.package_symbol(&names[..end].join("."));
                self.reference(idents[end - 1].range, symbol);
            }
            self.reference(idents[split].range, class.symbol.clone());
            return Some((Receiver::Type(class), split + 1));
        }
        None
    }

    /// Field or member type `name` of the receiver. Emits the reference.
    fn member(&mut self, receiver: &Receiver, name: &Ident) -> Option<Receiver> {
        match receiver {
            // Array length is not a declared member.
            Receiver::Value(JavaType::Array(_)) if name.as_str() == "length" => {
                Some(Receiver::Value(JavaType::primitive("int")))
            }
            Receiver::Value(ty) => {
                let field = self.env.find_field(ty, name.as_str())?;
                self.reference(name.range, field.symbol);
                Some(Receiver::Value(field.ty))
            }
            Receiver::Type(class) => {
                if let Some(field) = self.env.find_field(&class.self_type(), name.as_str()) {
                    self.reference(name.range, field.symbol);
                    return Some(Receiver::Value(field.ty));
                }
                let inner = self.env.member_type(class, name.as_str())?;
                self.reference(name.range, inner.symbol.clone());
                Some(Receiver::Type(inner))
            }
            Receiver::Unknown => None,
        }
    }

    // ========================================================================
    // CALLS
    // ========================================================================

    fn method_call(
        &mut self,
        target: Option<&Expr>,
        type_args: &[TypeRef],
        name: &Ident,
        args: &[Expr],
    ) -> JavaType {
        self.type_refs(type_args);
        let candidates = match target {
            None => self.lookup_methods(name.as_str()),
            Some(target) => {
                let receiver = self.receiver(target);
                self.env.methods(&receiver.ty(), name.as_str())
            }
        };
        let arg_types: Vec<JavaType> = args.iter().map(|arg| self.expr(arg)).collect();
        match self.select_callable(name.range, name.as_str(), candidates, &arg_types) {
            Some(candidate) => candidate.returns,
            None => {
                self.unresolved(&[name], true);
                JavaType::Unknown
            }
        }
    }

    /// Pick an overload and reference it at `at`. Ambiguity is reported
    /// and resolved to the first declared survivor.
    fn select_callable(
        &mut self,
        at: TextRange,
        name: &str,
        candidates: Vec<Candidate>,
        args: &[JavaType],
    ) -> Option<Candidate> {
        match select(candidates, args) {
            Selection::Unique(candidate) => {
                self.reference(at, candidate.symbol.clone());
                Some(candidate)
            }
            Selection::Ambiguous { chosen, survivors } => {
                self.reference(at, chosen.symbol.clone());
                let range = self.lines.range(at);
                self.diagnostics
                    .ambiguous_overload(range, name, &chosen.symbol, &survivors);
                Some(chosen)
            }
            Selection::NotFound => None,
        }
    }

    /// `this(...)` or `super(...)`: references the constructor over the
    /// keyword when one is known, nothing otherwise.
    fn ctor_call(&mut self, kind: CtorCallKind, keyword: TextRange, args: &[Expr]) {
        let arg_types: Vec<JavaType> = args.iter().map(|arg| self.expr(arg)).collect();
        let Some(class) = self.scopes.enclosing_class().cloned() else {
            return;
        };
        let target = match kind {
            CtorCallKind::This => Some((class.clone(), Vec::new())),
            CtorCallKind::Super => match &class.superclass {
                Some(JavaType::Class { name, args }) => {
                    self.env.class(name).map(|parent| (parent, args.clone()))
                }
                _ => None,
            },
        };
        let Some((target, type_args)) = target else {
            return;
        };
        let candidates = self.env.constructors(&target, &type_args);
        let name = match kind {
            CtorCallKind::This => "this",
            CtorCallKind::Super => "super",
        };
        self.select_callable(keyword, name, candidates, &arg_types);
    }

    /// `new T(args)`, optionally with an anonymous class body. The type
    /// name references the selected constructor, or the class when it
    /// declares none.
    fn new_object(
        &mut self,
        qualifier: Option<&Expr>,
        ty: &TypeRef,
        args: &[Expr],
        body: Option<&[Member]>,
        range: TextRange,
    ) -> JavaType {
        let arg_types: Vec<JavaType> = args.iter().map(|arg| self.expr(arg)).collect();
        let TypeRef::Named(named) = ty else {
            return self.type_ref(ty);
        };
        let Some(last) = named.segments.last().map(|s| &s.name) else {
            return JavaType::Unknown;
        };

        let (created, class) = match qualifier {
            // `outer.new Inner()`
            Some(qualifier) => {
                let outer = self.receiver(qualifier).ty();
                let inner = outer
                    .class_name()
                    .and_then(|name| self.env.class(name))
                    .and_then(|outer| self.env.member_type(&outer, last.as_str()));
                match inner {
                    Some(inner) => (inner.self_type(), Some(inner)),
                    None => {
                        self.unresolved(&[last], false);
                        (JavaType::Unknown, None)
                    }
                }
            }
            None => self.named_type(named, false),
        };

        if let Some(class) = &class {
            let type_args = match &created {
                JavaType::Class { args, .. } => args.clone(),
                _ => Vec::new(),
            };
            let candidates = self.env.constructors(class, &type_args);
            if self
                .select_callable(last.range, last.as_str(), candidates, &arg_types)
                .is_none()
            {
                self.reference(last.range, class.symbol.clone());
            }
        }

        match body {
            Some(members) => self
                .anonymous_class(class.as_ref(), created, members, range)
                .map(|anonymous| anonymous.self_type())
                .unwrap_or(JavaType::Unknown),
            None => created,
        }
    }

    // ========================================================================
    // LAMBDAS AND METHOD REFERENCES
    // ========================================================================

    fn lambda(&mut self, params: &[LambdaParam], body: &LambdaBody) {
        self.scopes.push(ScopeKind::Block, None);
        for param in params {
            self.annotations(&param.modifiers.annotations);
            let ty = match &param.ty {
                Some(ty) => self.type_ref(ty),
                None => JavaType::Unknown,
            };
            let signature = self.signatures.lambda_param(param);
            self.declare_local(&param.name, SymbolKind::Parameter, ty, signature);
        }
        match body {
            LambdaBody::Expr(expr) => {
                self.expr(expr);
            }
            LambdaBody::Block(block) => self.block(block),
        }
        self.scopes.pop();
    }

    /// `target::name` or `Type::new`. Without arguments there is no arity to
    /// narrow by, so several candidates make the reference ambiguous.
    fn method_ref(&mut self, target: &MethodRefTarget, name: &Ident) {
        let receiver = match target {
            MethodRefTarget::Expr(expr) => self.receiver(expr),
            MethodRefTarget::Type(ty) => {
                let ty = self.type_ref(ty);
                match ty.class_name().and_then(|n| self.env.class(n)) {
                    Some(class) => Receiver::Type(class),
                    None => Receiver::Value(ty),
                }
            }
        };

        if name.as_str() == "new" {
            let Receiver::Type(class) = receiver else {
                return;
            };
            let candidates = self.env.constructors(&class, &[]);
            if self.first_candidate(name, candidates).is_none() {
                self.reference(name.range, class.symbol.clone());
            }
            return;
        }

        let candidates = self.env.methods(&receiver.ty(), name.as_str());
        if self.first_candidate(name, candidates).is_none() {
            self.unresolved(&[name], true);
        }
    }

    fn first_candidate(&mut self, name: &Ident, candidates: Vec<Candidate>) -> Option<Candidate> {
        let chosen = candidates.first()?.clone();
        self.reference(name.range, chosen.symbol.clone());
        if candidates.len() > 1 {
            let survivors: Vec<_> = candidates.iter().map(|c| c.symbol.clone()).collect();
            let range = self.lines.range(name.range);
            self.diagnostics
                .ambiguous_overload(range, name.as_str(), &chosen.symbol, &survivors);
        }
        Some(chosen)
    }

    /// Enum constant labels (`case RED:`) name a constant of the selector's
    /// enum type without qualification.
    pub(super) fn case_constant(&mut self, selector: &JavaType, label: &Expr) {
        if let Expr::Name(ident) = label {
            if let Some(class) = selector.class_name().and_then(|n| self.env.class(n)) {
                if class.kind() == SymbolKind::Enum {
                    if let Some(field) = self.env.find_field(&class.self_type(), ident.as_str()) {
                        self.reference(ident.range, field.symbol);
                        return;
                    }
                }
            }
        }
        self.expr(label);
    }
}

fn literal_type(kind: LiteralKind) -> JavaType {
    match kind {
        LiteralKind::Int => JavaType::primitive("int"),
        LiteralKind::Long => JavaType::primitive("long"),
        LiteralKind::Float => JavaType::primitive("float"),
        LiteralKind::Double => JavaType::primitive("double"),
        LiteralKind::Char => JavaType::primitive("char"),
        LiteralKind::String => JavaType::string(),
        LiteralKind::Boolean => JavaType::primitive("boolean"),
        LiteralKind::Null => JavaType::Null,
    }
}

/// Result type of a binary operator: string concatenation, comparisons,
/// otherwise binary numeric promotion.
fn binary_type(op: BinaryOp, lhs: &JavaType, rhs: &JavaType) -> JavaType {
    if op.is_boolean() {
        return JavaType::primitive("boolean");
    }
    let string = JavaType::string();
    if op == BinaryOp::Add && (lhs.erasure_eq(&string) || rhs.erasure_eq(&string)) {
        return string;
    }
    if matches!(op, BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr) {
        return lhs.clone();
    }
    for wide in ["double", "float", "long"] {
        let wide = JavaType::primitive(wide);
        if lhs.erasure_eq(&wide) || rhs.erasure_eq(&wide) {
            return wide;
        }
    }
    match (lhs, rhs) {
        (JavaType::Primitive(_), JavaType::Primitive(_)) => JavaType::primitive("int"),
        _ => JavaType::Unknown,
    }
}
