//! Type references and annotation uses.

use std::sync::Arc;

use crate::classpath::{ClassInfo, JavaType};
use crate::syntax::ast::{Annotation, Ident, NamedType, TypeArg, TypeParam, TypeRef};

use super::super::env::{Segment, array_of};
use super::super::symbols::Symbol;
use super::Resolver;

impl Resolver<'_> {
    /// Emit references for a written type and return the type it denotes.
    /// Primitives and `var` produce no occurrence.
    pub(super) fn type_ref(&mut self, ty: &TypeRef) -> JavaType {
        match ty {
            TypeRef::Primitive { keyword, .. } => JavaType::primitive(keyword),
            TypeRef::Array { element, dims, .. } => {
                let element = self.type_ref(element);
                array_of(element, *dims)
            }
            TypeRef::Named(_) if ty.is_var() => JavaType::Unknown,
            TypeRef::Named(named) => self.named_type(named, true).0,
        }
    }

    pub(super) fn type_refs(&mut self, types: &[TypeRef]) -> Vec<JavaType> {
        types.iter().map(|ty| self.type_ref(ty)).collect()
    }

    /// Resolve a possibly qualified, possibly parameterized type name.
    ///
    /// With `emit_last` unset the last segment is left to the caller when it
    /// resolves to a class (a `new` expression references the constructor
    /// there instead). Unresolved names are always reported here.
    pub(super) fn named_type(&mut self, named: &NamedType, emit_last: bool) -> (JavaType, Option<Arc<ClassInfo>>) {
        let idents: Vec<&Ident> = named.segments.iter().map(|s| &s.name).collect();
        let names: Vec<&str> = idents.iter().map(|i| i.as_str()).collect();
        let segments = self.env.resolve_type_path(&self.scopes, &self.imports, &names);

        for segment in &named.segments {
            self.annotations(&segment.annotations);
        }

        let last_index = idents.len().saturating_sub(1);
        let mut result = (JavaType::Unknown, None);
        for (i, segment) in segments.into_iter().enumerate() {
            let Some(ident) = idents.get(i) else {
                break;
            };
            match segment {
                Segment::Package(symbol) => self.reference(ident.range, symbol),
                Segment::TypeParam(symbol) => {
                    self.reference(ident.range, symbol);
                    if i == last_index {
                        result.0 = JavaType::TypeVar(ident.text.clone());
                    }
                }
                Segment::Class(class) => {
                    if i != last_index || emit_last {
                        self.reference(ident.range, class.symbol.clone());
                    }
                    if i == last_index {
                        result = (
                            JavaType::Class {
                                name: class.qualified_name.clone(),
                                args: Vec::new(),
                            },
                            Some(class),
                        );
                    }
                }
                Segment::Unresolved => {
                    self.unresolved(&idents[i..], false);
                    break;
                }
            }
        }

        // Type arguments of every segment; only the last one's are kept.
        for (i, segment) in named.segments.iter().enumerate() {
            let Some(args) = &segment.args else {
                continue;
            };
            let converted: Vec<JavaType> = args.iter().map(|arg| self.type_arg(arg)).collect();
            if i == last_index {
                if let JavaType::Class { args, .. } = &mut result.0 {
                    *args = converted;
                }
            }
        }
        result
    }

    fn type_arg(&mut self, arg: &TypeArg) -> JavaType {
        match arg {
            TypeArg::Type(ty) => self.type_ref(ty),
            TypeArg::Wildcard { bound: None, .. } => JavaType::object(),
            TypeArg::Wildcard {
                bound: Some(bound), ..
            } => {
                let ty = self.type_ref(&bound.ty);
                if bound.is_upper { ty } else { JavaType::object() }
            }
        }
    }

    /// Definition of a type parameter, then references in its bounds.
    pub(super) fn type_param_def(&mut self, param: &TypeParam, symbol: &Symbol) {
        self.annotations(&param.annotations);
        let signature = self.signatures.type_param(param);
        self.define(&param.name, symbol, signature, None, Vec::new());
        self.type_refs(&param.bounds);
    }

    // ========================================================================
    // ANNOTATIONS
    // ========================================================================

    pub(super) fn annotations(&mut self, annotations: &[Annotation]) {
        for annotation in annotations {
            self.annotation(annotation);
        }
    }

    /// `@Name(args)`: references over the name after `@`, then element
    /// names and values.
    pub(super) fn annotation(&mut self, annotation: &Annotation) {
        let idents: Vec<&Ident> = annotation.name.segments.iter().collect();
        let names: Vec<&str> = idents.iter().map(|i| i.as_str()).collect();
        let segments = self.env.resolve_type_path(&self.scopes, &self.imports, &names);
        let class = self.emit_segments(&idents, segments, false);

        for arg in &annotation.args {
            if let (Some(name), Some(class)) = (&arg.name, &class) {
                if let Some(element) = class.methods_named(name.as_str()).next() {
                    self.reference(name.range, element.symbol.clone());
                }
            }
            self.expr(&arg.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{at, index};

    #[test]
    fn test_extends_with_type_argument() {
        let source = "package com.airbnb.epoxy;\nimport android.widget.Space;\n\
                      class HiddenEpoxyModel extends EpoxyModel<Space> {}\n";
        let index = index(source);
        assert_eq!(
            at(&index, source, "EpoxyModel<"),
            vec!["reference com/airbnb/epoxy/EpoxyModel#"]
        );
        assert_eq!(at(&index, source, "Space>"), vec!["reference android/widget/Space#"]);
        // No implicit constructor occurrence.
        assert_eq!(index.definitions().count(), 1);
    }

    #[test]
    fn test_primitives_and_var_emit_nothing() {
        let source = "class A { void f() { int x = 1; var y = \"s\"; } }";
        let index = index(source);
        assert!(index.references().next().is_none());
        assert_eq!(at(&index, source, "x = 1"), vec!["definition local0"]);
        assert_eq!(at(&index, source, "y = "), vec!["definition local1"]);
    }

    #[test]
    fn test_qualified_type_name() {
        let source = "class A { java.util.List<String> items; }";
        let index = index(source);
        assert_eq!(at(&index, source, "java."), vec!["reference java/"]);
        assert_eq!(at(&index, source, "util."), vec!["reference java/util/"]);
        assert_eq!(at(&index, source, "List<"), vec!["reference java/util/List#"]);
        assert_eq!(at(&index, source, "String>"), vec!["reference java/lang/String#"]);
    }

    #[test]
    fn test_type_parameters_and_self_reference() {
        let source = "class Node<T extends Comparable<T>> { Node<T> next; T value; }";
        let index = index(source);
        assert_eq!(at(&index, source, "T extends"), vec!["definition Node#[T]"]);
        assert_eq!(at(&index, source, "T>>"), vec!["reference Node#[T]"]);
        assert_eq!(at(&index, source, "Node<T> next"), vec!["reference Node#"]);
        assert_eq!(at(&index, source, "T value"), vec!["reference Node#[T]"]);
    }

    #[test]
    fn test_override_annotation_covers_name_only() {
        let source = "class A { @Override public String toString() { return \"\"; } }";
        let index = index(source);
        let offset = source.find("Override").unwrap() as u32;
        let occurrence = index
            .references()
            .find(|o| o.symbol.to_string() == "java/lang/Override#")
            .unwrap();
        assert_eq!(occurrence.range.start.col, offset);
        assert_eq!(occurrence.range.end.col, offset + "Override".len() as u32);
    }

    #[test]
    fn test_annotation_element_reference() {
        let source = "@interface Tag { String value(); int weight() default 1; }\n\
                      @Tag(value = \"x\", weight = 2) class A {}\n";
        let index = index(source);
        assert_eq!(at(&index, source, "value = "), vec!["reference Tag#value()."]);
        assert_eq!(at(&index, source, "weight = "), vec!["reference Tag#weight()."]);
    }
}
