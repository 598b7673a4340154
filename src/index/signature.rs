//! Hover signatures rendered from declarations.

use text_size::TextRange;

use crate::syntax::ast::{
    EnumConstant, LambdaParam, MethodDecl, Modifiers, Param, TypeDecl, TypeParam, TypeRef,
    VarDeclarator,
};
use crate::syntax::doc_comment_text;

/// Renders declaration signatures and doc comments from a unit's source.
#[derive(Clone, Copy, Debug)]
pub struct SignatureRenderer<'a> {
    source: &'a str,
}

impl<'a> SignatureRenderer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn slice(&self, range: TextRange) -> &'a str {
        self.source
            .get(usize::from(range.start())..usize::from(range.end()))
            .unwrap_or("")
    }

    /// Cleaned text of a `/** ... */` comment.
    pub fn doc(&self, doc: Option<TextRange>) -> Option<String> {
        let text = doc_comment_text(self.slice(doc?));
        (!text.is_empty()).then_some(text)
    }

    fn modifiers(&self, modifiers: &Modifiers) -> Vec<String> {
        modifiers
            .annotations
            .iter()
            .map(|annotation| self.slice(annotation.range).to_string())
            .chain(modifiers.keywords.iter().map(|k| k.as_str().to_string()))
            .collect()
    }

    pub fn type_decl(&self, decl: &TypeDecl) -> String {
        let mut parts = self.modifiers(&decl.modifiers);
        parts.push(decl.kind.keyword().to_string());
        parts.push(format!("{}{}", decl.name.as_str(), self.type_params(&decl.type_params)));
        join(parts)
    }

    pub fn method(&self, decl: &MethodDecl) -> String {
        let mut parts = self.modifiers(&decl.modifiers);
        if !decl.type_params.is_empty() {
            parts.push(self.type_params(&decl.type_params));
        }
        if let Some(ret) = &decl.return_type {
            parts.push(ret.to_string());
        }
        let params: Vec<String> = decl.params.iter().map(|p| self.param(p)).collect();
        let mut head = format!("{}({})", decl.name.as_str(), params.join(", "));
        if decl.compact {
            head = decl.name.as_str().to_string();
        }
        parts.push(head);
        if !decl.throws.is_empty() {
            let throws: Vec<String> = decl.throws.iter().map(ToString::to_string).collect();
            parts.push(format!("throws {}", throws.join(", ")));
        }
        join(parts)
    }

    pub fn param(&self, param: &Param) -> String {
        let mut parts = self.modifiers(&param.modifiers);
        let ty = if param.varargs {
            format!("{}...", param.ty)
        } else {
            param.ty.to_string()
        };
        parts.push(ty);
        parts.push(param.name.as_str().to_string());
        join(parts)
    }

    /// Field or local variable declarator.
    pub fn variable(&self, modifiers: &Modifiers, ty: &TypeRef, declarator: &VarDeclarator) -> String {
        let mut parts = self.modifiers(modifiers);
        let mut ty = ty.to_string();
        for _ in 0..declarator.extra_dims {
            ty.push_str("[]");
        }
        parts.push(ty);
        parts.push(declarator.name.as_str().to_string());
        join(parts)
    }

    pub fn lambda_param(&self, param: &LambdaParam) -> String {
        let mut parts = self.modifiers(&param.modifiers);
        if let Some(ty) = &param.ty {
            parts.push(ty.to_string());
        }
        parts.push(param.name.as_str().to_string());
        join(parts)
    }

    pub fn type_param(&self, param: &TypeParam) -> String {
        if param.bounds.is_empty() {
            return param.name.as_str().to_string();
        }
        let bounds: Vec<String> = param.bounds.iter().map(ToString::to_string).collect();
        format!("{} extends {}", param.name.as_str(), bounds.join(" & "))
    }

    fn type_params(&self, params: &[TypeParam]) -> String {
        if params.is_empty() {
            return String::new();
        }
        let rendered: Vec<String> = params.iter().map(|p| self.type_param(p)).collect();
        format!("<{}>", rendered.join(", "))
    }

    pub fn enum_constant(&self, constant: &EnumConstant) -> String {
        constant.name.as_str().to_string()
    }
}

fn join(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ast::Member;
    use crate::syntax::parse;

    const SOURCE: &str = "\
/** Placeholder model. */
public final class Box<T extends Comparable<T>> {
  /** Current span. */
  private static int spans[] = null;

  @Override
  public int getSpanSize(int spanCount, final int position, String... names) throws Exception {
    return 0;
  }
}
";

    #[test]
    fn test_render_declarations() {
        let unit = parse(SOURCE).unwrap();
        let renderer = SignatureRenderer::new(SOURCE);
        let decl = &unit.types[0];
        assert_eq!(
            renderer.type_decl(decl),
            "public final class Box<T extends Comparable<T>>"
        );
        assert_eq!(renderer.doc(decl.doc).as_deref(), Some("Placeholder model."));

        let Member::Field(field) = &decl.members[0] else {
            panic!("expected field");
        };
        assert_eq!(
            renderer.variable(&field.modifiers, &field.ty, &field.declarators[0]),
            "private static int[] spans"
        );
        assert_eq!(renderer.doc(field.doc).as_deref(), Some("Current span."));

        let Member::Method(method) = &decl.members[1] else {
            panic!("expected method");
        };
        assert_eq!(
            renderer.method(method),
            "@Override public int getSpanSize(int spanCount, final int position, String... names) throws Exception"
        );
        assert_eq!(renderer.param(&method.params[0]), "int spanCount");
        assert_eq!(renderer.doc(method.doc), None);
    }
}
