//! Statements and the block scopes they open.

use crate::classpath::JavaType;
use crate::syntax::ast::{Block, CaseBody, CaseLabel, CatchClause, LocalVarDecl, Resource, Stmt, SwitchBlock};

use super::super::env::array_of;
use super::super::scope::{ScopeKind, ValueBinding};
use super::super::symbols::SymbolKind;
use super::Resolver;

impl Resolver<'_> {
    pub(super) fn block(&mut self, block: &Block) {
        self.scopes.push(ScopeKind::Block, None);
        self.stmts(&block.stmts);
        self.scopes.pop();
    }

    fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    pub(super) fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Local(decl) => self.local_var(decl, None),
            Stmt::LocalType(decl) => self.local_type_decl(decl),
            Stmt::Expr(expr) | Stmt::Throw(expr) | Stmt::Yield(expr) => {
                self.expr(expr);
            }
            Stmt::Return(value) => {
                if let Some(value) = value {
                    self.expr(value);
                }
            }
            Stmt::Block(block) => self.block(block),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.expr(cond);
                self.nested(then_branch);
                if let Some(else_branch) = else_branch {
                    self.nested(else_branch);
                }
            }
            Stmt::While { cond, body } => {
                self.expr(cond);
                self.nested(body);
            }
            Stmt::DoWhile { body, cond } => {
                self.nested(body);
                self.expr(cond);
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                self.scopes.push(ScopeKind::Block, None);
                self.stmts(init);
                if let Some(cond) = cond {
                    self.expr(cond);
                }
                for expr in update {
                    self.expr(expr);
                }
                self.nested(body);
                self.scopes.pop();
            }
            Stmt::ForEach { var, iterable, body } => {
                self.scopes.push(ScopeKind::Block, None);
                let element = element_type(self.expr(iterable));
                self.local_var(var, Some(element));
                self.nested(body);
                self.scopes.pop();
            }
            Stmt::Try {
                resources,
                body,
                catches,
                finally,
            } => {
                self.scopes.push(ScopeKind::Block, None);
                for resource in resources {
                    match resource {
                        Resource::Decl(decl) => self.local_var(decl, None),
                        Resource::Expr(expr) => {
                            self.expr(expr);
                        }
                    }
                }
                self.block(body);
                self.scopes.pop();
                for catch in catches {
                    self.catch_clause(catch);
                }
                if let Some(finally) = finally {
                    self.block(finally);
                }
            }
            Stmt::Switch(block) => self.switch_block(block),
            Stmt::Synchronized { lock, body } => {
                self.expr(lock);
                self.block(body);
            }
            // Labels are not symbols.
            Stmt::Labeled { body, .. } => self.stmt(body),
            Stmt::Break(_) | Stmt::Continue(_) | Stmt::Empty => {}
            Stmt::Assert { cond, message } => {
                self.expr(cond);
                if let Some(message) = message {
                    self.expr(message);
                }
            }
        }
    }

    /// A statement in branch position gets its own scope even without braces.
    fn nested(&mut self, stmt: &Stmt) {
        self.scopes.push(ScopeKind::Block, None);
        self.stmt(stmt);
        self.scopes.pop();
    }

    /// Local variable declarators. `inferred` is the element type for an
    /// enhanced `for` variable.
    ///
    /// A declared variable is in scope within its own initializer; a `var`
    /// one takes the initializer's type and is bound after it.
    pub(super) fn local_var(&mut self, decl: &LocalVarDecl, inferred: Option<JavaType>) {
        self.annotations(&decl.modifiers.annotations);
        let declared = self.type_ref(&decl.ty);
        let is_var = decl.ty.is_var();
        for declarator in &decl.declarators {
            let signature = self
                .signatures
                .variable(&decl.modifiers, &decl.ty, declarator);
            let Some(symbol) = self.local_symbol(SymbolKind::LocalVariable, declarator.name.range) else {
                if let Some(init) = &declarator.init {
                    self.expr(init);
                }
                continue;
            };
            self.define(&declarator.name, &symbol, signature, None, Vec::new());

            let ty = match (&inferred, is_var) {
                (Some(element), true) => element.clone(),
                _ => array_of(declared.clone(), declarator.extra_dims),
            };
            if is_var && inferred.is_none() {
                let ty = match &declarator.init {
                    Some(init) => self.expr(init),
                    None => JavaType::Unknown,
                };
                self.scopes
                    .bind_value(declarator.name.text.clone(), ValueBinding { symbol, ty });
                continue;
            }
            self.scopes
                .bind_value(declarator.name.text.clone(), ValueBinding { symbol, ty });
            if let Some(init) = &declarator.init {
                self.expr(init);
            }
        }
    }

    fn catch_clause(&mut self, catch: &CatchClause) {
        self.scopes.push(ScopeKind::Block, None);
        self.annotations(&catch.modifiers.annotations);
        let types = self.type_refs(&catch.types);
        let rendered: Vec<String> = catch.types.iter().map(ToString::to_string).collect();
        let signature = format!("{} {}", rendered.join(" | "), catch.name.as_str());
        // A multi-catch parameter is typed by its first alternative.
        let ty = types.into_iter().next().unwrap_or(JavaType::Unknown);
        self.declare_local(&catch.name, SymbolKind::LocalVariable, ty, signature);
        self.block(&catch.body);
        self.scopes.pop();
    }

    /// Switch statement or expression. `case:` groups share one scope, each
    /// `case ->` gets its own.
    pub(super) fn switch_block(&mut self, block: &SwitchBlock) {
        let selector = self.expr(&block.selector);
        let shared = block
            .cases
            .iter()
            .all(|case| matches!(case.body, CaseBody::Statements(_)));
        if shared {
            self.scopes.push(ScopeKind::Block, None);
        }
        for case in &block.cases {
            if !shared {
                self.scopes.push(ScopeKind::Block, None);
            }
            for label in &case.labels {
                match label {
                    CaseLabel::Default => {}
                    CaseLabel::Expr(expr) => self.case_constant(&selector, expr),
                    CaseLabel::TypePattern { ty, name } => {
                        let checked = self.type_ref(ty);
                        let signature = format!("{} {}", ty, name.as_str());
                        self.declare_local(name, SymbolKind::LocalVariable, checked, signature);
                    }
                }
            }
            if let Some(guard) = &case.guard {
                self.expr(guard);
            }
            match &case.body {
                CaseBody::Statements(stmts) => self.stmts(stmts),
                CaseBody::Arrow(stmt) => self.stmt(stmt),
            }
            if !shared {
                self.scopes.pop();
            }
        }
        if shared {
            self.scopes.pop();
        }
    }
}

/// Element type of an enhanced `for` over an array or a single-parameter
/// iterable.
fn element_type(iterable: JavaType) -> JavaType {
    match iterable {
        JavaType::Array(element) => *element,
        JavaType::Class { mut args, .. } if args.len() == 1 => args.remove(0),
        _ => JavaType::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::tests::{at, index};

    #[test]
    fn test_element_type() {
        let list = JavaType::Class {
            name: "java.util.List".into(),
            args: vec![JavaType::string()],
        };
        assert_eq!(element_type(list), JavaType::string());
        assert_eq!(
            element_type(array_of(JavaType::primitive("int"), 1)),
            JavaType::primitive("int")
        );
        assert_eq!(element_type(JavaType::object()), JavaType::Unknown);
    }

    #[test]
    fn test_foreach_variable_gets_element_type() {
        let source = "import java.util.List;\n\
                      class A { void f(List<String> items) { for (var item : items) { item.trim(); } } }\n";
        let index = index(source);
        assert_eq!(at(&index, source, "item :"), vec!["definition local1"]);
        assert_eq!(at(&index, source, "item.trim"), vec!["reference local1"]);
        assert_eq!(at(&index, source, "trim"), vec!["reference java/lang/String#trim()."]);
    }

    #[test]
    fn test_var_takes_initializer_type() {
        let source = "class A { void f() { var s = \"x\"; s.length(); } }";
        let index = index(source);
        assert_eq!(at(&index, source, "length"), vec!["reference java/lang/String#length()."]);
    }

    #[test]
    fn test_block_scopes_end_with_their_block() {
        let source = "class A { int x; void f() { { int x = 1; x++; } x++; } }";
        let index = index(source);
        assert_eq!(at(&index, source, "x++; }"), vec!["reference local0"]);
        assert_eq!(at(&index, source, "x++; } }"), vec!["reference A#x."]);
    }

    #[test]
    fn test_try_resources_and_catch_parameters() {
        let source = "import java.io.IOException;\n\
                      class A { void f() { try (AutoCloseable c = null) { c.close(); } \
                      catch (IOException | RuntimeException e) { e.getMessage(); } } }\n";
        let index = index(source);
        assert_eq!(at(&index, source, "c = null"), vec!["definition local0"]);
        assert_eq!(at(&index, source, "c.close"), vec!["reference local0"]);
        assert_eq!(at(&index, source, "e) {"), vec!["definition local1"]);
        assert_eq!(at(&index, source, "e.getMessage"), vec!["reference local1"]);
        assert_eq!(at(&index, source, "RuntimeException"), vec!["reference java/lang/RuntimeException#"]);
    }

    #[test]
    fn test_switch_enum_labels_and_patterns() {
        let source = "enum Color { RED, GREEN }\n\
                      class A {\n\
                      int f(Color c) { switch (c) { case RED: return 1; default: return 0; } }\n\
                      int g(Object o) { return switch (o) { case String s -> s.length(); default -> 0; }; }\n\
                      }\n";
        let index = index(source);
        assert_eq!(at(&index, source, "RED:"), vec!["reference Color#RED."]);
        // Numbering runs across the whole unit: c, o, then s.
        assert_eq!(at(&index, source, "s ->"), vec!["definition local2"]);
        assert_eq!(at(&index, source, "s.length"), vec!["reference local2"]);
    }

    #[test]
    fn test_labels_emit_nothing() {
        let source = "class A { void f() { outer: for (;;) { break outer; } } }";
        let index = index(source);
        assert!(index.occurrences.iter().all(|o| o.symbol.to_string() != "outer"));
        assert_eq!(index.occurrences.len(), 2);
    }
}
