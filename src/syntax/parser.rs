//! Recursive-descent Java parser.
//!
//! Produces the typed tree in [`super::ast`]. The parser is strict: the
//! first syntax error aborts the unit, since the indexer never reports a
//! partially-resolved unit as success. Ambiguous prefixes (local variable
//! declaration vs expression statement, cast vs parenthesized expression,
//! type pattern vs constant label) are settled by speculative parsing with
//! backtracking over the token vector.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use thiserror::Error;

use super::ast::*;
use super::lexer::{Token, TokenKind, tokenize};

/// A syntax error with the byte range it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

type PResult<T> = Result<T, SyntaxError>;

/// Parse one Java compilation unit.
pub fn parse(source: &str) -> Result<CompilationUnit, SyntaxError> {
    let tokens = tokenize(source).map_err(|err| SyntaxError {
        message: format!("unexpected character `{}`", &source[err.range]),
        range: err.range,
    })?;
    Parser::new(source, tokens).parse_unit()
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    // ========================================================================
    // TOKEN CURSOR
    // ========================================================================

    fn nth(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.nth(0) == Some(kind)
    }

    fn nth_at(&self, n: usize, kind: TokenKind) -> bool {
        self.nth(n) == Some(kind)
    }

    fn text_at(&self, n: usize) -> &'a str {
        let source = self.source;
        self.tokens
            .get(self.pos + n)
            .map(|t| &source[t.range])
            .unwrap_or("")
    }

    fn at_contextual(&self, word: &str) -> bool {
        self.at(TokenKind::Ident) && self.text_at(0) == word
    }

    fn current_range(&self) -> TextRange {
        match self.tokens.get(self.pos) {
            Some(token) => token.range,
            None => TextRange::empty(TextSize::of(self.source)),
        }
    }

    fn start(&self) -> TextSize {
        self.current_range().start()
    }

    fn prev_end(&self) -> TextSize {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.range.end(),
            None => TextSize::from(0),
        }
    }

    fn finish(&self, start: TextSize) -> TextRange {
        TextRange::new(start, self.prev_end().max(start))
    }

    fn doc_here(&self) -> Option<TextRange> {
        self.tokens.get(self.pos).and_then(|t| t.doc)
    }

    fn bump(&mut self) -> TextRange {
        let range = self.current_range();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        range
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<TextRange> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            self.error(&format!("expected {}", what))
        }
    }

    fn error<T>(&self, message: &str) -> PResult<T> {
        let found = match self.nth(0) {
            Some(_) => format!("`{}`", self.text_at(0)),
            None => "end of input".to_string(),
        };
        Err(SyntaxError {
            message: format!("{}, found {}", message, found),
            range: self.current_range(),
        })
    }

    fn ident(&mut self) -> PResult<Ident> {
        if self.at(TokenKind::Ident) {
            let text = self.text_at(0);
            let range = self.bump();
            Ok(Ident::new(text, range))
        } else {
            self.error("expected identifier")
        }
    }

    /// Index of the `)` matching the `(` at the cursor.
    fn matching_paren(&self) -> Option<usize> {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(self.pos) {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn adjacent(&self, n: usize) -> bool {
        match (self.tokens.get(self.pos + n), self.tokens.get(self.pos + n + 1)) {
            (Some(a), Some(b)) => a.range.end() == b.range.start(),
            _ => false,
        }
    }

    // ========================================================================
    // COMPILATION UNIT
    // ========================================================================

    fn parse_unit(mut self) -> PResult<CompilationUnit> {
        let mut unit = CompilationUnit::default();

        let save = self.pos;
        let start = self.start();
        let annotations = self.parse_annotations()?;
        if self.eat(TokenKind::Package) {
            let name = self.parse_qualified_name()?;
            self.expect(TokenKind::Semi, "`;`")?;
            unit.package = Some(PackageDecl {
                annotations,
                name,
                range: self.finish(start),
            });
        } else {
            self.pos = save;
        }

        while self.at(TokenKind::Import) {
            unit.imports.push(self.parse_import()?);
        }

        while self.nth(0).is_some() {
            if self.eat(TokenKind::Semi) {
                continue;
            }
            let doc = self.doc_here();
            let start = self.start();
            let modifiers = self.parse_modifiers()?;
            unit.types.push(self.parse_type_decl(modifiers, doc, start)?);
        }

        Ok(unit)
    }

    fn parse_import(&mut self) -> PResult<ImportDecl> {
        let start = self.start();
        self.expect(TokenKind::Import, "`import`")?;
        let is_static = self.eat(TokenKind::Static);
        let mut segments = vec![self.ident()?];
        let mut on_demand = false;
        while self.eat(TokenKind::Dot) {
            if self.eat(TokenKind::Star) {
                on_demand = true;
                break;
            }
            segments.push(self.ident()?);
        }
        self.expect(TokenKind::Semi, "`;`")?;
        Ok(ImportDecl {
            is_static,
            path: QualifiedName { segments },
            on_demand,
            range: self.finish(start),
        })
    }

    fn parse_qualified_name(&mut self) -> PResult<QualifiedName> {
        let mut segments = vec![self.ident()?];
        while self.at(TokenKind::Dot) && self.nth_at(1, TokenKind::Ident) {
            self.bump();
            segments.push(self.ident()?);
        }
        Ok(QualifiedName { segments })
    }

    // ========================================================================
    // MODIFIERS & ANNOTATIONS
    // ========================================================================

    fn parse_annotations(&mut self) -> PResult<Vec<Annotation>> {
        let mut annotations = Vec::new();
        while self.at(TokenKind::At) && !self.nth_at(1, TokenKind::Interface) {
            annotations.push(self.parse_annotation()?);
        }
        Ok(annotations)
    }

    fn parse_annotation(&mut self) -> PResult<Annotation> {
        let start = self.start();
        self.expect(TokenKind::At, "`@`")?;
        let name = self.parse_qualified_name()?;
        let mut args = Vec::new();
        if self.eat(TokenKind::LParen) {
            if !self.at(TokenKind::RParen) {
                loop {
                    if self.at(TokenKind::Ident) && self.nth_at(1, TokenKind::Eq) {
                        let name = self.ident()?;
                        self.bump();
                        let value = self.parse_element_value()?;
                        args.push(AnnotationArg {
                            name: Some(name),
                            value,
                        });
                    } else {
                        let value = self.parse_element_value()?;
                        args.push(AnnotationArg { name: None, value });
                    }
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen, "`)`")?;
        }
        Ok(Annotation {
            name,
            args,
            range: self.finish(start),
        })
    }

    fn parse_element_value(&mut self) -> PResult<Expr> {
        match self.nth(0) {
            Some(TokenKind::At) => Ok(Expr::Annotation(Box::new(self.parse_annotation()?))),
            Some(TokenKind::LBrace) => self.parse_array_init(true),
            _ => self.parse_ternary(),
        }
    }

    fn parse_modifiers(&mut self) -> PResult<Modifiers> {
        let mut modifiers = Modifiers::default();
        loop {
            match self.nth(0) {
                Some(TokenKind::At) if !self.nth_at(1, TokenKind::Interface) => {
                    modifiers.annotations.push(self.parse_annotation()?);
                }
                Some(TokenKind::Ident) if self.text_at(0) == "sealed" && self.starts_type_decl_at(1) => {
                    self.bump();
                    modifiers.keywords.push(Modifier::Sealed);
                }
                Some(TokenKind::Ident)
                    if self.text_at(0) == "non"
                        && self.nth_at(1, TokenKind::Minus)
                        && self.text_at(2) == "sealed" =>
                {
                    self.bump();
                    self.bump();
                    self.bump();
                }
                Some(kind) => match modifier_of(kind) {
                    Some(modifier) => {
                        self.bump();
                        modifiers.keywords.push(modifier);
                    }
                    None => break,
                },
                None => break,
            }
        }
        Ok(modifiers)
    }

    fn starts_type_decl(&self) -> bool {
        self.starts_type_decl_at(0)
    }

    fn starts_type_decl_at(&self, n: usize) -> bool {
        match self.nth(n) {
            Some(TokenKind::Class | TokenKind::Interface | TokenKind::Enum) => true,
            Some(TokenKind::At) => self.nth_at(n + 1, TokenKind::Interface),
            Some(TokenKind::Ident) => {
                self.tokens
                    .get(self.pos + n)
                    .is_some_and(|t| &self.source[t.range] == "record")
                    && self.nth_at(n + 1, TokenKind::Ident)
                    && matches!(self.nth(n + 2), Some(TokenKind::LParen | TokenKind::Lt))
            }
            Some(kind) => modifier_of(kind).is_some() && self.starts_type_decl_at(n + 1),
            None => false,
        }
    }

    // ========================================================================
    // TYPE DECLARATIONS
    // ========================================================================

    fn parse_type_decl(
        &mut self,
        modifiers: Modifiers,
        doc: Option<TextRange>,
        start: TextSize,
    ) -> PResult<TypeDecl> {
        let kind = match self.nth(0) {
            Some(TokenKind::Class) => TypeDeclKind::Class,
            Some(TokenKind::Interface) => TypeDeclKind::Interface,
            Some(TokenKind::Enum) => TypeDeclKind::Enum,
            Some(TokenKind::At) if self.nth_at(1, TokenKind::Interface) => {
                self.bump();
                TypeDeclKind::Annotation
            }
            Some(TokenKind::Ident) if self.text_at(0) == "record" => TypeDeclKind::Record,
            _ => return self.error("expected class, interface, enum or record declaration"),
        };
        self.bump();

        let name = self.ident()?;
        let type_params = if self.at(TokenKind::Lt) {
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        let record_components = if kind == TypeDeclKind::Record {
            self.parse_params()?
        } else {
            Vec::new()
        };

        let mut extends = Vec::new();
        let mut implements = Vec::new();
        let mut permits = Vec::new();
        if self.eat(TokenKind::Extends) {
            extends = self.parse_type_list()?;
        }
        if self.eat(TokenKind::Implements) {
            implements = self.parse_type_list()?;
        }
        if self.at_contextual("permits") {
            self.bump();
            permits = self.parse_type_list()?;
        }

        let type_name = name.text.clone();
        let (enum_constants, members) = self.parse_class_body(kind, Some(type_name.as_str()))?;

        Ok(TypeDecl {
            kind,
            modifiers,
            name,
            type_params,
            extends,
            implements,
            permits,
            record_components,
            enum_constants,
            members,
            doc,
            range: self.finish(start),
        })
    }

    fn parse_type_params(&mut self) -> PResult<Vec<TypeParam>> {
        self.expect(TokenKind::Lt, "`<`")?;
        let mut params = Vec::new();
        loop {
            let annotations = self.parse_annotations()?;
            let name = self.ident()?;
            let mut bounds = Vec::new();
            if self.eat(TokenKind::Extends) {
                bounds.push(self.parse_type()?);
                while self.eat(TokenKind::Amp) {
                    bounds.push(self.parse_type()?);
                }
            }
            params.push(TypeParam {
                annotations,
                name,
                bounds,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Gt, "`>`")?;
        Ok(params)
    }

    fn parse_type_list(&mut self) -> PResult<Vec<TypeRef>> {
        let mut types = vec![self.parse_type()?];
        while self.eat(TokenKind::Comma) {
            types.push(self.parse_type()?);
        }
        Ok(types)
    }

    fn parse_class_body(
        &mut self,
        kind: TypeDeclKind,
        type_name: Option<&str>,
    ) -> PResult<(Vec<EnumConstant>, Vec<Member>)> {
        self.expect(TokenKind::LBrace, "`{`")?;

        let mut constants = Vec::new();
        if kind == TypeDeclKind::Enum {
            while !self.at(TokenKind::Semi) && !self.at(TokenKind::RBrace) {
                let doc = self.doc_here();
                let annotations = self.parse_annotations()?;
                let name = self.ident()?;
                let args = if self.at(TokenKind::LParen) {
                    Some(self.parse_args()?)
                } else {
                    None
                };
                let body = if self.at(TokenKind::LBrace) {
                    Some(self.parse_class_body(TypeDeclKind::Class, None)?.1)
                } else {
                    None
                };
                constants.push(EnumConstant {
                    annotations,
                    name,
                    args,
                    body,
                    doc,
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.eat(TokenKind::Semi);
        }

        let members = self.parse_members(type_name, kind == TypeDeclKind::Record)?;
        Ok((constants, members))
    }

    /// Members up to and including the closing `}`.
    fn parse_members(&mut self, type_name: Option<&str>, is_record: bool) -> PResult<Vec<Member>> {
        let mut members = Vec::new();
        loop {
            if self.eat(TokenKind::RBrace) {
                break;
            }
            if self.nth(0).is_none() {
                return self.error("expected `}`");
            }
            if self.eat(TokenKind::Semi) {
                continue;
            }
            if self.at(TokenKind::LBrace) {
                let body = self.parse_block()?;
                members.push(Member::Initializer {
                    is_static: false,
                    body,
                });
                continue;
            }
            if self.at(TokenKind::Static) && self.nth_at(1, TokenKind::LBrace) {
                self.bump();
                let body = self.parse_block()?;
                members.push(Member::Initializer {
                    is_static: true,
                    body,
                });
                continue;
            }
            members.push(self.parse_member(type_name, is_record)?);
        }
        Ok(members)
    }

    fn parse_member(&mut self, type_name: Option<&str>, is_record: bool) -> PResult<Member> {
        let doc = self.doc_here();
        let start = self.start();
        let modifiers = self.parse_modifiers()?;

        if self.starts_type_decl() {
            return Ok(Member::Type(self.parse_type_decl(modifiers, doc, start)?));
        }

        let type_params = if self.at(TokenKind::Lt) {
            self.parse_type_params()?
        } else {
            Vec::new()
        };

        let names_type = self.at(TokenKind::Ident) && type_name == Some(self.text_at(0));
        if names_type && self.nth_at(1, TokenKind::LParen) {
            let name = self.ident()?;
            let params = self.parse_params()?;
            let method = self.finish_method(modifiers, type_params, None, name, params, false, doc, start)?;
            return Ok(Member::Method(method));
        }
        if names_type && is_record && self.nth_at(1, TokenKind::LBrace) {
            let name = self.ident()?;
            let method = self.finish_method(modifiers, type_params, None, name, Vec::new(), true, doc, start)?;
            return Ok(Member::Method(method));
        }

        let ty = self.parse_type()?;
        let name = self.ident()?;
        if self.at(TokenKind::LParen) {
            let params = self.parse_params()?;
            let method = self.finish_method(modifiers, type_params, Some(ty), name, params, false, doc, start)?;
            return Ok(Member::Method(method));
        }

        let mut declarators = vec![self.finish_declarator(name)?];
        while self.eat(TokenKind::Comma) {
            let name = self.ident()?;
            declarators.push(self.finish_declarator(name)?);
        }
        self.expect(TokenKind::Semi, "`;`")?;
        Ok(Member::Field(FieldDecl {
            modifiers,
            ty,
            declarators,
            doc,
            range: self.finish(start),
        }))
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_method(
        &mut self,
        modifiers: Modifiers,
        type_params: Vec<TypeParam>,
        return_type: Option<TypeRef>,
        name: Ident,
        params: Vec<Param>,
        compact: bool,
        doc: Option<TextRange>,
        start: TextSize,
    ) -> PResult<MethodDecl> {
        // Legacy array return syntax: `int foo()[]`
        while self.at(TokenKind::LBracket) && self.nth_at(1, TokenKind::RBracket) {
            self.bump();
            self.bump();
        }
        let throws = if self.eat(TokenKind::Throws) {
            self.parse_type_list()?
        } else {
            Vec::new()
        };
        let default_value = if self.eat(TokenKind::Default) {
            Some(self.parse_element_value()?)
        } else {
            None
        };
        let body = if self.at(TokenKind::LBrace) {
            Some(self.parse_block()?)
        } else {
            self.expect(TokenKind::Semi, "`;` or method body")?;
            None
        };
        Ok(MethodDecl {
            modifiers,
            type_params,
            return_type,
            name,
            params,
            throws,
            body,
            default_value,
            compact,
            doc,
            range: self.finish(start),
        })
    }

    fn parse_params(&mut self) -> PResult<Vec<Param>> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                params.push(self.parse_param()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(params)
    }

    fn parse_param(&mut self) -> PResult<Param> {
        let start = self.start();
        let modifiers = self.parse_modifiers()?;
        let mut ty = self.parse_type()?;
        let varargs = self.eat(TokenKind::Ellipsis);
        let name = self.ident()?;
        let mut dims = 0;
        while self.at(TokenKind::LBracket) && self.nth_at(1, TokenKind::RBracket) {
            self.bump();
            self.bump();
            dims += 1;
        }
        if dims > 0 {
            let range = ty.range();
            ty = TypeRef::Array {
                element: Box::new(ty),
                dims,
                range,
            };
        }
        Ok(Param {
            modifiers,
            ty,
            varargs,
            name,
            range: self.finish(start),
        })
    }

    fn finish_declarator(&mut self, name: Ident) -> PResult<VarDeclarator> {
        let mut extra_dims = 0;
        while self.at(TokenKind::LBracket) && self.nth_at(1, TokenKind::RBracket) {
            self.bump();
            self.bump();
            extra_dims += 1;
        }
        let init = if self.eat(TokenKind::Eq) {
            Some(self.parse_var_init()?)
        } else {
            None
        };
        Ok(VarDeclarator {
            name,
            extra_dims,
            init,
        })
    }

    fn parse_var_init(&mut self) -> PResult<Expr> {
        if self.at(TokenKind::LBrace) {
            self.parse_array_init(false)
        } else {
            self.parse_expr()
        }
    }

    fn parse_array_init(&mut self, element_values: bool) -> PResult<Expr> {
        let start = self.start();
        self.expect(TokenKind::LBrace, "`{`")?;
        let mut elements = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let element = if element_values {
                self.parse_element_value()?
            } else {
                self.parse_var_init()?
            };
            elements.push(element);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        Ok(Expr::ArrayInit {
            elements,
            range: self.finish(start),
        })
    }

    // ========================================================================
    // TYPE REFERENCES
    // ========================================================================

    fn parse_type(&mut self) -> PResult<TypeRef> {
        let annotations = self.parse_annotations()?;
        let base = self.parse_non_array_type(annotations)?;
        Ok(self.parse_dims(base))
    }

    fn parse_non_array_type(&mut self, annotations: Vec<Annotation>) -> PResult<TypeRef> {
        match self.nth(0) {
            Some(kind) if kind.is_primitive() || kind == TokenKind::Void => {
                let keyword = SmolStr::new(self.text_at(0));
                let range = self.bump();
                Ok(TypeRef::Primitive { keyword, range })
            }
            Some(TokenKind::Ident) => {
                let start = self.start();
                let mut segments = Vec::new();
                let mut annotations = annotations;
                loop {
                    let name = self.ident()?;
                    let args = if self.at(TokenKind::Lt) {
                        Some(self.parse_type_args()?)
                    } else {
                        None
                    };
                    segments.push(TypeSegment {
                        annotations: std::mem::take(&mut annotations),
                        name,
                        args,
                    });
                    if self.at(TokenKind::Dot) && self.nth_at(1, TokenKind::Ident) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                Ok(TypeRef::Named(NamedType {
                    segments,
                    range: self.finish(start),
                }))
            }
            _ => self.error("expected type"),
        }
    }

    fn parse_dims(&mut self, base: TypeRef) -> TypeRef {
        let start = base.range().start();
        let mut dims = 0;
        while self.at(TokenKind::LBracket) && self.nth_at(1, TokenKind::RBracket) {
            self.bump();
            self.bump();
            dims += 1;
        }
        if dims == 0 {
            return base;
        }
        TypeRef::Array {
            element: Box::new(base),
            dims,
            range: self.finish(start),
        }
    }

    fn parse_type_args(&mut self) -> PResult<Vec<TypeArg>> {
        self.expect(TokenKind::Lt, "`<`")?;
        let mut args = Vec::new();
        if self.eat(TokenKind::Gt) {
            return Ok(args);
        }
        loop {
            if self.at(TokenKind::Question) {
                let start = self.start();
                self.bump();
                let bound = if self.eat(TokenKind::Extends) {
                    Some(WildcardBound {
                        is_upper: true,
                        ty: Box::new(self.parse_type()?),
                    })
                } else if self.eat(TokenKind::Super) {
                    Some(WildcardBound {
                        is_upper: false,
                        ty: Box::new(self.parse_type()?),
                    })
                } else {
                    None
                };
                args.push(TypeArg::Wildcard {
                    bound,
                    range: self.finish(start),
                });
            } else {
                args.push(TypeArg::Type(self.parse_type()?));
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Gt, "`>`")?;
        Ok(args)
    }

    fn expr_to_type(&self, expr: &Expr) -> PResult<TypeRef> {
        let Some(chain) = expr.as_name_chain() else {
            return Err(SyntaxError {
                message: "expected type name".to_string(),
                range: expr.range(),
            });
        };
        let segments = chain
            .into_iter()
            .map(|name| TypeSegment {
                annotations: Vec::new(),
                name: name.clone(),
                args: None,
            })
            .collect();
        Ok(TypeRef::Named(NamedType {
            segments,
            range: expr.range(),
        }))
    }

    // ========================================================================
    // STATEMENTS
    // ========================================================================

    fn parse_block(&mut self) -> PResult<Block> {
        let start = self.start();
        self.expect(TokenKind::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        loop {
            if self.eat(TokenKind::RBrace) {
                break;
            }
            if self.nth(0).is_none() {
                return self.error("expected `}`");
            }
            stmts.push(self.parse_statement()?);
        }
        Ok(Block {
            stmts,
            range: self.finish(start),
        })
    }

    fn parse_statement(&mut self) -> PResult<Stmt> {
        match self.nth(0) {
            None => self.error("expected statement"),
            Some(TokenKind::LBrace) => Ok(Stmt::Block(self.parse_block()?)),
            Some(TokenKind::Semi) => {
                self.bump();
                Ok(Stmt::Empty)
            }
            Some(TokenKind::If) => {
                self.bump();
                let cond = self.parse_paren_expr()?;
                let then_branch = Box::new(self.parse_statement()?);
                let else_branch = if self.eat(TokenKind::Else) {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                })
            }
            Some(TokenKind::While) => {
                self.bump();
                let cond = self.parse_paren_expr()?;
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt::While { cond, body })
            }
            Some(TokenKind::Do) => {
                self.bump();
                let body = Box::new(self.parse_statement()?);
                self.expect(TokenKind::While, "`while`")?;
                let cond = self.parse_paren_expr()?;
                self.expect(TokenKind::Semi, "`;`")?;
                Ok(Stmt::DoWhile { body, cond })
            }
            Some(TokenKind::For) => self.parse_for(),
            Some(TokenKind::Return) => {
                self.bump();
                let value = if self.at(TokenKind::Semi) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(TokenKind::Semi, "`;`")?;
                Ok(Stmt::Return(value))
            }
            Some(TokenKind::Throw) => {
                self.bump();
                let value = self.parse_expr()?;
                self.expect(TokenKind::Semi, "`;`")?;
                Ok(Stmt::Throw(value))
            }
            Some(kind @ (TokenKind::Break | TokenKind::Continue)) => {
                self.bump();
                let label = if self.at(TokenKind::Ident) {
                    Some(self.ident()?)
                } else {
                    None
                };
                self.expect(TokenKind::Semi, "`;`")?;
                Ok(if kind == TokenKind::Break {
                    Stmt::Break(label)
                } else {
                    Stmt::Continue(label)
                })
            }
            Some(TokenKind::Try) => self.parse_try(),
            Some(TokenKind::Switch) => {
                let block = self.parse_switch()?;
                self.eat(TokenKind::Semi);
                Ok(Stmt::Switch(block))
            }
            Some(TokenKind::Synchronized) if self.nth_at(1, TokenKind::LParen) => {
                self.bump();
                let lock = self.parse_paren_expr()?;
                let body = self.parse_block()?;
                Ok(Stmt::Synchronized { lock, body })
            }
            Some(TokenKind::Assert) => {
                self.bump();
                let cond = self.parse_expr()?;
                let message = if self.eat(TokenKind::Colon) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                self.expect(TokenKind::Semi, "`;`")?;
                Ok(Stmt::Assert { cond, message })
            }
            Some(TokenKind::Ident) if self.nth_at(1, TokenKind::Colon) => {
                let label = self.ident()?;
                self.bump();
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt::Labeled { label, body })
            }
            Some(TokenKind::Ident) if self.text_at(0) == "yield" && self.starts_yield_value() => {
                self.bump();
                let value = self.parse_expr()?;
                self.expect(TokenKind::Semi, "`;`")?;
                Ok(Stmt::Yield(value))
            }
            _ => self.parse_local_or_expr_statement(),
        }
    }

    fn starts_yield_value(&self) -> bool {
        !matches!(
            self.nth(1),
            None | Some(
                TokenKind::Eq
                    | TokenKind::Dot
                    | TokenKind::LBracket
                    | TokenKind::Semi
                    | TokenKind::PlusPlus
                    | TokenKind::MinusMinus
                    | TokenKind::PlusEq
                    | TokenKind::MinusEq
                    | TokenKind::Arrow
                    | TokenKind::ColonColon
            )
        )
    }

    fn parse_paren_expr(&mut self) -> PResult<Expr> {
        self.expect(TokenKind::LParen, "`(`")?;
        let expr = self.parse_expr()?;
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(expr)
    }

    fn parse_local_or_expr_statement(&mut self) -> PResult<Stmt> {
        let doc = self.doc_here();
        let start = self.start();
        if self.starts_type_decl()
            || matches!(self.nth(0), Some(TokenKind::Final | TokenKind::At))
        {
            let modifiers = self.parse_modifiers()?;
            if self.starts_type_decl() {
                return Ok(Stmt::LocalType(self.parse_type_decl(modifiers, doc, start)?));
            }
            return match self.try_parse_local_decl(modifiers)? {
                Some(decl) => {
                    self.expect(TokenKind::Semi, "`;`")?;
                    Ok(Stmt::Local(decl))
                }
                None => self.error("expected local variable declaration"),
            };
        }

        if let Some(decl) = self.try_parse_local_decl(Modifiers::default())? {
            self.expect(TokenKind::Semi, "`;`")?;
            return Ok(Stmt::Local(decl));
        }

        let expr = self.parse_expr()?;
        self.expect(TokenKind::Semi, "`;`")?;
        Ok(Stmt::Expr(expr))
    }

    /// Speculatively parse `Type name ...`; restores the cursor on mismatch.
    fn try_parse_local_decl(&mut self, modifiers: Modifiers) -> PResult<Option<LocalVarDecl>> {
        match self.nth(0) {
            Some(kind) if kind.is_primitive() => {}
            Some(TokenKind::Ident) => {}
            _ => return Ok(None),
        }
        let save = self.pos;
        let ty = match self.parse_type() {
            Ok(ty) => ty,
            Err(_) => {
                self.pos = save;
                return Ok(None);
            }
        };
        let declares = self.at(TokenKind::Ident)
            && matches!(
                self.nth(1),
                Some(
                    TokenKind::Eq
                        | TokenKind::Semi
                        | TokenKind::Comma
                        | TokenKind::LBracket
                        | TokenKind::Colon
                )
            );
        if !declares {
            self.pos = save;
            return Ok(None);
        }

        let name = self.ident()?;
        let mut declarators = vec![self.finish_declarator(name)?];
        while self.eat(TokenKind::Comma) {
            let name = self.ident()?;
            declarators.push(self.finish_declarator(name)?);
        }
        Ok(Some(LocalVarDecl {
            modifiers,
            ty,
            declarators,
        }))
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        self.expect(TokenKind::For, "`for`")?;
        self.expect(TokenKind::LParen, "`(`")?;

        let save = self.pos;
        let modifiers = self.parse_modifiers()?;
        if matches!(self.nth(0), Some(TokenKind::Ident)) || self.nth(0).is_some_and(TokenKind::is_primitive) {
            if let Ok(ty) = self.parse_type() {
                if self.at(TokenKind::Ident) && self.nth_at(1, TokenKind::Colon) {
                    let name = self.ident()?;
                    self.bump();
                    let iterable = self.parse_expr()?;
                    self.expect(TokenKind::RParen, "`)`")?;
                    let body = Box::new(self.parse_statement()?);
                    return Ok(Stmt::ForEach {
                        var: LocalVarDecl {
                            modifiers,
                            ty,
                            declarators: vec![VarDeclarator {
                                name,
                                extra_dims: 0,
                                init: None,
                            }],
                        },
                        iterable,
                        body,
                    });
                }
            }
        }
        self.pos = save;

        let mut init = Vec::new();
        if !self.at(TokenKind::Semi) {
            let modifiers = self.parse_modifiers()?;
            match self.try_parse_local_decl(modifiers)? {
                Some(decl) => init.push(Stmt::Local(decl)),
                None => loop {
                    init.push(Stmt::Expr(self.parse_expr()?));
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                },
            }
        }
        self.expect(TokenKind::Semi, "`;`")?;
        let cond = if self.at(TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semi, "`;`")?;
        let mut update = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                update.push(self.parse_expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::For {
            init,
            cond,
            update,
            body,
        })
    }

    fn parse_try(&mut self) -> PResult<Stmt> {
        self.expect(TokenKind::Try, "`try`")?;
        let mut resources = Vec::new();
        if self.eat(TokenKind::LParen) {
            while !self.eat(TokenKind::RParen) {
                let modifiers = self.parse_modifiers()?;
                match self.try_parse_local_decl(modifiers)? {
                    Some(decl) => resources.push(Resource::Decl(decl)),
                    None => resources.push(Resource::Expr(self.parse_expr()?)),
                }
                if !self.eat(TokenKind::Semi) {
                    self.expect(TokenKind::RParen, "`)`")?;
                    break;
                }
            }
        }
        let body = self.parse_block()?;

        let mut catches = Vec::new();
        while self.eat(TokenKind::Catch) {
            self.expect(TokenKind::LParen, "`(`")?;
            let modifiers = self.parse_modifiers()?;
            let mut types = vec![self.parse_type()?];
            while self.eat(TokenKind::Pipe) {
                types.push(self.parse_type()?);
            }
            let name = self.ident()?;
            self.expect(TokenKind::RParen, "`)`")?;
            let body = self.parse_block()?;
            catches.push(CatchClause {
                modifiers,
                types,
                name,
                body,
            });
        }
        let finally = if self.eat(TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };
        if catches.is_empty() && finally.is_none() && resources.is_empty() {
            return self.error("expected `catch` or `finally`");
        }
        Ok(Stmt::Try {
            resources,
            body,
            catches,
            finally,
        })
    }

    fn parse_switch(&mut self) -> PResult<SwitchBlock> {
        let start = self.start();
        self.expect(TokenKind::Switch, "`switch`")?;
        let selector = Box::new(self.parse_paren_expr()?);
        self.expect(TokenKind::LBrace, "`{`")?;

        let mut cases = Vec::new();
        while !self.eat(TokenKind::RBrace) {
            if self.nth(0).is_none() {
                return self.error("expected `}`");
            }
            let mut labels = Vec::new();
            if self.eat(TokenKind::Default) {
                labels.push(CaseLabel::Default);
            } else {
                self.expect(TokenKind::Case, "`case` or `default`")?;
                loop {
                    labels.push(self.parse_case_label()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            let guard = if self.at_contextual("when") {
                self.bump();
                Some(self.parse_expr()?)
            } else {
                None
            };
            let body = if self.eat(TokenKind::Arrow) {
                let stmt = match self.nth(0) {
                    Some(TokenKind::LBrace) => Stmt::Block(self.parse_block()?),
                    Some(TokenKind::Throw) => self.parse_statement()?,
                    _ => {
                        let expr = self.parse_expr()?;
                        self.expect(TokenKind::Semi, "`;`")?;
                        Stmt::Expr(expr)
                    }
                };
                CaseBody::Arrow(Box::new(stmt))
            } else {
                self.expect(TokenKind::Colon, "`:` or `->`")?;
                let mut stmts = Vec::new();
                while !matches!(
                    self.nth(0),
                    None | Some(TokenKind::Case | TokenKind::Default | TokenKind::RBrace)
                ) {
                    stmts.push(self.parse_statement()?);
                }
                CaseBody::Statements(stmts)
            };
            cases.push(SwitchCase {
                labels,
                guard,
                body,
            });
        }

        Ok(SwitchBlock {
            selector,
            cases,
            range: self.finish(start),
        })
    }

    fn parse_case_label(&mut self) -> PResult<CaseLabel> {
        if self.eat(TokenKind::Default) {
            return Ok(CaseLabel::Default);
        }
        if self.at(TokenKind::Ident) || self.nth(0).is_some_and(TokenKind::is_primitive) {
            let save = self.pos;
            if let Ok(ty) = self.parse_type() {
                if self.at(TokenKind::Ident) && !self.at_contextual("when") {
                    let name = self.ident()?;
                    return Ok(CaseLabel::TypePattern { ty, name });
                }
            }
            self.pos = save;
        }
        Ok(CaseLabel::Expr(self.parse_ternary()?))
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    fn parse_expr(&mut self) -> PResult<Expr> {
        if self.at_lambda() {
            return self.parse_lambda();
        }
        let start = self.start();
        let lhs = self.parse_ternary()?;
        if self.at_assign_op() {
            self.bump();
            let value = self.parse_expr()?;
            return Ok(Expr::Assign {
                target: Box::new(lhs),
                value: Box::new(value),
                range: self.finish(start),
            });
        }
        Ok(lhs)
    }

    fn at_assign_op(&self) -> bool {
        matches!(
            self.nth(0),
            Some(
                TokenKind::Eq
                    | TokenKind::PlusEq
                    | TokenKind::MinusEq
                    | TokenKind::StarEq
                    | TokenKind::SlashEq
                    | TokenKind::AmpEq
                    | TokenKind::PipeEq
                    | TokenKind::CaretEq
                    | TokenKind::PercentEq
                    | TokenKind::ShlEq
                    | TokenKind::ShrEq
                    | TokenKind::UShrEq
            )
        )
    }

    fn at_lambda(&self) -> bool {
        match self.nth(0) {
            Some(TokenKind::Ident) => self.nth_at(1, TokenKind::Arrow),
            Some(TokenKind::LParen) => self
                .matching_paren()
                .and_then(|close| self.tokens.get(close + 1))
                .is_some_and(|t| t.kind == TokenKind::Arrow),
            _ => false,
        }
    }

    fn parse_lambda(&mut self) -> PResult<Expr> {
        let start = self.start();
        let mut params = Vec::new();
        if self.at(TokenKind::Ident) {
            params.push(LambdaParam {
                modifiers: Modifiers::default(),
                ty: None,
                name: self.ident()?,
            });
        } else {
            self.expect(TokenKind::LParen, "`(`")?;
            if !self.at(TokenKind::RParen) {
                loop {
                    if self.at(TokenKind::Ident)
                        && matches!(self.nth(1), Some(TokenKind::Comma | TokenKind::RParen))
                    {
                        params.push(LambdaParam {
                            modifiers: Modifiers::default(),
                            ty: None,
                            name: self.ident()?,
                        });
                    } else {
                        let modifiers = self.parse_modifiers()?;
                        let mut ty = self.parse_type()?;
                        if self.eat(TokenKind::Ellipsis) {
                            let range = ty.range();
                            ty = TypeRef::Array {
                                element: Box::new(ty),
                                dims: 1,
                                range,
                            };
                        }
                        let name = self.ident()?;
                        params.push(LambdaParam {
                            modifiers,
                            ty: Some(ty),
                            name,
                        });
                    }
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen, "`)`")?;
        }
        self.expect(TokenKind::Arrow, "`->`")?;
        let body = if self.at(TokenKind::LBrace) {
            LambdaBody::Block(self.parse_block()?)
        } else {
            LambdaBody::Expr(Box::new(self.parse_expr()?))
        };
        Ok(Expr::Lambda {
            params,
            body,
            range: self.finish(start),
        })
    }

    fn parse_ternary(&mut self) -> PResult<Expr> {
        let start = self.start();
        let cond = self.parse_binary(1)?;
        if !self.eat(TokenKind::Question) {
            return Ok(cond);
        }
        let then_expr = self.parse_expr()?;
        self.expect(TokenKind::Colon, "`:`")?;
        let else_expr = if self.at_lambda() {
            self.parse_lambda()?
        } else {
            self.parse_ternary()?
        };
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
            range: self.finish(start),
        })
    }

    /// `(op, precedence, token count)` of the binary operator at the cursor.
    fn peek_binary_op(&self) -> Option<(BinaryOp, u8, usize)> {
        let op = match self.nth(0)? {
            TokenKind::OrOr => (BinaryOp::Or, 1, 1),
            TokenKind::AndAnd => (BinaryOp::And, 2, 1),
            TokenKind::Pipe => (BinaryOp::BitOr, 3, 1),
            TokenKind::Caret => (BinaryOp::BitXor, 4, 1),
            TokenKind::Amp => (BinaryOp::BitAnd, 5, 1),
            TokenKind::EqEq => (BinaryOp::Eq, 6, 1),
            TokenKind::NotEq => (BinaryOp::NotEq, 6, 1),
            TokenKind::Lt => (BinaryOp::Lt, 7, 1),
            TokenKind::LtEq => (BinaryOp::LtEq, 7, 1),
            TokenKind::GtEq => (BinaryOp::GtEq, 7, 1),
            TokenKind::Gt => {
                if self.nth_at(1, TokenKind::Gt) && self.adjacent(0) {
                    if self.nth_at(2, TokenKind::Gt) && self.adjacent(1) {
                        (BinaryOp::UShr, 8, 3)
                    } else {
                        (BinaryOp::Shr, 8, 2)
                    }
                } else {
                    (BinaryOp::Gt, 7, 1)
                }
            }
            TokenKind::Shl => (BinaryOp::Shl, 8, 1),
            TokenKind::Plus => (BinaryOp::Add, 9, 1),
            TokenKind::Minus => (BinaryOp::Sub, 9, 1),
            TokenKind::Star => (BinaryOp::Mul, 10, 1),
            TokenKind::Slash => (BinaryOp::Div, 10, 1),
            TokenKind::Percent => (BinaryOp::Rem, 10, 1),
            _ => return None,
        };
        Some(op)
    }

    fn parse_binary(&mut self, min_prec: u8) -> PResult<Expr> {
        let start = self.start();
        let mut lhs = self.parse_unary()?;
        loop {
            if self.at(TokenKind::InstanceOf) && 7 >= min_prec {
                self.bump();
                self.eat(TokenKind::Final);
                let ty = self.parse_type()?;
                let binding = if self.at(TokenKind::Ident) {
                    Some(self.ident()?)
                } else {
                    None
                };
                lhs = Expr::InstanceOf {
                    expr: Box::new(lhs),
                    ty,
                    binding,
                    range: self.finish(start),
                };
                continue;
            }
            let Some((op, prec, width)) = self.peek_binary_op() else {
                break;
            };
            if prec < min_prec {
                break;
            }
            for _ in 0..width {
                self.bump();
            }
            let rhs = self.parse_binary(prec + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                range: self.finish(start),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let start = self.start();
        let op = match self.nth(0) {
            Some(TokenKind::Plus) => Some(UnaryOp::Plus),
            Some(TokenKind::Minus) => Some(UnaryOp::Minus),
            Some(TokenKind::Bang) => Some(UnaryOp::Not),
            Some(TokenKind::Tilde) => Some(UnaryOp::BitNot),
            Some(TokenKind::PlusPlus) => Some(UnaryOp::PreIncrement),
            Some(TokenKind::MinusMinus) => Some(UnaryOp::PreDecrement),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                range: self.finish(start),
            });
        }
        if self.at(TokenKind::LParen) {
            if let Some(cast) = self.try_parse_cast(start)? {
                return Ok(cast);
            }
        }
        let primary = self.parse_primary()?;
        self.parse_postfix(primary, start)
    }

    fn try_parse_cast(&mut self, start: TextSize) -> PResult<Option<Expr>> {
        let save = self.pos;
        self.bump();

        let primitive = self.nth(0).is_some_and(TokenKind::is_primitive);
        if !primitive && !self.at(TokenKind::Ident) && !self.at(TokenKind::At) {
            self.pos = save;
            return Ok(None);
        }
        let Ok(ty) = self.parse_type() else {
            self.pos = save;
            return Ok(None);
        };
        let mut extra_bounds = Vec::new();
        while self.eat(TokenKind::Amp) {
            match self.parse_type() {
                Ok(bound) => extra_bounds.push(bound),
                Err(_) => {
                    self.pos = save;
                    return Ok(None);
                }
            }
        }
        if !self.eat(TokenKind::RParen) {
            self.pos = save;
            return Ok(None);
        }

        let operand_follows = match self.nth(0) {
            Some(kind) if primitive => kind != TokenKind::Dot && kind != TokenKind::LBracket,
            Some(kind) if kind.is_literal() || kind.is_primitive() => true,
            Some(
                TokenKind::Ident
                | TokenKind::LParen
                | TokenKind::This
                | TokenKind::Super
                | TokenKind::New
                | TokenKind::Bang
                | TokenKind::Tilde
                | TokenKind::Switch,
            ) => true,
            _ => false,
        };
        if !operand_follows {
            self.pos = save;
            return Ok(None);
        }

        let expr = if self.at_lambda() {
            self.parse_lambda()?
        } else {
            self.parse_unary()?
        };
        Ok(Some(Expr::Cast {
            ty,
            extra_bounds,
            expr: Box::new(expr),
            range: self.finish(start),
        }))
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let start = self.start();
        match self.nth(0) {
            None => self.error("expected expression"),
            Some(kind) if kind.is_literal() => {
                let literal = literal_kind(kind, self.text_at(0));
                let range = self.bump();
                Ok(Expr::Literal {
                    kind: literal,
                    range,
                })
            }
            Some(TokenKind::This) => {
                let keyword = self.bump();
                if self.at(TokenKind::LParen) {
                    let args = self.parse_args()?;
                    return Ok(Expr::CtorCall {
                        kind: CtorCallKind::This,
                        keyword,
                        qualifier: None,
                        args,
                        range: self.finish(start),
                    });
                }
                Ok(Expr::This {
                    qualifier: None,
                    range: keyword,
                })
            }
            Some(TokenKind::Super) => {
                let keyword = self.bump();
                if self.at(TokenKind::LParen) {
                    let args = self.parse_args()?;
                    return Ok(Expr::CtorCall {
                        kind: CtorCallKind::Super,
                        keyword,
                        qualifier: None,
                        args,
                        range: self.finish(start),
                    });
                }
                Ok(Expr::Super {
                    qualifier: None,
                    range: keyword,
                })
            }
            Some(TokenKind::New) => self.parse_new(None, start),
            Some(TokenKind::LParen) => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(Expr::Paren {
                    inner: Box::new(inner),
                    range: self.finish(start),
                })
            }
            Some(TokenKind::Switch) => Ok(Expr::Switch(Box::new(self.parse_switch()?))),
            Some(TokenKind::LBrace) => self.parse_array_init(false),
            Some(TokenKind::Ident) => {
                let name = self.ident()?;
                if self.at(TokenKind::LParen) {
                    let args = self.parse_args()?;
                    return Ok(Expr::MethodCall {
                        target: None,
                        type_args: Vec::new(),
                        name,
                        args,
                        range: self.finish(start),
                    });
                }
                Ok(Expr::Name(name))
            }
            Some(kind) if kind.is_primitive() || kind == TokenKind::Void => {
                let ty = self.parse_type()?;
                self.finish_type_expr(ty, start)
            }
            Some(_) => self.error("expected expression"),
        }
    }

    /// `Type.class` or `Type::new` after a type in expression position.
    fn finish_type_expr(&mut self, ty: TypeRef, start: TextSize) -> PResult<Expr> {
        if self.eat(TokenKind::Dot) {
            self.expect(TokenKind::Class, "`class`")?;
            return Ok(Expr::ClassLit {
                ty,
                range: self.finish(start),
            });
        }
        if self.eat(TokenKind::ColonColon) {
            let name = self.method_ref_name()?;
            return Ok(Expr::MethodRef {
                target: MethodRefTarget::Type(ty),
                name,
                range: self.finish(start),
            });
        }
        self.error("expected `.class` or `::`")
    }

    fn method_ref_name(&mut self) -> PResult<Ident> {
        if self.at(TokenKind::New) {
            let range = self.bump();
            return Ok(Ident::new("new", range));
        }
        self.ident()
    }

    fn parse_postfix(&mut self, mut expr: Expr, start: TextSize) -> PResult<Expr> {
        loop {
            match self.nth(0) {
                Some(TokenKind::Dot) => match self.nth(1) {
                    Some(TokenKind::New) => {
                        self.bump();
                        expr = self.parse_new(Some(Box::new(expr)), start)?;
                    }
                    Some(TokenKind::This) => {
                        self.bump();
                        self.bump();
                        expr = Expr::This {
                            qualifier: Some(Box::new(expr)),
                            range: self.finish(start),
                        };
                    }
                    Some(TokenKind::Super) => {
                        self.bump();
                        let keyword = self.bump();
                        if self.at(TokenKind::LParen) {
                            let args = self.parse_args()?;
                            expr = Expr::CtorCall {
                                kind: CtorCallKind::Super,
                                keyword,
                                qualifier: Some(Box::new(expr)),
                                args,
                                range: self.finish(start),
                            };
                        } else {
                            expr = Expr::Super {
                                qualifier: Some(Box::new(expr)),
                                range: self.finish(start),
                            };
                        }
                    }
                    Some(TokenKind::Class) => {
                        self.bump();
                        self.bump();
                        let ty = self.expr_to_type(&expr)?;
                        expr = Expr::ClassLit {
                            ty,
                            range: self.finish(start),
                        };
                    }
                    Some(TokenKind::Lt) => {
                        self.bump();
                        self.expect(TokenKind::Lt, "`<`")?;
                        let mut type_args = vec![self.parse_type()?];
                        while self.eat(TokenKind::Comma) {
                            type_args.push(self.parse_type()?);
                        }
                        self.expect(TokenKind::Gt, "`>`")?;
                        let name = self.ident()?;
                        let args = self.parse_args()?;
                        expr = Expr::MethodCall {
                            target: Some(Box::new(expr)),
                            type_args,
                            name,
                            args,
                            range: self.finish(start),
                        };
                    }
                    _ => {
                        self.bump();
                        let name = self.ident()?;
                        if self.at(TokenKind::LParen) {
                            let args = self.parse_args()?;
                            expr = Expr::MethodCall {
                                target: Some(Box::new(expr)),
                                type_args: Vec::new(),
                                name,
                                args,
                                range: self.finish(start),
                            };
                        } else {
                            expr = Expr::FieldAccess {
                                target: Box::new(expr),
                                name,
                                range: self.finish(start),
                            };
                        }
                    }
                },
                Some(TokenKind::LBracket) => {
                    if self.nth_at(1, TokenKind::RBracket) {
                        let element = self.expr_to_type(&expr)?;
                        let ty = self.parse_dims(element);
                        return self.finish_type_expr(ty, start);
                    }
                    self.bump();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket, "`]`")?;
                    expr = Expr::Index {
                        array: Box::new(expr),
                        index: Box::new(index),
                        range: self.finish(start),
                    };
                }
                Some(kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus)) => {
                    self.bump();
                    let op = if kind == TokenKind::PlusPlus {
                        UnaryOp::PostIncrement
                    } else {
                        UnaryOp::PostDecrement
                    };
                    expr = Expr::Unary {
                        op,
                        operand: Box::new(expr),
                        range: self.finish(start),
                    };
                }
                Some(TokenKind::ColonColon) => {
                    self.bump();
                    let name = self.method_ref_name()?;
                    expr = Expr::MethodRef {
                        target: MethodRefTarget::Expr(Box::new(expr)),
                        name,
                        range: self.finish(start),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_new(&mut self, qualifier: Option<Box<Expr>>, start: TextSize) -> PResult<Expr> {
        self.expect(TokenKind::New, "`new`")?;
        if self.at(TokenKind::Lt) {
            self.parse_type_args()?;
        }
        let annotations = self.parse_annotations()?;
        let ty = self.parse_non_array_type(annotations)?;

        if self.at(TokenKind::LBracket) {
            let mut dims = Vec::new();
            while self.eat(TokenKind::LBracket) {
                if !self.eat(TokenKind::RBracket) {
                    dims.push(self.parse_expr()?);
                    self.expect(TokenKind::RBracket, "`]`")?;
                }
            }
            let init = if self.at(TokenKind::LBrace) {
                match self.parse_array_init(false)? {
                    Expr::ArrayInit { elements, .. } => Some(elements),
                    _ => None,
                }
            } else {
                None
            };
            return Ok(Expr::NewArray {
                element: ty,
                dims,
                init,
                range: self.finish(start),
            });
        }

        let args = self.parse_args()?;
        let body = if self.at(TokenKind::LBrace) {
            Some(self.parse_class_body(TypeDeclKind::Class, None)?.1)
        } else {
            None
        };
        Ok(Expr::New {
            qualifier,
            ty,
            args,
            body,
            range: self.finish(start),
        })
    }

    fn parse_args(&mut self) -> PResult<Vec<Expr>> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(args)
    }
}

fn modifier_of(kind: TokenKind) -> Option<Modifier> {
    let modifier = match kind {
        TokenKind::Public => Modifier::Public,
        TokenKind::Protected => Modifier::Protected,
        TokenKind::Private => Modifier::Private,
        TokenKind::Static => Modifier::Static,
        TokenKind::Abstract => Modifier::Abstract,
        TokenKind::Final => Modifier::Final,
        TokenKind::Native => Modifier::Native,
        TokenKind::Synchronized => Modifier::Synchronized,
        TokenKind::Transient => Modifier::Transient,
        TokenKind::Volatile => Modifier::Volatile,
        TokenKind::Strictfp => Modifier::Strictfp,
        TokenKind::Default => Modifier::Default,
        _ => return None,
    };
    Some(modifier)
}

fn literal_kind(kind: TokenKind, text: &str) -> LiteralKind {
    match kind {
        TokenKind::String | TokenKind::TextBlock => LiteralKind::String,
        TokenKind::CharLit => LiteralKind::Char,
        TokenKind::True | TokenKind::False => LiteralKind::Boolean,
        TokenKind::Null => LiteralKind::Null,
        _ => {
            let lower = text.to_ascii_lowercase();
            if lower.starts_with("0x") || lower.starts_with("0b") {
                if lower.ends_with('l') {
                    LiteralKind::Long
                } else {
                    LiteralKind::Int
                }
            } else if lower.ends_with('l') {
                LiteralKind::Long
            } else if lower.ends_with('f') {
                LiteralKind::Float
            } else if lower.ends_with('d') || lower.contains('.') || lower.contains('e') {
                LiteralKind::Double
            } else {
                LiteralKind::Int
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> CompilationUnit {
        match parse(source) {
            Ok(unit) => unit,
            Err(err) => panic!("parse failed: {} at {:?}", err, err.range),
        }
    }

    fn first_method(unit: &CompilationUnit) -> &MethodDecl {
        unit.types[0]
            .members
            .iter()
            .find_map(|m| match m {
                Member::Method(method) => Some(method),
                _ => None,
            })
            .expect("no method")
    }

    #[test]
    fn test_package_and_imports() {
        let unit = parse_ok(
            "package com.airbnb.epoxy;\nimport android.widget.Space;\nimport static java.util.Objects.*;\nclass A {}",
        );
        assert_eq!(unit.package_name(), "com.airbnb.epoxy");
        assert_eq!(unit.imports.len(), 2);
        assert_eq!(unit.imports[0].path.to_dotted(), "android.widget.Space");
        assert!(unit.imports[1].is_static);
        assert!(unit.imports[1].on_demand);
    }

    #[test]
    fn test_class_with_generic_supertype_and_doc() {
        let unit = parse_ok("/** Placeholder. */\nclass Hidden extends EpoxyModel<Space> implements A, B {}");
        let ty = &unit.types[0];
        assert_eq!(ty.name.as_str(), "Hidden");
        assert!(ty.doc.is_some());
        assert_eq!(ty.extends[0].to_string(), "EpoxyModel<Space>");
        assert_eq!(ty.implements.len(), 2);
    }

    #[test]
    fn test_method_with_annotation_and_params() {
        let unit = parse_ok(
            "class A {\n  @Override\n  public int getSpanSize(int spanCount, int position, int itemCount) {\n    return 0;\n  }\n}",
        );
        let method = first_method(&unit);
        assert_eq!(method.name.as_str(), "getSpanSize");
        assert_eq!(method.modifiers.annotations.len(), 1);
        assert_eq!(method.params.len(), 3);
        assert_eq!(method.params[2].name.as_str(), "itemCount");
    }

    #[test]
    fn test_constructor_and_fields() {
        let unit = parse_ok("class Point { private final int x, y[]; Point(int x) { this.x = x; } }");
        let fields: Vec<_> = unit.types[0]
            .members
            .iter()
            .filter_map(|m| match m {
                Member::Field(f) => Some(f),
                _ => None,
            })
            .collect();
        assert_eq!(fields[0].declarators.len(), 2);
        assert_eq!(fields[0].declarators[1].extra_dims, 1);
        assert!(first_method(&unit).is_constructor());
    }

    #[test]
    fn test_local_declaration_vs_expression() {
        let unit = parse_ok(
            "class A { void f() { List<String> xs = make(); xs.add(a < b ? c : d); int i = 0; i = i >> 2; } }",
        );
        let body = first_method(&unit).body.as_ref().unwrap();
        assert!(matches!(body.stmts[0], Stmt::Local(_)));
        assert!(matches!(body.stmts[1], Stmt::Expr(Expr::MethodCall { .. })));
        assert!(matches!(body.stmts[2], Stmt::Local(_)));
        match &body.stmts[3] {
            Stmt::Expr(Expr::Assign { value, .. }) => {
                assert!(matches!(**value, Expr::Binary { op: BinaryOp::Shr, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_casts_and_lambdas() {
        let unit = parse_ok(
            "class A { void f() { Object o = (String) s; int n = (int) 1.5; Runnable r = () -> run(); g((a, b) -> a + b); int m = (n) + 1; } }",
        );
        let body = first_method(&unit).body.as_ref().unwrap();
        let init = |i: usize| match &body.stmts[i] {
            Stmt::Local(decl) => decl.declarators[0].init.clone().unwrap(),
            other => panic!("unexpected {:?}", other),
        };
        assert!(matches!(init(0), Expr::Cast { .. }));
        assert!(matches!(init(1), Expr::Cast { .. }));
        assert!(matches!(init(2), Expr::Lambda { .. }));
        assert!(matches!(init(4), Expr::Binary { .. }));
    }

    #[test]
    fn test_statements() {
        let source = r#"class A {
            void f(List<String> xs) {
                for (String x : xs) { if (x == null) continue; }
                for (int i = 0, j = 1; i < 10; i++, j--) {}
                try (Reader r = open()) { r.read(); } catch (IOException | RuntimeException e) { throw e; } finally { close(); }
                switch (k) { case 1: case 2: break; default: return; }
                int v = switch (k) { case A -> 1; case Circle c -> 2; default -> { yield 3; } };
                outer: while (true) { break outer; }
                do { k++; } while (k < 3);
                synchronized (this) { notify(); }
                assert k > 0 : "positive";
                if (o instanceof String s) {}
            }
        }"#;
        let unit = parse_ok(source);
        let body = first_method(&unit).body.as_ref().unwrap();
        assert!(matches!(body.stmts[0], Stmt::ForEach { .. }));
        assert!(matches!(body.stmts[1], Stmt::For { .. }));
        assert!(matches!(body.stmts[2], Stmt::Try { .. }));
        assert!(matches!(body.stmts[3], Stmt::Switch(_)));
        assert!(matches!(body.stmts[4], Stmt::Local(_)));
        assert!(matches!(body.stmts[5], Stmt::Labeled { .. }));
        assert_eq!(body.stmts.len(), 10);
    }

    #[test]
    fn test_enum_record_interface_annotation_decls() {
        let source = r#"
            enum Color { RED, GREEN("g") { void f() {} }; Color() {} Color(String s) {} }
            record Pair<A, B>(A first, B second) implements Comparable<Pair<A, B>> { Pair { } }
            interface Shape { default double area() { return 0; } }
            @interface Marker { String value() default ""; int[] ids() default {1, 2}; }
        "#;
        let unit = parse_ok(source);
        assert_eq!(unit.types.len(), 4);
        assert_eq!(unit.types[0].enum_constants.len(), 2);
        assert_eq!(unit.types[1].record_components.len(), 2);
        assert_eq!(unit.types[1].type_params.len(), 2);
        assert_eq!(unit.types[2].kind, TypeDeclKind::Interface);
        assert_eq!(unit.types[3].kind, TypeDeclKind::Annotation);
    }

    #[test]
    fn test_member_chains_and_method_refs() {
        let unit = parse_ok(
            "class A { int f() { list.stream().map(String::valueOf).forEach(System.out::println); Object c = int[].class; return R.layout.item; } }",
        );
        let body = first_method(&unit).body.as_ref().unwrap();
        match &body.stmts[2] {
            Stmt::Return(Some(expr)) => {
                let chain: Vec<&str> = expr
                    .as_name_chain()
                    .unwrap()
                    .into_iter()
                    .map(Ident::as_str)
                    .collect();
                assert_eq!(chain, vec!["R", "layout", "item"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_anonymous_class_and_array_creation() {
        let unit = parse_ok(
            "class A { void f() { Runnable r = new Runnable() { public void run() {} }; int[][] g = new int[3][]; String[] s = new String[] {\"a\"}; } }",
        );
        let body = first_method(&unit).body.as_ref().unwrap();
        match &body.stmts[0] {
            Stmt::Local(decl) => {
                assert!(matches!(
                    decl.declarators[0].init,
                    Some(Expr::New { body: Some(_), .. })
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error_reports_range() {
        let err = parse("class A { int x = ; }").unwrap_err();
        assert!(err.message.contains("expected expression"));
        assert_eq!(err.range, TextRange::new(18.into(), 19.into()));
    }
}
