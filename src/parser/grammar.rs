/*!
# Java Grammar

Recursive-descent parser from the token stream of [`super::lexer`] into the
lossless tree of [`super::ast`].

Declarations (package, imports, types, members, parameters, annotations and
type references) are parsed structurally. Method bodies, initializers and
field initializers are kept as flat code elements in which only nested
blocks and method invocations are recognised.
*/

use std::sync::Arc;

use super::ast::*;
use super::lexer::{Token, TokenKind};
use crate::core::ParseError;

const MODIFIER_KEYWORDS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "final",
    "abstract",
    "native",
    "synchronized",
    "transient",
    "volatile",
    "strictfp",
    "default",
];

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

pub(crate) fn is_primitive_keyword(text: &str) -> bool {
    PRIMITIVES.contains(&text)
}

/// Parses a complete compilation unit. `tokens` must come from `source`.
pub fn parse_compilation_unit(source: &str, tokens: Vec<Token>) -> Result<CompilationUnit, ParseError> {
    Parser::new(source, tokens).compilation_unit()
}

/// Parses a single annotation such as `@GetMapping("/{id}")`.
pub fn parse_annotation(source: &str, tokens: Vec<Token>) -> Result<Annotation, ParseError> {
    let mut parser = Parser::new(source, tokens);
    let annotation = parser.annotation()?;
    parser.expect(TokenKind::Eof, "end of annotation")?;
    Ok(annotation)
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    // ---- token cursor -------------------------------------------------

    fn peek(&self, n: usize) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + n).min(last)]
    }

    fn current(&self) -> &Token {
        self.peek(0)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn at_kw(&self, keyword: &str) -> bool {
        self.current().is_keyword(keyword)
    }

    fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let offset = self.current().offset.unwrap_or(self.source.len());
        ParseError::at(self.source, offset, message)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let found = self.current();
        if found.kind == TokenKind::Eof {
            self.error(format!("expected {}, found end of file", expected))
        } else {
            self.error(format!("expected {}, found `{}`", expected, found.text))
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_kw(&mut self, keyword: &str) -> Result<Token, ParseError> {
        if self.at_kw(keyword) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(&format!("`{}`", keyword)))
        }
    }

    fn optional(&mut self, kind: TokenKind) -> Option<Token> {
        self.at(kind).then(|| self.bump())
    }

    // ---- compilation unit ---------------------------------------------

    fn compilation_unit(&mut self) -> Result<CompilationUnit, ParseError> {
        let package = self.package_decl()?;

        let mut imports = Vec::new();
        while self.at_kw("import") {
            imports.push(Arc::new(self.import()?));
        }

        let mut types = Vec::new();
        while !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Semicolon) {
                types.push(TypeDeclItem::Empty(self.bump()));
                continue;
            }
            let modifiers = self.modifiers()?;
            if !self.at_class_start() {
                return Err(self.unexpected("type declaration"));
            }
            types.push(TypeDeclItem::Class(Arc::new(self.class_decl(modifiers)?)));
        }

        Ok(CompilationUnit {
            package,
            imports,
            types,
            eof: self.bump(),
            crlf: self.source.contains("\r\n"),
        })
    }

    fn package_decl(&mut self) -> Result<Option<PackageDecl>, ParseError> {
        let start = self.pos;
        let mut annotations = Vec::new();
        while self.at(TokenKind::At) && !self.peek(1).is_keyword("interface") {
            annotations.push(Arc::new(self.annotation()?));
        }
        if !self.at_kw("package") {
            // Annotations belong to the first type declaration
            self.pos = start;
            return Ok(None);
        }
        let keyword = self.bump();
        let name = self.qualified_name(false)?;
        let semicolon = self.expect(TokenKind::Semicolon, "`;`")?;
        Ok(Some(PackageDecl {
            annotations,
            keyword,
            name,
            semicolon,
        }))
    }

    fn import(&mut self) -> Result<Import, ParseError> {
        let keyword = self.expect_kw("import")?;
        let static_kw = self.at_kw("static").then(|| self.bump());
        let name = self.qualified_name(true)?;
        let semicolon = self.expect(TokenKind::Semicolon, "`;`")?;
        Ok(Import {
            keyword,
            static_kw,
            name,
            semicolon,
        })
    }

    fn qualified_name(&mut self, allow_wildcard: bool) -> Result<QualifiedName, ParseError> {
        let mut tokens = vec![self.expect(TokenKind::Identifier, "identifier")?];
        while self.at(TokenKind::Dot) {
            let next = self.peek(1);
            if next.kind == TokenKind::Identifier {
                tokens.push(self.bump());
                tokens.push(self.bump());
            } else if allow_wildcard && next.kind == TokenKind::Operator && next.text == "*" {
                tokens.push(self.bump());
                tokens.push(self.bump());
                break;
            } else {
                break;
            }
        }
        Ok(QualifiedName { tokens })
    }

    // ---- modifiers & annotations --------------------------------------

    fn at_modifier_keyword(&self) -> bool {
        let token = self.current();
        match token.kind {
            TokenKind::Keyword => MODIFIER_KEYWORDS.contains(&token.text.as_str()),
            // `sealed class ...`
            TokenKind::Identifier => {
                token.text == "sealed"
                    && matches!(self.peek(1).kind, TokenKind::Keyword | TokenKind::Identifier)
            }
            _ => false,
        }
    }

    fn modifiers(&mut self) -> Result<Vec<Modifier>, ParseError> {
        let mut modifiers = Vec::new();
        loop {
            if self.at(TokenKind::At) && !self.peek(1).is_keyword("interface") {
                modifiers.push(Modifier::Annotation(Arc::new(self.annotation()?)));
            } else if self.at_modifier_keyword() {
                modifiers.push(Modifier::Keyword(self.bump()));
            } else {
                return Ok(modifiers);
            }
        }
    }

    fn annotation(&mut self) -> Result<Annotation, ParseError> {
        let at = self.expect(TokenKind::At, "`@`")?;
        let name = self.qualified_name(false)?;
        let args = if self.at(TokenKind::LeftParen) {
            Some(self.annotation_args()?)
        } else {
            None
        };
        Ok(Annotation { at, name, args })
    }

    fn annotation_args(&mut self) -> Result<AnnotationArgs, ParseError> {
        let open = self.bump();
        let mut items = Vec::new();
        while !self.at(TokenKind::RightParen) {
            let item = if self.at(TokenKind::Identifier) && self.peek(1).kind == TokenKind::Assign {
                let name = self.bump();
                let eq = self.bump();
                let value = self.expr_until(&[TokenKind::Comma, TokenKind::RightParen])?;
                AnnotationArg::Named { name, eq, value }
            } else {
                AnnotationArg::Value(self.expr_until(&[TokenKind::Comma, TokenKind::RightParen])?)
            };
            let separator = self.optional(TokenKind::Comma);
            let last = separator.is_none();
            items.push(Separated::new(item, separator));
            if last {
                break;
            }
        }
        let close = self.expect(TokenKind::RightParen, "`)`")?;
        Ok(AnnotationArgs { open, items, close })
    }

    /// Collects an opaque expression up to one of `stops` at nesting depth 0.
    fn expr_until(&mut self, stops: &[TokenKind]) -> Result<Expr, ParseError> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        loop {
            let kind = self.current().kind;
            if kind == TokenKind::Eof {
                return Err(self.unexpected("expression"));
            }
            if depth == 0 && stops.contains(&kind) {
                break;
            }
            match kind {
                TokenKind::LeftParen | TokenKind::LeftBrace | TokenKind::LeftBracket => depth += 1,
                TokenKind::RightParen | TokenKind::RightBrace | TokenKind::RightBracket => {
                    if depth == 0 {
                        return Err(self.unexpected("expression"));
                    }
                    depth -= 1;
                }
                _ => {}
            }
            tokens.push(self.bump());
        }
        if tokens.is_empty() {
            return Err(self.unexpected("expression"));
        }
        Ok(Expr { tokens })
    }

    // ---- types ----------------------------------------------------------

    fn type_tree(&mut self) -> Result<TypeTree, ParseError> {
        let name = if self.at(TokenKind::Keyword) && is_primitive_keyword(&self.current().text) {
            QualifiedName {
                tokens: vec![self.bump()],
            }
        } else {
            self.qualified_name(false)?
        };
        let type_args = if self.at(TokenKind::Less) {
            Some(self.type_args()?)
        } else {
            None
        };
        let dims = self.dims();
        Ok(TypeTree {
            name,
            type_args,
            dims,
        })
    }

    fn dims(&mut self) -> Vec<Token> {
        let mut dims = Vec::new();
        while self.at(TokenKind::LeftBracket) && self.peek(1).kind == TokenKind::RightBracket {
            dims.push(self.bump());
            dims.push(self.bump());
        }
        dims
    }

    fn type_args(&mut self) -> Result<TypeArgs, ParseError> {
        let open = self.expect(TokenKind::Less, "`<`")?;
        let mut args = Vec::new();
        while !self.at(TokenKind::Greater) {
            let arg = if self.at(TokenKind::Question) {
                let question = self.bump();
                let bound = if self.at_kw("extends") || self.at_kw("super") {
                    let keyword = self.bump();
                    let bound = self.type_tree()?;
                    Some(Box::new(WildcardBound { keyword, bound }))
                } else {
                    None
                };
                TypeArg::Wildcard { question, bound }
            } else {
                TypeArg::Type(self.type_tree()?)
            };
            let separator = self.optional(TokenKind::Comma);
            let last = separator.is_none();
            args.push(Separated::new(arg, separator));
            if last {
                break;
            }
        }
        let close = self.expect(TokenKind::Greater, "`>`")?;
        Ok(TypeArgs { open, args, close })
    }

    /// `<T extends Comparable<T>, U>` kept verbatim.
    fn type_params(&mut self) -> Result<TokenRun, ParseError> {
        let mut tokens = vec![self.expect(TokenKind::Less, "`<`")?];
        let mut depth = 1usize;
        while depth > 0 {
            let kind = self.current().kind;
            match kind {
                TokenKind::Eof => return Err(self.unexpected("`>`")),
                TokenKind::Less => depth += 1,
                TokenKind::Greater => depth -= 1,
                _ => {}
            }
            tokens.push(self.bump());
        }
        Ok(TokenRun::new(tokens))
    }

    fn type_list(&mut self) -> Result<TypeList, ParseError> {
        let keyword = self.bump();
        let mut types = Vec::new();
        loop {
            let tree = self.type_tree()?;
            let separator = self.optional(TokenKind::Comma);
            let last = separator.is_none();
            types.push(Separated::new(tree, separator));
            if last {
                break;
            }
        }
        Ok(TypeList { keyword, types })
    }

    // ---- declarations ---------------------------------------------------

    fn at_record_start(&self) -> bool {
        self.current().is_ident("record")
            && self.peek(1).kind == TokenKind::Identifier
            && matches!(self.peek(2).kind, TokenKind::LeftParen | TokenKind::Less)
    }

    fn at_class_start(&self) -> bool {
        self.at_kw("class")
            || self.at_kw("interface")
            || self.at_kw("enum")
            || (self.at(TokenKind::At) && self.peek(1).is_keyword("interface"))
            || self.at_record_start()
    }

    fn class_decl(&mut self, modifiers: Vec<Modifier>) -> Result<ClassDecl, ParseError> {
        let (kind, kind_tokens) = if self.at(TokenKind::At) {
            let at = self.bump();
            (ClassKind::Annotation, vec![at, self.bump()])
        } else if self.at_kw("class") {
            (ClassKind::Class, vec![self.bump()])
        } else if self.at_kw("interface") {
            (ClassKind::Interface, vec![self.bump()])
        } else if self.at_kw("enum") {
            (ClassKind::Enum, vec![self.bump()])
        } else if self.at_record_start() {
            (ClassKind::Record, vec![self.bump()])
        } else {
            return Err(self.unexpected("`class`, `interface`, `enum` or `record`"));
        };

        let name = self.expect(TokenKind::Identifier, "type name")?;
        let type_params = if self.at(TokenKind::Less) {
            Some(self.type_params()?)
        } else {
            None
        };
        let record_header = if kind == ClassKind::Record {
            Some(self.param_list()?)
        } else {
            None
        };

        let mut extends = None;
        let mut implements = None;
        let mut permits = None;
        loop {
            if self.at_kw("extends") {
                extends = Some(self.type_list()?);
            } else if self.at_kw("implements") {
                implements = Some(self.type_list()?);
            } else if self.current().is_ident("permits") {
                permits = Some(self.type_list()?);
            } else {
                break;
            }
        }

        let body = self.class_body(kind)?;
        Ok(ClassDecl {
            modifiers,
            kind,
            kind_tokens,
            name,
            type_params,
            record_header,
            extends,
            implements,
            permits,
            body,
        })
    }

    fn class_body(&mut self, kind: ClassKind) -> Result<ClassBody, ParseError> {
        let open = self.expect(TokenKind::LeftBrace, "`{`")?;
        let mut members = Vec::new();
        if kind == ClassKind::Enum && !self.at(TokenKind::RightBrace) {
            members.push(Member::EnumConstants(self.enum_constants()?));
        }
        while !self.at(TokenKind::RightBrace) {
            if self.at(TokenKind::Eof) {
                return Err(self.unexpected("`}`"));
            }
            members.push(self.member()?);
        }
        let close = self.bump();
        Ok(ClassBody {
            open,
            members,
            close,
        })
    }

    fn enum_constants(&mut self) -> Result<TokenRun, ParseError> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        loop {
            let kind = self.current().kind;
            match kind {
                TokenKind::Eof => return Err(self.unexpected("`}`")),
                TokenKind::Semicolon if depth == 0 => {
                    tokens.push(self.bump());
                    break;
                }
                TokenKind::RightBrace if depth == 0 => break,
                TokenKind::LeftParen | TokenKind::LeftBrace => depth += 1,
                TokenKind::RightParen | TokenKind::RightBrace => depth -= 1,
                _ => {}
            }
            tokens.push(self.bump());
        }
        Ok(TokenRun::new(tokens))
    }

    fn member(&mut self) -> Result<Member, ParseError> {
        if self.at(TokenKind::Semicolon) {
            return Ok(Member::Empty(self.bump()));
        }
        if self.at(TokenKind::LeftBrace) {
            let body = Arc::new(self.block()?);
            return Ok(Member::Initializer(Arc::new(Initializer {
                static_kw: None,
                body,
            })));
        }
        if self.at_kw("static") && self.peek(1).kind == TokenKind::LeftBrace {
            let static_kw = Some(self.bump());
            let body = Arc::new(self.block()?);
            return Ok(Member::Initializer(Arc::new(Initializer { static_kw, body })));
        }

        let modifiers = self.modifiers()?;
        if self.at_class_start() {
            return Ok(Member::Class(Arc::new(self.class_decl(modifiers)?)));
        }

        let type_params = if self.at(TokenKind::Less) {
            Some(self.type_params()?)
        } else {
            None
        };

        // Constructor: `Name(`
        if self.at(TokenKind::Identifier) && self.peek(1).kind == TokenKind::LeftParen {
            let name = self.bump();
            return self
                .method_rest(modifiers, type_params, None, name)
                .map(|m| Member::Method(Arc::new(m)));
        }

        let type_tree = self.type_tree()?;
        let name = self.expect(TokenKind::Identifier, "member name")?;
        if self.at(TokenKind::LeftParen) {
            return self
                .method_rest(modifiers, type_params, Some(type_tree), name)
                .map(|m| Member::Method(Arc::new(m)));
        }
        if type_params.is_some() {
            return Err(self.unexpected("`(`"));
        }
        self.field_rest(modifiers, type_tree, name)
            .map(|f| Member::Field(Arc::new(f)))
    }

    fn method_rest(
        &mut self,
        modifiers: Vec<Modifier>,
        type_params: Option<TokenRun>,
        return_type: Option<TypeTree>,
        name: Token,
    ) -> Result<MethodDecl, ParseError> {
        let params = self.param_list()?;
        let dims = self.dims();
        let throws = if self.at_kw("throws") {
            Some(self.type_list()?)
        } else {
            None
        };
        let default_value = if self.at_kw("default") {
            let keyword = self.bump();
            let value = self.expr_until(&[TokenKind::Semicolon])?;
            Some(DefaultValue { keyword, value })
        } else {
            None
        };
        let body = if self.at(TokenKind::LeftBrace) {
            MethodBody::Block(Arc::new(self.block()?))
        } else {
            MethodBody::Semicolon(self.expect(TokenKind::Semicolon, "`;` or method body")?)
        };
        Ok(MethodDecl {
            modifiers,
            type_params,
            return_type,
            name,
            params,
            dims,
            throws,
            default_value,
            body,
        })
    }

    fn param_list(&mut self) -> Result<ParamList, ParseError> {
        let open = self.expect(TokenKind::LeftParen, "`(`")?;
        let mut params = Vec::new();
        while !self.at(TokenKind::RightParen) {
            let param = self.param()?;
            let separator = self.optional(TokenKind::Comma);
            let last = separator.is_none();
            params.push(Separated::new(param, separator));
            if last {
                break;
            }
        }
        let close = self.expect(TokenKind::RightParen, "`)`")?;
        Ok(ParamList {
            open,
            params,
            close,
        })
    }

    fn param(&mut self) -> Result<Param, ParseError> {
        let modifiers = self.modifiers()?;
        let type_tree = self.type_tree()?;
        let varargs = self.optional(TokenKind::Ellipsis);
        // `this` for receiver parameters
        let name = if self.at_kw("this") {
            self.bump()
        } else {
            self.expect(TokenKind::Identifier, "parameter name")?
        };
        let dims = self.dims();
        Ok(Param {
            modifiers,
            type_tree,
            varargs,
            name,
            dims,
        })
    }

    fn field_rest(
        &mut self,
        modifiers: Vec<Modifier>,
        type_tree: TypeTree,
        first_name: Token,
    ) -> Result<FieldDecl, ParseError> {
        let mut declarators = Vec::new();
        let mut name = first_name;
        loop {
            let dims = self.dims();
            let init = if self.at(TokenKind::Assign) {
                let eq = self.bump();
                let value = self.code_until(|p| p.at(TokenKind::Semicolon) || p.at_next_declarator())?;
                Some(VarInit { eq, value })
            } else {
                None
            };
            let declarator = VarDeclarator { name, dims, init };
            if self.at(TokenKind::Comma) {
                declarators.push(Separated::new(declarator, Some(self.bump())));
                name = self.expect(TokenKind::Identifier, "variable name")?;
            } else {
                declarators.push(Separated::new(declarator, None));
                break;
            }
        }
        let semicolon = self.expect(TokenKind::Semicolon, "`;`")?;
        Ok(FieldDecl {
            modifiers,
            type_tree,
            declarators,
            semicolon,
        })
    }

    /// `, name =` / `, name,` / `, name;` / `, name[` starts another declarator.
    fn at_next_declarator(&self) -> bool {
        self.at(TokenKind::Comma)
            && self.peek(1).kind == TokenKind::Identifier
            && matches!(
                self.peek(2).kind,
                TokenKind::Assign | TokenKind::Comma | TokenKind::Semicolon | TokenKind::LeftBracket
            )
    }

    // ---- code -----------------------------------------------------------

    fn block(&mut self) -> Result<Block, ParseError> {
        let open = self.expect(TokenKind::LeftBrace, "`{`")?;
        let elements = self.code_until(|p| p.at(TokenKind::RightBrace))?;
        let close = self.expect(TokenKind::RightBrace, "`}`")?;
        Ok(Block {
            open,
            elements,
            close,
        })
    }

    /// Code elements up to `stop` (checked outside of any parentheses).
    fn code_until(&mut self, stop: impl Fn(&Self) -> bool) -> Result<Vec<CodeElement>, ParseError> {
        let mut elements = Vec::new();
        let mut depth = 0usize;
        loop {
            if depth == 0 && stop(self) {
                return Ok(elements);
            }
            let kind = self.current().kind;
            match kind {
                TokenKind::Eof => return Err(self.unexpected("`}`")),
                TokenKind::LeftBrace => elements.push(CodeElement::Block(Arc::new(self.block()?))),
                TokenKind::RightBrace => return Err(self.unexpected("expression")),
                TokenKind::Identifier
                    if self.peek(1).kind == TokenKind::LeftParen && is_invocation_site(&elements) =>
                {
                    let receiver = classify_receiver(&elements);
                    let invocation = self.invocation(receiver)?;
                    elements.push(CodeElement::Invocation(Arc::new(invocation)));
                }
                TokenKind::LeftParen | TokenKind::LeftBracket => {
                    depth += 1;
                    elements.push(CodeElement::Token(self.bump()));
                }
                TokenKind::RightParen | TokenKind::RightBracket => {
                    if depth == 0 {
                        return Err(self.error(format!("unbalanced `{}`", self.current().text)));
                    }
                    depth -= 1;
                    elements.push(CodeElement::Token(self.bump()));
                }
                _ => elements.push(CodeElement::Token(self.bump())),
            }
        }
    }

    fn invocation(&mut self, receiver: Receiver) -> Result<MethodInvocation, ParseError> {
        let name = self.bump();
        let open = self.bump();
        let args = self.code_until(|p| p.at(TokenKind::RightParen))?;
        let close = self.expect(TokenKind::RightParen, "`)`")?;
        Ok(MethodInvocation {
            receiver,
            name,
            open,
            args,
            close,
        })
    }
}

fn element_token(element: Option<&CodeElement>) -> Option<&Token> {
    match element {
        Some(CodeElement::Token(token)) => Some(token),
        _ => None,
    }
}

/// An identifier followed by `(` is a call unless it names a constructor
/// (`new a.B(`), an annotation (`@A(`) or a declaration (`String m(`).
fn is_invocation_site(preceding: &[CodeElement]) -> bool {
    let Some(prev) = element_token(preceding.last()) else {
        return true;
    };
    if prev.kind == TokenKind::Identifier
        || prev.kind == TokenKind::RightBracket
        || (prev.kind == TokenKind::Keyword && is_primitive_keyword(&prev.text))
    {
        return false;
    }
    // Walk back over a dotted name
    let mut i = preceding.len();
    while i > 0 {
        match element_token(preceding.get(i - 1)) {
            Some(t) if t.kind == TokenKind::Dot || t.kind == TokenKind::Identifier => i -= 1,
            Some(t) if t.is_keyword("new") || t.kind == TokenKind::At => return false,
            _ => return true,
        }
    }
    true
}

fn classify_receiver(preceding: &[CodeElement]) -> Receiver {
    let n = preceding.len();
    match element_token(preceding.last()) {
        Some(dot) if dot.kind == TokenKind::Dot => {}
        _ => return Receiver::Implicit,
    }
    let Some(target) = element_token(n.checked_sub(2).and_then(|i| preceding.get(i))) else {
        return Receiver::Expression;
    };
    let qualified = n >= 3
        && element_token(preceding.get(n - 3)).is_some_and(|t| t.kind == TokenKind::Dot);
    if qualified {
        return Receiver::Expression;
    }
    match target.kind {
        TokenKind::Identifier => Receiver::Name(target.text.clone()),
        TokenKind::Keyword if target.text == "this" => Receiver::This,
        TokenKind::Keyword if target.text == "super" => Receiver::Super,
        _ => Receiver::Expression,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::JavaLexer;

    fn parse(source: &str) -> CompilationUnit {
        let tokens = JavaLexer::new().tokenize(source).unwrap();
        parse_compilation_unit(source, tokens).unwrap()
    }

    fn invocations(block: &Block) -> Vec<Arc<MethodInvocation>> {
        let mut out = Vec::new();
        collect(&block.elements, &mut out);
        out
    }

    fn collect(elements: &[CodeElement], out: &mut Vec<Arc<MethodInvocation>>) {
        for element in elements {
            match element {
                CodeElement::Invocation(inv) => {
                    out.push(inv.clone());
                    collect(&inv.args, out);
                }
                CodeElement::Block(block) => collect(&block.elements, out),
                CodeElement::Token(_) => {}
            }
        }
    }

    #[test]
    fn test_package_imports_and_class() {
        let cu = parse(
            "package a.b;\n\nimport java.util.*;\nimport static org.Foo.bar;\n\n@Deprecated\npublic final class A<T> extends B<T> implements C, D {}\n",
        );
        assert_eq!(cu.package_name(), "a.b");
        assert_eq!(cu.imports.len(), 2);
        assert!(cu.imports[0].is_wildcard());
        assert!(cu.imports[1].is_static());
        let class = cu.classes().next().unwrap();
        assert_eq!(class.simple_name(), "A");
        assert_eq!(class.modifiers.len(), 3);
        assert_eq!(class.type_parameter_names(), vec!["T"]);
        assert_eq!(class.supertypes().count(), 3);
    }

    #[test]
    fn test_members() {
        let cu = parse(
            r#"interface Repo<T, ID> extends JpaRepository<T, ID> {
    @Query("select x") T getById(@Param("id") ID id);
    int A = 1, B[] = {1, 2}, C;
    Map<String, List<Long>> m = new HashMap<String, List<Long>>();
    default <R> R map(Function<? super T, ? extends R> f, String... rest) { return f.apply(null); }
    @interface Marker { String value() default ""; }
    enum Kind { ONE("1") { void x() {} }, TWO; int code; }
    record Point(int x, int y) implements Shape {}
}"#,
        );
        let class = cu.classes().next().unwrap();
        let members = &class.body.members;
        assert_eq!(members.len(), 7);
        let Member::Method(get_by_id) = &members[0] else { panic!("method expected") };
        assert_eq!(get_by_id.name.text, "getById");
        assert_eq!(get_by_id.params.len(), 1);
        let Member::Field(ints) = &members[1] else { panic!("field expected") };
        assert_eq!(ints.names().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        let Member::Field(map) = &members[2] else { panic!("field expected") };
        assert_eq!(map.declarators.len(), 1);
        let Member::Method(generic) = &members[3] else { panic!("method expected") };
        assert_eq!(generic.type_parameter_names(), vec!["R"]);
        assert!(generic.params.params[1].item.varargs.is_some());
        let Member::Class(marker) = &members[4] else { panic!("class expected") };
        assert_eq!(marker.kind, ClassKind::Annotation);
        let Member::Class(kind) = &members[5] else { panic!("class expected") };
        assert!(matches!(kind.body.members[0], Member::EnumConstants(_)));
        assert_eq!(kind.fields().count(), 1);
        let Member::Class(point) = &members[6] else { panic!("class expected") };
        assert_eq!(point.kind, ClassKind::Record);
    }

    #[test]
    fn test_invocations_and_receivers() {
        let cu = parse(
            r#"class A {
    void run() {
        repo.getById(1L);
        getById(id);
        this.save(new Foo(a, b).bar());
        a.b.c(x, new HashMap<K, V>(), y);
        @SuppressWarnings("x") int local = super.size();
        Runnable r = new Runnable() { public void run() {} };
    }
}"#,
        );
        let class = cu.classes().next().unwrap();
        let method = class.methods().next().unwrap();
        let MethodBody::Block(body) = &method.body else { panic!("body expected") };
        let found = invocations(body);
        let summary: Vec<_> = found
            .iter()
            .map(|i| (i.name.text.as_str(), i.receiver.clone(), i.arg_count()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("getById", Receiver::Name("repo".to_string()), 1),
                ("getById", Receiver::Implicit, 1),
                ("save", Receiver::This, 1),
                ("bar", Receiver::Expression, 0),
                ("c", Receiver::Expression, 3),
                ("size", Receiver::Super, 0),
            ]
        );
    }

    #[test]
    fn test_parse_error_position() {
        let source = "class A {\n  void f( {}\n}";
        let tokens = JavaLexer::new().tokenize(source).unwrap();
        let err = parse_compilation_unit(source, tokens).unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("expected"));
    }
}
