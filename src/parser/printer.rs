/*!
# Printer

Turns a tree back into source text by concatenating every token's leading
trivia and text in order. Parsed subtrees print exactly what was read;
synthesized nodes print whatever trivia the formatting helpers gave them.

The printer also rejects trees that cannot be valid Java: a non-final list
element without separator, an empty token, or a synthesized identifier that
is not a legal Java identifier.
*/

use super::ast::*;
use super::lexer::{is_valid_identifier, Token, TokenKind};
use crate::core::PrintError;

/// Prints a compilation unit.
pub fn print(cu: &CompilationUnit) -> Result<String, PrintError> {
    let mut printer = Printer::default();
    printer.compilation_unit(cu)?;
    Ok(printer.out)
}

/// Prints a single annotation including its leading trivia.
pub fn print_annotation(annotation: &Annotation) -> Result<String, PrintError> {
    let mut printer = Printer::default();
    printer.annotation(annotation)?;
    Ok(printer.out)
}

/// Prints a type reference including its leading trivia.
pub fn print_type_tree(tree: &TypeTree) -> Result<String, PrintError> {
    let mut printer = Printer::default();
    printer.type_tree(tree)?;
    Ok(printer.out)
}

#[derive(Default)]
struct Printer {
    out: String,
}

impl Printer {
    fn token(&mut self, token: &Token) -> Result<(), PrintError> {
        if token.text.is_empty() && token.kind != TokenKind::Eof {
            return Err(PrintError::new(format!(
                "empty {} token after `{}`",
                token.kind,
                self.tail()
            )));
        }
        if token.kind == TokenKind::Identifier
            && token.offset.is_none()
            && !is_valid_identifier(&token.text)
        {
            return Err(PrintError::new(format!(
                "`{}` is not a valid Java identifier",
                token.text
            )));
        }
        self.out.push_str(&token.leading);
        self.out.push_str(&token.text);
        Ok(())
    }

    fn tokens(&mut self, tokens: &[Token]) -> Result<(), PrintError> {
        tokens.iter().try_for_each(|t| self.token(t))
    }

    /// A few characters of already printed output, for error messages.
    fn tail(&self) -> String {
        let trimmed = self.out.trim_end();
        let start = trimmed
            .char_indices()
            .rev()
            .nth(29)
            .map(|(i, _)| i)
            .unwrap_or(0);
        trimmed[start..].to_string()
    }

    fn separated<T>(
        &mut self,
        items: &[Separated<T>],
        what: &str,
        mut item: impl FnMut(&mut Self, &T) -> Result<(), PrintError>,
    ) -> Result<(), PrintError> {
        for (i, entry) in items.iter().enumerate() {
            item(self, &entry.item)?;
            match &entry.separator {
                Some(separator) => self.token(separator)?,
                None if i + 1 < items.len() => {
                    return Err(PrintError::new(format!(
                        "missing separator in {} after `{}`",
                        what,
                        self.tail()
                    )))
                }
                None => {}
            }
        }
        Ok(())
    }

    fn compilation_unit(&mut self, cu: &CompilationUnit) -> Result<(), PrintError> {
        if let Some(package) = &cu.package {
            for annotation in &package.annotations {
                self.annotation(annotation)?;
            }
            self.token(&package.keyword)?;
            self.qualified_name(&package.name)?;
            self.token(&package.semicolon)?;
        }
        for import in &cu.imports {
            self.token(&import.keyword)?;
            if let Some(static_kw) = &import.static_kw {
                self.token(static_kw)?;
            }
            self.qualified_name(&import.name)?;
            self.token(&import.semicolon)?;
        }
        for item in &cu.types {
            match item {
                TypeDeclItem::Class(class) => self.class_decl(class)?,
                TypeDeclItem::Empty(token) => self.token(token)?,
            }
        }
        self.token(&cu.eof)
    }

    fn qualified_name(&mut self, name: &QualifiedName) -> Result<(), PrintError> {
        if name.tokens.is_empty() {
            return Err(PrintError::new(format!("empty name after `{}`", self.tail())));
        }
        self.tokens(&name.tokens)
    }

    fn annotation(&mut self, annotation: &Annotation) -> Result<(), PrintError> {
        self.token(&annotation.at)?;
        self.qualified_name(&annotation.name)?;
        if let Some(args) = &annotation.args {
            self.token(&args.open)?;
            self.separated(&args.items, "annotation arguments", |p, arg| match arg {
                AnnotationArg::Value(value) => p.expr(value),
                AnnotationArg::Named { name, eq, value } => {
                    p.token(name)?;
                    p.token(eq)?;
                    p.expr(value)
                }
            })?;
            self.token(&args.close)?;
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr) -> Result<(), PrintError> {
        if expr.tokens.is_empty() {
            return Err(PrintError::new(format!("empty expression after `{}`", self.tail())));
        }
        self.tokens(&expr.tokens)
    }

    fn modifiers(&mut self, modifiers: &[Modifier]) -> Result<(), PrintError> {
        for modifier in modifiers {
            match modifier {
                Modifier::Annotation(annotation) => self.annotation(annotation)?,
                Modifier::Keyword(token) => self.token(token)?,
            }
        }
        Ok(())
    }

    fn type_tree(&mut self, tree: &TypeTree) -> Result<(), PrintError> {
        self.qualified_name(&tree.name)?;
        if let Some(args) = &tree.type_args {
            self.token(&args.open)?;
            self.separated(&args.args, "type arguments", |p, arg| match arg {
                TypeArg::Type(tree) => p.type_tree(tree),
                TypeArg::Wildcard { question, bound } => {
                    p.token(question)?;
                    if let Some(bound) = bound {
                        p.token(&bound.keyword)?;
                        p.type_tree(&bound.bound)?;
                    }
                    Ok(())
                }
            })?;
            self.token(&args.close)?;
        }
        self.tokens(&tree.dims)
    }

    fn type_list(&mut self, list: &TypeList) -> Result<(), PrintError> {
        self.token(&list.keyword)?;
        self.separated(&list.types, "type list", |p, tree| p.type_tree(tree))
    }

    fn class_decl(&mut self, class: &ClassDecl) -> Result<(), PrintError> {
        self.modifiers(&class.modifiers)?;
        self.tokens(&class.kind_tokens)?;
        self.token(&class.name)?;
        if let Some(type_params) = &class.type_params {
            self.tokens(&type_params.tokens)?;
        }
        if let Some(header) = &class.record_header {
            self.param_list(header)?;
        }
        for list in [&class.extends, &class.implements, &class.permits]
            .into_iter()
            .flatten()
        {
            self.type_list(list)?;
        }
        self.token(&class.body.open)?;
        for member in &class.body.members {
            self.member(member)?;
        }
        self.token(&class.body.close)
    }

    fn member(&mut self, member: &Member) -> Result<(), PrintError> {
        match member {
            Member::Method(method) => self.method_decl(method),
            Member::Field(field) => self.field_decl(field),
            Member::Class(class) => self.class_decl(class),
            Member::Initializer(init) => {
                if let Some(static_kw) = &init.static_kw {
                    self.token(static_kw)?;
                }
                self.block(&init.body)
            }
            Member::EnumConstants(run) => self.tokens(&run.tokens),
            Member::Empty(token) => self.token(token),
        }
    }

    fn method_decl(&mut self, method: &MethodDecl) -> Result<(), PrintError> {
        self.modifiers(&method.modifiers)?;
        if let Some(type_params) = &method.type_params {
            self.tokens(&type_params.tokens)?;
        }
        if let Some(return_type) = &method.return_type {
            self.type_tree(return_type)?;
        }
        self.token(&method.name)?;
        self.param_list(&method.params)?;
        self.tokens(&method.dims)?;
        if let Some(throws) = &method.throws {
            self.type_list(throws)?;
        }
        if let Some(default) = &method.default_value {
            self.token(&default.keyword)?;
            self.expr(&default.value)?;
        }
        match &method.body {
            MethodBody::Block(block) => self.block(block),
            MethodBody::Semicolon(token) => self.token(token),
        }
    }

    fn param_list(&mut self, params: &ParamList) -> Result<(), PrintError> {
        self.token(&params.open)?;
        self.separated(&params.params, "parameter list", |p, param| {
            p.modifiers(&param.modifiers)?;
            p.type_tree(&param.type_tree)?;
            if let Some(varargs) = &param.varargs {
                p.token(varargs)?;
            }
            p.token(&param.name)?;
            p.tokens(&param.dims)
        })?;
        self.token(&params.close)
    }

    fn field_decl(&mut self, field: &FieldDecl) -> Result<(), PrintError> {
        self.modifiers(&field.modifiers)?;
        self.type_tree(&field.type_tree)?;
        self.separated(&field.declarators, "variable declarators", |p, declarator| {
            p.token(&declarator.name)?;
            p.tokens(&declarator.dims)?;
            if let Some(init) = &declarator.init {
                p.token(&init.eq)?;
                p.code(&init.value)?;
            }
            Ok(())
        })?;
        self.token(&field.semicolon)
    }

    fn block(&mut self, block: &Block) -> Result<(), PrintError> {
        self.token(&block.open)?;
        self.code(&block.elements)?;
        self.token(&block.close)
    }

    fn code(&mut self, elements: &[CodeElement]) -> Result<(), PrintError> {
        for element in elements {
            match element {
                CodeElement::Token(token) => self.token(token)?,
                CodeElement::Block(block) => self.block(block)?,
                CodeElement::Invocation(invocation) => {
                    self.token(&invocation.name)?;
                    self.token(&invocation.open)?;
                    self.code(&invocation.args)?;
                    self.token(&invocation.close)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::JavaParser;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn test_round_trip() {
        let source = "package a;\n\nimport java.util.List;\n\n/** doc */\n@Path(\"/x\")\npublic class A {\n    // comment\n    @GET List<String> all(@QueryParam(\"q\") String q) { return service.find(q, 1); }\n}\n";
        let cu = JavaParser::new().parse_text(source).unwrap();
        assert_eq!(print(&cu).unwrap(), source);
    }

    #[test]
    fn test_missing_separator_is_rejected() {
        let mut cu = JavaParser::new()
            .parse_text("class A { void f(int a, int b) {} }")
            .unwrap();
        let TypeDeclItem::Class(class) = &mut cu.types[0] else { unreachable!() };
        let class = Arc::make_mut(class);
        let Member::Method(method) = &mut class.body.members[0] else { unreachable!() };
        Arc::make_mut(method).params.params[0].separator = None;

        let err = print(&cu).unwrap_err();
        assert!(err.message.contains("missing separator in parameter list"));
    }

    #[test]
    fn test_invalid_identifier_is_rejected() {
        let mut cu = JavaParser::new().parse_text("class A { void f() {} }").unwrap();
        let TypeDeclItem::Class(class) = &mut cu.types[0] else { unreachable!() };
        let class = Arc::make_mut(class);
        let Member::Method(method) = &mut class.body.members[0] else { unreachable!() };
        let method = Arc::make_mut(method);
        method.name = method.name.renamed("get-by-id");

        let err = print(&cu).unwrap_err();
        assert_eq!(err.message, "`get-by-id` is not a valid Java identifier");
    }

    #[test]
    fn test_empty_token_is_rejected() {
        let mut cu = JavaParser::new().parse_text("class A {}").unwrap();
        let TypeDeclItem::Class(class) = &mut cu.types[0] else { unreachable!() };
        Arc::make_mut(class).body.close.text.clear();
        assert!(print(&cu).is_err());
    }
}
