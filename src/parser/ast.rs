/*!
# Concrete Syntax Tree for Java

Lossless tree produced by [`crate::parser::grammar`]. Every piece of source
text, trivia included, lives in exactly one [`Token`], so printing an
unmodified tree reproduces the input.

Subtrees that recipes replace as a unit (annotations, imports, members,
type declarations, blocks, invocations) are held in [`Arc`]s: a rewrite
rebuilds only the path from the changed node to the root and shares
everything else with the previous version of the tree.
*/

use std::sync::Arc;

use super::lexer::{Token, TokenKind};

/// List element followed by its separator (`,` in most lists).
/// Only the last element of a list may lack a separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Separated<T> {
    pub item: T,
    pub separator: Option<Token>,
}

impl<T> Separated<T> {
    pub fn new(item: T, separator: Option<Token>) -> Self {
        Self { item, separator }
    }
}

/// Access to the trivia in front of a node.
pub trait LeadingTrivia {
    fn leading(&self) -> &str;
    fn leading_mut(&mut self) -> &mut String;

    fn set_leading(&mut self, leading: impl Into<String>)
    where
        Self: Sized,
    {
        *self.leading_mut() = leading.into();
    }
}

impl LeadingTrivia for Token {
    fn leading(&self) -> &str {
        &self.leading
    }

    fn leading_mut(&mut self) -> &mut String {
        &mut self.leading
    }
}

/// Raw token sequence kept verbatim (type parameter lists, enum constants).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRun {
    pub tokens: Vec<Token>,
}

impl TokenRun {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Names declared by a type parameter list such as `<K, V extends Comparable<V>>`.
    pub fn type_parameter_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut depth = 0usize;
        let mut expect_name = false;
        // 1: `@` seen, 2: inside an annotation name
        let mut annotation = 0u8;
        for token in &self.tokens {
            match (annotation, token.kind) {
                (1, TokenKind::Identifier) => {
                    annotation = 2;
                    continue;
                }
                (2, TokenKind::Dot) => {
                    annotation = 1;
                    continue;
                }
                _ => annotation = 0,
            }
            match token.kind {
                TokenKind::Less => {
                    depth += 1;
                    expect_name = depth == 1;
                }
                TokenKind::Greater => depth = depth.saturating_sub(1),
                TokenKind::Comma if depth == 1 => expect_name = true,
                TokenKind::Identifier if expect_name => {
                    names.push(token.text.clone());
                    expect_name = false;
                }
                TokenKind::At => annotation = 1,
                _ => expect_name = false,
            }
        }
        names
    }
}

impl LeadingTrivia for TokenRun {
    fn leading(&self) -> &str {
        self.tokens.first().map(|t| t.leading.as_str()).unwrap_or("")
    }

    fn leading_mut(&mut self) -> &mut String {
        if self.tokens.is_empty() {
            self.tokens.push(Token::new(TokenKind::Identifier, ""));
        }
        &mut self.tokens[0].leading
    }
}

/// Dotted name: identifiers separated by `.`, optionally ending in `*` (imports).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub tokens: Vec<Token>,
}

impl QualifiedName {
    /// Synthesizes tokens for a dotted name such as `org.example.Type`.
    pub fn from_dotted(name: &str) -> Self {
        let mut tokens = Vec::new();
        for (i, segment) in name.split('.').enumerate() {
            if i > 0 {
                tokens.push(Token::new(TokenKind::Dot, "."));
            }
            let kind = if segment == "*" {
                TokenKind::Operator
            } else {
                TokenKind::Identifier
            };
            tokens.push(Token::new(kind, segment));
        }
        Self { tokens }
    }

    /// The name without trivia, e.g. `java.util.List`.
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    pub fn segments(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Dot)
            .map(|t| t.text.as_str())
            .collect()
    }

    pub fn simple_name(&self) -> &str {
        self.tokens
            .iter()
            .rev()
            .find(|t| t.kind != TokenKind::Dot)
            .map(|t| t.text.as_str())
            .unwrap_or("")
    }

    pub fn first_segment(&self) -> &str {
        self.tokens.first().map(|t| t.text.as_str()).unwrap_or("")
    }

    pub fn is_qualified(&self) -> bool {
        self.tokens.len() > 1
    }

    pub fn is_wildcard(&self) -> bool {
        self.tokens.last().is_some_and(|t| t.text == "*")
    }

    /// Primitive types and `void` are keywords.
    pub fn is_primitive(&self) -> bool {
        self.tokens.len() == 1 && self.tokens[0].kind == TokenKind::Keyword
    }

    /// Same leading trivia, different name.
    pub fn replaced(&self, dotted: &str) -> Self {
        let mut name = Self::from_dotted(dotted);
        name.tokens[0].leading = self.leading().to_string();
        name
    }
}

impl LeadingTrivia for QualifiedName {
    fn leading(&self) -> &str {
        self.tokens.first().map(|t| t.leading.as_str()).unwrap_or("")
    }

    fn leading_mut(&mut self) -> &mut String {
        if self.tokens.is_empty() {
            self.tokens.push(Token::identifier(""));
        }
        &mut self.tokens[0].leading
    }
}

/// Opaque expression kept as tokens (annotation values, defaults).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub tokens: Vec<Token>,
}

impl Expr {
    /// Source text of the expression without its leading trivia.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                out.push_str(&token.leading);
            }
            out.push_str(&token.text);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationArg {
    Value(Expr),
    Named { name: Token, eq: Token, value: Expr },
}

impl AnnotationArg {
    pub fn value(&self) -> &Expr {
        match self {
            AnnotationArg::Value(expr) => expr,
            AnnotationArg::Named { value, .. } => value,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            AnnotationArg::Value(_) => None,
            AnnotationArg::Named { name, .. } => Some(&name.text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationArgs {
    pub open: Token,
    pub items: Vec<Separated<AnnotationArg>>,
    pub close: Token,
}

/// `@Name`, `@Name(value)` or `@Name(key = value, ...)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub at: Token,
    pub name: QualifiedName,
    pub args: Option<AnnotationArgs>,
}

impl Annotation {
    pub fn simple_name(&self) -> &str {
        self.name.simple_name()
    }

    pub fn arguments(&self) -> impl Iterator<Item = &AnnotationArg> {
        self.args.iter().flat_map(|a| a.items.iter().map(|s| &s.item))
    }

    /// The single positional argument or the argument named `value`.
    pub fn value_argument(&self) -> Option<&Expr> {
        self.arguments()
            .find(|arg| matches!(arg.name(), None | Some("value")))
            .map(AnnotationArg::value)
    }
}

impl LeadingTrivia for Annotation {
    fn leading(&self) -> &str {
        &self.at.leading
    }

    fn leading_mut(&mut self) -> &mut String {
        &mut self.at.leading
    }
}

/// Modifier list entry. Annotations and keywords interleave in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    Annotation(Arc<Annotation>),
    Keyword(Token),
}

impl Modifier {
    pub fn as_annotation(&self) -> Option<&Arc<Annotation>> {
        match self {
            Modifier::Annotation(annotation) => Some(annotation),
            Modifier::Keyword(_) => None,
        }
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Modifier::Keyword(token) if token.text == keyword)
    }
}

impl LeadingTrivia for Modifier {
    fn leading(&self) -> &str {
        match self {
            Modifier::Annotation(annotation) => annotation.leading(),
            Modifier::Keyword(token) => &token.leading,
        }
    }

    fn leading_mut(&mut self) -> &mut String {
        match self {
            Modifier::Annotation(annotation) => Arc::make_mut(annotation).leading_mut(),
            Modifier::Keyword(token) => &mut token.leading,
        }
    }
}

pub fn has_keyword(modifiers: &[Modifier], keyword: &str) -> bool {
    modifiers.iter().any(|m| m.is_keyword(keyword))
}

pub fn annotations(modifiers: &[Modifier]) -> impl Iterator<Item = &Arc<Annotation>> {
    modifiers.iter().filter_map(Modifier::as_annotation)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardBound {
    pub keyword: Token,
    pub bound: TypeTree,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArg {
    Type(TypeTree),
    Wildcard {
        question: Token,
        bound: Option<Box<WildcardBound>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeArgs {
    pub open: Token,
    pub args: Vec<Separated<TypeArg>>,
    pub close: Token,
}

/// Type reference: `int`, `String[]`, `java.util.Map<K, ? extends V>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTree {
    pub name: QualifiedName,
    pub type_args: Option<TypeArgs>,
    /// `[` `]` pairs
    pub dims: Vec<Token>,
}

impl TypeTree {
    pub fn simple(name: &str) -> Self {
        Self {
            name: QualifiedName::from_dotted(name),
            type_args: None,
            dims: Vec::new(),
        }
    }

    pub fn array_dimensions(&self) -> usize {
        self.dims.len() / 2
    }

    pub fn type_arguments(&self) -> impl Iterator<Item = &TypeArg> {
        self.type_args.iter().flat_map(|a| a.args.iter().map(|s| &s.item))
    }
}

impl LeadingTrivia for TypeTree {
    fn leading(&self) -> &str {
        self.name.leading()
    }

    fn leading_mut(&mut self) -> &mut String {
        self.name.leading_mut()
    }
}

/// `extends A, B` / `implements C` / `throws E` / `permits P`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeList {
    pub keyword: Token,
    pub types: Vec<Separated<TypeTree>>,
}

impl TypeList {
    pub fn iter(&self) -> impl Iterator<Item = &TypeTree> {
        self.types.iter().map(|s| &s.item)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub modifiers: Vec<Modifier>,
    pub type_tree: TypeTree,
    pub varargs: Option<Token>,
    pub name: Token,
    pub dims: Vec<Token>,
}

impl LeadingTrivia for Param {
    fn leading(&self) -> &str {
        match self.modifiers.first() {
            Some(m) => m.leading(),
            None => self.type_tree.leading(),
        }
    }

    fn leading_mut(&mut self) -> &mut String {
        match self.modifiers.first_mut() {
            Some(m) => m.leading_mut(),
            None => self.type_tree.leading_mut(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamList {
    pub open: Token,
    pub params: Vec<Separated<Param>>,
    pub close: Token,
}

impl ParamList {
    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().map(|s| &s.item)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Receiver of a method invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// `foo()`
    Implicit,
    /// `this.foo()`
    This,
    /// `super.foo()`
    Super,
    /// `repo.foo()`
    Name(String),
    /// Anything else: `a.b.foo()`, `bar().foo()`, `new X().foo()`
    Expression,
}

/// `name(args)` found inside code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInvocation {
    pub receiver: Receiver,
    pub name: Token,
    pub open: Token,
    pub args: Vec<CodeElement>,
    pub close: Token,
}

impl MethodInvocation {
    /// Number of arguments, counting top-level commas.
    pub fn arg_count(&self) -> usize {
        if self.args.is_empty() {
            return 0;
        }
        let mut depth = 0usize;
        let mut commas = 0;
        let mut prev_ident_upper = false;
        for element in &self.args {
            if let CodeElement::Token(token) = element {
                match token.kind {
                    TokenKind::LeftParen | TokenKind::LeftBracket => depth += 1,
                    // Generic arguments such as `new HashMap<K, V>()`
                    TokenKind::Less if prev_ident_upper => depth += 1,
                    TokenKind::RightParen | TokenKind::RightBracket | TokenKind::Greater => {
                        depth = depth.saturating_sub(1)
                    }
                    TokenKind::Comma if depth == 0 => commas += 1,
                    _ => {}
                }
                prev_ident_upper = token.kind == TokenKind::Identifier
                    && token.text.starts_with(|c: char| c.is_uppercase());
            } else {
                prev_ident_upper = false;
            }
        }
        commas + 1
    }
}

/// Piece of a method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeElement {
    Token(Token),
    Block(Arc<Block>),
    Invocation(Arc<MethodInvocation>),
}

impl LeadingTrivia for CodeElement {
    fn leading(&self) -> &str {
        match self {
            CodeElement::Token(token) => &token.leading,
            CodeElement::Block(block) => &block.open.leading,
            CodeElement::Invocation(invocation) => &invocation.name.leading,
        }
    }

    fn leading_mut(&mut self) -> &mut String {
        match self {
            CodeElement::Token(token) => &mut token.leading,
            CodeElement::Block(block) => &mut Arc::make_mut(block).open.leading,
            CodeElement::Invocation(invocation) => &mut Arc::make_mut(invocation).name.leading,
        }
    }
}

/// `{ ... }` with its content as code elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub open: Token,
    pub elements: Vec<CodeElement>,
    pub close: Token,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarInit {
    pub eq: Token,
    pub value: Vec<CodeElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDeclarator {
    pub name: Token,
    pub dims: Vec<Token>,
    pub init: Option<VarInit>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub modifiers: Vec<Modifier>,
    pub type_tree: TypeTree,
    pub declarators: Vec<Separated<VarDeclarator>>,
    pub semicolon: Token,
}

impl FieldDecl {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.declarators.iter().map(|d| d.item.name.text.as_str())
    }
}

impl LeadingTrivia for FieldDecl {
    fn leading(&self) -> &str {
        match self.modifiers.first() {
            Some(m) => m.leading(),
            None => self.type_tree.leading(),
        }
    }

    fn leading_mut(&mut self) -> &mut String {
        match self.modifiers.first_mut() {
            Some(m) => m.leading_mut(),
            None => self.type_tree.leading_mut(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultValue {
    pub keyword: Token,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodBody {
    Block(Arc<Block>),
    /// Abstract or interface method: just `;`
    Semicolon(Token),
}

/// Method or constructor declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub modifiers: Vec<Modifier>,
    pub type_params: Option<TokenRun>,
    /// `None` for constructors
    pub return_type: Option<TypeTree>,
    pub name: Token,
    pub params: ParamList,
    pub dims: Vec<Token>,
    pub throws: Option<TypeList>,
    pub default_value: Option<DefaultValue>,
    pub body: MethodBody,
}

impl MethodDecl {
    pub fn is_constructor(&self) -> bool {
        self.return_type.is_none()
    }

    pub fn type_parameter_names(&self) -> Vec<String> {
        self.type_params
            .as_ref()
            .map(TokenRun::type_parameter_names)
            .unwrap_or_default()
    }

    /// Trivia of the first token after the modifier list.
    pub fn after_modifiers_leading(&self) -> &str {
        if let Some(type_params) = &self.type_params {
            return type_params.leading();
        }
        match &self.return_type {
            Some(return_type) => return_type.leading(),
            None => &self.name.leading,
        }
    }

    pub fn after_modifiers_leading_mut(&mut self) -> &mut String {
        if let Some(type_params) = &mut self.type_params {
            return type_params.leading_mut();
        }
        match &mut self.return_type {
            Some(return_type) => return_type.leading_mut(),
            None => &mut self.name.leading,
        }
    }
}

impl LeadingTrivia for MethodDecl {
    fn leading(&self) -> &str {
        match self.modifiers.first() {
            Some(m) => m.leading(),
            None => self.after_modifiers_leading(),
        }
    }

    fn leading_mut(&mut self) -> &mut String {
        if !self.modifiers.is_empty() {
            return self.modifiers[0].leading_mut();
        }
        self.after_modifiers_leading_mut()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initializer {
    pub static_kw: Option<Token>,
    pub body: Arc<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Method(Arc<MethodDecl>),
    Field(Arc<FieldDecl>),
    Class(Arc<ClassDecl>),
    Initializer(Arc<Initializer>),
    /// Enum constant list up to and including its terminating `;`
    EnumConstants(TokenRun),
    Empty(Token),
}

impl LeadingTrivia for Member {
    fn leading(&self) -> &str {
        match self {
            Member::Method(m) => m.leading(),
            Member::Field(f) => f.leading(),
            Member::Class(c) => c.leading(),
            Member::Initializer(i) => match &i.static_kw {
                Some(kw) => &kw.leading,
                None => &i.body.open.leading,
            },
            Member::EnumConstants(run) => run.leading(),
            Member::Empty(token) => &token.leading,
        }
    }

    fn leading_mut(&mut self) -> &mut String {
        match self {
            Member::Method(m) => Arc::make_mut(m).leading_mut(),
            Member::Field(f) => Arc::make_mut(f).leading_mut(),
            Member::Class(c) => Arc::make_mut(c).leading_mut(),
            Member::Initializer(i) => {
                let init = Arc::make_mut(i);
                match &mut init.static_kw {
                    Some(kw) => &mut kw.leading,
                    None => &mut Arc::make_mut(&mut init.body).open.leading,
                }
            }
            Member::EnumConstants(run) => run.leading_mut(),
            Member::Empty(token) => &mut token.leading,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassBody {
    pub open: Token,
    pub members: Vec<Member>,
    pub close: Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

/// Class, interface, enum, record or annotation type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub modifiers: Vec<Modifier>,
    pub kind: ClassKind,
    /// `class`, `interface`, `enum`, `record` or `@` `interface`
    pub kind_tokens: Vec<Token>,
    pub name: Token,
    pub type_params: Option<TokenRun>,
    pub record_header: Option<ParamList>,
    pub extends: Option<TypeList>,
    pub implements: Option<TypeList>,
    pub permits: Option<TypeList>,
    pub body: ClassBody,
}

impl ClassDecl {
    pub fn simple_name(&self) -> &str {
        &self.name.text
    }

    pub fn type_parameter_names(&self) -> Vec<String> {
        self.type_params
            .as_ref()
            .map(TokenRun::type_parameter_names)
            .unwrap_or_default()
    }

    pub fn methods(&self) -> impl Iterator<Item = &Arc<MethodDecl>> {
        self.body.members.iter().filter_map(|m| match m {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &Arc<FieldDecl>> {
        self.body.members.iter().filter_map(|m| match m {
            Member::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn nested_classes(&self) -> impl Iterator<Item = &Arc<ClassDecl>> {
        self.body.members.iter().filter_map(|m| match m {
            Member::Class(class) => Some(class),
            _ => None,
        })
    }

    /// Declared supertypes: `extends` first, then `implements`.
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeTree> {
        self.extends
            .iter()
            .chain(self.implements.iter())
            .flat_map(TypeList::iter)
    }

    pub fn after_modifiers_leading(&self) -> &str {
        match self.kind_tokens.first() {
            Some(token) => &token.leading,
            None => &self.name.leading,
        }
    }

    pub fn after_modifiers_leading_mut(&mut self) -> &mut String {
        match self.kind_tokens.first_mut() {
            Some(token) => &mut token.leading,
            None => &mut self.name.leading,
        }
    }
}

impl LeadingTrivia for ClassDecl {
    fn leading(&self) -> &str {
        match self.modifiers.first() {
            Some(m) => m.leading(),
            None => self.after_modifiers_leading(),
        }
    }

    fn leading_mut(&mut self) -> &mut String {
        if !self.modifiers.is_empty() {
            return self.modifiers[0].leading_mut();
        }
        self.after_modifiers_leading_mut()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDecl {
    pub annotations: Vec<Arc<Annotation>>,
    pub keyword: Token,
    pub name: QualifiedName,
    pub semicolon: Token,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub keyword: Token,
    pub static_kw: Option<Token>,
    pub name: QualifiedName,
    pub semicolon: Token,
}

impl Import {
    /// Synthesized `import a.b.C;` / `import static a.b.C.member;`
    pub fn new(name: &str, is_static: bool) -> Self {
        let mut qualified = QualifiedName::from_dotted(name);
        qualified.tokens[0].leading = " ".to_string();
        Self {
            keyword: Token::new(TokenKind::Keyword, "import"),
            static_kw: is_static.then(|| Token::new(TokenKind::Keyword, "static").with_leading(" ")),
            name: qualified,
            semicolon: Token::new(TokenKind::Semicolon, ";"),
        }
    }

    pub fn is_static(&self) -> bool {
        self.static_kw.is_some()
    }

    pub fn is_wildcard(&self) -> bool {
        self.name.is_wildcard()
    }

    /// Imported name, e.g. `java.util.List` or `java.util.*`.
    pub fn qualified_name(&self) -> String {
        self.name.text()
    }

    /// For `a.b.C` and `a.b.*` alike: the part before the last dot.
    pub fn container(&self) -> String {
        let text = self.name.text();
        match text.rfind('.') {
            Some(dot) => text[..dot].to_string(),
            None => String::new(),
        }
    }
}

impl LeadingTrivia for Import {
    fn leading(&self) -> &str {
        &self.keyword.leading
    }

    fn leading_mut(&mut self) -> &mut String {
        &mut self.keyword.leading
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDeclItem {
    Class(Arc<ClassDecl>),
    /// Stray `;` between type declarations
    Empty(Token),
}

impl LeadingTrivia for TypeDeclItem {
    fn leading(&self) -> &str {
        match self {
            TypeDeclItem::Class(class) => class.leading(),
            TypeDeclItem::Empty(token) => &token.leading,
        }
    }

    fn leading_mut(&mut self) -> &mut String {
        match self {
            TypeDeclItem::Class(class) => Arc::make_mut(class).leading_mut(),
            TypeDeclItem::Empty(token) => &mut token.leading,
        }
    }
}

/// Root of a Java source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub package: Option<PackageDecl>,
    pub imports: Vec<Arc<Import>>,
    pub types: Vec<TypeDeclItem>,
    pub eof: Token,
    /// Line breaks of the source are `\r\n`
    pub crlf: bool,
}

impl CompilationUnit {
    /// Package name, empty for the default package.
    pub fn package_name(&self) -> String {
        self.package
            .as_ref()
            .map(|p| p.name.text())
            .unwrap_or_default()
    }

    pub fn classes(&self) -> impl Iterator<Item = &Arc<ClassDecl>> {
        self.types.iter().filter_map(|t| match t {
            TypeDeclItem::Class(class) => Some(class),
            TypeDeclItem::Empty(_) => None,
        })
    }

    /// Trivia of the first element after the import section.
    pub fn body_leading_mut(&mut self) -> &mut String {
        match self.types.first_mut() {
            Some(item) => item.leading_mut(),
            None => &mut self.eof.leading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name_helpers() {
        let name = QualifiedName::from_dotted("javax.ws.rs.*");
        assert_eq!(name.text(), "javax.ws.rs.*");
        assert!(name.is_wildcard());
        assert_eq!(name.segments(), vec!["javax", "ws", "rs", "*"]);

        let mut list = QualifiedName::from_dotted("java.util.List");
        list.set_leading(" ");
        let set = list.replaced("java.util.Set");
        assert_eq!(set.leading(), " ");
        assert_eq!(set.simple_name(), "Set");
        assert_eq!(set.first_segment(), "java");
    }

    #[test]
    fn test_type_parameter_names() {
        let lexer = crate::parser::lexer::JavaLexer::new();
        let mut tokens = lexer
            .tokenize("<K extends Comparable<K>, V, @Ann W>")
            .unwrap();
        tokens.pop();
        assert_eq!(TokenRun::new(tokens).type_parameter_names(), vec!["K", "V", "W"]);
    }

    #[test]
    fn test_import_new() {
        let import = Import::new("org.example.Foo", false);
        assert_eq!(import.container(), "org.example");
        assert!(!import.is_static());
        let stat = Import::new("org.example.Foo.BAR", true);
        assert!(stat.is_static());
        assert_eq!(stat.container(), "org.example.Foo");
    }
}
