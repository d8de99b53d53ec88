//! Type, method and annotation patterns.
//!
//! Patterns use `*` for any run of characters within one name segment and
//! `..` for any number of segments (`org..Repository`, `getById(..)`).

use regex::Regex;
use thiserror::Error;

use super::{JavaVisitor, Visit, VisitContext, VisitResult};
use crate::parser::ast::{Annotation, Import, MethodDecl, MethodInvocation, Receiver, TypeTree};
use crate::types::{container_of, JavaType, TypeTable};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatcherError {
    #[error("invalid method pattern `{0}`: expected `Type name(args)`")]
    InvalidSignature(String),
    #[error("invalid type pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Glob over fully qualified type names.
#[derive(Debug, Clone)]
pub struct TypePattern {
    pattern: String,
    regex: Regex,
}

impl TypePattern {
    pub fn parse(pattern: &str) -> Result<Self, MatcherError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(MatcherError::InvalidPattern {
                pattern: pattern.to_string(),
                message: "empty pattern".to_string(),
            });
        }

        let mut source = String::from("^");
        let mut rest = pattern;
        while let Some(c) = rest.chars().next() {
            if let Some(tail) = rest.strip_prefix("..") {
                source.push_str(r"\.(?:.*\.)?");
                rest = tail;
            } else {
                if c == '*' {
                    source.push_str("[^.]*");
                } else {
                    source.push_str(&regex::escape(&c.to_string()));
                }
                rest = &rest[c.len_utf8()..];
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| MatcherError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// No globs: the pattern is a plain type name.
    pub fn is_literal(&self) -> bool {
        !self.pattern.contains('*') && !self.pattern.contains("..")
    }

    pub fn matches(&self, fqn: &str) -> bool {
        self.regex.is_match(fqn)
    }

    /// Whether some type directly inside `container` could match, for
    /// on-demand imports such as `javax.ws.rs.*`.
    pub fn could_match_in(&self, container: &str) -> bool {
        if self.is_literal() {
            container_of(&self.pattern) == container
        } else {
            self.matches(&format!("{}.Type", container))
        }
    }
}

#[derive(Debug, Clone)]
enum ArgumentsPattern {
    /// `(..)`
    Any,
    Exact(Vec<TypePattern>),
}

/// `declaring.Type methodName(arg.Type, ...)`
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    signature: String,
    declaring: TypePattern,
    name: TypePattern,
    arguments: ArgumentsPattern,
    match_overrides: bool,
}

impl MethodMatcher {
    pub fn parse(signature: &str) -> Result<Self, MatcherError> {
        let invalid = || MatcherError::InvalidSignature(signature.to_string());
        let trimmed = signature.trim();
        let (declaring, rest) = trimmed.split_once(char::is_whitespace).ok_or_else(invalid)?;
        let rest = rest.trim();
        let open = rest.find('(').ok_or_else(invalid)?;
        if !rest.ends_with(')') {
            return Err(invalid());
        }
        let name = rest[..open].trim();
        if name.is_empty() || name.contains('.') {
            return Err(invalid());
        }
        let args = rest[open + 1..rest.len() - 1].trim();
        let arguments = match args {
            ".." => ArgumentsPattern::Any,
            "" => ArgumentsPattern::Exact(Vec::new()),
            list => ArgumentsPattern::Exact(
                list.split(',')
                    .map(TypePattern::parse)
                    .collect::<Result<_, _>>()?,
            ),
        };

        Ok(Self {
            signature: trimmed.to_string(),
            declaring: TypePattern::parse(declaring)?,
            name: TypePattern::parse(name)?,
            arguments,
            match_overrides: false,
        })
    }

    /// Also match methods declared in subtypes of the declaring type.
    pub fn with_overrides(mut self, match_overrides: bool) -> Self {
        self.match_overrides = match_overrides;
        self
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.matches(name)
    }

    pub fn accepts_arity(&self, arity: usize) -> bool {
        match &self.arguments {
            ArgumentsPattern::Any => true,
            ArgumentsPattern::Exact(patterns) => patterns.len() == arity,
        }
    }

    pub fn matches_arguments(&self, types: &[JavaType]) -> bool {
        match &self.arguments {
            ArgumentsPattern::Any => true,
            ArgumentsPattern::Exact(patterns) => {
                patterns.len() == types.len()
                    && patterns
                        .iter()
                        .zip(types)
                        .all(|(pattern, ty)| pattern.matches(&ty.erasure()))
            }
        }
    }

    /// The method is declared in `owner`: does `owner` satisfy the declaring
    /// type pattern?
    pub fn matches_declaring(&self, owner: &str, types: &TypeTable) -> bool {
        self.declaring.matches(owner)
            || (self.match_overrides
                && types
                    .ancestors(owner)
                    .iter()
                    .any(|ancestor| self.declaring.matches(ancestor)))
    }

    /// Method declaration at the cursor (its class is the enclosing one).
    pub fn matches_declaration(&self, method: &MethodDecl, ctx: &VisitContext<'_>) -> bool {
        if method.is_constructor() || !self.matches_name(&method.name.text) {
            return false;
        }
        if !self.accepts_arity(method.params.iter().filter(|p| p.name.text != "this").count()) {
            return false;
        }
        let Some((_, owner)) = ctx.enclosing_class() else {
            return false;
        };
        if !self.matches_declaring(owner, ctx.types()) {
            return false;
        }
        let mut vars = ctx.type_variables();
        vars.extend(method.type_parameter_names());
        let params: Vec<JavaType> = method
            .params
            .iter()
            .filter(|p| p.name.text != "this")
            .map(|p| {
                let ty = ctx.resolver().resolve_type_tree(&p.type_tree, &vars);
                if p.varargs.is_some() {
                    JavaType::array_of(ty)
                } else {
                    ty
                }
            })
            .collect();
        self.matches_arguments(&params)
    }

    /// Invocation whose receiver type can be determined from the cursor:
    /// implicit or `this` receivers, `super`, and simple names of
    /// parameters, fields or types.
    pub fn matches_invocation(&self, invocation: &MethodInvocation, ctx: &VisitContext<'_>) -> bool {
        let name = invocation.name.text.as_str();
        let arity = invocation.arg_count();
        if !self.matches_name(name) || !self.accepts_arity(arity) {
            return false;
        }
        let Some(receiver_ty) = receiver_type(&invocation.receiver, ctx) else {
            return false;
        };
        let Some(receiver) = receiver_ty.fqn() else {
            return false;
        };
        let types = ctx.types();
        let Some((owner, method)) = types.find_method(receiver, name, arity) else {
            return false;
        };
        if !self.matches_declaring(&owner, types) {
            return false;
        }
        // Parameter types as seen from the receiver
        let params: Vec<JavaType> = match (
            types.get(&owner),
            types.as_supertype(&receiver_ty, &owner),
        ) {
            (Some(info), Some(view)) => {
                let bindings = info
                    .type_params
                    .iter()
                    .cloned()
                    .zip(view.type_arguments().iter().cloned())
                    .collect();
                method.params.iter().map(|p| p.substitute(&bindings)).collect()
            }
            _ => method.params.clone(),
        };
        self.matches_arguments(&params)
    }
}

fn receiver_type(receiver: &Receiver, ctx: &VisitContext<'_>) -> Option<JavaType> {
    match receiver {
        Receiver::Implicit | Receiver::This => ctx
            .enclosing_class()
            .map(|(_, fqn)| JavaType::class(fqn)),
        Receiver::Super => {
            let (_, fqn) = ctx.enclosing_class()?;
            ctx.types().get(fqn)?.supertypes.first().cloned()
        }
        Receiver::Name(name) => ctx.variable_type(name).or_else(|| {
            // Static call through a type name
            name.starts_with(|c: char| c.is_uppercase())
                .then(|| ctx.resolver().resolve_simple(name))
                .flatten()
                .map(JavaType::class)
        }),
        Receiver::Expression => None,
    }
}

/// `@fully.qualified.Annotation`
#[derive(Debug, Clone)]
pub struct AnnotationMatcher {
    pattern: TypePattern,
}

impl AnnotationMatcher {
    pub fn parse(signature: &str) -> Result<Self, MatcherError> {
        let name = signature.trim().trim_start_matches('@');
        Ok(Self {
            pattern: TypePattern::parse(name)?,
        })
    }

    pub fn matches(&self, annotation: &Annotation, ctx: &VisitContext<'_>) -> bool {
        ctx.annotation_type(annotation)
            .is_some_and(|fqn| self.pattern.matches(&fqn))
    }

    pub fn matches_fqn(&self, fqn: &str) -> bool {
        self.pattern.matches(fqn)
    }
}

/// Search visitor: records a finding for every import, annotation or type
/// reference matching a type pattern. Used as an applicability test.
#[derive(Debug, Clone)]
pub struct UsesType {
    pattern: TypePattern,
}

impl UsesType {
    pub fn new(pattern: &str) -> Result<Self, MatcherError> {
        Ok(Self {
            pattern: TypePattern::parse(pattern)?,
        })
    }

    fn found(&self, what: &str, offset: Option<usize>, ctx: &mut VisitContext<'_>) {
        ctx.add_finding(format!("uses {} ({})", self.pattern.as_str(), what), offset);
    }
}

impl JavaVisitor for UsesType {
    fn visit_import(&mut self, import: &Import, ctx: &mut VisitContext<'_>) -> VisitResult<Import> {
        let matched = if import.is_static() {
            self.pattern.matches(&import.container())
        } else if import.is_wildcard() {
            self.pattern.could_match_in(&import.container())
        } else {
            self.pattern.matches(&import.qualified_name())
        };
        if matched {
            self.found(&import.qualified_name(), import.keyword.offset, ctx);
        }
        Ok(Visit::Keep)
    }

    fn visit_annotation(&mut self, annotation: &Annotation, ctx: &mut VisitContext<'_>) -> VisitResult<Annotation> {
        if let Some(fqn) = ctx.annotation_type(annotation) {
            if self.pattern.matches(&fqn) {
                self.found(&fqn, annotation.at.offset, ctx);
            }
        }
        Ok(Visit::Keep)
    }

    fn visit_type_tree(&mut self, tree: &TypeTree, ctx: &mut VisitContext<'_>) -> VisitResult<TypeTree> {
        if let Some(fqn) = ctx.resolve_type(tree).fqn() {
            if self.pattern.matches(fqn) {
                let offset = tree.name.tokens.first().and_then(|t| t.offset);
                self.found(fqn, offset, ctx);
            }
        }
        Ok(Visit::Keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::JavaParser;
    use crate::visitor::walk_compilation_unit;
    use std::path::Path;
    use std::sync::Arc;

    #[test]
    fn test_type_patterns() {
        let exact = TypePattern::parse("javax.ws.rs.Path").unwrap();
        assert!(exact.matches("javax.ws.rs.Path"));
        assert!(!exact.matches("javax.ws.rs.PathParam"));
        assert!(exact.could_match_in("javax.ws.rs"));

        let star = TypePattern::parse("javax.ws.rs.*").unwrap();
        assert!(star.matches("javax.ws.rs.GET"));
        assert!(!star.matches("javax.ws.rs.core.MediaType"));
        assert!(star.could_match_in("javax.ws.rs"));
        assert!(!star.could_match_in("javax.ws.rs.core"));

        let deep = TypePattern::parse("javax..*").unwrap();
        assert!(deep.matches("javax.ws.rs.core.MediaType"));
        assert!(deep.matches("javax.Foo"));
    }

    #[test]
    fn test_method_pattern_parsing() {
        let matcher = MethodMatcher::parse("com.acme.Repo getById(java.lang.Long)").unwrap();
        assert!(matcher.matches_name("getById"));
        assert!(matcher.accepts_arity(1));
        assert!(!matcher.accepts_arity(2));
        assert!(matcher.matches_arguments(&[JavaType::class("java.lang.Long")]));
        assert!(!matcher.matches_arguments(&[JavaType::class("java.lang.String")]));

        let any = MethodMatcher::parse("com.acme.* find*(..)").unwrap();
        assert!(any.matches_name("findAll"));
        assert!(any.accepts_arity(3));

        assert!(MethodMatcher::parse("getById()").is_err());
        assert!(MethodMatcher::parse("a.B c").is_err());
    }

    fn uses(pattern: &str, source: &str) -> usize {
        let types = TypeTable::with_classpath().unwrap();
        let cu = Arc::new(JavaParser::new().parse_text(source).unwrap());
        let mut ctx = VisitContext::new(&types, &cu, Path::new("A.java"));
        let mut visitor = UsesType::new(pattern).unwrap();
        walk_compilation_unit(&mut visitor, &cu, &mut ctx).unwrap();
        ctx.finish().findings.len()
    }

    #[test]
    fn test_uses_type() {
        assert_eq!(uses("javax.ws.rs.*", "import javax.ws.rs.*;\n@Path(\"/\") class A {}"), 2);
        assert_eq!(uses("javax.ws.rs.*", "class A { javax.ws.rs.core.Response r; }"), 0);
        assert_eq!(uses("java.util.List", "import java.util.List;\nclass A { List<String> l; }"), 2);
    }
}
