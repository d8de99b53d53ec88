//! Renames methods matching a signature pattern.

use super::Recipe;
use crate::parser::ast::{MethodDecl, MethodInvocation};
use crate::parser::lexer::is_valid_identifier;
use crate::visitor::{JavaVisitor, MatcherError, MethodMatcher, Visit, VisitContext, VisitResult};

#[derive(Debug, Clone)]
pub struct ChangeMethodName {
    matcher: MethodMatcher,
    new_name: String,
}

impl ChangeMethodName {
    /// `pattern` is a method pattern such as `com.acme.Repo getById(java.lang.Long)`;
    /// with `match_overrides` methods declared in subtypes match too.
    pub fn new(pattern: &str, new_name: &str, match_overrides: bool) -> Result<Self, MatcherError> {
        if !is_valid_identifier(new_name) {
            return Err(MatcherError::InvalidSignature(format!(
                "`{}` is not a valid method name",
                new_name
            )));
        }
        Ok(Self {
            matcher: MethodMatcher::parse(pattern)?.with_overrides(match_overrides),
            new_name: new_name.to_string(),
        })
    }

    /// Visitor for use in [`VisitContext::do_after_visit`].
    pub fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(ChangeMethodNameVisitor {
            matcher: self.matcher.clone(),
            new_name: self.new_name.clone(),
        })
    }
}

impl Recipe for ChangeMethodName {
    fn name(&self) -> &str {
        "change-method-name"
    }

    fn display_name(&self) -> &str {
        "Change method name"
    }

    fn description(&self) -> &str {
        "Rename a method: its declarations and the invocations whose receiver type can be determined."
    }

    fn java_visitor(&self) -> Option<Box<dyn JavaVisitor>> {
        Some(self.visitor())
    }
}

struct ChangeMethodNameVisitor {
    matcher: MethodMatcher,
    new_name: String,
}

impl JavaVisitor for ChangeMethodNameVisitor {
    fn visit_method_decl(&mut self, method: &MethodDecl, ctx: &mut VisitContext<'_>) -> VisitResult<MethodDecl> {
        if method.name.text == self.new_name || !self.matcher.matches_declaration(method, ctx) {
            return Ok(Visit::Keep);
        }
        let mut updated = method.clone();
        updated.name = method.name.renamed(&self.new_name);
        Ok(Visit::Replace(updated))
    }

    fn visit_method_invocation(
        &mut self,
        invocation: &MethodInvocation,
        ctx: &mut VisitContext<'_>,
    ) -> VisitResult<MethodInvocation> {
        if invocation.name.text == self.new_name || !self.matcher.matches_invocation(invocation, ctx) {
            return Ok(Visit::Keep);
        }
        let mut updated = invocation.clone();
        updated.name = invocation.name.renamed(&self.new_name);
        Ok(Visit::Replace(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{printer, JavaParser};
    use crate::types::TypeTableBuilder;
    use crate::visitor::walk_compilation_unit;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::sync::Arc;

    const REPO: &str = "package com.acme;\n\nimport org.springframework.data.jpa.repository.JpaRepository;\n\npublic interface PersonRepository extends JpaRepository<Person, Long> {\n    Person getById(Long id);\n}\n";
    const PERSON: &str = "package com.acme;\n\npublic class Person {}\n";
    const SERVICE: &str = "package com.acme;\n\nclass PersonService {\n    private PersonRepository repo;\n\n    Person find(Long id) {\n        return repo.getById(id);\n    }\n\n    Person other(Long id) {\n        return lookup().getById(id);\n    }\n}\n";

    fn run(recipe: &ChangeMethodName, source: &str) -> String {
        let parser = JavaParser::new();
        let mut builder = TypeTableBuilder::new().with_classpath().unwrap();
        for unit in [REPO, PERSON, SERVICE] {
            builder.add_source(Arc::new(parser.parse_text(unit).unwrap()));
        }
        let (types, _) = builder.build();
        let cu = Arc::new(parser.parse_text(source).unwrap());
        let mut ctx = VisitContext::new(&types, &cu, Path::new("X.java"));
        let out = walk_compilation_unit(recipe.java_visitor().unwrap().as_mut(), &cu, &mut ctx).unwrap();
        printer::print(&out).unwrap()
    }

    #[test]
    fn test_renames_declaration_and_typed_invocations() {
        let recipe = ChangeMethodName::new("com.acme.PersonRepository getById(java.lang.Long)", "getPersonById", false).unwrap();
        assert_eq!(run(&recipe, REPO), REPO.replace("getById", "getPersonById"));
        // Calls on an expression of unknown type stay as they are
        assert_eq!(
            run(&recipe, SERVICE),
            SERVICE.replacen("repo.getById", "repo.getPersonById", 1)
        );
    }

    #[test]
    fn test_overrides_need_opt_in() {
        let exact = ChangeMethodName::new("org.springframework.data.jpa.repository.JpaRepository getById(..)", "x", false).unwrap();
        assert_eq!(run(&exact, REPO), REPO);

        let overrides = ChangeMethodName::new("org.springframework.data.jpa.repository.JpaRepository getById(..)", "x", true).unwrap();
        assert_eq!(run(&overrides, REPO), REPO.replace("getById", "x"));
    }

    #[test]
    fn test_argument_types_must_match() {
        let recipe = ChangeMethodName::new("com.acme.PersonRepository getById(java.lang.String)", "getPersonById", true).unwrap();
        assert_eq!(run(&recipe, REPO), REPO);
        assert_eq!(run(&recipe, SERVICE), SERVICE);
    }

    #[test]
    fn test_invalid_new_name() {
        assert!(ChangeMethodName::new("a.B c()", "not valid", false).is_err());
    }
}
