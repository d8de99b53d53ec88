//! Custom `getById` methods on Spring Data JPA repositories.
//!
//! Spring Data 2.5 adds `JpaRepository.getById(ID)`. A repository that
//! already declared its own `getById` now overrides it by accident, so the
//! custom method is renamed to `get<Entity>ById`.

use tracing::debug;

use super::{ChangeMethodName, Recipe};
use crate::core::RecipeApplicationError;
use crate::parser::ast::{CompilationUnit, MethodDecl, MethodInvocation};
use crate::types::{simple_name_of, ClassInfo, JavaType, TypeOrigin, TypeTable};
use crate::visitor::{JavaVisitor, Visit, VisitContext, VisitResult};

const JPA_REPOSITORY: &str = "org.springframework.data.jpa.repository.JpaRepository";
const GET_BY_ID: &str = "getById";

/// Search recipe: marks `getById` declared in a type assignable to
/// `JpaRepository`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindCustomGetById;

impl FindCustomGetById {
    pub const NAME: &'static str = "find-custom-get-by-id";
}

impl Recipe for FindCustomGetById {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Find custom getById() methods on JpaRepositories"
    }

    fn description(&self) -> &str {
        "Mark getById() methods declared on repositories extending JpaRepository."
    }

    fn java_visitor(&self) -> Option<Box<dyn JavaVisitor>> {
        Some(Box::new(FindVisitor))
    }
}

struct FindVisitor;

impl JavaVisitor for FindVisitor {
    fn visit_method_decl(&mut self, method: &MethodDecl, ctx: &mut VisitContext<'_>) -> VisitResult<MethodDecl> {
        if method.name.text != GET_BY_ID {
            return Ok(Visit::Keep);
        }
        let in_repository = ctx
            .enclosing_class()
            .is_some_and(|(_, fqn)| ctx.types().is_assignable(fqn, JPA_REPOSITORY));
        if in_repository {
            ctx.add_finding(GET_BY_ID, method.name.offset);
        }
        Ok(Visit::Keep)
    }
}

/// Renames custom `Entity getById(Id)` on repositories of the run to
/// `getEntityById`: the declarations and every call whose receiver type
/// resolves to such a repository, in whichever file it appears.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameCustomGetById;

impl RenameCustomGetById {
    pub const NAME: &'static str = "rename-custom-get-by-id";
}

impl Recipe for RenameCustomGetById {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Rename custom getById() methods on JpaRepositories"
    }

    fn description(&self) -> &str {
        "Rename custom getById() methods of JpaRepositories to get<Entity>ById()."
    }

    fn applicable_test(&self) -> Option<Box<dyn JavaVisitor>> {
        Some(Box::new(MentionsGetById))
    }

    fn java_visitor(&self) -> Option<Box<dyn JavaVisitor>> {
        Some(Box::new(RenameVisitor))
    }
}

/// Entity and id type a repository passes to `JpaRepository`.
fn repository_types(types: &TypeTable, repository: &str) -> Option<(String, String)> {
    let arguments = types.supertype_arguments(repository, JPA_REPOSITORY)?;
    match arguments.as_slice() {
        [entity, id] => Some((entity.fqn()?.to_string(), id.fqn()?.to_string())),
        _ => None,
    }
}

/// `true` for `Entity getById(Id)`.
fn is_relevant(info: &ClassInfo, entity: &str, id: &str) -> bool {
    info.methods_named(GET_BY_ID)
        .any(|m| m.return_type.fqn() == Some(entity) && m.params.as_slice() == [JavaType::class(id)])
}

/// `(pattern, new name)` for every repository of the run declaring a custom
/// `getById`. Repositories from classpath directories are left alone since
/// their declarations are not rewritten.
fn custom_get_by_id_renames(types: &TypeTable) -> Vec<(String, String)> {
    let mut renames: Vec<(String, String)> = types
        .classes()
        .filter(|info| info.origin == TypeOrigin::Source && types.is_assignable(&info.fqn, JPA_REPOSITORY))
        .filter_map(|info| {
            let Some((entity, id)) = repository_types(types, &info.fqn) else {
                debug!("Cannot tell entity and id types of {}", info.fqn);
                return None;
            };
            is_relevant(info, &entity, &id).then(|| {
                (
                    format!("{} {}({})", info.fqn, GET_BY_ID, id),
                    format!("get{}ById", simple_name_of(&entity)),
                )
            })
        })
        .collect();
    renames.sort();
    renames
}

/// Applicable wherever `getById` is declared or called.
struct MentionsGetById;

impl JavaVisitor for MentionsGetById {
    fn visit_method_decl(&mut self, method: &MethodDecl, ctx: &mut VisitContext<'_>) -> VisitResult<MethodDecl> {
        if method.name.text == GET_BY_ID {
            ctx.add_finding(GET_BY_ID, method.name.offset);
        }
        Ok(Visit::Keep)
    }

    fn visit_method_invocation(
        &mut self,
        invocation: &MethodInvocation,
        ctx: &mut VisitContext<'_>,
    ) -> VisitResult<MethodInvocation> {
        if invocation.name.text == GET_BY_ID {
            ctx.add_finding(GET_BY_ID, invocation.name.offset);
        }
        Ok(Visit::Keep)
    }
}

struct RenameVisitor;

impl JavaVisitor for RenameVisitor {
    fn visit_compilation_unit(
        &mut self,
        _cu: &CompilationUnit,
        ctx: &mut VisitContext<'_>,
    ) -> VisitResult<CompilationUnit> {
        for (pattern, new_name) in custom_get_by_id_renames(ctx.types()) {
            let rename = ChangeMethodName::new(&pattern, &new_name, true)
                .map_err(|e| RecipeApplicationError::new(e.to_string()))?;
            debug!("Renaming {} to {} in {}", pattern, new_name, ctx.path().display());
            ctx.do_after_visit(rename.visitor());
        }
        Ok(Visit::Keep)
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

    const PERSON: &str = "package com.acme;\n\npublic class Person {}\n";

    fn table(sources: &[&str]) -> TypeTable {
        table_with_library(sources, &[])
    }

    fn table_with_library(sources: &[&str], library: &[&str]) -> TypeTable {
        let parser = JavaParser::new();
        let mut builder = TypeTableBuilder::new().with_classpath().unwrap();
        for source in library {
            builder.add_library(Arc::new(parser.parse_text(source).unwrap()));
        }
        for source in sources {
            builder.add_source(Arc::new(parser.parse_text(source).unwrap()));
        }
        builder.build().0
    }

    /// Runs the rename and its scheduled visitors like the runner does.
    fn rename(types: &TypeTable, source: &str) -> String {
        let mut cu = Arc::new(JavaParser::new().parse_text(source).unwrap());
        let path = Path::new("Repo.java");
        let mut ctx = VisitContext::new(types, &cu, path);
        cu = walk_compilation_unit(&mut RenameVisitor, &cu, &mut ctx).unwrap();
        for mut visitor in ctx.finish().after_visits {
            let mut ctx = VisitContext::new(types, &cu, path);
            cu = walk_compilation_unit(visitor.as_mut(), &cu, &mut ctx).unwrap();
        }
        printer::print(&cu).unwrap()
    }

    #[test]
    fn test_find_marks_repository_methods_only() {
        let repo = "package com.acme;\n\nimport org.springframework.data.jpa.repository.JpaRepository;\n\ninterface PersonRepository extends JpaRepository<Person, Long> {\n    Person getById(Long id);\n}\n";
        let other = "package com.acme;\n\nclass Lookup {\n    Person getById(Long id) { return null; }\n}\n";
        let types = table(&[PERSON, repo, other]);
        for (source, expected) in [(repo, 1), (other, 0)] {
            let cu = Arc::new(JavaParser::new().parse_text(source).unwrap());
            let mut ctx = VisitContext::new(&types, &cu, Path::new("A.java"));
            walk_compilation_unit(&mut FindVisitor, &cu, &mut ctx).unwrap();
            assert_eq!(ctx.finish().findings.len(), expected);
        }
    }

    #[test]
    fn test_rename_through_intermediate_interface() {
        let base = "package com.acme;\n\nimport org.springframework.data.jpa.repository.JpaRepository;\n\ninterface BaseRepository<T> extends JpaRepository<T, Long> {}\n";
        let repo = "package com.acme;\n\ninterface PersonRepository extends BaseRepository<Person> {\n    Person getById(Long id);\n\n    default Person load(Long id) {\n        return getById(id);\n    }\n}\n";
        let types = table(&[PERSON, base, repo]);
        assert_eq!(rename(&types, repo), repo.replace("getById", "getPersonById"));
    }

    #[test]
    fn test_other_signature_untouched() {
        let repo = "package com.acme;\n\nimport org.springframework.data.jpa.repository.JpaRepository;\n\ninterface PersonRepository extends JpaRepository<Person, Long> {\n    Person getById(String code);\n}\n";
        let types = table(&[PERSON, repo]);
        assert_eq!(rename(&types, repo), repo);
    }

    #[test]
    fn test_callers_in_other_files_are_renamed() {
        let repo = "package com.acme;\n\nimport org.springframework.data.jpa.repository.JpaRepository;\n\ninterface PersonRepository extends JpaRepository<Person, Long> {\n    Person getById(Long id);\n}\n";
        let service = "package com.acme;\n\nclass PersonService {\n    private PersonRepository repository;\n\n    Person load(Long id) {\n        return repository.getById(id);\n    }\n}\n";
        let types = table(&[PERSON, repo, service]);
        assert_eq!(rename(&types, service), service.replace("getById", "getPersonById"));
    }

    #[test]
    fn test_library_repositories_are_not_renamed() {
        let repo = "package com.acme;\n\nimport org.springframework.data.jpa.repository.JpaRepository;\n\ninterface PersonRepository extends JpaRepository<Person, Long> {\n    Person getById(Long id);\n}\n";
        let service = "package com.acme;\n\nclass PersonService {\n    Person load(PersonRepository repository, Long id) {\n        return repository.getById(id);\n    }\n}\n";
        let types = table_with_library(&[service], &[PERSON, repo]);
        assert!(custom_get_by_id_renames(&types).is_empty());
        assert_eq!(rename(&types, service), service);
    }
}
