//! Applying [`ImportEdits`] once a visit is over.
//!
//! Edits are conditional: an import is added only when the rewritten file
//! references the type, and removed only when nothing references it anymore.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::{walk_compilation_unit, ImportEdits, JavaVisitor, Visit, VisitContext, VisitResult};
use crate::core::RecipeApplicationError;
use crate::parser::ast::{Annotation, CompilationUnit, Import, MethodInvocation, Receiver, TypeTree};
use crate::parser::{format, Token, TokenKind};
use crate::types::{container_of, simple_name_of, TypeResolver, TypeTable};

/// Names a compilation unit refers to outside its import section.
#[derive(Debug, Default)]
pub struct References {
    /// First segments of type references and annotation names
    pub type_names: HashSet<String>,
    /// Identifiers in code and annotation arguments
    pub identifiers: HashSet<String>,
}

impl References {
    pub fn collect(
        cu: &Arc<CompilationUnit>,
        types: &TypeTable,
        path: &Path,
    ) -> Result<Self, RecipeApplicationError> {
        let mut ctx = VisitContext::new(types, cu, path);
        let mut collector = Collector::default();
        walk_compilation_unit(&mut collector, cu, &mut ctx)?;
        Ok(collector.0)
    }

    /// A simple name used as a type. Code identifiers count when they look
    /// like type names (`Foo.bar()`, `new Foo()`).
    pub fn uses_type(&self, simple_name: &str) -> bool {
        self.type_names.contains(simple_name)
            || (looks_like_type(simple_name) && self.identifiers.contains(simple_name))
    }

    pub fn uses_identifier(&self, name: &str) -> bool {
        self.identifiers.contains(name)
    }

    /// Every name that could denote a type.
    fn type_candidates(&self) -> impl Iterator<Item = &String> {
        self.type_names
            .iter()
            .chain(self.identifiers.iter().filter(|name| looks_like_type(name)))
    }
}

fn looks_like_type(name: &str) -> bool {
    name.starts_with(|c: char| c.is_uppercase()) && name.chars().any(|c| c.is_lowercase())
}

#[derive(Default)]
struct Collector(References);

impl Collector {
    fn tokens<'t>(&mut self, tokens: impl Iterator<Item = &'t Token>) {
        for token in tokens {
            if token.kind == TokenKind::Identifier {
                self.0.identifiers.insert(token.text.clone());
            }
        }
    }
}

impl JavaVisitor for Collector {
    fn visit_annotation(&mut self, annotation: &Annotation, _ctx: &mut VisitContext<'_>) -> VisitResult<Annotation> {
        self.0
            .type_names
            .insert(annotation.name.first_segment().to_string());
        self.tokens(annotation.arguments().flat_map(|arg| arg.value().tokens.iter()));
        Ok(Visit::Keep)
    }

    fn visit_type_tree(&mut self, tree: &TypeTree, ctx: &mut VisitContext<'_>) -> VisitResult<TypeTree> {
        let first = tree.name.first_segment();
        let type_variable = !tree.name.is_qualified() && ctx.type_variables().iter().any(|v| v == first);
        if !tree.name.is_primitive() && !type_variable {
            self.0.type_names.insert(first.to_string());
        }
        Ok(Visit::Keep)
    }

    fn visit_method_invocation(
        &mut self,
        invocation: &MethodInvocation,
        _ctx: &mut VisitContext<'_>,
    ) -> VisitResult<MethodInvocation> {
        // Statically imported methods are called without a receiver
        if invocation.receiver == Receiver::Implicit {
            self.0.identifiers.insert(invocation.name.text.clone());
        }
        Ok(Visit::Keep)
    }

    fn visit_identifier(&mut self, identifier: &Token, _ctx: &mut VisitContext<'_>) -> VisitResult<Token> {
        self.0.identifiers.insert(identifier.text.clone());
        Ok(Visit::Keep)
    }
}

/// Applies import edits to a unit: removals first, then additions.
/// Returns the same `Arc` when no import changed.
pub fn apply_import_edits(
    cu: &Arc<CompilationUnit>,
    edits: &ImportEdits,
    types: &TypeTable,
    path: &Path,
) -> Result<Arc<CompilationUnit>, RecipeApplicationError> {
    if edits.is_empty() {
        return Ok(cu.clone());
    }
    let references = References::collect(cu, types, path)?;
    let resolver = TypeResolver::for_compilation_unit(cu, types);
    let incoming: HashSet<&str> = edits.add.iter().map(|fqn| simple_name_of(fqn)).collect();
    let package = cu.package_name();
    let mut next: Option<CompilationUnit> = None;

    for fqn in &edits.remove {
        let unit = next.as_ref().unwrap_or(cu.as_ref());
        let doomed: Vec<usize> = unit
            .imports
            .iter()
            .enumerate()
            .filter(|(_, import)| is_unused_import(import, fqn, &references, &resolver, &incoming))
            .map(|(i, _)| i)
            .collect();
        if doomed.is_empty() {
            continue;
        }
        let unit = next.get_or_insert_with(|| (**cu).clone());
        for &index in doomed.iter().rev() {
            let removed = format::remove_import(unit, index);
            debug!("Removed import {} from {}", removed.qualified_name(), path.display());
        }
    }

    for fqn in &edits.add {
        let unit = next.as_ref().unwrap_or(cu.as_ref());
        if !needs_import(unit, &package, fqn, &references) {
            continue;
        }
        let unit = next.get_or_insert_with(|| (**cu).clone());
        format::add_import(unit, Import::new(fqn, false));
        debug!("Added import {} to {}", fqn, path.display());
    }

    for member in &edits.add_static {
        let unit = next.as_ref().unwrap_or(cu.as_ref());
        if !needs_static_import(unit, member, &references) {
            continue;
        }
        let unit = next.get_or_insert_with(|| (**cu).clone());
        format::add_import(unit, Import::new(member, true));
        debug!("Added static import {} to {}", member, path.display());
    }

    Ok(next.map(Arc::new).unwrap_or_else(|| cu.clone()))
}

fn is_unused_import(
    import: &Import,
    fqn: &str,
    references: &References,
    resolver: &TypeResolver<'_>,
    incoming: &HashSet<&str>,
) -> bool {
    if import.is_static() {
        // `import static a.B.member;` goes with type `a.B` when `member` is unused
        return import.container() == fqn
            && (import.is_wildcard() || !references.uses_identifier(import.name.simple_name()));
    }
    if import.is_wildcard() {
        let container = import.container();
        if container != container_of(fqn) {
            return false;
        }
        // Still needed while a referenced type lives in the package or cannot
        // be placed anywhere else
        return !references.type_candidates().any(|name| {
            if incoming.contains(name.as_str()) {
                return false;
            }
            match resolver.resolve_simple(name) {
                Some(resolved) => container_of(&resolved) == container,
                None => true,
            }
        });
    }
    import.qualified_name() == fqn && !references.uses_type(simple_name_of(fqn))
}

fn needs_import(unit: &CompilationUnit, package: &str, fqn: &str, references: &References) -> bool {
    let simple = simple_name_of(fqn);
    let container = container_of(fqn);
    if !references.uses_type(simple) || container == "java.lang" || container == package {
        return false;
    }
    !unit.imports.iter().filter(|i| !i.is_static()).any(|import| {
        let name = import.qualified_name();
        name == fqn
            || (import.is_wildcard() && import.container() == container)
            // Another type with the same simple name is imported already
            || (!import.is_wildcard() && import.name.simple_name() == simple)
    })
}

fn needs_static_import(unit: &CompilationUnit, member_fqn: &str, references: &References) -> bool {
    let member = simple_name_of(member_fqn);
    let container = container_of(member_fqn);
    references.uses_identifier(member)
        && !unit.imports.iter().filter(|i| i.is_static()).any(|import| {
            import.qualified_name() == member_fqn
                || (import.is_wildcard() && import.container() == container)
                || import.name.simple_name() == member
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{printer, JavaParser};
    use pretty_assertions::assert_eq;

    fn apply(source: &str, edits: ImportEdits) -> String {
        let types = TypeTable::with_classpath().unwrap();
        let cu = Arc::new(JavaParser::new().parse_text(source).unwrap());
        let out = apply_import_edits(&cu, &edits, &types, Path::new("A.java")).unwrap();
        printer::print(&out).unwrap()
    }

    #[test]
    fn test_add_only_when_referenced() {
        let source = "package a;\n\nimport java.util.List;\n\n@RequestMapping(\"/x\")\nclass A {}\n";
        let edits = ImportEdits {
            add: vec![
                "org.springframework.web.bind.annotation.RequestMapping".to_string(),
                "org.springframework.web.bind.annotation.GetMapping".to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(
            apply(source, edits),
            "package a;\n\nimport java.util.List;\nimport org.springframework.web.bind.annotation.RequestMapping;\n\n@RequestMapping(\"/x\")\nclass A {}\n"
        );
    }

    #[test]
    fn test_remove_unused_explicit_and_wildcard() {
        let source = "package a;\n\nimport javax.ws.rs.Path;\nimport javax.ws.rs.core.*;\nimport java.util.List;\n\nclass A { List<String> l; }\n";
        let edits = ImportEdits {
            remove: vec!["javax.ws.rs.Path".to_string(), "javax.ws.rs.core.MediaType".to_string()],
            ..Default::default()
        };
        assert_eq!(
            apply(source, edits),
            "package a;\n\nimport java.util.List;\n\nclass A { List<String> l; }\n"
        );
    }

    #[test]
    fn test_wildcard_kept_while_package_is_used() {
        let source = "import javax.ws.rs.*;\n\n@Produces(\"x\")\nclass A {}\n";
        let edits = ImportEdits {
            remove: vec!["javax.ws.rs.Path".to_string()],
            ..Default::default()
        };
        assert_eq!(apply(source, edits), source);
    }

    #[test]
    fn test_wildcard_kept_for_types_outside_the_table() {
        let source = "import javax.ws.rs.*;\n\nclass A<T> {\n    T value;\n    void f() { throw new BadRequestException(); }\n}\n";
        let edits = ImportEdits {
            remove: vec!["javax.ws.rs.GET".to_string()],
            ..Default::default()
        };
        assert_eq!(apply(source, edits), source);
    }

    #[test]
    fn test_wildcard_dropped_when_every_type_resolves_elsewhere() {
        let source = "package a;\n\nimport javax.ws.rs.*;\nimport java.util.List;\n\n@RequestMapping\nclass A<T> {\n    List<T> values;\n    String name;\n}\n";
        let edits = ImportEdits {
            remove: vec!["javax.ws.rs.Path".to_string()],
            add: vec!["org.springframework.web.bind.annotation.RequestMapping".to_string()],
            ..Default::default()
        };
        assert_eq!(
            apply(source, edits),
            "package a;\n\nimport java.util.List;\nimport org.springframework.web.bind.annotation.RequestMapping;\n\n@RequestMapping\nclass A<T> {\n    List<T> values;\n    String name;\n}\n"
        );
    }

    #[test]
    fn test_static_import_for_used_member() {
        let source = "import org.springframework.web.bind.annotation.RequestMapping;\n\n@RequestMapping(method = {POST, PUT})\nclass A {}\n";
        let edits = ImportEdits {
            add_static: vec![
                "org.springframework.web.bind.annotation.RequestMethod.POST".to_string(),
                "org.springframework.web.bind.annotation.RequestMethod.PUT".to_string(),
                "org.springframework.web.bind.annotation.RequestMethod.GET".to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(
            apply(source, edits),
            "import org.springframework.web.bind.annotation.RequestMapping;\n\nimport static org.springframework.web.bind.annotation.RequestMethod.POST;\nimport static org.springframework.web.bind.annotation.RequestMethod.PUT;\n\n@RequestMapping(method = {POST, PUT})\nclass A {}\n"
        );
    }

    #[test]
    fn test_conflicting_simple_name_is_not_imported() {
        let source = "import com.acme.Path;\n\nclass A { Path p; }\n";
        let edits = ImportEdits {
            add: vec!["javax.ws.rs.Path".to_string()],
            ..Default::default()
        };
        assert_eq!(apply(source, edits), source);
    }
}
