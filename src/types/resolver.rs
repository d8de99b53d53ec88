//! Per-file name resolution.

use std::collections::{HashMap, HashSet};

use super::JavaType;
use crate::parser::ast::{ClassDecl, CompilationUnit, TypeArg, TypeTree};

/// Set of fully qualified type names that exist.
pub trait KnownTypes: Sync {
    fn contains_type(&self, fqn: &str) -> bool;
}

impl KnownTypes for HashSet<String> {
    fn contains_type(&self, fqn: &str) -> bool {
        self.contains(fqn)
    }
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Resolves simple and dotted type names the way `javac` scopes them in one
/// compilation unit: types declared in the file, single-type imports, the
/// file's own package, on-demand imports and finally `java.lang`.
///
/// Single-type imports are trusted even when the imported type is unknown;
/// every other lookup only succeeds for types in [`KnownTypes`].
pub struct TypeResolver<'a> {
    known: &'a dyn KnownTypes,
    package: String,
    local: HashMap<String, String>,
    single: HashMap<String, String>,
    on_demand: Vec<String>,
}

impl<'a> TypeResolver<'a> {
    pub fn for_compilation_unit(cu: &CompilationUnit, known: &'a dyn KnownTypes) -> Self {
        let package = cu.package_name();

        let mut local = HashMap::new();
        for class in cu.classes() {
            collect_local(class, &package, &mut local);
        }

        let mut single = HashMap::new();
        let mut on_demand = Vec::new();
        for import in cu.imports.iter().filter(|i| !i.is_static()) {
            if import.is_wildcard() {
                on_demand.push(import.container());
            } else {
                single
                    .entry(import.name.simple_name().to_string())
                    .or_insert_with(|| import.qualified_name());
            }
        }

        Self {
            known,
            package,
            local,
            single,
            on_demand,
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn is_known(&self, fqn: &str) -> bool {
        self.known.contains_type(fqn)
    }

    /// Resolves a simple name such as `List` or `PathParam`.
    pub fn resolve_simple(&self, name: &str) -> Option<String> {
        if let Some(fqn) = self.local.get(name).or_else(|| self.single.get(name)) {
            return Some(fqn.clone());
        }
        let same_package = qualify(&self.package, name);
        if self.is_known(&same_package) {
            return Some(same_package);
        }
        self.on_demand
            .iter()
            .map(|container| qualify(container, name))
            .find(|fqn| self.is_known(fqn))
            .or_else(|| {
                let lang = format!("java.lang.{}", name);
                self.is_known(&lang).then_some(lang)
            })
    }

    /// Resolves a possibly qualified name: `Map.Entry` through the import of
    /// `Map`, `javax.ws.rs.Path` as written.
    pub fn resolve_name(&self, name: &str) -> Option<String> {
        let Some((first, rest)) = name.split_once('.') else {
            return self.resolve_simple(name);
        };
        if let Some(outer) = self.resolve_simple(first) {
            return Some(format!("{}.{}", outer, rest));
        }
        if self.is_known(name) || first.starts_with(|c: char| c.is_lowercase()) {
            // Fully qualified
            return Some(name.to_string());
        }
        None
    }

    /// Attributes a type reference. `type_vars` are the type parameters in scope.
    pub fn resolve_type_tree(&self, tree: &TypeTree, type_vars: &[String]) -> JavaType {
        let text = tree.name.text();
        let mut resolved = if tree.name.is_primitive() {
            JavaType::Primitive { name: text }
        } else if !tree.name.is_qualified() && type_vars.contains(&text) {
            JavaType::TypeVariable { name: text }
        } else {
            match self.resolve_name(&text) {
                Some(fqn) => JavaType::Class {
                    fqn,
                    type_args: tree
                        .type_arguments()
                        .map(|arg| match arg {
                            TypeArg::Type(inner) => self.resolve_type_tree(inner, type_vars),
                            TypeArg::Wildcard { .. } => JavaType::Wildcard,
                        })
                        .collect(),
                },
                None => JavaType::Unknown { name: text },
            }
        };
        for _ in 0..tree.array_dimensions() {
            resolved = JavaType::array_of(resolved);
        }
        resolved
    }
}

fn collect_local(class: &ClassDecl, prefix: &str, out: &mut HashMap<String, String>) {
    let fqn = qualify(prefix, class.simple_name());
    for nested in class.nested_classes() {
        collect_local(nested, &fqn, out);
    }
    out.entry(class.simple_name().to_string()).or_insert(fqn);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::JavaParser;
    use pretty_assertions::assert_eq;

    fn known() -> HashSet<String> {
        [
            "java.lang.String",
            "java.lang.Long",
            "java.util.List",
            "java.util.Map",
            "javax.ws.rs.Path",
            "javax.ws.rs.GET",
            "com.acme.Person",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    #[test]
    fn test_resolution_order() {
        let cu = JavaParser::new()
            .parse_text(
                "package com.acme;\n\nimport java.util.List;\nimport javax.ws.rs.*;\nimport org.unknown.Thing;\n\nclass Resource { static class Inner {} }\n",
            )
            .unwrap();
        let known = known();
        let resolver = TypeResolver::for_compilation_unit(&cu, &known);

        assert_eq!(resolver.resolve_simple("List").as_deref(), Some("java.util.List"));
        assert_eq!(resolver.resolve_simple("Thing").as_deref(), Some("org.unknown.Thing"));
        assert_eq!(resolver.resolve_simple("Person").as_deref(), Some("com.acme.Person"));
        assert_eq!(resolver.resolve_simple("Path").as_deref(), Some("javax.ws.rs.Path"));
        assert_eq!(resolver.resolve_simple("String").as_deref(), Some("java.lang.String"));
        assert_eq!(resolver.resolve_simple("Inner").as_deref(), Some("com.acme.Resource.Inner"));
        assert_eq!(resolver.resolve_simple("Missing"), None);
    }

    #[test]
    fn test_qualified_names() {
        let cu = JavaParser::new()
            .parse_text("import java.util.Map;\nclass A {}\n")
            .unwrap();
        let known = known();
        let resolver = TypeResolver::for_compilation_unit(&cu, &known);
        assert_eq!(resolver.resolve_name("Map.Entry").as_deref(), Some("java.util.Map.Entry"));
        assert_eq!(
            resolver.resolve_name("org.springframework.data.repository.query.Param").as_deref(),
            Some("org.springframework.data.repository.query.Param")
        );
        assert_eq!(resolver.resolve_name("Unknown.Nested"), None);
    }

    #[test]
    fn test_resolve_type_tree() {
        let source = "import java.util.List;\nclass A<T> { List<T>[] f; long[] g; List<?> h; }\n";
        let cu = JavaParser::new().parse_text(source).unwrap();
        let known = known();
        let resolver = TypeResolver::for_compilation_unit(&cu, &known);
        let class = cu.classes().next().unwrap();
        let vars = class.type_parameter_names();
        let types: Vec<String> = class
            .fields()
            .map(|f| resolver.resolve_type_tree(&f.type_tree, &vars).to_string())
            .collect();
        assert_eq!(types, vec!["java.util.List<T>[]", "long[]", "java.util.List<?>"]);
    }
}
