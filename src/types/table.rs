//! Type table: declared types and the subtype graph.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use tracing::debug;

use super::classpath;
use super::resolver::{KnownTypes, TypeResolver};
use super::{ClassInfo, JavaType, MethodSig, TypeOrigin};
use crate::core::{ParseError, TypeResolutionError};
use crate::parser::ast::{self, ClassDecl, ClassKind, CompilationUnit};

/// Every type known to a run.
///
/// Edges of the inheritance graph point from a supertype to its direct
/// subtypes, so "is `A` a subtype of `B`" is a path query from `B` to `A`.
#[derive(Debug, Default)]
pub struct TypeTable {
    classes: HashMap<String, Arc<ClassInfo>>,
    inheritance_graph: DiGraph<String, ()>,
    inheritance_node_map: HashMap<String, NodeIndex>,
}

impl KnownTypes for TypeTable {
    fn contains_type(&self, fqn: &str) -> bool {
        self.classes.contains_key(fqn)
    }
}

impl TypeTable {
    /// Table with the bundled library stubs only.
    pub fn with_classpath() -> Result<Self, ParseError> {
        let (table, _) = TypeTableBuilder::new().with_classpath()?.build();
        Ok(table)
    }

    pub fn get(&self, fqn: &str) -> Option<&Arc<ClassInfo>> {
        self.classes.get(fqn)
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.classes.contains_key(fqn)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> impl Iterator<Item = &Arc<ClassInfo>> {
        self.classes.values()
    }

    /// `true` if a value of type `from` can be assigned to `to`.
    pub fn is_assignable(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        match (
            self.inheritance_node_map.get(from),
            self.inheritance_node_map.get(to),
        ) {
            (Some(&from_node), Some(&to_node)) => {
                petgraph::algo::has_path_connecting(&self.inheritance_graph, to_node, from_node, None)
            }
            _ => false,
        }
    }

    /// All supertypes of `fqn`, nearest first.
    pub fn ancestors(&self, fqn: &str) -> Vec<String> {
        let Some(&start) = self.inheritance_node_map.get(fqn) else {
            return Vec::new();
        };
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut out = Vec::new();
        while let Some(node) = queue.pop_front() {
            for parent in self
                .inheritance_graph
                .neighbors_directed(node, Direction::Incoming)
            {
                if seen.insert(parent) {
                    out.push(self.inheritance_graph[parent].clone());
                    queue.push_back(parent);
                }
            }
        }
        out
    }

    /// `ty` viewed as its supertype `target`, type arguments substituted
    /// along the way: `PersonRepository` as `CrudRepository` is
    /// `CrudRepository<Person, Long>`.
    pub fn as_supertype(&self, ty: &JavaType, target: &str) -> Option<JavaType> {
        self.find_supertype(ty, target, &mut HashSet::new())
    }

    /// Type arguments `fqn` passes to its supertype `target`.
    pub fn supertype_arguments(&self, fqn: &str, target: &str) -> Option<Vec<JavaType>> {
        self.as_supertype(&JavaType::class(fqn), target)
            .map(|t| t.type_arguments().to_vec())
    }

    fn find_supertype(
        &self,
        ty: &JavaType,
        target: &str,
        visited: &mut HashSet<String>,
    ) -> Option<JavaType> {
        let fqn = ty.fqn()?;
        if fqn == target {
            return Some(ty.clone());
        }
        if !visited.insert(fqn.to_string()) {
            return None;
        }
        let info = self.get(fqn)?;
        let bindings: HashMap<String, JavaType> = info
            .type_params
            .iter()
            .cloned()
            .zip(ty.type_arguments().iter().cloned())
            .collect();
        info.supertypes
            .iter()
            .find_map(|sup| self.find_supertype(&sup.substitute(&bindings), target, visited))
    }

    /// `true` if the annotation type `annotation_fqn` is itself annotated
    /// with `meta_fqn` (`@GET` carries `@HttpMethod`).
    pub fn is_meta_annotated(&self, annotation_fqn: &str, meta_fqn: &str) -> bool {
        self.get(annotation_fqn)
            .is_some_and(|info| info.is_annotated_with(meta_fqn))
    }

    /// Looks a method up on `fqn` and its supertypes. Returns the declaring
    /// type with the signature.
    pub fn find_method(&self, fqn: &str, name: &str, arity: usize) -> Option<(String, &MethodSig)> {
        std::iter::once(fqn.to_string())
            .chain(self.ancestors(fqn))
            .find_map(|owner| {
                let info = self.get(&owner)?;
                let method = info
                    .methods
                    .iter()
                    .find(|m| m.name == name && m.params.len() == arity)?;
                Some((owner, method))
            })
    }

    fn node(&mut self, fqn: &str) -> NodeIndex {
        if let Some(&node) = self.inheritance_node_map.get(fqn) {
            return node;
        }
        let node = self.inheritance_graph.add_node(fqn.to_string());
        self.inheritance_node_map.insert(fqn.to_string(), node);
        node
    }
}

/// Collects compilation units and builds a [`TypeTable`] from them.
///
/// Later units win on duplicate names, so sources shadow the stubs.
#[derive(Default)]
pub struct TypeTableBuilder {
    units: Vec<(Arc<CompilationUnit>, TypeOrigin)>,
}

struct Declared<'u> {
    unit: usize,
    class: &'u ClassDecl,
    fqn: String,
    outer_type_params: Vec<String>,
    origin: TypeOrigin,
}

impl TypeTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the bundled library stubs.
    pub fn with_classpath(mut self) -> Result<Self, ParseError> {
        for unit in classpath::stub_units()? {
            self.units.push((unit, TypeOrigin::Classpath));
        }
        Ok(self)
    }

    pub fn add_source(&mut self, unit: Arc<CompilationUnit>) {
        self.units.push((unit, TypeOrigin::Source));
    }

    /// Adds a unit from a classpath directory.
    pub fn add_library(&mut self, unit: Arc<CompilationUnit>) {
        self.units.push((unit, TypeOrigin::Library));
    }

    /// Declares every type first, then resolves supertypes, methods and
    /// annotations against the complete set of names.
    pub fn build(self) -> (TypeTable, Vec<TypeResolutionError>) {
        let mut declared = Vec::new();
        for (index, (unit, origin)) in self.units.iter().enumerate() {
            let package = unit.package_name();
            for class in unit.classes() {
                declare(class, &package, &[], index, *origin, &mut declared);
            }
        }

        let known: HashSet<String> = declared.iter().map(|d| d.fqn.clone()).collect();
        let resolvers: Vec<TypeResolver<'_>> = self
            .units
            .iter()
            .map(|(unit, _)| TypeResolver::for_compilation_unit(unit, &known))
            .collect();

        let mut warnings = Vec::new();
        let mut table = TypeTable::default();
        for d in &declared {
            let info = describe(d, &resolvers[d.unit], &mut warnings);
            table.classes.insert(d.fqn.clone(), Arc::new(info));
        }

        let edges: Vec<(String, String)> = table
            .classes
            .values()
            .flat_map(|info| {
                info.supertypes
                    .iter()
                    .filter_map(JavaType::fqn)
                    .map(move |sup| (sup.to_string(), info.fqn.clone()))
            })
            .collect();
        let mut fqns: Vec<String> = table.classes.keys().cloned().collect();
        fqns.sort();
        for fqn in &fqns {
            table.node(fqn);
        }
        for (parent, child) in edges {
            let parent = table.node(&parent);
            let child = table.node(&child);
            table.inheritance_graph.update_edge(parent, child, ());
        }

        debug!(
            "Type table: {} types, {} inheritance edges, {} warnings",
            table.classes.len(),
            table.inheritance_graph.edge_count(),
            warnings.len()
        );
        (table, warnings)
    }
}

fn declare<'u>(
    class: &'u ClassDecl,
    prefix: &str,
    outer_type_params: &[String],
    unit: usize,
    origin: TypeOrigin,
    out: &mut Vec<Declared<'u>>,
) {
    let fqn = if prefix.is_empty() {
        class.simple_name().to_string()
    } else {
        format!("{}.{}", prefix, class.simple_name())
    };
    let mut inner = outer_type_params.to_vec();
    inner.extend(class.type_parameter_names());
    for nested in class.nested_classes() {
        declare(nested, &fqn, &inner, unit, origin, out);
    }
    out.push(Declared {
        unit,
        class,
        fqn,
        outer_type_params: outer_type_params.to_vec(),
        origin,
    });
}

fn implicit_supertype(class: &ClassDecl, fqn: &str) -> Option<JavaType> {
    match class.kind {
        ClassKind::Class if class.extends.is_none() && fqn != "java.lang.Object" => {
            Some(JavaType::class("java.lang.Object"))
        }
        ClassKind::Enum => Some(JavaType::generic(
            "java.lang.Enum",
            vec![JavaType::class(fqn)],
        )),
        ClassKind::Record => Some(JavaType::class("java.lang.Record")),
        ClassKind::Annotation => Some(JavaType::class("java.lang.annotation.Annotation")),
        _ => None,
    }
}

fn describe(
    d: &Declared<'_>,
    resolver: &TypeResolver<'_>,
    warnings: &mut Vec<TypeResolutionError>,
) -> ClassInfo {
    let own_params = d.class.type_parameter_names();
    let mut type_vars = d.outer_type_params.clone();
    type_vars.extend(own_params.iter().cloned());

    let mut supertypes: Vec<JavaType> = implicit_supertype(d.class, &d.fqn).into_iter().collect();
    for tree in d.class.supertypes() {
        let ty = resolver.resolve_type_tree(tree, &type_vars);
        if let JavaType::Unknown { name } = &ty {
            warnings.push(TypeResolutionError::new(
                name.clone(),
                format!("supertype of {}", d.fqn),
            ));
        }
        supertypes.push(ty);
    }

    let methods = d
        .class
        .methods()
        .filter(|m| !m.is_constructor())
        .map(|method| {
            let mut method_vars = type_vars.clone();
            method_vars.extend(method.type_parameter_names());
            let params = method
                .params
                .iter()
                .filter(|p| p.name.text != "this")
                .map(|p| {
                    let ty = resolver.resolve_type_tree(&p.type_tree, &method_vars);
                    if p.varargs.is_some() {
                        JavaType::array_of(ty)
                    } else {
                        ty
                    }
                })
                .collect();
            let return_type = method
                .return_type
                .as_ref()
                .map(|t| resolver.resolve_type_tree(t, &method_vars))
                .unwrap_or_else(|| JavaType::primitive("void"));
            MethodSig {
                name: method.name.text.clone(),
                type_params: method.type_parameter_names(),
                params,
                return_type,
            }
        })
        .collect();

    let annotations = ast::annotations(&d.class.modifiers)
        .filter_map(|a| resolver.resolve_name(&a.name.text()))
        .collect();

    ClassInfo {
        fqn: d.fqn.clone(),
        simple_name: d.class.simple_name().to_string(),
        package: resolver.package().to_string(),
        kind: d.class.kind,
        type_params: own_params,
        supertypes,
        methods,
        annotations,
        origin: d.origin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::JavaParser;
    use pretty_assertions::assert_eq;

    fn table_with(sources: &[&str]) -> (TypeTable, Vec<TypeResolutionError>) {
        let parser = JavaParser::new();
        let mut builder = TypeTableBuilder::new().with_classpath().unwrap();
        for source in sources {
            builder.add_source(Arc::new(parser.parse_text(source).unwrap()));
        }
        builder.build()
    }

    #[test]
    fn test_stub_hierarchy() {
        let table = TypeTable::with_classpath().unwrap();
        assert!(table.is_assignable("java.lang.Long", "java.lang.Number"));
        assert!(table.is_assignable("java.util.ArrayList", "java.lang.Iterable"));
        assert!(!table.is_assignable("java.lang.Number", "java.lang.Long"));
        assert!(table.is_meta_annotated("javax.ws.rs.GET", "javax.ws.rs.HttpMethod"));
        assert!(!table.is_meta_annotated("javax.ws.rs.Path", "javax.ws.rs.HttpMethod"));
    }

    #[test]
    fn test_repository_type_arguments() {
        let (table, warnings) = table_with(&[
            "package com.acme;\n\nimport org.springframework.data.jpa.repository.JpaRepository;\n\npublic interface PersonRepository extends JpaRepository<Person, Long> {}\n",
            "package com.acme;\n\npublic class Person {}\n",
        ]);
        assert!(warnings.is_empty());
        let repo = "com.acme.PersonRepository";
        assert!(table.is_assignable(repo, "org.springframework.data.repository.Repository"));
        assert_eq!(
            table.supertype_arguments(repo, "org.springframework.data.repository.CrudRepository"),
            Some(vec![
                JavaType::class("com.acme.Person"),
                JavaType::class("java.lang.Long")
            ])
        );

        let (owner, method) = table.find_method(repo, "getById", 1).unwrap();
        assert_eq!(owner, "org.springframework.data.jpa.repository.JpaRepository");
        assert_eq!(method.params, vec![JavaType::TypeVariable { name: "ID".to_string() }]);
        assert_eq!(
            table.ancestors(repo).first().map(String::as_str),
            Some("org.springframework.data.jpa.repository.JpaRepository")
        );
    }

    #[test]
    fn test_unknown_supertype_is_a_warning() {
        let (table, warnings) = table_with(&["package a;\nclass A extends Missing implements Runnable {}\n"]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].name, "Missing");
        assert!(table.is_assignable("a.A", "java.lang.Runnable"));
        assert!(!table.is_assignable("a.A", "java.lang.Object"));
    }

    #[test]
    fn test_nested_types_and_enums() {
        let (table, _) = table_with(&["package a;\nclass Outer<T> { enum Kind { A, B } class Inner { T value() { return null; } } }\n"]);
        assert!(table.is_assignable("a.Outer.Kind", "java.lang.Enum"));
        assert!(table.is_assignable("a.Outer.Kind", "java.lang.Comparable"));
        let inner = table.get("a.Outer.Inner").unwrap();
        assert_eq!(inner.methods[0].return_type, JavaType::TypeVariable { name: "T".to_string() });
    }
}
