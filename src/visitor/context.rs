//! Per-file state available to visitor callbacks.

use std::path::Path;
use std::sync::Arc;

use crate::core::{Finding, TypeResolutionError};
use crate::parser::ast::{Annotation, ClassDecl, CompilationUnit, FieldDecl, MethodDecl, Param, TypeTree};
use crate::types::{JavaType, TypeResolver, TypeTable};

use super::JavaVisitor;

/// Enclosing declaration on the cursor, innermost last.
#[derive(Debug, Clone)]
pub enum Scope {
    Class { decl: Arc<ClassDecl>, fqn: String },
    Method(Arc<MethodDecl>),
    Field(Arc<FieldDecl>),
    Param(Param),
    Initializer,
}

/// Import changes requested during a visit, applied once the visit is over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportEdits {
    /// Types to import when the file references them afterwards
    pub add: Vec<String>,
    /// `Type.member` to import statically when the member is referenced
    pub add_static: Vec<String>,
    /// Types whose import goes away when nothing references them anymore
    pub remove: Vec<String>,
}

impl ImportEdits {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.add_static.is_empty() && self.remove.is_empty()
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// What a finished visit leaves behind besides the rewritten tree.
pub struct VisitOutcome {
    pub imports: ImportEdits,
    pub findings: Vec<Finding>,
    pub warnings: Vec<TypeResolutionError>,
    pub after_visits: Vec<Box<dyn JavaVisitor>>,
}

pub struct VisitContext<'a> {
    types: &'a TypeTable,
    resolver: TypeResolver<'a>,
    path: &'a Path,
    cursor: Vec<Scope>,
    imports: ImportEdits,
    findings: Vec<Finding>,
    warnings: Vec<TypeResolutionError>,
    after_visits: Vec<Box<dyn JavaVisitor>>,
}

impl<'a> VisitContext<'a> {
    pub fn new(types: &'a TypeTable, cu: &CompilationUnit, path: &'a Path) -> Self {
        Self {
            types,
            resolver: TypeResolver::for_compilation_unit(cu, types),
            path,
            cursor: Vec::new(),
            imports: ImportEdits::default(),
            findings: Vec::new(),
            warnings: Vec::new(),
            after_visits: Vec::new(),
        }
    }

    pub fn types(&self) -> &'a TypeTable {
        self.types
    }

    pub fn resolver(&self) -> &TypeResolver<'a> {
        &self.resolver
    }

    pub fn path(&self) -> &Path {
        self.path
    }

    pub fn cursor(&self) -> &[Scope] {
        &self.cursor
    }

    pub(crate) fn enter(&mut self, scope: Scope) {
        self.cursor.push(scope);
    }

    pub(crate) fn leave(&mut self) {
        self.cursor.pop();
    }

    pub fn enclosing_class(&self) -> Option<(&Arc<ClassDecl>, &str)> {
        self.cursor.iter().rev().find_map(|scope| match scope {
            Scope::Class { decl, fqn } => Some((decl, fqn.as_str())),
            _ => None,
        })
    }

    pub fn enclosing_method(&self) -> Option<&Arc<MethodDecl>> {
        self.cursor.iter().rev().find_map(|scope| match scope {
            Scope::Method(method) => Some(method),
            _ => None,
        })
    }

    /// Innermost parameter being visited (its annotations are visited
    /// before the parameter itself).
    pub fn current_param(&self) -> Option<&Param> {
        match self.cursor.last() {
            Some(Scope::Param(param)) => Some(param),
            _ => None,
        }
    }

    /// Fully qualified name a class declared at the cursor gets.
    pub fn qualify_declared(&self, simple_name: &str) -> String {
        match self.enclosing_class() {
            Some((_, outer)) => format!("{}.{}", outer, simple_name),
            None if self.resolver.package().is_empty() => simple_name.to_string(),
            None => format!("{}.{}", self.resolver.package(), simple_name),
        }
    }

    /// Type parameters of every enclosing class and method.
    pub fn type_variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        for scope in &self.cursor {
            match scope {
                Scope::Class { decl, .. } => vars.extend(decl.type_parameter_names()),
                Scope::Method(method) => vars.extend(method.type_parameter_names()),
                _ => {}
            }
        }
        vars
    }

    pub fn resolve_type(&self, tree: &TypeTree) -> JavaType {
        self.resolver.resolve_type_tree(tree, &self.type_variables())
    }

    /// Fully qualified name of an annotation's type.
    pub fn annotation_type(&self, annotation: &Annotation) -> Option<String> {
        self.resolver.resolve_name(&annotation.name.text())
    }

    /// Declared type of a parameter of the enclosing method or a field of
    /// an enclosing class. Local variables are not tracked.
    pub fn variable_type(&self, name: &str) -> Option<JavaType> {
        for scope in self.cursor.iter().rev() {
            match scope {
                Scope::Method(method) => {
                    if let Some(param) = method.params.iter().find(|p| p.name.text == name) {
                        return Some(self.resolve_type(&param.type_tree));
                    }
                }
                Scope::Class { decl, .. } => {
                    if let Some(field) = decl.fields().find(|f| f.names().any(|n| n == name)) {
                        return Some(self.resolve_type(&field.type_tree));
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Imports `fqn` after the visit if the file references it then.
    pub fn maybe_add_import(&mut self, fqn: &str) {
        push_unique(&mut self.imports.add, fqn);
    }

    /// Statically imports `Type.member` after the visit if `member` is used.
    pub fn maybe_add_static_import(&mut self, member_fqn: &str) {
        push_unique(&mut self.imports.add_static, member_fqn);
    }

    /// Drops the import of `fqn` after the visit if nothing references it.
    pub fn maybe_remove_import(&mut self, fqn: &str) {
        push_unique(&mut self.imports.remove, fqn);
    }

    pub fn add_finding(&mut self, message: impl Into<String>, offset: Option<usize>) {
        self.findings.push(Finding::new(message, offset));
    }

    pub fn warn(&mut self, warning: TypeResolutionError) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    /// Schedules another visitor to run over the result of this visit.
    pub fn do_after_visit(&mut self, visitor: Box<dyn JavaVisitor>) {
        self.after_visits.push(visitor);
    }

    pub fn finish(self) -> VisitOutcome {
        VisitOutcome {
            imports: self.imports,
            findings: self.findings,
            warnings: self.warnings,
            after_visits: self.after_visits,
        }
    }
}
