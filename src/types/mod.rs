/*!
# Type Attribution

Semantic information layered on top of the syntax tree: which fully
qualified type a name in a file refers to, what a type's supertypes are and
which methods it declares.

- [`TypeTable`] - every known type, built from the classpath stubs plus the
  sources of the run, with the subtype graph kept in a `petgraph` graph
- [`TypeResolver`] - per-file name resolution (local types, imports, same
  package, on-demand imports, `java.lang`)
- [`classpath`] - Java source stubs for the library types the built-in
  recipes match against

Resolution is best effort. A name that cannot be resolved yields
[`JavaType::Unknown`] and, where it matters, a
[`TypeResolutionError`](crate::core::TypeResolutionError) warning; it never
aborts a rewrite.
*/

pub mod classpath;
pub mod resolver;
pub mod table;

pub use resolver::{KnownTypes, TypeResolver};
pub use table::{TypeTable, TypeTableBuilder};

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::ast::ClassKind;

/// Attributed type of an expression or declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JavaType {
    /// `int`, `boolean`, `void`, ...
    Primitive { name: String },
    /// Class or interface type with its type arguments
    Class { fqn: String, type_args: Vec<JavaType> },
    /// Type parameter of the enclosing class or method
    TypeVariable { name: String },
    Array { element: Box<JavaType> },
    /// `?` (bounds are not tracked)
    Wildcard,
    /// Name that did not resolve
    Unknown { name: String },
}

impl JavaType {
    pub fn class(fqn: impl Into<String>) -> Self {
        JavaType::Class {
            fqn: fqn.into(),
            type_args: Vec::new(),
        }
    }

    pub fn generic(fqn: impl Into<String>, type_args: Vec<JavaType>) -> Self {
        JavaType::Class {
            fqn: fqn.into(),
            type_args,
        }
    }

    pub fn primitive(name: impl Into<String>) -> Self {
        JavaType::Primitive { name: name.into() }
    }

    pub fn array_of(element: JavaType) -> Self {
        JavaType::Array {
            element: Box::new(element),
        }
    }

    /// Fully qualified name of a class type.
    pub fn fqn(&self) -> Option<&str> {
        match self {
            JavaType::Class { fqn, .. } => Some(fqn),
            _ => None,
        }
    }

    pub fn type_arguments(&self) -> &[JavaType] {
        match self {
            JavaType::Class { type_args, .. } => type_args,
            _ => &[],
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, JavaType::Unknown { .. })
    }

    /// Type name without type arguments: `java.util.List`, `int`, `java.lang.String[]`.
    /// Type variables erase to `java.lang.Object`.
    pub fn erasure(&self) -> String {
        match self {
            JavaType::Primitive { name } => name.clone(),
            JavaType::Class { fqn, .. } => fqn.clone(),
            JavaType::TypeVariable { .. } | JavaType::Wildcard => "java.lang.Object".to_string(),
            JavaType::Array { element } => format!("{}[]", element.erasure()),
            JavaType::Unknown { name } => name.clone(),
        }
    }

    /// Replaces type variables bound in `bindings`.
    pub fn substitute(&self, bindings: &HashMap<String, JavaType>) -> JavaType {
        match self {
            JavaType::TypeVariable { name } => bindings
                .get(name)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            JavaType::Class { fqn, type_args } => JavaType::Class {
                fqn: fqn.clone(),
                type_args: type_args.iter().map(|t| t.substitute(bindings)).collect(),
            },
            JavaType::Array { element } => JavaType::array_of(element.substitute(bindings)),
            other => other.clone(),
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Primitive { name }
            | JavaType::TypeVariable { name }
            | JavaType::Unknown { name } => write!(f, "{}", name),
            JavaType::Class { fqn, type_args } => {
                write!(f, "{}", fqn)?;
                if !type_args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in type_args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            JavaType::Array { element } => write!(f, "{}[]", element),
            JavaType::Wildcard => write!(f, "?"),
        }
    }
}

/// Declared method of a [`ClassInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSig {
    pub name: String,
    pub type_params: Vec<String>,
    pub params: Vec<JavaType>,
    pub return_type: JavaType,
}

/// Where a type declaration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeOrigin {
    /// Bundled library stubs
    Classpath,
    /// A classpath directory source; contributes types, never rewritten
    Library,
    /// A source file of the current run
    Source,
}

/// Everything the type table knows about one declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub fqn: String,
    pub simple_name: String,
    pub package: String,
    pub kind: ClassKind,
    pub type_params: Vec<String>,
    /// Direct supertypes as written (`extends` first), with implicit ones added
    pub supertypes: Vec<JavaType>,
    pub methods: Vec<MethodSig>,
    /// Fully qualified names of the type's own annotations
    pub annotations: Vec<String>,
    pub origin: TypeOrigin,
}

impl ClassInfo {
    pub fn is_annotated_with(&self, annotation_fqn: &str) -> bool {
        self.annotations.iter().any(|a| a == annotation_fqn)
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodSig> + 'a {
        self.methods.iter().filter(move |m| m.name == name)
    }
}

/// Package part of a fully qualified name (`java.util` for `java.util.List`).
pub fn container_of(fqn: &str) -> &str {
    fqn.rfind('.').map_or("", |dot| &fqn[..dot])
}

/// Last segment of a dotted name.
pub fn simple_name_of(fqn: &str) -> &str {
    fqn.rfind('.').map_or(fqn, |dot| &fqn[dot + 1..])
}
