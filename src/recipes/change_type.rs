//! Rewrites references to one type into another.

use std::sync::Arc;

use super::Recipe;
use crate::parser::ast::{Annotation, Import, QualifiedName, TypeTree};
use crate::parser::Token;
use crate::types::simple_name_of;
use crate::visitor::{JavaVisitor, Visit, VisitContext, VisitResult};

#[derive(Debug, Clone)]
pub struct ChangeType {
    old: String,
    new: String,
}

impl ChangeType {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

impl Recipe for ChangeType {
    fn name(&self) -> &str {
        "change-type"
    }

    fn display_name(&self) -> &str {
        "Change type"
    }

    fn description(&self) -> &str {
        "Change every reference to a type into a reference to another type."
    }

    fn java_visitor(&self) -> Option<Box<dyn JavaVisitor>> {
        Some(Box::new(ChangeTypeVisitor {
            old: self.old.clone(),
            new: self.new.clone(),
        }))
    }
}

struct ChangeTypeVisitor {
    old: String,
    new: String,
}

impl ChangeTypeVisitor {
    /// Name to write for the new type where `name` was written: fully
    /// qualified when the old reference was, or when the simple name
    /// already means something else in this file.
    fn replacement(&self, name: &QualifiedName, ctx: &mut VisitContext<'_>) -> QualifiedName {
        let simple = simple_name_of(&self.new);
        let qualified_before = name.is_qualified() && name.first_segment().starts_with(char::is_lowercase);
        let taken = ctx
            .resolver()
            .resolve_simple(simple)
            .is_some_and(|fqn| fqn != self.new && fqn != self.old);

        ctx.maybe_remove_import(&self.old);
        if qualified_before || taken {
            name.replaced(&self.new)
        } else {
            ctx.maybe_add_import(&self.new);
            name.replaced(simple)
        }
    }
}

impl JavaVisitor for ChangeTypeVisitor {
    fn visit_import(&mut self, import: &Import, ctx: &mut VisitContext<'_>) -> VisitResult<Import> {
        if import.is_static() && import.container() == self.old {
            let member = import.name.simple_name();
            let mut updated = import.clone();
            updated.name = import.name.replaced(&format!("{}.{}", self.new, member));
            return Ok(Visit::Replace(updated));
        }
        if !import.is_static() && import.qualified_name() == self.old {
            ctx.maybe_remove_import(&self.old);
            ctx.maybe_add_import(&self.new);
        }
        Ok(Visit::Keep)
    }

    fn visit_annotation(&mut self, annotation: &Annotation, ctx: &mut VisitContext<'_>) -> VisitResult<Annotation> {
        if ctx.annotation_type(annotation).as_deref() != Some(self.old.as_str()) {
            return Ok(Visit::Keep);
        }
        let mut updated = annotation.clone();
        updated.name = self.replacement(&annotation.name, ctx);
        Ok(Visit::Replace(updated))
    }

    fn visit_type_tree(&mut self, tree: &TypeTree, ctx: &mut VisitContext<'_>) -> VisitResult<TypeTree> {
        if ctx.resolve_type(tree).fqn() != Some(self.old.as_str()) {
            return Ok(Visit::Keep);
        }
        let mut updated = tree.clone();
        updated.name = self.replacement(&tree.name, ctx);
        Ok(Visit::Replace(updated))
    }

    /// `Old.CONSTANT`, `new Old()`, `Old.class` inside code.
    fn visit_identifier(&mut self, identifier: &Token, ctx: &mut VisitContext<'_>) -> VisitResult<Token> {
        if identifier.text != simple_name_of(&self.old)
            || !identifier.text.starts_with(char::is_uppercase)
            || ctx.resolver().resolve_simple(&identifier.text).as_deref() != Some(self.old.as_str())
        {
            return Ok(Visit::Keep);
        }
        let name = self.replacement(&QualifiedName::from_dotted(&identifier.text), ctx);
        if name.is_qualified() {
            // A dotted name does not fit in a single token
            ctx.maybe_add_import(&self.new);
            return Ok(Visit::Keep);
        }
        Ok(Visit::Replace(identifier.renamed(simple_name_of(&self.new))))
    }
}

/// `ChangeType` for each `(old, new)` pair, as chained recipes.
pub fn chain(pairs: &[(&str, &str)]) -> Vec<Arc<dyn Recipe>> {
    pairs
        .iter()
        .map(|(old, new)| Arc::new(ChangeType::new(*old, *new)) as Arc<dyn Recipe>)
        .collect()
}
