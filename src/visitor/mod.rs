/*!
# Visitor

Post-order traversal of the Java tree with copy-on-write rebuilding.

A [`JavaVisitor`] gets one callback per node kind. Children are visited
before their parent, so a callback sees the already rewritten children of
its node. Each callback answers with a [`Visit`]: keep the node, replace it,
or remove it (only where the surrounding list allows removal: modifier
annotations, imports, members and top-level types).

Unchanged subtrees are shared with the input through their `Arc`s; only the
path from a replaced node up to the root is rebuilt.

[`VisitContext`] carries the per-file state a callback may need: the type
table and resolver, the cursor of enclosing declarations, pending import
edits, findings and follow-up visitors scheduled with
[`VisitContext::do_after_visit`].
*/

pub mod context;
pub mod imports;
pub mod matchers;
pub mod walk;

pub use context::{ImportEdits, Scope, VisitContext, VisitOutcome};
pub use imports::{apply_import_edits, References};
pub use matchers::{AnnotationMatcher, MatcherError, MethodMatcher, TypePattern, UsesType};
pub use walk::walk_compilation_unit;

use crate::core::RecipeApplicationError;
use crate::parser::ast::{
    Annotation, Block, ClassDecl, CompilationUnit, FieldDecl, Import, MethodDecl, MethodInvocation,
    Param, TypeTree,
};
use crate::parser::Token;

/// Answer of a visitor callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Visit<T> {
    Keep,
    Replace(T),
    Remove,
}

pub type VisitResult<T> = Result<Visit<T>, RecipeApplicationError>;

/// Callbacks for a post-order walk over a compilation unit.
///
/// Every method defaults to [`Visit::Keep`].
#[allow(unused_variables)]
pub trait JavaVisitor: Send {
    fn visit_compilation_unit(
        &mut self,
        cu: &CompilationUnit,
        ctx: &mut VisitContext<'_>,
    ) -> VisitResult<CompilationUnit> {
        Ok(Visit::Keep)
    }

    fn visit_import(&mut self, import: &Import, ctx: &mut VisitContext<'_>) -> VisitResult<Import> {
        Ok(Visit::Keep)
    }

    fn visit_class_decl(
        &mut self,
        class: &ClassDecl,
        ctx: &mut VisitContext<'_>,
    ) -> VisitResult<ClassDecl> {
        Ok(Visit::Keep)
    }

    fn visit_method_decl(
        &mut self,
        method: &MethodDecl,
        ctx: &mut VisitContext<'_>,
    ) -> VisitResult<MethodDecl> {
        Ok(Visit::Keep)
    }

    fn visit_field_decl(
        &mut self,
        field: &FieldDecl,
        ctx: &mut VisitContext<'_>,
    ) -> VisitResult<FieldDecl> {
        Ok(Visit::Keep)
    }

    fn visit_param(&mut self, param: &Param, ctx: &mut VisitContext<'_>) -> VisitResult<Param> {
        Ok(Visit::Keep)
    }

    fn visit_annotation(
        &mut self,
        annotation: &Annotation,
        ctx: &mut VisitContext<'_>,
    ) -> VisitResult<Annotation> {
        Ok(Visit::Keep)
    }

    fn visit_type_tree(&mut self, tree: &TypeTree, ctx: &mut VisitContext<'_>) -> VisitResult<TypeTree> {
        Ok(Visit::Keep)
    }

    fn visit_block(&mut self, block: &Block, ctx: &mut VisitContext<'_>) -> VisitResult<Block> {
        Ok(Visit::Keep)
    }

    fn visit_method_invocation(
        &mut self,
        invocation: &MethodInvocation,
        ctx: &mut VisitContext<'_>,
    ) -> VisitResult<MethodInvocation> {
        Ok(Visit::Keep)
    }

    /// Identifier tokens inside code (method bodies, initializers).
    fn visit_identifier(&mut self, identifier: &Token, ctx: &mut VisitContext<'_>) -> VisitResult<Token> {
        Ok(Visit::Keep)
    }
}
