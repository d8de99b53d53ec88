//! Post-order walk with copy-on-write rebuilding.

use std::sync::Arc;

use super::{JavaVisitor, Scope, Visit, VisitContext};
use crate::core::RecipeApplicationError;
use crate::parser::ast::*;
use crate::parser::format;
use crate::parser::{Token, TokenKind};

type WalkResult<T> = Result<T, RecipeApplicationError>;

/// Walks `cu` with `visitor` and returns the rewritten unit. When nothing
/// changed the result is the same `Arc` as the input.
pub fn walk_compilation_unit(
    visitor: &mut dyn JavaVisitor,
    cu: &Arc<CompilationUnit>,
    ctx: &mut VisitContext<'_>,
) -> WalkResult<Arc<CompilationUnit>> {
    Walker { visitor, ctx }.compilation_unit(cu)
}

/// Result of walking an element of a list that allows removal.
enum Outcome<T> {
    Same,
    Changed(T),
    Removed,
}

impl<T> Outcome<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Same => Outcome::Same,
            Outcome::Changed(value) => Outcome::Changed(f(value)),
            Outcome::Removed => Outcome::Removed,
        }
    }
}

/// Slot `index` of a lazily cloned copy of `original`.
fn rebuild<'s, T: Clone>(slot: &'s mut Option<Vec<T>>, original: &[T], index: usize) -> &'s mut T {
    &mut slot.get_or_insert_with(|| original.to_vec())[index]
}

/// A replacement without trivia takes the trivia of the node it replaces.
fn carry_trivia<T: LeadingTrivia>(original: &T, mut replacement: T) -> T {
    if replacement.leading().is_empty() && !original.leading().is_empty() {
        replacement.set_leading(original.leading().to_string());
    }
    replacement
}

fn not_removable(what: &str) -> RecipeApplicationError {
    RecipeApplicationError::new(format!("{} cannot be removed", what))
}

fn arc_outcome<T>(original: &Arc<T>, current: Arc<T>, visit: Visit<T>) -> Outcome<Arc<T>> {
    match visit {
        Visit::Keep if Arc::ptr_eq(original, &current) => Outcome::Same,
        Visit::Keep => Outcome::Changed(current),
        Visit::Replace(node) => Outcome::Changed(Arc::new(node)),
        Visit::Remove => Outcome::Removed,
    }
}

struct Walker<'v, 'c, 'a> {
    visitor: &'v mut dyn JavaVisitor,
    ctx: &'c mut VisitContext<'a>,
}

impl Walker<'_, '_, '_> {
    fn compilation_unit(&mut self, cu: &Arc<CompilationUnit>) -> WalkResult<Arc<CompilationUnit>> {
        let mut next: Option<CompilationUnit> = None;

        if let Some(package) = &cu.package {
            if let Some(updated) = self.package_decl(package)? {
                next.get_or_insert_with(|| (**cu).clone()).package = Some(updated);
            }
        }

        let mut imports: Option<Vec<Arc<Import>>> = None;
        let mut removed_imports = Vec::new();
        for (i, import) in cu.imports.iter().enumerate() {
            match self.visitor.visit_import(import, self.ctx)? {
                Visit::Keep => {}
                Visit::Replace(new) => {
                    *rebuild(&mut imports, &cu.imports, i) = Arc::new(carry_trivia(import.as_ref(), new))
                }
                Visit::Remove => removed_imports.push(i),
            }
        }
        if imports.is_some() || !removed_imports.is_empty() {
            let unit = next.get_or_insert_with(|| (**cu).clone());
            if let Some(imports) = imports {
                unit.imports = imports;
            }
            for &index in removed_imports.iter().rev() {
                format::remove_import(unit, index);
            }
        }

        let types = next.as_ref().map_or(&cu.types, |unit| &unit.types).clone();
        let mut new_types: Option<Vec<TypeDeclItem>> = None;
        let mut removed_types = Vec::new();
        for (i, item) in types.iter().enumerate() {
            let TypeDeclItem::Class(class) = item else { continue };
            match self.class_decl(class)? {
                Outcome::Same => {}
                Outcome::Changed(class) => *rebuild(&mut new_types, &types, i) = TypeDeclItem::Class(class),
                Outcome::Removed => removed_types.push(i),
            }
        }
        if new_types.is_some() || !removed_types.is_empty() {
            let mut items = new_types.unwrap_or(types);
            for &index in removed_types.iter().rev() {
                items.remove(index);
            }
            next.get_or_insert_with(|| (**cu).clone()).types = items;
        }

        let current = next.map(Arc::new).unwrap_or_else(|| cu.clone());
        match self.visitor.visit_compilation_unit(&current, self.ctx)? {
            Visit::Keep => Ok(current),
            Visit::Replace(unit) => Ok(Arc::new(unit)),
            Visit::Remove => Err(not_removable("compilation units")),
        }
    }

    fn package_decl(&mut self, package: &PackageDecl) -> WalkResult<Option<PackageDecl>> {
        let mut annotations: Option<Vec<Arc<Annotation>>> = None;
        let mut removed = Vec::new();
        for (i, annotation) in package.annotations.iter().enumerate() {
            match self.visitor.visit_annotation(annotation, self.ctx)? {
                Visit::Keep => {}
                Visit::Replace(new) => {
                    *rebuild(&mut annotations, &package.annotations, i) =
                        Arc::new(carry_trivia(annotation.as_ref(), new))
                }
                Visit::Remove => removed.push(i),
            }
        }
        if annotations.is_none() && removed.is_empty() {
            return Ok(None);
        }

        let mut updated = package.clone();
        let mut list = annotations.unwrap_or_else(|| package.annotations.clone());
        for &index in removed.iter().rev() {
            let gone = list.remove(index);
            if index == 0 {
                match list.first_mut() {
                    Some(first) => Arc::make_mut(first).set_leading(gone.leading().to_string()),
                    None => updated.keyword.leading = gone.leading().to_string(),
                }
            }
        }
        updated.annotations = list;
        Ok(Some(updated))
    }

    /// Visits the annotations of a modifier list. `after` is the trivia of
    /// the token following the list; the new value is returned with the
    /// new list.
    fn modifiers(&mut self, modifiers: &[Modifier], after: &str) -> WalkResult<Option<(Vec<Modifier>, String)>> {
        let mut next: Option<Vec<Modifier>> = None;
        let mut removed = Vec::new();
        for (i, modifier) in modifiers.iter().enumerate() {
            let Modifier::Annotation(annotation) = modifier else { continue };
            match self.visitor.visit_annotation(annotation, self.ctx)? {
                Visit::Keep => {}
                Visit::Replace(new) => {
                    *rebuild(&mut next, modifiers, i) =
                        Modifier::Annotation(Arc::new(carry_trivia(annotation.as_ref(), new)))
                }
                Visit::Remove => removed.push(i),
            }
        }
        if next.is_none() && removed.is_empty() {
            return Ok(None);
        }
        let mut list = next.unwrap_or_else(|| modifiers.to_vec());
        let mut after = after.to_string();
        format::remove_modifiers_at(&mut list, &mut after, &removed);
        Ok(Some((list, after)))
    }

    fn class_decl(&mut self, class: &Arc<ClassDecl>) -> WalkResult<Outcome<Arc<ClassDecl>>> {
        let fqn = self.ctx.qualify_declared(class.simple_name());
        self.ctx.enter(Scope::Class {
            decl: class.clone(),
            fqn,
        });
        let children = self.class_children(class);
        self.ctx.leave();

        let current = children?.map(Arc::new).unwrap_or_else(|| class.clone());
        let visit = self.visitor.visit_class_decl(&current, self.ctx)?;
        Ok(arc_outcome(class, current, visit))
    }

    fn class_children(&mut self, class: &ClassDecl) -> WalkResult<Option<ClassDecl>> {
        let mut next: Option<ClassDecl> = None;
        if let Some((modifiers, after)) = self.modifiers(&class.modifiers, class.after_modifiers_leading())? {
            let updated = next.get_or_insert_with(|| class.clone());
            updated.modifiers = modifiers;
            *updated.after_modifiers_leading_mut() = after;
        }
        if let Some(header) = &class.record_header {
            if let Some(header) = self.param_list(header)? {
                next.get_or_insert_with(|| class.clone()).record_header = Some(header);
            }
        }
        if let Some(list) = &class.extends {
            if let Some(list) = self.type_list(list)? {
                next.get_or_insert_with(|| class.clone()).extends = Some(list);
            }
        }
        if let Some(list) = &class.implements {
            if let Some(list) = self.type_list(list)? {
                next.get_or_insert_with(|| class.clone()).implements = Some(list);
            }
        }
        if let Some(list) = &class.permits {
            if let Some(list) = self.type_list(list)? {
                next.get_or_insert_with(|| class.clone()).permits = Some(list);
            }
        }
        if let Some(members) = self.members(&class.body.members)? {
            next.get_or_insert_with(|| class.clone()).body.members = members;
        }
        Ok(next)
    }

    fn members(&mut self, members: &[Member]) -> WalkResult<Option<Vec<Member>>> {
        let mut next: Option<Vec<Member>> = None;
        let mut removed = Vec::new();
        for (i, member) in members.iter().enumerate() {
            let outcome = match member {
                Member::Method(method) => self.method_decl(method)?.map(Member::Method),
                Member::Field(field) => self.field_decl(field)?.map(Member::Field),
                Member::Class(class) => self.class_decl(class)?.map(Member::Class),
                Member::Initializer(init) => self.initializer(init)?.map(Member::Initializer),
                Member::EnumConstants(_) | Member::Empty(_) => Outcome::Same,
            };
            match outcome {
                Outcome::Same => {}
                Outcome::Changed(member) => *rebuild(&mut next, members, i) = member,
                Outcome::Removed => removed.push(i),
            }
        }
        if removed.is_empty() {
            return Ok(next);
        }
        let mut list = next.unwrap_or_else(|| members.to_vec());
        for &index in removed.iter().rev() {
            list.remove(index);
        }
        Ok(Some(list))
    }

    fn method_decl(&mut self, method: &Arc<MethodDecl>) -> WalkResult<Outcome<Arc<MethodDecl>>> {
        self.ctx.enter(Scope::Method(method.clone()));
        let children = self.method_children(method);
        self.ctx.leave();

        let current = children?.map(Arc::new).unwrap_or_else(|| method.clone());
        let visit = self.visitor.visit_method_decl(&current, self.ctx)?;
        Ok(arc_outcome(method, current, visit))
    }

    fn method_children(&mut self, method: &MethodDecl) -> WalkResult<Option<MethodDecl>> {
        let mut next: Option<MethodDecl> = None;
        if let Some((modifiers, after)) =
            self.modifiers(&method.modifiers, method.after_modifiers_leading())?
        {
            let updated = next.get_or_insert_with(|| method.clone());
            updated.modifiers = modifiers;
            *updated.after_modifiers_leading_mut() = after;
        }
        if let Some(return_type) = &method.return_type {
            if let Some(tree) = self.type_tree(return_type)? {
                next.get_or_insert_with(|| method.clone()).return_type = Some(tree);
            }
        }
        if let Some(params) = self.param_list(&method.params)? {
            next.get_or_insert_with(|| method.clone()).params = params;
        }
        if let Some(throws) = &method.throws {
            if let Some(list) = self.type_list(throws)? {
                next.get_or_insert_with(|| method.clone()).throws = Some(list);
            }
        }
        if let MethodBody::Block(block) = &method.body {
            if let Some(block) = self.block(block)? {
                next.get_or_insert_with(|| method.clone()).body = MethodBody::Block(block);
            }
        }
        Ok(next)
    }

    fn field_decl(&mut self, field: &Arc<FieldDecl>) -> WalkResult<Outcome<Arc<FieldDecl>>> {
        self.ctx.enter(Scope::Field(field.clone()));
        let children = self.field_children(field);
        self.ctx.leave();

        let current = children?.map(Arc::new).unwrap_or_else(|| field.clone());
        let visit = self.visitor.visit_field_decl(&current, self.ctx)?;
        Ok(arc_outcome(field, current, visit))
    }

    fn field_children(&mut self, field: &FieldDecl) -> WalkResult<Option<FieldDecl>> {
        let mut next: Option<FieldDecl> = None;
        if let Some((modifiers, after)) = self.modifiers(&field.modifiers, field.type_tree.leading())? {
            let updated = next.get_or_insert_with(|| field.clone());
            updated.modifiers = modifiers;
            updated.type_tree.set_leading(after);
        }
        if let Some(tree) = self.type_tree(&field.type_tree)? {
            let updated = next.get_or_insert_with(|| field.clone());
            let leading = updated.type_tree.leading().to_string();
            updated.type_tree = tree;
            updated.type_tree.set_leading(leading);
        }
        let mut declarators: Option<Vec<Separated<VarDeclarator>>> = None;
        for (i, declarator) in field.declarators.iter().enumerate() {
            let Some(init) = &declarator.item.init else { continue };
            if let Some(value) = self.code(&init.value)? {
                let slot = rebuild(&mut declarators, &field.declarators, i);
                slot.item.init = Some(VarInit {
                    eq: init.eq.clone(),
                    value,
                });
            }
        }
        if let Some(declarators) = declarators {
            next.get_or_insert_with(|| field.clone()).declarators = declarators;
        }
        Ok(next)
    }

    fn initializer(&mut self, init: &Arc<Initializer>) -> WalkResult<Outcome<Arc<Initializer>>> {
        self.ctx.enter(Scope::Initializer);
        let body = self.block(&init.body);
        self.ctx.leave();
        Ok(match body? {
            Some(body) => Outcome::Changed(Arc::new(Initializer {
                static_kw: init.static_kw.clone(),
                body,
            })),
            None => Outcome::Same,
        })
    }

    fn param_list(&mut self, list: &ParamList) -> WalkResult<Option<ParamList>> {
        let mut params: Option<Vec<Separated<Param>>> = None;
        for (i, entry) in list.params.iter().enumerate() {
            if let Some(param) = self.param(&entry.item)? {
                rebuild(&mut params, &list.params, i).item = param;
            }
        }
        Ok(params.map(|params| ParamList {
            open: list.open.clone(),
            params,
            close: list.close.clone(),
        }))
    }

    fn param(&mut self, param: &Param) -> WalkResult<Option<Param>> {
        self.ctx.enter(Scope::Param(param.clone()));
        let children = self.param_children(param);
        self.ctx.leave();

        let current = children?;
        let node = current.as_ref().unwrap_or(param);
        match self.visitor.visit_param(node, self.ctx)? {
            Visit::Keep => Ok(current),
            Visit::Replace(new) => Ok(Some(carry_trivia(node, new))),
            Visit::Remove => Err(not_removable("parameters")),
        }
    }

    fn param_children(&mut self, param: &Param) -> WalkResult<Option<Param>> {
        let mut next: Option<Param> = None;
        if let Some((modifiers, after)) = self.modifiers(&param.modifiers, param.type_tree.leading())? {
            let updated = next.get_or_insert_with(|| param.clone());
            updated.modifiers = modifiers;
            updated.type_tree.set_leading(after);
        }
        if let Some(tree) = self.type_tree(&param.type_tree)? {
            let updated = next.get_or_insert_with(|| param.clone());
            let leading = updated.type_tree.leading().to_string();
            updated.type_tree = tree;
            updated.type_tree.set_leading(leading);
        }
        Ok(next)
    }

    fn type_list(&mut self, list: &TypeList) -> WalkResult<Option<TypeList>> {
        let mut types: Option<Vec<Separated<TypeTree>>> = None;
        for (i, entry) in list.types.iter().enumerate() {
            if let Some(tree) = self.type_tree(&entry.item)? {
                rebuild(&mut types, &list.types, i).item = tree;
            }
        }
        Ok(types.map(|types| TypeList {
            keyword: list.keyword.clone(),
            types,
        }))
    }

    fn type_tree(&mut self, tree: &TypeTree) -> WalkResult<Option<TypeTree>> {
        let mut next: Option<TypeTree> = None;
        if let Some(args) = &tree.type_args {
            let mut new_args: Option<Vec<Separated<TypeArg>>> = None;
            for (i, entry) in args.args.iter().enumerate() {
                let changed = match &entry.item {
                    TypeArg::Type(inner) => self.type_tree(inner)?.map(TypeArg::Type),
                    TypeArg::Wildcard {
                        question,
                        bound: Some(bound),
                    } => self.type_tree(&bound.bound)?.map(|tree| TypeArg::Wildcard {
                        question: question.clone(),
                        bound: Some(Box::new(WildcardBound {
                            keyword: bound.keyword.clone(),
                            bound: tree,
                        })),
                    }),
                    TypeArg::Wildcard { .. } => None,
                };
                if let Some(arg) = changed {
                    rebuild(&mut new_args, &args.args, i).item = arg;
                }
            }
            if let Some(new_args) = new_args {
                next.get_or_insert_with(|| tree.clone()).type_args = Some(TypeArgs {
                    open: args.open.clone(),
                    args: new_args,
                    close: args.close.clone(),
                });
            }
        }

        let node = next.as_ref().unwrap_or(tree);
        match self.visitor.visit_type_tree(node, self.ctx)? {
            Visit::Keep => Ok(next),
            Visit::Replace(new) => Ok(Some(carry_trivia(node, new))),
            Visit::Remove => Err(not_removable("type references")),
        }
    }

    fn block(&mut self, block: &Arc<Block>) -> WalkResult<Option<Arc<Block>>> {
        let current = match self.code(&block.elements)? {
            Some(elements) => Arc::new(Block {
                open: block.open.clone(),
                elements,
                close: block.close.clone(),
            }),
            None => block.clone(),
        };
        match self.visitor.visit_block(&current, self.ctx)? {
            Visit::Keep => Ok((!Arc::ptr_eq(block, &current)).then_some(current)),
            Visit::Replace(new) => Ok(Some(Arc::new(new))),
            Visit::Remove => Err(not_removable("blocks")),
        }
    }

    fn code(&mut self, elements: &[CodeElement]) -> WalkResult<Option<Vec<CodeElement>>> {
        let mut next: Option<Vec<CodeElement>> = None;
        for (i, element) in elements.iter().enumerate() {
            let changed = match element {
                CodeElement::Token(token) if token.kind == TokenKind::Identifier => {
                    self.identifier(token)?.map(CodeElement::Token)
                }
                CodeElement::Token(_) => None,
                CodeElement::Block(block) => self.block(block)?.map(CodeElement::Block),
                CodeElement::Invocation(invocation) => {
                    self.invocation(invocation)?.map(CodeElement::Invocation)
                }
            };
            if let Some(element) = changed {
                *rebuild(&mut next, elements, i) = element;
            }
        }
        Ok(next)
    }

    fn identifier(&mut self, token: &Token) -> WalkResult<Option<Token>> {
        match self.visitor.visit_identifier(token, self.ctx)? {
            Visit::Keep => Ok(None),
            Visit::Replace(new) => Ok(Some(carry_trivia(token, new))),
            Visit::Remove => Err(not_removable("identifiers")),
        }
    }

    fn invocation(&mut self, invocation: &Arc<MethodInvocation>) -> WalkResult<Option<Arc<MethodInvocation>>> {
        let current = match self.code(&invocation.args)? {
            Some(args) => {
                let mut updated = (**invocation).clone();
                updated.args = args;
                Arc::new(updated)
            }
            None => invocation.clone(),
        };
        match self.visitor.visit_method_invocation(&current, self.ctx)? {
            Visit::Keep => Ok((!Arc::ptr_eq(invocation, &current)).then_some(current)),
            Visit::Replace(new) => Ok(Some(Arc::new(new))),
            Visit::Remove => Err(not_removable("method invocations")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{printer, JavaParser};
    use crate::types::TypeTable;
    use crate::visitor::VisitResult;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn run(visitor: &mut dyn JavaVisitor, source: &str) -> (Arc<CompilationUnit>, Arc<CompilationUnit>) {
        let types = TypeTable::with_classpath().unwrap();
        let cu = Arc::new(JavaParser::new().parse_text(source).unwrap());
        let mut ctx = VisitContext::new(&types, &cu, Path::new("A.java"));
        let out = walk_compilation_unit(visitor, &cu, &mut ctx).unwrap();
        (cu, out)
    }

    /// Records the order of callbacks.
    #[derive(Default)]
    struct Trace(Vec<String>);

    impl JavaVisitor for Trace {
        fn visit_class_decl(&mut self, class: &ClassDecl, ctx: &mut VisitContext<'_>) -> VisitResult<ClassDecl> {
            self.0.push(format!("class {}", ctx.qualify_declared(class.simple_name())));
            Ok(Visit::Keep)
        }

        fn visit_method_decl(&mut self, method: &MethodDecl, _ctx: &mut VisitContext<'_>) -> VisitResult<MethodDecl> {
            self.0.push(format!("method {}", method.name.text));
            Ok(Visit::Keep)
        }

        fn visit_annotation(&mut self, annotation: &Annotation, ctx: &mut VisitContext<'_>) -> VisitResult<Annotation> {
            let fqn = ctx.annotation_type(annotation).unwrap_or_default();
            self.0.push(format!("@{}", fqn));
            Ok(Visit::Keep)
        }

        fn visit_method_invocation(&mut self, invocation: &MethodInvocation, _ctx: &mut VisitContext<'_>) -> VisitResult<MethodInvocation> {
            self.0.push(format!("call {}", invocation.name.text));
            Ok(Visit::Keep)
        }
    }

    #[test]
    fn test_post_order_and_sharing() {
        let mut trace = Trace::default();
        let source = "package a;\nimport javax.ws.rs.*;\n@Path(\"/\")\nclass R {\n  @GET String get() { return s.find(x.id()); }\n  class Inner {}\n}\n";
        let (cu, out) = run(&mut trace, source);
        assert!(Arc::ptr_eq(&cu, &out));
        assert_eq!(
            trace.0,
            vec![
                "@javax.ws.rs.Path",
                "@javax.ws.rs.GET",
                "call id",
                "call find",
                "method get",
                "class a.R.Inner",
                "class a.R",
            ]
        );
    }

    struct DropGet;

    impl JavaVisitor for DropGet {
        fn visit_annotation(&mut self, annotation: &Annotation, _ctx: &mut VisitContext<'_>) -> VisitResult<Annotation> {
            Ok(if annotation.simple_name() == "GET" { Visit::Remove } else { Visit::Keep })
        }

        fn visit_identifier(&mut self, identifier: &Token, _ctx: &mut VisitContext<'_>) -> VisitResult<Token> {
            Ok(if identifier.text == "Foo" {
                Visit::Replace(identifier.renamed("Bar"))
            } else {
                Visit::Keep
            })
        }
    }

    #[test]
    fn test_removal_and_replacement_rebuild_only_the_path() {
        let source = "class R {\n    int untouched;\n\n    @GET\n    public Object get() { return new Foo(); }\n}\n";
        let (cu, out) = run(&mut DropGet, source);
        assert_eq!(
            printer::print(&out).unwrap(),
            "class R {\n    int untouched;\n\n    public Object get() { return new Bar(); }\n}\n"
        );
        let field = |unit: &CompilationUnit| unit.classes().next().unwrap().fields().next().unwrap().clone();
        assert!(Arc::ptr_eq(&field(&cu), &field(&out)));
    }

    struct RemoveParam;

    impl JavaVisitor for RemoveParam {
        fn visit_param(&mut self, _param: &Param, _ctx: &mut VisitContext<'_>) -> VisitResult<Param> {
            Ok(Visit::Remove)
        }
    }

    #[test]
    fn test_illegal_removal_is_an_error() {
        let types = TypeTable::with_classpath().unwrap();
        let cu = Arc::new(JavaParser::new().parse_text("class A { void f(int x) {} }").unwrap());
        let mut ctx = VisitContext::new(&types, &cu, Path::new("A.java"));
        let err = walk_compilation_unit(&mut RemoveParam, &cu, &mut ctx).unwrap_err();
        assert_eq!(err.message, "parameters cannot be removed");
    }
}
