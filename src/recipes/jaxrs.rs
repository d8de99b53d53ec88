//! JAX-RS resource annotations to Spring MVC.

use std::sync::Arc;

use tracing::debug;

use super::{change_type, Recipe};
use crate::core::RecipeApplicationError;
use crate::parser::ast::{Annotation, ClassDecl, MethodDecl, Modifier};
use crate::parser::{format, JavaParser};
use crate::visitor::{JavaVisitor, UsesType, Visit, VisitContext, VisitResult};

const SPRING_WEB: &str = "org.springframework.web.bind.annotation";
const PATH: &str = "javax.ws.rs.Path";
const HTTP_METHOD: &str = "javax.ws.rs.HttpMethod";

/// Values of Spring's `RequestMethod` enum
const REQUEST_METHODS: &[&str] = &["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

/// Methods with a dedicated `@<Method>Mapping` shortcut
const SHORTCUTS: &[(&str, &str)] = &[
    ("GET", "GetMapping"),
    ("POST", "PostMapping"),
    ("PUT", "PutMapping"),
    ("DELETE", "DeleteMapping"),
    ("PATCH", "PatchMapping"),
];

pub struct JaxRsToSpring {
    next: Vec<Arc<dyn Recipe>>,
}

impl JaxRsToSpring {
    pub const NAME: &'static str = "jaxrs-to-spring";

    pub fn new() -> Self {
        Self {
            next: change_type::chain(&[
                ("javax.ws.rs.PathParam", "org.springframework.web.bind.annotation.PathVariable"),
                ("javax.ws.rs.QueryParam", "org.springframework.web.bind.annotation.RequestParam"),
                ("javax.ws.rs.FormParam", "org.springframework.web.bind.annotation.RequestParam"),
            ]),
        }
    }
}

impl Default for JaxRsToSpring {
    fn default() -> Self {
        Self::new()
    }
}

impl Recipe for JaxRsToSpring {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Convert JAX-RS annotations to Spring annotations"
    }

    fn description(&self) -> &str {
        "Replace JAX-RS resource, path and HTTP method annotations with their Spring MVC counterparts."
    }

    fn applicable_test(&self) -> Option<Box<dyn JavaVisitor>> {
        UsesType::new("javax.ws.rs.*")
            .ok()
            .map(|uses| Box::new(uses) as Box<dyn JavaVisitor>)
    }

    fn java_visitor(&self) -> Option<Box<dyn JavaVisitor>> {
        Some(Box::new(JaxRsVisitor::new()))
    }

    fn next(&self) -> Vec<Arc<dyn Recipe>> {
        self.next.clone()
    }
}

fn is_path(annotation: &Annotation, ctx: &VisitContext<'_>) -> bool {
    ctx.annotation_type(annotation).as_deref() == Some(PATH)
}

struct JaxRsVisitor {
    parser: JavaParser,
}

impl JaxRsVisitor {
    fn new() -> Self {
        Self {
            parser: JavaParser::new(),
        }
    }

    fn annotation(&self, source: &str) -> Result<Annotation, RecipeApplicationError> {
        self.parser
            .parse_annotation(source)
            .map_err(|e| RecipeApplicationError::new(format!("cannot build `{}`: {}", source, e)))
    }
}

/// Annotations of one method that take part in the mapping.
#[derive(Default)]
struct Mapping {
    /// Modifier indices of `@Path` and the HTTP method annotations
    indices: Vec<usize>,
    path: Option<String>,
    /// HTTP methods in source order
    methods: Vec<String>,
}

impl Mapping {
    fn collect(method: &MethodDecl, ctx: &mut VisitContext<'_>) -> Self {
        let mut mapping = Self::default();
        for (index, modifier) in method.modifiers.iter().enumerate() {
            let Some(annotation) = modifier.as_annotation() else { continue };
            if is_path(annotation, ctx) {
                if let Some(value) = annotation.value_argument() {
                    mapping.path = Some(value.text());
                }
                mapping.indices.push(index);
                continue;
            }
            let Some(fqn) = ctx.annotation_type(annotation) else { continue };
            if !ctx.types().is_meta_annotated(&fqn, HTTP_METHOD) {
                continue;
            }
            let method_name = annotation.simple_name().to_ascii_uppercase();
            if !REQUEST_METHODS.contains(&method_name.as_str()) {
                debug!("No Spring request method for @{}", fqn);
                continue;
            }
            ctx.maybe_remove_import(&fqn);
            mapping.indices.push(index);
            if !mapping.methods.contains(&method_name) {
                mapping.methods.push(method_name);
            }
        }
        mapping
    }

    /// Source of the Spring annotation replacing the JAX-RS ones.
    fn to_spring(&self, ctx: &mut VisitContext<'_>) -> Option<String> {
        let shortcut = match self.methods.as_slice() {
            [single] => SHORTCUTS.iter().find(|(m, _)| m == single).map(|(_, s)| *s),
            _ => None,
        };
        if let Some(shortcut) = shortcut {
            ctx.maybe_add_import(&format!("{}.{}", SPRING_WEB, shortcut));
            return Some(match &self.path {
                Some(path) => format!("@{}({})", shortcut, path),
                None => format!("@{}", shortcut),
            });
        }

        ctx.maybe_add_import(&format!("{}.RequestMapping", SPRING_WEB));
        for method in &self.methods {
            ctx.maybe_add_static_import(&format!("{}.RequestMethod.{}", SPRING_WEB, method));
        }
        let methods = match self.methods.as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            many => Some(format!("{{{}}}", many.join(", "))),
        };
        match (&self.path, methods) {
            (Some(path), None) => Some(format!("@RequestMapping({})", path)),
            (Some(path), Some(methods)) => Some(format!("@RequestMapping(value = {}, method = {})", path, methods)),
            (None, Some(methods)) => Some(format!("@RequestMapping(method = {})", methods)),
            (None, None) => None,
        }
    }
}

impl JavaVisitor for JaxRsVisitor {
    fn visit_class_decl(&mut self, class: &ClassDecl, ctx: &mut VisitContext<'_>) -> VisitResult<ClassDecl> {
        let found = class.modifiers.iter().enumerate().find_map(|(index, modifier)| {
            let annotation = modifier.as_annotation()?;
            let value = annotation.value_argument()?;
            is_path(annotation, ctx).then(|| (index, value.text()))
        });
        let Some((index, value)) = found else {
            return Ok(Visit::Keep);
        };

        let replacement = self.annotation(&format!("@RequestMapping({})", value))?;
        let mut updated = class.clone();
        format::replace_annotation(&mut updated.modifiers, index, replacement);
        ctx.maybe_add_import(&format!("{}.RequestMapping", SPRING_WEB));
        ctx.maybe_remove_import(PATH);
        Ok(Visit::Replace(updated))
    }

    fn visit_method_decl(&mut self, method: &MethodDecl, ctx: &mut VisitContext<'_>) -> VisitResult<MethodDecl> {
        let mapping = Mapping::collect(method, ctx);
        let Some((&first, rest)) = mapping.indices.split_first() else {
            return Ok(Visit::Keep);
        };
        let Some(source) = mapping.to_spring(ctx) else {
            // `@Path` without a value and no HTTP method
            return Ok(Visit::Keep);
        };
        if mapping.path.is_some() {
            ctx.maybe_remove_import(PATH);
        }

        let replacement = self.annotation(&source)?;
        let mut updated = method.clone();
        let mut modifiers: Vec<Modifier> = std::mem::take(&mut updated.modifiers);
        format::replace_annotation(&mut modifiers, first, replacement);
        let mut after = updated.after_modifiers_leading().to_string();
        format::remove_modifiers_at(&mut modifiers, &mut after, rest);
        *updated.after_modifiers_leading_mut() = after;
        updated.modifiers = modifiers;
        Ok(Visit::Replace(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::printer;
    use crate::types::TypeTable;
    use crate::visitor::{apply_import_edits, walk_compilation_unit};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn run(source: &str) -> String {
        let types = TypeTable::with_classpath().unwrap();
        let cu = Arc::new(JavaParser::new().parse_text(source).unwrap());
        let path = Path::new("R.java");
        let mut ctx = VisitContext::new(&types, &cu, path);
        let out = walk_compilation_unit(&mut JaxRsVisitor::new(), &cu, &mut ctx).unwrap();
        let outcome = ctx.finish();
        let out = apply_import_edits(&out, &outcome.imports, &types, path).unwrap();
        printer::print(&out).unwrap()
    }

    #[test]
    fn test_class_path_and_single_method() {
        let source = "import javax.ws.rs.GET;\nimport javax.ws.rs.Path;\n\n@Path(\"/troopers\")\npublic class R {\n\n    @Path(\"/{id}\")\n    @GET\n    public String get() {\n        return null;\n    }\n\n    @GET\n    public String list() {\n        return null;\n    }\n}\n";
        assert_eq!(
            run(source),
            "import org.springframework.web.bind.annotation.GetMapping;\nimport org.springframework.web.bind.annotation.RequestMapping;\n\n@RequestMapping(\"/troopers\")\npublic class R {\n\n    @GetMapping(\"/{id}\")\n    public String get() {\n        return null;\n    }\n\n    @GetMapping\n    public String list() {\n        return null;\n    }\n}\n"
        );
    }

    #[test]
    fn test_several_methods_keep_source_order() {
        let source = "import javax.ws.rs.*;\n\n@Produces(\"application/json\")\nclass R {\n    @Path(\"/{id}\")\n    @POST\n    @PUT\n    String update() { return null; }\n\n    @HEAD\n    String head() { return null; }\n}\n";
        assert_eq!(
            run(source),
            "import javax.ws.rs.*;\nimport org.springframework.web.bind.annotation.RequestMapping;\n\nimport static org.springframework.web.bind.annotation.RequestMethod.HEAD;\nimport static org.springframework.web.bind.annotation.RequestMethod.POST;\nimport static org.springframework.web.bind.annotation.RequestMethod.PUT;\n\n@Produces(\"application/json\")\nclass R {\n    @RequestMapping(value = \"/{id}\", method = {POST, PUT})\n    String update() { return null; }\n\n    @RequestMapping(method = HEAD)\n    String head() { return null; }\n}\n"
        );
    }

    #[test]
    fn test_method_path_only_and_other_modifiers() {
        let source = "import javax.ws.rs.Path;\n\nclass R {\n    @Deprecated\n    @Path(\"/sub\")\n    public Object sub() { return null; }\n}\n";
        assert_eq!(
            run(source),
            "import org.springframework.web.bind.annotation.RequestMapping;\n\nclass R {\n    @Deprecated\n    @RequestMapping(\"/sub\")\n    public Object sub() { return null; }\n}\n"
        );
    }

    #[test]
    fn test_unrelated_annotations_untouched() {
        let source = "import javax.ws.rs.Produces;\n\n@Produces(\"text/plain\")\nclass R {\n    @Override\n    public String toString() { return \"\"; }\n}\n";
        assert_eq!(run(source), source);
    }
}
