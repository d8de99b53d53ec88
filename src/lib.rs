/*!
# Spring Rewrite

Lossless Java source rewriting engine with Spring / JAX-RS migration recipes.

Sources are parsed into a concrete syntax tree that keeps every comment and
whitespace, so printing an unmodified tree reproduces the input byte for
byte. Recipes walk the tree with a type-aware visitor, replace or remove
nodes, and manage imports; only the edited nodes change in the output.

## Architecture

```text
Spring Rewrite
├── Parser    - logos lexer, recursive descent CST, printer, layout helpers
├── Types     - type table (petgraph hierarchy) over sources and bundled stubs
├── Visitor   - copy-on-write walk, visit context, matchers, import edits
├── Text      - .properties (nom) and plain text trees and visitors
├── Recipes   - ChangeType, ChangeMethodName, JAX-RS → Spring, getById, ...
├── Runner    - parallel per-file pipeline (rayon), diffs, atomic writes
├── Config    - TOML / YAML run configuration
└── Reports   - text and JSON run reports
```

## Usage

### CLI
```bash
# Preview the JAX-RS migration as a diff
spring-rewrite run ./src --recipe jaxrs-to-spring --dry-run

# Run a configured recipe list and write a JSON report
spring-rewrite run ./src --config rewrite.toml --format json --output report.json

# Make sure every file survives parse → print unchanged
spring-rewrite check ./src
```

### Library
```rust
use spring_rewrite::recipes::JaxRsToSpring;
use spring_rewrite::{rewrite_source, Recipe};
use std::sync::Arc;

let recipes: Vec<Arc<dyn Recipe>> = vec![Arc::new(JaxRsToSpring::new())];
let source = "import javax.ws.rs.Path;\n\n@Path(\"/troopers\")\npublic class TrooperResource {}\n";
let rewritten = rewrite_source("TrooperResource.java", source, &recipes).unwrap();
assert!(rewritten.contains("@RequestMapping(\"/troopers\")"));
```
*/

pub mod cli_common;
pub mod config;
pub mod core;
pub mod parser;
pub mod recipes;
pub mod reports;
pub mod runner;
pub mod text;
pub mod types;
pub mod visitor;

pub use crate::config::{RecipeEntry, RunConfig};
pub use crate::core::{
    FileError, FileResult, FileStatus, Finding, RewriteError, RewriteResult, RunResults,
};
pub use parser::{CompilationUnit, JavaParser};
pub use recipes::{lookup, Recipe};
pub use reports::{ReportConfig, ReportFormat, ReportManager};
pub use runner::{RecipeRunner, RunOptions};

use std::path::PathBuf;
use std::sync::Arc;

/// Applies `recipes` to one in-memory source and returns the rewritten
/// text, or the input unchanged when no recipe touched it.
pub fn rewrite_source(path: impl Into<PathBuf>, source: &str, recipes: &[Arc<dyn Recipe>]) -> RewriteResult<String> {
    let runner = RecipeRunner::new(
        recipes,
        RunOptions {
            threads: 1,
            ..Default::default()
        },
    );
    let results = runner.run_sources(&[(path.into(), source.to_string())])?;
    let Some(file) = results.files.into_iter().next() else {
        return Ok(source.to_string());
    };
    if let Some(error) = file.errors.into_iter().find(|e| !matches!(e, FileError::Recipe(_))) {
        return Err(match error {
            FileError::Parse(e) => RewriteError::Parse {
                path: file.path,
                source: e,
            },
            FileError::Print(e) => e.into(),
            FileError::Recipe(e) => e.into(),
            FileError::Io { message } => RewriteError::io(file.path, std::io::Error::other(message)),
        });
    }
    Ok(file
        .change_set
        .map(|c| c.after)
        .unwrap_or_else(|| source.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rewrite_source() {
        let recipes = vec![lookup("jaxrs-to-spring", &Default::default()).unwrap()];
        let source = "import javax.ws.rs.Path;\n\n@Path(\"/troopers\")\npublic class TrooperResource {}\n";
        assert_eq!(
            rewrite_source("TrooperResource.java", source, &recipes).unwrap(),
            "import org.springframework.web.bind.annotation.RequestMapping;\n\n@RequestMapping(\"/troopers\")\npublic class TrooperResource {}\n"
        );
    }

    #[test]
    fn test_rewrite_source_parse_error() {
        let recipes = vec![lookup("jaxrs-to-spring", &Default::default()).unwrap()];
        assert!(matches!(
            rewrite_source("Broken.java", "class {", &recipes),
            Err(RewriteError::Parse { .. })
        ));
    }

    #[test]
    fn test_parser_round_trip() {
        let source = "// header\npackage a;\n\nclass A {\n    int x; /* trailing */\n}\n";
        let cu = JavaParser::new().parse_text(source).unwrap();
        assert_eq!(parser::printer::print(&cu).unwrap(), source);
    }
}
