/*!
# Error System

Error kinds of the rewrite engine. Each kind has a fixed blast radius:

- [`ParseError`] aborts the file it was raised for;
- [`TypeResolutionError`] is a warning, typing degrades to unknown;
- [`RecipeApplicationError`] is isolated to one recipe on one file;
- [`PrintError`] is fatal for the file, its original text stays on disk.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use super::position::LineIndex;

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorLevel {
    Error,
    Warning,
    Info,
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorLevel::Error => write!(f, "ERROR"),
            ErrorLevel::Warning => write!(f, "WARNING"),
            ErrorLevel::Info => write!(f, "INFO"),
        }
    }
}

/// Malformed input text.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    /// Builds an error for `offset` inside `source`, computing line and column.
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let position = LineIndex::new(source).to_position(offset);
        Self {
            message: message.into(),
            offset: position.offset,
            line: position.line,
            column: position.column,
        }
    }
}

/// A type name that could not be resolved against the type table.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("cannot resolve type `{name}` ({context})")]
pub struct TypeResolutionError {
    pub name: String,
    pub context: String,
}

impl TypeResolutionError {
    pub fn new(name: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: context.into(),
        }
    }
}

/// A recipe failed on one file. The recipe name is filled in by the runner.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("recipe `{recipe}` failed: {message}")]
pub struct RecipeApplicationError {
    pub recipe: String,
    pub message: String,
}

impl RecipeApplicationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            recipe: String::new(),
            message: message.into(),
        }
    }

    pub fn with_recipe(mut self, recipe: impl Into<String>) -> Self {
        self.recipe = recipe.into();
        self
    }
}

/// The tree cannot be turned back into valid source text.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("cannot print tree: {message}")]
pub struct PrintError {
    pub message: String,
}

impl PrintError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Top-level error of the library entry points.
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    TypeResolution(#[from] TypeResolutionError),

    #[error(transparent)]
    RecipeApplication(#[from] RecipeApplicationError),

    #[error(transparent)]
    Print(#[from] PrintError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl RewriteError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RewriteError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn level(&self) -> ErrorLevel {
        match self {
            RewriteError::TypeResolution(_) => ErrorLevel::Warning,
            _ => ErrorLevel::Error,
        }
    }
}

pub type RewriteResult<T> = Result<T, RewriteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_position() {
        let err = ParseError::at("class A {\n  ?\n}", 12, "unexpected `?`");
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 3);
        assert_eq!(err.to_string(), "2:3: unexpected `?`");
    }

    #[test]
    fn test_recipe_error_carries_recipe_name() {
        let err = RecipeApplicationError::new("boom").with_recipe("jaxrs-to-spring");
        assert_eq!(err.to_string(), "recipe `jaxrs-to-spring` failed: boom");
        let wrapped: RewriteError = err.into();
        assert_eq!(wrapped.level(), ErrorLevel::Error);
    }

    #[test]
    fn test_type_resolution_is_warning() {
        let err: RewriteError = TypeResolutionError::new("Foo", "supertype of a.B").into();
        assert_eq!(err.level(), ErrorLevel::Warning);
        assert_eq!(err.to_string(), "cannot resolve type `Foo` (supertype of a.B)");
    }
}
