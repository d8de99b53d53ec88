/*!
# Core Module

Core functionality shared by every layer: error kinds, source positions,
run results and file system helpers.
*/

pub mod errors;
pub mod fs_utils;
pub mod position;
pub mod results;

pub use errors::{
    ErrorLevel, ParseError, PrintError, RecipeApplicationError, RewriteError, RewriteResult,
    TypeResolutionError,
};
pub use fs_utils::{read_source_file, write_atomic, SourceEncoding, SourceText};
pub use position::{LineIndex, Position, Span};
pub use results::{FileError, FileResult, FileStatus, Finding, RunMetadata, RunResults};
