/*!
# Non-Java sources

`.properties` files get a lossless line tree ([`properties`]); any other
file is plain text. Both come with a visitor trait shaped like
[`crate::visitor::JavaVisitor`] so recipes can touch them the same way.
*/

pub mod properties;

pub use properties::{Entry, Line, PropertiesFile};

use std::path::Path;

use crate::core::{Finding, RecipeApplicationError};
use crate::visitor::{Visit, VisitResult};

/// Per-file state of a properties or plain text visit.
pub struct FileContext<'a> {
    path: &'a Path,
    findings: Vec<Finding>,
}

impl<'a> FileContext<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self {
            path,
            findings: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        self.path
    }

    pub fn add_finding(&mut self, message: impl Into<String>, offset: Option<usize>) {
        self.findings.push(Finding::new(message, offset));
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }
}

#[allow(unused_variables)]
pub trait PropertiesVisitor: Send {
    /// Called once with the whole file before any entry is visited.
    fn begin_file(&mut self, file: &PropertiesFile, ctx: &mut FileContext<'_>) {}

    fn visit_entry(&mut self, entry: &Entry, ctx: &mut FileContext<'_>) -> VisitResult<Entry> {
        Ok(Visit::Keep)
    }
}

#[allow(unused_variables)]
pub trait PlainTextVisitor: Send {
    fn visit_text(&mut self, text: &str, ctx: &mut FileContext<'_>) -> VisitResult<String> {
        Ok(Visit::Keep)
    }
}

/// Visits every entry in file order. `None` when nothing changed.
pub fn walk_properties(
    visitor: &mut dyn PropertiesVisitor,
    file: &PropertiesFile,
    ctx: &mut FileContext<'_>,
) -> Result<Option<PropertiesFile>, RecipeApplicationError> {
    visitor.begin_file(file, ctx);
    let mut lines: Option<Vec<Line>> = None;
    let mut removed = Vec::new();
    for (i, line) in file.lines.iter().enumerate() {
        let Line::Entry(entry) = line else { continue };
        match visitor.visit_entry(entry, ctx)? {
            Visit::Keep => {}
            Visit::Replace(new) => {
                lines.get_or_insert_with(|| file.lines.clone())[i] = Line::Entry(new);
            }
            Visit::Remove => removed.push(i),
        }
    }
    if lines.is_none() && removed.is_empty() {
        return Ok(None);
    }
    let mut lines = lines.unwrap_or_else(|| file.lines.clone());
    for &index in removed.iter().rev() {
        lines.remove(index);
    }
    Ok(Some(PropertiesFile { lines }))
}

pub fn walk_plain_text(
    visitor: &mut dyn PlainTextVisitor,
    text: &str,
    ctx: &mut FileContext<'_>,
) -> Result<Option<String>, RecipeApplicationError> {
    match visitor.visit_text(text, ctx)? {
        Visit::Keep => Ok(None),
        Visit::Replace(new) => Ok((new != text).then_some(new)),
        Visit::Remove => Err(RecipeApplicationError::new("plain text files cannot be removed")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct DropPlatform;

    impl PropertiesVisitor for DropPlatform {
        fn visit_entry(&mut self, entry: &Entry, ctx: &mut FileContext<'_>) -> VisitResult<Entry> {
            match entry.key.as_str() {
                "spring.datasource.platform" => Ok(Visit::Remove),
                "spring.datasource.schema" => {
                    ctx.add_finding("schema", entry.offset);
                    Ok(Visit::Replace(entry.with_key("spring.sql.init.schema-locations")))
                }
                _ => Ok(Visit::Keep),
            }
        }
    }

    #[test]
    fn test_walk_properties() {
        let file = PropertiesFile::parse("a=1\nspring.datasource.platform=h2\nspring.datasource.schema=s.sql\n").unwrap();
        let mut ctx = FileContext::new(Path::new("application.properties"));
        let out = walk_properties(&mut DropPlatform, &file, &mut ctx).unwrap().unwrap();
        assert_eq!(out.print(), "a=1\nspring.sql.init.schema-locations=s.sql\n");
        let findings = ctx.into_findings();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].offset, Some(34));
    }

    #[test]
    fn test_unchanged_properties() {
        let file = PropertiesFile::parse("a=1\n").unwrap();
        let mut ctx = FileContext::new(Path::new("x.properties"));
        assert!(walk_properties(&mut DropPlatform, &file, &mut ctx).unwrap().is_none());
    }
}
