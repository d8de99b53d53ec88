//! Finding and classifying the files of a run.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::core::FileError;
use crate::parser::{printer, JavaParser};
use crate::text::PropertiesFile;

/// How a file is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Java,
    Properties,
    PlainText,
}

impl SourceKind {
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("java") => SourceKind::Java,
            Some("properties") => SourceKind::Properties,
            _ => SourceKind::PlainText,
        }
    }
}

/// Extensions walked when a directory is given.
pub const DEFAULT_EXTENSIONS: &[&str] = &["java", "properties", "sql"];

/// Translates a path glob into an anchored regex: `**` crosses directories,
/// `*` and `?` do not.
pub fn glob_to_regex(glob: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::from("^");
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    pattern.push_str("(?:.*/)?");
                } else {
                    pattern.push_str(".*");
                }
            }
            '*' => pattern.push_str("[^/]*"),
            '?' => pattern.push_str("[^/]"),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
}

/// Which files under the given roots take part in a run.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    extensions: Vec<String>,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl SourceFilter {
    pub fn new(extensions: &[String], include: &[String], exclude: &[String]) -> Result<Self, regex::Error> {
        let compile = |globs: &[String]| globs.iter().map(|g| glob_to_regex(g)).collect::<Result<Vec<_>, _>>();
        Ok(Self {
            extensions: if extensions.is_empty() {
                Self::default().extensions
            } else {
                extensions.to_vec()
            },
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// `relative` uses `/` separators and is relative to the walked root.
    pub fn accepts(&self, relative: &str) -> bool {
        let extension_ok = Path::new(relative)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.iter().any(|x| x == e));
        extension_ok
            && (self.include.is_empty() || self.include.iter().any(|r| r.is_match(relative)))
            && !self.exclude.iter().any(|r| r.is_match(relative))
    }
}

/// Files under `roots` accepted by `filter`, sorted and without duplicates.
/// Files named directly are always taken.
pub fn discover(roots: &[PathBuf], filter: &SourceFilter) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in roots {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        if !root.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", root.display()),
            ));
        }
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            if filter.accepts(&relative) {
                files.push(entry.into_path());
            } else {
                debug!("Skipping {}", relative);
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Java files of the classpath directories.
pub fn discover_classpath(dirs: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    let filter = SourceFilter::new(&["java".to_string()], &[], &[])
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    discover(dirs, &filter)
}

/// Parses and prints `text` without any recipe. `Ok(None)` when the
/// printed text is identical, otherwise the printed text.
pub fn round_trip(kind: SourceKind, text: &str) -> Result<Option<String>, FileError> {
    let printed = match kind {
        SourceKind::Java => {
            let cu = JavaParser::new().parse_text(text).map_err(FileError::Parse)?;
            printer::print(&cu).map_err(FileError::Print)?
        }
        SourceKind::Properties => PropertiesFile::parse(text).map_err(FileError::Parse)?.print(),
        SourceKind::PlainText => text.to_string(),
    };
    Ok((printed != text).then_some(printed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_source_kind() {
        assert_eq!(SourceKind::of(Path::new("a/B.java")), SourceKind::Java);
        assert_eq!(SourceKind::of(Path::new("application.properties")), SourceKind::Properties);
        assert_eq!(SourceKind::of(Path::new("schema.sql")), SourceKind::PlainText);
    }

    #[test]
    fn test_glob_to_regex() {
        let re = glob_to_regex("src/**/*.java").unwrap();
        assert!(re.is_match("src/A.java"));
        assert!(re.is_match("src/main/java/a/B.java"));
        assert!(!re.is_match("test/A.java"));
        assert!(glob_to_regex("**/generated/**").unwrap().is_match("target/generated/X.java"));
        assert!(!glob_to_regex("*.java").unwrap().is_match("a/B.java"));
    }

    #[test]
    fn test_discover_filters() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/main/resources")).unwrap();
        fs::create_dir_all(root.join("target/generated")).unwrap();
        fs::write(root.join("src/A.java"), "class A {}").unwrap();
        fs::write(root.join("src/main/resources/application.properties"), "a=1").unwrap();
        fs::write(root.join("src/main/resources/logo.png"), "x").unwrap();
        fs::write(root.join("target/generated/G.java"), "class G {}").unwrap();

        let filter = SourceFilter::new(&[], &[], &["target/**".to_string()]).unwrap();
        let files = discover(&[root.to_path_buf()], &filter).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["A.java", "application.properties"]);
    }

    #[test]
    fn test_round_trip() {
        assert_eq!(round_trip(SourceKind::Java, "class A { /* c */ }\n").unwrap(), None);
        assert_eq!(round_trip(SourceKind::Properties, "a = 1\\\n  2\n").unwrap(), None);
        assert!(matches!(
            round_trip(SourceKind::Java, "class {"),
            Err(FileError::Parse(_))
        ));
    }
}
