/*!
# Run Configuration

Run settings loaded from a TOML or YAML file (chosen by extension) and
merged with command line flags by the CLI.

```toml
dry_run = true
format = "json"
classpath = ["libs/api/src/main/java"]
exclude = ["*Generated.java"]

[[recipes]]
name = "jaxrs-to-spring"

[[recipes]]
name = "change-type"
params = { old = "java.util.Date", new = "java.time.Instant" }
```
*/

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::recipes::{self, Recipe, RecipeLookupError, BUILTIN};
use crate::reports::ReportFormat;
use crate::runner::source::{glob_to_regex, SourceFilter, DEFAULT_EXTENSIONS};
use crate::runner::RunOptions;

/// Upper bound accepted for `threads`
const MAX_THREADS: usize = 512;

/// One recipe of the run with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl RecipeEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Globs relative to each source root; empty means everything
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub extensions: Vec<String>,
    /// Directories of Java sources that only contribute types
    pub classpath: Vec<PathBuf>,
    /// `0` for one thread per CPU
    pub threads: usize,
    pub dry_run: bool,
    pub format: ReportFormat,
    /// Recipes in application order
    pub recipes: Vec<RecipeEntry>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            classpath: Vec::new(),
            threads: 0,
            dry_run: false,
            format: ReportFormat::Text,
            recipes: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Starter configuration written by `spring-rewrite init-config`.
    pub fn starter() -> Self {
        Self {
            recipes: vec![
                RecipeEntry::new("jaxrs-to-spring"),
                RecipeEntry::new("rename-custom-get-by-id"),
                RecipeEntry::new("sql-script-datasource-initialization"),
            ],
            exclude: vec!["**/target/**".to_string(), "**/build/**".to_string()],
            dry_run: true,
            ..Default::default()
        }
    }

    /// Loads a `.toml`, `.yaml` or `.yml` file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read run config from {}", path.display()))?;

        let config: Self = match extension(path).as_str() {
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config from {}", path.display()))?,
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config from {}", path.display()))?,
            other => bail!(
                "Unsupported config format `{}` for {} (expected toml, yaml or yml)",
                other,
                path.display()
            ),
        };
        tracing::debug!("Loaded run config from {}", path.display());
        Ok(config)
    }

    /// Writes the config as TOML or YAML, by extension.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match extension(path).as_str() {
            "yaml" | "yml" => serde_yaml::to_string(self).context("Failed to serialize run config to YAML")?,
            _ => toml::to_string_pretty(self).context("Failed to serialize run config to TOML")?,
        };
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write run config to {}", path.display()))
    }

    /// Human readable problems; empty when the config can run.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.recipes.is_empty() {
            problems.push("no recipes configured".to_string());
        }
        for entry in &self.recipes {
            if let Some(descriptor) = BUILTIN.iter().find(|d| d.name == entry.name) {
                for key in entry.params.keys() {
                    if !descriptor.parameters.contains(&key.as_str()) {
                        problems.push(format!("recipe `{}` has no parameter `{}`", entry.name, key));
                    }
                }
            }
            if let Err(e) = recipes::lookup(&entry.name, &entry.params) {
                problems.push(e.to_string());
            }
        }

        for glob in self.include.iter().chain(&self.exclude) {
            if let Err(e) = glob_to_regex(glob) {
                problems.push(format!("invalid glob `{}`: {}", glob, e));
            }
        }
        if self.extensions.iter().any(|e| e.is_empty() || e.starts_with('.')) {
            problems.push("extensions are given without the leading dot".to_string());
        }
        for dir in &self.classpath {
            if !dir.is_dir() {
                problems.push(format!("classpath directory {} does not exist", dir.display()));
            }
        }
        if self.threads > MAX_THREADS {
            problems.push(format!("threads must be at most {}", MAX_THREADS));
        }
        problems
    }

    /// Instantiates the configured recipes in order.
    pub fn build_recipes(&self) -> Result<Vec<Arc<dyn Recipe>>, RecipeLookupError> {
        self.recipes
            .iter()
            .map(|entry| recipes::lookup(&entry.name, &entry.params))
            .collect()
    }

    pub fn source_filter(&self) -> Result<SourceFilter> {
        SourceFilter::new(&self.extensions, &self.include, &self.exclude).context("Invalid include/exclude glob")
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            threads: self.threads,
            classpath: self.classpath.clone(),
            ..Default::default()
        }
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase()
}
