//! Spring Boot 2.5 SQL script datasource initialization.
//!
//! Script based initialization moved from `spring.datasource.*` to
//! `spring.sql.init.*`. Keys with a direct replacement are renamed; the
//! separate data credentials have none and are reported instead.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use super::Recipe;
use crate::text::{Entry, FileContext, PlainTextVisitor, PropertiesFile, PropertiesVisitor};
use crate::visitor::{Visit, VisitResult};

/// Deprecated key and its `spring.sql.init` replacement
const RENAMES: &[(&str, &str)] = &[
    ("spring.datasource.schema", "spring.sql.init.schema-locations"),
    ("spring.datasource.data", "spring.sql.init.data-locations"),
    ("spring.datasource.initialization-mode", "spring.sql.init.mode"),
    ("spring.datasource.platform", "spring.sql.init.platform"),
    ("spring.datasource.continue-on-error", "spring.sql.init.continue-on-error"),
    ("spring.datasource.separator", "spring.sql.init.separator"),
    ("spring.datasource.sql-script-encoding", "spring.sql.init.encoding"),
    ("spring.datasource.schema-username", "spring.sql.init.username"),
    ("spring.datasource.schema-password", "spring.sql.init.password"),
];

/// Deprecated keys without a replacement
const UNMAPPED: &[&str] = &["spring.datasource.data-username", "spring.datasource.data-password"];

const CREDENTIALS: &[&str] = &[
    "spring.datasource.data-username",
    "spring.datasource.data-password",
    "spring.datasource.schema-username",
    "spring.datasource.schema-password",
    "spring.datasource.schema",
    "spring.datasource.data",
];

const SCRIPTS: &[&str] = &["resources/schema.sql", "resources/data.sql"];

fn is_application_properties(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("application") && name.ends_with(".properties"))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlScriptDataSourceInitialization;

impl SqlScriptDataSourceInitialization {
    pub const NAME: &'static str = "sql-script-datasource-initialization";
}

impl Recipe for SqlScriptDataSourceInitialization {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "SQL script datasource initialization"
    }

    fn description(&self) -> &str {
        "Move spring.datasource script initialization properties to spring.sql.init.* (Spring Boot 2.5)."
    }

    fn accepts_path(&self, path: &Path) -> bool {
        is_application_properties(path)
    }

    fn properties_visitor(&self) -> Option<Box<dyn PropertiesVisitor>> {
        Some(Box::new(InitializationVisitor::default()))
    }
}

#[derive(Default)]
struct InitializationVisitor {
    existing: HashSet<String>,
}

impl PropertiesVisitor for InitializationVisitor {
    fn begin_file(&mut self, file: &PropertiesFile, _ctx: &mut FileContext<'_>) {
        self.existing = file.entries().map(|e| e.key.clone()).collect();
    }

    fn visit_entry(&mut self, entry: &Entry, ctx: &mut FileContext<'_>) -> VisitResult<Entry> {
        if UNMAPPED.contains(&entry.key.as_str()) {
            ctx.add_finding(
                format!("{} has no spring.sql.init replacement", entry.key),
                entry.offset,
            );
            return Ok(Visit::Keep);
        }
        let Some((_, new)) = RENAMES.iter().find(|(old, _)| *old == entry.key) else {
            return Ok(Visit::Keep);
        };
        if self.existing.contains(*new) {
            debug!("{} already set in {}", new, ctx.path().display());
            ctx.add_finding(format!("{} is deprecated, {} is already set", entry.key, new), entry.offset);
            return Ok(Visit::Keep);
        }
        Ok(Visit::Replace(entry.with_key(new)))
    }
}

/// Search recipe for script credentials and the scripts themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrateSqlScriptCredentials;

impl MigrateSqlScriptCredentials {
    pub const NAME: &'static str = "migrate-sql-script-credentials";
}

impl Recipe for MigrateSqlScriptCredentials {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Find SQL script datasource credentials"
    }

    fn description(&self) -> &str {
        "Mark script credentials in properties files and schema.sql / data.sql resources."
    }

    fn properties_visitor(&self) -> Option<Box<dyn PropertiesVisitor>> {
        Some(Box::new(FindCredentials))
    }

    fn plain_text_visitor(&self) -> Option<Box<dyn PlainTextVisitor>> {
        Some(Box::new(FindScripts))
    }
}

struct FindCredentials;

impl PropertiesVisitor for FindCredentials {
    fn visit_entry(&mut self, entry: &Entry, ctx: &mut FileContext<'_>) -> VisitResult<Entry> {
        if CREDENTIALS.contains(&entry.key.as_str()) {
            ctx.add_finding(entry.key.clone(), entry.offset);
        }
        Ok(Visit::Keep)
    }
}

struct FindScripts;

impl PlainTextVisitor for FindScripts {
    fn visit_text(&mut self, _text: &str, ctx: &mut FileContext<'_>) -> VisitResult<String> {
        let path = ctx.path().to_string_lossy().replace('\\', "/");
        if let Some(script) = SCRIPTS.iter().find(|s| path.ends_with(*s)) {
            let name = script.trim_start_matches("resources/").to_string();
            ctx.add_finding(name, Some(0));
        }
        Ok(Visit::Keep)
    }
}
