//! Renames a key in `.properties` files.

use std::path::Path;

use super::Recipe;
use crate::text::{Entry, FileContext, PropertiesVisitor};
use crate::visitor::{Visit, VisitResult};

#[derive(Debug, Clone)]
pub struct ChangePropertyKey {
    old: String,
    new: String,
}

impl ChangePropertyKey {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

impl Recipe for ChangePropertyKey {
    fn name(&self) -> &str {
        "change-property-key"
    }

    fn display_name(&self) -> &str {
        "Change property key"
    }

    fn description(&self) -> &str {
        "Rename a property key, keeping its separator and value."
    }

    fn accepts_path(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "properties")
    }

    fn properties_visitor(&self) -> Option<Box<dyn PropertiesVisitor>> {
        Some(Box::new(RenameKeys::new(vec![(self.old.clone(), self.new.clone())])))
    }
}

/// Renames keys by exact match, each old key to its new key.
pub(crate) struct RenameKeys {
    renames: Vec<(String, String)>,
}

impl RenameKeys {
    pub(crate) fn new(renames: Vec<(String, String)>) -> Self {
        Self { renames }
    }
}

impl PropertiesVisitor for RenameKeys {
    fn visit_entry(&mut self, entry: &Entry, _ctx: &mut FileContext<'_>) -> VisitResult<Entry> {
        match self.renames.iter().find(|(old, _)| *old == entry.key) {
            Some((_, new)) => Ok(Visit::Replace(entry.with_key(new))),
            None => Ok(Visit::Keep),
        }
    }
}
