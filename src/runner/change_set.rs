use serde::{Deserialize, Serialize};

use super::diff::unified_diff;

/// Text of a file before and after a run, with the diff between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(skip_serializing)]
    #[serde(default)]
    pub before: String,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub after: String,
    pub diff: String,
}

impl ChangeSet {
    pub fn new(path: &str, before: String, after: String) -> Self {
        let diff = unified_diff(path, &before, &after);
        Self { before, after, diff }
    }

    /// Number of added and removed lines.
    pub fn line_stats(&self) -> (usize, usize) {
        let changed = |prefix: char, skip: &str| {
            self.diff
                .lines()
                .filter(|l| l.starts_with(prefix) && !l.starts_with(skip))
                .count()
        };
        (changed('+', "+++"), changed('-', "---"))
    }
}
