//! JSON отчет: сериализованные [`RunResults`] со сводкой.

use anyhow::{Context, Result};
use serde::Serialize;

use super::{ReportConfig, ReportFormat, ReportGenerator};
use crate::core::{FileResult, RunMetadata, RunResults};

#[derive(Serialize)]
struct Summary {
    files: usize,
    changed: usize,
    failed: usize,
    skipped: usize,
    errors: usize,
    findings: usize,
    warnings: usize,
    duration_ms: Option<i64>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: &'a RunMetadata,
    summary: Summary,
    files: Vec<FileResult>,
}

pub struct JsonReporter {
    pretty: bool,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for JsonReporter {
    fn generate_report(&self, results: &RunResults, config: &ReportConfig) -> Result<String> {
        let files = results
            .files
            .iter()
            .cloned()
            .map(|mut file| {
                if !config.include_diffs {
                    file.change_set = None;
                }
                file
            })
            .collect();
        let report = JsonReport {
            metadata: &results.metadata,
            summary: Summary {
                files: results.files.len(),
                changed: results.changed_count(),
                failed: results.failed_count(),
                skipped: results.skipped_count(),
                errors: results.error_count(),
                findings: results.finding_count(),
                warnings: results.warning_count(),
                duration_ms: results.duration_ms(),
            },
            files,
        };
        let json = if self.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };
        json.context("Failed to serialize JSON report")
    }

    fn supported_format() -> ReportFormat {
        ReportFormat::Json
    }
}
