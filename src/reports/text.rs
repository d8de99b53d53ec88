/*!
# Text Reporter

Консольный отчет о прогоне рецептов.

- Один блок на файл: статус, примененные рецепты, ошибки, находки
- Диффы измененных файлов (dry-run)
- Сводная статистика в конце
- Цвета через `colored`, отключаемые для CI/CD
*/

use anyhow::Result;
use colored::{ColoredString, Colorize};
use std::fmt::Write;

use super::{ReportConfig, ReportFormat, ReportGenerator};
use crate::core::{FileResult, FileStatus, RunResults};

pub struct TextReporter;

impl TextReporter {
    pub fn new() -> Self {
        Self
    }

    fn status_label(status: FileStatus, colors: bool) -> ColoredString {
        let label = match status {
            FileStatus::Unchanged => "UNCHANGED",
            FileStatus::Changed => "CHANGED",
            FileStatus::Failed => "FAILED",
            FileStatus::Skipped => "SKIPPED",
        };
        if !colors {
            return label.normal();
        }
        match status {
            FileStatus::Unchanged => label.dimmed(),
            FileStatus::Changed => label.green().bold(),
            FileStatus::Failed => label.red().bold(),
            FileStatus::Skipped => label.yellow(),
        }
    }

    fn diff_line(line: &str, colors: bool) -> ColoredString {
        if !colors {
            return line.normal();
        }
        if line.starts_with("+++") || line.starts_with("---") {
            line.bold()
        } else if line.starts_with('+') {
            line.green()
        } else if line.starts_with('-') {
            line.red()
        } else if line.starts_with("@@") {
            line.cyan()
        } else {
            line.normal()
        }
    }

    fn write_file(&self, out: &mut String, file: &FileResult, config: &ReportConfig) -> std::fmt::Result {
        let colors = config.use_colors;
        write!(out, "{} {}", Self::status_label(file.status, colors), file.path.display())?;
        if !file.applied_recipes.is_empty() {
            write!(out, " ({})", file.applied_recipes.join(", "))?;
        }
        if let Some(change) = &file.change_set {
            let (added, removed) = change.line_stats();
            write!(out, " +{} -{}", added, removed)?;
        }
        writeln!(out)?;

        for error in &file.errors {
            let text = format!("error: {}", error);
            writeln!(out, "  {}", if colors { text.red() } else { text.normal() })?;
        }
        for warning in &file.warnings {
            let text = format!("warning: {}", warning);
            writeln!(out, "  {}", if colors { text.yellow() } else { text.normal() })?;
        }
        for finding in &file.findings {
            let location = match finding.position {
                Some(p) => format!("{}:{}", p.line, p.column),
                None => "-".to_string(),
            };
            writeln!(out, "  finding {} [{}] {}", location, finding.recipe, finding.message)?;
        }
        if config.include_diffs {
            if let Some(change) = &file.change_set {
                for line in change.diff.lines() {
                    writeln!(out, "    {}", Self::diff_line(line, colors))?;
                }
            }
        }
        Ok(())
    }

    fn write_report(&self, out: &mut String, results: &RunResults, config: &ReportConfig) -> std::fmt::Result {
        let meta = &results.metadata;
        let title = "Spring Rewrite Report";
        writeln!(out, "{}", if config.use_colors { title.bold() } else { title.normal() })?;
        writeln!(out, "{}", "=".repeat(title.len()))?;
        writeln!(out, "Version: {}", meta.version)?;
        writeln!(out, "Recipes: {}", meta.recipes.join(", "))?;
        writeln!(out, "Mode: {}", if meta.dry_run { "dry run" } else { "write" })?;
        writeln!(out, "Started: {}", meta.started_at.format("%Y-%m-%d %H:%M:%S"))?;
        if meta.cancelled {
            writeln!(out, "Run was cancelled")?;
        }
        writeln!(out)?;

        // Unchanged files without anything to say are left out
        for file in results.files.iter().filter(|f| {
            f.status != FileStatus::Unchanged || !f.findings.is_empty() || !f.errors.is_empty() || !f.warnings.is_empty()
        }) {
            self.write_file(out, file, config)?;
        }

        writeln!(out)?;
        write!(
            out,
            "Summary: {} file(s), {} changed, {} failed, {} skipped, {} finding(s), {} warning(s)",
            results.files.len(),
            results.changed_count(),
            results.failed_count(),
            results.skipped_count(),
            results.finding_count(),
            results.warning_count()
        )?;
        if let Some(ms) = results.duration_ms() {
            write!(out, " in {}ms", ms)?;
        }
        writeln!(out)
    }
}

impl Default for TextReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for TextReporter {
    fn generate_report(&self, results: &RunResults, config: &ReportConfig) -> Result<String> {
        let mut out = String::new();
        self.write_report(&mut out, results, config)?;
        Ok(out)
    }

    fn supported_format() -> ReportFormat {
        ReportFormat::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FileError, Finding, Position};
    use crate::runner::ChangeSet;

    #[test]
    fn test_text_report() {
        let mut results = RunResults::new(vec!["change-property-key".to_string()], true);
        let mut changed = FileResult::new("application.properties", FileStatus::Changed);
        changed.applied_recipes.push("change-property-key".to_string());
        changed.change_set = Some(ChangeSet::new(
            "application.properties",
            "old.key=1\n".to_string(),
            "new.key=1\n".to_string(),
        ));
        let mut finding = Finding::new("getById", Some(40));
        finding.recipe = "find-custom-get-by-id".to_string();
        finding.position = Some(Position::new(3, 7, 40));
        changed.findings.push(finding);
        results.files.push(changed);
        results.files.push(FileResult::new("Quiet.java", FileStatus::Unchanged));
        results.files.push(FileResult::failed(
            "Broken.java",
            FileError::Io {
                message: "denied".to_string(),
            },
        ));

        let report = TextReporter::new()
            .generate_report(&results, &ReportConfig::default())
            .unwrap();

        assert!(report.contains("Mode: dry run"));
        assert!(report.contains("CHANGED application.properties (change-property-key) +1 -1"));
        assert!(report.contains("  finding 3:7 [find-custom-get-by-id] getById"));
        assert!(report.contains("    -old.key=1"));
        assert!(report.contains("FAILED Broken.java"));
        assert!(report.contains("  error: I/O error: denied"));
        assert!(!report.contains("Quiet.java"));
        assert!(report.contains("Summary: 3 file(s), 1 changed, 1 failed, 0 skipped, 1 finding(s), 0 warning(s)"));
    }
}
