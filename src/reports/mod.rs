/*!
# Reports Module

Отчеты о прогоне рецептов.

## Поддерживаемые форматы:
- **Text** - человекочитаемый отчет для консоли, с диффами в dry-run
- **JSON** - структурированный отчет для CI/CD интеграции

## Использование:

```rust,ignore
use spring_rewrite::reports::{ReportFormat, ReportManager};

let report = ReportManager::new().generate_report(&results, ReportFormat::Json)?;
std::fs::write("rewrite-results.json", report)?;
```
*/

pub mod json;
pub mod text;

pub use json::JsonReporter;
pub use text::TextReporter;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::RunResults;

/// Формат отчета
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Текстовый отчет для консоли
    #[default]
    Text,
    /// JSON для CI/CD интеграции
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(anyhow::anyhow!("Unknown report format: {}", s)),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

/// Конфигурация отчета
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub format: ReportFormat,
    /// Включать диффы измененных файлов
    pub include_diffs: bool,
    /// Цветной вывод (только для текста)
    pub use_colors: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Text,
            include_diffs: true,
            use_colors: false,
        }
    }
}

/// Трейт для генерации отчетов
pub trait ReportGenerator {
    fn generate_report(&self, results: &RunResults, config: &ReportConfig) -> Result<String>;

    fn supported_format() -> ReportFormat
    where
        Self: Sized;
}

/// Менеджер отчетов для генерации в различных форматах
#[derive(Debug, Clone, Default)]
pub struct ReportManager {
    config: ReportConfig,
}

impl ReportManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReportConfig) -> Self {
        Self { config }
    }

    /// Генерирует отчет в указанном формате
    pub fn generate_report(&self, results: &RunResults, format: ReportFormat) -> Result<String> {
        let config = ReportConfig {
            format,
            ..self.config.clone()
        };
        match format {
            ReportFormat::Text => TextReporter::new().generate_report(results, &config),
            ReportFormat::Json => JsonReporter::new().generate_report(results, &config),
        }
    }

    /// Сохраняет отчет в файл
    pub fn save_report<P: AsRef<Path>>(&self, results: &RunResults, format: ReportFormat, output_path: P) -> Result<()> {
        let content = self.generate_report(results, format)?;
        std::fs::write(&output_path, content)
            .with_context(|| format!("Failed to write report to {}", output_path.as_ref().display()))?;
        tracing::info!("Generated {} report: {}", format, output_path.as_ref().display());
        Ok(())
    }
}
