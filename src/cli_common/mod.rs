//! Общий модуль для CLI
//!
//! - Инициализация логирования
//! - Цветной вывод сообщений
//! - Прогресс-бар прогона

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Инициализирует систему логирования. Логи идут в stderr, чтобы не
/// смешиваться с отчетом в stdout.
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Выводит заголовок CLI
pub fn print_header(name: &str, version: &str, description: &str) {
    eprintln!("{} {} - {}", "🔧".blue(), name.bold().blue(), version.dimmed());
    eprintln!("{}\n", description.dimmed());
}

pub fn print_success(message: &str) {
    eprintln!("{} {}", "✅".green(), message.green());
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠️".yellow(), message.yellow());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "❌".red(), message.red());
}

pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ️".blue(), message);
}

/// Проверяет существование файла или директории
pub fn validate_path(path: &Path, description: &str) -> Result<()> {
    if !path.exists() {
        return Err(anyhow::anyhow!("{} does not exist: {}", description, path.display()));
    }
    Ok(())
}

/// Прогресс-бар по файлам прогона; скрыт, если stderr не терминал
pub fn file_progress(total: usize) -> ProgressBar {
    if !console::Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files ({eta})") {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}

/// Форматирует продолжительность в человекочитаемый вид
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        use std::time::Duration;

        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(1)), "1.000s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }

    #[test]
    fn test_validate_path() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(validate_path(dir.path(), "Source root").is_ok());
        let missing = dir.path().join("missing");
        let err = validate_path(&missing, "Source root").unwrap_err();
        assert!(err.to_string().starts_with("Source root does not exist"));
    }
}
