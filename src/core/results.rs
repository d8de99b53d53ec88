/*!
# Run Results

Структуры для хранения результатов прогона рецептов: по одному
[`FileResult`] на файл и сводные метаданные прогона.
Используется репортерами для генерации различных форматов отчетов.
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use super::errors::{ParseError, PrintError, RecipeApplicationError, TypeResolutionError};
use super::position::Position;
use crate::runner::ChangeSet;

/// Результат поиска, отмеченный рецептом без изменения дерева
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub id: Uuid,
    /// Имя рецепта (заполняется раннером)
    pub recipe: String,
    pub message: String,
    /// Смещение в исходном тексте, если известно
    pub offset: Option<usize>,
    /// Позиция (заполняется раннером по `offset`)
    pub position: Option<Position>,
}

impl Finding {
    pub fn new(message: impl Into<String>, offset: Option<usize>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipe: String::new(),
            message: message.into(),
            offset,
            position: None,
        }
    }
}

/// Ошибка, приписанная конкретному файлу
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileError {
    #[error("parse error at {0}")]
    Parse(ParseError),
    #[error("{0}")]
    Recipe(RecipeApplicationError),
    #[error("{0}")]
    Print(PrintError),
    #[error("I/O error: {message}")]
    Io { message: String },
}

/// Итоговое состояние файла после прогона
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Unchanged,
    Changed,
    /// Файл не удалось разобрать, напечатать или записать
    Failed,
    /// Прогон был отменён до обработки файла
    Skipped,
}

/// Результат обработки одного файла
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub path: PathBuf,
    pub status: FileStatus,
    /// Рецепты, которые изменили файл, в порядке применения
    pub applied_recipes: Vec<String>,
    pub change_set: Option<ChangeSet>,
    pub findings: Vec<Finding>,
    pub warnings: Vec<TypeResolutionError>,
    pub errors: Vec<FileError>,
}

impl FileResult {
    pub fn new(path: impl Into<PathBuf>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
            applied_recipes: Vec::new(),
            change_set: None,
            findings: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn failed(path: impl Into<PathBuf>, error: FileError) -> Self {
        let mut result = Self::new(path, FileStatus::Failed);
        result.errors.push(error);
        result
    }

    pub fn skipped(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileStatus::Skipped)
    }

    pub fn is_changed(&self) -> bool {
        self.status == FileStatus::Changed
    }

    /// Переписанный текст, если файл изменился
    pub fn rewritten_text(&self) -> Option<&str> {
        self.change_set.as_ref().map(|c| c.after.as_str())
    }
}

/// Метаданные прогона
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub version: String,
    /// Рецепты в порядке применения (с учётом цепочек)
    pub recipes: Vec<String>,
    pub dry_run: bool,
    pub cancelled: bool,
}

/// Результаты прогона рецептов по набору файлов
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResults {
    pub metadata: RunMetadata,
    pub files: Vec<FileResult>,
}

impl RunResults {
    /// Создает новые пустые результаты
    pub fn new(recipes: Vec<String>, dry_run: bool) -> Self {
        Self {
            metadata: RunMetadata {
                started_at: Utc::now(),
                finished_at: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
                recipes,
                dry_run,
                cancelled: false,
            },
            files: Vec::new(),
        }
    }

    /// Отмечает завершение прогона
    pub fn finish(&mut self) {
        self.metadata.finished_at = Some(Utc::now());
    }

    pub fn file(&self, path: &std::path::Path) -> Option<&FileResult> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn changed_files(&self) -> impl Iterator<Item = &FileResult> {
        self.files.iter().filter(|f| f.is_changed())
    }

    pub fn changed_count(&self) -> usize {
        self.changed_files().count()
    }

    pub fn failed_count(&self) -> usize {
        self.count_status(FileStatus::Failed)
    }

    pub fn skipped_count(&self) -> usize {
        self.count_status(FileStatus::Skipped)
    }

    fn count_status(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    /// Количество ошибок рецептов (включая файлы, которые всё же изменились)
    pub fn error_count(&self) -> usize {
        self.files.iter().map(|f| f.errors.len()).sum()
    }

    pub fn finding_count(&self) -> usize {
        self.files.iter().map(|f| f.findings.len()).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.files.iter().map(|f| f.warnings.len()).sum()
    }

    /// Проверяет, есть ли ошибки
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Длительность прогона в миллисекундах
    pub fn duration_ms(&self) -> Option<i64> {
        self.metadata
            .finished_at
            .map(|end| (end - self.metadata.started_at).num_milliseconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut results = RunResults::new(vec!["change-type".to_string()], true);
        results.files.push(FileResult::new("A.java", FileStatus::Unchanged));
        results.files.push(FileResult::failed(
            "B.java",
            FileError::Io {
                message: "denied".to_string(),
            },
        ));
        let mut c = FileResult::new("C.java", FileStatus::Changed);
        c.findings.push(Finding::new("here", Some(3)));
        results.files.push(c);
        results.files.push(FileResult::skipped("D.java"));
        results.finish();

        assert_eq!(results.changed_count(), 1);
        assert_eq!(results.failed_count(), 1);
        assert_eq!(results.skipped_count(), 1);
        assert_eq!(results.finding_count(), 1);
        assert!(results.has_errors());
        assert!(results.duration_ms().is_some());
        assert!(results.file(std::path::Path::new("C.java")).is_some());
    }

    #[test]
    fn test_file_error_serializes_with_kind() {
        let err = FileError::Print(PrintError::new("missing separator"));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "print");
        assert_eq!(json["message"], "missing separator");
    }
}
