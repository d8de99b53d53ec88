/*!
# Recipe Runner

Applies an ordered recipe list to a set of files.

1. Every file is read and parsed once, in parallel.
2. The type table is built from the bundled stubs, the classpath
   directories and every parsed Java source.
3. Files are processed in parallel; within a file the recipes run in order
   (each followed by its chained recipes), every recipe seeing the edits of
   the previous ones.
4. Changed files are printed, diffed and, outside dry runs, written back
   atomically.

A failing recipe only loses its own edits on that file. The cancel flag is
checked before each file and between recipes; files not finished when it
is raised are reported as skipped and left untouched.
*/

pub mod change_set;
pub mod diff;
pub mod source;

pub use change_set::ChangeSet;
pub use source::{discover, discover_classpath, round_trip, SourceFilter, SourceKind};

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::core::{
    read_source_file, write_atomic, FileError, FileResult, FileStatus, Finding, LineIndex,
    ParseError, RecipeApplicationError, RewriteError, RewriteResult, RunResults, SourceText,
    TypeResolutionError,
};
use crate::parser::ast::CompilationUnit;
use crate::parser::{printer, JavaParser};
use crate::recipes::{flatten, Recipe};
use crate::text::{walk_plain_text, walk_properties, FileContext, PropertiesFile};
use crate::types::{TypeTable, TypeTableBuilder};
use crate::visitor::{apply_import_edits, walk_compilation_unit, JavaVisitor, VisitContext};

/// Follow-up visits a single recipe may schedule on one file
const MAX_VISITS_PER_RECIPE: usize = 256;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Report changes without writing files
    pub dry_run: bool,
    /// Worker threads, `0` for one per CPU
    pub threads: usize,
    /// Directories of Java sources that only contribute types
    pub classpath: Vec<PathBuf>,
    pub cancel: Arc<AtomicBool>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            threads: 0,
            classpath: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// A file as read from disk, parsed according to its kind.
struct Loaded {
    path: PathBuf,
    source: SourceText,
    parsed: Parsed,
}

enum Parsed {
    Java(Arc<CompilationUnit>),
    Properties(PropertiesFile),
    PlainText,
}

/// Recipe output for one file before it is written.
struct Processed {
    result: FileResult,
    /// Rewritten text when it differs from the original
    rewritten: Option<String>,
}

pub struct RecipeRunner {
    recipes: Vec<Arc<dyn Recipe>>,
    options: RunOptions,
    progress: Option<ProgressBar>,
}

impl RecipeRunner {
    /// `recipes` run in the given order, each followed by its chained
    /// recipes.
    pub fn new(recipes: &[Arc<dyn Recipe>], options: RunOptions) -> Self {
        Self {
            recipes: recipes.iter().flat_map(flatten).collect(),
            options,
            progress: None,
        }
    }

    /// Advances `bar` once per processed file.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Recipe names in application order, chained recipes included.
    pub fn recipe_names(&self) -> Vec<String> {
        self.recipes.iter().map(|r| r.name().to_string()).collect()
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.options.cancel.clone()
    }

    fn cancelled(&self) -> bool {
        self.options.cancel.load(Ordering::Relaxed)
    }

    /// Runs the recipes over `files` and writes the changed ones back
    /// (unless this is a dry run).
    pub fn run(&self, files: &[PathBuf]) -> RewriteResult<RunResults> {
        let pool = self.pool()?;
        pool.install(|| {
            let loaded = files.par_iter().map(|path| load(path)).collect();
            self.run_loaded(loaded, true)
        })
    }

    /// Runs the recipes over in-memory sources. Nothing is read from or
    /// written to disk except classpath directories; the rewritten text is
    /// in each changed file's change set.
    pub fn run_sources(&self, sources: &[(PathBuf, String)]) -> RewriteResult<RunResults> {
        let pool = self.pool()?;
        pool.install(|| {
            let loaded = sources
                .par_iter()
                .map(|(path, text)| parse(path, SourceText::utf8(text.clone())))
                .collect();
            self.run_loaded(loaded, false)
        })
    }

    fn pool(&self) -> RewriteResult<rayon::ThreadPool> {
        Ok(rayon::ThreadPoolBuilder::new()
            .num_threads(self.thread_count())
            .build()?)
    }

    fn thread_count(&self) -> usize {
        match self.options.threads {
            0 => num_cpus::get(),
            n => n,
        }
    }

    fn run_loaded(&self, loaded: Vec<Result<Loaded, FileResult>>, write: bool) -> RewriteResult<RunResults> {
        let dry_run = self.options.dry_run || !write;
        let mut results = RunResults::new(self.recipe_names(), dry_run);
        info!(
            "Running {} recipe(s) over {} file(s) with {} thread(s)",
            self.recipes.len(),
            loaded.len(),
            self.thread_count()
        );

        let types = self.type_table(&loaded)?;

        results.files = loaded
            .into_par_iter()
            .map(|entry| {
                let result = match entry {
                    Err(failed) => failed,
                    Ok(loaded) if self.cancelled() => FileResult::skipped(loaded.path),
                    Ok(loaded) => self.finish_file(&loaded, &types, dry_run),
                };
                if let Some(bar) = &self.progress {
                    bar.inc(1);
                }
                result
            })
            .collect();

        results.metadata.cancelled = self.cancelled();
        results.finish();
        info!(
            "Run finished: {} changed, {} failed, {} skipped, {} finding(s)",
            results.changed_count(),
            results.failed_count(),
            results.skipped_count(),
            results.finding_count()
        );
        Ok(results)
    }

    fn type_table(&self, loaded: &[Result<Loaded, FileResult>]) -> RewriteResult<TypeTable> {
        let mut builder = TypeTableBuilder::new()
            .with_classpath()
            .map_err(|source| RewriteError::Parse {
                path: PathBuf::from("<bundled classpath>"),
                source,
            })?;

        let classpath = discover_classpath(&self.options.classpath)
            .map_err(|e| RewriteError::io(self.options.classpath.first().cloned().unwrap_or_default(), e))?;
        let parser = JavaParser::new();
        for path in classpath {
            let unit = read_source_file(&path)
                .map_err(|e| e.to_string())
                .and_then(|source| parser.parse_text(&source.text).map_err(|e| e.to_string()));
            match unit {
                Ok(unit) => builder.add_library(Arc::new(unit)),
                Err(e) => warn!("Skipping classpath source {}: {}", path.display(), e),
            }
        }

        for entry in loaded.iter().flatten() {
            if let Parsed::Java(cu) = &entry.parsed {
                builder.add_source(cu.clone());
            }
        }

        let (types, warnings) = builder.build();
        for warning in &warnings {
            debug!("Type table: {}", warning);
        }
        debug!("Type table holds {} types", types.len());
        Ok(types)
    }

    /// Applies the recipes to one loaded file and writes it back if needed.
    fn finish_file(&self, loaded: &Loaded, types: &TypeTable, dry_run: bool) -> FileResult {
        let Processed { mut result, rewritten } = self.process(loaded, types);
        let Some(text) = rewritten else {
            return result;
        };
        if result.status == FileStatus::Skipped || dry_run {
            return result;
        }
        if let Err(e) = write_atomic(&loaded.path, &text, loaded.source.encoding) {
            warn!("Cannot write {}: {}", loaded.path.display(), e);
            result.status = FileStatus::Failed;
            result.errors.push(FileError::Io { message: e.to_string() });
        }
        result
    }

    fn process(&self, loaded: &Loaded, types: &TypeTable) -> Processed {
        let path = loaded.path.as_path();
        let original = loaded.source.text.as_str();
        let mut result = FileResult::new(path, FileStatus::Unchanged);

        let printed = match &loaded.parsed {
            Parsed::Java(cu) => self.process_java(path, cu, types, &mut result),
            Parsed::Properties(file) => Ok(self.process_properties(path, file, &mut result)),
            Parsed::PlainText => Ok(self.process_plain_text(path, original, &mut result)),
        };

        let index = LineIndex::new(original);
        for finding in &mut result.findings {
            finding.position = finding.offset.map(|offset| index.to_position(offset));
        }

        if result.status == FileStatus::Skipped {
            return Processed { result, rewritten: None };
        }
        match printed {
            Err(e) => {
                warn!("Cannot print {}: {}", path.display(), e);
                result.status = FileStatus::Failed;
                result.errors.push(e);
                Processed { result, rewritten: None }
            }
            Ok(text) if text != original => {
                result.status = FileStatus::Changed;
                let display = path.to_string_lossy().replace('\\', "/");
                result.change_set = Some(ChangeSet::new(&display, original.to_string(), text.clone()));
                Processed { result, rewritten: Some(text) }
            }
            Ok(_) => Processed { result, rewritten: None },
        }
    }

    /// Recipes applicable to `path`, stopping at cancellation.
    fn recipes_for<'r>(&'r self, path: &'r Path, result: &'r mut FileResult) -> impl Iterator<Item = &'r Arc<dyn Recipe>> + 'r {
        self.recipes.iter().filter(move |recipe| {
            if result.status == FileStatus::Skipped {
                return false;
            }
            if self.cancelled() {
                debug!("Cancelled before {} on {}", recipe.name(), path.display());
                result.status = FileStatus::Skipped;
                return false;
            }
            recipe.accepts_path(path)
        })
    }

    fn process_java(
        &self,
        path: &Path,
        cu: &Arc<CompilationUnit>,
        types: &TypeTable,
        result: &mut FileResult,
    ) -> Result<String, FileError> {
        let mut current = cu.clone();
        let mut findings: Vec<(String, Vec<Finding>)> = Vec::new();
        let mut warnings: Vec<TypeResolutionError> = Vec::new();
        let mut applied: Vec<String> = Vec::new();
        let mut errors: Vec<FileError> = Vec::new();

        for recipe in self.recipes_for(path, result) {
            let name = recipe.name();
            if let Some(test) = recipe.applicable_test() {
                match apply_java(test, &current, types, path) {
                    Ok(outcome) if outcome.findings.is_empty() => {
                        debug!("{} not applicable to {}", name, path.display());
                        continue;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        errors.push(recipe_error(e, name, path));
                        continue;
                    }
                }
            }
            let Some(visitor) = recipe.java_visitor() else { continue };
            match apply_java(visitor, &current, types, path) {
                Ok(outcome) => {
                    if !Arc::ptr_eq(&outcome.unit, &current) {
                        debug!("{} changed {}", name, path.display());
                        applied.push(name.to_string());
                        current = outcome.unit;
                    }
                    findings.push((name.to_string(), outcome.findings));
                    for warning in outcome.warnings {
                        if !warnings.contains(&warning) {
                            warnings.push(warning);
                        }
                    }
                }
                Err(e) => errors.push(recipe_error(e, name, path)),
            }
        }

        result.findings.extend(tag_findings(findings));
        result.warnings.extend(warnings);
        result.applied_recipes.extend(applied);
        result.errors.extend(errors);
        printer::print(&current).map_err(FileError::Print)
    }

    fn process_properties(&self, path: &Path, file: &PropertiesFile, result: &mut FileResult) -> String {
        let mut current = file.clone();
        let mut findings = Vec::new();
        let mut applied = Vec::new();
        let mut errors = Vec::new();

        for recipe in self.recipes_for(path, result) {
            let Some(mut visitor) = recipe.properties_visitor() else { continue };
            let mut ctx = FileContext::new(path);
            match walk_properties(visitor.as_mut(), &current, &mut ctx) {
                Ok(next) => {
                    if let Some(next) = next {
                        applied.push(recipe.name().to_string());
                        current = next;
                    }
                    findings.push((recipe.name().to_string(), ctx.into_findings()));
                }
                Err(e) => errors.push(recipe_error(e, recipe.name(), path)),
            }
        }

        result.findings.extend(tag_findings(findings));
        result.applied_recipes.extend(applied);
        result.errors.extend(errors);
        current.print()
    }

    fn process_plain_text(&self, path: &Path, text: &str, result: &mut FileResult) -> String {
        let mut current = text.to_string();
        let mut findings = Vec::new();
        let mut applied = Vec::new();
        let mut errors = Vec::new();

        for recipe in self.recipes_for(path, result) {
            let Some(mut visitor) = recipe.plain_text_visitor() else { continue };
            let mut ctx = FileContext::new(path);
            match walk_plain_text(visitor.as_mut(), &current, &mut ctx) {
                Ok(next) => {
                    if let Some(next) = next {
                        applied.push(recipe.name().to_string());
                        current = next;
                    }
                    findings.push((recipe.name().to_string(), ctx.into_findings()));
                }
                Err(e) => errors.push(recipe_error(e, recipe.name(), path)),
            }
        }

        result.findings.extend(tag_findings(findings));
        result.applied_recipes.extend(applied);
        result.errors.extend(errors);
        current
    }
}

fn load(path: &Path) -> Result<Loaded, FileResult> {
    let source = read_source_file(path).map_err(|e| {
        warn!("Cannot read {}: {}", path.display(), e);
        FileResult::failed(path, FileError::Io { message: e.to_string() })
    })?;
    parse(path, source)
}

fn parse(path: &Path, source: SourceText) -> Result<Loaded, FileResult> {
    let parse_failed = |e: ParseError| {
        warn!("Cannot parse {}: {}", path.display(), e);
        FileResult::failed(path, FileError::Parse(e))
    };
    let parsed = match SourceKind::of(path) {
        SourceKind::Java => Parsed::Java(Arc::new(JavaParser::new().parse_text(&source.text).map_err(parse_failed)?)),
        SourceKind::Properties => Parsed::Properties(PropertiesFile::parse(&source.text).map_err(parse_failed)?),
        SourceKind::PlainText => Parsed::PlainText,
    };
    Ok(Loaded {
        path: path.to_path_buf(),
        source,
        parsed,
    })
}

fn recipe_error(error: RecipeApplicationError, recipe: &str, path: &Path) -> FileError {
    let error = error.with_recipe(recipe);
    warn!("{} on {}", error, path.display());
    FileError::Recipe(error)
}

fn tag_findings(per_recipe: Vec<(String, Vec<Finding>)>) -> impl Iterator<Item = Finding> {
    per_recipe.into_iter().flat_map(|(recipe, findings)| {
        findings.into_iter().map(move |mut finding| {
            finding.recipe = recipe.clone();
            finding
        })
    })
}

/// What one Java visitor and its follow-up visits produced.
struct JavaOutcome {
    unit: Arc<CompilationUnit>,
    findings: Vec<Finding>,
    warnings: Vec<TypeResolutionError>,
}

/// Runs `visitor` over `cu`, then every visitor scheduled along the way,
/// applying import edits after each walk.
fn apply_java(
    visitor: Box<dyn JavaVisitor>,
    cu: &Arc<CompilationUnit>,
    types: &TypeTable,
    path: &Path,
) -> Result<JavaOutcome, RecipeApplicationError> {
    let mut queue: VecDeque<Box<dyn JavaVisitor>> = VecDeque::from([visitor]);
    let mut outcome = JavaOutcome {
        unit: cu.clone(),
        findings: Vec::new(),
        warnings: Vec::new(),
    };
    let mut visits = 0;
    while let Some(mut visitor) = queue.pop_front() {
        visits += 1;
        if visits > MAX_VISITS_PER_RECIPE {
            return Err(RecipeApplicationError::new(format!(
                "more than {} follow-up visits scheduled",
                MAX_VISITS_PER_RECIPE
            )));
        }
        let mut ctx = VisitContext::new(types, &outcome.unit, path);
        let walked = walk_compilation_unit(visitor.as_mut(), &outcome.unit, &mut ctx)?;
        let visit = ctx.finish();
        outcome.unit = apply_import_edits(&walked, &visit.imports, types, path)?;
        outcome.findings.extend(visit.findings);
        outcome.warnings.extend(visit.warnings);
        queue.extend(visit.after_visits);
    }
    Ok(outcome)
}
