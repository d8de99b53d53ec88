/*!
# Spring Rewrite CLI

Command-line interface for the Java source rewrite engine.
*/

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use console::{style, Term};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use spring_rewrite::cli_common::{self, format_duration};
use spring_rewrite::config::{RecipeEntry, RunConfig};
use spring_rewrite::recipes::BUILTIN;
use spring_rewrite::reports::{ReportConfig, ReportFormat, ReportManager};
use spring_rewrite::runner::{self, RecipeRunner, SourceFilter, SourceKind};

#[derive(Parser)]
#[command(
    name = "spring-rewrite",
    version = env!("CARGO_PKG_VERSION"),
    about = "Lossless Java source rewriting with Spring / JAX-RS migration recipes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply recipes to source files and directories
    Run {
        /// Source files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Recipe to apply, in order (repeatable)
        #[arg(short, long = "recipe")]
        recipes: Vec<String>,

        /// Recipe parameter as RECIPE.KEY=VALUE (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Run configuration file (.toml, .yaml, .yml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory of Java sources contributing types only (repeatable)
        #[arg(long)]
        classpath: Vec<PathBuf>,

        /// Glob of files to include, relative to each directory (repeatable)
        #[arg(long)]
        include: Vec<String>,

        /// Glob of files to exclude, relative to each directory (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Report the changes without writing files
        #[arg(long)]
        dry_run: bool,

        /// Number of worker threads (all CPUs by default)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Report format
        #[arg(short = 'f', long, value_enum)]
        format: Option<ReportFormat>,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the built-in recipes
    List,

    /// Verify that files print back exactly as they were read
    Check {
        /// Source files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Validate a run configuration file
    Validate {
        /// Run configuration file (.toml, .yaml, .yml)
        config: PathBuf,
    },

    /// Write a starter run configuration
    InitConfig {
        /// Output file (.toml, .yaml, .yml)
        #[arg(short, long, default_value = "rewrite.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli_common::init_logging(cli.verbose) {
        eprintln!("{:#}", e);
    }

    let outcome = match cli.command {
        Commands::Run {
            paths,
            recipes,
            params,
            config,
            classpath,
            include,
            exclude,
            dry_run,
            threads,
            format,
            output,
        } => {
            let overrides = RunOverrides {
                recipes,
                params,
                classpath,
                include,
                exclude,
                dry_run,
                threads,
                format,
            };
            run_command(paths, config, overrides, output)
        }
        Commands::List => list_command(),
        Commands::Check { paths } => check_command(paths),
        Commands::Validate { config } => validate_command(config),
        Commands::InitConfig { output, force } => init_config_command(output, force),
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            cli_common::print_error(&format!("{:#}", e));
            std::process::exit(2);
        }
    }
}

/// Command line flags layered over the configuration file.
struct RunOverrides {
    recipes: Vec<String>,
    params: Vec<String>,
    classpath: Vec<PathBuf>,
    include: Vec<String>,
    exclude: Vec<String>,
    dry_run: bool,
    threads: Option<usize>,
    format: Option<ReportFormat>,
}

impl RunOverrides {
    fn apply(self, config: &mut RunConfig) -> Result<()> {
        if !self.recipes.is_empty() {
            config.recipes = self.recipes.into_iter().map(RecipeEntry::new).collect();
        }
        for param in &self.params {
            let (recipe, key, value) = parse_param(param)?;
            let entry = config
                .recipes
                .iter_mut()
                .find(|e| e.name == recipe)
                .with_context(|| format!("--param {} names recipe `{}` which is not part of the run", param, recipe))?;
            entry.params.insert(key.to_string(), value.to_string());
        }
        config.classpath.extend(self.classpath);
        config.include.extend(self.include);
        config.exclude.extend(self.exclude);
        config.dry_run |= self.dry_run;
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        Ok(())
    }
}

/// Splits `RECIPE.KEY=VALUE`.
fn parse_param(param: &str) -> Result<(&str, &str, &str)> {
    let Some((target, value)) = param.split_once('=') else {
        bail!("--param {} is not RECIPE.KEY=VALUE", param);
    };
    let Some((recipe, key)) = target.split_once('.') else {
        bail!("--param {} is not RECIPE.KEY=VALUE", param);
    };
    Ok((recipe, key, value))
}

fn run_command(paths: Vec<PathBuf>, config_path: Option<PathBuf>, overrides: RunOverrides, output: Option<PathBuf>) -> Result<bool> {
    let start = Instant::now();
    let mut config = match &config_path {
        Some(path) => RunConfig::load_from_file(path)?,
        None => RunConfig::default(),
    };
    overrides.apply(&mut config)?;

    let problems = config.validate();
    if !problems.is_empty() {
        for problem in &problems {
            cli_common::print_error(problem);
        }
        bail!("Invalid run configuration ({} problem(s))", problems.len());
    }

    for path in &paths {
        cli_common::validate_path(path, "Source path")?;
    }
    let filter = config.source_filter()?;
    let files = runner::discover(&paths, &filter).context("Failed to collect source files")?;
    if files.is_empty() {
        cli_common::print_warning("No source files found");
        return Ok(true);
    }
    info!("Collected {} source file(s)", files.len());

    let recipes = config.build_recipes()?;
    let progress = cli_common::file_progress(files.len());
    let runner = RecipeRunner::new(&recipes, config.run_options()).with_progress(progress.clone());
    let results = runner.run(&files)?;
    progress.finish_and_clear();

    let report_config = ReportConfig {
        format: config.format,
        include_diffs: config.dry_run,
        use_colors: output.is_none() && Term::stdout().is_term(),
    };
    let manager = ReportManager::with_config(report_config);
    match &output {
        Some(path) => manager.save_report(&results, config.format, path)?,
        None => print!("{}", manager.generate_report(&results, config.format)?),
    }

    let summary = format!(
        "{} file(s) changed{} in {}",
        results.changed_count(),
        if config.dry_run { " (dry run)" } else { "" },
        format_duration(start.elapsed())
    );
    if results.failed_count() > 0 || results.has_errors() {
        cli_common::print_warning(&format!("{}, {} file(s) with errors", summary, results.failed_count()));
        Ok(false)
    } else {
        cli_common::print_success(&summary);
        Ok(true)
    }
}

fn list_command() -> Result<bool> {
    let term = Term::stdout();
    term.write_line(&format!("{}", style("Built-in recipes").bold().cyan()))?;
    for descriptor in BUILTIN {
        term.write_line(&format!("  {:<40} {}", style(descriptor.name).green(), descriptor.description))?;
        if !descriptor.parameters.is_empty() {
            term.write_line(&format!("  {:<40} params: {}", "", descriptor.parameters.join(", ")))?;
        }
    }
    Ok(true)
}

fn check_command(paths: Vec<PathBuf>) -> Result<bool> {
    for path in &paths {
        cli_common::validate_path(path, "Source path")?;
    }
    let files = runner::discover(&paths, &SourceFilter::default()).context("Failed to collect source files")?;
    let mut broken = BTreeMap::new();
    for file in &files {
        let source = spring_rewrite::core::read_source_file(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        match runner::round_trip(SourceKind::of(file), &source.text) {
            Ok(None) => {}
            Ok(Some(_)) => {
                broken.insert(file.clone(), "printed text differs from the input".to_string());
            }
            Err(e) => {
                broken.insert(file.clone(), e.to_string());
            }
        }
    }

    for (file, problem) in &broken {
        cli_common::print_error(&format!("{}: {}", file.display(), problem));
    }
    if broken.is_empty() {
        cli_common::print_success(&format!("{} file(s) round-trip exactly", files.len()));
        Ok(true)
    } else {
        cli_common::print_warning(&format!("{} of {} file(s) do not round-trip", broken.len(), files.len()));
        Ok(false)
    }
}

fn validate_command(path: PathBuf) -> Result<bool> {
    let config = RunConfig::load_from_file(&path)?;
    let problems = config.validate();
    for problem in &problems {
        cli_common::print_error(problem);
    }
    if problems.is_empty() {
        cli_common::print_success(&format!("{} is valid", path.display()));
    }
    Ok(problems.is_empty())
}

fn init_config_command(output: PathBuf, force: bool) -> Result<bool> {
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }
    RunConfig::starter().save_to_file(&output)?;
    cli_common::print_success(&format!("Starter configuration written to {}", output.display()));
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("change-type.new=java.time.Instant").unwrap(),
            ("change-type", "new", "java.time.Instant")
        );
        assert!(parse_param("change-type=x").is_err());
        assert!(parse_param("change-type.new").is_err());
    }

    #[test]
    fn test_overrides_replace_recipes_and_add_params() {
        let mut config = RunConfig::starter();
        let overrides = RunOverrides {
            recipes: vec!["change-type".to_string()],
            params: vec!["change-type.old=java.util.List".to_string(), "change-type.new=java.util.Collection".to_string()],
            classpath: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            dry_run: false,
            threads: Some(3),
            format: Some(ReportFormat::Json),
        };
        overrides.apply(&mut config).unwrap();
        assert_eq!(config.recipes.len(), 1);
        assert_eq!(config.recipes[0].params["old"], "java.util.List");
        assert_eq!(config.threads, 3);
        assert!(config.dry_run);
        assert!(config.validate().is_empty());
    }
}
