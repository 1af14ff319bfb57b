//! Name Analyzer CLI

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use name_analyzer::core::types::REDUNDANT_COMMENT_RULE_ID;
use name_analyzer::fixes::to_diagnostics;
use name_analyzer::output::{get_formatter, total_diagnostics, FileReport, OutputFormat};
use name_analyzer::{
    analyze, AnalysisError, ChangeSet, ChangeSetResolver, Config, LanguageVariant, SourceDocument,
    ViolationCategory,
};

#[derive(Parser)]
#[command(name = "name-analyzer")]
#[command(about = "Naming convention diagnostics for JavaScript and TypeScript")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files or directories and report violations
    Check {
        /// Files or directories to check
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Only report violations on lines changed since HEAD
        #[arg(long)]
        only_changed: bool,

        /// Output format
        #[arg(long, short = 'f', default_value = "text")]
        format: Format,

        /// Configuration file
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Run the language server over stdio
    Lsp,
    /// List rule identifiers
    Rules,
}

#[derive(Clone, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check {
            paths,
            only_changed,
            format,
            config,
            no_color,
        } => run_check(&paths, only_changed, format, config.as_deref(), no_color),
        Commands::Lsp => run_lsp(),
        Commands::Rules => run_rules(),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    // stdout carries LSP messages
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

fn run_check(
    paths: &[PathBuf],
    only_changed: bool,
    format: Format,
    config_path: Option<&Path>,
    no_color: bool,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let files = collect_files(paths, &config);
    if files.is_empty() {
        eprintln!("No JavaScript or TypeScript files found");
        return ExitCode::from(2);
    }
    tracing::debug!("Checking {} file(s)", files.len());

    let only_changed = only_changed || config.general.only_check_new_code;
    let change_sets = if only_changed {
        match resolve_change_sets(&files) {
            Ok(sets) => sets,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(2);
            }
        }
    } else {
        vec![None; files.len()]
    };

    let results: Vec<_> = files
        .par_iter()
        .zip(change_sets.par_iter())
        .map(|(path, changes)| -> Result<FileReport, AnalysisError> {
            let document = SourceDocument::read(path)?;
            let evaluation = analyze(&document, changes.as_ref(), &config)?;
            Ok(FileReport::new(
                path.clone(),
                to_diagnostics(&evaluation.violations),
            ))
        })
        .collect();

    let mut reports = Vec::with_capacity(results.len());
    let mut failures = 0;
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                eprintln!("Error: {}", e);
                failures += 1;
            }
        }
    }

    let format = match format {
        Format::Text => OutputFormat::Text,
        Format::Json => OutputFormat::Json,
    };
    let colored = !no_color && std::io::stdout().is_terminal();
    print!("{}", get_formatter(format, colored).format(&reports));

    if total_diagnostics(&reports) > 0 {
        ExitCode::FAILURE
    } else if failures > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, name_analyzer::ConfigError> {
    if let Some(path) = path {
        return Config::load(path);
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Ok(Config::find_and_load(&cwd).unwrap_or_default())
}

/// Expand directories and drop excluded or unsupported files
fn collect_files(paths: &[PathBuf], config: &Config) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if LanguageVariant::from_path(path).is_some() && !config.is_excluded(path) {
                files.push(path.clone());
            }
            continue;
        }

        for entry in walkdir::WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e.path()))
            .filter_map(|e| e.ok())
        {
            let file_path = entry.path();
            if file_path.is_file()
                && LanguageVariant::from_path(file_path).is_some()
                && !config.is_excluded(file_path)
            {
                files.push(file_path.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

fn is_skipped_dir(path: &Path) -> bool {
    path.is_dir()
        && matches!(
            path.file_name().and_then(|n| n.to_str()),
            Some("node_modules" | ".git")
        )
}

fn resolve_change_sets(files: &[PathBuf]) -> std::io::Result<Vec<Option<ChangeSet>>> {
    let runtime = runtime()?;
    let resolver = ChangeSetResolver::new();
    Ok(runtime.block_on(async {
        let mut sets = Vec::with_capacity(files.len());
        for file in files {
            sets.push(resolver.changed_lines(file).await);
        }
        sets
    }))
}

fn run_lsp() -> ExitCode {
    match runtime() {
        Ok(runtime) => {
            runtime.block_on(name_analyzer::lsp::run_server());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_rules() -> ExitCode {
    for category in ViolationCategory::ALL {
        println!("{:<10} {}", category.rule_id(), category.description());
    }
    println!(
        "{:<10} {}",
        REDUNDANT_COMMENT_RULE_ID, "Comment restates the code that follows it"
    );
    ExitCode::SUCCESS
}
