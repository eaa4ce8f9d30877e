use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use output_cleaner_core::{
    collect_doctor_info, plan_clean, run_clean, CleanContext, CleanOptions, RuntimeFlags, Settings,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "output-cleaner",
    version,
    about = "Remove generated output and recorded state left behind by availability checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Delete generated output files and recorded rows.
    Clean(CleanArgs),
    /// Show what `clean` would delete without touching anything.
    Plan(PlanArgs),
    /// Show resolved settings and environment information.
    Doctor(ContextArgs),
}

#[derive(Debug, Args)]
struct ContextArgs {
    /// Settings JSON file. Built-in defaults are used when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Installation root used for local checkout detection (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    install_root: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ScopeArgs {
    /// Clean everything, including logs and persisted databases.
    #[arg(long)]
    all: bool,

    /// Only delete records produced while testing this file.
    #[arg(long, value_name = "PATH")]
    file_path: Option<String>,
}

#[derive(Debug, Args)]
struct CleanArgs {
    #[command(flatten)]
    context: ContextArgs,

    #[command(flatten)]
    scope: ScopeArgs,

    /// Suppress the run entirely (mirrors the checker's internal flag).
    #[arg(long)]
    do_not_clean: bool,

    /// Optional JSON report output file.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct PlanArgs {
    #[command(flatten)]
    context: ContextArgs,

    #[command(flatten)]
    scope: ScopeArgs,

    /// Optional JSON plan output file.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Clean(args) => run_clean_command(args),
        Commands::Plan(args) => run_plan_command(args),
        Commands::Doctor(args) => run_doctor_command(args),
    }
}

fn run_clean_command(args: CleanArgs) -> Result<()> {
    let mut context = build_context(&args.context)?.with_flags(RuntimeFlags {
        do_not_clean: args.do_not_clean,
    });
    let options = clean_options(&args.scope);

    let report = run_clean(&mut context, &options).context("cleanup failed")?;

    if report.skipped {
        println!("Cleanup skipped: do_not_clean is set.");
    } else {
        println!(
            "Cleaned ({:?}): {} file(s) deleted, {} already absent.",
            report.mode,
            report.deleted_files.len(),
            report.missing_files.len()
        );
        for table in &report.cleaned_tables {
            println!(
                "- {}: {} row(s) deleted",
                table.table_name, table.deleted_rows
            );
        }
        if report.config_reloaded {
            println!("Configuration reloaded.");
        }
    }

    if let Some(output) = args.output {
        write_json(&output, &report, "report")?;
        println!("Report written to {}", output.display());
    }

    Ok(())
}

fn run_plan_command(args: PlanArgs) -> Result<()> {
    let context = build_context(&args.context)?;
    let plan = plan_clean(&context, &clean_options(&args.scope)).context("planning failed")?;

    println!("Output root: {}", plan.output_root);
    println!(
        "Mode: {:?} | backend: {} | local checkout: {} | do_not_clean: {}",
        plan.mode,
        plan.db_type.as_str(),
        plan.local_checkout,
        plan.do_not_clean
    );
    println!("Files to delete: {}", plan.candidate_files.len());
    for path in plan.candidate_files.iter().chain(&plan.database_files) {
        println!("- {path}");
    }
    if !plan.targeted_tables.is_empty() {
        println!("Query: {}", plan.query_template);
        println!("Tables: {}", plan.targeted_tables.join(", "));
    }
    if plan.reload_config {
        println!("Configuration would be reloaded afterwards.");
    }

    if let Some(output) = args.output {
        write_json(&output, &plan, "plan")?;
        println!("Plan written to {}", output.display());
    }

    Ok(())
}

fn run_doctor_command(args: ContextArgs) -> Result<()> {
    let context = build_context(&args)?;
    let info = collect_doctor_info(&context);

    println!("OS: {} ({})", info.os, info.arch);
    if let Some(current_dir) = info.current_dir {
        println!("Current directory: {}", current_dir);
    }
    if let Some(settings_path) = info.settings_path {
        println!("Settings: {}", settings_path);
    }
    println!(
        "Output root: {} (exists: {})",
        info.output_root, info.output_root_exists
    );
    println!("Config directory: {}", info.config_directory);
    println!("Backend: {}", info.db_type.as_str());
    if let Some(sqlite_path) = info.sqlite_path {
        println!("SQLite database: {}", sqlite_path);
    }
    println!("Local checkout: {}", info.local_checkout);
    for note in info.notes {
        println!("Note: {}", note);
    }

    Ok(())
}

fn build_context(args: &ContextArgs) -> Result<CleanContext> {
    let install_root = match &args.install_root {
        Some(root) => root.clone(),
        None => env::current_dir().context("failed to resolve current directory")?,
    };

    match &args.config {
        Some(path) => {
            debug!("loading settings from {}", path.display());
            CleanContext::from_settings_file(path, install_root)
                .with_context(|| format!("failed to load settings from {}", path.display()))
        }
        None => Ok(CleanContext::new(Settings::default(), install_root)),
    }
}

fn clean_options(scope: &ScopeArgs) -> CleanOptions {
    CleanOptions {
        clean_all: scope.all,
        file_path: scope.file_path.clone(),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T, what: &str) -> Result<()> {
    let payload =
        serde_json::to_string_pretty(value).with_context(|| format!("failed to serialize {what}"))?;
    fs::write(path, payload)
        .with_context(|| format!("failed to write {what} to {}", path.display()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{clean_options, Cli, Commands};

    #[test]
    fn clean_flags_map_to_options() {
        let cli = Cli::parse_from([
            "output-cleaner",
            "clean",
            "--all",
            "--file-path",
            "hosts.txt",
            "--do-not-clean",
        ]);
        let Commands::Clean(args) = cli.command else {
            panic!("expected clean command");
        };
        let options = clean_options(&args.scope);
        assert!(options.clean_all);
        assert_eq!(options.file_path.as_deref(), Some("hosts.txt"));
        assert!(args.do_not_clean);
    }

    #[test]
    fn plan_defaults_to_partial_clean() {
        let cli = Cli::parse_from(["output-cleaner", "plan"]);
        let Commands::Plan(args) = cli.command else {
            panic!("expected plan command");
        };
        assert!(!args.scope.all);
        assert!(args.scope.file_path.is_none());
        assert!(args.context.config.is_none());
    }
}
