//! dialog-lite command line interface
//!
//! # Usage
//!
//! ```bash
//! # Render every component under descriptors/ into target/dialog-lite
//! dialog-lite build
//!
//! # Explicit roots, abort on any layout problem
//! dialog-lite build --source model/ --target out/ --terminate-on InvalidLayout,InvalidContainer
//!
//! # Render without writing, report as JSON
//! dialog-lite check --json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

use dialog_lite_core::{BuildReport, HandlerChains, PluginRuntime, PluginSettings, SettingsLoader};

#[derive(Parser)]
#[command(name = "dialog-lite")]
#[command(version)]
#[command(about = "Render component descriptors into authoring dialog XML")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print the build report as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render all components and write the XML files
    Build(BuildArgs),

    /// Render all components without writing anything
    Check(BuildArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Settings file (defaults to ./dialog-lite.yaml when present)
    #[arg(long, env = "DIALOG_LITE_CONFIG")]
    config: Option<PathBuf>,

    /// Descriptor directory or file
    #[arg(long)]
    source: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    target: Option<PathBuf>,

    /// Only process types under this package
    #[arg(long)]
    package_base: Option<String>,

    /// Error kinds that abort the build: "all", "all,!Kind" or a kind list
    #[arg(long)]
    terminate_on: Option<String>,
}

impl BuildArgs {
    /// Settings file and environment first, then flags.
    fn settings(&self) -> Result<PluginSettings> {
        let loader = match &self.config {
            Some(path) => SettingsLoader::new(Some(path.clone())),
            None => SettingsLoader::from_env(),
        };
        let mut settings = loader.load()?;
        if let Some(source) = &self.source {
            settings.source_root = source.clone();
        }
        if let Some(target) = &self.target {
            settings.target_root = target.clone();
        }
        if let Some(base) = &self.package_base {
            settings.package_base = base.clone();
        }
        if let Some(terminate_on) = &self.terminate_on {
            settings.terminate_on = terminate_on.clone();
        }
        settings.validate()?;
        debug!(?settings, "settings resolved");
        Ok(settings)
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Build(args) => run(args, true),
        Commands::Check(args) => run(args, false),
    };

    match result.and_then(|report| print_report(&report, cli.json).map(|_| report)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let output = serde_json::json!({ "error": format!("{:#}", e) });
                println!("{}", output);
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &BuildArgs, write: bool) -> Result<BuildReport> {
    let settings = args.settings()?;
    let source_root = settings.source_root.clone();
    let runtime = PluginRuntime::new(settings, HandlerChains::default())
        .with_context(|| format!("Failed to load descriptors from {}", source_root.display()))?;
    let report = if write { runtime.run()? } else { runtime.check()? };
    Ok(report)
}

fn print_report(report: &BuildReport, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("JSON serialization failed")?
        );
        return Ok(());
    }

    println!(
        "{} {} component(s), {} file(s) written",
        "OK".green().bold(),
        report.components.len(),
        report.files.len()
    );
    for component in &report.components {
        println!("  {}", component);
    }
    if !report.issues.is_empty() {
        println!("{} {} issue(s)", "WARN".yellow().bold(), report.issues.len());
        for issue in &report.issues {
            println!("  [{}] {}", issue.kind.yellow(), issue.message);
        }
    }
    Ok(())
}
