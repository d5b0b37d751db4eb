use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use shredder::{
    config::{self, Config},
    stream::PassProgress,
    Shredder,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Shredder - overwrite files in place with cryptographically random data
#[derive(Parser)]
#[command(name = "shredder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "shredder.json")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Overwrite one or more files with random data
    Shred {
        /// Files to shred, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Number of overwrite passes (overrides config and environment)
        #[arg(short = 'n', long)]
        passes: Option<usize>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,

        /// Do not show progress bars
        #[arg(short, long)]
        quiet: bool,
    },

    /// Write a configuration file
    Init {
        /// Number of overwrite passes to store
        #[arg(short = 'n', long, default_value_t = config::DEFAULT_PASS_COUNT)]
        passes: usize,
    },

    /// Show the effective configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Use RUST_LOG environment variable to control log level (e.g., RUST_LOG=info,shredder=debug)
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    info!(command = ?cli.command, "shredder starting");

    match cli.command {
        Commands::Shred {
            files,
            passes,
            yes,
            quiet,
        } => cmd_shred(&cli.config, files, passes, yes, quiet).await,

        Commands::Init { passes } => cmd_init(&cli.config, passes).await,

        Commands::Status => cmd_status(&cli.config).await,
    }
}

/// Progress bar covering every pass over one file
fn create_progress_bar(path: &Path) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message(path.display().to_string());
    pb
}

fn confirm(files: &[PathBuf]) -> Result<bool> {
    println!("The following files will be overwritten and cannot be recovered:");
    for file in files {
        println!("  {}", file.display());
    }
    print!("Continue? [y/N]: ");
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().eq_ignore_ascii_case("y"))
}

/// Shred each file in turn, stopping at the first failure
async fn cmd_shred(
    config_path: &str,
    files: Vec<PathBuf>,
    passes: Option<usize>,
    yes: bool,
    quiet: bool,
) -> Result<()> {
    let cfg = Config::load_with_env(Some(config_path))?.with_pass_override(passes)?;

    if !yes && !confirm(&files)? {
        println!("Cancelled.");
        return Ok(());
    }

    let shredder = Arc::new(Shredder::from_config(&cfg));

    for path in files {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            create_progress_bar(&path)
        };

        let worker = Arc::clone(&shredder);
        let bar = pb.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || {
            worker.shred_with_progress(&target, |p: PassProgress| {
                bar.set_length(p.bytes * p.passes as u64);
                bar.set_position(p.bytes * p.pass as u64);
            })
        })
        .await
        .context("shred worker panicked")?
        .with_context(|| format!("shredding {}", path.display()))?;

        pb.finish_with_message(format!("{} ({} passes)", path.display(), cfg.pass_count));
        if quiet {
            println!("Shredded {}", path.display());
        }
    }

    Ok(())
}

/// Write a configuration file with the given pass count
async fn cmd_init(config_path: &str, passes: usize) -> Result<()> {
    if fs::try_exists(config_path).await.unwrap_or(false) {
        anyhow::bail!(
            "Configuration file '{}' already exists. Remove it first or use a different path.",
            config_path
        );
    }

    let cfg = Config::new(passes);
    cfg.validate()?;

    let config_json = serde_json::to_string_pretty(&cfg)?;
    fs::write(config_path, config_json)
        .await
        .with_context(|| format!("writing config to '{}'", config_path))?;

    println!("Config:  {}", config_path);
    println!("Passes:  {}", cfg.pass_count);
    Ok(())
}

/// Show the effective configuration and where it came from
async fn cmd_status(config_path: &str) -> Result<()> {
    let file_exists = fs::try_exists(config_path).await.unwrap_or(false);
    let cfg = Config::load_with_env(Some(config_path))?;

    println!("Shredder Status");
    println!();
    println!("Configuration:");
    println!(
        "  Config file:   {} ({})",
        config_path,
        if file_exists { "present" } else { "missing, using defaults" }
    );
    if let Ok(raw) = std::env::var(config::ENV_PASS_COUNT) {
        println!("  Env override:  {}={}", config::ENV_PASS_COUNT, raw);
    }
    println!("  Passes:        {}", cfg.pass_count);

    Ok(())
}
