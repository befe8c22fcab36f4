// SPDX-License-Identifier: PMPL-1.0-or-later

//! stat-mapper: maps trade-site stat texts to the game's stat descriptions
//!
//! Reads an extracted content directory and a trade stats document and
//! writes `stats.json` / `mods.json` for downstream item parsers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stat_mapper::config::Config;
use stat_mapper::content::DirectoryContent;
use stat_mapper::export::{Artifact, ExportJob};
use stat_mapper::report;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "stat-mapper.log";

#[derive(Parser)]
#[command(name = "stat-mapper")]
#[command(version)]
#[command(about = "Resolve trade-site stat texts to localized stat descriptions")]
#[command(long_about = None)]
struct Cli {
    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export stats.json and mods.json from extracted game content
    Export {
        /// Extracted content directory (holds Metadata/ and Data/)
        #[arg(value_name = "CONTENT_DIR")]
        content_dir: PathBuf,

        /// Directory the artifacts are written to
        #[arg(value_name = "OUTPUT_DIR")]
        output_dir: PathBuf,

        /// Trade stats document (api/trade/data/stats)
        #[arg(short, long)]
        taxonomy: Option<PathBuf>,

        /// YAML or JSON configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Artifacts to produce (default: all)
        #[arg(long, value_enum)]
        only: Vec<Artifact>,

        /// Match taxonomy entries on all cores
        #[arg(long)]
        parallel: bool,

        /// Log file (default: OUTPUT_DIR/stat-mapper.log)
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Parse description files and print what they contain
    Inspect {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// YAML or JSON configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_filter = if verbose {
        "stat_mapper=debug"
    } else {
        "stat_mapper=info"
    };
    let file_layer = match log_file {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            content_dir,
            output_dir,
            taxonomy,
            config,
            only,
            parallel,
            log_file,
        } => {
            fs::create_dir_all(&output_dir)
                .with_context(|| format!("creating {}", output_dir.display()))?;
            let log_file = log_file.unwrap_or_else(|| output_dir.join(LOG_FILE_NAME));
            init_logging(cli.verbose, Some(&log_file))?;

            let mut config = load_config(config.as_deref())?;
            config.parallel |= parallel;
            let artifacts = if only.is_empty() {
                Artifact::ALL.to_vec()
            } else {
                only
            };

            tracing::info!(
                content = %content_dir.display(),
                output = %output_dir.display(),
                "starting export"
            );
            let content = DirectoryContent::new(&content_dir);
            let job = ExportJob {
                content: &content,
                output_dir: &output_dir,
                taxonomy: taxonomy.as_deref(),
                config: &config,
                artifacts,
            };
            let export = job.run()?;
            report::print_export(&export);
            println!("Log saved to: {}", log_file.display());

            if !export.is_success() {
                std::process::exit(1);
            }
        }

        Commands::Inspect {
            files,
            config,
            json,
        } => {
            init_logging(cli.verbose, None)?;
            let config = load_config(config.as_deref())?;

            let summaries = files
                .iter()
                .map(|path| report::inspect_file(path, config.base_language()))
                .collect::<Result<Vec<_>>>()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                report::print_inspect(&summaries);
            }
        }
    }

    Ok(())
}
