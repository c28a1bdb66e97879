//! photokw - photo keyword helper
//!
//! Synchronizes the hierarchical keyword, people, event and location tags of
//! photo files with the catalog's keyword export, and adds reverse-geocoded
//! place names from embedded GPS positions.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use photokw_common::config::{default_config_path, TomlConfig};
use photokw_common::keywords::indented::{render, write_keyword_file};
use photokw_tagger::services::{watch, FileScanner, Processor, ReadOptions, Remapper};
use photokw_tagger::tags::ExifTool;
use photokw_tagger::{Overrides, Settings};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for photokw
#[derive(Parser, Debug)]
#[command(name = "photokw")]
#[command(about = "Keep photo keyword, people and location tags in sync with the catalog")]
#[command(version)]
struct Cli {
    /// Don't really do the work
    #[arg(short, long, global = true)]
    dry_run: bool,

    /// Be chatty. More is more chatty!
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Turn off colored output
    #[arg(short, long, global = true)]
    no_color: bool,

    /// Program configuration file
    #[arg(short, long, global = true, env = "PHOTOKW_CONFIG")]
    config_file: Option<PathBuf>,

    /// Keywords list exported from the catalog
    #[arg(short, long, global = true)]
    keyword_file: Option<PathBuf>,

    /// exiftool executable
    #[arg(long, global = true, default_value = "exiftool", env = "PHOTOKW_EXIFTOOL")]
    exiftool: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Inputs {
    /// Descend into directories
    #[arg(short, long)]
    recursive: bool,

    /// Files or directories to process
    #[arg(required = true)]
    files_or_dirs: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved configuration
    Config,

    /// Fix keywords, people, event and location tags
    Fix {
        /// Disable GPS to location look up
        #[arg(short = 'G', long)]
        no_geo: bool,

        #[command(flatten)]
        inputs: Inputs,
    },

    /// Print XMP and EXIF tags as JSON
    Dump {
        /// Skip EXIF tags
        #[arg(short = 'E', long)]
        no_exif: bool,

        /// Skip XMP tags
        #[arg(short = 'X', long)]
        no_xmp: bool,

        #[command(flatten)]
        inputs: Inputs,
    },

    /// Build a catalog keyword list from the files' keywords
    Keywords {
        /// Use keywords as they are
        #[arg(short = 'F', long)]
        no_fix: bool,

        /// Disable GPS to location look up
        #[arg(short = 'G', long)]
        no_geo: bool,

        /// Write the list to a file (CRLF line endings) instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        inputs: Inputs,
    },

    /// List files having a keyword containing KEYWORD
    Find {
        keyword: String,

        #[command(flatten)]
        inputs: Inputs,
    },

    /// Watch a directory and fix files as they change
    Watch {
        /// Disable GPS to location look up
        #[arg(short = 'G', long)]
        no_geo: bool,

        /// Directory to watch
        #[arg(default_value = ".")]
        base: PathBuf,
    },

    /// Copy files from unsupported camera models and rewrite make/model
    Remap {
        #[command(flatten)]
        inputs: Inputs,
    },
}

fn init_tracing(cli: &Cli) {
    let level = match cli.verbose {
        0 => {
            let config_path = cli.config_file.clone().or_else(default_config_path);
            config_path
                .as_deref()
                .filter(|p| p.exists())
                .and_then(|p| TomlConfig::load(p).ok())
                .map(|c| c.logging.level)
                .unwrap_or_else(|| "info".to_string())
        }
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("photokw={level},photokw_tagger={level},photokw_common={level}"))
        }))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(!cli.no_color)
                .with_target(false),
        )
        .init();
}

fn scan(settings: &Settings, inputs: &Inputs) -> Vec<PathBuf> {
    FileScanner::new(settings.file_patterns.clone(), inputs.recursive).collect(&inputs.files_or_dirs)
}

fn report_unknown_people(processor: &Processor<'_>) {
    let unknown = processor.unknown_people();
    if !unknown.is_empty() {
        warn!("{} people without a people mapping: {}", unknown.len(), unknown.join(", "));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    info!("photokw {}", env!("CARGO_PKG_VERSION"));

    let overrides = Overrides {
        config_file: cli.config_file.clone(),
        keyword_file: cli.keyword_file.clone(),
        dry_run: cli.dry_run,
        verbose: cli.verbose,
    };
    let settings = Settings::load(overrides).context("Failed to resolve settings")?;
    let provider = ExifTool::new(&cli.exiftool);

    match cli.command {
        Command::Config => {
            print!("{}", settings.describe()?);
        }

        Command::Fix { no_geo, inputs } => {
            let files = scan(&settings, &inputs);
            let geocoder = settings.geocoder();
            let mut processor = Processor::new(&settings, &provider, geocoder.as_ref());
            processor.fix(&files, no_geo).await;
            report_unknown_people(&processor);
        }

        Command::Dump {
            no_exif,
            no_xmp,
            inputs,
        } => {
            let files = scan(&settings, &inputs);
            let geocoder = settings.geocoder();
            let mut processor = Processor::new(&settings, &provider, geocoder.as_ref());
            for value in processor.dump_all(&files, !no_xmp, !no_exif) {
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
        }

        Command::Keywords {
            no_fix,
            no_geo,
            output,
            inputs,
        } => {
            let files = scan(&settings, &inputs);
            let geocoder = settings.geocoder();
            let mut processor = Processor::new(&settings, &provider, geocoder.as_ref());
            let tree = processor
                .collect_keywords(&files, ReadOptions { no_fix, no_geo })
                .await;
            report_unknown_people(&processor);

            match output {
                Some(path) => write_output(&path, &tree, settings.dry_run)?,
                None => print!("{}", render(&tree).replace("\r\n", "\n")),
            }
        }

        Command::Find { keyword, inputs } => {
            let files = scan(&settings, &inputs);
            let geocoder = settings.geocoder();
            let mut processor = Processor::new(&settings, &provider, geocoder.as_ref());
            let found = processor.find(&keyword, &files).await;

            if found.is_empty() {
                println!("Keyword not found in any files.");
            } else {
                println!("Keyword found in the following files:");
                for file in found {
                    println!("  {}", file.display());
                }
            }
        }

        Command::Watch { no_geo, base } => {
            watch(settings, &provider, &base, no_geo)
                .await
                .context("Watch mode failed")?;
        }

        Command::Remap { inputs } => {
            let files = scan(&settings, &inputs);
            let mut remapper = Remapper::new(&settings, &provider);
            let copies = remapper.remap(&files);
            info!("Remapped {} files", copies.len());
        }
    }

    Ok(())
}

fn write_output(path: &Path, tree: &photokw_common::KeywordTree, dry_run: bool) -> Result<()> {
    if dry_run {
        info!("Would write {} top-level keywords to {}", tree.len(), path.display());
        return Ok(());
    }
    write_keyword_file(path, tree)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote keywords to {}", path.display());
    Ok(())
}
