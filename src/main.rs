use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mjhn_icons::config::{read_config, ConfigError};
use mjhn_icons::export::{export, ExportError, ExportJob};
use mjhn_icons::icons::OUTPUT_SPEC;
use mjhn_icons::logger::{log_error, log_line, set_log_path};
use thiserror::Error;

/// Generate the mjhn favicon and app icon set from a source design.
#[derive(Debug, Parser)]
#[command(name = "mjhn-icons", version)]
struct Cli {
    /// Source design (`.txt` pixel art or a raster image)
    #[arg(long)]
    source: Option<PathBuf>,
    /// Small design used for the 16x16 browser icon
    #[arg(long)]
    tiny_source: Option<PathBuf>,
    /// Directory the icons are written to
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Config file to read instead of the default lookup
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also write icons.json for a web app manifest
    #[arg(long)]
    manifest: bool,
    /// Print the list of generated files and exit
    #[arg(long)]
    list: bool,
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("cannot print output list: {0}")]
    List(#[from] serde_json::Error),
}

fn run(cli: Cli) -> Result<(), AppError> {
    if cli.list {
        println!("{}", serde_json::to_string_pretty(OUTPUT_SPEC)?);
        return Ok(());
    }

    let mut cfg = read_config(cli.config.as_deref())?;
    if let Some(source) = cli.source {
        cfg.source = source;
    }
    if let Some(tiny) = cli.tiny_source {
        cfg.tiny_source = Some(tiny);
    }
    if let Some(out_dir) = cli.out_dir {
        cfg.out_dir = out_dir;
    }
    cfg.manifest |= cli.manifest;
    set_log_path(cfg.log_file.clone());

    log_line(&format!("RUN: {} -> {}", cfg.source.display(), cfg.out_dir.display()));
    let written = export(&ExportJob::from(&cfg))?;
    if !cli.quiet {
        for path in &written {
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            println!("- Generating: {}", name);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_error("export failed", &e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
