//! CLI for xltower - extracts tower entries from XLSX files as JSON
//!
//! Usage:
//!   xltower_cli extract <input.xlsx>                 # Entries JSON to stdout
//!   xltower_cli extract <input.xlsx> -o out.json     # Entries JSON to file
//!   xltower_cli extract <input.xlsx> --summaries     # Entries plus layer summaries
//!   xltower_cli extract <input.xlsx> --sort-by-limit # Largest layer first
//!   xltower_cli preflight <input.xlsx>               # Extraction readiness report

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use xltower::parser::load_sheet;
use xltower::{parse_limit_for_sort, preflight_file, CarrierMatcher, Extractor};

#[derive(Parser)]
#[command(name = "xltower_cli", version, about = "Extract insurance tower structure from XLSX")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract carrier entries
    Extract {
        input: PathBuf,
        /// Worksheet name (default: the active sheet)
        #[arg(long)]
        sheet: Option<String>,
        /// Carrier registry YAML (default: bundled registry)
        #[arg(long)]
        carriers: Option<PathBuf>,
        /// Also emit per-layer summaries
        #[arg(long)]
        summaries: bool,
        /// Order entries by layer limit, largest first (default: sheet order)
        #[arg(long)]
        sort_by_limit: bool,
        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report whether extraction is likely to succeed
    Preflight {
        input: PathBuf,
        #[arg(long)]
        sheet: Option<String>,
    },
}

/// `-v` wins over `RUST_LOG`; without either the level is `warn`.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Extract {
            input,
            sheet,
            carriers,
            summaries,
            sort_by_limit,
            output,
        } => cmd_extract(
            &input,
            sheet.as_deref(),
            carriers.as_deref(),
            ExtractFlags {
                summaries,
                sort_by_limit,
            },
            output.as_deref(),
        ),
        Commands::Preflight { input, sheet } => cmd_preflight(&input, sheet.as_deref()),
    }
}

#[derive(Clone, Copy)]
struct ExtractFlags {
    summaries: bool,
    sort_by_limit: bool,
}

fn cmd_extract(
    input: &Path,
    sheet: Option<&str>,
    carriers: Option<&Path>,
    flags: ExtractFlags,
    output: Option<&Path>,
) -> Result<()> {
    let matcher = match carriers {
        Some(path) => Arc::new(
            CarrierMatcher::from_path(path)
                .with_context(|| format!("Failed to load carrier registry {}", path.display()))?,
        ),
        None => CarrierMatcher::bundled(),
    };

    let grid = load_sheet(input, sheet).with_context(|| format!("Failed to read {}", input.display()))?;
    let mut extraction = Extractor::new(matcher).extract(&grid);
    if extraction.is_empty() {
        tracing::warn!("No carrier entries found in {}", input.display());
    }
    if flags.sort_by_limit {
        extraction.entries.sort_by(|a, b| {
            parse_limit_for_sort(&b.layer_limit).total_cmp(&parse_limit_for_sort(&a.layer_limit))
        });
    }

    if flags.summaries {
        write_json(&extraction, output)
    } else {
        write_json(&extraction.entries, output)
    }
}

fn cmd_preflight(input: &Path, sheet: Option<&str>) -> Result<()> {
    let report =
        preflight_file(input, sheet).with_context(|| format!("Failed to read {}", input.display()))?;
    write_json(&report, None)
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    match output {
        Some(path) => {
            fs::write(path, &json).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Written: {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}
