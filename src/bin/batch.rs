//! Interactive batch-conversion CLI.
//!
//! A thin shim over the library crate: enumerates the input folder,
//! confirms overwrite behaviour with the user, runs
//! [`Converter::convert_folder`] and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use pdfmd::{
    ConvertProgressCallback, Converter, ConverterConfig, DeviceMode, ProgressCallback,
    SUPPORTED_EXTENSIONS,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a per-file progress bar with one log line
/// per converted, skipped or failed file.
struct CliProgressCallback {
    bar: ProgressBar,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            skipped: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        })
    }
}

impl ConvertProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
    }

    fn on_file_start(&self, name: &str, _index: usize, _total: usize) {
        self.bar.set_message(name.to_string());
    }

    fn on_file_complete(&self, name: &str, _index: usize, _total: usize, bytes: usize) {
        self.bar.println(format!(
            "  {} {name}  {}",
            green("✓"),
            dim(&format!("{bytes} bytes"))
        ));
        self.bar.inc(1);
    }

    fn on_file_skipped(&self, name: &str, _index: usize, _total: usize) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        self.bar
            .println(format!("  {} {name}  {}", dim("–"), dim("output exists, skipped")));
        self.bar.inc(1);
    }

    fn on_file_error(&self, name: &str, _index: usize, _total: usize, error: String) {
        self.failed.fetch_add(1, Ordering::SeqCst);

        // Keep the log line on one row; the full error went to tracing.
        let first_line = error.lines().next().unwrap_or("conversion failed");
        self.bar
            .println(format!("  {} {name}  {}", red("✗"), red(first_line)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _total_files: usize, _converted: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert everything in ./inputs to ./outputs, prompting before overwrite
  pdfmd-batch

  # Explicit folders
  pdfmd-batch --input-dir papers --output-dir papers-md

  # Overwrite existing outputs without asking
  pdfmd-batch --overwrite

  # Scripted use: never prompt, skip existing, machine-readable summary
  pdfmd-batch --no-input --json

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to a pdfium shared library for the default engine
  PDFMD_DEVICE      Device probe override: accelerated or cpu
"#;

/// Convert every PDF in a folder to Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "pdfmd-batch",
    version,
    about = "Convert every PDF in a folder to Markdown",
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Folder containing the PDF files to convert.
    #[arg(short, long, env = "PDFMD_INPUT_DIR", default_value = "inputs")]
    input_dir: PathBuf,

    /// Folder receiving the Markdown files.
    #[arg(short, long, env = "PDFMD_OUTPUT_DIR", default_value = "outputs")]
    output_dir: PathBuf,

    /// Overwrite existing Markdown files without prompting.
    #[arg(long)]
    overwrite: bool,

    /// Never prompt; existing outputs are skipped unless --overwrite is set.
    #[arg(long)]
    no_input: bool,

    /// Execution device for the engine: auto, accelerated, cpu.
    #[arg(long, env = "PDFMD_DEVICE", value_enum, default_value = "auto")]
    device: DeviceArg,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFMD_PASSWORD")]
    password: Option<String>,

    /// Print a JSON summary instead of human-readable output.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum DeviceArg {
    Auto,
    Accelerated,
    Cpu,
}

impl From<DeviceArg> for DeviceMode {
    fn from(v: DeviceArg) -> Self {
        match v {
            DeviceArg::Auto => DeviceMode::Auto,
            DeviceArg::Accelerated => DeviceMode::Accelerated,
            DeviceArg::Cpu => DeviceMode::Cpu,
        }
    }
}

#[derive(serde::Serialize)]
struct BatchSummary {
    input_dir: PathBuf,
    output_dir: PathBuf,
    found: usize,
    converted: Vec<PathBuf>,
    skipped: usize,
    failed: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar provides all the feedback that matters to the user;
    // suppress INFO-level library logs while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Enumerate inputs up front (for the prompt and the summary) ───────
    let pdf_files = list_pdfs(&cli.input_dir)
        .with_context(|| format!("Failed to read input folder {}", cli.input_dir.display()))?;

    if pdf_files.is_empty() {
        if !cli.quiet && !cli.json {
            println!("No PDF files found in {}", cli.input_dir.display());
            println!("Please add PDF files to the input folder.");
        }
        return Ok(());
    }

    if !cli.quiet && !cli.json {
        println!("{}", bold("=== PDF to Markdown Batch Conversion ==="));
        println!("\nFound {} PDF file(s):", pdf_files.len());
        for file in &pdf_files {
            println!("  - {}", file.display());
        }
    }

    // ── Overwrite confirmation ───────────────────────────────────────────
    let existing: Vec<PathBuf> = pdf_files
        .iter()
        .filter_map(|f| f.file_stem())
        .map(|stem| cli.output_dir.join(format!("{}.md", stem.to_string_lossy())))
        .filter(|dest| dest.exists())
        .collect();

    let overwrite = if cli.overwrite {
        true
    } else if existing.is_empty() || cli.no_input || cli.json {
        false
    } else {
        if !cli.quiet {
            println!("\nExisting output files found:");
            for dest in &existing {
                println!("  - {}", dest.display());
            }
        }
        let confirmed = Confirm::new()
            .with_prompt("Overwrite existing files?")
            .default(false)
            .interact()
            .context("Overwrite prompt failed")?;
        if !confirmed && !cli.quiet {
            println!("Skipping files that already exist...");
        }
        confirmed
    };

    // ── Build converter ──────────────────────────────────────────────────
    let progress = if show_progress {
        Some(CliProgressCallback::new())
    } else {
        None
    };

    let mut builder = ConverterConfig::builder().device(cli.device.clone().into());
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(ref cb) = progress {
        builder = builder.progress_callback(Arc::clone(cb) as ProgressCallback);
    }
    let config = builder.build().context("Invalid configuration")?;
    let converter = Converter::new(config);

    if !cli.quiet && !cli.json {
        println!("\nStarting batch conversion...");
        println!("Input folder:  {}", cli.input_dir.display());
        println!("Output folder: {}", cli.output_dir.display());
        println!();
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let converted = converter
        .convert_folder(&cli.input_dir, &cli.output_dir, overwrite)
        .await
        .context("Batch conversion failed")?;

    let (skipped, failed) = match progress {
        Some(ref cb) => (
            cb.skipped.load(Ordering::SeqCst),
            cb.failed.load(Ordering::SeqCst),
        ),
        // Without the callback, skips and failures are indistinguishable
        // here; both are simply "not converted".
        None => (not_converted(pdf_files.len(), converted.len()), 0),
    };

    // ── Summary ──────────────────────────────────────────────────────────
    if cli.json {
        let summary = BatchSummary {
            input_dir: cli.input_dir.clone(),
            output_dir: cli.output_dir.clone(),
            found: pdf_files.len(),
            converted: converted.clone(),
            skipped,
            failed,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        println!(
            "{} Batch conversion completed!",
            if failed == 0 { green("✔") } else { red("✘") }
        );
        println!("Successfully converted {} file(s):", converted.len());
        for path in &converted {
            println!("  - {}", path.display());
        }
        let leftover = not_converted(pdf_files.len(), converted.len());
        if leftover > 0 {
            println!("\nSkipped or failed {leftover} file(s)");
        }
    }

    Ok(())
}

/// Files found but not written in this run.
///
/// The library re-enumerates the folder during the batch, so a file added
/// after our own listing can push the converted count past `found`.
fn not_converted(found: usize, converted: usize) -> usize {
    found.saturating_sub(converted)
}

/// Non-recursive listing of PDF files, sorted by name for stable display.
///
/// The library does its own enumeration during the batch run; this one
/// only feeds the prompt and the found-files report.
fn list_pdfs(dir: &PathBuf) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        anyhow::bail!("Input folder not found: {}", dir.display());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| ext == *s))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_converted_counts_leftovers() {
        assert_eq!(not_converted(3, 1), 2);
        assert_eq!(not_converted(3, 3), 0);
    }

    #[test]
    fn not_converted_tolerates_files_added_mid_run() {
        // The batch can convert more files than the earlier listing saw.
        assert_eq!(not_converted(2, 3), 0);
    }
}
