//! Interactive single-file conversion CLI.
//!
//! Lists the PDF files in the input folder, asks the user to pick one,
//! and converts just that file via [`Converter::convert_single_file`].

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Select;
use pdfmd::{Converter, ConverterConfig, DeviceMode, SUPPORTED_EXTENSIONS};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

/// Convert one PDF, selected interactively, to Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "pdfmd-single",
    version,
    about = "Pick one PDF from a folder and convert it to Markdown"
)]
struct Cli {
    /// Folder containing the PDF files to choose from.
    #[arg(short, long, env = "PDFMD_INPUT_DIR", default_value = "inputs")]
    input_dir: PathBuf,

    /// Folder receiving the Markdown file.
    #[arg(short, long, env = "PDFMD_OUTPUT_DIR", default_value = "outputs")]
    output_dir: PathBuf,

    /// Execution device for the engine: auto, accelerated, cpu.
    #[arg(long, env = "PDFMD_DEVICE", value_enum, default_value = "auto")]
    device: DeviceArg,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFMD_PASSWORD")]
    password: Option<String>,

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

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    println!("{}", bold("=== PDF to Markdown Single File Conversion ==="));
    println!();

    // ── List available PDFs ──────────────────────────────────────────────
    let pdf_files = list_pdfs(&cli.input_dir)
        .with_context(|| format!("Failed to read input folder {}", cli.input_dir.display()))?;

    if pdf_files.is_empty() {
        println!("No PDF files found in {}", cli.input_dir.display());
        println!("Please add PDF files to the input folder.");
        return Ok(());
    }

    let names: Vec<String> = pdf_files
        .iter()
        .map(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string())
        })
        .collect();

    // ── User selection ───────────────────────────────────────────────────
    let choice = Select::new()
        .with_prompt("Select file to convert")
        .items(&names)
        .default(0)
        .interact()
        .context("File selection failed")?;

    let selected = &pdf_files[choice];
    let stem = selected
        .file_stem()
        .context("Selected file has no name")?
        .to_string_lossy();
    let destination = cli.output_dir.join(format!("{stem}.md"));

    println!("\nConverting: {}", names[choice]);
    println!("Output:     {}", destination.display());
    println!("Please wait...\n");

    // ── Convert ──────────────────────────────────────────────────────────
    let mut builder = ConverterConfig::builder().device(cli.device.clone().into());
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    let converter = Converter::new(builder.build().context("Invalid configuration")?);

    match converter
        .convert_single_file(selected, Some(&destination))
        .await
    {
        Ok(path) => {
            println!("{} Conversion successful!", green("✔"));
            println!("Output saved to: {}", path.display());
            Ok(())
        }
        Err(e) => {
            println!("{} Conversion failed: {e}", red("✗"));
            Err(e.into())
        }
    }
}

/// Non-recursive listing of PDF files, sorted by name for a stable menu.
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
