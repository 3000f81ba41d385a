//! CLI binary for the EPUB → PDF batch.
//!
//! Renders every `*.epub` in the input directory to `<stem>.pdf` with an
//! external renderer (Calibre's `ebook-convert` unless overridden).

use anyhow::{Context, Result};
use clap::Parser;
use ebook2txt::bridge::DEFAULT_RENDERER;
use ebook2txt::{render_directory, RenderBridge};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render ./input/*.epub to ./output/*.pdf
  epub2pdf

  # Use a renderer outside PATH, JSON summary on stdout
  epub2pdf --renderer /opt/calibre/ebook-convert --json

ENVIRONMENT VARIABLES:
  EBOOK2TXT_INPUT_DIR     Input directory (default: input)
  EBOOK2TXT_OUTPUT_DIR    Output directory (default: output)
  EBOOK2TXT_RENDERER      Renderer program (default: ebook-convert)
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Render EPUB files to PDF.
#[derive(Parser, Debug)]
#[command(
    name = "epub2pdf",
    version,
    about = "Render EPUB files to PDF with ebook-convert",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing the EPUB files (created if missing).
    #[arg(short, long, env = "EBOOK2TXT_INPUT_DIR", default_value = "input")]
    input: PathBuf,

    /// Directory receiving the PDF files (created if missing).
    #[arg(short, long, env = "EBOOK2TXT_OUTPUT_DIR", default_value = "output")]
    output: PathBuf,

    /// Renderer invoked as `<renderer> <input.epub> <output.pdf>`.
    #[arg(long, env = "EBOOK2TXT_RENDERER", default_value = DEFAULT_RENDERER)]
    renderer: String,

    /// Print the summary as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
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

    let bridge = RenderBridge::new(&cli.renderer);
    let summary = render_directory(&cli.input, &cli.output, &bridge)
        .await
        .context("EPUB to PDF batch failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        eprintln!(
            "Rendered {}/{} EPUB files",
            summary.converted.len(),
            summary.converted.len() + summary.failed.len()
        );
    }

    Ok(())
}
