//! CLI binary for ebook2txt.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `BatchConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use ebook2txt::{
    convert_directory, convert_file, inspect_pdf, BatchConfig, BatchReport,
    ConversionProgressCallback, PageSeparator, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch, one log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_files as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_files} e-books…"))
        ));
    }

    fn on_file_start(&self, file_name: &str, _index: usize, _total: usize) {
        self.bar.set_message(file_name.to_string());
    }

    fn on_file_complete(&self, file_name: &str, index: usize, total: usize, chars: usize) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            file_name,
            dim(&format!("{chars} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, file_name: &str, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            file_name,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = total_files.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if failed == total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert everything in ./input to ./output
  ebook2txt

  # Other directories, form feed between PDF pages
  ebook2txt -i ~/books -o ~/books-txt --separator ff

  # One file to stdout
  ebook2txt --file novel.epub

  # Inspect PDF metadata
  ebook2txt --inspect report.pdf

  # Machine-readable batch report
  ebook2txt --json > report.json

FAILURES:
  Every file that cannot be converted gets one line in the error journal
  (conversion_errors.log by default) as "<file name>: <reason>". The
  journal is appended to and never truncated.

ENVIRONMENT VARIABLES:
  EBOOK2TXT_INPUT_DIR     Input directory (default: input)
  EBOOK2TXT_OUTPUT_DIR    Output directory (default: output)
  EBOOK2TXT_JOURNAL       Error journal path (default: conversion_errors.log)
  EBOOK2TXT_PDF_PASSWORD  Password for encrypted PDFs
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Convert PDF, EPUB and MOBI e-books to plain text.
#[derive(Parser, Debug)]
#[command(
    name = "ebook2txt",
    version,
    about = "Convert PDF, EPUB and MOBI e-books to plain text",
    long_about = "Convert every PDF, EPUB and MOBI file in a directory to a UTF-8 .txt file \
of the same name. Files that fail are recorded in an append-only error journal and the \
batch carries on.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing the e-books.
    #[arg(short, long, env = "EBOOK2TXT_INPUT_DIR", default_value = "input")]
    input: PathBuf,

    /// Directory receiving the .txt files (created if missing).
    #[arg(short, long, env = "EBOOK2TXT_OUTPUT_DIR", default_value = "output")]
    output: PathBuf,

    /// Append-only error journal.
    #[arg(long, env = "EBOOK2TXT_JOURNAL", default_value = "conversion_errors.log")]
    journal: PathBuf,

    /// PDF page separator: blank, ff, or a custom string.
    #[arg(long, env = "EBOOK2TXT_SEPARATOR", default_value = "blank")]
    separator: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "EBOOK2TXT_PDF_PASSWORD")]
    password: Option<String>,

    /// Convert a single file and print its text to stdout.
    #[arg(long, conflicts_with = "inspect")]
    file: Option<PathBuf>,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect: Option<PathBuf>,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "EBOOK2TXT_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "EBOOK2TXT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "EBOOK2TXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "EBOOK2TXT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let batch_mode = cli.file.is_none() && cli.inspect.is_none();
    let show_progress = batch_mode && !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Inspect-only mode ────────────────────────────────────────────────
    if let Some(ref pdf) = cli.inspect {
        let config = build_config(&cli, None)?;
        let meta = inspect_pdf(pdf, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", pdf.display());
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Single-file mode ─────────────────────────────────────────────────
    if let Some(ref file) = cli.file {
        let config = build_config(&cli, None)?;
        let text = convert_file(file, &config)
            .await
            .with_context(|| format!("Failed to convert {}", file.display()))?;

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        // Ensure a trailing newline on stdout.
        if !text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
        return Ok(());
    }

    // ── Batch ────────────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let report = convert_directory(&config)
        .await
        .context("Batch conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet && !show_progress {
        print_summary(&report, &config);
    } else if !cli.quiet && report.failed() > 0 {
        eprintln!(
            "   {} see {}",
            dim("failures:"),
            bold(&config.journal_path.display().to_string())
        );
    }

    Ok(())
}

/// Map CLI args to `BatchConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BatchConfig> {
    let mut builder = BatchConfig::builder()
        .input_dir(&cli.input)
        .output_dir(&cli.output)
        .journal_path(&cli.journal)
        .page_separator(PageSeparator::parse(&cli.separator));

    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(report: &BatchReport, config: &BatchConfig) {
    eprintln!(
        "Converted {}/{} files in {}ms",
        report.succeeded(),
        report.total(),
        report.total_duration_ms
    );
    if report.failed() > 0 {
        eprintln!(
            "  {} files failed, see {}",
            report.failed(),
            config.journal_path.display()
        );
    }
}
