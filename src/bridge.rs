//! EPUB → PDF through an external renderer (Calibre's `ebook-convert`).
//!
//! The renderer is invoked as `<program> [args…] <input> <output>` and waited
//! on without a timeout. Exit status 0 is success; anything else is a failure
//! whose reason is the captured stderr. Failures are logged and reported as
//! `false`, never as an error.

use crate::error::Ebook2TxtError;
use crate::format::{list_sources, DocumentFormat};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use tracing::{debug, error, info, warn};

/// Renderer used when none is configured.
pub const DEFAULT_RENDERER: &str = "ebook-convert";

/// Why a render attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderFailure {
    /// The renderer could not be started (not installed, not executable).
    Spawn(String),
    /// The renderer ran and exited unsuccessfully.
    Exit { code: Option<i32>, stderr: String },
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderFailure::Spawn(detail) => write!(f, "could not start renderer: {detail}"),
            RenderFailure::Exit { code, stderr } => {
                let stderr = stderr.trim();
                match code {
                    Some(code) if stderr.is_empty() => write!(f, "exit status {code}"),
                    Some(code) => write!(f, "exit status {code}: {stderr}"),
                    None => write!(f, "terminated by signal: {stderr}"),
                }
            }
        }
    }
}

/// Runs the external renderer.
#[derive(Debug, Clone)]
pub struct RenderBridge {
    program: OsString,
    args: Vec<OsString>,
}

impl Default for RenderBridge {
    fn default() -> Self {
        Self::new(DEFAULT_RENDERER)
    }
}

impl RenderBridge {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument placed before the input and output paths.
    pub fn with_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    /// Render `input` to `output`, returning the failure reason if any.
    pub async fn try_convert(&self, input: &Path, output: &Path) -> Result<(), RenderFailure> {
        debug!(
            "Running {} {:?} {} {}",
            self.program.to_string_lossy(),
            self.args,
            input.display(),
            output.display()
        );

        let result = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| RenderFailure::Spawn(e.to_string()))?;

        if result.status.success() {
            Ok(())
        } else {
            Err(RenderFailure::Exit {
                code: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            })
        }
    }

    /// Render `input` to `output`. Returns `true` on success; a failure is
    /// logged with the renderer's stderr.
    pub async fn convert(&self, input: &Path, output: &Path) -> bool {
        match self.try_convert(input, output).await {
            Ok(()) => true,
            Err(e) => {
                error!("Conversion error for {}: {}", input.display(), e);
                false
            }
        }
    }
}

/// Files handled by [`render_directory`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSummary {
    pub converted: Vec<String>,
    pub failed: Vec<String>,
}

/// Render every `*.epub` in `input_dir` to `<output_dir>/<stem>.pdf`.
///
/// Both directories are created if missing. An empty input directory is a
/// warning, not an error.
pub async fn render_directory(
    input_dir: &Path,
    output_dir: &Path,
    bridge: &RenderBridge,
) -> Result<RenderSummary, Ebook2TxtError> {
    tokio::fs::create_dir_all(input_dir)
        .await
        .map_err(|source| Ebook2TxtError::InputDirUnreadable {
            path: input_dir.to_path_buf(),
            source,
        })?;
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|source| Ebook2TxtError::OutputDirFailed {
            path: output_dir.to_path_buf(),
            source,
        })?;

    let epubs: Vec<_> = list_sources(input_dir)
        .await?
        .into_iter()
        .filter(|source| source.format() == DocumentFormat::Epub)
        .collect();

    let mut summary = RenderSummary::default();
    if epubs.is_empty() {
        warn!("No EPUB files found in {}", input_dir.display());
        return Ok(summary);
    }

    for epub in &epubs {
        let name = epub.file_name();
        let output = output_dir.join(format!("{}.pdf", epub.stem()));

        info!("Converting: {}", name);
        if bridge.convert(epub.path(), &output).await {
            info!("Successfully converted to: {}", output.display());
            summary.converted.push(name);
        } else {
            error!("Failed to convert: {}", name);
            summary.failed.push(name);
        }
    }

    Ok(summary)
}
