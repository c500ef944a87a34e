//! Conversion orchestration: single-file and folder-level batch entry points.
//!
//! ## What lives here (and what doesn't)
//!
//! This module owns the shell around the engine: existence checks,
//! destination derivation, lazy engine initialization, skip/overwrite
//! policy, and per-file failure isolation. Document understanding itself is
//! entirely the engine's business; see [`crate::engine`].
//!
//! ## Failure model
//!
//! Deliberately two-tier, and kept asymmetric on purpose:
//! [`Converter::convert_single_file`] never suppresses an error;
//! [`Converter::convert_folder`] catches per-file failures (logs, drops the
//! file from the result, continues) but still raises directory-level ones
//! (missing input folder, unwritable output folder). No retries anywhere in
//! this layer — retry, if desired, is a caller concern.

use crate::config::ConverterConfig;
use crate::engine::{self, ConversionEngine, EngineFactory, EngineOptions};
use crate::error::PdfmdError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

/// File extensions the converter accepts, without the leading dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf"];

/// Converts PDF files to Markdown by delegating to a lazily constructed
/// [`ConversionEngine`].
///
/// The engine handle is created at most once per `Converter` instance, on
/// first use, and reused for every subsequent request. The instance moves
/// from uninitialized to initialized exactly once; there is no teardown,
/// the engine lives as long as the converter.
///
/// # Example
/// ```rust,no_run
/// use pdfmd::{Converter, ConverterConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), pdfmd::PdfmdError> {
/// let converter = Converter::new(ConverterConfig::default());
/// let written = converter.convert_folder("inputs", "outputs", false).await?;
/// println!("converted {} files", written.len());
/// # Ok(())
/// # }
/// ```
pub struct Converter {
    config: ConverterConfig,
    factory: EngineFactory,
    engine: OnceCell<Arc<dyn ConversionEngine>>,
}

impl Converter {
    /// Create a converter that uses the default engine factory
    /// (a [`crate::engine::PdfiumEngine`]).
    pub fn new(config: ConverterConfig) -> Self {
        Self::with_factory(config, engine::default_engine_factory())
    }

    /// Create a converter with a custom engine factory.
    ///
    /// The factory runs at most once, on the first conversion. A
    /// caller-supplied engine in the config takes precedence over the
    /// factory, mirroring the resolution order of the config's engine field.
    pub fn with_factory(config: ConverterConfig, factory: EngineFactory) -> Self {
        Self {
            config,
            factory,
            engine: OnceCell::new(),
        }
    }

    /// The file extensions this converter will pick up during a batch run.
    pub fn supported_extensions(&self) -> &'static [&'static str] {
        SUPPORTED_EXTENSIONS
    }

    /// Resolve the engine, constructing it on first use.
    ///
    /// `OnceCell` guards the construction: concurrent first callers race to
    /// run the initializer exactly once, and everyone else reuses the same
    /// handle. Construction failures are not cached; a later call retries.
    async fn engine(&self) -> Result<Arc<dyn ConversionEngine>, PdfmdError> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                if let Some(ref prebuilt) = self.config.engine {
                    debug!("Using caller-supplied conversion engine");
                    return Ok(Arc::clone(prebuilt));
                }

                info!("Loading conversion engine...");
                let factory = Arc::clone(&self.factory);
                let options = EngineOptions::from_config(&self.config);
                let engine = tokio::task::spawn_blocking(move || factory(&options))
                    .await
                    .map_err(|e| {
                        PdfmdError::Internal(format!("engine init task panicked: {e}"))
                    })?
                    .map_err(|source| {
                        error!("Failed to load conversion engine: {source}");
                        PdfmdError::EngineInit { source }
                    })?;
                info!("Conversion engine loaded successfully");
                Ok(engine)
            })
            .await?;
        Ok(Arc::clone(engine))
    }

    /// Convert a single PDF file to Markdown.
    ///
    /// When `destination` is `None` it is derived from the source by
    /// replacing the extension, in the same parent directory.
    ///
    /// # Guarantees
    /// On success the destination file exists, its parent directories have
    /// been created if missing, and its content is exactly the text the
    /// engine produced. It is written whole, never streamed, so a crash mid-run
    /// cannot leave a truncated destination behind.
    ///
    /// # Errors
    /// * [`PdfmdError::FileNotFound`] when the source does not exist,
    ///   checked before any engine work.
    /// * [`PdfmdError::Engine`] for any engine failure, logged here and
    ///   re-raised unchanged. No retry, no recovery.
    /// * [`PdfmdError::CreateDirFailed`] / [`PdfmdError::OutputWriteFailed`]
    ///   for filesystem failures on the output side.
    pub async fn convert_single_file(
        &self,
        source: impl AsRef<Path>,
        destination: Option<&Path>,
    ) -> Result<PathBuf, PdfmdError> {
        let source = source.as_ref();

        // Fail fast: a bad path must not pay the engine-initialization cost.
        if !source.exists() {
            return Err(PdfmdError::FileNotFound {
                path: source.to_path_buf(),
            });
        }

        let destination = match destination {
            Some(path) => path.to_path_buf(),
            None => source.with_extension(self.config.markdown_extension()),
        };

        info!(
            "Converting {} to {}",
            source.display(),
            destination.display()
        );

        let engine = self.engine().await?;

        let rendered = {
            let engine = Arc::clone(&engine);
            let path = source.to_path_buf();
            tokio::task::spawn_blocking(move || engine.render(&path))
                .await
                .map_err(|e| PdfmdError::Internal(format!("render task panicked: {e}")))?
        };

        let rendered = match rendered {
            Ok(doc) => doc,
            Err(e) => {
                error!("Failed to convert {}: {e}", source.display());
                return Err(PdfmdError::Engine {
                    path: source.to_path_buf(),
                    source: e,
                });
            }
        };

        // Only the Markdown string is consumed; figures and metadata are
        // auxiliary outputs of the engine contract.
        let (markdown, _images, _metadata) = engine::extract_text(&rendered);

        if let Err(e) = self.write_markdown(&destination, &markdown).await {
            error!("Failed to convert {}: {e}", source.display());
            return Err(e);
        }

        info!("Successfully converted to {}", destination.display());
        Ok(destination)
    }

    /// Convert every PDF file directly inside `input_dir` to Markdown files
    /// in `output_dir`.
    ///
    /// The output directory is created unconditionally, even when no input
    /// matches. Enumeration is non-recursive and its order is
    /// filesystem-dependent. A destination that already exists is skipped
    /// entirely unless `overwrite` is set — no engine call, no write, no
    /// error. A file whose conversion fails is logged and excluded from the
    /// result; the batch continues.
    ///
    /// # Returns
    /// The destination paths actually written in this call, in processing
    /// order. An empty list is fine: no matches, or everything skipped or
    /// failed.
    ///
    /// # Errors
    /// * [`PdfmdError::DirectoryNotFound`] when `input_dir` does not exist,
    ///   checked before the output directory is touched.
    /// * [`PdfmdError::CreateDirFailed`] when the output directory cannot
    ///   be created. Directory-level failures are never downgraded to
    ///   per-file skips.
    pub async fn convert_folder(
        &self,
        input_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        overwrite: bool,
    ) -> Result<Vec<PathBuf>, PdfmdError> {
        let input_dir = input_dir.as_ref();
        let output_dir = output_dir.as_ref();

        if !input_dir.exists() {
            return Err(PdfmdError::DirectoryNotFound {
                path: input_dir.to_path_buf(),
            });
        }

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| PdfmdError::CreateDirFailed {
                path: output_dir.to_path_buf(),
                source: e,
            })?;

        let sources = self.enumerate_pdfs(input_dir).await?;
        if sources.is_empty() {
            warn!("No PDF files found in {}", input_dir.display());
            return Ok(Vec::new());
        }

        info!("Found {} PDF files to convert", sources.len());

        let total = sources.len();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_start(total);
        }

        let mut converted = Vec::new();
        for (i, source) in sources.iter().enumerate() {
            let index = i + 1;
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let destination = self.derive_destination(source, output_dir);

            if destination.exists() && !overwrite {
                info!("Skipping {name} (output exists)");
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_file_skipped(&name, index, total);
                }
                continue;
            }

            if let Some(ref cb) = self.config.progress_callback {
                cb.on_file_start(&name, index, total);
            }

            match self.convert_single_file(source, Some(&destination)).await {
                Ok(path) => {
                    if let Some(ref cb) = self.config.progress_callback {
                        let bytes = tokio::fs::metadata(&path)
                            .await
                            .map(|m| m.len() as usize)
                            .unwrap_or(0);
                        cb.on_file_complete(&name, index, total, bytes);
                    }
                    converted.push(path);
                }
                Err(e) => {
                    // Per-file isolation: convert_single_file already
                    // logged the failure; record it and move on.
                    if let Some(ref cb) = self.config.progress_callback {
                        cb.on_file_error(&name, index, total, e.to_string());
                    }
                }
            }
        }

        info!("Successfully converted {} files", converted.len());
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_complete(total, converted.len());
        }

        Ok(converted)
    }

    /// Non-recursive enumeration of supported files in a directory.
    async fn enumerate_pdfs(&self, dir: &Path) -> Result<Vec<PathBuf>, PdfmdError> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| PdfmdError::Internal(format!("failed to read {}: {e}", dir.display())))?;

        let mut sources = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PdfmdError::Internal(format!("failed to read {}: {e}", dir.display())))?
        {
            let path = entry.path();
            let matches = path
                .extension()
                .map(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| ext == *s))
                .unwrap_or(false);
            if matches && path.is_file() {
                sources.push(path);
            }
        }
        Ok(sources)
    }

    /// Destination path for a batch member: the source's file stem plus the
    /// configured Markdown extension, inside `output_dir`.
    ///
    /// Built by appending, not `with_extension`, so a stem containing dots
    /// ("report.v2.pdf") keeps them ("report.v2.md").
    fn derive_destination(&self, source: &Path, output_dir: &Path) -> PathBuf {
        let stem = source.file_stem().unwrap_or(source.as_os_str());
        let mut file_name = OsString::from(stem);
        file_name.push(".");
        file_name.push(self.config.markdown_extension());
        output_dir.join(file_name)
    }

    /// Atomic whole-file write: temp file in the same directory, then
    /// rename. The destination never holds partial content.
    async fn write_markdown(&self, path: &Path, markdown: &str) -> Result<(), PdfmdError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| PdfmdError::CreateDirFailed {
                        path: parent.to_path_buf(),
                        source: e,
                    })?;
            }
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp_path, markdown)
            .await
            .map_err(|e| PdfmdError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|e| PdfmdError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })
    }
}
