//! # pdfmd
//!
//! Batch-convert PDF documents to Markdown.
//!
//! ## What this crate is (and isn't)
//!
//! pdfmd is the orchestration shell around an opaque conversion engine:
//! lazy engine initialization, single-file conversion, and folder-level
//! batch runs with skip/overwrite semantics. All document understanding
//! (layout analysis, text extraction) happens behind the
//! [`engine::ConversionEngine`] trait. The default engine extracts text via
//! the pdfium library; any backend implementing the trait plugs in without
//! touching the batch logic.
//!
//! ## Pipeline Overview
//!
//! ```text
//! inputs/*.pdf
//!  │
//!  ├─ 1. Enumerate  non-recursive scan for the PDF extension
//!  ├─ 2. Skip       destination exists and overwrite not requested
//!  ├─ 3. Engine     render(path) → structured document (lazy init, once)
//!  ├─ 4. Extract    Markdown string (figures/metadata discarded)
//!  └─ 5. Write      atomic whole-file write into outputs/
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfmd::{Converter, ConverterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), pdfmd::PdfmdError> {
//!     let converter = Converter::new(ConverterConfig::default());
//!
//!     // One file; destination derived by swapping the extension.
//!     let out = converter.convert_single_file("paper.pdf", None).await?;
//!     println!("wrote {}", out.display());
//!
//!     // A whole folder, skipping anything already converted.
//!     let written = converter.convert_folder("inputs", "outputs", false).await?;
//!     println!("converted {} files", written.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Failure model
//!
//! Two tiers, on purpose: a file that fails to convert is logged and
//! dropped from the batch result while the batch keeps going; a missing
//! input folder or an unwritable output folder aborts the whole call.
//! `convert_single_file` itself never swallows an error.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfmd-batch` and `pdfmd-single` binaries (clap + dialoguer + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfmd = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConverterConfig, ConverterConfigBuilder, DeviceMode};
pub use convert::{Converter, SUPPORTED_EXTENSIONS};
pub use engine::{
    extract_text, ConversionEngine, DocumentMetadata, EngineFactory, EngineOptions, PageImage,
    PdfiumEngine, RenderedDocument, RenderedPage,
};
pub use error::{EngineError, PdfmdError};
pub use progress::{ConvertProgressCallback, NoopProgressCallback, ProgressCallback};
