//! Error types for the pdfmd library.
//!
//! Two distinct error types reflect the two sides of the engine boundary:
//!
//! * [`PdfmdError`] — everything raised by this crate's own orchestration
//!   layer: missing inputs, failed writes, failed engine initialization.
//!   Returned from [`crate::convert::Converter`] methods.
//!
//! * [`EngineError`] — any failure originating *inside* the conversion
//!   engine (parse failure, resource exhaustion, backend unavailable).
//!   The orchestration layer never interprets or classifies these further;
//!   it logs them with file context and wraps them in
//!   [`PdfmdError::Engine`] unchanged.
//!
//! Propagation is deliberately two-tier: `convert_single_file` never
//! suppresses an error, while `convert_folder` suppresses only per-file
//! failures and still raises directory-level ones.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdfmd orchestration layer.
#[derive(Debug, Error)]
pub enum PdfmdError {
    // ── Not-found errors ─────────────────────────────────────────────────
    /// Source file was not found at the given path.
    ///
    /// Raised before any engine work happens, so a typo'd path never pays
    /// the engine-initialization cost.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Input folder for a batch run does not exist.
    #[error("Input folder not found: '{path}'")]
    DirectoryNotFound { path: PathBuf },

    // ── Engine errors ────────────────────────────────────────────────────
    /// The engine could not be constructed (backend missing, model load
    /// failure). Fatal: no conversion can proceed.
    #[error("Failed to initialise conversion engine: {source}")]
    EngineInit {
        #[source]
        source: EngineError,
    },

    /// The engine failed while rendering a specific document.
    ///
    /// Re-raised unchanged from `convert_single_file`; converted to a
    /// logged per-file skip inside `convert_folder`.
    #[error("Conversion failed for '{path}': {source}")]
    Engine {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    // ── I/O errors ───────────────────────────────────────────────────────
    /// Could not create an output directory (or a destination's parent).
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PdfmdError {
    /// True for the not-found class of errors (missing source file or
    /// missing input folder). These are raised immediately and never
    /// retried.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PdfmdError::FileNotFound { .. } | PdfmdError::DirectoryNotFound { .. }
        )
    }
}

/// A failure originating inside a [`crate::engine::ConversionEngine`].
///
/// The orchestration layer treats these as opaque: no retry, no recovery,
/// no classification beyond "the engine said no".
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine backend could not be located or bound.
    #[error(
        "Engine backend unavailable: {0}\n\
         The default engine needs a pdfium shared library.\n\
         Set PDFIUM_LIB_PATH=/path/to/libpdfium or install it system-wide."
    )]
    Unavailable(String),

    /// The document could not be parsed or rendered.
    #[error("Failed to render '{path}': {detail}")]
    Parse { path: PathBuf, detail: String },

    /// The engine ran out of a resource (memory, handles).
    #[error("Engine resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Any other engine-internal failure.
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_display_includes_path() {
        let e = PdfmdError::FileNotFound {
            path: PathBuf::from("/missing/doc.pdf"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/missing/doc.pdf"), "got: {msg}");
        assert!(e.is_not_found());
    }

    #[test]
    fn directory_not_found_is_not_found_class() {
        let e = PdfmdError::DirectoryNotFound {
            path: PathBuf::from("inputs"),
        };
        assert!(e.is_not_found());
    }

    #[test]
    fn engine_error_is_not_not_found() {
        let e = PdfmdError::Engine {
            path: PathBuf::from("a.pdf"),
            source: EngineError::Other("boom".into()),
        };
        assert!(!e.is_not_found());
        assert!(e.to_string().contains("a.pdf"));
        assert!(e.to_string().contains("boom"));
    }

    #[test]
    fn engine_parse_display() {
        let e = EngineError::Parse {
            path: PathBuf::from("bad.pdf"),
            detail: "corrupt xref".into(),
        };
        assert!(e.to_string().contains("bad.pdf"));
        assert!(e.to_string().contains("corrupt xref"));
    }
}
