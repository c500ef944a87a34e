//! Default engine: text extraction via the pdfium library.
//!
//! ## Binding
//!
//! pdfium is a C++ shared library loaded at runtime. Resolution order:
//! an explicit `PDFIUM_LIB_PATH` environment variable, then the system
//! library search path. A failed bind surfaces as
//! [`EngineError::Unavailable`] with setup instructions, not a panic.
//!
//! ## Blocking contract
//!
//! `render` is CPU-bound and blocking. The converter calls it through
//! `spawn_blocking`; the `thread_safe` crate feature serialises the
//! underlying FFI calls so one engine can be shared behind an `Arc`.

use crate::config::DeviceMode;
use crate::engine::{
    ConversionEngine, DocumentMetadata, EngineOptions, RenderedDocument, RenderedPage,
};
use crate::error::EngineError;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// A [`ConversionEngine`] backed by pdfium text extraction.
///
/// Produces one Markdown block per page from the page's text content.
/// pdfium runs on CPU only; an `Accelerated` device request is recorded
/// and ignored.
pub struct PdfiumEngine {
    pdfium: Pdfium,
    device: DeviceMode,
    password: Option<String>,
}

impl PdfiumEngine {
    /// Bind to a pdfium library and construct the engine.
    ///
    /// The device probe happens here, once: `Auto` resolves to a concrete
    /// mode with an info log, and never fails construction.
    pub fn new(options: &EngineOptions) -> Result<Self, EngineError> {
        let device = options.device.resolve();
        if device == DeviceMode::Accelerated {
            debug!("pdfium backend is CPU-only; accelerated mode has no effect");
        }

        let bindings = match std::env::var("PDFIUM_LIB_PATH") {
            Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
            _ => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| EngineError::Unavailable(format!("{e:?}")))?;

        info!("pdfium engine initialised (device: {device})");

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            device,
            password: options.password.clone(),
        })
    }

    /// The device mode this engine resolved to at construction.
    pub fn device(&self) -> DeviceMode {
        self.device
    }
}

impl ConversionEngine for PdfiumEngine {
    fn render(&self, source: &Path) -> Result<RenderedDocument, EngineError> {
        let document = self
            .pdfium
            .load_pdf_from_file(source, self.password.as_deref())
            .map_err(|e| EngineError::Parse {
                path: source.to_path_buf(),
                detail: format!("{e:?}"),
            })?;

        let metadata = read_metadata(&document);
        let page_count = document.pages().len() as usize;
        debug!("Loaded '{}': {} pages", source.display(), page_count);

        let mut pages = Vec::with_capacity(page_count);
        for (index, page) in document.pages().iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| EngineError::Parse {
                    path: source.to_path_buf(),
                    detail: format!("text extraction failed on page {}: {e:?}", index + 1),
                })?
                .all();

            pages.push(RenderedPage {
                index,
                markdown: text_to_markdown(&text),
                images: Vec::new(),
            });
        }

        Ok(RenderedDocument { pages, metadata })
    }
}

/// Normalise raw pdfium page text into plain Markdown.
///
/// Line endings become `\n`, trailing whitespace is stripped per line, and
/// runs of blank lines collapse to a single paragraph break.
fn text_to_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;

    for line in text.replace("\r\n", "\n").replace('\r', "\n").lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        blank_run = 0;
        out.push_str(line);
    }

    out
}

fn read_metadata(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();

    let get_tag = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_tag(PdfDocumentMetadataTagType::Title),
        author: get_tag(PdfDocumentMetadataTagType::Author),
        subject: get_tag(PdfDocumentMetadataTagType::Subject),
        creator: get_tag(PdfDocumentMetadataTagType::Creator),
        producer: get_tag(PdfDocumentMetadataTagType::Producer),
        page_count: document.pages().len() as usize,
    }
}
