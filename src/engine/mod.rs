//! The engine boundary: everything that actually understands PDFs.
//!
//! The orchestration layer in [`crate::convert`] treats document
//! understanding as an opaque capability behind the [`ConversionEngine`]
//! trait: `render(path) -> RenderedDocument`, plus [`extract_text`] to pull
//! the Markdown string out of the rendered structure. Layout analysis, OCR
//! and text extraction all live behind that seam, so swapping the backend
//! (or mocking it in tests) never touches the batch logic.
//!
//! The default engine is [`pdfium::PdfiumEngine`], backed by the pdfium
//! shared library. Its `render` call is blocking and of unbounded duration;
//! callers on an async runtime must wrap it in `spawn_blocking`. No timeout
//! or cancellation exists at this layer; a hang inside the engine blocks
//! the whole batch.

pub mod pdfium;

use crate::config::{ConverterConfig, DeviceMode};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub use pdfium::PdfiumEngine;

/// An opaque document-understanding backend.
///
/// Implementations must be `Send + Sync`: the converter holds the engine
/// behind an `Arc` and invokes `render` from `spawn_blocking` threads.
pub trait ConversionEngine: Send + Sync {
    /// Render a PDF into a structured document.
    ///
    /// Blocking; duration is engine-internal and unbounded. Any failure is
    /// reported as an [`EngineError`] and left uninterpreted by callers.
    fn render(&self, source: &Path) -> Result<RenderedDocument, EngineError>;
}

/// Options handed to an engine at construction time.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Requested execution device. `Auto` is resolved by the engine.
    pub device: DeviceMode,
    /// User password for encrypted documents.
    pub password: Option<String>,
}

impl EngineOptions {
    pub(crate) fn from_config(config: &ConverterConfig) -> Self {
        Self {
            device: config.device,
            password: config.password.clone(),
        }
    }
}

/// Constructs an engine from options. Runs at most once per
/// [`crate::convert::Converter`] instance, on first use.
pub type EngineFactory =
    Arc<dyn Fn(&EngineOptions) -> Result<Arc<dyn ConversionEngine>, EngineError> + Send + Sync>;

/// The factory used by [`crate::convert::Converter::new`]: a
/// [`PdfiumEngine`] bound to whatever pdfium library the host provides.
pub fn default_engine_factory() -> EngineFactory {
    Arc::new(|options| {
        PdfiumEngine::new(options).map(|engine| Arc::new(engine) as Arc<dyn ConversionEngine>)
    })
}

// ── Rendered document model ──────────────────────────────────────────────

/// A document as produced by an engine's `render` call.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// Per-page rendered content, in page order.
    pub pages: Vec<RenderedPage>,
    /// Document-level metadata reported by the engine.
    pub metadata: DocumentMetadata,
}

/// One rendered page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 0-based page index.
    pub index: usize,
    /// Markdown text for this page.
    pub markdown: String,
    /// Figures extracted from the page. Auxiliary output; the conversion
    /// shell discards these.
    pub images: Vec<PageImage>,
}

/// An extracted figure. Carried through [`extract_text`] for callers that
/// want it; the batch shell does not.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 0-based index of the page the image came from.
    pub page: usize,
    /// Engine-assigned name, e.g. "page_3_img_0.png".
    pub name: String,
    /// Encoded image bytes.
    pub data: Vec<u8>,
}

/// Document metadata reported by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
}

/// Extract the Markdown text from a rendered document, along with the
/// auxiliary images and metadata.
///
/// Pages are joined with a blank line. The conversion shell consumes only
/// the first element of the tuple.
pub fn extract_text(doc: &RenderedDocument) -> (String, Vec<PageImage>, DocumentMetadata) {
    let markdown = doc
        .pages
        .iter()
        .map(|p| p.markdown.trim_end())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let images = doc.pages.iter().flat_map(|p| p.images.clone()).collect();

    (markdown, images, doc.metadata.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(index: usize, markdown: &str) -> RenderedPage {
        RenderedPage {
            index,
            markdown: markdown.to_string(),
            images: Vec::new(),
        }
    }

    #[test]
    fn extract_text_joins_pages_with_blank_line() {
        let doc = RenderedDocument {
            pages: vec![page(0, "# Title\n\nIntro.\n"), page(1, "Second page.")],
            metadata: DocumentMetadata::default(),
        };
        let (markdown, images, _meta) = extract_text(&doc);
        assert_eq!(markdown, "# Title\n\nIntro.\n\nSecond page.");
        assert!(images.is_empty());
    }

    #[test]
    fn extract_text_skips_blank_pages() {
        let doc = RenderedDocument {
            pages: vec![page(0, "content"), page(1, "   \n"), page(2, "more")],
            metadata: DocumentMetadata::default(),
        };
        let (markdown, _, _) = extract_text(&doc);
        assert_eq!(markdown, "content\n\nmore");
    }

    #[test]
    fn extract_text_collects_images_across_pages() {
        let mut first = page(0, "a");
        first.images.push(PageImage {
            page: 0,
            name: "page_0_img_0.png".into(),
            data: vec![1, 2, 3],
        });
        let doc = RenderedDocument {
            pages: vec![first, page(1, "b")],
            metadata: DocumentMetadata {
                page_count: 2,
                ..Default::default()
            },
        };
        let (_, images, meta) = extract_text(&doc);
        assert_eq!(images.len(), 1);
        assert_eq!(meta.page_count, 2);
    }
}
