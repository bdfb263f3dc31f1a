// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document loader: turns a byte stream plus its declared content type into
// the ordered page rasters a session edits.

use std::sync::Arc;

use folio_core::error::{FolioError, Result};
use folio_core::{Classification, PageRaster, SessionConfig};
use tracing::{info, instrument, warn};

use crate::codec::RasterCodec;
use crate::pdf::{PdfReader, PdfRenderer};
use crate::rasterize::PageRasterizer;

/// A freshly opened document.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub classification: Classification,
    /// One raster per surviving page, in page order.
    pub pages: Vec<PageRaster>,
    /// The 1-based original page number each entry of `pages` came from.
    /// Differs from `1..=pages.len()` only when pages were dropped at load.
    pub source_pages: Vec<usize>,
    /// The original bytes, kept for PDFs only (needed for page geometry).
    pub original: Option<Arc<[u8]>>,
}

impl LoadedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Dispatches on the declared content type.
#[derive(Clone)]
pub struct DocumentLoader {
    rasterizer: PageRasterizer,
    codec: RasterCodec,
}

impl DocumentLoader {
    pub fn new(rasterizer: PageRasterizer, codec: RasterCodec) -> Self {
        Self { rasterizer, codec }
    }

    /// Build a loader around `renderer` using the session's density and
    /// quality settings.
    pub fn with_renderer(renderer: Arc<dyn PdfRenderer>, config: &SessionConfig) -> Self {
        let codec = RasterCodec::new(config.jpeg_quality);
        Self::new(
            PageRasterizer::new(renderer, codec, config.render_scale()),
            codec,
        )
    }

    /// Build a loader backed by PDFium.
    #[cfg(feature = "pdfium")]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::with_renderer(Arc::new(crate::pdf::PdfiumRenderer::new()), config)
    }

    pub fn codec(&self) -> &RasterCodec {
        &self.codec
    }

    /// Load `source`, classified by `declared_type` (a MIME type; parameters
    /// are ignored).
    ///
    /// PDF pages that fail to render are dropped with a warning. If no page
    /// renders at all, the first page's error is returned.
    #[instrument(skip(self, source), fields(bytes_len = source.len()))]
    pub fn load(&self, source: &[u8], declared_type: &str) -> Result<LoadedDocument> {
        let classification = Classification::from_mime(declared_type)
            .ok_or_else(|| FolioError::UnsupportedFormat(declared_type.to_string()))?;

        let document = match classification {
            Classification::Pdf => self.load_pdf(source)?,
            Classification::Jpg | Classification::Png => {
                let raster = self.codec.wrap(source)?;
                // A valid signature says nothing about the body; decode once so
                // a truncated or corrupt image fails here and not at bind time.
                self.codec.decode(&raster)?;
                LoadedDocument {
                    classification,
                    pages: vec![raster],
                    source_pages: vec![1],
                    original: None,
                }
            }
        };

        info!(
            %classification,
            pages = document.page_count(),
            "Document loaded"
        );
        Ok(document)
    }

    fn load_pdf(&self, source: &[u8]) -> Result<LoadedDocument> {
        let page_count = PdfReader::from_bytes(source)?.page_count();
        if page_count == 0 {
            return Err(FolioError::PdfError("document has no pages".into()));
        }

        let mut pages = Vec::with_capacity(page_count);
        let mut source_pages = Vec::with_capacity(page_count);
        let mut first_error = None;

        for (index, result) in self.rasterizer.rasterize_all(source, page_count) {
            match result {
                Ok(raster) => {
                    pages.push(raster);
                    source_pages.push(index + 1);
                }
                Err(err) => {
                    warn!(page = index + 1, error = %err, "Dropping page that failed to render");
                    first_error.get_or_insert(err);
                }
            }
        }

        if pages.is_empty() {
            return Err(first_error.unwrap_or_else(|| {
                FolioError::PdfError("no page could be rendered".into())
            }));
        }

        Ok(LoadedDocument {
            classification: Classification::Pdf,
            pages,
            source_pages,
            original: Some(Arc::from(source)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{marked_png, sample_pdf, solid_image};
    use image::DynamicImage;

    /// Renders every page except those listed in `broken`.
    struct StubRenderer {
        broken: Vec<usize>,
    }

    impl PdfRenderer for StubRenderer {
        fn render_page(&self, _pdf: &[u8], index: usize, scale: f32) -> Result<DynamicImage> {
            if self.broken.contains(&index) {
                return Err(FolioError::RenderError {
                    page: index + 1,
                    reason: "broken".into(),
                });
            }
            let side = (10.0 * scale) as u32;
            Ok(solid_image(side, side, [index as u8 * 50, 0, 0]))
        }
    }

    fn loader(broken: Vec<usize>) -> DocumentLoader {
        DocumentLoader::with_renderer(
            Arc::new(StubRenderer { broken }),
            &SessionConfig::default(),
        )
    }

    #[test]
    fn pdf_yields_one_jpeg_per_page_at_render_scale() {
        let pdf = sample_pdf(&[(612.0, 792.0); 3]);
        let doc = loader(vec![]).load(&pdf, "application/pdf").unwrap();

        assert_eq!(doc.classification, Classification::Pdf);
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.source_pages, vec![1, 2, 3]);
        assert_eq!(doc.original.as_deref(), Some(pdf.as_slice()));

        let first = RasterCodec::default().decode(&doc.pages[0]).unwrap();
        assert_eq!(doc.pages[0].mime_type(), "image/jpeg");
        // 10 points at 300/72 scale.
        assert_eq!(first.width(), 41);
    }

    #[test]
    fn broken_pages_are_dropped() {
        let pdf = sample_pdf(&[(100.0, 100.0); 3]);
        let doc = loader(vec![1]).load(&pdf, "application/pdf").unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.source_pages, vec![1, 3]);
    }

    #[test]
    fn all_pages_broken_fails_the_load() {
        let pdf = sample_pdf(&[(100.0, 100.0); 2]);
        let err = loader(vec![0, 1]).load(&pdf, "application/pdf").unwrap_err();
        assert!(matches!(err, FolioError::RenderError { page: 1, .. }));
    }

    #[test]
    fn image_is_wrapped_verbatim() {
        let png = marked_png(5, 4);
        let doc = loader(vec![]).load(&png, "image/png").unwrap();
        assert_eq!(doc.classification, Classification::Png);
        assert_eq!(doc.page_count(), 1);
        assert!(doc.original.is_none());
        assert_eq!(doc.pages[0].decode().unwrap(), png);
    }

    #[test]
    fn image_with_a_corrupt_body_is_rejected() {
        let mut corrupt = b"\x89PNG\r\n\x1a\n".to_vec();
        corrupt.extend_from_slice(b"garbage-body");
        let err = loader(vec![]).load(&corrupt, "image/png").unwrap_err();
        assert!(matches!(err, FolioError::ImageError(_)));
    }

    #[test]
    fn unknown_type_is_unsupported() {
        let err = loader(vec![]).load(b"GIF89a", "image/gif").unwrap_err();
        assert!(matches!(err, FolioError::UnsupportedFormat(ref t) if t == "image/gif"));
        assert_eq!(err.to_string(), "Unsupported file type: image/gif");
    }

    #[test]
    fn corrupt_pdf_is_a_pdf_error() {
        let err = loader(vec![]).load(b"%PDF-1.5 garbage", "application/pdf").unwrap_err();
        assert!(matches!(err, FolioError::PdfError(_)));
    }
}
