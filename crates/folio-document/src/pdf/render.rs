// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF page rendering. The rasteriser talks to a `PdfRenderer` so the vector
// backend can be swapped (or faked in tests); the default backend is PDFium via
// `pdfium-render`.

use folio_core::error::Result;
use image::DynamicImage;
use rayon::prelude::*;

/// Receives each rendered page as `(page_index, result)`. May be called from
/// several threads at once.
pub type PageSink<'a> = dyn Fn(usize, Result<DynamicImage>) + Sync + 'a;

/// Renders one page of a PDF to pixels.
///
/// Implementations must be deterministic for a given `(pdf, page_index,
/// scale)` and safe to call from several threads at once.
pub trait PdfRenderer: Send + Sync {
    /// Render page `page_index` (0-based) at `scale` pixels per PDF point.
    fn render_page(&self, pdf: &[u8], page_index: usize, scale: f32) -> Result<DynamicImage>;

    /// Render pages `0..page_count`, handing every result to `sink` as soon as
    /// it is ready. Completion order is unspecified.
    ///
    /// The default renders pages in parallel through [`render_page`]. Backends
    /// with per-document setup cost override this to pay it once.
    ///
    /// [`render_page`]: PdfRenderer::render_page
    fn render_pages(&self, pdf: &[u8], page_count: usize, scale: f32, sink: &PageSink<'_>) {
        (0..page_count)
            .into_par_iter()
            .for_each(|index| sink(index, self.render_page(pdf, index, scale)));
    }
}

#[cfg(feature = "pdfium")]
pub use self::pdfium::PdfiumRenderer;

#[cfg(feature = "pdfium")]
mod pdfium {
    use std::sync::Mutex;

    use folio_core::error::{FolioError, Result};
    use image::{DynamicImage, RgbaImage};
    use pdfium_render::prelude::*;
    use tracing::{debug, instrument};

    use super::{PageSink, PdfRenderer};

    // PDFium is not re-entrant; every call into it is serialised here.
    static PDFIUM_LOCK: Mutex<()> = Mutex::new(());

    /// Renders pages with the PDFium library.
    ///
    /// The library is looked up next to the executable first, then on the
    /// system library path.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct PdfiumRenderer;

    impl PdfiumRenderer {
        pub fn new() -> Self {
            Self
        }

        fn bind() -> Result<Pdfium> {
            let bindings =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                    .or_else(|_| Pdfium::bind_to_system_library())
                    .map_err(|err| {
                        FolioError::PdfError(format!("PDFium library unavailable: {err}"))
                    })?;
            Ok(Pdfium::new(bindings))
        }
    }

    impl PdfRenderer for PdfiumRenderer {
        #[instrument(skip(self, pdf), fields(bytes_len = pdf.len()))]
        fn render_page(&self, pdf: &[u8], page_index: usize, scale: f32) -> Result<DynamicImage> {
            let _guard = PDFIUM_LOCK
                .lock()
                .map_err(|_| render_err(page_index, "renderer lock poisoned".into()))?;

            let pdfium = Self::bind()?;
            let document = pdfium
                .load_pdf_from_byte_slice(pdf, None)
                .map_err(|err| {
                    render_err(page_index, format!("failed to open document: {err}"))
                })?;
            render_loaded(&document, page_index, scale)
        }

        /// Binds the library and parses the document once for the whole batch.
        /// Pages render one after another, since PDFium itself is serialised.
        #[instrument(skip(self, pdf, sink), fields(bytes_len = pdf.len()))]
        fn render_pages(&self, pdf: &[u8], page_count: usize, scale: f32, sink: &PageSink<'_>) {
            let fail_all = |reason: String| {
                for index in 0..page_count {
                    sink(index, Err(render_err(index, reason.clone())));
                }
            };

            let Ok(_guard) = PDFIUM_LOCK.lock() else {
                return fail_all("renderer lock poisoned".into());
            };
            let pdfium = match Self::bind() {
                Ok(pdfium) => pdfium,
                Err(err) => return fail_all(err.to_string()),
            };
            let document = match pdfium.load_pdf_from_byte_slice(pdf, None) {
                Ok(document) => document,
                Err(err) => return fail_all(format!("failed to open document: {err}")),
            };

            for index in 0..page_count {
                sink(index, render_loaded(&document, index, scale));
            }
        }
    }

    fn render_err(page_index: usize, reason: String) -> FolioError {
        FolioError::RenderError {
            page: page_index + 1,
            reason,
        }
    }

    fn render_loaded(
        document: &PdfDocument<'_>,
        page_index: usize,
        scale: f32,
    ) -> Result<DynamicImage> {
        let index = u16::try_from(page_index)
            .map_err(|_| render_err(page_index, "page index out of range".into()))?;
        let page = document
            .pages()
            .get(index)
            .map_err(|err| render_err(page_index, err.to_string()))?;

        let width = (page.width().value * scale).round().max(1.0) as i32;
        let height = (page.height().value * scale).round().max(1.0) as i32;

        let config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|err| render_err(page_index, err.to_string()))?;

        let (px_w, px_h) = (bitmap.width() as u32, bitmap.height() as u32);
        let pixels = RgbaImage::from_raw(px_w, px_h, bitmap.as_rgba_bytes())
            .ok_or_else(|| {
                render_err(page_index, "bitmap size does not match its buffer".into())
            })?;

        debug!(page = page_index + 1, px_w, px_h, "Page rendered");
        Ok(DynamicImage::ImageRgba8(pixels))
    }
}
