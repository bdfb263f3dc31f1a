// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasteriser: one PDF page in, one JPEG `PageRaster` out.

use std::sync::{Arc, Mutex, PoisonError};

use folio_core::PageRaster;
use folio_core::error::Result;
use image::DynamicImage;
use tracing::{debug, instrument};

use crate::codec::RasterCodec;
use crate::pdf::PdfRenderer;

/// Renders PDF pages at a fixed scale and encodes them as JPEG.
#[derive(Clone)]
pub struct PageRasterizer {
    renderer: Arc<dyn PdfRenderer>,
    codec: RasterCodec,
    scale: f32,
}

impl PageRasterizer {
    /// `scale` is pixels per PDF point (render DPI / 72).
    pub fn new(renderer: Arc<dyn PdfRenderer>, codec: RasterCodec, scale: f32) -> Self {
        Self {
            renderer,
            codec,
            scale,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Rasterise page `page_index` (0-based).
    pub fn rasterize(&self, pdf: &[u8], page_index: usize) -> Result<PageRaster> {
        let pixels = self.renderer.render_page(pdf, page_index, self.scale)?;
        self.codec.encode_jpeg(&pixels)
    }

    /// Rasterise pages `0..page_count`.
    ///
    /// The renderer walks the document in one batch; each rendered page is
    /// JPEG-encoded on the rayon pool as soon as it arrives. Results come back
    /// indexed and sorted by page index, so the output order is page order
    /// whatever order the workers finish in.
    #[instrument(skip(self, pdf), fields(bytes_len = pdf.len(), scale = self.scale))]
    pub fn rasterize_all(
        &self,
        pdf: &[u8],
        page_count: usize,
    ) -> Vec<(usize, Result<PageRaster>)> {
        let results = Mutex::new(Vec::with_capacity(page_count));
        let codec = self.codec;

        rayon::scope(|scope| {
            let results = &results;
            let encode = move |index: usize, rendered: Result<DynamicImage>| {
                scope.spawn(move |_| {
                    let raster = rendered.and_then(|pixels| codec.encode_jpeg(&pixels));
                    results
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push((index, raster));
                });
            };
            self.renderer.render_pages(pdf, page_count, self.scale, &encode);
        });

        let mut results = results.into_inner().unwrap_or_else(PoisonError::into_inner);
        results.sort_by_key(|(index, _)| *index);

        debug!(page_count, "Rasterisation finished");
        results
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::fixtures::solid_image;
    use crate::pdf::PageSink;
    use folio_core::FolioError;
    use image::DynamicImage;

    /// Paints each page a grey level equal to its index and finishes pages in
    /// reverse order.
    struct ReverseTimedRenderer {
        pages: usize,
    }

    impl PdfRenderer for ReverseTimedRenderer {
        fn render_page(&self, _pdf: &[u8], index: usize, _scale: f32) -> Result<DynamicImage> {
            thread::sleep(Duration::from_millis(((self.pages - index) * 15) as u64));
            let level = (index * 40) as u8;
            Ok(solid_image(16, 16, [level, level, level]))
        }
    }

    struct FailingRenderer;

    impl PdfRenderer for FailingRenderer {
        fn render_page(&self, _pdf: &[u8], index: usize, _scale: f32) -> Result<DynamicImage> {
            Err(FolioError::RenderError {
                page: index + 1,
                reason: "corrupt content stream".into(),
            })
        }
    }

    /// Sets up once per batch and answers pages back to front.
    #[derive(Default)]
    struct BatchRenderer {
        batches: AtomicUsize,
        single_pages: AtomicUsize,
    }

    impl PdfRenderer for BatchRenderer {
        fn render_page(&self, _pdf: &[u8], _index: usize, _scale: f32) -> Result<DynamicImage> {
            self.single_pages.fetch_add(1, Ordering::SeqCst);
            Ok(solid_image(4, 4, [0, 0, 0]))
        }

        fn render_pages(&self, _pdf: &[u8], count: usize, _scale: f32, sink: &PageSink<'_>) {
            self.batches.fetch_add(1, Ordering::SeqCst);
            for index in (0..count).rev() {
                let level = (index * 50) as u8;
                sink(index, Ok(solid_image(16, 16, [level, level, level])));
            }
        }
    }

    #[test]
    fn a_whole_document_is_rendered_in_one_batch() {
        let renderer = Arc::new(BatchRenderer::default());
        let rasterizer = PageRasterizer::new(renderer.clone(), RasterCodec::default(), 1.0);
        let results = rasterizer.rasterize_all(b"%PDF", 4);

        assert_eq!(renderer.batches.load(Ordering::SeqCst), 1);
        assert_eq!(renderer.single_pages.load(Ordering::SeqCst), 0);

        let codec = RasterCodec::default();
        let indices: Vec<usize> = results.iter().map(|(index, _)| *index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        for (index, raster) in results {
            let level = codec.decode(&raster.unwrap()).unwrap().to_rgb8().get_pixel(8, 8).0[0];
            assert!((level as i32 - (index * 50) as i32).abs() <= 3);
        }
    }

    #[test]
    fn output_is_in_page_order() {
        let rasterizer = PageRasterizer::new(
            Arc::new(ReverseTimedRenderer { pages: 5 }),
            RasterCodec::default(),
            1.0,
        );
        let results = rasterizer.rasterize_all(b"%PDF", 5);

        let codec = RasterCodec::default();
        for (expected, (index, raster)) in results.into_iter().enumerate() {
            assert_eq!(index, expected);
            let raster = raster.unwrap();
            assert_eq!(raster.mime_type(), "image/jpeg");
            let level = codec.decode(&raster).unwrap().to_rgb8().get_pixel(8, 8).0[0];
            assert!((level as i32 - (expected * 40) as i32).abs() <= 3);
        }
    }

    #[test]
    fn render_failures_are_reported_per_page() {
        let rasterizer =
            PageRasterizer::new(Arc::new(FailingRenderer), RasterCodec::default(), 1.0);
        let results = rasterizer.rasterize_all(b"%PDF", 2);
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[1].1,
            Err(FolioError::RenderError { page: 2, .. })
        ));
    }
}
