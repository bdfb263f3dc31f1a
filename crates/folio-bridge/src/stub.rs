// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process raster surface for the CLI, headless use and tests.
//
// Holds the decoded page, applies edits with `ImageProcessor`, and honours the
// surface contract exactly: unedited pages export byte-identical, a zoomed
// viewport exports only the visible region, and a disposed surface refuses
// further work.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use folio_core::error::{FolioError, Result};
use folio_core::{PageRaster, ToolSet};
use folio_document::{ImageProcessor, RasterCodec};
use image::DynamicImage;
use tracing::{debug, instrument};

use crate::traits::*;

/// Builds [`RasterSurface`]s and counts how many are alive.
#[derive(Debug, Clone, Default)]
pub struct RasterSurfaceFactory {
    codec: RasterCodec,
    live: Arc<AtomicUsize>,
    created: Arc<AtomicUsize>,
}

impl RasterSurfaceFactory {
    pub fn new(codec: RasterCodec) -> Self {
        Self {
            codec,
            ..Self::default()
        }
    }

    /// Surfaces created and not yet disposed or dropped.
    pub fn live_surfaces(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Surfaces created over the factory's lifetime.
    pub fn created_surfaces(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl SurfaceFactory for RasterSurfaceFactory {
    fn create(&self) -> Box<dyn EditingSurface> {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.created.fetch_add(1, Ordering::SeqCst);
        Box::new(RasterSurface {
            codec: self.codec,
            live: Some(Arc::clone(&self.live)),
            page: None,
            zoom: 1.0,
        })
    }
}

struct LoadedPage {
    original: PageRaster,
    image: DynamicImage,
    tools: ToolSet,
    edited: bool,
}

/// An editing surface that keeps the page in memory.
pub struct RasterSurface {
    codec: RasterCodec,
    // `None` once disposed.
    live: Option<Arc<AtomicUsize>>,
    page: Option<LoadedPage>,
    zoom: f32,
}

impl RasterSurface {
    fn release(&mut self) {
        if let Some(live) = self.live.take() {
            live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn page_mut(&mut self) -> Result<&mut LoadedPage> {
        if self.live.is_none() {
            return Err(FolioError::EditorNotReady);
        }
        self.page.as_mut().ok_or(FolioError::EditorNotReady)
    }

    /// The region visible at the current zoom, centred on the page.
    fn visible(&self, image: &DynamicImage) -> DynamicImage {
        if self.zoom <= 1.0 {
            return image.clone();
        }
        let (w, h) = (image.width(), image.height());
        let view_w = ((w as f32 / self.zoom).round() as u32).clamp(1, w.max(1));
        let view_h = ((h as f32 / self.zoom).round() as u32).clamp(1, h.max(1));
        image.crop_imm((w - view_w) / 2, (h - view_h) / 2, view_w, view_h)
    }
}

impl EditingSurface for RasterSurface {
    #[instrument(skip_all, fields(mime = raster.mime_type()))]
    fn load_raster(&mut self, raster: &PageRaster, tools: &ToolSet) -> Result<()> {
        if self.live.is_none() {
            return Err(FolioError::EditorNotReady);
        }
        let image = self.codec.decode(raster)?;
        debug!(width = image.width(), height = image.height(), "Page bound to surface");

        self.page = Some(LoadedPage {
            original: raster.clone(),
            image,
            tools: tools.clone(),
            edited: false,
        });
        self.zoom = 1.0;
        Ok(())
    }

    fn reset_zoom(&mut self) {
        self.zoom = 1.0;
    }

    fn export_full_raster(&self) -> Result<PageRaster> {
        if self.live.is_none() {
            return Err(FolioError::EditorNotReady);
        }
        let page = self.page.as_ref().ok_or(FolioError::EditorNotReady)?;

        if !page.edited && self.zoom <= 1.0 {
            return Ok(page.original.clone());
        }
        self.codec
            .encode(&self.visible(&page.image), page.original.mime_type())
    }

    fn dispose(&mut self) {
        self.page = None;
        self.release();
    }

    #[instrument(skip_all, fields(tool = %edit.tool()))]
    fn apply(&mut self, edit: &Edit) -> Result<()> {
        let page = self.page_mut()?;
        page.tools.require(edit.tool())?;

        // Decode overlays before touching the page so a bad image leaves it intact.
        let overlay = match edit {
            Edit::Overlay { image: bytes, .. } => {
                Some(image::load_from_memory(bytes).map_err(|err| {
                    FolioError::ImageError(format!("failed to decode overlay: {err}"))
                })?)
            }
            _ => None,
        };

        let current = std::mem::replace(&mut page.image, DynamicImage::new_rgba8(0, 0));
        let processor = ImageProcessor::from_dynamic(current);
        let processor = match edit {
            Edit::Crop {
                x,
                y,
                width,
                height,
            } => processor.crop(*x, *y, *width, *height),
            Edit::Flip(axis) => processor.flip(*axis),
            Edit::Rotate { degrees } => processor.rotate(*degrees),
            Edit::Stroke { from, to, color } => processor.draw_line(*from, *to, *color),
            Edit::Rectangle {
                x,
                y,
                width,
                height,
                color,
            } => processor.fill_rect(*x, *y, *width, *height, *color),
            Edit::Filter(Filter::Grayscale) => processor.grayscale(),
            Edit::Filter(Filter::Brightness(value)) => processor.adjust_brightness(*value),
            Edit::Filter(Filter::Contrast(factor)) => processor.adjust_contrast(*factor),
            Edit::Overlay { x, y, .. } => match &overlay {
                Some(top) => processor.overlay(top, *x, *y),
                None => processor,
            },
        };

        page.image = processor.into_dynamic();
        page.edited = true;
        Ok(())
    }

    fn zoom(&mut self, factor: f32) {
        self.zoom = factor.max(1.0);
    }
}

impl Drop for RasterSurface {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{Classification, Tool};
    use folio_document::fixtures::{marked_png, solid_image};
    use folio_document::image::FlipAxis;

    fn png_raster(width: u32, height: u32) -> PageRaster {
        RasterCodec::default().wrap(&marked_png(width, height)).unwrap()
    }

    fn bound(raster: &PageRaster, classification: Classification) -> Box<dyn EditingSurface> {
        let mut surface = RasterSurfaceFactory::default().create();
        surface
            .load_raster(raster, &ToolSet::for_classification(classification))
            .unwrap();
        surface
    }

    fn dimensions(raster: &PageRaster) -> (u32, u32) {
        let image = RasterCodec::default().decode(raster).unwrap();
        (image.width(), image.height())
    }

    #[test]
    fn unedited_export_is_byte_identical() {
        let raster = png_raster(20, 10);
        let surface = bound(&raster, Classification::Png);
        assert_eq!(surface.export_full_raster().unwrap(), raster);
    }

    #[test]
    fn edits_change_the_export_and_keep_the_mime() {
        let raster = png_raster(20, 10);
        let mut surface = bound(&raster, Classification::Png);
        surface.apply(&Edit::Flip(FlipAxis::Horizontal)).unwrap();

        let exported = surface.export_full_raster().unwrap();
        assert_ne!(exported, raster);
        assert_eq!(exported.mime_type(), "image/png");
        let pixels = RasterCodec::default().decode(&exported).unwrap().to_rgb8();
        assert_eq!(pixels.get_pixel(19, 0).0, [255, 0, 0]);
    }

    #[test]
    fn repeated_exports_of_the_same_edit_are_identical() {
        let codec = RasterCodec::default();
        let raster = codec.encode_jpeg(&solid_image(32, 32, [90, 90, 90])).unwrap();
        let mut surface = bound(&raster, Classification::Pdf);
        surface
            .apply(&Edit::Rectangle { x: 2, y: 2, width: 8, height: 8, color: [0, 0, 0, 255] })
            .unwrap();
        assert_eq!(
            surface.export_full_raster().unwrap(),
            surface.export_full_raster().unwrap()
        );
    }

    #[test]
    fn zoomed_export_is_cropped_until_reset() {
        let raster = png_raster(40, 20);
        let mut surface = bound(&raster, Classification::Png);
        surface.zoom(2.0);
        assert_eq!(dimensions(&surface.export_full_raster().unwrap()), (20, 10));

        surface.reset_zoom();
        assert_eq!(surface.export_full_raster().unwrap(), raster);
    }

    #[test]
    fn pdf_pages_reject_geometry_tools() {
        let raster = png_raster(10, 10);
        let mut surface = bound(&raster, Classification::Pdf);
        let err = surface
            .apply(&Edit::Crop { x: 0, y: 0, width: 5, height: 5 })
            .unwrap_err();
        assert!(matches!(err, FolioError::ToolUnavailable(Tool::Crop)));
        assert!(matches!(
            surface.apply(&Edit::Rotate { degrees: 90.0 }),
            Err(FolioError::ToolUnavailable(Tool::Rotate))
        ));
        // Rejected edits leave the page untouched.
        assert_eq!(surface.export_full_raster().unwrap(), raster);
    }

    #[test]
    fn bad_overlay_leaves_page_intact() {
        let raster = png_raster(10, 10);
        let mut surface = bound(&raster, Classification::Png);
        let bad = Edit::Overlay { image: b"junk".to_vec(), x: 0, y: 0 };
        assert!(matches!(surface.apply(&bad), Err(FolioError::ImageError(_))));
        assert_eq!(surface.export_full_raster().unwrap(), raster);

        let good = Edit::Overlay { image: marked_png(4, 4), x: 3, y: 3 };
        surface.apply(&good).unwrap();
        assert_eq!(dimensions(&surface.export_full_raster().unwrap()), (10, 10));
    }

    #[test]
    fn disposed_surface_is_not_ready() {
        let factory = RasterSurfaceFactory::default();
        let mut surface = factory.create();
        assert!(matches!(
            surface.export_full_raster(),
            Err(FolioError::EditorNotReady)
        ));

        surface
            .load_raster(&png_raster(4, 4), &ToolSet::for_classification(Classification::Png))
            .unwrap();
        assert_eq!(factory.live_surfaces(), 1);

        surface.dispose();
        assert_eq!(factory.live_surfaces(), 0);
        assert!(matches!(
            surface.export_full_raster(),
            Err(FolioError::EditorNotReady)
        ));
        assert!(matches!(
            surface.apply(&Edit::Filter(Filter::Grayscale)),
            Err(FolioError::EditorNotReady)
        ));

        // Dropping after dispose does not double-count.
        drop(surface);
        assert_eq!(factory.live_surfaces(), 0);
        assert_eq!(factory.created_surfaces(), 1);
    }
}
