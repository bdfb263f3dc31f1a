// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer. Builds a new image-only PDF with `printpdf` 0.8, one full-bleed
// raster per page.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`. The serialised output is passed through `lopdf` once
// more so every stream ends up Flate-compressed.

use folio_core::PageGeometry;
use folio_core::error::{FolioError, Result};
use image::DynamicImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

/// Images are placed at 72 DPI so one pixel maps to one point before scaling.
const PLACEMENT_DPI: f32 = 72.0;

const MM_PER_PT: f32 = 25.4 / 72.0;

/// Accumulates raster pages into a new PDF document.
pub struct PdfWriter {
    document: PdfDocument,
    pages: Vec<PdfPage>,
}

impl PdfWriter {
    /// Start an empty document with the given /Title.
    pub fn new(title: &str) -> Self {
        Self {
            document: PdfDocument::new(title),
            pages: Vec::new(),
        }
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Append a page of `geometry` with `image` stretched to fill it from the
    /// origin.
    #[instrument(skip(self, image), fields(px_w = image.width(), px_h = image.height()))]
    pub fn add_image_page(&mut self, image: &DynamicImage, geometry: PageGeometry) -> Result<()> {
        let (px_w, px_h) = (image.width(), image.height());
        if px_w == 0 || px_h == 0 {
            return Err(FolioError::ImageError("cannot place an empty image".into()));
        }

        let raw = RawImage {
            pixels: RawImageData::U8(image.to_rgb8().into_raw()),
            width: px_w as usize,
            height: px_h as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = self.document.add_image(&raw);

        let scale_x = geometry.width_pt / px_w as f32;
        let scale_y = geometry.height_pt / px_h as f32;

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                dpi: Some(PLACEMENT_DPI),
                rotate: None,
            },
        }];

        self.pages.push(PdfPage::new(
            Mm(geometry.width_pt * MM_PER_PT),
            Mm(geometry.height_pt * MM_PER_PT),
            ops,
        ));

        debug!(
            page = self.pages.len(),
            width_pt = geometry.width_pt,
            height_pt = geometry.height_pt,
            scale_x,
            scale_y,
            "Image placed on page"
        );
        Ok(())
    }

    /// Serialise the document with compressed streams.
    #[instrument(skip(self), fields(pages = self.pages.len()))]
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(FolioError::PdfError("document has no pages".into()));
        }

        self.document.with_pages(self.pages);

        // printpdf downsamples large images unless told otherwise; pages are
        // embedded at their rendered resolution.
        let options = PdfSaveOptions {
            image_optimization: None,
            ..PdfSaveOptions::default()
        };
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let raw = self.document.save(&options, &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings while saving");
        }

        let output = compress(&raw)?;
        info!(
            raw_bytes = raw.len(),
            output_bytes = output.len(),
            "PDF assembled"
        );
        Ok(output)
    }
}

fn compress(pdf: &[u8]) -> Result<Vec<u8>> {
    let mut document = lopdf::Document::load_mem(pdf)
        .map_err(|err| FolioError::PdfError(format!("failed to reload generated PDF: {err}")))?;
    document.compress();

    let mut output = Vec::new();
    document
        .save_to(&mut output)
        .map_err(|err| FolioError::PdfError(format!("failed to serialise PDF: {err}")))?;
    Ok(output)
}
