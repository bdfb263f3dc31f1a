// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembler: page rasters back to output document bytes.

use folio_core::error::{FolioError, Result};
use folio_core::{Classification, PageGeometry, PageRaster, PageSizing};
use tracing::{debug, instrument};

use crate::codec::RasterCodec;
use crate::pdf::{PdfReader, PdfWriter};

/// Title embedded in reassembled PDFs.
const OUTPUT_TITLE: &str = "Folio Document";

/// Rebuilds an output document from edited page rasters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentAssembler {
    codec: RasterCodec,
    sizing: PageSizing,
}

impl DocumentAssembler {
    pub fn new(codec: RasterCodec, sizing: PageSizing) -> Self {
        Self { codec, sizing }
    }

    pub fn sizing(&self) -> PageSizing {
        self.sizing
    }

    /// Produce the output bytes for `classification`.
    ///
    /// For PDFs, `original` supplies page geometry and `source_pages` maps each
    /// raster to the 1-based original page it was rendered from (only consulted
    /// under [`PageSizing::PerPage`]). Images ignore both.
    #[instrument(skip_all, fields(%classification, pages = pages.len()))]
    pub fn assemble(
        &self,
        classification: Classification,
        pages: &[PageRaster],
        original: Option<&[u8]>,
        source_pages: &[usize],
    ) -> Result<Vec<u8>> {
        match classification {
            Classification::Pdf => {
                let original = original.ok_or_else(|| {
                    FolioError::UnsupportedFormat(
                        "PDF export needs the original document for page geometry".into(),
                    )
                })?;
                self.assemble_pdf(pages, original, source_pages)
            }
            Classification::Jpg | Classification::Png => {
                let [raster] = pages else {
                    return Err(FolioError::ImageError(format!(
                        "an image document has exactly one page, found {}",
                        pages.len()
                    )));
                };
                self.codec.export_bytes(raster, classification)
            }
        }
    }

    fn assemble_pdf(
        &self,
        pages: &[PageRaster],
        original: &[u8],
        source_pages: &[usize],
    ) -> Result<Vec<u8>> {
        let reader = PdfReader::from_bytes(original)?;
        let first = reader.page_geometry(1)?;

        let mut writer = PdfWriter::new(OUTPUT_TITLE);
        for (index, raster) in pages.iter().enumerate() {
            let geometry = match self.sizing {
                PageSizing::FirstPage => first,
                PageSizing::PerPage => {
                    let source = source_pages.get(index).copied().unwrap_or(index + 1);
                    self.geometry_of(&reader, source)?
                }
            };
            let pixels = self.codec.decode(raster)?;
            writer.add_image_page(&pixels, geometry)?;
        }

        debug!(sizing = ?self.sizing, "Pages placed");
        writer.finish()
    }

    fn geometry_of(&self, reader: &PdfReader, page_number: usize) -> Result<PageGeometry> {
        let page_number = u32::try_from(page_number)
            .map_err(|_| FolioError::PdfError(format!("page {page_number} out of range")))?;
        reader.page_geometry(page_number)
    }
}
