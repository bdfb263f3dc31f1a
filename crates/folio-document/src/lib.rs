// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-document: pixels and documents for the Folio editor.
//
// Provides the raster codec, PDF page rasterisation, document loading (PDF or
// single image into ordered page rasters), and reassembly of edited pages into
// an output document.

pub mod assemble;
pub mod codec;
pub mod image;
pub mod loader;
pub mod pdf;
pub mod rasterize;

#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;

// Re-export the primary structs so callers can use `folio_document::DocumentLoader` etc.
pub use assemble::DocumentAssembler;
pub use codec::RasterCodec;
pub use self::image::processor::ImageProcessor;
pub use loader::{DocumentLoader, LoadedDocument};
pub use pdf::{PdfReader, PdfRenderer, PdfWriter};
pub use rasterize::PageRasterizer;

#[cfg(feature = "pdfium")]
pub use pdf::PdfiumRenderer;
