// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: page geometry, page rendering, and image-only PDF creation.

pub mod reader;
pub mod render;
pub mod writer;

pub use reader::PdfReader;
#[cfg(feature = "pdfium")]
pub use render::PdfiumRenderer;
pub use render::{PageSink, PdfRenderer};
pub use writer::PdfWriter;
