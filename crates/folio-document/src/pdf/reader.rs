// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader. Opens an existing PDF with `lopdf` and answers the two questions
// the pipeline asks of the original document: how many pages, and how big
// each page is.

use folio_core::PageGeometry;
use folio_core::error::{FolioError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument, warn};

/// US Letter, used when a page tree carries no usable MediaBox.
pub const FALLBACK_GEOMETRY: PageGeometry = PageGeometry {
    width_pt: 612.0,
    height_pt: 792.0,
};

// Guards against cyclic /Parent chains in malformed files.
const MAX_INHERIT_DEPTH: usize = 32;

/// Read-only view of an existing PDF document.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| FolioError::PdfError(format!("failed to load PDF from memory: {err}")))?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Size of page `page_number` (1-indexed), from its MediaBox.
    ///
    /// The MediaBox may be inherited from an ancestor `/Pages` node. A page
    /// with no resolvable box falls back to US Letter.
    pub fn page_geometry(&self, page_number: u32) -> Result<PageGeometry> {
        let pages = self.document.get_pages();
        let page_id = *pages.get(&page_number).ok_or_else(|| {
            FolioError::PdfError(format!(
                "page {page_number} out of range (document has {} pages)",
                pages.len()
            ))
        })?;

        match self.inherited_media_box(page_id) {
            Some(geometry) => Ok(geometry),
            None => {
                warn!(page_number, "MediaBox not found, falling back to US Letter");
                Ok(FALLBACK_GEOMETRY)
            }
        }
    }

    /// Geometry of every page, in page order.
    pub fn geometries(&self) -> Result<Vec<PageGeometry>> {
        (1..=self.page_count() as u32)
            .map(|n| self.page_geometry(n))
            .collect()
    }

    fn inherited_media_box(&self, page_id: ObjectId) -> Option<PageGeometry> {
        let mut node = self.document.get_dictionary(page_id).ok()?;

        for _ in 0..MAX_INHERIT_DEPTH {
            if let Some(geometry) = self.media_box_of(node) {
                return Some(geometry);
            }
            let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
            node = self.document.get_dictionary(parent).ok()?;
        }

        None
    }

    fn media_box_of(&self, dict: &Dictionary) -> Option<PageGeometry> {
        let entry = dict.get(b"MediaBox").ok()?;
        let array = match entry {
            Object::Array(array) => array,
            Object::Reference(id) => self.document.get_object(*id).ok()?.as_array().ok()?,
            _ => return None,
        };
        if array.len() < 4 {
            return None;
        }

        let coord = |i: usize| match &array[i] {
            Object::Integer(v) => Some(*v as f32),
            Object::Real(v) => Some(*v as f32),
            _ => None,
        };
        let (x1, y1, x2, y2) = (coord(0)?, coord(1)?, coord(2)?, coord(3)?);

        Some(PageGeometry {
            width_pt: (x2 - x1).abs(),
            height_pt: (y2 - y1).abs(),
        })
    }
}
