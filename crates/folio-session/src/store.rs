// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page store: the single owner of the page sequence.
//
// The editing surface only ever shows one page. The store reconciles it with
// the full sequence: before the selection moves away from a page, and before
// any export, the surface's full-page output is written back into that page's
// slot. Nothing else may write a slot.

use std::sync::Arc;

use folio_bridge::{EditingSurface, SurfaceFactory};
use folio_core::error::{FolioError, Result};
use folio_core::{Classification, PageRaster, ToolSet};
use folio_document::LoadedDocument;
use tracing::{debug, info, instrument, warn};

use crate::surface::SurfaceManager;

pub struct PageStore {
    classification: Classification,
    pages: Vec<PageRaster>,
    source_pages: Vec<usize>,
    original: Option<Arc<[u8]>>,
    tools: ToolSet,
    /// 1-based; always within `1..=pages.len()`.
    selected: usize,
    surfaces: SurfaceManager,
}

impl PageStore {
    /// Take ownership of a loaded document and bind page 1 to a new surface.
    pub fn open(document: LoadedDocument, factory: Arc<dyn SurfaceFactory>) -> Result<Self> {
        if document.pages.is_empty() {
            return Err(FolioError::UnsupportedFormat("document has no pages".into()));
        }

        let tools = ToolSet::for_classification(document.classification);
        let mut surfaces = SurfaceManager::new(factory);
        surfaces.rebind(&document.pages[0], &tools)?;

        info!(
            classification = %document.classification,
            pages = document.pages.len(),
            "Page store opened"
        );

        Ok(Self {
            classification: document.classification,
            pages: document.pages,
            source_pages: document.source_pages,
            original: document.original,
            tools,
            selected: 1,
            surfaces,
        })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The currently selected page, 1-based.
    pub fn selected_page(&self) -> usize {
        self.selected
    }

    /// All page rasters in page order.
    pub fn pages(&self) -> &[PageRaster] {
        &self.pages
    }

    /// Page `number` (1-based), if it exists.
    pub fn page(&self, number: usize) -> Option<&PageRaster> {
        number.checked_sub(1).and_then(|index| self.pages.get(index))
    }

    /// Original page number of each stored page.
    pub fn source_pages(&self) -> &[usize] {
        &self.source_pages
    }

    /// A shared handle to the original document bytes (PDFs only). The bytes
    /// themselves are never copied.
    pub fn original(&self) -> Option<Arc<[u8]>> {
        self.original.clone()
    }

    /// The surface bound to the selected page.
    pub fn surface_mut(&mut self) -> Result<&mut dyn EditingSurface> {
        self.surfaces.current_mut()
    }

    // -- Mutation -------------------------------------------------------------

    /// Capture the surface's full, un-zoomed page into the selected slot.
    ///
    /// Returns whether the slot changed. An unchanged export leaves the slot
    /// untouched, so a second flush without an intervening edit is a no-op.
    #[instrument(skip(self), fields(page = self.selected))]
    pub fn flush_current_page(&mut self) -> Result<bool> {
        let surface = self.surfaces.current_mut()?;
        surface.reset_zoom();
        let exported = surface.export_full_raster()?;

        let slot = &mut self.pages[self.selected - 1];
        if *slot == exported {
            debug!("Page unchanged, nothing to flush");
            return Ok(false);
        }

        *slot = exported;
        debug!("Page flushed");
        Ok(true)
    }

    /// Flush the selected page and dispose its surface, leaving the store
    /// with no surface bound. [`resume`](Self::resume) binds it again.
    pub fn suspend(&mut self) -> Result<()> {
        self.flush_current_page()?;
        self.surfaces.release();
        debug!(page = self.selected, "Store suspended");
        Ok(())
    }

    /// Bind a surface to the selected page again after [`suspend`](Self::suspend).
    pub fn resume(&mut self) -> Result<()> {
        self.surfaces.rebind(&self.pages[self.selected - 1], &self.tools)?;
        debug!(page = self.selected, "Store resumed");
        Ok(())
    }

    /// Move the selection to `target` (1-based).
    ///
    /// Out-of-range targets and the already-selected page are no-ops that
    /// return `Ok(false)`. Otherwise the current page is flushed, the surface
    /// is rebound to the target page, and the selection moves. If the new
    /// surface cannot be bound, the previous page is rebound and the error is
    /// returned with the selection unchanged.
    #[instrument(skip(self), fields(from = self.selected))]
    pub fn select_page(&mut self, target: usize) -> Result<bool> {
        if target < 1 || target > self.pages.len() {
            debug!(target, "Ignoring out-of-range page selection");
            return Ok(false);
        }
        if target == self.selected {
            return Ok(false);
        }

        self.flush_current_page()?;

        let bound = self
            .surfaces
            .rebind(&self.pages[target - 1], &self.tools)
            .map(|_| ());
        if let Err(err) = bound {
            warn!(target, error = %err, "Could not bind page, restoring previous page");
            self.surfaces
                .rebind(&self.pages[self.selected - 1], &self.tools)?;
            return Err(err);
        }

        self.selected = target;
        info!(page = target, "Page selected");
        Ok(true)
    }

    /// Move the selection to a page typed as free text. Input that is not a
    /// page number is ignored like an out-of-range target.
    pub fn select_page_input(&mut self, input: &str) -> Result<bool> {
        match input.trim().parse::<usize>() {
            Ok(target) => self.select_page(target),
            Err(_) => {
                debug!(input, "Ignoring non-numeric page entry");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_bridge::{Edit, Filter, RasterSurfaceFactory};
    use folio_document::RasterCodec;
    use folio_document::fixtures::{marked_png, solid_image};

    fn pdf_document(count: usize) -> LoadedDocument {
        let codec = RasterCodec::default();
        LoadedDocument {
            classification: Classification::Pdf,
            pages: (0..count)
                .map(|i| {
                    let level = 40 + i as u8 * 50;
                    codec.encode_jpeg(&solid_image(24, 32, [level, level, level])).unwrap()
                })
                .collect(),
            source_pages: (1..=count).collect(),
            original: Some(Arc::from(&b"%PDF-stub"[..])),
        }
    }

    fn png_document() -> LoadedDocument {
        LoadedDocument {
            classification: Classification::Png,
            pages: vec![RasterCodec::default().wrap(&marked_png(10, 8)).unwrap()],
            source_pages: vec![1],
            original: None,
        }
    }

    fn open(document: LoadedDocument) -> (PageStore, Arc<RasterSurfaceFactory>) {
        let factory = Arc::new(RasterSurfaceFactory::default());
        let store = PageStore::open(document, factory.clone()).unwrap();
        (store, factory)
    }

    fn darken() -> Edit {
        Edit::Rectangle { x: 0, y: 0, width: 6, height: 6, color: [0, 0, 0, 255] }
    }

    #[test]
    fn valid_targets_move_the_selection() {
        let (mut store, _) = open(pdf_document(3));
        for target in [2, 3, 1, 3] {
            store.select_page(target).unwrap();
            assert_eq!(store.selected_page(), target);
            assert_eq!(store.page_count(), 3);
        }
    }

    #[test]
    fn invalid_targets_leave_the_selection() {
        let (mut store, _) = open(pdf_document(3));
        store.select_page(2).unwrap();
        for target in [0, 4, 100] {
            assert!(!store.select_page(target).unwrap());
            assert_eq!(store.selected_page(), 2);
        }
        for input in ["", "abc", "-1", "2.5", "99"] {
            assert!(!store.select_page_input(input).unwrap());
            assert_eq!(store.selected_page(), 2);
        }
        assert!(store.select_page_input(" 3 ").unwrap());
        assert_eq!(store.selected_page(), 3);
    }

    #[test]
    fn single_image_has_nowhere_to_go() {
        let (mut store, _) = open(png_document());
        assert!(!store.select_page(2).unwrap());
        assert_eq!(store.selected_page(), 1);
    }

    #[test]
    fn navigation_flushes_the_page_being_left() {
        let (mut store, _) = open(pdf_document(3));
        let before = store.pages().to_vec();

        store.select_page(2).unwrap();
        store.surface_mut().unwrap().apply(&darken()).unwrap();
        store.select_page(3).unwrap();

        assert_eq!(store.page(1), Some(&before[0]));
        assert_ne!(store.page(2), Some(&before[1]));
        assert_eq!(store.page(3), Some(&before[2]));
    }

    #[test]
    fn flush_is_idempotent() {
        let (mut store, _) = open(pdf_document(2));
        store.surface_mut().unwrap().apply(&darken()).unwrap();

        assert!(store.flush_current_page().unwrap());
        let after_first = store.pages().to_vec();
        assert!(!store.flush_current_page().unwrap());
        assert_eq!(store.pages(), after_first.as_slice());
    }

    #[test]
    fn flush_without_edits_changes_nothing() {
        let (mut store, _) = open(png_document());
        let before = store.pages().to_vec();
        assert!(!store.flush_current_page().unwrap());
        assert_eq!(store.pages(), before.as_slice());
    }

    #[test]
    fn flush_resets_zoom_before_export() {
        let (mut store, _) = open(png_document());
        let before = store.pages().to_vec();
        store.surface_mut().unwrap().zoom(3.0);

        // A zoomed export would be a cropped page; the flush must not store it.
        assert!(!store.flush_current_page().unwrap());
        assert_eq!(store.pages(), before.as_slice());
    }

    #[test]
    fn pdf_pages_refuse_crop() {
        let (mut store, _) = open(pdf_document(1));
        let err = store
            .surface_mut()
            .unwrap()
            .apply(&Edit::Crop { x: 0, y: 0, width: 4, height: 4 })
            .unwrap_err();
        assert!(matches!(err, FolioError::ToolUnavailable(_)));
        assert!(store.surface_mut().unwrap().apply(&Edit::Filter(Filter::Grayscale)).is_ok());
    }

    #[test]
    fn only_one_surface_is_ever_alive() {
        let (mut store, factory) = open(pdf_document(3));
        for target in [2, 3, 1, 2] {
            store.select_page(target).unwrap();
            assert_eq!(factory.live_surfaces(), 1);
        }
        assert_eq!(factory.created_surfaces(), 5);
        drop(store);
        assert_eq!(factory.live_surfaces(), 0);
    }

    #[test]
    fn unbindable_page_restores_previous_selection() {
        let mut document = pdf_document(3);
        document.pages[2] = PageRaster::from_encoded("image/jpeg", b"corrupt");
        let (mut store, factory) = open(document);

        store.select_page(2).unwrap();
        assert!(store.select_page(3).is_err());
        assert_eq!(store.selected_page(), 2);
        assert_eq!(factory.live_surfaces(), 1);
        assert!(store.surface_mut().unwrap().export_full_raster().is_ok());
    }

    #[test]
    fn original_bytes_are_shared() {
        let (store, _factory) = open(pdf_document(2));
        let first = store.original().unwrap();
        let second = store.original().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(&*first, b"%PDF-stub");
    }

    #[test]
    fn suspend_keeps_edits_and_resume_rebinds() {
        let (mut store, factory) = open(pdf_document(2));
        store.select_page(2).unwrap();
        let before = store.page(2).unwrap().clone();
        store.surface_mut().unwrap().apply(&darken()).unwrap();

        store.suspend().unwrap();
        assert_eq!(factory.live_surfaces(), 0);
        assert!(matches!(store.surface_mut(), Err(FolioError::EditorNotReady)));
        assert_ne!(store.page(2).unwrap(), &before);

        store.resume().unwrap();
        assert_eq!(factory.live_surfaces(), 1);
        assert_eq!(store.selected_page(), 2);
        assert!(store.surface_mut().is_ok());
    }

    #[test]
    fn empty_documents_are_rejected() {
        let document = LoadedDocument {
            classification: Classification::Pdf,
            pages: Vec::new(),
            source_pages: Vec::new(),
            original: None,
        };
        let factory = Arc::new(RasterSurfaceFactory::default());
        assert!(PageStore::open(document, factory).is_err());
    }
}
