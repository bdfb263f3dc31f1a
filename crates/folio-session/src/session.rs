// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editing session: one document at a time, driven by load, navigate, and
// export requests.
//
// Every failure is recorded as a transient notification and handed back to the
// caller. None of them ends the session. Load, navigate, and export hold the
// busy signal for their whole duration; a request that arrives while it is set
// is refused with `Busy` and changes nothing.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use folio_bridge::{Edit, EditingSurface, SurfaceFactory};
use folio_core::error::{FolioError, Result};
use folio_core::notify::Notification;
use folio_core::{Classification, ExportMode, SessionConfig};
use folio_document::{DocumentLoader, LoadedDocument};
use tracing::{debug, info, instrument, warn};

use crate::export::{ExportCoordinator, ExportOutcome};
use crate::fetch::fetch_document;
use crate::store::PageStore;

// ---------------------------------------------------------------------------
// Busy signal
// ---------------------------------------------------------------------------

/// Shared "operation in flight" flag. Clones observe the same flag, so a UI
/// can watch it to disable its triggers.
#[derive(Debug, Clone, Default)]
pub struct BusySignal {
    flag: Arc<AtomicBool>,
}

impl BusySignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Set the flag, or fail with `Busy` if it is already set. The flag is
    /// cleared when the returned guard drops.
    pub fn try_acquire(&self) -> Result<BusyGuard> {
        self.flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| FolioError::Busy)?;
        Ok(BusyGuard {
            flag: Arc::clone(&self.flag),
        })
    }
}

/// Holds the busy flag until dropped.
#[derive(Debug)]
pub struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session {
    config: SessionConfig,
    loader: DocumentLoader,
    exporter: ExportCoordinator,
    factory: Arc<dyn SurfaceFactory>,
    client: reqwest::Client,
    store: Option<PageStore>,
    busy: BusySignal,
    notifications: Vec<Notification>,
}

impl Session {
    /// An idle session: no document is loaded until one is opened.
    pub fn new(
        config: SessionConfig,
        loader: DocumentLoader,
        factory: Arc<dyn SurfaceFactory>,
    ) -> Self {
        let client = reqwest::Client::new();
        Self {
            exporter: ExportCoordinator::from_config(&config, client.clone()),
            config,
            loader,
            factory,
            client,
            store: None,
            busy: BusySignal::new(),
            notifications: Vec::new(),
        }
    }

    /// Use `client` for fetches and uploads.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.exporter = ExportCoordinator::from_config(&self.config, client.clone());
        self.client = client;
        self
    }

    // -- Inspection -----------------------------------------------------------

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// A handle on the busy flag.
    pub fn busy_signal(&self) -> BusySignal {
        self.busy.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// The open document's pages, if a document is open.
    pub fn store(&self) -> Option<&PageStore> {
        self.store.as_ref()
    }

    pub fn classification(&self) -> Option<Classification> {
        self.store.as_ref().map(PageStore::classification)
    }

    /// The surface bound to the selected page.
    pub fn surface_mut(&mut self) -> Result<&mut dyn EditingSurface> {
        match self.store.as_mut() {
            Some(store) => store.surface_mut(),
            None => Err(FolioError::EditorNotReady),
        }
    }

    // -- Loading --------------------------------------------------------------

    /// Fetch and open the configured remote document.
    ///
    /// Returns `Ok(false)` without touching the network when the session is
    /// not configured with both a source and a sink URL.
    #[instrument(skip(self))]
    pub async fn open_remote(&mut self) -> Result<bool> {
        let result = self.open_remote_inner().await;
        self.report(result)
    }

    async fn open_remote_inner(&mut self) -> Result<bool> {
        let source_url = match (&self.config.source_url, self.config.wants_remote_document()) {
            (Some(url), true) => url.clone(),
            _ => {
                debug!("No remote document configured, staying idle");
                return Ok(false);
            }
        };

        let _busy = self.busy.try_acquire()?;
        let fetched = fetch_document(&self.client, &source_url).await?;
        self.load(fetched.bytes, &fetched.content_type).await?;
        Ok(true)
    }

    /// Open `bytes` declared as `declared_type` (a MIME type).
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    pub async fn open_bytes(&mut self, bytes: Vec<u8>, declared_type: &str) -> Result<()> {
        let result = match self.busy.try_acquire() {
            Ok(_busy) => self.load(bytes, declared_type).await,
            Err(err) => Err(err),
        };
        self.report(result)
    }

    /// Open a local file, classified by its extension.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn open_file(&mut self, path: &Path) -> Result<()> {
        let classification = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Classification::from_extension)
            .ok_or_else(|| FolioError::UnsupportedFormat(path.display().to_string()));

        let result = match classification {
            Ok(classification) => match tokio::fs::read(path).await {
                Ok(bytes) => return self.open_bytes(bytes, classification.mime_type()).await,
                Err(err) => Err(FolioError::Io(err)),
            },
            Err(err) => Err(err),
        };
        self.report(result)
    }

    /// Decode off the async runtime, then replace the open document.
    ///
    /// A failed load keeps the previous document open.
    async fn load(&mut self, bytes: Vec<u8>, declared_type: &str) -> Result<()> {
        let loader = self.loader.clone();
        let declared = declared_type.to_string();
        let document = tokio::task::spawn_blocking(move || loader.load(&bytes, &declared))
            .await
            .map_err(|err| FolioError::PdfError(format!("load task failed: {err}")))??;
        self.install(document)
    }

    fn install(&mut self, document: LoadedDocument) -> Result<()> {
        // Only one surface may be alive: the open document gives up its
        // surface before the new one binds, and takes it back if that fails.
        if let Some(previous) = self.store.as_mut() {
            if let Err(err) = previous.suspend() {
                warn!(error = %err, "Open document could not be suspended, closing it");
                self.store = None;
            }
        }

        match PageStore::open(document, Arc::clone(&self.factory)) {
            Ok(store) => {
                info!(
                    classification = %store.classification(),
                    pages = store.page_count(),
                    "Document opened"
                );
                self.store = Some(store);
                Ok(())
            }
            Err(err) => {
                if let Some(previous) = self.store.as_mut() {
                    if let Err(restore) = previous.resume() {
                        warn!(error = %restore, "Open document could not be rebound, closing it");
                        self.store = None;
                    }
                }
                Err(err)
            }
        }
    }

    // -- Editing and navigation -----------------------------------------------

    /// Apply `edit` to the selected page's surface.
    pub fn apply_edit(&mut self, edit: &Edit) -> Result<()> {
        let result = self.surface_mut().and_then(|surface| surface.apply(edit));
        self.report(result)
    }

    /// Move to page `target` (1-based). See [`PageStore::select_page`].
    pub fn select_page(&mut self, target: usize) -> Result<bool> {
        let result = self.navigate(|store| store.select_page(target));
        self.report(result)
    }

    /// Move to a page typed as free text.
    pub fn select_page_input(&mut self, input: &str) -> Result<bool> {
        let result = self.navigate(|store| store.select_page_input(input));
        self.report(result)
    }

    fn navigate(&mut self, step: impl FnOnce(&mut PageStore) -> Result<bool>) -> Result<bool> {
        let _busy = self.busy.try_acquire()?;
        let store = self.store.as_mut().ok_or(FolioError::EditorNotReady)?;
        step(store)
    }

    // -- Export ---------------------------------------------------------------

    /// Flush the selected page and export the whole document through `mode`.
    pub async fn export(&mut self, mode: &ExportMode) -> Result<ExportOutcome> {
        let result = self.export_inner(mode).await;
        self.report(result)
    }

    async fn export_inner(&mut self, mode: &ExportMode) -> Result<ExportOutcome> {
        let _busy = self.busy.try_acquire()?;
        let store = self.store.as_mut().ok_or(FolioError::EditorNotReady)?;
        self.exporter.export(store, mode).await
    }

    // -- Notifications --------------------------------------------------------

    /// Notifications still visible at `now`, oldest first.
    pub fn notifications(&self, now: Instant) -> impl Iterator<Item = &Notification> {
        self.notifications
            .iter()
            .filter(move |note| !note.is_expired(now))
    }

    /// Forget notifications that have timed out by `now`.
    pub fn dismiss_expired(&mut self, now: Instant) {
        self.notifications.retain(|note| !note.is_expired(now));
    }

    pub fn dismiss_all(&mut self) {
        self.notifications.clear();
    }

    fn report<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            warn!(error = %err, "Operation failed");
            let dismiss_after = Duration::from_millis(self.config.notification_timeout_ms);
            self.notifications
                .push(Notification::from_error(err, dismiss_after));
        }
        result
    }
}
