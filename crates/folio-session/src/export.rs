// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export coordinator: flush the current page, reassemble the document, and
// hand the bytes to a download or upload sink.
//
// Export never changes page content beyond the flush. Configuration and
// filename problems are reported before the flush and before any network I/O.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use folio_core::error::{FolioError, Result};
use folio_core::{Classification, ExportMode, SessionConfig, UploadMode};
use folio_document::{DocumentAssembler, RasterCodec};
use tracing::{info, instrument};

use crate::sink::{UploadSink, write_download};
use crate::store::PageStore;

/// Timestamp format for downloaded files (`yyyyMMdd_HHmmss`).
pub const DOWNLOAD_STAMP: &str = "%Y%m%d_%H%M%S";
/// Timestamp format for saved uploads (`yyyyMMdd_HHmmssSSS`).
pub const SAVE_STAMP: &str = "%Y%m%d_%H%M%S%3f";
/// Characters a user-chosen filename may not contain.
pub const FORBIDDEN_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

pub fn download_filename(now: DateTime<Local>, classification: Classification) -> String {
    format!("{}.{}", now.format(DOWNLOAD_STAMP), classification.extension())
}

pub fn save_filename(now: DateTime<Local>, classification: Classification) -> String {
    format!("{}.{}", now.format(SAVE_STAMP), classification.extension())
}

/// Check a user-chosen name and return it trimmed.
pub fn validate_filename(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.contains(FORBIDDEN_FILENAME_CHARS) {
        return Err(FolioError::InvalidFilename(name.to_string()));
    }
    Ok(trimmed)
}

/// Where an export ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Downloaded { path: PathBuf },
    Uploaded { filename: String, endpoint: String },
}

#[derive(Debug, Clone)]
pub struct ExportCoordinator {
    assembler: DocumentAssembler,
    client: reqwest::Client,
    sink_url: Option<String>,
}

impl ExportCoordinator {
    pub fn new(
        assembler: DocumentAssembler,
        client: reqwest::Client,
        sink_url: Option<String>,
    ) -> Self {
        Self {
            assembler,
            client,
            sink_url,
        }
    }

    pub fn from_config(config: &SessionConfig, client: reqwest::Client) -> Self {
        Self::new(
            DocumentAssembler::new(RasterCodec::new(config.jpeg_quality), config.page_sizing),
            client,
            config.sink_url.clone(),
        )
    }

    /// Export the store's document through `mode`.
    #[instrument(skip(self, store), fields(classification = %store.classification()))]
    pub async fn export(&self, store: &mut PageStore, mode: &ExportMode) -> Result<ExportOutcome> {
        let classification = store.classification();

        // Everything that can be rejected up front is rejected here.
        let upload = match mode {
            ExportMode::Download { .. } => None,
            ExportMode::Upload(upload_mode) => {
                let endpoint = self.sink_url.as_deref().ok_or(FolioError::IncompleteUrl)?;
                let filename = match upload_mode {
                    UploadMode::Save => save_filename(Local::now(), classification),
                    UploadMode::SaveAs(name) => {
                        format!("{}.{}", validate_filename(name)?, classification.extension())
                    }
                };
                Some((endpoint, filename, upload_mode.intent()))
            }
        };

        store.flush_current_page()?;

        // Reassemble off the async runtime; PDF assembly decodes every page.
        let assembler = self.assembler;
        let pages = store.pages().to_vec();
        let source_pages = store.source_pages().to_vec();
        let original = store.original();
        let bytes = tokio::task::spawn_blocking(move || {
            assembler.assemble(classification, &pages, original.as_deref(), &source_pages)
        })
        .await
        .map_err(|err| FolioError::PdfError(format!("assembly task failed: {err}")))??;

        match (mode, upload) {
            (ExportMode::Download { dir }, _) => {
                let filename = download_filename(Local::now(), classification);
                let path = write_download(dir, &filename, &bytes)?;
                Ok(ExportOutcome::Downloaded { path })
            }
            (ExportMode::Upload(_), Some((endpoint, filename, intent))) => {
                UploadSink::new(self.client.clone(), endpoint)
                    .upload(bytes, &filename, classification.mime_type(), intent)
                    .await?;
                info!(%filename, endpoint, "Document uploaded");
                Ok(ExportOutcome::Uploaded {
                    filename,
                    endpoint: endpoint.to_string(),
                })
            }
            (ExportMode::Upload(_), None) => Err(FolioError::IncompleteUrl),
        }
    }
}
