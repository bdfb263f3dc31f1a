// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output sinks for assembled documents: a local directory ("download") and a
// multipart HTTP upload endpoint.

use std::io::Write;
use std::path::{Path, PathBuf};

use folio_core::error::{FolioError, Result};
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, instrument, warn};

/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";
/// Multipart field carrying the upload intent (`replace` or `new`).
pub const ACTION_FIELD: &str = "action";

/// Write `bytes` to `dir/filename`.
///
/// The bytes go to a temporary file in `dir` first, which is renamed into
/// place once complete, so a failed write never leaves a partial document
/// under the final name. The temporary file is removed on any failure.
#[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
pub fn write_download(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let mut staging = tempfile::NamedTempFile::new_in(dir)?;
    staging.write_all(bytes)?;
    staging.flush()?;

    let target = dir.join(filename);
    staging
        .persist(&target)
        .map_err(|err| FolioError::Io(err.error))?;

    info!(path = %target.display(), "Document downloaded");
    Ok(target)
}

/// POSTs documents to the configured upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadSink {
    client: reqwest::Client,
    endpoint: String,
}

impl UploadSink {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Send `bytes` as multipart field `file` named `filename`, with the
    /// intent in field `action`.
    ///
    /// Any non-2xx response becomes `SaveFailed` carrying the status text.
    #[instrument(skip(self, bytes), fields(endpoint = %self.endpoint, bytes_len = bytes.len()))]
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        mime: &str,
        intent: &str,
    ) -> Result<()> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime)
            .map_err(|err| FolioError::SaveFailed(err.to_string()))?;
        let form = Form::new()
            .part(FILE_FIELD, part)
            .text(ACTION_FIELD, intent.to_string());

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "Upload request failed");
                FolioError::SaveFailed(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string());
            warn!(%status, "Upload rejected");
            return Err(FolioError::SaveFailed(text));
        }

        debug!(%status, filename, "Upload accepted");
        Ok(())
    }
}
