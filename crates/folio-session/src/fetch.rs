// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Remote document acquisition.

use folio_core::error::{FolioError, Result};
use reqwest::header::CONTENT_TYPE;
use tracing::{info, instrument, warn};

/// A downloaded document and the content type the server declared for it.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub bytes: Vec<u8>,
    /// MIME essence of the `Content-Type` header (parameters stripped), or
    /// empty when the server sent none.
    pub content_type: String,
}

/// GET `url` and return its body.
///
/// Transport errors and non-2xx responses become `FetchFailed`.
#[instrument(skip(client))]
pub async fn fetch_document(client: &reqwest::Client, url: &str) -> Result<FetchedDocument> {
    let response = client.get(url).send().await.map_err(|err| {
        warn!(error = %err, "Fetch request failed");
        FolioError::FetchFailed(err.to_string())
    })?;

    let status = response.status();
    if !status.is_success() {
        warn!(%status, "Fetch rejected");
        return Err(FolioError::FetchFailed(
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string()),
        ));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|essence| essence.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let bytes = response
        .bytes()
        .await
        .map_err(|err| FolioError::FetchFailed(err.to_string()))?
        .to_vec();

    info!(%content_type, bytes_len = bytes.len(), "Document fetched");
    Ok(FetchedDocument {
        bytes,
        content_type,
    })
}
