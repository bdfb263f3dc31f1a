// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session configuration, resolved once when a session starts.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::types::PageSizing;

/// Query parameter naming the source document location.
pub const SOURCE_URL_PARAM: &str = "fileUrl";
/// Query parameter naming the upload endpoint.
pub const SINK_URL_PARAM: &str = "apiEndpoint";

/// Settings for one editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where to fetch the document from (`fileUrl`).
    pub source_url: Option<String>,
    /// Where uploads are POSTed (`apiEndpoint`).
    pub sink_url: Option<String>,
    /// Target rasterisation density for PDF pages.
    pub render_dpi: f32,
    /// Native density of the PDF coordinate space.
    pub native_dpi: f32,
    /// JPEG quality (1-100) for rasterised PDF pages.
    pub jpeg_quality: u8,
    /// Output page sizing for reassembled PDFs.
    pub page_sizing: PageSizing,
    /// How long an error notification stays visible.
    pub notification_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            source_url: None,
            sink_url: None,
            render_dpi: 300.0,
            native_dpi: 72.0,
            jpeg_quality: 70,
            page_sizing: PageSizing::FirstPage,
            notification_timeout_ms: 2_000,
        }
    }
}

impl SessionConfig {
    /// Build a config from a URL query string such as
    /// `?fileUrl=http%3A%2F%2Fhost%2Fa.pdf&apiEndpoint=http%3A%2F%2Fhost%2Fupload`.
    ///
    /// Unknown parameters are ignored, empty values count as absent, and
    /// values that fail to percent-decode are used verbatim.
    pub fn from_query(query: &str) -> Self {
        let mut config = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
            let spaced = raw.replace('+', " ");
            let value = urlencoding::decode(&spaced)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| spaced.clone());
            if value.trim().is_empty() {
                continue;
            }
            match key {
                SOURCE_URL_PARAM => config.source_url = Some(value),
                SINK_URL_PARAM => config.sink_url = Some(value),
                _ => debug!(key, "ignoring unknown query parameter"),
            }
        }

        config
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Scale factor from native PDF units to rendered pixels (300/72 by default).
    pub fn render_scale(&self) -> f32 {
        self.render_dpi / self.native_dpi
    }

    /// A remote document is only fetched when both the source and the sink
    /// are configured.
    pub fn wants_remote_document(&self) -> bool {
        self.source_url.is_some() && self.sink_url.is_some()
    }
}
