// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface of `folio`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use folio_core::error::Result;
use folio_core::{ExportMode, SessionConfig, UploadMode};

#[derive(Debug, Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Open a PDF or image, edit it page by page, and export it", long_about = None)]
pub struct Cli {
    /// JSON session settings (render density, JPEG quality, page sizing)
    #[arg(long, global = true, value_name = "FILE", env = "FOLIO_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a document and report its type and page count
    Open {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Load a document, optionally move to a page, and export it
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Page to select before exporting (1-based)
        #[arg(long, value_name = "N")]
        page: Option<String>,

        /// Convert the selected page to grayscale before exporting
        #[arg(long)]
        grayscale: bool,

        #[command(flatten)]
        destination: Destination,
    },
}

/// Where the document comes from: a local file, or a `fileUrl` together with
/// the `apiEndpoint` exports are sent to.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Local PDF, JPEG or PNG file
    #[arg(value_name = "FILE", conflicts_with = "file_url")]
    pub file: Option<PathBuf>,

    /// Remote document to fetch
    #[arg(long, value_name = "URL", env = "FOLIO_FILE_URL")]
    pub file_url: Option<String>,

    /// Upload endpoint for saves
    #[arg(long, value_name = "URL", env = "FOLIO_API_ENDPOINT")]
    pub api_endpoint: Option<String>,

    /// A page query string such as `?fileUrl=...&apiEndpoint=...`
    #[arg(long, value_name = "QUERY")]
    pub query: Option<String>,
}

impl SourceArgs {
    /// Layer the URLs from `--query`, then the explicit flags, over `base`.
    pub fn resolve(&self, base: SessionConfig) -> SessionConfig {
        let mut config = base;
        if let Some(query) = &self.query {
            let parsed = SessionConfig::from_query(query);
            config.source_url = parsed.source_url.or(config.source_url);
            config.sink_url = parsed.sink_url.or(config.sink_url);
        }
        if let Some(url) = &self.file_url {
            config.source_url = Some(url.clone());
        }
        if let Some(url) = &self.api_endpoint {
            config.sink_url = Some(url.clone());
        }
        config
    }
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct Destination {
    /// Write the document into DIR under a timestamped name
    #[arg(long, value_name = "DIR")]
    pub download: Option<PathBuf>,

    /// Upload under a fresh timestamped name, replacing on the server
    #[arg(long)]
    pub save: bool,

    /// Upload as NAME (extension added), refusing to overwrite
    #[arg(long, value_name = "NAME")]
    pub save_as: Option<String>,
}

impl Destination {
    pub fn mode(&self) -> ExportMode {
        match (&self.download, &self.save_as) {
            (Some(dir), _) => ExportMode::Download { dir: dir.clone() },
            (None, Some(name)) => ExportMode::Upload(UploadMode::SaveAs(name.clone())),
            (None, None) => ExportMode::Upload(UploadMode::Save),
        }
    }
}

/// Settings file if given, defaults otherwise.
pub fn base_config(path: Option<&std::path::Path>) -> Result<SessionConfig> {
    match path {
        Some(path) => SessionConfig::load(path),
        None => Ok(SessionConfig::default()),
    }
}
