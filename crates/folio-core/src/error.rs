// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folio.

use thiserror::Error;

use crate::types::Tool;

/// Top-level error type for all Folio operations.
#[derive(Debug, Error)]
pub enum FolioError {
    // -- Load / assemble --
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to fetch file: {0}")]
    FetchFailed(String),

    #[error("failed to render page {page}: {reason}")]
    RenderError { page: usize, reason: String },

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Editing surface --
    #[error("Editor instance not initialized")]
    EditorNotReady,

    #[error("tool not available for this document: {0}")]
    ToolUnavailable(Tool),

    #[error("another operation is still in progress")]
    Busy,

    // -- Export --
    #[error("Failed to save file: {0}")]
    SaveFailed(String),

    #[error("The filename contains invalid characters or is empty: {0:?}")]
    InvalidFilename(String),

    #[error("URL is incomplete. Please check and try again.")]
    IncompleteUrl,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;
