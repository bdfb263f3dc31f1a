// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload failures and the plain-text responses they map to.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File already exists")]
    AlreadyExists,

    #[error("No file provided")]
    MissingFile,

    #[error("Invalid filename")]
    InvalidFilename,

    #[error("Malformed upload: {0}")]
    Malformed(String),

    #[error("Failed to upload file")]
    Storage(#[from] std::io::Error),
}

impl UploadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::MissingFile | Self::InvalidFilename | Self::Malformed(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        if let Self::Storage(err) = &self {
            tracing::error!(error = %err, "Upload could not be stored");
        }
        (self.status_code(), self.to_string()).into_response()
    }
}
