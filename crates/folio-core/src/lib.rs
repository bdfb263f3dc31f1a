// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio: core types, errors, and session configuration shared across all crates.

pub mod config;
pub mod error;
pub mod notify;
pub mod types;

pub use config::SessionConfig;
pub use error::FolioError;
pub use types::*;
