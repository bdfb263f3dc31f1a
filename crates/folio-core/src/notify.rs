// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transient, auto-dismissing notifications for surfacing errors to the user.
//
// No error ends the session: the notification says what went wrong and whether
// retrying the same action can help or a different document is needed.

use std::time::{Duration, Instant};

use crate::error::FolioError;

/// Default visibility window for a notification.
pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_millis(2_000);

/// What the user can do about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remedy {
    /// Network blip, busy editor, bad filename; the same action can be retried.
    Retry,
    /// The document itself is the problem; pick a different one.
    ChooseAnotherDocument,
    /// Session setup is wrong (e.g. missing endpoint); retrying will not help.
    FixConfiguration,
}

/// A message shown to the user for a short time.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Text shown to the user (the error's display text).
    pub message: String,
    /// Suggested remedy (drives the UI's retry affordance).
    pub remedy: Remedy,
    raised_at: Instant,
    dismiss_after: Duration,
}

impl Notification {
    /// Raise a notification for `err` that dismisses itself after `dismiss_after`.
    pub fn from_error(err: &FolioError, dismiss_after: Duration) -> Self {
        Self {
            message: err.to_string(),
            remedy: remedy_for(err),
            raised_at: Instant::now(),
            dismiss_after,
        }
    }

    /// Whether the notification should no longer be displayed at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.raised_at) >= self.dismiss_after
    }

    /// Time left before auto-dismissal.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.dismiss_after
            .saturating_sub(now.duration_since(self.raised_at))
    }
}

/// Map an error to what the user can do about it.
pub fn remedy_for(err: &FolioError) -> Remedy {
    match err {
        FolioError::FetchFailed(_)
        | FolioError::SaveFailed(_)
        | FolioError::InvalidFilename(_)
        | FolioError::EditorNotReady
        | FolioError::ToolUnavailable(_)
        | FolioError::Busy
        | FolioError::Io(_) => Remedy::Retry,

        FolioError::UnsupportedFormat(_)
        | FolioError::RenderError { .. }
        | FolioError::PdfError(_)
        | FolioError::ImageError(_) => Remedy::ChooseAnotherDocument,

        FolioError::IncompleteUrl | FolioError::Serialization(_) => Remedy::FixConfiguration,
    }
}
