// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-session: the stateful core of a Folio editing session.
//
// The page store owns the page sequence and the single live editing surface;
// the export coordinator flushes, reassembles, and delivers the document; the
// session ties both to remote fetch, the busy signal, and user notifications.

pub mod export;
pub mod fetch;
pub mod session;
pub mod sink;
pub mod store;
pub mod surface;

pub use export::{ExportCoordinator, ExportOutcome};
pub use fetch::{FetchedDocument, fetch_document};
pub use session::{BusyGuard, BusySignal, Session};
pub use sink::{UploadSink, write_download};
pub use store::PageStore;
pub use surface::SurfaceManager;
