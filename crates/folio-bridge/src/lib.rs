// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-bridge: editing-surface abstractions.
//
// The session core drives whatever surface the host provides through the
// traits in `traits`. Hosts without a graphical editor (the CLI, CI) use the
// in-process raster surface from `stub`.

pub mod stub;
pub mod traits;

pub use stub::{RasterSurface, RasterSurfaceFactory};
pub use traits::{Edit, EditingSurface, Filter, SurfaceFactory};

use folio_document::RasterCodec;

/// The surface factory for headless hosts.
pub fn default_surface_factory(codec: RasterCodec) -> Box<dyn SurfaceFactory> {
    Box::new(RasterSurfaceFactory::new(codec))
}
