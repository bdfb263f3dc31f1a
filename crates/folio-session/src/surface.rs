// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Surface manager: owns at most one live editing surface and guarantees the
// previous one is disposed before the next is created.

use std::sync::Arc;

use folio_bridge::{EditingSurface, SurfaceFactory};
use folio_core::error::{FolioError, Result};
use folio_core::{PageRaster, ToolSet};
use tracing::debug;

pub struct SurfaceManager {
    factory: Arc<dyn SurfaceFactory>,
    current: Option<Box<dyn EditingSurface>>,
}

impl SurfaceManager {
    pub fn new(factory: Arc<dyn SurfaceFactory>) -> Self {
        Self {
            factory,
            current: None,
        }
    }

    /// Tear down the current surface (if any) and bind a fresh one to
    /// `raster`. On failure no surface is bound.
    pub fn rebind(
        &mut self,
        raster: &PageRaster,
        tools: &ToolSet,
    ) -> Result<&mut dyn EditingSurface> {
        self.release();

        let mut surface = self.factory.create();
        if let Err(err) = surface.load_raster(raster, tools) {
            surface.dispose();
            return Err(err);
        }
        debug!("Editing surface bound");

        let bound: &mut dyn EditingSurface = self.current.insert(surface).as_mut();
        Ok(bound)
    }

    /// Dispose the current surface, if any.
    pub fn release(&mut self) {
        if let Some(mut surface) = self.current.take() {
            surface.dispose();
            debug!("Editing surface disposed");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_mut(&mut self) -> Result<&mut dyn EditingSurface> {
        let surface: &mut dyn EditingSurface = self
            .current
            .as_deref_mut()
            .ok_or(FolioError::EditorNotReady)?;
        Ok(surface)
    }
}

impl Drop for SurfaceManager {
    fn drop(&mut self) {
        self.release();
    }
}
