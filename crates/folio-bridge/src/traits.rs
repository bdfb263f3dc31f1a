// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the editing surface.
//
// The session core only needs four things from a surface: load a page,
// reset its zoom, hand back the full page, and shut down. Edits and zoom
// come from the user through the same handle.

use folio_core::error::Result;
use folio_core::{PageRaster, Tool, ToolSet};
use folio_document::image::FlipAxis;

/// A live editor bound to exactly one page.
pub trait EditingSurface: Send {
    /// Show `raster` and offer only the tools in `tools`.
    fn load_raster(&mut self, raster: &PageRaster, tools: &ToolSet) -> Result<()>;

    /// Return the viewport to the whole page.
    fn reset_zoom(&mut self);

    /// Export what the surface currently shows.
    ///
    /// Only the whole page after [`EditingSurface::reset_zoom`]. When nothing
    /// was edited the loaded raster comes back byte-identical.
    fn export_full_raster(&self) -> Result<PageRaster>;

    /// Release the surface. Further calls fail with `EditorNotReady`.
    fn dispose(&mut self);

    /// Apply one user edit. Fails with `ToolUnavailable` when the edit's tool
    /// is not in the loaded tool set.
    fn apply(&mut self, edit: &Edit) -> Result<()>;

    /// Zoom the viewport around the page centre. `1.0` shows the whole page.
    fn zoom(&mut self, factor: f32);
}

/// Creates surfaces on demand. One factory lives for the whole session.
pub trait SurfaceFactory: Send + Sync {
    fn create(&self) -> Box<dyn EditingSurface>;
}

/// Image-level filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    Grayscale,
    Brightness(i32),
    Contrast(f32),
}

/// One user edit, in page pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Crop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    Flip(FlipAxis),
    Rotate {
        degrees: f32,
    },
    /// Freehand stroke segment.
    Stroke {
        from: (f32, f32),
        to: (f32, f32),
        color: [u8; 4],
    },
    /// Filled rectangle.
    Rectangle {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        color: [u8; 4],
    },
    Filter(Filter),
    /// Paste an encoded JPEG/PNG image onto the page.
    Overlay {
        image: Vec<u8>,
        x: i64,
        y: i64,
    },
}

impl Edit {
    /// The tool that must be available for this edit.
    pub fn tool(&self) -> Tool {
        match self {
            Self::Crop { .. } => Tool::Crop,
            Self::Flip(_) => Tool::Flip,
            Self::Rotate { .. } => Tool::Rotate,
            Self::Stroke { .. } | Self::Overlay { .. } => Tool::Draw,
            Self::Rectangle { .. } => Tool::Shape,
            Self::Filter(_) => Tool::Filter,
        }
    }
}
