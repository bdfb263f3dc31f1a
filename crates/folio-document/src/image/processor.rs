// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor. The pixel-level edits an in-process editing surface
// applies to a page: crop, flip, rotate, strokes, filled shapes, filters and
// image overlays. Operates on in-memory images using the `image` and
// `imageproc` crates.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::geometric_transformations::{self, Interpolation};
use imageproc::rect::Rect;
use tracing::{debug, info, instrument};

/// Flip direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

/// Image processing pipeline operating on a single in-memory page.
///
/// Every operation consumes `self` and returns a new `ImageProcessor`
/// wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let edited = ImageProcessor::from_dynamic(page)
///     .flip(FlipAxis::Horizontal)
///     .fill_rect(10, 10, 40, 20, [255, 0, 0, 255])
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Geometry ---------------------------------------------------------------

    /// Crop a rectangular region from the image.
    ///
    /// `x` and `y` are the top-left corner; values are clamped to the image
    /// bounds so the result is never empty for a non-empty source.
    #[instrument(skip(self))]
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.clamp(1, (img_w - safe_x).max(1));
        let safe_h = height.clamp(1, (img_h - safe_y).max(1));

        info!(safe_x, safe_y, safe_w, safe_h, "Cropping image");

        Self {
            image: self.image.crop_imm(safe_x, safe_y, safe_w, safe_h),
        }
    }

    /// Mirror the image along one axis.
    pub fn flip(self, axis: FlipAxis) -> Self {
        debug!(?axis, "Flipping image");
        let image = match axis {
            FlipAxis::Horizontal => self.image.fliph(),
            FlipAxis::Vertical => self.image.flipv(),
        };
        Self { image }
    }

    /// Rotate the image by an angle in degrees (clockwise).
    ///
    /// Multiples of 90 are lossless. Other angles use bilinear interpolation
    /// about the centre on a canvas of the original size.
    #[instrument(skip(self))]
    pub fn rotate(self, degrees: f32) -> Self {
        info!(degrees, "Rotating image");

        let normalised = degrees.rem_euclid(360.0);
        if (normalised - 90.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate90(),
            };
        }
        if (normalised - 180.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate180(),
            };
        }
        if (normalised - 270.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate270(),
            };
        }
        if normalised < 0.01 || (normalised - 360.0).abs() < 0.01 {
            return self;
        }

        let rgba = self.image.to_rgba8();
        let rotated: RgbaImage = geometric_transformations::rotate_about_center(
            &rgba,
            degrees.to_radians(),
            Interpolation::Bilinear,
            Rgba([255u8, 255, 255, 0]),
        );

        Self {
            image: DynamicImage::ImageRgba8(rotated),
        }
    }

    // -- Drawing ----------------------------------------------------------------

    /// Draw a one-pixel stroke from `start` to `end`.
    pub fn draw_line(self, start: (f32, f32), end: (f32, f32), color: [u8; 4]) -> Self {
        let mut rgba = self.image.to_rgba8();
        draw_line_segment_mut(&mut rgba, start, end, Rgba(color));
        Self {
            image: DynamicImage::ImageRgba8(rgba),
        }
    }

    /// Fill an axis-aligned rectangle. Zero-sized rectangles are ignored.
    pub fn fill_rect(self, x: i32, y: i32, width: u32, height: u32, color: [u8; 4]) -> Self {
        if width == 0 || height == 0 {
            return self;
        }
        let mut rgba = self.image.to_rgba8();
        draw_filled_rect_mut(
            &mut rgba,
            Rect::at(x, y).of_size(width, height),
            Rgba(color),
        );
        Self {
            image: DynamicImage::ImageRgba8(rgba),
        }
    }

    /// Paste `top` onto the image with its top-left corner at (`x`, `y`),
    /// alpha-blended. Parts falling outside the page are clipped.
    #[instrument(skip(self, top), fields(top_w = top.width(), top_h = top.height()))]
    pub fn overlay(self, top: &DynamicImage, x: i64, y: i64) -> Self {
        let mut base = self.image.to_rgba8();
        image::imageops::overlay(&mut base, &top.to_rgba8(), x, y);
        Self {
            image: DynamicImage::ImageRgba8(base),
        }
    }

    // -- Filters ----------------------------------------------------------------

    /// Convert the image to grayscale (luma).
    pub fn grayscale(self) -> Self {
        debug!("Converting to grayscale");
        Self {
            image: self.image.grayscale(),
        }
    }

    /// Adjust brightness by `value`, clamped to -255..=255.
    #[instrument(skip(self))]
    pub fn adjust_brightness(self, value: i32) -> Self {
        let clamped = value.clamp(-255, 255);
        info!(clamped, "Adjusting brightness");
        self.map_channels(|channel| (channel as i32 + clamped).clamp(0, 255) as u8)
    }

    /// Adjust contrast by a factor. 1.0 leaves the image unchanged.
    #[instrument(skip(self))]
    pub fn adjust_contrast(self, factor: f32) -> Self {
        info!(factor, "Adjusting contrast");
        self.map_channels(|channel| {
            (factor * (channel as f32 - 128.0) + 128.0).clamp(0.0, 255.0) as u8
        })
    }

    fn map_channels(self, adjust: impl Fn(u8) -> u8) -> Self {
        let rgba = self.image.to_rgba8();
        let adjusted = image::ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
            let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
            Rgba([adjust(r), adjust(g), adjust(b), a])
        });
        Self {
            image: DynamicImage::ImageRgba8(adjusted),
        }
    }
}
