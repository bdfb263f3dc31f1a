// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster codec. Moves pixels in and out of the self-describing `PageRaster`
// encoding. JPEG output uses a fixed, configurable quality; PNG is lossless.

use std::io::Cursor;

use folio_core::error::{FolioError, Result};
use folio_core::{Classification, PageRaster};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, instrument};

/// Quality used for rasterised PDF pages (0.7 on a 0..1 scale).
pub const DEFAULT_JPEG_QUALITY: u8 = 70;

pub const JPEG_MIME: &str = "image/jpeg";
pub const PNG_MIME: &str = "image/png";

/// Encodes and decodes page rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterCodec {
    jpeg_quality: u8,
}

impl Default for RasterCodec {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl RasterCodec {
    /// Create a codec; quality is clamped to 1..=100.
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    // -- Encoding -------------------------------------------------------------

    /// Encode pixels as a JPEG raster at the codec's quality.
    pub fn encode_jpeg(&self, image: &DynamicImage) -> Result<PageRaster> {
        let bytes = jpeg_bytes(image, self.jpeg_quality)?;
        Ok(PageRaster::from_encoded(JPEG_MIME, &bytes))
    }

    /// Encode pixels as a lossless PNG raster.
    pub fn encode_png(&self, image: &DynamicImage) -> Result<PageRaster> {
        let bytes = png_bytes(image)?;
        Ok(PageRaster::from_encoded(PNG_MIME, &bytes))
    }

    /// Encode pixels in the given MIME type (`image/jpeg` or `image/png`).
    pub fn encode(&self, image: &DynamicImage, mime: &str) -> Result<PageRaster> {
        match mime {
            JPEG_MIME => self.encode_jpeg(image),
            PNG_MIME => self.encode_png(image),
            other => Err(FolioError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Wrap already-encoded JPEG/PNG bytes without touching the pixels.
    ///
    /// The MIME type in the raster header comes from sniffing the bytes, so
    /// the raster always describes its real encoding.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn wrap(&self, bytes: &[u8]) -> Result<PageRaster> {
        let format = image::guess_format(bytes)
            .map_err(|err| FolioError::ImageError(format!("unrecognised image data: {err}")))?;
        let mime = match format {
            ImageFormat::Jpeg => JPEG_MIME,
            ImageFormat::Png => PNG_MIME,
            other => {
                return Err(FolioError::UnsupportedFormat(format!("{other:?} image data")));
            }
        };
        debug!(mime, "wrapped image bytes as raster");
        Ok(PageRaster::from_encoded(mime, bytes))
    }

    // -- Decoding -------------------------------------------------------------

    /// Decode a raster back to pixels.
    pub fn decode(&self, raster: &PageRaster) -> Result<DynamicImage> {
        let bytes = raster.decode()?;
        image::load_from_memory(&bytes)
            .map_err(|err| FolioError::ImageError(format!("failed to decode raster: {err}")))
    }

    /// Produce the exported image bytes for a single-image document.
    ///
    /// When the raster is already in the classification's MIME type its bytes
    /// pass through untouched; otherwise the pixels are re-encoded so the
    /// output always matches its file extension.
    pub fn export_bytes(
        &self,
        raster: &PageRaster,
        classification: Classification,
    ) -> Result<Vec<u8>> {
        let target = match classification {
            Classification::Jpg => JPEG_MIME,
            Classification::Png => PNG_MIME,
            Classification::Pdf => {
                return Err(FolioError::UnsupportedFormat(
                    "a PDF cannot be exported as a single image".into(),
                ));
            }
        };

        if raster.mime_type() == target {
            return raster.decode();
        }

        debug!(from = raster.mime_type(), to = target, "transcoding raster for export");
        let pixels = self.decode(raster)?;
        match target {
            JPEG_MIME => jpeg_bytes(&pixels, self.jpeg_quality),
            _ => png_bytes(&pixels),
        }
    }
}

fn jpeg_bytes(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let rgb = image.to_rgb8();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|err| FolioError::ImageError(format!("JPEG encoding failed: {err}")))?;
    Ok(buffer)
}

fn png_bytes(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|err| FolioError::ImageError(format!("PNG encoding failed: {err}")))?;
    Ok(buffer)
}
