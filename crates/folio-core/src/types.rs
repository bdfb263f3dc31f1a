// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Folio editing pipeline.

use std::fmt;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};

/// The three document kinds Folio can open. Fixed for the lifetime of a
/// session; selects the assembly path and the editing tool set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Pdf,
    Jpg,
    Png,
}

impl Classification {
    /// Classify a declared MIME type. Parameters (`; charset=...`) are ignored.
    pub fn from_mime(declared: &str) -> Option<Self> {
        let essence = declared.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/pdf" => Some(Self::Pdf),
            "image/jpeg" => Some(Self::Jpg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Infer the classification from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// MIME type of the document this classification produces on export.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// File extension used for exported filenames.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Jpg => "jpg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One page's current raster, held as a self-describing `data:` URL
/// (`data:<mime>;base64,<payload>`).
///
/// Equality is value equality on the encoded string, which is what the page
/// store uses to decide whether a flush actually changed anything.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageRaster(String);

impl PageRaster {
    /// Wrap already-encoded image bytes.
    pub fn from_encoded(mime: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
    }

    /// Accept an existing data URL after checking its framing.
    pub fn from_data_url(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let (header, _) = url
            .split_once(',')
            .ok_or_else(|| FolioError::ImageError("raster is missing its ',' separator".into()))?;
        let media = header
            .strip_prefix("data:")
            .ok_or_else(|| FolioError::ImageError("raster is not a data: URL".into()))?;
        if !media.ends_with(";base64") || media.len() == ";base64".len() {
            return Err(FolioError::ImageError(format!(
                "raster header {header:?} is not a base64 image"
            )));
        }
        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// MIME type embedded in the data URL header.
    pub fn mime_type(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split([';', ',']).next())
            .unwrap_or("application/octet-stream")
    }

    /// Decode the base64 payload back to the encoded image bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let payload = self.0.split_once(',').map(|(_, p)| p).unwrap_or("");
        STANDARD
            .decode(payload)
            .map_err(|err| FolioError::ImageError(format!("invalid raster payload: {err}")))
    }
}

impl fmt::Debug for PageRaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageRaster")
            .field("mime", &self.mime_type())
            .field("encoded_len", &self.0.len())
            .finish()
    }
}

impl TryFrom<String> for PageRaster {
    type Error = FolioError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_data_url(value)
    }
}

impl From<PageRaster> for String {
    fn from(raster: PageRaster) -> Self {
        raster.0
    }
}

/// Editing tools an editing surface may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Crop,
    Flip,
    Rotate,
    Draw,
    Shape,
    Text,
    Filter,
}

impl Tool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crop => "crop",
            Self::Flip => "flip",
            Self::Rotate => "rotate",
            Self::Draw => "draw",
            Self::Shape => "shape",
            Self::Text => "text",
            Self::Filter => "filter",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The tools a surface is allowed to expose for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSet(Vec<Tool>);

impl ToolSet {
    /// PDF pages lose crop and rotate: both change a page's geometry, and every
    /// page of a reassembled PDF has to share the original page size.
    pub fn for_classification(classification: Classification) -> Self {
        match classification {
            Classification::Pdf => Self(vec![
                Tool::Flip,
                Tool::Draw,
                Tool::Shape,
                Tool::Text,
                Tool::Filter,
            ]),
            Classification::Jpg | Classification::Png => Self(vec![
                Tool::Crop,
                Tool::Flip,
                Tool::Rotate,
                Tool::Draw,
                Tool::Shape,
                Tool::Text,
                Tool::Filter,
            ]),
        }
    }

    pub fn contains(&self, tool: Tool) -> bool {
        self.0.contains(&tool)
    }

    /// Fail with `ToolUnavailable` unless `tool` is in the set.
    pub fn require(&self, tool: Tool) -> Result<()> {
        if self.contains(tool) {
            Ok(())
        } else {
            Err(FolioError::ToolUnavailable(tool))
        }
    }

    pub fn tools(&self) -> &[Tool] {
        &self.0
    }
}

/// How output PDF pages are sized during reassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSizing {
    /// Every output page takes the first original page's MediaBox.
    #[default]
    FirstPage,
    /// Each output page takes the MediaBox of the page it was rendered from.
    PerPage,
}

/// Page dimensions in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_pt: f32,
    pub height_pt: f32,
}

/// Where an exported document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportMode {
    /// Save into a local directory under a timestamped name.
    Download { dir: PathBuf },
    /// POST to the configured upload endpoint.
    Upload(UploadMode),
}

/// Naming policy for uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadMode {
    /// Fresh timestamped filename; the server may overwrite.
    Save,
    /// User-chosen filename (without extension); must not already exist.
    SaveAs(String),
}

impl UploadMode {
    /// Value sent in the multipart `action` field.
    pub fn intent(&self) -> &'static str {
        match self {
            Self::Save => "replace",
            Self::SaveAs(_) => "new",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_from_mime_ignores_parameters() {
        assert_eq!(
            Classification::from_mime("application/pdf; qs=0.001"),
            Some(Classification::Pdf)
        );
        assert_eq!(Classification::from_mime("IMAGE/PNG"), Some(Classification::Png));
        assert_eq!(Classification::from_mime("image/gif"), None);
        assert_eq!(Classification::from_mime(""), None);
    }

    #[test]
    fn raster_preserves_payload_and_mime() {
        let raster = PageRaster::from_encoded("image/png", &[0x89, b'P', b'N', b'G']);
        assert_eq!(raster.mime_type(), "image/png");
        assert_eq!(raster.decode().unwrap(), vec![0x89, b'P', b'N', b'G']);
        assert!(raster.as_str().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn raster_rejects_non_data_urls() {
        assert!(PageRaster::from_data_url("http://example.com/a.png").is_err());
        assert!(PageRaster::from_data_url("data:image/png,plain").is_err());
        assert!(PageRaster::from_data_url("data:;base64,AAAA").is_err());
        assert!(PageRaster::from_data_url("data:image/jpeg;base64,AAAA").is_ok());
    }

    #[test]
    fn pdf_tool_set_excludes_geometry_tools() {
        let pdf = ToolSet::for_classification(Classification::Pdf);
        assert!(!pdf.contains(Tool::Crop));
        assert!(!pdf.contains(Tool::Rotate));
        assert!(pdf.contains(Tool::Draw));
        assert!(matches!(
            pdf.require(Tool::Crop),
            Err(FolioError::ToolUnavailable(Tool::Crop))
        ));

        let png = ToolSet::for_classification(Classification::Png);
        assert!(png.require(Tool::Crop).is_ok());
    }

    #[test]
    fn upload_intents() {
        assert_eq!(UploadMode::Save.intent(), "replace");
        assert_eq!(UploadMode::SaveAs("x".into()).intent(), "new");
    }
}
