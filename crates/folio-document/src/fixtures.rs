// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory test documents, generated rather than checked in.

use folio_core::error::Result;
use image::{DynamicImage, Rgb, RgbImage};
use lopdf::content::Content;
use lopdf::{Document, Object, Stream, dictionary};

use crate::pdf::PdfRenderer;

/// A PDF with one blank page per `(width_pt, height_pt)` entry.
///
/// Each page carries a trivial content stream drawing a filled box so
/// renderers have something to paint.
pub fn sample_pdf(sizes: &[(f32, f32)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = sizes
        .iter()
        .map(|&(width, height)| {
            let content = doc.add_object(Stream::new(
                dictionary! {},
                b"0 0 0 rg 10 10 50 50 re f".to_vec(),
            ));
            let page = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width.into()),
                    Object::Real(height.into()),
                ],
                "Contents" => Object::Reference(content),
                "Resources" => dictionary! {},
            });
            Object::Reference(page)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => Object::Integer(kids.len() as i64),
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = doc.save_to(&mut bytes);
    bytes
}

/// A solid-colour RGB image.
pub fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
}

/// PNG bytes of a small image with a distinct pixel in each corner, so
/// orientation changes are observable.
pub fn marked_png(width: u32, height: u32) -> Vec<u8> {
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    img.put_pixel(0, 0, Rgb([255, 0, 0]));
    img.put_pixel(width - 1, 0, Rgb([0, 255, 0]));
    img.put_pixel(0, height - 1, Rgb([0, 0, 255]));

    let mut bytes = Vec::new();
    let _ = DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png);
    bytes
}

/// Renders every page as a flat grey square `10 * scale` pixels wide, one
/// shade per page index. Stands in for PDFium where no library is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatRenderer;

impl PdfRenderer for FlatRenderer {
    fn render_page(&self, _pdf: &[u8], page_index: usize, scale: f32) -> Result<DynamicImage> {
        let side = ((10.0 * scale) as u32).max(1);
        let level = 60u8.saturating_add((page_index as u8).saturating_mul(60));
        Ok(solid_image(side, side, [level, level, level]))
    }
}

/// An image XObject drawn on a page, with its samples decoded.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub width: i64,
    pub height: i64,
    pub samples: Vec<u8>,
}

impl EmbeddedImage {
    /// First sample of the first pixel (the red channel for RGB data).
    pub fn first_sample(&self) -> Option<u8> {
        self.samples.first().copied()
    }
}

/// The first image each page of `pdf` draws, in page order.
///
/// Pages are walked through the page tree and each image is found through the
/// `Do` operator in the page's own content stream, so the result reflects
/// which picture actually lands on which page. Pages without an image are
/// skipped.
pub fn embedded_images(pdf: &[u8]) -> Vec<EmbeddedImage> {
    let Ok(doc) = Document::load_mem(pdf) else {
        return Vec::new();
    };
    doc.get_pages()
        .values()
        .filter_map(|&page_id| page_image(&doc, page_id))
        .collect()
}

fn page_image(doc: &Document, page_id: lopdf::ObjectId) -> Option<EmbeddedImage> {
    let content = Content::decode(&doc.get_page_content(page_id).ok()?).ok()?;
    let name = content
        .operations
        .iter()
        .find(|op| op.operator == "Do")
        .and_then(|op| op.operands.first())
        .and_then(|operand| operand.as_name().ok())?;

    // Resources may be inherited from an ancestor in the page tree.
    let mut node = doc.get_dictionary(page_id).ok()?;
    let resources = loop {
        if let Ok(resources) = node.get(b"Resources") {
            break resolve(doc, resources)?.as_dict().ok()?;
        }
        node = resolve(doc, node.get(b"Parent").ok()?)?.as_dict().ok()?;
    };
    let xobjects = resolve(doc, resources.get(b"XObject").ok()?)?.as_dict().ok()?;
    let stream = resolve(doc, xobjects.get(name).ok()?)?.as_stream().ok()?;

    let width = resolve(doc, stream.dict.get(b"Width").ok()?)?.as_i64().ok()?;
    let height = resolve(doc, stream.dict.get(b"Height").ok()?)?.as_i64().ok()?;
    let samples = if stream.dict.has(b"Filter") {
        stream.decompressed_content().ok()?
    } else {
        stream.content.clone()
    };

    Some(EmbeddedImage {
        width,
        height,
        samples,
    })
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}
