//! Shared fixtures: in-memory PDFs built with lopdf and fake OCR backends.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use image::{GrayImage, Luma};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use pdfdeck_ingest::ocr::{PageRasterizer, TextRecognizer};
use pdfdeck_ingest::OcrError;

// ── PDF builder ─────────────────────────────────────────────────────

/// How one test page paints its content.
#[derive(Debug, Clone, Default)]
pub struct PageSpec {
    pub lines: Vec<String>,
    pub image: ImageKind,
    /// Select the font with a number instead of a name, which text extraction rejects.
    pub malformed_font: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ImageKind {
    #[default]
    None,
    XObject,
    InsideForm,
    Inline,
}

impl PageSpec {
    pub fn text(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn scanned() -> Self {
        Self {
            image: ImageKind::XObject,
            ..Self::default()
        }
    }

    /// Text whose content stream cannot be decoded into a text layer.
    pub fn undecodable(lines: &[&str]) -> Self {
        Self {
            malformed_font: true,
            ..Self::text(lines)
        }
    }

    pub fn blank() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, image: ImageKind) -> Self {
        self.image = image;
        self
    }
}

/// `count` distinct words, ten per line.
pub fn word_lines(count: usize) -> Vec<String> {
    let words: Vec<String> = (0..count).map(|i| format!("lemma{i:03}")).collect();
    words.chunks(10).map(|c| c.join(" ")).collect()
}

fn image_stream() -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0u8],
    )
}

fn content_for(spec: &PageSpec) -> Vec<u8> {
    let mut operations = Vec::new();
    if matches!(spec.image, ImageKind::XObject | ImageKind::InsideForm) {
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new(
            "cm",
            vec![595.into(), 0.into(), 0.into(), 842.into(), 0.into(), 0.into()],
        ));
        operations.push(Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]));
        operations.push(Operation::new("Q", vec![]));
    }
    for (i, line) in spec.lines.iter().enumerate() {
        operations.push(Operation::new("BT", vec![]));
        let font: Object = if spec.malformed_font { 1.into() } else { "F1".into() };
        operations.push(Operation::new("Tf", vec![font, 11.into()]));
        operations.push(Operation::new("Td", vec![72.into(), (760 - 14 * i as i64).into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
        operations.push(Operation::new("ET", vec![]));
    }
    let mut bytes = Content { operations }.encode().expect("encode content");
    if spec.image == ImageKind::Inline {
        bytes.extend_from_slice(b"\nq 595 0 0 842 0 0 cm BI /W 1 /H 1 /CS /G /BPC 8 ID \x00 EI Q\n");
    }
    bytes
}

/// Build a PDF with one page per spec and return its bytes.
pub fn build_pdf(specs: &[PageSpec]) -> Vec<u8> {
    build_pdf_with(specs, false)
}

/// Like [`build_pdf`] but puts page resources on the page tree node so pages inherit them.
pub fn build_pdf_inherited(specs: &[PageSpec]) -> Vec<u8> {
    build_pdf_with(specs, true)
}

fn build_pdf_with(specs: &[PageSpec], inherit_resources: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids: Vec<Object> = Vec::new();
    let mut shared_resources: Option<ObjectId> = None;

    for spec in specs {
        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        match spec.image {
            ImageKind::XObject => {
                let image_id = doc.add_object(image_stream());
                resources.set("XObject", dictionary! { "Im1" => image_id });
            }
            ImageKind::InsideForm => {
                let image_id = doc.add_object(image_stream());
                let form = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Form",
                        "BBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                        "Resources" => dictionary! {
                            "XObject" => dictionary! { "Im1" => image_id },
                        },
                    },
                    b"q 595 0 0 842 0 0 cm /Im1 Do Q".to_vec(),
                );
                let form_id = doc.add_object(form);
                resources.set("XObject", dictionary! { "Im1" => form_id });
            }
            ImageKind::None | ImageKind::Inline => {}
        }
        let resources_id = doc.add_object(resources);

        let content_id = doc.add_object(Stream::new(dictionary! {}, content_for(spec)));
        let mut page: Dictionary = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        if inherit_resources {
            shared_resources.get_or_insert(resources_id);
        } else {
            page.set("Resources", resources_id);
        }
        kids.push(doc.add_object(page).into());
    }

    let mut pages = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids,
    };
    if let Some(resources_id) = shared_resources {
        pages.set("Resources", resources_id);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}

// ── Fake OCR backends ───────────────────────────────────────────────

/// A white page with one dark full-width block of "text lines".
pub fn single_column_raster() -> GrayImage {
    let mut img = GrayImage::from_pixel(600, 800, Luma([250]));
    for y in 80..700 {
        if y % 12 >= 8 {
            continue;
        }
        for x in 60..540 {
            img.put_pixel(x, y, Luma([15]));
        }
    }
    img
}

/// Records every request and returns [`single_column_raster`], or fails.
#[derive(Default)]
pub struct FakeRasterizer {
    pub fail: bool,
    pub requests: Mutex<Vec<(u32, u32, bool)>>,
}

impl PageRasterizer for FakeRasterizer {
    fn rasterize(&self, pdf: &Path, page_number: u32, dpi: u32) -> Result<GrayImage, OcrError> {
        let staged = std::fs::read(pdf).map(|b| b.starts_with(b"%PDF")).unwrap_or(false);
        self.requests.lock().unwrap().push((page_number, dpi, staged));
        if self.fail {
            return Err(OcrError::ToolUnavailable {
                tool: "pdftoppm",
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            });
        }
        Ok(single_column_raster())
    }
}

/// Returns a fixed sentence for every region and counts calls.
pub struct FakeRecognizer {
    pub text: String,
    pub calls: AtomicUsize,
}

impl FakeRecognizer {
    pub fn saying(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextRecognizer for FakeRecognizer {
    fn recognize(&self, _region: &GrayImage, _language: &str) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }

    fn name(&self) -> &str {
        "fake"
    }
}
