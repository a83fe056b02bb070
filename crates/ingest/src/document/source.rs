//! Read access to a loaded PDF: page list, text layer, and image detection.

use lopdf::{Dictionary, Object, ObjectId};

/// Levels of `/Parent` walked looking for inherited `/Resources`.
const MAX_INHERIT_DEPTH: usize = 16;
/// Form XObjects are searched for images this many levels deep.
const FORM_XOBJECT_DEPTH: u8 = 1;

/// A parsed PDF. Shared read-only across extraction workers.
pub struct PdfSource {
    doc: lopdf::Document,
    /// (1-based page number, page object id) in document order.
    pages: Vec<(u32, ObjectId)>,
}

impl PdfSource {
    pub fn load(bytes: &[u8]) -> Result<Self, lopdf::Error> {
        let doc = lopdf::Document::load_mem(bytes)?;
        let pages = doc.get_pages().into_iter().collect();
        Ok(Self { doc, pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 1-based page number for a 0-based page index.
    pub fn page_number(&self, index: usize) -> Option<u32> {
        self.pages.get(index).map(|(number, _)| *number)
    }

    /// Raw text layer of one page as lopdf decodes it.
    pub fn text_layer(&self, index: usize) -> Result<String, lopdf::Error> {
        let number = self.page_number(index).ok_or(lopdf::Error::PageNumberNotFound(index as u32 + 1))?;
        self.doc.extract_text(&[number])
    }

    /// True when the page paints raster content: an image XObject (directly or
    /// inside a form XObject) or an inline image.
    pub fn page_has_images(&self, index: usize) -> bool {
        let Some(&(_, page_id)) = self.pages.get(index) else {
            return false;
        };
        let Ok(page) = self.doc.get_dictionary(page_id) else {
            return false;
        };
        if let Some(resources) = self.inherited_resources(page) {
            if self.resources_have_images(resources, FORM_XOBJECT_DEPTH) {
                return true;
            }
        }
        self.content_has_inline_image(page_id)
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match self.resolve(obj)? {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }

    fn subtype<'a>(&'a self, dict: &'a Dictionary) -> Option<&'a [u8]> {
        match self.resolve(dict.get(b"Subtype").ok()?)? {
            Object::Name(name) => Some(name.as_slice()),
            _ => None,
        }
    }

    fn inherited_resources<'a>(&'a self, page: &'a Dictionary) -> Option<&'a Dictionary> {
        let mut node = page;
        for _ in 0..MAX_INHERIT_DEPTH {
            if let Ok(resources) = node.get(b"Resources") {
                return self.resolve_dict(resources);
            }
            node = self.resolve_dict(node.get(b"Parent").ok()?)?;
        }
        None
    }

    fn resources_have_images(&self, resources: &Dictionary, form_depth: u8) -> bool {
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|obj| self.resolve_dict(obj))
        else {
            return false;
        };

        xobjects.iter().any(|(_, obj)| {
            let Some(Object::Stream(stream)) = self.resolve(obj) else {
                return false;
            };
            match self.subtype(&stream.dict) {
                Some(b"Image") => true,
                Some(b"Form") if form_depth > 0 => stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|r| self.resolve_dict(r))
                    .is_some_and(|r| self.resources_have_images(r, form_depth - 1)),
                _ => false,
            }
        })
    }

    fn content_has_inline_image(&self, page_id: ObjectId) -> bool {
        match self.doc.get_page_content(page_id) {
            Ok(content) => content
                .split(|b| b.is_ascii_whitespace())
                .any(|token| token == b"BI"),
            Err(e) => {
                tracing::debug!(error = %e, "Could not read page content stream");
                false
            }
        }
    }
}
