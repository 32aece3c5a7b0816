use crate::page_range::PageSelection;
use anyhow::{Context, Result};
use lopdf::{Document, Object, ObjectId};
use std::path::Path;
use tracing::debug;

pub struct PdfDocument {
    pub doc: Document,
    pub name: String,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let name = path.as_ref().display().to_string();
        let doc = Document::load(&path).with_context(|| format!("Failed to open PDF: {}", name))?;
        Ok(PdfDocument { doc, name })
    }

    /// Load a PDF held in memory; `name` is only used in messages.
    pub fn from_bytes(bytes: &[u8], name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let doc =
            Document::load_mem(bytes).with_context(|| format!("Failed to read PDF: {}", name))?;
        Ok(PdfDocument { doc, name })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get 1-indexed page object IDs
    pub fn page_ids(&self) -> Vec<(u32, ObjectId)> {
        let mut pages: Vec<_> = self.doc.get_pages().into_iter().collect();
        pages.sort_by_key(|(num, _)| *num);
        pages
    }

    /// Get metadata from the document info dictionary
    pub fn get_info(&self) -> PdfInfo {
        let mut info = PdfInfo::default();

        if let Ok(Object::Reference(info_ref)) = self.doc.trailer.get(b"Info") {
            if let Ok(Object::Dictionary(dict)) = self.doc.get_object(*info_ref) {
                info.title = get_string_from_dict(dict, b"Title");
                info.author = get_string_from_dict(dict, b"Author");
                info.creator = get_string_from_dict(dict, b"Creator");
                info.producer = get_string_from_dict(dict, b"Producer");
                info.creation_date = get_string_from_dict(dict, b"CreationDate");
                info.mod_date = get_string_from_dict(dict, b"ModDate");
                info.subject = get_string_from_dict(dict, b"Subject");
                info.keywords = get_string_from_dict(dict, b"Keywords");
            }
        }

        info.page_count = self.page_count();
        info.version = self.doc.version.clone();
        info
    }

    /// Keep only the selected pages, in document order.
    pub fn extract_pages(&self, selection: &PageSelection) -> Result<Document> {
        let all_pages = self.page_ids();
        self.check_bounds(selection, all_pages.len() as u32)?;

        // Page numbers from `page_ids` are the 1-based positions the selection uses
        let pages_to_delete: Vec<u32> = all_pages
            .iter()
            .map(|(num, _)| *num)
            .filter(|&num| !selection.contains(num))
            .collect();

        debug!(
            document = %self.name,
            kept = selection.len(),
            deleted = pages_to_delete.len(),
            "extracting pages"
        );
        Ok(self.without_pages(&pages_to_delete))
    }

    /// Remove the selected pages; the rest keep their order. Selecting every
    /// page yields a valid document with no pages.
    pub fn delete_pages(&self, selection: &PageSelection) -> Result<Document> {
        let total = self.page_count();
        self.check_bounds(selection, total)?;

        debug!(
            document = %self.name,
            deleted = selection.len(),
            remaining = total - selection.len() as u32,
            "deleting pages"
        );
        Ok(self.without_pages(selection.pages()))
    }

    fn check_bounds(&self, selection: &PageSelection, total: u32) -> Result<()> {
        if selection.is_empty() {
            anyhow::bail!("No pages specified");
        }
        if let Some(&page) = selection.pages().iter().find(|&&p| p == 0 || p > total) {
            anyhow::bail!("Page {} is out of range (1-{})", page, total);
        }
        Ok(())
    }

    fn without_pages(&self, pages: &[u32]) -> Document {
        let mut new_doc = self.doc.clone();
        if !pages.is_empty() {
            new_doc.delete_pages(pages);
            new_doc.prune_objects();
        }
        new_doc
    }

    /// Save to a file
    pub fn save<P: AsRef<Path>>(doc: &mut Document, path: P) -> Result<()> {
        doc.save(&path)
            .with_context(|| format!("Failed to save PDF: {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Serialize to an in-memory PDF
    pub fn to_bytes(doc: &mut Document) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .context("Failed to serialize PDF")?;
        Ok(bytes)
    }
}

#[derive(Debug, Default, Clone)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub version: String,
    pub page_count: u32,
}

fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    })
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).ok()
    } else {
        // PDFDocEncoding agrees with Latin-1 for printable text
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}
