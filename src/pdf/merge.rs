use anyhow::{Context, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Concatenate the pages of `documents`, in order, into one new document.
///
/// Every source is renumbered into a disjoint object id range, its pages are
/// re-parented under a single fresh page tree, and outlines (which point
/// into the old page trees) are dropped.
#[instrument(skip_all, fields(documents = documents.len()))]
pub fn merge_documents(documents: Vec<Document>) -> Result<Document> {
    if documents.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let mut next_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for (index, mut doc) in documents.into_iter().enumerate() {
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        let doc_pages = doc.get_pages();
        debug!(document = index, pages = doc_pages.len(), "collecting pages");
        for page_id in doc_pages.into_values() {
            let page = flatten_inherited(&doc, page_id)
                .with_context(|| format!("Malformed page {:?} in document {}", page_id, index + 1))?;
            pages.push((page_id, page));
        }
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    for (id, object) in objects {
        let keep = match object.type_name() {
            Ok(name) => !matches!(name, b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline"),
            Err(_) => true,
        };
        if keep {
            merged.objects.insert(id, object);
        }
    }
    merged.max_id = next_id;

    let pages_id = merged.new_object_id();
    let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();
    let count = pages.len();
    for (id, mut page) in pages {
        page.set("Parent", pages_id);
        merged.objects.insert(id, Object::Dictionary(page));
    }
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count as i64),
        }),
    );

    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);

    merged.prune_objects();
    merged.renumber_objects();

    debug!(pages = count, "merge complete");
    Ok(merged)
}

/// Load and merge PDFs held in memory.
pub fn merge_pdf_bytes<B: AsRef<[u8]>>(inputs: &[B]) -> Result<Document> {
    let documents = inputs
        .iter()
        .enumerate()
        .map(|(index, bytes)| {
            Document::load_mem(bytes.as_ref())
                .with_context(|| format!("Failed to read PDF #{}", index + 1))
        })
        .collect::<Result<Vec<_>>>()?;
    merge_documents(documents)
}

/// Copy of the page dictionary with inherited attributes made explicit, so it
/// can be moved under a different parent.
fn flatten_inherited(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = doc.get_dictionary(page_id)?.clone();

    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    // Page trees are shallow; the bound guards against cycles in broken files
    let mut depth = 0;
    while let Some(parent_id) = parent {
        depth += 1;
        if depth > 64 {
            anyhow::bail!("Page tree too deep or cyclic");
        }
        let node = doc.get_dictionary(parent_id)?;
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key, value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::PdfDocument;
    use crate::pdf::testutil::{page_labels, sample_document, sample_pdf};

    #[test]
    fn test_merge_two_documents() {
        let merged = merge_documents(vec![sample_document(2), sample_document(3)]).unwrap();
        assert_eq!(
            page_labels(&merged),
            vec!["Page 1", "Page 2", "Page 1", "Page 2", "Page 3"]
        );
    }

    #[test]
    fn test_merge_keeps_inherited_resources() {
        let merged = merge_documents(vec![sample_document(1), sample_document(1)]).unwrap();
        for page_id in merged.get_pages().into_values() {
            let page = merged.get_dictionary(page_id).unwrap();
            assert!(page.has(b"Resources"));
            assert!(page.has(b"MediaBox"));
        }
    }

    #[test]
    fn test_merge_bytes_round_trip() {
        let inputs = vec![sample_pdf(1), sample_pdf(2), sample_pdf(1)];
        let mut merged = merge_pdf_bytes(&inputs).unwrap();
        let bytes = PdfDocument::to_bytes(&mut merged).unwrap();
        let reloaded = PdfDocument::from_bytes(&bytes, "merged.pdf").unwrap();
        assert_eq!(reloaded.page_count(), 4);
    }

    #[test]
    fn test_merge_single_document() {
        let merged = merge_documents(vec![sample_document(3)]).unwrap();
        assert_eq!(merged.get_pages().len(), 3);
    }

    #[test]
    fn test_merge_nothing() {
        assert!(merge_documents(Vec::new()).is_err());
    }

    #[test]
    fn test_merge_invalid_input() {
        let inputs: Vec<&[u8]> = vec![b"%PDF-1.5 garbage"];
        let err = merge_pdf_bytes(&inputs).unwrap_err();
        assert!(err.to_string().contains("PDF #1"));
    }
}
