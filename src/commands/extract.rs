use anyhow::Result;
use pdfdesk::page_range::parse_page_selection;
use pdfdesk::pdf::PdfDocument;
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, pages: &str, output: Q) -> Result<()> {
    let doc = PdfDocument::open(&input)?;
    let total_pages = doc.page_count();

    let selection = parse_page_selection(pages, Some(total_pages))?;
    let mut new_doc = doc.extract_pages(&selection)?;
    PdfDocument::save(&mut new_doc, &output)?;

    println!(
        "Extracted {} page(s) to {}",
        selection.len(),
        output.as_ref().display()
    );

    Ok(())
}
