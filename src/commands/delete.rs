use anyhow::Result;
use pdfdesk::page_range::parse_page_selection;
use pdfdesk::pdf::PdfDocument;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn run<P: AsRef<Path>>(input: P, pages: &str, output: Option<&Path>) -> Result<()> {
    let input = input.as_ref();
    let doc = PdfDocument::open(input)?;
    let total_pages = doc.page_count();

    let selection = parse_page_selection(pages, Some(total_pages))?;
    let mut new_doc = doc.delete_pages(&selection)?;

    let output = output.map_or_else(|| edited_path(input), Path::to_path_buf);
    PdfDocument::save(&mut new_doc, &output)?;
    info!(input = %input.display(), deleted = %selection, "pages deleted");

    println!(
        "Deleted {} page(s) ({}), {} remaining, saved to {}",
        selection.len(),
        selection,
        selection.complement(total_pages).len(),
        output.display()
    );

    Ok(())
}

/// `report.pdf` becomes `report_edited.pdf` in the same directory.
fn edited_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    input.with_file_name(format!("{}_edited.pdf", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edited_path() {
        assert_eq!(
            edited_path(Path::new("/tmp/report.pdf")),
            PathBuf::from("/tmp/report_edited.pdf")
        );
        assert_eq!(
            edited_path(Path::new("scan.PDF")),
            PathBuf::from("scan_edited.pdf")
        );
    }
}
