use anyhow::Result;
use pdfdesk::page_range::parse_page_selection;

pub fn run(spec: &str, total: Option<u32>) -> Result<()> {
    let selection = parse_page_selection(spec, total)?;

    if selection.is_empty() {
        println!("No pages selected.");
        return Ok(());
    }

    println!("{}", selection);
    println!("{} page(s)", selection.len());

    Ok(())
}
