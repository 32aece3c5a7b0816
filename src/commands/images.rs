use anyhow::{Context, Result};
use pdfdesk::pdf::images::{images_to_pdf, ImagePdfOptions};
use pdfdesk::pdf::PdfDocument;
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    inputs: &[P],
    output: Q,
    options: &ImagePdfOptions,
) -> Result<()> {
    let images = inputs
        .iter()
        .map(|input| {
            std::fs::read(input)
                .with_context(|| format!("Failed to read image: {}", input.as_ref().display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut doc = images_to_pdf(&images, options)?;
    PdfDocument::save(&mut doc, &output)?;

    println!(
        "Converted {} image(s) into {}",
        images.len(),
        output.as_ref().display()
    );

    Ok(())
}
