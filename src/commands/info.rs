use anyhow::Result;
use pdfdesk::pdf::PdfDocument;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let info = doc.get_info();

    println!("File: {}", path.as_ref().display());
    println!("PDF version: {}", info.version);
    println!("Pages: {}", info.page_count);

    if let Some(title) = &info.title {
        println!("Title: {}", title);
    }
    if let Some(author) = &info.author {
        println!("Author: {}", author);
    }
    if let Some(subject) = &info.subject {
        println!("Subject: {}", subject);
    }
    if let Some(keywords) = &info.keywords {
        println!("Keywords: {}", keywords);
    }
    if let Some(creator) = &info.creator {
        println!("Creator: {}", creator);
    }
    if let Some(producer) = &info.producer {
        println!("Producer: {}", producer);
    }
    if let Some(creation_date) = &info.creation_date {
        println!("Created: {}", format_pdf_date(creation_date));
    }
    if let Some(mod_date) = &info.mod_date {
        println!("Modified: {}", format_pdf_date(mod_date));
    }

    Ok(())
}

/// Render `D:YYYYMMDDHHmmSS...` as `YYYY-MM-DD HH:mm:SS`; anything else is
/// returned unchanged.
fn format_pdf_date(date: &str) -> String {
    let Some(digits) = date.strip_prefix("D:") else {
        return date.to_string();
    };
    let Some(date_part) = digits.get(0..8) else {
        return date.to_string();
    };
    if !date_part.bytes().all(|b| b.is_ascii_digit()) {
        return date.to_string();
    }

    let day = format!("{}-{}-{}", &digits[0..4], &digits[4..6], &digits[6..8]);
    match digits.get(8..14) {
        Some(time) if time.bytes().all(|b| b.is_ascii_digit()) => {
            format!("{} {}:{}:{}", day, &time[0..2], &time[2..4], &time[4..6])
        }
        _ => day,
    }
}
