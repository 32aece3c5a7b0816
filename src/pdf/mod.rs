pub mod document;
pub mod images;
pub mod merge;

pub use document::PdfDocument;
