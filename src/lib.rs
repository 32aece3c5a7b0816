pub mod convert;
pub mod page_range;
pub mod pdf;
