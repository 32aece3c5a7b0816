pub mod delete;
pub mod extract;
pub mod images;
pub mod info;
pub mod merge;
pub mod pages;
