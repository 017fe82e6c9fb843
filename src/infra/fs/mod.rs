pub mod files;
pub mod images;
