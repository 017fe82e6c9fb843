pub mod cache;
pub mod fs;
pub mod import;
pub mod sqlite;
pub mod workbook;
