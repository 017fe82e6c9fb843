pub mod file_service;
pub mod lookup_service;
pub mod report_service;
pub mod sales_service;
