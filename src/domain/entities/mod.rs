pub mod lookup;
pub mod report;
pub mod sales;
pub mod table;
