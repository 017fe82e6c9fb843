pub mod backup;
pub mod repo;
pub mod save;
pub mod writer;
