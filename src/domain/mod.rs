pub mod conflict;
pub mod entities;
pub mod schema;
pub mod text;
