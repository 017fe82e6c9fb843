pub mod blocking;
pub mod config;
pub mod http;
