pub mod art_cache;
pub mod config;
