pub mod catalog_cache;
pub mod config;
pub mod format;
pub mod gateway;
