//! Download pipeline services.

pub mod downloader;
pub mod identifier;
pub mod metadata;
pub mod store;
