//! # apkd-common
//!
//! Shared configuration and error types for the apkd download service.

pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::{StoreError, StoreResult};
