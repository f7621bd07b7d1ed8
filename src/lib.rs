//! Failure-tolerant Google Cloud Storage client / 容错的 GCS 客户端
//!
//! Every bucket and blob operation goes through [`StorageClient`], which logs
//! failures and hands back a sentinel (`false`, `None`, empty `Vec`) instead
//! of an error. Only construction propagates errors.

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod storage;
pub mod utils;

// Driver modules (point to project root drivers via path attribute) / 驱动模块
#[path = "../drivers/mod.rs"]
pub mod drivers;

pub use client::StorageClient;
pub use config::ClientConfig;
pub use error::{ErrorKind, StorageError};
pub use models::FileMetadata;
pub use storage::StorageDriver;
