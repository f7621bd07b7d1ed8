use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blob metadata surfaced to callers / 文件元数据
///
/// Only these attributes are kept; everything else the service reports about
/// an object is dropped by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    /// Size in bytes / 文件大小
    pub size: u64,
    pub content_type: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    /// Base64 MD5 of the content, as reported by the service / 内容MD5
    pub md5_hash: Option<String>,
}
