//! In-memory storage driver / 内存存储驱动
//!
//! Keeps buckets and objects in process memory with the same observable rules
//! as GCS: global bucket names, lexicographic listings, non-empty buckets
//! cannot be deleted. Nothing survives the process.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::{Result, StorageError};
use crate::models::FileMetadata;
use crate::storage::StorageDriver;
use crate::utils::{check_segment, guess_content_type, md5_base64, partial_path};

#[derive(Debug, Default)]
struct MemoryBucket {
    objects: BTreeMap<String, StoredObject>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    md5_hash: String,
}

/// 内存驱动
pub struct MemoryDriver {
    project: String,
    buckets: RwLock<BTreeMap<String, MemoryBucket>>,
}

impl MemoryDriver {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            buckets: RwLock::new(BTreeMap::new()),
        }
    }

    fn bucket_missing(bucket: &str) -> StorageError {
        StorageError::NotFound(format!("bucket '{}' does not exist", bucket))
    }

    fn object_missing(bucket: &str, name: &str) -> StorageError {
        StorageError::NotFound(format!("no such object: {}/{}", bucket, name))
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl StorageDriver for MemoryDriver {
    fn name(&self) -> &str {
        "Memory"
    }

    fn project(&self) -> &str {
        &self.project
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        if bucket.is_empty() {
            return Err(StorageError::Api {
                status: 400,
                message: "bucket name must not be empty".to_string(),
            });
        }

        let mut buckets = self.buckets.write();
        if buckets.contains_key(bucket) {
            return Err(StorageError::Api {
                status: 409,
                message: "Your previous request to create the named bucket succeeded and you already own it."
                    .to_string(),
            });
        }
        buckets.insert(bucket.to_string(), MemoryBucket::default());
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        Ok(self.buckets.read().keys().cloned().collect())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.buckets.read().contains_key(bucket))
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let buckets = self.buckets.read();
        let entry = buckets.get(bucket).ok_or_else(|| Self::bucket_missing(bucket))?;
        Ok(entry
            .objects
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn upload_object(&self, bucket: &str, source: &Path, name: &str) -> Result<()> {
        check_segment(name)?;
        // Read before locking; the lock is never held across an await / 先读文件再加锁
        let data = Bytes::from(tokio::fs::read(source).await?);
        let now = Utc::now();

        let mut buckets = self.buckets.write();
        let entry = buckets.get_mut(bucket).ok_or_else(|| Self::bucket_missing(bucket))?;
        entry.objects.insert(
            name.to_string(),
            StoredObject {
                md5_hash: md5_base64(&data),
                content_type: guess_content_type(source),
                data,
                created: now,
                updated: now,
            },
        );
        Ok(())
    }

    async fn download_object(&self, bucket: &str, name: &str, destination: &Path) -> Result<()> {
        let data = {
            let buckets = self.buckets.read();
            let entry = buckets.get(bucket).ok_or_else(|| Self::bucket_missing(bucket))?;
            let object = entry
                .objects
                .get(name)
                .ok_or_else(|| Self::object_missing(bucket, name))?;
            object.data.clone()
        };

        let partial = partial_path(destination);
        let written = match tokio::fs::write(&partial, &data).await {
            Ok(()) => tokio::fs::rename(&partial, destination).await,
            Err(e) => Err(e),
        };
        if written.is_err() {
            let _ = tokio::fs::remove_file(&partial).await;
        }
        Ok(written?)
    }

    async fn object_metadata(&self, bucket: &str, name: &str) -> Result<FileMetadata> {
        let buckets = self.buckets.read();
        let entry = buckets.get(bucket).ok_or_else(|| Self::bucket_missing(bucket))?;
        let object = entry
            .objects
            .get(name)
            .ok_or_else(|| Self::object_missing(bucket, name))?;

        Ok(FileMetadata {
            name: name.to_string(),
            size: object.data.len() as u64,
            content_type: Some(object.content_type.clone()),
            created: Some(object.created),
            updated: Some(object.updated),
            md5_hash: Some(object.md5_hash.clone()),
        })
    }

    async fn delete_object(&self, bucket: &str, name: &str) -> Result<()> {
        let mut buckets = self.buckets.write();
        let entry = buckets.get_mut(bucket).ok_or_else(|| Self::bucket_missing(bucket))?;
        entry
            .objects
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Self::object_missing(bucket, name))
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let mut buckets = self.buckets.write();
        let entry = buckets.get(bucket).ok_or_else(|| Self::bucket_missing(bucket))?;
        if !entry.objects.is_empty() {
            return Err(StorageError::Api {
                status: 409,
                message: "The bucket you tried to delete is not empty.".to_string(),
            });
        }
        buckets.remove(bucket);
        Ok(())
    }
}
