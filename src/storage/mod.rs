use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::models::FileMetadata;

/// Storage driver interface (provides only primitive operations) / 存储驱动接口
///
/// Drivers report every failure as an error; turning failures into sentinel
/// values is the client's job.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Driver name / 驱动名称
    fn name(&self) -> &str;

    /// Project the driver operates in / 所属项目
    fn project(&self) -> &str;

    /// Create a bucket / 创建存储桶
    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// Bucket names in service order / 列出存储桶
    async fn list_buckets(&self) -> Result<Vec<String>>;

    /// `Ok(false)` when the service says the bucket is missing / 存储桶是否存在
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Object names starting with `prefix` (empty prefix matches all) / 列出对象
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// Upload a local file as object `name` / 上传本地文件
    async fn upload_object(&self, bucket: &str, source: &Path, name: &str) -> Result<()>;

    /// Download object `name` into a local file / 下载对象到本地文件
    async fn download_object(&self, bucket: &str, name: &str, destination: &Path) -> Result<()>;

    /// Fetch normalized object metadata / 获取对象元数据
    async fn object_metadata(&self, bucket: &str, name: &str) -> Result<FileMetadata>;

    /// Delete an object / 删除对象
    async fn delete_object(&self, bucket: &str, name: &str) -> Result<()>;

    /// Delete a bucket (the service requires it to be empty) / 删除存储桶
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;
}
