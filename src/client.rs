//! Storage client facade / 存储客户端
//!
//! Every operation except construction is contained: failures are logged
//! under [`LOGGER_NAME`] and turned into a sentinel (`false`, `None`, empty
//! `Vec`). An empty listing therefore means either "nothing there" or "the
//! call failed"; only the log tells them apart.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing::Level;

use crate::config::ClientConfig;
use crate::drivers::GcsDriver;
use crate::error::{ErrorKind, Result, StorageError};
use crate::logging;
use crate::models::FileMetadata;
use crate::storage::StorageDriver;

/// Logger name (tracing target) of every client event / 日志名称
pub const LOGGER_NAME: &str = module_path!();

/// What a guarded call operates on, for log lines / 操作对象
enum Target<'a> {
    Project(&'a str),
    Bucket(&'a str),
    File { bucket: &'a str, name: &'a str },
    Path(&'a Path),
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Project(project) => write!(f, "project '{}'", project),
            Target::Bucket(bucket) => write!(f, "bucket '{}'", bucket),
            Target::File { bucket, name } => write!(f, "file '{}' in bucket '{}'", name, bucket),
            Target::Path(path) => write!(f, "file '{}'", path.display()),
        }
    }
}

/// Log context of one guarded call / 受保护调用的日志上下文
struct Guard<'a> {
    action: &'static str,
    target: Target<'a>,
    /// Permission-denied means "absent" rather than failure / 无权限视为不存在
    denied_as_absent: bool,
}

impl<'a> Guard<'a> {
    fn new(action: &'static str, target: Target<'a>) -> Self {
        Self {
            action,
            target,
            denied_as_absent: false,
        }
    }

    fn denied_as_absent(mut self) -> Self {
        self.denied_as_absent = true;
        self
    }
}

/// Failure-contained client over one storage driver / 容错存储客户端
#[derive(Clone)]
pub struct StorageClient {
    driver: Arc<dyn StorageDriver>,
    level: LevelFilter,
}

impl fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageClient")
            .field("driver", &self.driver.name())
            .field("project", &self.driver.project())
            .field("level", &self.level)
            .finish()
    }
}

impl StorageClient {
    /// Build from the environment at INFO level / 从环境变量创建（INFO级别）
    pub fn new() -> Result<Self> {
        Self::with_log_level(LevelFilter::INFO)
    }

    /// Build from the environment with an explicit level / 从环境变量创建并指定日志级别
    pub fn with_log_level(level: LevelFilter) -> Result<Self> {
        logging::attach_sink(LOGGER_NAME);

        match ClientConfig::from_env() {
            Ok(config) => Self::connect(&config, level),
            Err(e) => Err(Self::init_failed(level, e)),
        }
    }

    /// Build from the environment, level taken from configuration / 级别取自配置
    pub fn from_env() -> Result<Self> {
        logging::attach_sink(LOGGER_NAME);

        let config = ClientConfig::from_env().map_err(|e| Self::init_failed(LevelFilter::INFO, e))?;
        let level = config
            .level_filter()
            .map_err(|e| Self::init_failed(LevelFilter::INFO, e))?;
        Self::connect(&config, level)
    }

    /// Build from an explicit configuration / 使用指定配置创建
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        logging::attach_sink(LOGGER_NAME);

        let level = config
            .level_filter()
            .map_err(|e| Self::init_failed(LevelFilter::INFO, e))?;
        Self::connect(config, level)
    }

    /// Wrap any driver (in-memory backend, tests) / 包装任意驱动
    pub fn with_driver(driver: Arc<dyn StorageDriver>, level: LevelFilter) -> Self {
        logging::attach_sink(LOGGER_NAME);

        let client = Self { driver, level };
        client.emit(
            Level::INFO,
            format_args!("{} client initialized for project: {}", client.driver.name(), client.driver.project()),
        );
        client
    }

    fn connect(config: &ClientConfig, level: LevelFilter) -> Result<Self> {
        let driver = GcsDriver::new(config).map_err(|e| Self::init_failed(level, e))?;
        let client = Self {
            driver: Arc::new(driver),
            level,
        };
        client.emit(
            Level::INFO,
            format_args!("GCS client initialized for project: {}", client.driver.project()),
        );
        Ok(client)
    }

    /// Construction failures are logged, then propagated / 初始化失败：记录后返回错误
    fn init_failed(level: LevelFilter, e: StorageError) -> StorageError {
        if Level::ERROR <= level {
            tracing::error!(target: LOGGER_NAME, "Failed to initialize GCS client: {}", e);
        }
        e
    }

    pub fn project(&self) -> &str {
        self.driver.project()
    }

    pub fn driver(&self) -> &Arc<dyn StorageDriver> {
        &self.driver
    }

    pub fn log_level(&self) -> LevelFilter {
        self.level
    }

    /// Emit at `level` unless this instance is quieter / 按实例级别输出日志
    fn emit(&self, level: Level, message: fmt::Arguments<'_>) {
        if level > self.level {
            return;
        }
        match level {
            Level::ERROR => tracing::error!(target: LOGGER_NAME, "{}", message),
            Level::WARN => tracing::warn!(target: LOGGER_NAME, "{}", message),
            Level::INFO => tracing::info!(target: LOGGER_NAME, "{}", message),
            Level::DEBUG => tracing::debug!(target: LOGGER_NAME, "{}", message),
            _ => tracing::trace!(target: LOGGER_NAME, "{}", message),
        }
    }

    /// Run `call`, logging any failure and returning `fallback` instead / 受保护调用
    async fn attempt<T, F>(&self, guard: Guard<'_>, fallback: T, call: F) -> T
    where
        F: Future<Output = Result<T>>,
    {
        match call.await {
            Ok(value) => value,
            Err(e) => {
                self.report(&guard, &e);
                fallback
            }
        }
    }

    fn report(&self, guard: &Guard<'_>, e: &StorageError) {
        match e.kind() {
            ErrorKind::PermissionDenied if guard.denied_as_absent => self.emit(
                Level::WARN,
                format_args!(
                    "Permission denied trying to {} {}. Assuming it doesn't exist or no access.",
                    guard.action, guard.target
                ),
            ),
            ErrorKind::NotFound => self.emit(
                Level::WARN,
                format_args!("Could not {} {}: not found ({})", guard.action, guard.target, e),
            ),
            _ => self.emit(
                Level::ERROR,
                format_args!("Failed to {} {}: {}", guard.action, guard.target, e),
            ),
        }
    }

    /// Create a bucket / 创建存储桶
    pub async fn create_bucket(&self, bucket: &str) -> bool {
        let guard = Guard::new("create", Target::Bucket(bucket));
        self.attempt(guard, false, async {
            self.driver.create_bucket(bucket).await?;
            self.emit(Level::INFO, format_args!("Bucket '{}' created", bucket));
            Ok(true)
        })
        .await
    }

    /// All bucket names of the project; empty on failure / 列出存储桶
    pub async fn list_buckets(&self) -> Vec<String> {
        let guard = Guard::new("list buckets of", Target::Project(self.driver.project()));
        self.attempt(guard, Vec::new(), async {
            let names = self.driver.list_buckets().await?;
            self.emit(Level::INFO, format_args!("Found {} buckets", names.len()));
            Ok(names)
        })
        .await
    }

    /// Whether the bucket exists; no access counts as absent / 存储桶是否存在
    pub async fn bucket_exists(&self, bucket: &str) -> bool {
        let guard = Guard::new("check existence of", Target::Bucket(bucket)).denied_as_absent();
        self.attempt(guard, false, self.driver.bucket_exists(bucket)).await
    }

    /// Object names starting with `prefix` (`""` lists all); empty on failure / 列出文件
    pub async fn list_files(&self, bucket: &str, prefix: &str) -> Vec<String> {
        let guard = Guard::new("list files in", Target::Bucket(bucket));
        self.attempt(guard, Vec::new(), async {
            let names = self.driver.list_objects(bucket, prefix).await?;
            self.emit(
                Level::INFO,
                format_args!("Found {} files in bucket '{}'", names.len(), bucket),
            );
            Ok(names)
        })
        .await
    }

    /// Upload `source` as object `destination` / 上传文件
    pub async fn upload_file(&self, bucket: &str, source: impl AsRef<Path>, destination: &str) -> bool {
        let source = source.as_ref();
        let guard = Guard::new("upload", Target::Path(source));
        self.attempt(guard, false, async {
            self.driver.upload_object(bucket, source, destination).await?;
            self.emit(
                Level::INFO,
                format_args!("File {} uploaded to {}.", source.display(), destination),
            );
            Ok(true)
        })
        .await
    }

    /// Download object `source` into local file `destination` / 下载文件
    pub async fn download_file(&self, bucket: &str, source: &str, destination: impl AsRef<Path>) -> bool {
        let destination = destination.as_ref();
        let guard = Guard::new("download", Target::File { bucket, name: source });
        self.attempt(guard, false, async {
            self.driver.download_object(bucket, source, destination).await?;
            self.emit(
                Level::INFO,
                format_args!(
                    "Downloaded storage object {} from bucket {} to local file {}.",
                    source,
                    bucket,
                    destination.display()
                ),
            );
            Ok(true)
        })
        .await
    }

    /// Metadata of one object; `None` when missing or on failure / 获取文件元数据
    pub async fn get_file_metadata(&self, bucket: &str, name: &str) -> Option<FileMetadata> {
        let guard = Guard::new("get metadata for", Target::File { bucket, name });
        self.attempt(guard, None, async { self.driver.object_metadata(bucket, name).await.map(Some) })
            .await
    }

    /// Delete one object / 删除文件
    pub async fn delete_file(&self, bucket: &str, name: &str) -> bool {
        let guard = Guard::new("delete", Target::File { bucket, name });
        self.attempt(guard, false, async {
            self.driver.delete_object(bucket, name).await?;
            Ok(true)
        })
        .await
    }

    /// Delete a bucket; the service refuses non-empty buckets / 删除存储桶
    pub async fn delete_bucket(&self, bucket: &str) -> bool {
        let guard = Guard::new("delete", Target::Bucket(bucket));
        self.attempt(guard, false, async {
            self.driver.delete_bucket(bucket).await?;
            Ok(true)
        })
        .await
    }
}
