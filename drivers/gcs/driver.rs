//! GCS 驱动实现
//!
//! JSON API v1 over reqwest, bearer tokens from the service-account key.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use super::auth::{ServiceAccountKey, TokenProvider};
use crate::config::ClientConfig;
use crate::error::{Result, StorageError};
use crate::models::FileMetadata;
use crate::storage::StorageDriver;
use crate::utils::{check_segment, guess_content_type, partial_path, path_segment};

// ============ API响应结构 ============

/// API错误
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Page of bucket or object names / 名称列表分页
#[derive(Debug, Deserialize)]
struct NameList {
    #[serde(default)]
    items: Vec<NamedItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedItem {
    name: String,
}

/// Object resource (only the fields we surface) / 对象资源
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectResource {
    name: String,
    /// uint64 sent as a decimal string / 以字符串表示的大小
    size: Option<String>,
    content_type: Option<String>,
    time_created: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
    md5_hash: Option<String>,
}

impl TryFrom<ObjectResource> for FileMetadata {
    type Error = StorageError;

    fn try_from(object: ObjectResource) -> Result<Self> {
        let size = match object.size.as_deref() {
            None => 0,
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                StorageError::InvalidResponse(format!("size '{}' of '{}' is not a number", raw, object.name))
            })?,
        };

        Ok(FileMetadata {
            name: object.name,
            size,
            content_type: object.content_type,
            created: object.time_created,
            updated: object.updated,
            md5_hash: object.md5_hash,
        })
    }
}

// ============ 常量 ============

const LIST_FIELDS: &str = "items(name),nextPageToken";

// ============ 驱动主体 ============

/// Google Cloud Storage 驱动
pub struct GcsDriver {
    http: Client,
    endpoint: String,
    project: String,
    auth: TokenProvider,
}

impl GcsDriver {
    /// Build from configuration, reading the key file / 从配置创建驱动
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let key = ServiceAccountKey::from_file(&config.credentials_path)?;
        Self::with_key(key, config)
    }

    /// Build from an already loaded key / 使用已加载的密钥创建驱动
    pub fn with_key(key: ServiceAccountKey, config: &ClientConfig) -> Result<Self> {
        let project = config
            .project_id
            .clone()
            .or_else(|| key.project_id.clone())
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| StorageError::Config("no project id in key file or environment".to_string()))?;

        let http = Client::builder()
            .user_agent(concat!("gcs-storage-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let auth = TokenProvider::new(key, http.clone())?;
        tracing::debug!("GCS driver using service account {}", auth.client_email());

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project,
            auth,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn bucket_url(&self, bucket: &str) -> Result<String> {
        Ok(self.url(&format!("/storage/v1/b/{}", path_segment(bucket)?)))
    }

    fn object_url(&self, bucket: &str, name: &str) -> Result<String> {
        Ok(format!("{}/o/{}", self.bucket_url(bucket)?, path_segment(name)?))
    }

    /// Authorized request builder / 带授权的请求
    async fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let token = self.auth.access_token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        check_status(request.send().await?).await
    }

    /// Follow `nextPageToken` until every name is collected / 分页获取全部名称
    async fn list_names(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .request(Method::GET, url)
                .await?
                .query(&[("fields", LIST_FIELDS)])
                .query(query);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: NameList = self.send(request).await?.json().await?;
            names.extend(page.items.into_iter().map(|item| item.name));

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        Ok(names)
    }
}

/// Turn non-2xx responses into errors / 将非2xx响应转换为错误
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = error_message(status, response.text().await);
    Err(StorageError::from_status(status.as_u16(), message))
}

/// Service message from an error body, falling back to the status line / 提取错误信息
fn error_message(status: StatusCode, body: std::result::Result<String, impl std::fmt::Display>) -> String {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!("error body of {} response unreadable: {}", status, e);
            return format!("{} (body unreadable: {})", status, e);
        }
    };
    match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => api_error.error.message,
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body,
    }
}

/// Stream a response body into `path` / 将响应体流式写入文件
async fn write_body(response: Response, path: &Path) -> Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

#[async_trait]
impl StorageDriver for GcsDriver {
    fn name(&self) -> &str {
        "Google Cloud Storage"
    }

    fn project(&self) -> &str {
        &self.project
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let request = self
            .request(Method::POST, &self.url("/storage/v1/b"))
            .await?
            .query(&[("project", self.project.as_str())])
            .json(&serde_json::json!({ "name": bucket }));
        self.send(request).await?;
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        self.list_names(&self.url("/storage/v1/b"), &[("project", self.project.as_str())])
            .await
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let response = self
            .request(Method::GET, &self.bucket_url(bucket)?)
            .await?
            .query(&[("fields", "name")])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_status(response).await?;
        Ok(true)
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let url = format!("{}/o", self.bucket_url(bucket)?);
        if prefix.is_empty() {
            self.list_names(&url, &[]).await
        } else {
            self.list_names(&url, &[("prefix", prefix)]).await
        }
    }

    async fn upload_object(&self, bucket: &str, source: &Path, name: &str) -> Result<()> {
        check_segment(name)?;
        let url = self.url(&format!("/upload/storage/v1/b/{}/o", path_segment(bucket)?));
        let data = tokio::fs::read(source).await?;

        let request = self
            .request(Method::POST, &url)
            .await?
            .query(&[("uploadType", "media"), ("name", name)])
            .header(CONTENT_TYPE, guess_content_type(source))
            .body(data);
        self.send(request).await?;
        Ok(())
    }

    async fn download_object(&self, bucket: &str, name: &str, destination: &Path) -> Result<()> {
        let request = self
            .request(Method::GET, &self.object_url(bucket, name)?)
            .await?
            .query(&[("alt", "media")]);
        let response = self.send(request).await?;

        // Write beside the destination, then rename / 先写临时文件再重命名
        let partial = partial_path(destination);
        let written = match write_body(response, &partial).await {
            Ok(()) => tokio::fs::rename(&partial, destination).await.map_err(StorageError::from),
            Err(e) => Err(e),
        };
        if written.is_err() {
            let _ = tokio::fs::remove_file(&partial).await;
        }
        written
    }

    async fn object_metadata(&self, bucket: &str, name: &str) -> Result<FileMetadata> {
        let request = self.request(Method::GET, &self.object_url(bucket, name)?).await?;
        let object: ObjectResource = self.send(request).await?.json().await?;
        FileMetadata::try_from(object)
    }

    async fn delete_object(&self, bucket: &str, name: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &self.object_url(bucket, name)?).await?;
        self.send(request).await?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &self.bucket_url(bucket)?).await?;
        self.send(request).await?;
        Ok(())
    }
}
