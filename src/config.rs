//! Client configuration module / 客户端配置模块
//!
//! Reads settings from the process environment, loading a `.env` file first
//! when one is present / 从环境变量读取配置，存在 .env 时先加载

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

use crate::error::{Result, StorageError};

/// Path to the service-account key file / 服务账号密钥文件路径
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
/// Overrides the project id found in the key / 覆盖密钥中的项目ID
pub const PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";
/// Points the client at a local emulator / 本地模拟器地址
pub const EMULATOR_HOST_ENV: &str = "STORAGE_EMULATOR_HOST";
/// Per-instance log level / 日志级别
pub const LOG_LEVEL_ENV: &str = "GCS_CLIENT_LOG_LEVEL";

pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Client configuration / 客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Service-account key file / 服务账号密钥文件
    pub credentials_path: PathBuf,
    /// Project override; falls back to the key's `project_id` / 项目ID
    #[serde(default)]
    pub project_id: Option<String>,
    /// Storage API base URL / 存储API地址
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ClientConfig {
    pub fn new(credentials_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            project_id: None,
            endpoint: default_endpoint(),
            log_level: default_log_level(),
        }
    }

    /// Load configuration from environment variables / 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let lookup = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let credentials_path = lookup(CREDENTIALS_ENV)
            .ok_or_else(|| StorageError::Config(format!("{} is not set", CREDENTIALS_ENV)))?;

        let config = Self {
            credentials_path: PathBuf::from(credentials_path),
            project_id: lookup(PROJECT_ENV),
            endpoint: lookup(EMULATOR_HOST_ENV)
                .map(|host| normalize_endpoint(&host))
                .unwrap_or_else(default_endpoint),
            log_level: lookup(LOG_LEVEL_ENV).unwrap_or_else(default_log_level),
        };
        config.level_filter()?;
        Ok(config)
    }

    /// Parsed log level / 解析后的日志级别
    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(self.log_level.trim())
            .map_err(|_| StorageError::Config(format!("unknown log level: {}", self.log_level)))
    }
}

/// Emulator hosts are often given without a scheme / 补全模拟器地址的协议
/// Input: "localhost:4443" / 输入
/// Output: "http://localhost:4443" / 输出
pub fn normalize_endpoint(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize_endpoint("localhost:4443"), "http://localhost:4443");
        assert_eq!(normalize_endpoint("http://localhost:4443/"), "http://localhost:4443");
        assert_eq!(normalize_endpoint("https://gcs.example.com"), "https://gcs.example.com");
    }

    #[test]
    fn test_level_filter() {
        let mut config = ClientConfig::new("/tmp/key.json");
        assert_eq!(config.level_filter().unwrap(), LevelFilter::INFO);

        config.log_level = "warn".to_string();
        assert_eq!(config.level_filter().unwrap(), LevelFilter::WARN);

        config.log_level = "loud".to_string();
        assert!(matches!(config.level_filter(), Err(StorageError::Config(_))));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"credentials_path": "/etc/gcs/key.json"}"#).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.log_level, "info");
        assert!(config.project_id.is_none());
    }
}
