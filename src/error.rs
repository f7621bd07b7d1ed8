//! Storage error taxonomy / 存储错误分类

use thiserror::Error;

/// Errors raised by storage drivers and client construction / 存储驱动错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Any other non-2xx answer from the service / 其他服务端错误
    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid credentials: {0}")]
    Credentials(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Rejected before any request is sent / 名称非法，未发送请求
    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Coarse failure class used to pick a log level / 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Other,
}

impl StorageError {
    /// Map an HTTP status and message to the matching variant / 按状态码映射错误
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => StorageError::NotFound(message),
            403 => StorageError::PermissionDenied(message),
            _ => StorageError::Api { status, message },
        }
    }

    /// Classify the error / 错误分类
    ///
    /// HTTP 404 is not-found. HTTP 403, or a message mentioning "Permission",
    /// is permission-denied.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::NotFound(_) => ErrorKind::NotFound,
            StorageError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            StorageError::Api { status: 404, .. } => ErrorKind::NotFound,
            StorageError::Api { status: 403, .. } => ErrorKind::PermissionDenied,
            StorageError::Api { message, .. } if message.contains("Permission") => {
                ErrorKind::PermissionDenied
            }
            StorageError::Http(e) => match e.status().map(|s| s.as_u16()) {
                Some(404) => ErrorKind::NotFound,
                Some(403) => ErrorKind::PermissionDenied,
                _ => ErrorKind::Other,
            },
            _ => ErrorKind::Other,
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(matches!(StorageError::from_status(404, "gone"), StorageError::NotFound(_)));
        assert!(matches!(StorageError::from_status(403, "nope"), StorageError::PermissionDenied(_)));
        assert!(matches!(
            StorageError::from_status(409, "busy"),
            StorageError::Api { status: 409, .. }
        ));
    }

    #[test]
    fn test_kind() {
        assert_eq!(StorageError::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(StorageError::PermissionDenied("x".into()).kind(), ErrorKind::PermissionDenied);
        assert_eq!(
            StorageError::Api { status: 400, message: "Permission 'storage.buckets.get' denied".into() }.kind(),
            ErrorKind::PermissionDenied
        );
        assert_eq!(
            StorageError::Api { status: 409, message: "The bucket you tried to delete is not empty.".into() }.kind(),
            ErrorKind::Other
        );
        assert_eq!(StorageError::Config("missing".into()).kind(), ErrorKind::Other);
    }
}
