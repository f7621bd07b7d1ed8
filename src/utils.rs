/// Object storage helper functions / 对象存储工具函数

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;

use crate::error::{Result, StorageError};

/// Base64 encoded MD5 digest (the format GCS reports in `md5Hash`) / MD5摘要(Base64)
pub fn md5_base64(data: &[u8]) -> String {
    let sum = md5::compute(data);
    B64.encode(sum.0)
}

/// Guess content type from file extension / 根据扩展名推断内容类型
pub fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}

/// Temporary sibling used while a download is in flight / 下载中的临时文件路径
/// Input: "/tmp/out.bin" / 输入
/// Output: "/tmp/.out.bin.<uuid>.part" / 输出
pub fn partial_path(destination: &Path) -> PathBuf {
    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    let partial = format!(".{}.{}.part", file_name, uuid::Uuid::new_v4());
    match destination.parent() {
        Some(parent) => parent.join(partial),
        None => PathBuf::from(partial),
    }
}

/// Reject names that URL parsing would treat as dot segments / 拒绝 "." 和 ".."
///
/// `..` (escaped or not) collapses into the parent path, so an object named
/// `..` would address its bucket.
pub fn check_segment(segment: &str) -> Result<()> {
    if segment == "." || segment == ".." {
        return Err(StorageError::InvalidName(format!(
            "'{}' cannot be used as a bucket or object name",
            segment
        )));
    }
    Ok(())
}

/// Percent-encode one URL path segment (object names may contain `/`) / 编码路径片段
pub fn path_segment(segment: &str) -> Result<String> {
    check_segment(segment)?;
    Ok(urlencoding::encode(segment).into_owned())
}
