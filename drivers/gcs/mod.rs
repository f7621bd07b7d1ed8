//! Google Cloud Storage 驱动
//!
//! 服务账号(JWT-bearer)授权
//! JSON API v1，分页列举，流式下载

mod auth;
mod driver;

pub use auth::{ServiceAccountKey, TokenProvider, DEFAULT_TOKEN_URI, STORAGE_SCOPE};
pub use driver::GcsDriver;
