//! # 网络模块
//!
//! - `payload` - 翻译 API 的响应结构
//! - `transport` - 传输接口与 HTTP 实现

pub mod payload;
pub mod transport;

pub use payload::{ApiResponse, LanguageBlock, ResourceItem, ResponseData, ResponseMeta};
pub use transport::{HttpTransport, Transport};
