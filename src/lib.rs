//! # TXR Client Library
//!
//! 多租户翻译客户端：按语言从翻译服务拉取键值字符串，经两层缓存（带 TTL 与过期兜底）
//! 保存，提供键解析函数，并可就地改写 HTML 文档中的可翻译内容。
//!
//! ## 模块组织
//!
//! - `client` - 引擎、事件总线与翻译表
//! - `config` - 客户端配置
//! - `dom` - HTML 文档模型与扫描器
//! - `env` - 类型化环境变量
//! - `error` - 统一错误处理
//! - `logging` - 日志初始化
//! - `network` - 传输层与响应结构
//! - `storage` - 翻译缓存与持久化存储

pub mod client;
pub mod config;
pub mod dom;
pub mod env;
pub mod error;
pub mod logging;
pub mod network;
pub mod storage;

// Re-export commonly used items for convenience
pub use client::{ClientState, EventKind, EventPayload, Listener, TranslationClient};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use dom::{Document, ScanReport};
pub use error::{ErrorCode, TxrError, TxrResult};
pub use logging::init_logging;
pub use network::{HttpTransport, ResponseData, Transport};
pub use storage::{Clock, DurableStore, ManualClock, RedbStore, SystemClock};
