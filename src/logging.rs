//! 日志初始化
//!
//! 库内部只使用 `tracing` 宏；宿主可以自行安装订阅者，也可以调用 [`init_logging`]。

use tracing_subscriber::EnvFilter;

use crate::env::{core::LogLevel, EnvVar};

/// 安装 fmt 订阅者，返回本次调用是否完成了安装
///
/// 未指定级别时读取 `TXR_LOG_LEVEL`（默认 `info`）。已有全局订阅者时不做任何事。
pub fn init_logging(level: Option<&str>) -> bool {
    let level = match level {
        Some(level) => level.to_string(),
        None => LogLevel::get().unwrap_or_else(|e| {
            eprintln!("{}", e);
            "info".to_string()
        }),
    };

    let filter = EnvFilter::try_new(format!("txr={}", level))
        .unwrap_or_else(|_| EnvFilter::new("txr=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
