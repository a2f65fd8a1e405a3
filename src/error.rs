//! 统一错误处理
//!
//! 提供结构化错误类型、事件错误码和错误处理助手

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// 翻译客户端错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxrError {
    /// 配置错误（构造时立即失败）
    #[error("配置错误: {0}")]
    Config(String),

    /// 服务端返回 HTTP 401
    #[error("认证失败: 令牌或租户无效 (HTTP 401)")]
    Unauthorized,

    /// 其它非 2xx 响应
    #[error("HTTP 错误: 状态码 {status}")]
    Http { status: u16 },

    /// 响应格式错误或 success 为 false
    #[error("协议错误: {0}")]
    Protocol(String),

    /// 网络连接错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 缓存读写错误，始终在本地恢复
    #[error("缓存错误: {0}")]
    CacheIo(String),

    /// 已有加载操作在进行中
    #[error("已有加载操作正在进行")]
    Busy,
}

impl TxrError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TxrError::Network(_) => true,
            TxrError::Http { status } => *status >= 500 || *status == 429,
            TxrError::Busy => true,
            TxrError::CacheIo(_) => true,
            TxrError::Config(_) => false,
            TxrError::Unauthorized => false,
            TxrError::Protocol(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TxrError::Config(_) => ErrorSeverity::Critical,
            TxrError::Unauthorized => ErrorSeverity::Critical,
            TxrError::Http { .. } => ErrorSeverity::Error,
            TxrError::Protocol(_) => ErrorSeverity::Error,
            TxrError::Network(_) => ErrorSeverity::Warning,
            TxrError::CacheIo(_) => ErrorSeverity::Warning,
            TxrError::Busy => ErrorSeverity::Info,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// `error` 事件携带的错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InitFailed,
    LanguageChangeFailed,
    ReloadFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InitFailed => "INIT_FAILED",
            ErrorCode::LanguageChangeFailed => "LANGUAGE_CHANGE_FAILED",
            ErrorCode::ReloadFailed => "RELOAD_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<reqwest::Error> for TxrError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) if status.as_u16() == 401 => TxrError::Unauthorized,
            Some(status) => TxrError::Http {
                status: status.as_u16(),
            },
            None => TxrError::Network(error.to_string()),
        }
    }
}

impl From<toml::de::Error> for TxrError {
    fn from(error: toml::de::Error) -> Self {
        TxrError::Config(format!("TOML解析错误: {}", error))
    }
}

/// 错误结果类型别名
pub type TxrResult<T> = Result<T, TxrError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 日志用的错误描述，可重试的错误带提示
    pub fn describe_error(error: &TxrError) -> String {
        if error.is_retryable() {
            format!("{} (可重试)", error)
        } else {
            error.to_string()
        }
    }

    /// 按严重程度记录错误
    pub fn log_error(error: &TxrError) {
        let message = describe_error(error);
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("{}", message),
            ErrorSeverity::Warning => tracing::warn!("{}", message),
            ErrorSeverity::Error => tracing::error!("{}", message),
            ErrorSeverity::Critical => tracing::error!("严重错误: {}", message),
        }
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TxrError {
        TxrError::Config(msg.to_string())
    }

    /// 创建协议错误
    pub fn protocol_error<T: fmt::Display>(msg: T) -> TxrError {
        TxrError::Protocol(msg.to_string())
    }

    /// 创建缓存错误
    pub fn cache_error<T: fmt::Display>(msg: T) -> TxrError {
        TxrError::CacheIo(msg.to_string())
    }
}
