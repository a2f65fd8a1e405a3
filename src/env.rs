//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问，供 `ClientConfig::from_env` 使用

use std::env;
use std::fmt;
use std::time::Duration;

use crate::config::constants;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }

    /// 变量是否已设置
    fn is_set() -> bool {
        env::var(Self::NAME).is_ok()
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "TXR_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.trim().to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.trim().to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 客户端相关环境变量
pub mod client {
    use super::*;

    /// API 令牌
    pub struct Token;
    impl EnvVar<String> for Token {
        const NAME: &'static str = "TXR_TOKEN";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "API token sent as X-API-Key (required)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    /// 租户标识
    pub struct TenantSlug;
    impl EnvVar<String> for TenantSlug {
        const NAME: &'static str = "TXR_TENANT_SLUG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Tenant slug sent as X-Tenant-Slug (required)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    /// 初始语言
    pub struct Language;
    impl EnvVar<String> for Language {
        const NAME: &'static str = "TXR_LANGUAGE";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(constants::DEFAULT_LANGUAGE.to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Initial language code";

        fn parse(value: &str) -> EnvResult<String> {
            parse_language_code(value, Self::NAME)
        }
    }

    /// 回退语言
    pub struct FallbackLanguage;
    impl EnvVar<String> for FallbackLanguage {
        const NAME: &'static str = "TXR_FALLBACK_LANGUAGE";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(constants::DEFAULT_LANGUAGE.to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Language consulted when a key is missing";

        fn parse(value: &str) -> EnvResult<String> {
            parse_language_code(value, Self::NAME)
        }
    }

    /// API URL
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "TXR_API_URL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(constants::DEFAULT_API_URL.to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Translation API endpoint URL";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// 自动扫描文档
    pub struct AutoScan;
    impl EnvVar<bool> for AutoScan {
        const NAME: &'static str = "TXR_AUTO_SCAN";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Scan the attached document after init";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "TXR_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(constants::DEFAULT_REQUEST_TIMEOUT);
        const DESCRIPTION: &'static str = "HTTP request timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds = parse_bounded_u64(value, Self::NAME, 1, 300)?;
            Ok(Duration::from_secs(seconds))
        }
    }
}

/// 缓存相关环境变量
pub mod cache {
    use super::*;

    /// 缓存启用状态
    pub struct Enabled;
    impl EnvVar<bool> for Enabled {
        const NAME: &'static str = "TXR_CACHE_ENABLED";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Enable caching of fetched translations";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 缓存TTL（毫秒）
    pub struct TtlMs;
    impl EnvVar<Duration> for TtlMs {
        const NAME: &'static str = "TXR_CACHE_TTL_MS";
        const DEFAULT: Option<Duration> = Some(constants::DEFAULT_CACHE_TTL);
        const DESCRIPTION: &'static str = "Cache TTL in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let max = constants::MAX_CACHE_TTL.as_millis() as u64;
            let millis = parse_bounded_u64(value, Self::NAME, 1, max)?;
            Ok(Duration::from_millis(millis))
        }
    }

    /// 持久缓存路径
    pub struct Path;
    impl EnvVar<String> for Path {
        const NAME: &'static str = "TXR_CACHE_PATH";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Path of the on-disk cache database (optional)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_bounded_u64(value: &str, var_name: &str, min: u64, max: u64) -> EnvResult<u64> {
    let num: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn parse_non_empty(value: &str, var_name: &str) -> EnvResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: "Value cannot be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_language_code(value: &str, var_name: &str) -> EnvResult<String> {
    let code = value.trim();
    let valid = !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Invalid language code '{}'", value),
        });
    }
    Ok(code.to_string())
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: \"info\")\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION
    ));

    docs.push_str("\n## Client Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {}\n",
        client::Token::NAME,
        client::Token::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {}\n",
        client::TenantSlug::NAME,
        client::TenantSlug::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        client::Language::NAME,
        client::Language::DESCRIPTION,
        constants::DEFAULT_LANGUAGE
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        client::FallbackLanguage::NAME,
        client::FallbackLanguage::DESCRIPTION,
        constants::DEFAULT_LANGUAGE
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        client::ApiUrl::NAME,
        client::ApiUrl::DESCRIPTION,
        constants::DEFAULT_API_URL
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        client::AutoScan::NAME,
        client::AutoScan::DESCRIPTION,
        client::AutoScan::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        client::RequestTimeout::NAME,
        client::RequestTimeout::DESCRIPTION,
        client::RequestTimeout::DEFAULT
    ));

    docs.push_str("\n## Cache Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        cache::Enabled::NAME,
        cache::Enabled::DESCRIPTION,
        cache::Enabled::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        cache::TtlMs::NAME,
        cache::TtlMs::DESCRIPTION,
        cache::TtlMs::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {}\n",
        cache::Path::NAME,
        cache::Path::DESCRIPTION
    ));

    docs
}
