//! 客户端配置模块
//!
//! 提供配置构建、文件加载、环境变量加载和验证功能。
//! 所有构建路径都会调用 [`ClientConfig::validate`]，缺少令牌或租户时立即失败。

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::env::{cache, client, EnvVar};
use crate::error::{TxrError, TxrResult};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    pub const DEFAULT_LANGUAGE: &str = "en";
    pub const DEFAULT_API_URL: &str = "https://api.txr.dev/v1/translations";
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(300_000);
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    /// 缓存 TTL 上限（7 天）
    pub const MAX_CACHE_TTL: Duration = Duration::from_millis(7 * 86_400_000);

    /// 缓存键前缀，完整键为 `txr_{tenantId}_{languageCode}`
    pub const CACHE_KEY_PREFIX: &str = "txr";
    /// 尚未获知真实租户 ID 时使用的占位值
    pub const PLACEHOLDER_TENANT_ID: &str = "default";

    pub const CONFIG_PATHS: &[&str] = &["txr.toml", ".txr.toml", "config/txr.toml"];
}

/// 翻译客户端配置（构造后不可变）
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub token: String,
    pub tenant_slug: String,
    pub language: String,
    pub api_url: String,
    pub cache_enabled: bool,
    #[serde(with = "millis_serde", rename = "cache_ttl_ms")]
    pub cache_ttl: Duration,
    pub fallback_language: String,
    pub auto_scan: bool,
    /// 持久缓存数据库路径；未设置时仅使用进程内缓存
    pub cache_path: Option<PathBuf>,
    #[serde(with = "secs_serde", rename = "request_timeout_secs")]
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            tenant_slug: String::new(),
            language: constants::DEFAULT_LANGUAGE.to_string(),
            api_url: constants::DEFAULT_API_URL.to_string(),
            cache_enabled: true,
            cache_ttl: constants::DEFAULT_CACHE_TTL,
            fallback_language: constants::DEFAULT_LANGUAGE.to_string(),
            auto_scan: true,
            cache_path: None,
            request_timeout: constants::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"[redacted]")
            .field("tenant_slug", &self.tenant_slug)
            .field("language", &self.language)
            .field("api_url", &self.api_url)
            .field("cache_enabled", &self.cache_enabled)
            .field("cache_ttl", &self.cache_ttl)
            .field("fallback_language", &self.fallback_language)
            .field("auto_scan", &self.auto_scan)
            .field("cache_path", &self.cache_path)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ClientConfig {
    /// 创建配置构建器
    pub fn builder(token: impl Into<String>, tenant_slug: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(token, tenant_slug)
    }

    /// 使用默认值创建配置
    pub fn new(token: impl Into<String>, tenant_slug: impl Into<String>) -> TxrResult<Self> {
        Self::builder(token, tenant_slug).build()
    }

    /// 从 TOML 字符串加载
    pub fn from_toml_str(content: &str) -> TxrResult<Self> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> TxrResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TxrError::Config(format!("无法读取配置文件 {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!("从文件加载配置: {}", path.display());
        Ok(config)
    }

    /// 在默认路径中查找配置文件
    pub fn discover() -> TxrResult<Option<Self>> {
        for candidate in constants::CONFIG_PATHS {
            if Path::new(candidate).exists() {
                return Self::from_file(candidate).map(Some);
            }
        }
        Ok(None)
    }

    /// 从环境变量加载（先读取 `.env` 文件）
    pub fn from_env() -> TxrResult<Self> {
        dotenv::dotenv().ok();

        let env_err = |e: crate::env::EnvError| TxrError::Config(e.to_string());

        let config = Self {
            token: client::Token::get().map_err(env_err)?,
            tenant_slug: client::TenantSlug::get().map_err(env_err)?,
            language: client::Language::get().map_err(env_err)?,
            api_url: client::ApiUrl::get().map_err(env_err)?,
            cache_enabled: cache::Enabled::get().map_err(env_err)?,
            cache_ttl: cache::TtlMs::get().map_err(env_err)?,
            fallback_language: client::FallbackLanguage::get().map_err(env_err)?,
            auto_scan: client::AutoScan::get().map_err(env_err)?,
            cache_path: if cache::Path::is_set() {
                Some(PathBuf::from(cache::Path::get().map_err(env_err)?))
            } else {
                None
            },
            request_timeout: client::RequestTimeout::get().map_err(env_err)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// 验证配置
    pub fn validate(&self) -> TxrResult<()> {
        if self.token.trim().is_empty() {
            return Err(TxrError::Config("缺少 token".to_string()));
        }

        if self.tenant_slug.trim().is_empty() {
            return Err(TxrError::Config("缺少 tenant_slug".to_string()));
        }

        if self.language.trim().is_empty() {
            return Err(TxrError::Config("language 不能为空".to_string()));
        }

        if self.fallback_language.trim().is_empty() {
            return Err(TxrError::Config("fallback_language 不能为空".to_string()));
        }

        if self.cache_ttl.is_zero() || self.cache_ttl > constants::MAX_CACHE_TTL {
            return Err(TxrError::Config(format!(
                "cache_ttl 必须在 1 到 {} 毫秒之间: {} 毫秒",
                constants::MAX_CACHE_TTL.as_millis(),
                self.cache_ttl.as_millis()
            )));
        }

        let url = Url::parse(&self.api_url)
            .map_err(|e| TxrError::Config(format!("api_url 无效 '{}': {}", self.api_url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(TxrError::Config(format!(
                "api_url 必须使用 http 或 https: {}",
                self.api_url
            )));
        }

        Ok(())
    }
}

/// 配置构建器
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new(token: impl Into<String>, tenant_slug: impl Into<String>) -> Self {
        Self {
            config: ClientConfig {
                token: token.into(),
                tenant_slug: tenant_slug.into(),
                ..ClientConfig::default()
            },
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.config.api_url = api_url.into();
        self
    }

    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.config.cache_enabled = enabled;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    pub fn fallback_language(mut self, language: impl Into<String>) -> Self {
        self.config.fallback_language = language.into();
        self
    }

    pub fn auto_scan(mut self, auto_scan: bool) -> Self {
        self.config.auto_scan = auto_scan;
        self
    }

    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_path = Some(path.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn build(self) -> TxrResult<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// 以毫秒序列化的 Duration
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// 以秒序列化的 Duration
mod secs_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("t1", "acme").unwrap();
        assert_eq!(config.language, "en");
        assert_eq!(config.fallback_language, "en");
        assert_eq!(config.api_url, constants::DEFAULT_API_URL);
        assert!(config.cache_enabled);
        assert_eq!(config.cache_ttl, Duration::from_millis(300_000));
        assert!(config.auto_scan);
        assert!(config.cache_path.is_none());
    }

    #[test]
    fn test_missing_credentials_fail_fast() {
        assert!(matches!(
            ClientConfig::new("", "acme"),
            Err(TxrError::Config(_))
        ));
        assert!(matches!(
            ClientConfig::new("t1", "  "),
            Err(TxrError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_api_url() {
        let result = ClientConfig::builder("t1", "acme")
            .api_url("ftp://example.com/strings")
            .build();
        assert!(matches!(result, Err(TxrError::Config(_))));

        let result = ClientConfig::builder("t1", "acme").api_url("nope").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::builder("t1", "acme")
            .language("tr")
            .fallback_language("de")
            .cache_enabled(false)
            .cache_ttl(Duration::from_millis(1000))
            .auto_scan(false)
            .build()
            .unwrap();

        assert_eq!(config.language, "tr");
        assert_eq!(config.fallback_language, "de");
        assert!(!config.cache_enabled);
        assert_eq!(config.cache_ttl, Duration::from_secs(1));
        assert!(!config.auto_scan);
    }

    #[test]
    fn test_from_toml_str() {
        let config = ClientConfig::from_toml_str(
            r#"
            token = "t1"
            tenant_slug = "acme"
            language = "tr"
            cache_ttl_ms = 60000
            "#,
        )
        .unwrap();

        assert_eq!(config.tenant_slug, "acme");
        assert_eq!(config.language, "tr");
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.fallback_language, "en");
        assert_eq!(config.request_timeout, constants::DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_cache_ttl_bounds() {
        let result = ClientConfig::from_toml_str(
            r#"
            token = "t1"
            tenant_slug = "acme"
            cache_ttl_ms = 18446744073709551615
            "#,
        );
        assert!(matches!(result, Err(TxrError::Config(_))));

        let zero = ClientConfig::builder("t1", "acme")
            .cache_ttl(Duration::ZERO)
            .build();
        assert!(matches!(zero, Err(TxrError::Config(_))));

        let max = ClientConfig::builder("t1", "acme")
            .cache_ttl(constants::MAX_CACHE_TTL)
            .build()
            .unwrap();
        assert_eq!(max.cache_ttl, constants::MAX_CACHE_TTL);
    }

    #[test]
    fn test_from_toml_str_requires_token() {
        let result = ClientConfig::from_toml_str("tenant_slug = \"acme\"");
        assert!(matches!(result, Err(TxrError::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("txr.toml");
        fs::write(&path, "token = \"t1\"\ntenant_slug = \"acme\"\nauto_scan = false\n").unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert!(!config.auto_scan);

        assert!(ClientConfig::from_file(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::new("super-secret", "acme").unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("acme"));
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("TXR_TOKEN", "env-token");
        std::env::set_var("TXR_TENANT_SLUG", "env-tenant");
        std::env::set_var("TXR_CACHE_TTL_MS", "2000");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.token, "env-token");
        assert_eq!(config.tenant_slug, "env-tenant");
        assert_eq!(config.cache_ttl, Duration::from_secs(2));

        std::env::remove_var("TXR_TOKEN");
        std::env::remove_var("TXR_TENANT_SLUG");
        std::env::remove_var("TXR_CACHE_TTL_MS");
    }
}
