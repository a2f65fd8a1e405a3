//! 传输层
//!
//! 负责带认证头的翻译拉取请求以及响应信封校验。缓存由调用方编排，传输层只发请求。

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::config::ClientConfig;
use crate::error::helpers::config_error;
use crate::error::{TxrError, TxrResult};

use super::payload::{ApiResponse, ResponseData};

pub const HEADER_TENANT_SLUG: &str = "X-Tenant-Slug";
pub const HEADER_API_KEY: &str = "X-API-Key";
pub const QUERY_LANGUAGE_CODE: &str = "language_code";

/// 按语言拉取翻译数据
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn fetch_language(&self, language_code: &str) -> TxrResult<ResponseData>;
}

/// 基于 reqwest 的 HTTP 传输
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    api_url: String,
    tenant_slug: String,
    token: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> TxrResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| config_error(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            tenant_slug: config.tenant_slug.clone(),
            token: config.token.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl Transport for HttpTransport {
    async fn fetch_language(&self, language_code: &str) -> TxrResult<ResponseData> {
        tracing::debug!("请求翻译数据: {} ({})", language_code, self.api_url);

        let response = self
            .client
            .get(&self.api_url)
            .query(&[(QUERY_LANGUAGE_CODE, language_code)])
            .header(HEADER_TENANT_SLUG, &self.tenant_slug)
            .header(HEADER_API_KEY, &self.token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        // 4xx/5xx 经 From<reqwest::Error> 映射为 Unauthorized 或 Http
        let status = response.status();
        let response = response.error_for_status()?;
        if !status.is_success() {
            return Err(TxrError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;

        let data = ApiResponse::from_body(&body)?.into_data()?;
        tracing::debug!(
            "收到 {} 个语言块: {:?}",
            data.languages.len(),
            data.language_codes()
        );
        Ok(data)
    }
}
