//! 翻译 API 的响应结构
//!
//! ```json
//! { "success": true,
//!   "data": { "tenant_id": "acme-1",
//!             "languages": [ { "code": "en", "resources": [ { "key": "app.welcome", "value": "Welcome!" } ] } ] },
//!   "meta": { "page": 1, "limit": 100, "total": 1 },
//!   "request_id": "req-1" }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::helpers::protocol_error;
use crate::error::TxrResult;

/// 响应外层信封
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<ResponseData>,
    #[serde(default)]
    pub meta: Option<ResponseMeta>,
    #[serde(default)]
    pub request_id: Option<String>,
    /// 失败时服务端给出的说明
    #[serde(default)]
    pub message: Option<String>,
}

/// 单次请求返回的翻译数据，也是缓存条目保存的内容
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ResponseData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub languages: Vec<LanguageBlock>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LanguageBlock {
    pub code: String,
    #[serde(default)]
    pub resources: Vec<ResourceItem>,
}

/// 单条资源；服务端附带的其它字段被忽略
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResourceItem {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ResponseMeta {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl ApiResponse {
    /// 解析响应体
    pub fn from_body(body: &str) -> TxrResult<Self> {
        serde_json::from_str(body).map_err(|e| protocol_error(format!("无法解析响应: {}", e)))
    }

    /// 校验 success 标志并取出数据
    pub fn into_data(self) -> TxrResult<ResponseData> {
        if !self.success {
            let reason = self
                .message
                .unwrap_or_else(|| "服务端返回 success=false".to_string());
            return Err(protocol_error(match self.request_id {
                Some(id) => format!("{} (request_id: {})", reason, id),
                None => reason,
            }));
        }

        self.data
            .ok_or_else(|| protocol_error("响应缺少 data 字段"))
    }
}

impl ResponseData {
    /// 非空的租户 ID
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// 本次响应包含的语言代码
    pub fn language_codes(&self) -> Vec<&str> {
        self.languages.iter().map(|block| block.code.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TxrError;

    #[test]
    fn test_parse_full_envelope() {
        let body = r#"{
            "success": true,
            "data": {
                "tenant_id": "acme-1",
                "languages": [
                    { "code": "en", "resources": [
                        { "key": "app.welcome", "value": "Welcome!", "id": 7, "updated_at": "2024-01-01" }
                    ] }
                ]
            },
            "meta": { "page": 1, "limit": 100, "total": 1 },
            "request_id": "req-1"
        }"#;

        let response = ApiResponse::from_body(body).unwrap();
        assert_eq!(response.request_id.as_deref(), Some("req-1"));
        assert_eq!(response.meta.as_ref().and_then(|m| m.total), Some(1));

        let data = response.into_data().unwrap();
        assert_eq!(data.tenant_id(), Some("acme-1"));
        assert_eq!(data.language_codes(), vec!["en"]);
        assert_eq!(data.languages[0].resources[0].value, "Welcome!");
    }

    #[test]
    fn test_success_false_is_protocol_error() {
        let response =
            ApiResponse::from_body(r#"{"success": false, "message": "tenant disabled"}"#).unwrap();
        match response.into_data() {
            Err(TxrError::Protocol(msg)) => assert!(msg.contains("tenant disabled")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_data_and_malformed_body() {
        let response = ApiResponse::from_body(r#"{"success": true}"#).unwrap();
        assert!(matches!(response.into_data(), Err(TxrError::Protocol(_))));

        assert!(matches!(
            ApiResponse::from_body("<html>bad gateway</html>"),
            Err(TxrError::Protocol(_))
        ));
    }

    #[test]
    fn test_blank_tenant_id_is_ignored() {
        let data = ResponseData {
            tenant_id: Some("  ".to_string()),
            languages: vec![],
        };
        assert_eq!(data.tenant_id(), None);
    }
}
