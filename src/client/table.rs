//! 翻译表与键解析
//!
//! 翻译表只通过合并服务端响应构建；扫描器和解析器只读。

use std::collections::{BTreeMap, HashMap};

use crate::network::payload::ResponseData;

/// 语言代码 -> (键 -> 值)
#[derive(Debug, Default, Clone)]
pub struct TranslationTable {
    languages: BTreeMap<String, HashMap<String, String>>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并响应数据，返回写入的语言数
    ///
    /// 每个语言块整体替换该语言的旧表，不影响响应中未出现的语言。
    pub fn merge(&mut self, data: &ResponseData) -> usize {
        for block in &data.languages {
            let entries: HashMap<String, String> = block
                .resources
                .iter()
                .map(|item| (item.key.clone(), item.value.clone()))
                .collect();

            tracing::debug!("合并语言 {}: {} 个键", block.code, entries.len());
            self.languages.insert(block.code.clone(), entries);
        }

        data.languages.len()
    }

    pub fn get(&self, language_code: &str, key: &str) -> Option<&str> {
        self.languages
            .get(language_code)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    pub fn contains_key(&self, language_code: &str, key: &str) -> bool {
        self.get(language_code, key).is_some()
    }

    pub fn language(&self, language_code: &str) -> Option<&HashMap<String, String>> {
        self.languages.get(language_code)
    }

    /// 已加载的语言代码（按字母顺序）
    pub fn languages(&self) -> Vec<String> {
        self.languages.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    /// 解析键：指定语言 -> 回退语言 -> 键本身
    pub fn resolve(&self, key: &str, language_code: &str, fallback_language: &str) -> String {
        if let Some(value) = self.get(language_code, key) {
            return value.to_string();
        }

        if language_code != fallback_language {
            if let Some(value) = self.get(fallback_language, key) {
                tracing::trace!("键 '{}' 使用回退语言 {}", key, fallback_language);
                return value.to_string();
            }
        }

        tracing::trace!("缺少翻译键 '{}'，返回键本身", key);
        key.to_string()
    }
}
