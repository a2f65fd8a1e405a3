//! 翻译缓存模块
//!
//! 两层缓存：持久化存储优先，进程内映射兜底。每个 `(租户ID, 语言)` 一个条目，
//! 键为 `txr_{tenantId}_{languageCode}`。
//!
//! 在首次成功拉取前租户 ID 未知，此时使用占位值 `default`。获知真实租户 ID 后，
//! 本进程内以占位值写入的条目会迁移到真实键下，并把租户 ID 记录到持久层，
//! 后续进程从一开始就使用真实键。

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::constants;
use crate::network::payload::ResponseData;

use super::clock::Clock;
use super::durable::DurableStore;

/// 缓存条目
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheEntry {
    /// 写入时间（Unix 毫秒）
    pub timestamp: i64,
    pub data: ResponseData,
}

impl CacheEntry {
    /// 条目在 `now` 时刻是否仍在有效期内
    ///
    /// 时间戳在未来（时钟回拨或条目损坏）的条目视为过期。
    pub fn is_fresh(&self, now: i64, ttl: Duration) -> bool {
        let age = now.saturating_sub(self.timestamp);
        if age < 0 {
            return false;
        }
        age < i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
    }
}

/// 缓存统计信息
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub durable_hits: u64,
    pub memory_hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub durable_failures: u64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.durable_hits + self.memory_hits
    }

    /// 计算缓存命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }
}

/// 两层翻译缓存
pub struct CacheStore {
    durable: Option<Box<dyn DurableStore>>,
    memory: RefCell<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Rc<dyn Clock>,
    tenant_slug: String,
    tenant_id: RefCell<String>,
    /// 以占位租户 ID 写入的语言
    placeholder_languages: RefCell<BTreeSet<String>>,
    stats: RefCell<CacheStats>,
}

impl CacheStore {
    pub fn new(
        tenant_slug: &str,
        ttl: Duration,
        durable: Option<Box<dyn DurableStore>>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let mut tenant_id = constants::PLACEHOLDER_TENANT_ID.to_string();

        if let Some(store) = &durable {
            match store.get(&tenant_record_key(tenant_slug)) {
                Ok(Some(remembered)) if !remembered.trim().is_empty() => {
                    tracing::debug!("使用已记录的租户 ID: {}", remembered);
                    tenant_id = remembered;
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("读取租户记录失败: {}", e),
            }
        }

        Self {
            durable,
            memory: RefCell::new(HashMap::new()),
            ttl,
            clock,
            tenant_slug: tenant_slug.to_string(),
            tenant_id: RefCell::new(tenant_id),
            placeholder_languages: RefCell::new(BTreeSet::new()),
            stats: RefCell::new(CacheStats::default()),
        }
    }

    /// 生成缓存键
    pub fn cache_key(&self, language_code: &str) -> String {
        cache_key(&self.tenant_id.borrow(), language_code)
    }

    pub fn tenant_id(&self) -> String {
        self.tenant_id.borrow().clone()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 读取缓存；`ignore_ttl` 为真时返回过期条目
    pub fn get(&self, language_code: &str, ignore_ttl: bool) -> Option<ResponseData> {
        let key = self.cache_key(language_code);
        let now = self.clock.now_millis();
        let usable = |entry: &CacheEntry| ignore_ttl || entry.is_fresh(now, self.ttl);

        if let Some(entry) = self.read_durable(&key) {
            if usable(&entry) {
                self.stats.borrow_mut().durable_hits += 1;
                tracing::debug!("持久缓存命中: {}", key);
                return Some(entry.data);
            }
        }

        if let Some(entry) = self.memory.borrow().get(&key) {
            if usable(entry) {
                self.stats.borrow_mut().memory_hits += 1;
                tracing::debug!("内存缓存命中: {}", key);
                return Some(entry.data.clone());
            }
        }

        self.stats.borrow_mut().misses += 1;
        tracing::debug!("缓存未命中: {} (ignore_ttl={})", key, ignore_ttl);
        None
    }

    /// 写入两层缓存；持久层失败只记录日志
    pub fn put(&self, language_code: &str, data: &ResponseData) {
        let key = self.cache_key(language_code);
        let entry = CacheEntry {
            timestamp: self.clock.now_millis(),
            data: data.clone(),
        };

        self.write_durable(&key, &entry);
        self.memory.borrow_mut().insert(key, entry);
        self.stats.borrow_mut().writes += 1;

        if self.is_placeholder() {
            self.placeholder_languages
                .borrow_mut()
                .insert(language_code.to_string());
        }
    }

    /// 清除某个语言的条目
    pub fn clear(&self, language_code: &str) {
        let key = self.cache_key(language_code);

        if let Some(store) = &self.durable {
            if let Err(e) = store.remove(&key) {
                self.stats.borrow_mut().durable_failures += 1;
                tracing::warn!("删除持久缓存失败 {}: {}", key, e);
            }
        }

        self.memory.borrow_mut().remove(&key);
        tracing::debug!("已清除缓存: {}", key);
    }

    /// 采用服务端提供的租户 ID
    ///
    /// 从占位值切换时迁移占位期写入的条目，并把租户 ID 记录到持久层。
    pub fn adopt_tenant_id(&self, tenant_id: &str) {
        let tenant_id = tenant_id.trim();
        if tenant_id.is_empty() || *self.tenant_id.borrow() == tenant_id {
            return;
        }

        let previous = self.tenant_id.replace(tenant_id.to_string());
        tracing::info!("租户 ID 更新: {} -> {}", previous, tenant_id);

        if previous == constants::PLACEHOLDER_TENANT_ID {
            let languages = std::mem::take(&mut *self.placeholder_languages.borrow_mut());
            for language in languages {
                self.migrate_entry(
                    &cache_key(&previous, &language),
                    &cache_key(tenant_id, &language),
                );
            }
        }

        if let Some(store) = &self.durable {
            if let Err(e) = store.set(&tenant_record_key(&self.tenant_slug), tenant_id) {
                self.stats.borrow_mut().durable_failures += 1;
                tracing::warn!("记录租户 ID 失败: {}", e);
            }
        }
    }

    /// 获取统计信息
    pub fn stats(&self) -> CacheStats {
        *self.stats.borrow()
    }

    fn is_placeholder(&self) -> bool {
        *self.tenant_id.borrow() == constants::PLACEHOLDER_TENANT_ID
    }

    fn migrate_entry(&self, old_key: &str, new_key: &str) {
        if let Some(store) = &self.durable {
            let moved = store.get(old_key).and_then(|raw| match raw {
                Some(raw) => {
                    store.set(new_key, &raw)?;
                    store.remove(old_key)
                }
                None => Ok(()),
            });
            if let Err(e) = moved {
                self.stats.borrow_mut().durable_failures += 1;
                tracing::warn!("迁移持久缓存失败 {} -> {}: {}", old_key, new_key, e);
            }
        }

        let mut memory = self.memory.borrow_mut();
        if let Some(entry) = memory.remove(old_key) {
            memory.insert(new_key.to_string(), entry);
        }
        tracing::debug!("缓存条目迁移: {} -> {}", old_key, new_key);
    }

    fn read_durable(&self, key: &str) -> Option<CacheEntry> {
        let store = self.durable.as_ref()?;

        let raw = match store.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                self.stats.borrow_mut().durable_failures += 1;
                tracing::warn!("读取持久缓存失败 {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("忽略损坏的缓存条目 {}: {}", key, e);
                None
            }
        }
    }

    fn write_durable(&self, key: &str, entry: &CacheEntry) {
        let Some(store) = &self.durable else {
            return;
        };

        let result = serde_json::to_string(entry)
            .map_err(|e| crate::error::TxrError::CacheIo(e.to_string()))
            .and_then(|raw| store.set(key, &raw));

        if let Err(e) = result {
            self.stats.borrow_mut().durable_failures += 1;
            tracing::warn!("写入持久缓存失败 {}: {}", key, e);
        }
    }
}

/// 生成缓存键
pub fn cache_key(tenant_id: &str, language_code: &str) -> String {
    format!(
        "{}_{}_{}",
        constants::CACHE_KEY_PREFIX,
        tenant_id,
        language_code
    )
}

fn tenant_record_key(tenant_slug: &str) -> String {
    format!("{}_tenant_{}", constants::CACHE_KEY_PREFIX, tenant_slug)
}
