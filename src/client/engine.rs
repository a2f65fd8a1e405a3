//! 翻译客户端引擎
//!
//! 持有配置与生命周期状态，把缓存、传输、翻译表、扫描器和事件总线编排成公开操作：
//! `init`、`t`、`set_language`、`reload`、`scan`。
//!
//! 引擎是单线程的（内部使用 `Cell`/`RefCell`），宿主通过 `Rc` 共享同一个实例。
//! 同一时刻只允许一个加载操作：加载中再次 `init` 直接返回，`set_language` 返回
//! [`TxrError::Busy`]，`reload` 记录日志后返回。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::ClientConfig;
use crate::dom::{Document, ScanReport, Scanner};
use crate::error::{helpers, ErrorCode, TxrError, TxrResult};
use crate::network::payload::ResponseData;
use crate::network::transport::{HttpTransport, Transport};
use crate::storage::{CacheStats, CacheStore, Clock, DurableStore, RedbStore, SystemClock};

use super::events::{EventBus, EventPayload, Listener};
use super::table::TranslationTable;

/// 引擎生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Uninitialized,
    Loading,
    Ready,
}

/// 翻译客户端
pub struct TranslationClient<T: Transport = HttpTransport> {
    config: ClientConfig,
    transport: T,
    cache: Option<CacheStore>,
    table: RefCell<TranslationTable>,
    events: EventBus,
    initialized: Cell<bool>,
    loading: Cell<bool>,
    current_language: RefCell<String>,
    document: RefCell<Option<Document>>,
}

impl TranslationClient<HttpTransport> {
    /// 使用 HTTP 传输创建客户端
    ///
    /// 配置了 `cache_path` 时持久缓存层使用该路径下的 redb 数据库；打开失败只记录
    /// 警告，客户端退回到进程内缓存。
    pub fn new(config: ClientConfig) -> TxrResult<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;

        let durable: Option<Box<dyn DurableStore>> = match (&config.cache_path, config.cache_enabled) {
            (Some(path), true) => match RedbStore::open(path) {
                Ok(store) => Some(Box::new(store)),
                Err(e) => {
                    tracing::warn!("无法打开持久缓存 {}: {}，仅使用内存缓存", path.display(), e);
                    None
                }
            },
            _ => None,
        };

        Self::with_parts(config, transport, durable, Rc::new(SystemClock))
    }
}

impl<T: Transport> TranslationClient<T> {
    /// 使用自定义传输创建客户端（仅进程内缓存）
    pub fn with_transport(config: ClientConfig, transport: T) -> TxrResult<Self> {
        Self::with_parts(config, transport, None, Rc::new(SystemClock))
    }

    /// 指定全部协作者创建客户端
    pub fn with_parts(
        config: ClientConfig,
        transport: T,
        durable: Option<Box<dyn DurableStore>>,
        clock: Rc<dyn Clock>,
    ) -> TxrResult<Self> {
        config.validate()?;

        let cache = config.cache_enabled.then(|| {
            CacheStore::new(&config.tenant_slug, config.cache_ttl, durable, clock)
        });

        tracing::debug!("创建翻译客户端: {:?}", config);

        Ok(Self {
            current_language: RefCell::new(config.language.clone()),
            config,
            transport,
            cache,
            table: RefCell::new(TranslationTable::new()),
            events: EventBus::new(),
            initialized: Cell::new(false),
            loading: Cell::new(false),
            document: RefCell::new(None),
        })
    }

    /// 首次加载当前语言
    ///
    /// 失败不会返回给调用方，只通过 `error` 事件（`INIT_FAILED`）和 [`is_ready`]
    /// 观察。加载中或已就绪时直接返回。
    ///
    /// [`is_ready`]: Self::is_ready
    pub async fn init(&self) {
        if self.loading.get() {
            tracing::debug!("init 已在进行中，忽略");
            return;
        }
        if self.initialized.get() {
            tracing::debug!("客户端已就绪，忽略 init");
            return;
        }

        let language = self.language();
        tracing::info!("初始化翻译客户端: {} ({})", self.config.tenant_slug, language);

        let result = {
            let _guard = LoadingGuard::new(&self.loading);
            self.load_language(&language).await
        };

        match result {
            Ok(()) => {
                self.initialized.set(true);
                if self.config.auto_scan {
                    self.scan();
                }
                self.emit(EventPayload::Loaded {
                    language,
                    reloaded: false,
                });
            }
            Err(e) => {
                helpers::log_error(&e);
                self.emit(EventPayload::Error {
                    code: ErrorCode::InitFailed,
                    message: e.to_string(),
                });
            }
        }
    }

    /// 切换当前语言
    ///
    /// 失败时回滚到原语言，触发 `error` 事件（`LANGUAGE_CHANGE_FAILED`）并返回错误。
    pub async fn set_language(&self, language_code: &str) -> TxrResult<()> {
        let language_code = language_code.trim();
        if language_code.is_empty() {
            return Err(helpers::config_error("语言代码不能为空"));
        }
        if *self.current_language.borrow() == language_code {
            return Ok(());
        }
        if self.loading.get() {
            tracing::warn!("加载进行中，拒绝切换到 {}", language_code);
            return Err(TxrError::Busy);
        }

        let previous = self.current_language.replace(language_code.to_string());
        tracing::info!("切换语言: {} -> {}", previous, language_code);

        let result = {
            let _guard = LoadingGuard::new(&self.loading);
            self.load_language(language_code).await
        };

        match result {
            Ok(()) => {
                self.scan();
                self.emit(EventPayload::LanguageChanged {
                    from: previous,
                    to: language_code.to_string(),
                });
                Ok(())
            }
            Err(e) => {
                self.current_language.replace(previous);
                helpers::log_error(&e);
                self.emit(EventPayload::Error {
                    code: ErrorCode::LanguageChangeFailed,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// 清除当前语言的缓存后重新拉取
    ///
    /// 失败通过 `error` 事件（`RELOAD_FAILED`）报告，不返回给调用方。
    pub async fn reload(&self) {
        if self.loading.get() {
            tracing::warn!("加载进行中，忽略 reload");
            return;
        }

        let language = self.language();
        tracing::info!("重新加载语言: {}", language);

        let result = {
            let _guard = LoadingGuard::new(&self.loading);
            if let Some(cache) = &self.cache {
                cache.clear(&language);
            }
            self.load_language(&language).await
        };

        match result {
            Ok(()) => {
                self.initialized.set(true);
                self.scan();
                self.emit(EventPayload::Loaded {
                    language,
                    reloaded: true,
                });
            }
            Err(e) => {
                helpers::log_error(&e);
                self.emit(EventPayload::Error {
                    code: ErrorCode::ReloadFailed,
                    message: e.to_string(),
                });
            }
        }
    }

    /// 扫描已挂载的文档；未就绪或没有文档时不做任何事
    pub fn scan(&self) -> ScanReport {
        if !self.initialized.get() {
            tracing::debug!("客户端未就绪，跳过扫描");
            return ScanReport::default();
        }

        let document = self.document.borrow();
        let Some(document) = document.as_ref() else {
            return ScanReport::default();
        };

        let table = self.table.borrow();
        let language = self.current_language.borrow();
        let scanner = Scanner::new(&table, &language, &self.config.fallback_language);
        scanner.scan(document)
    }

    /// 按当前语言解析键
    pub fn t(&self, key: &str) -> String {
        let language = self.current_language.borrow();
        self.t_with(key, &language)
    }

    /// 按指定语言解析键
    pub fn t_with(&self, key: &str, language_code: &str) -> String {
        self.table
            .borrow()
            .resolve(key, language_code, &self.config.fallback_language)
    }

    pub fn language(&self) -> String {
        self.current_language.borrow().clone()
    }

    /// 已加载的语言代码（按字母顺序）
    pub fn available_languages(&self) -> Vec<String> {
        self.table.borrow().languages()
    }

    pub fn is_ready(&self) -> bool {
        self.initialized.get()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn state(&self) -> ClientState {
        if self.loading.get() {
            ClientState::Loading
        } else if self.initialized.get() {
            ClientState::Ready
        } else {
            ClientState::Uninitialized
        }
    }

    /// 订阅事件；未知事件名被忽略
    pub fn on(&self, event: &str, listener: Listener) -> bool {
        self.events.on(event, listener)
    }

    pub fn off(&self, event: &str, listener: &Listener) -> bool {
        self.events.off(event, listener)
    }

    /// 挂载宿主文档
    ///
    /// 客户端已就绪且开启 `auto_scan` 时立即扫描，补上 init 时因没有文档而推迟的扫描。
    pub fn attach_document(&self, document: Document) -> ScanReport {
        self.document.replace(Some(document));
        if self.config.auto_scan && self.initialized.get() {
            self.scan()
        } else {
            ScanReport::default()
        }
    }

    pub fn detach_document(&self) -> Option<Document> {
        self.document.take()
    }

    /// 已挂载文档的句柄（与客户端共享同一棵树）
    pub fn document(&self) -> Option<Document> {
        self.document.borrow().clone()
    }

    /// 某个语言的翻译表副本
    pub fn translations(&self, language_code: &str) -> Option<HashMap<String, String>> {
        self.table.borrow().language(language_code).cloned()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(CacheStore::stats)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 缓存 -> 网络 -> 过期缓存
    async fn load_language(&self, language_code: &str) -> TxrResult<()> {
        if let Some(cache) = &self.cache {
            if let Some(data) = cache.get(language_code, false) {
                self.merge(&data);
                return Ok(());
            }
        }

        match self.transport.fetch_language(language_code).await {
            Ok(data) => {
                if let Some(cache) = &self.cache {
                    if let Some(tenant_id) = data.tenant_id() {
                        cache.adopt_tenant_id(tenant_id);
                    }
                    cache.put(language_code, &data);
                }
                self.merge(&data);
                Ok(())
            }
            Err(e) => {
                let stale = self
                    .cache
                    .as_ref()
                    .and_then(|cache| cache.get(language_code, true));

                match stale {
                    Some(data) => {
                        tracing::warn!("拉取 {} 失败 ({})，使用过期缓存", language_code, e);
                        self.merge(&data);
                        Ok(())
                    }
                    None => Err(e),
                }
            }
        }
    }

    fn merge(&self, data: &ResponseData) {
        let merged = self.table.borrow_mut().merge(data);
        tracing::debug!("已合并 {} 个语言块", merged);
    }

    fn emit(&self, payload: EventPayload) {
        let failures = self.events.emit(&payload);
        if failures > 0 {
            tracing::warn!("{} 个 {} 订阅者执行失败", failures, payload.kind());
        }
    }
}

/// 加载标志守卫，离开作用域时（包括 future 被丢弃）清除标志
struct LoadingGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> LoadingGuard<'a> {
    fn new(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
