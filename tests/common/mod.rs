// 集成测试公共模块
//
// 提供模拟传输、可检查的持久层、测试数据和事件记录器

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use txr::client::{EventPayload, Listener, TranslationClient};
use txr::config::ClientConfig;
use txr::error::{TxrError, TxrResult};
use txr::network::{LanguageBlock, ResourceItem, ResponseData, Transport};
use txr::storage::{DurableStore, ManualClock};

/// 测试租户
pub const TOKEN: &str = "t1";
pub const TENANT_SLUG: &str = "acme";
pub const TENANT_ID: &str = "acme-1";

/// 模拟传输：按语言排队的响应，并记录每次请求
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Rc<RefCell<HashMap<String, VecDeque<TxrResult<ResponseData>>>>>,
    requests: Rc<RefCell<Vec<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为某个语言追加一次响应
    pub fn respond(&self, language_code: &str, response: TxrResult<ResponseData>) -> &Self {
        self.responses
            .borrow_mut()
            .entry(language_code.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Transport for MockTransport {
    async fn fetch_language(&self, language_code: &str) -> TxrResult<ResponseData> {
        self.requests.borrow_mut().push(language_code.to_string());
        // 让出一次，模拟网络等待，便于测试并发调用
        tokio::task::yield_now().await;

        self.responses
            .borrow_mut()
            .get_mut(language_code)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(TxrError::Network("connection refused".to_string())))
    }
}

/// 共享的内存持久层，测试可以直接检查其中的条目
#[derive(Clone, Default)]
pub struct MapStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MapStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl DurableStore for MapStore {
    fn get(&self, key: &str) -> TxrResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> TxrResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> TxrResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// 所有操作都失败的持久层（例如存储配额已满）
pub struct FailingStore;

impl DurableStore for FailingStore {
    fn get(&self, _key: &str) -> TxrResult<Option<String>> {
        Err(TxrError::CacheIo("storage unavailable".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> TxrResult<()> {
        Err(TxrError::CacheIo("quota exceeded".to_string()))
    }

    fn remove(&self, _key: &str) -> TxrResult<()> {
        Err(TxrError::CacheIo("storage unavailable".to_string()))
    }
}

/// 测试数据生成器
pub struct Fixtures;

impl Fixtures {
    pub fn config() -> ClientConfig {
        ClientConfig::new(TOKEN, TENANT_SLUG).expect("valid test config")
    }

    pub fn language(code: &str, pairs: &[(&str, &str)]) -> LanguageBlock {
        LanguageBlock {
            code: code.to_string(),
            resources: pairs
                .iter()
                .map(|(key, value)| ResourceItem {
                    key: key.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }

    /// 单语言响应
    pub fn payload(code: &str, pairs: &[(&str, &str)]) -> ResponseData {
        ResponseData {
            tenant_id: Some(TENANT_ID.to_string()),
            languages: vec![Self::language(code, pairs)],
        }
    }

    pub fn english() -> ResponseData {
        Self::payload(
            "en",
            &[
                ("app.welcome", "Welcome!"),
                ("app.title", "Title"),
                ("only.en", "English only"),
            ],
        )
    }

    pub fn turkish() -> ResponseData {
        Self::payload(
            "tr",
            &[("app.welcome", "Hoş geldiniz!"), ("app.title", "Başlık")],
        )
    }
}

/// 组装客户端
pub fn client_with(
    config: ClientConfig,
    transport: &MockTransport,
    durable: Option<Box<dyn DurableStore>>,
    clock: &Rc<ManualClock>,
) -> TranslationClient<MockTransport> {
    TranslationClient::with_parts(config, transport.clone(), durable, clock.clone())
        .expect("client construction")
}

/// 默认配置、仅内存缓存的客户端
pub fn client(transport: &MockTransport) -> TranslationClient<MockTransport> {
    client_with(
        Fixtures::config(),
        transport,
        None,
        &Rc::new(ManualClock::new(0)),
    )
}

/// 记录收到的事件
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<EventPayload>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener(&self) -> Listener {
        let events = self.events.clone();
        Rc::new(move |payload: &EventPayload| events.borrow_mut().push(payload.clone()))
    }

    /// 订阅全部事件
    pub fn attach(&self, client: &TranslationClient<MockTransport>) {
        for event in ["loaded", "error", "language-changed"] {
            client.on(event, self.listener());
        }
    }

    pub fn events(&self) -> Vec<EventPayload> {
        self.events.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.events.borrow().len()
    }
}
