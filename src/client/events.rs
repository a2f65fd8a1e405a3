//! 事件总线
//!
//! 固定事件集合：`loaded`、`error`、`language-changed`。订阅者按注册顺序同步调用；
//! 单个订阅者 panic 会被捕获并记录，不影响后续订阅者，也不会传播给触发方。

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ErrorCode;

/// 事件名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Loaded,
    Error,
    LanguageChanged,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::Loaded,
        EventKind::Error,
        EventKind::LanguageChanged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Loaded => "loaded",
            EventKind::Error => "error",
            EventKind::LanguageChanged => "language-changed",
        }
    }
}

impl FromStr for EventKind {
    type Err = ();

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or(())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 事件数据
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    Loaded {
        language: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        reloaded: bool,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
    LanguageChanged {
        from: String,
        to: String,
    },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Loaded { .. } => EventKind::Loaded,
            EventPayload::Error { .. } => EventKind::Error,
            EventPayload::LanguageChanged { .. } => EventKind::LanguageChanged,
        }
    }
}

/// 订阅回调；`off` 按 `Rc` 指针身份移除
pub type Listener = Rc<dyn Fn(&EventPayload)>;

/// 事件总线
#[derive(Default)]
pub struct EventBus {
    listeners: RefCell<HashMap<EventKind, Vec<Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按名称订阅；未知事件名被静默忽略，返回是否已注册
    pub fn on(&self, event: &str, listener: Listener) -> bool {
        match event.parse::<EventKind>() {
            Ok(kind) => {
                self.subscribe(kind, listener);
                true
            }
            Err(()) => {
                tracing::debug!("忽略未知事件订阅: {}", event);
                false
            }
        }
    }

    /// 按名称取消订阅，返回是否移除了回调
    pub fn off(&self, event: &str, listener: &Listener) -> bool {
        match event.parse::<EventKind>() {
            Ok(kind) => self.unsubscribe(kind, listener),
            Err(()) => false,
        }
    }

    pub fn subscribe(&self, kind: EventKind, listener: Listener) {
        self.listeners
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(listener);
    }

    pub fn unsubscribe(&self, kind: EventKind, listener: &Listener) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(list) = listeners.get_mut(&kind) else {
            return false;
        };

        match list.iter().position(|item| Rc::ptr_eq(item, listener)) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// 同步分发事件，返回失败的订阅者数量
    pub fn emit(&self, payload: &EventPayload) -> usize {
        let kind = payload.kind();
        // 先复制列表，订阅者可以在回调中 on/off
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        let mut failures = 0;
        for listener in snapshot {
            if let Err(cause) = panic::catch_unwind(AssertUnwindSafe(|| listener(payload))) {
                failures += 1;
                tracing::error!("事件 {} 的订阅者失败: {}", kind, panic_message(&*cause));
            }
        }

        failures
    }
}

fn panic_message(cause: &(dyn Any + Send)) -> String {
    if let Some(message) = cause.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
