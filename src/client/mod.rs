//! # 客户端模块
//!
//! - `engine` - 生命周期编排与公开操作
//! - `events` - 事件总线
//! - `table` - 翻译表与键解析

pub mod engine;
pub mod events;
pub mod table;

pub use engine::{ClientState, TranslationClient};
pub use events::{EventBus, EventKind, EventPayload, Listener};
pub use table::TranslationTable;
