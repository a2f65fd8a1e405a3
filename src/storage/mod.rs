//! # 存储模块
//!
//! - `cache` - 两层翻译缓存（持久层 + 进程内映射）
//! - `durable` - 持久化键值存储接口及 redb 实现
//! - `clock` - 缓存时间戳使用的时间源

pub mod cache;
pub mod clock;
pub mod durable;

pub use cache::{CacheEntry, CacheStats, CacheStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use durable::{DurableStore, RedbStore};
