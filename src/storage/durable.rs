//! 持久化键值存储
//!
//! 缓存的第一层。`RedbStore` 将条目保存在 redb 数据库的单张表中。

use std::path::Path;

use redb::backends::InMemoryBackend;
use redb::{Database, ReadableTable, TableDefinition, TableError};

use crate::error::helpers::cache_error;
use crate::error::TxrResult;

const CACHE_TABLE: TableDefinition<&str, &str> = TableDefinition::new("txr_cache");

/// 持久化字符串键值存储
pub trait DurableStore {
    fn get(&self, key: &str) -> TxrResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> TxrResult<()>;
    fn remove(&self, key: &str) -> TxrResult<()>;
}

/// 基于 redb 的持久化存储
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// 打开（或创建）磁盘上的数据库
    pub fn open<P: AsRef<Path>>(path: P) -> TxrResult<Self> {
        let db = Database::create(path.as_ref()).map_err(cache_error)?;
        tracing::debug!("打开持久缓存: {}", path.as_ref().display());
        Ok(Self { db })
    }

    /// 创建仅驻留内存的数据库
    pub fn in_memory() -> TxrResult<Self> {
        let db = Database::builder()
            .create_with_backend(InMemoryBackend::new())
            .map_err(cache_error)?;
        Ok(Self { db })
    }
}

impl DurableStore for RedbStore {
    fn get(&self, key: &str) -> TxrResult<Option<String>> {
        let txn = self.db.begin_read().map_err(cache_error)?;
        let table = match txn.open_table(CACHE_TABLE) {
            Ok(table) => table,
            // 尚未写入过任何条目
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(cache_error(e)),
        };

        let value = table.get(key).map_err(cache_error)?;
        Ok(value.map(|guard| guard.value().to_string()))
    }

    fn set(&self, key: &str, value: &str) -> TxrResult<()> {
        let txn = self.db.begin_write().map_err(cache_error)?;
        {
            let mut table = txn.open_table(CACHE_TABLE).map_err(cache_error)?;
            table.insert(key, value).map_err(cache_error)?;
        }
        txn.commit().map_err(cache_error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> TxrResult<()> {
        let txn = self.db.begin_write().map_err(cache_error)?;
        {
            let mut table = txn.open_table(CACHE_TABLE).map_err(cache_error)?;
            table.remove(key).map_err(cache_error)?;
        }
        txn.commit().map_err(cache_error)?;
        Ok(())
    }
}
