use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod backend;
pub mod memory;
pub mod models;

pub use backend::SeaOrmStorage;
pub use memory::MemoryStorage;
pub use models::{InsertOutcome, Link};

/// 短链接存储（唯一性约束的最终裁决者）
///
/// 所有实现都必须保证：
/// - `insert_if_absent` 对 code 唯一性是原子的
/// - `merge_click_delta` 是存储层原子自增，不做读-改-写
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// 原子插入；code 已被占用时返回已有记录且 `inserted = false`
    async fn insert_if_absent(
        &self,
        code: &str,
        target: &str,
        created_at: DateTime<Utc>,
    ) -> Result<InsertOutcome>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>>;

    /// 按目标查找（多条时返回最早创建的一条）
    async fn find_by_target(&self, target: &str) -> Result<Option<Link>>;

    /// 原子增加点击数；code 不存在时静默忽略
    async fn merge_click_delta(&self, code: &str, delta: u64) -> Result<()>;

    /// 批量合并点击增量，默认逐条调用 `merge_click_delta`
    async fn merge_click_deltas(&self, deltas: &[(String, u64)]) -> Result<()> {
        for (code, delta) in deltas {
            self.merge_click_delta(code, *delta).await?;
        }
        Ok(())
    }

    /// 全量列出，按 created_at 倒序（无分页，数据量随链接数线性增长）
    async fn list_all(&self) -> Result<Vec<Link>>;

    async fn count(&self) -> Result<u64>;

    fn backend_name(&self) -> &str;
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<dyn LinkStore>> {
        let database_url = &config.database_url;

        // 从 URL 自动推断数据库类型
        let backend_type = backend::infer_backend_from_url(database_url)?;

        if backend_type == "memory" {
            return Ok(Arc::new(MemoryStorage::new()));
        }

        let storage = SeaOrmStorage::new(database_url, &backend_type, config).await?;
        Ok(Arc::new(storage))
    }
}
