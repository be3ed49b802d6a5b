//! Query operations for SeaOrmStorage
//!
//! This module contains all read-only database operations.

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::info;

use super::converters::model_to_link;
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, SnaplinkError};
use crate::storage::Link;

use migration::entities::short_link;

impl SeaOrmStorage {
    pub async fn get(&self, code: &str) -> Result<Option<Link>> {
        let db = &self.db;
        let code_owned = code.to_string();

        let model = retry::with_retry(&format!("get({})", code), self.retry_config, || async {
            short_link::Entity::find_by_id(code_owned.clone()).one(db).await
        })
        .await
        .map_err(|e| SnaplinkError::storage_unavailable(format!("查询短链接失败: {}", e)))?;

        Ok(model.map(model_to_link))
    }

    /// 按目标 URL 查找最早创建的一条
    pub async fn get_by_target(&self, target: &str) -> Result<Option<Link>> {
        let db = &self.db;

        let model = retry::with_retry("get_by_target", self.retry_config, || async {
            short_link::Entity::find()
                .filter(short_link::Column::TargetUrl.eq(target))
                .order_by_asc(short_link::Column::CreatedAt)
                .order_by_asc(short_link::Column::ShortCode)
                .one(db)
                .await
        })
        .await
        .map_err(|e| SnaplinkError::storage_unavailable(format!("按目标查询失败: {}", e)))?;

        Ok(model.map(model_to_link))
    }

    pub async fn load_all_newest_first(&self) -> Result<Vec<Link>> {
        let db = &self.db;

        let models = retry::with_retry("list_all", self.retry_config, || async {
            short_link::Entity::find()
                .order_by_desc(short_link::Column::CreatedAt)
                .order_by_asc(short_link::Column::ShortCode)
                .all(db)
                .await
        })
        .await
        .map_err(|e| SnaplinkError::storage_unavailable(format!("加载短链接列表失败: {}", e)))?;

        info!("Loaded {} short links", models.len());
        Ok(models.into_iter().map(model_to_link).collect())
    }

    pub async fn count_links(&self) -> Result<u64> {
        let db = &self.db;

        retry::with_retry("count", self.retry_config, || async {
            short_link::Entity::find().count(db).await
        })
        .await
        .map_err(|e| SnaplinkError::storage_unavailable(format!("统计短链接数量失败: {}", e)))
    }
}
