//! Mutation operations for SeaOrmStorage
//!
//! Link creation only; click counters are written by `clicks.rs`.

use chrono::{DateTime, Utc};
use sea_orm::{DbErr, EntityTrait, SqlErr, sea_query::OnConflict};
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::converters::link_to_active_model;
use super::retry;
use crate::errors::{Result, SnaplinkError};
use crate::storage::{InsertOutcome, Link};

use migration::entities::short_link;

/// 判断插入错误是否为主键冲突（另一写入者已占用该 code）
fn is_conflict(err: &DbErr) -> bool {
    matches!(err, DbErr::RecordNotInserted)
        || matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// 回读的记录是否就是本次写入的行
///
/// 首次 INSERT 已提交但响应在连接断开时丢失，重试会看到 0 行受影响。
/// target 相同且 created_at 在列精度内一致时，按本次写入处理。
fn is_own_write(existing: &Link, sent: &Link) -> bool {
    existing.target == sent.target
        && (existing.created_at - sent.created_at).num_milliseconds().abs() < 1000
}

impl SeaOrmStorage {
    /// 原子插入：`INSERT ... ON CONFLICT (short_code) DO NOTHING`
    ///
    /// 影响行数为 0（或驱动报告主键冲突）即视为 code 已被占用，
    /// 此时回读已有记录返回给调用方。
    pub(super) async fn insert_link_if_absent(
        &self,
        code: &str,
        target: &str,
        created_at: DateTime<Utc>,
    ) -> Result<InsertOutcome> {
        let db = &self.db;
        let link = Link::new(code, target, created_at);
        let active_model = link_to_active_model(&link);

        let attempts = AtomicU32::new(0);

        let result = retry::with_retry(
            &format!("insert_if_absent({})", code),
            self.retry_config,
            || async {
                attempts.fetch_add(1, Ordering::Relaxed);
                short_link::Entity::insert(active_model.clone())
                    .on_conflict(
                        OnConflict::column(short_link::Column::ShortCode)
                            .do_nothing()
                            .to_owned(),
                    )
                    .exec_without_returning(db)
                    .await
            },
        )
        .await;

        let inserted = match result {
            Ok(rows) => rows > 0,
            Err(e) if is_conflict(&e) => false,
            Err(e) => {
                return Err(SnaplinkError::storage_unavailable(format!(
                    "插入短链接 '{}' 失败: {}",
                    code, e
                )));
            }
        };

        if inserted {
            info!("Short link created: {} -> {}", code, target);
            return Ok(InsertOutcome {
                inserted: true,
                link,
            });
        }

        let existing = self.get(code).await?.ok_or_else(|| {
            SnaplinkError::storage_unavailable(format!(
                "短码 '{}' 冲突但回读不到已有记录",
                code
            ))
        })?;

        // 只有重试过的插入才可能撞上自己先前已提交的行
        if attempts.load(Ordering::Relaxed) > 1 && is_own_write(&existing, &link) {
            info!("Short link created (confirmed on read-back): {} -> {}", code, target);
            return Ok(InsertOutcome {
                inserted: true,
                link: existing,
            });
        }

        debug!("Short code '{}' already taken", code);
        Ok(InsertOutcome {
            inserted: false,
            link: existing,
        })
    }
}
