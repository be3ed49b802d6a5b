//! Click counter writes for SeaOrmStorage
//!
//! Every write is a single `UPDATE ... SET click_count = click_count + n`,
//! so concurrent flushes from several processes never lose increments.
//!
//! # Security Note
//!
//! Statements are built with sea-query and executed with bound parameters.
//! Codes are additionally checked with `utils::is_valid_short_code()`.

use sea_orm::sea_query::{CaseStatement, Expr, Query};
use sea_orm::{ConnectionTrait, EntityTrait, ExprTrait, QueryFilter};
use tracing::{debug, warn};

use super::SeaOrmStorage;
use super::retry;
use crate::errors::{Result, SnaplinkError};
use crate::utils::is_valid_short_code;

use migration::entities::short_link;

fn delta_as_i64(delta: u64) -> i64 {
    i64::try_from(delta).unwrap_or(i64::MAX)
}

impl SeaOrmStorage {
    /// 单个短码原子自增；code 不存在时影响 0 行，静默返回
    pub(super) async fn increment_clicks(&self, code: &str, delta: u64) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }

        let db = &self.db;
        let result = retry::with_retry(
            &format!("increment_clicks({})", code),
            self.retry_config,
            || async {
                short_link::Entity::update_many()
                    .col_expr(
                        short_link::Column::ClickCount,
                        Expr::col(short_link::Column::ClickCount).add(Expr::val(delta_as_i64(delta))),
                    )
                    .filter(Expr::col(short_link::Column::ShortCode).eq(Expr::val(code)))
                    .exec(db)
                    .await
            },
        )
        .await
        .map_err(|e| SnaplinkError::storage_unavailable(format!("更新点击数失败: {}", e)))?;

        if result.rows_affected == 0 {
            debug!("Click delta for unknown code '{}' dropped", code);
        }
        Ok(())
    }

    /// 批量自增：`UPDATE short_links SET click_count = CASE ... END WHERE short_code IN (...)`
    pub(super) async fn batch_increment_clicks(&self, deltas: &[(String, u64)]) -> Result<()> {
        let updates: Vec<&(String, u64)> = deltas
            .iter()
            .filter(|(code, delta)| {
                if !is_valid_short_code(code) {
                    warn!("Skipping click delta for malformed code '{}'", code);
                    return false;
                }
                *delta > 0
            })
            .collect();

        if updates.is_empty() {
            return Ok(());
        }

        let mut case_stmt = CaseStatement::new();
        let mut codes: Vec<String> = Vec::with_capacity(updates.len());

        for (code, delta) in &updates {
            case_stmt = case_stmt.case(
                Expr::col(short_link::Column::ShortCode).eq(Expr::val(code.as_str())),
                Expr::col(short_link::Column::ClickCount).add(Expr::val(delta_as_i64(*delta))),
            );
            codes.push(code.clone());
        }
        // 不匹配的保持原值
        case_stmt = case_stmt.finally(Expr::col(short_link::Column::ClickCount));

        let stmt = Query::update()
            .table(short_link::Entity)
            .value(short_link::Column::ClickCount, case_stmt)
            .and_where(Expr::col(short_link::Column::ShortCode).is_in(codes))
            .to_owned();

        let db = &self.db;
        let stmt_ref = &stmt;
        let result = retry::with_retry("batch_increment_clicks", self.retry_config, || async {
            db.execute(stmt_ref).await
        })
        .await
        .map_err(|e| {
            SnaplinkError::storage_unavailable(format!(
                "批量更新点击数失败（重试后仍失败）: {}",
                e
            ))
        })?;

        debug!(
            "Click deltas merged into {} database ({} codes, {} rows)",
            self.backend_name.to_uppercase(),
            updates.len(),
            result.rows_affected()
        );

        Ok(())
    }
}
