use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        match manager.get_database_backend() {
            DatabaseBackend::MySql => {
                // MySQL 的 TEXT 列只能建前缀索引，且不支持 IF NOT EXISTS
                conn.execute_unprepared(
                    "CREATE INDEX idx_target_url ON short_links (target_url(255))",
                )
                .await
                .ok();
            }
            _ => {
                conn.execute_unprepared(
                    "CREATE INDEX IF NOT EXISTS idx_target_url ON short_links (target_url)",
                )
                .await?;
            }
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        match manager.get_database_backend() {
            DatabaseBackend::MySql => {
                conn.execute_unprepared("DROP INDEX idx_target_url ON short_links")
                    .await
                    .ok();
            }
            _ => {
                conn.execute_unprepared("DROP INDEX IF EXISTS idx_target_url")
                    .await?;
            }
        }

        Ok(())
    }
}
