use std::sync::Arc;

use tracing::{debug, trace};

use crate::clicks::ClickAccumulator;
use crate::errors::{Result, SnaplinkError};
use crate::storage::LinkStore;
use crate::utils::is_valid_short_code;

/// 短码 → 目标 URL 解析
///
/// 命中时把点击交给累加器后立即返回，不等待计数落盘。
/// 未启用点击统计时 `clicks` 为 None。
#[derive(Clone)]
pub struct RedirectResolver {
    store: Arc<dyn LinkStore>,
    clicks: Option<Arc<ClickAccumulator>>,
}

impl RedirectResolver {
    pub fn new(store: Arc<dyn LinkStore>, clicks: Option<Arc<ClickAccumulator>>) -> Self {
        Self { store, clicks }
    }

    pub async fn resolve(&self, code: &str) -> Result<String> {
        if !is_valid_short_code(code) {
            trace!("Rejected malformed short code: {:?}", code);
            return Err(SnaplinkError::not_found(format!(
                "Short link '{}' not found",
                code
            )));
        }

        match self.store.find_by_code(code).await? {
            Some(link) => {
                if let Some(clicks) = &self.clicks {
                    clicks.record_click(&link.code);
                }
                Ok(link.target)
            }
            None => {
                debug!("Redirect link not found: {}", code);
                Err(SnaplinkError::not_found(format!(
                    "Short link '{}' not found",
                    code
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::Utc;
    use std::time::Duration;

    async fn setup() -> (RedirectResolver, Arc<ClickAccumulator>, Arc<MemoryStorage>) {
        let store = Arc::new(MemoryStorage::new());
        store
            .insert_if_absent("k1", "https://example.com/target", Utc::now())
            .await
            .unwrap();
        let clicks = Arc::new(ClickAccumulator::new(
            store.clone(),
            Duration::from_secs(3600),
            u64::MAX,
            Duration::from_secs(60),
        ));
        let resolver = RedirectResolver::new(store.clone(), Some(clicks.clone()));
        (resolver, clicks, store)
    }

    #[tokio::test]
    async fn test_hit_records_click() {
        let (resolver, clicks, store) = setup().await;

        let target = resolver.resolve("k1").await.unwrap();
        assert_eq!(target, "https://example.com/target");
        assert_eq!(clicks.pending_clicks(), 1);

        clicks.flush().await;
        assert_eq!(store.find_by_code("k1").await.unwrap().unwrap().clicks, 1);
    }

    #[tokio::test]
    async fn test_miss_records_nothing() {
        let (resolver, clicks, _store) = setup().await;

        assert!(matches!(
            resolver.resolve("nope").await,
            Err(SnaplinkError::NotFound(_))
        ));
        assert!(matches!(
            resolver.resolve("../etc").await,
            Err(SnaplinkError::NotFound(_))
        ));
        assert_eq!(clicks.pending_clicks(), 0);
    }

    #[tokio::test]
    async fn test_without_accumulator() {
        let (_, _, store) = setup().await;
        let resolver = RedirectResolver::new(store.clone(), None);

        assert!(resolver.resolve("k1").await.is_ok());
        assert_eq!(store.find_by_code("k1").await.unwrap().unwrap().clicks, 0);
    }
}
