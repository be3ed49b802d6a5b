//! 内存存储
//!
//! 基于 DashMap 的 `LinkStore` 实现，用于 `memory://` 部署和测试。
//! 进程退出即丢失数据。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{InsertOutcome, Link, LinkStore};
use crate::errors::Result;

#[derive(Default)]
pub struct MemoryStorage {
    links: DashMap<String, Link>,
    /// target -> 最早创建的 code
    by_target: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkStore for MemoryStorage {
    async fn insert_if_absent(
        &self,
        code: &str,
        target: &str,
        created_at: DateTime<Utc>,
    ) -> Result<InsertOutcome> {
        // entry 持有分片写锁，检查与插入在同一临界区内完成
        let outcome = match self.links.entry(code.to_string()) {
            Entry::Occupied(existing) => InsertOutcome {
                inserted: false,
                link: existing.get().clone(),
            },
            Entry::Vacant(slot) => {
                let link = Link::new(code, target, created_at);
                slot.insert(link.clone());
                InsertOutcome {
                    inserted: true,
                    link,
                }
            }
        };

        if outcome.inserted {
            self.by_target
                .entry(target.to_string())
                .or_insert_with(|| code.to_string());
        }

        Ok(outcome)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>> {
        Ok(self.links.get(code).map(|entry| entry.value().clone()))
    }

    async fn find_by_target(&self, target: &str) -> Result<Option<Link>> {
        let Some(code) = self.by_target.get(target).map(|c| c.value().clone()) else {
            return Ok(None);
        };
        self.find_by_code(&code).await
    }

    async fn merge_click_delta(&self, code: &str, delta: u64) -> Result<()> {
        if let Some(mut entry) = self.links.get_mut(code) {
            entry.clicks = entry.clicks.saturating_add(delta);
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Link>> {
        let mut links: Vec<Link> = self.links.iter().map(|r| r.value().clone()).collect();
        links.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.code.cmp(&b.code))
        });
        Ok(links)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.links.len() as u64)
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_insert_if_absent_conflict_returns_existing() {
        let store = MemoryStorage::new();
        let now = Utc::now();

        let first = store
            .insert_if_absent("abc", "https://a.example", now)
            .await
            .unwrap();
        assert!(first.inserted);

        let second = store
            .insert_if_absent("abc", "https://b.example", now)
            .await
            .unwrap();
        assert!(!second.inserted);
        assert_eq!(second.link.target, "https://a.example");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_by_target_returns_first_code() {
        let store = MemoryStorage::new();
        let now = Utc::now();
        store
            .insert_if_absent("one", "https://same.example", now)
            .await
            .unwrap();
        store
            .insert_if_absent("two", "https://same.example", now + Duration::seconds(1))
            .await
            .unwrap();

        let found = store
            .find_by_target("https://same.example")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.code, "one");
        assert!(store.find_by_target("https://other.example").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_merge_click_delta_missing_code_is_noop() {
        let store = MemoryStorage::new();
        store.merge_click_delta("ghost", 5).await.unwrap();
        assert!(store.find_by_code("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let store = MemoryStorage::new();
        let base = Utc::now();
        for (i, code) in ["old", "mid", "new"].iter().enumerate() {
            store
                .insert_if_absent(code, "https://example.com", base + Duration::seconds(i as i64))
                .await
                .unwrap();
        }

        let codes: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.code)
            .collect();
        assert_eq!(codes, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_concurrent_insert_same_code_single_winner() {
        let store = Arc::new(MemoryStorage::new());
        let mut handles = vec![];
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .insert_if_absent("race", &format!("https://{}.example", i), Utc::now())
                    .await
                    .unwrap()
                    .inserted
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
