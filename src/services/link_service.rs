//! Link creation and listing
//!
//! Creation runs the allocate → insert-if-absent loop: the allocator only
//! proposes candidates, the store decides who wins a code.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};

use crate::allocator::CodeAllocator;
use crate::errors::{Result, SnaplinkError};
use crate::storage::{Link, LinkStore};
use crate::utils::{is_reserved_short_code, is_valid_short_code, validate_url};

/// 按目标 URL 分片的创建锁数量
const TARGET_LOCK_SHARDS: usize = 64;

/// Result of `shorten`
#[derive(Debug, Clone)]
pub struct ShortenResult {
    pub link: Link,
    /// false when dedup-by-target returned an existing link
    pub created: bool,
}

pub struct LinkService {
    store: Arc<dyn LinkStore>,
    allocator: Arc<CodeAllocator>,
    base_url: String,
    dedup_by_target: bool,
    /// 开启去重时，同一目标的创建在进程内串行化
    target_locks: Vec<Mutex<()>>,
}

impl LinkService {
    pub fn new(
        store: Arc<dyn LinkStore>,
        allocator: Arc<CodeAllocator>,
        base_url: impl Into<String>,
        dedup_by_target: bool,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            store,
            allocator,
            base_url: base_url.trim_end_matches('/').to_string(),
            dedup_by_target,
            target_locks: (0..TARGET_LOCK_SHARDS).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Create a short link for `target`
    ///
    /// With dedup-by-target on, an existing link for the same target is
    /// returned instead (`created = false`).
    pub async fn shorten(&self, raw_target: &str) -> Result<ShortenResult> {
        let target =
            validate_url(raw_target).map_err(|e| SnaplinkError::invalid_input(e.to_string()))?;

        if !self.dedup_by_target {
            let link = self.mint(&target).await?;
            return Ok(ShortenResult {
                link,
                created: true,
            });
        }

        let _guard = self.lock_target(&target).await;
        if let Some(existing) = self.store.find_by_target(&target).await? {
            debug!(
                "LinkService: reusing '{}' for already shortened target",
                existing.code
            );
            return Ok(ShortenResult {
                link: existing,
                created: false,
            });
        }

        let link = self.mint(&target).await?;
        Ok(ShortenResult {
            link,
            created: true,
        })
    }

    async fn mint(&self, target: &str) -> Result<Link> {
        let max_attempts = self.allocator.max_attempts();
        let mut length = self.allocator.current_length();

        for attempt in 1..=max_attempts {
            let code = self.allocator.allocate();
            length = code.chars().count();

            if is_reserved_short_code(&code) {
                debug!("LinkService: candidate '{}' is a reserved route, retrying", code);
                continue;
            }

            let outcome = self.store.insert_if_absent(&code, target, Utc::now()).await?;
            if outcome.inserted {
                self.allocator.record_inserted();
                info!("LinkService: created link '{}' -> '{}'", code, target);
                return Ok(outcome.link);
            }

            debug!(
                "LinkService: code collision on '{}' (attempt {}/{})",
                code, attempt, max_attempts
            );
        }

        error!(
            "LinkService: short code allocation exhausted after {} attempts at length {}; \
             consider a larger alphabet or max_length",
            max_attempts, length
        );
        Err(SnaplinkError::allocation_exhausted(length, max_attempts))
    }

    async fn lock_target(&self, target: &str) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        target.hash(&mut hasher);
        let shard = (hasher.finish() as usize) % self.target_locks.len();
        self.target_locks[shard].lock().await
    }

    pub async fn get_link(&self, code: &str) -> Result<Link> {
        if !is_valid_short_code(code) {
            return Err(SnaplinkError::not_found(format!("Short link '{}' not found", code)));
        }
        self.store
            .find_by_code(code)
            .await?
            .ok_or_else(|| SnaplinkError::not_found(format!("Short link '{}' not found", code)))
    }

    /// All links, newest first
    pub async fn list_links(&self) -> Result<Vec<Link>> {
        self.store.list_all().await
    }

    pub async fn link_count(&self) -> Result<u64> {
        self.store.count().await
    }

    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    pub fn dedup_by_target(&self) -> bool {
        self.dedup_by_target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::CodeGenerator;
    use crate::config::AllocatorConfig;
    use crate::storage::MemoryStorage;
    use std::sync::Mutex as StdMutex;

    struct ScriptedGenerator {
        codes: StdMutex<Vec<&'static str>>,
    }

    impl CodeGenerator for ScriptedGenerator {
        fn generate(&self, _length: usize) -> String {
            let mut codes = self.codes.lock().unwrap();
            if codes.len() > 1 {
                codes.remove(0).to_string()
            } else {
                codes[0].to_string()
            }
        }
    }

    fn scripted_service(codes: Vec<&'static str>, dedup: bool) -> (LinkService, Arc<MemoryStorage>) {
        let store = Arc::new(MemoryStorage::new());
        let config = AllocatorConfig {
            alphabet: "abcdefghijklmnopqrstuvwxyz".to_string(),
            min_length: 1,
            max_length: 8,
            growth_divisor: 100,
            max_attempts: 3,
        };
        let allocator = CodeAllocator::with_generator(
            &config,
            Arc::new(ScriptedGenerator {
                codes: StdMutex::new(codes),
            }),
        )
        .unwrap();
        let service = LinkService::new(
            store.clone(),
            Arc::new(allocator),
            "https://sn.ap/",
            dedup,
        );
        (service, store)
    }

    #[tokio::test]
    async fn test_shorten_retries_on_collision() {
        let (service, store) = scripted_service(vec!["taken", "fresh"], false);
        store
            .insert_if_absent("taken", "https://old.example", Utc::now())
            .await
            .unwrap();

        let result = service.shorten("https://new.example/page").await.unwrap();
        assert!(result.created);
        assert_eq!(result.link.code, "fresh");
        assert_eq!(result.link.clicks, 0);

        let old = store.find_by_code("taken").await.unwrap().unwrap();
        assert_eq!(old.target, "https://old.example");
    }

    #[tokio::test]
    async fn test_reserved_candidates_are_skipped() {
        let (service, _store) = scripted_service(vec!["links", "health", "ok"], false);
        let result = service.shorten("https://example.com").await.unwrap();
        assert_eq!(result.link.code, "ok");
    }

    #[tokio::test]
    async fn test_exhaustion_reports_length() {
        let (service, store) = scripted_service(vec!["dup"], false);
        store
            .insert_if_absent("dup", "https://example.com", Utc::now())
            .await
            .unwrap();

        let err = service.shorten("https://example.org").await.unwrap_err();
        assert!(matches!(
            err,
            SnaplinkError::AllocationExhausted {
                length: 3,
                attempts: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_invalid_target_rejected() {
        let (service, _store) = scripted_service(vec!["abc"], false);
        for bad in ["", "   ", "not a url", "ftp://example.com", "javascript:alert(1)"] {
            let err = service.shorten(bad).await.unwrap_err();
            assert!(matches!(err, SnaplinkError::InvalidInput(_)), "{bad:?}");
        }
    }

    #[tokio::test]
    async fn test_dedup_returns_existing() {
        let (service, store) = scripted_service(vec!["first", "second"], true);

        let a = service.shorten("https://example.com/x").await.unwrap();
        let b = service.shorten("https://example.com/x").await.unwrap();

        assert!(a.created);
        assert!(!b.created);
        assert_eq!(a.link.code, b.link.code);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_without_dedup_every_call_mints() {
        let (service, store) = scripted_service(vec!["first", "second"], false);

        let a = service.shorten("https://example.com/x").await.unwrap();
        let b = service.shorten("https://example.com/x").await.unwrap();

        assert_ne!(a.link.code, b.link.code);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_short_url_composition() {
        let (service, _store) = scripted_service(vec!["abc"], false);
        assert_eq!(service.short_url("abc"), "https://sn.ap/abc");
    }

    #[tokio::test]
    async fn test_get_link_not_found() {
        let (service, _store) = scripted_service(vec!["abc"], false);
        assert!(matches!(
            service.get_link("missing").await,
            Err(SnaplinkError::NotFound(_))
        ));
        assert!(matches!(
            service.get_link("bad/code").await,
            Err(SnaplinkError::NotFound(_))
        ));
    }
}
