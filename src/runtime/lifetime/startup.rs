use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::allocator::CodeAllocator;
use crate::clicks::ClickAccumulator;
use crate::config::StaticConfig;
use crate::services::{LinkService, RedirectResolver};
use crate::storage::{LinkStore, StorageFactory};

/// 服务器运行所需的共享组件
pub struct StartupContext {
    pub store: Arc<dyn LinkStore>,
    pub allocator: Arc<CodeAllocator>,
    pub link_service: Arc<LinkService>,
    pub resolver: Arc<RedirectResolver>,
    /// 未启用点击统计时为 None
    pub clicks: Option<Arc<ClickAccumulator>>,
}

/// 创建存储、分配器和点击累加器，并启动后台刷盘任务
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let store = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", store.backend_name());

    let context = build_context(store, config).await?;

    info!(
        "Startup completed in {} ms ({} links known)",
        start_time.elapsed().as_millis(),
        context.allocator.known_links()
    );
    Ok(context)
}

/// 在已有存储之上组装组件（测试可直接传入内存存储）
pub async fn build_context(store: Arc<dyn LinkStore>, config: &StaticConfig) -> Result<StartupContext> {
    let allocator =
        Arc::new(CodeAllocator::new(&config.allocator).context("Invalid allocator configuration")?);

    let link_count = store
        .count()
        .await
        .context("Failed to count existing links")?;
    allocator.observe_link_count(link_count);
    debug!(
        "CodeAllocator seeded with {} links, current code length {}",
        link_count,
        allocator.current_length()
    );

    let clicks = if config.clicks.enabled {
        let accumulator = Arc::new(ClickAccumulator::from_config(store.clone(), &config.clicks));
        let background = accumulator.clone();
        tokio::spawn(async move {
            background.start_background_task().await;
        });
        debug!(
            "ClickAccumulator started (interval {} ms, per-code threshold {})",
            config.clicks.flush_interval_ms, config.clicks.max_pending_per_code
        );
        Some(accumulator)
    } else {
        warn!("Click tracking is disabled, click counts will not change");
        None
    };

    let link_service = Arc::new(LinkService::new(
        store.clone(),
        allocator.clone(),
        config.server.public_base_url(),
        config.links.dedup_by_target,
    ));
    if config.links.dedup_by_target {
        info!("Dedup-by-target enabled: repeated targets reuse their first code");
    }

    let resolver = Arc::new(RedirectResolver::new(store.clone(), clicks.clone()));

    Ok(StartupContext {
        store,
        allocator,
        link_service,
        resolver,
        clicks,
    })
}
