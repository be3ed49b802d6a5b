use dashmap::DashMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{debug, trace, warn};

use crate::config::ClickConfig;
use crate::storage::LinkStore;

/// 单个短码的待刷盘增量
#[derive(Debug, Clone, Copy)]
struct PendingDelta {
    count: u64,
    /// 第一次刷盘失败的时间，成功合并前一直保留
    first_failed_at: Option<Instant>,
}

impl PendingDelta {
    fn fresh() -> Self {
        Self {
            count: 0,
            first_failed_at: None,
        }
    }

    fn absorb(&mut self, other: PendingDelta) {
        self.count += other.count;
        self.first_failed_at = match (self.first_failed_at, other.first_failed_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
    }
}

struct ClickBuffer {
    data: DashMap<Arc<str>, PendingDelta>,
    /// 缓冲区中的总点击数
    total_clicks: AtomicU64,
    dropped_clicks: AtomicU64,
    /// 同一时刻只允许一个刷盘
    flush_lock: Mutex<()>,
    /// 阈值刷盘任务是否已 spawn
    flush_pending: AtomicBool,
}

impl ClickBuffer {
    fn new() -> Self {
        Self {
            data: DashMap::new(),
            total_clicks: AtomicU64::new(0),
            dropped_clicks: AtomicU64::new(0),
            flush_lock: Mutex::new(()),
            flush_pending: AtomicBool::new(false),
        }
    }

    /// 增加点击计数，返回该短码当前待刷盘的点击数及是否处于失败重试中
    fn increment(&self, code: &str) -> (u64, bool) {
        // 热点 code 走 get_mut，避免分配 Arc
        let state = if let Some(mut entry) = self.data.get_mut(code) {
            entry.count += 1;
            (entry.count, entry.first_failed_at.is_some())
        } else {
            let mut entry = self.data.entry(Arc::from(code)).or_insert_with(PendingDelta::fresh);
            entry.count += 1;
            (entry.count, entry.first_failed_at.is_some())
        };

        self.total_clicks.fetch_add(1, Ordering::Relaxed);
        state
    }

    /// 取出当前所有增量（逐个 remove，不影响窗口期新增的 key）
    fn drain(&self) -> Vec<(Arc<str>, PendingDelta)> {
        let keys: Vec<Arc<str>> = self.data.iter().map(|r| r.key().clone()).collect();

        let mut drained = Vec::with_capacity(keys.len());
        let mut total_removed = 0;
        for key in keys {
            if let Some((k, v)) = self.data.remove(&key) {
                total_removed += v.count;
                drained.push((k, v));
            }
        }

        if total_removed > 0 {
            self.total_clicks
                .fetch_update(Ordering::Release, Ordering::Relaxed, |current| {
                    Some(current.saturating_sub(total_removed))
                })
                .ok();
        }

        drained
    }

    fn restore(&self, code: Arc<str>, delta: PendingDelta) {
        self.data
            .entry(code)
            .or_insert_with(PendingDelta::fresh)
            .absorb(delta);
        self.total_clicks.fetch_add(delta.count, Ordering::Relaxed);
    }
}

/// 一次刷盘的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// 成功合并到存储的点击数
    pub merged: u64,
    /// 失败后放回缓冲区等待重试的点击数
    pub retained: u64,
    /// 超出重试窗口被丢弃的点击数
    pub dropped: u64,
}

/// 点击累加器
///
/// `record_click` 只做一次 DashMap 自增，不等待存储。增量每隔
/// `flush_interval` 合并一次；某个短码的待刷盘数达到
/// `max_pending_per_code` 时立即触发一次刷盘。
///
/// 刷盘失败时增量放回缓冲区，由下一轮定时刷盘重试（不再触发阈值刷盘）；自首次失败起超过
/// `max_retry_window` 仍未成功的增量会被丢弃并计数。
#[derive(Clone)]
pub struct ClickAccumulator {
    buffer: Arc<ClickBuffer>,
    store: Arc<dyn LinkStore>,
    flush_interval: Duration,
    max_pending_per_code: u64,
    max_retry_window: Duration,
}

impl ClickAccumulator {
    pub fn new(
        store: Arc<dyn LinkStore>,
        flush_interval: Duration,
        max_pending_per_code: u64,
        max_retry_window: Duration,
    ) -> Self {
        Self {
            buffer: Arc::new(ClickBuffer::new()),
            store,
            flush_interval,
            max_pending_per_code: max_pending_per_code.max(1),
            max_retry_window,
        }
    }

    pub fn from_config(store: Arc<dyn LinkStore>, config: &ClickConfig) -> Self {
        Self::new(
            store,
            Duration::from_millis(config.flush_interval_ms),
            config.max_pending_per_code,
            Duration::from_secs(config.max_retry_window_secs),
        )
    }

    /// 记录一次点击（无锁，立即返回）
    ///
    /// 需要在 tokio 运行时内调用：达到阈值时会 spawn 刷盘任务。
    pub fn record_click(&self, code: &str) {
        let (per_code, retrying) = self.buffer.increment(code);
        trace!("ClickAccumulator: '{}' has {} pending clicks", code, per_code);

        // 失败保留的增量只在定时刷盘时重试
        if retrying || per_code < self.max_pending_per_code {
            return;
        }

        // 只有把 flush_pending 从 false 置为 true 的调用者负责 spawn
        if self
            .buffer
            .flush_pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok()
        {
            let this = self.clone();
            tokio::spawn(async move {
                if let Ok(_guard) = this.buffer.flush_lock.try_lock() {
                    debug!("ClickAccumulator: per-code threshold reached, flushing");
                    this.flush_buffer().await;
                } else {
                    trace!("ClickAccumulator: flush already in progress, skipping");
                }
                this.buffer.flush_pending.store(false, Ordering::Release);
            });
        }
    }

    /// 后台定时刷盘循环，随运行时一起结束
    pub async fn start_background_task(&self) {
        loop {
            sleep(self.flush_interval).await;

            if let Ok(_guard) = self.buffer.flush_lock.try_lock() {
                trace!("ClickAccumulator: Starting scheduled flush");
                self.flush_buffer().await;
            } else {
                trace!("ClickAccumulator: flush already in progress, skipping scheduled flush");
            }
        }
    }

    /// 强制刷盘，等待进行中的刷盘结束后再执行一次
    pub async fn flush(&self) -> FlushReport {
        debug!("ClickAccumulator: Manual flush triggered");
        let _guard = self.buffer.flush_lock.lock().await;
        self.flush_buffer().await
    }

    async fn flush_buffer(&self) -> FlushReport {
        let drained = self.buffer.drain();
        let mut report = FlushReport::default();

        if drained.is_empty() {
            trace!("ClickAccumulator: No clicks to flush");
            return report;
        }

        let deltas: Vec<(String, u64)> = drained
            .iter()
            .map(|(code, delta)| (code.to_string(), delta.count))
            .collect();

        match self.store.merge_click_deltas(&deltas).await {
            Ok(()) => {
                report.merged = deltas.iter().map(|(_, n)| n).sum();
                debug!(
                    "ClickAccumulator: Merged {} clicks across {} codes",
                    report.merged,
                    deltas.len()
                );
            }
            Err(e) => {
                let now = Instant::now();
                for (code, mut delta) in drained {
                    match delta.first_failed_at {
                        Some(first) if now.duration_since(first) >= self.max_retry_window => {
                            report.dropped += delta.count;
                            warn!(
                                "ClickAccumulator: dropping {} clicks for '{}' after retrying for {:?}",
                                delta.count,
                                code,
                                now.duration_since(first)
                            );
                        }
                        _ => {
                            delta.first_failed_at.get_or_insert(now);
                            report.retained += delta.count;
                            self.buffer.restore(code, delta);
                        }
                    }
                }

                if report.dropped > 0 {
                    self.buffer
                        .dropped_clicks
                        .fetch_add(report.dropped, Ordering::Relaxed);
                }
                warn!(
                    "ClickAccumulator: merge_click_deltas failed: {}, {} clicks retained, {} dropped",
                    e, report.retained, report.dropped
                );
            }
        }

        report
    }

    /// 尚未合并到存储的点击数
    pub fn pending_clicks(&self) -> u64 {
        self.buffer.total_clicks.load(Ordering::Relaxed)
    }

    /// 累计丢弃的点击数
    pub fn dropped_clicks(&self) -> u64 {
        self.buffer.dropped_clicks.load(Ordering::Relaxed)
    }
}
