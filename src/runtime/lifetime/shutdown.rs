use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::clicks::ClickAccumulator;

/// 点击刷盘超时时间（秒）
const FLUSH_TIMEOUT_SECS: u64 = 10;

/// 等待 Ctrl+C
pub async fn wait_for_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, stopping server...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }
}

/// 服务器停止后强制刷盘剩余点击
pub async fn flush_pending_clicks(clicks: Option<&Arc<ClickAccumulator>>) {
    let Some(clicks) = clicks else {
        info!("Click tracking disabled, skipping flush");
        return;
    };

    match timeout(Duration::from_secs(FLUSH_TIMEOUT_SECS), clicks.flush()).await {
        Ok(report) if report.retained > 0 || report.dropped > 0 => {
            error!(
                "Final click flush incomplete: {} merged, {} clicks lost",
                report.merged,
                report.retained + report.dropped
            );
        }
        Ok(report) => {
            info!("ClickAccumulator flushed {} clicks on shutdown", report.merged);
        }
        Err(_) => {
            error!(
                "ClickAccumulator flush timed out after {} seconds, {} clicks lost",
                FLUSH_TIMEOUT_SECS,
                clicks.pending_clicks()
            );
        }
    }
}
