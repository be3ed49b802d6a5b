use actix_web::http::StatusCode;
use actix_web::{Responder, web};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, trace};

use crate::api::helpers::json_response;
use crate::api::types::HealthView;
use crate::clicks::ClickAccumulator;
use crate::services::LinkService;

/// 存储探测超时
const STORAGE_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        service: web::Data<Arc<LinkService>>,
        clicks: Option<web::Data<Arc<ClickAccumulator>>>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let links = match tokio::time::timeout(STORAGE_PROBE_TIMEOUT, service.link_count()).await {
            Ok(Ok(count)) => Some(count),
            Ok(Err(e)) => {
                error!("Storage health check failed: {}", e);
                None
            }
            Err(_) => {
                error!("Storage health check timeout");
                None
            }
        };

        let (pending_clicks, dropped_clicks) = clicks
            .map(|c| (c.pending_clicks(), c.dropped_clicks()))
            .unwrap_or((0, 0));

        let healthy = links.is_some();
        let body = HealthView {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            links,
            pending_clicks,
            dropped_clicks,
        };

        trace!("Health check completed in {:?}", start_time.elapsed());

        let status = if healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        json_response(status, &body)
    }
}

pub fn health_routes() -> actix_web::Resource {
    web::resource("/health").route(web::get().to(HealthService::health_check))
}
