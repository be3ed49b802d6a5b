//! Server mode
//!
//! Builds the actix-web server from the startup context and runs it until
//! Ctrl+C, then flushes pending clicks.

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Compress, web};
use anyhow::{Context, Result};
use tracing::{error, warn};

use crate::api;
use crate::config::{CorsConfig, StaticConfig};
use crate::runtime::lifetime;

/// CORS 预检缓存时间（秒）
const CORS_MAX_AGE_SECS: usize = 3600;

/// Validate CORS configuration at startup (runs once)
fn validate_cors_config(cors_config: &CorsConfig) {
    if cors_config.enabled && cors_config.allowed_origins.is_empty() {
        warn!(
            "CORS enabled but allowed_origins is empty. \
            No cross-origin requests will be allowed. \
            Set allowed_origins explicitly or use '[\"*\"]' for any origin."
        );
    }
}

/// Build CORS middleware from configuration
fn build_cors_middleware(cors_config: &CorsConfig) -> Cors {
    // 未启用时保持浏览器同源策略
    if !cors_config.enabled {
        return Cors::default();
    }

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_header(actix_web::http::header::CONTENT_TYPE)
        .max_age(CORS_MAX_AGE_SECS);

    if cors_config.allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in &cors_config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let startup = lifetime::startup::prepare_server_startup(config)
        .await
        .inspect_err(|e| error!("Server startup failed: {:#}", e))?;

    let link_service = startup.link_service.clone();
    let resolver = startup.resolver.clone();
    let clicks = startup.clicks.clone();

    let cors_config = config.cors.clone();
    validate_cors_config(&cors_config);

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let app_clicks = clicks.clone();
    let server = HttpServer::new(move || {
        let app = App::new()
            .app_data(web::Data::new(link_service.clone()))
            .app_data(web::Data::new(resolver.clone()));
        let app = match &app_clicks {
            Some(accumulator) => app.app_data(web::Data::new(accumulator.clone())),
            None => app,
        };

        app.wrap(build_cors_middleware(&cors_config))
            .wrap(Compress::default())
            .configure(api::configure)
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count)
    // Ctrl+C 由 lifetime::shutdown 处理，保证停服后再刷盘
    .disable_signals();

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    warn!(
        "Short links will be served as {}/<code>",
        config.server.public_base_url()
    );

    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    let handle = server.handle();
    tokio::spawn(async move {
        lifetime::shutdown::wait_for_signal().await;
        // 等待进行中的请求完成
        handle.stop(true).await;
    });

    server.await.context("HTTP server terminated with error")?;

    lifetime::shutdown::flush_pending_clicks(clicks.as_ref()).await;
    warn!("Graceful shutdown: all tasks completed");
    Ok(())
}
