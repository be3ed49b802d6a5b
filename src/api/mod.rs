//! HTTP API
//!
//! - `POST /links`、`GET /links`：创建与列出短链接
//! - `GET|HEAD /{code}`：重定向
//! - `GET /health`：健康检查
//!
//! `/links` 和 `/health` 必须先于 `/{code}` 注册。

pub mod error_code;
pub mod helpers;
pub mod services;
pub mod types;

use actix_web::http::StatusCode;
use actix_web::{error, web};

pub use error_code::ErrorCode;
pub use services::{health_routes, link_routes, redirect_routes};
pub use types::{CreateLinkRequest, ErrorBody, HealthView, LinkView};

/// JSON 请求体上限
const JSON_BODY_LIMIT: usize = 16 * 1024;

/// 注册全部路由（服务器和测试共用）
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_BODY_LIMIT)
            .error_handler(|err, _req| {
                let response = helpers::error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorCode::BadRequest,
                    &format!("Invalid JSON body: {}", err),
                );
                error::InternalError::from_response(err, response).into()
            }),
    )
    .service(health_routes())
    .service(link_routes())
    .service(redirect_routes());
}
