use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use std::sync::Arc;
use tracing::{debug, error};

use crate::api::ErrorCode;
use crate::api::helpers::error_response;
use crate::errors::SnaplinkError;
use crate::services::RedirectResolver;

pub struct RedirectService {}

impl RedirectService {
    pub async fn handle_redirect(
        path: web::Path<String>,
        resolver: web::Data<Arc<RedirectResolver>>,
    ) -> impl Responder {
        let code = path.into_inner();

        match resolver.resolve(&code).await {
            Ok(target) => Self::finish_redirect(&target),
            Err(SnaplinkError::NotFound(_)) => {
                debug!("Redirect miss: {}", code);
                Self::not_found_response(&code)
            }
            Err(e) => {
                error!("Storage error during redirect lookup: {}", e);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::LinkDatabaseError,
                    "Storage temporarily unavailable",
                )
            }
        }
    }

    #[inline]
    fn finish_redirect(target: &str) -> HttpResponse {
        HttpResponse::build(StatusCode::FOUND)
            .insert_header(("Location", target))
            .insert_header(("Cache-Control", "no-store"))
            .finish()
    }

    #[inline]
    fn not_found_response(code: &str) -> HttpResponse {
        error_response(
            StatusCode::NOT_FOUND,
            ErrorCode::LinkNotFound,
            &format!("Short link '{}' not found", code),
        )
    }
}

pub fn redirect_routes() -> actix_web::Resource {
    web::resource("/{code}")
        .route(web::get().to(RedirectService::handle_redirect))
        .route(web::head().to(RedirectService::handle_redirect))
}
