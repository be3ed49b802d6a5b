use actix_web::http::StatusCode;
use actix_web::{Responder, web};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::api::ErrorCode;
use crate::api::helpers::{error_from_snaplink, error_response, json_response};
use crate::api::types::{CreateLinkRequest, LinkView};
use crate::services::LinkService;

pub struct LinkApi;

impl LinkApi {
    /// `POST /links`
    ///
    /// 新建返回 201；开启按目标去重且命中已有记录时返回 200。
    pub async fn create_link(
        service: web::Data<Arc<LinkService>>,
        body: web::Json<CreateLinkRequest>,
    ) -> impl Responder {
        let Some(target) = body.into_inner().target else {
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::BadRequest,
                "Field 'target' is required",
            );
        };

        match service.shorten(&target).await {
            Ok(result) => {
                let status = if result.created {
                    StatusCode::CREATED
                } else {
                    StatusCode::OK
                };
                debug!(
                    "POST /links -> {} ({})",
                    result.link.code,
                    status.as_u16()
                );
                json_response(status, &LinkView::new(result.link, &service))
            }
            Err(e) => error_from_snaplink(&e),
        }
    }

    /// `GET /links`，按创建时间倒序
    pub async fn list_links(service: web::Data<Arc<LinkService>>) -> impl Responder {
        trace!("Received list links request");

        match service.list_links().await {
            Ok(links) => {
                let views: Vec<LinkView> = links
                    .into_iter()
                    .map(|link| LinkView::new(link, &service))
                    .collect();
                json_response(StatusCode::OK, &views)
            }
            Err(e) => error_from_snaplink(&e),
        }
    }
}

pub fn link_routes() -> actix_web::Resource {
    web::resource("/links")
        .route(web::post().to(LinkApi::create_link))
        .route(web::get().to(LinkApi::list_links))
}

