//! HTTP API 集成测试
//!
//! 使用内存存储和 actix_web::test 驱动完整路由表。

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use serde_json::{Value, json};

use snaplink::api;
use snaplink::config::StaticConfig;
use snaplink::runtime::lifetime::startup::{StartupContext, build_context};
use snaplink::storage::MemoryStorage;

const BASE_URL: &str = "https://sn.ap";

fn test_config() -> StaticConfig {
    let mut config = StaticConfig::default();
    config.server.base_url = Some(format!("{}/", BASE_URL));
    config.clicks.flush_interval_ms = 3_600_000;
    config
}

async fn context(config: StaticConfig) -> StartupContext {
    build_context(Arc::new(MemoryStorage::new()), &config)
        .await
        .expect("build context")
}

macro_rules! init_app {
    ($ctx:expr) => {{
        let mut app = App::new()
            .app_data(web::Data::new($ctx.link_service.clone()))
            .app_data(web::Data::new($ctx.resolver.clone()));
        if let Some(clicks) = $ctx.clicks.clone() {
            app = app.app_data(web::Data::new(clicks));
        }
        test::init_service(app.configure(api::configure)).await
    }};
}

#[tokio::test]
async fn test_create_link_returns_201() {
    let ctx = context(test_config()).await;
    let app = init_app!(ctx);

    let req = TestRequest::post()
        .uri("/links")
        .set_json(json!({ "target": "https://example.com/page" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    let code = body["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);
    assert_eq!(body["target"], "https://example.com/page");
    assert_eq!(body["shortUrl"], format!("{}/{}", BASE_URL, code));
    assert_eq!(body["clicks"], 0);
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn test_create_link_rejects_bad_input() {
    let ctx = context(test_config()).await;
    let app = init_app!(ctx);

    let cases = [
        (json!({}), 1000),
        (json!({ "target": "" }), 3002),
        (json!({ "target": "not a url" }), 3002),
        (json!({ "target": "javascript:alert(1)" }), 3002),
        (json!({ "target": "ftp://example.com/file" }), 3002),
    ];

    for (payload, expected_code) in cases {
        let req = TestRequest::post()
            .uri("/links")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", payload);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], expected_code, "{}", payload);
        assert!(body["message"].is_string());
    }
}

#[tokio::test]
async fn test_create_link_rejects_malformed_json() {
    let ctx = context(test_config()).await;
    let app = init_app!(ctx);

    let req = TestRequest::post()
        .uri("/links")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 1000);
}

#[tokio::test]
async fn test_redirect_hit_and_miss() {
    let ctx = context(test_config()).await;
    let link = ctx
        .link_service
        .shorten("https://example.com/target")
        .await
        .unwrap()
        .link;
    let app = init_app!(ctx);

    let req = TestRequest::get().uri(&format!("/{}", link.code)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "https://example.com/target"
    );

    let req = TestRequest::get().uri("/doesnotexist").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3000);
    assert!(body["message"].as_str().unwrap().contains("doesnotexist"));
}

#[tokio::test]
async fn test_head_redirect() {
    let ctx = context(test_config()).await;
    let link = ctx
        .link_service
        .shorten("https://example.com/head")
        .await
        .unwrap()
        .link;
    let app = init_app!(ctx);

    let req = TestRequest::default()
        .method(actix_web::http::Method::HEAD)
        .uri(&format!("/{}", link.code))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "https://example.com/head"
    );
}

#[tokio::test]
async fn test_redirect_clicks_show_up_in_listing() {
    let ctx = context(test_config()).await;
    let link = ctx
        .link_service
        .shorten("https://example.com/counted")
        .await
        .unwrap()
        .link;
    let clicks = ctx.clicks.clone().unwrap();
    let app = init_app!(ctx);

    for _ in 0..5 {
        let req = TestRequest::get().uri(&format!("/{}", link.code)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
    }
    clicks.flush().await;

    let req = TestRequest::get().uri("/links").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let links = body.as_array().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["code"], link.code.as_str());
    assert_eq!(links[0]["clicks"], 5);
}

#[tokio::test]
async fn test_list_links_newest_first() {
    let ctx = context(test_config()).await;
    let app = init_app!(ctx);

    let mut codes = vec![];
    for i in 0..3 {
        let req = TestRequest::post()
            .uri("/links")
            .set_json(json!({ "target": format!("https://example.com/{}", i) }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        codes.push(body["code"].as_str().unwrap().to_string());
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let req = TestRequest::get().uri("/links").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let listed: Vec<String> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["code"].as_str().unwrap().to_string())
        .collect();

    codes.reverse();
    assert_eq!(listed, codes);
}

#[tokio::test]
async fn test_empty_listing() {
    let ctx = context(test_config()).await;
    let app = init_app!(ctx);

    let req = TestRequest::get().uri("/links").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_dedup_repeat_post_returns_200() {
    let mut config = test_config();
    config.links.dedup_by_target = true;
    let ctx = context(config).await;
    let app = init_app!(ctx);

    let payload = json!({ "target": "https://example.com/dedup" });

    let req = TestRequest::post().uri("/links").set_json(&payload).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let first: Value = test::read_body_json(resp).await;

    let req = TestRequest::post().uri("/links").set_json(&payload).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let second: Value = test::read_body_json(resp).await;

    assert_eq!(first["code"], second["code"]);
}

#[tokio::test]
async fn test_health_reports_counts() {
    let ctx = context(test_config()).await;
    let link = ctx
        .link_service
        .shorten("https://example.com/health")
        .await
        .unwrap()
        .link;
    let app = init_app!(ctx);

    let req = TestRequest::get().uri(&format!("/{}", link.code)).to_request();
    test::call_service(&app, req).await;

    let req = TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["links"], 1);
    assert_eq!(body["pendingClicks"], 1);
    assert_eq!(body["droppedClicks"], 0);
}

#[tokio::test]
async fn test_reserved_paths_are_not_redirects() {
    let ctx = context(test_config()).await;
    let app = init_app!(ctx);

    // `/links` 走列表接口，不会被当成短码
    let req = TestRequest::get().uri("/links").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
