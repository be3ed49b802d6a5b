//! API 请求/响应类型（JSON 字段使用 camelCase）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ErrorCode;
use crate::services::LinkService;
use crate::storage::Link;

/// `POST /links` 请求体
///
/// `target` 缺失时由处理函数返回 400，而不是 JSON 反序列化错误。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateLinkRequest {
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkView {
    pub code: String,
    pub target: String,
    pub short_url: String,
    pub clicks: u64,
    pub created_at: DateTime<Utc>,
}

impl LinkView {
    pub fn new(link: Link, service: &LinkService) -> Self {
        Self {
            short_url: service.short_url(&link.code),
            code: link.code,
            target: link.target,
            clicks: link.clicks,
            created_at: link.created_at,
        }
    }
}

/// 错误响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthView {
    pub status: String,
    pub links: Option<u64>,
    pub pending_clicks: u64,
    pub dropped_clicks: u64,
}
