use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 短链接记录
///
/// `code`、`target`、`created_at` 创建后不可变；`clicks` 只由点击累加器的合并操作增长。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub code: String,
    pub target: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub clicks: u64,
}

impl Link {
    pub fn new(code: impl Into<String>, target: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            target: target.into(),
            created_at,
            clicks: 0,
        }
    }
}

/// `insert_if_absent` 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOutcome {
    /// 本次是否写入成功；false 表示 code 已被其他写入者占用
    pub inserted: bool,
    /// 新写入的记录，或占用该 code 的已有记录
    pub link: Link,
}
