//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::SnaplinkError;

/// API 错误码，序列化为数字
///
/// 按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 3000-3099: 链接错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1030,

    // 链接错误 3000-3099
    LinkNotFound = 3000,
    LinkInvalidUrl = 3002,
    LinkDatabaseError = 3005,
    LinkAllocationExhausted = 3007,
}

impl From<&SnaplinkError> for ErrorCode {
    fn from(err: &SnaplinkError) -> Self {
        match err {
            SnaplinkError::InvalidInput(_) => ErrorCode::LinkInvalidUrl,
            SnaplinkError::NotFound(_) => ErrorCode::LinkNotFound,
            SnaplinkError::AllocationExhausted { .. } => ErrorCode::LinkAllocationExhausted,
            SnaplinkError::StorageUnavailable(_) | SnaplinkError::DatabaseConfig(_) => {
                ErrorCode::LinkDatabaseError
            }
            SnaplinkError::Config(_) => ErrorCode::InternalServerError,
        }
    }
}
