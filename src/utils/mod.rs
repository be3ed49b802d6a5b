pub mod url_validator;

pub use url_validator::{UrlValidationError, validate_url};

/// 短码最大长度（路由与存储共同约束）
pub const MAX_SHORT_CODE_LEN: usize = 64;

/// 与内置路由冲突、不能作为短码的路径段
pub const RESERVED_SHORT_CODES: &[&str] = &["links", "health"];

/// 校验短码格式：1..=64 个 `[A-Za-z0-9_-]` 字符
///
/// 重定向路径在访问存储之前先经过这里，非法输入直接 404。
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_SHORT_CODE_LEN
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// 检查短码是否与保留路由冲突
pub fn is_reserved_short_code(code: &str) -> bool {
    RESERVED_SHORT_CODES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_short_codes() {
        assert!(is_valid_short_code("abc123"));
        assert!(is_valid_short_code("A-b_C"));
        assert!(is_valid_short_code(&"x".repeat(MAX_SHORT_CODE_LEN)));
    }

    #[test]
    fn test_invalid_short_codes() {
        assert!(!is_valid_short_code(""));
        assert!(!is_valid_short_code("has space"));
        assert!(!is_valid_short_code("a/b"));
        assert!(!is_valid_short_code("a.b"));
        assert!(!is_valid_short_code("' OR 1=1 --"));
        assert!(!is_valid_short_code(&"x".repeat(MAX_SHORT_CODE_LEN + 1)));
    }

    #[test]
    fn test_reserved_short_codes() {
        assert!(is_reserved_short_code("links"));
        assert!(is_reserved_short_code("Health"));
        assert!(!is_reserved_short_code("linksx"));
    }
}
