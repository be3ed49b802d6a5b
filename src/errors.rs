use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum SnaplinkError {
    /// 目标 URL 缺失或格式非法
    InvalidInput(String),
    /// 短码不存在
    NotFound(String),
    /// 重试预算耗尽，仍未分配到空闲短码
    AllocationExhausted { length: usize, attempts: u32 },
    /// 存储暂时不可用
    StorageUnavailable(String),
    DatabaseConfig(String),
    Config(String),
}

impl SnaplinkError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            SnaplinkError::InvalidInput(_) => "E001",
            SnaplinkError::NotFound(_) => "E002",
            SnaplinkError::AllocationExhausted { .. } => "E003",
            SnaplinkError::StorageUnavailable(_) => "E004",
            SnaplinkError::DatabaseConfig(_) => "E005",
            SnaplinkError::Config(_) => "E006",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            SnaplinkError::InvalidInput(_) => "Invalid Input",
            SnaplinkError::NotFound(_) => "Resource Not Found",
            SnaplinkError::AllocationExhausted { .. } => "Allocation Exhausted",
            SnaplinkError::StorageUnavailable(_) => "Storage Unavailable",
            SnaplinkError::DatabaseConfig(_) => "Database Configuration Error",
            SnaplinkError::Config(_) => "Configuration Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> String {
        match self {
            SnaplinkError::AllocationExhausted { length, attempts } => format!(
                "No free short code found after {} attempts at length {}",
                attempts, length
            ),
            SnaplinkError::InvalidInput(msg)
            | SnaplinkError::NotFound(msg)
            | SnaplinkError::StorageUnavailable(msg)
            | SnaplinkError::DatabaseConfig(msg)
            | SnaplinkError::Config(msg) => msg.clone(),
        }
    }

    /// 映射到 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            SnaplinkError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SnaplinkError::NotFound(_) => StatusCode::NOT_FOUND,
            SnaplinkError::AllocationExhausted { .. }
            | SnaplinkError::StorageUnavailable(_)
            | SnaplinkError::DatabaseConfig(_)
            | SnaplinkError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于启动失败时的终端提示）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for SnaplinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for SnaplinkError {}

// 便捷的构造函数
impl SnaplinkError {
    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::InvalidInput(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::NotFound(msg.into())
    }

    pub fn allocation_exhausted(length: usize, attempts: u32) -> Self {
        SnaplinkError::AllocationExhausted { length, attempts }
    }

    pub fn storage_unavailable<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::StorageUnavailable(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::DatabaseConfig(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Config(msg.into())
    }
}

impl From<sea_orm::DbErr> for SnaplinkError {
    fn from(err: sea_orm::DbErr) -> Self {
        SnaplinkError::StorageUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SnaplinkError>;
