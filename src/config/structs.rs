use serde::{Deserialize, Serialize};

use crate::errors::{Result, SnaplinkError};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "SNAPLINK";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - server: 服务器地址、端口、对外 base_url
/// - database: 数据库连接与重试
/// - allocator: 短码字母表与长度
/// - clicks: 点击累加器刷盘策略
/// - links: 创建策略（按目标去重）
/// - cors: 跨域
/// - logging: 日志
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub allocator: AllocatorConfig,
    #[serde(default)]
    pub clicks: ClickConfig,
    #[serde(default)]
    pub links: LinkPolicyConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：SNAPLINK，分隔符：__
    /// 示例：SNAPLINK__SERVER__PORT=9999
    pub fn load(path: Option<&str>) -> Self {
        use config::{Config, Environment, File};

        let path = path.unwrap_or("config.toml");

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 启动前校验（字母表、长度、重试次数等）
    pub fn validate(&self) -> Result<()> {
        self.allocator.validate()?;
        self.clicks.validate()?;
        if self.server.port == 0 {
            return Err(SnaplinkError::config("server.port must be non-zero"));
        }
        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 拼接 shortUrl 的前缀，为空时使用 http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ServerConfig {
    pub fn public_base_url(&self) -> String {
        match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("http://{}:{}", self.host, self.port),
        }
    }
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 短码分配配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatorConfig {
    #[serde(default = "default_alphabet")]
    pub alphabet: String,
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// 当 链接数 > alphabet_size^length / growth_divisor 时长度 +1
    #[serde(default = "default_growth_divisor")]
    pub growth_divisor: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl AllocatorConfig {
    pub fn validate(&self) -> Result<()> {
        let chars: Vec<char> = self.alphabet.chars().collect();
        if chars.is_empty() {
            return Err(SnaplinkError::config("allocator.alphabet must not be empty"));
        }
        let unique: std::collections::HashSet<&char> = chars.iter().collect();
        if unique.len() != chars.len() {
            return Err(SnaplinkError::config(
                "allocator.alphabet must not contain duplicate characters",
            ));
        }
        if !chars
            .iter()
            .all(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        {
            return Err(SnaplinkError::config(
                "allocator.alphabet may only contain [A-Za-z0-9_-]",
            ));
        }
        if self.min_length == 0 {
            return Err(SnaplinkError::config("allocator.min_length must be >= 1"));
        }
        if self.max_length < self.min_length {
            return Err(SnaplinkError::config(
                "allocator.max_length must be >= allocator.min_length",
            ));
        }
        if self.max_length > crate::utils::MAX_SHORT_CODE_LEN {
            return Err(SnaplinkError::config(format!(
                "allocator.max_length must be <= {}",
                crate::utils::MAX_SHORT_CODE_LEN
            )));
        }
        if self.growth_divisor == 0 {
            return Err(SnaplinkError::config(
                "allocator.growth_divisor must be >= 1",
            ));
        }
        if self.max_attempts == 0 {
            return Err(SnaplinkError::config("allocator.max_attempts must be >= 1"));
        }
        Ok(())
    }
}

/// 点击累加器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickConfig {
    #[serde(default = "default_click_enabled")]
    pub enabled: bool,
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// 单个短码的待刷盘点击数达到该值时立即刷盘
    #[serde(default = "default_max_pending_per_code")]
    pub max_pending_per_code: u64,
    /// 刷盘持续失败超过该窗口的增量将被丢弃
    #[serde(default = "default_max_retry_window_secs")]
    pub max_retry_window_secs: u64,
}

impl ClickConfig {
    pub fn validate(&self) -> Result<()> {
        if self.flush_interval_ms == 0 {
            return Err(SnaplinkError::config("clicks.flush_interval_ms must be >= 1"));
        }
        if self.max_pending_per_code == 0 {
            return Err(SnaplinkError::config(
                "clicks.max_pending_per_code must be >= 1",
            ));
        }
        Ok(())
    }
}

/// 链接创建策略
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LinkPolicyConfig {
    /// 相同目标 URL 复用已有短码
    #[serde(default)]
    pub dedup_by_target: bool,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CorsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "sqlite://snaplink.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_alphabet() -> String {
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789".to_string()
}

fn default_min_length() -> usize {
    6
}

fn default_max_length() -> usize {
    12
}

fn default_growth_divisor() -> u64 {
    100
}

fn default_max_attempts() -> u32 {
    10
}

fn default_click_enabled() -> bool {
    true
}

fn default_flush_interval_ms() -> u64 {
    2000
}

fn default_max_pending_per_code() -> u64 {
    100
}

fn default_max_retry_window_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            base_url: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            alphabet: default_alphabet(),
            min_length: default_min_length(),
            max_length: default_max_length(),
            growth_divisor: default_growth_divisor(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            enabled: default_click_enabled(),
            flush_interval_ms: default_flush_interval_ms(),
            max_pending_per_code: default_max_pending_per_code(),
            max_retry_window_secs: default_max_retry_window_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}
