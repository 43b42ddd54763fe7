use std::path::PathBuf;

/// Default storage key prefix (global / legacy key when no scope is set)
pub const DEFAULT_KEY_PREFIX: &str = "pos_parked_orders_";

/// 挂单缓存配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | PARKED_ORDERS_DB | parked_orders.redb | 数据库文件名 |
/// | PARKED_ORDERS_KEY_PREFIX | pos_parked_orders_ | 存储 key 前缀 |
/// | PARKED_ORDERS_SCOPE | (无) | 默认店铺/租户 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 日志格式 |
/// | LOG_DIR | (无) | 日志目录，设置后写入滚动日志文件 |
///
/// 过期窗口 (2 小时) 和清扫间隔 (60 秒) 是固定常量，不可配置。
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: PathBuf,
    /// 数据库文件名 (相对 work_dir)
    pub db_file: String,
    /// 存储 key 前缀
    pub key_prefix: String,
    /// 默认店铺/租户
    pub scope: Option<String>,
    /// 日志级别
    pub log_level: String,
    /// 是否输出 JSON 日志
    pub log_json: bool,
    /// 日志目录
    pub log_dir: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR")
                .unwrap_or_else(|_| "./data".into())
                .into(),
            db_file: std::env::var("PARKED_ORDERS_DB")
                .unwrap_or_else(|_| "parked_orders.redb".into()),
            key_prefix: std::env::var("PARKED_ORDERS_KEY_PREFIX")
                .unwrap_or_else(|_| DEFAULT_KEY_PREFIX.into()),
            scope: std::env::var("PARKED_ORDERS_SCOPE")
                .ok()
                .filter(|s| !s.is_empty()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
        }
    }

    /// 数据库文件完整路径
    pub fn db_path(&self) -> PathBuf {
        self.work_dir.join(&self.db_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("./data"),
            db_file: "parked_orders.redb".into(),
            key_prefix: DEFAULT_KEY_PREFIX.into(),
            scope: None,
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
        }
    }
}
