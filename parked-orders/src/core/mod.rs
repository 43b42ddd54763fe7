//! 核心模块 - 配置和后台任务
//!
//! - [`Config`] - 环境变量配置
//! - [`TaskHandle`] - 可取消的后台任务句柄

pub mod config;
pub mod tasks;

pub use config::{Config, DEFAULT_KEY_PREFIX};
pub use tasks::TaskHandle;
