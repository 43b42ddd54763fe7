//! 用户通知载荷
//!
//! 挂单缓存向 POS 前端发出的提示（挂单成功、删除挂单等）。
//! 投递是 fire-and-forget，前端自行决定如何展示。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// 操作成功
    Success,
    /// 普通信息
    Info,
    /// 警告 (操作被拒绝)
    Warning,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// 通知载荷 (store -> POS 前端)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// 通知级别
    pub level: NotificationLevel,
    /// 消息内容
    pub message: String,
    /// 附加数据 (例如挂单码)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
            data: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
            data: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data for the front end
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
