//! 通知投递
//!
//! [`NotificationSink`] 是面向用户的提示通道（toast）。投递是 fire-and-forget：
//! 没有订阅者时消息直接丢弃，不影响挂单操作本身。

use shared::Notification;
use tokio::sync::broadcast;

/// Notification broadcast channel capacity
const NOTIFICATION_CHANNEL_CAPACITY: usize = 256;

/// User-facing message channel
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Fans notifications out to every subscribed front end
#[derive(Debug, Clone)]
pub struct NotificationBus {
    tx: broadcast::Sender<Notification>,
}

impl NotificationBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to notifications; dropping the receiver unsubscribes
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for NotificationBus {
    fn notify(&self, notification: Notification) {
        tracing::debug!(level = %notification.level, message = %notification.message, "Notification");
        // 没有订阅者时 send 返回 Err，忽略
        let _ = self.tx.send(notification);
    }
}

/// Sink that only writes to the log (headless terminals, CLI)
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        tracing::info!(level = %notification.level, "{}", notification.message);
    }
}
