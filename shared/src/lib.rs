//! Shared types for the parked order cache
//!
//! Types exchanged between the POS front end and the parked order store:
//! cart lines, user facing notifications and time helpers.

pub mod notification;
pub mod order;
pub mod util;

// Re-exports
pub use notification::{Notification, NotificationLevel};
pub use order::CartItem;
pub use serde::{Deserialize, Serialize};
