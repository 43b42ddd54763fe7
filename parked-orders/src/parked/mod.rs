//! Parked Orders - 挂单缓存
//!
//! 收银台把当前购物车"挂起"，稍后通过挂单码找回继续结账。
//!
//! - **model**: `ParkedOrder`、取单码、金额计算
//! - **store**: `ParkedOrderStore`，按店铺隔离的持久化列表
//! - **sweeper**: 定时清扫超过 2 小时的挂单
//!
//! # Data Flow
//!
//! ```text
//! POS UI ── park / retrieve / remove ──► ParkedOrderStore ──► KeyValueStore (redb)
//!                                             │    ▲
//!                              Notification ◄─┤    └── ExpirySweeper (every 60s)
//!                         ParkedOrdersChanged ◄┘
//! ```

pub mod model;
pub mod store;
mod sweeper;

#[cfg(test)]
mod tests;

// Re-exports
pub use model::{CODE_MAX, CODE_MIN, EXPIRY_WINDOW_MS, ParkedOrder, cart_total, generate_code};
pub use store::{
    ChangeReason, LoadError, ParkedOrderStore, ParkedOrderStoreBuilder, ParkedOrdersChanged,
    SWEEP_INTERVAL, storage_key_for,
};
