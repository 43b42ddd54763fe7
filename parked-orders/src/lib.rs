//! Parked Orders - POS 挂单缓存
//!
//! 收银台的挂单（暂存购物车）缓存：按店铺隔离、持久化、2 小时自动过期。
//!
//! # 模块结构
//!
//! ```text
//! parked-orders/src/
//! ├── core/          # 配置、后台任务句柄
//! ├── parked/        # 挂单模型、store、过期清扫
//! ├── storage.rs     # KeyValueStore + redb 实现
//! ├── notify.rs      # 用户通知通道
//! ├── clock.rs       # 时钟抽象
//! └── utils/         # 日志
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use parked_orders::{ParkedOrderStore, RedbStore};
//! use shared::CartItem;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = Arc::new(RedbStore::open("parked_orders.redb")?);
//! let store = ParkedOrderStore::builder(storage).scope(Some("shop-1")).build();
//!
//! let code = store.park_order(&[CartItem::new("p-1", "Latte", 3.5, 2)], Some("Table 4"));
//! println!("parked as {code:?}, {} waiting", store.len());
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod core;
pub mod notify;
pub mod parked;
pub mod storage;
pub mod utils;

// Re-export 公共类型
pub use clock::{Clock, ManualClock, SystemClock};
pub use crate::core::{Config, TaskHandle};
pub use notify::{NotificationBus, NotificationSink, TracingSink};
pub use parked::{
    ChangeReason, EXPIRY_WINDOW_MS, ParkedOrder, ParkedOrderStore, ParkedOrdersChanged,
    SWEEP_INTERVAL,
};
pub use storage::{KeyValueStore, RedbStore, StorageError, StorageResult};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;
