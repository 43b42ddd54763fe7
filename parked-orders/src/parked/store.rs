//! ParkedOrderStore - 挂单缓存
//!
//! 每个店铺 (scope) 一份挂单列表，最新的在前，持久化到 [`KeyValueStore`]。
//!
//! # 写入流程
//!
//! ```text
//! park / remove / retrieve / sweep
//!     ├─ 1. 加锁，读取当前列表
//!     ├─ 2. 计算新列表
//!     ├─ 3. 持久化新列表 (失败只记日志)
//!     ├─ 4. 替换内存列表，释放锁
//!     └─ 5. 发送通知和变更事件
//! ```
//!
//! 调用方操作和后台清扫共用同一把锁，读-改-写之间不会交错。

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use shared::{CartItem, Notification};
use thiserror::Error;
use tokio::sync::broadcast;

use super::model::ParkedOrder;
use super::sweeper::ExpirySweeper;
use crate::clock::{Clock, SystemClock};
use crate::core::{DEFAULT_KEY_PREFIX, TaskHandle};
use crate::notify::{NotificationSink, TracingSink};
use crate::storage::{KeyValueStore, StorageError};

/// Interval between two expiry sweeps
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Change event broadcast capacity
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Errors while loading a persisted list
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Corrupt parked order payload: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Why the list changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    /// Reloaded from storage (scope switch, reload)
    Loaded,
    Parked,
    Removed,
    Expired,
}

/// Pushed to subscribers after every change, carrying the new list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkedOrdersChanged {
    pub storage_key: String,
    pub reason: ChangeReason,
    pub orders: Vec<ParkedOrder>,
}

/// Storage key for a scope: `prefix + scope`, or `prefix` alone when unscoped
pub fn storage_key_for(prefix: &str, scope: Option<&str>) -> String {
    match scope.filter(|s| !s.is_empty()) {
        Some(scope) => format!("{prefix}{scope}"),
        None => prefix.to_string(),
    }
}

struct StoreState {
    scope: Option<String>,
    storage_key: String,
    /// 最新的在前
    orders: Vec<ParkedOrder>,
    disposed: bool,
}

/// State shared between the store handle and its sweeper task
pub(super) struct StoreCore {
    storage: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    key_prefix: String,
    state: Mutex<StoreState>,
    change_tx: broadcast::Sender<ParkedOrdersChanged>,
}

impl StoreCore {
    fn read_list(&self, key: &str) -> Result<Vec<ParkedOrder>, LoadError> {
        match self.storage.get(key)? {
            Some(payload) => Ok(serde_json::from_str(&payload)?),
            None => Ok(Vec::new()),
        }
    }

    /// Best effort: failures are logged, never surfaced
    fn persist(&self, key: &str, orders: &[ParkedOrder]) -> bool {
        let result = serde_json::to_string(orders)
            .map_err(StorageError::from)
            .and_then(|payload| self.storage.set(key, &payload));

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(storage_key = %key, error = %e, "Failed to persist parked orders");
                false
            }
        }
    }

    /// Load the list for `state.storage_key`, dropping expired entries
    ///
    /// On a read or parse failure the current list is kept when
    /// `keep_on_failure` is set, otherwise it is cleared.
    fn load_into(&self, state: &mut StoreState, keep_on_failure: bool) {
        let now = self.clock.now_millis();

        match self.read_list(&state.storage_key) {
            Ok(orders) => {
                let loaded = orders.len();
                let fresh: Vec<ParkedOrder> =
                    orders.into_iter().filter(|o| !o.is_expired(now)).collect();
                let purged = loaded - fresh.len();

                if purged > 0 {
                    self.persist(&state.storage_key, &fresh);
                    tracing::info!(
                        storage_key = %state.storage_key,
                        purged,
                        "Dropped expired parked orders on load"
                    );
                }

                tracing::debug!(storage_key = %state.storage_key, count = fresh.len(), "Parked orders loaded");
                state.orders = fresh;
            }
            Err(e) => {
                tracing::error!(
                    storage_key = %state.storage_key,
                    error = %e,
                    "Failed to load parked orders"
                );
                if !keep_on_failure {
                    state.orders.clear();
                }
            }
        }
    }

    fn change_event(&self, state: &StoreState, reason: ChangeReason) -> Option<ParkedOrdersChanged> {
        if self.change_tx.receiver_count() == 0 {
            return None;
        }
        Some(ParkedOrdersChanged {
            storage_key: state.storage_key.clone(),
            reason,
            orders: state.orders.clone(),
        })
    }

    fn publish(&self, event: Option<ParkedOrdersChanged>) {
        if let Some(event) = event {
            let _ = self.change_tx.send(event);
        }
    }

    /// Remove an order by id and return it
    fn take(&self, id: &str) -> Option<ParkedOrder> {
        let (removed, event) = {
            let mut state = self.state.lock();
            if state.disposed {
                tracing::warn!(order_id = %id, "Parked order store disposed, ignoring remove");
                return None;
            }

            let index = state.orders.iter().position(|o| o.id == id)?;
            let mut next = state.orders.clone();
            let removed = next.remove(index);

            self.persist(&state.storage_key, &next);
            state.orders = next;

            tracing::info!(
                storage_key = %state.storage_key,
                order_id = %removed.id,
                code = %removed.code,
                "Parked order removed"
            );
            (removed, self.change_event(&state, ChangeReason::Removed))
        };

        self.notifier.notify(
            Notification::info("Parked order removed")
                .with_data(serde_json::json!({ "id": removed.id, "code": removed.code })),
        );
        self.publish(event);
        Some(removed)
    }

    /// Drop every order past the expiry window, returns how many were purged
    pub(super) fn sweep_expired(&self) -> usize {
        let (purged, event) = {
            let mut state = self.state.lock();
            if state.disposed {
                return 0;
            }

            let now = self.clock.now_millis();
            let next: Vec<ParkedOrder> = state
                .orders
                .iter()
                .filter(|o| !o.is_expired(now))
                .cloned()
                .collect();
            let purged = state.orders.len() - next.len();
            if purged == 0 {
                return 0;
            }

            self.persist(&state.storage_key, &next);
            state.orders = next;

            tracing::info!(storage_key = %state.storage_key, purged, "Expired parked orders purged");
            (purged, self.change_event(&state, ChangeReason::Expired))
        };

        self.publish(event);
        purged
    }
}

/// Builder for [`ParkedOrderStore`]
pub struct ParkedOrderStoreBuilder {
    storage: Arc<dyn KeyValueStore>,
    scope: Option<String>,
    key_prefix: String,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSink>,
    sweep_interval: Duration,
}

impl ParkedOrderStoreBuilder {
    /// Tenant / shop the store starts in
    pub fn scope(mut self, scope: Option<&str>) -> Self {
        self.scope = scope.filter(|s| !s.is_empty()).map(str::to_string);
        self
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Override [`SWEEP_INTERVAL`] (embedding, tests)
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Create the store and load the list for the configured scope
    pub fn build(self) -> ParkedOrderStore {
        let storage_key = storage_key_for(&self.key_prefix, self.scope.as_deref());
        let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        let core = StoreCore {
            storage: self.storage,
            notifier: self.notifier,
            clock: self.clock,
            key_prefix: self.key_prefix,
            state: Mutex::new(StoreState {
                scope: self.scope,
                storage_key,
                orders: Vec::new(),
                disposed: false,
            }),
            change_tx,
        };

        {
            let mut state = core.state.lock();
            core.load_into(&mut state, false);
            tracing::info!(
                storage_key = %state.storage_key,
                count = state.orders.len(),
                "Parked order store initialized"
            );
        }

        ParkedOrderStore {
            core: Arc::new(core),
            sweeper: Mutex::new(None),
            sweep_interval: self.sweep_interval,
        }
    }
}

/// Persisted, time-expiring list of parked orders for one tenant at a time
///
/// Dropping the store stops its sweeper.
pub struct ParkedOrderStore {
    core: Arc<StoreCore>,
    sweeper: Mutex<Option<TaskHandle>>,
    sweep_interval: Duration,
}

impl std::fmt::Debug for ParkedOrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.core.state.lock();
        f.debug_struct("ParkedOrderStore")
            .field("storage_key", &state.storage_key)
            .field("orders", &state.orders.len())
            .field("disposed", &state.disposed)
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}

impl ParkedOrderStore {
    pub fn builder(storage: Arc<dyn KeyValueStore>) -> ParkedOrderStoreBuilder {
        ParkedOrderStoreBuilder {
            storage,
            scope: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            clock: Arc::new(SystemClock),
            notifier: Arc::new(TracingSink),
            sweep_interval: SWEEP_INTERVAL,
        }
    }

    // ========== Operations ==========

    /// Park a cart, returns its retrieval code
    ///
    /// An empty cart is a no-op and returns `None`. A cart whose total is not
    /// a finite number (NaN / infinite prices) is rejected with a warning
    /// notification and also returns `None`.
    pub fn park_order(&self, items: &[CartItem], note: Option<&str>) -> Option<String> {
        if items.is_empty() {
            tracing::debug!("Nothing to park, cart is empty");
            return None;
        }

        let (order, event) = {
            let mut state = self.core.state.lock();
            if state.disposed {
                tracing::warn!("Parked order store disposed, ignoring park");
                return None;
            }

            let Some(order) = ParkedOrder::new(items, note, self.core.clock.now_millis()) else {
                drop(state);
                tracing::warn!(
                    items = items.len(),
                    "Cart total is not a finite number, order not parked"
                );
                self.core
                    .notifier
                    .notify(Notification::warning("Order not parked: invalid cart total"));
                return None;
            };
            let mut next = Vec::with_capacity(state.orders.len() + 1);
            next.push(order.clone());
            next.extend(state.orders.iter().cloned());

            self.core.persist(&state.storage_key, &next);
            state.orders = next;

            tracing::info!(
                storage_key = %state.storage_key,
                order_id = %order.id,
                code = %order.code,
                total = order.total,
                "Order parked"
            );
            (order, self.core.change_event(&state, ChangeReason::Parked))
        };

        self.core.notifier.notify(
            Notification::success(format!("Order parked with code {}", order.code))
                .with_data(serde_json::json!({ "id": order.id, "code": order.code })),
        );
        self.core.publish(event);
        Some(order.code)
    }

    /// Discard a parked order; returns whether anything was removed
    pub fn remove_order(&self, id: &str) -> bool {
        self.core.take(id).is_some()
    }

    /// Take a parked order back to the till
    ///
    /// Retrieval removes the order, a second call with the same id returns `None`.
    pub fn retrieve_order(&self, id: &str) -> Option<ParkedOrder> {
        let order = self.core.take(id)?;
        tracing::info!(order_id = %order.id, code = %order.code, "Parked order retrieved");
        Some(order)
    }

    /// Run one expiry sweep now
    pub fn sweep_expired(&self) -> usize {
        self.core.sweep_expired()
    }

    // ========== Scope ==========

    /// Switch to another tenant / shop and load its list
    ///
    /// The previous tenant's orders are never carried over; if the new
    /// payload cannot be read the list starts empty.
    pub fn switch_scope(&self, scope: Option<&str>) {
        let event = {
            let mut state = self.core.state.lock();
            if state.disposed {
                tracing::warn!("Parked order store disposed, ignoring scope switch");
                return;
            }

            let storage_key = storage_key_for(&self.core.key_prefix, scope);
            if storage_key == state.storage_key {
                return;
            }

            tracing::info!(from = %state.storage_key, to = %storage_key, "Switching parked order scope");
            state.scope = scope.filter(|s| !s.is_empty()).map(str::to_string);
            state.storage_key = storage_key;
            self.core.load_into(&mut state, false);
            self.core.change_event(&state, ChangeReason::Loaded)
        };

        self.core.publish(event);
    }

    /// Re-read the current key; a corrupt payload leaves the list untouched
    pub fn reload(&self) {
        let event = {
            let mut state = self.core.state.lock();
            if state.disposed {
                return;
            }
            self.core.load_into(&mut state, true);
            self.core.change_event(&state, ChangeReason::Loaded)
        };

        self.core.publish(event);
    }

    // ========== Queries ==========

    /// Snapshot of the list, newest first
    pub fn orders(&self) -> Vec<ParkedOrder> {
        self.core.state.lock().orders.clone()
    }

    pub fn get(&self, id: &str) -> Option<ParkedOrder> {
        self.core
            .state
            .lock()
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
    }

    /// Every order carrying `code`, newest first (codes are not unique)
    pub fn find_by_code(&self, code: &str) -> Vec<ParkedOrder> {
        let code = code.trim();
        self.core
            .state
            .lock()
            .orders
            .iter()
            .filter(|o| o.code == code)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.core.state.lock().orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.state.lock().orders.is_empty()
    }

    pub fn scope(&self) -> Option<String> {
        self.core.state.lock().scope.clone()
    }

    pub fn storage_key(&self) -> String {
        self.core.state.lock().storage_key.clone()
    }

    /// Subscribe to list changes; dropping the receiver unsubscribes
    pub fn subscribe(&self) -> broadcast::Receiver<ParkedOrdersChanged> {
        self.core.change_tx.subscribe()
    }

    // ========== Lifecycle ==========

    /// Start the periodic expiry sweep on the current tokio runtime
    ///
    /// At most one sweeper runs per store; calling this again while it runs
    /// is a no-op. Returns whether a sweeper is running afterwards.
    pub fn start_sweeper(&self) -> bool {
        let mut sweeper = self.sweeper.lock();

        if self.core.state.lock().disposed {
            tracing::warn!("Parked order store disposed, not starting sweeper");
            return false;
        }

        if let Some(handle) = sweeper.as_ref()
            && !handle.is_finished()
        {
            tracing::debug!("Parked order sweeper already running");
            return true;
        }

        if tokio::runtime::Handle::try_current().is_err() {
            tracing::error!("No tokio runtime, parked order sweeper not started");
            return false;
        }

        let core = Arc::clone(&self.core);
        let interval = self.sweep_interval;
        *sweeper = Some(TaskHandle::spawn("parked_order_sweeper", move |shutdown| {
            ExpirySweeper::new(core, interval, shutdown).run()
        }));
        true
    }

    pub fn is_sweeper_running(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Tear the store down: stop the sweeper and refuse further writes
    ///
    /// The persisted list is left as is. Calling it twice is harmless.
    pub async fn dispose(&self) {
        {
            let mut state = self.core.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
        }

        let handle = self.sweeper.lock().take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }

        tracing::info!(storage_key = %self.storage_key(), "Parked order store disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.core.state.lock().disposed
    }
}
