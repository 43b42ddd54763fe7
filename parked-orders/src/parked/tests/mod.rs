use super::*;
use crate::clock::{Clock, ManualClock};
use crate::core::DEFAULT_KEY_PREFIX;
use crate::notify::NotificationBus;
use crate::storage::{KeyValueStore, RedbStore, StorageError, StorageResult};
use shared::{CartItem, Notification, NotificationLevel};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

mod test_core;

const HOUR_MS: i64 = 60 * 60 * 1000;

/// 2026-01-15 10:00:00 UTC
const START_MILLIS: i64 = 1_768_471_200_000;

fn item(price: f64, quantity: i32) -> CartItem {
    CartItem::new(format!("p-{price}"), "Test Item", price, quantity)
}

// ========================================================================
// Storage with switchable write failures and a write counter
// ========================================================================

struct FlakyStore {
    inner: RedbStore,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: RedbStore::open_in_memory().unwrap(),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("disk full".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        self.inner.keys()
    }
}

// ========================================================================
// Harness: one storage, one manual clock, one notification bus
// ========================================================================

struct Harness {
    storage: Arc<FlakyStore>,
    clock: Arc<ManualClock>,
    bus: NotificationBus,
}

impl Harness {
    fn new() -> Self {
        Self {
            storage: Arc::new(FlakyStore::new()),
            clock: Arc::new(ManualClock::new(START_MILLIS)),
            bus: NotificationBus::new(),
        }
    }

    fn builder(&self, scope: Option<&str>) -> ParkedOrderStoreBuilder {
        ParkedOrderStore::builder(self.storage.clone())
            .scope(scope)
            .clock(self.clock.clone())
            .notifier(Arc::new(self.bus.clone()))
    }

    fn store(&self, scope: Option<&str>) -> ParkedOrderStore {
        self.builder(scope).build()
    }

    fn key(scope: Option<&str>) -> String {
        storage_key_for(DEFAULT_KEY_PREFIX, scope)
    }

    fn raw_payload(&self, scope: Option<&str>) -> Option<String> {
        self.storage.get(&Self::key(scope)).unwrap()
    }

    /// Persisted list, parsed
    fn persisted(&self, scope: Option<&str>) -> Vec<ParkedOrder> {
        self.raw_payload(scope)
            .map(|p| serde_json::from_str(&p).unwrap())
            .unwrap_or_default()
    }

    fn seed(&self, scope: Option<&str>, orders: &[ParkedOrder]) {
        let payload = serde_json::to_string(orders).unwrap();
        self.storage.set(&Self::key(scope), &payload).unwrap();
    }

    fn seed_raw(&self, scope: Option<&str>, payload: &str) {
        self.storage.set(&Self::key(scope), payload).unwrap();
    }

    /// An order created `age_ms` before the current clock
    fn order_aged(&self, age_ms: i64) -> ParkedOrder {
        ParkedOrder::new(&[item(4.0, 1)], None, self.clock.now_millis() - age_ms).unwrap()
    }
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

/// Poll `cond` for up to ~1s
async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
