//! 挂单数据模型
//!
//! 挂单创建后不可修改：`total` 在创建时计算一次并持久化，之后不再重算。

use rand::Rng;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use shared::CartItem;

/// Parked orders older than this are purged (2 hours)
pub const EXPIRY_WINDOW_MS: i64 = 2 * 60 * 60 * 1000;

/// Retrieval codes are drawn uniformly from this range (4 digits, never zero-padded)
pub const CODE_MIN: u16 = 1000;
pub const CODE_MAX: u16 = 9999;


/// A suspended cart waiting to be resumed at the till
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkedOrder {
    /// UUID v4
    pub id: String,
    /// 4 位取单码，仅用于展示，不保证唯一
    pub code: String,
    /// 创建时间 (Unix millis)
    pub timestamp: i64,
    pub items: Vec<CartItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub total: f64,
}

impl ParkedOrder {
    /// Build a new parked order from a cart snapshot
    ///
    /// Returns `None` for an empty cart or a cart whose total is not a
    /// finite number.
    pub fn new(items: &[CartItem], note: Option<&str>, now_millis: i64) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        let total = order_total(items)?;

        Some(Self {
            id: uuid::Uuid::new_v4().to_string(),
            code: generate_code(),
            timestamp: now_millis,
            items: items.to_vec(),
            note: note
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            total,
        })
    }

    /// Age relative to `now_millis`; timestamps in the future count as 0
    pub fn age_ms(&self, now_millis: i64) -> i64 {
        shared::util::elapsed_millis(self.timestamp, now_millis)
    }

    /// Whether the order has outlived [`EXPIRY_WINDOW_MS`]
    pub fn is_expired(&self, now_millis: i64) -> bool {
        self.age_ms(now_millis) > EXPIRY_WINDOW_MS
    }

    /// Milliseconds until the order expires (0 once expired)
    pub fn remaining_ms(&self, now_millis: i64) -> i64 {
        (EXPIRY_WINDOW_MS - self.age_ms(now_millis)).max(0)
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i64::from(i.quantity)).sum()
    }
}

/// Draw a retrieval code in `1000..=9999`
///
/// Codes are not checked against other parked orders; two orders can share
/// a code and lookups that must be exact go through the id.
pub fn generate_code() -> String {
    rand::thread_rng()
        .gen_range(CODE_MIN..=CODE_MAX)
        .to_string()
}

/// Sum of `price * quantity` over the cart
///
/// `None` when a price is not representable as `Decimal` (NaN, infinite,
/// beyond ±7.9e28) or the sum overflows.
pub fn cart_total(items: &[CartItem]) -> Option<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |acc, item| {
        let line = Decimal::from_f64(item.price)?.checked_mul(Decimal::from(item.quantity))?;
        acc.checked_add(line)
    })
}

/// Stored total: exact `Decimal` sum, plain float sum when the cart is out
/// of `Decimal` range, `None` when the result is not finite
fn order_total(items: &[CartItem]) -> Option<f64> {
    if let Some(total) = cart_total(items).and_then(|t| t.normalize().to_f64()) {
        return Some(total);
    }

    let total: f64 = items
        .iter()
        .map(|item| item.price * f64::from(item.quantity))
        .sum();
    total.is_finite().then_some(total)
}
