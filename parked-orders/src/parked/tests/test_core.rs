use super::*;

// ========================================================================
// park_order
// ========================================================================

#[test]
fn test_park_empty_cart_is_noop() {
    let h = Harness::new();
    let mut rx = h.bus.subscribe();
    let store = h.store(None);

    assert_eq!(store.park_order(&[], Some("table 2")), None);
    assert!(store.is_empty());
    assert_eq!(h.raw_payload(None), None);
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_park_computes_total() {
    let h = Harness::new();
    let store = h.store(None);

    let code = store
        .park_order(&[item(10.0, 2), item(5.0, 1)], None)
        .unwrap();

    let orders = store.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].code, code);
    assert_eq!(orders[0].total, 25.0);
    assert_eq!(orders[0].timestamp, START_MILLIS);
}

#[test]
fn test_park_code_is_in_range() {
    let h = Harness::new();
    let store = h.store(None);

    for _ in 0..50 {
        let code = store.park_order(&[item(1.0, 1)], None).unwrap();
        let n: u16 = code.parse().unwrap();
        assert!((1000..=9999).contains(&n), "code out of range: {code}");
    }
    assert_eq!(store.len(), 50);
}

#[test]
fn test_park_keeps_newest_first() {
    let h = Harness::new();
    let store = h.store(None);

    store.park_order(&[item(1.0, 1)], Some("A")).unwrap();
    h.clock.advance(Duration::from_secs(30));
    store.park_order(&[item(2.0, 1)], Some("B")).unwrap();

    let notes: Vec<_> = store
        .orders()
        .into_iter()
        .map(|o| o.note.unwrap())
        .collect();
    assert_eq!(notes, vec!["B", "A"]);
}

#[test]
fn test_park_persists_before_returning() {
    let h = Harness::new();
    let store = h.store(Some("shop-1"));

    store
        .park_order(&[item(3.5, 2)], Some("Table 4"))
        .unwrap();

    assert_eq!(h.persisted(Some("shop-1")), store.orders());
}

#[test]
fn test_park_notifies_success_with_code() {
    let h = Harness::new();
    let mut rx = h.bus.subscribe();
    let store = h.store(None);

    let code = store.park_order(&[item(1.0, 1)], None).unwrap();

    let notifications = drain(&mut rx);
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Success);
    assert!(notifications[0].message.contains(&code));
    assert_eq!(notifications[0].data.as_ref().unwrap()["code"], code.as_str());
}

#[test]
fn test_park_snapshots_items() {
    let h = Harness::new();
    let store = h.store(None);

    let mut cart = vec![item(2.0, 1), item(3.0, 2).with_note("no ice")];
    store.park_order(&cart, None).unwrap();

    // later edits to the live cart do not leak into the parked order
    cart.clear();
    let parked = &store.orders()[0];
    assert_eq!(parked.items.len(), 2);
    assert_eq!(parked.items[1].note.as_deref(), Some("no ice"));
}

#[test]
fn test_park_out_of_range_total_does_not_panic() {
    let h = Harness::new();
    let store = h.store(None);

    let code = store.park_order(&[item(1e20, 1_000_000_000)], None);
    assert!(code.is_some());
    assert_eq!(store.orders()[0].total, 1e29);
    assert_eq!(h.persisted(None), store.orders());
}

#[test]
fn test_park_rejects_non_finite_total() {
    let h = Harness::new();
    let mut rx = h.bus.subscribe();
    let store = h.store(None);

    assert_eq!(store.park_order(&[item(f64::NAN, 1), item(1e30, 1)], None), None);
    assert_eq!(store.park_order(&[item(f64::MAX, 2)], None), None);

    assert!(store.is_empty());
    assert_eq!(h.raw_payload(None), None);

    let notifications = drain(&mut rx);
    assert_eq!(notifications.len(), 2);
    assert!(
        notifications
            .iter()
            .all(|n| n.level == NotificationLevel::Warning)
    );

    // the store keeps working afterwards
    assert!(store.park_order(&[item(2.0, 1)], None).is_some());
}

#[test]
fn test_park_keeps_sub_cent_total() {
    let h = Harness::new();
    let store = h.store(None);

    store.park_order(&[item(1.499, 3)], None).unwrap();
    let total = store.orders()[0].total;
    assert!((total - 4.497).abs() < 1e-12, "total = {total}");
}

// ========================================================================
// remove_order / retrieve_order
// ========================================================================

#[test]
fn test_remove_order() {
    let h = Harness::new();
    let store = h.store(None);
    store.park_order(&[item(1.0, 1)], Some("A")).unwrap();
    store.park_order(&[item(2.0, 1)], Some("B")).unwrap();
    let target = store.orders()[1].clone();

    let mut rx = h.bus.subscribe();
    assert!(store.remove_order(&target.id));

    assert_eq!(store.len(), 1);
    assert!(store.get(&target.id).is_none());
    assert_eq!(h.persisted(None), store.orders());

    let notifications = drain(&mut rx);
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Info);
}

#[test]
fn test_remove_unknown_id_is_noop() {
    let h = Harness::new();
    let store = h.store(None);
    store.park_order(&[item(1.0, 1)], None).unwrap();
    let writes_before = h.storage.writes();

    let mut rx = h.bus.subscribe();
    assert!(!store.remove_order("does-not-exist"));

    assert_eq!(store.len(), 1);
    assert_eq!(h.storage.writes(), writes_before);
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_retrieve_is_destructive() {
    let h = Harness::new();
    let store = h.store(None);
    store.park_order(&[item(10.0, 2)], Some("Table 9")).unwrap();
    let parked = store.orders()[0].clone();

    let mut rx = h.bus.subscribe();
    let retrieved = store.retrieve_order(&parked.id).unwrap();
    assert_eq!(retrieved, parked);
    assert!(store.is_empty());
    assert!(h.persisted(None).is_empty());

    assert_eq!(store.retrieve_order(&parked.id), None);

    // only the first retrieval notifies
    let notifications = drain(&mut rx);
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Info);
}

// ========================================================================
// Queries
// ========================================================================

#[test]
fn test_find_by_code_returns_all_matches() {
    let h = Harness::new();
    let mut older = h.order_aged(10 * 60 * 1000);
    let mut newer = h.order_aged(60 * 1000);
    let mut other = h.order_aged(30 * 1000);
    older.code = "4821".to_string();
    newer.code = "4821".to_string();
    other.code = "1111".to_string();
    h.seed(None, &[other.clone(), newer.clone(), older.clone()]);

    let store = h.store(None);
    let found = store.find_by_code(" 4821 ");
    assert_eq!(found, vec![newer, older]);

    // lookup does not remove anything
    assert_eq!(store.len(), 3);
    assert!(store.find_by_code("9999").is_empty());
}

#[test]
fn test_get_by_id() {
    let h = Harness::new();
    let store = h.store(None);
    store.park_order(&[item(1.0, 1)], None).unwrap();
    let id = store.orders()[0].id.clone();

    assert_eq!(store.get(&id).unwrap().id, id);
    assert!(store.get("missing").is_none());
    assert_eq!(store.len(), 1);
}

// ========================================================================
// Failure paths
// ========================================================================

#[test]
fn test_write_failure_is_not_surfaced() {
    let h = Harness::new();
    let store = h.store(None);
    h.storage.set_fail_writes(true);

    let code = store.park_order(&[item(1.0, 1)], None);
    assert!(code.is_some());
    assert_eq!(store.len(), 1);
    assert_eq!(h.raw_payload(None), None);

    let id = store.orders()[0].id.clone();
    assert!(store.remove_order(&id));
    assert!(store.is_empty());
}

// ========================================================================
// Change events
// ========================================================================

#[test]
fn test_change_events_carry_new_list() {
    let h = Harness::new();
    let store = h.store(Some("shop-1"));
    let mut changes = store.subscribe();

    store.park_order(&[item(1.0, 1)], None).unwrap();
    let event = changes.try_recv().unwrap();
    assert_eq!(event.reason, ChangeReason::Parked);
    assert_eq!(event.storage_key, Harness::key(Some("shop-1")));
    assert_eq!(event.orders.len(), 1);

    let id = event.orders[0].id.clone();
    store.retrieve_order(&id).unwrap();
    let event = changes.try_recv().unwrap();
    assert_eq!(event.reason, ChangeReason::Removed);
    assert!(event.orders.is_empty());

    // misses do not publish
    store.remove_order(&id);
    assert!(changes.try_recv().is_err());
}

// ========================================================================
// Dispose
// ========================================================================

#[tokio::test]
async fn test_disposed_store_ignores_writes() {
    let h = Harness::new();
    let store = h.store(None);
    store.park_order(&[item(1.0, 1)], None).unwrap();
    let id = store.orders()[0].id.clone();

    store.dispose().await;
    assert!(store.is_disposed());

    assert_eq!(store.park_order(&[item(2.0, 1)], None), None);
    assert!(!store.remove_order(&id));
    assert_eq!(store.retrieve_order(&id), None);

    // persisted list is left as it was
    assert_eq!(h.persisted(None).len(), 1);

    // second dispose is harmless
    store.dispose().await;
}
