/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Milliseconds elapsed between `since` and `now`, never negative
///
/// Timestamps written by a terminal whose clock ran ahead count as age 0.
pub fn elapsed_millis(since: i64, now: i64) -> i64 {
    now.saturating_sub(since).max(0)
}
