//! util — общие хелперы.

/// Текущее Unix-время в секундах (i64 — под поля first/last_time_seen).
#[inline]
pub fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    now.as_secs().min(i64::MAX as u64) as i64
}
