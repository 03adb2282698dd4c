use chrono::Utc;

/// Returns the current wall-clock time in milliseconds since the UNIX epoch.
///
/// Vote timestamps (`voted_at`) and session closure times are expressed in
/// this unit.
pub fn current_time_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
