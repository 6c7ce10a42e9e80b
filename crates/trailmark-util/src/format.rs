//! Human-readable formatting for distances, durations and timestamps

use crate::local_from_millis;

/// Format a distance in meters.
///
/// Below one kilometer this is whole meters (`"999m"`), otherwise kilometers
/// with two decimals (`"1.00km"`).
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m", meters.round() as i64)
    } else {
        format!("{:.2}km", meters / 1000.0)
    }
}

/// Format a duration given in milliseconds, dropping leading zero units.
pub fn format_duration_millis(millis: i64) -> String {
    let total_secs = millis.max(0) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Format an epoch-millisecond timestamp as a local wall-clock time.
pub fn format_time(millis: i64) -> String {
    match local_from_millis(millis) {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}

/// Format an epoch-millisecond timestamp as a local date and time.
pub fn format_datetime(millis: i64) -> String {
    match local_from_millis(millis) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "unknown".to_string(),
    }
}
