//! Human-readable formatting for durations, counts and sizes

/// Format a duration in seconds as `H:MM:SS`, or `M:SS` under an hour
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Format a view or like count: raw below 1,000, then `K`, then `M`
///
/// One decimal place, with halves rounded up.
pub fn format_count(count: u64) -> String {
    if count < 1_000 {
        count.to_string()
    } else if count < 1_000_000 {
        format_tenths(count, 1_000, 'K')
    } else {
        format_tenths(count, 1_000_000, 'M')
    }
}

fn format_tenths(count: u64, unit: u64, suffix: char) -> String {
    let step = unit / 10;
    let tenths = count.saturating_add(step / 2) / step;
    format!("{}.{}{}", tenths / 10, tenths % 10, suffix)
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f64 = bytes as f64;
    let exp = ((bytes_f64.ln() / THRESHOLD.ln()).floor() as usize).min(UNITS.len() - 1);

    if exp == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", bytes_f64 / THRESHOLD.powi(exp as i32), UNITS[exp])
    }
}
