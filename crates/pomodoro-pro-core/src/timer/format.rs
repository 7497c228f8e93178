//! Human-readable renderings of second counts.

/// Countdown clock: `MM:SS`, or `HH:MM:SS` once there is at least an hour.
pub fn format_clock(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Compact task-list duration such as `1h 30m` or `5m 30s`.
///
/// Seconds are only shown for short tasks (no hours, under ten minutes).
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "0 min".to_string();
    }
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;

    let mut parts = Vec::new();
    if h > 0 {
        parts.push(format!("{h}h"));
    }
    if m > 0 {
        parts.push(format!("{m}m"));
    }
    if s > 0 && h == 0 && m < 10 {
        parts.push(format!("{s}s"));
    }
    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

/// Elapsed fraction of a run, 0.0 ..= 1.0.
pub fn progress(total: u64, left: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (total.saturating_sub(left) as f64 / total as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_pads_hours_only_when_present() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(25 * 60), "25:00");
        assert_eq!(format_clock(3600), "01:00:00");
        assert_eq!(format_clock(5400 + 7), "01:30:07");
    }

    #[test]
    fn duration_matches_task_list_style() {
        assert_eq!(format_duration(0), "0 min");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(330), "5m 30s");
        assert_eq!(format_duration(630), "10m");
        assert_eq!(format_duration(5400), "1h 30m");
        assert_eq!(format_duration(3605), "1h");
    }

    #[test]
    fn progress_is_bounded() {
        assert_eq!(progress(0, 0), 0.0);
        assert_eq!(progress(100, 100), 0.0);
        assert_eq!(progress(100, 25), 0.75);
        assert_eq!(progress(100, 500), 0.0);
    }
}
