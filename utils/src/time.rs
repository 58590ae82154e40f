//! Time formatting helpers.

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// `"never"` for `None`, otherwise `"<duration> ago"`.
pub fn format_ago(elapsed_secs: Option<u64>) -> String {
    match elapsed_secs {
        Some(secs) => format!("{} ago", format_duration(secs)),
        None => "never".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(300), "5m 0s");
        assert_eq!(format_duration(3_660), "1h 1m");
        assert_eq!(format_duration(90_000), "1d 1h");
    }

    #[test]
    fn ago() {
        assert_eq!(format_ago(None), "never");
        assert_eq!(format_ago(Some(5)), "5s ago");
    }
}
