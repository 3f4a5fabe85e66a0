/// Scale a byte count into a display value and its unit (1024 base).
/// The value keeps two decimals above bytes so short uploads still show
/// visible movement.
pub fn scaled(bytes: u64) -> (String, &'static str) {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        (format!("{}", size as u64), UNITS[unit_idx])
    } else {
        (format!("{:.2}", size), UNITS[unit_idx])
    }
}

/// Format bytes into a human-readable string, e.g. "1.50 MB".
pub fn display_size(bytes: u64) -> String {
    let (value, unit) = scaled(bytes);
    format!("{} {}", value, unit)
}

/// Progress fraction as a whole percentage, floored and capped at 100.
/// A zero total yields 0 rather than dividing by zero.
pub fn upload_percent(uploaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    (uploaded as u128 * 100 / total as u128).min(100) as u8
}

/// Partial-upload display string: "<value>/<total>" when the partial
/// value lands in the same unit as the total, "<value> <unit>/<total>"
/// otherwise. The total's display string and unit are computed once when
/// the upload size becomes known and carried here unchanged.
pub fn format_upload(uploaded: u64, total_display: &str, total_unit: &str) -> String {
    let (value, unit) = scaled(uploaded);
    if unit == total_unit {
        format!("{}/{}", value, total_display)
    } else {
        format!("{} {}/{}", value, unit, total_display)
    }
}

/// Render an estimated duration as "1h 2min 5s", dropping zero
/// components. Durations under one second render as the empty string;
/// callers treat that as "almost done".
pub fn format_time_left(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}min", minutes));
    }
    if seconds > 0 {
        parts.push(format!("{}s", seconds));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_through_units() {
        assert_eq!(display_size(0), "0 B");
        assert_eq!(display_size(512), "512 B");
        assert_eq!(display_size(1024), "1.00 KB");
        assert_eq!(display_size(1536), "1.50 KB");
        assert_eq!(display_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(display_size(1024 * 1024 * 1024), "1.00 GB");
    }

    #[test]
    fn percent_guards_zero_total() {
        assert_eq!(upload_percent(0, 0), 0);
        assert_eq!(upload_percent(50, 0), 0);
    }

    #[test]
    fn percent_floors_and_caps() {
        assert_eq!(upload_percent(400, 1000), 40);
        assert_eq!(upload_percent(999, 1000), 99);
        assert_eq!(upload_percent(1000, 1000), 100);
        assert_eq!(upload_percent(1500, 1000), 100);
        // no overflow near u64::MAX
        assert_eq!(upload_percent(u64::MAX, u64::MAX), 100);
    }

    #[test]
    fn upload_string_elides_matching_unit() {
        let (_, unit) = scaled(10 * 1024 * 1024);
        assert_eq!(unit, "MB");
        assert_eq!(
            format_upload(5 * 1024 * 1024, "10.00 MB", unit),
            "5.00/10.00 MB"
        );
    }

    #[test]
    fn upload_string_keeps_differing_unit() {
        assert_eq!(
            format_upload(512 * 1024, "10.00 MB", "MB"),
            "512.00 KB/10.00 MB"
        );
    }

    #[test]
    fn time_left_rendering() {
        assert_eq!(format_time_left(0), "");
        assert_eq!(format_time_left(400), "");
        assert_eq!(format_time_left(5_000), "5s");
        assert_eq!(format_time_left(65_000), "1min 5s");
        assert_eq!(format_time_left(3_725_000), "1h 2min 5s");
        assert_eq!(format_time_left(3_600_000), "1h");
    }
}
