/// Whole percentage of a download, floored and capped at 100.
/// `None` when the total size is unknown or zero.
pub fn progress_percent(received: u64, total: Option<u64>) -> Option<u8> {
    match total {
        Some(total) if total > 0 => {
            let percent = (u128::from(received) * 100 / u128::from(total)).min(100);
            Some(percent as u8)
        }
        _ => None,
    }
}

/// Human readable byte count for status lines and logs.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent_floors() {
        assert_eq!(progress_percent(250_000, Some(1_000_000)), Some(25));
        assert_eq!(progress_percent(999, Some(1000)), Some(99));
        assert_eq!(progress_percent(1000, Some(1000)), Some(100));
        assert_eq!(progress_percent(1, Some(3)), Some(33));
    }

    #[test]
    fn test_progress_percent_unknown_total() {
        assert_eq!(progress_percent(5000, None), None);
        assert_eq!(progress_percent(5000, Some(0)), None);
    }

    #[test]
    fn test_progress_percent_caps_overshoot() {
        assert_eq!(progress_percent(1500, Some(1000)), Some(100));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(1_572_864), "1.5 MB");
    }
}
