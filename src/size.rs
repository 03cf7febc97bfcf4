const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
const STEP: f64 = 1024.0;

/// Formats a byte count for humans: plain bytes below 1 KB, otherwise the
/// largest unit up to TB with at most two decimals (`64.6 MB`, `1.0 KB`).
/// Counts beyond the TB range stay in TB.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} bytes");
    }

    let mut value = bytes as f64 / STEP;
    let mut unit = 0;
    while value >= STEP && unit < UNITS.len() - 1 {
        value /= STEP;
        unit += 1;
    }

    format!("{} {}", two_decimals(value), UNITS[unit])
}

/// Rounds like Python's `round(value, 2)`: exact ties go to the even digit.
fn two_decimals(value: f64) -> String {
    let rounded = (value * 100.0).round_ties_even() / 100.0;
    let text = rounded.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

#[cfg(test)]
mod does {
    use super::*;

    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    #[test]
    fn format_each_unit() {
        assert_eq!(format_size(0), "0 bytes");
        assert_eq!(format_size(1023), "1023 bytes");
        assert_eq!(format_size(KB), "1.0 KB");
        assert_eq!(format_size(MB), "1.0 MB");
        assert_eq!(format_size(GB), "1.0 GB");
        assert_eq!(format_size(TB), "1.0 TB");
    }

    #[test]
    fn round_to_two_decimals() {
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(KB + 10), "1.01 KB");
        assert_eq!(format_size(67_737_190), "64.6 MB");
    }

    #[test]
    fn round_exact_ties_to_even() {
        assert_eq!(format_size(1152), "1.12 KB");
        assert_eq!(format_size(1408), "1.38 KB");
        assert_eq!(format_size(MB + 128 * KB), "1.12 MB");
    }

    #[test]
    fn clamp_to_terabytes() {
        assert_eq!(format_size(2048 * TB), "2048.0 TB");
        assert!(format_size(u64::MAX).ends_with(" TB"));
    }

    #[test]
    fn never_shrink_unit_as_input_grows() {
        let rank = |s: String| match s.rsplit(' ').next() {
            Some("bytes") => 0,
            Some("KB") => 1,
            Some("MB") => 2,
            Some("GB") => 3,
            Some("TB") => 4,
            other => panic!("unexpected unit {other:?}"),
        };

        let mut last = 0;
        for shift in 0..64 {
            let current = rank(format_size(1u64 << shift));
            assert!(current >= last);
            last = current;
        }
    }
}
