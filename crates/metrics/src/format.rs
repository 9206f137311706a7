use overlay_core::Reading;

/// Placeholder shown for readings that do not exist.
pub const NOT_AVAILABLE: &str = "N/A";

/// Format a millisecond reading (e.g. `"4.10 ms"`), or `"N/A"`.
pub fn format_ms(reading: Reading, precision: usize) -> String {
    match reading.value() {
        Some(ms) => format!("{ms:.precision$} ms"),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Format a plain number reading (e.g. an FPS value), or `"N/A"`.
pub fn format_value(reading: Reading, precision: usize) -> String {
    match reading.value() {
        Some(v) => format!("{v:.precision$}"),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_ms_two_digits() {
        assert_eq!(format_ms(Reading::Value(4.104), 2), "4.10 ms");
    }

    #[test]
    fn format_ms_zero_is_not_na() {
        assert_eq!(format_ms(Reading::Zero, 2), "0.00 ms");
    }

    #[test]
    fn format_ms_unavailable() {
        assert_eq!(format_ms(Reading::Unavailable, 2), "N/A");
    }

    #[test]
    fn format_value_one_digit() {
        assert_eq!(format_value(Reading::Value(72.34), 1), "72.3");
    }
}
