pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else if ms < 3_600_000 {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    } else {
        let hours = ms / 3_600_000;
        let mins = (ms % 3_600_000) / 60_000;
        format!("{}h {}m", hours, mins)
    }
}

/// Values that round to zero at two decimals, including tiny negatives.
fn rounds_to_zero(amount: f64) -> bool {
    amount.abs() < 0.005
}

/// Fixed two-decimal amount. Never renders `-0.00`.
pub fn format_amount(amount: f64) -> String {
    if rounds_to_zero(amount) {
        "0.00".to_string()
    } else {
        format!("{:.2}", amount)
    }
}

/// Two-decimal delta with an explicit sign: `+3.00`, `-1.25`, `+0.00`.
pub fn format_delta(delta: f64) -> String {
    if rounds_to_zero(delta) {
        "+0.00".to_string()
    } else if delta > 0.0 {
        format!("+{:.2}", delta)
    } else {
        format!("{:.2}", delta)
    }
}

/// Signed percentage, or `N/A` when there was nothing to compare against.
pub fn format_percent(percent: Option<i64>) -> String {
    match percent {
        Some(p) if p > 0 => format!("+{}%", p),
        Some(p) => format!("{}%", p),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(250), "250ms");
        assert_eq!(format_duration(1500), "1.5s");
        assert_eq!(format_duration(125_000), "2m 5s");
        assert_eq!(format_duration(3_660_000), "1h 1m");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(35.0), "35.00");
        assert_eq!(format_amount(0.004), "0.00");
        assert_eq!(format_amount(-0.001), "0.00");
        assert_eq!(format_amount(1234.567), "1234.57");
    }

    #[test]
    fn test_format_delta_sign() {
        assert_eq!(format_delta(3.0), "+3.00");
        assert_eq!(format_delta(-1.25), "-1.25");
        assert_eq!(format_delta(0.0), "+0.00");
        assert_eq!(format_delta(-0.0001), "+0.00");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(Some(25)), "+25%");
        assert_eq!(format_percent(Some(-10)), "-10%");
        assert_eq!(format_percent(Some(0)), "0%");
        assert_eq!(format_percent(None), "N/A");
    }
}
