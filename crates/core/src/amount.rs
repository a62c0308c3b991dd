//! Monetary and percentage conversions used by the report tables.

/// Percentage change from `previous` to `current`.
///
/// Returns `None` when either side is unknown, `previous` is zero, or the
/// change does not fit in a finite value.
pub fn percent_change(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let (current, previous) = (current?, previous?);
    if previous == 0.0 {
        return None;
    }
    let change = (current - previous) / previous * 100.0;
    change.is_finite().then_some(change)
}

/// Convert a fractional rate (0.0525) to percent (5.25).
#[inline]
pub fn fraction_to_percent(fraction: f64) -> f64 {
    fraction * 100.0
}

/// Normalize a rate whose unit is not declared by the source.
///
/// Values with magnitude up to 1.5 are fractions, anything larger is
/// already in percent.
pub fn normalize_rate(value: f64) -> f64 {
    if value.abs() <= 1.5 {
        fraction_to_percent(value)
    } else {
        value
    }
}

/// Compact table amount: `139.45M`, `2.10B`, or `N/A` when unknown.
pub fn compact_amount(value: Option<f64>) -> String {
    let Some(x) = value else {
        return "N/A".to_string();
    };

    if x >= 1e12 {
        format!("{:.2}T", x / 1e12)
    } else if x >= 1e9 {
        format!("{:.2}B", x / 1e9)
    } else if x >= 1e6 {
        format!("{:.2}M", x / 1e6)
    } else if x >= 1e3 {
        format!("{:.2}K", x / 1e3)
    } else {
        format!("{:.2}", x)
    }
}

/// Stablecoin market cap, truncated to whole dollars: `$185.458B`.
pub fn format_market_cap(value: f64) -> String {
    let whole = value.trunc();
    if whole >= 1e9 {
        format!("${:.3}B", whole / 1e9)
    } else if whole >= 1e6 {
        format!("${:.2}M", whole / 1e6)
    } else {
        format!("${}", whole as u64)
    }
}

/// 24h trading volume: `$8.55M`, `$412K`, `$950`.
pub fn format_volume(value: f64) -> String {
    if value >= 1e6 {
        format!("${:.2}M", value / 1e6)
    } else if value >= 1e3 {
        format!("${:.0}K", value / 1e3)
    } else {
        format!("${:.0}", value)
    }
}

/// Percent with two decimals: `5.14%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Signed percent change: `+0.21%`, `-0.38%`, empty when unknown.
pub fn format_signed_percent(value: Option<f64>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    let text = format_percent(value);
    if text.starts_with('-') {
        text
    } else {
        format!("+{text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_change() {
        let change = percent_change(Some(110.0), Some(100.0)).unwrap();
        assert!((change - 10.0).abs() < 1e-9);

        let change = percent_change(Some(90.0), Some(100.0)).unwrap();
        assert!((change + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_change_unknown() {
        assert_eq!(percent_change(None, Some(100.0)), None);
        assert_eq!(percent_change(Some(100.0), None), None);
        assert_eq!(percent_change(Some(100.0), Some(0.0)), None);
        assert_eq!(percent_change(Some(100.0), Some(f64::NAN)), None);
        assert_eq!(percent_change(Some(1e300), Some(1e-300)), None);
    }

    #[test]
    fn test_normalize_rate() {
        assert!((normalize_rate(0.0525) - 5.25).abs() < 1e-9);
        assert!((normalize_rate(1.5) - 150.0).abs() < 1e-9);
        assert!((normalize_rate(5.25) - 5.25).abs() < 1e-9);
        assert!((normalize_rate(-0.01) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_compact_amount() {
        assert_eq!(compact_amount(None), "N/A");
        assert_eq!(compact_amount(Some(139_450_000.0)), "139.45M");
        assert_eq!(compact_amount(Some(109_990_000.0)), "109.99M");
        assert_eq!(compact_amount(Some(2_500_000_000.0)), "2.50B");
        assert_eq!(compact_amount(Some(1_200_000_000_000.0)), "1.20T");
        assert_eq!(compact_amount(Some(45_600.0)), "45.60K");
        assert_eq!(compact_amount(Some(12.5)), "12.50");
    }

    #[test]
    fn test_format_market_cap() {
        assert_eq!(format_market_cap(185_458_000_000.0), "$185.458B");
        assert_eq!(format_market_cap(2_750_000.9), "$2.75M");
        assert_eq!(format_market_cap(999.99), "$999");
    }

    #[test]
    fn test_format_volume() {
        assert_eq!(format_volume(8_550_000.0), "$8.55M");
        assert_eq!(format_volume(412_300.0), "$412K");
        assert_eq!(format_volume(950.0), "$950");
    }

    #[test]
    fn test_format_signed_percent() {
        assert_eq!(format_signed_percent(Some(0.21)), "+0.21%");
        assert_eq!(format_signed_percent(Some(-0.38)), "-0.38%");
        assert_eq!(format_signed_percent(Some(0.0)), "+0.00%");
        assert_eq!(format_signed_percent(None), "");
    }
}
