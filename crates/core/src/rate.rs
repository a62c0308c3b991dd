//! Lending rate representation with optional incentive breakdown.
//!
//! All values are in percent units (5.25 means 5.25%).

use crate::amount::format_percent;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One labelled part of a composite rate (e.g. "lend", "WLFI", "KMNO").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateComponent {
    pub label: CompactString,
    pub percent: f64,
}

impl RateComponent {
    pub fn new(label: &str, percent: f64) -> Self {
        Self {
            label: CompactString::new(label),
            percent,
        }
    }
}

/// Supply or borrow rate as reported by a lending protocol.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Rate {
    /// Source did not report a rate.
    #[default]
    Unavailable,
    /// Single rate without breakdown.
    Simple(f64),
    /// Supply rate plus reward incentive; headline is the sum.
    Boosted { base: f64, incentive: f64 },
    /// Borrow rate minus reward incentive; headline is the net cost.
    Rebated { borrow: f64, incentive: f64 },
    /// Sum of several labelled parts.
    Composite(Vec<RateComponent>),
    /// Spread of rates across several underlying markets.
    Range { min: f64, max: f64 },
}

impl Rate {
    /// Supply-side rate; only carries a breakdown when the incentive is positive.
    pub fn supply(base: f64, incentive: f64) -> Self {
        if incentive > 0.0 {
            Rate::Boosted { base, incentive }
        } else {
            Rate::Simple(base)
        }
    }

    /// Borrow-side rate; only carries a breakdown when the incentive is positive.
    pub fn borrow(borrow: f64, incentive: f64) -> Self {
        if incentive > 0.0 {
            Rate::Rebated { borrow, incentive }
        } else {
            Rate::Simple(borrow)
        }
    }

    /// Range over a set of rates, `Unavailable` when empty.
    pub fn range(rates: &[f64]) -> Self {
        let Some(&first) = rates.first() else {
            return Rate::Unavailable;
        };
        let (min, max) = rates
            .iter()
            .fold((first, first), |(lo, hi), &r| (lo.min(r), hi.max(r)));
        Rate::Range { min, max }
    }

    /// Effective single rate, if the rate reduces to one.
    pub fn headline(&self) -> Option<f64> {
        match self {
            Rate::Unavailable | Rate::Range { .. } => None,
            Rate::Simple(rate) => Some(*rate),
            Rate::Boosted { base, incentive } => Some(base + incentive),
            Rate::Rebated { borrow, incentive } => Some(borrow - incentive),
            Rate::Composite(parts) => Some(parts.iter().map(|p| p.percent).sum()),
        }
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        !matches!(self, Rate::Unavailable)
    }

    /// Table cell text: `7.73%`, `4.10%-6.20%`, or `N/A`.
    pub fn headline_text(&self) -> String {
        match self {
            Rate::Unavailable => "N/A".to_string(),
            Rate::Range { min, max } => {
                format!("{}-{}", format_percent(*min), format_percent(*max))
            }
            _ => self
                .headline()
                .map(format_percent)
                .unwrap_or_else(|| "N/A".to_string()),
        }
    }

    /// Breakdown text for the "Rate details" section, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            Rate::Boosted { base, incentive } => Some(format!(
                "base {} + inc {}",
                format_percent(*base),
                format_percent(*incentive)
            )),
            Rate::Rebated { borrow, incentive } => Some(format!(
                "borrow {} - inc {}",
                format_percent(*borrow),
                format_percent(*incentive)
            )),
            Rate::Composite(parts) if !parts.is_empty() => Some(
                parts
                    .iter()
                    .map(|p| format!("{} {}", p.label, format_percent(p.percent)))
                    .collect::<Vec<_>>()
                    .join(" + "),
            ),
            _ => None,
        }
    }

    /// Every raw number carried by this rate, for validation.
    pub(crate) fn values(&self) -> Vec<f64> {
        match self {
            Rate::Unavailable => Vec::new(),
            Rate::Simple(rate) => vec![*rate],
            Rate::Boosted { base, incentive } => vec![*base, *incentive],
            Rate::Rebated { borrow, incentive } => vec![*borrow, *incentive],
            Rate::Composite(parts) => parts.iter().map(|p| p.percent).collect(),
            Rate::Range { min, max } => vec![*min, *max],
        }
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{} ({})", self.headline_text(), detail),
            None => f.write_str(&self.headline_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_without_incentive_is_simple() {
        assert_eq!(Rate::supply(8.75, 0.0), Rate::Simple(8.75));
        assert_eq!(
            Rate::supply(2.93, 4.80),
            Rate::Boosted {
                base: 2.93,
                incentive: 4.80
            }
        );
    }

    #[test]
    fn test_boosted_display() {
        let rate = Rate::supply(2.93, 4.80);
        assert_eq!(rate.headline_text(), "7.73%");
        assert_eq!(rate.to_string(), "7.73% (base 2.93% + inc 4.80%)");
    }

    #[test]
    fn test_rebated_display() {
        let rate = Rate::borrow(6.50, 1.25);
        assert_eq!(rate.headline_text(), "5.25%");
        assert_eq!(rate.detail().as_deref(), Some("borrow 6.50% - inc 1.25%"));
    }

    #[test]
    fn test_composite_display() {
        let rate = Rate::Composite(vec![
            RateComponent::new("lend", 5.0),
            RateComponent::new("WLFI", 2.5),
            RateComponent::new("KMNO", 0.25),
        ]);
        assert_eq!(rate.headline_text(), "7.75%");
        assert_eq!(
            rate.detail().as_deref(),
            Some("lend 5.00% + WLFI 2.50% + KMNO 0.25%")
        );
    }

    #[test]
    fn test_range() {
        let rate = Rate::range(&[6.2, 4.1, 5.0]);
        assert_eq!(rate, Rate::Range { min: 4.1, max: 6.2 });
        assert_eq!(rate.headline_text(), "4.10%-6.20%");
        assert_eq!(rate.headline(), None);
        assert_eq!(rate.detail(), None);
        assert_eq!(Rate::range(&[]), Rate::Unavailable);
    }

    #[test]
    fn test_unavailable() {
        let rate = Rate::default();
        assert!(!rate.is_available());
        assert_eq!(rate.to_string(), "N/A");
        assert!(rate.values().is_empty());
    }
}
