//! Range-health scoring for concentrated positions.
//!
//! The score starts at 100 and loses points for being out of range (no
//! fees accruing) and for sitting inside the 10% buffer next to either
//! boundary (about to fall out). Higher is safer.

use serde::{Deserialize, Serialize};

use crate::models::PriceRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    Low,
    Medium,
    High,
}

/// Bucket a score into a display label.
pub fn label(score: u8) -> RiskLabel {
    match score {
        70..=100 => RiskLabel::Low,
        40..=69 => RiskLabel::Medium,
        _ => RiskLabel::High,
    }
}

/// Score a price range against the current price.
///
/// The boundary buffer only applies to prices that are inside the range;
/// a price that already fell out takes the out-of-range penalty alone.
pub fn score_range(lower: f64, upper: f64, current: f64) -> u8 {
    let mut score: i32 = 100;

    let out_of_range = current < lower || current > upper;
    if out_of_range {
        score -= 30;
    }

    let buffer = 0.1 * (upper - lower);
    let near_lower = current >= lower && current <= lower + buffer;
    let near_upper = current >= upper - buffer && current <= upper;
    if near_lower || near_upper {
        score -= 15;
    }

    score.clamp(0, 100) as u8
}

/// Score from the display strings a position carries; `None` when the
/// strings do not parse or the range is degenerate.
pub fn score_price_range(range: &PriceRange) -> Option<u8> {
    let lower: f64 = range.lower.parse().ok()?;
    let upper: f64 = range.upper.parse().ok()?;
    let current: f64 = range.current.parse().ok()?;
    if !(lower.is_finite() && upper.is_finite() && current.is_finite()) || upper <= lower {
        return None;
    }
    Some(score_range(lower, upper, current))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_price_scores_full() {
        assert_eq!(score_range(2000.0, 3000.0, 2500.0), 100);
    }

    #[test]
    fn out_of_range_price_loses_thirty() {
        assert_eq!(score_range(2000.0, 3000.0, 1900.0), 70);
        assert_eq!(score_range(2000.0, 3000.0, 3100.0), 70);
    }

    #[test]
    fn buffer_zone_loses_fifteen() {
        // buffer is 100 wide on a 2000..3000 range
        assert_eq!(score_range(2000.0, 3000.0, 2050.0), 85);
        assert_eq!(score_range(2000.0, 3000.0, 2950.0), 85);
        assert_eq!(score_range(2000.0, 3000.0, 2101.0), 100);
    }

    #[test]
    fn boundaries_count_as_in_buffer() {
        assert_eq!(score_range(2000.0, 3000.0, 2000.0), 85);
        assert_eq!(score_range(2000.0, 3000.0, 3000.0), 85);
    }

    #[test]
    fn score_never_leaves_bounds() {
        for current in [-1e9, 0.0, 1500.0, 2500.0, 1e12] {
            let score = score_range(2000.0, 3000.0, current);
            assert!(score <= 100);
        }
    }

    #[test]
    fn labels() {
        assert_eq!(label(100), RiskLabel::Low);
        assert_eq!(label(70), RiskLabel::Low);
        assert_eq!(label(69), RiskLabel::Medium);
        assert_eq!(label(40), RiskLabel::Medium);
        assert_eq!(label(39), RiskLabel::High);
        assert_eq!(label(0), RiskLabel::High);
    }

    #[test]
    fn string_ranges_parse_or_abstain() {
        let range = PriceRange {
            lower: "2000".into(),
            upper: "3000".into(),
            current: "2500".into(),
        };
        assert_eq!(score_price_range(&range), Some(100));

        let bad = PriceRange {
            lower: "3000".into(),
            upper: "2000".into(),
            current: "2500".into(),
        };
        assert_eq!(score_price_range(&bad), None);
    }
}
