//! Reward tiers unlocked by the number of items found.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    FIRST_DISCOUNT_PCT, GRAND_PRIZE_USD, SECOND_DISCOUNT_PCT, THRESHOLD_FIRST_DISCOUNT,
    THRESHOLD_GRAND_PRIZE, THRESHOLD_SECOND_DISCOUNT,
};

/// Discount or prize level implied by the current found count.
///
/// Variants are ordered so that `tier_a <= tier_b` whenever `tier_a` needs
/// fewer finds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardTier {
    None,
    TenPercent,
    TwentyPercent,
    GrandPrize,
}

impl RewardTier {
    /// Total over every count; anything past the hunt size is the top tier.
    #[must_use]
    pub const fn for_count(found: usize) -> Self {
        if found >= THRESHOLD_GRAND_PRIZE {
            Self::GrandPrize
        } else if found >= THRESHOLD_SECOND_DISCOUNT {
            Self::TwentyPercent
        } else if found >= THRESHOLD_FIRST_DISCOUNT {
            Self::TenPercent
        } else {
            Self::None
        }
    }

    /// Discount granted by this tier, in percent.
    #[must_use]
    pub const fn discount_pct(self) -> u8 {
        match self {
            Self::None => 0,
            Self::TenPercent => FIRST_DISCOUNT_PCT,
            Self::TwentyPercent | Self::GrandPrize => SECOND_DISCOUNT_PCT,
        }
    }

    #[must_use]
    pub const fn grand_prize_entry(self) -> bool {
        matches!(self, Self::GrandPrize)
    }

    /// Short tier label, e.g. `10%` or `20%+grand-prize`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::TenPercent => "10%",
            Self::TwentyPercent => "20%",
            Self::GrandPrize => "20%+grand-prize",
        }
    }

    /// Progress banner for the tier; empty below the first threshold.
    #[must_use]
    pub fn message(self) -> String {
        match self {
            Self::None => String::new(),
            Self::TenPercent => format!("🎁 Nice work! You've earned {FIRST_DISCOUNT_PCT}% discount!"),
            Self::TwentyPercent => {
                format!("💰 Great progress! You've earned {SECOND_DISCOUNT_PCT}% discount!")
            }
            Self::GrandPrize => format!(
                "🏆 All items found! You've earned {SECOND_DISCOUNT_PCT}% discount + ${GRAND_PRIZE_USD} grand prize entry!"
            ),
        }
    }
}

impl fmt::Display for RewardTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One line of the rewards checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRow {
    pub icon: String,
    pub text: String,
    pub threshold: usize,
    pub achieved: bool,
}

/// Rewards checklist with achieved flags for the given count.
#[must_use]
pub fn reward_rows(found: usize) -> Vec<RewardRow> {
    let rows = [
        (
            "🎁",
            format!("Find {THRESHOLD_FIRST_DISCOUNT}+ items → {FIRST_DISCOUNT_PCT}% discount"),
            THRESHOLD_FIRST_DISCOUNT,
        ),
        (
            "💰",
            format!("Find {THRESHOLD_SECOND_DISCOUNT}+ items → {SECOND_DISCOUNT_PCT}% discount"),
            THRESHOLD_SECOND_DISCOUNT,
        ),
        (
            "🌟",
            format!("Find all {THRESHOLD_GRAND_PRIZE} → ${GRAND_PRIZE_USD} grand prize"),
            THRESHOLD_GRAND_PRIZE,
        ),
    ];
    rows.into_iter()
        .map(|(icon, text, threshold)| RewardRow {
            icon: icon.to_string(),
            text,
            threshold,
            achieved: found >= threshold,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(RewardTier::for_count(0), RewardTier::None);
        assert_eq!(RewardTier::for_count(4), RewardTier::None);
        assert_eq!(RewardTier::for_count(5), RewardTier::TenPercent);
        assert_eq!(RewardTier::for_count(6), RewardTier::TenPercent);
        assert_eq!(RewardTier::for_count(7), RewardTier::TwentyPercent);
        assert_eq!(RewardTier::for_count(9), RewardTier::TwentyPercent);
        assert_eq!(RewardTier::for_count(10), RewardTier::GrandPrize);
    }

    #[test]
    fn tiers_are_monotonic() {
        for count in 0..10 {
            assert!(RewardTier::for_count(count) <= RewardTier::for_count(count + 1));
        }
    }

    #[test]
    fn labels_and_discounts() {
        assert_eq!(RewardTier::for_count(4).label(), "none");
        assert_eq!(RewardTier::for_count(5).label(), "10%");
        assert_eq!(RewardTier::for_count(7).label(), "20%");
        assert_eq!(RewardTier::for_count(10).to_string(), "20%+grand-prize");
        assert_eq!(RewardTier::GrandPrize.discount_pct(), 20);
        assert!(RewardTier::GrandPrize.grand_prize_entry());
        assert!(!RewardTier::TwentyPercent.grand_prize_entry());
    }

    #[test]
    fn messages_match_tiers() {
        assert!(RewardTier::None.message().is_empty());
        assert!(RewardTier::TenPercent.message().contains("10% discount"));
        assert!(RewardTier::GrandPrize.message().contains("$5000 grand prize entry"));
    }

    #[test]
    fn rows_mark_achievements() {
        let rows = reward_rows(7);
        assert_eq!(rows.len(), 3);
        assert!(rows[0].achieved && rows[1].achieved);
        assert!(!rows[2].achieved);
        assert_eq!(rows[0].text, "Find 5+ items → 10% discount");
        assert_eq!(rows[2].text, "Find all 10 → $5000 grand prize");
    }
}
