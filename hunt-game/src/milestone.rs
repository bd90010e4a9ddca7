//! Milestone detection for found-count changes.
//!
//! Evaluation is a pure function of the count before and after a change. No
//! state is carried between calls, so restarting a hunt and finding items again
//! fires the same milestones a second time.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::constants::{
    GRAND_PRIZE_USD, MILESTONE_ALERT_TITLE, THRESHOLD_FIRST_DISCOUNT, THRESHOLD_GRAND_PRIZE,
    THRESHOLD_SECOND_DISCOUNT,
};
use crate::reward::RewardTier;

/// Events fired by a single evaluation; at most one per milestone.
pub type MilestoneEvents = SmallVec<[MilestoneEvent; 3]>;

/// Found-count threshold that unlocks a reward tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    FirstDiscount,
    SecondDiscount,
    GrandPrize,
}

impl Milestone {
    /// All milestones in ascending threshold order.
    pub const ALL: [Self; 3] = [Self::FirstDiscount, Self::SecondDiscount, Self::GrandPrize];

    #[must_use]
    pub const fn threshold(self) -> usize {
        match self {
            Self::FirstDiscount => THRESHOLD_FIRST_DISCOUNT,
            Self::SecondDiscount => THRESHOLD_SECOND_DISCOUNT,
            Self::GrandPrize => THRESHOLD_GRAND_PRIZE,
        }
    }

    #[must_use]
    pub const fn tier(self) -> RewardTier {
        RewardTier::for_count(self.threshold())
    }

    /// Alert body shown when the milestone is reached.
    #[must_use]
    pub fn message(self) -> String {
        let tier = self.tier();
        let threshold = self.threshold();
        let pct = tier.discount_pct();
        match self {
            Self::FirstDiscount => format!(
                "Congratulations! You've found {threshold} items and earned a {pct}% discount code!"
            ),
            Self::SecondDiscount => {
                format!("Amazing! You've found {threshold} items and earned a {pct}% discount code!")
            }
            Self::GrandPrize => format!(
                "Incredible! You've found all {threshold} items! You've earned a {pct}% discount code AND been entered into the ${GRAND_PRIZE_USD} grand prize draw!"
            ),
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier-{}", self.threshold())
    }
}

/// One-shot notification produced when a threshold is crossed upward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneEvent {
    pub milestone: Milestone,
    pub threshold: usize,
    pub tier: RewardTier,
    pub title: String,
    pub message: String,
}

impl MilestoneEvent {
    #[must_use]
    pub fn new(milestone: Milestone) -> Self {
        Self {
            milestone,
            threshold: milestone.threshold(),
            tier: milestone.tier(),
            title: MILESTONE_ALERT_TITLE.to_string(),
            message: milestone.message(),
        }
    }
}

/// Fire every milestone with `old_count < threshold <= new_count`, in
/// ascending threshold order.
#[must_use]
pub fn evaluate_milestones(old_count: usize, new_count: usize) -> MilestoneEvents {
    Milestone::ALL
        .into_iter()
        .filter(|milestone| {
            let threshold = milestone.threshold();
            old_count < threshold && threshold <= new_count
        })
        .map(MilestoneEvent::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fired(old: usize, new: usize) -> Vec<usize> {
        evaluate_milestones(old, new)
            .iter()
            .map(|event| event.threshold)
            .collect()
    }

    #[test]
    fn single_step_crossing_fires_once() {
        assert_eq!(fired(4, 5), vec![5]);
        assert_eq!(fired(6, 7), vec![7]);
        assert_eq!(fired(9, 10), vec![10]);
    }

    #[test]
    fn jumps_fire_every_crossed_threshold_in_order() {
        assert_eq!(fired(6, 10), vec![7, 10]);
        assert_eq!(fired(0, 10), vec![5, 7, 10]);
        assert_eq!(fired(4, 7), vec![5, 7]);
    }

    #[test]
    fn no_change_or_decrease_fires_nothing() {
        assert!(fired(5, 5).is_empty());
        assert!(fired(10, 0).is_empty());
        assert!(fired(7, 6).is_empty());
        assert!(fired(0, 4).is_empty());
        assert!(fired(5, 6).is_empty());
    }

    #[test]
    fn events_carry_tier_and_copy() {
        let events = evaluate_milestones(9, 10);
        let event = &events[0];
        assert_eq!(event.milestone, Milestone::GrandPrize);
        assert_eq!(event.tier, RewardTier::GrandPrize);
        assert_eq!(event.title, "Milestone Reached! 🎉");
        assert!(event.message.contains("$5000 grand prize draw"));
        assert_eq!(Milestone::FirstDiscount.to_string(), "tier-5");

        let first = MilestoneEvent::new(Milestone::FirstDiscount);
        assert_eq!(
            first.message,
            "Congratulations! You've found 5 items and earned a 10% discount code!"
        );
    }
}
