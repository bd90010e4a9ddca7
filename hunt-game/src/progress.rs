//! Presentation-neutral progress projection of a hunt.
use serde::{Deserialize, Serialize};

use crate::reward::{RewardRow, RewardTier, reward_rows};

/// What the primary hunt button should offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallToAction {
    StartHunt,
    ContinueHunt,
    ViewResults,
}

impl CallToAction {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::StartHunt => "Start Hunt",
            Self::ContinueHunt => "Continue Hunt",
            Self::ViewResults => "View Results",
        }
    }
}

/// Everything the progress display needs, derived from a found count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub found: usize,
    pub total: usize,
    pub fraction: f64,
    pub label: String,
    pub tier: RewardTier,
    pub reward_message: String,
    pub rows: Vec<RewardRow>,
    pub call_to_action: CallToAction,
    pub complete: bool,
}

impl ProgressSummary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(found: usize, total: usize) -> Self {
        let found = found.min(total);
        let complete = total > 0 && found == total;
        let tier = RewardTier::for_count(found);
        let fraction = if total == 0 {
            0.0
        } else {
            found as f64 / total as f64
        };
        let call_to_action = if complete {
            CallToAction::ViewResults
        } else if found > 0 {
            CallToAction::ContinueHunt
        } else {
            CallToAction::StartHunt
        };

        Self {
            found,
            total,
            fraction,
            label: format!("{found} / {total}"),
            tier,
            reward_message: tier.message(),
            rows: reward_rows(found),
            call_to_action,
            complete,
        }
    }

    /// Long-form progress line, e.g. `Progress: 3 / 10 items found`.
    #[must_use]
    pub fn headline(&self) -> String {
        format!("Progress: {} items found", self.label)
    }
}
