use anyhow::Result;
use hunt_game::{HUNT_SIZE, Milestone, RewardTier};

use crate::logic::{HuntPlan, HuntSummary};

pub mod full_hunt;
pub mod resilience;
pub mod smoke;

/// A named scripted hunt and the expectations checked after each run.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: HuntPlan,
}

impl TestScenario {
    #[must_use]
    pub fn new(name: impl Into<String>, plan: HuntPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

/// Every scenario key `all` expands to, in run order.
pub const ALL_SCENARIOS: &[&str] = &[
    "smoke",
    "full-hunt",
    "deferred-delivery",
    "batch-import",
    "restart-refire",
    "idempotent-commit",
    "flaky-picker",
];

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke::SmokeScenario::scenario()),
        "full-hunt" | "full" => Some(full_hunt::full_hunt_scenario()),
        "deferred-delivery" | "deferred" => Some(full_hunt::deferred_delivery_scenario()),
        "batch-import" | "import" => Some(full_hunt::batch_import_scenario()),
        "restart-refire" | "restart" => Some(resilience::restart_refire_scenario()),
        "idempotent-commit" | "idempotent" => Some(resilience::idempotent_commit_scenario()),
        "flaky-picker" | "flaky" => Some(resilience::flaky_picker_scenario()),
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("full-hunt", "Full Hunt - All Ten Items"),
        ("deferred-delivery", "Full Hunt - Deferred Photo Delivery"),
        ("batch-import", "Batch Photo Import"),
        ("restart-refire", "Restart and Milestone Re-fire"),
        ("idempotent-commit", "Idempotent Re-commit"),
        ("flaky-picker", "Flaky Picker Resilience"),
    ]
}

/// Thresholds a round starting from zero must have announced.
fn thresholds_up_to(found: usize) -> Vec<usize> {
    Milestone::ALL
        .iter()
        .map(|milestone| milestone.threshold())
        .filter(|threshold| *threshold <= found)
        .collect()
}

pub(crate) fn milestones_follow_counts(summary: &HuntSummary) -> Result<()> {
    for round in &summary.rounds {
        let expected = thresholds_up_to(round.found_count);
        anyhow::ensure!(
            round.milestones == expected,
            "Round {} found {} items but announced {:?} (expected {:?})",
            round.round,
            round.found_count,
            round.milestones,
            expected
        );
    }
    Ok(())
}

pub(crate) fn tier_follows_count(summary: &HuntSummary) -> Result<()> {
    for round in &summary.rounds {
        let expected = RewardTier::for_count(round.found_count);
        anyhow::ensure!(
            round.tier == Some(expected),
            "Round {} tier {:?} does not match {} found",
            round.round,
            round.tier,
            round.found_count
        );
        anyhow::ensure!(
            round.complete == (round.found_count == HUNT_SIZE),
            "Round {} completion flag is {} with {} found",
            round.round,
            round.complete,
            round.found_count
        );
    }
    Ok(())
}

pub(crate) fn every_target_resolved(summary: &HuntSummary) -> Result<()> {
    for round in &summary.rounds {
        anyhow::ensure!(
            round.found_count + round.exhausted == summary.targets,
            "Round {}: {} found + {} exhausted != {} targets",
            round.round,
            round.found_count,
            round.exhausted,
            summary.targets
        );
    }
    Ok(())
}

pub(crate) fn reliable_picker_finds_all(summary: &HuntSummary) -> Result<()> {
    if !summary.profile.is_reliable() {
        return Ok(());
    }
    for round in &summary.rounds {
        anyhow::ensure!(
            round.found_count == summary.targets,
            "Reliable picker round {} found {} of {} targets",
            round.round,
            round.found_count,
            summary.targets
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves() {
        for (key, description) in list_scenarios() {
            let scenario = get_scenario(key).unwrap_or_else(|| panic!("missing {key}"));
            assert_eq!(scenario.name, description);
        }
        assert_eq!(ALL_SCENARIOS.len(), list_scenarios().len());
        assert!(get_scenario("nope").is_none());
    }

    #[test]
    fn aliases_are_case_insensitive() {
        assert!(get_scenario("FULL").is_some());
        assert!(get_scenario("Restart").is_some());
    }

    #[test]
    fn thresholds_cover_documented_tiers() {
        assert!(thresholds_up_to(4).is_empty());
        assert_eq!(thresholds_up_to(5), vec![5]);
        assert_eq!(thresholds_up_to(9), vec![5, 7]);
        assert_eq!(thresholds_up_to(HUNT_SIZE), vec![5, 7, 10]);
    }
}
