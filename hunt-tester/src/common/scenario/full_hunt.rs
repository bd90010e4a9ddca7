use anyhow::Result;
use hunt_game::{HUNT_SIZE, RewardTier};

use super::{
    TestScenario, every_target_resolved, milestones_follow_counts, reliable_picker_finds_all,
    tier_follows_count,
};
use crate::logic::{DeliveryMode, HuntPlan, HuntSummary};

const FULL_HUNT_ATTEMPTS: usize = 50;
const BATCH_TARGETS: usize = 8;

fn full_hunt_plan(delivery: DeliveryMode) -> HuntPlan {
    HuntPlan::new(HUNT_SIZE)
        .with_max_attempts(FULL_HUNT_ATTEMPTS)
        .with_delivery(delivery)
        .with_expectation(milestones_follow_counts)
        .with_expectation(tier_follows_count)
        .with_expectation(every_target_resolved)
        .with_expectation(reliable_picker_finds_all)
        .with_expectation(completion_expectation)
}

pub fn full_hunt_scenario() -> TestScenario {
    TestScenario::new(
        "Full Hunt - All Ten Items",
        full_hunt_plan(DeliveryMode::Capture),
    )
}

pub fn deferred_delivery_scenario() -> TestScenario {
    TestScenario::new(
        "Full Hunt - Deferred Photo Delivery",
        full_hunt_plan(DeliveryMode::Deferred),
    )
}

pub fn batch_import_scenario() -> TestScenario {
    TestScenario::new(
        "Batch Photo Import",
        HuntPlan::new(BATCH_TARGETS)
            .with_delivery(DeliveryMode::Batch)
            .with_expectation(milestones_follow_counts)
            .with_expectation(tier_follows_count)
            .with_expectation(reliable_picker_finds_all)
            .with_expectation(batch_expectation),
    )
}

fn completion_expectation(summary: &HuntSummary) -> Result<()> {
    let state = &summary.final_state;
    if state.complete {
        anyhow::ensure!(
            state.tier == RewardTier::GrandPrize,
            "Completed hunt should reach the grand prize tier, got {:?}",
            state.tier
        );
        anyhow::ensure!(
            state.items.iter().all(|item| item.found && item.photo_fingerprint.is_some()),
            "Completed hunt has an item without a photo"
        );
    }
    anyhow::ensure!(
        summary.observer_updates == state.found_count,
        "Expected one observer update per find, got {} for {} finds",
        summary.observer_updates,
        state.found_count
    );
    Ok(())
}

fn batch_expectation(summary: &HuntSummary) -> Result<()> {
    let round = summary
        .last_round()
        .ok_or_else(|| anyhow::anyhow!("Batch import played no rounds"))?;
    anyhow::ensure!(
        round.attempts == summary.targets,
        "Batch should commit each target once, got {} attempts",
        round.attempts
    );
    let expected_updates = usize::from(round.found_count > 0);
    anyhow::ensure!(
        summary.observer_updates == expected_updates,
        "Batch import should notify observers {expected_updates} time(s), got {}",
        summary.observer_updates
    );
    anyhow::ensure!(
        round.cancelled == summary.picker.cancelled,
        "Batch cancelled {} items but the picker cancelled {}",
        round.cancelled,
        summary.picker.cancelled
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{HuntTester, PickerProfile};

    async fn run(scenario: &TestScenario, profile: PickerProfile, seed: u64) -> HuntSummary {
        HuntTester::new(profile, false)
            .run_plan(&scenario.plan, seed)
            .await
            .unwrap()
    }

    fn check(scenario: &TestScenario, summary: &HuntSummary) {
        for expectation in &scenario.plan.expectations {
            expectation.evaluate(summary).unwrap();
        }
    }

    #[tokio::test]
    async fn full_hunt_passes_with_reliable_picker() {
        let scenario = full_hunt_scenario();
        let summary = run(&scenario, PickerProfile::RELIABLE, 1337).await;
        assert!(summary.final_state.complete);
        check(&scenario, &summary);
    }

    #[tokio::test]
    async fn deferred_hunt_passes_with_flaky_picker() {
        let scenario = deferred_delivery_scenario();
        let profile = PickerProfile::new(0.3, 0.2).unwrap();
        let summary = run(&scenario, profile, 2024).await;
        check(&scenario, &summary);
    }

    #[tokio::test]
    async fn batch_import_passes_with_and_without_cancels() {
        let scenario = batch_import_scenario();
        let summary = run(&scenario, PickerProfile::RELIABLE, 8).await;
        assert_eq!(summary.final_state.found_count, BATCH_TARGETS);
        check(&scenario, &summary);

        let summary = run(&scenario, PickerProfile::new(0.5, 0.0).unwrap(), 8).await;
        check(&scenario, &summary);
    }

    #[tokio::test]
    async fn completion_expectation_flags_missing_updates() {
        let scenario = full_hunt_scenario();
        let mut summary = run(&scenario, PickerProfile::RELIABLE, 3).await;
        summary.observer_updates = 0;
        assert!(completion_expectation(&summary).is_err());
    }
}
