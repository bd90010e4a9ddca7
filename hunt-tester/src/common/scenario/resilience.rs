use anyhow::Result;
use hunt_game::HUNT_SIZE;

use super::{TestScenario, every_target_resolved, milestones_follow_counts, tier_follows_count};
use crate::logic::{HuntPlan, HuntSummary, PickerProfile};

const RESTART_ROUNDS: usize = 3;
const RESTART_TARGETS: usize = 7;
const FLAKY_CANCEL_RATE: f64 = 0.4;
const FLAKY_CORRUPT_RATE: f64 = 0.3;

pub fn restart_refire_scenario() -> TestScenario {
    TestScenario::new(
        "Restart and Milestone Re-fire",
        HuntPlan::new(RESTART_TARGETS)
            .with_rounds(RESTART_ROUNDS)
            .with_max_attempts(50)
            .with_expectation(milestones_follow_counts)
            .with_expectation(tier_follows_count)
            .with_expectation(every_target_resolved)
            .with_expectation(restart_expectation),
    )
}

pub fn idempotent_commit_scenario() -> TestScenario {
    TestScenario::new(
        "Idempotent Re-commit",
        HuntPlan::new(5)
            .with_max_attempts(50)
            .with_recommit()
            .with_expectation(milestones_follow_counts)
            .with_expectation(idempotent_expectation),
    )
}

pub fn flaky_picker_scenario() -> TestScenario {
    let profile = PickerProfile {
        cancel_rate: FLAKY_CANCEL_RATE,
        corrupt_rate: FLAKY_CORRUPT_RATE,
    };
    TestScenario::new(
        "Flaky Picker Resilience",
        HuntPlan::new(HUNT_SIZE)
            .with_max_attempts(40)
            .with_picker(profile)
            .with_expectation(milestones_follow_counts)
            .with_expectation(tier_follows_count)
            .with_expectation(every_target_resolved)
            .with_expectation(flaky_expectation),
    )
}

fn restart_expectation(summary: &HuntSummary) -> Result<()> {
    anyhow::ensure!(
        summary.rounds.len() == RESTART_ROUNDS,
        "Expected {RESTART_ROUNDS} rounds, got {}",
        summary.rounds.len()
    );
    let expected_restarts = u32::try_from(RESTART_ROUNDS - 1).unwrap_or(u32::MAX);
    anyhow::ensure!(
        summary.final_state.restarts == expected_restarts,
        "Expected {expected_restarts} restarts, got {}",
        summary.final_state.restarts
    );
    let last = summary
        .last_round()
        .ok_or_else(|| anyhow::anyhow!("No rounds recorded"))?;
    anyhow::ensure!(
        summary.final_state.found_count == last.found_count,
        "Final state shows {} found but the last round found {}",
        summary.final_state.found_count,
        last.found_count
    );
    Ok(())
}

fn idempotent_expectation(summary: &HuntSummary) -> Result<()> {
    for round in &summary.rounds {
        anyhow::ensure!(
            round.already_found == round.found_count,
            "Round {}: {} finds but {} already-found answers to re-commits",
            round.round,
            round.found_count,
            round.already_found
        );
    }
    Ok(())
}

fn flaky_expectation(summary: &HuntSummary) -> Result<()> {
    let cancelled: usize = summary.rounds.iter().map(|r| r.cancelled).sum();
    let rejected: usize = summary.rounds.iter().map(|r| r.rejected).sum();
    anyhow::ensure!(
        cancelled == summary.picker.cancelled,
        "Picker cancelled {} times but the session saw {cancelled} cancels",
        summary.picker.cancelled
    );
    anyhow::ensure!(
        rejected == summary.picker.corrupted,
        "Picker handed over {} broken files but the session rejected {rejected}",
        summary.picker.corrupted
    );
    anyhow::ensure!(
        summary.total_attempts() == summary.picker.requests,
        "Session saw {} attempts for {} picker requests",
        summary.total_attempts(),
        summary.picker.requests
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::HuntTester;

    async fn run(scenario: &TestScenario, seed: u64) -> HuntSummary {
        HuntTester::new(PickerProfile::RELIABLE, false)
            .run_plan(&scenario.plan, seed)
            .await
            .unwrap()
    }

    fn check(scenario: &TestScenario, summary: &HuntSummary) {
        for expectation in &scenario.plan.expectations {
            expectation.evaluate(summary).unwrap();
        }
    }

    #[test]
    fn flaky_profile_is_valid() {
        assert!(PickerProfile::new(FLAKY_CANCEL_RATE, FLAKY_CORRUPT_RATE).is_ok());
    }

    #[tokio::test]
    async fn restart_scenario_refires_each_round() {
        let scenario = restart_refire_scenario();
        let summary = run(&scenario, 31).await;
        assert!(summary.rounds.iter().all(|r| r.milestones == vec![5, 7]));
        check(&scenario, &summary);
    }

    #[tokio::test]
    async fn idempotent_scenario_holds() {
        let scenario = idempotent_commit_scenario();
        let summary = run(&scenario, 4).await;
        assert_eq!(summary.final_state.found_count, 5);
        check(&scenario, &summary);
    }

    #[tokio::test]
    async fn flaky_scenario_overrides_cli_profile() {
        let scenario = flaky_picker_scenario();
        let summary = run(&scenario, 99).await;
        assert!(!summary.profile.is_reliable());
        check(&scenario, &summary);
    }

    #[tokio::test]
    async fn idempotent_expectation_catches_missing_answers() {
        let scenario = idempotent_commit_scenario();
        let mut summary = run(&scenario, 4).await;
        summary.rounds[0].already_found = 0;
        assert!(idempotent_expectation(&summary).is_err());
    }
}
