use anyhow::Result;
use hunt_game::HUNT_SIZE;
use std::collections::HashSet;

use super::{TestScenario, milestones_follow_counts};
use crate::logic::{HuntPlan, HuntSummary};

pub struct SmokeScenario;

impl SmokeScenario {
    fn plan() -> HuntPlan {
        HuntPlan::new(1)
            .with_max_attempts(5)
            .with_expectation(smoke_expectation)
            .with_expectation(milestones_follow_counts)
    }

    pub fn scenario() -> TestScenario {
        TestScenario::new("Smoke Test", Self::plan())
    }
}

fn smoke_expectation(summary: &HuntSummary) -> Result<()> {
    let state = &summary.final_state;

    anyhow::ensure!(
        state.items.len() == HUNT_SIZE,
        "Catalog should hold {HUNT_SIZE} items, got {}",
        state.items.len()
    );
    let ids: HashSet<_> = state.items.iter().map(|item| &item.id).collect();
    anyhow::ensure!(
        ids.len() == HUNT_SIZE,
        "Item ids should be unique, got {} distinct",
        ids.len()
    );
    anyhow::ensure!(
        state.items.iter().all(|item| !item.name.is_empty()),
        "Every item needs a name"
    );
    anyhow::ensure!(
        state.found_count <= 1,
        "One target can find at most one item, got {}",
        state.found_count
    );
    anyhow::ensure!(
        !state.complete,
        "A single find must not complete the hunt"
    );
    if summary.profile.is_reliable() {
        anyhow::ensure!(
            state.found_count == 1,
            "Reliable picker should find the target, got {}",
            state.found_count
        );
    }

    Ok(())
}
