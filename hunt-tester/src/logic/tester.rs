use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::common::scenario::TestScenario;
use crate::logic::hunt_tester::{HuntPlan, HuntSummary, HuntTester};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub items_found: usize,
    pub milestones_fired: usize,
    pub picker_requests: usize,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    tester: HuntTester,
}

#[derive(Debug, Default)]
struct IterationTally {
    successes: usize,
    failures: Vec<String>,
    performance_data: Vec<Duration>,
    items_found: usize,
    milestones_fired: usize,
    picker_requests: usize,
}

impl LogicTester {
    pub const fn new(tester: HuntTester) -> Self {
        Self { tester }
    }

    pub async fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.tester.verbose() {
                println!(
                    "🧪 Testing scenario: {} (delivery: {:?} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.delivery,
                    seed
                );
            }

            let result = self.run_single_scenario(scenario, seed, iterations).await;
            results.push(result);
        }

        results
    }

    async fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let tally = self.run_plan_iterations(&scenario.plan, seed, iterations).await;

        let avg_duration = if tally.performance_data.is_empty() {
            Duration::ZERO
        } else {
            tally.performance_data.iter().sum::<Duration>()
                / u32::try_from(tally.performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            passed: tally.failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: tally.successes,
            failures: tally.failures,
            items_found: tally.items_found,
            milestones_fired: tally.milestones_fired,
            picker_requests: tally.picker_requests,
            average_duration: avg_duration,
            performance_data: tally.performance_data,
        }
    }

    async fn run_plan_iterations(
        &self,
        plan: &HuntPlan,
        seed: u64,
        iterations: usize,
    ) -> IterationTally {
        let mut tally = IterationTally::default();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = match self.tester.run_plan(plan, iteration_seed).await {
                Ok(summary) => summary,
                Err(err) => {
                    tally.failures.push(format!(
                        "Iteration {} (seed {iteration_seed}): hunt aborted: {err:#}",
                        i + 1
                    ));
                    continue;
                }
            };

            tally.items_found += summary.rounds.iter().map(|r| r.found_count).sum::<usize>();
            tally.milestones_fired += summary
                .rounds
                .iter()
                .map(|r| r.milestones.len())
                .sum::<usize>();
            tally.picker_requests += summary.picker.requests;

            if let Some(err) = evaluate_expectations(plan, &summary) {
                let context = summarize_rounds(&summary);
                tally.failures.push(format!(
                    "Iteration {} (seed {}, delivery {:?}, attempts {}): {} | {}",
                    i + 1,
                    summary.seed,
                    summary.delivery,
                    summary.total_attempts(),
                    err,
                    context
                ));

                if self.tester.verbose() {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.clone().red()
                    );
                    println!("     ↳ Seed {} | {}", summary.seed, context);
                }
            } else {
                tally.successes += 1;
                let duration = start_time.elapsed();
                tally.performance_data.push(duration);

                if self.tester.verbose() {
                    let found = summary.last_round().map_or(0, |r| r.found_count);
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) found:{} requests:{}",
                        i + 1,
                        iterations,
                        found,
                        summary.picker.requests
                    );
                }
            }
        }

        tally
    }
}

fn evaluate_expectations(plan: &HuntPlan, summary: &HuntSummary) -> Option<String> {
    if let Some(violation) = summary.violations.first() {
        return Some(format!(
            "invariant violated ({} total): {violation}",
            summary.violations.len()
        ));
    }
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(err.to_string());
        }
    }
    None
}

fn summarize_rounds(summary: &HuntSummary) -> String {
    if summary.rounds.is_empty() {
        return "no rounds played".to_string();
    }

    summary
        .rounds
        .iter()
        .map(|round| {
            format!(
                "round {}: found {} cancelled {} rejected {} milestones {:?}",
                round.round, round.found_count, round.cancelled, round.rejected, round.milestones
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations
            .iter()
            .map(std::time::Duration::as_millis)
            .collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
