//! Scripted hunt runner: plays a hunt against the core with a simulated picker.
use anyhow::{Context, Result};
use hunt_game::{
    CommitOutcome, CommitStatus, HUNT_SIZE, HuntEngine, HuntSession, ItemId, PhotoRequest,
    RewardTier, SessionSnapshot, SessionUpdate, StaticCatalogLoader, evaluate_milestones,
};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use super::picker::{PickerProfile, PickerStats, ScriptedPicker};

/// How photos travel from the picker into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// `HuntSession::capture` against the picker directly.
    #[default]
    Capture,
    /// The picker resolves a `PhotoRequest` from a spawned task.
    Deferred,
    /// Photos are collected first and committed in one `import_photos` call.
    Batch,
}

/// Assertion hook run after a scripted hunt completes.
type HuntExpectationFn = Arc<dyn Fn(&HuntSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct HuntExpectation(HuntExpectationFn);

impl std::fmt::Debug for HuntExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuntExpectation").finish()
    }
}

impl HuntExpectation {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&HuntSummary) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// # Errors
    ///
    /// Returns the expectation's own failure.
    pub fn evaluate(&self, summary: &HuntSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for HuntExpectation
where
    F: Fn(&HuntSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// Script for one hunt run.
#[derive(Debug, Clone)]
pub struct HuntPlan {
    pub rounds: usize,
    pub targets: usize,
    pub max_attempts: usize,
    pub recommit_found: bool,
    pub delivery: DeliveryMode,
    pub picker: Option<PickerProfile>,
    pub expectations: Vec<HuntExpectation>,
}

impl HuntPlan {
    #[must_use]
    pub fn new(targets: usize) -> Self {
        Self {
            rounds: 1,
            targets: targets.min(HUNT_SIZE),
            max_attempts: 1,
            recommit_found: false,
            delivery: DeliveryMode::Capture,
            picker: None,
            expectations: Vec::new(),
        }
    }

    /// Play the hunt `rounds` times, restarting in between.
    #[must_use]
    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds.max(1);
        self
    }

    /// Retry an item until found or `max_attempts` picks were spent on it.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub const fn with_recommit(mut self) -> Self {
        self.recommit_found = true;
        self
    }

    #[must_use]
    pub const fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    /// Pin the picker behaviour regardless of the command line.
    #[must_use]
    pub const fn with_picker(mut self, profile: PickerProfile) -> Self {
        self.picker = Some(profile);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<HuntExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// What happened during one pass over the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: usize,
    pub attempts: usize,
    pub found_count: usize,
    pub cancelled: usize,
    pub rejected: usize,
    pub already_found: usize,
    pub exhausted: usize,
    pub tier: Option<RewardTier>,
    pub complete: bool,
    pub milestones: Vec<usize>,
}

impl RoundSummary {
    fn record(&mut self, status: CommitStatus) {
        self.attempts += 1;
        match status {
            CommitStatus::Found => {}
            CommitStatus::AlreadyFound => self.already_found += 1,
            CommitStatus::Cancelled => self.cancelled += 1,
            CommitStatus::Rejected(_) => self.rejected += 1,
        }
    }
}

/// Everything an expectation can inspect after a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuntSummary {
    pub seed: u64,
    pub delivery: DeliveryMode,
    pub profile: PickerProfile,
    pub targets: usize,
    pub rounds: Vec<RoundSummary>,
    pub picker: PickerStats,
    pub observer_updates: usize,
    pub violations: Vec<String>,
    pub final_state: SessionSnapshot,
}

impl HuntSummary {
    #[must_use]
    pub fn last_round(&self) -> Option<&RoundSummary> {
        self.rounds.last()
    }

    #[must_use]
    pub fn total_attempts(&self) -> usize {
        self.rounds.iter().map(|round| round.attempts).sum()
    }
}

/// Drives scripted hunts against freshly created sessions.
#[derive(Debug, Clone)]
pub struct HuntTester {
    engine: Arc<HuntEngine<StaticCatalogLoader>>,
    profile: PickerProfile,
    verbose: bool,
}

impl HuntTester {
    #[must_use]
    pub fn new(profile: PickerProfile, verbose: bool) -> Self {
        Self {
            engine: Arc::new(HuntEngine::default()),
            profile,
            verbose,
        }
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Play `plan` once with everything derived from `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be created or the core rejects an
    /// item id taken from its own catalog.
    pub async fn run_plan(&self, plan: &HuntPlan, seed: u64) -> Result<HuntSummary> {
        let profile = plan.picker.unwrap_or(self.profile);
        let picker = ScriptedPicker::new(profile, seed);
        let mut rng = ChaCha8Rng::seed_from_u64(seed.rotate_left(17));
        let mut session = self
            .engine
            .create_session()
            .context("failed to start hunt session")?;

        let updates = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&updates);
        session.subscribe(Box::new(move |_: &SessionUpdate| {
            counter.set(counter.get() + 1);
        }));

        let mut violations = Vec::new();
        let mut rounds = Vec::with_capacity(plan.rounds);

        for round in 0..plan.rounds {
            if round > 0 {
                session.restart();
                if session.found_count() != 0 {
                    violations.push(format!(
                        "round {round}: restart left {} items found",
                        session.found_count()
                    ));
                }
            }

            let mut order: Vec<ItemId> = session
                .items()
                .iter()
                .map(|item| item.id().clone())
                .collect();
            order.shuffle(&mut rng);
            order.truncate(plan.targets);

            let mut summary = RoundSummary {
                round: round + 1,
                ..RoundSummary::default()
            };

            if plan.delivery == DeliveryMode::Batch {
                self.play_batch(&mut session, &picker, &order, &mut summary, &mut violations)?;
            } else {
                for item_id in &order {
                    self.play_item(
                        &mut session,
                        &picker,
                        item_id,
                        plan,
                        &mut summary,
                        &mut violations,
                    )
                    .await?;
                }
            }

            summary.found_count = session.found_count();
            summary.tier = Some(session.reward_tier());
            summary.complete = session.is_complete();
            summary.milestones = session
                .take_milestone_events()
                .into_iter()
                .map(|event| event.threshold)
                .collect();

            if self.verbose {
                println!(
                    "    round {}: {} found, {} attempts, milestones {:?}",
                    summary.round, summary.found_count, summary.attempts, summary.milestones
                );
            }
            rounds.push(summary);
        }

        Ok(HuntSummary {
            seed,
            delivery: plan.delivery,
            profile,
            targets: plan.targets,
            rounds,
            picker: picker.stats(),
            observer_updates: updates.get(),
            violations,
            final_state: session.snapshot(),
        })
    }

    async fn play_item(
        &self,
        session: &mut HuntSession,
        picker: &ScriptedPicker,
        item_id: &ItemId,
        plan: &HuntPlan,
        summary: &mut RoundSummary,
        violations: &mut Vec<String>,
    ) -> Result<()> {
        for _ in 0..plan.max_attempts {
            let before = session.found_count();
            let outcome = match plan.delivery {
                DeliveryMode::Deferred => {
                    let (delivery, request) = PhotoRequest::channel();
                    let picked = picker.pick();
                    tokio::spawn(async move {
                        tokio::task::yield_now().await;
                        delivery.resolve(picked);
                    });
                    session.await_photo(item_id, request).await?
                }
                DeliveryMode::Capture | DeliveryMode::Batch => {
                    session.capture(item_id, picker).await?
                }
            };
            summary.record(outcome.status);
            check_outcome(session, before, &outcome, violations);

            if outcome.status.is_found() {
                if plan.recommit_found {
                    self.recommit(session, picker, item_id, summary, violations)?;
                }
                return Ok(());
            }
        }
        summary.exhausted += 1;
        Ok(())
    }

    fn recommit(
        &self,
        session: &mut HuntSession,
        picker: &ScriptedPicker,
        item_id: &ItemId,
        summary: &mut RoundSummary,
        violations: &mut Vec<String>,
    ) -> Result<()> {
        let fingerprint = fingerprint_of(session, item_id);
        let before = session.found_count();
        let outcome = session.commit_photo(item_id, picker.fresh_photo())?;
        summary.record(outcome.status);
        check_outcome(session, before, &outcome, violations);
        if outcome.status != CommitStatus::AlreadyFound {
            violations.push(format!(
                "recommit of `{item_id}` returned {:?}",
                outcome.status
            ));
        }
        if fingerprint_of(session, item_id) != fingerprint {
            violations.push(format!("recommit replaced the photo of `{item_id}`"));
        }
        if self.verbose {
            println!("      recommitted `{item_id}`: {:?}", outcome.status);
        }
        Ok(())
    }

    fn play_batch(
        &self,
        session: &mut HuntSession,
        picker: &ScriptedPicker,
        order: &[ItemId],
        summary: &mut RoundSummary,
        violations: &mut Vec<String>,
    ) -> Result<()> {
        let batch: Vec<(ItemId, Vec<u8>)> = order
            .iter()
            .map(|item_id| (item_id.clone(), picker.pick().unwrap_or_default()))
            .collect();
        let outcome = session.import_photos(batch)?;
        for (_, status) in &outcome.statuses {
            summary.record(*status);
        }
        let expected: Vec<usize> =
            evaluate_milestones(outcome.previous_count, outcome.found_count)
                .iter()
                .map(|event| event.threshold)
                .collect();
        let fired: Vec<usize> = outcome.milestones.iter().map(|e| e.threshold).collect();
        if fired != expected {
            violations.push(format!(
                "batch import {} -> {} fired {fired:?}, expected {expected:?}",
                outcome.previous_count, outcome.found_count
            ));
        }
        violations.extend(session_violations(session));
        Ok(())
    }
}

fn fingerprint_of(session: &HuntSession, item_id: &ItemId) -> Option<String> {
    session
        .item(item_id)
        .and_then(|item| item.photo())
        .map(|photo| photo.fingerprint().to_string())
}

fn check_outcome(
    session: &HuntSession,
    before: usize,
    outcome: &CommitOutcome,
    violations: &mut Vec<String>,
) {
    let expected_count = if outcome.status.is_found() {
        before + 1
    } else {
        before
    };
    if outcome.found_count != expected_count {
        violations.push(format!(
            "`{}` {:?} moved count {before} -> {}",
            outcome.item_id, outcome.status, outcome.found_count
        ));
    }
    let expected: Vec<usize> = evaluate_milestones(before, outcome.found_count)
        .iter()
        .map(|event| event.threshold)
        .collect();
    let fired: Vec<usize> = outcome.milestones.iter().map(|e| e.threshold).collect();
    if fired != expected {
        violations.push(format!(
            "`{}` fired {fired:?}, expected {expected:?}",
            outcome.item_id
        ));
    }
    violations.extend(session_violations(session));
}

/// Invariants that must hold after every controller call.
pub fn session_violations(session: &HuntSession) -> Vec<String> {
    let mut violations = Vec::new();
    let live = session.items().iter().filter(|item| item.is_found()).count();
    if session.found_count() != live {
        violations.push(format!(
            "found count {} disagrees with {live} found items",
            session.found_count()
        ));
    }
    if session.found_count() > HUNT_SIZE {
        violations.push(format!(
            "found count {} exceeds hunt size",
            session.found_count()
        ));
    }
    for item in session.items() {
        if item.is_found() != item.photo_data().is_some() {
            violations.push(format!("`{}` found flag and photo disagree", item.id()));
        }
    }
    if session.is_complete() != (session.found_count() == HUNT_SIZE) {
        violations.push("completion flag disagrees with found count".to_string());
    }
    if session.reward_tier() != RewardTier::for_count(session.found_count()) {
        violations.push("reward tier disagrees with found count".to_string());
    }
    violations
}
