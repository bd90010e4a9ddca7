//! Hunt session controller: the single owner and writer of item state.
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::catalog::{Catalog, ItemId};
use crate::constants::HUNT_SIZE;
use crate::error::HuntError;
use crate::item::Item;
use crate::milestone::{MilestoneEvent, MilestoneEvents, evaluate_milestones};
use crate::photo::{PhotoError, PhotoFormat, normalize_photo};
use crate::progress::ProgressSummary;
use crate::reward::RewardTier;

/// Result of trying to attach a photo to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum CommitStatus {
    /// The photo was stored and the item is now found.
    Found,
    /// The item was already found; its photo was kept.
    AlreadyFound,
    /// The picker produced nothing.
    Cancelled,
    /// The picked bytes were not a usable image.
    Rejected(PhotoError),
}

impl CommitStatus {
    #[must_use]
    pub const fn is_found(self) -> bool {
        matches!(self, Self::Found)
    }
}

/// Outcome of a single commit, including any milestones it crossed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOutcome {
    pub item_id: ItemId,
    pub status: CommitStatus,
    pub found_count: usize,
    pub milestones: MilestoneEvents,
}

/// Outcome of importing several photos at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub statuses: Vec<(ItemId, CommitStatus)>,
    pub previous_count: usize,
    pub found_count: usize,
    pub milestones: MilestoneEvents,
}

/// What changed in a [`SessionUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateKind {
    Found { item_id: ItemId },
    Imported { item_ids: Vec<ItemId> },
    Restarted,
}

/// Change notification delivered to observers after every state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub kind: UpdateKind,
    pub previous_count: usize,
    pub found_count: usize,
    pub milestones: MilestoneEvents,
}

/// Subscriber to session changes; presentation layers implement this.
pub trait SessionObserver {
    fn on_update(&mut self, update: &SessionUpdate);
}

impl<F> SessionObserver for F
where
    F: FnMut(&SessionUpdate),
{
    fn on_update(&mut self, update: &SessionUpdate) {
        self(update);
    }
}

/// Serializable view of one item, without photo bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub name: String,
    pub business_name: String,
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_format: Option<PhotoFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_fingerprint: Option<String>,
}

/// Serializable view of a whole session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub catalog_revision: u64,
    pub restarts: u32,
    pub found_count: usize,
    pub complete: bool,
    pub tier: RewardTier,
    pub items: Vec<ItemSnapshot>,
}

/// Mutable per-run copy of the catalog.
pub struct HuntSession {
    catalog: Arc<Catalog>,
    items: Vec<Item>,
    pending: VecDeque<MilestoneEvent>,
    observers: Vec<Box<dyn SessionObserver>>,
    restarts: u32,
}

impl HuntSession {
    /// Start a session with every catalog item unfound.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let items = fresh_items(&catalog);
        Self {
            catalog,
            items,
            pending: VecDeque::new(),
            observers: Vec::new(),
            restarts: 0,
        }
    }

    /// Start a session over the builtin catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded catalog asset is malformed.
    pub fn from_builtin() -> Result<Self, HuntError> {
        Ok(Self::new(crate::catalog::builtin()?))
    }

    /// Replace every item with a fresh catalog copy.
    ///
    /// Undelivered milestone events are dropped along with the old state.
    pub fn restart(&mut self) {
        let previous_count = self.found_count();
        self.items = fresh_items(&self.catalog);
        self.pending.clear();
        self.restarts = self.restarts.saturating_add(1);
        let found_count = self.found_count();
        let milestones = evaluate_milestones(previous_count, found_count);
        info!(
            "hunt restarted (restart #{}, {previous_count} -> {found_count} found)",
            self.restarts
        );
        self.notify(&SessionUpdate {
            kind: UpdateKind::Restarted,
            previous_count,
            found_count,
            milestones,
        });
    }

    /// Attach a photo to an item and mark it found.
    ///
    /// Already-found items, empty bytes and unreadable images leave the session
    /// unchanged and are reported through [`CommitStatus`].
    ///
    /// # Errors
    ///
    /// Returns [`HuntError::UnknownItem`] if `item_id` is not in this hunt.
    pub fn commit_photo(
        &mut self,
        item_id: &ItemId,
        photo_bytes: impl Into<Vec<u8>>,
    ) -> Result<CommitOutcome, HuntError> {
        let index = self.index_of(item_id)?;
        let previous_count = self.found_count();
        let status = self.try_attach(index, photo_bytes.into());
        let found_count = self.found_count();

        let milestones = if status.is_found() {
            let milestones = evaluate_milestones(previous_count, found_count);
            self.record_milestones(&milestones);
            self.notify(&SessionUpdate {
                kind: UpdateKind::Found {
                    item_id: item_id.clone(),
                },
                previous_count,
                found_count,
                milestones: milestones.clone(),
            });
            milestones
        } else {
            MilestoneEvents::new()
        };

        Ok(CommitOutcome {
            item_id: item_id.clone(),
            status,
            found_count,
            milestones,
        })
    }

    /// Apply the result of a photo request; `None` means the user cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`HuntError::UnknownItem`] if `item_id` is not in this hunt.
    pub fn apply_photo(
        &mut self,
        item_id: &ItemId,
        picked: Option<Vec<u8>>,
    ) -> Result<CommitOutcome, HuntError> {
        match picked {
            Some(bytes) => self.commit_photo(item_id, bytes),
            None => {
                self.index_of(item_id)?;
                debug!("photo request for `{item_id}` returned nothing");
                Ok(CommitOutcome {
                    item_id: item_id.clone(),
                    status: CommitStatus::Cancelled,
                    found_count: self.found_count(),
                    milestones: MilestoneEvents::new(),
                })
            }
        }
    }

    /// Commit several photos and evaluate milestones once over the whole batch.
    ///
    /// Every id is checked before anything is written, so an unknown id leaves
    /// the session untouched.
    ///
    /// # Errors
    ///
    /// Returns [`HuntError::UnknownItem`] for the first id not in this hunt.
    pub fn import_photos<I>(&mut self, photos: I) -> Result<ImportOutcome, HuntError>
    where
        I: IntoIterator<Item = (ItemId, Vec<u8>)>,
    {
        let batch = photos
            .into_iter()
            .map(|(item_id, bytes)| self.index_of(&item_id).map(|index| (item_id, index, bytes)))
            .collect::<Result<Vec<_>, _>>()?;

        let previous_count = self.found_count();
        let mut statuses = Vec::with_capacity(batch.len());
        let mut found_ids = Vec::new();
        for (item_id, index, bytes) in batch {
            let status = self.try_attach(index, bytes);
            if status.is_found() {
                found_ids.push(item_id.clone());
            }
            statuses.push((item_id, status));
        }
        let found_count = self.found_count();
        let milestones = evaluate_milestones(previous_count, found_count);

        if !found_ids.is_empty() {
            self.record_milestones(&milestones);
            self.notify(&SessionUpdate {
                kind: UpdateKind::Imported {
                    item_ids: found_ids,
                },
                previous_count,
                found_count,
                milestones: milestones.clone(),
            });
        }

        Ok(ImportOutcome {
            statuses,
            previous_count,
            found_count,
            milestones,
        })
    }

    /// Live count of found items.
    #[must_use]
    pub fn found_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_found()).count()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.found_count() == HUNT_SIZE
    }

    #[must_use]
    pub fn reward_tier(&self) -> RewardTier {
        RewardTier::for_count(self.found_count())
    }

    #[must_use]
    pub fn progress(&self) -> ProgressSummary {
        ProgressSummary::new(self.found_count(), self.items.len())
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub fn item(&self, item_id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id() == item_id)
    }

    /// Items still waiting to be found, in catalog order.
    pub fn remaining(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| !item.is_found())
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Hand over milestone events not yet shown; each is returned only once.
    pub fn take_milestone_events(&mut self) -> Vec<MilestoneEvent> {
        self.pending.drain(..).collect()
    }

    /// Register an observer notified after every state change.
    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            catalog_revision: self.catalog.revision(),
            restarts: self.restarts,
            found_count: self.found_count(),
            complete: self.is_complete(),
            tier: self.reward_tier(),
            items: self
                .items
                .iter()
                .map(|item| ItemSnapshot {
                    id: item.id().clone(),
                    name: item.name().to_string(),
                    business_name: item.business_name().to_string(),
                    found: item.is_found(),
                    photo_format: item.photo().map(crate::photo::Photo::format),
                    photo_fingerprint: item.photo().map(|photo| photo.fingerprint().to_string()),
                })
                .collect(),
        }
    }

    pub(crate) fn index_of(&self, item_id: &ItemId) -> Result<usize, HuntError> {
        self.items
            .iter()
            .position(|item| item.id() == item_id)
            .ok_or_else(|| {
                error!("commit referenced unknown item `{item_id}`");
                HuntError::UnknownItem(item_id.clone())
            })
    }

    fn try_attach(&mut self, index: usize, bytes: Vec<u8>) -> CommitStatus {
        let item = &mut self.items[index];
        if item.is_found() {
            debug!("item `{}` already found; keeping existing photo", item.id());
            return CommitStatus::AlreadyFound;
        }
        if bytes.is_empty() {
            debug!("empty photo for `{}` treated as cancellation", item.id());
            return CommitStatus::Cancelled;
        }
        match normalize_photo(bytes) {
            Ok(photo) => {
                debug!(
                    "item `{}` found with {} photo ({} bytes)",
                    item.id(),
                    photo.format(),
                    photo.len()
                );
                if item.attach_photo(photo) {
                    CommitStatus::Found
                } else {
                    CommitStatus::AlreadyFound
                }
            }
            Err(err) => {
                warn!("photo for `{}` rejected: {err}", item.id());
                CommitStatus::Rejected(err)
            }
        }
    }

    fn record_milestones(&mut self, milestones: &[MilestoneEvent]) {
        for event in milestones {
            info!("milestone {} reached: {}", event.milestone, event.message);
            self.pending.push_back(event.clone());
        }
    }

    fn notify(&mut self, update: &SessionUpdate) {
        for observer in &mut self.observers {
            observer.on_update(update);
        }
    }
}

impl fmt::Debug for HuntSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuntSession")
            .field("items", &self.items)
            .field("pending", &self.pending)
            .field("observers", &self.observers.len())
            .field("restarts", &self.restarts)
            .finish_non_exhaustive()
    }
}

fn fresh_items(catalog: &Catalog) -> Vec<Item> {
    catalog.entries().iter().cloned().map(Item::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milestone::Milestone;
    use crate::photo::fixtures::{jpeg, png};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn session() -> HuntSession {
        HuntSession::from_builtin().unwrap()
    }

    fn id_at(session: &HuntSession, index: usize) -> ItemId {
        session.items()[index].id().clone()
    }

    fn assert_count_matches_items(session: &HuntSession) {
        let live = session.items().iter().filter(|item| item.is_found()).count();
        assert_eq!(session.found_count(), live);
        for item in session.items() {
            assert_eq!(item.is_found(), item.photo_data().is_some());
        }
    }

    #[test]
    fn new_session_starts_empty() {
        let session = session();
        assert_eq!(session.items().len(), HUNT_SIZE);
        assert_eq!(session.found_count(), 0);
        assert!(!session.is_complete());
        assert_eq!(session.reward_tier(), RewardTier::None);
        assert_eq!(session.remaining().count(), HUNT_SIZE);
    }

    #[test]
    fn builtin_sessions_share_one_catalog() {
        let first = session();
        let second = session();
        assert!(std::ptr::eq(first.catalog(), second.catalog()));
    }

    #[test]
    fn commit_marks_found_and_stores_photo() {
        let mut session = session();
        let id = id_at(&session, 0);
        let outcome = session.commit_photo(&id, jpeg(1)).unwrap();

        assert_eq!(outcome.status, CommitStatus::Found);
        assert_eq!(outcome.found_count, 1);
        assert!(outcome.milestones.is_empty());
        let item = session.item(&id).unwrap();
        assert!(item.is_found());
        assert_eq!(item.photo_data(), Some(jpeg(1).as_slice()));
        assert_count_matches_items(&session);
    }

    #[test]
    fn commit_is_idempotent_for_found_items() {
        let mut session = session();
        let id = id_at(&session, 2);
        session.commit_photo(&id, jpeg(1)).unwrap();
        let outcome = session.commit_photo(&id, jpeg(2)).unwrap();

        assert_eq!(outcome.status, CommitStatus::AlreadyFound);
        assert_eq!(outcome.found_count, 1);
        assert_eq!(session.found_count(), 1);
        assert_eq!(
            session.item(&id).unwrap().photo_data(),
            Some(jpeg(1).as_slice())
        );
    }

    #[test]
    fn empty_bytes_and_cancellation_are_noops() {
        let mut session = session();
        let id = id_at(&session, 4);
        let outcome = session.commit_photo(&id, Vec::new()).unwrap();
        assert_eq!(outcome.status, CommitStatus::Cancelled);

        let outcome = session.apply_photo(&id, None).unwrap();
        assert_eq!(outcome.status, CommitStatus::Cancelled);
        assert_eq!(session.found_count(), 0);
        assert!(!session.item(&id).unwrap().is_found());
    }

    #[test]
    fn malformed_photo_is_rejected_without_mutation() {
        let mut session = session();
        let id = id_at(&session, 1);
        let outcome = session.commit_photo(&id, b"garbage".to_vec()).unwrap();
        assert_eq!(
            outcome.status,
            CommitStatus::Rejected(PhotoError::UnrecognizedFormat)
        );
        assert_eq!(session.found_count(), 0);
        assert_count_matches_items(&session);
    }

    #[test]
    fn unknown_item_fails_loudly() {
        let mut session = session();
        let missing = ItemId::from("unicorn");
        let err = session.commit_photo(&missing, jpeg(1)).unwrap_err();
        assert_eq!(err, HuntError::UnknownItem(missing.clone()));
        assert!(session.apply_photo(&missing, None).is_err());
        assert_eq!(session.found_count(), 0);
    }

    #[test]
    fn milestones_fire_once_each_on_the_way_to_ten() {
        let mut session = session();
        let mut fired = Vec::new();
        for index in 0..HUNT_SIZE {
            let id = id_at(&session, index);
            let outcome = session.commit_photo(&id, jpeg(index as u8)).unwrap();
            fired.extend(outcome.milestones.iter().map(|event| (index + 1, event.milestone)));
        }
        assert_eq!(
            fired,
            vec![
                (5, Milestone::FirstDiscount),
                (7, Milestone::SecondDiscount),
                (10, Milestone::GrandPrize),
            ]
        );
        assert!(session.is_complete());
        assert_eq!(session.reward_tier(), RewardTier::GrandPrize);
    }

    #[test]
    fn restart_resets_everything_and_refires_milestones() {
        let mut session = session();
        for index in 0..5 {
            let id = id_at(&session, index);
            session.commit_photo(&id, png()).unwrap();
        }
        assert_eq!(session.take_milestone_events().len(), 1);

        session.restart();
        assert_eq!(session.found_count(), 0);
        assert!(!session.is_complete());
        assert!(session.items().iter().all(|item| item.photo().is_none()));
        assert_eq!(session.restarts(), 1);

        for index in 0..5 {
            let id = id_at(&session, index);
            session.commit_photo(&id, png()).unwrap();
        }
        let events = session.take_milestone_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].milestone, Milestone::FirstDiscount);
    }

    #[test]
    fn restart_discards_undelivered_events() {
        let mut session = session();
        for index in 0..5 {
            let id = id_at(&session, index);
            session.commit_photo(&id, png()).unwrap();
        }
        session.restart();
        assert!(session.take_milestone_events().is_empty());
    }

    #[test]
    fn pending_events_are_delivered_once() {
        let mut session = session();
        for index in 0..7 {
            let id = id_at(&session, index);
            session.commit_photo(&id, jpeg(7)).unwrap();
        }
        let first = session.take_milestone_events();
        assert_eq!(first.len(), 2);
        assert!(session.take_milestone_events().is_empty());
    }

    #[test]
    fn import_crosses_several_thresholds_at_once() {
        let mut session = session();
        let batch: Vec<_> = (0..8)
            .map(|index| (id_at(&session, index), jpeg(index as u8)))
            .collect();
        let outcome = session.import_photos(batch).unwrap();
        assert_eq!(outcome.previous_count, 0);
        assert_eq!(outcome.found_count, 8);
        let thresholds: Vec<_> = outcome.milestones.iter().map(|e| e.threshold).collect();
        assert_eq!(thresholds, vec![5, 7]);
        assert_count_matches_items(&session);
    }

    #[test]
    fn import_with_unknown_id_changes_nothing() {
        let mut session = session();
        let batch = vec![
            (id_at(&session, 0), jpeg(1)),
            (ItemId::from("unicorn"), jpeg(2)),
        ];
        assert!(session.import_photos(batch).is_err());
        assert_eq!(session.found_count(), 0);
    }

    #[test]
    fn observers_see_every_change() {
        let mut session = session();
        let seen: Rc<RefCell<Vec<SessionUpdate>>> = Rc::default();
        let sink = Rc::clone(&seen);
        session.subscribe(Box::new(move |update: &SessionUpdate| {
            sink.borrow_mut().push(update.clone());
        }));

        let id = id_at(&session, 3);
        session.commit_photo(&id, jpeg(1)).unwrap();
        session.commit_photo(&id, jpeg(2)).unwrap();
        session.restart();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].kind, UpdateKind::Found { item_id: id });
        assert_eq!(seen[0].found_count, 1);
        assert_eq!(seen[1].kind, UpdateKind::Restarted);
        assert_eq!(seen[1].previous_count, 1);
        assert!(seen[1].milestones.is_empty());
    }

    #[test]
    fn snapshot_omits_bytes_but_keeps_fingerprints() {
        let mut session = session();
        let id = id_at(&session, 0);
        session.commit_photo(&id, jpeg(9)).unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.found_count, 1);
        assert_eq!(snapshot.items[0].photo_format, Some(PhotoFormat::Jpeg));
        assert!(snapshot.items[0].photo_fingerprint.is_some());
        assert!(snapshot.items[1].photo_fingerprint.is_none());

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, snapshot);
    }
}
