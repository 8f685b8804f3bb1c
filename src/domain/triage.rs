//! Triage state: the active card list, the pending-delete queue and the
//! confirm/consent cycle.
//!
//! An item lives in exactly one of the active list or the pending queue.
//! Every mutation returns a fresh [`TriageSnapshot`] for the host to render.
//! Calls that break the engine's contract (acting on a card that is not in
//! front, overlapping confirms) panic instead of corrupting that invariant.

use super::deletion::{
    ConsentHandle, ConsentResolution, DeletionCoordinator, DeletionOutcome, StorageAuthority,
};
use super::{format_megabytes, sort_items, FolderId, Folder, MediaId, MediaItem, NonEmpty, SortKey};
use crate::keep_store::KeepStore;
use crate::library::MediaIndex;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happens to queued items when the user refuses deletion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeniedConsentPolicy {
    /// Items stay queued so the user can retry the confirm
    #[default]
    KeepQueued,
    /// Items go back to the front of the active list
    RestoreToActive,
}

/// Items captured for one confirm attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionBatch {
    pub items: NonEmpty<MediaItem>,
    pub count: usize,
    pub total_bytes: u64,
}

impl DeletionBatch {
    fn new(items: NonEmpty<MediaItem>) -> Self {
        let count = items.len();
        let total_bytes = items.iter().map(|item| item.size_bytes).sum();
        Self {
            items,
            count,
            total_bytes,
        }
    }

    fn ids(&self) -> HashSet<MediaId> {
        self.items.iter().map(|item| item.id).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmPhase {
    Idle,
    /// A deletion request is with the storage authority
    Confirming,
    AwaitingConsent(ConsentHandle),
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Confirming(DeletionBatch),
    AwaitingConsent {
        batch: DeletionBatch,
        handle: ConsentHandle,
    },
}

/// Everything a host needs to draw the current state
#[derive(Debug, Clone, PartialEq)]
pub struct TriageSnapshot {
    /// Interactive card
    pub front: Option<MediaItem>,
    /// Card previewed under the front one
    pub next: Option<MediaItem>,
    pub active_len: usize,
    pub pending_len: usize,
    pub pending_bytes: u64,
    pub sort_key: SortKey,
    pub folder: Option<FolderId>,
    pub phase: ConfirmPhase,
    pub summary: Option<String>,
    pub failure: Option<String>,
}

impl TriageSnapshot {
    pub fn consent(&self) -> Option<ConsentHandle> {
        match self.phase {
            ConfirmPhase::AwaitingConsent(handle) => Some(handle),
            _ => None,
        }
    }
}

/// Session counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriageStatistics {
    pub kept: usize,
    pub deleted: usize,
    pub bytes_freed: u64,
    pub pending: usize,
    pub remaining: usize,
}

pub struct TriageEngine {
    active: VecDeque<MediaItem>,
    pending: Vec<MediaItem>,
    sort_key: SortKey,
    folder: Option<FolderId>,
    phase: Phase,
    summary: Option<String>,
    failure: Option<String>,
    denied_policy: DeniedConsentPolicy,
    show_kept: bool,
    kept: usize,
    deleted: usize,
    bytes_freed: u64,
    index: Arc<dyn MediaIndex>,
    keep_store: Arc<dyn KeepStore>,
}

impl TriageEngine {
    pub fn new(index: Arc<dyn MediaIndex>, keep_store: Arc<dyn KeepStore>) -> Self {
        Self {
            active: VecDeque::new(),
            pending: Vec::new(),
            sort_key: SortKey::default(),
            folder: None,
            phase: Phase::Idle,
            summary: None,
            failure: None,
            denied_policy: DeniedConsentPolicy::default(),
            show_kept: false,
            kept: 0,
            deleted: 0,
            bytes_freed: 0,
            index,
            keep_store,
        }
    }

    pub fn with_denied_policy(mut self, policy: DeniedConsentPolicy) -> Self {
        self.denied_policy = policy;
        self
    }

    /// Whether items kept in earlier sessions are shown again on reload
    pub fn with_show_kept(mut self, show_kept: bool) -> Self {
        self.show_kept = show_kept;
        self
    }

    pub fn with_sort_key(mut self, sort_key: SortKey) -> Self {
        self.sort_key = sort_key;
        self
    }

    pub fn with_folder(mut self, folder: Option<FolderId>) -> Self {
        self.folder = folder;
        self
    }

    pub fn active(&self) -> impl Iterator<Item = &MediaItem> {
        self.active.iter()
    }

    pub fn pending(&self) -> &[MediaItem] {
        &self.pending
    }

    pub fn front(&self) -> Option<&MediaItem> {
        self.active.front()
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn denied_policy(&self) -> DeniedConsentPolicy {
        self.denied_policy
    }

    pub fn statistics(&self) -> TriageStatistics {
        TriageStatistics {
            kept: self.kept,
            deleted: self.deleted,
            bytes_freed: self.bytes_freed,
            pending: self.pending.len(),
            remaining: self.active.len(),
        }
    }

    pub fn snapshot(&self) -> TriageSnapshot {
        let phase = match &self.phase {
            Phase::Idle => ConfirmPhase::Idle,
            Phase::Confirming(_) => ConfirmPhase::Confirming,
            Phase::AwaitingConsent { handle, .. } => ConfirmPhase::AwaitingConsent(*handle),
        };

        TriageSnapshot {
            front: self.active.front().cloned(),
            next: self.active.get(1).cloned(),
            active_len: self.active.len(),
            pending_len: self.pending.len(),
            pending_bytes: self.pending.iter().map(|item| item.size_bytes).sum(),
            sort_key: self.sort_key,
            folder: self.folder.clone(),
            phase,
            summary: self.summary.clone(),
            failure: self.failure.clone(),
        }
    }

    /// Replaces the active list with `items` sorted by `sort_key`.
    ///
    /// The pending queue is untouched; items already queued for deletion are
    /// left out of the active list so no item is ever in both.
    pub fn load_items(&mut self, items: Vec<MediaItem>, sort_key: SortKey) -> TriageSnapshot {
        let queued: HashSet<MediaId> = self.pending.iter().map(|item| item.id).collect();
        let mut items: Vec<MediaItem> = items
            .into_iter()
            .filter(|item| !queued.contains(&item.id))
            .collect();
        sort_items(&mut items, sort_key);

        self.sort_key = sort_key;
        self.active = items.into();
        debug!(
            active = self.active.len(),
            pending = self.pending.len(),
            ?sort_key,
            "Loaded items"
        );
        self.snapshot()
    }

    /// Re-sorts the active list; the pending queue keeps its order
    pub fn set_sort_key(&mut self, sort_key: SortKey) -> TriageSnapshot {
        self.sort_key = sort_key;
        sort_items(self.active.make_contiguous(), sort_key);
        self.snapshot()
    }

    /// Re-reads the library for the selected folder
    pub fn reload(&mut self) -> TriageSnapshot {
        let mut items = self.index.list_items(self.folder.as_ref());
        if !self.show_kept {
            items.retain(|item| !self.keep_store.is_kept(item));
        }
        self.load_items(items, self.sort_key)
    }

    pub fn folders(&self) -> Vec<Folder> {
        self.index.list_folders()
    }

    /// Switches to `folder` (`None` = all folders) and reloads
    pub fn select_folder(&mut self, folder: Option<FolderId>) -> TriageSnapshot {
        info!(folder = ?folder, "Selecting folder");
        self.folder = folder;
        self.reload()
    }

    fn take_front(&mut self, item: &MediaItem, operation: &str) -> MediaItem {
        match self.active.front() {
            Some(front) if front.id == item.id => {}
            front => panic!(
                "{} called with item {} but the front item is {:?}",
                operation,
                item.id,
                front.map(|f| f.id)
            ),
        }
        // The guard above ensures the list is non-empty
        self.active.pop_front().unwrap_or_else(|| item.clone())
    }

    /// Delete intent: moves the front item to the tail of the pending queue.
    ///
    /// # Panics
    /// If `item` is not the current front item.
    pub fn commit_left(&mut self, item: &MediaItem) -> TriageSnapshot {
        let item = self.take_front(item, "commit_left");
        debug!(item = %item.id, "Queued for deletion");
        self.pending.push(item);
        self.snapshot()
    }

    /// Keep intent: drops the front item and records it with the keep store.
    ///
    /// # Panics
    /// If `item` is not the current front item.
    pub fn commit_right(&mut self, item: &MediaItem) -> TriageSnapshot {
        let item = self.take_front(item, "commit_right");
        debug!(item = %item.id, "Kept");
        self.kept += 1;
        self.keep_store.record(&item);
        self.snapshot()
    }

    /// Moves the most recently queued item back to the front of the active
    /// list. Does nothing when the queue is empty or a deletion is outstanding.
    pub fn undo(&mut self) -> TriageSnapshot {
        if !matches!(self.phase, Phase::Idle) {
            warn!("Undo ignored while a deletion is outstanding");
            return self.snapshot();
        }

        if let Some(item) = self.pending.pop() {
            debug!(item = %item.id, "Restored from pending queue");
            self.active.push_front(item);
        }
        self.snapshot()
    }

    /// First half of a confirm: captures the pending queue as a batch.
    ///
    /// Returns `None` (and changes nothing) when the queue is empty. The
    /// batch must be handed to a deletion coordinator and its outcome fed
    /// back through [`Self::apply_outcome`].
    ///
    /// # Panics
    /// If a confirm or consent request is already outstanding.
    pub fn begin_confirm(&mut self) -> Option<DeletionBatch> {
        if !matches!(self.phase, Phase::Idle) {
            panic!("confirm called while a deletion is already outstanding");
        }

        let batch = DeletionBatch::new(NonEmpty::from_vec(self.pending.clone())?);
        info!(
            count = batch.count,
            bytes = batch.total_bytes,
            "Confirming deletion"
        );
        self.failure = None;
        self.phase = Phase::Confirming(batch.clone());
        Some(batch)
    }

    /// Second half of a confirm: reconciles state with the authority's answer.
    ///
    /// # Panics
    /// If no confirm is in flight.
    pub fn apply_outcome(&mut self, outcome: DeletionOutcome) -> TriageSnapshot {
        let batch = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Confirming(batch) => batch,
            other => {
                self.phase = other;
                panic!("apply_outcome called without a confirm in flight");
            }
        };

        match outcome {
            DeletionOutcome::Completed { count, bytes_freed } => {
                self.finish_deletion(&batch, count, bytes_freed);
            }
            DeletionOutcome::NeedsConsent(handle) => {
                info!(handle = handle.raw(), "Waiting for deletion consent");
                self.phase = Phase::AwaitingConsent { batch, handle };
            }
            DeletionOutcome::Failed(reason) => {
                warn!(reason = %reason, "Deletion failed; queue kept for retry");
                self.failure = Some(format!("Deletion failed: {}", reason));
            }
        }

        self.snapshot()
    }

    /// Runs a whole confirm against `coordinator` on the current thread.
    ///
    /// Returns `None` when there was nothing to delete.
    pub fn confirm<A: StorageAuthority + 'static>(
        &mut self,
        coordinator: &DeletionCoordinator<A>,
    ) -> Option<DeletionOutcome> {
        let batch = self.begin_confirm()?;
        let outcome = coordinator.request_deletion(&batch.items);
        self.apply_outcome(outcome.clone());
        Some(outcome)
    }

    /// Like [`Self::confirm`], with the authority call on the blocking pool
    pub async fn confirm_async<A: StorageAuthority + 'static>(
        &mut self,
        coordinator: &DeletionCoordinator<A>,
    ) -> Option<DeletionOutcome> {
        let batch = self.begin_confirm()?;
        let outcome = coordinator.request_deletion_async(batch.items).await;
        self.apply_outcome(outcome.clone());
        Some(outcome)
    }

    /// Delivers the user's consent decision.
    ///
    /// # Panics
    /// If no consent request is outstanding.
    pub fn resolve_consent(&mut self, granted: bool) -> TriageSnapshot {
        let resolution = if granted {
            ConsentResolution::Granted
        } else {
            ConsentResolution::Denied
        };
        self.apply_consent_resolution(resolution)
    }

    /// Like [`Self::resolve_consent`], also covering an authority that failed
    /// after the user agreed.
    ///
    /// # Panics
    /// If no consent request is outstanding.
    pub fn apply_consent_resolution(&mut self, resolution: ConsentResolution) -> TriageSnapshot {
        let batch = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::AwaitingConsent { batch, .. } => batch,
            other => {
                self.phase = other;
                panic!("resolve_consent called without an outstanding consent request");
            }
        };

        match resolution {
            ConsentResolution::Granted => {
                let (count, bytes) = (batch.count, batch.total_bytes);
                self.finish_deletion(&batch, count, bytes);
            }
            ConsentResolution::Denied => match self.denied_policy {
                DeniedConsentPolicy::KeepQueued => {
                    info!(count = batch.count, "Consent denied; items stay queued");
                }
                DeniedConsentPolicy::RestoreToActive => {
                    info!(count = batch.count, "Consent denied; restoring items");
                    let ids = batch.ids();
                    self.pending.retain(|item| !ids.contains(&item.id));
                    for item in batch.items.into_vec() {
                        self.active.push_front(item);
                    }
                }
            },
            ConsentResolution::Failed(reason) => {
                self.failure = Some(format!("Deletion failed: {}", reason));
            }
        }

        self.snapshot()
    }

    /// Clears the freed-space summary once the user has seen it
    pub fn acknowledge_summary(&mut self) -> TriageSnapshot {
        self.summary = None;
        self.snapshot()
    }

    pub fn dismiss_failure(&mut self) -> TriageSnapshot {
        self.failure = None;
        self.snapshot()
    }

    fn finish_deletion(&mut self, batch: &DeletionBatch, count: usize, bytes: u64) {
        // Only the captured batch leaves the queue; items swiped left while
        // the request was outstanding stay queued.
        let ids = batch.ids();
        self.pending.retain(|item| !ids.contains(&item.id));

        self.deleted += count;
        self.bytes_freed += bytes;
        self.summary = Some(format_summary(count, bytes));
        info!(count, bytes, "Deletion completed");

        self.reload();
    }
}

/// Human readable result of a completed deletion
pub fn format_summary(count: usize, bytes: u64) -> String {
    let noun = if count == 1 { "item" } else { "items" };
    format!("Deleted {} {}, freed {}", count, noun, format_megabytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deletion::test_support::ScriptedAuthority;
    use crate::domain::deletion::AuthorityResponse;
    use crate::domain::test_support::item;
    use crate::keep_store::MemoryKeepStore;
    use crate::library::test_support::StaticIndex;

    const MIB: u64 = 1024 * 1024;

    struct Fixture {
        engine: TriageEngine,
        index: Arc<StaticIndex>,
        keeps: Arc<MemoryKeepStore>,
    }

    /// Engine over items p1..=pn, loaded oldest first so p1 is in front
    fn fixture(n: u64) -> Fixture {
        let items: Vec<MediaItem> = (1..=n).map(|id| item(id, id * MIB)).collect();
        let index = Arc::new(StaticIndex::with_items(items.clone()));
        let keeps = Arc::new(MemoryKeepStore::new());
        let mut engine = TriageEngine::new(index.clone(), keeps.clone());
        engine.load_items(items, SortKey::DateAsc);
        Fixture {
            engine,
            index,
            keeps,
        }
    }

    fn active_ids(engine: &TriageEngine) -> Vec<u64> {
        engine.active().map(|i| i.id.0).collect()
    }

    fn pending_ids(engine: &TriageEngine) -> Vec<u64> {
        engine.pending().iter().map(|i| i.id.0).collect()
    }

    fn assert_disjoint(engine: &TriageEngine) {
        let active: HashSet<u64> = active_ids(engine).into_iter().collect();
        assert!(
            pending_ids(engine).iter().all(|id| !active.contains(id)),
            "active {:?} and pending {:?} overlap",
            active_ids(engine),
            pending_ids(engine)
        );
    }

    fn swipe_left_front(engine: &mut TriageEngine) -> TriageSnapshot {
        let front = engine.front().cloned().unwrap();
        engine.commit_left(&front)
    }

    fn swipe_right_front(engine: &mut TriageEngine) -> TriageSnapshot {
        let front = engine.front().cloned().unwrap();
        engine.commit_right(&front)
    }

    mod swipe_tests {
        use super::*;

        #[test]
        fn test_commit_left_moves_front_to_queue_tail() {
            let mut f = fixture(3);
            let snapshot = swipe_left_front(&mut f.engine);

            assert_eq!(active_ids(&f.engine), vec![2, 3]);
            assert_eq!(pending_ids(&f.engine), vec![1]);
            assert_eq!(snapshot.active_len, 2);
            assert_eq!(snapshot.pending_len, 1);
            assert_eq!(snapshot.front.map(|i| i.id.0), Some(2));
            assert_eq!(snapshot.next.map(|i| i.id.0), Some(3));
        }

        #[test]
        fn test_commit_right_records_keep() {
            let mut f = fixture(2);
            swipe_right_front(&mut f.engine);

            assert_eq!(active_ids(&f.engine), vec![2]);
            assert!(f.engine.pending().is_empty());
            assert_eq!(f.keeps.kept().len(), 1);
            assert_eq!(f.engine.statistics().kept, 1);
        }

        #[test]
        #[should_panic(expected = "commit_left called with item")]
        fn test_commit_left_on_non_front_panics() {
            let mut f = fixture(3);
            f.engine.commit_left(&item(2, 2 * MIB));
        }

        #[test]
        #[should_panic(expected = "commit_right called with item")]
        fn test_commit_right_on_empty_list_panics() {
            let mut f = fixture(0);
            f.engine.commit_right(&item(1, MIB));
        }

        #[test]
        fn test_lists_stay_disjoint() {
            let mut f = fixture(6);
            swipe_left_front(&mut f.engine);
            assert_disjoint(&f.engine);
            swipe_right_front(&mut f.engine);
            swipe_left_front(&mut f.engine);
            assert_disjoint(&f.engine);
            f.engine.undo();
            assert_disjoint(&f.engine);
            f.engine.set_sort_key(SortKey::SizeDesc);
            swipe_left_front(&mut f.engine);
            assert_disjoint(&f.engine);
            f.engine.reload();
            assert_disjoint(&f.engine);
            f.engine.undo();
            f.engine.undo();
            assert_disjoint(&f.engine);
        }
    }

    mod undo_tests {
        use super::*;

        #[test]
        fn test_scenario_a() {
            let mut f = fixture(3);
            swipe_left_front(&mut f.engine);
            assert_eq!(active_ids(&f.engine), vec![2, 3]);
            assert_eq!(pending_ids(&f.engine), vec![1]);

            swipe_left_front(&mut f.engine);
            assert_eq!(active_ids(&f.engine), vec![3]);
            assert_eq!(pending_ids(&f.engine), vec![1, 2]);

            f.engine.undo();
            assert_eq!(active_ids(&f.engine), vec![2, 3]);
            assert_eq!(pending_ids(&f.engine), vec![1]);
        }

        #[test]
        fn test_undo_then_commit_left_is_identity_on_queue() {
            let mut f = fixture(4);
            swipe_left_front(&mut f.engine);
            swipe_left_front(&mut f.engine);
            let before = pending_ids(&f.engine);

            f.engine.undo();
            swipe_left_front(&mut f.engine);
            assert_eq!(pending_ids(&f.engine), before);
        }

        #[test]
        fn test_undo_on_empty_queue_is_noop() {
            let mut f = fixture(2);
            let before = f.engine.snapshot();
            assert_eq!(f.engine.undo(), before);
        }

        #[test]
        fn test_undo_does_not_resort() {
            let mut f = fixture(3);
            swipe_left_front(&mut f.engine);
            f.engine.set_sort_key(SortKey::SizeDesc);
            assert_eq!(active_ids(&f.engine), vec![3, 2]);

            f.engine.undo();
            assert_eq!(active_ids(&f.engine), vec![1, 3, 2]);
        }
    }

    mod sort_tests {
        use super::*;

        #[test]
        fn test_load_items_sorts() {
            let mut f = fixture(0);
            f.engine
                .load_items(vec![item(1, 5), item(2, 9), item(3, 1)], SortKey::SizeAsc);
            assert_eq!(active_ids(&f.engine), vec![3, 1, 2]);
            assert_eq!(f.engine.sort_key(), SortKey::SizeAsc);
        }

        #[test]
        fn test_load_items_keeps_queue_and_skips_queued_items() {
            let mut f = fixture(3);
            swipe_left_front(&mut f.engine);

            f.engine
                .load_items(vec![item(1, MIB), item(2, MIB), item(4, MIB)], SortKey::DateDesc);
            assert_eq!(pending_ids(&f.engine), vec![1]);
            assert_eq!(active_ids(&f.engine), vec![4, 2]);
        }

        #[test]
        fn test_set_sort_key_leaves_queue_order() {
            let mut f = fixture(4);
            swipe_left_front(&mut f.engine);
            swipe_left_front(&mut f.engine);
            f.engine.set_sort_key(SortKey::DateDesc);

            assert_eq!(active_ids(&f.engine), vec![4, 3]);
            assert_eq!(pending_ids(&f.engine), vec![1, 2]);
        }

        #[test]
        fn test_reload_hides_kept_items_unless_asked() {
            let mut f = fixture(3);
            swipe_right_front(&mut f.engine);
            f.engine.reload();
            assert_eq!(active_ids(&f.engine), vec![2, 3]);

            let mut showing = TriageEngine::new(f.index.clone(), f.keeps.clone())
                .with_show_kept(true)
                .with_sort_key(SortKey::DateAsc);
            showing.reload();
            assert_eq!(active_ids(&showing), vec![1, 2, 3]);
        }
    }

    mod confirm_tests {
        use super::*;

        fn coordinator(response: AuthorityResponse) -> DeletionCoordinator<ScriptedAuthority> {
            DeletionCoordinator::new(ScriptedAuthority::answering(response))
        }

        #[test]
        fn test_confirm_on_empty_queue_does_nothing() {
            let mut f = fixture(2);
            let before = f.engine.snapshot();
            let coordinator = coordinator(AuthorityResponse::Deleted);

            assert!(f.engine.confirm(&coordinator).is_none());
            assert_eq!(f.engine.snapshot(), before);
            assert!(coordinator.authority().deleted.lock().unwrap().is_empty());
            assert_eq!(f.index.query_count(), 0);
        }

        #[test]
        fn test_scenario_b_completed() {
            let mut f = fixture(3);
            swipe_left_front(&mut f.engine);
            swipe_left_front(&mut f.engine);
            // p1 = 1 MiB, p2 = 2 MiB in the fixture; resize to the scenario's 2 + 3 MiB
            f.engine.pending[0].size_bytes = 2 * MIB;
            f.engine.pending[1].size_bytes = 3 * MIB;
            f.index.set_items(vec![item(3, 3 * MIB), item(9, MIB)]);

            let coordinator = coordinator(AuthorityResponse::Deleted);
            let outcome = f.engine.confirm(&coordinator).unwrap();

            assert_eq!(
                outcome,
                DeletionOutcome::Completed {
                    count: 2,
                    bytes_freed: 5 * MIB
                }
            );
            let snapshot = f.engine.snapshot();
            assert_eq!(snapshot.pending_len, 0);
            assert_eq!(
                snapshot.summary.as_deref(),
                Some("Deleted 2 items, freed 5.00 MB")
            );
            assert_eq!(f.index.query_count(), 1);
            assert_eq!(active_ids(&f.engine), vec![3, 9]);
            assert_eq!(f.engine.statistics().deleted, 2);

            f.engine.acknowledge_summary();
            assert!(f.engine.snapshot().summary.is_none());
        }

        #[test]
        fn test_scenario_c_consent_granted() {
            let mut f = fixture(2);
            swipe_left_front(&mut f.engine);
            let handle = ConsentHandle::new(7);

            let outcome = f
                .engine
                .confirm(&coordinator(AuthorityResponse::ConsentRequired(handle)))
                .unwrap();
            assert_eq!(outcome, DeletionOutcome::NeedsConsent(handle));
            assert_eq!(pending_ids(&f.engine), vec![1]);
            assert_eq!(f.engine.snapshot().consent(), Some(handle));

            f.index.set_items(vec![item(2, 2 * MIB)]);
            let snapshot = f.engine.resolve_consent(true);
            assert_eq!(snapshot.pending_len, 0);
            assert_eq!(snapshot.consent(), None);
            assert_eq!(snapshot.summary.as_deref(), Some("Deleted 1 item, freed 1.00 MB"));
        }

        #[test]
        fn test_scenario_d_consent_denied_keeps_queue() {
            let mut f = fixture(2);
            swipe_left_front(&mut f.engine);
            f.engine
                .confirm(&coordinator(AuthorityResponse::ConsentRequired(
                    ConsentHandle::new(1),
                )))
                .unwrap();

            let snapshot = f.engine.resolve_consent(false);
            assert_eq!(pending_ids(&f.engine), vec![1]);
            assert_eq!(active_ids(&f.engine), vec![2]);
            assert_eq!(snapshot.phase, ConfirmPhase::Idle);
            assert!(snapshot.summary.is_none());
        }

        #[test]
        fn test_denied_consent_can_restore_items() {
            let mut f = fixture(3);
            f.engine = TriageEngine::new(f.index.clone(), f.keeps.clone())
                .with_denied_policy(DeniedConsentPolicy::RestoreToActive);
            f.engine
                .load_items((1..=3).map(|id| item(id, MIB)).collect(), SortKey::DateAsc);
            swipe_left_front(&mut f.engine);
            swipe_left_front(&mut f.engine);
            f.engine
                .confirm(&coordinator(AuthorityResponse::ConsentRequired(
                    ConsentHandle::new(1),
                )))
                .unwrap();

            f.engine.resolve_consent(false);
            assert!(f.engine.pending().is_empty());
            assert_eq!(active_ids(&f.engine), vec![2, 1, 3]);
            assert_disjoint(&f.engine);
        }

        #[test]
        fn test_failed_deletion_keeps_queue_for_retry() {
            let mut f = fixture(2);
            swipe_left_front(&mut f.engine);

            let failing = DeletionCoordinator::new(ScriptedAuthority::failing("read-only volume"));
            let outcome = f.engine.confirm(&failing).unwrap();
            assert!(matches!(outcome, DeletionOutcome::Failed(_)));

            let snapshot = f.engine.snapshot();
            assert_eq!(snapshot.pending_len, 1);
            assert!(snapshot.failure.unwrap().contains("read-only volume"));

            // Retry goes through
            let outcome = f
                .engine
                .confirm(&coordinator(AuthorityResponse::Deleted))
                .unwrap();
            assert!(matches!(outcome, DeletionOutcome::Completed { .. }));
            assert!(f.engine.snapshot().failure.is_none());
        }

        #[test]
        fn test_failure_after_consent_keeps_queue() {
            let mut f = fixture(2);
            swipe_left_front(&mut f.engine);
            f.engine
                .confirm(&coordinator(AuthorityResponse::ConsentRequired(
                    ConsentHandle::new(1),
                )))
                .unwrap();

            let snapshot = f
                .engine
                .apply_consent_resolution(ConsentResolution::Failed("busy".to_string()));
            assert_eq!(snapshot.pending_len, 1);
            assert_eq!(snapshot.phase, ConfirmPhase::Idle);
            assert!(snapshot.failure.is_some());
        }

        #[test]
        #[should_panic(expected = "confirm called while a deletion is already outstanding")]
        fn test_second_confirm_while_awaiting_consent_panics() {
            let mut f = fixture(2);
            swipe_left_front(&mut f.engine);
            let coordinator = coordinator(AuthorityResponse::ConsentRequired(ConsentHandle::new(1)));
            f.engine.confirm(&coordinator);
            f.engine.confirm(&coordinator);
        }

        #[test]
        #[should_panic(expected = "without an outstanding consent request")]
        fn test_resolve_without_consent_panics() {
            let mut f = fixture(1);
            f.engine.resolve_consent(true);
        }

        #[test]
        fn test_undo_is_refused_while_awaiting_consent() {
            let mut f = fixture(2);
            swipe_left_front(&mut f.engine);
            f.engine
                .confirm(&coordinator(AuthorityResponse::ConsentRequired(
                    ConsentHandle::new(1),
                )))
                .unwrap();

            f.engine.undo();
            assert_eq!(pending_ids(&f.engine), vec![1]);
            assert_eq!(active_ids(&f.engine), vec![2]);
        }

        #[test]
        fn test_swipes_during_consent_survive_grant() {
            let mut f = fixture(3);
            swipe_left_front(&mut f.engine);
            f.engine
                .confirm(&coordinator(AuthorityResponse::ConsentRequired(
                    ConsentHandle::new(1),
                )))
                .unwrap();
            swipe_left_front(&mut f.engine);

            f.index.set_items(vec![item(3, 3 * MIB)]);
            let snapshot = f.engine.resolve_consent(true);
            assert_eq!(pending_ids(&f.engine), vec![2]);
            assert_eq!(snapshot.summary.as_deref(), Some("Deleted 1 item, freed 1.00 MB"));
        }

        #[test]
        fn test_split_confirm_reports_confirming_phase() {
            let mut f = fixture(2);
            swipe_left_front(&mut f.engine);
            let batch = f.engine.begin_confirm().unwrap();

            assert_eq!(batch.count, 1);
            assert_eq!(batch.total_bytes, MIB);
            assert_eq!(f.engine.snapshot().phase, ConfirmPhase::Confirming);

            f.engine.apply_outcome(DeletionOutcome::Completed {
                count: 1,
                bytes_freed: MIB,
            });
            assert_eq!(f.engine.snapshot().phase, ConfirmPhase::Idle);
        }

        #[tokio::test]
        async fn test_confirm_async() {
            let mut f = fixture(2);
            swipe_left_front(&mut f.engine);
            let outcome = f
                .engine
                .confirm_async(&coordinator(AuthorityResponse::Deleted))
                .await;
            assert!(matches!(outcome, Some(DeletionOutcome::Completed { count: 1, .. })));
        }
    }

    #[test]
    fn test_format_summary() {
        assert_eq!(format_summary(1, MIB), "Deleted 1 item, freed 1.00 MB");
        assert_eq!(format_summary(3, 0), "Deleted 3 items, freed 0.00 MB");
    }
}
