//! Host-side controller tying pointer input, swipe decisions and the triage
//! engine together on the UI thread.
//!
//! Deletion and consent round trips run on a tokio runtime; their results are
//! picked up by [`App::poll_background`] so the engine only ever changes on
//! the thread that owns the `App`.

use crate::domain::deletion::{
    ConsentResolution, DeletionCoordinator, DeletionOutcome, StorageAuthority,
};
use crate::domain::gesture::{
    Gesture, GestureClassifier, PointerEvent, Vector, EXIT_SETTLE_DURATION, RESET_SETTLE_DURATION,
};
use crate::domain::swipe::{Direction, SwipeDecision, SwipeResolver};
use crate::domain::triage::{ConfirmPhase, TriageEngine, TriageSnapshot};
use crate::domain::{FolderId, Locator, MediaId, MediaItem};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, info, warn};

/// What the card should look like this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardView {
    pub offset: Vector,
    pub rotation: f32,
    /// 0..=1 towards the commit threshold
    pub progress: f32,
    /// Direction the card is leaning, once it has moved at all
    pub leaning: Option<Direction>,
}

pub struct App<A: StorageAuthority + 'static> {
    engine: TriageEngine,
    coordinator: DeletionCoordinator<A>,
    runtime: Handle,
    classifier: GestureClassifier,
    resolver: SwipeResolver,
    snapshot: TriageSnapshot,
    /// Card currently owned by the classifier
    card: Option<MediaId>,
    /// Commit waiting for its exit animation to finish
    exiting: Option<(MediaItem, Direction)>,
    deletion_rx: Option<oneshot::Receiver<DeletionOutcome>>,
    consent_rx: Option<oneshot::Receiver<ConsentResolution>>,
    details: bool,
    open_request: Option<Locator>,
}

impl<A: StorageAuthority + 'static> App<A> {
    pub fn new(
        engine: TriageEngine,
        coordinator: DeletionCoordinator<A>,
        runtime: Handle,
        card_width: f32,
    ) -> Self {
        let snapshot = engine.snapshot();
        let mut app = Self {
            engine,
            coordinator,
            runtime,
            classifier: GestureClassifier::new(false),
            resolver: SwipeResolver::new(card_width),
            snapshot,
            card: None,
            exiting: None,
            deletion_rx: None,
            consent_rx: None,
            details: false,
            open_request: None,
        };
        app.sync_card();
        app
    }

    pub fn snapshot(&self) -> &TriageSnapshot {
        &self.snapshot
    }

    pub fn engine(&self) -> &TriageEngine {
        &self.engine
    }

    pub fn set_card_width(&mut self, card_width: f32) {
        if (self.resolver.card_width() - card_width).abs() > f32::EPSILON {
            self.resolver = SwipeResolver::new(card_width);
        }
    }

    /// Long press on a video is being held
    pub fn showing_details(&self) -> bool {
        self.details
    }

    /// A deletion or consent round trip is in flight
    pub fn is_busy(&self) -> bool {
        self.deletion_rx.is_some() || self.consent_rx.is_some()
    }

    /// Item the user asked to open with a double tap, if any
    pub fn take_open_request(&mut self) -> Option<Locator> {
        self.open_request.take()
    }

    pub fn card_view(&self, now: Duration) -> CardView {
        let (offset, rotation) = self.classifier.visual_offset(now);
        let leaning = if offset.x > 0.0 {
            Some(Direction::Right)
        } else if offset.x < 0.0 {
            Some(Direction::Left)
        } else {
            None
        };
        CardView {
            offset,
            rotation,
            progress: self.resolver.progress(offset),
            leaning,
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        // Let a finished exit commit first so the sample lands on the new card
        let gestures = self.classifier.tick(event.time);
        self.apply_gestures(gestures, event.time);

        if self.card.is_none() {
            return;
        }
        let gestures = self.classifier.handle(event);
        self.apply_gestures(gestures, event.time);
    }

    /// Advances gesture timers and collects background results
    pub fn tick(&mut self, now: Duration) {
        let gestures = self.classifier.tick(now);
        self.apply_gestures(gestures, now);
        self.poll_background();
    }

    fn apply_gestures(&mut self, gestures: Vec<Gesture>, now: Duration) {
        for gesture in gestures {
            match gesture {
                Gesture::Drag(_) | Gesture::Tap => {}
                Gesture::DragEnd { offset, .. } => match self.resolver.resolve(offset) {
                    SwipeDecision::Reset => {
                        self.classifier
                            .settle(Vector::ZERO, now, RESET_SETTLE_DURATION);
                    }
                    SwipeDecision::Commit(direction) => self.start_exit(direction, now),
                },
                Gesture::DoubleTap => {
                    self.open_request = self.snapshot.front.as_ref().map(|i| i.locator.clone());
                }
                Gesture::LongPressStart => self.details = true,
                Gesture::LongPressEnd => self.details = false,
            }
        }
        self.finish_exit();
    }

    /// Keyboard swipe: same exit animation as a drag past the threshold
    pub fn swipe(&mut self, direction: Direction, now: Duration) {
        if self.card.is_none() || !self.classifier.is_idle() || self.exiting.is_some() {
            return;
        }
        self.start_exit(direction, now);
    }

    fn start_exit(&mut self, direction: Direction, now: Duration) {
        let Some(front) = self.snapshot.front.clone() else {
            return;
        };
        self.exiting = Some((front, direction));
        self.classifier
            .settle(self.resolver.exit_target(direction), now, EXIT_SETTLE_DURATION);
    }

    /// Applies a pending commit once its card has left the screen
    fn finish_exit(&mut self) {
        if self.classifier.is_settling() {
            return;
        }
        let Some((item, direction)) = self.exiting.take() else {
            return;
        };
        let snapshot = match direction {
            Direction::Left => self.engine.commit_left(&item),
            Direction::Right => self.engine.commit_right(&item),
        };
        self.publish(snapshot);
    }

    fn publish(&mut self, snapshot: TriageSnapshot) {
        self.snapshot = snapshot;
        self.sync_card();
    }

    /// Hands the classifier to the new front card when it changes
    fn sync_card(&mut self) {
        let front = self.snapshot.front.as_ref();
        let id = front.map(|item| item.id);
        if id != self.card {
            self.classifier.reset(front.is_some_and(|item| item.is_video));
            self.card = id;
            self.details = false;
            self.exiting = None;
        }
    }

    fn idle_for_list_changes(&self) -> bool {
        self.exiting.is_none() && self.classifier.is_idle()
    }

    pub fn undo(&mut self) {
        if !self.idle_for_list_changes() {
            return;
        }
        let snapshot = self.engine.undo();
        self.publish(snapshot);
    }

    pub fn cycle_sort(&mut self) {
        if !self.idle_for_list_changes() {
            return;
        }
        let snapshot = self.engine.set_sort_key(self.snapshot.sort_key.next());
        self.publish(snapshot);
    }

    /// Moves to the next folder, wrapping through "all folders"
    pub fn cycle_folder(&mut self) {
        if !self.idle_for_list_changes() {
            return;
        }
        let mut choices: Vec<Option<FolderId>> = vec![None];
        choices.extend(self.engine.folders().into_iter().map(|f| Some(f.id)));

        let current = choices
            .iter()
            .position(|c| *c == self.snapshot.folder)
            .unwrap_or(0);
        let next = choices[(current + 1) % choices.len()].clone();
        let snapshot = self.engine.select_folder(next);
        self.publish(snapshot);
    }

    /// Starts deleting the pending queue in the background
    pub fn confirm(&mut self) {
        if self.is_busy() || self.snapshot.phase != ConfirmPhase::Idle {
            debug!("Confirm ignored while a deletion is outstanding");
            return;
        }
        let Some(batch) = self.engine.begin_confirm() else {
            return;
        };

        let (tx, rx) = oneshot::channel();
        let coordinator = self.coordinator.clone();
        self.runtime.spawn(async move {
            let outcome = coordinator.request_deletion_async(batch.items).await;
            let _ = tx.send(outcome);
        });
        self.deletion_rx = Some(rx);
        self.snapshot = self.engine.snapshot();
    }

    /// Passes the user's consent decision to the storage authority
    pub fn resolve_consent(&mut self, granted: bool) {
        let Some(handle) = self.snapshot.consent() else {
            return;
        };
        if self.consent_rx.is_some() {
            return;
        }
        info!(granted, "Consent answered");

        let (tx, rx) = oneshot::channel();
        let coordinator = self.coordinator.clone();
        self.runtime.spawn(async move {
            let resolution = coordinator.finalize_consent_async(handle, granted).await;
            let _ = tx.send(resolution);
        });
        self.consent_rx = Some(rx);
    }

    pub fn acknowledge_summary(&mut self) {
        let snapshot = self.engine.acknowledge_summary();
        self.publish(snapshot);
    }

    pub fn dismiss_failure(&mut self) {
        let snapshot = self.engine.dismiss_failure();
        self.publish(snapshot);
    }

    /// Blocks until in-flight deletion and consent requests have answered
    /// and applies their results. Must not be called from inside the runtime.
    pub fn drain_background(&mut self) {
        if let Some(rx) = self.deletion_rx.take() {
            info!("Waiting for the outstanding deletion to finish");
            let outcome = self.runtime.block_on(rx).unwrap_or_else(|_| {
                warn!("Deletion task dropped its result");
                DeletionOutcome::Failed("Deletion was interrupted".to_string())
            });
            let snapshot = self.engine.apply_outcome(outcome);
            self.publish(snapshot);
        }

        if let Some(rx) = self.consent_rx.take() {
            let resolution = self.runtime.block_on(rx).unwrap_or_else(|_| {
                ConsentResolution::Failed("Consent request was interrupted".to_string())
            });
            let snapshot = self.engine.apply_consent_resolution(resolution);
            self.publish(snapshot);
        }
    }

    /// Feeds finished background work back into the engine
    pub fn poll_background(&mut self) {
        if let Some(rx) = self.deletion_rx.as_mut() {
            let outcome = match rx.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Closed) => {
                    warn!("Deletion task dropped its result");
                    Some(DeletionOutcome::Failed("Deletion was interrupted".to_string()))
                }
            };
            if let Some(outcome) = outcome {
                self.deletion_rx = None;
                let snapshot = self.engine.apply_outcome(outcome);
                self.publish(snapshot);
            }
        }

        if let Some(rx) = self.consent_rx.as_mut() {
            let resolution = match rx.try_recv() {
                Ok(resolution) => Some(resolution),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Closed) => Some(ConsentResolution::Failed(
                    "Consent request was interrupted".to_string(),
                )),
            };
            if let Some(resolution) = resolution {
                self.consent_rx = None;
                let snapshot = self.engine.apply_consent_resolution(resolution);
                self.publish(snapshot);
            }
        }
    }
}
