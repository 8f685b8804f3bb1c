//! Mswp - swipe-style triage of a media library
//!
//! The core lives in [`domain`]: a gesture classifier turning pointer samples
//! into drags, taps and long presses, a swipe resolver deciding commits, and
//! a triage engine keeping the card list, the pending-delete queue and the
//! confirm/consent cycle consistent. [`library`], [`keep_store`] and the
//! storage authorities in [`domain::deletion`] are its collaborators; [`app`]
//! and [`tui`] host it in a terminal.

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod keep_store;
pub mod library;
pub mod logging;
pub mod tui;

// Re-export primary types for convenience
pub use app::{App, CardView};
pub use config::UserConfig;
pub use domain::deletion::{
    AuthorityError, AuthorityResponse, ConsentHandle, ConsentResolution, DeletionCoordinator,
    DeletionOutcome, DryRunAuthority, StorageAuthority, TrashAuthority,
};
pub use domain::gesture::{Gesture, GestureClassifier, Point, PointerEvent, PointerId, Vector};
pub use domain::swipe::{Direction, SwipeDecision, SwipeResolver};
pub use domain::triage::{
    ConfirmPhase, DeletionBatch, DeniedConsentPolicy, TriageEngine, TriageSnapshot,
    TriageStatistics,
};
pub use domain::{Folder, FolderId, Locator, MediaId, MediaItem, NonEmpty, SortKey};
pub use error::{MswpError, Result};
pub use keep_store::{JsonKeepStore, KeepStore, MemoryKeepStore};
pub use library::{FsMediaIndex, MediaIndex};
