//! Batch deletion through an external storage authority.
//!
//! The authority either deletes a batch outright, or answers that the user
//! has to consent first and hands back an opaque [`ConsentHandle`]. The
//! coordinator maps both onto a [`DeletionOutcome`] and never retries.

use super::{Locator, MediaItem, NonEmpty};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Opaque token for an outstanding consent request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsentHandle(u64);

impl ConsentHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityResponse {
    /// The whole batch is gone
    Deleted,
    /// Nothing was deleted; the user has to decide first
    ConsentRequired(ConsentHandle),
}

#[derive(Debug, Error)]
pub enum AuthorityError {
    #[error("Item not found: {0}")]
    NotFound(Locator),

    #[error("Unknown consent request {0:?}")]
    UnknownConsent(ConsentHandle),

    #[error("Trash error: {0}")]
    Trash(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The system that owns media storage
pub trait StorageAuthority: Send + Sync {
    /// Deletes every locator as one batch, or asks for consent
    fn delete(&self, locators: &[Locator]) -> Result<AuthorityResponse, AuthorityError>;

    /// Delivers the user's decision for a consent request
    fn resolve_consent(&self, handle: ConsentHandle, granted: bool) -> Result<(), AuthorityError>;
}

/// Result of one confirm attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    Completed { count: usize, bytes_freed: u64 },
    NeedsConsent(ConsentHandle),
    Failed(String),
}

/// What became of a consent request once the user answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentResolution {
    Granted,
    Denied,
    /// The user agreed but the authority could not finish the deletion
    Failed(String),
}

pub struct DeletionCoordinator<A> {
    authority: Arc<A>,
}

impl<A> Clone for DeletionCoordinator<A> {
    fn clone(&self) -> Self {
        Self {
            authority: Arc::clone(&self.authority),
        }
    }
}

impl<A: StorageAuthority + 'static> DeletionCoordinator<A> {
    pub fn new(authority: A) -> Self {
        Self {
            authority: Arc::new(authority),
        }
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    /// Asks the authority to delete the whole batch
    pub fn request_deletion(&self, items: &NonEmpty<MediaItem>) -> DeletionOutcome {
        let locators: Vec<Locator> = items.iter().map(|item| item.locator.clone()).collect();
        let bytes: u64 = items.iter().map(|item| item.size_bytes).sum();

        debug!(count = items.len(), bytes, "Requesting batch deletion");

        match self.authority.delete(&locators) {
            Ok(AuthorityResponse::Deleted) => {
                info!(count = items.len(), bytes, "Batch deleted");
                DeletionOutcome::Completed {
                    count: items.len(),
                    bytes_freed: bytes,
                }
            }
            Ok(AuthorityResponse::ConsentRequired(handle)) => {
                info!(count = items.len(), handle = handle.raw(), "Deletion needs consent");
                DeletionOutcome::NeedsConsent(handle)
            }
            Err(e) => {
                warn!(error = %e, "Batch deletion failed");
                DeletionOutcome::Failed(e.to_string())
            }
        }
    }

    /// Same as [`Self::request_deletion`], run on the blocking pool
    pub async fn request_deletion_async(&self, items: NonEmpty<MediaItem>) -> DeletionOutcome {
        let coordinator = self.clone();
        match tokio::task::spawn_blocking(move || coordinator.request_deletion(&items)).await {
            Ok(outcome) => outcome,
            Err(e) => DeletionOutcome::Failed(format!("Deletion task panicked: {}", e)),
        }
    }

    /// Passes the user's answer to the authority
    pub fn finalize_consent(&self, handle: ConsentHandle, granted: bool) -> ConsentResolution {
        match self.authority.resolve_consent(handle, granted) {
            Ok(()) if granted => ConsentResolution::Granted,
            Ok(()) => ConsentResolution::Denied,
            Err(e) => {
                warn!(error = %e, handle = handle.raw(), "Consent resolution failed");
                ConsentResolution::Failed(e.to_string())
            }
        }
    }

    pub async fn finalize_consent_async(
        &self,
        handle: ConsentHandle,
        granted: bool,
    ) -> ConsentResolution {
        let coordinator = self.clone();
        match tokio::task::spawn_blocking(move || coordinator.finalize_consent(handle, granted))
            .await
        {
            Ok(resolution) => resolution,
            Err(e) => ConsentResolution::Failed(format!("Consent task panicked: {}", e)),
        }
    }
}

/// Moves media to the system trash.
///
/// Files the current user cannot write are treated as owned by someone
/// else and need consent; with `always_confirm` every batch does.
#[derive(Debug, Default)]
pub struct TrashAuthority {
    always_confirm: bool,
    pending: Mutex<HashMap<ConsentHandle, Vec<Locator>>>,
    next_handle: AtomicU64,
}

impl TrashAuthority {
    pub fn new(always_confirm: bool) -> Self {
        Self {
            always_confirm,
            ..Self::default()
        }
    }

    fn is_protected(path: &Path) -> io::Result<bool> {
        Ok(fs::metadata(path)?.permissions().readonly())
    }

    fn trash_all(locators: &[Locator]) -> Result<(), AuthorityError> {
        trash::delete_all(locators.iter().map(Locator::as_path))
            .map_err(|e| AuthorityError::Trash(e.to_string()))
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

impl StorageAuthority for TrashAuthority {
    fn delete(&self, locators: &[Locator]) -> Result<AuthorityResponse, AuthorityError> {
        let mut needs_consent = self.always_confirm;
        for locator in locators {
            if !locator.as_path().exists() {
                return Err(AuthorityError::NotFound(locator.clone()));
            }
            if Self::is_protected(locator.as_path())? {
                needs_consent = true;
            }
        }

        if needs_consent {
            let handle = ConsentHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed));
            self.pending
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .insert(handle, locators.to_vec());
            return Ok(AuthorityResponse::ConsentRequired(handle));
        }

        Self::trash_all(locators)?;
        Ok(AuthorityResponse::Deleted)
    }

    fn resolve_consent(&self, handle: ConsentHandle, granted: bool) -> Result<(), AuthorityError> {
        let locators = self
            .pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&handle)
            .ok_or(AuthorityError::UnknownConsent(handle))?;

        if granted {
            Self::trash_all(&locators)?;
        }
        Ok(())
    }
}

/// Pretends to delete; nothing on disk changes
#[derive(Debug, Default)]
pub struct DryRunAuthority {
    always_confirm: bool,
    next_handle: AtomicU64,
}

impl DryRunAuthority {
    pub fn new(always_confirm: bool) -> Self {
        Self {
            always_confirm,
            next_handle: AtomicU64::new(0),
        }
    }
}

impl StorageAuthority for DryRunAuthority {
    fn delete(&self, locators: &[Locator]) -> Result<AuthorityResponse, AuthorityError> {
        for locator in locators {
            info!(locator = %locator, "[dry run] would delete");
        }
        if self.always_confirm {
            let handle = ConsentHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed));
            return Ok(AuthorityResponse::ConsentRequired(handle));
        }
        Ok(AuthorityResponse::Deleted)
    }

    fn resolve_consent(&self, handle: ConsentHandle, granted: bool) -> Result<(), AuthorityError> {
        info!(handle = handle.raw(), granted, "[dry run] consent resolved");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Authority that replays a fixed response and records what it saw
    #[derive(Default)]
    pub struct ScriptedAuthority {
        pub response: Mutex<Option<Result<AuthorityResponse, String>>>,
        pub deleted: Mutex<Vec<Locator>>,
        pub resolutions: Mutex<Vec<(ConsentHandle, bool)>>,
    }

    impl ScriptedAuthority {
        pub fn answering(response: AuthorityResponse) -> Self {
            let authority = Self::default();
            *authority.response.lock().unwrap() = Some(Ok(response));
            authority
        }

        pub fn failing(reason: &str) -> Self {
            let authority = Self::default();
            *authority.response.lock().unwrap() = Some(Err(reason.to_string()));
            authority
        }
    }

    impl StorageAuthority for ScriptedAuthority {
        fn delete(&self, locators: &[Locator]) -> Result<AuthorityResponse, AuthorityError> {
            let response = self
                .response
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Ok(AuthorityResponse::Deleted));
            match response {
                Ok(AuthorityResponse::Deleted) => {
                    self.deleted.lock().unwrap().extend_from_slice(locators);
                    Ok(AuthorityResponse::Deleted)
                }
                Ok(other) => Ok(other),
                Err(reason) => Err(AuthorityError::Trash(reason)),
            }
        }

        fn resolve_consent(
            &self,
            handle: ConsentHandle,
            granted: bool,
        ) -> Result<(), AuthorityError> {
            self.resolutions.lock().unwrap().push((handle, granted));
            Ok(())
        }
    }
}
