//! Ownership coordinator — gates mutation behind the session's owner.
//!
//! DESIGN
//! ======
//! Leaf component: wraps the injected session layer and nothing else. All
//! failure modes degrade to "not owner, nothing replicated" — callers treat
//! every mutation attempt as conditionally rejected, never as an error.

use std::sync::Arc;

use tracing::debug;

use crate::message::SyncMessage;
use crate::session::SessionLayer;
use crate::state::PagePosition;

/// Decides who may mutate shared state and replicates the local
/// authoritative value to all participants.
pub struct OwnershipCoordinator {
    session: Arc<dyn SessionLayer>,
}

impl OwnershipCoordinator {
    #[must_use]
    pub fn new(session: Arc<dyn SessionLayer>) -> Self {
        Self { session }
    }

    /// Whether the local participant currently owns the object.
    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.session.is_owner()
    }

    /// Ensure local ownership, requesting a transfer if needed. Returns
    /// whether the local participant owns the object afterward.
    pub fn take_ownership(&self) -> bool {
        if self.session.is_owner() {
            return true;
        }
        let granted = self.session.take_ownership();
        debug!(granted, "ownership transfer requested");
        granted
    }

    /// Replicate the authoritative position to all participants. No-op by
    /// contract when not owner, so call sites stay unconditional.
    /// Idempotent: publishing the same value twice yields the same observed
    /// state everywhere.
    pub fn publish(&self, page: PagePosition) {
        if !self.session.is_owner() {
            debug!(page = i32::from(page), "publish skipped, not owner");
            return;
        }
        self.session.replicate(page);
    }

    /// Ask the current owner to re-publish its state. Used by late joiners
    /// whose join snapshot may reflect a mid-transition value.
    pub fn request_remote_resync(&self) {
        self.session.send_to_owner(SyncMessage::ResyncRequest);
    }
}

#[cfg(test)]
#[path = "ownership_test.rs"]
mod tests;
