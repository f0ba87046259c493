//! Session layer capability — ownership and replication, injected.
//!
//! ARCHITECTURE
//! ============
//! The hosting session decides who owns an object and moves payloads
//! between participants. The core only ever talks to it through this
//! trait, so the state machine stays testable without a real networked
//! session: tests inject fixed-answer doubles, the demo injects
//! [`crate::hub::LocalHub`].
//!
//! Ownership is cooperative: a transfer request succeeds unconditionally
//! and the last requester wins. Denial is not an error — a layer that
//! cannot grant ownership keeps answering `is_owner() == false` and every
//! mutation attempt degrades to a no-op upstream.

use crate::message::SyncMessage;
use crate::state::PagePosition;

/// Capability handle onto the hosting session, scoped to one participant
/// and one shared object.
pub trait SessionLayer: Send + Sync {
    /// Whether the local participant currently owns the object. Pure query.
    fn is_owner(&self) -> bool;

    /// Request exclusive ownership. Returns whether the local participant
    /// holds ownership afterward. Never blocks indefinitely.
    fn take_ownership(&self) -> bool;

    /// Broadcast the authoritative position to every other participant.
    /// Raw delivery — the ownership gate lives in the coordinator.
    fn replicate(&self, page: PagePosition);

    /// Deliver a message to whichever participant currently owns the
    /// object. Dropped silently when there is no owner.
    fn send_to_owner(&self, message: SyncMessage);
}

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Session double with scripted ownership answers and a replication log.
    pub struct FixedSession {
        owner: AtomicBool,
        grants: bool,
        pub transfer_requests: AtomicUsize,
        pub published: Mutex<Vec<PagePosition>>,
        pub to_owner: Mutex<Vec<SyncMessage>>,
    }

    impl FixedSession {
        /// A session that already owns the object.
        #[must_use]
        pub fn owning() -> Self {
            Self {
                owner: AtomicBool::new(true),
                grants: true,
                transfer_requests: AtomicUsize::new(0),
                published: Mutex::new(vec![]),
                to_owner: Mutex::new(vec![]),
            }
        }

        /// A session that does not own but grants a transfer on request.
        #[must_use]
        pub fn granting() -> Self {
            Self {
                owner: AtomicBool::new(false),
                grants: true,
                transfer_requests: AtomicUsize::new(0),
                published: Mutex::new(vec![]),
                to_owner: Mutex::new(vec![]),
            }
        }

        /// A session that does not own and never grants ownership.
        #[must_use]
        pub fn denied() -> Self {
            Self {
                owner: AtomicBool::new(false),
                grants: false,
                transfer_requests: AtomicUsize::new(0),
                published: Mutex::new(vec![]),
                to_owner: Mutex::new(vec![]),
            }
        }
    }

    impl SessionLayer for FixedSession {
        fn is_owner(&self) -> bool {
            self.owner.load(Ordering::SeqCst)
        }

        fn take_ownership(&self) -> bool {
            self.transfer_requests.fetch_add(1, Ordering::SeqCst);
            if self.grants {
                self.owner.store(true, Ordering::SeqCst);
            }
            self.is_owner()
        }

        fn replicate(&self, page: PagePosition) {
            self.published.lock().unwrap().push(page);
        }

        fn send_to_owner(&self, message: SyncMessage) {
            self.to_owner.lock().unwrap().push(message);
        }
    }
}
