//! In-memory session layer — ownership and replication for one object.
//!
//! DESIGN
//! ======
//! `LocalHub` realizes the session capability without a network: each
//! participant registers its event sender, the hub remembers who owns the
//! object and the last value any owner published, and delivery is a send
//! onto the recipient's queue. Good enough for tests, simulations, and the
//! demo; a real deployment would put a networked session behind the same
//! trait.
//!
//! Ownership is cooperative and unqueued: a transfer request transfers
//! immediately and unconditionally, and two racing requests resolve to
//! whichever the hub saw last.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;
use uuid::Uuid;

use crate::message::SyncMessage;
use crate::runtime::{Event, EventSender};
use crate::session::SessionLayer;
use crate::state::PagePosition;

// =============================================================================
// HUB
// =============================================================================

struct HubInner {
    owner: Option<Uuid>,
    last_published: Option<PagePosition>,
    /// Participant event queues, keyed by participant ID.
    participants: HashMap<Uuid, EventSender>,
}

/// Shared-session state for one flip-book instance.
#[derive(Clone)]
pub struct LocalHub {
    inner: Arc<Mutex<HubInner>>,
}

impl LocalHub {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubInner {
                owner: None,
                last_published: None,
                participants: HashMap::new(),
            })),
        }
    }

    /// Register a participant and return its session handle. The first
    /// participant becomes owner. A joiner arriving after state was
    /// published gets a one-time snapshot on its queue.
    #[must_use]
    pub fn attach(&self, events: EventSender) -> SessionHandle {
        let id = Uuid::new_v4();
        let mut inner = self.inner.lock().unwrap();
        if inner.owner.is_none() {
            inner.owner = Some(id);
        }
        if let Some(page) = inner.last_published {
            let _ = events.send(Event::JoinSync(page));
        }
        inner.participants.insert(id, events);
        debug!(participant = %id, owner = ?inner.owner, "participant attached");
        SessionHandle { id, hub: self.inner.clone() }
    }

    /// Drop a participant. Ownership is not reassigned until someone asks
    /// for it.
    pub fn detach(&self, handle: &SessionHandle) {
        let mut inner = self.inner.lock().unwrap();
        inner.participants.remove(&handle.id);
        if inner.owner == Some(handle.id) {
            inner.owner = None;
        }
    }

    /// The last value any owner published, if any.
    #[must_use]
    pub fn last_published(&self) -> Option<PagePosition> {
        self.inner.lock().unwrap().last_published
    }
}

impl Default for LocalHub {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SESSION HANDLE
// =============================================================================

/// One participant's view of the hub. Implements the injected session
/// capability consumed by the ownership coordinator.
pub struct SessionHandle {
    id: Uuid,
    hub: Arc<Mutex<HubInner>>,
}

impl SessionHandle {
    #[must_use]
    pub fn participant_id(&self) -> Uuid {
        self.id
    }
}

impl SessionLayer for SessionHandle {
    fn is_owner(&self) -> bool {
        self.hub.lock().unwrap().owner == Some(self.id)
    }

    fn take_ownership(&self) -> bool {
        let mut inner = self.hub.lock().unwrap();
        inner.owner = Some(self.id);
        true
    }

    fn replicate(&self, page: PagePosition) {
        let mut inner = self.hub.lock().unwrap();
        inner.last_published = Some(page);
        // Delivery includes the sender: every queue sees publishes in hub
        // order, so concurrent publishers converge on the last one, and the
        // sender's own echo is a duplicate the machine ignores.
        for events in inner.participants.values() {
            // A closed queue means that participant already shut down.
            let _ = events.send(Event::StateReceived(page));
        }
    }

    fn send_to_owner(&self, message: SyncMessage) {
        let inner = self.hub.lock().unwrap();
        let Some(owner) = inner.owner else {
            return;
        };
        let Some(events) = inner.participants.get(&owner) else {
            return;
        };
        let event = match message {
            SyncMessage::State { page } => Event::StateReceived(page),
            SyncMessage::ResyncRequest => Event::ResyncRequested,
        };
        let _ = events.send(event);
    }
}

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;
