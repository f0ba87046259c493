//! Replicated message payloads.
//!
//! DESIGN
//! ======
//! Exactly two messages cross participants: the owner's authoritative state
//! broadcast and a request asking the current owner to re-broadcast. The
//! payload is opaque outside the session layer — transports move it as an
//! encoded blob and never inspect the fields.

use serde::{Deserialize, Serialize};

use crate::state::PagePosition;

/// A message delivered through the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncMessage {
    /// Authoritative position, broadcast by the owner to all participants.
    State { page: PagePosition },
    /// Ask the current owner to re-publish its state. Sent by late joiners
    /// so mid-transition snapshots settle on a consistent final value.
    ResyncRequest,
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
