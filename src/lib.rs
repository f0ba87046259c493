//! Replicated flip-book core for shared virtual spaces.
//!
//! ARCHITECTURE
//! ============
//! Every participant renders the same book locally; one participant at a
//! time owns the right to mutate the shared page, and the owner's value
//! replicates to everyone else. Two components carry the core:
//!
//! - [`ownership::OwnershipCoordinator`] gates mutation behind the
//!   session's notion of ownership and replicates the authoritative page.
//! - [`machine::PageStateMachine`] owns the page and the display state,
//!   and reconciles whatever it shows against whatever is authoritative,
//!   one animated transition at a time.
//!
//! Rendering, the clip player, and the real networked session sit behind
//! traits ([`player::AnimationPlayer`], [`session::SessionLayer`]); the
//! crate ships an in-memory session ([`hub::LocalHub`]) and a per-object
//! event queue ([`runtime`]) that keep everything runnable and testable
//! without an engine.

pub mod book;
pub mod hub;
pub mod machine;
pub mod message;
pub mod ownership;
pub mod player;
pub mod runtime;
pub mod session;
pub mod state;

pub use book::{Book, BookError, ImageHandle};
pub use hub::LocalHub;
pub use machine::{Command, CommandError, PageStateMachine, Surfaces};
pub use message::SyncMessage;
pub use ownership::OwnershipCoordinator;
pub use player::{AnimationPlayer, TimedPlayer};
pub use runtime::{Event, ObjectHandle, spawn_object};
pub use session::SessionLayer;
pub use state::{DisplayState, PagePosition, Transition};
