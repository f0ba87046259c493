//! Per-object event queue.
//!
//! DESIGN
//! ======
//! Each participant's copy of a shared object is single-threaded and
//! cooperative: one task drains one queue, so commands, replicated-state
//! arrivals, and animation completions are processed strictly in arrival
//! order with no parallelism inside an instance. Anything that wants to
//! poke the object — input bindings, the session hub, the animation
//! player — holds a cloneable [`ObjectHandle`] and enqueues typed events.
//!
//! ERROR HANDLING
//! ==============
//! Command rejections (out of range, ownership denied) are expected; the
//! loop logs them at debug and keeps draining. Nothing here escalates.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::machine::{Command, PageStateMachine};
use crate::state::PagePosition;

/// Sender half of an object's event queue.
pub type EventSender = mpsc::UnboundedSender<Event>;

/// One unit of work on an object's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Locally issued mutation.
    Command(Command),
    /// Replicated authoritative value from another participant.
    StateReceived(PagePosition),
    /// One-time snapshot delivered on join.
    JoinSync(PagePosition),
    /// A late joiner asked this (owning) participant to re-publish.
    ResyncRequested,
    /// The animation player finished the in-flight transition.
    TransitionFinished,
    /// Stop the event loop.
    Shutdown,
}

/// Read a value from the environment, falling back to a default.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cloneable front door to one object instance.
#[derive(Clone)]
pub struct ObjectHandle {
    events: EventSender,
}

impl ObjectHandle {
    #[must_use]
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }

    pub fn forward(&self) {
        self.send(Event::Command(Command::Forward));
    }

    pub fn backward(&self) {
        self.send(Event::Command(Command::Backward));
    }

    pub fn set_page(&self, raw: i32) {
        self.send(Event::Command(Command::SetPage(raw)));
    }

    pub fn transition_finished(&self) {
        self.send(Event::TransitionFinished);
    }

    pub fn shutdown(&self) {
        self.send(Event::Shutdown);
    }

    /// Enqueue an arbitrary event. Dropped silently after shutdown.
    pub fn send(&self, event: Event) {
        let _ = self.events.send(event);
    }
}

// =============================================================================
// EVENT LOOP
// =============================================================================

/// Channel for one object instance.
#[must_use]
pub fn event_queue() -> (EventSender, mpsc::UnboundedReceiver<Event>) {
    mpsc::unbounded_channel()
}

/// Drive a machine from its queue until shutdown or until every sender is
/// dropped. Returns the machine so tests can inspect final state.
pub fn spawn_object(
    mut machine: PageStateMachine,
    mut events: mpsc::UnboundedReceiver<Event>,
) -> JoinHandle<PageStateMachine> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if event == Event::Shutdown {
                break;
            }
            if let Err(rejection) = machine.apply(event) {
                debug!(%rejection, "command rejected");
            }
        }
        machine
    })
}

#[cfg(test)]
#[path = "runtime_test.rs"]
mod tests;
