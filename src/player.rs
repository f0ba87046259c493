//! Animation player capability.
//!
//! DESIGN
//! ======
//! The visual clip player is a black box: the machine hands it one
//! transition, and exactly one completion comes back later as a
//! [`crate::runtime::Event::TransitionFinished`] on the object's queue.
//! The machine's animating latch guarantees at most one outstanding start,
//! so implementations never have to queue.
//!
//! There is no timeout: a player that never reports completion stalls that
//! object instance. Accepted gap — spurious completions are at least logged
//! by the machine.

use std::time::Duration;

use tracing::debug;

use crate::runtime::{Event, EventSender, env_parse};
use crate::state::Transition;

const DEFAULT_TRANSITION_MS: u64 = 600;

/// Capability that plays one visual transition at a time.
pub trait AnimationPlayer: Send {
    /// Begin playing a transition. One completion event is expected per
    /// call; the machine never issues a second start before it arrives.
    fn start(&mut self, transition: Transition);
}

// =============================================================================
// TIMED PLAYER
// =============================================================================

/// Player that completes every transition after a fixed latency, posting
/// the completion onto the object's own event queue. Stands in for a real
/// clip player in the demo and in runtime tests.
pub struct TimedPlayer {
    events: EventSender,
    latency: Duration,
}

impl TimedPlayer {
    #[must_use]
    pub fn new(events: EventSender, latency: Duration) -> Self {
        Self { events, latency }
    }

    /// Latency from `FLIPBOOK_TRANSITION_MS`, defaulting to 600ms.
    #[must_use]
    pub fn from_env(events: EventSender) -> Self {
        let ms = env_parse("FLIPBOOK_TRANSITION_MS", DEFAULT_TRANSITION_MS);
        Self::new(events, Duration::from_millis(ms))
    }
}

impl AnimationPlayer for TimedPlayer {
    fn start(&mut self, transition: Transition) {
        debug!(?transition, latency = ?self.latency, "transition started");
        let events = self.events.clone();
        let latency = self.latency;
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            // Receiver gone means the object shut down mid-flight.
            let _ = events.send(Event::TransitionFinished);
        });
    }
}

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Player that records transitions and completes only when the test
    /// drives the completion event by hand.
    #[derive(Default)]
    pub struct RecordingPlayer {
        pub started: Arc<Mutex<Vec<Transition>>>,
    }

    impl RecordingPlayer {
        /// The player and a shared view of everything it was asked to play.
        #[must_use]
        pub fn new() -> (Self, Arc<Mutex<Vec<Transition>>>) {
            let started = Arc::new(Mutex::new(Vec::new()));
            (Self { started: started.clone() }, started)
        }
    }

    impl AnimationPlayer for RecordingPlayer {
        fn start(&mut self, transition: Transition) {
            self.started.lock().unwrap().push(transition);
        }
    }
}
