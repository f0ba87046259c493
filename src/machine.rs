//! Page state machine — authoritative position, transition sequencing,
//! and reconciliation.
//!
//! DESIGN
//! ======
//! One code path handles every authoritative change: a local command
//! validates, takes ownership, mutates and publishes, then falls into the
//! same reconciliation used when a replicated value arrives. Reconciliation
//! compares the displayed position against the authoritative one and starts
//! at most one transition step toward it; completion re-runs the check, so
//! targets that changed mid-flight drain one step at a time.
//!
//! CONCURRENCY POLICY
//! ==================
//! Coalesce-to-latest: commands issued while a transition is in flight
//! still mutate and publish authoritative state — only the visual step is
//! deferred until the current transition completes. A storm of commands
//! during one animation converges on the last accepted target, never on an
//! intermediate one.
//!
//! ERROR HANDLING
//! ==============
//! Out-of-range targets and denied ownership reject with no side effects.
//! Neither is exceptional; the runtime logs rejections at debug and moves
//! on to the next event.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::book::{Book, ImageHandle};
use crate::ownership::OwnershipCoordinator;
use crate::player::AnimationPlayer;
use crate::runtime::Event;
use crate::state::{DisplayState, PagePosition, Transition};

// =============================================================================
// TYPES
// =============================================================================

/// A participant-issued mutation of the shared page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Forward,
    Backward,
    SetPage(i32),
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("page {requested} outside legal domain (-2, -1, or 0..={max_page})")]
    OutOfRange { requested: i32, max_page: u32 },
    #[error("ownership not granted")]
    NotOwner,
}

/// The four visible display slots. Slots 1 and 4 hold the resting spread;
/// slots 2 and 3 carry the turning leaf and are only populated while a
/// page-turn is in flight. The renderer maps handles to textures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Surfaces {
    pub slot1: Option<ImageHandle>,
    pub slot2: Option<ImageHandle>,
    pub slot3: Option<ImageHandle>,
    pub slot4: Option<ImageHandle>,
}

// =============================================================================
// STATE MACHINE
// =============================================================================

/// Client-local state machine for one shared flip-book instance.
pub struct PageStateMachine {
    book: Arc<Book>,
    coordinator: OwnershipCoordinator,
    player: Box<dyn AnimationPlayer>,
    /// Authoritative position — the replicated single source of truth.
    page: PagePosition,
    display: DisplayState,
    synced_once: bool,
    surfaces: Surfaces,
    page_label: String,
}

impl PageStateMachine {
    /// Build a machine for a closed book and publish the initial state if
    /// this participant already owns the object.
    #[must_use]
    pub fn new(book: Arc<Book>, coordinator: OwnershipCoordinator, player: Box<dyn AnimationPlayer>) -> Self {
        let mut machine = Self {
            book,
            coordinator,
            player,
            page: PagePosition::Closed,
            display: DisplayState::new(),
            synced_once: false,
            surfaces: Surfaces::default(),
            page_label: "-".to_owned(),
        };
        machine.refresh_steady_surfaces();
        machine.coordinator.publish(machine.page);
        machine
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Authoritative position.
    #[must_use]
    pub fn page(&self) -> PagePosition {
        self.page
    }

    /// Position currently reflected on screen; lags [`Self::page`] while a
    /// transition is in flight.
    #[must_use]
    pub fn displayed(&self) -> PagePosition {
        self.display.displayed
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.display.animating
    }

    #[must_use]
    pub fn surfaces(&self) -> Surfaces {
        self.surfaces
    }

    /// Human-facing page label for the step currently on screen.
    #[must_use]
    pub fn page_label(&self) -> &str {
        &self.page_label
    }

    #[must_use]
    pub fn book(&self) -> &Arc<Book> {
        &self.book
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Advance one step around the circular topology:
    /// closed → 0 → … → `max_page` → closed-flipped.
    ///
    /// # Errors
    ///
    /// Returns `NotOwner` when the session layer denies the transfer.
    pub fn forward(&mut self) -> Result<(), CommandError> {
        let max = self.book.max_page();
        let target = match self.page {
            PagePosition::Closed | PagePosition::ClosedFlipped => PagePosition::Open(0),
            PagePosition::Open(page) if page < max => PagePosition::Open(page + 1),
            PagePosition::Open(_) => PagePosition::ClosedFlipped,
        };
        self.request_target(target)
    }

    /// Regress one step: closed opens at the last spread (from the back),
    /// page 0 closes onto the front cover.
    ///
    /// # Errors
    ///
    /// Returns `NotOwner` when the session layer denies the transfer.
    pub fn backward(&mut self) -> Result<(), CommandError> {
        let target = match self.page {
            PagePosition::Closed | PagePosition::ClosedFlipped => PagePosition::Open(self.book.max_page()),
            PagePosition::Open(0) => PagePosition::Closed,
            PagePosition::Open(page) => PagePosition::Open(page - 1),
        };
        self.request_target(target)
    }

    /// Jump to a raw wire position.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for values outside `{-2, -1} ∪ [0, max_page]`
    /// and `NotOwner` when the session layer denies the transfer. Neither
    /// leaves any side effect.
    pub fn set_page(&mut self, raw: i32) -> Result<(), CommandError> {
        let target = self.validate(raw)?;
        self.request_target(target)
    }

    /// Dispatch one queue event. Non-command events are infallible.
    ///
    /// # Errors
    ///
    /// Propagates command rejections; see [`Self::set_page`].
    pub fn apply(&mut self, event: Event) -> Result<(), CommandError> {
        match event {
            Event::Command(Command::Forward) => self.forward(),
            Event::Command(Command::Backward) => self.backward(),
            Event::Command(Command::SetPage(raw)) => self.set_page(raw),
            Event::StateReceived(page) => {
                self.on_state_received(page);
                Ok(())
            }
            Event::JoinSync(page) => {
                self.on_join_sync(page);
                Ok(())
            }
            Event::ResyncRequested => {
                self.on_resync_requested();
                Ok(())
            }
            Event::TransitionFinished => {
                self.on_transition_finished();
                Ok(())
            }
            Event::Shutdown => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Replication callbacks
    // -------------------------------------------------------------------------

    /// A replicated authoritative value arrived from another participant.
    pub fn on_state_received(&mut self, page: PagePosition) {
        if let PagePosition::Open(p) = page {
            if p > self.book.max_page() {
                warn!(page = p, max_page = self.book.max_page(), "replicated page out of range, ignored");
                return;
            }
        }
        self.synced_once = true;
        if page == self.page {
            // Duplicate publish. Reconcile is a no-op once converged.
            self.reconcile();
            return;
        }
        debug!(page = i32::from(page), "replicated state received");
        self.page = page;
        self.reconcile();
    }

    /// First replicated snapshot after joining. Snaps directly to the
    /// current state — a late joiner sees where the book is now, it does
    /// not replay historical transitions — then asks the owner to echo
    /// state once more in case the snapshot caught a mid-flight value.
    pub fn on_join_sync(&mut self, page: PagePosition) {
        if self.synced_once {
            return;
        }
        self.synced_once = true;
        if let PagePosition::Open(p) = page {
            if p > self.book.max_page() {
                warn!(page = p, max_page = self.book.max_page(), "join snapshot out of range, ignored");
                return;
            }
        }
        debug!(page = i32::from(page), "join sync");
        self.page = page;
        self.display.snap(page);
        self.refresh_steady_surfaces();
        self.coordinator.request_remote_resync();
    }

    /// The owner was asked to re-publish (a participant joined mid-flight).
    pub fn on_resync_requested(&mut self) {
        self.coordinator.publish(self.page);
    }

    /// Completion callback from the animation player. The only place the
    /// animating latch clears.
    pub fn on_transition_finished(&mut self) {
        if !self.display.animating {
            warn!("transition completion with none in flight, ignored");
            return;
        }
        self.display.displayed = self.display.landing;
        self.display.animating = false;
        self.refresh_steady_surfaces();
        self.reconcile();
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn validate(&self, raw: i32) -> Result<PagePosition, CommandError> {
        let max_page = self.book.max_page();
        let position = PagePosition::try_from(raw)
            .map_err(|_| CommandError::OutOfRange { requested: raw, max_page })?;
        if let PagePosition::Open(page) = position {
            if page > max_page {
                return Err(CommandError::OutOfRange { requested: raw, max_page });
            }
        }
        Ok(position)
    }

    fn request_target(&mut self, target: PagePosition) -> Result<(), CommandError> {
        if !self.coordinator.take_ownership() {
            debug!(target = i32::from(target), "command rejected, ownership denied");
            return Err(CommandError::NotOwner);
        }
        self.synced_once = true;
        self.page = target;
        self.coordinator.publish(target);
        self.reconcile();
        Ok(())
    }

    /// Start at most one transition step toward the authoritative position.
    /// No-op while a step is in flight or once converged; re-invoked from
    /// every completion, which is what drains deferred targets.
    fn reconcile(&mut self) {
        if self.display.animating {
            return;
        }
        let target = self.page;
        let displayed = self.display.displayed;
        if displayed == target {
            return;
        }

        let (transition, landing) = match (displayed, target) {
            // Both covers look the same from outside. Swap silently.
            (
                PagePosition::Closed | PagePosition::ClosedFlipped,
                PagePosition::ClosedFlipped | PagePosition::Closed,
            ) => {
                self.display.snap(target);
                return;
            }
            (PagePosition::Closed | PagePosition::ClosedFlipped, PagePosition::Open(page)) => {
                let from_back = displayed == PagePosition::ClosedFlipped
                    || (self.book.max_page() > 0 && page == self.book.max_page());
                (Transition::Open { page, from_back }, PagePosition::Open(page))
            }
            (PagePosition::Open(_), closed @ (PagePosition::Closed | PagePosition::ClosedFlipped)) => {
                // Closing toward the front cover plays mirrored.
                let from_back = closed == PagePosition::Closed;
                (Transition::Close { from_back }, closed)
            }
            (PagePosition::Open(from), PagePosition::Open(to_target)) => {
                let to = if to_target > from { from + 1 } else { from - 1 };
                (Transition::Turn { from, to }, PagePosition::Open(to))
            }
        };

        self.display.animating = true;
        self.display.landing = landing;
        self.apply_step_surfaces(transition, landing);
        debug!(?transition, target = i32::from(target), "reconcile step");
        self.player.start(transition);
    }

    /// Surfaces and label for the step about to play. The target page is
    /// shown from transition start, matching what a reader watching the
    /// turn expects.
    fn apply_step_surfaces(&mut self, transition: Transition, landing: PagePosition) {
        match transition {
            Transition::Open { page, .. } => {
                let (left, right) = self.book.leaf(page);
                self.surfaces = Surfaces { slot1: Some(left), slot2: None, slot3: None, slot4: Some(right) };
            }
            Transition::Close { .. } => {
                // Keep the closing spread visible; label flips to closed.
            }
            Transition::Turn { from, to } => {
                let from_leaf = self.book.leaf(from);
                let to_leaf = self.book.leaf(to);
                self.surfaces = if to > from {
                    Surfaces {
                        slot1: Some(from_leaf.0),
                        slot2: Some(from_leaf.1),
                        slot3: Some(to_leaf.0),
                        slot4: Some(to_leaf.1),
                    }
                } else {
                    Surfaces {
                        slot1: Some(to_leaf.0),
                        slot2: Some(to_leaf.1),
                        slot3: Some(from_leaf.0),
                        slot4: Some(from_leaf.1),
                    }
                };
            }
        }
        self.page_label = self.book.page_label(landing);
    }

    /// Resting surfaces for the displayed position: spread on slots 1/4,
    /// turning-leaf slots cleared.
    fn refresh_steady_surfaces(&mut self) {
        match self.display.displayed {
            PagePosition::Open(page) => {
                let (left, right) = self.book.leaf(page);
                self.surfaces = Surfaces { slot1: Some(left), slot2: None, slot3: None, slot4: Some(right) };
            }
            PagePosition::Closed | PagePosition::ClosedFlipped => {
                self.surfaces = Surfaces::default();
            }
        }
        self.page_label = self.book.page_label(self.display.displayed);
    }
}

#[cfg(test)]
#[path = "machine_test.rs"]
mod tests;
