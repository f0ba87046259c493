//! Page positions, transitions, and local display state.
//!
//! DESIGN
//! ======
//! The authoritative value replicated between participants is a single
//! signed integer: `-1` is closed at the front cover, `-2` is closed at the
//! back cover, and `0..=max_page` is open at that spread. `PagePosition`
//! gives that integer a type; the raw form only appears at the wire
//! boundary.
//!
//! Range checking happens in two layers: `TryFrom<i32>` rejects integers
//! that can never be a position (below -2), while the upper bound depends
//! on the book and is enforced by the state machine.

use serde::{Deserialize, Serialize};

// =============================================================================
// PAGE POSITION
// =============================================================================

/// Wire value for the front-cover closed state.
pub const CLOSED_FRONT: i32 = -1;

/// Wire value for the back-cover closed state.
pub const CLOSED_BACK: i32 = -2;

/// Logical position of the book. Serialized as the signed wire integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum PagePosition {
    /// Closed at the front cover (wire `-1`).
    Closed,
    /// Closed at the back cover, reached by paging past the end (wire `-2`).
    ClosedFlipped,
    /// Open at the given spread (wire `0..=max_page`).
    Open(u32),
}

impl PagePosition {
    /// Whether the book is closed, at either cover.
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed | Self::ClosedFlipped)
    }

    /// The open spread index, if any.
    #[must_use]
    pub fn open_page(self) -> Option<u32> {
        match self {
            Self::Open(page) => Some(page),
            Self::Closed | Self::ClosedFlipped => None,
        }
    }
}

/// A raw wire integer that does not denote any position.
#[derive(Debug, Clone, thiserror::Error)]
#[error("page index {0} is not a valid position (expected -2, -1, or >= 0)")]
pub struct PageRangeError(pub i32);

impl From<PagePosition> for i32 {
    fn from(position: PagePosition) -> Self {
        match position {
            PagePosition::Closed => CLOSED_FRONT,
            PagePosition::ClosedFlipped => CLOSED_BACK,
            #[allow(clippy::cast_possible_wrap)]
            PagePosition::Open(page) => page as i32,
        }
    }
}

impl TryFrom<i32> for PagePosition {
    type Error = PageRangeError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            CLOSED_FRONT => Ok(Self::Closed),
            CLOSED_BACK => Ok(Self::ClosedFlipped),
            #[allow(clippy::cast_sign_loss)]
            page if page >= 0 => Ok(Self::Open(page as u32)),
            other => Err(PageRangeError(other)),
        }
    }
}

// =============================================================================
// TRANSITION
// =============================================================================

/// One visual step handed to the animation player. A transition moves the
/// displayed position one reconciliation step closer to the authoritative
/// one; the machine never has two in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Cover opens onto `page`. `from_back` mirrors the animation for a
    /// book opened from the back cover.
    Open { page: u32, from_back: bool },
    /// Book closes. `from_back` mirrors the animation when closing toward
    /// the front cover.
    Close { from_back: bool },
    /// One spread turns. Direction is forward when `to > from`.
    Turn { from: u32, to: u32 },
}

// =============================================================================
// DISPLAY STATE
// =============================================================================

/// Local-only view state. Lags the authoritative position while a
/// transition is in flight; never replicated.
#[derive(Debug, Clone, Copy)]
pub struct DisplayState {
    /// Position currently reflected by the on-screen surfaces.
    pub displayed: PagePosition,
    /// Latch: true while a transition is visually in progress.
    pub animating: bool,
    /// Where the in-flight transition will land. Equal to `displayed`
    /// whenever `animating` is false.
    pub landing: PagePosition,
}

impl DisplayState {
    /// Fresh display state for a closed book.
    #[must_use]
    pub fn new() -> Self {
        Self { displayed: PagePosition::Closed, animating: false, landing: PagePosition::Closed }
    }

    /// Snap directly to a position, discarding any in-flight transition.
    /// Used on join sync, where the current state must appear immediately.
    pub fn snap(&mut self, position: PagePosition) {
        self.displayed = position;
        self.landing = position;
        self.animating = false;
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
