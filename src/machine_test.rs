use std::sync::{Arc, Mutex};

use super::*;
use crate::book::test_helpers::test_book;
use crate::message::SyncMessage;
use crate::player::test_helpers::RecordingPlayer;
use crate::session::SessionLayer;
use crate::session::test_helpers::FixedSession;

type Started = Arc<Mutex<Vec<Transition>>>;

/// Machine over a 4-spread book whose participant owns the object.
fn owning_machine() -> (PageStateMachine, Started, Arc<FixedSession>) {
    machine_with(Arc::new(FixedSession::owning()))
}

fn denied_machine() -> (PageStateMachine, Started, Arc<FixedSession>) {
    machine_with(Arc::new(FixedSession::denied()))
}

fn machine_with(session: Arc<FixedSession>) -> (PageStateMachine, Started, Arc<FixedSession>) {
    let (player, started) = RecordingPlayer::new();
    let machine = PageStateMachine::new(
        test_book(4),
        OwnershipCoordinator::new(session.clone()),
        Box::new(player),
    );
    (machine, started, session)
}

/// Drain the queue the way the runtime would: complete transitions until
/// the machine stops starting new ones.
fn drain(machine: &mut PageStateMachine) {
    while machine.is_animating() {
        machine.on_transition_finished();
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

#[test]
fn forward_opens_closed_book() {
    let (mut machine, started, _) = owning_machine();

    machine.forward().unwrap();
    assert_eq!(machine.page(), PagePosition::Open(0));
    assert!(machine.is_animating());
    assert_eq!(*started.lock().unwrap(), vec![Transition::Open { page: 0, from_back: false }]);

    machine.on_transition_finished();
    assert_eq!(machine.displayed(), PagePosition::Open(0));
    assert!(!machine.is_animating());
    // Already converged: no second transition.
    assert_eq!(started.lock().unwrap().len(), 1);
}

#[test]
fn forward_past_last_page_closes_flipped() {
    let (mut machine, started, _) = owning_machine();
    machine.set_page(3).unwrap();
    drain(&mut machine);

    machine.forward().unwrap();
    assert_eq!(machine.page(), PagePosition::ClosedFlipped);
    assert_eq!(*started.lock().unwrap().last().unwrap(), Transition::Close { from_back: false });

    drain(&mut machine);
    assert_eq!(machine.displayed(), PagePosition::ClosedFlipped);
    assert_eq!(machine.page_label(), "-");
}

#[test]
fn backward_from_closed_opens_last_page_from_back() {
    let (mut machine, started, _) = owning_machine();

    machine.backward().unwrap();
    assert_eq!(machine.page(), PagePosition::Open(3));
    assert_eq!(*started.lock().unwrap(), vec![Transition::Open { page: 3, from_back: true }]);
}

#[test]
fn backward_from_page_zero_closes_front() {
    let (mut machine, started, _) = owning_machine();
    machine.forward().unwrap();
    drain(&mut machine);

    machine.backward().unwrap();
    assert_eq!(machine.page(), PagePosition::Closed);
    assert_eq!(*started.lock().unwrap().last().unwrap(), Transition::Close { from_back: true });

    drain(&mut machine);
    assert_eq!(machine.displayed(), PagePosition::Closed);
}

#[test]
fn forward_from_back_cover_reopens_at_front() {
    let (mut machine, _, _) = owning_machine();
    machine.set_page(-2).unwrap();
    drain(&mut machine);

    machine.forward().unwrap();
    assert_eq!(machine.page(), PagePosition::Open(0));
}

// =============================================================================
// RANGE CLAMPING
// =============================================================================

#[test]
fn out_of_range_targets_are_rejected_without_side_effects() {
    let (mut machine, started, session) = owning_machine();
    let published_before = session.published.lock().unwrap().len();

    for raw in [4, 17, -3, i32::MIN] {
        let err = machine.set_page(raw).unwrap_err();
        assert!(matches!(err, CommandError::OutOfRange { max_page: 3, .. }));
    }
    assert_eq!(machine.page(), PagePosition::Closed);
    assert!(started.lock().unwrap().is_empty());
    assert_eq!(session.published.lock().unwrap().len(), published_before);
}

#[test]
fn closed_sentinels_are_legal_targets() {
    let (mut machine, _, _) = owning_machine();
    machine.set_page(-2).unwrap();
    assert_eq!(machine.page(), PagePosition::ClosedFlipped);
    machine.set_page(-1).unwrap();
    assert_eq!(machine.page(), PagePosition::Closed);
}

// =============================================================================
// SINGLE FLIGHT AND CONVERGENCE
// =============================================================================

#[test]
fn rapid_commands_coalesce_to_latest_target() {
    let (mut machine, started, _) = owning_machine();
    machine.forward().unwrap();
    drain(&mut machine);
    started.lock().unwrap().clear();

    // Three forwards while the first turn is still in flight.
    machine.forward().unwrap();
    machine.forward().unwrap();
    machine.forward().unwrap();

    // Authoritative state took every command; only one step is in flight.
    assert_eq!(machine.page(), PagePosition::Open(3));
    assert_eq!(*started.lock().unwrap(), vec![Transition::Turn { from: 0, to: 1 }]);

    // Completions drain the remaining distance one spread at a time.
    drain(&mut machine);
    assert_eq!(
        *started.lock().unwrap(),
        vec![
            Transition::Turn { from: 0, to: 1 },
            Transition::Turn { from: 1, to: 2 },
            Transition::Turn { from: 2, to: 3 },
        ]
    );
    assert_eq!(machine.displayed(), PagePosition::Open(3));
}

#[test]
fn target_changes_mid_flight_are_not_lost() {
    let (mut machine, started, _) = owning_machine();
    machine.forward().unwrap();

    // Remote update lands while the open animation plays.
    machine.on_state_received(PagePosition::Open(2));
    assert_eq!(started.lock().unwrap().len(), 1);

    drain(&mut machine);
    assert_eq!(machine.displayed(), PagePosition::Open(2));
    assert_eq!(machine.page(), PagePosition::Open(2));
}

#[test]
fn covers_swap_without_animation() {
    let (mut machine, started, _) = owning_machine();
    machine.set_page(-2).unwrap();

    // Closed and closed-flipped look identical; no transition plays.
    assert!(started.lock().unwrap().is_empty());
    assert!(!machine.is_animating());
    assert_eq!(machine.displayed(), PagePosition::ClosedFlipped);
}

// =============================================================================
// OWNERSHIP GATE
// =============================================================================

#[test]
fn denied_ownership_rejects_without_mutation() {
    let (mut machine, started, session) = denied_machine();

    assert!(matches!(machine.forward(), Err(CommandError::NotOwner)));
    assert!(matches!(machine.set_page(2), Err(CommandError::NotOwner)));
    assert_eq!(machine.page(), PagePosition::Closed);
    assert!(started.lock().unwrap().is_empty());
    assert!(session.published.lock().unwrap().is_empty());
}

#[test]
fn non_owner_still_follows_replicated_state() {
    let (mut machine, started, _) = denied_machine();

    machine.on_state_received(PagePosition::Open(1));
    assert_eq!(machine.page(), PagePosition::Open(1));
    assert_eq!(started.lock().unwrap().len(), 1);
    drain(&mut machine);
    assert_eq!(machine.displayed(), PagePosition::Open(1));
}

#[test]
fn ownership_transfer_precedes_mutation() {
    let (mut machine, _, session) = machine_with(Arc::new(FixedSession::granting()));

    machine.forward().unwrap();
    assert!(session.is_owner());
    assert_eq!(*session.published.lock().unwrap(), vec![PagePosition::Open(0)]);
}

// =============================================================================
// IDEMPOTENT PUBLISH
// =============================================================================

#[test]
fn duplicate_replicated_value_triggers_nothing() {
    let (mut machine, started, _) = owning_machine();
    machine.on_state_received(PagePosition::Open(1));
    drain(&mut machine);
    let count = started.lock().unwrap().len();

    machine.on_state_received(PagePosition::Open(1));
    machine.on_state_received(PagePosition::Open(1));
    assert!(!machine.is_animating());
    assert_eq!(started.lock().unwrap().len(), count);
}

#[test]
fn replicated_value_out_of_range_is_ignored() {
    let (mut machine, started, _) = owning_machine();

    machine.on_state_received(PagePosition::Open(40));
    assert_eq!(machine.page(), PagePosition::Closed);
    assert!(started.lock().unwrap().is_empty());
}

// =============================================================================
// LATE JOIN
// =============================================================================

#[test]
fn join_sync_snaps_without_replaying_history() {
    let (mut machine, started, session) = denied_machine();

    machine.on_join_sync(PagePosition::Open(2));
    assert_eq!(machine.page(), PagePosition::Open(2));
    assert_eq!(machine.displayed(), PagePosition::Open(2));
    assert!(!machine.is_animating());
    assert!(started.lock().unwrap().is_empty());

    // Defensive re-publish request went to the owner.
    assert_eq!(*session.to_owner.lock().unwrap(), vec![SyncMessage::ResyncRequest]);
}

#[test]
fn join_sync_applies_only_once() {
    let (mut machine, _, _) = denied_machine();
    machine.on_join_sync(PagePosition::Open(2));
    machine.on_join_sync(PagePosition::Open(0));
    assert_eq!(machine.displayed(), PagePosition::Open(2));
}

#[test]
fn resync_request_republishes_current_state() {
    let (mut machine, _, session) = owning_machine();
    machine.set_page(2).unwrap();
    session.published.lock().unwrap().clear();

    machine.on_resync_requested();
    assert_eq!(*session.published.lock().unwrap(), vec![PagePosition::Open(2)]);
}

// =============================================================================
// CALLBACK EDGE CASES
// =============================================================================

#[test]
fn spurious_completion_is_ignored() {
    let (mut machine, started, _) = owning_machine();

    machine.on_transition_finished();
    assert_eq!(machine.displayed(), PagePosition::Closed);
    assert!(!machine.is_animating());
    assert!(started.lock().unwrap().is_empty());
}

// =============================================================================
// SURFACES AND LABELS
// =============================================================================

#[test]
fn turn_populates_all_four_slots_in_direction_order() {
    let (mut machine, _, _) = owning_machine();
    machine.forward().unwrap();
    drain(&mut machine);

    machine.forward().unwrap();
    let book = machine.book().clone();
    let from = book.leaf(0);
    let to = book.leaf(1);
    assert_eq!(
        machine.surfaces(),
        Surfaces { slot1: Some(from.0), slot2: Some(from.1), slot3: Some(to.0), slot4: Some(to.1) }
    );

    // Resting spread after completion: outer slots only.
    drain(&mut machine);
    assert_eq!(
        machine.surfaces(),
        Surfaces { slot1: Some(to.0), slot2: None, slot3: None, slot4: Some(to.1) }
    );
}

#[test]
fn backward_turn_reverses_slot_order() {
    let (mut machine, _, _) = owning_machine();
    machine.set_page(2).unwrap();
    drain(&mut machine);

    machine.backward().unwrap();
    let book = machine.book().clone();
    let from = book.leaf(2);
    let to = book.leaf(1);
    assert_eq!(
        machine.surfaces(),
        Surfaces { slot1: Some(to.0), slot2: Some(to.1), slot3: Some(from.0), slot4: Some(from.1) }
    );
}

#[test]
fn label_shows_landing_page_from_transition_start() {
    let (mut machine, _, _) = owning_machine();
    assert_eq!(machine.page_label(), "-");

    machine.forward().unwrap();
    assert_eq!(machine.page_label(), "1");

    drain(&mut machine);
    machine.backward().unwrap();
    // Closing: label flips to closed while the spread is still visible.
    assert_eq!(machine.page_label(), "-");
    assert_ne!(machine.surfaces(), Surfaces::default());

    drain(&mut machine);
    assert_eq!(machine.surfaces(), Surfaces::default());
}
