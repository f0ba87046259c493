//! Demo — two simulated participants share one flip-book.
//!
//! A "reader" pages forward through the whole book while an "observer"
//! follows along through replication, then takes ownership and pages back.
//! Transition latency and book size come from the environment:
//! `FLIPBOOK_SPREADS` (default 4) and `FLIPBOOK_TRANSITION_MS`.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use flipbook::book::{Book, ImageHandle};
use flipbook::hub::LocalHub;
use flipbook::machine::PageStateMachine;
use flipbook::ownership::OwnershipCoordinator;
use flipbook::player::TimedPlayer;
use flipbook::runtime::{ObjectHandle, event_queue, spawn_object};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let spreads: usize = std::env::var("FLIPBOOK_SPREADS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(4);

    let images = (0..spreads * 2).map(|_| ImageHandle::new()).collect();
    let book = Arc::new(
        Book::new("Field Notes", "Anonymous", "A demo flip-book", images, false)
            .expect("demo book is well-formed"),
    );
    info!(title = book.title(), spreads, last_page = book.max_page_label(), "book loaded");

    let hub = LocalHub::new();
    let (reader, reader_task) = spawn_participant(&hub, book.clone());
    let (observer, observer_task) = spawn_participant(&hub, book.clone());

    // Reader pages through the whole book: open, every spread, close.
    for _ in 0..=spreads {
        reader.forward();
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    info!(page = ?hub.last_published(), "reader reached the back cover");

    // Observer takes over and pages back a couple of spreads.
    observer.backward();
    tokio::time::sleep(Duration::from_millis(250)).await;
    observer.backward();
    tokio::time::sleep(Duration::from_millis(500)).await;

    reader.shutdown();
    observer.shutdown();
    let reader_machine = reader_task.await.expect("reader task");
    let observer_machine = observer_task.await.expect("observer task");

    info!(
        reader_label = reader_machine.page_label(),
        observer_label = observer_machine.page_label(),
        page = ?hub.last_published(),
        "session finished"
    );
}

fn spawn_participant(
    hub: &LocalHub,
    book: Arc<Book>,
) -> (ObjectHandle, tokio::task::JoinHandle<PageStateMachine>) {
    let (tx, rx) = event_queue();
    let session = Arc::new(hub.attach(tx.clone()));
    let player = TimedPlayer::from_env(tx.clone());
    let machine = PageStateMachine::new(book, OwnershipCoordinator::new(session), Box::new(player));
    (ObjectHandle::new(tx), spawn_object(machine, rx))
}
