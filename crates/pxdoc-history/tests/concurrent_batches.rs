#![forbid(unsafe_code)]

//! Background batches and the running guard.
//!
//! Run:
//!   cargo test -p pxdoc-history --test concurrent_batches

mod common;

use std::any::Any;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{Counters, Entry, Ledger, push};
use pxdoc_history::{
    Action, AppliedChange, ApplyPhase, Change, ChangeInfos, DocumentChangeTracker, TrackerError,
};

type Tracker = DocumentChangeTracker<Ledger, Entry>;

/// Signals when it starts applying, then blocks until released.
struct Gate {
    entered: mpsc::Sender<()>,
    release: mpsc::Receiver<()>,
}

impl Change<Ledger, Entry> for Gate {
    fn initialize_and_validate(&mut self, _document: &Ledger) -> bool {
        true
    }

    fn apply(&mut self, document: &mut Ledger, _phase: ApplyPhase) -> AppliedChange<Entry> {
        let _ = self.entered.send(());
        let _ = self.release.recv();
        document.push(99);
        AppliedChange::recorded(ChangeInfos::single(Entry::Appended(99)))
    }

    fn revert(&mut self, document: &mut Ledger) -> ChangeInfos<Entry> {
        document.pop();
        ChangeInfos::single(Entry::Removed(99))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct Panics;

impl Change<Ledger, Entry> for Panics {
    fn initialize_and_validate(&mut self, _document: &Ledger) -> bool {
        true
    }

    fn apply(&mut self, _document: &mut Ledger, _phase: ApplyPhase) -> AppliedChange<Entry> {
        panic!("apply failed");
    }

    fn revert(&mut self, _document: &mut Ledger) -> ChangeInfos<Entry> {
        ChangeInfos::none()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Start a gated batch and wait until it is inside `apply`.
fn start_gated(tracker: &Arc<Tracker>) -> (pxdoc_history::BatchHandle<Entry>, mpsc::Sender<()>) {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let gate = Gate {
        entered: entered_tx,
        release: release_rx,
    };
    let handle = tracker
        .process_actions(vec![Action::make_change(gate), Action::ChangeBoundary])
        .unwrap();
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("batch entered apply");
    (handle, release_tx)
}

#[test]
fn background_batch_returns_descriptors() {
    let counters = Counters::shared();
    let tracker = Arc::new(Tracker::new(Vec::new()));
    let handle = tracker
        .process_actions(vec![
            push(1, &counters),
            push(2, &counters),
            Action::ChangeBoundary,
        ])
        .unwrap();
    let out = handle.join().unwrap();
    assert_eq!(out, vec![Entry::Appended(1), Entry::Appended(2)]);
    assert!(!tracker.is_running());
    assert_eq!(tracker.history().undo, vec![2]);
}

#[test]
fn second_batch_while_running_fails_immediately() {
    let counters = Counters::shared();
    let tracker = Arc::new(Tracker::new(Vec::new()));
    let (handle, release) = start_gated(&tracker);

    assert!(tracker.is_running());
    assert_eq!(
        tracker.process_actions_sync(vec![push(1, &counters)]),
        Err(TrackerError::Running)
    );
    assert!(matches!(
        tracker.process_actions(vec![Action::Undo]),
        Err(TrackerError::Running)
    ));

    release.send(()).unwrap();
    assert_eq!(handle.join().unwrap(), vec![Entry::Appended(99)]);
    assert!(!tracker.is_running());
    // The rejected actions were never applied.
    assert_eq!(tracker.with_document(Clone::clone).unwrap(), vec![99]);
    assert_eq!(counters.validated(), 0);
}

#[test]
fn dispose_while_running_fails() {
    let tracker = Arc::new(Tracker::new(Vec::new()));
    let (handle, release) = start_gated(&tracker);

    assert_eq!(tracker.dispose(), Err(TrackerError::Running));
    assert!(!tracker.is_disposed());

    release.send(()).unwrap();
    handle.join().unwrap();
    assert_eq!(tracker.dispose(), Ok(()));
    assert!(tracker.is_disposed());
}

#[test]
fn document_reads_wait_for_batch() {
    let tracker = Arc::new(Tracker::new(Vec::new()));
    let (handle, release) = start_gated(&tracker);

    let reader = {
        let tracker = Arc::clone(&tracker);
        thread::spawn(move || tracker.with_document(Clone::clone))
    };
    thread::sleep(Duration::from_millis(20));
    release.send(()).unwrap();

    // The reader never observes the document mid-batch.
    assert_eq!(reader.join().unwrap().unwrap(), vec![99]);
    handle.join().unwrap();
}

#[test]
fn disposed_tracker_rejects_background_batches() {
    let tracker = Arc::new(Tracker::new(Vec::new()));
    tracker.dispose().unwrap();
    assert!(matches!(
        tracker.process_actions(vec![Action::Undo]),
        Err(TrackerError::Disposed)
    ));
}

#[test]
fn panicking_change_releases_the_tracker() {
    let counters = Counters::shared();
    let tracker = Arc::new(Tracker::new(Vec::new()));
    let handle = tracker
        .process_actions(vec![Action::make_change(Panics)])
        .unwrap();
    let joined = thread::spawn(move || handle.join()).join();
    assert!(joined.is_err());

    assert!(!tracker.is_running());
    let out = tracker
        .process_actions_sync(vec![push(4, &counters)])
        .unwrap();
    assert_eq!(out, vec![Entry::Appended(4)]);
}

#[test]
fn is_finished_polls_without_blocking() {
    let tracker = Arc::new(Tracker::new(Vec::new()));
    let (handle, release) = start_gated(&tracker);
    assert!(!handle.is_finished());
    release.send(()).unwrap();
    while !handle.is_finished() {
        thread::yield_now();
    }
    assert!(!tracker.is_running());
    handle.join().unwrap();
}
