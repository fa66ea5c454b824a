#![forbid(unsafe_code)]

//! Handle to a batch running on a background thread.

use std::fmt;
use std::thread::JoinHandle;

use crate::error::TrackerError;

/// Pending result of [`DocumentChangeTracker::process_actions`](crate::DocumentChangeTracker::process_actions).
///
/// Dropping the handle detaches the batch; it still runs to completion and
/// releases the tracker.
pub struct BatchHandle<I> {
    handle: JoinHandle<Result<Vec<I>, TrackerError>>,
}

impl<I> BatchHandle<I> {
    pub(crate) fn new(handle: JoinHandle<Result<Vec<I>, TrackerError>>) -> Self {
        Self { handle }
    }

    /// Whether the batch has finished running.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the batch and return its descriptors.
    ///
    /// A panic raised by a change while the batch ran is resumed on the
    /// joining thread.
    pub fn join(self) -> Result<Vec<I>, TrackerError> {
        match self.handle.join() {
            Ok(result) => result,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
}

impl<I> fmt::Debug for BatchHandle<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}
