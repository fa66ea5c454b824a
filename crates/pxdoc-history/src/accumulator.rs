#![forbid(unsafe_code)]

//! Action accumulator.
//!
//! Collects actions from input handlers and flushes them to a shared tracker
//! as batches. A change block suspends flushing so several handlers can
//! contribute to one batch that closes with a single commit boundary.
//!
//! ```text
//!  add_actions ──┐
//!  add_finished ─┼─► queue ──flush──► tracker ──► Flushed { infos, .. }
//!  end_block ────┘      ▲
//!                       └── held while a change block is active
//! ```

use std::fmt;
use std::sync::Arc;

use crate::LOG_TARGET;
use crate::action::Action;
use crate::error::AccumulatorError;
use crate::tracker::DocumentChangeTracker;

/// Result of flushing queued actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flushed<I> {
    /// Descriptors produced by the batch, in order.
    pub infos: Vec<I>,
    /// Whether the batch contained an undo, redo or commit boundary.
    pub history_boundary_passed: bool,
}

impl<I> Default for Flushed<I> {
    fn default() -> Self {
        Self {
            infos: Vec::new(),
            history_boundary_passed: false,
        }
    }
}

/// Queue of actions in front of a shared [`DocumentChangeTracker`].
pub struct ActionAccumulator<D: 'static, I: 'static> {
    tracker: Arc<DocumentChangeTracker<D, I>>,
    queue: Vec<Action<D, I>>,
    change_block: bool,
}

impl<D: 'static, I: 'static> fmt::Debug for ActionAccumulator<D, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionAccumulator")
            .field("queued", &self.queue.len())
            .field("change_block", &self.change_block)
            .finish()
    }
}

impl<D: 'static, I: 'static> ActionAccumulator<D, I> {
    /// Create an accumulator feeding `tracker`.
    #[must_use]
    pub fn new(tracker: Arc<DocumentChangeTracker<D, I>>) -> Self {
        Self {
            tracker,
            queue: Vec::new(),
            change_block: false,
        }
    }

    /// The tracker batches are flushed to.
    #[must_use]
    pub fn tracker(&self) -> &Arc<DocumentChangeTracker<D, I>> {
        &self.tracker
    }

    /// Number of queued actions.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether a change block is holding the queue.
    #[must_use]
    pub fn is_change_block_active(&self) -> bool {
        self.change_block
    }

    /// Queue actions and flush unless a change block is active.
    ///
    /// Returns `None` while the queue is held.
    pub fn add_actions(
        &mut self,
        actions: impl IntoIterator<Item = Action<D, I>>,
    ) -> Result<Option<Flushed<I>>, AccumulatorError> {
        self.queue.extend(actions);
        self.flush_unless_blocked()
    }

    /// Queue actions followed by a commit boundary, and flush unless a change
    /// block is active.
    pub fn add_finished_actions(
        &mut self,
        actions: impl IntoIterator<Item = Action<D, I>>,
    ) -> Result<Option<Flushed<I>>, AccumulatorError> {
        self.queue.extend(actions);
        self.queue.push(Action::ChangeBoundary);
        self.flush_unless_blocked()
    }

    /// Hold the queue until [`end_change_block`](Self::end_change_block).
    pub fn start_change_block(&mut self) -> Result<(), AccumulatorError> {
        if self.change_block {
            return Err(AccumulatorError::ChangeBlockActive);
        }
        self.change_block = true;
        Ok(())
    }

    /// Close the change block with a commit boundary and flush.
    pub fn end_change_block(&mut self) -> Result<Flushed<I>, AccumulatorError> {
        self.change_block = false;
        self.queue.push(Action::ChangeBoundary);
        self.flush()
    }

    fn flush_unless_blocked(&mut self) -> Result<Option<Flushed<I>>, AccumulatorError> {
        if self.change_block {
            return Ok(None);
        }
        self.flush().map(Some)
    }

    /// Send every queued action to the tracker as one batch.
    ///
    /// A batch made only of pass-through actions never reaches the tracker.
    pub fn flush(&mut self) -> Result<Flushed<I>, AccumulatorError> {
        let actions = std::mem::take(&mut self.queue);
        let history_boundary_passed = actions.iter().any(Action::is_history_boundary);

        if actions.iter().all(Action::is_passthrough) {
            let infos = actions
                .into_iter()
                .filter_map(|action| match action {
                    Action::Passthrough(info) => Some(info),
                    _ => None,
                })
                .collect();
            return Ok(Flushed {
                infos,
                history_boundary_passed,
            });
        }

        tracing::trace!(
            target: LOG_TARGET,
            actions = actions.len(),
            history_boundary_passed,
            "flushing accumulated actions"
        );
        let infos = self.tracker.process_actions_sync(actions)?;
        Ok(Flushed {
            infos,
            history_boundary_passed,
        })
    }
}
