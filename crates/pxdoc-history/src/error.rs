#![forbid(unsafe_code)]

//! Errors for caller misuse of the tracker.
//!
//! Protocol violations inside a batch (undo with an open packet, ending the
//! wrong kind of change, ...) are not errors: they are logged and skipped so
//! the rest of the batch still runs. These errors cover contract violations
//! by the caller.

use std::fmt;
use std::io;

/// Errors returned by [`DocumentChangeTracker`](crate::DocumentChangeTracker).
#[derive(Debug)]
pub enum TrackerError {
    /// Another batch is being processed, or dispose raced with processing.
    Running,
    /// The tracker has already been disposed.
    Disposed,
    /// The background thread for an asynchronous batch could not be started.
    Spawn(io::Error),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "already processing an action batch"),
            Self::Disposed => write!(f, "tracker has been disposed"),
            Self::Spawn(e) => write!(f, "failed to spawn batch thread: {e}"),
        }
    }
}

impl std::error::Error for TrackerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(e) => Some(e),
            Self::Running | Self::Disposed => None,
        }
    }
}

impl PartialEq for TrackerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Running, Self::Running) | (Self::Disposed, Self::Disposed) => true,
            (Self::Spawn(a), Self::Spawn(b)) => a.kind() == b.kind(),
            _ => false,
        }
    }
}

/// Errors returned by [`ActionAccumulator`](crate::ActionAccumulator).
#[derive(Debug, PartialEq)]
pub enum AccumulatorError {
    /// A change block is already open.
    ChangeBlockActive,
    /// The underlying tracker rejected the batch.
    Tracker(TrackerError),
}

impl fmt::Display for AccumulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChangeBlockActive => write!(f, "change block is already active"),
            Self::Tracker(e) => write!(f, "tracker error: {e}"),
        }
    }
}

impl std::error::Error for AccumulatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tracker(e) => Some(e),
            Self::ChangeBlockActive => None,
        }
    }
}

impl From<TrackerError> for AccumulatorError {
    fn from(e: TrackerError) -> Self {
        Self::Tracker(e)
    }
}
