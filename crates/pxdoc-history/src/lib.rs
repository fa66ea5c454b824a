#![forbid(unsafe_code)]

//! pxdoc History
//!
//! Transactional change tracking and undo/redo for pxdoc documents.
//!
//! # Key Components
//!
//! - [`DocumentChangeTracker`] - Owns a document and its undo/redo stacks
//! - [`Change`] - A reversible, validated mutation of the document
//! - [`UpdateableChange`] / [`InteractiveChange`] - Changes previewed repeatedly before finalizing
//! - [`Action`] - Requested work: change requests, history moves, pass-through descriptors
//! - [`Packet`] - Changes that undo and redo as one unit
//! - [`ActionAccumulator`] - Queues actions into batches with optional change blocks
//! - [`TrackerConfig`] - Depth limit and packet merging
//!
//! # Role in pxdoc
//! `pxdoc-history` knows nothing about pixels or layers. It is generic over
//! the document type `D` and over `I`, the descriptor type emitted to
//! renderers and view models. `pxdoc-document` supplies a concrete document
//! and its changes.
//!
//! # Logging
//! Events are emitted with `tracing` under [`LOG_TARGET`]. Protocol
//! violations log at `warn`; everything else at `debug` or `trace`.

pub mod accumulator;
pub mod action;
pub mod batch;
pub mod change;
pub mod config;
pub mod error;
pub mod packet;
pub mod tracker;

pub use accumulator::{ActionAccumulator, Flushed};
pub use action::{
    Action, EndChange, EndChangeAction, MakeChangeAction, StartOrUpdate, StartOrUpdateAction,
};
pub use batch::BatchHandle;
pub use change::{
    AppliedChange, ApplyPhase, Change, ChangeInfos, ChangeKind, InteractiveChange,
    UpdateableChange,
};
pub use config::{ConfigError, TrackerConfig};
pub use error::{AccumulatorError, TrackerError};
pub use packet::{ChangeId, Packet};
pub use tracker::{DocumentChangeTracker, HistorySnapshot, TrackerStats};

/// `tracing` target for every event this crate emits.
pub const LOG_TARGET: &str = "pxdoc.history";
