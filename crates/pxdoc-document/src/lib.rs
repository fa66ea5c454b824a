#![forbid(unsafe_code)]

//! pxdoc Document
//!
//! A raster document model and the reversible changes that edit it through
//! [`pxdoc_history`].
//!
//! # Key Components
//!
//! - [`Document`] / [`Layer`] - Canvas of sparse raster layers with preview overlays
//! - [`PixelSnapshot`] - Previous pixel values a change restores on revert
//! - [`ChangeInfo`] - Descriptors telling renderers what to refresh
//! - [`changes`] - One-shot and interactive changes
//! - [`DocumentTracker`] - The history engine bound to this document
//!
//! # Example
//!
//! ```rust,ignore
//! use pxdoc_document::{DocumentAction, DocumentTracker, Document, VecI};
//! use pxdoc_document::changes::ResizeCanvas;
//!
//! let tracker = DocumentTracker::new(Document::new(VecI::new(32, 32)));
//! tracker.process_actions_sync(vec![
//!     DocumentAction::make_change(ResizeCanvas::new(VecI::new(64, 64))),
//!     DocumentAction::ChangeBoundary,
//! ])?;
//! ```

pub mod changes;
pub mod color;
pub mod document;
pub mod geometry;
pub mod info;

pub use color::Color;
pub use document::{Document, Layer, LayerId, PixelSnapshot};
pub use geometry::{RectI, VecI, bresenham_line};
pub use info::ChangeInfo;

/// Change tracker for [`Document`]s.
pub type DocumentTracker = pxdoc_history::DocumentChangeTracker<Document, ChangeInfo>;

/// Action accepted by a [`DocumentTracker`].
pub type DocumentAction = pxdoc_history::Action<Document, ChangeInfo>;

/// Accumulator feeding a shared [`DocumentTracker`].
pub type DocumentAccumulator = pxdoc_history::ActionAccumulator<Document, ChangeInfo>;

/// `tracing` target for events emitted by document changes.
pub const LOG_TARGET: &str = "pxdoc.document";
