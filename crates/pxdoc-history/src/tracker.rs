#![forbid(unsafe_code)]

//! Document change tracker.
//!
//! [`DocumentChangeTracker`] owns a document and its history. Callers submit
//! ordered batches of [`Action`]s; the tracker turns them into [`Change`]s,
//! applies them, and maintains the undo/redo stacks of [`Packet`]s.
//!
//! # Architecture
//!
//! ```text
//!  actions ──► dispatch ──► Change ──apply──► document
//!                 │                    │
//!                 │              descriptors ──► output
//!                 ▼
//!  ┌────────────────────────────────────────────────────────────┐
//!  │ active change   : Option<UpdateableChange>  (previewing)   │
//!  │ open packet     : Option<Packet>            (accumulating) │
//!  │ undo stack      : [P1, P2, P3]   ◄─ commit boundary        │
//!  │ redo stack      : [P5, P4]       ◄─ undo / redo ─►         │
//!  └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. At most one updateable change is active.
//! 2. Recording a change clears (and disposes) the redo stack.
//! 3. Undo, redo, and history deletion are refused while a packet is open or
//!    an updateable change is active.
//! 4. Every change the tracker creates is disposed exactly once: on
//!    validation failure, when transient, on eviction or history deletion,
//!    or when the tracker is disposed. Ownership moves between the slots
//!    above and is never shared.
//! 5. Batches are serialized. A second batch (or `dispose`) while one runs
//!    fails with [`TrackerError::Running`].
//!
//! # Failure Modes
//!
//! Protocol violations inside a batch are logged at `warn` under
//! [`LOG_TARGET`](crate::LOG_TARGET) and skipped; the rest of the batch runs.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use web_time::Instant;

use crate::LOG_TARGET;
use crate::action::{Action, EndChangeAction, MakeChangeAction, StartOrUpdateAction};
use crate::batch::BatchHandle;
use crate::change::{ApplyPhase, Change, ChangeKind, UpdateableChange};
use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::packet::{ChangeId, Packet};

/// Counters describing what a tracker has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    /// Batches processed.
    pub batches: u64,
    /// Actions dispatched.
    pub actions: u64,
    /// Actions skipped as protocol violations.
    pub protocol_violations: u64,
    /// Changes dropped because validation failed.
    pub validation_failures: u64,
    /// Changes added to an open packet.
    pub changes_recorded: u64,
    /// Changes applied without lasting effect.
    pub changes_transient: u64,
    /// Single-change packets folded onto the newest undo packet.
    pub packets_merged: u64,
    /// Active interruptable changes force-finalized by a conflicting request.
    pub interruptions: u64,
    /// Changes disposed, including those released by
    /// [`dispose`](DocumentChangeTracker::dispose).
    pub changes_disposed: u64,
}

/// Shape of the history at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistorySnapshot {
    /// Change count of each undo packet, oldest first.
    pub undo: Vec<usize>,
    /// Change count of each redo packet, oldest first.
    pub redo: Vec<usize>,
    /// Change count of the open packet.
    pub open_packet: Option<usize>,
    /// Kind of the active updateable change.
    pub active_change: Option<ChangeKind>,
}

struct TrackerState<D: 'static, I: 'static> {
    document: D,
    undo_stack: VecDeque<Packet<D, I>>,
    redo_stack: VecDeque<Packet<D, I>>,
    active_packet: Option<Packet<D, I>>,
    active_change: Option<Box<dyn UpdateableChange<D, I>>>,
    next_change_id: u64,
    config: TrackerConfig,
    stats: TrackerStats,
}

impl<D: 'static, I: 'static> TrackerState<D, I> {
    fn new(document: D, config: TrackerConfig) -> Self {
        Self {
            document,
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            active_packet: None,
            active_change: None,
            next_change_id: 1,
            config,
            stats: TrackerStats::default(),
        }
    }

    fn process(&mut self, actions: Vec<Action<D, I>>) -> Vec<I> {
        let start = Instant::now();
        let span = tracing::debug_span!(
            "history.process_actions",
            actions = actions.len(),
            outputs = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        )
        .entered();

        let mut out = Vec::new();
        for action in actions {
            self.stats.actions += 1;
            match action {
                Action::MakeChange(act) => self.process_make_change(act, &mut out),
                Action::StartOrUpdateChange(act) => self.process_start_or_update(act, &mut out),
                Action::EndChange(act) => self.process_end_change(act, &mut out),
                Action::Undo => self.undo(&mut out),
                Action::Redo => self.redo(&mut out),
                Action::ChangeBoundary => self.complete_packet(),
                Action::DeleteRecordedChanges => self.delete_all_changes(),
                Action::Passthrough(info) => out.push(info),
            }
        }
        self.stats.batches += 1;

        span.record("outputs", out.len());
        span.record(
            "duration_us",
            u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
        );
        out
    }

    // ========================================================================
    // Change requests
    // ========================================================================

    fn process_make_change(&mut self, act: Box<dyn MakeChangeAction<D, I>>, out: &mut Vec<I>) {
        match self.active_change.as_ref().map(|c| c.is_interruptable()) {
            Some(true) => self.interrupt_active("make_change", out),
            Some(false) => {
                self.protocol_violation("make_change", "an updateable change is active");
                return;
            }
            None => {}
        }

        let mut change = act.create_change();
        if !change.initialize_and_validate(&self.document) {
            self.validation_failed(change);
            return;
        }
        let applied = change.apply(&mut self.document, ApplyPhase::First);
        out.extend(applied.infos);
        self.record_or_dispose(change, applied.record_in_history);
    }

    fn process_start_or_update(
        &mut self,
        act: Box<dyn StartOrUpdateAction<D, I>>,
        out: &mut Vec<I>,
    ) {
        let requested = act.change_kind();
        match self
            .active_change
            .as_ref()
            .map(|c| (c.kind(), c.is_interruptable()))
        {
            Some((active, _)) if active == requested => {}
            Some((_, true)) => self.interrupt_active("start_or_update_change", out),
            Some((_, false)) => {
                self.protocol_violation(
                    "start_or_update_change",
                    "a different kind of updateable change is active",
                );
                return;
            }
            None => {}
        }

        if self.active_change.is_none() {
            let mut change = act.create_change();
            if !change.initialize_and_validate(&self.document) {
                self.validation_failed(change.into_change());
                return;
            }
            tracing::debug!(
                target: LOG_TARGET,
                kind = %requested,
                "updateable change started"
            );
            self.active_change = Some(change);
        }

        if let Some(active) = self.active_change.as_mut() {
            act.update_change(active.as_mut());
            out.extend(active.apply_temporarily(&mut self.document));
        }
    }

    fn process_end_change(&mut self, act: Box<dyn EndChangeAction<D, I>>, out: &mut Vec<I>) {
        let requested = act.change_kind();
        match self.active_change.as_ref().map(|c| c.kind()) {
            None => {
                self.protocol_violation("end_change", "no updateable change is active");
                return;
            }
            Some(active) if active != requested => {
                self.protocol_violation("end_change", "active change kind does not match");
                return;
            }
            Some(_) => {}
        }
        self.finalize_active(out);
    }

    fn interrupt_active(&mut self, action: &'static str, out: &mut Vec<I>) {
        self.stats.interruptions += 1;
        tracing::debug!(
            target: LOG_TARGET,
            action = action,
            kind = %self.active_kind_name(),
            "interrupting active updateable change"
        );
        self.finalize_active(out);
    }

    fn finalize_active(&mut self, out: &mut Vec<I>) {
        let Some(mut change) = self.active_change.take() else {
            return;
        };
        let applied = change.apply(&mut self.document, ApplyPhase::Finalize);
        out.extend(applied.infos);
        self.record_or_dispose(change.into_change(), applied.record_in_history);
    }

    fn record_or_dispose(&mut self, change: Box<dyn Change<D, I>>, record: bool) {
        if record {
            self.add_to_undo(change);
        } else {
            self.stats.changes_transient += 1;
            tracing::debug!(
                target: LOG_TARGET,
                kind = %change.kind(),
                "change had no lasting effect; not recorded"
            );
            self.dispose_change(change);
        }
    }

    fn add_to_undo(&mut self, change: Box<dyn Change<D, I>>) {
        let id = ChangeId::new(self.next_change_id);
        self.next_change_id += 1;
        match self.active_packet.as_mut() {
            Some(packet) => packet.push(id, change),
            None => self.active_packet = Some(Packet::new(id, change)),
        }
        self.stats.changes_recorded += 1;
        self.clear_redo();
    }

    fn validation_failed(&mut self, change: Box<dyn Change<D, I>>) {
        self.stats.validation_failures += 1;
        tracing::debug!(
            target: LOG_TARGET,
            kind = %change.kind(),
            "change failed validation; dropped"
        );
        self.dispose_change(change);
    }

    fn dispose_change(&mut self, change: Box<dyn Change<D, I>>) {
        change.dispose();
        self.stats.changes_disposed += 1;
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Reason history operations are refused right now, if any.
    fn history_locked(&self) -> Option<&'static str> {
        if self.active_change.is_some() {
            Some("an updateable change is active")
        } else if self.active_packet.is_some() {
            Some("a change packet is open")
        } else {
            None
        }
    }

    fn undo(&mut self, out: &mut Vec<I>) {
        if let Some(reason) = self.history_locked() {
            self.protocol_violation("undo", reason);
            return;
        }
        let Some(mut packet) = self.undo_stack.pop_back() else {
            tracing::trace!(target: LOG_TARGET, "nothing to undo");
            return;
        };
        packet.revert(&mut self.document, out);
        self.redo_stack.push_back(packet);
    }

    fn redo(&mut self, out: &mut Vec<I>) {
        if let Some(reason) = self.history_locked() {
            self.protocol_violation("redo", reason);
            return;
        }
        let Some(mut packet) = self.redo_stack.pop_back() else {
            tracing::trace!(target: LOG_TARGET, "nothing to redo");
            return;
        };
        packet.redo(&mut self.document, out);
        self.undo_stack.push_back(packet);
    }

    /// Close the open packet, merging it onto the newest undo packet when
    /// it is a single change that packet accepts.
    fn complete_packet(&mut self) {
        let Some(packet) = self.active_packet.take() else {
            return;
        };
        let Err(packet) = self.try_merge(packet) else {
            return;
        };
        self.undo_stack.push_back(packet);
        self.enforce_depth();
    }

    fn try_merge(&mut self, packet: Packet<D, I>) -> Result<(), Packet<D, I>> {
        if packet.len() != 1 {
            return Err(packet);
        }
        let Some(top) = self.undo_stack.back_mut() else {
            return Err(packet);
        };
        if !self.config.allows_merge_into(top.len()) {
            return Err(packet);
        }
        if !packet.last().is_some_and(|change| top.accepts_merge(change)) {
            return Err(packet);
        }

        let (id, change) = packet.into_single()?;
        top.push(id, change);
        self.stats.packets_merged += 1;
        tracing::debug!(
            target: LOG_TARGET,
            change_id = %id,
            packet_len = top.len(),
            "merged change into previous packet"
        );
        Ok(())
    }

    fn enforce_depth(&mut self) {
        while self.config.exceeds_depth(self.undo_stack.len()) {
            let Some(oldest) = self.undo_stack.pop_front() else {
                break;
            };
            let disposed = oldest.dispose();
            self.stats.changes_disposed += disposed as u64;
            tracing::debug!(
                target: LOG_TARGET,
                disposed = disposed,
                "evicted oldest undo packet"
            );
        }
    }

    fn clear_redo(&mut self) {
        let mut disposed = 0;
        for packet in self.redo_stack.drain(..) {
            disposed += packet.dispose();
        }
        if disposed > 0 {
            self.stats.changes_disposed += disposed as u64;
            tracing::debug!(
                target: LOG_TARGET,
                disposed = disposed,
                "new change invalidated redo history"
            );
        }
    }

    fn delete_all_changes(&mut self) {
        if let Some(reason) = self.history_locked() {
            self.protocol_violation("delete_recorded_changes", reason);
            return;
        }
        let mut disposed = 0;
        for packet in self.redo_stack.drain(..).chain(self.undo_stack.drain(..)) {
            disposed += packet.dispose();
        }
        self.stats.changes_disposed += disposed as u64;
        tracing::debug!(
            target: LOG_TARGET,
            disposed = disposed,
            "deleted recorded changes"
        );
    }

    // ========================================================================
    // Diagnostics and teardown
    // ========================================================================

    fn active_kind_name(&self) -> &'static str {
        self.active_change
            .as_ref()
            .map_or("none", |c| c.kind().short_name())
    }

    fn protocol_violation(&mut self, action: &'static str, reason: &'static str) {
        self.stats.protocol_violations += 1;
        tracing::warn!(
            target: LOG_TARGET,
            action = action,
            reason = reason,
            active_change = self.active_kind_name(),
            open_packet = self.active_packet.is_some(),
            "ignored action: {reason}"
        );
    }

    fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            undo: self.undo_stack.iter().map(Packet::len).collect(),
            redo: self.redo_stack.iter().map(Packet::len).collect(),
            open_packet: self.active_packet.as_ref().map(Packet::len),
            active_change: self.active_change.as_ref().map(|c| c.kind()),
        }
    }

    /// Dispose the document and every reachable change. Returns the number of
    /// changes disposed and the final counters, which include them.
    fn dispose_all(self) -> (usize, TrackerStats) {
        let Self {
            document,
            undo_stack,
            redo_stack,
            active_packet,
            active_change,
            mut stats,
            ..
        } = self;
        drop(document);

        let mut disposed = 0;
        if let Some(change) = active_change {
            change.into_change().dispose();
            disposed += 1;
        }
        if let Some(packet) = active_packet {
            disposed += packet.dispose();
        }
        for packet in undo_stack.into_iter().chain(redo_stack) {
            disposed += packet.dispose();
        }
        stats.changes_disposed += disposed as u64;
        (disposed, stats)
    }
}

/// Clears the running flag when a batch ends, including by unwinding.
struct ReleaseOnDrop<'a>(&'a AtomicBool);

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owner of a document and its undo/redo history.
///
/// `D` is the document type and `I` the change descriptor type emitted to
/// external consumers (renderers, view models). Callers get read-only access
/// to the document through [`with_document`](Self::with_document); only
/// changes applied by the tracker mutate it.
pub struct DocumentChangeTracker<D: 'static, I: 'static> {
    state: Mutex<Option<TrackerState<D, I>>>,
    retired_stats: Mutex<TrackerStats>,
    running: AtomicBool,
    disposed: AtomicBool,
    config: TrackerConfig,
}

impl<D: 'static, I: 'static> fmt::Debug for DocumentChangeTracker<D, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentChangeTracker")
            .field("running", &self.is_running())
            .field("disposed", &self.is_disposed())
            .field("config", &self.config)
            .finish()
    }
}

impl<D: Default + 'static, I: 'static> Default for DocumentChangeTracker<D, I> {
    fn default() -> Self {
        Self::new(D::default())
    }
}

impl<D: 'static, I: 'static> DocumentChangeTracker<D, I> {
    /// Create a tracker that takes ownership of `document`.
    #[must_use]
    pub fn new(document: D) -> Self {
        Self::with_config(document, TrackerConfig::default())
    }

    /// Create a tracker with a custom configuration.
    #[must_use]
    pub fn with_config(document: D, config: TrackerConfig) -> Self {
        Self {
            state: Mutex::new(Some(TrackerState::new(document, config.clone()))),
            retired_stats: Mutex::new(TrackerStats::default()),
            running: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            config,
        }
    }

    /// The configuration this tracker was created with.
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    // ========================================================================
    // Processing
    // ========================================================================

    /// Process a batch of actions on the calling thread.
    ///
    /// Returns the descriptors produced by every apply/revert/preview in the
    /// batch, in call order. Fails if the tracker is disposed or another
    /// batch is running.
    pub fn process_actions_sync(&self, actions: Vec<Action<D, I>>) -> Result<Vec<I>, TrackerError> {
        self.claim()?;
        let _release = ReleaseOnDrop(&self.running);
        self.run_batch(actions)
    }

    /// Dispose the document and every change reachable from history.
    ///
    /// An active updateable change is discarded without being finalized.
    /// Fails while a batch is running or if already disposed.
    pub fn dispose(&self) -> Result<(), TrackerError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TrackerError::Running);
        }
        let _release = ReleaseOnDrop(&self.running);

        let Some(state) = self.lock_state().take() else {
            return Err(TrackerError::Disposed);
        };
        self.disposed.store(true, Ordering::Release);
        let (disposed, stats) = state.dispose_all();
        *self.retired_stats.lock().unwrap_or_else(|e| e.into_inner()) = stats;
        tracing::debug!(target: LOG_TARGET, disposed = disposed, "tracker disposed");
        Ok(())
    }

    /// Claim the running flag for a new batch.
    fn claim(&self) -> Result<(), TrackerError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(TrackerError::Disposed);
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TrackerError::Running);
        }
        Ok(())
    }

    /// Run a batch whose running flag is already claimed.
    fn run_batch(&self, actions: Vec<Action<D, I>>) -> Result<Vec<I>, TrackerError> {
        let mut guard = self.lock_state();
        let state = guard.as_mut().ok_or(TrackerError::Disposed)?;
        Ok(state.process(actions))
    }

    fn lock_state(&self) -> MutexGuard<'_, Option<TrackerState<D, I>>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn inspect<R: Default>(&self, f: impl FnOnce(&TrackerState<D, I>) -> R) -> R {
        self.lock_state().as_ref().map(f).unwrap_or_default()
    }

    // ========================================================================
    // Read-only access
    // ========================================================================

    /// Run `f` with read-only access to the document.
    ///
    /// Blocks while a batch is being processed, so `f` never observes a
    /// partially applied batch.
    pub fn with_document<R>(&self, f: impl FnOnce(&D) -> R) -> Result<R, TrackerError> {
        let guard = self.lock_state();
        let state = guard.as_ref().ok_or(TrackerError::Disposed)?;
        Ok(f(&state.document))
    }

    /// Whether a batch (or disposal) is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether [`dispose`](Self::dispose) has completed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo_depth() > 0
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.redo_depth() > 0
    }

    /// Number of packets on the undo stack.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.inspect(|s| s.undo_stack.len())
    }

    /// Number of packets on the redo stack.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.inspect(|s| s.redo_stack.len())
    }

    /// Whether an updateable change is active.
    #[must_use]
    pub fn has_active_change(&self) -> bool {
        self.inspect(|s| s.active_change.is_some())
    }

    /// Whether a packet is being accumulated.
    #[must_use]
    pub fn has_open_packet(&self) -> bool {
        self.inspect(|s| s.active_packet.is_some())
    }

    /// Id of the newest change on the undo stack.
    ///
    /// Compare against a value remembered at save time to detect unsaved
    /// changes; undo and redo move it.
    #[must_use]
    pub fn last_change_id(&self) -> Option<ChangeId> {
        self.inspect(|s| s.undo_stack.back().and_then(Packet::last_id))
    }

    /// Descriptions of undo packets, most recent first.
    #[must_use]
    pub fn undo_descriptions(&self, limit: usize) -> Vec<String> {
        self.inspect(|s| {
            s.undo_stack
                .iter()
                .rev()
                .take(limit)
                .map(|p| p.description().to_string())
                .collect()
        })
    }

    /// Descriptions of redo packets, most recent first.
    #[must_use]
    pub fn redo_descriptions(&self, limit: usize) -> Vec<String> {
        self.inspect(|s| {
            s.redo_stack
                .iter()
                .rev()
                .take(limit)
                .map(|p| p.description().to_string())
                .collect()
        })
    }

    /// Shape of both stacks, the open packet, and the active change.
    #[must_use]
    pub fn history(&self) -> HistorySnapshot {
        self.inspect(TrackerState::snapshot)
    }

    /// Counters accumulated since creation. After disposal, the final
    /// counters including the changes released by disposal.
    #[must_use]
    pub fn stats(&self) -> TrackerStats {
        match self.lock_state().as_ref() {
            Some(state) => state.stats,
            None => *self.retired_stats.lock().unwrap_or_else(|e| e.into_inner()),
        }
    }
}

impl<D, I> DocumentChangeTracker<D, I>
where
    D: Send + 'static,
    I: Send + 'static,
{
    /// Process a batch of actions on a background thread.
    ///
    /// The running flag is claimed before this returns, so a disposed or busy
    /// tracker fails immediately. Join the handle for the descriptors.
    pub fn process_actions(
        self: &Arc<Self>,
        actions: Vec<Action<D, I>>,
    ) -> Result<BatchHandle<I>, TrackerError> {
        self.claim()?;
        let tracker = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("pxdoc-history-batch".into())
            .spawn(move || {
                let _release = ReleaseOnDrop(&tracker.running);
                tracker.run_batch(actions)
            });
        match spawned {
            Ok(handle) => Ok(BatchHandle::new(handle)),
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(TrackerError::Spawn(e))
            }
        }
    }
}

impl<D: 'static, I: 'static> Drop for DocumentChangeTracker<D, I> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(state) = state {
            let (disposed, _) = state.dispose_all();
            tracing::debug!(
                target: LOG_TARGET,
                disposed = disposed,
                "tracker dropped without dispose"
            );
        }
    }
}
