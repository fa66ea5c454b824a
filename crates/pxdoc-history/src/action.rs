#![forbid(unsafe_code)]

//! Action taxonomy.
//!
//! An [`Action`] describes requested work. The tracker dispatches each action
//! by kind: change requests become [`Change`]s, history actions move packets
//! between stacks, and pass-through actions are forwarded verbatim.

use std::fmt;
use std::marker::PhantomData;

use crate::change::{Change, ChangeKind, InteractiveChange, UpdateableChange};

/// Request to construct a one-shot change.
pub trait MakeChangeAction<D, I>: Send {
    /// Build the change this action describes.
    fn create_change(self: Box<Self>) -> Box<dyn Change<D, I>>;
}

/// Every change is its own one-shot request.
impl<D, I, C> MakeChangeAction<D, I> for C
where
    C: Change<D, I>,
{
    fn create_change(self: Box<Self>) -> Box<dyn Change<D, I>> {
        self
    }
}

/// Request to start an interactive change, or update the active one.
pub trait StartOrUpdateAction<D, I>: Send {
    /// Kind of change this request targets.
    fn change_kind(&self) -> ChangeKind;

    /// Build a fresh change when none is active.
    fn create_change(&self) -> Box<dyn UpdateableChange<D, I>>;

    /// Forward this request's parameters to the active change.
    fn update_change(self: Box<Self>, change: &mut dyn UpdateableChange<D, I>);
}

/// Request to finalize the active interactive change.
pub trait EndChangeAction<D, I>: Send {
    /// Kind of change this request targets.
    fn change_kind(&self) -> ChangeKind;
}

/// Start/update request carrying typed parameters for `C`.
pub struct StartOrUpdate<C, P> {
    params: P,
    _change: PhantomData<fn() -> C>,
}

impl<C, P> StartOrUpdate<C, P> {
    /// Wrap the parameters for the next preview of `C`.
    #[must_use]
    pub fn new(params: P) -> Self {
        Self {
            params,
            _change: PhantomData,
        }
    }

    /// Parameters carried by this request.
    #[must_use]
    pub fn params(&self) -> &P {
        &self.params
    }
}

impl<D: 'static, I: 'static, C> StartOrUpdateAction<D, I> for StartOrUpdate<C, C::Params>
where
    C: InteractiveChange<D, I>,
{
    fn change_kind(&self) -> ChangeKind {
        ChangeKind::of::<C>()
    }

    fn create_change(&self) -> Box<dyn UpdateableChange<D, I>> {
        Box::new(C::start(&self.params))
    }

    fn update_change(self: Box<Self>, change: &mut dyn UpdateableChange<D, I>) {
        match change.as_any_mut().downcast_mut::<C>() {
            Some(change) => change.update(self.params),
            None => tracing::debug!(
                target: crate::LOG_TARGET,
                expected = %ChangeKind::of::<C>(),
                "update dropped: active change has a different concrete type"
            ),
        }
    }
}

/// End request for an interactive change of type `C`.
pub struct EndChange<C> {
    _change: PhantomData<fn() -> C>,
}

impl<C> EndChange<C> {
    /// End request targeting `C`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _change: PhantomData,
        }
    }
}

impl<C> Default for EndChange<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, I, C> EndChangeAction<D, I> for EndChange<C>
where
    C: UpdateableChange<D, I>,
{
    fn change_kind(&self) -> ChangeKind {
        ChangeKind::of::<C>()
    }
}

/// A unit of requested work.
pub enum Action<D, I> {
    /// Construct, validate, and apply a one-shot change.
    MakeChange(Box<dyn MakeChangeAction<D, I>>),
    /// Start an interactive change or update the active one, then preview it.
    StartOrUpdateChange(Box<dyn StartOrUpdateAction<D, I>>),
    /// Finalize the active interactive change.
    EndChange(Box<dyn EndChangeAction<D, I>>),
    /// Revert the newest packet.
    Undo,
    /// Re-apply the most recently undone packet.
    Redo,
    /// Close the packet being accumulated.
    ChangeBoundary,
    /// Dispose both history stacks.
    DeleteRecordedChanges,
    /// A pre-formed descriptor forwarded verbatim to the output.
    Passthrough(I),
}

impl<D: 'static, I: 'static> Action<D, I> {
    /// One-shot request for `change`.
    #[must_use]
    pub fn make_change<C: Change<D, I>>(change: C) -> Self {
        Self::MakeChange(Box::new(change))
    }

    /// Start/update request for interactive change `C`.
    #[must_use]
    pub fn start_or_update<C: InteractiveChange<D, I>>(params: C::Params) -> Self {
        Self::StartOrUpdateChange(Box::new(StartOrUpdate::<C, C::Params>::new(params)))
    }

    /// End request for interactive change `C`.
    #[must_use]
    pub fn end<C: UpdateableChange<D, I>>() -> Self {
        Self::EndChange(Box::new(EndChange::<C>::new()))
    }
}

impl<D, I> Action<D, I> {
    /// Whether this action bypasses the change machinery.
    #[must_use]
    pub const fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough(_))
    }

    /// Whether processing this action can move history (undo, redo, or a
    /// commit boundary).
    #[must_use]
    pub const fn is_history_boundary(&self) -> bool {
        matches!(self, Self::Undo | Self::Redo | Self::ChangeBoundary)
    }

    /// Stable name of the action kind, for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MakeChange(_) => "make_change",
            Self::StartOrUpdateChange(_) => "start_or_update_change",
            Self::EndChange(_) => "end_change",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::ChangeBoundary => "change_boundary",
            Self::DeleteRecordedChanges => "delete_recorded_changes",
            Self::Passthrough(_) => "passthrough",
        }
    }
}

impl<D: 'static, I: fmt::Debug + 'static> fmt::Debug for Action<D, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartOrUpdateChange(act) => f
                .debug_tuple("StartOrUpdateChange")
                .field(&act.change_kind())
                .finish(),
            Self::EndChange(act) => f.debug_tuple("EndChange").field(&act.change_kind()).finish(),
            Self::Passthrough(info) => f.debug_tuple("Passthrough").field(info).finish(),
            other => f.write_str(other.name()),
        }
    }
}
