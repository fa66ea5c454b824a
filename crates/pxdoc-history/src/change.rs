#![forbid(unsafe_code)]

//! Reversible change contracts.
//!
//! A [`Change`] is the unit of reversible mutation. It is created from an
//! [`Action`](crate::Action), validated against the document, applied, and
//! then either recorded in history or disposed. An [`UpdateableChange`] adds a
//! preview path for continuous gestures (dragging, drawing) that has no
//! history effect until the change is finalized.
//!
//! # Lifecycle
//!
//! ```text
//!   create ──► initialize_and_validate ──false──► dispose
//!                      │
//!                    true
//!                      ▼
//!   [apply_temporarily ◄─► update]*        (updateable changes only)
//!                      │
//!                      ▼
//!                    apply ──transient──► dispose
//!                      │
//!                  recorded
//!                      ▼
//!   open packet ──► undo stack ◄──► redo stack ──► dispose (evicted/cleared)
//! ```
//!
//! # Invariants
//!
//! - `initialize_and_validate` never mutates the document.
//! - `revert` after `apply` restores the document exactly.
//! - `dispose` is called exactly once per change the tracker ever created.
//!   The consuming receiver makes a second call unrepresentable.

use std::any::{Any, TypeId};
use std::fmt;

/// Zero, one, or many descriptors produced by a single apply/revert call.
///
/// The tracker flattens these into the batch output without inspecting them.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ChangeInfos<I> {
    /// No observable effect.
    #[default]
    None,
    /// Exactly one descriptor.
    Single(I),
    /// Several descriptors, in the order they occurred.
    Many(Vec<I>),
}

impl<I> ChangeInfos<I> {
    /// No descriptors.
    #[must_use]
    pub const fn none() -> Self {
        Self::None
    }

    /// A single descriptor.
    #[must_use]
    pub const fn single(info: I) -> Self {
        Self::Single(info)
    }

    /// Several descriptors.
    #[must_use]
    pub fn many(infos: Vec<I>) -> Self {
        Self::Many(infos)
    }

    /// `Single` when present, `None` otherwise.
    #[must_use]
    pub fn from_option(info: Option<I>) -> Self {
        match info {
            Some(info) => Self::Single(info),
            None => Self::None,
        }
    }

    /// Number of descriptors carried.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Single(_) => 1,
            Self::Many(infos) => infos.len(),
        }
    }

    /// Whether no descriptors are carried.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into a vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<I> {
        match self {
            Self::None => Vec::new(),
            Self::Single(info) => vec![info],
            Self::Many(infos) => infos,
        }
    }
}

impl<I> From<Vec<I>> for ChangeInfos<I> {
    fn from(infos: Vec<I>) -> Self {
        Self::Many(infos)
    }
}

impl<I> FromIterator<I> for ChangeInfos<I> {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self::Many(iter.into_iter().collect())
    }
}

impl<I> IntoIterator for ChangeInfos<I> {
    type Item = I;
    type IntoIter = std::vec::IntoIter<I>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

/// Result of [`Change::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedChange<I> {
    /// Observable effects of the apply.
    pub infos: ChangeInfos<I>,
    /// `false` when the net effect is a no-op and the change must not be
    /// recorded (e.g. a drag that ends where it started).
    pub record_in_history: bool,
}

impl<I> AppliedChange<I> {
    /// An apply that belongs in history.
    #[must_use]
    pub fn recorded(infos: ChangeInfos<I>) -> Self {
        Self {
            infos,
            record_in_history: true,
        }
    }

    /// An apply with no lasting effect; the change is disposed right away.
    #[must_use]
    pub fn transient(infos: ChangeInfos<I>) -> Self {
        Self {
            infos,
            record_in_history: false,
        }
    }
}

/// Why [`Change::apply`] is being called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyPhase {
    /// One-shot change, applied right after validation.
    First,
    /// End of an interactive change. Previews may have touched the document.
    Finalize,
    /// Re-application from the redo stack.
    Redo,
}

impl ApplyPhase {
    /// Whether this is the first application of a one-shot change.
    #[must_use]
    pub const fn is_first_apply(self) -> bool {
        matches!(self, Self::First)
    }
}

/// Runtime identity of a change type.
///
/// Start/update/end requests declare the kind they target; the tracker only
/// forwards them to an active change of the same kind.
#[derive(Clone, Copy)]
pub struct ChangeKind {
    id: TypeId,
    name: &'static str,
}

impl ChangeKind {
    /// Kind of the concrete type `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Full type name, for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for ChangeKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ChangeKind {}

impl std::hash::Hash for ChangeKind {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChangeKind({})", self.short_name())
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A reversible mutation of a document `D`, describing its effects as `I`.
pub trait Change<D, I>: Any + Send {
    /// Inspect the document and capture whatever is needed to revert later.
    ///
    /// Must not mutate the document. Returning `false` drops the request; the
    /// tracker disposes the change without applying it.
    fn initialize_and_validate(&mut self, document: &D) -> bool;

    /// Perform the mutation.
    fn apply(&mut self, document: &mut D, phase: ApplyPhase) -> AppliedChange<I>;

    /// Perform the exact inverse of the last [`apply`](Self::apply).
    fn revert(&mut self, document: &mut D) -> ChangeInfos<I>;

    /// Whether `other` may be folded into the same packet as `self`.
    fn is_mergeable_with(&self, _other: &dyn Change<D, I>) -> bool {
        false
    }

    /// Release captured snapshot resources.
    fn dispose(self: Box<Self>) {}

    /// Human-readable description for history UI.
    fn description(&self) -> &str {
        self.kind().short_name()
    }

    /// Concrete type name, for diagnostics.
    fn debug_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Runtime kind of this change.
    fn kind(&self) -> ChangeKind {
        ChangeKind::of::<Self>()
    }

    /// Downcast support for [`is_mergeable_with`](Self::is_mergeable_with).
    fn as_any(&self) -> &dyn Any;
}

impl<D: 'static, I: 'static> fmt::Debug for dyn Change<D, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Change")
            .field("kind", &self.kind())
            .field("description", &self.description())
            .finish()
    }
}

impl<D: 'static, I: 'static> dyn Change<D, I> {
    /// Downcast to a concrete change type.
    pub fn downcast_ref<T: Change<D, I>>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A change with a live, non-committed preview path.
///
/// The tracker keeps at most one updateable change active. While active it
/// receives [`apply_temporarily`](Self::apply_temporarily) calls; the final
/// [`Change::apply`] with [`ApplyPhase::Finalize`] decides whether it enters
/// history.
pub trait UpdateableChange<D, I>: Change<D, I> {
    /// Apply a preview of the current parameters. May be called repeatedly.
    fn apply_temporarily(&mut self, document: &mut D) -> ChangeInfos<I>;

    /// Whether the tracker may force-finalize this change when a conflicting
    /// request arrives while it is active.
    fn is_interruptable(&self) -> bool {
        false
    }

    /// Mutable downcast support for parameter updates.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Convert into a plain change for recording in history.
    fn into_change(self: Box<Self>) -> Box<dyn Change<D, I>>;
}

impl<D: 'static, I: 'static> fmt::Debug for dyn UpdateableChange<D, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateableChange")
            .field("kind", &self.kind())
            .field("interruptable", &self.is_interruptable())
            .finish()
    }
}

/// An updateable change with typed parameters.
///
/// [`StartOrUpdate`](crate::StartOrUpdate) actions construct the change from
/// their parameters when nothing is active and forward them through
/// [`update`](Self::update) on every request.
pub trait InteractiveChange<D, I>: UpdateableChange<D, I> + Sized {
    /// Parameters carried by each start/update request.
    type Params: Send + 'static;

    /// Construct the change from the first request's parameters.
    fn start(params: &Self::Params) -> Self;

    /// Replace the working parameters before the next preview or finalization.
    fn update(&mut self, params: Self::Params);
}
