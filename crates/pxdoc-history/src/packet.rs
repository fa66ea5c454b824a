#![forbid(unsafe_code)]

//! Packets: atomically undoable runs of changes.
//!
//! A packet is only mutated while it is the tracker's open packet, or when a
//! single boundary-closed change is merged onto the newest undo packet. Once
//! on a stack it otherwise moves whole between the undo and redo stacks.

use std::fmt;

use crate::change::{ApplyPhase, Change};

/// Identity assigned to every change recorded in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChangeId(u64);

impl ChangeId {
    /// Create an id from a raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Recorded<D: 'static, I: 'static> {
    id: ChangeId,
    change: Box<dyn Change<D, I>>,
}

/// An ordered, non-empty run of changes that undo and redo together.
pub struct Packet<D: 'static, I: 'static> {
    changes: Vec<Recorded<D, I>>,
}

impl<D: 'static, I: 'static> fmt::Debug for Packet<D, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.changes.iter().map(|r| (r.id, r.change.kind())))
            .finish()
    }
}

impl<D: 'static, I: 'static> Packet<D, I> {
    /// Start a packet with its first change.
    #[must_use]
    pub fn new(id: ChangeId, change: Box<dyn Change<D, I>>) -> Self {
        Self {
            changes: vec![Recorded { id, change }],
        }
    }

    /// Append a change.
    pub fn push(&mut self, id: ChangeId, change: Box<dyn Change<D, I>>) {
        self.changes.push(Recorded { id, change });
    }

    /// Number of changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Always false for packets built through [`new`](Self::new).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Newest change.
    #[must_use]
    pub fn last(&self) -> Option<&dyn Change<D, I>> {
        self.changes.last().map(|r| r.change.as_ref())
    }

    /// Id of the newest change.
    #[must_use]
    pub fn last_id(&self) -> Option<ChangeId> {
        self.changes.last().map(|r| r.id)
    }

    /// Ids of all changes, oldest first.
    pub fn ids(&self) -> impl Iterator<Item = ChangeId> + '_ {
        self.changes.iter().map(|r| r.id)
    }

    /// Description of the packet for history UI (its first change).
    #[must_use]
    pub fn description(&self) -> &str {
        self.changes
            .first()
            .map_or("", |r| r.change.description())
    }

    /// Whether every adjacent pair of changes reports mutual mergeability.
    ///
    /// Each change is asked whether it merges with its predecessor. O(len).
    #[must_use]
    pub fn is_homologous(&self) -> bool {
        self.changes
            .windows(2)
            .all(|pair| pair[1].change.is_mergeable_with(pair[0].change.as_ref()))
    }

    /// Whether a lone `change` may be folded onto this packet.
    #[must_use]
    pub fn accepts_merge(&self, change: &dyn Change<D, I>) -> bool {
        self.is_homologous() && self.last().is_some_and(|last| last.is_mergeable_with(change))
    }

    /// Revert every change, newest first, collecting descriptors.
    pub fn revert(&mut self, document: &mut D, out: &mut Vec<I>) {
        for recorded in self.changes.iter_mut().rev() {
            out.extend(recorded.change.revert(document));
        }
    }

    /// Re-apply every change, oldest first, collecting descriptors.
    pub fn redo(&mut self, document: &mut D, out: &mut Vec<I>) {
        for recorded in &mut self.changes {
            out.extend(recorded.change.apply(document, ApplyPhase::Redo).infos);
        }
    }

    /// Move the single change out of a one-change packet.
    pub(crate) fn into_single(mut self) -> Result<(ChangeId, Box<dyn Change<D, I>>), Self> {
        if self.changes.len() != 1 {
            return Err(self);
        }
        match self.changes.pop() {
            Some(Recorded { id, change }) => Ok((id, change)),
            None => Err(self),
        }
    }

    /// Dispose every change. Returns how many were disposed.
    pub fn dispose(self) -> usize {
        let count = self.changes.len();
        for recorded in self.changes {
            recorded.change.dispose();
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{AppliedChange, ChangeInfos};
    use std::any::Any;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Appends `value` to the document; mergeable with other pushes of the
    /// same parity.
    struct PushValue {
        value: u8,
        disposed: Arc<AtomicUsize>,
    }

    impl Change<Vec<u8>, u8> for PushValue {
        fn initialize_and_validate(&mut self, _document: &Vec<u8>) -> bool {
            true
        }

        fn apply(&mut self, document: &mut Vec<u8>, _phase: ApplyPhase) -> AppliedChange<u8> {
            document.push(self.value);
            AppliedChange::recorded(ChangeInfos::single(self.value))
        }

        fn revert(&mut self, document: &mut Vec<u8>) -> ChangeInfos<u8> {
            document.pop();
            ChangeInfos::single(self.value)
        }

        fn is_mergeable_with(&self, other: &dyn Change<Vec<u8>, u8>) -> bool {
            other
                .downcast_ref::<Self>()
                .is_some_and(|o| o.value % 2 == self.value % 2)
        }

        fn dispose(self: Box<Self>) {
            self.disposed.fetch_add(1, Ordering::SeqCst);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn push(value: u8, disposed: &Arc<AtomicUsize>) -> Box<dyn Change<Vec<u8>, u8>> {
        Box::new(PushValue {
            value,
            disposed: disposed.clone(),
        })
    }

    #[test]
    fn homologous_requires_every_pair() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let mut packet = Packet::new(ChangeId::new(1), push(2, &disposed));
        packet.push(ChangeId::new(2), push(4, &disposed));
        assert!(packet.is_homologous());

        packet.push(ChangeId::new(3), push(5, &disposed));
        assert!(!packet.is_homologous());
        assert_eq!(packet.dispose(), 3);
        assert_eq!(disposed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn single_change_packet_is_homologous() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let packet = Packet::new(ChangeId::new(1), push(1, &disposed));
        assert!(packet.is_homologous());
        assert_eq!(packet.last_id(), Some(ChangeId::new(1)));
    }

    #[test]
    fn accepts_merge_checks_last_change() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let packet = Packet::new(ChangeId::new(1), push(2, &disposed));
        let even = push(8, &disposed);
        let odd = push(3, &disposed);
        assert!(packet.accepts_merge(even.as_ref()));
        assert!(!packet.accepts_merge(odd.as_ref()));
    }

    #[test]
    fn revert_runs_newest_first_and_redo_oldest_first() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let mut doc = Vec::new();
        let mut packet = Packet::new(ChangeId::new(1), push(1, &disposed));
        packet.push(ChangeId::new(2), push(2, &disposed));
        packet.redo(&mut doc, &mut Vec::new());
        assert_eq!(doc, vec![1, 2]);

        let mut out = Vec::new();
        packet.revert(&mut doc, &mut out);
        assert_eq!(out, vec![2, 1]);
        assert!(doc.is_empty());

        let mut out = Vec::new();
        packet.redo(&mut doc, &mut out);
        assert_eq!(out, vec![1, 2]);
        assert_eq!(doc, vec![1, 2]);
    }

    #[test]
    fn into_single_only_for_one_change() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let single = Packet::new(ChangeId::new(7), push(1, &disposed));
        let (id, change) = single.into_single().map_err(|_| ()).expect("single change");
        assert_eq!(id, ChangeId::new(7));
        change.dispose();

        let mut double = Packet::new(ChangeId::new(1), push(1, &disposed));
        double.push(ChangeId::new(2), push(3, &disposed));
        let double = double.into_single().err().expect("two changes stay packed");
        assert_eq!(double.len(), 2);
        assert_eq!(double.dispose(), 2);
        assert_eq!(disposed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn change_id_display() {
        assert_eq!(ChangeId::new(42).to_string(), "#42");
        assert_eq!(ChangeId::new(42).raw(), 42);
    }
}
