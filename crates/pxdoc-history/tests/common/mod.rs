#![allow(dead_code)]

//! Shared changes for integration tests.
//!
//! The document is a ledger of numbers and descriptors are [`Entry`] values.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pxdoc_history::{
    Action, AppliedChange, ApplyPhase, Change, ChangeInfos, InteractiveChange, UpdateableChange,
};

pub type Ledger = Vec<i64>;

/// Descriptor emitted by the test changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Appended(i64),
    Removed(i64),
    Set { index: usize, value: i64 },
    Marker(u32),
}

/// Counts how many changes were validated and how many were disposed.
#[derive(Debug, Default)]
pub struct Counters {
    validated: AtomicUsize,
    disposed: AtomicUsize,
}

impl Counters {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn validated(&self) -> usize {
        self.validated.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }

    fn on_validate(&self) {
        self.validated.fetch_add(1, Ordering::SeqCst);
    }

    fn on_dispose(&self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Appends a number. Negative numbers fail validation; zero is transient.
pub struct Push {
    pub value: i64,
    pub counters: Arc<Counters>,
}

impl Change<Ledger, Entry> for Push {
    fn initialize_and_validate(&mut self, _document: &Ledger) -> bool {
        self.counters.on_validate();
        self.value >= 0
    }

    fn apply(&mut self, document: &mut Ledger, _phase: ApplyPhase) -> AppliedChange<Entry> {
        if self.value == 0 {
            return AppliedChange::transient(ChangeInfos::none());
        }
        document.push(self.value);
        AppliedChange::recorded(ChangeInfos::single(Entry::Appended(self.value)))
    }

    fn revert(&mut self, document: &mut Ledger) -> ChangeInfos<Entry> {
        document.pop();
        ChangeInfos::single(Entry::Removed(self.value))
    }

    fn is_mergeable_with(&self, other: &dyn Change<Ledger, Entry>) -> bool {
        other.downcast_ref::<Self>().is_some()
    }

    fn dispose(self: Box<Self>) {
        self.counters.on_dispose();
    }

    fn description(&self) -> &str {
        "Push"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// State shared by the interactive test changes: edits the last entry.
struct LastEntry {
    index: usize,
    original: i64,
}

impl LastEntry {
    fn capture(document: &Ledger) -> Option<Self> {
        let index = document.len().checked_sub(1)?;
        Some(Self {
            index,
            original: document[index],
        })
    }

    fn set(&self, document: &mut Ledger, value: i64) -> ChangeInfos<Entry> {
        document[self.index] = value;
        ChangeInfos::single(Entry::Set {
            index: self.index,
            value,
        })
    }
}

/// Adds an offset to the last entry while dragging. Not interruptable.
/// Finalizing at offset zero is transient.
pub struct Slide {
    offset: i64,
    target: Option<LastEntry>,
    counters: Arc<Counters>,
}

impl Change<Ledger, Entry> for Slide {
    fn initialize_and_validate(&mut self, document: &Ledger) -> bool {
        self.counters.on_validate();
        self.target = LastEntry::capture(document);
        self.target.is_some()
    }

    fn apply(&mut self, document: &mut Ledger, _phase: ApplyPhase) -> AppliedChange<Entry> {
        let infos = self.apply_temporarily(document);
        if self.offset == 0 {
            AppliedChange::transient(infos)
        } else {
            AppliedChange::recorded(infos)
        }
    }

    fn revert(&mut self, document: &mut Ledger) -> ChangeInfos<Entry> {
        match &self.target {
            Some(target) => target.set(document, target.original),
            None => ChangeInfos::none(),
        }
    }

    fn dispose(self: Box<Self>) {
        self.counters.on_dispose();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl UpdateableChange<Ledger, Entry> for Slide {
    fn apply_temporarily(&mut self, document: &mut Ledger) -> ChangeInfos<Entry> {
        match &self.target {
            Some(target) => target.set(document, target.original + self.offset),
            None => ChangeInfos::none(),
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_change(self: Box<Self>) -> Box<dyn Change<Ledger, Entry>> {
        self
    }
}

impl InteractiveChange<Ledger, Entry> for Slide {
    type Params = (i64, Arc<Counters>);

    fn start(params: &Self::Params) -> Self {
        Self {
            offset: params.0,
            target: None,
            counters: params.1.clone(),
        }
    }

    fn update(&mut self, params: Self::Params) {
        self.offset = params.0;
    }
}

/// Overwrites the last entry while hovering. Interruptable. Finalizing at the
/// original value is transient.
pub struct Hover {
    value: i64,
    target: Option<LastEntry>,
    counters: Arc<Counters>,
}

impl Change<Ledger, Entry> for Hover {
    fn initialize_and_validate(&mut self, document: &Ledger) -> bool {
        self.counters.on_validate();
        self.target = LastEntry::capture(document);
        self.target.is_some()
    }

    fn apply(&mut self, document: &mut Ledger, _phase: ApplyPhase) -> AppliedChange<Entry> {
        let infos = self.apply_temporarily(document);
        match &self.target {
            Some(target) if target.original != self.value => AppliedChange::recorded(infos),
            _ => AppliedChange::transient(infos),
        }
    }

    fn revert(&mut self, document: &mut Ledger) -> ChangeInfos<Entry> {
        match &self.target {
            Some(target) => target.set(document, target.original),
            None => ChangeInfos::none(),
        }
    }

    fn dispose(self: Box<Self>) {
        self.counters.on_dispose();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl UpdateableChange<Ledger, Entry> for Hover {
    fn apply_temporarily(&mut self, document: &mut Ledger) -> ChangeInfos<Entry> {
        match &self.target {
            Some(target) => target.set(document, self.value),
            None => ChangeInfos::none(),
        }
    }

    fn is_interruptable(&self) -> bool {
        true
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_change(self: Box<Self>) -> Box<dyn Change<Ledger, Entry>> {
        self
    }
}

impl InteractiveChange<Ledger, Entry> for Hover {
    type Params = (i64, Arc<Counters>);

    fn start(params: &Self::Params) -> Self {
        Self {
            value: params.0,
            target: None,
            counters: params.1.clone(),
        }
    }

    fn update(&mut self, params: Self::Params) {
        self.value = params.0;
    }
}

pub fn push(value: i64, counters: &Arc<Counters>) -> Action<Ledger, Entry> {
    Action::make_change(Push {
        value,
        counters: counters.clone(),
    })
}

pub fn slide(offset: i64, counters: &Arc<Counters>) -> Action<Ledger, Entry> {
    Action::start_or_update::<Slide>((offset, counters.clone()))
}

pub fn hover(value: i64, counters: &Arc<Counters>) -> Action<Ledger, Entry> {
    Action::start_or_update::<Hover>((value, counters.clone()))
}
