#![forbid(unsafe_code)]

use std::any::Any;

use pxdoc_history::{AppliedChange, ApplyPhase, Change, ChangeInfos};

use super::Infos;
use crate::LOG_TARGET;
use crate::document::{Document, Layer, LayerId};
use crate::info::ChangeInfo;

/// Remove a layer. The removed layer is the snapshot restored on revert.
#[derive(Debug)]
pub struct DeleteLayer {
    id: LayerId,
    removed: Option<(usize, Layer)>,
}

impl DeleteLayer {
    #[must_use]
    pub fn new(id: LayerId) -> Self {
        Self { id, removed: None }
    }
}

impl Change<Document, ChangeInfo> for DeleteLayer {
    fn initialize_and_validate(&mut self, document: &Document) -> bool {
        document.has_layer(self.id)
    }

    fn apply(&mut self, document: &mut Document, _phase: ApplyPhase) -> AppliedChange<ChangeInfo> {
        self.removed = document.remove_layer(self.id);
        if self.removed.is_none() {
            return AppliedChange::transient(ChangeInfos::none());
        }
        AppliedChange::recorded(ChangeInfos::single(ChangeInfo::LayerDeleted {
            layer: self.id,
        }))
    }

    fn revert(&mut self, document: &mut Document) -> Infos {
        let Some((index, layer)) = self.removed.take() else {
            return ChangeInfos::none();
        };
        let index = document.insert_layer(index, layer);
        ChangeInfos::single(ChangeInfo::LayerCreated {
            layer: self.id,
            index,
        })
    }

    fn dispose(self: Box<Self>) {
        if let Some((_, layer)) = &self.removed {
            tracing::trace!(
                target: LOG_TARGET,
                layer = %layer.id(),
                pixels = layer.pixel_count(),
                "released deleted layer"
            );
        }
    }

    fn description(&self) -> &str {
        "Delete layer"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
