#![forbid(unsafe_code)]

use std::any::Any;

use pxdoc_history::{AppliedChange, ApplyPhase, Change, ChangeInfos};

use super::Infos;
use crate::document::{Document, Layer, LayerId};
use crate::info::ChangeInfo;

/// Insert an empty layer.
#[derive(Debug)]
pub struct CreateLayer {
    id: LayerId,
    name: String,
    index: usize,
}

impl CreateLayer {
    /// New layer on top of the stack.
    #[must_use]
    pub fn new(id: LayerId, name: impl Into<String>) -> Self {
        Self::at(id, name, usize::MAX)
    }

    /// New layer at `index` (clamped to the top).
    #[must_use]
    pub fn at(id: LayerId, name: impl Into<String>, index: usize) -> Self {
        Self {
            id,
            name: name.into(),
            index,
        }
    }
}

impl Change<Document, ChangeInfo> for CreateLayer {
    fn initialize_and_validate(&mut self, document: &Document) -> bool {
        if document.has_layer(self.id) {
            return false;
        }
        self.index = self.index.min(document.layers().len());
        true
    }

    fn apply(&mut self, document: &mut Document, _phase: ApplyPhase) -> AppliedChange<ChangeInfo> {
        let index = document.insert_layer(self.index, Layer::new(self.id, self.name.clone()));
        AppliedChange::recorded(ChangeInfos::single(ChangeInfo::LayerCreated {
            layer: self.id,
            index,
        }))
    }

    fn revert(&mut self, document: &mut Document) -> Infos {
        match document.remove_layer(self.id) {
            Some(_) => ChangeInfos::single(ChangeInfo::LayerDeleted { layer: self.id }),
            None => ChangeInfos::none(),
        }
    }

    fn description(&self) -> &str {
        "Create layer"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
