#![forbid(unsafe_code)]

use std::any::Any;

use pxdoc_history::{
    AppliedChange, ApplyPhase, Change, ChangeInfos, InteractiveChange, UpdateableChange,
};

use super::Infos;
use crate::document::{Document, LayerId};
use crate::info::ChangeInfo;

/// Drag a layer's opacity slider.
///
/// Interruptable; consecutive changes on the same layer merge.
#[derive(Debug)]
pub struct SetLayerOpacity {
    layer: LayerId,
    opacity: f32,
    original: f32,
}

impl SetLayerOpacity {
    fn set(&self, document: &mut Document, opacity: f32) -> Infos {
        match document.layer_mut(self.layer) {
            Some(layer) => {
                layer.set_opacity(opacity);
                ChangeInfos::single(ChangeInfo::LayerOpacity {
                    layer: self.layer,
                    opacity: layer.opacity(),
                })
            }
            None => ChangeInfos::none(),
        }
    }
}

impl Change<Document, ChangeInfo> for SetLayerOpacity {
    fn initialize_and_validate(&mut self, document: &Document) -> bool {
        match document.layer(self.layer) {
            Some(layer) => {
                self.original = layer.opacity();
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, document: &mut Document, _phase: ApplyPhase) -> AppliedChange<ChangeInfo> {
        let infos = self.set(document, self.opacity);
        let unchanged = document
            .layer(self.layer)
            .is_none_or(|layer| (layer.opacity() - self.original).abs() < f32::EPSILON);
        if unchanged {
            AppliedChange::transient(infos)
        } else {
            AppliedChange::recorded(infos)
        }
    }

    fn revert(&mut self, document: &mut Document) -> Infos {
        self.set(document, self.original)
    }

    fn is_mergeable_with(&self, other: &dyn Change<Document, ChangeInfo>) -> bool {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| other.layer == self.layer)
    }

    fn description(&self) -> &str {
        "Layer opacity"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl UpdateableChange<Document, ChangeInfo> for SetLayerOpacity {
    fn apply_temporarily(&mut self, document: &mut Document) -> Infos {
        self.set(document, self.opacity)
    }

    fn is_interruptable(&self) -> bool {
        true
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_change(self: Box<Self>) -> Box<dyn Change<Document, ChangeInfo>> {
        self
    }
}

impl InteractiveChange<Document, ChangeInfo> for SetLayerOpacity {
    type Params = (LayerId, f32);

    fn start(&(layer, opacity): &(LayerId, f32)) -> Self {
        Self {
            layer,
            opacity,
            original: 1.0,
        }
    }

    fn update(&mut self, (_, opacity): (LayerId, f32)) {
        self.opacity = opacity;
    }
}
