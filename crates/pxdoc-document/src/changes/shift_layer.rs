#![forbid(unsafe_code)]

use std::any::Any;

use pxdoc_history::{
    AppliedChange, ApplyPhase, Change, ChangeInfos, InteractiveChange, UpdateableChange,
};

use super::Infos;
use crate::color::Color;
use crate::document::{Document, Layer, LayerId, PixelSnapshot};
use crate::geometry::{RectI, VecI};
use crate::info::ChangeInfo;

/// Move a layer's pixels by an offset, cropping at the canvas edge.
///
/// Interruptable: a conflicting request finalizes it at the current offset.
#[derive(Debug)]
pub struct ShiftLayer {
    layer: LayerId,
    offset: VecI,
    snapshot: Option<PixelSnapshot>,
}

impl ShiftLayer {
    #[must_use]
    pub fn offset(&self) -> VecI {
        self.offset
    }
}

/// Writes that move every committed pixel of `layer` by `offset`: clear the
/// old positions, then paint the new ones inside `bounds`.
fn shifted(layer: &Layer, offset: VecI, bounds: RectI) -> Vec<(VecI, Option<Color>)> {
    let pixels: Vec<(VecI, Color)> = layer.pixels().collect();
    let cleared = pixels.iter().map(|&(pos, _)| (pos, None));
    let moved = pixels
        .iter()
        .map(|&(pos, color)| (pos + offset, Some(color)))
        .filter(|&(pos, _)| bounds.contains(pos));
    cleared.chain(moved).collect()
}

fn union(a: Option<RectI>, b: Option<RectI>) -> Option<RectI> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(&b)),
        (a, b) => a.or(b),
    }
}

impl Change<Document, ChangeInfo> for ShiftLayer {
    fn initialize_and_validate(&mut self, document: &Document) -> bool {
        document.has_layer(self.layer)
    }

    fn apply(&mut self, document: &mut Document, _phase: ApplyPhase) -> AppliedChange<ChangeInfo> {
        let bounds = document.bounds();
        let Some(layer) = document.layer_mut(self.layer) else {
            return AppliedChange::transient(ChangeInfos::none());
        };
        let previewed = layer.cancel_preview();
        if self.offset == VecI::ZERO {
            return AppliedChange::transient(ChangeInfos::from_option(ChangeInfo::pixels(
                self.layer, previewed,
            )));
        }

        let writes = shifted(layer, self.offset, bounds);
        let snapshot = layer.write_pixels(writes);
        let infos = ChangeInfos::from_option(ChangeInfo::pixels(
            self.layer,
            union(previewed, snapshot.bounds()),
        ));
        if snapshot.is_empty() {
            return AppliedChange::transient(infos);
        }
        self.snapshot = Some(snapshot);
        AppliedChange::recorded(infos)
    }

    fn revert(&mut self, document: &mut Document) -> Infos {
        let (Some(snapshot), Some(layer)) = (&self.snapshot, document.layer_mut(self.layer)) else {
            return ChangeInfos::none();
        };
        ChangeInfos::from_option(ChangeInfo::pixels(self.layer, snapshot.restore(layer)))
    }

    fn description(&self) -> &str {
        "Shift layer"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl UpdateableChange<Document, ChangeInfo> for ShiftLayer {
    fn apply_temporarily(&mut self, document: &mut Document) -> Infos {
        let bounds = document.bounds();
        let Some(layer) = document.layer_mut(self.layer) else {
            return ChangeInfos::none();
        };
        let previous = layer.cancel_preview();
        layer.begin_preview();
        let writes = shifted(layer, self.offset, bounds);
        let area = RectI::bounding(writes.iter().map(|&(pos, _)| pos));
        for (pos, color) in writes {
            layer.preview_pixel(pos, color);
        }
        ChangeInfos::from_option(ChangeInfo::pixels(self.layer, union(previous, area)))
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

impl InteractiveChange<Document, ChangeInfo> for ShiftLayer {
    type Params = (LayerId, VecI);

    fn start(&(layer, offset): &(LayerId, VecI)) -> Self {
        Self {
            layer,
            offset,
            snapshot: None,
        }
    }

    fn update(&mut self, (_, offset): (LayerId, VecI)) {
        self.offset = offset;
    }
}
