#![forbid(unsafe_code)]

use std::any::Any;

use pxdoc_history::{AppliedChange, ApplyPhase, Change, ChangeInfos};

use super::Infos;
use crate::color::Color;
use crate::document::{Document, LayerId, PixelSnapshot};
use crate::geometry::VecI;
use crate::info::ChangeInfo;

/// Paint (or erase) a set of pixels on one layer.
///
/// Successive draws on the same layer merge into one undo step.
#[derive(Debug)]
pub struct DrawPixels {
    layer: LayerId,
    pixels: Vec<VecI>,
    color: Option<Color>,
    snapshot: Option<PixelSnapshot>,
}

impl DrawPixels {
    #[must_use]
    pub fn new(layer: LayerId, pixels: impl IntoIterator<Item = VecI>, color: Color) -> Self {
        Self {
            layer,
            pixels: pixels.into_iter().collect(),
            color: Some(color),
            snapshot: None,
        }
    }

    /// Make the pixels transparent.
    #[must_use]
    pub fn erase(layer: LayerId, pixels: impl IntoIterator<Item = VecI>) -> Self {
        Self {
            layer,
            pixels: pixels.into_iter().collect(),
            color: None,
            snapshot: None,
        }
    }

    #[must_use]
    pub fn layer(&self) -> LayerId {
        self.layer
    }
}

impl Change<Document, ChangeInfo> for DrawPixels {
    fn initialize_and_validate(&mut self, document: &Document) -> bool {
        !self.pixels.is_empty() && document.has_layer(self.layer)
    }

    fn apply(&mut self, document: &mut Document, _phase: ApplyPhase) -> AppliedChange<ChangeInfo> {
        let bounds = document.bounds();
        let Some(layer) = document.layer_mut(self.layer) else {
            return AppliedChange::transient(ChangeInfos::none());
        };
        let color = self.color;
        let snapshot = layer.write_pixels(
            self.pixels
                .iter()
                .filter(|&&pos| bounds.contains(pos))
                .map(|&pos| (pos, color)),
        );
        if snapshot.is_empty() {
            return AppliedChange::transient(ChangeInfos::none());
        }
        let info = ChangeInfo::pixels(self.layer, snapshot.bounds());
        self.snapshot = Some(snapshot);
        AppliedChange::recorded(ChangeInfos::from_option(info))
    }

    fn revert(&mut self, document: &mut Document) -> Infos {
        let (Some(snapshot), Some(layer)) = (&self.snapshot, document.layer_mut(self.layer)) else {
            return ChangeInfos::none();
        };
        ChangeInfos::from_option(ChangeInfo::pixels(self.layer, snapshot.restore(layer)))
    }

    fn is_mergeable_with(&self, other: &dyn Change<Document, ChangeInfo>) -> bool {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| other.layer == self.layer)
    }

    fn description(&self) -> &str {
        if self.color.is_some() { "Draw" } else { "Erase" }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Layer;
    use crate::geometry::RectI;

    fn doc() -> Document {
        let mut doc = Document::new(VecI::new(4, 4));
        doc.insert_layer(0, Layer::new(LayerId(1), "a"));
        doc.insert_layer(1, Layer::new(LayerId(2), "b"));
        doc
    }

    #[test]
    fn draws_inside_canvas_only() {
        let mut doc = doc();
        let mut change = DrawPixels::new(
            LayerId(1),
            [VecI::new(1, 1), VecI::new(9, 9)],
            Color::BLACK,
        );
        assert!(change.initialize_and_validate(&doc));
        let applied = change.apply(&mut doc, ApplyPhase::First);
        assert!(applied.record_in_history);
        assert_eq!(
            applied.infos.into_vec(),
            vec![ChangeInfo::LayerPixels {
                layer: LayerId(1),
                area: RectI::new(VecI::new(1, 1), VecI::new(1, 1)),
            }]
        );
        assert_eq!(doc.layer(LayerId(1)).map(Layer::pixel_count), Some(1));

        change.revert(&mut doc);
        assert_eq!(doc.layer(LayerId(1)).map(Layer::pixel_count), Some(0));
    }

    #[test]
    fn unchanged_pixels_are_transient() {
        let mut doc = doc();
        let mut change = DrawPixels::erase(LayerId(1), [VecI::new(0, 0)]);
        assert!(change.initialize_and_validate(&doc));
        assert!(!change.apply(&mut doc, ApplyPhase::First).record_in_history);
    }

    #[test]
    fn merges_on_same_layer_only() {
        let a = DrawPixels::new(LayerId(1), [VecI::ZERO], Color::BLACK);
        let b = DrawPixels::erase(LayerId(1), [VecI::ZERO]);
        let c = DrawPixels::new(LayerId(2), [VecI::ZERO], Color::BLACK);
        assert!(a.is_mergeable_with(&b));
        assert!(!a.is_mergeable_with(&c));
    }

    #[test]
    fn validation_requires_layer_and_pixels() {
        let doc = doc();
        assert!(!DrawPixels::new(LayerId(7), [VecI::ZERO], Color::BLACK).initialize_and_validate(&doc));
        assert!(!DrawPixels::new(LayerId(1), [], Color::BLACK).initialize_and_validate(&doc));
    }
}
