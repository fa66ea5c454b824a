#![forbid(unsafe_code)]

use std::any::Any;

use pxdoc_history::{AppliedChange, ApplyPhase, Change, ChangeInfos};

use super::Infos;
use crate::LOG_TARGET;
use crate::document::{Document, PixelSnapshot};
use crate::geometry::{RectI, VecI};
use crate::info::ChangeInfo;

/// Resize the canvas, anchored at the top-left corner.
///
/// Pixels falling outside a smaller canvas are cropped and restored on revert.
#[derive(Debug)]
pub struct ResizeCanvas {
    new_size: VecI,
    original_size: VecI,
    cropped: Vec<PixelSnapshot>,
}

impl ResizeCanvas {
    #[must_use]
    pub fn new(size: VecI) -> Self {
        Self {
            new_size: size,
            original_size: VecI::ZERO,
            cropped: Vec::new(),
        }
    }
}

impl Change<Document, ChangeInfo> for ResizeCanvas {
    fn initialize_and_validate(&mut self, document: &Document) -> bool {
        if !self.new_size.is_positive() {
            return false;
        }
        self.original_size = document.size();
        true
    }

    fn apply(&mut self, document: &mut Document, _phase: ApplyPhase) -> AppliedChange<ChangeInfo> {
        if self.new_size == self.original_size {
            return AppliedChange::transient(ChangeInfos::none());
        }

        let bounds = RectI::from_size(self.new_size);
        self.cropped.clear();
        for layer in document.layers_mut() {
            let outside: Vec<VecI> = layer
                .pixels()
                .map(|(pos, _)| pos)
                .filter(|&pos| !bounds.contains(pos))
                .collect();
            if !outside.is_empty() {
                self.cropped
                    .push(layer.write_pixels(outside.into_iter().map(|pos| (pos, None))));
            }
        }
        document.set_size(self.new_size);

        tracing::debug!(
            target: LOG_TARGET,
            from = ?self.original_size,
            to = ?self.new_size,
            cropped = self.cropped.iter().map(PixelSnapshot::len).sum::<usize>(),
            "canvas resized"
        );
        AppliedChange::recorded(ChangeInfos::single(ChangeInfo::Size {
            size: self.new_size,
        }))
    }

    fn revert(&mut self, document: &mut Document) -> Infos {
        document.set_size(self.original_size);
        for snapshot in &self.cropped {
            if let Some(layer) = document.layer_mut(snapshot.layer()) {
                snapshot.restore(layer);
            }
        }
        ChangeInfos::single(ChangeInfo::Size {
            size: self.original_size,
        })
    }

    fn description(&self) -> &str {
        "Resize canvas"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::document::{Layer, LayerId};

    fn document_with_corner_pixel() -> Document {
        let mut doc = Document::new(VecI::new(8, 8));
        let mut layer = Layer::new(LayerId(1), "bg");
        layer.set_pixel(VecI::new(7, 7), Some(Color::BLACK));
        layer.set_pixel(VecI::new(1, 1), Some(Color::WHITE));
        doc.insert_layer(0, layer);
        doc
    }

    #[test]
    fn rejects_empty_size() {
        let doc = Document::new(VecI::new(4, 4));
        assert!(!ResizeCanvas::new(VecI::new(0, 4)).initialize_and_validate(&doc));
        assert!(!ResizeCanvas::new(VecI::new(4, -1)).initialize_and_validate(&doc));
    }

    #[test]
    fn same_size_is_transient() {
        let mut doc = Document::new(VecI::new(4, 4));
        let mut change = ResizeCanvas::new(VecI::new(4, 4));
        assert!(change.initialize_and_validate(&doc));
        let applied = change.apply(&mut doc, ApplyPhase::First);
        assert!(!applied.record_in_history);
        assert!(applied.infos.is_empty());
    }

    #[test]
    fn shrinking_crops_and_revert_restores() {
        let mut doc = document_with_corner_pixel();
        let mut change = ResizeCanvas::new(VecI::new(4, 4));
        assert!(change.initialize_and_validate(&doc));

        let applied = change.apply(&mut doc, ApplyPhase::First);
        assert!(applied.record_in_history);
        assert_eq!(doc.size(), VecI::new(4, 4));
        assert_eq!(doc.layers()[0].pixel_count(), 1);

        let infos = change.revert(&mut doc);
        assert_eq!(
            infos.into_vec(),
            vec![ChangeInfo::Size {
                size: VecI::new(8, 8)
            }]
        );
        assert_eq!(doc, document_with_corner_pixel());
    }
}
