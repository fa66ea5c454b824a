#![forbid(unsafe_code)]

//! Freehand pen stroke.
//!
//! Input points are joined with Bresenham lines. While the stroke is in
//! progress each new segment is drawn into the layer's preview. Finalizing
//! discards the preview and redraws the whole stroke from its points, which
//! is also how redo re-applies it.
//!
//! With `pixel_perfect` set, L-shaped corners (a pixel with one orthogonal
//! neighbour on each side along the path) are removed so diagonal runs stay
//! one pixel thin.

use std::any::Any;

use pxdoc_history::{
    AppliedChange, ApplyPhase, Change, ChangeInfos, InteractiveChange, UpdateableChange,
};

use super::Infos;
use crate::LOG_TARGET;
use crate::color::Color;
use crate::document::{Document, LayerId, PixelSnapshot};
use crate::geometry::{RectI, VecI, bresenham_line};
use crate::info::ChangeInfo;

/// Parameters of a pen stroke request. Updates only read `pos`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenParams {
    pub layer: LayerId,
    pub color: Color,
    pub pixel_perfect: bool,
    pub pos: VecI,
}

/// Pixel path of a stroke, built one input point at a time.
#[derive(Debug, Default)]
struct StrokePath {
    pixels: Vec<VecI>,
    pixel_perfect: bool,
}

impl StrokePath {
    fn new(pixel_perfect: bool) -> Self {
        Self {
            pixels: Vec::new(),
            pixel_perfect,
        }
    }

    /// Extend the path to `point`. Pixels added, and corners removed, are
    /// appended to the two output lists.
    fn extend_to(&mut self, point: VecI, added: &mut Vec<VecI>, removed: &mut Vec<VecI>) {
        let segment = match self.pixels.last() {
            Some(&last) => bresenham_line(last, point),
            None => vec![point],
        };
        let skip = usize::from(!self.pixels.is_empty());
        for pixel in segment.into_iter().skip(skip) {
            self.pixels.push(pixel);
            added.push(pixel);
            if self.pixel_perfect && self.ends_in_l_corner() {
                let corner = self.pixels.remove(self.pixels.len() - 2);
                removed.push(corner);
            }
        }
    }

    fn ends_in_l_corner(&self) -> bool {
        let [.., a, b, c] = self.pixels[..] else {
            return false;
        };
        a.x != c.x && a.y != c.y && (b - a).taxicab_length() == 1 && (b - c).taxicab_length() == 1
    }
}

/// Pixels covered by a stroke through `points`.
#[must_use]
pub fn stroke_pixels(points: &[VecI], pixel_perfect: bool) -> Vec<VecI> {
    let mut path = StrokePath::new(pixel_perfect);
    let (mut added, mut removed) = (Vec::new(), Vec::new());
    for &point in points {
        path.extend_to(point, &mut added, &mut removed);
    }
    path.pixels
}

/// Interactive freehand stroke on one layer.
#[derive(Debug)]
pub struct PenStroke {
    layer: LayerId,
    color: Color,
    points: Vec<VecI>,
    previewed: usize,
    preview_path: StrokePath,
    snapshot: Option<PixelSnapshot>,
}

impl PenStroke {
    /// Input points received so far.
    #[must_use]
    pub fn points(&self) -> &[VecI] {
        &self.points
    }

    fn pixel_info(&self, area: Option<RectI>) -> Infos {
        ChangeInfos::from_option(ChangeInfo::pixels(self.layer, area))
    }
}

impl Change<Document, ChangeInfo> for PenStroke {
    fn initialize_and_validate(&mut self, document: &Document) -> bool {
        document.has_layer(self.layer)
    }

    fn apply(&mut self, document: &mut Document, phase: ApplyPhase) -> AppliedChange<ChangeInfo> {
        let bounds = document.bounds();
        let Some(layer) = document.layer_mut(self.layer) else {
            return AppliedChange::transient(ChangeInfos::none());
        };

        // Stroke bounds cover any preview overlay; all phases report them.
        layer.cancel_preview();
        let pixels = stroke_pixels(&self.points, self.preview_path.pixel_perfect);
        let inside: Vec<VecI> = pixels.iter().copied().filter(|&p| bounds.contains(p)).collect();
        let area = RectI::bounding(inside.iter().copied());
        let color = Some(self.color);
        let snapshot = layer.write_pixels(inside.into_iter().map(|p| (p, color)));
        if phase != ApplyPhase::Redo {
            tracing::debug!(
                target: LOG_TARGET,
                layer = %self.layer,
                points = self.points.len(),
                pixels = pixels.len(),
                changed = snapshot.len(),
                pixel_perfect = self.preview_path.pixel_perfect,
                "pen stroke finalized"
            );
        }

        let infos = self.pixel_info(area);
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
        let area = snapshot.restore(layer);
        self.pixel_info(area)
    }

    fn description(&self) -> &str {
        "Pen stroke"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl UpdateableChange<Document, ChangeInfo> for PenStroke {
    fn apply_temporarily(&mut self, document: &mut Document) -> Infos {
        let bounds = document.bounds();
        let Some(layer) = document.layer_mut(self.layer) else {
            return ChangeInfos::none();
        };
        layer.begin_preview();

        let (mut added, mut removed) = (Vec::new(), Vec::new());
        for &point in &self.points[self.previewed..] {
            self.preview_path.extend_to(point, &mut added, &mut removed);
        }
        self.previewed = self.points.len();

        for &pixel in added.iter().filter(|&&p| bounds.contains(p)) {
            layer.preview_pixel(pixel, Some(self.color));
        }
        for &corner in &removed {
            if !self.preview_path.pixels.contains(&corner) {
                layer.reset_preview_pixel(corner);
            }
        }

        let area = RectI::bounding(added.into_iter().chain(removed))
            .and_then(|area| area.intersect(&bounds));
        self.pixel_info(area)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_change(self: Box<Self>) -> Box<dyn Change<Document, ChangeInfo>> {
        self
    }
}

impl InteractiveChange<Document, ChangeInfo> for PenStroke {
    type Params = PenParams;

    fn start(params: &PenParams) -> Self {
        Self {
            layer: params.layer,
            color: params.color,
            points: vec![params.pos],
            previewed: 0,
            preview_path: StrokePath::new(params.pixel_perfect),
            snapshot: None,
        }
    }

    fn update(&mut self, params: PenParams) {
        if self.points.last() != Some(&params.pos) {
            self.points.push(params.pos);
        }
    }
}
