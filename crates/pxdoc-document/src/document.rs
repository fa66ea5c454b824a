#![forbid(unsafe_code)]

//! Document model: a canvas of ordered raster layers.
//!
//! Pixels are stored sparsely; an absent pixel is transparent. A layer may
//! carry a preview overlay: the up-to-date state shown while an interactive
//! change is in progress, which is either committed into the layer or
//! cancelled.

use std::collections::BTreeMap;
use std::fmt;

use crate::color::Color;
use crate::geometry::{RectI, VecI};

/// Stable identity of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Previous values of the pixels a change overwrote.
///
/// `None` means the pixel was transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSnapshot {
    layer: LayerId,
    pixels: BTreeMap<VecI, Option<Color>>,
}

impl PixelSnapshot {
    #[must_use]
    pub fn new(layer: LayerId) -> Self {
        Self {
            layer,
            pixels: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Remember `previous` for `pos`. The first value recorded wins.
    pub fn record(&mut self, pos: VecI, previous: Option<Color>) {
        self.pixels.entry(pos).or_insert(previous);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Area covered by the recorded pixels.
    #[must_use]
    pub fn bounds(&self) -> Option<RectI> {
        RectI::bounding(self.pixels.keys().copied())
    }

    /// Write the recorded values back into `layer`.
    pub fn restore(&self, layer: &mut Layer) -> Option<RectI> {
        for (&pos, &color) in &self.pixels {
            layer.set_pixel(pos, color);
        }
        self.bounds()
    }
}

/// A raster layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    id: LayerId,
    name: String,
    opacity: f32,
    visible: bool,
    pixels: BTreeMap<VecI, Color>,
    preview: Option<BTreeMap<VecI, Option<Color>>>,
}

impl Layer {
    #[must_use]
    pub fn new(id: LayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            opacity: 1.0,
            visible: true,
            pixels: BTreeMap::new(),
            preview: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> LayerId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opacity in `0.0..=1.0`.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set opacity (clamped). Returns the previous value.
    pub fn set_opacity(&mut self, opacity: f32) -> f32 {
        std::mem::replace(&mut self.opacity, opacity.clamp(0.0, 1.0))
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Up-to-date pixel value, preview included.
    #[must_use]
    pub fn pixel(&self, pos: VecI) -> Option<Color> {
        match self.preview.as_ref().and_then(|p| p.get(&pos)) {
            Some(&overridden) => overridden,
            None => self.committed_pixel(pos),
        }
    }

    /// Committed pixel value, ignoring any preview.
    #[must_use]
    pub fn committed_pixel(&self, pos: VecI) -> Option<Color> {
        self.pixels.get(&pos).copied()
    }

    /// Committed, non-transparent pixels in position order.
    pub fn pixels(&self) -> impl Iterator<Item = (VecI, Color)> + '_ {
        self.pixels.iter().map(|(&pos, &color)| (pos, color))
    }

    /// Number of committed, non-transparent pixels.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Write a committed pixel. Returns the previous value.
    pub fn set_pixel(&mut self, pos: VecI, color: Option<Color>) -> Option<Color> {
        match color.filter(|c| !c.is_transparent()) {
            Some(color) => self.pixels.insert(pos, color),
            None => self.pixels.remove(&pos),
        }
    }

    /// Write committed pixels, recording what changed.
    pub fn write_pixels(
        &mut self,
        pixels: impl IntoIterator<Item = (VecI, Option<Color>)>,
    ) -> PixelSnapshot {
        let mut snapshot = PixelSnapshot::new(self.id);
        for (pos, color) in pixels {
            let color = color.filter(|c| !c.is_transparent());
            let previous = self.set_pixel(pos, color);
            if previous != color {
                snapshot.record(pos, previous);
            }
        }
        snapshot
    }

    // ========================================================================
    // Preview
    // ========================================================================

    #[must_use]
    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }

    /// Start an empty preview overlay if none exists.
    pub fn begin_preview(&mut self) {
        self.preview.get_or_insert_with(BTreeMap::new);
    }

    /// Override a pixel in the preview overlay.
    pub fn preview_pixel(&mut self, pos: VecI, color: Option<Color>) {
        self.preview
            .get_or_insert_with(BTreeMap::new)
            .insert(pos, color.filter(|c| !c.is_transparent()));
    }

    /// Drop a preview override so the committed value shows again.
    pub fn reset_preview_pixel(&mut self, pos: VecI) {
        if let Some(preview) = self.preview.as_mut() {
            preview.remove(&pos);
        }
    }

    /// Discard the preview. Returns the area it covered.
    pub fn cancel_preview(&mut self) -> Option<RectI> {
        let preview = self.preview.take()?;
        RectI::bounding(preview.into_keys())
    }

    /// Commit the preview into the layer, recording what changed.
    pub fn commit_preview(&mut self) -> PixelSnapshot {
        let preview = self.preview.take().unwrap_or_default();
        self.write_pixels(preview)
    }
}

/// A raster document: canvas size plus layers ordered bottom to top.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    size: VecI,
    layers: Vec<Layer>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(VecI::new(64, 64))
    }
}

impl Document {
    #[must_use]
    pub fn new(size: VecI) -> Self {
        Self {
            size,
            layers: Vec::new(),
        }
    }

    #[must_use]
    pub fn size(&self) -> VecI {
        self.size
    }

    pub(crate) fn set_size(&mut self, size: VecI) -> VecI {
        std::mem::replace(&mut self.size, size)
    }

    /// The canvas rectangle.
    #[must_use]
    pub fn bounds(&self) -> RectI {
        RectI::from_size(self.size)
    }

    /// Layers, bottom to top.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    #[must_use]
    pub fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    #[must_use]
    pub fn has_layer(&self, id: LayerId) -> bool {
        self.layer_index(id).is_some()
    }

    /// Insert a layer at `index` (clamped to the top).
    pub fn insert_layer(&mut self, index: usize, layer: Layer) -> usize {
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
        index
    }

    /// Remove a layer, returning its index and contents.
    pub fn remove_layer(&mut self, id: LayerId) -> Option<(usize, Layer)> {
        let index = self.layer_index(id)?;
        Some((index, self.layers.remove(index)))
    }

    pub(crate) fn layers_mut(&mut self) -> impl Iterator<Item = &mut Layer> {
        self.layers.iter_mut()
    }
}
