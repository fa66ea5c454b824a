#![forbid(unsafe_code)]

//! Change descriptors: what a render or view layer must refresh.

use crate::document::LayerId;
use crate::geometry::{RectI, VecI};

/// Observable effect of a change, emitted by the tracker in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeInfo {
    /// Canvas size changed.
    Size { size: VecI },
    /// A layer appeared at `index`.
    LayerCreated { layer: LayerId, index: usize },
    /// A layer was removed.
    LayerDeleted { layer: LayerId },
    /// Pixels inside `area` of a layer changed (committed or previewed).
    LayerPixels { layer: LayerId, area: RectI },
    /// Layer opacity changed.
    LayerOpacity { layer: LayerId, opacity: f32 },
    /// The viewport moved. Never produced by a change; forwarded as a
    /// pass-through action.
    ViewportMoved { center: VecI, zoom: f32 },
}

impl ChangeInfo {
    /// Layer this descriptor concerns, if any.
    #[must_use]
    pub fn layer(&self) -> Option<LayerId> {
        match *self {
            Self::LayerCreated { layer, .. }
            | Self::LayerDeleted { layer }
            | Self::LayerPixels { layer, .. }
            | Self::LayerOpacity { layer, .. } => Some(layer),
            Self::Size { .. } | Self::ViewportMoved { .. } => None,
        }
    }

    /// Pixel descriptor for `area`, if any area was touched.
    pub(crate) fn pixels(layer: LayerId, area: Option<RectI>) -> Option<Self> {
        area.map(|area| Self::LayerPixels { layer, area })
    }
}
