#![forbid(unsafe_code)]

//! Reversible changes to a [`Document`](crate::Document).
//!
//! | Change            | Kind                                  | Transient when          |
//! |-------------------|---------------------------------------|-------------------------|
//! | `ResizeCanvas`    | one-shot                              | size unchanged          |
//! | `CreateLayer`     | one-shot                              | never                   |
//! | `DeleteLayer`     | one-shot                              | never                   |
//! | `DrawPixels`      | one-shot, merges on the same layer    | no pixel changed        |
//! | `PenStroke`       | interactive                           | no pixel changed        |
//! | `ShiftLayer`      | interactive, interruptable            | offset is zero          |
//! | `SetLayerOpacity` | interactive, interruptable, merges    | opacity back at start   |

mod create_layer;
mod delete_layer;
mod draw_pixels;
mod pen_stroke;
mod resize_canvas;
mod set_layer_opacity;
mod shift_layer;

pub use create_layer::CreateLayer;
pub use delete_layer::DeleteLayer;
pub use draw_pixels::DrawPixels;
pub use pen_stroke::{PenParams, PenStroke, stroke_pixels};
pub use resize_canvas::ResizeCanvas;
pub use set_layer_opacity::SetLayerOpacity;
pub use shift_layer::ShiftLayer;

use pxdoc_history::ChangeInfos;

use crate::info::ChangeInfo;

pub(crate) type Infos = ChangeInfos<ChangeInfo>;
