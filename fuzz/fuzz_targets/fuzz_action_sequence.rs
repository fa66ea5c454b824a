#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pxdoc_document::changes::{
    CreateLayer, DeleteLayer, DrawPixels, PenParams, PenStroke, ResizeCanvas, SetLayerOpacity,
    ShiftLayer,
};
use pxdoc_document::{ChangeInfo, Color, Document, DocumentAction, DocumentTracker, Layer, LayerId, VecI};

#[derive(Debug, Arbitrary)]
enum Op {
    Draw { layer: u8, x: i8, y: i8 },
    Erase { layer: u8, x: i8, y: i8 },
    Pen { layer: u8, x: i8, y: i8, pixel_perfect: bool },
    EndPen,
    Shift { layer: u8, dx: i8, dy: i8 },
    EndShift,
    Opacity { layer: u8, value: u8 },
    EndOpacity,
    Resize { w: u8, h: u8 },
    CreateLayer { layer: u8 },
    DeleteLayer { layer: u8 },
    Viewport,
    Undo,
    Redo,
    Boundary,
}

fn layer(id: u8) -> LayerId {
    LayerId(u32::from(id % 4))
}

fn pos(x: i8, y: i8) -> VecI {
    VecI::new(i32::from(x) / 4, i32::from(y) / 4)
}

fn action(op: &Op) -> DocumentAction {
    match *op {
        Op::Draw { layer: l, x, y } => {
            DocumentAction::make_change(DrawPixels::new(layer(l), [pos(x, y)], Color::BLACK))
        }
        Op::Erase { layer: l, x, y } => {
            DocumentAction::make_change(DrawPixels::erase(layer(l), [pos(x, y)]))
        }
        Op::Pen { layer: l, x, y, pixel_perfect } => {
            DocumentAction::start_or_update::<PenStroke>(PenParams {
                layer: layer(l),
                color: Color::WHITE,
                pixel_perfect,
                pos: pos(x, y),
            })
        }
        Op::EndPen => DocumentAction::end::<PenStroke>(),
        Op::Shift { layer: l, dx, dy } => {
            DocumentAction::start_or_update::<ShiftLayer>((layer(l), pos(dx, dy)))
        }
        Op::EndShift => DocumentAction::end::<ShiftLayer>(),
        Op::Opacity { layer: l, value } => {
            DocumentAction::start_or_update::<SetLayerOpacity>((layer(l), f32::from(value) / 255.0))
        }
        Op::EndOpacity => DocumentAction::end::<SetLayerOpacity>(),
        Op::Resize { w, h } => DocumentAction::make_change(ResizeCanvas::new(VecI::new(
            i32::from(w % 40),
            i32::from(h % 40),
        ))),
        Op::CreateLayer { layer: l } => {
            DocumentAction::make_change(CreateLayer::new(layer(l), "fuzz"))
        }
        Op::DeleteLayer { layer: l } => DocumentAction::make_change(DeleteLayer::new(layer(l))),
        Op::Viewport => DocumentAction::Passthrough(ChangeInfo::ViewportMoved {
            center: VecI::ZERO,
            zoom: 1.0,
        }),
        Op::Undo => DocumentAction::Undo,
        Op::Redo => DocumentAction::Redo,
        Op::Boundary => DocumentAction::ChangeBoundary,
    }
}

fuzz_target!(|batches: Vec<Vec<Op>>| {
    let mut start = Document::new(VecI::new(16, 16));
    start.insert_layer(0, Layer::new(LayerId(0), "base"));
    let tracker = DocumentTracker::new(start.clone());

    for batch in batches.iter().take(64) {
        let actions = batch.iter().take(64).map(action).collect();
        tracker.process_actions_sync(actions).expect("tracker is idle");
    }

    tracker
        .process_actions_sync(vec![
            DocumentAction::end::<PenStroke>(),
            DocumentAction::end::<ShiftLayer>(),
            DocumentAction::end::<SetLayerOpacity>(),
            DocumentAction::ChangeBoundary,
        ])
        .expect("tracker is idle");
    assert!(!tracker.has_active_change(), "active change survived end");
    assert!(!tracker.has_open_packet(), "packet survived boundary");

    let history = tracker.history();
    assert!(history.undo.iter().chain(&history.redo).all(|&len| len > 0));

    let undo = tracker.undo_depth();
    tracker
        .process_actions_sync((0..undo).map(|_| DocumentAction::Undo).collect())
        .expect("tracker is idle");
    assert!(!tracker.can_undo());
    let restored = tracker.with_document(Clone::clone).expect("not disposed");
    assert_eq!(restored, start, "undoing everything must restore the start");

    tracker.dispose().expect("tracker is idle");
    assert!(tracker.is_disposed());
});
