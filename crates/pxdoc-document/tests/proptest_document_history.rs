#![forbid(unsafe_code)]

//! Property tests: document edits through the tracker.
//!
//! 1. Undoing everything restores the starting document.
//! 2. Redoing everything afterwards reproduces the edited document.
//! 3. Stroke rasterization is 8-connected and keeps its endpoints; without
//!    pixel-perfect corner removal it visits every input point.
//!
//! Run:
//!   cargo test -p pxdoc-document --test proptest_document_history

use proptest::prelude::*;

use pxdoc_document::changes::{
    DrawPixels, ResizeCanvas, SetLayerOpacity, ShiftLayer, stroke_pixels,
};
use pxdoc_document::{Color, Document, DocumentAction, DocumentTracker, Layer, LayerId, VecI};

const INK: LayerId = LayerId(7);

#[derive(Debug, Clone)]
enum Edit {
    Draw(i32, i32),
    Erase(i32, i32),
    Shift(i32, i32),
    Opacity(u8),
    Resize(i32, i32),
    Boundary,
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => (0..24i32, 0..24i32).prop_map(|(x, y)| Edit::Draw(x, y)),
        1 => (0..24i32, 0..24i32).prop_map(|(x, y)| Edit::Erase(x, y)),
        1 => (-3..4i32, -3..4i32).prop_map(|(x, y)| Edit::Shift(x, y)),
        1 => any::<u8>().prop_map(Edit::Opacity),
        1 => (1..32i32, 1..32i32).prop_map(|(w, h)| Edit::Resize(w, h)),
        3 => Just(Edit::Boundary),
    ]
}

fn actions(edit: &Edit) -> Vec<DocumentAction> {
    let pos = |x, y| [VecI::new(x, y)];
    match *edit {
        Edit::Draw(x, y) => vec![DocumentAction::make_change(DrawPixels::new(
            INK,
            pos(x, y),
            Color::rgb(x as u8, y as u8, 9),
        ))],
        Edit::Erase(x, y) => vec![DocumentAction::make_change(DrawPixels::erase(INK, pos(x, y)))],
        Edit::Shift(x, y) => vec![
            DocumentAction::start_or_update::<ShiftLayer>((INK, VecI::new(x, y))),
            DocumentAction::end::<ShiftLayer>(),
        ],
        Edit::Opacity(o) => vec![
            DocumentAction::start_or_update::<SetLayerOpacity>((INK, f32::from(o) / 255.0)),
            DocumentAction::end::<SetLayerOpacity>(),
        ],
        Edit::Resize(w, h) => vec![DocumentAction::make_change(ResizeCanvas::new(VecI::new(w, h)))],
        Edit::Boundary => vec![DocumentAction::ChangeBoundary],
    }
}

fn baseline() -> Document {
    let mut doc = Document::new(VecI::new(24, 24));
    let mut layer = Layer::new(INK, "ink");
    layer.set_pixel(VecI::new(5, 5), Some(Color::WHITE));
    doc.insert_layer(0, layer);
    doc
}

fn snapshot(tracker: &DocumentTracker) -> Document {
    tracker.with_document(Clone::clone).unwrap()
}

proptest! {
    #[test]
    fn undo_all_restores_and_redo_all_replays(edits in proptest::collection::vec(edit(), 1..40)) {
        let tracker = DocumentTracker::new(baseline());
        for edit in &edits {
            tracker.process_actions_sync(actions(edit)).unwrap();
        }
        tracker.process_actions_sync(vec![DocumentAction::ChangeBoundary]).unwrap();
        let edited = snapshot(&tracker);

        let depth = tracker.undo_depth();
        tracker.process_actions_sync((0..depth).map(|_| DocumentAction::Undo).collect()).unwrap();
        prop_assert!(!tracker.can_undo());
        prop_assert_eq!(snapshot(&tracker), baseline());

        tracker.process_actions_sync((0..depth).map(|_| DocumentAction::Redo).collect()).unwrap();
        prop_assert!(!tracker.can_redo());
        prop_assert_eq!(snapshot(&tracker), edited);
    }

    #[test]
    fn stroke_is_connected_and_covers_points(
        points in proptest::collection::vec((-16..16i32, -16..16i32), 1..12),
        pixel_perfect in any::<bool>(),
    ) {
        let points: Vec<VecI> = points.into_iter().map(VecI::from).collect();
        let pixels = stroke_pixels(&points, pixel_perfect);

        for pair in pixels.windows(2) {
            let step = pair[1] - pair[0];
            prop_assert!(step.x.abs() <= 1 && step.y.abs() <= 1, "gap at {:?}", pair);
        }
        prop_assert_eq!(pixels.first(), points.first());
        prop_assert_eq!(pixels.last(), points.last());
        if !pixel_perfect {
            for point in &points {
                prop_assert!(pixels.contains(point), "missing {:?}", point);
            }
        }
    }
}
