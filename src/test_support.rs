//! Synthetic hand fixtures shared by the unit tests

use crate::hand::ProjectedHand;
use crate::types::{Landmark, LandmarkFrame, PixelPoint, Viewport};

pub const VIEW_W: f64 = 640.0;
pub const VIEW_H: f64 = 480.0;

/// Front-facing open hand, palm width exactly 150 px on a 640x480 surface
pub const OPEN_HAND_PX: [(f64, f64); 21] = [
    (320.0, 420.0),
    (270.0, 400.0),
    (235.0, 370.0),
    (210.0, 345.0),
    (190.0, 320.0),
    (245.0, 300.0),
    (240.0, 240.0),
    (237.0, 205.0),
    (235.0, 175.0),
    (295.0, 290.0),
    (293.0, 230.0),
    (292.0, 190.0),
    (291.0, 160.0),
    (345.0, 292.0),
    (347.0, 230.0),
    (349.0, 195.0),
    (350.0, 165.0),
    (395.0, 300.0),
    (400.0, 250.0),
    (403.0, 222.0),
    (405.0, 198.0),
];

pub fn viewport() -> Viewport {
    Viewport {
        width: VIEW_W,
        height: VIEW_H,
        mirror_x: false,
    }
}

pub fn open_hand_px() -> Vec<(f64, f64)> {
    OPEN_HAND_PX.to_vec()
}

/// Build a frame from pixel coordinates on the fixture viewport
pub fn frame_from_px(timestamp_ms: u64, px: &[(f64, f64)]) -> LandmarkFrame {
    let landmarks = px
        .iter()
        .map(|&(x, y)| Landmark::new(x / VIEW_W, y / VIEW_H))
        .collect();
    LandmarkFrame::new(timestamp_ms, landmarks)
}

pub fn open_hand_frame(timestamp_ms: u64) -> LandmarkFrame {
    frame_from_px(timestamp_ms, &OPEN_HAND_PX)
}

/// Project pixel coordinates directly, bypassing normalization
pub fn hand_from_px(timestamp_ms: u64, px: &[(f64, f64)]) -> ProjectedHand {
    let points = px.iter().map(|&(x, y)| PixelPoint::new(x, y)).collect();
    ProjectedHand::from_points(timestamp_ms, points, None).unwrap()
}

pub fn open_hand(timestamp_ms: u64) -> ProjectedHand {
    hand_from_px(timestamp_ms, &OPEN_HAND_PX)
}

/// Translate every landmark
pub fn shifted(px: &[(f64, f64)], dx: f64, dy: f64) -> Vec<(f64, f64)> {
    px.iter().map(|&(x, y)| (x + dx, y + dy)).collect()
}

/// Scale the hand about the wrist
pub fn scaled(px: &[(f64, f64)], factor: f64) -> Vec<(f64, f64)> {
    let (wx, wy) = px[0];
    px.iter()
        .map(|&(x, y)| (wx + (x - wx) * factor, wy + (y - wy) * factor))
        .collect()
}
