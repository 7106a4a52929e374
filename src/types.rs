//! Core data types for Handsight
//!
//! This module defines the landmark topology, the frame type handed in by the
//! external pose estimator, and the pixel-space projection seam.

use serde::{Deserialize, Serialize};

use crate::error::HandError;

/// Number of landmarks in one hand frame
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_TIP: usize = 20;

/// Fingertip landmark per finger, thumb first
pub const TIP_INDICES: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Joint chain (base → tip) per finger
pub const FINGER_CHAINS: [[usize; 4]; 5] = [
    [1, 2, 3, 4],
    [5, 6, 7, 8],
    [9, 10, 11, 12],
    [13, 14, 15, 16],
    [17, 18, 19, 20],
];

/// Landmarks averaged for the palm center
pub const PALM_CENTER_INDICES: [usize; 5] = [WRIST, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];

/// The 20 skeletal connections (parent → child)
pub const SKELETON_CONNECTIONS: [(usize, usize); 20] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (0, 9), (9, 10), (10, 11), (11, 12),
    (0, 13), (13, 14), (14, 15), (15, 16),
    (0, 17), (17, 18), (18, 19), (19, 20),
];

/// Finger identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Finger> {
        Self::ALL.get(idx).copied()
    }

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            Finger::Thumb => "Thumb",
            Finger::Index => "Index",
            Finger::Middle => "Middle",
            Finger::Ring => "Ring",
            Finger::Pinky => "Pinky",
        }
    }

    pub fn tip(self) -> usize {
        TIP_INDICES[self.index()]
    }

    pub fn chain(self) -> [usize; 4] {
        FINGER_CHAINS[self.index()]
    }
}

/// A normalized landmark as produced by the pose estimator (0-1 range on x/y)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A landmark projected into pixel space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// One frame of raw landmarks with its capture timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Monotonic capture time in milliseconds
    pub timestamp_ms: u64,
    /// Raw landmarks from the estimator
    pub landmarks: Vec<Landmark>,
    /// Optional temporally filtered landmarks for the same frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothed: Option<Vec<Landmark>>,
}

impl LandmarkFrame {
    pub fn new(timestamp_ms: u64, landmarks: Vec<Landmark>) -> Self {
        Self {
            timestamp_ms,
            landmarks,
            smoothed: None,
        }
    }

    pub fn with_smoothed(mut self, smoothed: Vec<Landmark>) -> Self {
        self.smoothed = Some(smoothed);
        self
    }
}

/// Maps a normalized landmark into pixel space.
///
/// Returning `None` marks the projection as failed; the frame is then
/// dropped without advancing any engine state.
pub trait Projector {
    fn project(&self, landmark: &Landmark) -> Option<PixelPoint>;
}

impl<F> Projector for F
where
    F: Fn(&Landmark) -> Option<PixelPoint>,
{
    fn project(&self, landmark: &Landmark) -> Option<PixelPoint> {
        self(landmark)
    }
}

/// Target surface the landmarks are drawn onto
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// Flip horizontally (selfie camera preview)
    #[serde(default)]
    pub mirror_x: bool,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Result<Self, HandError> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(HandError::InvalidViewport(format!("{width}x{height}")));
        }
        Ok(Self {
            width,
            height,
            mirror_x: false,
        })
    }

    pub fn mirrored(mut self) -> Self {
        self.mirror_x = true;
        self
    }
}

impl Projector for Viewport {
    fn project(&self, landmark: &Landmark) -> Option<PixelPoint> {
        if !landmark.is_finite() {
            return None;
        }
        let x = if self.mirror_x {
            (1.0 - landmark.x) * self.width
        } else {
            landmark.x * self.width
        };
        Some(PixelPoint::new(x, landmark.y * self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finger_topology() {
        for finger in Finger::ALL {
            assert_eq!(finger.chain()[3], finger.tip());
            assert_eq!(Finger::from_index(finger.index()), Some(finger));
        }
        assert_eq!(Finger::from_index(5), None);
    }

    #[test]
    fn test_viewport_projection() {
        let viewport = Viewport::new(640.0, 480.0).unwrap();
        let p = viewport.project(&Landmark::new(0.5, 0.25)).unwrap();
        assert_eq!(p, PixelPoint::new(320.0, 120.0));

        let mirrored = viewport.mirrored();
        let p = mirrored.project(&Landmark::new(0.25, 0.5)).unwrap();
        assert_eq!(p, PixelPoint::new(480.0, 240.0));
    }

    #[test]
    fn test_viewport_rejects_nan_landmark() {
        let viewport = Viewport::new(640.0, 480.0).unwrap();
        assert!(viewport.project(&Landmark::new(f64::NAN, 0.5)).is_none());
    }

    #[test]
    fn test_invalid_viewport() {
        assert!(Viewport::new(0.0, 480.0).is_err());
        assert!(Viewport::new(640.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_closure_projector() {
        let scale = |lm: &Landmark| Some(PixelPoint::new(lm.x * 100.0, lm.y * 100.0));
        let p = scale.project(&Landmark::new(0.1, 0.2)).unwrap();
        assert!((p.x - 10.0).abs() < 1e-9);
        assert!((p.y - 20.0).abs() < 1e-9);
    }
}
