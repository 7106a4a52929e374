//! Pixel-space view of one landmark frame
//!
//! Every engine consumes the same `ProjectedHand`: raw points, optional
//! smoothed points, and the shared scale measurements derived from them.

use serde::Serialize;

use crate::error::HandError;
use crate::geometry::{centroid, distance};
use crate::types::{
    Finger, Landmark, LandmarkFrame, PixelPoint, Projector, INDEX_MCP, LANDMARK_COUNT, MIDDLE_TIP,
    PALM_CENTER_INDICES, PINKY_MCP, WRIST,
};

/// Smallest divisor used for any palm-width or length ratio
pub const MIN_DIVISOR_PX: f64 = 1.0;

/// One frame projected into pixel space, plus shared measurements
#[derive(Debug, Clone, Serialize)]
pub struct ProjectedHand {
    /// Frame timestamp in milliseconds
    pub timestamp_ms: u64,
    /// Raw landmark positions in pixels
    pub points: Vec<PixelPoint>,
    /// Smoothed landmark positions in pixels, when supplied and complete
    pub smoothed: Option<Vec<PixelPoint>>,
    /// Distance between index MCP and pinky MCP
    pub palm_width_px: f64,
    /// Distance between wrist and middle fingertip
    pub hand_length_px: f64,
    /// Mean of wrist and the four MCP joints
    pub palm_center: PixelPoint,
}

impl ProjectedHand {
    /// Project a frame, rejecting short frames and failed projections
    pub fn from_frame<P: Projector + ?Sized>(
        frame: &LandmarkFrame,
        projector: &P,
    ) -> Result<Self, HandError> {
        if frame.landmarks.len() < LANDMARK_COUNT {
            return Err(HandError::LandmarkCount {
                expected: LANDMARK_COUNT,
                actual: frame.landmarks.len(),
            });
        }

        let points = project_all(&frame.landmarks[..LANDMARK_COUNT], projector)?;

        // A partial or unprojectable smoothed stream is simply ignored
        let smoothed = frame
            .smoothed
            .as_ref()
            .filter(|s| s.len() >= LANDMARK_COUNT)
            .and_then(|s| project_all(&s[..LANDMARK_COUNT], projector).ok());

        Self::from_points(frame.timestamp_ms, points, smoothed)
    }

    /// Build from already projected points.
    ///
    /// Fewer than 21 points is an error; a short smoothed set is dropped.
    pub fn from_points(
        timestamp_ms: u64,
        points: Vec<PixelPoint>,
        smoothed: Option<Vec<PixelPoint>>,
    ) -> Result<Self, HandError> {
        if points.len() < LANDMARK_COUNT {
            return Err(HandError::LandmarkCount {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        let smoothed = smoothed.filter(|s| s.len() >= LANDMARK_COUNT);

        let palm_width_px = distance(points[INDEX_MCP], points[PINKY_MCP]);
        let hand_length_px = distance(points[WRIST], points[MIDDLE_TIP]);
        let palm_pts: Vec<PixelPoint> = PALM_CENTER_INDICES.iter().map(|&i| points[i]).collect();
        let palm_center = centroid(&palm_pts).unwrap_or_default();

        Ok(Self {
            timestamp_ms,
            points,
            smoothed,
            palm_width_px,
            hand_length_px,
            palm_center,
        })
    }

    /// Palm width floored for use as a divisor
    pub fn palm_divisor(&self) -> f64 {
        self.palm_width_px.max(MIN_DIVISOR_PX)
    }

    /// Palm width over hand length
    pub fn width_to_length_ratio(&self) -> f64 {
        self.palm_width_px / self.hand_length_px.max(MIN_DIVISOR_PX)
    }

    pub fn tip(&self, finger: Finger) -> PixelPoint {
        self.points[finger.tip()]
    }

    pub fn tips(&self) -> [PixelPoint; 5] {
        Finger::ALL.map(|f| self.tip(f))
    }

    /// Summed bone length along a finger's chain, in pixels
    pub fn finger_length_px(&self, finger: Finger) -> f64 {
        let chain = finger.chain();
        chain
            .windows(2)
            .map(|w| distance(self.points[w[0]], self.points[w[1]]))
            .sum()
    }

    /// Finger length normalized by palm width
    pub fn finger_length_ratio(&self, finger: Finger) -> f64 {
        self.finger_length_px(finger) / self.palm_divisor()
    }
}

fn project_all<P: Projector + ?Sized>(
    landmarks: &[Landmark],
    projector: &P,
) -> Result<Vec<PixelPoint>, HandError> {
    landmarks
        .iter()
        .enumerate()
        .map(|(idx, lm)| {
            projector
                .project(lm)
                .filter(|p| p.x.is_finite() && p.y.is_finite())
                .ok_or(HandError::ProjectionFailed(idx))
        })
        .collect()
}
