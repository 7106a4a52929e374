//! Scale normalization
//!
//! Tracks a slow-moving palm-width baseline so the current frame can be
//! judged as too far, too close, or at a good working distance.

use serde::{Deserialize, Serialize};

use crate::hand::{ProjectedHand, MIN_DIVISOR_PX};
use crate::types::{PixelPoint, INDEX_MCP, PINKY_MCP};

/// Weight of the previous baseline in the EMA update
const BASELINE_RETAIN: f64 = 0.98;

/// Below this factor the hand is considered far from the camera
pub const FAR_FACTOR: f64 = 0.75;

/// Above this factor the hand is considered close to the camera
pub const CLOSE_FACTOR: f64 = 1.3;

/// Distance classification relative to the running baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleStatus {
    Far,
    Good,
    Close,
}

impl ScaleStatus {
    pub fn from_factor(factor: f64) -> Self {
        if factor < FAR_FACTOR {
            ScaleStatus::Far
        } else if factor > CLOSE_FACTOR {
            ScaleStatus::Close
        } else {
            ScaleStatus::Good
        }
    }
}

/// Palm-width baseline carried between frames
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScaleState {
    baseline_px: Option<f64>,
}

impl ScaleState {
    pub fn baseline_px(&self) -> Option<f64> {
        self.baseline_px
    }
}

/// Scale reading for one frame
#[derive(Debug, Clone, Serialize)]
pub struct ScaleReading {
    pub palm_width_px: f64,
    pub baseline_px: f64,
    pub factor: f64,
    pub status: ScaleStatus,
    pub palm_center: PixelPoint,
    pub palm_line: (PixelPoint, PixelPoint),
}

pub struct ScaleNormalizationEngine;

impl ScaleNormalizationEngine {
    /// Fold the frame's palm width into the baseline and classify it
    pub fn update(state: &mut ScaleState, hand: &ProjectedHand) -> ScaleReading {
        let width = hand.palm_width_px;
        let baseline = match state.baseline_px {
            Some(prev) => prev * BASELINE_RETAIN + width * (1.0 - BASELINE_RETAIN),
            None => width,
        };
        state.baseline_px = Some(baseline);

        let factor = width / baseline.max(MIN_DIVISOR_PX);

        ScaleReading {
            palm_width_px: width,
            baseline_px: baseline,
            factor,
            status: ScaleStatus::from_factor(factor),
            palm_center: hand.palm_center,
            palm_line: (hand.points[INDEX_MCP], hand.points[PINKY_MCP]),
        }
    }
}
