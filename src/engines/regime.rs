//! Orientation regime
//!
//! Single-frame front/sideways decision from the palm-width to hand-length
//! ratio. Consumers that need stability debounce it themselves.

use serde::{Deserialize, Serialize};

use crate::geometry::convex_hull;
use crate::hand::ProjectedHand;
use crate::types::{PixelPoint, INDEX_MCP, MIDDLE_MCP, PINKY_MCP, WRIST};

/// Below this ratio the hand is seen edge-on
pub const SIDEWAYS_RATIO: f64 = 0.35;

/// Below this ratio (and above sideways) the hand is rotating
pub const TRANSITION_RATIO: f64 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeMode {
    Front,
    Transition,
    Sideways,
}

impl RegimeMode {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < SIDEWAYS_RATIO {
            RegimeMode::Sideways
        } else if ratio < TRANSITION_RATIO {
            RegimeMode::Transition
        } else {
            RegimeMode::Front
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RegimeMode::Front => "FRONT-FACING",
            RegimeMode::Transition => "TRANSITION",
            RegimeMode::Sideways => "SIDEWAYS",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegimeReading {
    pub mode: RegimeMode,
    pub mode_label: &'static str,
    pub ratio: f64,
    pub palm_width_px: f64,
    pub hand_length_px: f64,
    pub palm_line: (PixelPoint, PixelPoint),
    pub palm_center: PixelPoint,
    /// Wrist → middle MCP direction
    pub orientation: PixelPoint,
    /// Convex hull of the five fingertips
    pub convex_hull: Vec<PixelPoint>,
}

pub struct RegimeSwitchingEngine;

impl RegimeSwitchingEngine {
    pub fn evaluate(hand: &ProjectedHand) -> RegimeReading {
        let ratio = hand.width_to_length_ratio();
        let mode = RegimeMode::from_ratio(ratio);
        let wrist = hand.points[WRIST];
        let middle = hand.points[MIDDLE_MCP];

        RegimeReading {
            mode,
            mode_label: mode.label(),
            ratio,
            palm_width_px: hand.palm_width_px,
            hand_length_px: hand.hand_length_px,
            palm_line: (hand.points[INDEX_MCP], hand.points[PINKY_MCP]),
            palm_center: hand.palm_center,
            orientation: PixelPoint::new(middle.x - wrist.x, middle.y - wrist.y),
            convex_hull: convex_hull(&hand.tips()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::open_hand;

    #[test]
    fn test_ratio_boundaries() {
        assert_eq!(RegimeMode::from_ratio(0.34), RegimeMode::Sideways);
        assert_eq!(RegimeMode::from_ratio(0.36), RegimeMode::Transition);
        assert_eq!(RegimeMode::from_ratio(0.46), RegimeMode::Front);
    }

    #[test]
    fn test_open_hand_is_front() {
        let reading = RegimeSwitchingEngine::evaluate(&open_hand(0));
        assert_eq!(reading.mode, RegimeMode::Front);
        assert_eq!(reading.mode_label, "FRONT-FACING");
        // All five tips of a spread hand sit on the hull
        assert_eq!(reading.convex_hull.len(), 5);
        assert!(reading.orientation.y < 0.0);
    }
}
