//! Reference hand matching
//!
//! The first projected hand seen becomes the reference pose. Later frames
//! are scored by how far each fingertip has strayed from it, in palm widths.
//! The reference is only replaced when the caller asks for a recapture.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::distance;
use crate::hand::ProjectedHand;
use crate::types::{Finger, PixelPoint};

/// Score lost per palm width of tip deviation
const DEVIATION_WEIGHT: f64 = 2.5;

const GOOD_SCORE: f64 = 0.8;
const FAIR_SCORE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchQuality {
    Good,
    Fair,
    Poor,
}

impl MatchQuality {
    pub fn from_score(score: f64) -> Self {
        if score > GOOD_SCORE {
            MatchQuality::Good
        } else if score > FAIR_SCORE {
            MatchQuality::Fair
        } else {
            MatchQuality::Poor
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            MatchQuality::Good => "#00ff88",
            MatchQuality::Fair => "#ffff00",
            MatchQuality::Poor => "#ff0000",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceHandState {
    reference: Option<Vec<PixelPoint>>,
}

impl ReferenceHandState {
    pub fn reference(&self) -> Option<&[PixelPoint]> {
        self.reference.as_deref()
    }

    /// Drop the stored pose so the next frame becomes the new reference
    pub fn recapture(&mut self) {
        self.reference = None;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TipMatch {
    pub finger: Finger,
    pub name: &'static str,
    pub current: PixelPoint,
    pub reference: PixelPoint,
    /// Tip distance in palm widths
    pub deviation: f64,
    pub score: f64,
    pub quality: MatchQuality,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceReading {
    pub reference: Vec<PixelPoint>,
    pub per_finger: Vec<TipMatch>,
    pub overall: f64,
    pub quality: MatchQuality,
    /// True on the frame that captured the reference
    pub captured: bool,
}

pub struct ReferenceHandEngine;

impl ReferenceHandEngine {
    pub fn update(state: &mut ReferenceHandState, hand: &ProjectedHand) -> ReferenceReading {
        let captured = state.reference.is_none();
        let reference = state
            .reference
            .get_or_insert_with(|| hand.points.clone())
            .clone();
        if captured {
            debug!(timestamp_ms = hand.timestamp_ms, "reference pose captured");
        }

        let palm = hand.palm_divisor();
        let per_finger: Vec<TipMatch> = Finger::ALL
            .iter()
            .map(|&finger| {
                let current = hand.tip(finger);
                let target = reference[finger.tip()];
                let deviation = distance(current, target) / palm;
                let score = (1.0 - deviation * DEVIATION_WEIGHT).max(0.0);
                let quality = MatchQuality::from_score(score);
                TipMatch {
                    finger,
                    name: finger.label(),
                    current,
                    reference: target,
                    deviation,
                    score,
                    quality,
                    color: quality.color(),
                }
            })
            .collect();

        let overall = per_finger.iter().map(|m| m.score).sum::<f64>() / per_finger.len() as f64;

        ReferenceReading {
            reference,
            per_finger,
            overall,
            quality: MatchQuality::from_score(overall),
            captured,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{hand_from_px, open_hand, open_hand_px, shifted};

    #[test]
    fn test_same_frame_matches_perfectly() {
        let mut state = ReferenceHandState::default();
        let first = ReferenceHandEngine::update(&mut state, &open_hand(0));
        assert!(first.captured);
        assert_eq!(first.overall, 1.0);

        let again = ReferenceHandEngine::update(&mut state, &open_hand(33));
        assert!(!again.captured);
        assert_eq!(again.overall, 1.0);
        assert_eq!(again.quality, MatchQuality::Good);
    }

    #[test]
    fn test_shifted_hand_scores_lower() {
        let mut state = ReferenceHandState::default();
        ReferenceHandEngine::update(&mut state, &open_hand(0));

        // 30px on a 150px palm is 0.2 palm widths → score 0.5
        let moved = hand_from_px(33, &shifted(&open_hand_px(), 30.0, 0.0));
        let reading = ReferenceHandEngine::update(&mut state, &moved);
        assert!((reading.overall - 0.5).abs() < 1e-9);
        assert_eq!(reading.quality, MatchQuality::Poor);
        assert!(reading.per_finger.iter().all(|m| m.color == "#ff0000"));
    }

    #[test]
    fn test_far_deviation_floors_at_zero() {
        let mut state = ReferenceHandState::default();
        ReferenceHandEngine::update(&mut state, &open_hand(0));
        let moved = hand_from_px(33, &shifted(&open_hand_px(), 200.0, 0.0));
        let reading = ReferenceHandEngine::update(&mut state, &moved);
        assert_eq!(reading.overall, 0.0);
    }

    #[test]
    fn test_recapture_adopts_next_frame() {
        let mut state = ReferenceHandState::default();
        ReferenceHandEngine::update(&mut state, &open_hand(0));

        let moved = hand_from_px(33, &shifted(&open_hand_px(), 30.0, 0.0));
        state.recapture();
        assert!(state.reference().is_none());

        let reading = ReferenceHandEngine::update(&mut state, &moved);
        assert!(reading.captured);
        assert_eq!(reading.overall, 1.0);
        assert_eq!(state.reference().map(|r| r[0]), Some(PixelPoint::new(350.0, 420.0)));
    }
}
