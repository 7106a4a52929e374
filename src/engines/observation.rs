//! Observation thresholds
//!
//! Per-fingertip confidence that fuses tip jitter, tip-to-tip occlusion,
//! hand scale, hand tilt, and finger-length drift against an adaptive
//! baseline. The baseline only learns from clean frames, so it does not
//! drift while the hand is occluded or tilted.

use serde::{Deserialize, Serialize};

use crate::geometry::{clamp01, distance, JointHistory};
use crate::hand::ProjectedHand;
use crate::types::{Finger, PixelPoint};

/// Tip positions kept for jitter estimation
pub const TIP_HISTORY_CAPACITY: usize = 10;

/// Jitter is measured against this fraction of palm width
const JITTER_PALM_FRACTION: f64 = 0.12;

/// Another tip closer than this fraction of palm width occludes
const OCCLUSION_PALM_FRACTION: f64 = 0.08;
const OCCLUSION_PENALTY: f64 = 0.2;

/// Palms narrower than this are too small to trust
pub const MIN_PALM_WIDTH_PX: f64 = 80.0;
const SCALE_PENALTY: f64 = 0.3;

const TILT_STRONG_RATIO: f64 = 0.45;
const TILT_STRONG_PENALTY: f64 = 0.12;
const TILT_MILD_RATIO: f64 = 0.55;
const TILT_MILD_PENALTY: f64 = 0.06;

const LENGTH_SEVERE_RATIO: f64 = 0.70;
const LENGTH_SEVERE_PENALTY: f64 = 0.18;
const LENGTH_MILD_RATIO: f64 = 0.85;
const LENGTH_MILD_PENALTY: f64 = 0.08;

/// Weight of the previous length baseline in the EMA update
const LENGTH_BASELINE_RETAIN: f64 = 0.92;

/// Baseline learning is gated on clean frames
const LEARN_MIN_CONFIDENCE: f64 = 0.7;
const LEARN_MAX_TILT_PENALTY: f64 = 0.1;

pub const OBSERVED_CONFIDENCE: f64 = 0.7;
pub const LESS_CONFIDENCE: f64 = 0.4;

/// Observability of one finger, ordered best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationState {
    Observed,
    Less,
    Unobservable,
}

impl ObservationState {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > OBSERVED_CONFIDENCE {
            ObservationState::Observed
        } else if confidence > LESS_CONFIDENCE {
            ObservationState::Less
        } else {
            ObservationState::Unobservable
        }
    }
}

/// Per-finger tip histories and length baselines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationEngineState {
    tip_history: Vec<JointHistory>,
    length_baseline: [Option<f64>; 5],
}

impl Default for ObservationEngineState {
    fn default() -> Self {
        Self {
            tip_history: (0..5)
                .map(|_| JointHistory::new(TIP_HISTORY_CAPACITY))
                .collect(),
            length_baseline: [None; 5],
        }
    }
}

impl ObservationEngineState {
    pub fn length_baseline(&self, finger: Finger) -> Option<f64> {
        self.length_baseline[finger.index()]
    }

    pub fn tip_history(&self, finger: Finger) -> &JointHistory {
        &self.tip_history[finger.index()]
    }
}

/// Penalty breakdown behind one finger's confidence
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ObservationPenalties {
    pub occlusion: f64,
    pub scale: f64,
    pub tilt: f64,
    pub length: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FingerObservation {
    pub finger: Finger,
    pub name: &'static str,
    pub state: ObservationState,
    pub confidence: f64,
    pub jitter_px: f64,
    /// Current length over baseline length
    pub length_ratio: f64,
    pub penalties: ObservationPenalties,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObservationReading {
    pub per_finger: Vec<FingerObservation>,
    /// Worst state across fingers
    pub global_state: ObservationState,
    pub tips: Vec<PixelPoint>,
}

pub struct ObservationThresholdsEngine;

impl ObservationThresholdsEngine {
    pub fn update(state: &mut ObservationEngineState, hand: &ProjectedHand) -> ObservationReading {
        let tips = hand.tips();
        let palm = hand.palm_divisor();

        for (history, tip) in state.tip_history.iter_mut().zip(tips.iter()) {
            history.push(*tip);
        }

        let scale_penalty = if hand.palm_width_px < MIN_PALM_WIDTH_PX {
            SCALE_PENALTY
        } else {
            0.0
        };
        let tilt_penalty = tilt_penalty(hand.width_to_length_ratio());

        let per_finger: Vec<FingerObservation> = Finger::ALL
            .iter()
            .map(|&finger| {
                let idx = finger.index();
                let jitter_px = state.tip_history[idx].jitter();

                let occluded = tips
                    .iter()
                    .enumerate()
                    .any(|(j, other)| {
                        j != idx && distance(*other, tips[idx]) < hand.palm_width_px * OCCLUSION_PALM_FRACTION
                    });
                let occlusion_penalty = if occluded { OCCLUSION_PENALTY } else { 0.0 };

                let current_length = hand.finger_length_ratio(finger);
                let baseline = *state.length_baseline[idx].get_or_insert(current_length);
                let length_ratio = if baseline > 0.0 {
                    current_length / baseline
                } else {
                    1.0
                };
                let length_penalty = length_penalty(length_ratio);

                let penalties = ObservationPenalties {
                    occlusion: occlusion_penalty,
                    scale: scale_penalty,
                    tilt: tilt_penalty,
                    length: length_penalty,
                };

                let confidence = clamp01(
                    1.0 - jitter_px / (palm * JITTER_PALM_FRACTION)
                        - occlusion_penalty
                        - scale_penalty
                        - tilt_penalty
                        - length_penalty,
                );

                if confidence > LEARN_MIN_CONFIDENCE
                    && occlusion_penalty == 0.0
                    && tilt_penalty < LEARN_MAX_TILT_PENALTY
                {
                    state.length_baseline[idx] = Some(
                        baseline * LENGTH_BASELINE_RETAIN
                            + current_length * (1.0 - LENGTH_BASELINE_RETAIN),
                    );
                }

                FingerObservation {
                    finger,
                    name: finger.label(),
                    state: ObservationState::from_confidence(confidence),
                    confidence,
                    jitter_px,
                    length_ratio,
                    penalties,
                }
            })
            .collect();

        let global_state = per_finger
            .iter()
            .map(|f| f.state)
            .max()
            .unwrap_or(ObservationState::Unobservable);

        ObservationReading {
            per_finger,
            global_state,
            tips: tips.to_vec(),
        }
    }
}

fn tilt_penalty(width_to_length: f64) -> f64 {
    if width_to_length < TILT_STRONG_RATIO {
        TILT_STRONG_PENALTY
    } else if width_to_length < TILT_MILD_RATIO {
        TILT_MILD_PENALTY
    } else {
        0.0
    }
}

fn length_penalty(length_ratio: f64) -> f64 {
    if length_ratio < LENGTH_SEVERE_RATIO {
        LENGTH_SEVERE_PENALTY
    } else if length_ratio < LENGTH_MILD_RATIO {
        LENGTH_MILD_PENALTY
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{hand_from_px, open_hand, open_hand_px, scaled};

    #[test]
    fn test_static_hand_converges_to_observed() {
        let mut state = ObservationEngineState::default();
        let mut reading = None;
        for i in 0..8 {
            reading = Some(ObservationThresholdsEngine::update(&mut state, &open_hand(i * 33)));
        }
        let reading = reading.unwrap();
        assert_eq!(reading.global_state, ObservationState::Observed);
        for f in &reading.per_finger {
            assert_eq!(f.state, ObservationState::Observed, "{}", f.name);
            assert!(f.jitter_px.abs() < 1e-9);
        }
    }

    #[test]
    fn test_occluding_tips_penalized() {
        let mut px = open_hand_px();
        px[12] = px[8];
        let mut state = ObservationEngineState::default();
        let reading = ObservationThresholdsEngine::update(&mut state, &hand_from_px(0, &px));

        let index = &reading.per_finger[Finger::Index.index()];
        let middle = &reading.per_finger[Finger::Middle.index()];
        assert_eq!(index.penalties.occlusion, OCCLUSION_PENALTY);
        assert_eq!(middle.penalties.occlusion, OCCLUSION_PENALTY);
        assert!((index.confidence - 0.8).abs() < 1e-9);
        assert_eq!(reading.per_finger[Finger::Ring.index()].penalties.occlusion, 0.0);
    }

    #[test]
    fn test_small_hand_penalized() {
        let mut state = ObservationEngineState::default();
        let small = hand_from_px(0, &scaled(&open_hand_px(), 0.5));
        let reading = ObservationThresholdsEngine::update(&mut state, &small);
        assert!(reading.per_finger.iter().all(|f| f.penalties.scale == SCALE_PENALTY));
        assert_eq!(reading.global_state, ObservationState::Less);
    }

    #[test]
    fn test_jitter_drives_unobservable() {
        let mut state = ObservationEngineState::default();
        let mut reading = None;
        for i in 0..10 {
            let mut px = open_hand_px();
            let dy = if i % 2 == 0 { 0.0 } else { 40.0 };
            px[8] = (px[8].0, px[8].1 + dy);
            reading = Some(ObservationThresholdsEngine::update(&mut state, &hand_from_px(i * 33, &px)));
        }
        let reading = reading.unwrap();
        let index = &reading.per_finger[Finger::Index.index()];
        // jitter 20px against 18px budget
        assert_eq!(index.state, ObservationState::Unobservable);
        assert_eq!(reading.global_state, ObservationState::Unobservable);
    }

    #[test]
    fn test_length_baseline_frozen_under_collapse() {
        let mut state = ObservationEngineState::default();
        ObservationThresholdsEngine::update(&mut state, &open_hand(0));
        let seeded = state.length_baseline(Finger::Index).unwrap();

        // Curl the index finger so its length collapses
        let mut px = open_hand_px();
        px[6] = (243.0, 285.0);
        px[7] = (242.0, 275.0);
        px[8] = (241.0, 268.0);
        let reading = ObservationThresholdsEngine::update(&mut state, &hand_from_px(33, &px));
        let index = &reading.per_finger[Finger::Index.index()];

        assert_eq!(index.penalties.length, LENGTH_SEVERE_PENALTY);
        // The jump also blows up tip jitter, so the frame is not clean enough to learn from
        assert_eq!(index.state, ObservationState::Unobservable);
        assert_eq!(state.length_baseline(Finger::Index), Some(seeded));
    }

    #[test]
    fn test_tilt_penalty_bands() {
        assert_eq!(tilt_penalty(0.40), TILT_STRONG_PENALTY);
        assert_eq!(tilt_penalty(0.50), TILT_MILD_PENALTY);
        assert_eq!(tilt_penalty(0.60), 0.0);
    }

    #[test]
    fn test_length_penalty_bands() {
        assert_eq!(length_penalty(0.6), LENGTH_SEVERE_PENALTY);
        assert_eq!(length_penalty(0.8), LENGTH_MILD_PENALTY);
        assert_eq!(length_penalty(0.95), 0.0);
    }
}
