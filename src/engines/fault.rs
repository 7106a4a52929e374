//! Finger fault classification strategies
//!
//! Two interchangeable ways to label each finger alive, ghost or dead.
//! `SegmentScoredClassifier` is the full segment-level scorer with locked
//! positions and revive windows. `TipConfidenceClassifier` only looks at
//! fingertip confidence and counts how long a tip has been unobservable.

use serde::{Deserialize, Serialize};

use crate::engines::dead_finger::{
    DeadFingerEngine, DeadFingerReading, DeadFingerState, FingerHealth,
};
use crate::engines::observation::{
    ObservationEngineState, ObservationState, ObservationThresholdsEngine,
};
use crate::hand::ProjectedHand;
use crate::types::Finger;

/// Per-finger outcome shared by every strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FingerVerdict {
    pub finger: Finger,
    pub health: FingerHealth,
    /// Strategy-specific badness in [0, 1]
    pub score: f64,
    pub reviving: bool,
}

/// Labels every finger of a hand, carrying its own state between frames
pub trait FingerFaultClassifier {
    type State: Default;

    fn name(&self) -> &'static str;

    fn classify(&self, state: &mut Self::State, hand: &ProjectedHand, now_ms: u64) -> [FingerVerdict; 5];
}

/// Which classifier a session reports verdicts from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultStrategy {
    #[default]
    SegmentScored,
    TipConfidence,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentScoredClassifier;

impl FingerFaultClassifier for SegmentScoredClassifier {
    type State = DeadFingerState;

    fn name(&self) -> &'static str {
        "segment_scored"
    }

    fn classify(&self, state: &mut DeadFingerState, hand: &ProjectedHand, now_ms: u64) -> [FingerVerdict; 5] {
        verdicts_from_reading(&DeadFingerEngine::update(state, hand, now_ms))
    }
}

/// Collapse a dead-finger reading to per-finger verdicts
pub fn verdicts_from_reading(reading: &DeadFingerReading) -> [FingerVerdict; 5] {
    Finger::ALL.map(|finger| {
        let f = &reading.per_finger[finger.index()];
        FingerVerdict {
            finger,
            health: f.health,
            score: f.max_score,
            reviving: f.reviving,
        }
    })
}

/// Consecutive unobservable frames before a tip is declared dead
pub const DEAD_AFTER_FRAMES: u32 = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TipConfidenceState {
    observation: ObservationEngineState,
    unobservable_frames: [u32; 5],
}

impl TipConfidenceState {
    pub fn unobservable_frames(&self, finger: Finger) -> u32 {
        self.unobservable_frames[finger.index()]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TipConfidenceClassifier;

impl FingerFaultClassifier for TipConfidenceClassifier {
    type State = TipConfidenceState;

    fn name(&self) -> &'static str {
        "tip_confidence"
    }

    fn classify(&self, state: &mut TipConfidenceState, hand: &ProjectedHand, _now_ms: u64) -> [FingerVerdict; 5] {
        let reading = ObservationThresholdsEngine::update(&mut state.observation, hand);
        Finger::ALL.map(|finger| {
            let obs = &reading.per_finger[finger.index()];
            let counter = &mut state.unobservable_frames[finger.index()];
            if obs.state == ObservationState::Unobservable {
                *counter += 1;
            } else {
                *counter = 0;
            }
            let health = if *counter >= DEAD_AFTER_FRAMES {
                FingerHealth::Dead
            } else if *counter > 0 || obs.state == ObservationState::Less {
                FingerHealth::Ghost
            } else {
                FingerHealth::Alive
            };
            FingerVerdict {
                finger,
                health,
                score: 1.0 - obs.confidence,
                reviving: false,
            }
        })
    }
}
