//! Dead-finger classification
//!
//! Each finger is split into three joint-pair segments. Every segment keeps a
//! score in [0, 1] that rises while its joints are unreliable and falls while
//! both are well observed; the alive/ghost/dead label is a pure threshold of
//! that score. Joints also keep a locked "last good" position that only
//! moves while the joint is trustworthy, so a quarantined joint can be drawn
//! where it was last seen instead of where the estimator hallucinates it.
//!
//! A finger that was dead and then recovers is reported as reviving for a
//! short window afterwards.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{angle_deg, clamp01, JointHistory};
use crate::hand::ProjectedHand;
use crate::types::{Finger, PixelPoint, LANDMARK_COUNT};

/// Joint positions kept per landmark for jitter estimation
pub const JOINT_HISTORY_CAPACITY: usize = 8;

/// Jitter is measured against this fraction of palm width
const JITTER_PALM_FRACTION: f64 = 0.1;

/// Joint is well observed at or above this confidence
pub const OBSERVED_CONFIDENCE: f64 = 0.6;
/// Joint is at least visible at or above this confidence
pub const VISIBLE_CONFIDENCE: f64 = 0.4;
/// Locked positions refresh only above this confidence
pub const LOCK_CONFIDENCE: f64 = 0.6;

const RECOVER_STEP: f64 = -0.12;
const BOTH_INVISIBLE_STEP: f64 = 0.25;
const FOLDED_STEP: f64 = 0.18;
const START_INVISIBLE_STEP: f64 = 0.10;
const AMBIGUOUS_STEP: f64 = 0.02;

/// Bend angle below which a hidden start joint reads as a folded finger
const FOLD_ANGLE_DEG: f64 = 150.0;

pub const DEAD_SCORE: f64 = 0.7;
pub const GHOST_SCORE: f64 = 0.4;

/// Window after the last dead reading during which recovery is announced
pub const REVIVE_WINDOW_MS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerHealth {
    Alive,
    Ghost,
    Dead,
}

impl FingerHealth {
    pub fn from_score(score: f64) -> Self {
        if score > DEAD_SCORE {
            FingerHealth::Dead
        } else if score > GHOST_SCORE {
            FingerHealth::Ghost
        } else {
            FingerHealth::Alive
        }
    }
}

/// Scores, locks and revive deadlines carried between frames
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadFingerState {
    joint_history: Vec<JointHistory>,
    last_good: Vec<Option<PixelPoint>>,
    segment_scores: [[f64; 3]; 5],
    revive_until_ms: [u64; 5],
    last_health: [FingerHealth; 5],
}

impl Default for DeadFingerState {
    fn default() -> Self {
        Self {
            joint_history: (0..LANDMARK_COUNT)
                .map(|_| JointHistory::new(JOINT_HISTORY_CAPACITY))
                .collect(),
            last_good: vec![None; LANDMARK_COUNT],
            segment_scores: [[0.0; 3]; 5],
            revive_until_ms: [0; 5],
            last_health: [FingerHealth::Alive; 5],
        }
    }
}

impl DeadFingerState {
    pub fn segment_scores(&self, finger: Finger) -> [f64; 3] {
        self.segment_scores[finger.index()]
    }

    pub fn locked_position(&self, joint: usize) -> Option<PixelPoint> {
        self.last_good.get(joint).copied().flatten()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentState {
    pub health: FingerHealth,
    pub score: f64,
    pub start_joint: usize,
    pub end_joint: usize,
    pub current_start: PixelPoint,
    pub current_end: PixelPoint,
    /// Last trusted position, or the current one if never trusted
    pub locked_start: PixelPoint,
    pub locked_end: PixelPoint,
    pub confidence_start: f64,
    pub confidence_end: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FingerDeadness {
    pub finger: Finger,
    pub health: FingerHealth,
    pub max_score: f64,
    pub segments: Vec<SegmentState>,
    pub reviving: bool,
    pub revive_seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeadFingerReading {
    pub per_finger: Vec<FingerDeadness>,
    pub joint_confidence: Vec<f64>,
}

pub struct DeadFingerEngine;

impl DeadFingerEngine {
    pub fn update(state: &mut DeadFingerState, hand: &ProjectedHand, now_ms: u64) -> DeadFingerReading {
        let points = &hand.points;
        let palm = hand.palm_divisor();

        let joint_confidence: Vec<f64> = points
            .iter()
            .enumerate()
            .map(|(idx, &pt)| {
                let history = &mut state.joint_history[idx];
                history.push(pt);
                let confidence = clamp01(1.0 - history.jitter() / (palm * JITTER_PALM_FRACTION));
                if confidence > LOCK_CONFIDENCE {
                    state.last_good[idx] = Some(pt);
                }
                confidence
            })
            .collect();

        let per_finger = Finger::ALL
            .iter()
            .map(|&finger| Self::update_finger(state, finger, points, &joint_confidence, now_ms))
            .collect();

        DeadFingerReading {
            per_finger,
            joint_confidence,
        }
    }

    fn update_finger(
        state: &mut DeadFingerState,
        finger: Finger,
        points: &[PixelPoint],
        confidence: &[f64],
        now_ms: u64,
    ) -> FingerDeadness {
        let f = finger.index();
        let chain = finger.chain();
        let mut segments = Vec::with_capacity(3);

        for s in 0..3 {
            let a = chain[s];
            let b = chain[s + 1];
            let conf_a = confidence[a];
            let conf_b = confidence[b];
            let observed_a = conf_a >= OBSERVED_CONFIDENCE;
            let observed_b = conf_b >= OBSERVED_CONFIDENCE;
            let visible_a = conf_a >= VISIBLE_CONFIDENCE;
            let visible_b = conf_b >= VISIBLE_CONFIDENCE;

            // The distal segment has no joint beyond its end to bend around
            let bent = match chain.get(s + 2) {
                Some(&c) if visible_b => angle_deg(points[a], points[b], points[c]) < FOLD_ANGLE_DEG,
                _ => false,
            };

            let step = if observed_a && observed_b {
                RECOVER_STEP
            } else if !visible_a && !visible_b {
                BOTH_INVISIBLE_STEP
            } else if !visible_a && visible_b && bent {
                FOLDED_STEP
            } else if !visible_a && visible_b {
                START_INVISIBLE_STEP
            } else {
                AMBIGUOUS_STEP
            };

            let score = clamp01(state.segment_scores[f][s] + step);
            state.segment_scores[f][s] = score;

            segments.push(SegmentState {
                health: FingerHealth::from_score(score),
                score,
                start_joint: a,
                end_joint: b,
                current_start: points[a],
                current_end: points[b],
                locked_start: state.last_good[a].unwrap_or(points[a]),
                locked_end: state.last_good[b].unwrap_or(points[b]),
                confidence_start: conf_a,
                confidence_end: conf_b,
            });
        }

        let max_score = state.segment_scores[f].iter().copied().fold(0.0, f64::max);
        if max_score > DEAD_SCORE {
            state.revive_until_ms[f] = now_ms.saturating_add(REVIVE_WINDOW_MS);
        }
        let revive_until = state.revive_until_ms[f];
        let reviving = revive_until > now_ms && max_score < GHOST_SCORE;
        let health = FingerHealth::from_score(max_score);

        if health != state.last_health[f] {
            debug!(
                finger = finger.label(),
                from = ?state.last_health[f],
                to = ?health,
                score = max_score,
                "finger health changed"
            );
            state.last_health[f] = health;
        }

        FingerDeadness {
            finger,
            health,
            max_score,
            segments,
            reviving,
            revive_seconds: revive_until.saturating_sub(now_ms) as f64 / 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{hand_from_px, open_hand, open_hand_px};

    const FRAME_MS: u64 = 33;

    /// Index finger folded at the DIP (7) with a right angle, PIP (6) free to move
    fn folded_index(pip_dy: f64) -> Vec<(f64, f64)> {
        let mut px = open_hand_px();
        px[7] = (240.0, 205.0);
        px[8] = (270.0, 205.0);
        px[6] = (240.0, 235.0 + pip_dy);
        px
    }

    #[test]
    fn test_static_hand_stays_alive() {
        let mut state = DeadFingerState::default();
        let mut reading = None;
        for i in 0..10 {
            reading = Some(DeadFingerEngine::update(&mut state, &open_hand(i * FRAME_MS), i * FRAME_MS));
        }
        let reading = reading.unwrap();
        for finger in &reading.per_finger {
            assert_eq!(finger.health, FingerHealth::Alive);
            assert_eq!(finger.max_score, 0.0);
            assert!(!finger.reviving);
        }
        assert!(reading.joint_confidence.iter().all(|c| (*c - 1.0).abs() < 1e-9));
    }

    #[test]
    fn test_folded_occlusion_kills_then_revives() {
        let mut state = DeadFingerState::default();
        let mut now = 0;

        // Settle, then shake the PIP joint while the DIP stays folded and still
        DeadFingerEngine::update(&mut state, &hand_from_px(now, &folded_index(0.0)), now);
        let mut dead_at = None;
        for i in 0..6 {
            now += FRAME_MS;
            let dy = if i % 2 == 0 { 60.0 } else { 0.0 };
            let reading = DeadFingerEngine::update(&mut state, &hand_from_px(now, &folded_index(dy)), now);
            let index = &reading.per_finger[Finger::Index.index()];
            assert!(reading.joint_confidence[6] < VISIBLE_CONFIDENCE);
            assert!(index.segments[1].score > 0.0);
            if index.health == FingerHealth::Dead {
                dead_at.get_or_insert(i);
            }
        }
        assert!(state.segment_scores(Finger::Index)[1] > DEAD_SCORE);
        assert!(dead_at.is_some());

        // The PIP never had a trusted position after the first frame
        assert_eq!(state.locked_position(6), Some(PixelPoint::new(240.0, 235.0)));

        // Hold everything still again; the score drains below ghost
        let mut revived = None;
        for _ in 0..30 {
            now += FRAME_MS;
            let reading = DeadFingerEngine::update(&mut state, &hand_from_px(now, &folded_index(0.0)), now);
            let index = reading.per_finger[Finger::Index.index()].clone();
            if index.max_score < GHOST_SCORE {
                revived = Some(index);
                break;
            }
        }
        let index = revived.expect("score should drain below ghost threshold");
        assert_eq!(index.health, FingerHealth::Alive);
        assert!(index.reviving);
        assert!(index.revive_seconds > 0.0);
        assert!(index.revive_seconds <= REVIVE_WINDOW_MS as f64 / 1000.0);
    }

    #[test]
    fn test_revive_window_expires() {
        let mut state = DeadFingerState::default();
        state.segment_scores[Finger::Ring.index()] = [0.0, 0.9, 0.0];
        DeadFingerEngine::update(&mut state, &open_hand(0), 0);
        // Drain to zero
        for i in 1..10 {
            DeadFingerEngine::update(&mut state, &open_hand(i * FRAME_MS), i * FRAME_MS);
        }
        let later = 10_000;
        let reading = DeadFingerEngine::update(&mut state, &open_hand(later), later);
        let ring = &reading.per_finger[Finger::Ring.index()];
        assert!(!ring.reviving);
        assert_eq!(ring.revive_seconds, 0.0);
    }

    #[test]
    fn test_revive_deadline_saturates_near_max_timestamp() {
        let mut state = DeadFingerState::default();
        state.segment_scores[Finger::Ring.index()] = [0.0, 0.9, 0.0];
        let now = u64::MAX - 10;
        let reading = DeadFingerEngine::update(&mut state, &open_hand(now), now);
        let ring = &reading.per_finger[Finger::Ring.index()];
        assert_eq!(ring.health, FingerHealth::Dead);
        assert_eq!(state.revive_until_ms[Finger::Ring.index()], u64::MAX);
        assert!((ring.revive_seconds - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_locked_position_frozen_while_untrusted() {
        let mut state = DeadFingerState::default();
        DeadFingerEngine::update(&mut state, &open_hand(0), 0);
        let good = state.locked_position(8).unwrap();

        for i in 1..5u64 {
            let mut px = open_hand_px();
            let dy = if i % 2 == 0 { 0.0 } else { 80.0 };
            px[8] = (px[8].0, px[8].1 + dy);
            let reading = DeadFingerEngine::update(&mut state, &hand_from_px(i * FRAME_MS, &px), i * FRAME_MS);
            let distal = &reading.per_finger[Finger::Index.index()].segments[2];
            assert_eq!(distal.locked_end, good);
        }
    }

    #[test]
    fn test_scores_stay_in_unit_range() {
        let mut state = DeadFingerState::default();
        for i in 0..40u64 {
            let mut px = open_hand_px();
            let d = if i % 2 == 0 { 0.0 } else { 90.0 };
            for p in px.iter_mut().skip(1) {
                p.0 += d;
            }
            let reading = DeadFingerEngine::update(&mut state, &hand_from_px(i * FRAME_MS, &px), i * FRAME_MS);
            for finger in &reading.per_finger {
                for seg in &finger.segments {
                    assert!((0.0..=1.0).contains(&seg.score));
                }
            }
        }
    }
}
