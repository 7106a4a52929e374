//! Bone-length plausibility
//!
//! Real bones do not change length between frames. Each of the 20 skeletal
//! connections is compared with its previous palm-normalized length.

use serde::{Deserialize, Serialize};

use crate::geometry::distance;
use crate::hand::ProjectedHand;
use crate::types::{PixelPoint, SKELETON_CONNECTIONS};

/// Relative change above which a bone is implausible
pub const VIOLATION_DELTA: f64 = 0.10;

/// Relative change above which a bone is drifting
pub const DRIFT_DELTA: f64 = 0.05;

/// Divisor floor for previous bone lengths (palm-normalized units)
const MIN_PREV_LENGTH: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoneStatus {
    Stable,
    Drifting,
    Violation,
}

impl BoneStatus {
    pub fn from_delta(delta: f64) -> Self {
        if delta > VIOLATION_DELTA {
            BoneStatus::Violation
        } else if delta > DRIFT_DELTA {
            BoneStatus::Drifting
        } else {
            BoneStatus::Stable
        }
    }

    /// Overlay color for the renderer
    pub fn color(self) -> &'static str {
        match self {
            BoneStatus::Stable => "#00ff88",
            BoneStatus::Drifting => "#ff8800",
            BoneStatus::Violation => "#ff0000",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlausibilityState {
    last_lengths: Option<[f64; 20]>,
    total_violations: u64,
}

impl PlausibilityState {
    pub fn total_violations(&self) -> u64 {
        self.total_violations
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BoneCheck {
    pub from: usize,
    pub to: usize,
    pub a: PixelPoint,
    pub b: PixelPoint,
    /// Length normalized by palm width
    pub length: f64,
    pub delta: f64,
    pub status: BoneStatus,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlausibilityReading {
    pub bones: Vec<BoneCheck>,
    pub violations: u32,
    pub total_violations: u64,
}

pub struct PlausibilityChecksEngine;

impl PlausibilityChecksEngine {
    pub fn update(state: &mut PlausibilityState, hand: &ProjectedHand) -> PlausibilityReading {
        let palm = hand.palm_divisor();
        let mut lengths = [0.0; 20];
        let mut bones = Vec::with_capacity(SKELETON_CONNECTIONS.len());
        let mut violations = 0u32;

        for (idx, &(from, to)) in SKELETON_CONNECTIONS.iter().enumerate() {
            let a = hand.points[from];
            let b = hand.points[to];
            let length = distance(a, b) / palm;
            let prev = state.last_lengths.map(|l| l[idx]).unwrap_or(length);
            let delta = (length - prev).abs() / prev.max(MIN_PREV_LENGTH);
            let status = BoneStatus::from_delta(delta);
            if status == BoneStatus::Violation {
                violations += 1;
            }
            lengths[idx] = length;
            bones.push(BoneCheck {
                from,
                to,
                a,
                b,
                length,
                delta,
                status,
                color: status.color(),
            });
        }

        state.last_lengths = Some(lengths);
        state.total_violations += u64::from(violations);

        PlausibilityReading {
            bones,
            violations,
            total_violations: state.total_violations,
        }
    }
}
