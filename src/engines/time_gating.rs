//! Hold timing
//!
//! A hold counts only while the hand is front-facing and fully observed.
//! Losing stability resets the hold clock. Every unstable frame pushes a
//! short mercy window out, so the UI does not report failure until the hand
//! has been unstable for longer than it. All deadlines compare against
//! the caller's timestamp.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engines::observation::ObservationState;
use crate::engines::regime::RegimeMode;

/// Stable time needed to complete a hold
pub const REQUIRED_HOLD_MS: u64 = 1500;

/// Grace period after losing stability
pub const MERCY_WINDOW_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Idle,
    Qualify,
    Count,
    Paused,
    Passed,
}

/// Attempt flags owned by the application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptControl {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub paused: bool,
    /// The application has accepted the attempt as finished
    #[serde(default)]
    pub finished: bool,
}

impl AttemptControl {
    pub fn running() -> Self {
        Self {
            running: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateState {
    stable_since_ms: Option<u64>,
    mercy_until_ms: u64,
    pause_until_ms: u64,
    was_stable: bool,
    hold_credited: bool,
    holds_completed: u64,
}

impl GateState {
    pub fn stable_since_ms(&self) -> Option<u64> {
        self.stable_since_ms
    }

    pub fn mercy_until_ms(&self) -> u64 {
        self.mercy_until_ms
    }

    pub fn holds_completed(&self) -> u64 {
        self.holds_completed
    }

    /// Hold the gate in `paused` until `now_ms + duration_ms`
    pub fn pause_for(&mut self, now_ms: u64, duration_ms: u64) {
        self.pause_until_ms = now_ms.saturating_add(duration_ms);
    }

    pub fn resume(&mut self) {
        self.pause_until_ms = 0;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GateReading {
    pub status: GateStatus,
    pub stable: bool,
    pub progress: f64,
    pub completed: bool,
    pub held_seconds: f64,
    pub required_seconds: f64,
    pub remaining_seconds: f64,
    pub paused: bool,
    pub pause_remaining_seconds: f64,
    pub mercy_remaining_seconds: f64,
    pub in_mercy: bool,
}

pub struct TimeGatingEngine;

impl TimeGatingEngine {
    pub fn update(
        state: &mut GateState,
        regime: RegimeMode,
        observation: ObservationState,
        control: AttemptControl,
        now_ms: u64,
    ) -> GateReading {
        let stable = regime == RegimeMode::Front && observation == ObservationState::Observed;

        if stable {
            state.stable_since_ms.get_or_insert(now_ms);
        } else {
            state.mercy_until_ms = now_ms.saturating_add(MERCY_WINDOW_MS);
            if state.was_stable {
                debug!(now_ms, mercy_until_ms = state.mercy_until_ms, "hold interrupted");
            }
            state.stable_since_ms = None;
            state.hold_credited = false;
        }
        state.was_stable = stable;

        let held_ms = state
            .stable_since_ms
            .map(|since| now_ms.saturating_sub(since))
            .unwrap_or(0);
        let progress = (held_ms as f64 / REQUIRED_HOLD_MS as f64).min(1.0);
        let completed = progress >= 1.0;
        if completed && !state.hold_credited {
            state.hold_credited = true;
            state.holds_completed += 1;
            debug!(now_ms, holds = state.holds_completed, "hold completed");
        }

        let paused = control.paused || now_ms < state.pause_until_ms;
        let status = if paused {
            GateStatus::Paused
        } else if control.finished {
            GateStatus::Passed
        } else if stable {
            GateStatus::Count
        } else if control.running {
            GateStatus::Qualify
        } else {
            GateStatus::Idle
        };

        GateReading {
            status,
            stable,
            progress,
            completed,
            held_seconds: held_ms as f64 / 1000.0,
            required_seconds: REQUIRED_HOLD_MS as f64 / 1000.0,
            remaining_seconds: REQUIRED_HOLD_MS.saturating_sub(held_ms) as f64 / 1000.0,
            paused,
            pause_remaining_seconds: state.pause_until_ms.saturating_sub(now_ms) as f64 / 1000.0,
            mercy_remaining_seconds: state.mercy_until_ms.saturating_sub(now_ms) as f64 / 1000.0,
            in_mercy: now_ms < state.mercy_until_ms,
        }
    }
}
