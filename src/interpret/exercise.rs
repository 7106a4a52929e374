//! Exercise constraints and intent

use serde::Serialize;

use crate::engines::observation::ObservationState;
use crate::interpret::semantic::{SemanticReading, Zone};
use crate::types::PixelPoint;

/// Length of the intent arrow drawn above the palm
const INTENT_ARROW_PX: f64 = 60.0;

const THUMB_BLOCKED_PROGRESS: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    pub label: &'static str,
    pub ok: bool,
    pub progress: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Intent {
    pub label: &'static str,
    pub arrow_from: PixelPoint,
    pub arrow_to: PixelPoint,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseReading {
    pub constraints: Vec<Constraint>,
    pub intent: Intent,
}

impl ExerciseReading {
    pub fn all_ok(&self) -> bool {
        self.constraints.iter().all(|c| c.ok)
    }
}

pub struct ExerciseInterpreter;

impl ExerciseInterpreter {
    pub fn evaluate(semantic: &SemanticReading, observation: ObservationState) -> ExerciseReading {
        let thumb_clear = semantic.thumb_crossings.is_empty();
        let constraints = vec![
            Constraint {
                label: "Fingers in zones",
                ok: !semantic.any_in_zone(Zone::Purple),
                progress: 1.0,
            },
            Constraint {
                label: "Thumb clear",
                ok: thumb_clear,
                progress: if thumb_clear { 1.0 } else { THUMB_BLOCKED_PROGRESS },
            },
            Constraint {
                label: "Observability",
                ok: observation != ObservationState::Unobservable,
                progress: match observation {
                    ObservationState::Observed => 1.0,
                    ObservationState::Less => 0.6,
                    ObservationState::Unobservable => 0.2,
                },
            },
        ];

        let palm = semantic.palm_center;
        ExerciseReading {
            constraints,
            intent: Intent {
                label: "Finger Extension",
                arrow_from: palm,
                arrow_to: palm.offset(0.0, -INTENT_ARROW_PX),
            },
        }
    }
}
