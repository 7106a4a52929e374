//! User-facing posture guidance

use serde::Serialize;

use crate::engines::regime::RegimeMode;
use crate::engines::scale::ScaleStatus;
use crate::types::{Finger, PixelPoint};

const PROMPT_OFFSET_PX: f64 = 80.0;
const ROTATE_ARROW_PX: f64 = 50.0;

#[derive(Debug, Clone, Serialize)]
pub struct Prompt {
    pub text: &'static str,
    pub position: PixelPoint,
}

#[derive(Debug, Clone, Serialize)]
pub struct Arrow {
    pub from: PixelPoint,
    pub to: PixelPoint,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuidanceReading {
    pub prompt: Prompt,
    /// Non-thumb fingertip targets
    pub targets: Vec<PixelPoint>,
    pub lines: Vec<(PixelPoint, PixelPoint)>,
    pub arrows: Vec<Arrow>,
}

pub struct GuidanceGenerator;

impl GuidanceGenerator {
    pub fn evaluate(
        scale: ScaleStatus,
        regime: RegimeMode,
        palm_center: PixelPoint,
        tips: &[PixelPoint; 5],
    ) -> GuidanceReading {
        let text = match (scale, regime) {
            (ScaleStatus::Far, _) => "Move hand closer",
            (ScaleStatus::Close, _) => "Move hand back",
            (_, RegimeMode::Sideways) => "Rotate palm forward",
            _ => "Maintain posture",
        };

        let targets: Vec<PixelPoint> = tips[Finger::Index.index()..].to_vec();
        let lines = targets.iter().map(|&t| (palm_center, t)).collect();

        let arrows = if regime == RegimeMode::Sideways {
            vec![Arrow {
                from: palm_center,
                to: palm_center.offset(ROTATE_ARROW_PX, 0.0),
                label: "Rotate",
            }]
        } else {
            Vec::new()
        };

        GuidanceReading {
            prompt: Prompt {
                text,
                position: palm_center.offset(0.0, -PROMPT_OFFSET_PX),
            },
            targets,
            lines,
            arrows,
        }
    }
}
