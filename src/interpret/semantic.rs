//! Semantic hand layout
//!
//! Turns the projected hand into exercise-level geometry: which fingers are
//! targets, palm-to-tip projections, the denial lines a finger must clear,
//! counted grid squares, coarse zones, and fingers crossing the thumb.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HandError;
use crate::geometry::distance;
use crate::hand::ProjectedHand;
use crate::types::{Finger, PixelPoint};

/// Counted-square edge length in pixels
pub const GRID_SIZE_PX: f64 = 24.0;

const PRIMARY_DENIAL_PALM_FRACTION: f64 = 0.9;
const SECONDARY_DENIAL_OFFSET_FRACTION: f64 = 0.2;

const THUMB_CROSSING_MIN_PX: f64 = 12.0;
const THUMB_CROSSING_PALM_FRACTION: f64 = 0.12;

const INACTIVE_SQUARE_COLOR: &str = "rgba(255,255,255,0.2)";

/// What the current exercise asks of the hand
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExerciseDefinition {
    #[default]
    All,
    Isolation { target_fingers: Vec<Finger> },
    /// Two landmark indices that should meet
    Pinch { pinch_pair: [usize; 2] },
}

impl ExerciseDefinition {
    pub fn target_fingers(&self) -> Vec<Finger> {
        match self {
            ExerciseDefinition::All => Finger::ALL.to_vec(),
            ExerciseDefinition::Isolation { target_fingers } => target_fingers.clone(),
            ExerciseDefinition::Pinch { pinch_pair } => pinch_pair
                .iter()
                .filter_map(|&idx| Finger::ALL.into_iter().find(|f| f.tip() == idx))
                .collect(),
        }
    }
}

impl FromStr for ExerciseDefinition {
    type Err = HandError;

    /// Parse `all`, `isolation:index,middle` or `pinch:4,8`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, args) = match s.split_once(':') {
            Some((kind, args)) => (kind.trim(), args.trim()),
            None => (s.trim(), ""),
        };
        match kind.to_ascii_lowercase().as_str() {
            "all" => Ok(ExerciseDefinition::All),
            "isolation" => {
                let target_fingers = args
                    .split(',')
                    .map(|name| parse_finger(name.trim()))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ExerciseDefinition::Isolation { target_fingers })
            }
            "pinch" => {
                let idx: Vec<usize> = args
                    .split(',')
                    .map(|v| {
                        v.trim()
                            .parse::<usize>()
                            .map_err(|e| HandError::ParseError(format!("pinch landmark '{v}': {e}")))
                    })
                    .collect::<Result<_, _>>()?;
                match idx.as_slice() {
                    [a, b] => Ok(ExerciseDefinition::Pinch { pinch_pair: [*a, *b] }),
                    _ => Err(HandError::ParseError(format!(
                        "pinch needs exactly two landmark indices, got {}",
                        idx.len()
                    ))),
                }
            }
            other => Err(HandError::ParseError(format!("unknown exercise '{other}'"))),
        }
    }
}

fn parse_finger(name: &str) -> Result<Finger, HandError> {
    Finger::ALL
        .into_iter()
        .find(|f| f.label().eq_ignore_ascii_case(name))
        .ok_or_else(|| HandError::ParseError(format!("unknown finger '{name}'")))
}

/// Display color per finger, thumb first
pub fn finger_color(finger: Finger) -> &'static str {
    match finger {
        Finger::Thumb => "#f59e0b",
        Finger::Index => "#60a5fa",
        Finger::Middle => "#34d399",
        Finger::Ring => "#f472b6",
        Finger::Pinky => "#a78bfa",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Tip clears the secondary denial line
    Green,
    /// Tip is above the palm center but below the denial band
    Yellow,
    Purple,
}

#[derive(Debug, Clone, Serialize)]
pub struct SemanticTip {
    pub finger: Finger,
    pub point: PixelPoint,
    pub color: &'static str,
    pub is_target: bool,
    pub zone: Zone,
}

#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    pub from: PixelPoint,
    pub to: PixelPoint,
    pub color: &'static str,
    pub is_target: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DenialLines {
    pub primary_y: f64,
    pub secondary_y: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountedSquare {
    pub finger: Finger,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: &'static str,
    pub is_target: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SemanticReading {
    pub palm_center: PixelPoint,
    pub target_fingers: Vec<Finger>,
    pub tips: Vec<SemanticTip>,
    pub projections: Vec<Projection>,
    pub denial_lines: DenialLines,
    pub grid_size: f64,
    pub counted_squares: Vec<CountedSquare>,
    /// Non-thumb fingers with a joint touching the thumb tip
    pub thumb_crossings: Vec<Finger>,
}

impl SemanticReading {
    pub fn zone(&self, finger: Finger) -> Zone {
        self.tips[finger.index()].zone
    }

    pub fn any_in_zone(&self, zone: Zone) -> bool {
        self.tips.iter().any(|t| t.zone == zone)
    }
}

pub struct SemanticLogic;

impl SemanticLogic {
    pub fn evaluate(hand: &ProjectedHand, exercise: &ExerciseDefinition) -> SemanticReading {
        let palm_center = hand.palm_center;
        let palm_width = hand.palm_width_px;
        let target_fingers = exercise.target_fingers();

        let primary_y = palm_center.y - palm_width * PRIMARY_DENIAL_PALM_FRACTION;
        let secondary_y = primary_y + palm_width * SECONDARY_DENIAL_OFFSET_FRACTION;

        let tips: Vec<SemanticTip> = Finger::ALL
            .iter()
            .map(|&finger| {
                let point = hand.tip(finger);
                let zone = if point.y < secondary_y {
                    Zone::Green
                } else if point.y < palm_center.y {
                    Zone::Yellow
                } else {
                    Zone::Purple
                };
                SemanticTip {
                    finger,
                    point,
                    color: finger_color(finger),
                    is_target: target_fingers.contains(&finger),
                    zone,
                }
            })
            .collect();

        let projections = tips
            .iter()
            .map(|tip| Projection {
                from: palm_center,
                to: tip.point,
                color: tip.color,
                is_target: tip.is_target,
            })
            .collect();

        let counted_squares = tips
            .iter()
            .map(|tip| CountedSquare {
                finger: tip.finger,
                x: (tip.point.x / GRID_SIZE_PX).floor() * GRID_SIZE_PX,
                y: (tip.point.y / GRID_SIZE_PX).floor() * GRID_SIZE_PX,
                size: GRID_SIZE_PX,
                color: if tip.is_target { tip.color } else { INACTIVE_SQUARE_COLOR },
                is_target: tip.is_target,
                active: tip.is_target && tip.point.y < secondary_y,
            })
            .collect();

        let thumb_tip = hand.tip(Finger::Thumb);
        let crossing_radius = THUMB_CROSSING_MIN_PX.max(palm_width * THUMB_CROSSING_PALM_FRACTION);
        let thumb_crossings = Finger::ALL[1..]
            .iter()
            .copied()
            .filter(|finger| {
                finger
                    .chain()
                    .iter()
                    .any(|&j| distance(hand.points[j], thumb_tip) < crossing_radius)
            })
            .collect();

        SemanticReading {
            palm_center,
            target_fingers,
            tips,
            projections,
            denial_lines: DenialLines { primary_y, secondary_y },
            grid_size: GRID_SIZE_PX,
            counted_squares,
            thumb_crossings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{hand_from_px, open_hand, open_hand_px};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_hand_layout() {
        let reading = SemanticLogic::evaluate(&open_hand(0), &ExerciseDefinition::All);
        // palm center y 320.4, palm width 150
        assert!((reading.denial_lines.primary_y - 185.4).abs() < 1e-9);
        assert!((reading.denial_lines.secondary_y - 215.4).abs() < 1e-9);

        assert_eq!(reading.zone(Finger::Index), Zone::Green);
        assert_eq!(reading.zone(Finger::Pinky), Zone::Green);
        // Thumb tip at y 320 sits just above the palm center
        assert_eq!(reading.zone(Finger::Thumb), Zone::Yellow);
        assert!(reading.thumb_crossings.is_empty());
        assert_eq!(reading.projections.len(), 5);

        let index_square = &reading.counted_squares[Finger::Index.index()];
        assert_eq!((index_square.x, index_square.y), (216.0, 168.0));
        assert!(index_square.active);
        assert!(!reading.counted_squares[Finger::Thumb.index()].active);
    }

    #[test]
    fn test_isolation_limits_targets() {
        let exercise = ExerciseDefinition::Isolation {
            target_fingers: vec![Finger::Index],
        };
        let reading = SemanticLogic::evaluate(&open_hand(0), &exercise);
        assert_eq!(reading.target_fingers, vec![Finger::Index]);
        let middle = &reading.counted_squares[Finger::Middle.index()];
        assert!(!middle.active);
        assert_eq!(middle.color, INACTIVE_SQUARE_COLOR);
    }

    #[test]
    fn test_pinch_maps_tips_to_fingers() {
        let exercise = ExerciseDefinition::Pinch { pinch_pair: [4, 8] };
        assert_eq!(exercise.target_fingers(), vec![Finger::Thumb, Finger::Index]);
        let odd = ExerciseDefinition::Pinch { pinch_pair: [4, 7] };
        assert_eq!(odd.target_fingers(), vec![Finger::Thumb]);
    }

    #[test]
    fn test_thumb_on_index_is_crossing() {
        let mut px = open_hand_px();
        px[4] = px[7];
        let reading = SemanticLogic::evaluate(&hand_from_px(0, &px), &ExerciseDefinition::All);
        assert_eq!(reading.thumb_crossings, vec![Finger::Index]);
    }

    #[test]
    fn test_curled_finger_is_purple() {
        let mut px = open_hand_px();
        px[16] = (345.0, 340.0);
        let reading = SemanticLogic::evaluate(&hand_from_px(0, &px), &ExerciseDefinition::All);
        assert_eq!(reading.zone(Finger::Ring), Zone::Purple);
        assert!(reading.any_in_zone(Zone::Purple));
    }

    #[test]
    fn test_parse_definitions() {
        assert_eq!("all".parse::<ExerciseDefinition>().unwrap(), ExerciseDefinition::All);
        assert_eq!(
            "isolation:index,Ring".parse::<ExerciseDefinition>().unwrap(),
            ExerciseDefinition::Isolation {
                target_fingers: vec![Finger::Index, Finger::Ring]
            }
        );
        assert_eq!(
            "pinch:4,8".parse::<ExerciseDefinition>().unwrap(),
            ExerciseDefinition::Pinch { pinch_pair: [4, 8] }
        );
        assert!("pinch:4".parse::<ExerciseDefinition>().is_err());
        assert!("isolation:toe".parse::<ExerciseDefinition>().is_err());
        assert!("wave".parse::<ExerciseDefinition>().is_err());
    }

    #[test]
    fn test_definition_wire_format() {
        let json = serde_json::to_string(&ExerciseDefinition::Pinch { pinch_pair: [4, 8] }).unwrap();
        assert_eq!(json, r#"{"type":"pinch","pinch_pair":[4,8]}"#);
    }
}
