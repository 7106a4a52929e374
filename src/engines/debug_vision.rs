//! Composite debug-vision classifier
//!
//! A single pass over the frame that looks for every failure signature the
//! estimator is known to produce: hand too small, edge-on hand, overlapping
//! tips, swapped finger identities, raw-only jitter, bones that change length
//! too fast, foreshortened fingers, tips that stay frozen while the hand
//! moves, and motion on fingers that should not be trackable at all.
//!
//! Results are independent of the dedicated observation and plausibility
//! engines; the thresholds here are tuned for the debug overlay.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::distance;
use crate::hand::ProjectedHand;
use crate::types::{Finger, PixelPoint};

pub const LOW_SCALE_PX: f64 = 80.0;
pub const SIDEWAYS_RATIO: f64 = 0.35;

const OCCLUSION_MIN_PX: f64 = 12.0;
const OCCLUSION_PALM_FRACTION: f64 = 0.12;

const GLOBAL_JITTER_RAW: f64 = 0.18;
const GLOBAL_JITTER_SMOOTHED: f64 = 0.08;

const BONE_CHANGE_LIMIT: f64 = 0.45;
const BONE_MIN_PREV: f64 = 0.01;

const FORESHORTEN_FACTOR: f64 = 0.6;
const FORESHORTEN_MIN_PREV: f64 = 0.2;
const COLLAPSE_RATIO: f64 = 0.22;

const TIP_JUMP_FRACTION: f64 = 0.25;

const FROZEN_TIP_PX: f64 = 1.2;
const FROZEN_HAND_MOTION_PX: f64 = 4.0;
pub const FROZEN_FRAMES: u32 = 6;

const HALLUCINATION_FRACTION: f64 = 0.12;

pub const TRAIL_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisionState {
    Observed,
    Less,
    Dead,
    Frozen,
}

impl VisionState {
    pub fn color(self) -> &'static str {
        match self {
            VisionState::Observed => "#38c88c",
            VisionState::Less => "#f2c94c",
            VisionState::Dead => "#e07a7a",
            VisionState::Frozen => "#9aa0a6",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Observability {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    LowScale,
    Sideways,
    Occlusion,
    Identity,
    Jitter,
    Geometry,
    Foreshortening,
    Hallucination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    pub severity: Severity,
}

impl Issue {
    fn new(kind: IssueKind, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind,
            message: message.into(),
            severity,
        }
    }
}

pub const BLOCKER_LOW_SCALE: &str = "Hand too small";
pub const BLOCKER_SIDEWAYS: &str = "Sideways regime";
pub const BLOCKER_OCCLUSION: &str = "Occlusion";
pub const BLOCKER_IDENTITY: &str = "Finger identity ambiguous";
pub const BLOCKER_GEOMETRY: &str = "Impossible geometry";
pub const BLOCKER_HALLUCINATION: &str = "Hallucinated continuation";
pub const BLOCKER_JITTER: &str = "Landmark jitter";

/// Fault flags raised for one finger this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FingerFlags {
    pub occluded: bool,
    pub foreshortened: bool,
    pub jitter: bool,
    pub geometry: bool,
    pub ambiguity: bool,
    pub frozen: bool,
    pub collapse: bool,
    pub movement_px: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FingerClassification {
    pub finger: Finger,
    pub name: &'static str,
    pub state: VisionState,
    pub color: &'static str,
    pub flags: FingerFlags,
}

/// One fingertip sample in a trail
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub x: f64,
    pub y: f64,
    pub t_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugVisionState {
    last_points: Option<Vec<PixelPoint>>,
    last_smoothed: Option<Vec<PixelPoint>>,
    last_palm_center: Option<PixelPoint>,
    last_finger_ratios: [Option<f64>; 5],
    last_bone_lengths: Option<[[f64; 3]; 5]>,
    last_tip_order: Option<[usize; 4]>,
    frozen_counters: [u32; 5],
    trails: [VecDeque<TrailPoint>; 5],
    last_observability: Option<Observability>,
}

impl DebugVisionState {
    pub fn trail(&self, finger: Finger) -> &VecDeque<TrailPoint> {
        &self.trails[finger.index()]
    }

    pub fn frozen_counter(&self, finger: Finger) -> u32 {
        self.frozen_counters[finger.index()]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugVisionReading {
    pub palm_width_px: f64,
    pub hand_length_px: f64,
    pub palm_center: PixelPoint,
    pub low_scale: bool,
    pub sideways: bool,
    pub regime_label: &'static str,
    pub global_observability: Observability,
    pub per_finger: Vec<FingerClassification>,
    pub issues: Vec<Issue>,
    pub blockers: Vec<&'static str>,
    /// Tip trails including this frame, oldest first
    pub trails: Vec<Vec<TrailPoint>>,
}

impl DebugVisionReading {
    pub fn has_blocker(&self, blocker: &str) -> bool {
        self.blockers.contains(&blocker)
    }
}

fn push_unique(blockers: &mut Vec<&'static str>, blocker: &'static str) {
    if !blockers.contains(&blocker) {
        blockers.push(blocker);
    }
}

pub struct DebugVisionEngine;

impl DebugVisionEngine {
    pub fn update(state: &mut DebugVisionState, hand: &ProjectedHand, now_ms: u64) -> DebugVisionReading {
        let points = &hand.points;
        let palm_width = hand.palm_width_px;
        let palm = hand.palm_divisor();
        let hand_motion = state
            .last_palm_center
            .map(|prev| distance(hand.palm_center, prev))
            .unwrap_or(0.0);

        let low_scale = palm_width < LOW_SCALE_PX;
        let sideways = hand.hand_length_px > 0.0 && palm_width / hand.hand_length_px < SIDEWAYS_RATIO;

        let mut issues = Vec::new();
        let mut blockers = Vec::new();
        let mut flags = [FingerFlags::default(); 5];

        if low_scale {
            issues.push(Issue::new(IssueKind::LowScale, "Low resolution: hand too small", Severity::High));
            push_unique(&mut blockers, BLOCKER_LOW_SCALE);
        }
        if sideways {
            issues.push(Issue::new(IssueKind::Sideways, "Sideways hand regime active", Severity::Medium));
            push_unique(&mut blockers, BLOCKER_SIDEWAYS);
        }

        // Overlapping fingertips
        let tips = hand.tips();
        let occlusion_threshold = OCCLUSION_MIN_PX.max(palm_width * OCCLUSION_PALM_FRACTION);
        let mut occlusion_pairs = Vec::new();
        for i in 0..tips.len() {
            for j in (i + 1)..tips.len() {
                if distance(tips[i], tips[j]) < occlusion_threshold {
                    occlusion_pairs.push((i, j));
                    flags[i].occluded = true;
                    flags[j].occluded = true;
                }
            }
        }
        if !occlusion_pairs.is_empty() {
            issues.push(Issue::new(IssueKind::Occlusion, "Occlusion: fingertips overlapping", Severity::High));
            push_unique(&mut blockers, BLOCKER_OCCLUSION);
        }

        // Identity swap: lateral order of the four fingers changed under occlusion
        let order = lateral_order(&tips);
        let order_changed = state.last_tip_order.is_some_and(|prev| prev != order);
        if order_changed && !occlusion_pairs.is_empty() {
            let closest = occlusion_pairs
                .iter()
                .filter(|&&(a, b)| a != Finger::Thumb.index() && b != Finger::Thumb.index())
                .min_by(|&&(a1, b1), &&(a2, b2)| {
                    distance(tips[a1], tips[b1]).total_cmp(&distance(tips[a2], tips[b2]))
                });
            if let Some(&(a, b)) = closest {
                flags[a].ambiguity = true;
                flags[b].ambiguity = true;
                let label = format!("{}/{}", Finger::ALL[a].label(), Finger::ALL[b].label());
                issues.push(Issue::new(
                    IssueKind::Identity,
                    format!("Finger identity ambiguous: {label}"),
                    Severity::High,
                ));
                push_unique(&mut blockers, BLOCKER_IDENTITY);
            }
        }
        state.last_tip_order = Some(order);

        // Raw tips jump while the smoothed stream stays put
        let jitter_global = match &state.last_points {
            Some(last) => {
                let raw = mean_tip_delta(&tips, last) / palm;
                let smoothed_quiet = match (&hand.smoothed, &state.last_smoothed) {
                    (Some(now), Some(prev)) => {
                        let now_tips = Finger::ALL.map(|f| now[f.tip()]);
                        mean_tip_delta(&now_tips, prev) / palm < GLOBAL_JITTER_SMOOTHED
                    }
                    // Without a filtered pair to compare, raw motion alone decides
                    _ => true,
                };
                raw > GLOBAL_JITTER_RAW && smoothed_quiet
            }
            None => false,
        };
        if jitter_global {
            issues.push(Issue::new(IssueKind::Jitter, "Excessive landmark jitter", Severity::Medium));
        }

        // Bones that change length faster than anatomy allows
        let mut bone_lengths = [[0.0; 3]; 5];
        let mut geometry_issue = false;
        for finger in Finger::ALL {
            let f = finger.index();
            let chain = finger.chain();
            for j in 0..3 {
                let length = distance(points[chain[j]], points[chain[j + 1]]) / palm;
                bone_lengths[f][j] = length;
                if let Some(prev_lengths) = &state.last_bone_lengths {
                    let prev = prev_lengths[f][j];
                    if prev > BONE_MIN_PREV && (length - prev).abs() / prev > BONE_CHANGE_LIMIT {
                        flags[f].geometry = true;
                        geometry_issue = true;
                    }
                }
            }
        }
        if geometry_issue {
            issues.push(Issue::new(IssueKind::Geometry, "Impossible bone geometry detected", Severity::High));
            push_unique(&mut blockers, BLOCKER_GEOMETRY);
        }

        // Length collapse, foreshortening and tip motion per finger
        for finger in Finger::ALL {
            let f = finger.index();
            let ratio = hand.finger_length_ratio(finger);
            if let Some(prev) = state.last_finger_ratios[f] {
                if prev > FORESHORTEN_MIN_PREV && ratio < prev * FORESHORTEN_FACTOR {
                    flags[f].foreshortened = true;
                }
            }
            state.last_finger_ratios[f] = Some(ratio);
            flags[f].collapse = ratio < COLLAPSE_RATIO;

            if let Some(last) = &state.last_points {
                let delta = distance(tips[f], last[finger.tip()]);
                flags[f].movement_px = delta;
                flags[f].jitter = delta / palm > TIP_JUMP_FRACTION;
            }
        }
        if let Some(finger) = Finger::ALL.iter().find(|f| flags[f.index()].foreshortened) {
            issues.push(Issue::new(
                IssueKind::Foreshortening,
                format!("Foreshortening: {} length unreliable", finger.label()),
                Severity::Medium,
            ));
        }

        // Tip holds still while the palm travels
        if state.last_points.is_some() {
            for f in 0..5 {
                let counter = &mut state.frozen_counters[f];
                if flags[f].movement_px < FROZEN_TIP_PX && hand_motion > FROZEN_HAND_MOTION_PX {
                    *counter += 1;
                } else {
                    *counter = counter.saturating_sub(1);
                }
                flags[f].frozen = *counter >= FROZEN_FRAMES;
            }
        }

        let per_finger: Vec<FingerClassification> = Finger::ALL
            .iter()
            .map(|&finger| {
                let fl = flags[finger.index()];
                let soft_fault = fl.occluded
                    || fl.foreshortened
                    || fl.jitter
                    || fl.geometry
                    || fl.ambiguity
                    || low_scale
                    || sideways;
                let state = if fl.frozen {
                    VisionState::Frozen
                } else if fl.collapse && (fl.occluded || low_scale || sideways || fl.geometry) {
                    VisionState::Dead
                } else if soft_fault {
                    VisionState::Less
                } else {
                    VisionState::Observed
                };
                FingerClassification {
                    finger,
                    name: finger.label(),
                    state,
                    color: state.color(),
                    flags: fl,
                }
            })
            .collect();

        let count = |s: VisionState| per_finger.iter().filter(|f| f.state == s).count();
        let global_observability = if low_scale || count(VisionState::Dead) > 0 || count(VisionState::Observed) == 0 {
            Observability::Low
        } else if count(VisionState::Less) > 0 || count(VisionState::Frozen) > 0 {
            Observability::Moderate
        } else {
            Observability::High
        };

        // Motion on a finger whose fault state says it cannot be tracked
        let hallucinated = per_finger.iter().find(|f| {
            matches!(f.state, VisionState::Less | VisionState::Dead)
                && f.flags.movement_px > palm_width * HALLUCINATION_FRACTION
                && (f.flags.occluded || low_scale || sideways)
        });
        if let Some(f) = hallucinated {
            issues.push(Issue::new(
                IssueKind::Hallucination,
                format!("Hallucinated continuation: {} moving", f.name),
                Severity::High,
            ));
            push_unique(&mut blockers, BLOCKER_HALLUCINATION);
        }

        if jitter_global {
            push_unique(&mut blockers, BLOCKER_JITTER);
        }

        if state.last_observability != Some(global_observability) {
            debug!(
                observability = ?global_observability,
                blockers = ?blockers,
                "debug-vision observability changed"
            );
            state.last_observability = Some(global_observability);
        }

        state.last_points = Some(points.clone());
        state.last_smoothed = hand.smoothed.clone();
        state.last_bone_lengths = Some(bone_lengths);
        state.last_palm_center = Some(hand.palm_center);

        for (trail, tip) in state.trails.iter_mut().zip(tips.iter()) {
            trail.push_back(TrailPoint {
                x: tip.x,
                y: tip.y,
                t_ms: now_ms,
            });
            while trail.len() > TRAIL_CAPACITY {
                trail.pop_front();
            }
        }

        DebugVisionReading {
            palm_width_px: palm_width,
            hand_length_px: hand.hand_length_px,
            palm_center: hand.palm_center,
            low_scale,
            sideways,
            regime_label: if sideways { "Sideways" } else { "Front-facing" },
            global_observability,
            per_finger,
            issues,
            blockers,
            trails: state.trails.iter().map(|t| t.iter().copied().collect()).collect(),
        }
    }
}

/// Non-thumb fingers sorted left to right by tip x
fn lateral_order(tips: &[PixelPoint; 5]) -> [usize; 4] {
    let mut order = [1, 2, 3, 4];
    order.sort_by(|&a, &b| tips[a].x.total_cmp(&tips[b].x));
    order
}

fn mean_tip_delta(tips: &[PixelPoint; 5], last: &[PixelPoint]) -> f64 {
    Finger::ALL
        .iter()
        .map(|f| distance(tips[f.index()], last[f.tip()]))
        .sum::<f64>()
        / 5.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{hand_from_px, open_hand, open_hand_px, scaled, shifted};
    use pretty_assertions::assert_eq;

    fn make_state() -> DebugVisionState {
        DebugVisionState::default()
    }

    fn make_shifted_hand(ts: u64, dx: f64) -> ProjectedHand {
        hand_from_px(ts, &shifted(&open_hand_px(), dx, 0.0))
    }

    /// Index joints pulled toward the index MCP by `factor`
    fn make_shortened_index(factor: f64) -> Vec<(f64, f64)> {
        let mut px = open_hand_px();
        let (mx, my) = px[5];
        for p in px.iter_mut().take(9).skip(6) {
            *p = (mx + (p.0 - mx) * factor, my + (p.1 - my) * factor);
        }
        px
    }

    /// Index folded flat onto its MCP with the thumb tip resting on it
    fn make_collapsed_index() -> Vec<(f64, f64)> {
        let mut px = open_hand_px();
        px[6] = (245.0, 292.0);
        px[7] = (245.0, 285.0);
        px[8] = (245.0, 280.0);
        px[4] = (250.0, 282.0);
        px
    }

    /// Stretch vertically about the wrist; palm width is unchanged
    fn make_edge_on(px: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let (_, wy) = px[0];
        px.iter().map(|&(x, y)| (x, wy + (y - wy) * 2.0)).collect()
    }

    #[test]
    fn test_clean_hand_is_high() {
        let mut state = make_state();
        DebugVisionEngine::update(&mut state, &open_hand(0), 0);
        let reading = DebugVisionEngine::update(&mut state, &open_hand(33), 33);
        assert_eq!(reading.global_observability, Observability::High);
        assert!(reading.issues.is_empty());
        assert!(reading.blockers.is_empty());
        assert_eq!(reading.regime_label, "Front-facing");
        assert!(reading.per_finger.iter().all(|f| f.state == VisionState::Observed));
    }

    #[test]
    fn test_overlapping_tips_flag_occlusion() {
        let mut px = open_hand_px();
        px[12] = px[8];
        let mut state = make_state();
        let reading = DebugVisionEngine::update(&mut state, &hand_from_px(0, &px), 0);

        assert!(reading.per_finger[Finger::Index.index()].flags.occluded);
        assert!(reading.per_finger[Finger::Middle.index()].flags.occluded);
        assert!(!reading.per_finger[Finger::Ring.index()].flags.occluded);
        assert_eq!(reading.blockers, vec![BLOCKER_OCCLUSION]);
        assert_eq!(reading.per_finger[Finger::Index.index()].state, VisionState::Less);
        assert_eq!(reading.global_observability, Observability::Moderate);
    }

    #[test]
    fn test_swapped_tips_are_ambiguous() {
        let mut state = make_state();
        DebugVisionEngine::update(&mut state, &open_hand(0), 0);

        let mut px = open_hand_px();
        px[8] = (262.0, 168.0);
        px[12] = (258.0, 168.0);
        let reading = DebugVisionEngine::update(&mut state, &hand_from_px(33, &px), 33);

        assert!(reading.per_finger[Finger::Index.index()].flags.ambiguity);
        assert!(reading.per_finger[Finger::Middle.index()].flags.ambiguity);
        assert!(reading.has_blocker(BLOCKER_IDENTITY));
        assert!(reading
            .issues
            .iter()
            .any(|i| i.message == "Finger identity ambiguous: Index/Middle"));
        // Both tips travelled more than 12% of the palm while occluded
        assert!(reading.has_blocker(BLOCKER_HALLUCINATION));
    }

    #[test]
    fn test_raw_jump_without_smoothed_is_jitter() {
        let mut state = make_state();
        DebugVisionEngine::update(&mut state, &open_hand(0), 0);
        // 30px on a 150px palm = 0.2
        let reading = DebugVisionEngine::update(&mut state, &make_shifted_hand(33, 30.0), 33);
        assert!(reading.issues.iter().any(|i| i.kind == IssueKind::Jitter));
        assert!(reading.has_blocker(BLOCKER_JITTER));
    }

    #[test]
    fn test_smoothed_motion_suppresses_jitter() {
        let mut state = make_state();
        let first = open_hand(0);
        let first = ProjectedHand::from_points(0, first.points.clone(), Some(first.points)).unwrap();
        DebugVisionEngine::update(&mut state, &first, 0);

        let moved = make_shifted_hand(33, 30.0);
        let moved = ProjectedHand::from_points(33, moved.points.clone(), Some(moved.points)).unwrap();
        let reading = DebugVisionEngine::update(&mut state, &moved, 33);
        assert!(!reading.has_blocker(BLOCKER_JITTER));
    }

    #[test]
    fn test_tip_stuck_while_hand_moves_is_frozen() {
        let mut state = make_state();
        let base = open_hand_px();
        let stuck_tip = base[8];

        let mut last = None;
        for i in 0..=FROZEN_FRAMES as u64 {
            let mut px = shifted(&base, 5.0 * i as f64, 0.0);
            px[8] = stuck_tip;
            let reading = DebugVisionEngine::update(&mut state, &hand_from_px(i * 33, &px), i * 33);
            if i < FROZEN_FRAMES as u64 {
                assert_ne!(reading.per_finger[Finger::Index.index()].state, VisionState::Frozen);
            }
            last = Some(reading);
        }
        let reading = last.unwrap();
        assert_eq!(reading.per_finger[Finger::Index.index()].state, VisionState::Frozen);
        assert_eq!(reading.per_finger[Finger::Middle.index()].state, VisionState::Observed);
        assert_eq!(reading.global_observability, Observability::Moderate);
        assert_eq!(state.frozen_counter(Finger::Index), FROZEN_FRAMES);
        assert_eq!(state.frozen_counter(Finger::Middle), 0);
    }

    #[test]
    fn test_small_hand_is_low() {
        let mut state = make_state();
        let small = hand_from_px(0, &scaled(&open_hand_px(), 0.5));
        let reading = DebugVisionEngine::update(&mut state, &small, 0);
        assert!(reading.low_scale);
        assert_eq!(reading.global_observability, Observability::Low);
        assert_eq!(reading.blockers[0], BLOCKER_LOW_SCALE);
    }

    #[test]
    fn test_trails_bounded_with_timestamps() {
        let mut state = make_state();
        for i in 0..15u64 {
            DebugVisionEngine::update(&mut state, &open_hand(i * 33), i * 33);
        }
        let trail = state.trail(Finger::Pinky);
        assert_eq!(trail.len(), TRAIL_CAPACITY);
        assert_eq!(trail.front().map(|p| p.t_ms), Some(5 * 33));
        assert_eq!(trail.back().map(|p| p.t_ms), Some(14 * 33));
    }

    #[test]
    fn test_bone_stretch_is_impossible_geometry() {
        let mut state = make_state();
        DebugVisionEngine::update(&mut state, &open_hand(0), 0);

        // Distal index bone doubles in length within one frame
        let mut px = open_hand_px();
        px[8] = (235.0, 145.0);
        let reading = DebugVisionEngine::update(&mut state, &hand_from_px(33, &px), 33);

        let index = &reading.per_finger[Finger::Index.index()];
        assert!(index.flags.geometry);
        assert!(!index.flags.jitter);
        assert_eq!(index.state, VisionState::Less);
        assert!(!reading.per_finger[Finger::Middle.index()].flags.geometry);
        assert!(reading.issues.iter().any(|i| i.kind == IssueKind::Geometry));
        assert_eq!(reading.blockers, vec![BLOCKER_GEOMETRY]);
        assert_eq!(reading.global_observability, Observability::Moderate);
    }

    #[test]
    fn test_sudden_shortening_is_foreshortened() {
        let mut state = make_state();
        DebugVisionEngine::update(&mut state, &open_hand(0), 0);

        let shortened = hand_from_px(33, &make_shortened_index(0.58));
        let reading = DebugVisionEngine::update(&mut state, &shortened, 33);

        let index = &reading.per_finger[Finger::Index.index()];
        assert!(index.flags.foreshortened);
        assert!(!index.flags.geometry);
        assert!(!index.flags.collapse);
        assert_eq!(index.state, VisionState::Less);
        let issue = reading
            .issues
            .iter()
            .find(|i| i.kind == IssueKind::Foreshortening)
            .unwrap();
        assert_eq!(issue.message, "Foreshortening: Index length unreliable");
        assert_eq!(issue.severity, Severity::Medium);
        assert!(!reading.has_blocker(BLOCKER_GEOMETRY));
    }

    #[test]
    fn test_collapsed_occluded_finger_is_dead() {
        let mut state = make_state();
        let collapsed = hand_from_px(0, &make_collapsed_index());
        let reading = DebugVisionEngine::update(&mut state, &collapsed, 0);

        let index = &reading.per_finger[Finger::Index.index()];
        assert!(index.flags.collapse);
        assert!(index.flags.occluded);
        assert_eq!(index.state, VisionState::Dead);
        assert_eq!(index.color, VisionState::Dead.color());

        // The thumb is occluded but keeps its length, so it is only degraded
        let thumb = &reading.per_finger[Finger::Thumb.index()];
        assert!(thumb.flags.occluded);
        assert!(!thumb.flags.collapse);
        assert_eq!(thumb.state, VisionState::Less);

        assert_eq!(reading.per_finger[Finger::Ring.index()].state, VisionState::Observed);
        assert_eq!(reading.global_observability, Observability::Low);
        assert!(reading.has_blocker(BLOCKER_OCCLUSION));
    }

    #[test]
    fn test_frozen_outranks_dead() {
        let mut state = make_state();
        DebugVisionEngine::update(&mut state, &hand_from_px(0, &make_collapsed_index()), 0);

        state.frozen_counters[Finger::Index.index()] = FROZEN_FRAMES + 2;
        let reading = DebugVisionEngine::update(&mut state, &hand_from_px(33, &make_collapsed_index()), 33);

        let index = &reading.per_finger[Finger::Index.index()];
        assert!(index.flags.collapse && index.flags.occluded && index.flags.frozen);
        assert_eq!(index.state, VisionState::Frozen);
        assert_eq!(state.frozen_counter(Finger::Index), FROZEN_FRAMES + 1);
        assert_eq!(reading.global_observability, Observability::Moderate);
    }

    #[test]
    fn test_sideways_motion_is_hallucinated() {
        let mut state = make_state();
        let edge_on = make_edge_on(&open_hand_px());
        DebugVisionEngine::update(&mut state, &hand_from_px(0, &edge_on), 0);
        let reading = DebugVisionEngine::update(&mut state, &hand_from_px(33, &shifted(&edge_on, 30.0, 0.0)), 33);

        assert!(reading.sideways);
        assert_eq!(reading.regime_label, "Sideways");
        assert!(reading.per_finger.iter().all(|f| !f.flags.occluded));
        assert!(reading.per_finger.iter().all(|f| f.state == VisionState::Less));
        assert!(reading.has_blocker(BLOCKER_SIDEWAYS));
        assert!(reading.has_blocker(BLOCKER_HALLUCINATION));
        assert!(!reading.has_blocker(BLOCKER_OCCLUSION));
        assert!(reading
            .issues
            .iter()
            .any(|i| i.message == "Hallucinated continuation: Thumb moving"));
        // No finger is observed at all
        assert_eq!(reading.global_observability, Observability::Low);
    }

    #[test]
    fn test_small_hand_motion_is_hallucinated() {
        let mut state = make_state();
        let small = scaled(&open_hand_px(), 0.5);
        DebugVisionEngine::update(&mut state, &hand_from_px(0, &small), 0);
        let reading = DebugVisionEngine::update(&mut state, &hand_from_px(33, &shifted(&small, 20.0, 0.0)), 33);

        assert!(reading.low_scale);
        assert!(!reading.sideways);
        assert!(reading.per_finger.iter().all(|f| !f.flags.occluded));
        assert!(reading.has_blocker(BLOCKER_HALLUCINATION));
        assert_eq!(reading.blockers[0], BLOCKER_LOW_SCALE);
        assert_eq!(reading.global_observability, Observability::Low);
    }
}
