//! Pipeline orchestration
//!
//! This module provides the public API for Handsight. A `HandSession` owns
//! one state object per engine and runs every frame through them in a fixed
//! order, so later stages always see the readings they depend on.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::engines::fault::{
    verdicts_from_reading, FaultStrategy, FingerFaultClassifier, FingerVerdict,
};
use crate::engines::{
    AttemptControl, DeadFingerEngine, DeadFingerReading, DeadFingerState, DebugVisionEngine,
    DebugVisionReading, DebugVisionState, GateReading, GateState, ObservationEngineState,
    ObservationReading, ObservationThresholdsEngine, PlausibilityChecksEngine, PlausibilityReading,
    PlausibilityState, ReferenceHandEngine, ReferenceHandState, ReferenceReading, RegimeReading,
    RegimeSwitchingEngine, ScaleNormalizationEngine, ScaleReading, ScaleState, TimeGatingEngine,
    TipConfidenceClassifier, TipConfidenceState,
};
use crate::error::HandError;
use crate::hand::ProjectedHand;
use crate::interpret::{
    ExerciseDefinition, ExerciseInterpreter, ExerciseReading, GuidanceGenerator, GuidanceReading,
    SemanticLogic, SemanticReading,
};
use crate::schema::{FrameAdapter, FrameRecord, ValidationError, FRAME_SCHEMA_VERSION};
use crate::types::{LandmarkFrame, Projector, Viewport, LANDMARK_COUNT};
use crate::{HANDSIGHT_VERSION, PRODUCER_NAME};

/// Merged result of one processed frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub session_id: String,
    /// Zero-based index among accepted frames
    pub frame_index: u64,
    /// Frame time after clamping to the last seen timestamp
    pub timestamp_ms: u64,
    pub scale: ScaleReading,
    pub regime: RegimeReading,
    pub observation: ObservationReading,
    pub plausibility: PlausibilityReading,
    pub dead_finger: DeadFingerReading,
    pub fault_strategy: FaultStrategy,
    pub verdicts: [FingerVerdict; 5],
    pub reference: ReferenceReading,
    pub debug_vision: DebugVisionReading,
    pub gate: GateReading,
    pub semantic: SemanticReading,
    pub exercise: ExerciseReading,
    pub guidance: GuidanceReading,
}

/// Session totals
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub producer: &'static str,
    pub version: &'static str,
    pub exercise: ExerciseDefinition,
    pub fault_strategy: FaultStrategy,
    pub frames_processed: u64,
    pub frames_rejected: u64,
    pub holds_completed: u64,
    pub plausibility_violations: u64,
    pub reference_captured: bool,
    pub last_timestamp_ms: Option<u64>,
    pub computed_at_utc: DateTime<Utc>,
}

/// Stateful processor for one tracked hand.
///
/// Multiple sessions are independent; nothing is shared between them.
pub struct HandSession {
    session_id: String,
    exercise: ExerciseDefinition,
    fault_strategy: FaultStrategy,
    scale: ScaleState,
    observation: ObservationEngineState,
    plausibility: PlausibilityState,
    dead_finger: DeadFingerState,
    tip_confidence: TipConfidenceState,
    reference: ReferenceHandState,
    debug_vision: DebugVisionState,
    gate: GateState,
    last_timestamp_ms: Option<u64>,
    frames_processed: u64,
    frames_rejected: u64,
}

impl Default for HandSession {
    fn default() -> Self {
        Self::new()
    }
}

impl HandSession {
    /// Create a session for the "all fingers" exercise
    pub fn new() -> Self {
        Self::with_exercise(ExerciseDefinition::default())
    }

    pub fn with_exercise(exercise: ExerciseDefinition) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            exercise,
            fault_strategy: FaultStrategy::default(),
            scale: ScaleState::default(),
            observation: ObservationEngineState::default(),
            plausibility: PlausibilityState::default(),
            dead_finger: DeadFingerState::default(),
            tip_confidence: TipConfidenceState::default(),
            reference: ReferenceHandState::default(),
            debug_vision: DebugVisionState::default(),
            gate: GateState::default(),
            last_timestamp_ms: None,
            frames_processed: 0,
            frames_rejected: 0,
        }
    }

    /// Report verdicts from a different fault classifier
    pub fn with_fault_strategy(mut self, strategy: FaultStrategy) -> Self {
        self.fault_strategy = strategy;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn exercise(&self) -> &ExerciseDefinition {
        &self.exercise
    }

    /// Switch exercise; engine state is kept
    pub fn set_exercise(&mut self, exercise: ExerciseDefinition) {
        self.exercise = exercise;
    }

    pub fn gate_state(&self) -> &GateState {
        &self.gate
    }

    pub fn reference_state(&self) -> &ReferenceHandState {
        &self.reference
    }

    /// Run one frame through every engine.
    ///
    /// Returns `None` for frames that cannot be projected (too few
    /// landmarks, non-finite coordinates, failed projection); no engine
    /// state advances for those.
    pub fn process<P: Projector + ?Sized>(
        &mut self,
        frame: &LandmarkFrame,
        projector: &P,
        control: AttemptControl,
    ) -> Option<FrameReport> {
        let mut hand = match project_frame(frame, projector) {
            Ok(hand) => hand,
            Err(e) => {
                self.frames_rejected += 1;
                warn!(
                    session_id = %self.session_id,
                    timestamp_ms = frame.timestamp_ms,
                    error = %e,
                    "frame rejected"
                );
                return None;
            }
        };

        let now_ms = match self.last_timestamp_ms {
            Some(last) if frame.timestamp_ms < last => {
                debug!(
                    timestamp_ms = frame.timestamp_ms,
                    last_ms = last,
                    "timestamp went backwards, clamping"
                );
                last
            }
            _ => frame.timestamp_ms,
        };
        hand.timestamp_ms = now_ms;
        self.last_timestamp_ms = Some(now_ms);

        let scale = ScaleNormalizationEngine::update(&mut self.scale, &hand);
        let regime = RegimeSwitchingEngine::evaluate(&hand);
        let observation = ObservationThresholdsEngine::update(&mut self.observation, &hand);
        let plausibility = PlausibilityChecksEngine::update(&mut self.plausibility, &hand);
        let dead_finger = DeadFingerEngine::update(&mut self.dead_finger, &hand, now_ms);
        let verdicts = match self.fault_strategy {
            FaultStrategy::SegmentScored => verdicts_from_reading(&dead_finger),
            FaultStrategy::TipConfidence => TipConfidenceClassifier.classify(&mut self.tip_confidence, &hand, now_ms),
        };
        let reference = ReferenceHandEngine::update(&mut self.reference, &hand);
        let debug_vision = DebugVisionEngine::update(&mut self.debug_vision, &hand, now_ms);
        let gate = TimeGatingEngine::update(&mut self.gate, regime.mode, observation.global_state, control, now_ms);
        let semantic = SemanticLogic::evaluate(&hand, &self.exercise);
        let exercise = ExerciseInterpreter::evaluate(&semantic, observation.global_state);
        let guidance = GuidanceGenerator::evaluate(scale.status, regime.mode, hand.palm_center, &hand.tips());

        let frame_index = self.frames_processed;
        self.frames_processed += 1;

        trace!(
            frame_index,
            timestamp_ms = now_ms,
            regime = regime.mode_label,
            observation = ?observation.global_state,
            gate = ?gate.status,
            progress = gate.progress,
            "frame processed"
        );

        Some(FrameReport {
            session_id: self.session_id.clone(),
            frame_index,
            timestamp_ms: now_ms,
            scale,
            regime,
            observation,
            plausibility,
            dead_finger,
            fault_strategy: self.fault_strategy,
            verdicts,
            reference,
            debug_vision,
            gate,
            semantic,
            exercise,
            guidance,
        })
    }

    /// Process a wire record, using its control flags
    pub fn process_record<P: Projector + ?Sized>(
        &mut self,
        record: &FrameRecord,
        projector: &P,
    ) -> Result<Option<FrameReport>, HandError> {
        if record.schema_version != FRAME_SCHEMA_VERSION {
            return Err(HandError::InvalidFrame(ValidationError::InvalidSchemaVersion {
                expected: FRAME_SCHEMA_VERSION.to_string(),
                actual: record.schema_version.clone(),
            }));
        }
        Ok(self.process(&record.to_frame(), projector, record.control_or_default()))
    }

    /// Next frame becomes the new reference pose
    pub fn recapture_reference(&mut self) {
        debug!(session_id = %self.session_id, "reference recapture requested");
        self.reference.recapture();
    }

    pub fn pause_for(&mut self, now_ms: u64, duration_ms: u64) {
        self.gate.pause_for(now_ms, duration_ms);
    }

    pub fn resume(&mut self) {
        self.gate.resume();
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            producer: PRODUCER_NAME,
            version: HANDSIGHT_VERSION,
            exercise: self.exercise.clone(),
            fault_strategy: self.fault_strategy,
            frames_processed: self.frames_processed,
            frames_rejected: self.frames_rejected,
            holds_completed: self.gate.holds_completed(),
            plausibility_violations: self.plausibility.total_violations(),
            reference_captured: self.reference.reference().is_some(),
            last_timestamp_ms: self.last_timestamp_ms,
            computed_at_utc: Utc::now(),
        }
    }
}

fn project_frame<P: Projector + ?Sized>(frame: &LandmarkFrame, projector: &P) -> Result<ProjectedHand, HandError> {
    if let Some(index) = frame
        .landmarks
        .iter()
        .take(LANDMARK_COUNT)
        .position(|lm| !lm.is_finite())
    {
        return Err(HandError::InvalidFrame(ValidationError::NonFiniteCoordinate { index }));
    }
    ProjectedHand::from_frame(frame, projector)
}

/// Convert a recorded frame stream (NDJSON or JSON array) to report JSON.
///
/// Runs a fresh session over every record; frames that cannot be projected
/// are skipped.
///
/// # Example
/// ```ignore
/// let reports = frames_to_reports(ndjson, Viewport::new(640.0, 480.0)?, ExerciseDefinition::All)?;
/// ```
pub fn frames_to_reports(
    input: &str,
    viewport: Viewport,
    exercise: ExerciseDefinition,
) -> Result<Vec<String>, HandError> {
    let records = FrameAdapter::parse_auto(input)?;
    let mut session = HandSession::with_exercise(exercise);
    let mut reports = Vec::new();
    for record in &records {
        if let Some(report) = session.process_record(record, &viewport)? {
            let json = serde_json::to_string(&report).map_err(|e| HandError::EncodingError(e.to_string()))?;
            reports.push(json);
        }
    }
    Ok(reports)
}
