//! Per-frame reliability engines
//!
//! Each engine is a unit struct with an associated update function that
//! takes the caller-owned state object for that engine and one projected
//! hand. Engines never fail; degenerate input only degrades confidence.

pub mod dead_finger;
pub mod debug_vision;
pub mod fault;
pub mod observation;
pub mod plausibility;
pub mod reference;
pub mod regime;
pub mod scale;
pub mod time_gating;

pub use dead_finger::{
    DeadFingerEngine, DeadFingerReading, DeadFingerState, FingerDeadness, FingerHealth,
    SegmentState,
};
pub use debug_vision::{
    DebugVisionEngine, DebugVisionReading, DebugVisionState, FingerClassification, FingerFlags,
    Issue, IssueKind, Observability, Severity, VisionState,
};
pub use fault::{
    FaultStrategy, FingerFaultClassifier, FingerVerdict, SegmentScoredClassifier,
    TipConfidenceClassifier, TipConfidenceState,
};
pub use observation::{
    FingerObservation, ObservationEngineState, ObservationReading, ObservationState,
    ObservationThresholdsEngine,
};
pub use plausibility::{
    BoneCheck, BoneStatus, PlausibilityChecksEngine, PlausibilityReading, PlausibilityState,
};
pub use reference::{
    MatchQuality, ReferenceHandEngine, ReferenceHandState, ReferenceReading, TipMatch,
};
pub use regime::{RegimeMode, RegimeReading, RegimeSwitchingEngine};
pub use scale::{ScaleNormalizationEngine, ScaleReading, ScaleState, ScaleStatus};
pub use time_gating::{AttemptControl, GateReading, GateState, GateStatus, TimeGatingEngine};
