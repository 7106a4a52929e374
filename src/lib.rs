//! Handsight - Frame-by-frame reliability classification for tracked hand landmarks
//!
//! Handsight takes the 21-point hand landmark stream of a pose estimator and
//! decides, for every frame, which parts of the hand can be trusted: scale
//! normalization → regime switching → observation thresholds → plausibility
//! checks → dead-finger and reference-hand tracking → debug vision → time
//! gating → exercise semantics and guidance.
//!
//! ## Modules
//!
//! - **Engines**: Stateful per-frame reliability classifiers
//! - **Interpret**: Exercise-level geometry, constraints and guidance
//! - **Pipeline**: `HandSession`, which runs every engine in order

pub mod engines;
pub mod error;
pub mod geometry;
pub mod hand;
pub mod interpret;
pub mod pipeline;
pub mod schema;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

#[cfg(test)]
mod test_support;

pub use error::HandError;
pub use hand::ProjectedHand;
pub use pipeline::{frames_to_reports, FrameReport, HandSession, SessionSummary};
pub use types::{Finger, Landmark, LandmarkFrame, PixelPoint, Projector, Viewport};

// Schema exports
pub use schema::{FrameAdapter, FrameRecord, FRAME_SCHEMA_VERSION};

// Interpretation exports
pub use interpret::ExerciseDefinition;

/// Handsight version embedded in session summaries
pub const HANDSIGHT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for session summaries
pub const PRODUCER_NAME: &str = "handsight";
