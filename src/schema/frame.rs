//! hand.landmark_frame.v1 schema definition
//!
//! One record per captured frame, as emitted by a pose-estimation bridge:
//! - 21 normalized landmarks (x/y in 0-1, z optional and unused)
//! - Optional temporally smoothed landmarks for the same frame
//! - Optional attempt control flags from the host application

use serde::{Deserialize, Serialize};

use crate::engines::time_gating::AttemptControl;
use crate::types::{Landmark, LandmarkFrame, LANDMARK_COUNT};

/// Current schema version
pub const FRAME_SCHEMA_VERSION: &str = "hand.landmark_frame.v1";

/// The main hand.landmark_frame.v1 record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Schema version identifier
    pub schema_version: String,
    /// Optional caller-assigned frame identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
    /// Capture time in milliseconds (monotonic)
    pub timestamp_ms: u64,
    /// Raw estimator landmarks
    pub landmarks: Vec<Landmark>,
    /// Filtered landmarks, if the bridge runs a smoother
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothed: Option<Vec<Landmark>>,
    /// Attempt state at capture time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<AttemptControl>,
}

impl FrameRecord {
    /// Wrap a frame in a versioned record
    pub fn from_frame(frame: &LandmarkFrame) -> Self {
        FrameRecord {
            schema_version: FRAME_SCHEMA_VERSION.to_string(),
            frame_id: None,
            timestamp_ms: frame.timestamp_ms,
            landmarks: frame.landmarks.clone(),
            smoothed: frame.smoothed.clone(),
            control: None,
        }
    }

    pub fn with_control(mut self, control: AttemptControl) -> Self {
        self.control = Some(control);
        self
    }

    pub fn with_frame_id(mut self, frame_id: impl Into<String>) -> Self {
        self.frame_id = Some(frame_id.into());
        self
    }

    /// Validate the record schema
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != FRAME_SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: FRAME_SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        if self.landmarks.len() != LANDMARK_COUNT {
            return Err(ValidationError::LandmarkCount {
                expected: LANDMARK_COUNT,
                actual: self.landmarks.len(),
            });
        }

        if let Some(index) = self.landmarks.iter().position(|lm| !lm.is_finite()) {
            return Err(ValidationError::NonFiniteCoordinate { index });
        }

        if let Some(smoothed) = &self.smoothed {
            if smoothed.len() != LANDMARK_COUNT {
                return Err(ValidationError::SmoothedCount {
                    expected: LANDMARK_COUNT,
                    actual: smoothed.len(),
                });
            }
        }

        Ok(())
    }

    /// Engine-facing frame (landmarks only)
    pub fn to_frame(&self) -> LandmarkFrame {
        LandmarkFrame {
            timestamp_ms: self.timestamp_ms,
            landmarks: self.landmarks.clone(),
            smoothed: self.smoothed.clone(),
        }
    }

    pub fn control_or_default(&self) -> AttemptControl {
        self.control.unwrap_or_default()
    }
}

/// Validation errors for frame records
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Expected {expected} landmarks, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },

    #[error("Landmark {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },

    #[error("Expected {expected} smoothed landmarks, got {actual}")]
    SmoothedCount { expected: usize, actual: usize },
}
