//! Exercise-level interpretation of the engine outputs
//!
//! These run after the reliability engines and are pure functions of the
//! current frame plus the readings produced before them.

pub mod exercise;
pub mod guidance;
pub mod semantic;

pub use exercise::{Constraint, ExerciseInterpreter, ExerciseReading, Intent};
pub use guidance::{Arrow, GuidanceGenerator, GuidanceReading, Prompt};
pub use semantic::{
    CountedSquare, DenialLines, ExerciseDefinition, Projection, SemanticLogic, SemanticReading,
    SemanticTip, Zone,
};
