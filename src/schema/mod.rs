//! Unified hand.landmark_frame.v1 schema
//!
//! This module defines the wire record for landmark frames exchanged by the
//! CLI and the C bindings, plus the adapter that parses and validates
//! streams of them.

mod frame;
mod adapter;

pub use frame::*;
pub use adapter::*;
