//! CLI command implementations

pub mod analyze;
pub mod pitch;
pub mod synth;

mod json_output;

pub use json_output::{CepstrumFile, FrameEstimate, PitchTrack};
