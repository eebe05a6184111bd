//! JSON documents exchanged between commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use cepstra_dsp::{periods_from_frequency, PitchOutput, Termination, UNVOICED_LOG_F0};

/// Output of `cepstra analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CepstrumFile {
    /// Sample rate of the analyzed signal.
    pub sample_rate: u32,
    /// Samples between frames.
    pub frame_shift: usize,
    /// Model order.
    pub order: usize,
    /// All-pass constant.
    pub alpha: f64,
    /// Generalization exponent; 0 for a mel-cepstrum.
    pub gamma: f64,
    /// BLAKE3 hash of the input file.
    pub source_hash: String,
    /// One estimate per frame.
    pub frames: Vec<FrameEstimate>,
}

/// Estimate for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEstimate {
    pub coefficients: Vec<f64>,
    pub status: Termination,
    pub iterations: usize,
}

/// Output of `cepstra pitch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchTrack {
    /// Sample rate of the analyzed signal.
    pub sample_rate: u32,
    /// Samples between frames.
    pub frame_shift: usize,
    /// Encoding of `values`.
    pub output: PitchOutput,
    /// One value per frame.
    pub values: Vec<f64>,
}

impl PitchTrack {
    /// The track as periods in samples, 0 when unvoiced.
    pub fn to_periods(&self) -> Vec<f64> {
        let rate = self.sample_rate as f64;
        match self.output {
            PitchOutput::Period => self.values.clone(),
            PitchOutput::Frequency => periods_from_frequency(&self.values, rate),
            PitchOutput::LogFrequency => self
                .values
                .iter()
                .map(|&v| if v <= UNVOICED_LOG_F0 { 0.0 } else { rate / v.exp() })
                .collect(),
        }
    }
}

/// Reads a JSON document written by another command.
pub(crate) fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let text = fs::read_to_string(Path::new(path))
        .with_context(|| format!("Failed to read file: {}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse JSON: {}", path))
}

/// Writes `value` as pretty JSON to `output_path`, or to stdout.
pub(crate) fn write_json<T: Serialize>(value: &T, output_path: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(out_path) = output_path {
        fs::write(out_path, &json).with_context(|| format!("Failed to write to: {}", out_path))?;
        println!("{} {}", "Output written to:".green().bold(), out_path);
    } else {
        println!("{}", json);
    }
    Ok(())
}
