//! Pitch command implementation
//!
//! Tracks the fundamental frequency of a mono WAV file.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use cepstra_dsp::swipe;

use super::json_output::{write_json, PitchTrack};
use crate::audio_io::read_mono_wav;
use crate::config::{parse_enum, PipelineConfig};

/// Command-line overrides for `cepstra pitch`.
#[derive(Debug, Clone, Default)]
pub struct PitchOptions {
    pub min_hz: Option<f64>,
    pub max_hz: Option<f64>,
    pub threshold: Option<f64>,
    pub frame_shift: Option<usize>,
    pub format: Option<String>,
}

/// Run the pitch command
///
/// # Arguments
/// * `input_path` - Mono WAV file to analyze
/// * `output_path` - Optional output file path (default: stdout)
/// * `config` - Pipeline configuration
/// * `options` - Flags overriding `config`
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(
    input_path: &str,
    output_path: Option<&str>,
    config: &PipelineConfig,
    options: &PitchOptions,
) -> Result<ExitCode> {
    let audio = read_mono_wav(Path::new(input_path))?;

    let mut pitch = config.pitch.clone();
    pitch.sample_rate = audio.sample_rate;
    if let Some(min_hz) = options.min_hz {
        pitch.min_hz = min_hz;
    }
    if let Some(max_hz) = options.max_hz {
        pitch.max_hz = max_hz;
    }
    if let Some(threshold) = options.threshold {
        pitch.voicing_threshold = threshold;
    }
    if let Some(shift) = options.frame_shift {
        pitch.frame_shift = shift;
    }
    if let Some(format) = &options.format {
        pitch.output = parse_enum("format", format)?;
    }

    if output_path.is_some() {
        println!("{} {}", "Tracking pitch:".cyan().bold(), input_path);
    }

    let values = swipe(&audio.samples, &pitch)
        .with_context(|| format!("Pitch estimation failed for {}", input_path))?;

    let track = PitchTrack {
        sample_rate: audio.sample_rate,
        frame_shift: pitch.frame_shift,
        output: pitch.output,
        values,
    };
    write_json(&track, output_path)?;

    Ok(ExitCode::SUCCESS)
}
