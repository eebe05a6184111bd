//! Analyze command implementation
//!
//! Frames a mono WAV file and fits a mel-cepstrum (or mel-generalized
//! cepstrum when gamma is non-zero) to every frame.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{debug, warn};

use cepstra_dsp::{apply_window, mcep, mgcep, SpectralInput, Termination};

use super::json_output::{write_json, CepstrumFile, FrameEstimate};
use crate::audio_io::read_mono_wav;
use crate::config::{parse_enum, PipelineConfig};

/// Command-line overrides for `cepstra analyze`.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub order: Option<usize>,
    pub alpha: Option<f64>,
    pub gamma: Option<f64>,
    pub frame_length: Option<usize>,
    pub frame_shift: Option<usize>,
    pub window: Option<String>,
}

/// Run the analyze command
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
    options: &AnalyzeOptions,
) -> Result<ExitCode> {
    let mut config = config.clone();
    apply_overrides(&mut config, options)?;
    config.framing.validate()?;
    config.estimator.validate(config.framing.frame_length)?;

    if output_path.is_some() {
        println!("{} {}", "Analyzing:".cyan().bold(), input_path);
    }

    let path = Path::new(input_path);
    let data = fs::read(path).with_context(|| format!("Failed to read file: {}", input_path))?;
    let source_hash = blake3::hash(&data).to_hex().to_string();
    let audio = read_mono_wav(path)?;

    let estimator = &config.estimator;
    let mut frames = Vec::with_capacity(config.framing.frame_count(audio.samples.len()));
    for (t, frame) in config.framing.frames(&audio.samples).enumerate() {
        let windowed = apply_window(&frame, config.window, config.normalization)?;
        let input = SpectralInput::Windowed(&windowed);
        let estimate = if estimator.gamma == 0.0 {
            mcep(input, estimator)
        } else {
            mgcep(input, estimator)
        }
        .with_context(|| format!("Analysis failed at frame {}", t))?;

        frames.push(FrameEstimate {
            coefficients: estimate.coefficients,
            status: estimate.status,
            iterations: estimate.iterations,
        });
    }

    let capped = count_status(&frames, Termination::IterationCap);
    let singular = count_status(&frames, Termination::SingularMatrix);
    if capped + singular > 0 {
        warn!(capped, singular, "some frames did not converge");
    }
    debug!(frames = frames.len(), "analysis finished");

    let result = CepstrumFile {
        sample_rate: audio.sample_rate,
        frame_shift: config.framing.frame_shift,
        order: estimator.order,
        alpha: estimator.alpha,
        gamma: estimator.gamma,
        source_hash,
        frames,
    };
    write_json(&result, output_path)?;

    Ok(ExitCode::SUCCESS)
}

fn apply_overrides(config: &mut PipelineConfig, options: &AnalyzeOptions) -> Result<()> {
    if let Some(order) = options.order {
        config.estimator.order = order;
    }
    if let Some(alpha) = options.alpha {
        config.estimator.alpha = alpha;
    }
    if let Some(gamma) = options.gamma {
        config.estimator.gamma = gamma;
    }
    if let Some(len) = options.frame_length {
        config.framing.frame_length = len;
    }
    if let Some(shift) = options.frame_shift {
        config.framing.frame_shift = shift;
    }
    if let Some(window) = &options.window {
        config.window = parse_enum("window", window)?;
    }
    Ok(())
}

fn count_status(frames: &[FrameEstimate], status: Termination) -> usize {
    frames.iter().filter(|f| f.status == status).count()
}
