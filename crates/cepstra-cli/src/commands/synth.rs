//! Synth command implementation
//!
//! Rebuilds a waveform from an `analyze` document and a `pitch` document:
//! pulse/noise excitation filtered through an MLSA filter.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Result};
use colored::Colorize;
use tracing::warn;

use cepstra_dsp::{pulse_excitation, MlsaSynthesizer, PadeOrder};

use super::json_output::{read_json, CepstrumFile, PitchTrack};
use crate::audio_io::write_mono_wav;
use crate::config::PipelineConfig;

/// Command-line overrides for `cepstra synth`.
#[derive(Debug, Clone, Default)]
pub struct SynthOptions {
    pub seed: Option<u32>,
    pub pade: Option<u8>,
    pub transposed: bool,
}

/// Run the synth command
///
/// # Arguments
/// * `cepstrum_path` - JSON written by `cepstra analyze` (gamma 0)
/// * `pitch_path` - JSON written by `cepstra pitch`
/// * `output_path` - WAV file to write
/// * `config` - Pipeline configuration
/// * `options` - Flags overriding `config`
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(
    cepstrum_path: &str,
    pitch_path: &str,
    output_path: &str,
    config: &PipelineConfig,
    options: &SynthOptions,
) -> Result<ExitCode> {
    let cepstrum: CepstrumFile = read_json(cepstrum_path)?;
    let track: PitchTrack = read_json(pitch_path)?;
    check_compatible(&cepstrum, &track)?;

    let mut excitation_config = config.excitation.clone();
    excitation_config.frame_shift = track.frame_shift;
    if let Some(seed) = options.seed {
        excitation_config.seed = seed;
    }
    let pade = match options.pade {
        Some(order) => PadeOrder::try_from(order)?,
        None => config.synthesis.pade,
    };

    println!("{} {}", "Synthesizing:".cyan().bold(), output_path);

    let excitation = pulse_excitation(&track.to_periods(), &excitation_config)?;
    let frames: Vec<Vec<f64>> = cepstrum
        .frames
        .into_iter()
        .map(|f| f.coefficients)
        .collect();
    if frames.len() != track.values.len() {
        warn!(
            cepstrum_frames = frames.len(),
            pitch_frames = track.values.len(),
            "frame counts differ"
        );
    }

    let mut synth = if options.transposed || config.synthesis.transposed {
        MlsaSynthesizer::transposed(cepstrum.order, cepstrum.alpha, pade)?
    } else {
        MlsaSynthesizer::new(cepstrum.order, cepstrum.alpha, pade)?
    };
    let samples = synth.synthesize(&excitation, &frames, cepstrum.frame_shift)?;

    let written = write_mono_wav(Path::new(output_path), &samples, cepstrum.sample_rate)?;
    if written.clipped > 0 {
        warn!(clipped = written.clipped, "output clipped to full scale");
    }

    println!("{} {}", "Samples:".dimmed(), samples.len());
    println!("{} {}", "PCM hash:".dimmed(), written.pcm_hash);
    println!("{} {}", "Output written to:".green().bold(), output_path);

    Ok(ExitCode::SUCCESS)
}

fn check_compatible(cepstrum: &CepstrumFile, track: &PitchTrack) -> Result<()> {
    if cepstrum.gamma != 0.0 {
        bail!(
            "synthesis needs a mel-cepstrum (gamma 0), got gamma {}",
            cepstrum.gamma
        );
    }
    if cepstrum.sample_rate != track.sample_rate {
        bail!(
            "sample rates differ: cepstrum {} Hz, pitch {} Hz",
            cepstrum.sample_rate,
            track.sample_rate
        );
    }
    if cepstrum.frame_shift != track.frame_shift {
        bail!(
            "frame shifts differ: cepstrum {}, pitch {}",
            cepstrum.frame_shift,
            track.frame_shift
        );
    }
    Ok(())
}
