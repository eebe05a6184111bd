//! Excitation signals for synthesis.
//!
//! Voiced frames get a pulse train whose period glides linearly between
//! consecutive voiced frames; unvoiced frames get deterministic noise.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DspError, DspResult};
use crate::rng::create_stream_rng;

/// Noise used in unvoiced frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    /// Zero-mean, unit-variance Gaussian noise.
    #[default]
    Gaussian,
    /// Random +1/-1 samples.
    Binary,
}

/// Excitation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExcitationConfig {
    /// Samples per pitch frame.
    #[serde(default = "default_frame_shift")]
    pub frame_shift: usize,
    /// Samples between updates of the interpolated period.
    #[serde(default = "default_interpolation_period")]
    pub interpolation_period: usize,
    /// Noise for unvoiced frames.
    #[serde(default)]
    pub noise: NoiseKind,
    /// Noise seed.
    #[serde(default = "default_seed")]
    pub seed: u32,
}

fn default_frame_shift() -> usize {
    80
}

fn default_interpolation_period() -> usize {
    1
}

fn default_seed() -> u32 {
    1
}

impl Default for ExcitationConfig {
    fn default() -> Self {
        Self {
            frame_shift: default_frame_shift(),
            interpolation_period: default_interpolation_period(),
            noise: NoiseKind::default(),
            seed: default_seed(),
        }
    }
}

impl ExcitationConfig {
    /// Checks the frame shift and interpolation period.
    pub fn validate(&self) -> DspResult<()> {
        if self.frame_shift == 0 {
            return Err(DspError::invalid_param("frame_shift", "must be positive"));
        }
        if self.interpolation_period == 0 || self.interpolation_period > self.frame_shift / 2 {
            return Err(DspError::invalid_param(
                "interpolation_period",
                format!(
                    "must be in [1, {}], got {}",
                    self.frame_shift / 2,
                    self.interpolation_period
                ),
            ));
        }
        Ok(())
    }
}

struct NoiseSource {
    kind: NoiseKind,
    rng: Pcg32,
    spare: Option<f64>,
}

impl NoiseSource {
    fn new(kind: NoiseKind, seed: u32) -> Self {
        Self {
            kind,
            rng: create_stream_rng(seed, "excitation-noise"),
            spare: None,
        }
    }

    fn next(&mut self) -> f64 {
        match self.kind {
            NoiseKind::Binary => {
                if self.rng.gen::<bool>() {
                    1.0
                } else {
                    -1.0
                }
            }
            NoiseKind::Gaussian => {
                if let Some(z) = self.spare.take() {
                    return z;
                }
                // Box-Muller; u1 is kept away from zero for the logarithm
                let u1: f64 = 1.0 - self.rng.gen::<f64>();
                let u2: f64 = self.rng.gen();
                let r = (-2.0 * u1.ln()).sqrt();
                let theta = std::f64::consts::TAU * u2;
                self.spare = Some(r * theta.sin());
                r * theta.cos()
            }
        }
    }
}

/// Builds an excitation from a pitch track given as periods in samples.
///
/// A period of 0 marks an unvoiced frame. The output has
/// `(periods.len() - 1) * frame_shift` samples: frame `i` spans the
/// interval between pitch frames `i` and `i + 1`. Inside a voiced interval
/// pulses of height `sqrt(p)` are emitted every `p` samples, `p` moving
/// toward the next frame's period every `interpolation_period` samples. An
/// interval with an unvoiced end point is filled with noise.
///
/// # Errors
/// An invalid config or a negative or non-finite period.
pub fn pulse_excitation(periods: &[f64], config: &ExcitationConfig) -> DspResult<Vec<f64>> {
    config.validate()?;
    if let Some(&p) = periods.iter().find(|p| !(p.is_finite() && **p >= 0.0)) {
        return Err(DspError::invalid_param(
            "periods",
            format!("periods must be finite and non-negative, got {}", p),
        ));
    }
    if periods.len() < 2 {
        return Ok(Vec::new());
    }

    let shift = config.frame_shift;
    let iprd = config.interpolation_period;
    let mut noise = NoiseSource::new(config.noise, config.seed);
    let mut out = Vec::with_capacity((periods.len() - 1) * shift);

    let mut p1 = periods[0];
    let mut pc = p1;
    for &p2 in &periods[1..] {
        let inc = if p1 != 0.0 && p2 != 0.0 {
            (p2 - p1) * iprd as f64 / shift as f64
        } else {
            pc = p2;
            p1 = 0.0;
            0.0
        };

        let mut countdown = (iprd + 1) / 2;
        for _ in 0..shift {
            let x = if p1 == 0.0 {
                noise.next()
            } else {
                pc += 1.0;
                if pc >= p1 {
                    pc -= p1;
                    p1.sqrt()
                } else {
                    0.0
                }
            };
            out.push(x);
            countdown -= 1;
            if countdown == 0 {
                p1 += inc;
                countdown = iprd;
            }
        }
        p1 = p2;
    }

    debug!(
        frames = periods.len(),
        samples = out.len(),
        voiced = periods.iter().filter(|&&p| p != 0.0).count(),
        "excitation built"
    );
    Ok(out)
}

/// Converts a frequency track in Hz (0 = unvoiced) to periods in samples.
pub fn periods_from_frequency(f0: &[f64], sample_rate: f64) -> Vec<f64> {
    f0.iter()
        .map(|&f| if f > 0.0 { sample_rate / f } else { 0.0 })
        .collect()
}
