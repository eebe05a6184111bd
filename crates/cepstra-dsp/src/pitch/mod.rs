//! SWIPE' pitch estimation.
//!
//! Candidates are spaced 1/96 octave apart between `min_hz` and `max_hz`.
//! For each of several power-of-two Hann window sizes the signal's loudness
//! on an ERB-spaced frequency grid is correlated with a sawtooth-inspired
//! kernel per candidate (peaks at the first and prime harmonics only). Each
//! candidate is scored by the one or two window sizes closest to its ideal
//! size, blended by a triangular weight in log2 distance. The best candidate
//! per frame is refined with a parabola over 1/768-octave steps.
//!
//! Frames are independent; there is no smoothing across frames.

mod interp;
mod loudness;
mod strength;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DspError, DspResult};
use interp::bisect;
use strength::{accumulate, prime_harmonics, WindowBand};

/// Log-frequency value of an unvoiced frame.
pub const UNVOICED_LOG_F0: f64 = -1e10;

/// ERB spacing of the loudness grid.
const ERB_STEP: f64 = 0.1;
/// Refinement step: 1/768 octave.
const REFINE_STEP: f64 = 0.0013028;
/// Candidate spacing: 1/96 octave.
const CANDIDATE_STEP: f64 = 1.0 / 96.0;

/// Encoding of the pitch track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchOutput {
    /// Period in samples, 0 when unvoiced.
    Period,
    /// Frequency in Hz, 0 when unvoiced.
    #[default]
    Frequency,
    /// Natural log of the frequency, [`UNVOICED_LOG_F0`] when unvoiced.
    LogFrequency,
}

impl PitchOutput {
    fn encode(self, f0: f64, sample_rate: f64) -> f64 {
        match (self, f0 > 0.0) {
            (PitchOutput::Period, true) => sample_rate / f0,
            (PitchOutput::Frequency, true) => f0,
            (PitchOutput::LogFrequency, true) => f0.ln(),
            (PitchOutput::LogFrequency, false) => UNVOICED_LOG_F0,
            (_, false) => 0.0,
        }
    }
}

/// Pitch estimation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PitchConfig {
    /// Sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Samples between frames.
    #[serde(default = "default_frame_shift")]
    pub frame_shift: usize,
    /// Lowest candidate frequency in Hz.
    #[serde(default = "default_min_hz")]
    pub min_hz: f64,
    /// Highest candidate frequency in Hz; clamped to Nyquist.
    #[serde(default = "default_max_hz")]
    pub max_hz: f64,
    /// Strength a frame must exceed to be voiced.
    #[serde(default = "default_voicing_threshold")]
    pub voicing_threshold: f64,
    /// Output encoding.
    #[serde(default)]
    pub output: PitchOutput,
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_frame_shift() -> usize {
    80
}

fn default_min_hz() -> f64 {
    50.0
}

fn default_max_hz() -> f64 {
    800.0
}

fn default_voicing_threshold() -> f64 {
    0.3
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            frame_shift: default_frame_shift(),
            min_hz: default_min_hz(),
            max_hz: default_max_hz(),
            voicing_threshold: default_voicing_threshold(),
            output: PitchOutput::default(),
        }
    }
}

impl PitchConfig {
    /// Creates a config for `sample_rate` with defaults elsewhere.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Checks the parameters. A `max_hz` above Nyquist is accepted.
    pub fn validate(&self) -> DspResult<()> {
        if self.sample_rate == 0 {
            return Err(DspError::invalid_param("sample_rate", "must be positive"));
        }
        if self.frame_shift == 0 {
            return Err(DspError::invalid_param("frame_shift", "must be positive"));
        }
        if !(self.min_hz > 0.0 && self.min_hz.is_finite()) {
            return Err(DspError::invalid_param(
                "min_hz",
                format!("must be positive, got {}", self.min_hz),
            ));
        }
        if !(self.max_hz > self.min_hz && self.max_hz.is_finite()) {
            return Err(DspError::invalid_param(
                "max_hz",
                format!("must exceed min_hz ({}), got {}", self.min_hz, self.max_hz),
            ));
        }
        if !(0.0..=1.0).contains(&self.voicing_threshold) {
            return Err(DspError::invalid_param(
                "voicing_threshold",
                format!("must be in [0, 1], got {}", self.voicing_threshold),
            ));
        }
        Ok(())
    }

    /// Number of frames produced for a signal of `len` samples.
    pub fn frame_count(&self, len: usize) -> usize {
        len / self.frame_shift + 1
    }
}

fn hz_to_erb(hz: f64) -> f64 {
    21.4 * (1.0 + hz / 229.0).log10()
}

fn erb_to_hz(erb: f64) -> f64 {
    (10f64.powf(erb / 21.4) - 1.0) * 229.0
}

/// Candidate, window-size and frequency grids for one configuration.
struct Grid {
    /// Candidate pitches in Hz.
    pitches: Vec<f64>,
    /// Log2 distance of each candidate's ideal window from the largest one,
    /// offset by 1.
    distances: Vec<f64>,
    /// Window sizes, largest first.
    windows: Vec<usize>,
    erb_freqs: Vec<f64>,
    harmonics: Vec<usize>,
}

impl Grid {
    fn new(sample_rate: f64, min_hz: f64, max_hz: f64) -> DspResult<Self> {
        let nyquist = sample_rate / 2.0;
        let top = (8.0 * sample_rate / min_hz).log2();
        let bottom = (8.0 * sample_rate / max_hz).log2();
        let largest = 2f64.powf(top.round());
        let window_count = (top - bottom).round() as usize + 1;
        let windows: Vec<usize> = (0..window_count)
            .map(|i| (largest / 2f64.powi(i as i32)) as usize)
            .collect();
        if windows.iter().any(|&w| w < 4) {
            return Err(DspError::invalid_param(
                "sample_rate",
                format!("too low for a {} Hz pitch ceiling", max_hz),
            ));
        }

        // exact multiples of the step must not gain a candidate from rounding
        let count = ((max_hz.log2() - min_hz.log2()) / CANDIDATE_STEP - 1e-9).ceil();
        if !(count >= 3.0) {
            return Err(DspError::invalid_param(
                "max_hz",
                format!(
                    "search band too narrow: {} to {} Hz holds fewer than 3 candidates",
                    min_hz, max_hz
                ),
            ));
        }
        let base = (8.0 * sample_rate / windows[0] as f64).log2();
        let (pitches, distances): (Vec<f64>, Vec<f64>) = (0..count as usize)
            .map(|i| {
                let log2 = min_hz.log2() + i as f64 * CANDIDATE_STEP;
                (2f64.powf(log2), 1.0 + log2 - base)
            })
            .unzip();

        let erb_low = hz_to_erb(min_hz / 4.0);
        let erb_count = ((hz_to_erb(nyquist) - erb_low) / ERB_STEP).ceil() as usize;
        let erb_freqs: Vec<f64> = (0..erb_count)
            .map(|i| erb_to_hz(erb_low + i as f64 * ERB_STEP))
            .collect();

        let highest = erb_freqs.last().copied().unwrap_or(0.0);
        let harmonic_limit = (highest / pitches[0] - 0.75).floor().max(0.0) as usize;
        let harmonics = prime_harmonics(harmonic_limit);

        Ok(Self {
            pitches,
            distances,
            windows,
            erb_freqs,
            harmonics,
        })
    }

    /// Candidate range `[lo, hi)` scored by window `n`.
    fn band(&self, n: usize) -> (usize, usize) {
        let lo = if n == 0 {
            0
        } else {
            bisect(&self.distances, n as f64)
        };
        let hi = if n + 1 == self.windows.len() {
            self.pitches.len()
        } else {
            bisect(&self.distances, (n + 2) as f64)
        };
        (lo, hi.max(lo))
    }
}

/// Estimates one pitch value per frame of `signal`.
///
/// The result has `signal.len() / frame_shift + 1` values encoded per
/// `config.output`. Frame `j` is centred on sample `j * frame_shift`.
///
/// # Errors
/// An invalid config, or a band that holds fewer than three candidates
/// after clamping `max_hz` to Nyquist.
pub fn swipe(signal: &[f64], config: &PitchConfig) -> DspResult<Vec<f64>> {
    config.validate()?;
    let sample_rate = config.sample_rate as f64;
    let frames = config.frame_count(signal.len());
    let nyquist = sample_rate / 2.0;

    let mut max_hz = config.max_hz;
    if max_hz > nyquist {
        warn!(max_hz, nyquist, "pitch ceiling above Nyquist, clamping");
        max_hz = nyquist;
    }
    let grid = Grid::new(sample_rate, config.min_hz, max_hz)?;

    if signal.is_empty() {
        return Ok(vec![config.output.encode(0.0, sample_rate); frames]);
    }

    let frame_seconds = config.frame_shift as f64 / sample_rate;
    let mut strength = vec![vec![0.0; frames]; grid.pitches.len()];
    for (n, &window) in grid.windows.iter().enumerate() {
        let (lo, hi) = grid.band(n);
        if lo == hi {
            continue;
        }
        let weights: Vec<f64> = grid.distances[lo..hi]
            .iter()
            .map(|d| 1.0 - (d - (n + 1) as f64).abs())
            .collect();
        let loudness = loudness::loudness(signal, &grid.erb_freqs, sample_rate, window);
        let band = WindowBand {
            pitches: &grid.pitches[lo..hi],
            weights: &weights,
            offset: lo,
        };
        accumulate(
            &mut strength,
            &loudness,
            &grid.erb_freqs,
            &grid.harmonics,
            &band,
            (window / 2) as f64 / sample_rate,
            frame_seconds,
        );
    }

    let f0: Vec<f64> = (0..frames)
        .map(|j| pick(&strength, &grid.pitches, j, config.voicing_threshold))
        .collect();
    debug!(
        frames,
        voiced = f0.iter().filter(|&&f| f > 0.0).count(),
        windows = grid.windows.len(),
        candidates = grid.pitches.len(),
        "swipe finished"
    );
    Ok(f0
        .into_iter()
        .map(|f| config.output.encode(f, sample_rate))
        .collect())
}

/// Best pitch in Hz for frame `j`, or 0 when its strength is too low.
fn pick(strength: &[Vec<f64>], pitches: &[f64], j: usize, threshold: f64) -> f64 {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, row) in strength.iter().enumerate() {
        if row[j] > best_value {
            best_value = row[j];
            best = i;
        }
    }
    if !(best_value > threshold) {
        return 0.0;
    }
    if best == 0 || best == pitches.len() - 1 {
        return pitches[best];
    }

    // Normalized time-constant axis shared by every triple of neighbours.
    let axis = |p: f64, centre: f64| (centre / p - 1.0) * 2.0 * std::f64::consts::PI;
    let parabola = Parabola::through(
        [
            axis(pitches[0], pitches[1]),
            0.0,
            axis(pitches[2], pitches[1]),
        ],
        [
            strength[best - 1][j],
            strength[best][j],
            strength[best + 1][j],
        ],
    );

    let steps = ((pitches[2].log2() - pitches[0].log2()) / REFINE_STEP + 1.0).round() as usize;
    let start = pitches[best - 1].log2();
    let centre = pitches[best];
    let mut refined = 0;
    let mut refined_value = f64::NEG_INFINITY;
    for i in 0..steps {
        let value = parabola.eval(axis(2f64.powf(start + i as f64 * REFINE_STEP), centre));
        if value > refined_value {
            refined_value = value;
            refined = i;
        }
    }
    2f64.powf(start + refined as f64 * REFINE_STEP)
}

/// Quadratic through three points, in Newton form.
struct Parabola {
    x: [f64; 2],
    c: [f64; 3],
}

impl Parabola {
    fn through(x: [f64; 3], y: [f64; 3]) -> Self {
        let d01 = (y[1] - y[0]) / (x[1] - x[0]);
        let d12 = (y[2] - y[1]) / (x[2] - x[1]);
        let d012 = (d12 - d01) / (x[2] - x[0]);
        Self {
            x: [x[0], x[1]],
            c: [y[0], d01, d012],
        }
    }

    fn eval(&self, v: f64) -> f64 {
        self.c[0] + (v - self.x[0]) * (self.c[1] + (v - self.x[1]) * self.c[2])
    }
}
