//! Splitting a signal into overlapping, zero-padded frames.

use serde::{Deserialize, Serialize};

use crate::error::{DspError, DspResult};

/// Frame layout over a signal.
///
/// A signal of `len` samples always yields `len / frame_shift + 1` frames,
/// the same count as a pitch track with that shift. Frame `t` starts at
/// `t * frame_shift`, or is centred on it when `centered` is set. Samples
/// outside the signal read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Framer {
    /// Samples per frame.
    #[serde(default = "default_frame_length")]
    pub frame_length: usize,
    /// Samples between frame starts.
    #[serde(default = "default_frame_shift")]
    pub frame_shift: usize,
    /// Centre frame `t` on sample `t * frame_shift`.
    #[serde(default = "default_centered")]
    pub centered: bool,
}

fn default_frame_length() -> usize {
    256
}

fn default_frame_shift() -> usize {
    80
}

fn default_centered() -> bool {
    true
}

impl Default for Framer {
    fn default() -> Self {
        Self {
            frame_length: default_frame_length(),
            frame_shift: default_frame_shift(),
            centered: default_centered(),
        }
    }
}

impl Framer {
    /// Creates a validated framer.
    pub fn new(frame_length: usize, frame_shift: usize, centered: bool) -> DspResult<Self> {
        let framer = Self {
            frame_length,
            frame_shift,
            centered,
        };
        framer.validate()?;
        Ok(framer)
    }

    /// Checks that the length and shift are positive.
    pub fn validate(&self) -> DspResult<()> {
        if self.frame_length == 0 {
            return Err(DspError::invalid_param("frame_length", "must be positive"));
        }
        if self.frame_shift == 0 {
            return Err(DspError::invalid_param("frame_shift", "must be positive"));
        }
        Ok(())
    }

    /// Number of frames for a signal of `len` samples.
    pub fn frame_count(&self, len: usize) -> usize {
        len / self.frame_shift + 1
    }

    /// Index of the first sample of frame `t`, possibly negative.
    pub fn frame_start(&self, t: usize) -> isize {
        let start = (t * self.frame_shift) as isize;
        if self.centered {
            start - (self.frame_length / 2) as isize
        } else {
            start
        }
    }

    /// Copies frame `t` out of `signal`, zero-padding outside the signal.
    pub fn frame(&self, signal: &[f64], t: usize) -> Vec<f64> {
        let start = self.frame_start(t);
        (0..self.frame_length as isize)
            .map(|i| {
                let n = start + i;
                if n < 0 {
                    0.0
                } else {
                    signal.get(n as usize).copied().unwrap_or(0.0)
                }
            })
            .collect()
    }

    /// Iterates over every frame of `signal`.
    pub fn frames<'a>(&'a self, signal: &'a [f64]) -> impl Iterator<Item = Vec<f64>> + 'a {
        (0..self.frame_count(signal.len())).map(move |t| self.frame(signal, t))
    }
}
