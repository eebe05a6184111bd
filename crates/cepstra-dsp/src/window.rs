//! Window functions and frame normalization.
//!
//! Windows are symmetric: the first and last weights of a Hann, Hamming or
//! Blackman window are equal, with the peak at `(len - 1) / 2`.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{check_non_empty, DspResult};

/// Window shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// Blackman window.
    #[default]
    Blackman,
    /// Hamming window.
    Hamming,
    /// Hann window.
    Hann,
    /// Triangular window.
    Bartlett,
    /// Linear ramps over the outer quarters, flat in the middle half.
    Trapezoid,
    /// All weights one.
    Rectangular,
}

/// Rescaling applied after windowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Leave the windowed frame as is.
    #[default]
    None,
    /// Match the sum of squares of the input frame.
    Power,
    /// Match the sum of absolute values of the input frame.
    Magnitude,
}

impl WindowKind {
    /// Weight of sample `i` in a window of `len` samples (`len >= 2`).
    fn weight(self, i: usize, len: usize) -> f64 {
        let span = (len - 1) as f64;
        let k = i as f64;
        let x = 2.0 * PI * k / span;
        match self {
            WindowKind::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
            WindowKind::Hamming => 0.54 - 0.46 * x.cos(),
            WindowKind::Hann => 0.5 * (1.0 - x.cos()),
            WindowKind::Bartlett => {
                let slope = 2.0 / span;
                if i < len / 2 {
                    slope * k
                } else {
                    2.0 - slope * k
                }
            }
            WindowKind::Trapezoid => {
                let slope = 4.0 / span;
                if i < len / 4 {
                    slope * k
                } else if i < 3 * len / 4 {
                    1.0
                } else {
                    4.0 - slope * k
                }
            }
            WindowKind::Rectangular => 1.0,
        }
    }
}

/// Returns the window weights for a frame of `len` samples.
///
/// A single-sample window is `[1.0]` for every shape.
pub fn window_weights(kind: WindowKind, len: usize) -> DspResult<Vec<f64>> {
    match len {
        0 => Err(crate::DspError::EmptyFrame),
        1 => Ok(vec![1.0]),
        _ => Ok((0..len).map(|i| kind.weight(i, len)).collect()),
    }
}

/// Applies a window to `frame` and optionally rescales the result.
///
/// # Arguments
/// * `frame` - Input samples
/// * `kind` - Window shape
/// * `normalization` - Whether to restore the input's power or magnitude
///
/// # Returns
/// A new frame of the same length. A windowed frame that is entirely zero
/// is returned without rescaling.
pub fn apply_window(
    frame: &[f64],
    kind: WindowKind,
    normalization: Normalization,
) -> DspResult<Vec<f64>> {
    check_non_empty(frame)?;
    let weights = window_weights(kind, frame.len())?;
    let mut out: Vec<f64> = frame.iter().zip(&weights).map(|(x, w)| x * w).collect();

    let scale = match normalization {
        Normalization::None => None,
        Normalization::Power => {
            let before: f64 = frame.iter().map(|x| x * x).sum();
            let after: f64 = out.iter().map(|y| y * y).sum();
            (after > 0.0).then(|| (before / after).sqrt())
        }
        Normalization::Magnitude => {
            let before: f64 = frame.iter().map(|x| x.abs()).sum();
            let after: f64 = out.iter().map(|y| y.abs()).sum();
            (after > 0.0).then(|| before / after)
        }
    };

    if let Some(scale) = scale {
        for y in &mut out {
            *y *= scale;
        }
    }
    Ok(out)
}
