//! Iterative spectral-envelope estimation.
//!
//! [`mcep`] fits a mel-cepstrum and [`mgcep`] a mel-generalized cepstrum to
//! one frame. Both minimize the unbiased log-spectral criterion with Newton
//! steps; each step solves a Toeplitz-plus-Hankel system.
//!
//! Reaching the iteration cap or a singular normal matrix is not an error:
//! the result carries a [`Termination`] next to the best coefficients found.

mod input;
mod mcep;
mod mgcep;


use serde::{Deserialize, Serialize};

use crate::error::{check_alpha, check_gamma, DspError, DspResult};
use crate::transform::OutputKind;

pub use input::{PeriodogramFloor, SpectralInput};
pub use mcep::mcep;
pub use mgcep::mgcep;

/// How an estimation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Relative change of the error dropped below the threshold.
    Converged,
    /// `max_iterations` Newton steps ran without converging.
    IterationCap,
    /// A normal-matrix block was numerically singular; the coefficients are
    /// those from before the failed step.
    SingularMatrix,
}

/// Coefficients produced by one estimation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// `order + 1` coefficients.
    pub coefficients: Vec<f64>,
    /// How the run ended.
    pub status: Termination,
    /// Newton steps taken, including the one that detected convergence or failure.
    pub iterations: usize,
}

impl Estimate {
    /// True when the run converged.
    pub fn converged(&self) -> bool {
        self.status == Termination::Converged
    }
}

/// Estimator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EstimatorConfig {
    /// Model order `M`; the estimate has `M + 1` coefficients.
    #[serde(default = "default_order")]
    pub order: usize,
    /// All-pass constant, `|alpha| < 1`.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Generalization exponent in `[-1, 0]`. Ignored by [`mcep`].
    #[serde(default)]
    pub gamma: f64,
    /// Iterations before the convergence test is applied.
    #[serde(default = "default_min_iterations")]
    pub min_iterations: usize,
    /// Iteration cap.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Threshold on the relative change of the error.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Periodogram floor.
    #[serde(default)]
    pub floor: PeriodogramFloor,
    /// Smallest accepted determinant of a 2x2 normal-matrix block.
    #[serde(default = "default_min_determinant")]
    pub min_determinant: f64,
    /// Order of the internal warping recursion used by [`mgcep`]; `None`
    /// means `N - 1` for an FFT of length `N`.
    #[serde(default)]
    pub recursion_order: Option<usize>,
    /// Output form of [`mgcep`].
    #[serde(default)]
    pub output: OutputKind,
}

fn default_order() -> usize {
    25
}

fn default_alpha() -> f64 {
    0.42
}

fn default_min_iterations() -> usize {
    2
}

fn default_max_iterations() -> usize {
    30
}

fn default_threshold() -> f64 {
    0.001
}

fn default_min_determinant() -> f64 {
    1e-6
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            order: default_order(),
            alpha: default_alpha(),
            gamma: 0.0,
            min_iterations: default_min_iterations(),
            max_iterations: default_max_iterations(),
            threshold: default_threshold(),
            floor: PeriodogramFloor::None,
            min_determinant: default_min_determinant(),
            recursion_order: None,
            output: OutputKind::default(),
        }
    }
}

impl EstimatorConfig {
    /// Creates a config with the given order and alpha and defaults elsewhere.
    pub fn new(order: usize, alpha: f64) -> Self {
        Self {
            order,
            alpha,
            ..Self::default()
        }
    }

    /// Sets gamma.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets the periodogram floor.
    pub fn with_floor(mut self, floor: PeriodogramFloor) -> Self {
        self.floor = floor;
        self
    }

    /// Sets the output form.
    pub fn with_output(mut self, output: OutputKind) -> Self {
        self.output = output;
        self
    }

    /// Checks every parameter against an FFT length of `fft_len`.
    pub fn validate(&self, fft_len: usize) -> DspResult<()> {
        input::check_fft_len(fft_len)?;
        let max_order = fft_len / 2 - 1;
        if self.order == 0 || self.order > max_order {
            return Err(DspError::InvalidOrder {
                order: self.order,
                min: 1,
                max: max_order,
            });
        }
        check_alpha(self.alpha)?;
        check_gamma(self.gamma, -1.0, 0.0)?;
        if self.min_iterations > self.max_iterations {
            return Err(DspError::invalid_param(
                "min_iterations",
                format!(
                    "must not exceed max_iterations ({} > {})",
                    self.min_iterations, self.max_iterations
                ),
            ));
        }
        if !(self.threshold >= 0.0) {
            return Err(DspError::invalid_param(
                "threshold",
                format!("must be non-negative, got {}", self.threshold),
            ));
        }
        if !(self.min_determinant >= 0.0) {
            return Err(DspError::invalid_param(
                "min_determinant",
                format!("must be non-negative, got {}", self.min_determinant),
            ));
        }
        let recursion = self.recursion_order(fft_len);
        if recursion < 2 * self.order || recursion >= fft_len {
            return Err(DspError::invalid_param(
                "recursion_order",
                format!(
                    "must be in [{}, {}], got {}",
                    2 * self.order,
                    fft_len - 1,
                    recursion
                ),
            ));
        }
        self.floor.validate()
    }

    pub(crate) fn recursion_order(&self, fft_len: usize) -> usize {
        self.recursion_order.unwrap_or(fft_len - 1)
    }
}
