//! Mel-cepstral analysis.

use tracing::{debug, trace, warn};

use super::input::periodogram;
use super::{Estimate, EstimatorConfig, SpectralInput, Termination};
use crate::error::DspResult;
use crate::fft::FftPair;
use crate::theq;
use crate::transform::{frqtr, warp};

/// Estimates a mel-cepstrum of order `config.order` from one frame.
///
/// `config.gamma`, `config.recursion_order` and `config.output` do not apply
/// here; the result is always the mel-cepstrum itself.
///
/// # Errors
/// Configuration problems only: an unusable FFT length, order, alpha,
/// iteration bounds or floor, or a non-positive periodogram bin.
pub fn mcep(input: SpectralInput<'_>, config: &EstimatorConfig) -> DspResult<Estimate> {
    let fft_len = input.fft_len();
    let mut config = config.clone();
    config.gamma = 0.0;
    config.validate(fft_len)?;
    let x = periodogram(&input, config.floor)?;

    let estimate = iterate(&x, &config);
    debug!(
        order = config.order,
        alpha = config.alpha,
        iterations = estimate.iterations,
        status = ?estimate.status,
        "mcep finished"
    );
    Ok(estimate)
}

fn iterate(x: &[f64], config: &EstimatorConfig) -> Estimate {
    let n = x.len();
    let half = n / 2;
    let m = config.order;
    let alpha = config.alpha;
    let fft = FftPair::new(n);

    // 1, -a, a^2, ..., (-a)^M
    let powers: Vec<f64> = std::iter::successors(Some(1.0), |p| Some(p * -alpha))
        .take(m + 1)
        .collect();

    let log_x: Vec<f64> = x.iter().map(|v| v.ln()).collect();
    let mut c = fft.inverse_real(&log_x);
    c[0] /= 2.0;
    c[half] /= 2.0;
    let mut mc = warp(&c[..=half], m, alpha);
    let mut previous = c[0];

    for iteration in 1..=config.max_iterations {
        let linear = warp(&mc, half, -alpha);
        let model = fft.forward_real(&linear);
        let ratio: Vec<f64> = x
            .iter()
            .zip(&model)
            .map(|(xi, z)| xi / (2.0 * z.re).exp())
            .collect();
        let correlation = fft.inverse_real(&ratio);
        let mut r = frqtr(&correlation[..=half], 2 * m, alpha);

        let error = r[0];
        trace!(iteration, error, "mcep step");
        if iteration >= config.min_iterations {
            if ((error - previous) / error).abs() < config.threshold {
                return Estimate {
                    coefficients: mc,
                    status: Termination::Converged,
                    iterations: iteration,
                };
            }
            previous = error;
        }

        let rhs: Vec<f64> = (0..=m).map(|i| r[i] - powers[i]).collect();
        let mut hankel = r.clone();
        for v in hankel.iter_mut().step_by(2) {
            *v -= r[0];
        }
        for i in (2..=m).step_by(2) {
            r[i] += r[0];
        }
        r[0] += r[0];

        match theq::solve(&r[..=m], &hankel, &rhs, config.min_determinant) {
            Ok(delta) => {
                for (ci, di) in mc.iter_mut().zip(delta) {
                    *ci += di;
                }
            }
            Err(singular) => {
                warn!(
                    iteration,
                    determinant = singular.determinant,
                    "mcep normal matrix is singular"
                );
                return Estimate {
                    coefficients: mc,
                    status: Termination::SingularMatrix,
                    iterations: iteration,
                };
            }
        }
    }

    Estimate {
        coefficients: mc,
        status: Termination::IterationCap,
        iterations: config.max_iterations,
    }
}
