//! Mel-generalized cepstral analysis.
//!
//! The iteration runs on normalized MGLSA coefficients `(K, b')`. A first
//! Newton step at `gamma = -1` (an all-pole fit) seeds the model, which is
//! then carried to the requested gamma before the main loop.

use rustfft::num_complex::Complex;
use tracing::{debug, trace, warn};

use super::input::periodogram;
use super::{Estimate, EstimatorConfig, SpectralInput, Termination};
use crate::error::DspResult;
use crate::fft::FftPair;
use crate::theq::{self, SingularSystem};
use crate::transform::{
    b2c, convert_mgcep_output, denormalize, filter_to_mel, mel_to_filter, normalize, ptrans,
    qtrans, regamma,
};

/// Estimates a mel-generalized cepstrum from one frame.
///
/// The coefficients are returned in the form selected by `config.output`.
///
/// # Errors
/// Configuration problems only (see [`EstimatorConfig::validate`]), a
/// non-positive periodogram bin, or a final estimate whose gain cannot be
/// converted to the requested output form.
pub fn mgcep(input: SpectralInput<'_>, config: &EstimatorConfig) -> DspResult<Estimate> {
    let fft_len = input.fft_len();
    config.validate(fft_len)?;
    let x = periodogram(&input, config.floor)?;

    let solver = Newton {
        x: &x,
        fft: FftPair::new(fft_len),
        order: config.order,
        alpha: config.alpha,
        recursion: config.recursion_order(fft_len),
        min_det: config.min_determinant,
    };
    let (raw, status, iterations) = iterate(&solver, config);
    debug!(
        order = config.order,
        alpha = config.alpha,
        gamma = config.gamma,
        iterations,
        status = ?status,
        "mgcep finished"
    );

    let coefficients = convert_mgcep_output(&raw, config.alpha, config.gamma, config.output)?;
    Ok(Estimate {
        coefficients,
        status,
        iterations,
    })
}

fn iterate(solver: &Newton<'_>, config: &EstimatorConfig) -> (Vec<f64>, Termination, usize) {
    let m = config.order;
    let alpha = config.alpha;
    let gamma = config.gamma;

    let mut b = vec![0.0; m + 1];
    let mut error = match solver.step(&mut b, -1.0) {
        Ok(e) => e,
        Err(singular) => {
            warn!(
                determinant = singular.determinant,
                "mgcep normal matrix is singular on the initial step"
            );
            let mut flat = vec![0.0; m + 1];
            flat[0] = 1.0;
            return (flat, Termination::SingularMatrix, 0);
        }
    };
    if gamma == -1.0 {
        return (b, Termination::Converged, 1);
    }

    let seed = if alpha != 0.0 {
        let br = denormalize(&b, -1.0);
        normalize(&filter_to_mel(&br, alpha), -1.0)
    } else {
        b
    };
    b = regamma(&seed, -1.0, m, gamma);
    if alpha != 0.0 {
        let c = denormalize(&b, gamma);
        b = normalize(&mel_to_filter(&c, alpha), gamma);
    }

    for iteration in 1..=config.max_iterations {
        let previous = error;
        let snapshot = b.clone();
        error = match solver.step(&mut b, gamma) {
            Ok(e) => e,
            Err(singular) => {
                warn!(
                    iteration,
                    determinant = singular.determinant,
                    "mgcep normal matrix is singular"
                );
                return (snapshot, Termination::SingularMatrix, iteration);
            }
        };
        trace!(iteration, error, "mgcep step");
        if iteration >= config.min_iterations
            && ((previous - error) / error).abs() < config.threshold
        {
            return (b, Termination::Converged, iteration);
        }
    }
    (b, Termination::IterationCap, config.max_iterations)
}

/// One frame's fixed data for the Newton recursion.
struct Newton<'a> {
    x: &'a [f64],
    fft: FftPair,
    order: usize,
    alpha: f64,
    recursion: usize,
    min_det: f64,
}

impl Newton<'_> {
    fn gain(rr: &[f64], c: &[f64], gamma: f64) -> f64 {
        if gamma == 0.0 {
            return rr[0];
        }
        let t: f64 = rr[1..].iter().zip(&c[1..]).map(|(r, ci)| r * ci).sum();
        rr[0] + gamma * t
    }

    /// Applies one Newton update to `c = (K, b')` and returns the log error.
    fn step(&self, c: &mut [f64], gamma: f64) -> Result<f64, SingularSystem> {
        let n = self.fft.len();
        let m = self.order;
        let m2 = 2 * m;
        let alpha = self.alpha;

        let mut cr = vec![0.0; n];
        cr[1..=m].copy_from_slice(&c[1..=m]);
        if alpha != 0.0 {
            let warped = b2c(&cr[..=m], self.recursion, -alpha);
            cr[..warped.len()].copy_from_slice(&warped);
        }
        let model = self.fft.forward_real(&cr);

        let mut q = Vec::new();
        let mut r = Vec::new();
        let p: Vec<f64> = if gamma == -1.0 {
            self.x.to_vec()
        } else if gamma == 0.0 {
            self.x
                .iter()
                .zip(&model)
                .map(|(xi, z)| xi / (2.0 * z.re).exp())
                .collect()
        } else {
            let mut p = Vec::with_capacity(n);
            q.reserve(n);
            r.reserve(n);
            for (xi, z) in self.x.iter().zip(&model) {
                let tr = 1.0 + gamma * z.re;
                let ti = gamma * z.im;
                let trr = tr * tr;
                let tii = ti * ti;
                let s = trr + tii;
                let t = xi * s.powf(-1.0 / gamma) / s;
                p.push(t);
                r.push(Complex::new(tr * t, ti * t));
                let u = t / s;
                q.push(Complex::new((trr - tii) * u, 2.0 * tr * ti * u));
            }
            p
        };

        let p_time = self.fft.inverse_real(&p);
        let mut pr = if alpha != 0.0 {
            b2c(&p_time[..=self.recursion], m2, alpha)
        } else {
            p_time[..=m2].to_vec()
        };

        let (mut qr, rr) = if gamma == 0.0 || gamma == -1.0 {
            (pr[..=m2].to_vec(), pr[..=m].to_vec())
        } else {
            self.fft.inverse_in_place(&mut q);
            self.fft.inverse_in_place(&mut r);
            let q_time: Vec<f64> = q.iter().map(|z| z.re).collect();
            let r_time: Vec<f64> = r.iter().map(|z| z.re).collect();
            if alpha != 0.0 {
                (
                    b2c(&q_time[..=self.recursion], self.recursion, alpha),
                    b2c(&r_time[..=self.recursion], m, alpha),
                )
            } else {
                (q_time, r_time[..=m].to_vec())
            }
        };

        if alpha != 0.0 {
            ptrans(&mut pr, m, alpha);
            qtrans(&mut qr, m, alpha);
        }

        let mut t = 0.0;
        if gamma != -1.0 {
            t = Self::gain(&rr, c, gamma);
            c[0] = t.sqrt();
        }

        if gamma == -1.0 {
            qr[..=m2].iter_mut().for_each(|v| *v = 0.0);
        } else if gamma != 0.0 {
            for v in &mut qr[2..=m2] {
                *v *= 1.0 + gamma;
            }
        }

        let delta = theq::solve(&pr[..m], &qr[2..=m2], &rr[1..=m], self.min_det)?;
        for (ci, di) in c[1..].iter_mut().zip(delta) {
            *ci += di;
        }

        if gamma == -1.0 {
            t = Self::gain(&rr, c, gamma);
            c[0] = t.sqrt();
        }
        Ok(t.ln())
    }
}
