//! Closed-form transforms between spectral-envelope representations.
//!
//! Coefficient slices are indexed `0..=order`; index 0 is the gain term.
//! All functions allocate their output and never modify their input.
//!
//! Composition rules:
//! - mel warping ([`freqt`]) is only meaningful on gain-normalized
//!   coefficients when `gamma != 0`, so [`mgc2mgc`] runs
//!   `freqt -> gnorm -> gc2gc -> ignorm`;
//! - [`mc2b`] and [`b2mc`] act on un-normalized coefficients.

mod output;


use rustfft::num_complex::Complex;

use crate::error::{check_alpha, check_gamma, check_non_empty, DspError, DspResult};
use crate::fft::FftPair;

pub use output::{convert_mgcep_output, OutputKind};

/// Lower bound of gamma accepted by the transforms.
pub const GAMMA_MIN: f64 = -1.0;
/// Upper bound of gamma accepted by the transforms.
pub const GAMMA_MAX: f64 = 1.0;

/// Frequency-warps a cepstrum with the first-order all-pass constant `alpha`.
///
/// The output has `order + 1` coefficients regardless of the input length.
/// Warping by `alpha` and then by `-alpha` restores the input up to
/// truncation effects.
pub fn freqt(c: &[f64], order: usize, alpha: f64) -> DspResult<Vec<f64>> {
    check_non_empty(c)?;
    check_alpha(alpha)?;
    Ok(warp(c, order, alpha))
}

pub(crate) fn warp(c: &[f64], order: usize, alpha: f64) -> Vec<f64> {
    let beta = 1.0 - alpha * alpha;
    let mut g = vec![0.0; order + 1];
    let mut d = vec![0.0; order + 1];

    for &ci in c.iter().rev() {
        d[0] = g[0];
        g[0] = ci + alpha * d[0];
        if order >= 1 {
            d[1] = g[1];
            g[1] = beta * d[0] + alpha * d[1];
        }
        for j in 2..=order {
            d[j] = g[j];
            g[j] = d[j - 1] + alpha * (d[j] - g[j - 1]);
        }
    }
    g
}

/// Transposed warping recursion, mapping a correlation sequence to the
/// warped domain.
pub(crate) fn frqtr(c: &[f64], order: usize, alpha: f64) -> Vec<f64> {
    let mut g = vec![0.0; order + 1];
    let mut d = vec![0.0; order + 1];

    for &ci in c.iter().rev() {
        d[0] = g[0];
        g[0] = ci;
        for j in 1..=order {
            d[j] = g[j];
            g[j] = d[j - 1] + alpha * (d[j] - g[j - 1]);
        }
    }
    g
}

/// Warping of MGLSA coefficients without the gain term; `b[0]` enters as is.
pub(crate) fn b2c(b: &[f64], order: usize, alpha: f64) -> Vec<f64> {
    let k = 1.0 - alpha * alpha;
    let mut g = vec![0.0; order + 1];
    let mut d = vec![0.0; order + 1];

    for &bi in b.iter().rev() {
        d[0] = g[0];
        g[0] = bi;
        if order >= 1 {
            d[1] = g[1];
            g[1] = k * d[0] + alpha * d[1];
        }
        for j in 2..=order {
            d[j] = g[j];
            g[j] = d[j - 1] + alpha * (d[j] - g[j - 1]);
        }
    }
    g
}

/// In-place recursion mapping `p[0..=order]` to the warped domain.
pub(crate) fn ptrans(p: &mut [f64], order: usize, alpha: f64) {
    let mut d = p[order];
    for m in (1..order).rev() {
        let o = p[m] + alpha * d;
        d = p[m];
        p[m] = o;
    }
    let o = alpha * d;
    p[0] = (1.0 - alpha * alpha) * p[0] + o + o;
}

/// In-place recursion mapping `q[1..=2 * order]` to the warped domain.
pub(crate) fn qtrans(q: &mut [f64], order: usize, alpha: f64) {
    let mut d = q[1];
    for i in 2..=2 * order {
        let o = q[i] + alpha * d;
        d = q[i];
        q[i] = o;
    }
}

/// Gain-normalizes a generalized cepstrum.
///
/// Returns `(K, c')` packed as `[K, c'1, ..., c'M]`. For `gamma != 0`,
/// `1 + gamma * c[0]` must be positive.
pub fn gnorm(c: &[f64], gamma: f64) -> DspResult<Vec<f64>> {
    check_non_empty(c)?;
    check_gamma(gamma, GAMMA_MIN, GAMMA_MAX)?;
    if gamma != 0.0 {
        let k = 1.0 + gamma * c[0];
        if k <= 0.0 || k.is_nan() {
            return Err(DspError::invalid_param(
                "c[0]",
                format!("1 + gamma * c[0] must be positive, got {}", k),
            ));
        }
    }
    Ok(normalize(c, gamma))
}

pub(crate) fn normalize(c: &[f64], gamma: f64) -> Vec<f64> {
    if gamma == 0.0 {
        let mut out = c.to_vec();
        out[0] = c[0].exp();
        return out;
    }
    let k = 1.0 + gamma * c[0];
    let mut out: Vec<f64> = c.iter().map(|ci| ci / k).collect();
    out[0] = k.powf(1.0 / gamma);
    out
}

/// Inverse of [`gnorm`]. `c[0]` (the gain `K`) must be positive.
pub fn ignorm(c: &[f64], gamma: f64) -> DspResult<Vec<f64>> {
    check_non_empty(c)?;
    check_gamma(gamma, GAMMA_MIN, GAMMA_MAX)?;
    if c[0] <= 0.0 || c[0].is_nan() {
        return Err(DspError::invalid_param(
            "c[0]",
            format!("gain must be positive, got {}", c[0]),
        ));
    }
    Ok(denormalize(c, gamma))
}

pub(crate) fn denormalize(c: &[f64], gamma: f64) -> Vec<f64> {
    if gamma == 0.0 {
        let mut out = c.to_vec();
        out[0] = c[0].ln();
        return out;
    }
    let k = c[0].powf(gamma);
    let mut out: Vec<f64> = c.iter().map(|ci| k * ci).collect();
    out[0] = (k - 1.0) / gamma;
    out
}

/// Converts a mel-cepstrum to MLSA filter coefficients.
pub fn mc2b(mc: &[f64], alpha: f64) -> DspResult<Vec<f64>> {
    check_non_empty(mc)?;
    check_alpha(alpha)?;
    Ok(mel_to_filter(mc, alpha))
}

pub(crate) fn mel_to_filter(mc: &[f64], alpha: f64) -> Vec<f64> {
    let mut b = mc.to_vec();
    for i in (0..b.len().saturating_sub(1)).rev() {
        b[i] = mc[i] - alpha * b[i + 1];
    }
    b
}

/// Converts MLSA filter coefficients back to a mel-cepstrum.
pub fn b2mc(b: &[f64], alpha: f64) -> DspResult<Vec<f64>> {
    check_non_empty(b)?;
    check_alpha(alpha)?;
    Ok(filter_to_mel(b, alpha))
}

pub(crate) fn filter_to_mel(b: &[f64], alpha: f64) -> Vec<f64> {
    let mut mc = b.to_vec();
    for i in 0..b.len().saturating_sub(1) {
        mc[i] = b[i] + alpha * b[i + 1];
    }
    mc
}

/// Minimum-phase impulse response of `len` samples for cepstrum `c`.
pub fn c2ir(c: &[f64], len: usize) -> DspResult<Vec<f64>> {
    check_non_empty(c)?;
    let mut h = vec![0.0; len];
    if len == 0 {
        return Ok(h);
    }
    h[0] = c[0].exp();
    for n in 1..len {
        let upper = n.min(c.len() - 1);
        let d: f64 = (1..=upper)
            .map(|k| k as f64 * c[k] * h[n - k])
            .sum();
        h[n] = d / n as f64;
    }
    Ok(h)
}

/// Cepstrum of order `order` from a minimum-phase impulse response.
///
/// Samples past the end of `h` are treated as zero. `h[0]` must be positive.
pub fn ic2ir(h: &[f64], order: usize) -> DspResult<Vec<f64>> {
    check_non_empty(h)?;
    if h[0] <= 0.0 || h[0].is_nan() {
        return Err(DspError::invalid_param(
            "h[0]",
            format!("leading sample must be positive, got {}", h[0]),
        ));
    }
    let len = h.len();
    let mut c = vec![0.0; order + 1];
    c[0] = h[0].ln();
    for n in 1..=order {
        let mut d = if n < len { n as f64 * h[n] } else { 0.0 };
        let lower = if n > len { n - len + 1 } else { 1 };
        for k in lower..n {
            d -= k as f64 * c[k] * h[n - k];
        }
        c[n] = d / (n as f64 * h[0]);
    }
    Ok(c)
}

/// Changes the generalization exponent of a normalized generalized cepstrum.
pub fn gc2gc(c: &[f64], gamma_in: f64, order: usize, gamma_out: f64) -> DspResult<Vec<f64>> {
    check_non_empty(c)?;
    check_gamma(gamma_in, GAMMA_MIN, GAMMA_MAX)?;
    check_gamma(gamma_out, GAMMA_MIN, GAMMA_MAX)?;
    Ok(regamma(c, gamma_in, order, gamma_out))
}

pub(crate) fn regamma(c: &[f64], gamma_in: f64, order: usize, gamma_out: f64) -> Vec<f64> {
    let m1 = c.len() - 1;
    let mut out = vec![0.0; order + 1];
    out[0] = c[0];
    for i in 1..=order {
        let mut ss1 = 0.0;
        let mut ss2 = 0.0;
        for k in 1..=m1.min(i - 1) {
            let mk = i - k;
            let cc = c[k] * out[mk];
            ss2 += k as f64 * cc;
            ss1 += mk as f64 * cc;
        }
        let own = if i <= m1 { c[i] } else { 0.0 };
        out[i] = own + (gamma_out * ss2 - gamma_in * ss1) / i as f64;
    }
    out
}

/// Converts between mel-generalized cepstra with different order, alpha and gamma.
pub fn mgc2mgc(
    c: &[f64],
    alpha_in: f64,
    gamma_in: f64,
    order: usize,
    alpha_out: f64,
    gamma_out: f64,
) -> DspResult<Vec<f64>> {
    check_non_empty(c)?;
    check_alpha(alpha_in)?;
    check_alpha(alpha_out)?;
    check_gamma(gamma_in, GAMMA_MIN, GAMMA_MAX)?;
    check_gamma(gamma_out, GAMMA_MIN, GAMMA_MAX)?;

    let alpha = (alpha_out - alpha_in) / (1.0 - alpha_in * alpha_out);
    let warped = if alpha == 0.0 {
        c.to_vec()
    } else {
        warp(c, order, alpha)
    };
    let normalized = gnorm(&warped, gamma_in)?;
    let changed = regamma(&normalized, gamma_in, order, gamma_out);
    ignorm(&changed, gamma_out)
}

/// Complex log spectrum of a mel-generalized cepstrum.
///
/// Returns `fft_len / 2 + 1` bins: the real part is `ln |H|`, the imaginary
/// part the phase in radians.
pub fn mgc2sp(c: &[f64], alpha: f64, gamma: f64, fft_len: usize) -> DspResult<Vec<Complex<f64>>> {
    if fft_len < 2 || fft_len % 2 != 0 {
        return Err(DspError::InvalidFftLength {
            len: fft_len,
            message: "must be even and at least 2".to_string(),
        });
    }
    let cepstrum = mgc2mgc(c, alpha, gamma, fft_len / 2, 0.0, 0.0)?;
    let fft = FftPair::new(fft_len);
    let mut spectrum = fft.forward_real(&cepstrum);
    spectrum.truncate(fft_len / 2 + 1);
    Ok(spectrum)
}

/// Generalized exponential: `exp(x)` for `gamma == 0`, else `(1 + gamma x)^(1/gamma)`.
pub fn gexp(gamma: f64, x: f64) -> f64 {
    if gamma == 0.0 {
        x.exp()
    } else {
        (1.0 + gamma * x).powf(1.0 / gamma)
    }
}

/// Generalized logarithm, the inverse of [`gexp`].
pub fn glog(gamma: f64, x: f64) -> f64 {
    if gamma == 0.0 {
        x.ln()
    } else {
        (x.powf(gamma) - 1.0) / gamma
    }
}
