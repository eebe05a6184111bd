//! Planned FFT pair over `rustfft`.
//!
//! Forward transforms are unscaled. Inverse transforms are scaled by `1/N`,
//! so `inverse(forward(x)) == x`.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Forward and inverse plans for one transform length.
pub(crate) struct FftPair {
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl FftPair {
    pub(crate) fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            len,
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Unscaled DFT of a real sequence, zero-padded or truncated to the plan length.
    pub(crate) fn forward_real(&self, x: &[f64]) -> Vec<Complex<f64>> {
        let mut buf = self.load_real(x);
        self.forward.process(&mut buf);
        buf
    }

    /// Scaled inverse DFT of a real sequence, keeping the real part.
    pub(crate) fn inverse_real(&self, x: &[f64]) -> Vec<f64> {
        let mut buf = self.load_real(x);
        self.inverse_in_place(&mut buf);
        buf.into_iter().map(|z| z.re).collect()
    }

    /// Scaled inverse DFT in place.
    pub(crate) fn inverse_in_place(&self, buf: &mut [Complex<f64>]) {
        self.inverse.process(buf);
        let scale = 1.0 / self.len as f64;
        for z in buf.iter_mut() {
            *z *= scale;
        }
    }

    fn load_real(&self, x: &[f64]) -> Vec<Complex<f64>> {
        let mut buf = vec![Complex::new(0.0, 0.0); self.len];
        for (slot, &v) in buf.iter_mut().zip(x) {
            slot.re = v;
        }
        buf
    }
}
