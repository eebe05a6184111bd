//! Waveform synthesis from a sequence of mel-cepstra.
//!
//! Filter coefficients are interpolated linearly sample by sample from the
//! previous frame's values to the current frame's, so the spectral shape
//! glides across frame boundaries. The filter state carries over between
//! frames; frames must be fed in time order.

use tracing::debug;

use crate::error::{DspError, DspResult};
use crate::mlsa::{MlsaFilter, PadeOrder};
use crate::transform::mc2b;

/// One synthesis stream: an MLSA filter plus the coefficient interpolation.
#[derive(Debug, Clone)]
pub struct MlsaSynthesizer {
    filter: MlsaFilter,
}

impl MlsaSynthesizer {
    /// Creates a synthesizer for mel-cepstra of order `order`.
    pub fn new(order: usize, alpha: f64, pade: PadeOrder) -> DspResult<Self> {
        Ok(Self {
            filter: MlsaFilter::new(order, alpha, pade)?,
        })
    }

    /// Creates a synthesizer over a transposed-structure filter.
    pub fn transposed(order: usize, alpha: f64, pade: PadeOrder) -> DspResult<Self> {
        Ok(Self {
            filter: MlsaFilter::transposed(order, alpha, pade)?,
        })
    }

    /// The underlying filter.
    pub fn filter(&self) -> &MlsaFilter {
        &self.filter
    }

    /// Clears the filter state for a new stream.
    pub fn reset(&mut self) {
        self.filter.reset();
    }

    /// Filters one frame of excitation.
    ///
    /// The coefficients start at `mc2b(previous)` on the first sample and
    /// move by `(current - previous) / len` per sample. Each excitation
    /// sample is scaled by `exp(b[0])` before it enters the filter.
    ///
    /// # Errors
    /// A mel-cepstrum whose length is not `order + 1`.
    pub fn synthesize_frame(
        &mut self,
        excitation: &[f64],
        previous: &[f64],
        current: &[f64],
    ) -> DspResult<Vec<f64>> {
        self.check_frame(previous)?;
        self.check_frame(current)?;
        let alpha = self.filter.alpha();
        let from = mc2b(previous, alpha)?;
        let to = mc2b(current, alpha)?;
        Ok(self.run_frame(excitation, from, &to))
    }

    /// Synthesizes a waveform of `excitation.len()` samples.
    ///
    /// Frame `i` covers samples `[i * frame_shift, (i + 1) * frame_shift)`
    /// and glides from frame `i - 1` (frame 0 from itself). Synthesis stops
    /// at the first frame whose end reaches the excitation length; samples
    /// past the last synthesized frame stay zero.
    ///
    /// # Errors
    /// A zero frame shift, or any frame whose length is not `order + 1`.
    pub fn synthesize(
        &mut self,
        excitation: &[f64],
        frames: &[Vec<f64>],
        frame_shift: usize,
    ) -> DspResult<Vec<f64>> {
        if frame_shift == 0 {
            return Err(DspError::invalid_param("frame_shift", "must be positive"));
        }
        for frame in frames {
            self.check_frame(frame)?;
        }

        let alpha = self.filter.alpha();
        let mut output = vec![0.0; excitation.len()];
        let mut previous = match frames.first() {
            Some(first) => mc2b(first, alpha)?,
            None => return Ok(output),
        };

        let mut synthesized = 0;
        for (i, frame) in frames.iter().enumerate() {
            let start = i * frame_shift;
            let end = start + frame_shift;
            if end >= excitation.len() {
                break;
            }
            let current = mc2b(frame, alpha)?;
            let samples = self.run_frame(&excitation[start..end], previous, &current);
            output[start..end].copy_from_slice(&samples);
            previous = current;
            synthesized += 1;
        }

        debug!(
            frames = frames.len(),
            synthesized,
            samples = excitation.len(),
            "mlsa synthesis finished"
        );
        Ok(output)
    }

    fn check_frame(&self, frame: &[f64]) -> DspResult<()> {
        let expected = self.filter.order() + 1;
        if frame.len() != expected {
            return Err(DspError::invalid_param(
                "frames",
                format!(
                    "mel-cepstrum has {} coefficients, expected {}",
                    frame.len(),
                    expected
                ),
            ));
        }
        Ok(())
    }

    fn run_frame(&mut self, excitation: &[f64], mut b: Vec<f64>, target: &[f64]) -> Vec<f64> {
        let len = excitation.len() as f64;
        let step: Vec<f64> = b.iter().zip(target).map(|(f, t)| (t - f) / len).collect();

        let mut out = Vec::with_capacity(excitation.len());
        for &x in excitation {
            let x = x * b[0].exp();
            out.push(self.filter.filter_unchecked(x, &b));
            for (bi, di) in b.iter_mut().zip(&step) {
                *bi += di;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;
    use rand::Rng;

    #[test]
    fn test_constant_envelope_has_no_seams() {
        let mc = vec![0.3, 0.4, -0.2, 0.1, 0.05];
        let shift = 80;
        let frames = vec![mc.clone(); 6];
        let mut rng = create_rng(5);
        let excitation: Vec<f64> = (0..6 * shift).map(|_| rng.gen_range(-1.0..1.0)).collect();

        let mut synth = MlsaSynthesizer::new(4, 0.42, PadeOrder::Four).unwrap();
        let output = synth.synthesize(&excitation, &frames, shift).unwrap();

        let b = mc2b(&mc, 0.42).unwrap();
        let mut filter = MlsaFilter::new(4, 0.42, PadeOrder::Four).unwrap();
        let direct: Vec<f64> = excitation
            .iter()
            .map(|&x| filter.filter(x * b[0].exp(), &b).unwrap())
            .collect();

        // the last frame reaches the end of the excitation and is dropped
        let synthesized = 5 * shift;
        for n in 0..synthesized {
            assert!((output[n] - direct[n]).abs() < 1e-12, "sample {}", n);
        }
        assert!(output[synthesized..].iter().all(|&y| y == 0.0));
    }

    #[test]
    fn test_trailing_frames_dropped() {
        let frames = vec![vec![0.0, 0.0]; 4];
        let mut synth = MlsaSynthesizer::new(1, 0.0, PadeOrder::Four).unwrap();

        let out = synth.synthesize(&vec![1.0; 250], &frames, 80).unwrap();
        assert_eq!(out.len(), 250);
        assert!(out[..240].iter().all(|&y| (y - 1.0).abs() < 1e-12));
        assert!(out[240..].iter().all(|&y| y == 0.0));

        // a frame ending exactly at the excitation end is dropped as well
        synth.reset();
        let out = synth.synthesize(&vec![1.0; 240], &frames, 80).unwrap();
        assert!(out[..160].iter().all(|&y| (y - 1.0).abs() < 1e-12));
        assert!(out[160..].iter().all(|&y| y == 0.0));
    }

    #[test]
    fn test_gain_interpolation() {
        let mut synth = MlsaSynthesizer::new(1, 0.0, PadeOrder::Five).unwrap();
        let out = synth
            .synthesize_frame(&[1.0; 4], &[0.0, 0.0], &[2f64.ln(), 0.0])
            .unwrap();
        let want = [1.0, 2f64.powf(0.25), 2f64.powf(0.5), 2f64.powf(0.75)];
        for (got, want) in out.iter().zip(want) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_first_frame_uses_itself() {
        let frames = vec![vec![1.0, 0.0], vec![0.0, 0.0]];
        let mut synth = MlsaSynthesizer::new(1, 0.0, PadeOrder::Four).unwrap();
        let out = synth.synthesize(&[1.0; 12], &frames, 4).unwrap();
        let gain = 1f64.exp();
        assert!(out[..4].iter().all(|&y| (y - gain).abs() < 1e-12));
        assert!((out[4] - gain).abs() < 1e-12);
        assert!(out[5] < gain);
    }

    #[test]
    fn test_mismatched_order_rejected() {
        let mut synth = MlsaSynthesizer::new(2, 0.42, PadeOrder::Four).unwrap();
        let frames = vec![vec![0.0; 3], vec![0.0; 4]];
        assert!(matches!(
            synth.synthesize(&[0.0; 100], &frames, 10),
            Err(DspError::InvalidParameter { ref name, .. }) if name == "frames"
        ));
        assert!(synth.synthesize(&[0.0; 100], &[vec![0.0; 3]], 0).is_err());
        assert!(synth
            .synthesize_frame(&[0.0; 4], &[0.0; 3], &[0.0; 2])
            .is_err());
    }

    #[test]
    fn test_empty_frames_give_silence() {
        let mut synth = MlsaSynthesizer::new(2, 0.42, PadeOrder::Four).unwrap();
        let out = synth.synthesize(&[1.0; 10], &[], 5).unwrap();
        assert_eq!(out, vec![0.0; 10]);
    }
}
