//! Loudness spectra on the ERB grid for one analysis window size.

use std::f64::consts::PI;

use super::interp::NaturalSpline;
use crate::fft::FftPair;

/// Loudness matrix for window size `window`: one row per hop of
/// `window / 2` samples, one column per ERB frequency.
///
/// Row `i` is centred on sample `i * window / 2`; samples outside the
/// signal read as zero. Each entry is the square root of the spline-
/// interpolated magnitude spectrum (negative values count as zero) and each
/// non-zero row has unit norm.
pub(crate) fn loudness(signal: &[f64], erb_freqs: &[f64], sample_rate: f64, window: usize) -> Vec<Vec<f64>> {
    let hop = window / 2;
    let rows = signal.len().div_ceil(hop) + 1;
    let fft = FftPair::new(window);
    let hann: Vec<f64> = (0..window)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / window as f64).cos())
        .collect();
    let bins: Vec<f64> = (0..hop)
        .map(|i| i as f64 * sample_rate / window as f64)
        .collect();

    let mut frame = vec![0.0; window];
    (0..rows)
        .map(|i| {
            let start = i as isize * hop as isize - hop as isize;
            for (j, slot) in frame.iter_mut().enumerate() {
                let n = start + j as isize;
                let x = if n >= 0 {
                    signal.get(n as usize).copied().unwrap_or(0.0)
                } else {
                    0.0
                };
                *slot = x * hann[j];
            }

            let magnitude: Vec<f64> = fft.forward_real(&frame)[..hop]
                .iter()
                .map(|z| z.norm())
                .collect();
            let spline = NaturalSpline::new(&bins, &magnitude);
            let mut row: Vec<f64> = erb_freqs
                .iter()
                .map(|&f| {
                    let v = spline.eval(f);
                    if v > 0.0 {
                        v.sqrt()
                    } else {
                        0.0
                    }
                })
                .collect();

            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                row.iter_mut().for_each(|v| *v /= norm);
            }
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_and_silence() {
        let erbs = [100.0, 200.0, 400.0, 800.0];
        let l = loudness(&[0.0; 100], &erbs, 8000.0, 32);
        assert_eq!(l.len(), 100usize.div_ceil(16) + 1);
        assert!(l.iter().all(|row| row.len() == 4 && row.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn test_rows_have_unit_norm() {
        let signal: Vec<f64> = (0..512)
            .map(|n| (2.0 * PI * 500.0 * n as f64 / 8000.0).sin())
            .collect();
        let erbs: Vec<f64> = (1..40).map(|i| i as f64 * 90.0).collect();
        for row in loudness(&signal, &erbs, 8000.0, 64) {
            let norm: f64 = row.iter().map(|v| v * v).sum();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_peak_near_tone() {
        let signal: Vec<f64> = (0..2048)
            .map(|n| (2.0 * PI * 1000.0 * n as f64 / 8000.0).sin())
            .collect();
        let erbs: Vec<f64> = (1..80).map(|i| i as f64 * 50.0).collect();
        let l = loudness(&signal, &erbs, 8000.0, 256);
        let row = &l[l.len() / 2];
        let peak = row
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0;
        assert!((erbs[peak] - 1000.0).abs() <= 50.0, "peak at {} Hz", erbs[peak]);
    }
}
