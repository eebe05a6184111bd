//! Pitch strength: loudness correlated with sawtooth-derived kernels.

use std::f64::consts::PI;

/// 1 followed by the primes up to `limit`.
pub(crate) fn prime_harmonics(limit: usize) -> Vec<usize> {
    if limit == 0 {
        return Vec::new();
    }
    let mut composite = vec![false; limit + 1];
    let mut harmonics = vec![1];
    for n in 2..=limit {
        if composite[n] {
            continue;
        }
        harmonics.push(n);
        for multiple in (n * n..=limit).step_by(n) {
            composite[multiple] = true;
        }
    }
    harmonics
}

/// Kernel for candidate `pitch` over the ERB frequencies.
///
/// Cosine lobes peak at each harmonic in `harmonics` with half-height
/// valleys between them, weighted by `1 / sqrt(f)`. The result is divided
/// by the norm of its positive part; an all-non-positive kernel is left
/// unscaled.
pub(crate) fn kernel(pitch: f64, erb_freqs: &[f64], harmonics: &[usize]) -> Vec<f64> {
    let mut k = vec![0.0; erb_freqs.len()];
    for &h in harmonics {
        let h = h as f64;
        for (kj, &f) in k.iter_mut().zip(erb_freqs) {
            let q = f / pitch;
            let distance = (q - h).abs();
            if distance < 0.25 {
                *kj = (2.0 * PI * q).cos();
            } else if distance < 0.75 {
                *kj += (2.0 * PI * q).cos() / 2.0;
            }
        }
    }
    for (kj, &f) in k.iter_mut().zip(erb_freqs) {
        *kj *= (1.0 / f).sqrt();
    }
    let norm = k
        .iter()
        .filter(|&&v| v > 0.0)
        .map(|v| v * v)
        .sum::<f64>()
        .sqrt();
    if norm > 0.0 {
        k.iter_mut().for_each(|v| *v /= norm);
    }
    k
}

/// Candidates scored by one window size.
pub(crate) struct WindowBand<'a> {
    /// Candidate frequencies.
    pub pitches: &'a [f64],
    /// Blend weight per candidate.
    pub weights: &'a [f64],
    /// Index of the first candidate in the full grid.
    pub offset: usize,
}

/// Adds the weighted strength of `band` to `strength` (`[candidate][frame]`).
///
/// The loudness rows lie `hop_seconds` apart; output frame `j` at
/// `j * frame_seconds` is linearly interpolated between the two rows around
/// it, extrapolating from the last pair past the end.
pub(crate) fn accumulate(
    strength: &mut [Vec<f64>],
    loudness: &[Vec<f64>],
    erb_freqs: &[f64],
    harmonics: &[usize],
    band: &WindowBand<'_>,
    hop_seconds: f64,
    frame_seconds: f64,
) {
    if loudness.len() < 2 {
        return;
    }
    let last_row = loudness.len() - 1;
    for (i, (&pitch, &mu)) in band.pitches.iter().zip(band.weights).enumerate() {
        let k = kernel(pitch, erb_freqs, harmonics);
        let local: Vec<f64> = loudness
            .iter()
            .map(|row| k.iter().zip(row).map(|(a, b)| a * b).sum())
            .collect();

        let row = &mut strength[band.offset + i];
        for (j, s) in row.iter_mut().enumerate() {
            let t = j as f64 * frame_seconds;
            let r = ((t / hop_seconds).floor() as usize + 1).clamp(1, last_row);
            let td = t - r as f64 * hop_seconds;
            let value = local[r] + td * (local[r] - local[r - 1]) / hop_seconds;
            *s += value * mu;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prime_harmonics() {
        assert_eq!(prime_harmonics(0), Vec::<usize>::new());
        assert_eq!(prime_harmonics(1), vec![1]);
        assert_eq!(prime_harmonics(20), vec![1, 2, 3, 5, 7, 11, 13, 17, 19]);
    }

    #[test]
    fn test_kernel_peaks_at_harmonics() {
        let freqs: Vec<f64> = (1..=100).map(|i| i as f64 * 10.0).collect();
        let k = kernel(100.0, &freqs, &prime_harmonics(7));
        // 100, 200 Hz are peaks; 400 Hz (a composite harmonic) is not
        assert!(k[9] > 0.0);
        assert!(k[19] > 0.0);
        assert_eq!(k[39], 0.0);
        // 150 Hz sits in a valley
        assert!(k[14] < 0.0);
        let positive: f64 = k.iter().filter(|&&v| v > 0.0).map(|v| v * v).sum();
        assert!((positive - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_accumulate_interpolates_rows() {
        let loudness = vec![vec![1.0], vec![1.0], vec![1.0]];
        let freqs = [100.0];
        let mut strength = vec![vec![0.0; 4]];
        let band = WindowBand {
            pitches: &[100.0],
            weights: &[0.5],
            offset: 0,
        };
        accumulate(&mut strength, &loudness, &freqs, &[1], &band, 0.01, 0.005);
        // the kernel at its single peak normalizes to 1
        for s in &strength[0] {
            assert!((s - 0.5).abs() < 1e-12);
        }
    }
}
