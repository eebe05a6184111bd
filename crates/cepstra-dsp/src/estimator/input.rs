//! Conversion of every spectral input form to a full periodogram.

use serde::{Deserialize, Serialize};

use crate::error::{DspError, DspResult};
use crate::fft::FftPair;

/// Spectral data handed to the estimator.
///
/// `Windowed` carries a time-domain frame whose length is the FFT length.
/// The other variants carry half spectra of `N/2 + 1` bins for an FFT of
/// length `N`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpectralInput<'a> {
    /// Windowed time-domain frame.
    Windowed(&'a [f64]),
    /// Log amplitude spectrum in dB (`20 log10 |X|`).
    LogAmplitudeDb(&'a [f64]),
    /// Natural-log amplitude spectrum.
    LogAmplitude(&'a [f64]),
    /// Linear amplitude spectrum.
    Amplitude(&'a [f64]),
    /// Power spectrum.
    Periodogram(&'a [f64]),
}

impl SpectralInput<'_> {
    /// FFT length implied by the input.
    pub fn fft_len(&self) -> usize {
        match self {
            SpectralInput::Windowed(x) => x.len(),
            SpectralInput::LogAmplitudeDb(x)
            | SpectralInput::LogAmplitude(x)
            | SpectralInput::Amplitude(x)
            | SpectralInput::Periodogram(x) => 2 * x.len().saturating_sub(1),
        }
    }
}

/// Treatment of small periodogram values before the logarithm.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodogramFloor {
    /// Use the periodogram as computed.
    #[default]
    None,
    /// Add a constant (`>= 0`) to every bin.
    InitialValue(f64),
    /// Raise bins to at least `max * 10^(dB / 10)`; `dB` must be negative.
    FloorDb(f64),
}

impl PeriodogramFloor {
    pub(crate) fn validate(&self) -> DspResult<()> {
        match *self {
            PeriodogramFloor::None => Ok(()),
            PeriodogramFloor::InitialValue(e) if e.is_finite() && e >= 0.0 => Ok(()),
            PeriodogramFloor::InitialValue(e) => Err(DspError::invalid_param(
                "floor",
                format!("initial value must be non-negative, got {}", e),
            )),
            PeriodogramFloor::FloorDb(db) if db.is_finite() && db < 0.0 => Ok(()),
            PeriodogramFloor::FloorDb(db) => Err(DspError::invalid_param(
                "floor",
                format!("floor must be negative dB, got {}", db),
            )),
        }
    }

    fn additive(&self) -> f64 {
        match *self {
            PeriodogramFloor::InitialValue(e) => e,
            _ => 0.0,
        }
    }
}

/// Checks that `len` can be analysed: even and at least 4.
pub(crate) fn check_fft_len(len: usize) -> DspResult<()> {
    if len < 4 || len % 2 != 0 {
        return Err(DspError::InvalidFftLength {
            len,
            message: "must be even and at least 4".to_string(),
        });
    }
    Ok(())
}

/// Builds the even-symmetric periodogram of length `N` for `input`.
///
/// Every bin of the result is positive; a bin that is not after flooring
/// is reported as [`DspError::NonPositivePeriodogram`].
pub(crate) fn periodogram(input: &SpectralInput<'_>, floor: PeriodogramFloor) -> DspResult<Vec<f64>> {
    let n = input.fft_len();
    check_fft_len(n)?;
    floor.validate()?;
    let eps = floor.additive();

    let mut x = match *input {
        SpectralInput::Windowed(frame) => FftPair::new(n)
            .forward_real(frame)
            .into_iter()
            .map(|z| z.norm_sqr() + eps)
            .collect(),
        SpectralInput::LogAmplitudeDb(half) => mirror(half, n, |v| {
            let amp = 10f64.powf(v / 20.0);
            amp * amp + eps
        }),
        SpectralInput::LogAmplitude(half) => mirror(half, n, |v| {
            let amp = v.exp();
            amp * amp + eps
        }),
        SpectralInput::Amplitude(half) => mirror(half, n, |v| v * v + eps),
        SpectralInput::Periodogram(half) => mirror(half, n, |v| v + eps),
    };

    if let PeriodogramFloor::FloorDb(db) = floor {
        let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = max * 10f64.powf(db / 10.0);
        for v in &mut x {
            if *v < min {
                *v = min;
            }
        }
    }

    if let Some((bin, &value)) = x.iter().enumerate().find(|(_, v)| !(**v > 0.0)) {
        return Err(DspError::NonPositivePeriodogram { bin, value });
    }
    Ok(x)
}

fn mirror(half: &[f64], n: usize, to_power: impl Fn(f64) -> f64) -> Vec<f64> {
    let mut x = vec![0.0; n];
    for (slot, &v) in x.iter_mut().zip(half) {
        *slot = to_power(v);
    }
    for i in 1..n / 2 {
        x[n - i] = x[i];
    }
    x
}
