//! Alternate output forms of a mel-generalized cepstral estimate.

use serde::{Deserialize, Serialize};

use super::{b2mc, gnorm, ignorm};
use crate::error::DspResult;

/// Representation returned by [`crate::estimator::mgcep`].
///
/// The estimator works on normalized MGLSA coefficients `(K, b')`; every
/// other kind is a fixed composition of [`ignorm`], [`b2mc`], [`gnorm`] and
/// a final gamma scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Mel-generalized cepstrum `c~`.
    #[default]
    MelGeneralizedCepstrum,
    /// MGLSA filter coefficients `b`.
    MglsaCoefficients,
    /// Gain-normalized cepstrum `(K~, c~')`.
    NormalizedCepstrum,
    /// Gain-normalized filter coefficients `(K, b')`, the estimator's own form.
    NormalizedCoefficients,
    /// `(K~, gamma * c~')`.
    GammaScaledCepstrum,
    /// `(K, gamma * b')`, the form consumed by the MGLSA filter.
    GammaScaledCoefficients,
}

impl OutputKind {
    fn denormalizes(self) -> bool {
        matches!(
            self,
            OutputKind::MelGeneralizedCepstrum
                | OutputKind::MglsaCoefficients
                | OutputKind::NormalizedCepstrum
                | OutputKind::GammaScaledCepstrum
        )
    }

    fn to_cepstrum(self) -> bool {
        matches!(
            self,
            OutputKind::MelGeneralizedCepstrum
                | OutputKind::NormalizedCepstrum
                | OutputKind::GammaScaledCepstrum
        )
    }

    fn renormalizes(self) -> bool {
        matches!(
            self,
            OutputKind::NormalizedCepstrum | OutputKind::GammaScaledCepstrum
        )
    }

    fn gamma_scaled(self) -> bool {
        matches!(
            self,
            OutputKind::GammaScaledCepstrum | OutputKind::GammaScaledCoefficients
        )
    }
}

/// Converts normalized MGLSA coefficients `(K, b')` into `kind`.
pub fn convert_mgcep_output(
    raw: &[f64],
    alpha: f64,
    gamma: f64,
    kind: OutputKind,
) -> DspResult<Vec<f64>> {
    let mut out = raw.to_vec();
    if kind.denormalizes() {
        out = ignorm(&out, gamma)?;
    }
    if kind.to_cepstrum() {
        out = b2mc(&out, alpha)?;
    }
    if kind.renormalizes() {
        out = gnorm(&out, gamma)?;
    }
    if kind.gamma_scaled() {
        for v in out.iter_mut().skip(1) {
            *v *= gamma;
        }
    }
    Ok(out)
}
