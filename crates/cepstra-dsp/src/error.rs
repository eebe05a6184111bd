//! Error types for the DSP core.
//!
//! Only configuration problems are errors. Numerical outcomes such as an
//! iteration cap or a singular normal matrix are reported through
//! [`crate::estimator::Termination`] instead.

use thiserror::Error;

/// Result type for DSP operations.
pub type DspResult<T> = Result<T, DspError>;

/// Errors that can occur when configuring or calling a DSP operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DspError {
    /// Zero-length frame or coefficient slice.
    #[error("input frame is empty")]
    EmptyFrame,

    /// FFT length unusable for spectral analysis.
    #[error("invalid FFT length {len}: {message}")]
    InvalidFftLength {
        /// The rejected length.
        len: usize,
        /// Error message.
        message: String,
    },

    /// Model order outside the supported range.
    #[error("invalid order {order}: must be in [{min}, {max}]")]
    InvalidOrder {
        /// The rejected order.
        order: usize,
        /// Smallest accepted order.
        min: usize,
        /// Largest accepted order.
        max: usize,
    },

    /// All-pass constant outside the open unit interval.
    #[error("invalid all-pass constant {alpha}: must satisfy |alpha| < 1")]
    InvalidAlpha {
        /// The rejected alpha.
        alpha: f64,
    },

    /// Generalization exponent outside the accepted domain.
    #[error("invalid gamma {gamma}: must be in [{min}, {max}]")]
    InvalidGamma {
        /// The rejected gamma.
        gamma: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// Pade approximation order other than 4 or 5.
    #[error("invalid Pade order {order}: expected 4 or 5")]
    InvalidPadeOrder {
        /// The rejected order.
        order: u8,
    },

    /// Periodogram bin that cannot enter a logarithm.
    #[error("periodogram bin {bin} is not positive ({value}); supply a floor")]
    NonPositivePeriodogram {
        /// Bin index.
        bin: usize,
        /// Bin value after flooring.
        value: f64,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },
}

impl DspError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            DspError::EmptyFrame => "DSP_001",
            DspError::InvalidFftLength { .. } => "DSP_002",
            DspError::InvalidOrder { .. } => "DSP_003",
            DspError::InvalidAlpha { .. } => "DSP_004",
            DspError::InvalidGamma { .. } => "DSP_005",
            DspError::InvalidPadeOrder { .. } => "DSP_006",
            DspError::NonPositivePeriodogram { .. } => "DSP_007",
            DspError::InvalidParameter { .. } => "DSP_008",
        }
    }
}

/// Rejects an all-pass constant outside `(-1, 1)`.
pub(crate) fn check_alpha(alpha: f64) -> DspResult<()> {
    if alpha.is_finite() && alpha.abs() < 1.0 {
        Ok(())
    } else {
        Err(DspError::InvalidAlpha { alpha })
    }
}

/// Rejects a gamma outside `[min, max]`.
pub(crate) fn check_gamma(gamma: f64, min: f64, max: f64) -> DspResult<()> {
    if gamma.is_finite() && (min..=max).contains(&gamma) {
        Ok(())
    } else {
        Err(DspError::InvalidGamma { gamma, min, max })
    }
}

/// Rejects an empty slice.
pub(crate) fn check_non_empty(values: &[f64]) -> DspResult<()> {
    if values.is_empty() {
        Err(DspError::EmptyFrame)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_param_helper() {
        let err = DspError::invalid_param("threshold", "must be non-negative");
        assert!(err.to_string().contains("threshold"));
        assert!(err.to_string().contains("non-negative"));
        assert_eq!(err.code(), "DSP_008");
    }

    #[test]
    fn test_alpha_bounds() {
        assert!(check_alpha(0.0).is_ok());
        assert!(check_alpha(-0.99).is_ok());
        assert_eq!(
            check_alpha(1.0),
            Err(DspError::InvalidAlpha { alpha: 1.0 })
        );
        assert!(check_alpha(-1.0).is_err());
        assert!(check_alpha(f64::NAN).is_err());
    }

    #[test]
    fn test_gamma_bounds() {
        assert!(check_gamma(-1.0, -1.0, 0.0).is_ok());
        assert!(check_gamma(0.0, -1.0, 0.0).is_ok());
        assert!(check_gamma(0.1, -1.0, 0.0).is_err());
        assert!(check_gamma(-1.5, -1.0, 0.0).is_err());
    }

    #[test]
    fn test_empty_frame() {
        assert_eq!(check_non_empty(&[]), Err(DspError::EmptyFrame));
        assert!(check_non_empty(&[0.0]).is_ok());
    }
}
