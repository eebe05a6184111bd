//! Cepstra DSP Core
//!
//! This crate implements mel-generalized cepstral speech analysis and
//! synthesis:
//! - spectral envelope estimation (`mcep`, `mgcep`)
//! - cepstral transforms (frequency warping, gain normalization, filter
//!   coefficient conversion, impulse responses)
//! - MLSA and MGLSA synthesis filters
//! - SWIPE'-style pitch estimation
//!
//! # Overview
//!
//! A typical analysis-synthesis pass frames a signal with [`Framer`],
//! windows each frame with [`apply_window`], fits a mel-cepstrum with
//! [`mcep`], tracks pitch with [`swipe`], builds an excitation with
//! [`pulse_excitation`] and filters it through an [`MlsaSynthesizer`].
//!
//! # Determinism
//!
//! Every operation is a pure function of its inputs and config. Noise
//! excitation uses PCG32 with seeds derived via BLAKE3 hashing, so the same
//! seed always produces the same samples.
//!
//! # Example
//!
//! ```
//! use cepstra_dsp::{
//!     apply_window, mcep, EstimatorConfig, Normalization, SpectralInput, WindowKind,
//! };
//!
//! let frame: Vec<f64> = (0..256).map(|n| (0.3 * n as f64).sin()).collect();
//! let windowed = apply_window(&frame, WindowKind::Blackman, Normalization::Power)?;
//!
//! let config = EstimatorConfig::new(24, 0.42)
//!     .with_floor(cepstra_dsp::PeriodogramFloor::FloorDb(-60.0));
//! let estimate = mcep(SpectralInput::Windowed(&windowed), &config)?;
//! assert_eq!(estimate.coefficients.len(), 25);
//! # Ok::<(), cepstra_dsp::DspError>(())
//! ```
//!
//! # Crate Structure
//!
//! - [`window`] - Window functions and frame normalization
//! - [`frame`] - Zero-padded framing of a signal
//! - [`estimator`] - Mel-cepstral and mel-generalized cepstral estimation
//! - [`transform`] - Cepstral transform library
//! - [`mlsa`] - MLSA and MGLSA filters
//! - [`synthesis`] - Frame-sequence synthesis with coefficient interpolation
//! - [`excitation`] - Pulse and noise excitation from a pitch track
//! - [`pitch`] - SWIPE' pitch estimation
//! - [`rng`] - Deterministic RNG with seed derivation

pub mod error;
pub mod estimator;
pub mod excitation;
pub mod frame;
pub mod mlsa;
pub mod pitch;
pub mod rng;
pub mod synthesis;
pub mod transform;
pub mod window;

mod fft;
mod theq;

pub use error::{DspError, DspResult};
pub use estimator::{
    mcep, mgcep, Estimate, EstimatorConfig, PeriodogramFloor, SpectralInput, Termination,
};
pub use excitation::{periods_from_frequency, pulse_excitation, ExcitationConfig, NoiseKind};
pub use frame::Framer;
pub use mlsa::{mlsa_delay_len, MglsaFilter, MlsaFilter, PadeOrder};
pub use pitch::{swipe, PitchConfig, PitchOutput, UNVOICED_LOG_F0};
pub use synthesis::MlsaSynthesizer;
pub use transform::{convert_mgcep_output, OutputKind};
pub use window::{apply_window, window_weights, Normalization, WindowKind};
