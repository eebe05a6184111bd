//! Mel log spectrum approximation (MLSA) and mel-generalized log spectrum
//! approximation (MGLSA) synthesis filters.
//!
//! The MLSA filter realizes `exp(F(z))` for the warped FIR
//! `F(z) = sum b[m] z~^-m` by a Pade approximation of the exponential. It is
//! split into a first stage that carries `b[1]` alone and a second stage
//! carrying `b[2..=M]`, each a cascade of `P` copies of the basic filter
//! where `P` is the Pade order.
//!
//! Coefficient slices always have `order + 1` entries. `b[0]` is the gain
//! term and is never read by the filters: callers scale the excitation.

use serde::{Deserialize, Serialize};

use crate::error::{check_alpha, DspError, DspResult};

/// Pade approximation coefficients for order 4.
const PADE_4: [f64; 5] = [1.0, 0.4999273, 0.1067005, 0.01170221, 0.0005656279];

/// Pade approximation coefficients for order 5.
const PADE_5: [f64; 6] = [
    1.0,
    0.4999391,
    0.1107098,
    0.01369984,
    0.0009564853,
    0.00003041721,
];

/// Order of the Pade approximation of the exponential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PadeOrder {
    /// Fourth order; accurate for `|F(e^jw)|` up to about 4.5.
    #[default]
    Four,
    /// Fifth order; accurate up to about 6.2.
    Five,
}

impl PadeOrder {
    /// The order as a number.
    pub fn value(self) -> usize {
        match self {
            PadeOrder::Four => 4,
            PadeOrder::Five => 5,
        }
    }

    fn coefficients(self) -> &'static [f64] {
        match self {
            PadeOrder::Four => &PADE_4,
            PadeOrder::Five => &PADE_5,
        }
    }
}

impl TryFrom<u8> for PadeOrder {
    type Error = DspError;

    fn try_from(order: u8) -> Result<Self, Self::Error> {
        match order {
            4 => Ok(PadeOrder::Four),
            5 => Ok(PadeOrder::Five),
            _ => Err(DspError::InvalidPadeOrder { order }),
        }
    }
}

impl From<PadeOrder> for u8 {
    fn from(pade: PadeOrder) -> Self {
        pade.value() as u8
    }
}

/// Delay-line length of an MLSA filter: `3 * (P + 1) + P * (order + 2)`.
///
/// The first stage uses `2 * (P + 1)` cells, the second stage `P` sections of
/// `order + 2` cells followed by `P + 1` cells for the cascade outputs.
pub fn mlsa_delay_len(order: usize, pade: PadeOrder) -> usize {
    let p = pade.value();
    3 * (p + 1) + p * (order + 2)
}

/// Structure of the second-stage FIR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Structure {
    Direct,
    Transposed,
}

/// A stateful MLSA filter.
///
/// Every independent synthesis stream owns its own filter. The delay line is
/// sized once at construction.
#[derive(Debug, Clone)]
pub struct MlsaFilter {
    order: usize,
    alpha: f64,
    pade: PadeOrder,
    structure: Structure,
    delay: Vec<f64>,
}

impl MlsaFilter {
    /// Creates a direct-structure filter.
    ///
    /// # Arguments
    /// * `order` - Number of filter coefficients minus one, at least 1
    /// * `alpha` - All-pass constant, `|alpha| < 1`
    /// * `pade` - Pade approximation order
    pub fn new(order: usize, alpha: f64, pade: PadeOrder) -> DspResult<Self> {
        Self::build(order, alpha, pade, Structure::Direct)
    }

    /// Creates a filter whose second stage uses the transposed structure.
    ///
    /// Its transfer function is the same as the direct filter's; the two
    /// differ only in how coefficient changes propagate through the state.
    pub fn transposed(order: usize, alpha: f64, pade: PadeOrder) -> DspResult<Self> {
        Self::build(order, alpha, pade, Structure::Transposed)
    }

    fn build(order: usize, alpha: f64, pade: PadeOrder, structure: Structure) -> DspResult<Self> {
        if order == 0 {
            return Err(DspError::invalid_param("order", "must be at least 1"));
        }
        check_alpha(alpha)?;
        Ok(Self {
            order,
            alpha,
            pade,
            structure,
            delay: vec![0.0; mlsa_delay_len(order, pade)],
        })
    }

    /// Filter order.
    pub fn order(&self) -> usize {
        self.order
    }

    /// All-pass constant.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Pade order.
    pub fn pade(&self) -> PadeOrder {
        self.pade
    }

    /// Read-only view of the delay line.
    pub fn delay(&self) -> &[f64] {
        &self.delay
    }

    /// Clears the delay line.
    pub fn reset(&mut self) {
        self.delay.iter_mut().for_each(|d| *d = 0.0);
    }

    /// Filters one sample with coefficients `b` (`order + 1` values).
    pub fn filter(&mut self, x: f64, b: &[f64]) -> DspResult<f64> {
        check_coefficients(b, self.order)?;
        Ok(self.filter_unchecked(x, b))
    }

    pub(crate) fn filter_unchecked(&mut self, x: f64, b: &[f64]) -> f64 {
        let p = self.pade.value();
        let pade = self.pade.coefficients();
        let (first, second) = self.delay.split_at_mut(2 * (p + 1));
        let x = first_stage(x, b[1], self.alpha, pade, first);
        second_stage(
            x,
            b,
            self.order,
            self.alpha,
            pade,
            second,
            self.structure,
        )
    }
}

fn check_coefficients(b: &[f64], order: usize) -> DspResult<()> {
    if b.len() != order + 1 {
        return Err(DspError::invalid_param(
            "coefficients",
            format!("expected {} values, got {}", order + 1, b.len()),
        ));
    }
    Ok(())
}

/// Adds the `i`-th Pade term to the running feedback input with the sign
/// pattern of the approximation (odd terms add, even terms subtract).
#[inline]
fn feedback(x: f64, v: f64, i: usize) -> f64 {
    if i % 2 == 1 {
        x + v
    } else {
        x - v
    }
}

/// First stage: the Pade cascade around the single-coefficient filter `b1`.
fn first_stage(mut x: f64, b1: f64, alpha: f64, pade: &[f64], delay: &mut [f64]) -> f64 {
    let p = pade.len() - 1;
    let aa = 1.0 - alpha * alpha;
    let (d, pt) = delay.split_at_mut(p + 1);
    let mut out = 0.0;
    for i in (1..=p).rev() {
        d[i] = aa * pt[i - 1] + alpha * d[i];
        pt[i] = d[i] * b1;
        let v = pt[i] * pade[i];
        x = feedback(x, v, i);
        out += v;
    }
    pt[0] = x;
    out + x
}

/// Second stage: the Pade cascade around the warped FIR over `b[2..=M]`.
fn second_stage(
    mut x: f64,
    b: &[f64],
    order: usize,
    alpha: f64,
    pade: &[f64],
    delay: &mut [f64],
    structure: Structure,
) -> f64 {
    let p = pade.len() - 1;
    let section = order + 2;
    let (sections, pt) = delay.split_at_mut(p * section);
    let mut out = 0.0;
    for i in (1..=p).rev() {
        let d = &mut sections[(i - 1) * section..i * section];
        pt[i] = match structure {
            Structure::Direct => warped_fir(pt[i - 1], b, order, alpha, d),
            Structure::Transposed => warped_fir_transposed(pt[i - 1], b, order, alpha, d),
        };
        let v = pt[i] * pade[i];
        x = feedback(x, v, i);
        out += v;
    }
    pt[0] = x;
    out + x
}

/// Warped FIR `sum_{m>=2} b[m] (1 - a^2) / (1 - a z^-1) z~^-(m-1)` with the
/// all-pass chain in the delay line.
fn warped_fir(x: f64, b: &[f64], order: usize, alpha: f64, d: &mut [f64]) -> f64 {
    let aa = 1.0 - alpha * alpha;
    d[0] = x;
    d[1] = aa * d[0] + alpha * d[1];
    let mut y = 0.0;
    for i in 2..=order {
        d[i] += alpha * (d[i + 1] - d[i - 1]);
        y += d[i] * b[i];
    }
    for i in (2..=order + 1).rev() {
        d[i] = d[i - 1];
    }
    y
}

/// Same transfer function as [`warped_fir`], evaluated in nested form: the
/// coefficients enter the all-pass chain and the output leaves its end.
///
/// `d[k]` for `k` in `2..=order` holds the state of the all-pass feeding
/// coefficient `k - 1`, `d[1]` the state of the closing first-order section.
fn warped_fir_transposed(x: f64, b: &[f64], order: usize, alpha: f64, d: &mut [f64]) -> f64 {
    if order < 2 {
        return 0.0;
    }
    let mut all_pass = |u: f64, k: usize| {
        let y = d[k] - alpha * u;
        d[k] = u + alpha * y;
        y
    };
    let mut u = b[order] * x;
    for i in (2..order).rev() {
        u = b[i] * x + all_pass(u, i + 1);
    }
    let u = all_pass(u, 2);
    let y = (1.0 - alpha * alpha) * u + d[1];
    d[1] = alpha * y;
    y
}

/// A stateful MGLSA filter for `gamma = -1 / stage`.
///
/// It realizes `(1 + gamma F(z))^(-1/gamma)` as `stage` cascaded all-pole
/// sections, so its coefficients are the gamma-scaled normalized form
/// `(K, gamma b'[1], ..., gamma b'[M])`.
#[derive(Debug, Clone)]
pub struct MglsaFilter {
    order: usize,
    alpha: f64,
    stage: usize,
    structure: Structure,
    delay: Vec<f64>,
}

impl MglsaFilter {
    /// Creates a direct-structure filter with `stage` sections (`stage >= 1`).
    pub fn new(order: usize, alpha: f64, stage: usize) -> DspResult<Self> {
        Self::build(order, alpha, stage, Structure::Direct)
    }

    /// Creates a transposed-structure filter.
    pub fn transposed(order: usize, alpha: f64, stage: usize) -> DspResult<Self> {
        Self::build(order, alpha, stage, Structure::Transposed)
    }

    fn build(order: usize, alpha: f64, stage: usize, structure: Structure) -> DspResult<Self> {
        if order == 0 {
            return Err(DspError::invalid_param("order", "must be at least 1"));
        }
        check_alpha(alpha)?;
        if stage == 0 {
            return Err(DspError::invalid_param("stage", "must be at least 1"));
        }
        Ok(Self {
            order,
            alpha,
            stage,
            structure,
            delay: vec![0.0; stage * (order + 1)],
        })
    }

    /// Generalization exponent realized by the cascade.
    pub fn gamma(&self) -> f64 {
        -1.0 / self.stage as f64
    }

    /// Number of cascaded sections.
    pub fn stage(&self) -> usize {
        self.stage
    }

    /// Read-only view of the delay line.
    pub fn delay(&self) -> &[f64] {
        &self.delay
    }

    /// Clears the delay line.
    pub fn reset(&mut self) {
        self.delay.iter_mut().for_each(|d| *d = 0.0);
    }

    /// Filters one sample with coefficients `b` (`order + 1` values).
    pub fn filter(&mut self, x: f64, b: &[f64]) -> DspResult<f64> {
        check_coefficients(b, self.order)?;
        Ok(self.filter_unchecked(x, b))
    }

    pub(crate) fn filter_unchecked(&mut self, mut x: f64, b: &[f64]) -> f64 {
        let m = self.order;
        for d in self.delay.chunks_exact_mut(m + 1) {
            x = match self.structure {
                Structure::Direct => all_pole_section(x, b, m, self.alpha, d),
                Structure::Transposed => all_pole_section_transposed(x, b, m, self.alpha, d),
            };
        }
        x
    }
}

/// One section `1 / (1 + B(z))` with `B` the warped FIR over `b[1..=M]`.
fn all_pole_section(mut x: f64, b: &[f64], m: usize, alpha: f64, d: &mut [f64]) -> f64 {
    let aa = 1.0 - alpha * alpha;
    let mut y = d[0] * b[1];
    for i in 1..m {
        d[i] += alpha * (d[i + 1] - d[i - 1]);
        y += d[i] * b[i + 1];
    }
    x -= y;
    for i in (1..=m).rev() {
        d[i] = d[i - 1];
    }
    d[0] = alpha * d[0] + aa * x;
    x
}

fn all_pole_section_transposed(mut x: f64, b: &[f64], m: usize, alpha: f64, d: &mut [f64]) -> f64 {
    x -= d[0] * (1.0 - alpha * alpha);
    d[m] = b[m] * x + alpha * d[m - 1];
    for i in (1..m).rev() {
        d[i] += b[i] * x + alpha * (d[i - 1] - d[i + 1]);
    }
    for i in 0..m {
        d[i] = d[i + 1];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{b2mc, c2ir, freqt};

    fn impulse_response<F: FnMut(f64) -> f64>(len: usize, mut f: F) -> Vec<f64> {
        (0..len).map(|n| f(if n == 0 { 1.0 } else { 0.0 })).collect()
    }

    #[test]
    fn test_delay_len() {
        assert_eq!(mlsa_delay_len(25, PadeOrder::Four), 123);
        assert_eq!(mlsa_delay_len(25, PadeOrder::Five), 153);
        assert_eq!(mlsa_delay_len(1, PadeOrder::Four), 27);

        let filter = MlsaFilter::new(25, 0.42, PadeOrder::Five).unwrap();
        assert_eq!(filter.delay().len(), 153);
        let filter = MlsaFilter::transposed(25, 0.42, PadeOrder::Four).unwrap();
        assert_eq!(filter.delay().len(), 123);
    }

    #[test]
    fn test_pade_order_conversion() {
        assert_eq!(PadeOrder::try_from(4), Ok(PadeOrder::Four));
        assert_eq!(PadeOrder::try_from(5), Ok(PadeOrder::Five));
        assert_eq!(
            PadeOrder::try_from(6),
            Err(DspError::InvalidPadeOrder { order: 6 })
        );
        assert_eq!(serde_json::to_string(&PadeOrder::Five).unwrap(), "5");
        assert_eq!(serde_json::from_str::<PadeOrder>("4").unwrap(), PadeOrder::Four);
        assert!(serde_json::from_str::<PadeOrder>("3").is_err());
    }

    #[test]
    fn test_invalid_construction() {
        assert!(MlsaFilter::new(0, 0.42, PadeOrder::Four).is_err());
        assert!(matches!(
            MlsaFilter::new(10, 1.0, PadeOrder::Four),
            Err(DspError::InvalidAlpha { .. })
        ));
        assert!(MglsaFilter::new(10, 0.42, 0).is_err());
    }

    #[test]
    fn test_zero_coefficients_pass_through() {
        let b = vec![0.0; 9];
        for pade in [PadeOrder::Four, PadeOrder::Five] {
            let mut direct = MlsaFilter::new(8, 0.42, pade).unwrap();
            let mut transposed = MlsaFilter::transposed(8, 0.42, pade).unwrap();
            for x in [1.0, -0.5, 0.25, 3.0, 0.0] {
                assert!((direct.filter(x, &b).unwrap() - x).abs() < 1e-15);
                assert!((transposed.filter(x, &b).unwrap() - x).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn test_first_order_approximates_exponential() {
        // exp(0.3 z^-1) has impulse response 0.3^n / n!
        let mut filter = MlsaFilter::new(1, 0.0, PadeOrder::Five).unwrap();
        let b = [0.0, 0.3];
        let h = impulse_response(5, |x| filter.filter(x, &b).unwrap());
        let want = [1.0, 0.3, 0.045, 0.0045, 0.0003375];
        for (got, want) in h.iter().zip(want) {
            assert!((got - want).abs() < 1e-4, "{} vs {}", got, want);
        }
    }

    #[test]
    fn test_matches_cepstral_impulse_response() {
        let b = [0.0, 0.2, -0.15, 0.1, 0.05];
        let mc = b2mc(&b, 0.42).unwrap();
        let c = freqt(&mc, 80, -0.42).unwrap();
        let want = c2ir(&c, 30).unwrap();

        for pade in [PadeOrder::Four, PadeOrder::Five] {
            let mut filter = MlsaFilter::new(4, 0.42, pade).unwrap();
            let h = impulse_response(30, |x| filter.filter(x, &b).unwrap());
            for (got, want) in h.iter().zip(&want) {
                assert!((got - want).abs() < 1e-4, "{} vs {}", got, want);
            }
        }
    }

    #[test]
    fn test_transposed_matches_direct() {
        let b = [0.0, 0.2, -0.15, 0.1, 0.05];
        let mut direct = MlsaFilter::new(4, 0.42, PadeOrder::Four).unwrap();
        let mut transposed = MlsaFilter::transposed(4, 0.42, PadeOrder::Four).unwrap();
        let h1 = impulse_response(40, |x| direct.filter(x, &b).unwrap());
        let h2 = impulse_response(40, |x| transposed.filter(x, &b).unwrap());
        for (a, b) in h1.iter().zip(&h2) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_state_isolation() {
        let b1 = [0.0, 0.3, -0.1, 0.05];
        let b2 = [0.0, -0.2, 0.2, 0.1];
        let input: Vec<f64> = (0..64).map(|n| ((n * 7 % 13) as f64 - 6.0) / 6.0).collect();

        let mut solo1 = MlsaFilter::new(3, 0.35, PadeOrder::Four).unwrap();
        let mut solo2 = MlsaFilter::new(3, 0.35, PadeOrder::Four).unwrap();
        let want1: Vec<f64> = input.iter().map(|&x| solo1.filter(x, &b1).unwrap()).collect();
        let want2: Vec<f64> = input.iter().map(|&x| solo2.filter(-x, &b2).unwrap()).collect();

        let mut f1 = MlsaFilter::new(3, 0.35, PadeOrder::Four).unwrap();
        let mut f2 = MlsaFilter::new(3, 0.35, PadeOrder::Four).unwrap();
        for (n, &x) in input.iter().enumerate() {
            assert_eq!(f2.filter(-x, &b2).unwrap(), want2[n]);
            assert_eq!(f1.filter(x, &b1).unwrap(), want1[n]);
        }
    }

    #[test]
    fn test_reset_restores_initial_response() {
        let b = [0.0, 0.3, -0.1, 0.05];
        let mut filter = MlsaFilter::new(3, 0.42, PadeOrder::Five).unwrap();
        let first = impulse_response(16, |x| filter.filter(x, &b).unwrap());
        filter.reset();
        assert!(filter.delay().iter().all(|&d| d == 0.0));
        let second = impulse_response(16, |x| filter.filter(x, &b).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_coefficient_length_checked() {
        let mut filter = MlsaFilter::new(3, 0.42, PadeOrder::Four).unwrap();
        assert!(filter.filter(1.0, &[0.0, 0.1]).is_err());
        let mut filter = MglsaFilter::new(3, 0.42, 2).unwrap();
        assert!(filter.filter(1.0, &[0.0; 5]).is_err());
    }

    #[test]
    fn test_mglsa_single_stage_is_all_pole() {
        // 1 / (1 + 0.5 z^-1)
        let mut filter = MglsaFilter::new(1, 0.0, 1).unwrap();
        let b = [1.0, 0.5];
        let h = impulse_response(4, |x| filter.filter(x, &b).unwrap());
        assert_eq!(h, vec![1.0, -0.5, 0.25, -0.125]);
        assert_eq!(filter.gamma(), -1.0);
        assert_eq!(filter.delay().len(), 2);
    }

    #[test]
    fn test_mglsa_stages_cascade() {
        // two stages of 1 / (1 + 0.5 z^-1)
        let mut filter = MglsaFilter::new(2, 0.0, 2).unwrap();
        assert_eq!(filter.delay().len(), 6);
        let b = [1.0, 0.5, 0.0];
        let h = impulse_response(3, |x| filter.filter(x, &b).unwrap());
        assert_eq!(h, vec![1.0, -1.0, 0.75]);
    }

    #[test]
    fn test_mglsa_transposed_matches_direct() {
        let b = [1.0, 0.2, -0.1, 0.05];
        let mut direct = MglsaFilter::new(3, 0.42, 3).unwrap();
        let mut transposed = MglsaFilter::transposed(3, 0.42, 3).unwrap();
        let h1 = impulse_response(40, |x| direct.filter(x, &b).unwrap());
        let h2 = impulse_response(40, |x| transposed.filter(x, &b).unwrap());
        for (a, b) in h1.iter().zip(&h2) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
