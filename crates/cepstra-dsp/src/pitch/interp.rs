//! Natural cubic spline over a strictly increasing grid.

/// Index of the first element of `sorted` greater than `x`.
pub(crate) fn bisect(sorted: &[f64], x: f64) -> usize {
    sorted.partition_point(|&v| v <= x)
}

/// A natural cubic spline (zero second derivative at both ends).
///
/// Values outside the grid are extrapolated with the first or last piece.
#[derive(Debug, Clone)]
pub(crate) struct NaturalSpline<'a> {
    x: &'a [f64],
    y: &'a [f64],
    y2: Vec<f64>,
}

impl<'a> NaturalSpline<'a> {
    /// Fits the spline; `x` must be strictly increasing with at least two
    /// points and `y` the same length.
    pub(crate) fn new(x: &'a [f64], y: &'a [f64]) -> Self {
        let n = x.len();
        let mut y2 = vec![0.0; n];
        let mut u = vec![0.0; n];
        for i in 1..n.saturating_sub(1) {
            let sig = (x[i] - x[i - 1]) / (x[i + 1] - x[i - 1]);
            let p = sig * y2[i - 1] + 2.0;
            y2[i] = (sig - 1.0) / p;
            let slope = (y[i + 1] - y[i]) / (x[i + 1] - x[i]) - (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
            u[i] = (6.0 * slope / (x[i + 1] - x[i - 1]) - sig * u[i - 1]) / p;
        }
        for k in (0..n.saturating_sub(1)).rev() {
            y2[k] = y2[k] * y2[k + 1] + u[k];
        }
        Self { x, y, y2 }
    }

    /// Evaluates the spline at `v`.
    pub(crate) fn eval(&self, v: f64) -> f64 {
        let hi = bisect(self.x, v).clamp(1, self.x.len() - 1);
        self.eval_in(v, hi)
    }

    fn eval_in(&self, v: f64, hi: usize) -> f64 {
        let lo = hi - 1;
        let h = self.x[hi] - self.x[lo];
        let a = (self.x[hi] - v) / h;
        let b = (v - self.x[lo]) / h;
        a * self.y[lo]
            + b * self.y[hi]
            + ((a * a * a - a) * self.y2[lo] + (b * b * b - b) * self.y2[hi]) * h * h / 6.0
    }
}
