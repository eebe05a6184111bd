//! Solver for `(T + H) a = b`, with `T` a symmetric Toeplitz matrix and `H`
//! a Hankel matrix.
//!
//! The recursion works on 2x2 blocks pairing row `i` with row `n - 1 - i`,
//! so every step inverts a 2x2 matrix. A block whose determinant is smaller
//! than the caller's floor stops the solve.

/// Row-major 2x2 block.
type Block = [f64; 4];

/// A 2x2 block could not be inverted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SingularSystem {
    /// Determinant of the offending block.
    pub determinant: f64,
}

fn mat_vec(m: &Block, v: [f64; 2]) -> [f64; 2] {
    [m[0] * v[0] + m[1] * v[1], m[2] * v[0] + m[3] * v[1]]
}

fn mat_mul(x: &Block, y: &Block) -> Block {
    [
        x[0] * y[0] + x[1] * y[2],
        x[0] * y[1] + x[1] * y[3],
        x[2] * y[0] + x[3] * y[2],
        x[2] * y[1] + x[3] * y[3],
    ]
}

/// Reverses the four entries (a 180 degree rotation of the block).
fn cross(m: &Block) -> Block {
    [m[3], m[2], m[1], m[0]]
}

fn invert(m: &Block, min_det: f64) -> Result<Block, SingularSystem> {
    let det = m[0] * m[3] - m[1] * m[2];
    if det.is_nan() || det.abs() < min_det {
        return Err(SingularSystem { determinant: det });
    }
    Ok([m[3] / det, -m[1] / det, -m[2] / det, m[0] / det])
}

fn accumulate(acc: &mut Block, m: &Block) {
    for (a, v) in acc.iter_mut().zip(m) {
        *a += v;
    }
}

/// Solves `(T + H) a = b` of size `n = b.len()`.
///
/// # Arguments
/// * `t` - First row of the Toeplitz part, at least `n` values
/// * `h` - Hankel generator, `H[i][j] = h[i + j]`, at least `2n - 1` values
/// * `b` - Right-hand side
/// * `min_det` - Smallest accepted block determinant magnitude
pub(crate) fn solve(t: &[f64], h: &[f64], b: &[f64], min_det: f64) -> Result<Vec<f64>, SingularSystem> {
    let n = b.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let r: Vec<Block> = (0..n)
        .map(|i| [t[i], h[n - 1 + i], h[n - 1 - i], t[i]])
        .collect();

    let mut x: Vec<Block> = vec![[0.0; 4]; n];
    let mut xx: Vec<Block> = vec![[0.0; 4]; n];
    let mut p: Vec<[f64; 2]> = vec![[0.0; 2]; n];

    x[0] = [1.0, 0.0, 0.0, 1.0];
    p[0] = mat_vec(&invert(&r[0], min_det)?, [b[0], b[n - 1]]);
    let mut vx = r[0];

    for i in 1..n {
        let mut ex = [0.0; 4];
        let mut ep = [0.0; 2];
        for j in 0..i {
            accumulate(&mut ex, &mat_mul(&r[i - j], &x[j]));
            let v = mat_vec(&r[i - j], p[j]);
            ep[0] += v[0];
            ep[1] += v[1];
        }

        let bx = mat_mul(&invert(&cross(&vx), min_det)?, &ex);

        for j in 1..i {
            let s = mat_mul(&cross(&xx[i - j]), &bx);
            for (e, d) in x[j].iter_mut().zip(s) {
                *e -= d;
            }
        }
        xx[1..i].copy_from_slice(&x[1..i]);
        let neg = [-bx[0], -bx[1], -bx[2], -bx[3]];
        x[i] = neg;
        xx[i] = neg;

        let s = mat_mul(&cross(&ex), &bx);
        for (v, d) in vx.iter_mut().zip(s) {
            *v -= d;
        }

        let rhs = [b[i] - ep[0], b[n - 1 - i] - ep[1]];
        let g = mat_vec(&invert(&cross(&vx), min_det)?, rhs);

        for j in 0..i {
            let s = mat_vec(&cross(&x[i - j]), g);
            p[j][0] += s[0];
            p[j][1] += s[1];
        }
        p[i] = g;
    }

    Ok(p.into_iter().map(|pi| pi[0]).collect())
}
