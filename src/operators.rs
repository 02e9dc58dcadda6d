//! Dense row-major kernels used by the autoencoder and the similarity table.
//!
//! - Matrices are flat `&[f64]` in row-major order with explicit shapes
//! - Products are parallel over output rows (rayon); each row is summed
//!   sequentially so results do not depend on the thread count
//! - Cosine similarity guards against zero vectors

use rayon::prelude::*;
use smartcore::linalg::basic::{
    arrays::{Array, Array2},
    matrix::DenseMatrix,
};

/// Computes the Euclidean norm (L2) without allocating.
#[inline]
pub fn norm(a: &[f64]) -> f64 {
    a.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "Dimension mismatch");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine of the angle between `a` and `b`; 0.0 if either has zero norm.
#[inline]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let denom = norm(a) * norm(b);
    if denom > 0.0 {
        (dot(a, b) / denom).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// `a (m×k) · b (k×n)`
pub fn matmul(a: &[f64], b: &[f64], m: usize, k: usize, n: usize) -> Vec<f64> {
    assert_eq!(a.len(), m * k, "lhs shape mismatch");
    assert_eq!(b.len(), k * n, "rhs shape mismatch");
    let mut out = vec![0.0; m * n];
    if n == 0 {
        return out;
    }
    out.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
        let a_row = &a[i * k..(i + 1) * k];
        for (p, &a_ip) in a_row.iter().enumerate() {
            if a_ip == 0.0 {
                continue;
            }
            let b_row = &b[p * n..(p + 1) * n];
            row.iter_mut().zip(b_row).for_each(|(o, &bv)| *o += a_ip * bv);
        }
    });
    out
}

/// `a (m×k) · bᵀ` where `b` is stored `n×k`.
pub fn matmul_a_bt(a: &[f64], b: &[f64], m: usize, k: usize, n: usize) -> Vec<f64> {
    assert_eq!(a.len(), m * k, "lhs shape mismatch");
    assert_eq!(b.len(), n * k, "rhs shape mismatch");
    let mut out = vec![0.0; m * n];
    if n == 0 {
        return out;
    }
    out.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
        let a_row = &a[i * k..(i + 1) * k];
        for (j, o) in row.iter_mut().enumerate() {
            *o = dot(a_row, &b[j * k..(j + 1) * k]);
        }
    });
    out
}

/// `aᵀ · b` where `a` is stored `r×m` and `b` is `r×n`; result is `m×n`.
pub fn matmul_at_b(a: &[f64], b: &[f64], r: usize, m: usize, n: usize) -> Vec<f64> {
    assert_eq!(a.len(), r * m, "lhs shape mismatch");
    assert_eq!(b.len(), r * n, "rhs shape mismatch");
    let mut out = vec![0.0; m * n];
    if n == 0 {
        return out;
    }
    out.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
        for p in 0..r {
            let a_pi = a[p * m + i];
            if a_pi == 0.0 {
                continue;
            }
            let b_row = &b[p * n..(p + 1) * n];
            row.iter_mut().zip(b_row).for_each(|(o, &bv)| *o += a_pi * bv);
        }
    });
    out
}

/// Column sums of an `m×n` row-major matrix.
pub fn column_sums(a: &[f64], m: usize, n: usize) -> Vec<f64> {
    assert_eq!(a.len(), m * n, "shape mismatch");
    let mut sums = vec![0.0; n];
    for row in a.chunks(n.max(1)).take(m) {
        sums.iter_mut().zip(row).for_each(|(s, &v)| *s += v);
    }
    sums
}

/// Mean squared difference over all cells.
pub fn mean_squared_error(prediction: &[f64], target: &[f64]) -> f64 {
    assert_eq!(prediction.len(), target.len(), "Dimension mismatch");
    if target.is_empty() {
        return 0.0;
    }
    prediction
        .iter()
        .zip(target)
        .map(|(p, t)| (p - t).powi(2))
        .sum::<f64>()
        / target.len() as f64
}

/// Flatten a DenseMatrix into row-major storage.
pub fn to_row_major(data: &DenseMatrix<f64>) -> (Vec<f64>, usize, usize) {
    let (n, f) = data.shape();
    let mut flat = Vec::with_capacity(n * f);
    for i in 0..n {
        flat.extend((0..f).map(|j| *data.get((i, j))));
    }
    (flat, n, f)
}

pub fn from_row_major(flat: Vec<f64>, n: usize, f: usize) -> DenseMatrix<f64> {
    DenseMatrix::from_iterator(flat.into_iter(), n, f, 0)
}
