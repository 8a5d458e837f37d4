//! Dense 2D primitives: matmul, transposes and triangular masks.

use super::check_len;
use crate::error::{Result, TensorError};
use crate::shape::strides_of;

/// Matrix multiplication: C = A @ B.
///
/// - `a`: row-major data of shape [m, k]
/// - `b`: row-major data of shape [k, n]
/// - `c`: row-major output of shape [m, n]
///
/// Each output element accumulates its `k` products in order into one f32,
/// which keeps results bit-identical to the reference loop.
pub fn matmul(a: &[f32], b: &[f32], c: &mut [f32], m: usize, k: usize, n: usize) -> Result<()> {
    check_len("matmul", "a", m * k, a.len())?;
    check_len("matmul", "b", k * n, b.len())?;
    check_len("matmul", "c", m * n, c.len())?;

    for i in 0..m {
        for j in 0..n {
            let mut sum = 0.0f32;
            for p in 0..k {
                sum += a[i * k + p] * b[p * n + j];
            }
            c[i * n + j] = sum;
        }
    }
    Ok(())
}

/// `y[w, h] = x[h, w]` for an `h x w` matrix.
pub fn transpose_2d(x: &[f32], y: &mut [f32], h: usize, w: usize) -> Result<()> {
    check_len("transpose_2d", "x", h * w, x.len())?;
    check_len("transpose_2d", "y", h * w, y.len())?;
    for r in 0..h {
        for c in 0..w {
            y[c * h + r] = x[r * w + c];
        }
    }
    Ok(())
}

fn check_permutation(perm: &[usize], ndim: usize) -> Result<()> {
    let mut seen = vec![false; ndim];
    let valid = perm.len() == ndim
        && perm.iter().all(|&p| {
            if p >= ndim || seen[p] {
                return false;
            }
            seen[p] = true;
            true
        });
    if !valid {
        return Err(TensorError::InvalidPermutation {
            perm: perm.to_vec(),
            ndim,
        });
    }
    Ok(())
}

/// Shape produced by permuting `shape` with `perm`.
pub fn permuted_shape(shape: &[usize], perm: &[usize]) -> Result<Vec<usize>> {
    check_permutation(perm, shape.len())?;
    Ok(perm.iter().map(|&p| shape[p]).collect())
}

/// General axis permutation: output axis `j` is input axis `perm[j]`.
pub fn transpose(x: &[f32], y: &mut [f32], shape: &[usize], perm: &[usize]) -> Result<()> {
    let out_shape = permuted_shape(shape, perm)?;
    let n: usize = shape.iter().product();
    check_len("transpose", "x", n, x.len())?;
    check_len("transpose", "y", n, y.len())?;

    let in_strides = strides_of(shape);
    // Input stride walked by each output axis.
    let walk: Vec<usize> = perm.iter().map(|&p| in_strides[p]).collect();
    let ndim = out_shape.len();
    let mut index = vec![0usize; ndim];
    let mut src = 0usize;

    for out in y.iter_mut() {
        *out = x[src];
        // Odometer increment over the output index, last axis fastest.
        for d in (0..ndim).rev() {
            index[d] += 1;
            src += walk[d];
            if index[d] < out_shape[d] {
                break;
            }
            src -= walk[d] * index[d];
            index[d] = 0;
        }
    }
    Ok(())
}

fn triangle(
    op: &'static str,
    x: &[f32],
    y: &mut [f32],
    rows: usize,
    cols: usize,
    keep: impl Fn(usize, usize) -> bool,
) -> Result<()> {
    check_len(op, "x", rows * cols, x.len())?;
    check_len(op, "y", rows * cols, y.len())?;
    for r in 0..rows {
        for c in 0..cols {
            let idx = r * cols + c;
            y[idx] = if keep(r, c) { x[idx] } else { 0.0 };
        }
    }
    Ok(())
}

/// Upper triangle including the diagonal; the strict lower triangle is zeroed.
pub fn triu(x: &[f32], y: &mut [f32], rows: usize, cols: usize) -> Result<()> {
    triangle("triu", x, y, rows, cols, |r, c| c >= r)
}

/// Lower triangle including the diagonal; the strict upper triangle is zeroed.
pub fn tril(x: &[f32], y: &mut [f32], rows: usize, cols: usize) -> Result<()> {
    triangle("tril", x, y, rows, cols, |r, c| c <= r)
}
