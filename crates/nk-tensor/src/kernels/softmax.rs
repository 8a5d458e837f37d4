//! Axis-aware normalisations: softmax, log-softmax, softmin and GLU.
//!
//! A shape is viewed as `(outer, len, inner)` around the reduced axis; each
//! of the `outer * inner` slices is strided by `inner`. The flat variants
//! treat the buffer as a rank-1 tensor, so axis `0` and `-1` both mean the
//! whole buffer is a single slice.

use super::activation::sigmoid_scalar;
use super::check_len;
use crate::error::{Result, TensorError};
use crate::shape::Shape;

#[derive(Clone, Copy)]
enum Normalize {
    Softmax,
    LogSoftmax,
    Softmin,
}

fn normalize_axis(
    op: &'static str,
    x: &[f32],
    y: &mut [f32],
    shape: &[usize],
    axis: isize,
    kind: Normalize,
) -> Result<()> {
    let shape = Shape::from_slice(shape);
    check_len(op, "x", shape.numel(), x.len())?;
    check_len(op, "y", shape.numel(), y.len())?;
    let axis = shape.resolve_axis(axis)?;
    let (outer, len, inner) = shape.split_at_axis(axis);
    if len == 0 {
        return Ok(());
    }

    let sign = match kind {
        Normalize::Softmin => -1.0f32,
        _ => 1.0,
    };

    for o in 0..outer {
        for i in 0..inner {
            let base = o * len * inner + i;
            let at = |k: usize| base + k * inner;

            // Subtract the slice maximum so exp never overflows.
            let mut max_val = f32::NEG_INFINITY;
            for k in 0..len {
                max_val = max_val.max(sign * x[at(k)]);
            }

            let mut sum = 0.0f32;
            for k in 0..len {
                let e = (sign * x[at(k)] - max_val).exp();
                if let Normalize::LogSoftmax = kind {
                    y[at(k)] = sign * x[at(k)] - max_val;
                } else {
                    y[at(k)] = e;
                }
                sum += e;
            }

            match kind {
                Normalize::LogSoftmax => {
                    let log_sum = sum.ln();
                    for k in 0..len {
                        y[at(k)] -= log_sum;
                    }
                }
                _ => {
                    let inv_sum = 1.0 / sum;
                    for k in 0..len {
                        y[at(k)] *= inv_sum;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Softmax of `x` (shape `shape`) along `axis`; negative axes count from the end.
pub fn softmax(x: &[f32], y: &mut [f32], shape: &[usize], axis: isize) -> Result<()> {
    normalize_axis("softmax", x, y, shape, axis, Normalize::Softmax)
}

/// `x - max - ln(sum(exp(x - max)))` along `axis`.
pub fn log_softmax(x: &[f32], y: &mut [f32], shape: &[usize], axis: isize) -> Result<()> {
    normalize_axis("log_softmax", x, y, shape, axis, Normalize::LogSoftmax)
}

/// Softmax of `-x` along `axis`.
pub fn softmin(x: &[f32], y: &mut [f32], shape: &[usize], axis: isize) -> Result<()> {
    normalize_axis("softmin", x, y, shape, axis, Normalize::Softmin)
}

pub fn softmax_flat(x: &[f32], y: &mut [f32], axis: isize) -> Result<()> {
    softmax(x, y, &[x.len()], axis)
}

pub fn log_softmax_flat(x: &[f32], y: &mut [f32], axis: isize) -> Result<()> {
    log_softmax(x, y, &[x.len()], axis)
}

pub fn softmin_flat(x: &[f32], y: &mut [f32], axis: isize) -> Result<()> {
    softmin(x, y, &[x.len()], axis)
}

/// Gated linear unit: split `dim` in half into `(a, b)` and emit `a * sigmoid(b)`.
///
/// The output has the input's shape with `dim` halved.
///
/// # Errors
/// Fails if `dim` is out of range or its size is odd.
pub fn glu(x: &[f32], y: &mut [f32], shape: &[usize], dim: isize) -> Result<()> {
    let shape = Shape::from_slice(shape);
    check_len("glu", "x", shape.numel(), x.len())?;
    let dim = shape.resolve_axis(dim)?;
    let (outer, len, inner) = shape.split_at_axis(dim);
    if len % 2 != 0 {
        return Err(TensorError::InvalidParameter {
            op: "glu",
            reason: format!("dimension {dim} has odd size {len}"),
        });
    }
    let half = len / 2;
    check_len("glu", "y", outer * half * inner, y.len())?;

    for o in 0..outer {
        for k in 0..half {
            for i in 0..inner {
                let a = x[(o * len + k) * inner + i];
                let b = x[(o * len + k + half) * inner + i];
                y[(o * half + k) * inner + i] = a * sigmoid_scalar(b);
            }
        }
    }
    Ok(())
}

/// GLU over a flat buffer: first half gated by the second.
pub fn glu_flat(x: &[f32], y: &mut [f32]) -> Result<()> {
    glu(x, y, &[x.len()], 0)
}
