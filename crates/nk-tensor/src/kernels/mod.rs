//! Pure-Rust f32 operator kernels.
//!
//! Every kernel reads borrowed input slices and writes a caller-provided
//! output slice. Buffer lengths are checked against the declared shapes up
//! front; on a mismatch the kernel returns an error and leaves the output
//! untouched. Loops favour a fixed, documented evaluation order over peak
//! throughput so results are reproducible across implementations.

pub mod activation;
pub mod binary;
pub mod conv;
pub mod interp;
pub mod layout;
pub mod matmul;
pub mod norm;
pub mod pad;
pub mod pool;
pub mod reduce;
pub mod softmax;
pub mod unary;

pub use activation::*;
pub use binary::*;
pub use conv::{conv1d, conv2d, nchw_conv2d};
pub use interp::*;
pub use layout::*;
pub use matmul::{matmul, permuted_shape, transpose, transpose_2d, tril, triu};
pub use norm::{batchnorm2d, batchnorm2d_nhwc, BATCHNORM_EPS};
pub use pad::*;
pub use pool::{avgpool2d, maxpool2d};
pub use reduce::*;
pub use softmax::*;
pub use unary::*;

use crate::error::{Result, TensorError};

/// Check that `buf` holds exactly `expected` elements.
#[inline]
pub(crate) fn check_len(
    op: &'static str,
    buffer: &'static str,
    expected: usize,
    got: usize,
) -> Result<()> {
    if expected != got {
        return Err(TensorError::LengthMismatch {
            op,
            buffer,
            expected,
            got,
        });
    }
    Ok(())
}

/// Apply `f` to every element of `x`, writing into `y`.
#[inline]
pub(crate) fn map_unary<F>(op: &'static str, x: &[f32], y: &mut [f32], f: F) -> Result<()>
where
    F: Fn(f32) -> f32,
{
    check_len(op, "y", x.len(), y.len())?;
    for (out, &v) in y.iter_mut().zip(x) {
        *out = f(v);
    }
    Ok(())
}

/// Apply `f` pairwise to `a` and `b`, writing into `c`.
#[inline]
pub(crate) fn map_binary<F>(op: &'static str, a: &[f32], b: &[f32], c: &mut [f32], f: F) -> Result<()>
where
    F: Fn(f32, f32) -> f32,
{
    check_len(op, "b", a.len(), b.len())?;
    check_len(op, "c", a.len(), c.len())?;
    for ((out, &u), &v) in c.iter_mut().zip(a).zip(b) {
        *out = f(u, v);
    }
    Ok(())
}

/// Map an output position and kernel tap of a strided window to an input
/// coordinate, or `None` when the tap lands in the zero padding.
#[inline]
pub(crate) fn window_coord(out: usize, tap: usize, stride: usize, pad: usize, len: usize) -> Option<usize> {
    let pos = (out * stride + tap).checked_sub(pad)?;
    (pos < len).then_some(pos)
}

#[inline]
pub(crate) fn bool_to_f32(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_unary_length_mismatch_leaves_output() {
        let mut y = [7.0f32; 2];
        assert!(map_unary("t", &[1.0, 2.0, 3.0], &mut y, |v| v).is_err());
        assert_eq!(y, [7.0, 7.0]);
    }

    #[test]
    fn test_map_binary_length_mismatch() {
        let mut c = [0.0f32; 2];
        let err = map_binary("t", &[1.0, 2.0], &[1.0], &mut c, |u, v| u + v).unwrap_err();
        assert_eq!(
            err,
            TensorError::LengthMismatch {
                op: "t",
                buffer: "b",
                expected: 2,
                got: 1
            }
        );
    }
}
