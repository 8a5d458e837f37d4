//! Shape manipulation: fills, copies, tiling, broadcasting, slicing and
//! concatenation.
//!
//! Reshape, squeeze and unsqueeze never move data in a row-major layout, so
//! the flat kernels are plain copies and the new shape is the caller's
//! metadata.

use super::check_len;
use crate::error::{Result, TensorError};
use crate::shape::{size, strides_of, Shape};

/// Fill `y` with `value`.
pub fn constant(y: &mut [f32], value: f32) {
    y.fill(value);
}

fn copy(op: &'static str, x: &[f32], y: &mut [f32]) -> Result<()> {
    check_len(op, "y", x.len(), y.len())?;
    y.copy_from_slice(x);
    Ok(())
}

pub fn reshape(x: &[f32], y: &mut [f32]) -> Result<()> {
    copy("reshape", x, y)
}

pub fn squeeze(x: &[f32], y: &mut [f32]) -> Result<()> {
    copy("squeeze", x, y)
}

pub fn unsqueeze(x: &[f32], y: &mut [f32]) -> Result<()> {
    copy("unsqueeze", x, y)
}

fn tile(op: &'static str, x: &[f32], y: &mut [f32]) -> Result<()> {
    if y.is_empty() {
        return Ok(());
    }
    if x.is_empty() || y.len() % x.len() != 0 {
        return Err(TensorError::InvalidParameter {
            op,
            reason: format!("input length {} does not divide output length {}", x.len(), y.len()),
        });
    }
    for chunk in y.chunks_exact_mut(x.len()) {
        chunk.copy_from_slice(x);
    }
    Ok(())
}

/// Cyclic tiling: `y[i] = x[i % x.len()]`.
pub fn expand(x: &[f32], y: &mut [f32]) -> Result<()> {
    tile("expand", x, y)
}

/// Tiling for an input aligned with the trailing dims of an output of rank
/// at most four. In a row-major layout this is the same cyclic repeat as
/// [`expand`].
pub fn expand_last4(x: &[f32], y: &mut [f32]) -> Result<()> {
    tile("expand_last4", x, y)
}

/// Numpy-style broadcast of `x` (shape `in_shape`) to `out_shape`.
///
/// `in_shape` is aligned to the right of `out_shape`; every input dim must
/// equal the output dim or be 1.
pub fn broadcast_to(x: &[f32], in_shape: &[usize], y: &mut [f32], out_shape: &[usize]) -> Result<()> {
    let target = Shape::from_slice(out_shape);
    let merged = Shape::broadcast_shape(&Shape::from_slice(in_shape), &target)?;
    if merged != target {
        return Err(TensorError::BroadcastError {
            a: in_shape.to_vec(),
            b: out_shape.to_vec(),
        });
    }
    check_len("broadcast_to", "x", size(in_shape), x.len())?;
    check_len("broadcast_to", "y", target.numel(), y.len())?;

    let ndim = out_shape.len();
    let lead = ndim - in_shape.len();
    let in_strides = strides_of(in_shape);
    // Broadcast axes step by zero through the input.
    let walk: Vec<usize> = (0..ndim)
        .map(|d| {
            if d < lead || in_shape[d - lead] == 1 {
                0
            } else {
                in_strides[d - lead]
            }
        })
        .collect();

    let mut index = vec![0usize; ndim];
    let mut src = 0usize;
    for out in y.iter_mut() {
        *out = x[src];
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

/// Copy the stride-1 hyperrectangle of extent `out_shape` starting at
/// `start` out of `x` (shape `in_shape`).
pub fn slice(x: &[f32], in_shape: &[usize], y: &mut [f32], out_shape: &[usize], start: &[usize]) -> Result<()> {
    let ndim = in_shape.len();
    if out_shape.len() != ndim || start.len() != ndim {
        return Err(TensorError::ShapeMismatch {
            expected: in_shape.to_vec(),
            got: out_shape.to_vec(),
        });
    }
    if (0..ndim).any(|d| start[d] + out_shape[d] > in_shape[d]) {
        return Err(TensorError::IndexOutOfBounds {
            index: start.to_vec(),
            shape: in_shape.to_vec(),
        });
    }
    check_len("slice", "x", size(in_shape), x.len())?;
    check_len("slice", "y", size(out_shape), y.len())?;
    if y.is_empty() {
        return Ok(());
    }
    if ndim == 0 {
        y[0] = x[0];
        return Ok(());
    }

    // Copy whole innermost runs; iterate the outer index like an odometer.
    let in_strides = strides_of(in_shape);
    let run = out_shape[ndim - 1];
    let mut index = vec![0usize; ndim - 1];
    for chunk in y.chunks_exact_mut(run) {
        let src: usize = (0..ndim)
            .map(|d| {
                let i = if d < ndim - 1 { index[d] } else { 0 };
                (start[d] + i) * in_strides[d]
            })
            .sum();
        chunk.copy_from_slice(&x[src..src + run]);
        for d in (0..ndim - 1).rev() {
            index[d] += 1;
            if index[d] < out_shape[d] {
                break;
            }
            index[d] = 0;
        }
    }
    Ok(())
}

/// Flat concatenation: the inputs are written tail to head into `y`.
pub fn concat(inputs: &[&[f32]], y: &mut [f32]) -> Result<()> {
    let total: usize = inputs.iter().map(|x| x.len()).sum();
    check_len("concat", "y", total, y.len())?;
    let mut pos = 0;
    for x in inputs {
        y[pos..pos + x.len()].copy_from_slice(x);
        pos += x.len();
    }
    Ok(())
}

/// Concatenation along one axis of inputs viewed as `[outer, axis_len, inner]`.
///
/// `axis_lens[i]` is the extent of input `i` along the joined axis; `outer`
/// and `inner` are shared by every input.
pub fn concat_axis(inputs: &[&[f32]], axis_lens: &[usize], outer: usize, inner: usize, y: &mut [f32]) -> Result<()> {
    if inputs.len() != axis_lens.len() {
        return Err(TensorError::InvalidParameter {
            op: "concat_axis",
            reason: format!("{} inputs but {} axis lengths", inputs.len(), axis_lens.len()),
        });
    }
    for (x, &len) in inputs.iter().zip(axis_lens) {
        check_len("concat_axis", "input", outer * len * inner, x.len())?;
    }
    let joined: usize = axis_lens.iter().sum();
    check_len("concat_axis", "y", outer * joined * inner, y.len())?;

    let mut pos = 0;
    for o in 0..outer {
        for (x, &len) in inputs.iter().zip(axis_lens) {
            let block = len * inner;
            y[pos..pos + block].copy_from_slice(&x[o * block..(o + 1) * block]);
            pos += block;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_and_copies() {
        let mut y = [0.0f32; 3];
        constant(&mut y, 2.5);
        assert_eq!(y, [2.5; 3]);
        reshape(&[1.0, 2.0, 3.0], &mut y).unwrap();
        assert_eq!(y, [1.0, 2.0, 3.0]);
        assert!(squeeze(&[1.0, 2.0], &mut y).is_err());
        assert_eq!(y, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_expand_tiles() {
        let mut y = [0.0f32; 6];
        expand(&[1.0, 2.0], &mut y).unwrap();
        assert_eq!(y, [1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
        expand_last4(&[7.0, 8.0, 9.0], &mut y).unwrap();
        assert_eq!(y, [7.0, 8.0, 9.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_expand_rejects_non_divisor() {
        let mut y = [0.0f32; 5];
        assert!(expand(&[1.0, 2.0], &mut y).is_err());
        assert!(expand(&[], &mut y).is_err());
    }

    #[test]
    fn test_broadcast_row_and_column() {
        let mut y = [0.0f32; 6];
        broadcast_to(&[1.0, 2.0, 3.0], &[3], &mut y, &[2, 3]).unwrap();
        assert_eq!(y, [1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
        broadcast_to(&[1.0, 2.0], &[2, 1], &mut y, &[2, 3]).unwrap();
        assert_eq!(y, [1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_broadcast_middle_axis() {
        // [2, 1, 2] -> [2, 3, 2]
        let x = [1.0f32, 2.0, 3.0, 4.0];
        let mut y = [0.0f32; 12];
        broadcast_to(&x, &[2, 1, 2], &mut y, &[2, 3, 2]).unwrap();
        assert_eq!(y, [1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 3.0, 4.0, 3.0, 4.0, 3.0, 4.0]);
    }

    #[test]
    fn test_broadcast_rejects_incompatible() {
        let mut y = [0.0f32; 6];
        assert!(broadcast_to(&[1.0, 2.0], &[2], &mut y, &[2, 3]).is_err());
        // output may not shrink a dim
        let mut z = [0.0f32; 3];
        assert!(broadcast_to(&[0.0; 6], &[2, 3], &mut z, &[1, 3]).is_err());
    }

    #[test]
    fn test_slice_centre() {
        let x: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let mut y = [0.0f32; 4];
        slice(&x, &[4, 4], &mut y, &[2, 2], &[1, 1]).unwrap();
        assert_eq!(y, [5.0, 6.0, 9.0, 10.0]);
    }

    #[test]
    fn test_slice_3d() {
        let x: Vec<f32> = (0..24).map(|i| i as f32).collect();
        let mut y = [0.0f32; 4];
        slice(&x, &[2, 3, 4], &mut y, &[2, 1, 2], &[0, 2, 1]).unwrap();
        assert_eq!(y, [9.0, 10.0, 21.0, 22.0]);
    }

    #[test]
    fn test_slice_out_of_range() {
        let mut y = [0.0f32; 4];
        let err = slice(&[0.0; 16], &[4, 4], &mut y, &[2, 2], &[3, 0]).unwrap_err();
        assert!(matches!(err, TensorError::IndexOutOfBounds { .. }));
    }

    #[test]
    fn test_concat_flat() {
        let mut y = [0.0f32; 5];
        concat(&[&[1.0, 2.0], &[], &[3.0, 4.0, 5.0]], &mut y).unwrap();
        assert_eq!(y, [1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_concat_axis_columns() {
        // [2, 1] ++ [2, 2] along axis 1
        let a = [1.0f32, 2.0];
        let b = [10.0f32, 11.0, 20.0, 21.0];
        let mut y = [0.0f32; 6];
        concat_axis(&[&a, &b], &[1, 2], 2, 1, &mut y).unwrap();
        assert_eq!(y, [1.0, 10.0, 11.0, 2.0, 20.0, 21.0]);
    }
}
