//! N-D padding plus the flat 1-D pads of the C interface.
//!
//! `pads` holds two entries per dim, `[before_0, after_0, before_1, after_1, ...]`.

use super::check_len;
use crate::error::{Result, TensorError};
use crate::params::PadMode;
use crate::shape::size;

/// Input coordinate for the unpadded position `pos`, or `None` when the
/// position takes the constant fill.
#[inline]
fn source_coord(pos: isize, len: usize, mode: PadMode) -> Option<usize> {
    let n = len as isize;
    if (0..n).contains(&pos) {
        return Some(pos as usize);
    }
    match mode {
        PadMode::Constant(_) => None,
        PadMode::Replicate => Some(pos.clamp(0, n - 1) as usize),
        PadMode::Reflect => {
            let mirrored = if pos < 0 { -pos } else { 2 * (n - 1) - pos };
            Some(mirrored as usize)
        }
    }
}

fn check_pads(op: &'static str, shape: &[usize], pads: &[usize], mode: PadMode) -> Result<Vec<usize>> {
    if pads.len() != 2 * shape.len() {
        return Err(TensorError::InvalidParameter {
            op,
            reason: format!("expected {} pad values for rank {}, got {}", 2 * shape.len(), shape.len(), pads.len()),
        });
    }
    let mut out_shape = Vec::with_capacity(shape.len());
    for (d, &len) in shape.iter().enumerate() {
        let (before, after) = (pads[2 * d], pads[2 * d + 1]);
        let bad = match mode {
            PadMode::Constant(_) => None,
            PadMode::Reflect if before.max(after) > 0 && before.max(after) >= len => {
                Some(format!("reflect pad ({before}, {after}) must be smaller than dim {d} of size {len}"))
            }
            PadMode::Replicate if len == 0 && before + after > 0 => {
                Some(format!("cannot replicate empty dim {d}"))
            }
            _ => None,
        };
        if let Some(reason) = bad {
            return Err(TensorError::InvalidParameter { op, reason });
        }
        out_shape.push(len + before + after);
    }
    Ok(out_shape)
}

/// Shape of `shape` after applying `pads`.
pub fn padded_shape(shape: &[usize], pads: &[usize], mode: PadMode) -> Result<Vec<usize>> {
    check_pads("pad", shape, pads, mode)
}

/// Pad `x` (shape `shape`) into `y` with `mode`.
///
/// Reflect mirrors about the edge element without repeating it and needs
/// every pad smaller than its dim; replicate repeats the edge.
pub fn pad(x: &[f32], y: &mut [f32], shape: &[usize], pads: &[usize], mode: PadMode) -> Result<()> {
    let out_shape = check_pads("pad", shape, pads, mode)?;
    check_len("pad", "x", size(shape), x.len())?;
    check_len("pad", "y", size(&out_shape), y.len())?;

    let fill = match mode {
        PadMode::Constant(v) => v,
        _ => 0.0,
    };
    let ndim = shape.len();
    let mut index = vec![0usize; ndim];
    for out in y.iter_mut() {
        let mut src = Some(0usize);
        for d in 0..ndim {
            let pos = index[d] as isize - pads[2 * d] as isize;
            src = match (src, source_coord(pos, shape[d], mode)) {
                (Some(acc), Some(c)) => Some(acc * shape[d] + c),
                _ => None,
            };
        }
        *out = src.map_or(fill, |i| x[i]);
        for d in (0..ndim).rev() {
            index[d] += 1;
            if index[d] < out_shape[d] {
                break;
            }
            index[d] = 0;
        }
    }
    Ok(())
}

/// Flat reflect pad: `pads[0]` elements before and `pads[1]` after.
///
/// The mirror axis is the edge element itself, which is not repeated:
/// `abcd` padded by (2, 3) gives `cbabcdcba`, never `cbabcddcb`.
pub fn reflect_pad(x: &[f32], y: &mut [f32], pads: &[usize]) -> Result<()> {
    if pads.len() < 2 {
        return Err(TensorError::InvalidParameter {
            op: "reflect_pad",
            reason: "needs a before and an after pad".to_string(),
        });
    }
    pad(x, y, &[x.len()], &pads[..2], PadMode::Reflect)
}

/// Flat constant pad: `x` is copied to the head of `y`, the tail takes `value`.
pub fn const_pad(x: &[f32], y: &mut [f32], value: f32) -> Result<()> {
    let tail = y.len().checked_sub(x.len()).ok_or_else(|| TensorError::InvalidParameter {
        op: "const_pad",
        reason: format!("output length {} is shorter than input length {}", y.len(), x.len()),
    })?;
    pad(x, y, &[x.len()], &[0, tail], PadMode::Constant(value))
}

/// Flat replicate pad: the tail of `y` repeats the last element of `x`.
pub fn replicate_pad(x: &[f32], y: &mut [f32]) -> Result<()> {
    let tail = y.len().checked_sub(x.len()).ok_or_else(|| TensorError::InvalidParameter {
        op: "replicate_pad",
        reason: format!("output length {} is shorter than input length {}", y.len(), x.len()),
    })?;
    pad(x, y, &[x.len()], &[0, tail], PadMode::Replicate)
}
