//! Resampling with an align-corners coordinate map.
//!
//! Output index `i` samples input coordinate `t = i * (in - 1) / (out - 1)`
//! (`t = 0` when `out == 1`), so the first and last samples coincide. Taps
//! that fall outside the input are clamped to the edge.
//!
//! Shaped variants take `planes` independent spatial blocks laid out one
//! after another with the spatial dims innermost. Flat variants infer a square
//! or cubic spatial shape when both sizes allow it and otherwise treat the
//! buffer as a single row.

use super::check_len;
use crate::error::{Result, TensorError};

const CUBIC_A: f32 = -0.5;

#[inline]
fn source_coord(i: usize, in_len: usize, out_len: usize) -> f32 {
    if out_len <= 1 {
        0.0
    } else {
        (i * (in_len - 1)) as f32 / (out_len - 1) as f32
    }
}

/// Two-tap linear sample position: `(lo, hi, weight_of_hi)`.
#[inline]
fn linear_taps(i: usize, in_len: usize, out_len: usize) -> (usize, usize, f32) {
    let t = source_coord(i, in_len, out_len);
    let lo = (t.floor() as usize).min(in_len - 1);
    let hi = (lo + 1).min(in_len - 1);
    (lo, hi, t - lo as f32)
}

/// Catmull-Rom style cubic convolution kernel with `a = -0.5`.
#[inline]
fn cubic_weight(d: f32) -> f32 {
    let d = d.abs();
    if d <= 1.0 {
        ((CUBIC_A + 2.0) * d - (CUBIC_A + 3.0)) * d * d + 1.0
    } else if d < 2.0 {
        ((CUBIC_A * d - 5.0 * CUBIC_A) * d + 8.0 * CUBIC_A) * d - 4.0 * CUBIC_A
    } else {
        0.0
    }
}

/// Four clamped taps and their weights around the source coordinate of `i`.
#[inline]
fn cubic_taps(i: usize, in_len: usize, out_len: usize) -> ([usize; 4], [f32; 4]) {
    let t = source_coord(i, in_len, out_len);
    let base = t.floor();
    let frac = t - base;
    let last = (in_len - 1) as isize;
    let mut idx = [0usize; 4];
    let mut w = [0.0f32; 4];
    for k in 0..4 {
        let offset = k as isize - 1;
        idx[k] = (base as isize + offset).clamp(0, last) as usize;
        w[k] = cubic_weight(frac - offset as f32);
    }
    (idx, w)
}

fn check_spatial(op: &'static str, x: &[f32], y: &[f32], planes: usize, in_sp: &[usize], out_sp: &[usize]) -> Result<()> {
    let in_n: usize = in_sp.iter().product();
    let out_n: usize = out_sp.iter().product();
    check_len(op, "x", planes * in_n, x.len())?;
    check_len(op, "y", planes * out_n, y.len())?;
    if in_n == 0 && out_n > 0 {
        return Err(TensorError::InvalidParameter {
            op,
            reason: "cannot resample an empty input".to_string(),
        });
    }
    Ok(())
}

/// Nearest-neighbour resampling; source coordinates round half to even.
pub fn nearest_interp(x: &[f32], y: &mut [f32]) -> Result<()> {
    let (in_len, out_len) = (x.len(), y.len());
    check_spatial("nearest_interp", x, y, 1, &[in_len], &[out_len])?;
    for (i, out) in y.iter_mut().enumerate() {
        let t = source_coord(i, in_len, out_len).round_ties_even() as usize;
        *out = x[t.min(in_len - 1)];
    }
    Ok(())
}

/// Two-tap linear resampling of a flat buffer.
pub fn linear_interp(x: &[f32], y: &mut [f32]) -> Result<()> {
    let (in_len, out_len) = (x.len(), y.len());
    check_spatial("linear_interp", x, y, 1, &[in_len], &[out_len])?;
    for (i, out) in y.iter_mut().enumerate() {
        let (lo, hi, w) = linear_taps(i, in_len, out_len);
        *out = x[lo] * (1.0 - w) + x[hi] * w;
    }
    Ok(())
}

/// Bilinear resampling of `planes` blocks from `(in_h, in_w)` to `(out_h, out_w)`.
pub fn bilinear_interp_2d(
    x: &[f32],
    y: &mut [f32],
    planes: usize,
    in_hw: (usize, usize),
    out_hw: (usize, usize),
) -> Result<()> {
    let (ih, iw) = in_hw;
    let (oh, ow) = out_hw;
    check_spatial("bilinear_interp", x, y, planes, &[ih, iw], &[oh, ow])?;
    for p in 0..planes {
        let src = &x[p * ih * iw..(p + 1) * ih * iw];
        for r in 0..oh {
            let (r0, r1, wr) = linear_taps(r, ih, oh);
            for c in 0..ow {
                let (c0, c1, wc) = linear_taps(c, iw, ow);
                let top = src[r0 * iw + c0] * (1.0 - wc) + src[r0 * iw + c1] * wc;
                let bottom = src[r1 * iw + c0] * (1.0 - wc) + src[r1 * iw + c1] * wc;
                y[(p * oh + r) * ow + c] = top * (1.0 - wr) + bottom * wr;
            }
        }
    }
    Ok(())
}

/// Trilinear resampling of `planes` blocks from `(d, h, w)` to `(out_d, out_h, out_w)`.
pub fn trilinear_interp_3d(
    x: &[f32],
    y: &mut [f32],
    planes: usize,
    in_dhw: (usize, usize, usize),
    out_dhw: (usize, usize, usize),
) -> Result<()> {
    let (id, ih, iw) = in_dhw;
    let (od, oh, ow) = out_dhw;
    check_spatial("trilinear_interp", x, y, planes, &[id, ih, iw], &[od, oh, ow])?;
    let in_block = id * ih * iw;
    for p in 0..planes {
        let src = &x[p * in_block..(p + 1) * in_block];
        let at = |d: usize, r: usize, c: usize| src[(d * ih + r) * iw + c];
        for d in 0..od {
            let (d0, d1, wd) = linear_taps(d, id, od);
            for r in 0..oh {
                let (r0, r1, wr) = linear_taps(r, ih, oh);
                for c in 0..ow {
                    let (c0, c1, wc) = linear_taps(c, iw, ow);
                    let plane = |dd: usize| {
                        let top = at(dd, r0, c0) * (1.0 - wc) + at(dd, r0, c1) * wc;
                        let bottom = at(dd, r1, c0) * (1.0 - wc) + at(dd, r1, c1) * wc;
                        top * (1.0 - wr) + bottom * wr
                    };
                    y[((p * od + d) * oh + r) * ow + c] = plane(d0) * (1.0 - wd) + plane(d1) * wd;
                }
            }
        }
    }
    Ok(())
}

/// Bicubic resampling of `planes` blocks; a 4x4 neighbourhood per sample.
pub fn bicubic_interp_2d(
    x: &[f32],
    y: &mut [f32],
    planes: usize,
    in_hw: (usize, usize),
    out_hw: (usize, usize),
) -> Result<()> {
    let (ih, iw) = in_hw;
    let (oh, ow) = out_hw;
    check_spatial("bicubic_interp", x, y, planes, &[ih, iw], &[oh, ow])?;
    for p in 0..planes {
        let src = &x[p * ih * iw..(p + 1) * ih * iw];
        for r in 0..oh {
            let (rows, wr) = cubic_taps(r, ih, oh);
            for c in 0..ow {
                let (cols, wc) = cubic_taps(c, iw, ow);
                let mut acc = 0.0f32;
                for (&ri, &rw) in rows.iter().zip(&wr) {
                    let mut row_acc = 0.0f32;
                    for (&ci, &cw) in cols.iter().zip(&wc) {
                        row_acc += src[ri * iw + ci] * cw;
                    }
                    acc += row_acc * rw;
                }
                y[(p * oh + r) * ow + c] = acc;
            }
        }
    }
    Ok(())
}

fn exact_root(n: usize, power: u32) -> Option<usize> {
    let guess = (n as f64).powf(1.0 / power as f64).round() as usize;
    (guess.saturating_sub(1)..=guess + 1).find(|s| s.pow(power) == n)
}

/// Square spatial sides for a flat pair of sizes, or a single row otherwise.
fn infer_2d(in_len: usize, out_len: usize) -> ((usize, usize), (usize, usize)) {
    match (exact_root(in_len, 2), exact_root(out_len, 2)) {
        (Some(a), Some(b)) => ((a, a), (b, b)),
        _ => ((1, in_len), (1, out_len)),
    }
}

pub fn bilinear_interp(x: &[f32], y: &mut [f32]) -> Result<()> {
    let (in_hw, out_hw) = infer_2d(x.len(), y.len());
    bilinear_interp_2d(x, y, 1, in_hw, out_hw)
}

pub fn bicubic_interp(x: &[f32], y: &mut [f32]) -> Result<()> {
    let (in_hw, out_hw) = infer_2d(x.len(), y.len());
    bicubic_interp_2d(x, y, 1, in_hw, out_hw)
}

pub fn trilinear_interp(x: &[f32], y: &mut [f32]) -> Result<()> {
    let (in_dhw, out_dhw) = match (exact_root(x.len(), 3), exact_root(y.len(), 3)) {
        (Some(a), Some(b)) => ((a, a, a), (b, b, b)),
        _ => ((1, 1, x.len()), (1, 1, y.len())),
    };
    trilinear_interp_3d(x, y, 1, in_dhw, out_dhw)
}
