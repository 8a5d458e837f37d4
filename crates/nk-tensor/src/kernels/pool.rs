//! 2D max and average pooling over NHWC input.
//!
//! Windows follow the convolution rules. Max pooling ignores padded taps and
//! yields 0 for a window made only of padding; average pooling divides by the
//! full window area, padding included.

use super::{check_len, window_coord};
use crate::error::Result;
use crate::params::{Pool2dDims, Pool2dParams};

#[derive(Clone, Copy)]
enum PoolKind {
    Max,
    Avg,
}

fn pool2d(
    op: &'static str,
    x: &[f32],
    y: &mut [f32],
    dims: &Pool2dDims,
    params: &Pool2dParams,
    kind: PoolKind,
) -> Result<()> {
    let (out_h, out_w) = dims.output_hw(params)?;
    check_len(op, "x", dims.input_len(), x.len())?;
    check_len(op, "y", dims.batch * out_h * out_w * dims.channels, y.len())?;

    let (kh_len, kw_len) = params.kernel;
    let area = (kh_len * kw_len) as f32;
    let c_len = dims.channels;

    for n in 0..dims.batch {
        for oh in 0..out_h {
            for ow in 0..out_w {
                for c in 0..c_len {
                    let mut max_val = f32::NEG_INFINITY;
                    let mut sum = 0.0f32;
                    let mut seen = false;
                    for kh in 0..kh_len {
                        let Some(ih) = window_coord(oh, kh, params.stride.0, params.padding.0, dims.height) else {
                            continue;
                        };
                        for kw in 0..kw_len {
                            let Some(iw) = window_coord(ow, kw, params.stride.1, params.padding.1, dims.width) else {
                                continue;
                            };
                            let v = x[((n * dims.height + ih) * dims.width + iw) * c_len + c];
                            seen = true;
                            max_val = if v.is_nan() || v > max_val { v } else { max_val };
                            sum += v;
                        }
                    }
                    y[((n * out_h + oh) * out_w + ow) * c_len + c] = match kind {
                        PoolKind::Max if seen => max_val,
                        PoolKind::Max => 0.0,
                        PoolKind::Avg => sum / area,
                    };
                }
            }
        }
    }
    Ok(())
}

pub fn maxpool2d(x: &[f32], y: &mut [f32], dims: &Pool2dDims, params: &Pool2dParams) -> Result<()> {
    pool2d("maxpool2d", x, y, dims, params, PoolKind::Max)
}

/// Average pooling with count-include-pad semantics.
pub fn avgpool2d(x: &[f32], y: &mut [f32], dims: &Pool2dDims, params: &Pool2dParams) -> Result<()> {
    pool2d("avgpool2d", x, y, dims, params, PoolKind::Avg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(height: usize, width: usize, channels: usize) -> Pool2dDims {
        Pool2dDims {
            batch: 1,
            height,
            width,
            channels,
        }
    }

    #[test]
    fn test_maxpool_ascending() {
        let x: Vec<f32> = (1..=16).map(|i| i as f32).collect();
        let mut y = [0.0f32; 4];
        maxpool2d(&x, &mut y, &dims(4, 4, 1), &Pool2dParams::square(2)).unwrap();
        assert_eq!(y, [6.0, 8.0, 14.0, 16.0]);
    }

    #[test]
    fn test_avgpool_ascending() {
        let x: Vec<f32> = (1..=16).map(|i| i as f32).collect();
        let mut y = [0.0f32; 4];
        avgpool2d(&x, &mut y, &dims(4, 4, 1), &Pool2dParams::square(2)).unwrap();
        assert_eq!(y, [3.5, 5.5, 11.5, 13.5]);
    }

    #[test]
    fn test_avgpool_counts_padding() {
        let x = [4.0f32; 4];
        let params = Pool2dParams {
            kernel: (2, 2),
            stride: (2, 2),
            padding: (1, 1),
        };
        let d = dims(2, 2, 1);
        assert_eq!(d.output_hw(&params).unwrap(), (2, 2));
        let mut y = [0.0f32; 4];
        avgpool2d(&x, &mut y, &d, &params).unwrap();
        // each window holds one real value and three padded zeros
        assert_eq!(y, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_maxpool_ignores_padding() {
        let x = [-4.0f32, -3.0, -2.0, -1.0];
        let params = Pool2dParams {
            kernel: (2, 2),
            stride: (2, 2),
            padding: (1, 1),
        };
        let mut y = [0.0f32; 4];
        maxpool2d(&x, &mut y, &dims(2, 2, 1), &params).unwrap();
        assert_eq!(y, [-4.0, -3.0, -2.0, -1.0]);
    }

    #[test]
    fn test_maxpool_all_padding_window_is_zero() {
        // 1x1 input, 1x1 kernel, stride 1, pad 1 -> 3x3 output, only centre sees data
        let params = Pool2dParams {
            kernel: (1, 1),
            stride: (1, 1),
            padding: (1, 1),
        };
        let mut y = [9.0f32; 9];
        maxpool2d(&[-5.0], &mut y, &dims(1, 1, 1), &params).unwrap();
        assert_eq!(y, [0.0, 0.0, 0.0, 0.0, -5.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_channels_pool_independently() {
        // 2x2 spatial, 2 channels interleaved
        let x = [1.0f32, -1.0, 2.0, -2.0, 3.0, -3.0, 4.0, -4.0];
        let mut y = [0.0f32; 2];
        maxpool2d(&x, &mut y, &dims(2, 2, 2), &Pool2dParams::square(2)).unwrap();
        assert_eq!(y, [4.0, -1.0]);
    }
}
