//! Direct convolutions with zero padding.
//!
//! Padded taps are skipped rather than multiplied by zero, which gives the
//! same sums. Bias, when present, is added once per output element after the
//! window has been accumulated.

use super::{check_len, window_coord};
use crate::error::Result;
use crate::params::{Conv1dDims, Conv1dParams, Conv2dDims, Conv2dParams};

fn check_bias(op: &'static str, bias: Option<&[f32]>, out_channels: usize) -> Result<()> {
    match bias {
        Some(b) => check_len(op, "bias", out_channels, b.len()),
        None => Ok(()),
    }
}

/// 2D convolution over NHWC input.
///
/// - `input`: `[batch, in_h, in_w, in_channels]`
/// - `weight`: `[kernel_h, kernel_w, in_channels, out_channels]`
/// - `bias`: `[out_channels]`, or `None` for zero bias
/// - `output`: `[batch, out_h, out_w, out_channels]`
pub fn conv2d(
    input: &[f32],
    weight: &[f32],
    bias: Option<&[f32]>,
    output: &mut [f32],
    dims: &Conv2dDims,
    params: &Conv2dParams,
) -> Result<()> {
    let (out_h, out_w) = dims.output_hw(params)?;
    check_len("conv2d", "input", dims.input_len(), input.len())?;
    check_len("conv2d", "weight", dims.weight_len(), weight.len())?;
    check_bias("conv2d", bias, dims.out_channels)?;
    check_len("conv2d", "output", dims.batch * out_h * out_w * dims.out_channels, output.len())?;

    let (c_in, c_out) = (dims.in_channels, dims.out_channels);
    for n in 0..dims.batch {
        for oh in 0..out_h {
            for ow in 0..out_w {
                for oc in 0..c_out {
                    let mut acc = 0.0f32;
                    for kh in 0..dims.kernel_h {
                        let Some(ih) = window_coord(oh, kh, params.stride.0, params.padding.0, dims.in_h) else {
                            continue;
                        };
                        for kw in 0..dims.kernel_w {
                            let Some(iw) = window_coord(ow, kw, params.stride.1, params.padding.1, dims.in_w) else {
                                continue;
                            };
                            let x_base = ((n * dims.in_h + ih) * dims.in_w + iw) * c_in;
                            let w_base = (kh * dims.kernel_w + kw) * c_in * c_out;
                            for ic in 0..c_in {
                                acc += input[x_base + ic] * weight[w_base + ic * c_out + oc];
                            }
                        }
                    }
                    if let Some(b) = bias {
                        acc += b[oc];
                    }
                    output[((n * out_h + oh) * out_w + ow) * c_out + oc] = acc;
                }
            }
        }
    }
    Ok(())
}

/// 2D convolution over NCHW input.
///
/// - `input`: `[batch, in_channels, in_h, in_w]`
/// - `weight`: `[out_channels, in_channels, kernel_h, kernel_w]`
/// - `bias`: `[out_channels]`, or `None` for zero bias
/// - `output`: `[batch, out_channels, out_h, out_w]`
pub fn nchw_conv2d(
    input: &[f32],
    weight: &[f32],
    bias: Option<&[f32]>,
    output: &mut [f32],
    dims: &Conv2dDims,
    params: &Conv2dParams,
) -> Result<()> {
    let (out_h, out_w) = dims.output_hw(params)?;
    check_len("nchw_conv2d", "input", dims.input_len(), input.len())?;
    check_len("nchw_conv2d", "weight", dims.weight_len(), weight.len())?;
    check_bias("nchw_conv2d", bias, dims.out_channels)?;
    check_len(
        "nchw_conv2d",
        "output",
        dims.batch * dims.out_channels * out_h * out_w,
        output.len(),
    )?;

    let (h, w) = (dims.in_h, dims.in_w);
    let (kh_len, kw_len) = (dims.kernel_h, dims.kernel_w);
    for n in 0..dims.batch {
        for oc in 0..dims.out_channels {
            for oh in 0..out_h {
                for ow in 0..out_w {
                    let mut acc = 0.0f32;
                    for ic in 0..dims.in_channels {
                        let x_plane = (n * dims.in_channels + ic) * h * w;
                        let w_plane = (oc * dims.in_channels + ic) * kh_len * kw_len;
                        for kh in 0..kh_len {
                            let Some(ih) = window_coord(oh, kh, params.stride.0, params.padding.0, h) else {
                                continue;
                            };
                            for kw in 0..kw_len {
                                let Some(iw) = window_coord(ow, kw, params.stride.1, params.padding.1, w) else {
                                    continue;
                                };
                                acc += input[x_plane + ih * w + iw] * weight[w_plane + kh * kw_len + kw];
                            }
                        }
                    }
                    if let Some(b) = bias {
                        acc += b[oc];
                    }
                    output[((n * dims.out_channels + oc) * out_h + oh) * out_w + ow] = acc;
                }
            }
        }
    }
    Ok(())
}

/// 1D convolution.
///
/// - `input`: `[batch, in_channels, length]`
/// - `weight`: `[out_channels, in_channels, kernel]`
/// - `bias`: `[out_channels]`, or `None` for zero bias
/// - `output`: `[batch, out_channels, out_length]`
pub fn conv1d(
    input: &[f32],
    weight: &[f32],
    bias: Option<&[f32]>,
    output: &mut [f32],
    dims: &Conv1dDims,
    params: &Conv1dParams,
) -> Result<()> {
    let out_len = dims.output_length(params)?;
    check_len("conv1d", "input", dims.input_len(), input.len())?;
    check_len("conv1d", "weight", dims.weight_len(), weight.len())?;
    check_bias("conv1d", bias, dims.out_channels)?;
    check_len("conv1d", "output", dims.batch * dims.out_channels * out_len, output.len())?;

    for b in 0..dims.batch {
        for oc in 0..dims.out_channels {
            for ol in 0..out_len {
                let mut acc = 0.0f32;
                for ic in 0..dims.in_channels {
                    let x_row = (b * dims.in_channels + ic) * dims.length;
                    let w_row = (oc * dims.in_channels + ic) * dims.kernel;
                    for k in 0..dims.kernel {
                        let Some(pos) = window_coord(ol, k, params.stride, params.padding, dims.length) else {
                            continue;
                        };
                        acc += input[x_row + pos] * weight[w_row + k];
                    }
                }
                if let Some(bias) = bias {
                    acc += bias[oc];
                }
                output[(b * dims.out_channels + oc) * out_len + ol] = acc;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims_3x3_single() -> Conv2dDims {
        Conv2dDims {
            batch: 1,
            in_h: 3,
            in_w: 3,
            in_channels: 1,
            kernel_h: 2,
            kernel_w: 2,
            out_channels: 1,
        }
    }

    #[test]
    fn test_conv2d_diagonal_kernel() {
        let input: Vec<f32> = (1..=9).map(|i| i as f32).collect();
        let weight = [1.0, 0.0, 0.0, 1.0];
        let mut out = [0.0f32; 4];
        conv2d(&input, &weight, None, &mut out, &dims_3x3_single(), &Conv2dParams::default()).unwrap();
        assert_eq!(out, [6.0, 8.0, 12.0, 14.0]);
    }

    #[test]
    fn test_conv2d_bias_and_padding() {
        // 2x2 all-ones kernel over a zero-padded 3x3 input of ones.
        let input = [1.0f32; 9];
        let weight = [1.0f32; 4];
        let params = Conv2dParams {
            stride: (1, 1),
            padding: (1, 1),
        };
        let dims = dims_3x3_single();
        let (oh, ow) = dims.output_hw(&params).unwrap();
        assert_eq!((oh, ow), (4, 4));
        let mut out = vec![0.0f32; 16];
        conv2d(&input, &weight, Some(&[0.5]), &mut out, &dims, &params).unwrap();
        // corners see one input, edges two, interior four
        assert_eq!(out[0], 1.5);
        assert_eq!(out[1], 2.5);
        assert_eq!(out[5], 4.5);
        assert_eq!(out[15], 1.5);
    }

    #[test]
    fn test_conv2d_multichannel_matches_nchw() {
        // batch 1, 3x3 input, 2 in channels, 2x2 kernel, 3 out channels, stride 2, pad 1
        let dims = Conv2dDims {
            batch: 1,
            in_h: 3,
            in_w: 3,
            in_channels: 2,
            kernel_h: 2,
            kernel_w: 2,
            out_channels: 3,
        };
        let params = Conv2dParams {
            stride: (2, 2),
            padding: (1, 1),
        };
        let nchw_in: Vec<f32> = (0..18).map(|i| (i as f32 * 0.7).cos()).collect();
        let oihw_w: Vec<f32> = (0..24).map(|i| (i as f32 * 0.3).sin()).collect();
        let bias = [0.1f32, -0.2, 0.3];

        // NCHW -> NHWC input, OIHW -> HWIO weights
        let mut nhwc_in = vec![0.0f32; 18];
        for c in 0..2 {
            for p in 0..9 {
                nhwc_in[p * 2 + c] = nchw_in[c * 9 + p];
            }
        }
        let mut hwio_w = vec![0.0f32; 24];
        for o in 0..3 {
            for i in 0..2 {
                for k in 0..4 {
                    hwio_w[(k * 2 + i) * 3 + o] = oihw_w[(o * 2 + i) * 4 + k];
                }
            }
        }

        let (oh, ow) = dims.output_hw(&params).unwrap();
        let mut a = vec![0.0f32; oh * ow * 3];
        let mut b = vec![0.0f32; oh * ow * 3];
        conv2d(&nhwc_in, &hwio_w, Some(&bias), &mut a, &dims, &params).unwrap();
        nchw_conv2d(&nchw_in, &oihw_w, Some(&bias), &mut b, &dims, &params).unwrap();
        for o in 0..3 {
            for p in 0..oh * ow {
                assert!((a[p * 3 + o] - b[o * oh * ow + p]).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_conv2d_rejects_bad_buffers() {
        let mut out = [0.0f32; 4];
        let dims = dims_3x3_single();
        let p = Conv2dParams::default();
        assert!(conv2d(&[0.0; 8], &[0.0; 4], None, &mut out, &dims, &p).is_err());
        assert!(conv2d(&[0.0; 9], &[0.0; 4], Some(&[0.0, 0.0]), &mut out, &dims, &p).is_err());
        let zero_stride = Conv2dParams {
            stride: (0, 1),
            padding: (0, 0),
        };
        assert!(conv2d(&[0.0; 9], &[0.0; 4], None, &mut out, &dims, &zero_stride).is_err());
    }

    #[test]
    fn test_conv1d() {
        // 1 batch, 1 in channel, 2 out channels, length 5, kernel 3, stride 2, pad 1
        let dims = Conv1dDims {
            batch: 1,
            in_channels: 1,
            out_channels: 2,
            length: 5,
            kernel: 3,
        };
        let params = Conv1dParams {
            stride: 2,
            padding: 1,
        };
        assert_eq!(dims.output_length(&params).unwrap(), 3);
        let input = [1.0, 2.0, 3.0, 4.0, 5.0];
        let weight = [1.0, 1.0, 1.0, 0.0, 1.0, 0.0];
        let mut out = [0.0f32; 6];
        conv1d(&input, &weight, Some(&[0.0, 10.0]), &mut out, &dims, &params).unwrap();
        assert_eq!(out, [3.0, 9.0, 9.0, 11.0, 13.0, 15.0]);
    }
}
