//! Geometry and hyper-parameters for the windowed kernels.
//!
//! The `*Dims` structs carry the shapes a caller would otherwise pass as loose
//! integers; the `*Params` structs carry stride and padding and default to a
//! stride of one with no padding.

use crate::error::{Result, TensorError};

/// Output length of a strided window sweep: `floor((input + 2*pad - kernel) / stride) + 1`.
///
/// # Errors
/// Fails if `stride` is zero or `kernel` is zero or larger than the padded input.
pub fn window_output_len(
    op: &'static str,
    input: usize,
    kernel: usize,
    stride: usize,
    pad: usize,
) -> Result<usize> {
    if stride == 0 {
        return Err(TensorError::InvalidParameter {
            op,
            reason: "stride must be positive".to_string(),
        });
    }
    let padded = input + 2 * pad;
    if kernel == 0 || kernel > padded {
        return Err(TensorError::InvalidParameter {
            op,
            reason: format!("kernel size {kernel} does not fit padded input {padded}"),
        });
    }
    Ok((padded - kernel) / stride + 1)
}

/// Stride and zero padding of a 2D convolution, as (height, width) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conv2dParams {
    pub stride: (usize, usize),
    pub padding: (usize, usize),
}

impl Default for Conv2dParams {
    fn default() -> Self {
        Self {
            stride: (1, 1),
            padding: (0, 0),
        }
    }
}

/// Shapes of a 2D convolution. Applies to both the NHWC and NCHW kernels;
/// only the memory order differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conv2dDims {
    pub batch: usize,
    pub in_h: usize,
    pub in_w: usize,
    pub in_channels: usize,
    pub kernel_h: usize,
    pub kernel_w: usize,
    pub out_channels: usize,
}

impl Conv2dDims {
    /// Output spatial size `(out_h, out_w)`.
    pub fn output_hw(&self, params: &Conv2dParams) -> Result<(usize, usize)> {
        let out_h = window_output_len(
            "conv2d",
            self.in_h,
            self.kernel_h,
            params.stride.0,
            params.padding.0,
        )?;
        let out_w = window_output_len(
            "conv2d",
            self.in_w,
            self.kernel_w,
            params.stride.1,
            params.padding.1,
        )?;
        Ok((out_h, out_w))
    }

    pub fn input_len(&self) -> usize {
        self.batch * self.in_h * self.in_w * self.in_channels
    }

    pub fn weight_len(&self) -> usize {
        self.kernel_h * self.kernel_w * self.in_channels * self.out_channels
    }

    pub fn output_len(&self, params: &Conv2dParams) -> Result<usize> {
        let (out_h, out_w) = self.output_hw(params)?;
        Ok(self.batch * out_h * out_w * self.out_channels)
    }
}

/// Stride and zero padding of a 1D convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conv1dParams {
    pub stride: usize,
    pub padding: usize,
}

impl Default for Conv1dParams {
    fn default() -> Self {
        Self {
            stride: 1,
            padding: 0,
        }
    }
}

/// Shapes of a 1D convolution over `(batch, in_channels, length)` input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conv1dDims {
    pub batch: usize,
    pub in_channels: usize,
    pub out_channels: usize,
    pub length: usize,
    pub kernel: usize,
}

impl Conv1dDims {
    pub fn output_length(&self, params: &Conv1dParams) -> Result<usize> {
        window_output_len(
            "conv1d",
            self.length,
            self.kernel,
            params.stride,
            params.padding,
        )
    }

    pub fn input_len(&self) -> usize {
        self.batch * self.in_channels * self.length
    }

    pub fn weight_len(&self) -> usize {
        self.out_channels * self.in_channels * self.kernel
    }

    pub fn output_len(&self, params: &Conv1dParams) -> Result<usize> {
        Ok(self.batch * self.out_channels * self.output_length(params)?)
    }
}

/// Window, stride and padding of a 2D pooling kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pool2dParams {
    pub kernel: (usize, usize),
    pub stride: (usize, usize),
    pub padding: (usize, usize),
}

impl Pool2dParams {
    /// Non-overlapping `k x k` windows without padding.
    pub fn square(k: usize) -> Self {
        Self {
            kernel: (k, k),
            stride: (k, k),
            padding: (0, 0),
        }
    }
}

impl Default for Pool2dParams {
    fn default() -> Self {
        Self::square(2)
    }
}

/// NHWC input shape of a pooling kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pool2dDims {
    pub batch: usize,
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl Pool2dDims {
    pub fn output_hw(&self, params: &Pool2dParams) -> Result<(usize, usize)> {
        let out_h = window_output_len(
            "pool2d",
            self.height,
            params.kernel.0,
            params.stride.0,
            params.padding.0,
        )?;
        let out_w = window_output_len(
            "pool2d",
            self.width,
            params.kernel.1,
            params.stride.1,
            params.padding.1,
        )?;
        Ok((out_h, out_w))
    }

    pub fn input_len(&self) -> usize {
        self.batch * self.height * self.width * self.channels
    }

    pub fn output_len(&self, params: &Pool2dParams) -> Result<usize> {
        let (out_h, out_w) = self.output_hw(params)?;
        Ok(self.batch * out_h * out_w * self.channels)
    }
}

/// How the border of a padded tensor is filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PadMode {
    /// Fill with a fixed value.
    Constant(f32),
    /// Mirror the interior, excluding the edge element (`abcd` -> `cb|abcd|cb`).
    Reflect,
    /// Repeat the edge element.
    Replicate,
}

impl Default for PadMode {
    fn default() -> Self {
        PadMode::Constant(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_output_law() {
        // floor((in + 2p - k) / s) + 1
        assert_eq!(window_output_len("t", 5, 3, 1, 0).unwrap(), 3);
        assert_eq!(window_output_len("t", 5, 3, 2, 1).unwrap(), 3);
        assert_eq!(window_output_len("t", 4, 2, 2, 0).unwrap(), 2);
        assert_eq!(window_output_len("t", 7, 3, 3, 0).unwrap(), 2);
        assert_eq!(window_output_len("t", 1, 3, 1, 1).unwrap(), 1);
    }

    #[test]
    fn test_window_rejects_bad_geometry() {
        assert!(window_output_len("t", 5, 3, 0, 0).is_err());
        assert!(window_output_len("t", 2, 3, 1, 0).is_err());
        assert!(window_output_len("t", 2, 0, 1, 0).is_err());
    }

    #[test]
    fn test_conv2d_dims() {
        let dims = Conv2dDims {
            batch: 2,
            in_h: 8,
            in_w: 6,
            in_channels: 3,
            kernel_h: 3,
            kernel_w: 3,
            out_channels: 4,
        };
        let params = Conv2dParams {
            stride: (2, 1),
            padding: (1, 0),
        };
        assert_eq!(dims.output_hw(&params).unwrap(), (4, 4));
        assert_eq!(dims.output_len(&params).unwrap(), 2 * 4 * 4 * 4);
        assert_eq!(dims.weight_len(), 3 * 3 * 3 * 4);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Conv2dParams::default().stride, (1, 1));
        assert_eq!(Conv1dParams::default().padding, 0);
        assert_eq!(Pool2dParams::default(), Pool2dParams::square(2));
        assert_eq!(PadMode::default(), PadMode::Constant(0.0));
    }
}
