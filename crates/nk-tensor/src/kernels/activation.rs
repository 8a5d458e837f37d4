//! Activation functions.
//!
//! Each activation has a scalar form (`*_scalar`) so other kernels can fuse
//! it, and a slice kernel that maps it over a buffer.

use super::{check_len, map_unary};
use super::unary::clip_scalar;
use crate::error::Result;

/// SELU negative-branch scale.
pub const SELU_ALPHA: f32 = 1.673_263_242_354_377_2;
/// SELU output scale.
pub const SELU_LAMBDA: f32 = 1.050_700_987_355_480_5;

const FRAC_1_SQRT_2: f32 = std::f32::consts::FRAC_1_SQRT_2;

#[inline(always)]
pub fn sigmoid_scalar(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// `log(1 + e^x)` written as `max(x, 0) + log1p(e^-|x|)` so large inputs
/// neither overflow nor lose the linear tail.
#[inline(always)]
pub fn softplus_scalar(x: f32) -> f32 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

/// Exact GELU, `0.5 * x * (1 + erf(x / sqrt(2)))`.
#[inline(always)]
pub fn gelu_scalar(x: f32) -> f32 {
    0.5 * x * (1.0 + libm::erff(x * FRAC_1_SQRT_2))
}

#[inline(always)]
pub fn hardsigmoid_scalar(x: f32) -> f32 {
    clip_scalar((x + 3.0) / 6.0, 0.0, 1.0)
}

pub fn relu(x: &[f32], y: &mut [f32]) -> Result<()> {
    map_unary("relu", x, y, |v| if v < 0.0 { 0.0 } else { v })
}

pub fn relu6(x: &[f32], y: &mut [f32]) -> Result<()> {
    map_unary("relu6", x, y, |v| clip_scalar(v, 0.0, 6.0))
}

pub fn leaky_relu(x: &[f32], y: &mut [f32], negative_slope: f32) -> Result<()> {
    map_unary("leaky_relu", x, y, |v| if v >= 0.0 { v } else { negative_slope * v })
}

/// Leaky ReLU with a slope per element; `alpha` must be as long as `x`.
pub fn prelu(x: &[f32], alpha: &[f32], y: &mut [f32]) -> Result<()> {
    check_len("prelu", "alpha", x.len(), alpha.len())?;
    check_len("prelu", "y", x.len(), y.len())?;
    for i in 0..x.len() {
        let v = x[i];
        y[i] = if v >= 0.0 { v } else { alpha[i] * v };
    }
    Ok(())
}

pub fn sigmoid(x: &[f32], y: &mut [f32]) -> Result<()> {
    map_unary("sigmoid", x, y, sigmoid_scalar)
}

pub fn hardsigmoid(x: &[f32], y: &mut [f32]) -> Result<()> {
    map_unary("hardsigmoid", x, y, hardsigmoid_scalar)
}

pub fn logsigmoid(x: &[f32], y: &mut [f32]) -> Result<()> {
    map_unary("logsigmoid", x, y, |v| -softplus_scalar(-v))
}

pub fn tanh(x: &[f32], y: &mut [f32]) -> Result<()> {
    map_unary("tanh", x, y, f32::tanh)
}

pub fn hardtanh(x: &[f32], y: &mut [f32], min_val: f32, max_val: f32) -> Result<()> {
    map_unary("hardtanh", x, y, |v| clip_scalar(v, min_val, max_val))
}

pub fn gelu(x: &[f32], y: &mut [f32]) -> Result<()> {
    map_unary("gelu", x, y, gelu_scalar)
}

pub fn elu(x: &[f32], y: &mut [f32], alpha: f32) -> Result<()> {
    map_unary("elu", x, y, |v| if v >= 0.0 { v } else { alpha * v.exp_m1() })
}

pub fn celu(x: &[f32], y: &mut [f32], alpha: f32) -> Result<()> {
    map_unary("celu", x, y, |v| {
        if v >= 0.0 {
            v
        } else {
            alpha * (v / alpha).exp_m1()
        }
    })
}

pub fn selu(x: &[f32], y: &mut [f32]) -> Result<()> {
    map_unary("selu", x, y, |v| {
        SELU_LAMBDA * if v >= 0.0 { v } else { SELU_ALPHA * v.exp_m1() }
    })
}

/// `x * sigmoid(x)`.
pub fn silu(x: &[f32], y: &mut [f32]) -> Result<()> {
    map_unary("silu", x, y, |v| v * sigmoid_scalar(v))
}

pub fn hardswish(x: &[f32], y: &mut [f32]) -> Result<()> {
    map_unary("hardswish", x, y, |v| v * hardsigmoid_scalar(v))
}

pub fn mish(x: &[f32], y: &mut [f32]) -> Result<()> {
    map_unary("mish", x, y, |v| v * softplus_scalar(v).tanh())
}

pub fn softplus(x: &[f32], y: &mut [f32]) -> Result<()> {
    map_unary("softplus", x, y, softplus_scalar)
}

pub fn hardshrink(x: &[f32], y: &mut [f32], lambd: f32) -> Result<()> {
    map_unary("hardshrink", x, y, |v| if v.abs() > lambd { v } else { 0.0 })
}

pub fn softshrink(x: &[f32], y: &mut [f32], lambd: f32) -> Result<()> {
    map_unary("softshrink", x, y, |v| {
        if v > lambd {
            v - lambd
        } else if v < -lambd {
            v + lambd
        } else {
            0.0
        }
    })
}
