//! Element-wise unary kernels: math library functions, predicates, casts
//! and clipping.

use super::{bool_to_f32, map_unary};
use crate::dtype::{round_to_i32, DType};
use crate::error::Result;

macro_rules! unary_kernel {
    ($(#[$meta:meta])* $name:ident, $f:expr) => {
        $(#[$meta])*
        pub fn $name(x: &[f32], y: &mut [f32]) -> Result<()> {
            map_unary(stringify!($name), x, y, $f)
        }
    };
}

unary_kernel!(sin, f32::sin);
unary_kernel!(cos, f32::cos);
unary_kernel!(tan, f32::tan);
unary_kernel!(asin, f32::asin);
unary_kernel!(acos, f32::acos);
unary_kernel!(atan, f32::atan);
unary_kernel!(
    /// Natural log; non-positive inputs give -inf or NaN.
    log,
    f32::ln
);
unary_kernel!(log2, f32::log2);
unary_kernel!(log10, f32::log10);
unary_kernel!(log1p, f32::ln_1p);
unary_kernel!(exp, f32::exp);
unary_kernel!(expm1, f32::exp_m1);
unary_kernel!(sqrt, f32::sqrt);
unary_kernel!(rsqrt, |v: f32| 1.0 / v.sqrt());
unary_kernel!(erf, libm::erff);
unary_kernel!(erfc, libm::erfcf);
unary_kernel!(abs, f32::abs);
unary_kernel!(neg, |v: f32| -v);
unary_kernel!(reciprocal, |v: f32| 1.0 / v);
unary_kernel!(
    /// -1, 0 or 1; NaN stays NaN and both zeros map to 0.
    sign,
    |v: f32| {
        if v > 0.0 {
            1.0
        } else if v < 0.0 {
            -1.0
        } else {
            v * 0.0
        }
    }
);
unary_kernel!(
    /// Round half to even.
    round,
    f32::round_ties_even
);
unary_kernel!(floor, f32::floor);
unary_kernel!(ceil, f32::ceil);
unary_kernel!(square, |v: f32| v * v);
unary_kernel!(cube, |v: f32| v * v * v);

unary_kernel!(isnan, |v: f32| bool_to_f32(v.is_nan()));
unary_kernel!(isinf, |v: f32| bool_to_f32(v.is_infinite()));
unary_kernel!(isfinite, |v: f32| bool_to_f32(v.is_finite()));

unary_kernel!(logical_not, |v: f32| bool_to_f32(v == 0.0));
unary_kernel!(
    /// `!x` on the operand rounded to i32.
    bitwise_not,
    |v: f32| !round_to_i32(v) as f32
);

/// Convert every element to `dtype` and back to f32.
pub fn cast(x: &[f32], y: &mut [f32], dtype: DType) -> Result<()> {
    map_unary("cast", x, y, |v| dtype.cast_scalar(v))
}

/// Scalar clip: below `min` becomes `min`, then above `max` becomes `max`,
/// so `max` wins when `min > max`. NaN passes through.
#[inline]
pub fn clip_scalar(v: f32, min: f32, max: f32) -> f32 {
    let v = if v < min { min } else { v };
    if v > max {
        max
    } else {
        v
    }
}

pub fn clip(x: &[f32], y: &mut [f32], min: f32, max: f32) -> Result<()> {
    map_unary("clip", x, y, |v| clip_scalar(v, min, max))
}
