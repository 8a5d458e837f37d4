//! Element-wise binary kernels: arithmetic, comparisons, logical and bitwise ops.
//!
//! Operands must already have the same length; broadcasting is done up front
//! with [`crate::kernels::expand`] or [`crate::kernels::broadcast_to`].

use super::{bool_to_f32, check_len, map_binary};
use crate::dtype::round_to_i32;
use crate::error::Result;

pub fn add(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("add", a, b, c, |u, v| u + v)
}

pub fn sub(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("sub", a, b, c, |u, v| u - v)
}

pub fn mul(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("mul", a, b, c, |u, v| u * v)
}

/// IEEE division; a zero divisor yields ±inf or NaN.
pub fn div(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("div", a, b, c, |u, v| u / v)
}

/// C `fmodf` remainder: `a - trunc(a / b) * b`, carrying the sign of `a`.
pub fn remainder(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("remainder", a, b, c, |u, v| u % v)
}

pub fn floor_divide(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("floor_divide", a, b, c, |u, v| (u / v).floor())
}

/// `a^b`; `0^0 == 1`.
pub fn pow(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("pow", a, b, c, f32::powf)
}

#[inline]
fn nan_min(u: f32, v: f32) -> f32 {
    if u.is_nan() || v.is_nan() {
        f32::NAN
    } else {
        u.min(v)
    }
}

#[inline]
fn nan_max(u: f32, v: f32) -> f32 {
    if u.is_nan() || v.is_nan() {
        f32::NAN
    } else {
        u.max(v)
    }
}

/// Element-wise minimum. NaN in either operand propagates.
pub fn minimum(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("minimum", a, b, c, nan_min)
}

/// Element-wise maximum. NaN in either operand propagates.
pub fn maximum(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("maximum", a, b, c, nan_max)
}

pub fn greater(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("greater", a, b, c, |u, v| bool_to_f32(u > v))
}

pub fn less(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("less", a, b, c, |u, v| bool_to_f32(u < v))
}

pub fn equal(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("equal", a, b, c, |u, v| bool_to_f32(u == v))
}

pub fn greater_equal(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("greater_equal", a, b, c, |u, v| bool_to_f32(u >= v))
}

pub fn less_equal(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("less_equal", a, b, c, |u, v| bool_to_f32(u <= v))
}

/// 1.0 where the operands differ; NaN differs from everything, itself included.
pub fn not_equal(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("not_equal", a, b, c, |u, v| bool_to_f32(u != v))
}

pub fn logical_and(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("logical_and", a, b, c, |u, v| bool_to_f32(u != 0.0 && v != 0.0))
}

pub fn logical_or(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("logical_or", a, b, c, |u, v| bool_to_f32(u != 0.0 || v != 0.0))
}

pub fn logical_xor(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("logical_xor", a, b, c, |u, v| bool_to_f32((u != 0.0) ^ (v != 0.0)))
}

#[inline]
fn int_binary(u: f32, v: f32, f: impl Fn(i32, i32) -> i32) -> f32 {
    f(round_to_i32(u), round_to_i32(v)) as f32
}

pub fn bitwise_and(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("bitwise_and", a, b, c, |u, v| int_binary(u, v, |p, q| p & q))
}

pub fn bitwise_or(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("bitwise_or", a, b, c, |u, v| int_binary(u, v, |p, q| p | q))
}

pub fn bitwise_xor(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("bitwise_xor", a, b, c, |u, v| int_binary(u, v, |p, q| p ^ q))
}

/// `a << b` on rounded i32 operands. Shift amounts outside `0..=31` give 0.
pub fn left_shift(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("left_shift", a, b, c, |u, v| {
        int_binary(u, v, |p, q| {
            if (0..32).contains(&q) {
                p.wrapping_shl(q as u32)
            } else {
                0
            }
        })
    })
}

/// Arithmetic `a >> b` on rounded i32 operands. Shift amounts outside `0..=31` give 0.
pub fn right_shift(a: &[f32], b: &[f32], c: &mut [f32]) -> Result<()> {
    map_binary("right_shift", a, b, c, |u, v| {
        int_binary(u, v, |p, q| {
            if (0..32).contains(&q) {
                p >> q
            } else {
                0
            }
        })
    })
}

/// Select `x[i]` where `condition[i] != 0`, otherwise `y[i]`.
pub fn where_cond(condition: &[f32], x: &[f32], y: &[f32], out: &mut [f32]) -> Result<()> {
    let n = condition.len();
    check_len("where", "x", n, x.len())?;
    check_len("where", "y", n, y.len())?;
    check_len("where", "output", n, out.len())?;
    for i in 0..n {
        out[i] = if condition[i] != 0.0 { x[i] } else { y[i] };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(
        f: fn(&[f32], &[f32], &mut [f32]) -> Result<()>,
        a: &[f32],
        b: &[f32],
    ) -> Vec<f32> {
        let mut c = vec![0.0; a.len()];
        f(a, b, &mut c).unwrap();
        c
    }

    #[test]
    fn test_arithmetic_identities() {
        let x = [1.5f32, -2.0, 0.0, 1e-7, 3e8];
        let zeros = [0.0f32; 5];
        let ones = [1.0f32; 5];
        assert_eq!(run(add, &x, &zeros), x);
        assert_eq!(run(mul, &x, &ones), x);
        assert_eq!(run(div, &x, &ones), x);
        assert_eq!(run(sub, &x, &x), zeros);
    }

    #[test]
    fn test_add_commutes() {
        let a = [0.1f32, -7.25, 3.0];
        let b = [2.2f32, 1.0, -3.0];
        assert_eq!(run(add, &a, &b), run(add, &b, &a));
        assert_eq!(run(maximum, &a, &b), run(maximum, &b, &a));
    }

    #[test]
    fn test_div_by_zero_is_ieee() {
        let c = run(div, &[1.0, -1.0, 0.0], &[0.0, 0.0, 0.0]);
        assert_eq!(c[0], f32::INFINITY);
        assert_eq!(c[1], f32::NEG_INFINITY);
        assert!(c[2].is_nan());
    }

    #[test]
    fn test_remainder_sign_follows_dividend() {
        let c = run(remainder, &[5.5, -5.5, 7.0], &[2.0, 2.0, -3.0]);
        assert_eq!(c, vec![1.5, -1.5, 1.0]);
    }

    #[test]
    fn test_floor_divide() {
        let c = run(floor_divide, &[7.0, -7.0, 6.0], &[2.0, 2.0, 3.0]);
        assert_eq!(c, vec![3.0, -4.0, 2.0]);
    }

    #[test]
    fn test_pow_zero_zero() {
        let c = run(pow, &[0.0, 2.0, 4.0], &[0.0, 10.0, 0.5]);
        assert_eq!(c, vec![1.0, 1024.0, 2.0]);
    }

    #[test]
    fn test_min_max_propagate_nan() {
        let c = run(minimum, &[1.0, f32::NAN], &[f32::NAN, 2.0]);
        assert!(c.iter().all(|v| v.is_nan()));
        let c = run(maximum, &[1.0, 5.0], &[3.0, 2.0]);
        assert_eq!(c, vec![3.0, 5.0]);
    }

    #[test]
    fn test_comparisons() {
        let a = [1.0f32, 2.0, 3.0];
        let b = [2.0f32, 2.0, 2.0];
        assert_eq!(run(greater, &a, &b), vec![0.0, 0.0, 1.0]);
        assert_eq!(run(less, &a, &b), vec![1.0, 0.0, 0.0]);
        assert_eq!(run(equal, &a, &b), vec![0.0, 1.0, 0.0]);
        assert_eq!(run(greater_equal, &a, &b), vec![0.0, 1.0, 1.0]);
        assert_eq!(run(less_equal, &a, &b), vec![1.0, 1.0, 0.0]);
        assert_eq!(run(not_equal, &a, &b), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_nan_compares_unequal() {
        let a = [f32::NAN, f32::NAN];
        let b = [f32::NAN, 1.0];
        assert_eq!(run(equal, &a, &b), vec![0.0, 0.0]);
        assert_eq!(run(not_equal, &a, &b), vec![1.0, 1.0]);
        assert_eq!(run(greater_equal, &a, &b), vec![0.0, 0.0]);
    }

    #[test]
    fn test_logical() {
        let a = [0.0f32, 0.0, 2.5, -1.0];
        let b = [0.0f32, 3.0, 0.0, 1.0];
        assert_eq!(run(logical_and, &a, &b), vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(run(logical_or, &a, &b), vec![0.0, 1.0, 1.0, 1.0]);
        assert_eq!(run(logical_xor, &a, &b), vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_bitwise_rounds_operands() {
        // 5.6 -> 6, 2.5 -> 2 (half to even)
        assert_eq!(run(bitwise_and, &[5.6, 12.0], &[2.5, 10.0]), vec![2.0, 8.0]);
        assert_eq!(run(bitwise_or, &[4.0, -1.0], &[1.0, 0.0]), vec![5.0, -1.0]);
        assert_eq!(run(bitwise_xor, &[6.0], &[3.0]), vec![5.0]);
    }

    #[test]
    fn test_shifts() {
        assert_eq!(run(left_shift, &[1.0, 3.0], &[4.0, 1.0]), vec![16.0, 6.0]);
        assert_eq!(run(right_shift, &[16.0, -8.0], &[2.0, 1.0]), vec![4.0, -4.0]);
        assert_eq!(run(left_shift, &[1.0, 1.0], &[32.0, -1.0]), vec![0.0, 0.0]);
        assert_eq!(run(right_shift, &[-8.0], &[40.0]), vec![0.0]);
        assert_eq!(run(left_shift, &[1.0], &[31.0]), vec![i32::MIN as f32]);
    }

    #[test]
    fn test_where() {
        let mut out = [0.0f32; 3];
        where_cond(&[1.0, 0.0, -2.0], &[1.0, 2.0, 3.0], &[9.0, 8.0, 7.0], &mut out).unwrap();
        assert_eq!(out, [1.0, 8.0, 3.0]);
    }

    #[test]
    fn test_where_length_mismatch() {
        let mut out = [0.0f32; 3];
        assert!(where_cond(&[1.0; 3], &[1.0; 2], &[1.0; 3], &mut out).is_err());
    }
}
