//! `extern "C"` operator entry points.
//!
//! Each symbol checks its pointers and sizes, builds slices and hands them
//! to the matching `nk_tensor::kernels` function inside [`guard`].

#![allow(clippy::too_many_arguments)]

use crate::error::{FfiError, Result};
use crate::memory::element_count;
use crate::{guard, guard_value, raw};
use nk_tensor::kernels;
use nk_tensor::params::{Conv1dDims, Conv1dParams, Conv2dDims, Conv2dParams, Pool2dDims, Pool2dParams};
use nk_tensor::DType;
use std::os::raw::c_int;

type KernelResult = nk_tensor::Result<()>;

unsafe fn unary<F>(op: &'static str, x: *const f32, y: *mut f32, size: c_int, kernel: F)
where
    F: FnOnce(&[f32], &mut [f32]) -> KernelResult,
{
    guard(op, || {
        let n = raw::count("size", size)?;
        let x = raw::input("x", x, n)?;
        let y = raw::output("y", y, n)?;
        kernel(x, y)?;
        Ok(())
    })
}

unsafe fn binary(
    op: &'static str,
    a: *const f32,
    b: *const f32,
    c: *mut f32,
    size: c_int,
    kernel: fn(&[f32], &[f32], &mut [f32]) -> KernelResult,
) {
    guard(op, || {
        let n = raw::count("size", size)?;
        let a = raw::input("a", a, n)?;
        let b = raw::input("b", b, n)?;
        let c = raw::output("c", c, n)?;
        kernel(a, b, c)?;
        Ok(())
    })
}

/// Resize between an `input_size` and an `output_size` buffer.
unsafe fn resize(
    op: &'static str,
    x: *const f32,
    y: *mut f32,
    input_size: c_int,
    output_size: c_int,
    kernel: impl FnOnce(&[f32], &mut [f32]) -> KernelResult,
) {
    guard(op, || {
        let x = raw::input("x", x, raw::count("input_size", input_size)?)?;
        let y = raw::output("y", y, raw::count("output_size", output_size)?)?;
        kernel(x, y)?;
        Ok(())
    })
}

unsafe fn reduce(op: &'static str, x: *const f32, size: c_int, kernel: fn(&[f32]) -> f32) -> f32 {
    guard_value(op, f32::NAN, || {
        let x = raw::input("x", x, raw::count("size", size)?)?;
        Ok(kernel(x))
    })
}

unsafe fn arg(op: &'static str, x: *const f32, size: c_int, kernel: fn(&[f32]) -> Option<usize>) -> c_int {
    guard_value(op, -1, || {
        let x = raw::input("x", x, raw::count("size", size)?)?;
        // Any index fits: it is below `size`, itself an int.
        Ok(kernel(x).map_or(-1, |i| i as c_int))
    })
}

// Basic arithmetic

#[no_mangle]
pub unsafe extern "C" fn op_add(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_add", a, b, c, size, kernels::add)
}

#[no_mangle]
pub unsafe extern "C" fn op_sub(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_sub", a, b, c, size, kernels::sub)
}

#[no_mangle]
pub unsafe extern "C" fn op_mul(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_mul", a, b, c, size, kernels::mul)
}

#[no_mangle]
pub unsafe extern "C" fn op_div(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_div", a, b, c, size, kernels::div)
}

// Activations

#[no_mangle]
pub unsafe extern "C" fn op_relu(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_relu", x, y, size, kernels::relu)
}

#[no_mangle]
pub unsafe extern "C" fn op_sigmoid(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_sigmoid", x, y, size, kernels::sigmoid)
}

#[no_mangle]
pub unsafe extern "C" fn op_tanh(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_tanh", x, y, size, kernels::tanh)
}

#[no_mangle]
pub unsafe extern "C" fn op_gelu(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_gelu", x, y, size, kernels::gelu)
}

#[no_mangle]
pub unsafe extern "C" fn op_leaky_relu(x: *const f32, y: *mut f32, size: c_int, negative_slope: f32) {
    unary("op_leaky_relu", x, y, size, |x, y| kernels::leaky_relu(x, y, negative_slope))
}

#[no_mangle]
pub unsafe extern "C" fn op_prelu(x: *const f32, alpha: *const f32, y: *mut f32, size: c_int) {
    guard("op_prelu", || {
        let n = raw::count("size", size)?;
        let x = raw::input("x", x, n)?;
        let alpha = raw::input("alpha", alpha, n)?;
        let y = raw::output("y", y, n)?;
        kernels::prelu(x, alpha, y)?;
        Ok(())
    })
}

/// Softmax over a flat buffer; `axis` must be 0 or -1.
#[no_mangle]
pub unsafe extern "C" fn op_softmax(x: *const f32, y: *mut f32, size: c_int, axis: c_int) {
    unary("op_softmax", x, y, size, |x, y| kernels::softmax_flat(x, y, axis as isize))
}

#[no_mangle]
pub unsafe extern "C" fn op_elu(x: *const f32, y: *mut f32, size: c_int, alpha: f32) {
    unary("op_elu", x, y, size, |x, y| kernels::elu(x, y, alpha))
}

#[no_mangle]
pub unsafe extern "C" fn op_celu(x: *const f32, y: *mut f32, size: c_int, alpha: f32) {
    unary("op_celu", x, y, size, |x, y| kernels::celu(x, y, alpha))
}

#[no_mangle]
pub unsafe extern "C" fn op_selu(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_selu", x, y, size, kernels::selu)
}

/// GLU over a flat buffer of `size` elements; `y` holds `size / 2`.
#[no_mangle]
pub unsafe extern "C" fn op_glu(x: *const f32, y: *mut f32, size: c_int, dim: c_int) {
    guard("op_glu", || {
        let n = raw::count("size", size)?;
        let x = raw::input("x", x, n)?;
        let y = raw::output("y", y, n / 2)?;
        kernels::glu(x, y, &[n], dim as isize)?;
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn op_hardsigmoid(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_hardsigmoid", x, y, size, kernels::hardsigmoid)
}

#[no_mangle]
pub unsafe extern "C" fn op_logsigmoid(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_logsigmoid", x, y, size, kernels::logsigmoid)
}

#[no_mangle]
pub unsafe extern "C" fn op_softmin(x: *const f32, y: *mut f32, size: c_int, axis: c_int) {
    unary("op_softmin", x, y, size, |x, y| kernels::softmin_flat(x, y, axis as isize))
}

#[no_mangle]
pub unsafe extern "C" fn op_logsoftmax(x: *const f32, y: *mut f32, size: c_int, axis: c_int) {
    unary("op_logsoftmax", x, y, size, |x, y| kernels::log_softmax_flat(x, y, axis as isize))
}

#[no_mangle]
pub unsafe extern "C" fn op_silu(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_silu", x, y, size, kernels::silu)
}

#[no_mangle]
pub unsafe extern "C" fn op_hardswish(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_hardswish", x, y, size, kernels::hardswish)
}

#[no_mangle]
pub unsafe extern "C" fn op_mish(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_mish", x, y, size, kernels::mish)
}

#[no_mangle]
pub unsafe extern "C" fn op_hardtanh(x: *const f32, y: *mut f32, size: c_int, min_val: f32, max_val: f32) {
    unary("op_hardtanh", x, y, size, |x, y| kernels::hardtanh(x, y, min_val, max_val))
}

#[no_mangle]
pub unsafe extern "C" fn op_hardshrink(x: *const f32, y: *mut f32, size: c_int, lambd: f32) {
    unary("op_hardshrink", x, y, size, |x, y| kernels::hardshrink(x, y, lambd))
}

#[no_mangle]
pub unsafe extern "C" fn op_softshrink(x: *const f32, y: *mut f32, size: c_int, lambd: f32) {
    unary("op_softshrink", x, y, size, |x, y| kernels::softshrink(x, y, lambd))
}

#[no_mangle]
pub unsafe extern "C" fn op_relu6(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_relu6", x, y, size, kernels::relu6)
}

#[no_mangle]
pub unsafe extern "C" fn op_softplus(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_softplus", x, y, size, kernels::softplus)
}

// Reductions; a rejected call returns NaN.

#[no_mangle]
pub unsafe extern "C" fn op_sum(x: *const f32, size: c_int) -> f32 {
    reduce("op_sum", x, size, kernels::sum)
}

#[no_mangle]
pub unsafe extern "C" fn op_mean(x: *const f32, size: c_int) -> f32 {
    reduce("op_mean", x, size, kernels::mean)
}

#[no_mangle]
pub unsafe extern "C" fn op_reducemin(x: *const f32, size: c_int) -> f32 {
    reduce("op_reducemin", x, size, kernels::reduce_min)
}

#[no_mangle]
pub unsafe extern "C" fn op_reducemax(x: *const f32, size: c_int) -> f32 {
    reduce("op_reducemax", x, size, kernels::reduce_max)
}

#[no_mangle]
pub unsafe extern "C" fn op_reduceprod(x: *const f32, size: c_int) -> f32 {
    reduce("op_reduceprod", x, size, kernels::reduce_prod)
}

#[no_mangle]
pub unsafe extern "C" fn op_reducel1(x: *const f32, size: c_int) -> f32 {
    reduce("op_reducel1", x, size, kernels::reduce_l1)
}

#[no_mangle]
pub unsafe extern "C" fn op_reducel2(x: *const f32, size: c_int) -> f32 {
    reduce("op_reducel2", x, size, kernels::reduce_l2)
}

// Comparisons

/// Element-wise minimum.
#[no_mangle]
pub unsafe extern "C" fn op_min(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_min", a, b, c, size, kernels::minimum)
}

/// Element-wise maximum.
#[no_mangle]
pub unsafe extern "C" fn op_max(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_max", a, b, c, size, kernels::maximum)
}

#[no_mangle]
pub unsafe extern "C" fn op_greater(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_greater", a, b, c, size, kernels::greater)
}

#[no_mangle]
pub unsafe extern "C" fn op_less(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_less", a, b, c, size, kernels::less)
}

#[no_mangle]
pub unsafe extern "C" fn op_equal(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_equal", a, b, c, size, kernels::equal)
}

#[no_mangle]
pub unsafe extern "C" fn op_greater_equal(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_greater_equal", a, b, c, size, kernels::greater_equal)
}

#[no_mangle]
pub unsafe extern "C" fn op_less_equal(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_less_equal", a, b, c, size, kernels::less_equal)
}

#[no_mangle]
pub unsafe extern "C" fn op_not_equal(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_not_equal", a, b, c, size, kernels::not_equal)
}

// Math

#[no_mangle]
pub unsafe extern "C" fn op_round(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_round", x, y, size, kernels::round)
}

#[no_mangle]
pub unsafe extern "C" fn op_floor(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_floor", x, y, size, kernels::floor)
}

#[no_mangle]
pub unsafe extern "C" fn op_ceil(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_ceil", x, y, size, kernels::ceil)
}

#[no_mangle]
pub unsafe extern "C" fn op_abs(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_abs", x, y, size, kernels::abs)
}

#[no_mangle]
pub unsafe extern "C" fn op_neg(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_neg", x, y, size, kernels::neg)
}

#[no_mangle]
pub unsafe extern "C" fn op_reciprocal(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_reciprocal", x, y, size, kernels::reciprocal)
}

#[no_mangle]
pub unsafe extern "C" fn op_pow(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_pow", a, b, c, size, kernels::pow)
}

#[no_mangle]
pub unsafe extern "C" fn op_atan(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_atan", x, y, size, kernels::atan)
}

#[no_mangle]
pub unsafe extern "C" fn op_asin(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_asin", x, y, size, kernels::asin)
}

#[no_mangle]
pub unsafe extern "C" fn op_acos(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_acos", x, y, size, kernels::acos)
}

#[no_mangle]
pub unsafe extern "C" fn op_tan(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_tan", x, y, size, kernels::tan)
}

#[no_mangle]
pub unsafe extern "C" fn op_sin(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_sin", x, y, size, kernels::sin)
}

#[no_mangle]
pub unsafe extern "C" fn op_cos(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_cos", x, y, size, kernels::cos)
}

#[no_mangle]
pub unsafe extern "C" fn op_log(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_log", x, y, size, kernels::log)
}

#[no_mangle]
pub unsafe extern "C" fn op_log2(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_log2", x, y, size, kernels::log2)
}

#[no_mangle]
pub unsafe extern "C" fn op_log10(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_log10", x, y, size, kernels::log10)
}

#[no_mangle]
pub unsafe extern "C" fn op_log1p(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_log1p", x, y, size, kernels::log1p)
}

#[no_mangle]
pub unsafe extern "C" fn op_exp(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_exp", x, y, size, kernels::exp)
}

#[no_mangle]
pub unsafe extern "C" fn op_expm1(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_expm1", x, y, size, kernels::expm1)
}

#[no_mangle]
pub unsafe extern "C" fn op_sqrt(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_sqrt", x, y, size, kernels::sqrt)
}

#[no_mangle]
pub unsafe extern "C" fn op_rsqrt(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_rsqrt", x, y, size, kernels::rsqrt)
}

#[no_mangle]
pub unsafe extern "C" fn op_square(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_square", x, y, size, kernels::square)
}

#[no_mangle]
pub unsafe extern "C" fn op_cube(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_cube", x, y, size, kernels::cube)
}

#[no_mangle]
pub unsafe extern "C" fn op_erf(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_erf", x, y, size, kernels::erf)
}

#[no_mangle]
pub unsafe extern "C" fn op_erfc(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_erfc", x, y, size, kernels::erfc)
}

#[no_mangle]
pub unsafe extern "C" fn op_sign(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_sign", x, y, size, kernels::sign)
}

#[no_mangle]
pub unsafe extern "C" fn op_remainder(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_remainder", a, b, c, size, kernels::remainder)
}

#[no_mangle]
pub unsafe extern "C" fn op_floor_divide(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_floor_divide", a, b, c, size, kernels::floor_divide)
}

// Matrix ops

#[no_mangle]
pub unsafe extern "C" fn op_matmul(a: *const f32, b: *const f32, c: *mut f32, m: c_int, k: c_int, n: c_int) {
    guard("op_matmul", || {
        let (m, k, n) = (raw::count("M", m)?, raw::count("K", k)?, raw::count("N", n)?);
        let a = raw::input("a", a, element_count(&[m, k])?)?;
        let b = raw::input("b", b, element_count(&[k, n])?)?;
        let c = raw::output("c", c, element_count(&[m, n])?)?;
        kernels::matmul(a, b, c, m, k, n)?;
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn op_transpose_2d(x: *const f32, y: *mut f32, h: c_int, w: c_int) {
    guard("op_transpose_2d", || {
        let (h, w) = (raw::count("H", h)?, raw::count("W", w)?);
        let n = element_count(&[h, w])?;
        kernels::transpose_2d(raw::input("x", x, n)?, raw::output("y", y, n)?, h, w)?;
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn op_transpose(
    x: *const f32,
    y: *mut f32,
    input_shape: *const c_int,
    perm: *const c_int,
    ndims: c_int,
) {
    guard("op_transpose", || {
        let shape = raw::dims("input_shape", input_shape, ndims)?;
        let perm = raw::dims("perm", perm, ndims)?;
        let n = element_count(&shape)?;
        kernels::transpose(raw::input("x", x, n)?, raw::output("y", y, n)?, &shape, &perm)?;
        Ok(())
    })
}

unsafe fn triangle(
    op: &'static str,
    x: *const f32,
    y: *mut f32,
    rows: c_int,
    cols: c_int,
    kernel: fn(&[f32], &mut [f32], usize, usize) -> KernelResult,
) {
    guard(op, || {
        let (rows, cols) = (raw::count("rows", rows)?, raw::count("cols", cols)?);
        let n = element_count(&[rows, cols])?;
        kernel(raw::input("x", x, n)?, raw::output("y", y, n)?, rows, cols)?;
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn op_triu(x: *const f32, y: *mut f32, rows: c_int, cols: c_int) {
    triangle("op_triu", x, y, rows, cols, kernels::triu)
}

#[no_mangle]
pub unsafe extern "C" fn op_tril(x: *const f32, y: *mut f32, rows: c_int, cols: c_int) {
    triangle("op_tril", x, y, rows, cols, kernels::tril)
}

// Convolution

/// NHWC convolution; `bias` may be null.
#[no_mangle]
pub unsafe extern "C" fn op_conv2d(
    input: *const f32,
    weight: *const f32,
    bias: *const f32,
    output: *mut f32,
    n: c_int,
    h_in: c_int,
    w_in: c_int,
    c_in: c_int,
    h_k: c_int,
    w_k: c_int,
    c_out: c_int,
    stride_h: c_int,
    stride_w: c_int,
    pad_h: c_int,
    pad_w: c_int,
) {
    guard("op_conv2d", || {
        let dims = Conv2dDims {
            batch: raw::count("N", n)?,
            in_h: raw::count("H_in", h_in)?,
            in_w: raw::count("W_in", w_in)?,
            in_channels: raw::count("C_in", c_in)?,
            kernel_h: raw::count("H_k", h_k)?,
            kernel_w: raw::count("W_k", w_k)?,
            out_channels: raw::count("C_out", c_out)?,
        };
        let params = conv2d_params(stride_h, stride_w, pad_h, pad_w)?;
        run_conv2d(input, weight, bias, output, &dims, &params, kernels::conv2d)
    })
}

/// NCHW convolution with an `[out, in, kh, kw]` weight; `bias` may be null.
#[no_mangle]
pub unsafe extern "C" fn op_nchw_conv2d(
    input: *const f32,
    weight: *const f32,
    bias: *const f32,
    output: *mut f32,
    batch: c_int,
    in_channels: c_int,
    out_channels: c_int,
    height: c_int,
    width: c_int,
    kernel_h: c_int,
    kernel_w: c_int,
    stride_h: c_int,
    stride_w: c_int,
    pad_h: c_int,
    pad_w: c_int,
) {
    guard("op_nchw_conv2d", || {
        let dims = Conv2dDims {
            batch: raw::count("batch", batch)?,
            in_h: raw::count("height", height)?,
            in_w: raw::count("width", width)?,
            in_channels: raw::count("in_channels", in_channels)?,
            kernel_h: raw::count("kernel_h", kernel_h)?,
            kernel_w: raw::count("kernel_w", kernel_w)?,
            out_channels: raw::count("out_channels", out_channels)?,
        };
        let params = conv2d_params(stride_h, stride_w, pad_h, pad_w)?;
        run_conv2d(input, weight, bias, output, &dims, &params, kernels::nchw_conv2d)
    })
}

fn conv2d_params(stride_h: c_int, stride_w: c_int, pad_h: c_int, pad_w: c_int) -> Result<Conv2dParams> {
    Ok(Conv2dParams {
        stride: (raw::count("stride_h", stride_h)?, raw::count("stride_w", stride_w)?),
        padding: (raw::count("pad_h", pad_h)?, raw::count("pad_w", pad_w)?),
    })
}

type Conv2dKernel = fn(&[f32], &[f32], Option<&[f32]>, &mut [f32], &Conv2dDims, &Conv2dParams) -> KernelResult;

unsafe fn run_conv2d(
    input: *const f32,
    weight: *const f32,
    bias: *const f32,
    output: *mut f32,
    dims: &Conv2dDims,
    params: &Conv2dParams,
    kernel: Conv2dKernel,
) -> Result<()> {
    let input_len = element_count(&[dims.batch, dims.in_h, dims.in_w, dims.in_channels])?;
    let weight_len = element_count(&[dims.kernel_h, dims.kernel_w, dims.in_channels, dims.out_channels])?;
    let (out_h, out_w) = dims.output_hw(params)?;
    let output_len = element_count(&[dims.batch, out_h, out_w, dims.out_channels])?;
    kernel(
        raw::input("input", input, input_len)?,
        raw::input("weight", weight, weight_len)?,
        raw::optional(bias, dims.out_channels),
        raw::output("output", output, output_len)?,
        dims,
        params,
    )?;
    Ok(())
}

/// 1D convolution over `[batch, in_channels, input_size]`; `bias` may be null.
#[no_mangle]
pub unsafe extern "C" fn op_conv1d(
    input: *const f32,
    weight: *const f32,
    bias: *const f32,
    output: *mut f32,
    batch: c_int,
    in_channels: c_int,
    out_channels: c_int,
    input_size: c_int,
    kernel_size: c_int,
    stride: c_int,
    padding: c_int,
) {
    guard("op_conv1d", || {
        let dims = Conv1dDims {
            batch: raw::count("batch", batch)?,
            in_channels: raw::count("in_channels", in_channels)?,
            out_channels: raw::count("out_channels", out_channels)?,
            length: raw::count("input_size", input_size)?,
            kernel: raw::count("kernel_size", kernel_size)?,
        };
        let params = Conv1dParams {
            stride: raw::count("stride", stride)?,
            padding: raw::count("padding", padding)?,
        };
        let out_len = dims.output_length(&params)?;
        let input_len = element_count(&[dims.batch, dims.in_channels, dims.length])?;
        let weight_len = element_count(&[dims.out_channels, dims.in_channels, dims.kernel])?;
        let output_len = element_count(&[dims.batch, dims.out_channels, out_len])?;
        kernels::conv1d(
            raw::input("input", input, input_len)?,
            raw::input("weight", weight, weight_len)?,
            raw::optional(bias, dims.out_channels),
            raw::output("output", output, output_len)?,
            &dims,
            &params,
        )?;
        Ok(())
    })
}

// Pooling

type PoolKernel = fn(&[f32], &mut [f32], &Pool2dDims, &Pool2dParams) -> KernelResult;

unsafe fn pool2d(
    op: &'static str,
    x: *const f32,
    y: *mut f32,
    shape: [c_int; 4],
    window: [c_int; 6],
    kernel: PoolKernel,
) {
    guard(op, || {
        let [batch, channels, height, width] = shape;
        let [kernel_h, kernel_w, stride_h, stride_w, pad_h, pad_w] = window;
        let dims = Pool2dDims {
            batch: raw::count("batch", batch)?,
            height: raw::count("height", height)?,
            width: raw::count("width", width)?,
            channels: raw::count("channels", channels)?,
        };
        let params = Pool2dParams {
            kernel: (raw::count("kernel_h", kernel_h)?, raw::count("kernel_w", kernel_w)?),
            stride: (raw::count("stride_h", stride_h)?, raw::count("stride_w", stride_w)?),
            padding: (raw::count("pad_h", pad_h)?, raw::count("pad_w", pad_w)?),
        };
        let (out_h, out_w) = dims.output_hw(&params)?;
        let x_len = element_count(&[dims.batch, dims.height, dims.width, dims.channels])?;
        let y_len = element_count(&[dims.batch, out_h, out_w, dims.channels])?;
        kernel(raw::input("x", x, x_len)?, raw::output("y", y, y_len)?, &dims, &params)?;
        Ok(())
    })
}

/// NHWC max pooling.
#[no_mangle]
pub unsafe extern "C" fn op_maxpool2d(
    x: *const f32,
    y: *mut f32,
    batch: c_int,
    channels: c_int,
    height: c_int,
    width: c_int,
    kernel_h: c_int,
    kernel_w: c_int,
    stride_h: c_int,
    stride_w: c_int,
    pad_h: c_int,
    pad_w: c_int,
) {
    pool2d(
        "op_maxpool2d",
        x,
        y,
        [batch, channels, height, width],
        [kernel_h, kernel_w, stride_h, stride_w, pad_h, pad_w],
        kernels::maxpool2d,
    )
}

/// NHWC average pooling, padding counted in the window area.
#[no_mangle]
pub unsafe extern "C" fn op_avgpool2d(
    x: *const f32,
    y: *mut f32,
    batch: c_int,
    channels: c_int,
    height: c_int,
    width: c_int,
    kernel_h: c_int,
    kernel_w: c_int,
    stride_h: c_int,
    stride_w: c_int,
    pad_h: c_int,
    pad_w: c_int,
) {
    pool2d(
        "op_avgpool2d",
        x,
        y,
        [batch, channels, height, width],
        [kernel_h, kernel_w, stride_h, stride_w, pad_h, pad_w],
        kernels::avgpool2d,
    )
}

// Shape manipulation

#[no_mangle]
pub unsafe extern "C" fn op_constant(y: *mut f32, size: c_int, value: f32) {
    guard("op_constant", || {
        kernels::constant(raw::output("y", y, raw::count("size", size)?)?, value);
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn op_reshape(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_reshape", x, y, size, kernels::reshape)
}

#[no_mangle]
pub unsafe extern "C" fn op_expand(x: *const f32, y: *mut f32, input_size: c_int, output_size: c_int) {
    resize("op_expand", x, y, input_size, output_size, kernels::expand)
}

#[no_mangle]
pub unsafe extern "C" fn op_expand_last4(x: *const f32, y: *mut f32, input_size: c_int, output_size: c_int) {
    resize("op_expand_last4", x, y, input_size, output_size, kernels::expand_last4)
}

#[no_mangle]
pub unsafe extern "C" fn op_slice(
    x: *const f32,
    y: *mut f32,
    input_shape: *const c_int,
    output_shape: *const c_int,
    start_indices: *const c_int,
    ndims: c_int,
) {
    guard("op_slice", || {
        let in_shape = raw::dims("input_shape", input_shape, ndims)?;
        let out_shape = raw::dims("output_shape", output_shape, ndims)?;
        let start = raw::dims("start_indices", start_indices, ndims)?;
        let x = raw::input("x", x, element_count(&in_shape)?)?;
        let y = raw::output("y", y, element_count(&out_shape)?)?;
        kernels::slice(x, &in_shape, y, &out_shape, &start)?;
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn op_squeeze(x: *const f32, y: *mut f32, input_size: c_int) {
    unary("op_squeeze", x, y, input_size, kernels::squeeze)
}

#[no_mangle]
pub unsafe extern "C" fn op_unsqueeze(x: *const f32, y: *mut f32, input_size: c_int) {
    unary("op_unsqueeze", x, y, input_size, kernels::unsqueeze)
}

// Logical

#[no_mangle]
pub unsafe extern "C" fn op_and(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_and", a, b, c, size, kernels::logical_and)
}

#[no_mangle]
pub unsafe extern "C" fn op_or(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_or", a, b, c, size, kernels::logical_or)
}

#[no_mangle]
pub unsafe extern "C" fn op_xor(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_xor", a, b, c, size, kernels::logical_xor)
}

#[no_mangle]
pub unsafe extern "C" fn op_not(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_not", x, y, size, kernels::logical_not)
}

#[no_mangle]
pub unsafe extern "C" fn op_where(condition: *const f32, x: *const f32, y: *const f32, output: *mut f32, size: c_int) {
    guard("op_where", || {
        let n = raw::count("size", size)?;
        kernels::where_cond(
            raw::input("condition", condition, n)?,
            raw::input("x", x, n)?,
            raw::input("y", y, n)?,
            raw::output("output", output, n)?,
        )?;
        Ok(())
    })
}

// Bitwise

#[no_mangle]
pub unsafe extern "C" fn op_left_shift(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_left_shift", a, b, c, size, kernels::left_shift)
}

#[no_mangle]
pub unsafe extern "C" fn op_right_shift(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_right_shift", a, b, c, size, kernels::right_shift)
}

#[no_mangle]
pub unsafe extern "C" fn op_bitwise_and(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_bitwise_and", a, b, c, size, kernels::bitwise_and)
}

#[no_mangle]
pub unsafe extern "C" fn op_bitwise_or(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_bitwise_or", a, b, c, size, kernels::bitwise_or)
}

#[no_mangle]
pub unsafe extern "C" fn op_bitwise_xor(a: *const f32, b: *const f32, c: *mut f32, size: c_int) {
    binary("op_bitwise_xor", a, b, c, size, kernels::bitwise_xor)
}

#[no_mangle]
pub unsafe extern "C" fn op_bitwise_not(a: *const f32, c: *mut f32, size: c_int) {
    unary("op_bitwise_not", a, c, size, kernels::bitwise_not)
}

// Special

#[no_mangle]
pub unsafe extern "C" fn op_clip(x: *const f32, y: *mut f32, size: c_int, min_val: f32, max_val: f32) {
    unary("op_clip", x, y, size, |x, y| kernels::clip(x, y, min_val, max_val))
}

#[no_mangle]
pub unsafe extern "C" fn op_cast_bool(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_cast_bool", x, y, size, |x, y| kernels::cast(x, y, DType::Bool))
}

#[no_mangle]
pub unsafe extern "C" fn op_cast_i32(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_cast_i32", x, y, size, |x, y| kernels::cast(x, y, DType::I32))
}

#[no_mangle]
pub unsafe extern "C" fn op_cast_f32(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_cast_f32", x, y, size, |x, y| kernels::cast(x, y, DType::F32))
}

#[no_mangle]
pub unsafe extern "C" fn op_cast_f64(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_cast_f64", x, y, size, |x, y| kernels::cast(x, y, DType::F64))
}

#[no_mangle]
pub unsafe extern "C" fn op_cast_i64(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_cast_i64", x, y, size, |x, y| kernels::cast(x, y, DType::I64))
}

/// Reflect pad with `pads[0]` before and `pads[1]` after.
#[no_mangle]
pub unsafe extern "C" fn op_reflect_pad(
    x: *const f32,
    y: *mut f32,
    input_size: c_int,
    output_size: c_int,
    pads: *const c_int,
) {
    guard("op_reflect_pad", || {
        let pads = raw::dims("pads", pads, 2)?;
        let x = raw::input("x", x, raw::count("input_size", input_size)?)?;
        let y = raw::output("y", y, raw::count("output_size", output_size)?)?;
        kernels::reflect_pad(x, y, &pads)?;
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn op_const_pad(x: *const f32, y: *mut f32, input_size: c_int, output_size: c_int, pad_value: f32) {
    resize("op_const_pad", x, y, input_size, output_size, |x, y| {
        kernels::const_pad(x, y, pad_value)
    })
}

#[no_mangle]
pub unsafe extern "C" fn op_replicate_pad(x: *const f32, y: *mut f32, input_size: c_int, output_size: c_int) {
    resize("op_replicate_pad", x, y, input_size, output_size, kernels::replicate_pad)
}

// Argument ops; -1 when empty, all-NaN or rejected.

#[no_mangle]
pub unsafe extern "C" fn op_argmin(x: *const f32, size: c_int) -> c_int {
    arg("op_argmin", x, size, kernels::argmin)
}

#[no_mangle]
pub unsafe extern "C" fn op_argmax(x: *const f32, size: c_int) -> c_int {
    arg("op_argmax", x, size, kernels::argmax)
}

// Concatenation

/// Concatenate `num_inputs` buffers of `input_sizes[i]` elements tail to head.
#[no_mangle]
pub unsafe extern "C" fn op_concat1(
    inputs: *const *const f32,
    output: *mut f32,
    input_sizes: *const c_int,
    num_inputs: c_int,
) {
    guard("op_concat1", || {
        let sizes = raw::dims("input_sizes", input_sizes, num_inputs)?;
        if !sizes.is_empty() && inputs.is_null() {
            return Err(FfiError::NullPointer("inputs"));
        }
        let mut parts = Vec::with_capacity(sizes.len());
        for (i, &len) in sizes.iter().enumerate() {
            parts.push(raw::input("inputs[i]", *inputs.add(i), len)?);
        }
        let total = sizes
            .iter()
            .try_fold(0usize, |acc, &len| acc.checked_add(len))
            .ok_or(FfiError::Overflow("input_sizes"))?;
        kernels::concat(&parts, raw::output("output", output, total)?)?;
        Ok(())
    })
}

// Normalisation

/// Element-wise batchnorm; every statistic buffer holds `size` floats.
#[no_mangle]
pub unsafe extern "C" fn op_batchnorm2d(
    x: *const f32,
    gamma: *const f32,
    beta: *const f32,
    mean: *const f32,
    var: *const f32,
    y: *mut f32,
    size: c_int,
) {
    guard("op_batchnorm2d", || {
        let n = raw::count("size", size)?;
        kernels::batchnorm2d(
            raw::input("x", x, n)?,
            raw::input("gamma", gamma, n)?,
            raw::input("beta", beta, n)?,
            raw::input("mean", mean, n)?,
            raw::input("var", var, n)?,
            raw::output("y", y, n)?,
        )?;
        Ok(())
    })
}

// Interpolation

#[no_mangle]
pub unsafe extern "C" fn op_nearest_interp(x: *const f32, y: *mut f32, input_size: c_int, output_size: c_int) {
    resize("op_nearest_interp", x, y, input_size, output_size, kernels::nearest_interp)
}

#[no_mangle]
pub unsafe extern "C" fn op_linear_interp(x: *const f32, y: *mut f32, input_size: c_int, output_size: c_int) {
    resize("op_linear_interp", x, y, input_size, output_size, kernels::linear_interp)
}

#[no_mangle]
pub unsafe extern "C" fn op_bilinear_interp(x: *const f32, y: *mut f32, input_size: c_int, output_size: c_int) {
    resize("op_bilinear_interp", x, y, input_size, output_size, kernels::bilinear_interp)
}

#[no_mangle]
pub unsafe extern "C" fn op_bicubic_interp(x: *const f32, y: *mut f32, input_size: c_int, output_size: c_int) {
    resize("op_bicubic_interp", x, y, input_size, output_size, kernels::bicubic_interp)
}

#[no_mangle]
pub unsafe extern "C" fn op_trilinear_interp(x: *const f32, y: *mut f32, input_size: c_int, output_size: c_int) {
    resize("op_trilinear_interp", x, y, input_size, output_size, kernels::trilinear_interp)
}

// Special values

#[no_mangle]
pub unsafe extern "C" fn op_isnan(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_isnan", x, y, size, kernels::isnan)
}

#[no_mangle]
pub unsafe extern "C" fn op_isinf(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_isinf", x, y, size, kernels::isinf)
}

#[no_mangle]
pub unsafe extern "C" fn op_isfinite(x: *const f32, y: *mut f32, size: c_int) {
    unary("op_isfinite", x, y, size, kernels::isfinite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::take_last_error;
    use std::ptr;

    #[test]
    fn test_binary_and_unary() {
        let a = [1.0f32, 2.0, 3.0];
        let b = [4.0f32, 5.0, 6.0];
        let mut c = [0.0f32; 3];
        unsafe {
            op_add(a.as_ptr(), b.as_ptr(), c.as_mut_ptr(), 3);
            assert_eq!(c, [5.0, 7.0, 9.0]);
            op_neg(a.as_ptr(), c.as_mut_ptr(), 3);
            assert_eq!(c, [-1.0, -2.0, -3.0]);
        }
    }

    #[test]
    fn test_null_input_is_rejected_without_writing() {
        let mut c = [9.0f32; 2];
        unsafe { op_mul(ptr::null(), [1.0f32, 2.0].as_ptr(), c.as_mut_ptr(), 2) };
        assert_eq!(c, [9.0, 9.0]);
        let msg = take_last_error().unwrap();
        assert!(msg.to_str().unwrap().starts_with("op_mul:"));
    }

    #[test]
    fn test_negative_size_is_rejected() {
        let mut y = [9.0f32; 1];
        unsafe { op_relu([1.0f32].as_ptr(), y.as_mut_ptr(), -1) };
        assert_eq!(y, [9.0]);
        assert!(take_last_error().is_some());
    }

    #[test]
    fn test_reductions_and_args() {
        let x = [3.0f32, -1.0, 4.0, -1.0];
        unsafe {
            assert_eq!(op_sum(x.as_ptr(), 4), 5.0);
            assert_eq!(op_reducemin(x.as_ptr(), 4), -1.0);
            assert_eq!(op_argmin(x.as_ptr(), 4), 1);
            assert_eq!(op_argmax(x.as_ptr(), 4), 2);
            assert_eq!(op_argmax(ptr::null(), 0), -1);
            assert!(op_mean(ptr::null(), 3).is_nan());
            assert_eq!(op_argmin(ptr::null(), 3), -1);
        }
    }

    #[test]
    fn test_softmax_axis_checked() {
        let x = [1000.0f32, 1001.0, 1002.0];
        let mut y = [0.0f32; 3];
        unsafe {
            op_softmax(x.as_ptr(), y.as_mut_ptr(), 3, 0);
            assert!((y[2] - 0.66524).abs() < 1e-5);
            let before = y;
            op_softmax(x.as_ptr(), y.as_mut_ptr(), 3, 1);
            assert_eq!(y, before);
        }
        assert!(take_last_error().is_some());
    }

    #[test]
    fn test_matmul_and_transpose() {
        let a = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [1.0f32, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut c = [0.0f32; 4];
        let mut t = [0.0f32; 6];
        unsafe {
            op_matmul(a.as_ptr(), b.as_ptr(), c.as_mut_ptr(), 2, 3, 2);
            op_transpose(a.as_ptr(), t.as_mut_ptr(), [2, 3].as_ptr(), [1, 0].as_ptr(), 2);
        }
        assert_eq!(c, [4.0, 5.0, 10.0, 11.0]);
        assert_eq!(t, [1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_conv2d_and_pool() {
        let input: Vec<f32> = (1..=9).map(|i| i as f32).collect();
        let weight = [1.0f32, 0.0, 0.0, 1.0];
        let mut out = [0.0f32; 4];
        unsafe {
            op_conv2d(
                input.as_ptr(),
                weight.as_ptr(),
                ptr::null(),
                out.as_mut_ptr(),
                1, 3, 3, 1, 2, 2, 1, 1, 1, 0, 0,
            );
        }
        assert_eq!(out, [6.0, 8.0, 12.0, 14.0]);

        let x: Vec<f32> = (1..=16).map(|i| i as f32).collect();
        let mut y = [0.0f32; 4];
        unsafe { op_maxpool2d(x.as_ptr(), y.as_mut_ptr(), 1, 1, 4, 4, 2, 2, 2, 2, 0, 0) };
        assert_eq!(y, [6.0, 8.0, 14.0, 16.0]);
    }

    #[test]
    fn test_conv1d_bias() {
        let input = [1.0f32, 2.0, 3.0];
        let weight = [1.0f32, 1.0];
        let bias = [0.5f32];
        let mut out = [0.0f32; 2];
        unsafe {
            op_conv1d(input.as_ptr(), weight.as_ptr(), bias.as_ptr(), out.as_mut_ptr(), 1, 1, 1, 3, 2, 1, 0);
        }
        assert_eq!(out, [3.5, 5.5]);
    }

    #[test]
    fn test_slice_and_pads() {
        let x: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let mut y = [0.0f32; 4];
        unsafe {
            op_slice(x.as_ptr(), y.as_mut_ptr(), [4, 4].as_ptr(), [2, 2].as_ptr(), [1, 1].as_ptr(), 2);
        }
        assert_eq!(y, [5.0, 6.0, 9.0, 10.0]);

        let abcd = [1.0f32, 2.0, 3.0, 4.0];
        let mut r = [0.0f32; 9];
        unsafe { op_reflect_pad(abcd.as_ptr(), r.as_mut_ptr(), 4, 9, [2, 3].as_ptr()) };
        assert_eq!(r, [3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0]);

        let mut p = [0.0f32; 6];
        unsafe { op_const_pad(abcd.as_ptr(), p.as_mut_ptr(), 4, 6, -1.0) };
        assert_eq!(p, [1.0, 2.0, 3.0, 4.0, -1.0, -1.0]);
    }

    #[test]
    fn test_concat1() {
        let a = [1.0f32, 2.0];
        let b = [3.0f32];
        let inputs = [a.as_ptr(), b.as_ptr()];
        let mut out = [0.0f32; 3];
        unsafe { op_concat1(inputs.as_ptr(), out.as_mut_ptr(), [2, 1].as_ptr(), 2) };
        assert_eq!(out, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_glu_and_casts() {
        let x = [1.0f32, 2.0, 0.0, 0.0];
        let mut y = [0.0f32; 2];
        unsafe { op_glu(x.as_ptr(), y.as_mut_ptr(), 4, -1) };
        assert_eq!(y, [0.5, 1.0]);

        let v = [2.5f32, -3.7, f32::NAN];
        let mut out = [0.0f32; 3];
        unsafe { op_cast_i32(v.as_ptr(), out.as_mut_ptr(), 3) };
        assert_eq!(out, [2.0, -4.0, 0.0]);
    }

    #[test]
    fn test_interp_and_batchnorm() {
        let x = [0.0f32, 4.0, 8.0];
        let mut y = [0.0f32; 5];
        unsafe { op_linear_interp(x.as_ptr(), y.as_mut_ptr(), 3, 5) };
        assert_eq!(y, [0.0, 2.0, 4.0, 6.0, 8.0]);

        let mut z = [0.0f32; 1];
        unsafe {
            op_batchnorm2d(
                [3.0f32].as_ptr(),
                [1.0f32].as_ptr(),
                [0.0f32].as_ptr(),
                [3.0f32].as_ptr(),
                [1.0f32].as_ptr(),
                z.as_mut_ptr(),
                1,
            );
        }
        assert_eq!(z, [0.0]);
    }
}
