//! Full-buffer reductions and arg ops.
//!
//! Sums accumulate left to right in a single f32. `reduce_min`/`reduce_max`
//! propagate NaN; `argmin`/`argmax` skip it.

pub fn sum(x: &[f32]) -> f32 {
    x.iter().sum()
}

/// Arithmetic mean; NaN for an empty buffer.
pub fn mean(x: &[f32]) -> f32 {
    sum(x) / x.len() as f32
}

/// Smallest element, NaN if any element is NaN, +inf if empty.
pub fn reduce_min(x: &[f32]) -> f32 {
    let mut acc = f32::INFINITY;
    for &v in x {
        if v.is_nan() {
            return f32::NAN;
        }
        acc = acc.min(v);
    }
    acc
}

/// Largest element, NaN if any element is NaN, -inf if empty.
pub fn reduce_max(x: &[f32]) -> f32 {
    let mut acc = f32::NEG_INFINITY;
    for &v in x {
        if v.is_nan() {
            return f32::NAN;
        }
        acc = acc.max(v);
    }
    acc
}

pub fn reduce_prod(x: &[f32]) -> f32 {
    x.iter().product()
}

/// Sum of absolute values.
pub fn reduce_l1(x: &[f32]) -> f32 {
    x.iter().map(|v| v.abs()).sum()
}

/// Euclidean norm.
pub fn reduce_l2(x: &[f32]) -> f32 {
    x.iter().map(|v| v * v).sum::<f32>().sqrt()
}

fn arg_extreme(x: &[f32], better: impl Fn(f32, f32) -> bool) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in x.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if !better(v, b) => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the first minimum, ignoring NaN. `None` if no element qualifies.
pub fn argmin(x: &[f32]) -> Option<usize> {
    arg_extreme(x, |v, b| v < b)
}

/// Index of the first maximum, ignoring NaN. `None` if no element qualifies.
pub fn argmax(x: &[f32]) -> Option<usize> {
    arg_extreme(x, |v, b| v > b)
}
