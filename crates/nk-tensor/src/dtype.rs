/// Target types of the cast kernels.
///
/// Every buffer holds `f32`; a cast rounds and clamps a value to what the
/// target type can represent and stores the result back as `f32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// Boolean: any non-zero value (NaN included) becomes 1.0.
    Bool,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 32-bit floating point (identity).
    F32,
    /// 64-bit floating point. The value is widened and rounded back to `f32`,
    /// so the cast carries no extra precision.
    F64,
}

/// Largest `f32` below 2^31. `i32::MAX as f32` rounds up to 2^31, which is
/// outside the i32 range.
const I32_MAX_F32: f32 = 2_147_483_520.0;

/// Largest `f32` below 2^63.
const I64_MAX_F32: f32 = 9_223_371_487_098_961_920.0;

impl DType {
    /// Convert a single value to this type and back to `f32`.
    ///
    /// Integer targets round half to even and saturate at the largest `f32`
    /// the type can hold; NaN maps to 0.
    #[inline]
    pub fn cast_scalar(&self, x: f32) -> f32 {
        match self {
            DType::Bool => (x != 0.0) as u8 as f32,
            DType::I32 => (round_to_i32(x) as f32).min(I32_MAX_F32),
            DType::I64 => ((x.round_ties_even() as i64) as f32).min(I64_MAX_F32),
            DType::F32 => x,
            DType::F64 => (x as f64) as f32,
        }
    }
}

/// Round half to even into an `i32`, saturating out-of-range values and
/// mapping NaN to 0.
#[inline]
pub fn round_to_i32(x: f32) -> i32 {
    x.round_ties_even() as i32
}
