//! `nk-tensor` - reference f32 operator kernels for neural-network inference.
//!
//! This crate provides:
//! - Slice kernels for element-wise math, activations, reductions, matmul,
//!   convolution, pooling, interpolation, padding and layout ops
//! - Shape utilities and numpy-style broadcasting
//! - Typed parameter structs describing convolution and pooling geometry
//! - An owned `Tensor` value type wrapping a buffer and its shape

pub mod dtype;
pub mod error;
pub mod kernels;
pub mod params;
pub mod shape;
pub mod storage;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use dtype::DType;
pub use error::{Result, TensorError};
pub use params::{Conv1dDims, Conv1dParams, Conv2dDims, Conv2dParams, PadMode, Pool2dDims, Pool2dParams};
pub use shape::Shape;
pub use tensor::Tensor;
