//! Tensor size helpers and the buffer allocator exposed to C.
//!
//! `allocate_tensor` takes its buffer from `nk_tensor::storage` with
//! `HEADER` extra leading floats, and stores the element count there so
//! `free_tensor` can rebuild the boxed slice and the rank/shape stubs can
//! report the flat size.

use crate::error::{FfiError, Result};
use crate::{guard_value, raw};
use nk_tensor::storage;
use std::mem::size_of;
use std::os::raw::c_int;
use std::ptr;

/// Floats reserved in front of the data for the `usize` element count.
const HEADER: usize = size_of::<usize>().div_ceil(size_of::<f32>());

/// Element count stored in front of a buffer from `allocate_tensor`.
unsafe fn stored_len(data: *const f32) -> usize {
    data.sub(HEADER).cast::<usize>().read_unaligned()
}

/// Number of elements in a tensor of the given shape; 1 for `ndims == 0`.
///
/// Returns -1 for a null shape, a negative dim or count, or a product that
/// does not fit in an `int`.
#[no_mangle]
pub unsafe extern "C" fn compute_tensor_size(shape: *const c_int, ndims: c_int) -> c_int {
    guard_value("compute_tensor_size", -1, || {
        let dims = raw::dims("shape", shape, ndims)?;
        storage::checked_size(&dims)
            .and_then(|n| c_int::try_from(n).ok())
            .ok_or(FfiError::Overflow("shape"))
    })
}

/// Row-major linear offset of `indices`, or -1 if any index is out of range.
#[no_mangle]
pub unsafe extern "C" fn get_tensor_offset(shape: *const c_int, indices: *const c_int, ndims: c_int) -> c_int {
    guard_value("get_tensor_offset", -1, || {
        let dims = raw::dims("shape", shape, ndims)?;
        let index = raw::dims("indices", indices, ndims)?;
        let offset = nk_tensor::shape::offset(&dims, &index)?;
        c_int::try_from(offset).map_err(|_| FfiError::Overflow("indices"))
    })
}

/// Allocate a zero-filled tensor. Returns null when the shape is invalid or
/// empty, or the allocation fails. Release with `free_tensor`.
#[no_mangle]
pub unsafe extern "C" fn allocate_tensor(shape: *const c_int, ndims: c_int) -> *mut f32 {
    guard_value("allocate_tensor", ptr::null_mut(), || {
        let dims = raw::dims("shape", shape, ndims)?;
        let Some(n) = storage::allocation_len(&dims) else {
            return Err(FfiError::AllocationRefused(dims));
        };
        let total = n.checked_add(HEADER).ok_or(FfiError::Overflow("shape"))?;
        let buf = storage::allocate_len(total).ok_or(FfiError::OutOfMemory { elements: total })?;
        let base = Box::into_raw(buf.into_boxed_slice()).cast::<f32>();
        base.cast::<usize>().write_unaligned(n);
        tracing::debug!(elements = n, "allocate_tensor");
        Ok(base.add(HEADER))
    })
}

/// Release a buffer from `allocate_tensor`. Null is a no-op.
#[no_mangle]
pub unsafe extern "C" fn free_tensor(data: *mut f32) {
    if data.is_null() {
        return;
    }
    let n = stored_len(data);
    let base = data.sub(HEADER);
    drop(Box::from_raw(ptr::slice_from_raw_parts_mut(base, n + HEADER)));
}

/// Rank of a buffer from `allocate_tensor`. Buffers carry no shape, so every
/// live buffer reports rank 1; null reports -1.
#[no_mangle]
pub extern "C" fn get_tensor_rank(tensor: *mut f32) -> c_int {
    if tensor.is_null() {
        -1
    } else {
        1
    }
}

/// Write the flat element count of a buffer from `allocate_tensor` into
/// `shape[0]` and 1 into the remaining `ndims - 1` slots.
#[no_mangle]
pub unsafe extern "C" fn get_tensor_shape(tensor: *mut f32, shape: *mut c_int, ndims: c_int) {
    crate::guard("get_tensor_shape", || {
        let n = raw::count("ndims", ndims)?;
        if n == 0 {
            return Ok(());
        }
        if tensor.is_null() {
            return Err(FfiError::NullPointer("tensor"));
        }
        if shape.is_null() {
            return Err(FfiError::NullPointer("shape"));
        }
        let out = std::slice::from_raw_parts_mut(shape, n);
        out.fill(1);
        out[0] = c_int::try_from(stored_len(tensor)).unwrap_or(c_int::MAX);
        Ok(())
    })
}

/// Element count of a shape read from C, rejecting overflow.
pub(crate) fn element_count(dims: &[usize]) -> Result<usize> {
    storage::checked_size(dims).ok_or(FfiError::Overflow("shape"))
}
