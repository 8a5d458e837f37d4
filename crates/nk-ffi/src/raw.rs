//! Conversions from C arguments to checked Rust values.
//!
//! A zero-length buffer may be null. Everything else must point at
//! `len` valid, properly aligned floats that do not overlap any output.

use crate::error::{FfiError, Result};
use std::os::raw::c_int;

/// A C `int` size or dimension as a `usize`.
pub(crate) fn count(name: &'static str, value: c_int) -> Result<usize> {
    usize::try_from(value).map_err(|_| FfiError::NegativeSize { name, value })
}

pub(crate) unsafe fn input<'a>(name: &'static str, ptr: *const f32, len: usize) -> Result<&'a [f32]> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(FfiError::NullPointer(name));
    }
    Ok(std::slice::from_raw_parts(ptr, len))
}

pub(crate) unsafe fn output<'a>(name: &'static str, ptr: *mut f32, len: usize) -> Result<&'a mut [f32]> {
    if len == 0 {
        return Ok(&mut []);
    }
    if ptr.is_null() {
        return Err(FfiError::NullPointer(name));
    }
    Ok(std::slice::from_raw_parts_mut(ptr, len))
}

/// Optional input: null means absent.
pub(crate) unsafe fn optional<'a>(ptr: *const f32, len: usize) -> Option<&'a [f32]> {
    if ptr.is_null() {
        None
    } else {
        Some(std::slice::from_raw_parts(ptr, len))
    }
}

/// Read `ndims` non-negative C ints, e.g. a shape or a permutation.
pub(crate) unsafe fn dims(name: &'static str, ptr: *const c_int, ndims: c_int) -> Result<Vec<usize>> {
    let n = count("ndims", ndims)?;
    if n == 0 {
        return Ok(Vec::new());
    }
    if ptr.is_null() {
        return Err(FfiError::NullPointer(name));
    }
    std::slice::from_raw_parts(ptr, n)
        .iter()
        .map(|&d| count(name, d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_rejects_negative() {
        assert_eq!(count("size", 4).unwrap(), 4);
        assert!(matches!(
            count("size", -1),
            Err(FfiError::NegativeSize { name: "size", value: -1 })
        ));
    }

    #[test]
    fn test_empty_buffers_may_be_null() {
        unsafe {
            assert!(input("x", std::ptr::null(), 0).unwrap().is_empty());
            assert!(output("y", std::ptr::null_mut(), 0).unwrap().is_empty());
            assert!(input("x", std::ptr::null(), 1).is_err());
        }
    }

    #[test]
    fn test_dims() {
        let shape = [2, 3, 4];
        unsafe {
            assert_eq!(dims("shape", shape.as_ptr(), 3).unwrap(), vec![2, 3, 4]);
            assert!(dims("shape", std::ptr::null(), 2).is_err());
            assert!(dims("shape", [1, -2].as_ptr(), 2).is_err());
            assert!(dims("shape", shape.as_ptr(), -1).is_err());
        }
    }
}
