//! `nk-ffi` - C ABI over the `nk-tensor` kernels.
//!
//! Every operator keeps the symbol name and argument order of the `ops.h`
//! header (`op_add`, `op_conv2d`, `allocate_tensor`, ...). Sizes are C
//! `int`s. A rejected call logs a warning, records a message retrievable
//! with `nk_last_error`, and returns without touching its output.
//!
//! # Safety
//! Every pointer must reference at least as many valid floats as the sizes
//! passed alongside it describe, and output buffers must not overlap inputs.

mod error;
mod memory;
mod ops;
mod raw;

pub use error::*;
pub use memory::*;
pub use ops::*;

use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run a fallible call body, reporting errors and panics instead of
/// letting them cross the ABI.
pub(crate) fn guard<F: FnOnce() -> Result<()>>(op: &'static str, f: F) {
    guard_value(op, (), f)
}

/// Like [`guard`], returning `fallback` when the call is rejected.
pub(crate) fn guard_value<T, F: FnOnce() -> Result<T>>(op: &'static str, fallback: T, f: F) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            error::report(op, &e);
            fallback
        }
        Err(_) => {
            error::report(op, &FfiError::Panic);
            fallback
        }
    }
}

/// Retrieve the last error message for the calling thread, or null if none.
///
/// The returned string is owned by the caller and must be freed with
/// `nk_free_string`.
#[no_mangle]
pub extern "C" fn nk_last_error() -> *const c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null(),
    }
}

/// Free a string previously returned by `nk_last_error`.
#[no_mangle]
pub unsafe extern "C" fn nk_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_guard_reports_error() {
        guard("op_test", || Err(FfiError::NullPointer("x")));
        let msg = nk_last_error();
        assert!(!msg.is_null());
        let text = unsafe { CStr::from_ptr(msg) }.to_str().unwrap().to_string();
        assert_eq!(text, "op_test: `x` is a null pointer");
        unsafe { nk_free_string(msg as *mut c_char) };
        assert!(nk_last_error().is_null());
    }

    #[test]
    fn test_guard_catches_panic() {
        let v = guard_value("op_test", -1, || -> Result<i32> { panic!("boom") });
        assert_eq!(v, -1);
        let msg = nk_last_error();
        let text = unsafe { CStr::from_ptr(msg) }.to_str().unwrap().to_string();
        assert_eq!(text, "op_test: internal panic");
        unsafe { nk_free_string(msg as *mut c_char) };
    }

    #[test]
    fn test_guard_passes_value_through() {
        assert_eq!(guard_value("op_test", 0, || Ok(7)), 7);
        assert!(nk_last_error().is_null());
    }
}
