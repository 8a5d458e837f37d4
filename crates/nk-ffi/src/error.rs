use nk_tensor::TensorError;
use std::cell::RefCell;
use std::ffi::CString;
use thiserror::Error;

/// Reasons a C ABI call is rejected before or during a kernel run.
#[derive(Error, Debug)]
pub enum FfiError {
    #[error("`{0}` is a null pointer")]
    NullPointer(&'static str),
    #[error("`{name}` must be non-negative, got {value}")]
    NegativeSize { name: &'static str, value: i32 },
    #[error("element count of `{0}` overflows")]
    Overflow(&'static str),
    #[error("refusing to allocate a tensor of shape {0:?}")]
    AllocationRefused(Vec<usize>),
    #[error("allocation of {elements} floats failed")]
    OutOfMemory { elements: usize },
    #[error("internal panic")]
    Panic,
    #[error(transparent)]
    Tensor(#[from] TensorError),
}

pub type Result<T> = std::result::Result<T, FfiError>;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store an error message for later retrieval via `nk_last_error`.
pub fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Take the last error message, leaving `None` in its place.
pub fn take_last_error() -> Option<CString> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}

/// Log a rejected call and remember it as the thread's last error.
pub(crate) fn report(op: &'static str, err: &FfiError) {
    tracing::warn!(op, error = %err, "rejected C ABI call");
    set_last_error(format!("{op}: {err}"));
}
