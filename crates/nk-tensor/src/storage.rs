//! Buffer allocation helper.
//!
//! Kernels never allocate; callers size their buffers with [`crate::shape::size`]
//! and either bring their own storage or ask [`allocate`] for a zeroed one.

/// Allocate a zero-filled buffer for a tensor of shape `dims`.
///
/// Returns `None` when the shape describes no elements, the element count
/// overflows, or the allocator refuses the request. Releasing the buffer is
/// an ordinary drop.
pub fn allocate(dims: &[usize]) -> Option<Vec<f32>> {
    allocate_len(allocation_len(dims)?)
}

/// Element count of an allocation for `dims`, or `None` when [`allocate`]
/// would refuse the shape: the count is zero or overflows `usize`.
pub fn allocation_len(dims: &[usize]) -> Option<usize> {
    let Some(n) = checked_size(dims) else {
        tracing::warn!(?dims, "allocate: element count overflows usize");
        return None;
    };
    if n == 0 {
        tracing::debug!(?dims, "allocate: refusing empty buffer");
        return None;
    }
    Some(n)
}

/// Element count of `dims`, or `None` if the product overflows `usize`.
pub fn checked_size(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Allocate a zero-filled buffer of `n` elements. See [`allocate`].
pub fn allocate_len(n: usize) -> Option<Vec<f32>> {
    if n == 0 {
        tracing::debug!("allocate: refusing empty buffer");
        return None;
    }
    let mut buf = Vec::new();
    if let Err(e) = buf.try_reserve_exact(n) {
        tracing::warn!(elements = n, error = %e, "allocate: allocation refused");
        return None;
    }
    buf.resize(n, 0.0f32);
    Some(buf)
}
