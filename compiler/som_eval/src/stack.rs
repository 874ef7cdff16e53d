//! Stack growth for deep recursion.
//!
//! Tree-walking evaluation recurses once per nested node and once per block
//! invocation, so deeply nested programs can exhaust the native stack before
//! any depth limit fires. On native targets `stacker` grows the stack on
//! demand; on WASM the closure runs directly.

/// Keep at least this much stack free before recursing.
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
#[cfg(not(target_arch = "wasm32"))]
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
