//! Buffer helpers and real-time allocation guards.

pub mod buffer;

// -------------------------------------------------------------------------------------------------

/// Run the given function with allocations disallowed, when the `assert-allocs` feature is
/// enabled. Needs the `assert_no_alloc::AllocDisabler` to be set as global allocator to have
/// an effect.
#[inline]
pub(crate) fn assert_no_alloc<T, F: FnOnce() -> T>(func: F) -> T {
    #[cfg(feature = "assert-allocs")]
    return assert_no_alloc::assert_no_alloc::<T, F>(func);

    #[cfg(not(feature = "assert-allocs"))]
    return func();
}

/// Temporarily allow allocations within an [`assert_no_alloc`] guarded function, e.g. for
/// logging.
#[inline]
pub(crate) fn permit_alloc<T, F: FnOnce() -> T>(func: F) -> T {
    #[cfg(feature = "assert-allocs")]
    return assert_no_alloc::permit_alloc::<T, F>(func);

    #[cfg(not(feature = "assert-allocs"))]
    return func();
}
