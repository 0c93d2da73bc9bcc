//! Shared setup for the unit tests.
//!
//! Log output is captured per test with `#[tracing_test::traced_test]`, which
//! owns the global subscriber of the test binary.

/// `true` when the tests run as root, where permission errors cannot be provoked.
pub fn running_as_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
