//! Backend configuration and detection.

#[cfg(not(any(feature = "mock", feature = "runtime")))]
compile_error!("No rtos-shim backend selected. Use either the 'mock' or 'runtime' feature.");

#[cfg(all(feature = "mock", feature = "runtime"))]
compile_error!("rtos-shim backends 'mock' and 'runtime' are mutually exclusive.");

/// Detect which backend is active at compile time.
pub const fn platform_mode() -> &'static str {
    #[cfg(feature = "mock")]
    return "mock";

    #[cfg(all(feature = "runtime", not(feature = "mock")))]
    return "runtime";

    #[cfg(not(any(feature = "mock", feature = "runtime")))]
    return "unconfigured";
}

/// Check if the std-based mock backend is active (host testing).
pub const fn is_mock() -> bool {
    cfg!(feature = "mock")
}

/// Check if the kernel port layer backend is active.
pub const fn is_runtime() -> bool {
    cfg!(feature = "runtime")
}
