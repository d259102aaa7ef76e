//! Quiet-mode aware progress notices. When BOOTPY_QUIET=1, notices are suppressed.
//! Notices go to stderr so the delegated process owns stdout.

#[macro_export]
macro_rules! progress {
    ($($arg:tt)*) => {{
        if !$crate::log::is_quiet() {
            eprintln!($($arg)*);
        }
        tracing::debug!($($arg)*);
    }};
}

pub fn is_quiet() -> bool {
    bootpy_core::config::ObservabilityConfig::from_env().quiet
}
