//! Quiet-mode aware logging. With ENVBOOT_QUIET=1, progress messages are suppressed.
//! Uses `tracing::info!` so output goes through the tracing subscriber.

#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {{
        if !$crate::log::is_quiet() {
            tracing::info!($($arg)*);
        }
    }};
}

pub fn is_quiet() -> bool {
    envboot_core::config::ObservabilityConfig::from_env().quiet
}
