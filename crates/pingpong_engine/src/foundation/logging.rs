//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// `RUST_LOG` wins when it is set; otherwise `default_level` (for example the
/// `log_level` field of [`EngineConfig`](crate::core::config::EngineConfig))
/// is used as the filter. Calling this more than once is harmless.
pub fn init(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

/// Initialize logging for unit tests (captured by the test harness)
#[cfg(test)]
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
