use crate::config::logger_config::LoggerConfig;

pub struct Logger;

impl Logger {
    /// Install env_logger with the configured filters. `RUST_LOG` still
    /// overrides everything, so tracing single syscalls stays a one-liner.
    pub fn init_logging(config: Option<LoggerConfig>) {
        let config = config.unwrap_or_default();
        let mut builder = env_logger::Builder::new();
        builder
            .filter_level(config.level_filter)
            .filter_module("wgpu_core", config.gpu_level_filter)
            .filter_module("wgpu_hal", config.gpu_level_filter)
            .filter_module("naga", config.gpu_level_filter)
            .parse_default_env();
        if builder.try_init().is_err() {
            log::warn!("logger was already initialized");
        }
    }
}
