use log::LevelFilter;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Filter applied to our own crates.
    pub level_filter: LevelFilter,
    /// Filter for the GPU stack (wgpu/naga), which is chatty at info level.
    pub gpu_level_filter: LevelFilter,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::Info,
            gpu_level_filter: LevelFilter::Warn,
        }
    }
}
