pub mod app_config;
pub mod logger_config;
pub mod window_config;
