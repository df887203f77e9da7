mod app;
mod cli;
mod config;
mod link;
mod presenter;
mod utils;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use wasidoom_core::frame::{FRAME_HEIGHT, FRAME_WIDTH};

use crate::{
    app::App,
    cli::Cli,
    config::{
        app_config::{AppConfig, AppConfigBuilder},
        logger_config::LoggerConfig,
        window_config::WindowConfigBuilder,
    },
};

fn app_config(scale: u32) -> AppConfig {
    AppConfigBuilder::new()
        .with_app_name("wasidoom".to_string())
        .with_logger_config(LoggerConfig {
            level_filter: LevelFilter::Info,
            gpu_level_filter: LevelFilter::Warn,
        })
        .with_window_config(
            WindowConfigBuilder::new()
                .with_dimensions((FRAME_WIDTH * scale, FRAME_HEIGHT * scale))
                .with_resizable(false)
                .get(),
        )
        .get()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let code = App::app_with_config(app_config(cli.scale.max(1)))
        .with_module(cli.wasm)
        .with_wad(cli.wad)
        .run()?;
    std::process::exit(code);
}
