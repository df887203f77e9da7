use std::{fs::File, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use wasidoom_core::{
    frame::{FRAME_HEIGHT, FRAME_WIDTH},
    vfs::FileTable,
    Personality,
};
use wasidoom_render::FramePresenter;
use wasmi::{Engine, Linker, Module, Store};
use winit::event_loop::{ControlFlow, EventLoop};

use crate::{
    config::app_config::AppConfig,
    link::{self, ExitSignal},
    presenter::HostPresenter,
    utils::logger::Logger,
};

pub struct App;

impl App {
    pub fn app_with_config(config: AppConfig) -> AppBuilder {
        Logger::init_logging(config.logger_config.clone());
        log::info!("starting the app, with the following configuration: {config:?}");
        AppBuilder::new(config)
    }
}

pub struct AppBuilder {
    config: AppConfig,
    module_path: PathBuf,
    wad_path: PathBuf,
}

impl AppBuilder {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            module_path: PathBuf::from("./wasidoom.wasm"),
            wad_path: PathBuf::from("./doom1.wad"),
        }
    }

    pub fn with_module(mut self, path: impl Into<PathBuf>) -> Self {
        self.module_path = path.into();
        self
    }

    pub fn with_wad(mut self, path: impl Into<PathBuf>) -> Self {
        self.wad_path = path.into();
        self
    }

    /// Run the guest to completion and report its exit code.
    pub fn run(self) -> Result<i32> {
        let wasm = std::fs::read(&self.module_path)
            .with_context(|| format!("failed to read guest module {:?}", self.module_path))?;
        let wad = File::open(&self.wad_path)
            .with_context(|| format!("failed to open game data {:?}", self.wad_path))?;

        let mut event_loop = EventLoop::new().context("event loop could not be created")?;
        event_loop.set_control_flow(ControlFlow::Poll);
        let window_config = self.config.window_config.clone().unwrap_or_default();
        let window = Arc::new(
            window_config
                .into_builder(&self.config.app_name)
                .build(&event_loop)
                .context("could not build the main window")?,
        );

        // Drain the creation events once so the window actually shows up
        // before the guest takes over the thread.
        {
            use winit::platform::pump_events::EventLoopExtPumpEvents;
            let _ = event_loop.pump_events(Some(std::time::Duration::ZERO), |_, _| {});
        }

        let renderer = pollster::block_on(FramePresenter::new(
            window.clone(),
            (FRAME_WIDTH, FRAME_HEIGHT),
        ))?;
        let presenter = HostPresenter::new(event_loop, window, renderer);

        let table = FileTable::new(Box::new(wad));
        let personality = Personality::new(table, Box::new(presenter));

        let engine = Engine::default();
        let module =
            Module::new(&engine, &wasm[..]).context("failed to parse the guest module")?;
        let mut store = Store::new(&engine, personality);
        let mut linker = Linker::new(&engine);
        link::link_wasi(&mut store, &mut linker)?;

        let instance = linker
            .instantiate(&mut store, &module)
            .context("failed to instantiate the guest module")?
            .start(&mut store)
            .context("guest start section trapped")?;
        let start = instance
            .get_typed_func::<(), ()>(&store, "_start")
            .context("guest module has no _start entry point")?;

        log::info!("entering the guest");
        match start.call(&mut store, ()) {
            Ok(()) => Ok(0),
            Err(trap) => {
                let exit_code = trap.downcast_ref::<ExitSignal>().map(|exit| exit.0);
                match exit_code {
                    Some(code) => {
                        log::info!("guest exited with code {code}");
                        Ok(code)
                    }
                    None => Err(trap).context("guest execution failed"),
                }
            }
        }
    }
}
