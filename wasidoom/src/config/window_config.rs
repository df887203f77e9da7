use serde::{Deserialize, Serialize};
use winit::{dpi::LogicalSize, window::WindowBuilder};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Inner size of the window in logical pixels.
    pub(crate) dimensions: (u32, u32),
    pub(crate) resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            dimensions: (640, 400),
            resizable: false,
        }
    }
}

impl WindowConfig {
    pub(crate) fn into_builder(self, app_name: &str) -> WindowBuilder {
        WindowBuilder::new()
            .with_title(app_name)
            .with_inner_size(LogicalSize::new(self.dimensions.0, self.dimensions.1))
            .with_resizable(self.resizable)
    }
}

pub struct WindowConfigBuilder {
    config: WindowConfig,
}

impl WindowConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Default::default(),
        }
    }

    pub fn with_dimensions(mut self, dimensions: (u32, u32)) -> Self {
        self.config.dimensions = dimensions;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.config.resizable = resizable;
        self
    }

    pub fn get(self) -> WindowConfig {
        self.config
    }
}
