use clap::{Parser, ValueEnum};
use winit::dpi::LogicalSize;

use trigon_engine::device::GpuInit;
use trigon_engine::logging::LoggingConfig;
use trigon_engine::window::RuntimeConfig;

use crate::scene::SceneConfig;

/// Geometry drawn each frame.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum DrawMode {
    /// Two triangles side by side, orange and yellow
    #[default]
    TrianglePair,
    /// One indexed rectangle, orange
    Rectangle,
}

#[derive(Parser, Debug)]
#[command(name = "trigon-demo")]
#[command(about = "Draws hardcoded triangles with runtime-linked WGSL programs.", long_about = None)]
pub struct Args {
    /// Geometry to draw
    #[arg(long, value_enum, default_value_t = DrawMode::TrianglePair)]
    pub mode: DrawMode,

    /// Rasterize edges only (needs adapter support for line polygon mode)
    #[arg(long)]
    pub wireframe: bool,

    /// Window title
    #[arg(long, default_value = "Hello World")]
    pub title: String,

    /// Initial window width in logical pixels
    #[arg(long, default_value_t = 800, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// Initial window height in logical pixels
    #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: u32,

    /// env_logger filter; overrides RUST_LOG
    #[arg(long)]
    pub log: Option<String>,
}

impl Args {
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.log.clone(),
            ..LoggingConfig::default()
        }
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.title.clone(),
            initial_size: LogicalSize::new(self.width as f64, self.height as f64),
        }
    }

    pub fn gpu_init(&self) -> GpuInit {
        let mut init = GpuInit::default();
        if self.wireframe {
            init.required_features |= wgpu::Features::POLYGON_MODE_LINE;
        }
        init
    }

    pub fn scene_config(&self) -> SceneConfig {
        SceneConfig {
            mode: self.mode,
            wireframe: self.wireframe,
            ..SceneConfig::default()
        }
    }
}
