use clap::{Parser, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;

use crate::scene::Settings;

/// Custom enum for log levels that can be used with clap's ValueEnum
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "rex-tracer")]
#[command(about = "A ray tracer with baked irradiance caches")]
pub struct Args {
    /// Scene description file
    pub scene: PathBuf,

    /// Output image (.png or .ppm)
    #[arg(short, long, default_value = "render.png")]
    pub output: PathBuf,

    /// Image width in pixels, overrides DIMENSIONS
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels, overrides DIMENSIONS
    #[arg(long)]
    pub height: Option<u32>,

    /// Recursion budget for reflection and refraction, overrides RAY_DEPTH
    #[arg(long)]
    pub depth: Option<i32>,

    /// Seed of the baking pass, overrides SEED
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip the baking pass even if the scene enables it
    #[arg(long)]
    pub no_rex: bool,

    /// Directory to export every baked cache to, as rex_<index>.png
    #[arg(long)]
    pub rex_dir: Option<PathBuf>,

    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub log_level: LogLevel,
}

impl Args {
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(depth) = self.depth {
            settings.ray_depth = depth;
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if self.no_rex {
            settings.rex = false;
        }
    }
}
