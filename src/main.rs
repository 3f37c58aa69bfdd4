mod app;
mod body;
mod camera;
mod color;
mod config;
mod controls;
mod frame;
mod input;
mod logging;
mod overlay;
mod panel;
mod projector;
mod raster;
mod render;
mod scene;
mod term;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = config::Args::parse();
    let log_path = args.log_file.clone().or_else(config::default_log_path);
    let level = args.log_level.as_deref().unwrap_or(logging::DEFAULT_LOG_LEVEL);
    if let Some(path) = logging::init_logging(log_path.as_deref(), level) {
        tracing::info!(path = %path.display(), "logging");
    }
    let settings = config::resolve(&args);
    app::run(settings)
}
