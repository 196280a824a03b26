pub mod app;
pub mod camera_controller;
pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod renderer;
pub mod scene;
pub mod texture;

pub use crate::app::App;
pub use crate::config::ViewerConfig;

use anyhow::Context;
use camera_controller::FlyCamera;
use scene::{SceneAssets, SceneFrame, Toggles};
use winit::event_loop::{ControlFlow, EventLoop};

/// Opens the viewer window and runs until it is closed.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new(config);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated with error")?;
    app.finish()
}

/// Renders one frame from the start position without a window and saves it.
pub fn screenshot(config: &ViewerConfig) -> anyhow::Result<()> {
    let path = config
        .screenshot
        .as_ref()
        .context("no screenshot path given")?;
    let assets = SceneAssets::under(&config.assets);
    let toggles = Toggles {
        spotlight: config.spotlight,
        effect: config.effect,
    };
    let camera = FlyCamera::default();
    let image = pollster::block_on(renderer::render_image(
        &assets,
        config.width,
        config.height,
        config.samples,
        |aspect| SceneFrame::compute(config.time, &camera, toggles, aspect),
    ))?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("saved {}", path.display());
    Ok(())
}
