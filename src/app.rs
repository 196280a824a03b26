use crate::camera_controller::{FlyCamera, MouseTracker};
use crate::config::ViewerConfig;
use crate::input::{KeyAction, KeyboardState};
use crate::renderer::{FrameStatus, RenderOutput, Renderer};
use crate::scene::{SceneAssets, SceneFrame, Toggles};
use anyhow::Context;
use std::{sync::Arc, time::Instant};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition, PhysicalSize},
    event::{KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

/// A window with no area has nothing to present to.
fn is_minimized(size: PhysicalSize<u32>) -> bool {
    size.width == 0 || size.height == 0
}

pub struct App {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    camera: FlyCamera,
    mouse: MouseTracker,
    keyboard: KeyboardState,
    toggles: Toggles,
    start: Instant,
    last_frame: Instant,
    minimized: bool,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: ViewerConfig) -> Self {
        let toggles = Toggles {
            spotlight: config.spotlight,
            effect: config.effect,
        };
        let now = Instant::now();
        Self {
            config,
            window: None,
            renderer: None,
            camera: FlyCamera::default(),
            mouse: MouseTracker::default(),
            keyboard: KeyboardState::default(),
            toggles,
            start: now,
            last_frame: now,
            minimized: false,
            error: None,
        }
    }

    /// Error that stopped the event loop, if any.
    pub fn finish(self) -> anyhow::Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let app_init_timestamp = Instant::now();
        let attrs = Window::default_attributes()
            .with_title("Firefly Grove")
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );
        let assets = SceneAssets::under(&self.config.assets);
        let renderer = pollster::block_on(Renderer::new(
            RenderOutput::Window(window.clone()),
            &assets,
            self.config.samples,
        ))?;
        self.window = Some(window);
        self.renderer = Some(renderer);
        self.start = Instant::now();
        self.last_frame = self.start;
        log::info!("app initialized in {:?}", app_init_timestamp.elapsed());
        Ok(())
    }

    fn update(&mut self) {
        let now = Instant::now();
        let delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        let movements: Vec<_> = self.keyboard.movements().collect();
        for movement in movements {
            self.camera.process_keyboard(movement, delta_time);
        }
    }

    fn draw(&mut self) -> anyhow::Result<()> {
        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };
        let time = self.start.elapsed().as_secs_f32();
        let frame = SceneFrame::compute(time, &self.camera, self.toggles, renderer.aspect_ratio());
        if renderer.render(&frame)? == FrameStatus::Skipped {
            log::debug!("frame at {time:.2}s skipped");
        }
        Ok(())
    }

    fn cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        if let Some((x_offset, y_offset)) = self.mouse.handle_motion(position) {
            self.camera.process_mouse_movement(x_offset, y_offset, true);
        }
    }

    /// The next cursor sample re-seeds the tracker instead of turning the camera.
    fn cursor_left(&mut self) {
        self.mouse.reset();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        match self.keyboard.handle_key(code, event.state, event.repeat) {
            KeyAction::Exit => event_loop.exit(),
            KeyAction::ToggleSpotlight => self.toggles.toggle_spotlight(),
            KeyAction::ToggleEffect => self.toggles.toggle_effect(),
            KeyAction::None => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e.context("failed to start viewer"));
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                self.minimized = is_minimized(size);
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, event),
            WindowEvent::Focused(false) => self.keyboard.clear(),
            WindowEvent::CursorMoved { position, .. } => self.cursor_moved(position),
            WindowEvent::CursorLeft { .. } => self.cursor_left(),
            WindowEvent::MouseWheel { delta, .. } => self.camera.handle_scroll(delta),
            WindowEvent::RedrawRequested => {
                self.update();
                if self.minimized {
                    return;
                }
                if let Err(e) = self.draw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_window_counts_as_minimized() {
        assert!(is_minimized(PhysicalSize::new(0, 0)));
        assert!(is_minimized(PhysicalSize::new(800, 0)));
        assert!(is_minimized(PhysicalSize::new(0, 600)));
        assert!(!is_minimized(PhysicalSize::new(1, 1)));
    }

    #[test]
    fn reentering_cursor_does_not_turn_camera() {
        let mut app = App::new(ViewerConfig::default());
        let yaw = app.camera.yaw;
        app.cursor_moved(PhysicalPosition::new(400.0, 300.0));
        assert_eq!(app.camera.yaw, yaw);
        app.cursor_moved(PhysicalPosition::new(410.0, 300.0));
        assert!((app.camera.yaw - (yaw + 1.0)).abs() < 1e-5);

        app.cursor_left();
        let yaw = app.camera.yaw;
        app.cursor_moved(PhysicalPosition::new(0.0, 0.0));
        assert_eq!(app.camera.yaw, yaw);
        assert_eq!(app.camera.pitch, 0.0);
    }

    #[test]
    fn new_app_starts_with_config_toggles() {
        let config = ViewerConfig {
            spotlight: true,
            ..Default::default()
        };
        let app = App::new(config);
        assert!(app.toggles.spotlight);
        assert!(!app.toggles.effect);
        assert!(!app.minimized);
        assert!(app.finish().is_ok());
    }
}
