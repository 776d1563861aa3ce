//! Window, event loop and frame stepping.
//!
//! [`ArborApp`] opens a winit window, creates the wgpu backend and a
//! [`Renderer`], lets the caller build the scene once, then on every redraw
//! applies camera input, updates the scene and draws it.

use std::{sync::Arc, time::Instant};

use anyhow::{anyhow, Context};
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::gfx::{
    camera::{free_camera::DEFAULT_LOOK_SENSITIVITY, Camera, CameraController},
    renderer::Renderer,
    rendering::WgpuBackend,
};

/// Scene construction callback, run once the window and renderer exist.
pub type SetupFn = Box<dyn FnOnce(&mut Renderer) -> anyhow::Result<()>>;

/// Window and input settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Camera movement in world units per second.
    pub camera_speed: f32,
    /// Camera yaw in degrees per pixel of pointer motion.
    pub look_sensitivity: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Arbor".to_string(),
            width: 1280,
            height: 720,
            camera_speed: 5.0,
            look_sensitivity: DEFAULT_LOOK_SENSITIVITY,
        }
    }
}

impl AppConfig {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_camera_speed(mut self, speed: f32) -> Self {
        self.camera_speed = speed;
        self
    }

    pub fn with_look_sensitivity(mut self, degrees_per_pixel: f32) -> Self {
        self.look_sensitivity = degrees_per_pixel;
        self
    }
}

pub struct ArborApp {
    config: AppConfig,
}

struct AppState {
    config: AppConfig,
    window: Option<Arc<Window>>,
    backend: Option<WgpuBackend>,
    renderer: Option<Renderer>,
    controller: CameraController,
    setup: Option<SetupFn>,
    last_frame: Instant,
    failure: Option<anyhow::Error>,
}

impl ArborApp {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Runs the event loop until the window closes or Escape is pressed.
    ///
    /// # Arguments
    /// * `setup` - Builds the scene on the renderer; an error aborts the run
    pub fn run<F>(self, setup: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut Renderer) -> anyhow::Result<()> + 'static,
    {
        let _ = env_logger::try_init();

        let event_loop = EventLoop::new().context("failed to create event loop")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut state = AppState {
            controller: CameraController::new(self.config.camera_speed),
            config: self.config,
            window: None,
            backend: None,
            renderer: None,
            setup: Some(Box::new(setup)),
            last_frame: Instant::now(),
            failure: None,
        };

        event_loop
            .run_app(&mut state)
            .context("event loop terminated abnormally")?;

        match state.failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(self.config.title.clone())
                    .with_inner_size(winit::dpi::LogicalSize::new(
                        self.config.width,
                        self.config.height,
                    )),
            )
            .context("failed to create window")?;
        let window = Arc::new(window);
        let (width, height) = window.inner_size().into();

        let backend = pollster::block_on(WgpuBackend::new(window.clone(), width, height))
            .context("failed to initialize wgpu")?;

        let mut renderer = Renderer::new(width, height);
        if let Some(camera) = renderer.camera_mut(0) {
            *camera = Camera::default().with_look_sensitivity(self.config.look_sensitivity);
        }

        let setup = self
            .setup
            .take()
            .ok_or_else(|| anyhow!("scene setup already ran"))?;
        setup(&mut renderer).context("scene setup failed")?;

        info!("'{}' running at {}x{}", self.config.title, width, height);
        self.window = Some(window);
        self.backend = Some(backend);
        self.renderer = Some(renderer);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, failure: anyhow::Error) {
        error!("{:#}", failure);
        self.failure = Some(failure);
        event_loop.exit();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(failure) = self.initialize(event_loop) {
            self.fail(event_loop, failure);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let (Some(window), Some(backend), Some(renderer)) = (
            self.window.as_ref(),
            self.backend.as_mut(),
            self.renderer.as_mut(),
        ) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                self.controller.process_keyed_events(&event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(camera) = renderer.camera_mut(0) {
                    self.controller.process_cursor(position, camera);
                }
                renderer.set_mouse_position(position.x as f32, position.y as f32);
            }
            WindowEvent::Focused(false) => {
                self.controller.release_all();
                if let Some(camera) = renderer.camera_mut(0) {
                    camera.reset_pointer();
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                renderer.resize(width, height);
                backend.resize(width, height);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.last_frame).as_secs_f32();
                self.last_frame = now;

                if let Some(camera) = renderer.camera_mut(0) {
                    self.controller.update_camera(camera, dt);
                }
                if let Err(e) = renderer.update() {
                    error!("Scene update failed: {}", e);
                } else if let Err(e) = backend.render_frame(renderer) {
                    error!("Frame failed: {}", e);
                }
                window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}
