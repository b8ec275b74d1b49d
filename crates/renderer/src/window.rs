//! Window and event loop driving one [`Scene`] on the wgpu backend.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use tracing::{error, info, warn};

use crate::backend::BackendError;
use crate::gpu::GpuState;
use crate::runtime::{BoxedTickSource, SystemTickSource};
use crate::scene::{Scene, SceneError};
use crate::types::RendererConfig;

/// Everything the event loop drives. `gpu` is declared before `window` so the
/// surface is dropped while the window still exists.
struct WindowState {
    gpu: GpuState,
    scene: Scene,
    ticks: BoxedTickSource,
    window: Arc<Window>,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let mut gpu = GpuState::new(
            window.as_ref(),
            window.inner_size(),
            config.antialiasing,
            config.color_space,
        )
        .context("failed to initialise GPU")?;

        let scene = Scene::init(&mut gpu, &config.assets, config.missing_texture)
            .context("failed to load scene assets")?;

        let ticks: BoxedTickSource = Box::new(SystemTickSource::new());

        Ok(Self {
            gpu,
            scene,
            ticks,
            window,
        })
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    /// Advances the scene and draws it. Surface hiccups are handled here; any
    /// other failure is returned.
    fn redraw(&mut self) -> Result<RedrawOutcome, SceneError> {
        let now = self.ticks.ticks();
        match self.scene.cycle(now, &mut self.gpu) {
            Ok(()) => Ok(RedrawOutcome::Presented),
            Err(SceneError::Render(BackendError::Surface(surface_err))) => match surface_err {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    self.gpu.recover_surface();
                    Ok(RedrawOutcome::Skipped)
                }
                wgpu::SurfaceError::OutOfMemory => Ok(RedrawOutcome::Fatal),
                wgpu::SurfaceError::Timeout => {
                    warn!("surface timeout; retrying next frame");
                    Ok(RedrawOutcome::Skipped)
                }
                other => {
                    warn!("surface error: {other:?}; retrying next frame");
                    Ok(RedrawOutcome::Skipped)
                }
            },
            Err(err) => Err(err),
        }
    }
}

enum RedrawOutcome {
    Presented,
    Skipped,
    Fatal,
}

/// Opens the window and renders the scene until it is closed or Escape is
/// pressed.
pub fn run_window(config: RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(window_size)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window.clone(), &config)?;
    info!(
        width = state.gpu.size().width,
        height = state.gpu.size().height,
        shader = %config.assets.shader.display(),
        texture = %config.assets.texture.display(),
        "scene ready"
    );

    let failure: Rc<RefCell<Option<anyhow::Error>>> = Rc::new(RefCell::new(None));
    let loop_failure = Rc::clone(&failure);

    event_loop.set_control_flow(ControlFlow::Poll);
    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window.id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    elwt.exit();
                }
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key: Key::Named(NamedKey::Escape),
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => {
                    info!("escape pressed; closing window");
                    elwt.exit();
                }
                WindowEvent::Resized(new_size) => {
                    state.resize(new_size);
                }
                WindowEvent::RedrawRequested => match state.redraw() {
                    Ok(RedrawOutcome::Presented | RedrawOutcome::Skipped) => {}
                    Ok(RedrawOutcome::Fatal) => {
                        error!("surface out of memory; exiting");
                        *loop_failure.borrow_mut() = Some(anyhow!("surface out of memory"));
                        elwt.exit();
                    }
                    Err(err) => {
                        error!(error = %err, "failed to render scene");
                        *loop_failure.borrow_mut() = Some(err.into());
                        elwt.exit();
                    }
                },
                _ => {}
            }
        }
        Event::AboutToWait => {
            state.window.request_redraw();
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))?;
    let failure = failure.borrow_mut().take();
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
