use std::collections::HashSet;
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use glam::Vec2;
use raymark_driver::{Camera, FrameInput, FrameLimiter, FrameLoop};
use raymark_render_wgpu::{Gpu, RaymarchProgram, WgpuBackend};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const WINDOW_WIDTH: u32 = 800;
const WINDOW_HEIGHT: u32 = 450;
const WINDOW_TITLE: &str = "Ray marching test";
const HUD_LABEL: &str = "Raymarching test - JFonS";
const TARGET_FPS: u32 = 60;

// Shader sources are consumed from fixed paths relative to the working
// directory; the raymarching algorithm lives entirely in the fragment file.
const VERTEX_SHADER_PATH: &str = "shaders/fullscreen.wgsl";
const FRAGMENT_SHADER_PATH: &str = "shaders/raymarch.wgsl";

/// Shader or GPU bring-up failed; nothing to render, nothing to retry.
fn fatal(context: &str, err: impl Display) -> ! {
    tracing::error!("{context}: {err}");
    std::process::exit(1);
}

struct App {
    window: Option<Arc<Window>>,
    frame_loop: Option<FrameLoop<WgpuBackend>>,
    limiter: FrameLimiter,
    keys_held: HashSet<KeyCode>,
    mouse_captured: bool,
    look_delta: Vec2,
    last_frame: Instant,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            frame_loop: None,
            limiter: FrameLimiter::new(TARGET_FPS),
            keys_held: HashSet::new(),
            mouse_captured: false,
            look_delta: Vec2::ZERO,
            last_frame: Instant::now(),
        }
    }

    /// Sample held keys and accumulated mouse motion into one frame's input.
    fn take_input(&mut self) -> FrameInput {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        FrameInput {
            dt,
            move_forward: self.keys_held.contains(&KeyCode::KeyW),
            move_backward: self.keys_held.contains(&KeyCode::KeyS),
            move_left: self.keys_held.contains(&KeyCode::KeyA),
            move_right: self.keys_held.contains(&KeyCode::KeyD),
            move_up: self.keys_held.contains(&KeyCode::Space),
            move_down: self.keys_held.contains(&KeyCode::ControlLeft),
            boost: self.keys_held.contains(&KeyCode::ShiftLeft),
            look_delta: std::mem::take(&mut self.look_delta),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
            .with_resizable(false);
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let gpu = Gpu::new(window.clone())
            .unwrap_or_else(|err| fatal("failed to initialize GPU context", err));
        let program = RaymarchProgram::load(
            &gpu,
            Path::new(VERTEX_SHADER_PATH),
            Path::new(FRAGMENT_SHADER_PATH),
        )
        .unwrap_or_else(|err| fatal("failed to load shader program", err));

        let backend = WgpuBackend::new(window.clone(), gpu, program);
        self.frame_loop = Some(FrameLoop::new(backend, Camera::default(), HUD_LABEL));
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => {
                if key == KeyCode::Escape && state == ElementState::Pressed {
                    event_loop.exit();
                    return;
                }
                if state == ElementState::Pressed {
                    self.keys_held.insert(key);
                } else {
                    self.keys_held.remove(&key);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state,
                ..
            } => {
                self.mouse_captured = state == ElementState::Pressed;
                if let Some(window) = &self.window {
                    window.set_cursor_visible(!self.mouse_captured);
                }
            }
            WindowEvent::Resized(new_size) => {
                if let Some(frame_loop) = &mut self.frame_loop {
                    frame_loop
                        .backend_mut()
                        .resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let input = self.take_input();
                if let Some(frame_loop) = &mut self.frame_loop {
                    frame_loop.frame(&input);
                }
                self.limiter.wait();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.mouse_captured {
                self.look_delta += Vec2::new(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Shader release before context close, exactly once.
        if let Some(frame_loop) = self.frame_loop.take() {
            frame_loop.finish();
        }
        self.window = None;
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("raymark-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    Ok(())
}
