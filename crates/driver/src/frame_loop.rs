use tracing::debug;

use crate::backend::{Hud, RenderBackend};
use crate::camera::{Camera, FrameInput, FreeFly};
use crate::timing::FpsCounter;

/// Uniform name for the inverse view matrix.
pub const VIEW_INVERSE_UNIFORM: &str = "view_inv";
/// Uniform name for the vertical field-of-view.
pub const FOV_UNIFORM: &str = "fov_y";

/// Per-frame orchestration over a [`RenderBackend`].
///
/// Owns the camera and the two uniform slots for the lifetime of the shader
/// program. One `frame()` call per presented frame; no concurrency.
pub struct FrameLoop<B: RenderBackend> {
    backend: B,
    camera: Camera,
    controller: FreeFly,
    view_inv_slot: Option<B::Slot>,
    fov_slot: Option<B::Slot>,
    fps: FpsCounter,
    label: String,
}

impl<B: RenderBackend> FrameLoop<B> {
    /// Resolve the two uniform slots (startup-only) and take ownership of
    /// the backend and camera.
    pub fn new(mut backend: B, camera: Camera, label: impl Into<String>) -> Self {
        let view_inv_slot = backend.resolve_uniform(VIEW_INVERSE_UNIFORM);
        let fov_slot = backend.resolve_uniform(FOV_UNIFORM);
        debug!(
            view_inv = view_inv_slot.is_some(),
            fov = fov_slot.is_some(),
            "uniform slots resolved"
        );

        Self {
            backend,
            camera,
            controller: FreeFly::default(),
            view_inv_slot,
            fov_slot,
            fps: FpsCounter::new(),
            label: label.into(),
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Run one frame: camera update, matrix recompute, uniform uploads,
    /// draw, present.
    pub fn frame(&mut self, input: &FrameInput) {
        self.controller.apply(&mut self.camera, input);

        let view_inverse = self.camera.view_inverse();
        self.backend.write_mat4(self.view_inv_slot, view_inverse);
        self.backend.write_f32(self.fov_slot, self.camera.fov_y_degrees);

        let fps = self.fps.tick();
        self.backend.draw(&Hud {
            label: &self.label,
            fps,
        });
    }

    /// Explicit frame loop gated by a single polled close flag.
    ///
    /// The flag is checked once per iteration, before any drawing, so the
    /// loop exits within one iteration of a close request with no extra
    /// frame rendered.
    pub fn run_until_close(
        &mut self,
        mut close_requested: impl FnMut() -> bool,
        mut next_input: impl FnMut() -> FrameInput,
    ) {
        while !close_requested() {
            let input = next_input();
            self.frame(&input);
        }
    }

    /// Release the shader program, then the rendering context, in reverse
    /// acquisition order.
    pub fn finish(mut self) {
        debug!("frame loop finished, releasing resources");
        self.backend.release_shader();
        self.backend.release_context();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec2, Vec3};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Everything the stub backend observed, shared out so tests can keep
    /// inspecting after `finish()` consumes the loop.
    #[derive(Default)]
    struct Recorded {
        resolutions: Vec<String>,
        mat4_uploads: Vec<(Option<usize>, Mat4)>,
        f32_uploads: Vec<(Option<usize>, f32)>,
        draws: usize,
        release_order: Vec<&'static str>,
    }

    /// Instrumented stand-in for the graphics library. Knows a fixed set of
    /// uniform names; anything else resolves to the `None` sentinel.
    struct StubBackend {
        known_uniforms: Vec<&'static str>,
        record: Rc<RefCell<Recorded>>,
    }

    impl StubBackend {
        fn new(known_uniforms: Vec<&'static str>) -> (Self, Rc<RefCell<Recorded>>) {
            let record = Rc::new(RefCell::new(Recorded::default()));
            (
                Self {
                    known_uniforms,
                    record: record.clone(),
                },
                record,
            )
        }
    }

    impl RenderBackend for StubBackend {
        type Slot = usize;

        fn resolve_uniform(&mut self, name: &str) -> Option<usize> {
            self.record.borrow_mut().resolutions.push(name.to_owned());
            self.known_uniforms.iter().position(|n| *n == name)
        }

        fn write_mat4(&mut self, slot: Option<usize>, value: Mat4) {
            self.record.borrow_mut().mat4_uploads.push((slot, value));
        }

        fn write_f32(&mut self, slot: Option<usize>, value: f32) {
            self.record.borrow_mut().f32_uploads.push((slot, value));
        }

        fn draw(&mut self, _hud: &Hud<'_>) {
            self.record.borrow_mut().draws += 1;
        }

        fn release_shader(&mut self) {
            self.record.borrow_mut().release_order.push("shader");
        }

        fn release_context(&mut self) {
            self.record.borrow_mut().release_order.push("context");
        }
    }

    fn full_stub() -> (StubBackend, Rc<RefCell<Recorded>>) {
        StubBackend::new(vec![VIEW_INVERSE_UNIFORM, FOV_UNIFORM])
    }

    #[test]
    fn fov_upload_tracks_live_camera_state() {
        let (backend, record) = full_stub();
        let mut frame_loop = FrameLoop::new(backend, Camera::default(), "test");

        frame_loop.frame(&FrameInput::default());
        frame_loop.camera.fov_y_degrees = 72.5;
        frame_loop.frame(&FrameInput::default());

        let record = record.borrow();
        assert_eq!(record.f32_uploads.len(), 2);
        assert_eq!(record.f32_uploads[0].1, 45.0);
        assert_eq!(record.f32_uploads[1].1, 72.5);
    }

    #[test]
    fn view_inverse_is_recomputed_every_frame() {
        let (backend, record) = full_stub();
        let mut frame_loop = FrameLoop::new(backend, Camera::default(), "test");

        frame_loop.frame(&FrameInput::default());
        let moving = FrameInput {
            dt: 0.5,
            move_forward: true,
            ..FrameInput::default()
        };
        frame_loop.frame(&moving);

        let record = record.borrow();
        assert_eq!(record.mat4_uploads.len(), 2);
        assert_ne!(record.mat4_uploads[0].1, record.mat4_uploads[1].1);
    }

    #[test]
    fn uniforms_resolved_exactly_once_at_startup() {
        let (backend, record) = full_stub();
        let mut frame_loop = FrameLoop::new(backend, Camera::default(), "test");

        for _ in 0..32 {
            frame_loop.frame(&FrameInput::default());
        }

        let record = record.borrow();
        assert_eq!(record.resolutions.len(), 2);
        assert_eq!(record.resolutions[0], VIEW_INVERSE_UNIFORM);
        assert_eq!(record.resolutions[1], FOV_UNIFORM);
    }

    #[test]
    fn unknown_uniform_resolves_to_sentinel_and_uploads_are_tolerated() {
        // Shader variant that only declares the matrix uniform.
        let (backend, record) = StubBackend::new(vec![VIEW_INVERSE_UNIFORM]);
        let mut frame_loop = FrameLoop::new(backend, Camera::default(), "test");

        frame_loop.frame(&FrameInput::default());

        let record = record.borrow();
        assert_eq!(record.f32_uploads[0].0, None);
        assert!(record.mat4_uploads[0].0.is_some());
        assert_eq!(record.draws, 1);
    }

    #[test]
    fn teardown_order_is_shader_then_context_exactly_once() {
        let (backend, record) = full_stub();
        let mut frame_loop = FrameLoop::new(backend, Camera::default(), "test");

        for _ in 0..5 {
            frame_loop.frame(&FrameInput::default());
        }
        frame_loop.finish();

        let record = record.borrow();
        assert_eq!(record.release_order, vec!["shader", "context"]);
    }

    #[test]
    fn teardown_runs_once_even_with_zero_frames() {
        let (backend, record) = full_stub();
        let frame_loop = FrameLoop::new(backend, Camera::default(), "test");
        frame_loop.finish();

        let record = record.borrow();
        assert_eq!(record.release_order, vec!["shader", "context"]);
        assert_eq!(record.draws, 0);
    }

    #[test]
    fn loop_exits_before_next_draw_once_close_is_requested() {
        let (backend, record) = full_stub();
        let mut frame_loop = FrameLoop::new(backend, Camera::default(), "test");

        // Close raised while the third frame is in flight: polled at the top
        // of the fourth iteration, so exactly three frames render.
        let mut polls = 0;
        frame_loop.run_until_close(
            || {
                polls += 1;
                polls > 3
            },
            FrameInput::default,
        );

        assert_eq!(record.borrow().draws, 3);
    }

    #[test]
    fn first_frame_uploads_initial_fov_and_exact_initial_inverse() {
        let (backend, record) = full_stub();
        let camera = Camera::default();
        let expected = Mat4::look_at_rh(Vec3::ZERO, Vec3::new(1.0, 1.0, 10.0), Vec3::Y).inverse();

        let mut frame_loop = FrameLoop::new(backend, camera, "test");
        frame_loop.frame(&FrameInput {
            dt: 0.016,
            look_delta: Vec2::ZERO,
            ..FrameInput::default()
        });

        let record = record.borrow();
        assert_eq!(record.f32_uploads[0].1, 45.0);
        assert_eq!(record.mat4_uploads[0].1, expected);
    }
}
