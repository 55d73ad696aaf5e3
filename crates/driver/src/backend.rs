use glam::Mat4;

/// Overlay content drawn on top of the raymarched frame in the default
/// (unshaded) pipeline.
#[derive(Debug, Clone, Copy)]
pub struct Hud<'a> {
    pub label: &'a str,
    pub fps: f32,
}

/// Seam to the rendering/windowing collaborator. The frame loop only ever
/// talks to the backend through this trait, so the per-frame contract can be
/// exercised with instrumented stubs and no GPU.
///
/// # Invariants
/// - `resolve_uniform` is a startup-only operation; slots stay valid for the
///   shader program's entire lifetime.
/// - Uploads to a `None` slot are silent no-ops: an unused uniform is a
///   valid shader configuration, not an error.
/// - `release_shader` and `release_context` are idempotent on already
///   released resources.
pub trait RenderBackend {
    /// Opaque handle to a resolved uniform location.
    type Slot: Copy;

    /// Look up a uniform by name. `None` is the "not found" sentinel.
    fn resolve_uniform(&mut self, name: &str) -> Option<Self::Slot>;

    fn write_mat4(&mut self, slot: Option<Self::Slot>, value: Mat4);

    fn write_f32(&mut self, slot: Option<Self::Slot>, value: f32);

    /// Clear, draw the shader-bound full-screen rectangle, draw the overlay,
    /// and present the composed frame. Transient presentation failures are
    /// the backend's business; a skipped frame is not an error the driver
    /// can act on.
    fn draw(&mut self, hud: &Hud<'_>);

    fn release_shader(&mut self);

    fn release_context(&mut self);
}
