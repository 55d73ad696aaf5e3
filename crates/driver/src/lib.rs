//! Frame Loop Driver: backend-agnostic per-frame orchestration.
//!
//! Each frame: apply free-fly input to the camera, recompute the inverse
//! view matrix, push it and the field-of-view to the shader's uniform slots,
//! then hand off to the backend for the full-screen draw and present.
//!
//! # Invariants
//! - Uniform slots are resolved exactly once at startup, never per frame.
//! - Uploaded values always reflect live camera state, never a cached copy.
//! - Teardown releases the shader before the rendering context.

mod backend;
mod camera;
mod frame_loop;
mod timing;

pub use backend::{Hud, RenderBackend};
pub use camera::{Camera, FrameInput, FreeFly};
pub use frame_loop::{FrameLoop, FOV_UNIFORM, VIEW_INVERSE_UNIFORM};
pub use timing::{FpsCounter, FrameLimiter};
