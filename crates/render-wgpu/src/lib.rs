//! wgpu render backend for the raymarching viewer.
//!
//! Loads the vertex/fragment WGSL pair from disk, reflects the fragment
//! stage's uniform block into named byte-offset slots, and draws one
//! full-screen rectangle through the raymarch pipeline each frame, with a
//! HUD overlay composed on top.
//!
//! # Invariants
//! - The uniform block is reflected once at program load; slot offsets stay
//!   valid for the program's lifetime.
//! - The fragment shader entirely determines pixel color; host code treats
//!   it as opaque beyond WGSL validation and uniform-name reflection.
//! - Shader release happens before context release.

mod backend;
mod gpu;
mod overlay;
mod shader;

pub use backend::{RaymarchProgram, WgpuBackend};
pub use gpu::{Gpu, GpuError};
pub use shader::{ShaderError, ShaderStage, Stage, UniformBlock, UniformSlot};
