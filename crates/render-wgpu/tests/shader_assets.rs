//! Validates the shipped WGSL assets against the host's uniform contract.

use std::path::{Path, PathBuf};

use raymark_driver::{FOV_UNIFORM, VIEW_INVERSE_UNIFORM};
use raymark_render_wgpu::{ShaderStage, Stage, UniformBlock};

fn asset(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../shaders")
        .join(name)
}

#[test]
fn fullscreen_vertex_stage_compiles() {
    let stage = ShaderStage::load(&asset("fullscreen.wgsl"), Stage::Vertex)
        .expect("vertex asset loads and validates");
    assert_eq!(stage.entry_point(), "vs_main");
}

#[test]
fn raymarch_fragment_stage_compiles() {
    let stage = ShaderStage::load(&asset("raymarch.wgsl"), Stage::Fragment)
        .expect("fragment asset loads and validates");
    assert_eq!(stage.entry_point(), "fs_main");
}

#[test]
fn raymarch_fragment_declares_the_driver_uniforms() {
    let stage = ShaderStage::load(&asset("raymarch.wgsl"), Stage::Fragment)
        .expect("fragment asset loads and validates");
    let block = UniformBlock::from_module(stage.module());

    let view_inv = block
        .resolve(VIEW_INVERSE_UNIFORM)
        .expect("inverse view matrix uniform present");
    assert_eq!(view_inv.offset, 0);
    assert_eq!(view_inv.size, 64);

    let fov = block.resolve(FOV_UNIFORM).expect("fov uniform present");
    assert_eq!(fov.offset, 64);
    assert_eq!(fov.size, 4);

    assert_eq!(block.binding(), Some((0, 0)));
}

#[test]
fn vertex_asset_has_no_fragment_entry() {
    let err = ShaderStage::load(&asset("fullscreen.wgsl"), Stage::Fragment).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("entry point"), "unexpected error: {message}");
}
