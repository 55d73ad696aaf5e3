use std::path::Path;
use std::sync::Arc;

use glam::Mat4;
use raymark_driver::{Hud, RenderBackend};
use tracing::{debug, error, warn};
use winit::window::Window;

use crate::gpu::Gpu;
use crate::overlay::Overlay;
use crate::shader::{ShaderError, ShaderStage, Stage, UniformBlock, UniformSlot};

/// Compiled shader program: render pipeline, reflected uniform block, and
/// the uniform buffer backing it. Loaded once at startup, released once at
/// shutdown.
pub struct RaymarchProgram {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: Option<wgpu::Buffer>,
    bind_group: Option<wgpu::BindGroup>,
    block: UniformBlock,
}

impl RaymarchProgram {
    /// Load the vertex/fragment WGSL pair from disk and build the pipeline.
    /// Any failure here is fatal; there is no retry path.
    ///
    /// The fragment's uniform block (if any) must live at group 0; its
    /// members are resolved by name, and names the host never finds are a
    /// valid configuration.
    pub fn load(gpu: &Gpu, vertex_path: &Path, fragment_path: &Path) -> Result<Self, ShaderError> {
        let vertex = ShaderStage::load(vertex_path, Stage::Vertex)?;
        let fragment = ShaderStage::load(fragment_path, Stage::Fragment)?;
        let block = UniformBlock::from_module(fragment.module());
        debug!(
            vertex = %vertex.path().display(),
            fragment = %fragment.path().display(),
            uniform_block_size = block.size(),
            "shader program loaded"
        );

        let vertex_module = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("fullscreen_vertex"),
                source: wgpu::ShaderSource::Wgsl(vertex.source().into()),
            });
        let fragment_module = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("raymarch_fragment"),
                source: wgpu::ShaderSource::Wgsl(fragment.source().into()),
            });

        let mut uniform_layout = None;
        let mut uniform_buffer = None;
        let mut bind_group = None;

        if !block.is_empty() {
            let binding = block.binding().map(|(_, b)| b).unwrap_or(0);
            let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("raymarch_uniforms"),
                size: block.size(),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            let layout = gpu
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("raymarch_uniform_layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });

            bind_group = Some(gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("raymarch_uniform_bind_group"),
                layout: &layout,
                entries: &[wgpu::BindGroupEntry {
                    binding,
                    resource: buffer.as_entire_binding(),
                }],
            }));
            uniform_buffer = Some(buffer);
            uniform_layout = Some(layout);
        }

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = uniform_layout.iter().collect();
        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("raymarch_pipeline_layout"),
                bind_group_layouts: &bind_group_layouts,
                push_constant_ranges: &[],
            });

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("raymarch_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some(vertex.entry_point()),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: Some(fragment.entry_point()),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: gpu.sample_count,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            });

        Ok(Self {
            pipeline,
            uniform_buffer,
            bind_group,
            block,
        })
    }

    pub fn block(&self) -> &UniformBlock {
        &self.block
    }

    fn write(&self, queue: &wgpu::Queue, slot: UniformSlot, bytes: &[u8]) {
        let Some(buffer) = &self.uniform_buffer else {
            return;
        };
        if slot.size as usize != bytes.len() {
            warn!(
                expected = slot.size,
                got = bytes.len(),
                "uniform size mismatch, skipping upload"
            );
            return;
        }
        queue.write_buffer(buffer, slot.offset, bytes);
    }
}

/// wgpu implementation of the driver's backend seam.
///
/// Holds the context, the program, and the overlay as owned options so the
/// ordered teardown (`release_shader` then `release_context`) maps onto
/// drops, and both calls are idempotent no-ops afterwards.
pub struct WgpuBackend {
    window: Arc<Window>,
    gpu: Option<Gpu>,
    program: Option<RaymarchProgram>,
    overlay: Option<Overlay>,
    msaa_target: Option<wgpu::TextureView>,
    clear_color: wgpu::Color,
}

impl WgpuBackend {
    pub fn new(window: Arc<Window>, gpu: Gpu, program: RaymarchProgram) -> Self {
        let overlay = Overlay::new(&gpu.device, gpu.config.format);
        let msaa_target = Self::create_msaa_target(&gpu);
        Self {
            window,
            gpu: Some(gpu),
            program: Some(program),
            overlay: Some(overlay),
            msaa_target,
            clear_color: wgpu::Color {
                r: 0.96,
                g: 0.96,
                b: 0.96,
                a: 1.0,
            },
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(gpu) = &mut self.gpu {
            gpu.resize(width, height);
        }
        if let Some(gpu) = &self.gpu {
            self.msaa_target = Self::create_msaa_target(gpu);
        }
    }

    fn create_msaa_target(gpu: &Gpu) -> Option<wgpu::TextureView> {
        if gpu.sample_count <= 1 {
            return None;
        }
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa_target"),
            size: wgpu::Extent3d {
                width: gpu.config.width,
                height: gpu.config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: gpu.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Some(texture.create_view(&Default::default()))
    }
}

impl RenderBackend for WgpuBackend {
    type Slot = UniformSlot;

    fn resolve_uniform(&mut self, name: &str) -> Option<UniformSlot> {
        self.program.as_ref().and_then(|p| p.block().resolve(name))
    }

    fn write_mat4(&mut self, slot: Option<UniformSlot>, value: Mat4) {
        let (Some(slot), Some(gpu), Some(program)) = (slot, &self.gpu, &self.program) else {
            return;
        };
        program.write(
            &gpu.queue,
            slot,
            bytemuck::bytes_of(&value.to_cols_array_2d()),
        );
    }

    fn write_f32(&mut self, slot: Option<UniformSlot>, value: f32) {
        let (Some(slot), Some(gpu), Some(program)) = (slot, &self.gpu, &self.program) else {
            return;
        };
        program.write(&gpu.queue, slot, bytemuck::bytes_of(&value));
    }

    fn draw(&mut self, hud: &Hud<'_>) {
        let (Some(gpu), Some(program)) = (&self.gpu, &self.program) else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                error!("surface error: {e}");
                return;
            }
        };

        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        // Shader binding is scoped to this pass; it ends (unbinds) before
        // the overlay draws in the default pipeline.
        {
            let (attachment, resolve_target) = match &self.msaa_target {
                Some(msaa) => (msaa, Some(&surface_view)),
                None => (&surface_view, None),
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("raymarch_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            pass.set_pipeline(&program.pipeline);
            if let Some(bind_group) = &program.bind_group {
                pass.set_bind_group(0, bind_group, &[]);
            }
            // Full-screen rectangle, two triangles, no vertex buffers.
            pass.draw(0..6, 0..1);
        }

        if let Some(overlay) = &mut self.overlay {
            overlay.paint(
                &gpu.device,
                &gpu.queue,
                &mut encoder,
                &surface_view,
                gpu.config.width,
                gpu.config.height,
                self.window.scale_factor() as f32,
                hud,
            );
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    fn release_shader(&mut self) {
        if self.program.take().is_some() {
            debug!("shader program released");
        }
    }

    fn release_context(&mut self) {
        self.overlay = None;
        self.msaa_target = None;
        if self.gpu.take().is_some() {
            debug!("GPU context released");
        }
    }
}
