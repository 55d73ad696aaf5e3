use raymark_driver::Hud;

/// Non-interactive text overlay: a label in the bottom-right corner and a
/// live FPS counter in the top-left, drawn in the default (unshaded)
/// pipeline after the raymarch pass.
///
/// egui runs from a synthesized input each frame; no window events are
/// consumed, so no winit bridge is involved.
pub struct Overlay {
    ctx: egui::Context,
    renderer: egui_wgpu::Renderer,
}

impl Overlay {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        // The overlay draws on the resolved (single-sample) surface view.
        let renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);
        Self {
            ctx: egui::Context::default(),
            renderer,
        }
    }

    /// Compose the overlay onto `view` with a load (not clear) pass.
    pub fn paint(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        width: u32,
        height: u32,
        pixels_per_point: f32,
        hud: &Hud<'_>,
    ) {
        let screen = egui::vec2(
            width as f32 / pixels_per_point,
            height as f32 / pixels_per_point,
        );
        let mut raw_input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(egui::Pos2::ZERO, screen)),
            ..Default::default()
        };
        raw_input
            .viewports
            .entry(egui::ViewportId::ROOT)
            .or_default()
            .native_pixels_per_point = Some(pixels_per_point);

        let label = hud.label.to_owned();
        let fps = hud.fps;
        let full_output = self.ctx.run(raw_input, |ctx| {
            egui::Area::new(egui::Id::new("hud_fps"))
                .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 10.0))
                .show(ctx, |ui| {
                    ui.label(
                        egui::RichText::new(format!("{fps:.0} FPS"))
                            .color(egui::Color32::from_rgb(0, 228, 48))
                            .size(18.0),
                    );
                });
            egui::Area::new(egui::Id::new("hud_label"))
                .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-10.0, -6.0))
                .show(ctx, |ui| {
                    ui.label(
                        egui::RichText::new(&label)
                            .color(egui::Color32::DARK_GRAY)
                            .size(12.0),
                    );
                });
        });

        let paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }
        self.renderer
            .update_buffers(device, queue, encoder, &paint_jobs, &screen_descriptor);

        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("hud_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}
