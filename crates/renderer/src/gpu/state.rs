use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::compile::PreparedShader;
use crate::render_loop::{DrawTarget, Viewport};
use crate::types::{GpuPowerPreference, SetupError};
use crate::uniforms::UniformBlock;

use super::context::GpuContext;
use super::pipeline::QuadPipeline;

/// Owns the device, surface and quad pipeline for the window.
pub(crate) struct GpuState {
    context: GpuContext,
    quad: QuadPipeline,
}

impl GpuState {
    pub(crate) fn new(
        window: Arc<Window>,
        size: PhysicalSize<u32>,
        power: GpuPowerPreference,
        vsync: bool,
        shader: &PreparedShader,
    ) -> Result<Self, SetupError> {
        let context = GpuContext::new(window, size, power, vsync)?;
        let quad = QuadPipeline::new(&context.device, context.surface_format, shader)?;
        Ok(Self { context, quad })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }
}

impl DrawTarget for GpuState {
    type Error = wgpu::SurfaceError;

    fn draw(&mut self, uniforms: &UniformBlock, viewport: Viewport) -> Result<(), Self::Error> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.context
            .queue
            .write_buffer(&self.quad.uniform_buffer, 0, bytemuck::bytes_of(uniforms));

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            // the viewport may briefly lead the configured surface during a resize
            let width = viewport.width.min(self.context.config.width).max(1);
            let height = viewport.height.min(self.context.config.height).max(1);
            render_pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
            render_pass.set_pipeline(&self.quad.pipeline);
            render_pass.set_bind_group(0, &self.quad.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.quad.vertex_buffer.slice(..));
            render_pass.draw(0..4, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
