use std::sync::Arc;

use anyhow::Result;
use winit::window::Window;

use crate::compile::{ShaderProgram, UniformLocation, UniformValue};
use crate::error::HostError;
use crate::host::GraphicsContext;
use crate::types::{ColorSpaceMode, SurfaceSize};

use super::context::GpuContext;
use super::pipeline::{create_quad_buffer, QuadPipeline};
use super::uniforms::{FrameClock, ShaderUniforms};

/// [`GraphicsContext`] backed by a wgpu swapchain on a winit window.
pub struct GpuGraphics {
    // Declared before `_window` so the surface is dropped first.
    context: GpuContext,
    pipeline: Option<QuadPipeline>,
    quad: Option<(wgpu::Buffer, u32)>,
    uniforms: ShaderUniforms,
    clock: FrameClock,
    clear_pending: bool,
    _window: Arc<Window>,
}

impl GpuGraphics {
    pub(crate) fn new(
        window: Arc<Window>,
        size: SurfaceSize,
        color_space: ColorSpaceMode,
    ) -> Result<Self> {
        let context = GpuContext::new(window.as_ref(), size, color_space)?;
        tracing::info!(
            format = ?context.surface_format,
            color_space = ?context.color_space,
            %size,
            "GPU context ready"
        );
        Ok(Self {
            context,
            pipeline: None,
            quad: None,
            uniforms: ShaderUniforms::new(size),
            clock: FrameClock::default(),
            clear_pending: false,
            _window: window,
        })
    }

    /// Acquires the next swapchain texture. `Ok(None)` means the frame should
    /// be skipped.
    fn acquire_frame(&mut self) -> Result<Option<wgpu::SurfaceTexture>, HostError> {
        match self.context.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("swapchain lost or outdated; reconfiguring");
                self.context.reconfigure();
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("timed out acquiring swapchain texture; skipping frame");
                Ok(None)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(HostError::Surface {
                reason: "out of memory while acquiring swapchain texture".to_string(),
            }),
            Err(other) => {
                tracing::warn!(error = %other, "failed to acquire swapchain texture; skipping frame");
                Ok(None)
            }
        }
    }
}

impl GraphicsContext for GpuGraphics {
    fn link_program(&mut self, program: &ShaderProgram) -> Result<(), HostError> {
        let pipeline = QuadPipeline::new(
            &self.context.device,
            program,
            self.context.surface_format,
        )?;
        self.pipeline = Some(pipeline);
        Ok(())
    }

    fn upload_quad(&mut self, vertices: &[[f32; 2]]) {
        let buffer = create_quad_buffer(&self.context.device, vertices);
        self.quad = Some((buffer, vertices.len() as u32));
    }

    fn configure(&mut self, size: SurfaceSize) {
        if size != self.context.size {
            self.context.resize(size);
        }
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        self.uniforms.write(location, value);
    }

    fn clear(&mut self) {
        self.clear_pending = true;
    }

    fn draw(&mut self) -> Result<(), HostError> {
        if self.pipeline.is_none() || self.quad.is_none() {
            return Err(HostError::Surface {
                reason: "draw issued before the program and quad were uploaded".to_string(),
            });
        }
        let Some(frame) = self.acquire_frame()? else {
            return Ok(());
        };
        let (Some(pipeline), Some((quad, vertex_count))) = (&self.pipeline, &self.quad) else {
            return Ok(());
        };

        self.uniforms.advance_frame(&mut self.clock);
        self.context.queue.write_buffer(
            &pipeline.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.uniforms),
        );

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let load = if std::mem::take(&mut self.clear_pending) {
            wgpu::LoadOp::Clear(wgpu::Color::BLACK)
        } else {
            wgpu::LoadOp::Load
        };

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("pattern encoder"),
                });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("pattern pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&pipeline.pipeline);
            pass.set_bind_group(0, &pipeline.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, quad.slice(..));
            pass.draw(0..*vertex_count, 0..1);
        }

        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
