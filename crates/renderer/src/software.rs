//! CPU backend: evaluates a [`PixelKernel`] for every pixel of an in-memory
//! framebuffer.
//!
//! Rows are handed to the rayon pool; each task writes only its own row, so
//! no synchronisation is needed beyond the join at the end of `draw`.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use kernel::{Color, FrameContext, PixelKernel, Vec2};
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::compile::{ShaderProgram, UniformLocation, UniformSlot, UniformValue};
use crate::error::HostError;
use crate::host::{DrawSurface, GraphicsContext};
use crate::types::SurfaceSize;

/// Row-major pixel grid; row 0 is the top of the image.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    size: SurfaceSize,
    pixels: Vec<Color>,
}

impl Framebuffer {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            pixels: vec![Color::BLACK; size.pixel_count()],
        }
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.size.width as usize + x as usize)
            .copied()
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Quantised RGBA8 bytes, saturating over-bright glow.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|pixel| pixel.to_rgba8()).collect()
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        let image =
            image::RgbaImage::from_raw(self.size.width, self.size.height, self.to_rgba8())
                .ok_or_else(|| anyhow!("framebuffer size does not match pixel data"))?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        debug!(path = %path.display(), size = %self.size, "wrote framebuffer snapshot");
        Ok(())
    }
}

/// Offscreen surface backed by [`SoftwareContext`].
#[derive(Debug, Clone)]
pub struct SoftwareSurface {
    size: SurfaceSize,
    kernel: PixelKernel,
    scheduled_frames: u64,
    available: bool,
}

impl SoftwareSurface {
    /// Surface drawing the glow pattern.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_kernel(width, height, kernel::evaluate)
    }

    pub fn with_kernel(width: u32, height: u32, kernel: PixelKernel) -> Self {
        Self {
            size: SurfaceSize::new(width, height),
            kernel,
            scheduled_frames: 0,
            available: true,
        }
    }

    /// A surface that refuses to hand out a context, like a canvas on a
    /// platform without the requested API.
    pub fn unavailable(width: u32, height: u32) -> Self {
        Self {
            available: false,
            ..Self::new(width, height)
        }
    }

    /// How many times the host asked for another frame.
    pub fn scheduled_frames(&self) -> u64 {
        self.scheduled_frames
    }
}

impl DrawSurface for SoftwareSurface {
    type Context = SoftwareContext;

    fn acquire_context(&mut self) -> Result<SoftwareContext, HostError> {
        if !self.available {
            return Err(HostError::ContextUnavailable {
                reason: "software surface has no drawing context".to_string(),
            });
        }
        Ok(SoftwareContext::new(self.kernel, self.size))
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn set_size(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn schedule_next_frame(&mut self) {
        self.scheduled_frames += 1;
    }
}

/// The software "GPU": holds uniform values and the framebuffer.
#[derive(Debug)]
pub struct SoftwareContext {
    kernel: PixelKernel,
    framebuffer: Framebuffer,
    resolution: [f32; 2],
    time: f32,
    linked: bool,
    quad_vertices: usize,
}

impl SoftwareContext {
    fn new(kernel: PixelKernel, size: SurfaceSize) -> Self {
        Self {
            kernel,
            framebuffer: Framebuffer::new(size),
            resolution: [size.width as f32, size.height as f32],
            time: 0.0,
            linked: false,
            quad_vertices: 0,
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Uniform values as of the last `set_uniform` calls.
    pub fn frame_context(&self) -> FrameContext {
        FrameContext {
            resolution: Vec2::new(self.resolution[0], self.resolution[1]),
            time: self.time,
        }
    }
}

impl GraphicsContext for SoftwareContext {
    fn link_program(&mut self, program: &ShaderProgram) -> Result<(), HostError> {
        // The program has already been validated; the CPU kernel stands in
        // for its fragment stage.
        trace!(
            entry_points = program.fragment_module().entry_points.len(),
            "software backend linked program"
        );
        self.linked = true;
        Ok(())
    }

    fn upload_quad(&mut self, vertices: &[[f32; 2]]) {
        self.quad_vertices = vertices.len();
    }

    fn configure(&mut self, size: SurfaceSize) {
        if self.framebuffer.size() != size {
            self.framebuffer = Framebuffer::new(size);
        }
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        match (location.slot, value) {
            (UniformSlot::Resolution, UniformValue::Vec2(resolution)) => {
                self.resolution = resolution
            }
            (UniformSlot::Time, UniformValue::Float(time)) => self.time = time,
            (slot, value) => {
                debug!(?slot, ?value, "ignoring uniform write with mismatched type")
            }
        }
    }

    fn clear(&mut self) {
        self.framebuffer.fill(Color::BLACK);
    }

    fn draw(&mut self) -> Result<(), HostError> {
        if !self.linked || self.quad_vertices < 4 {
            return Err(HostError::Surface {
                reason: "draw issued before the program and quad were uploaded".to_string(),
            });
        }

        let size = self.framebuffer.size();
        if size.is_empty() {
            return Ok(());
        }

        let ctx = self.frame_context();
        let kernel = self.kernel;
        let width = size.width as usize;
        let height = size.height as f32;
        self.framebuffer
            .pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, line)| {
                // Bottom-left origin, sampled at pixel centres.
                let y = height - row as f32 - 0.5;
                for (column, pixel) in line.iter_mut().enumerate() {
                    *pixel = kernel(Vec2::new(column as f32 + 0.5, y), &ctx);
                }
            });
        Ok(())
    }
}
