//! Renderer host for the fractalglow pattern.
//!
//! The crate compiles the pattern shader, owns the drawing surface and drives
//! the per-frame loop. The overall flow is:
//!
//! ```text
//!   CLI / fractalglow
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ Host<S: DrawSurface> ──▶ tick(elapsed) ──▶ GraphicsContext::draw
//!          │                   ▲                                     │
//!          │                   └──── resize / schedule_next_frame ◀──┘
//!          ├─ Fullscreen / Windowed: winit event loop + wgpu (`window`, `gpu`)
//!          └─ Headless: FrameLoop + rayon software rasterizer (`software`)
//! ```
//!
//! Both backends go through [`ShaderProgram::build`], so a malformed shader is
//! reported the same way with or without a GPU. The software backend stands in
//! for the fragment stage with [`kernel::evaluate`], the CPU twin of the GLSL
//! pattern.

mod compile;
mod error;
mod gpu;
mod headless;
mod host;
mod runtime;
mod software;
mod types;
mod window;

use anyhow::Result;
use tracing::info;

pub use compile::{
    ProgramSource, ShaderProgram, UniformLocation, UniformLocations, UniformSlot, UniformValue,
    FULLSCREEN_QUAD, VERTEX_SHADER_GLSL,
};
pub use error::{HostError, ShaderStageKind};
pub use gpu::GpuGraphics;
pub use headless::{run_headless, HeadlessReport, MAX_HEADLESS_DIMENSION};
pub use host::{DrawSurface, FrameLoop, GraphicsContext, Host, HostState};
pub use runtime::{
    time_source_for_policy, BoxedTimeSource, FixedTimeSource, FrameScheduler, RenderPolicy,
    StopHandle, SystemTimeSource, TimeSample, TimeSource,
};
pub use software::{Framebuffer, SoftwareContext, SoftwareSurface};
pub use types::{ColorSpaceMode, Presentation, RendererConfig, SurfaceSize};
pub use window::WindowSurface;

/// Entry point that picks a backend for the configured presentation.
pub struct Renderer {
    config: RendererConfig,
    stop: StopHandle,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            stop: StopHandle::new(),
        }
    }

    /// Handle that ends [`Renderer::run`] at the next tick boundary.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Blocks until the renderer stops and returns the number of frames drawn.
    pub fn run(&self) -> Result<u64> {
        info!(
            presentation = ?self.config.presentation,
            size = %self.config.surface_size,
            policy = ?self.config.policy,
            "starting renderer"
        );
        match self.config.presentation {
            Presentation::Headless => {
                run_headless(&self.config, self.stop.clone()).map(|report| report.frames)
            }
            Presentation::Fullscreen | Presentation::Windowed => {
                window::run_window(&self.config, self.stop.clone())
            }
        }
    }
}
