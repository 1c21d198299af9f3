//! Renderer host: lifecycle, per-tick uniforms and the frame loop.
//!
//! ```text
//!   Uninitialized ──initialize()──▶ Running ──shutdown()──▶ ShutDown
//!         │                            │
//!         └──── error ─────▶ Failed    └── tick() / resize() (repeat)
//! ```

use std::fmt;
use std::thread;
use std::time::Instant;

use tracing::{debug, info, trace};

use crate::compile::{
    ProgramSource, ShaderProgram, UniformLocation, UniformLocations, UniformValue, FULLSCREEN_QUAD,
};
use crate::error::HostError;
use crate::runtime::{FrameScheduler, StopHandle, TimeSource};
use crate::types::SurfaceSize;

/// Something the host can draw on: a window, a canvas, an offscreen buffer.
pub trait DrawSurface {
    type Context: GraphicsContext;

    /// Acquires a drawing context. Called once per host.
    fn acquire_context(&mut self) -> Result<Self::Context, HostError>;

    /// Current dimensions in device pixels.
    fn size(&self) -> SurfaceSize;

    fn set_size(&mut self, size: SurfaceSize);

    /// Requests another tick at the next display refresh.
    fn schedule_next_frame(&mut self);
}

/// Backend operations the host issues. Mirrors the handful of GL calls the
/// pattern needs: build a program, upload the quad, set uniforms, clear, draw.
pub trait GraphicsContext {
    fn link_program(&mut self, program: &ShaderProgram) -> Result<(), HostError>;

    fn upload_quad(&mut self, vertices: &[[f32; 2]]);

    /// Reallocates size-dependent resources (swapchain, framebuffer).
    fn configure(&mut self, size: SurfaceSize);

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    fn clear(&mut self);

    /// One full-viewport draw of the quad.
    fn draw(&mut self) -> Result<(), HostError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Uninitialized,
    Running,
    Failed,
    ShutDown,
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostState::Uninitialized => f.write_str("uninitialized"),
            HostState::Running => f.write_str("running"),
            HostState::Failed => f.write_str("failed"),
            HostState::ShutDown => f.write_str("shut down"),
        }
    }
}

struct Running<C> {
    context: C,
    uniforms: UniformLocations,
    configured: SurfaceSize,
}

/// Owns a surface and everything needed to draw the pattern on it.
pub struct Host<S: DrawSurface> {
    surface: S,
    source: ProgramSource,
    state: HostState,
    running: Option<Running<S::Context>>,
    frames: u64,
}

impl<S: DrawSurface> Host<S> {
    /// Host drawing the glow pattern.
    pub fn new(surface: S) -> Self {
        Self::with_program(surface, ProgramSource::pattern())
    }

    pub fn with_program(surface: S, source: ProgramSource) -> Self {
        Self {
            surface,
            source,
            state: HostState::Uninitialized,
            running: None,
            frames: 0,
        }
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn context(&self) -> Option<&S::Context> {
        self.running.as_ref().map(|running| &running.context)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Acquires the context, builds the program, uploads the quad and
    /// resolves uniform locations. Any failure is terminal.
    pub fn initialize(&mut self) -> Result<(), HostError> {
        match self.state {
            HostState::Uninitialized => {}
            HostState::Running => return Ok(()),
            state => return Err(HostError::NotRunning { state }),
        }

        match self.bring_up() {
            Ok(running) => {
                info!(size = %running.configured, "renderer host running");
                self.running = Some(running);
                self.state = HostState::Running;
                Ok(())
            }
            Err(err) => {
                debug!(error = %err, "renderer host failed to initialise");
                self.state = HostState::Failed;
                Err(err)
            }
        }
    }

    fn bring_up(&mut self) -> Result<Running<S::Context>, HostError> {
        let mut context = self.surface.acquire_context()?;
        let program = ShaderProgram::build(&self.source)?;
        context.link_program(&program)?;
        context.upload_quad(&FULLSCREEN_QUAD);
        let size = self.surface.size();
        context.configure(size);
        Ok(Running {
            context,
            uniforms: program.uniforms(),
            configured: size,
        })
    }

    /// Renders one frame at `elapsed_seconds` and schedules the next one.
    pub fn tick(&mut self, elapsed_seconds: f32) -> Result<(), HostError> {
        let state = self.state;
        let Some(running) = self.running.as_mut() else {
            return Err(HostError::NotRunning { state });
        };

        let size = self.surface.size();
        if size != running.configured {
            debug!(from = %running.configured, to = %size, "reconfiguring for new surface size");
            running.context.configure(size);
            running.configured = size;
        }

        if size.is_empty() {
            trace!("surface has no area; skipping draw");
        } else {
            let context = &mut running.context;
            context.set_uniform(
                running.uniforms.resolution,
                UniformValue::Vec2([size.width as f32, size.height as f32]),
            );
            context.set_uniform(running.uniforms.time, UniformValue::Float(elapsed_seconds));
            context.clear();
            context.draw()?;
            self.frames += 1;
        }

        self.surface.schedule_next_frame();
        Ok(())
    }

    /// Updates the surface dimensions; the next tick picks them up.
    pub fn resize(&mut self, width: u32, height: u32) {
        let size = SurfaceSize::new(width, height);
        if size != self.surface.size() {
            debug!(%size, "surface resized");
            self.surface.set_size(size);
        }
    }

    /// Releases the context. Later ticks return [`HostError::NotRunning`].
    pub fn shutdown(&mut self) {
        if self.running.take().is_some() {
            info!(frames = self.frames, "renderer host shut down");
        }
        if self.state != HostState::Failed {
            self.state = HostState::ShutDown;
        }
    }
}

/// Drives [`Host::tick`] until stopped.
///
/// The stop handle and frame limit are only consulted between ticks; with
/// neither set the loop runs forever.
pub struct FrameLoop {
    scheduler: FrameScheduler,
    stop: StopHandle,
    frame_limit: Option<u64>,
}

impl FrameLoop {
    pub fn new(scheduler: FrameScheduler, stop: StopHandle) -> Self {
        Self {
            scheduler,
            stop,
            frame_limit: None,
        }
    }

    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }

    /// Returns the number of ticks executed.
    pub fn run<S: DrawSurface>(
        &mut self,
        host: &mut Host<S>,
        time: &mut dyn TimeSource,
    ) -> Result<u64, HostError> {
        let mut ticks = 0u64;
        loop {
            if self.stop.is_stopped() {
                debug!(ticks, "frame loop stopped");
                break;
            }
            if self.frame_limit.is_some_and(|limit| ticks >= limit) {
                debug!(ticks, "frame limit reached");
                break;
            }

            if let Some(deadline) = self.scheduler.next_deadline() {
                let now = Instant::now();
                if deadline > now {
                    thread::sleep(deadline - now);
                }
            }

            let sample = time.sample();
            host.tick(sample.seconds)?;
            self.scheduler.mark_rendered(Instant::now());
            ticks += 1;
        }
        Ok(ticks)
    }
}
