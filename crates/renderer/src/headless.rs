use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::host::{DrawSurface, FrameLoop, Host};
use crate::runtime::{time_source_for_policy, FrameScheduler, StopHandle};
use crate::software::SoftwareSurface;
use crate::types::{RendererConfig, SurfaceSize};

/// Largest framebuffer edge the software backend accepts, matching the
/// common `max_texture_dimension_2d` of desktop GPUs.
pub const MAX_HEADLESS_DIMENSION: u32 = 16_384;

/// Outcome of a headless run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessReport {
    pub frames: u64,
    pub size: SurfaceSize,
}

/// Renders with the software backend until the frame limit or stop handle
/// ends the loop, then writes the snapshot if one was requested.
pub fn run_headless(config: &RendererConfig, stop: StopHandle) -> Result<HeadlessReport> {
    let size = config.surface_size;
    if size.width > MAX_HEADLESS_DIMENSION || size.height > MAX_HEADLESS_DIMENSION {
        bail!(
            "requested size {size} exceeds the software renderer limit of {MAX_HEADLESS_DIMENSION}px per side"
        );
    }
    let mut host = Host::new(SoftwareSurface::new(size.width, size.height));
    host.initialize()
        .context("failed to initialise software renderer")?;

    let mut time = time_source_for_policy(&config.policy);
    let mut frame_loop = FrameLoop::new(FrameScheduler::new(config.policy.target_fps()), stop)
        .with_frame_limit(config.frame_limit);
    let ticks = frame_loop
        .run(&mut host, time.as_mut())
        .context("headless frame loop failed")?;

    if let Some(path) = &config.snapshot {
        if host.frames_rendered() == 0 {
            warn!("no frame was rendered; snapshot will be black");
        }
        match host.context() {
            Some(context) => context.framebuffer().save_png(path)?,
            None => warn!(path = %path.display(), "renderer is not running; snapshot skipped"),
        }
    }

    let report = HeadlessReport {
        frames: host.frames_rendered(),
        size: host.surface().size(),
    };
    host.shutdown();
    info!(ticks, frames = report.frames, size = %report.size, "headless run finished");
    Ok(report)
}
