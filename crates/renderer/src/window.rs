use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Fullscreen, Window, WindowBuilder};

use crate::error::HostError;
use crate::gpu::GpuGraphics;
use crate::host::{DrawSurface, Host};
use crate::runtime::{time_source_for_policy, FrameScheduler, StopHandle};
use crate::types::{ColorSpaceMode, Presentation, RendererConfig, SurfaceSize};

const WINDOW_TITLE: &str = "fractalglow";

/// A winit window as a [`DrawSurface`].
///
/// `schedule_next_frame` only raises a flag; the event loop turns it into a
/// redraw request once the frame scheduler allows it.
pub struct WindowSurface {
    window: Arc<Window>,
    size: SurfaceSize,
    color_space: ColorSpaceMode,
    frame_requested: Cell<bool>,
}

impl WindowSurface {
    pub fn new(window: Arc<Window>, color_space: ColorSpaceMode) -> Self {
        let inner = window.inner_size();
        Self {
            window,
            size: SurfaceSize::new(inner.width, inner.height),
            color_space,
            // The first frame is due as soon as the loop starts.
            frame_requested: Cell::new(true),
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn frame_requested(&self) -> bool {
        self.frame_requested.get()
    }

    fn take_frame_request(&self) -> bool {
        self.frame_requested.replace(false)
    }
}

impl DrawSurface for WindowSurface {
    type Context = GpuGraphics;

    fn acquire_context(&mut self) -> Result<GpuGraphics, HostError> {
        GpuGraphics::new(self.window.clone(), self.size, self.color_space).map_err(|err| {
            HostError::ContextUnavailable {
                reason: format!("{err:#}"),
            }
        })
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn set_size(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn schedule_next_frame(&mut self) {
        self.frame_requested.set(true);
    }
}

/// Opens the window, brings the host up and runs the winit event loop until
/// the window closes, the stop handle fires or the frame limit is reached.
///
/// Returns the number of frames drawn.
pub(crate) fn run_window(config: &RendererConfig, stop: StopHandle) -> Result<u64> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let requested = config.surface_size;
    let window = WindowBuilder::new()
        .with_title(WINDOW_TITLE)
        .with_inner_size(PhysicalSize::new(
            requested.width.max(1),
            requested.height.max(1),
        ))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);
    if config.presentation == Presentation::Fullscreen {
        request_fullscreen(&window);
    }

    let mut host = Host::new(WindowSurface::new(window, config.color_space));
    host.initialize()
        .context("failed to initialise renderer host")?;

    let mut scheduler = FrameScheduler::new(config.policy.target_fps());
    let mut time = time_source_for_policy(&config.policy);
    let frame_limit = config.frame_limit;

    let failure: Rc<RefCell<Option<HostError>>> = Rc::new(RefCell::new(None));
    let frames = Rc::new(Cell::new(0u64));
    let loop_failure = failure.clone();
    let loop_frames = frames.clone();

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == host.surface().window().id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    tracing::info!("window closed");
                    elwt.exit();
                }
                WindowEvent::Resized(new_size) => {
                    host.resize(new_size.width, new_size.height);
                }
                WindowEvent::RedrawRequested => {
                    if stop.is_stopped() {
                        elwt.exit();
                        return;
                    }
                    let sample = time.sample();
                    match host.tick(sample.seconds) {
                        Ok(()) => {
                            scheduler.mark_rendered(Instant::now());
                            loop_frames.set(host.frames_rendered());
                            tracing::trace!(
                                frame = sample.frame_index,
                                seconds = sample.seconds,
                                "presented frame"
                            );
                            if frame_limit.is_some_and(|limit| host.frames_rendered() >= limit) {
                                tracing::debug!("frame limit reached");
                                elwt.exit();
                            }
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "frame failed; stopping");
                            *loop_failure.borrow_mut() = Some(err);
                            elwt.exit();
                        }
                    }
                }
                _ => {}
            }
        }
        Event::AboutToWait => {
            if stop.is_stopped() {
                elwt.exit();
                return;
            }
            let now = Instant::now();
            if !host.surface().frame_requested() {
                elwt.set_control_flow(ControlFlow::Wait);
            } else if scheduler.ready_for_frame(now) {
                host.surface().take_frame_request();
                host.surface().window().request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            } else if let Some(deadline) = scheduler.next_deadline() {
                tracing::trace!(
                    wait_ms = deadline.saturating_duration_since(now).as_millis(),
                    "waiting for next frame"
                );
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            }
        }
        Event::LoopExiting => host.shutdown(),
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))?;
    if let Some(err) = failure.borrow_mut().take() {
        return Err(err).context("renderer stopped");
    }
    Ok(frames.get())
}

/// Borderless fullscreen on the current monitor. Platforms may refuse; the
/// window then stays at its requested size.
fn request_fullscreen(window: &Window) {
    window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    if window.fullscreen().is_none() {
        tracing::debug!("fullscreen request declined; staying windowed");
    }
}
