use std::sync::atomic::{AtomicUsize, Ordering};

use kernel::{Color, FrameContext, Vec2};
use renderer::{
    DrawSurface, FixedTimeSource, FrameLoop, FrameScheduler, Host, HostError, HostState,
    ProgramSource, ShaderStageKind, SoftwareSurface, StopHandle, SurfaceSize,
};

static COUNTED_CALLS: AtomicUsize = AtomicUsize::new(0);
static OUT_OF_RANGE: AtomicUsize = AtomicUsize::new(0);

fn counting_kernel(coord: Vec2, ctx: &FrameContext) -> Color {
    COUNTED_CALLS.fetch_add(1, Ordering::Relaxed);
    let inside = coord.x >= 0.0
        && coord.y >= 0.0
        && coord.x < ctx.resolution.x
        && coord.y < ctx.resolution.y;
    if !inside {
        OUT_OF_RANGE.fetch_add(1, Ordering::Relaxed);
    }
    Color::BLACK
}

#[test]
fn each_tick_evaluates_every_pixel_once() {
    let mut host = Host::new(SoftwareSurface::with_kernel(7, 5, counting_kernel));
    host.initialize().expect("initialize");

    host.tick(0.0).expect("first tick");
    assert_eq!(COUNTED_CALLS.load(Ordering::Relaxed), 35);
    host.tick(0.5).expect("second tick");
    assert_eq!(COUNTED_CALLS.load(Ordering::Relaxed), 70);
    assert_eq!(OUT_OF_RANGE.load(Ordering::Relaxed), 0);
}

static RESIZE_CALLS: AtomicUsize = AtomicUsize::new(0);

fn resize_kernel(_coord: Vec2, ctx: &FrameContext) -> Color {
    RESIZE_CALLS.fetch_add(1, Ordering::Relaxed);
    Color::new(ctx.resolution.x, ctx.resolution.y, ctx.time)
}

#[test]
fn resize_between_ticks_changes_resolution() {
    let mut host = Host::new(SoftwareSurface::with_kernel(4, 4, resize_kernel));
    host.initialize().expect("initialize");
    host.tick(1.0).expect("tick at 4x4");
    assert_eq!(RESIZE_CALLS.load(Ordering::Relaxed), 16);

    host.resize(3, 2);
    host.tick(2.0).expect("tick at 3x2");
    assert_eq!(RESIZE_CALLS.load(Ordering::Relaxed), 22);

    let context = host.context().expect("running");
    let framebuffer = context.framebuffer();
    assert_eq!(framebuffer.size(), SurfaceSize::new(3, 2));
    assert_eq!(framebuffer.pixels().len(), 6);
    assert_eq!(framebuffer.pixel(2, 1), Some(Color::new(3.0, 2.0, 2.0)));
    assert_eq!(context.frame_context().resolution, Vec2::new(3.0, 2.0));
}

static BOUNDED_CALLS: AtomicUsize = AtomicUsize::new(0);
static BOUNDED_OUT_OF_RANGE: AtomicUsize = AtomicUsize::new(0);

fn bounded_kernel(coord: Vec2, ctx: &FrameContext) -> Color {
    BOUNDED_CALLS.fetch_add(1, Ordering::Relaxed);
    let inside = (0.0..ctx.resolution.x).contains(&coord.x)
        && (0.0..ctx.resolution.y).contains(&coord.y);
    if !inside {
        BOUNDED_OUT_OF_RANGE.fetch_add(1, Ordering::Relaxed);
    }
    Color::BLACK
}

#[test]
fn coordinates_stay_in_range_across_resizes() {
    let mut host = Host::new(SoftwareSurface::with_kernel(5, 3, bounded_kernel));
    host.initialize().expect("initialize");
    host.tick(0.0).expect("tick at 5x3");

    for (step, (width, height)) in [(1, 7), (0, 7), (9, 1)].into_iter().enumerate() {
        host.resize(width, height);
        host.tick(step as f32 + 1.0).expect("tick after resize");
        assert_eq!(host.surface().size(), SurfaceSize::new(width, height));
    }

    // 5x3 + 1x7 + 0x7 + 9x1; the zero-area frame evaluates nothing.
    assert_eq!(BOUNDED_CALLS.load(Ordering::Relaxed), 31);
    assert_eq!(BOUNDED_OUT_OF_RANGE.load(Ordering::Relaxed), 0);
}

#[test]
fn glow_pattern_matches_reference_pixel() {
    // A 2x2 surface samples pixel centres; the bottom-left pixel sits at
    // (0.5, 0.5) and the top-right at (1.5, 1.5).
    let mut host = Host::new(SoftwareSurface::new(2, 2));
    host.initialize().expect("initialize");
    host.tick(0.0).expect("tick");

    let ctx = FrameContext::new(2, 2, 0.0);
    let framebuffer = host.context().expect("running").framebuffer();
    let bottom_left = framebuffer.pixel(0, 1).expect("pixel");
    let top_right = framebuffer.pixel(1, 0).expect("pixel");
    assert_eq!(bottom_left, kernel::evaluate(Vec2::new(0.5, 0.5), &ctx));
    assert_eq!(top_right, kernel::evaluate(Vec2::new(1.5, 1.5), &ctx));
    assert!(framebuffer.pixels().iter().all(|pixel| pixel.is_finite()));
}

#[test]
fn malformed_shader_fails_initialisation() {
    let source = ProgramSource::with_fragment("void mainImage(out vec4 c, in vec2 p) { c = ; }");
    let mut host = Host::with_program(SoftwareSurface::new(4, 4), source);

    match host.initialize() {
        Err(HostError::ShaderCompile { stage, log }) => {
            assert_eq!(stage, ShaderStageKind::Fragment);
            assert!(!log.is_empty());
        }
        other => panic!("expected a compile error, got {other:?}"),
    }
    assert_eq!(host.state(), HostState::Failed);
    assert!(matches!(
        host.tick(0.0),
        Err(HostError::NotRunning {
            state: HostState::Failed
        })
    ));
}

#[test]
fn unavailable_surface_reports_context_error() {
    let mut host = Host::new(SoftwareSurface::unavailable(4, 4));
    let err = host.initialize().expect_err("no context");
    assert!(matches!(err, HostError::ContextUnavailable { .. }));
    assert!(err.to_string().contains("drawing context unavailable"));
    assert_eq!(host.state(), HostState::Failed);
}

#[test]
fn every_tick_schedules_the_next_frame() {
    let mut host = Host::new(SoftwareSurface::new(3, 3));
    host.initialize().expect("initialize");
    for step in 0..4 {
        host.tick(step as f32 * 0.1).expect("tick");
    }
    assert_eq!(host.surface().scheduled_frames(), 4);
    assert_eq!(host.frames_rendered(), 4);
}

#[test]
fn shutdown_refuses_further_ticks() {
    let mut host = Host::new(SoftwareSurface::new(2, 2));
    host.initialize().expect("initialize");
    host.tick(0.0).expect("tick");
    host.shutdown();

    assert_eq!(host.state(), HostState::ShutDown);
    assert!(matches!(
        host.tick(0.1),
        Err(HostError::NotRunning {
            state: HostState::ShutDown
        })
    ));
    assert_eq!(host.surface().size(), SurfaceSize::new(2, 2));
}

#[test]
fn frame_loop_runs_until_limit() {
    let mut host = Host::new(SoftwareSurface::new(4, 2));
    host.initialize().expect("initialize");
    let mut time = FixedTimeSource::new(1.25);

    let ticks = FrameLoop::new(FrameScheduler::new(None), StopHandle::new())
        .with_frame_limit(Some(5))
        .run(&mut host, &mut time)
        .expect("frame loop");

    assert_eq!(ticks, 5);
    assert_eq!(host.surface().scheduled_frames(), 5);
    assert_eq!(host.context().expect("running").frame_context().time, 1.25);
}

#[test]
fn stopped_handle_ends_loop_before_first_tick() {
    let mut host = Host::new(SoftwareSurface::new(2, 2));
    host.initialize().expect("initialize");
    let stop = StopHandle::new();
    let mut time = FixedTimeSource::new(0.0);
    let mut frame_loop = FrameLoop::new(FrameScheduler::new(None), stop.clone());

    stop.stop();
    assert_eq!(frame_loop.run(&mut host, &mut time).expect("loop"), 0);
    assert_eq!(host.frames_rendered(), 0);
}
