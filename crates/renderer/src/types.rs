use std::fmt;
use std::path::PathBuf;

use crate::runtime::RenderPolicy;

/// Surface dimensions in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero; nothing can be drawn.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<(u32, u32)> for SurfaceSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

/// Output color handling for the GPU swapchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceMode {
    /// Match WebGL canvases: shader output is written as-is (gamma-encoded).
    #[default]
    Auto,
    /// Treat shader outputs as gamma-encoded; use non-sRGB surfaces.
    Gamma,
    /// Treat shader outputs as linear and let an sRGB swapchain encode them.
    Linear,
}

/// Where frames end up.
///
/// * `Fullscreen` opens a window and asks the platform for borderless
///   fullscreen (best effort).
/// * `Windowed` keeps a regular desktop window of `surface_size`.
/// * `Headless` renders with the software rasterizer and never opens a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presentation {
    #[default]
    Fullscreen,
    Windowed,
    Headless,
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors CLI flags; the default reproduces the plain
/// behaviour of starting immediately in fullscreen and animating forever.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window or framebuffer size in physical pixels.
    pub surface_size: SurfaceSize,
    /// Presentation target.
    pub presentation: Presentation,
    /// Animate or freeze time, plus the optional FPS cap.
    pub policy: RenderPolicy,
    /// Desired color handling for the swapchain.
    pub color_space: ColorSpaceMode,
    /// Stop after this many frames; `None` runs until the window closes.
    pub frame_limit: Option<u64>,
    /// Headless only: write the last rendered frame to this PNG.
    pub snapshot: Option<PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: SurfaceSize::new(1920, 1080),
            presentation: Presentation::default(),
            policy: RenderPolicy::default(),
            color_space: ColorSpaceMode::default(),
            frame_limit: None,
            snapshot: None,
        }
    }
}
