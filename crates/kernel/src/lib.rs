//! Pattern kernel for fractalglow.
//!
//! Everything the renderer draws comes from one pure function,
//! [`evaluate`], that maps a pixel coordinate and a [`FrameContext`] to a
//! [`Color`]. The same algorithm ships twice:
//!
//! ```text
//!   evaluate()            ── CPU, f32, used by the software backend and tests
//!   PATTERN_SHADER_GLSL   ── ShaderToy-style `mainImage`, compiled by the GPU backend
//! ```
//!
//! Both follow the same steps: normalise the coordinate against the shorter
//! axis, fold it three times into a repeating tile, and accumulate thin
//! glowing rings tinted by a cosine palette that drifts with time.

mod math;
mod pattern;
mod shader;

pub use math::{fract, Color, Vec2};
pub use pattern::{
    evaluate, palette_argument, CosinePalette, FrameContext, PixelKernel, FOLD_SCALE,
    GLOW_PALETTE, GLOW_STRENGTH, ITERATIONS, MIN_RING_DIVISOR, PALETTE_RATE, RING_FREQUENCY,
};
pub use shader::PATTERN_SHADER_GLSL;
