use crate::math::{Color, Vec2};

/// Number of tile folds applied per pixel.
pub const ITERATIONS: usize = 3;
/// Scale applied before each fold; larger values nest the tiles more tightly.
pub const FOLD_SCALE: f32 = 1.5;
/// Rate at which the palette phase advances, in palette units per second.
pub const PALETTE_RATE: f32 = 0.4;
/// Angular frequency of the rings inside each tile.
pub const RING_FREQUENCY: f32 = 8.0;
/// Numerator of the inverse ring falloff; sets ring thickness.
pub const GLOW_STRENGTH: f32 = 0.02;
/// Floor applied to the ring divisor so the glow spike stays finite.
///
/// Matches `1.17549435e-38` in [`crate::PATTERN_SHADER_GLSL`].
pub const MIN_RING_DIVISOR: f32 = f32::MIN_POSITIVE;

// Same truncated constant as the GLSL source, not `TAU`.
const TWO_PI: f32 = 6.28318;

/// Immutable per-frame inputs shared by every pixel evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Surface size in pixels.
    pub resolution: Vec2,
    /// Seconds since the animation started.
    pub time: f32,
}

impl FrameContext {
    pub fn new(width: u32, height: u32, time: f32) -> Self {
        Self {
            resolution: Vec2::new(width as f32, height as f32),
            time,
        }
    }
}

/// Signature shared by every per-pixel kernel. Plain function pointers keep
/// kernels stateless and trivially `Send + Sync`.
pub type PixelKernel = fn(Vec2, &FrameContext) -> Color;

/// `base + amplitude * cos(2π * (frequency * t + phase))`, per channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosinePalette {
    pub base: [f32; 3],
    pub amplitude: [f32; 3],
    pub frequency: [f32; 3],
    pub phase: [f32; 3],
}

impl CosinePalette {
    pub fn sample(&self, t: f32) -> Color {
        let channel = |i: usize| {
            self.base[i]
                + self.amplitude[i] * (TWO_PI * (self.frequency[i] * t + self.phase[i])).cos()
        };
        Color::new(channel(0), channel(1), channel(2))
    }
}

/// Palette used by the glow pattern.
pub const GLOW_PALETTE: CosinePalette = CosinePalette {
    base: [0.2, 0.4, 0.01],
    amplitude: [0.5, 0.3, 0.5],
    frequency: [0.3, 0.1, 0.11],
    phase: [0.263, 0.263, 0.263],
};

/// Scalar fed to the palette: distance of the untransformed coordinate from
/// the centre plus a time drift.
#[inline]
pub fn palette_argument(radius: f32, time: f32) -> f32 {
    radius + time * PALETTE_RATE
}

/// Evaluates the glow pattern for one pixel.
///
/// `coord` is in pixels with a bottom-left origin. The result is unclamped;
/// see [`MIN_RING_DIVISOR`] for how ring singularities are bounded.
pub fn evaluate(coord: Vec2, ctx: &FrameContext) -> Color {
    let mut uv = (coord * 2.0 - ctx.resolution) / ctx.resolution.y;
    let origin_radius = uv.length();
    let falloff = (-origin_radius).exp();
    let tint = GLOW_PALETTE.sample(palette_argument(origin_radius, ctx.time));

    let mut color = Color::BLACK;
    for _ in 0..ITERATIONS {
        uv = (uv * FOLD_SCALE).fract() - 0.5;
        let d = uv.length() * falloff;
        let ring = (d * RING_FREQUENCY + ctx.time).sin().abs() / RING_FREQUENCY;
        let glow = GLOW_STRENGTH / ring.max(MIN_RING_DIVISOR);
        color += tint * glow;
    }
    color
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn centre_of_two_by_two_surface_matches_reference_color() {
        let ctx = FrameContext::new(2, 2, 0.0);
        let color = evaluate(Vec2::new(1.0, 1.0), &ctx);
        assert!(approx(color.r, 0.151_929, 1e-4), "r = {}", color.r);
        assert!(approx(color.g, 0.358_360, 1e-4), "g = {}", color.g);
        assert!(approx(color.b, -0.029_388, 1e-4), "b = {}", color.b);
    }

    #[test]
    fn palette_at_origin_and_time_zero_matches_formula() {
        let color = GLOW_PALETTE.sample(palette_argument(0.0, 0.0));
        assert!(approx(color.r, 0.159_205, 1e-5));
        assert!(approx(color.g, 0.375_523, 1e-5));
        assert!(approx(color.b, -0.030_795, 1e-5));
    }

    #[test]
    fn evaluate_is_deterministic() {
        let ctx = FrameContext::new(1920, 1080, 12.75);
        let samples = [
            Vec2::new(0.5, 0.5),
            Vec2::new(960.5, 540.5),
            Vec2::new(1919.5, 1079.5),
            Vec2::new(123.25, 877.0),
        ];
        for coord in samples {
            let first = evaluate(coord, &ctx);
            for _ in 0..4 {
                assert_eq!(evaluate(coord, &ctx).to_rgba(), first.to_rgba());
            }
        }
    }

    #[test]
    fn palette_argument_advances_one_full_turn_per_period() {
        let period = std::f32::consts::TAU / PALETTE_RATE;
        for (radius, t0) in [(0.0, 0.0), (0.42, 3.5), (1.3, 100.0)] {
            let start = palette_argument(radius, t0);
            let end = palette_argument(radius, t0 + period);
            assert!(approx(end - start, std::f32::consts::TAU, 1e-3));
            let wrapped_start = start.rem_euclid(std::f32::consts::TAU);
            let wrapped_end = end.rem_euclid(std::f32::consts::TAU);
            let diff = (wrapped_end - wrapped_start).abs();
            assert!(diff < 1e-3 || (std::f32::consts::TAU - diff) < 1e-3);
        }
    }

    #[test]
    fn ring_singularity_stays_finite() {
        // uv = (1/3, 1/3) folds exactly onto the tile centre, so the first
        // ring divisor is sin(0) = 0 at time zero.
        let color = evaluate(Vec2::new(4.0, 4.0), &FrameContext::new(6, 6, 0.0));
        assert!(color.is_finite());
        assert!(color.r.abs() > 1.0e30, "expected a glow spike, got {color:?}");
    }

    #[test]
    fn aspect_ratio_is_corrected_against_height() {
        let wide = FrameContext::new(400, 200, 1.0);
        let square = FrameContext::new(200, 200, 1.0);
        // Same offset from the centre in pixels maps to the same uv.
        let a = evaluate(Vec2::new(200.0 + 37.0, 100.0 + 11.0), &wide);
        let b = evaluate(Vec2::new(100.0 + 37.0, 100.0 + 11.0), &square);
        assert!(approx(a.r, b.r, 1e-5) && approx(a.g, b.g, 1e-5) && approx(a.b, b.b, 1e-5));
    }
}
