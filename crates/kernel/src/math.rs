use std::ops::{Add, AddAssign, Div, Mul, Sub};

/// GLSL `fract`: `x - floor(x)`, so negative inputs wrap into `[0, 1)`.
#[inline]
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Two-component float vector with the handful of GLSL operations the
/// kernel needs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn splat(value: f32) -> Self {
        Self { x: value, y: value }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn fract(self) -> Self {
        Self::new(fract(self.x), fract(self.y))
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Sub<f32> for Vec2 {
    type Output = Self;

    fn sub(self, rhs: f32) -> Self {
        Self::new(self.x - rhs, self.y - rhs)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;

    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

/// Linear RGB output of the kernel.
///
/// Channels are nominally in `[0, 1]` but are deliberately left unclamped:
/// the glow rings overshoot and some palette phases dip below zero. Clamping
/// happens only when a frame is quantised for display ([`Color::to_rgba8`]).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Opaque RGBA; alpha is always 1.0.
    pub fn to_rgba(self) -> [f32; 4] {
        [self.r, self.g, self.b, 1.0]
    }

    /// Saturates each channel into `[0, 255]` the way an 8-bit swapchain would.
    pub fn to_rgba8(self) -> [u8; 4] {
        let quantise = |value: f32| {
            if value.is_nan() {
                0
            } else {
                (value.clamp(0.0, 1.0) * 255.0).round() as u8
            }
        };
        [quantise(self.r), quantise(self.g), quantise(self.b), 255]
    }

    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

impl Add for Color {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl AddAssign for Color {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<f32> for Color {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fract_wraps_negative_values_like_glsl() {
        assert!((fract(-0.75) - 0.25).abs() < 1e-6);
        assert!((fract(-0.375) - 0.625).abs() < 1e-6);
        assert_eq!(fract(0.0), 0.0);
        assert!((fract(2.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn to_rgba8_saturates_out_of_range_channels() {
        let color = Color::new(-0.3, 0.5, 1.0e30);
        assert_eq!(color.to_rgba8(), [0, 128, 255, 255]);
        assert_eq!(Color::new(f32::NAN, 0.0, 0.0).to_rgba8()[0], 0);
    }

    #[test]
    fn to_rgba_keeps_alpha_opaque() {
        assert_eq!(Color::new(2.0, 0.0, -1.0).to_rgba(), [2.0, 0.0, -1.0, 1.0]);
    }
}
