use bytemuck::{Pod, Zeroable};
use chrono::{Datelike, Local, Timelike};
use tracing::warn;

use crate::compile::{UniformLocation, UniformValue};
use crate::types::SurfaceSize;

pub(crate) const CHANNEL_COUNT: usize = 4;

/// CPU mirror of the `ShaderParams` block declared in `compile::HEADER`.
///
/// `iResolution` and `iTime` are written through reflected
/// [`UniformLocation`]s; the remaining ShaderToy inputs are kept up to date
/// for shaders that read them.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug)]
pub(crate) struct ShaderUniforms {
    pub i_resolution: [f32; 3],
    pub i_time: f32,
    pub i_time_delta: f32,
    pub i_frame_rate: f32,
    pub i_frame: i32,
    pub i_padding0: f32,
    pub i_mouse: [f32; 4],
    pub i_date: [f32; 4],
    pub i_channel_time: [[f32; 4]; CHANNEL_COUNT],
    pub i_channel_resolution: [[f32; 4]; CHANNEL_COUNT],
}

unsafe impl Zeroable for ShaderUniforms {}
unsafe impl Pod for ShaderUniforms {}

impl ShaderUniforms {
    pub fn new(size: SurfaceSize) -> Self {
        let mut uniforms = Self {
            i_resolution: [size.width as f32, size.height as f32, 1.0],
            i_time: 0.0,
            i_time_delta: 0.0,
            i_frame_rate: 0.0,
            i_frame: 0,
            i_padding0: 0.0,
            i_mouse: [0.0; 4],
            i_date: [0.0; 4],
            i_channel_time: [[0.0; 4]; CHANNEL_COUNT],
            i_channel_resolution: [[0.0; 4]; CHANNEL_COUNT],
        };
        uniforms.refresh_date();
        uniforms
    }

    /// Writes `value` at the reflected byte offset.
    pub fn write(&mut self, location: UniformLocation, value: UniformValue) {
        let start = location.offset as usize;
        let bytes = bytemuck::bytes_of_mut(self);
        let (target, source): (Option<&mut [u8]>, &[u8]) = match &value {
            UniformValue::Vec2(v) => (bytes.get_mut(start..start + 8), bytemuck::cast_slice(v)),
            UniformValue::Float(v) => (bytes.get_mut(start..start + 4), bytemuck::bytes_of(v)),
        };
        match target {
            Some(target) => target.copy_from_slice(source),
            None => warn!(?location, "uniform location outside the uniform block"),
        }
    }

    /// Updates the bookkeeping uniforms after `iTime` has been written.
    pub fn advance_frame(&mut self, clock: &mut FrameClock) {
        self.i_time_delta = clock
            .last_time
            .map(|last| (self.i_time - last).max(0.0))
            .unwrap_or(0.0);
        self.i_frame_rate = if self.i_time_delta > 0.0 {
            1.0 / self.i_time_delta
        } else {
            0.0
        };
        self.i_frame = clock.frame.min(i32::MAX as u64) as i32;
        for channel in &mut self.i_channel_time {
            channel[0] = self.i_time;
        }
        clock.last_time = Some(self.i_time);
        clock.frame = clock.frame.saturating_add(1);
        self.refresh_date();
    }

    fn refresh_date(&mut self) {
        let local_now = Local::now();
        let seconds_since_midnight = local_now.num_seconds_from_midnight() as f32
            + local_now.nanosecond() as f32 / 1_000_000_000.0;
        self.i_date = [
            local_now.year() as f32,
            local_now.month() as f32,
            local_now.day() as f32,
            seconds_since_midnight,
        ];
    }
}

#[derive(Debug, Default)]
pub(crate) struct FrameClock {
    last_time: Option<f32>,
    frame: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{ProgramSource, ShaderProgram, UniformSlot};
    use std::mem::{align_of, size_of};

    /// Sanity-checks that the CPU mirror of the uniform block matches the
    /// layout baked into the GLSL header.
    #[test]
    fn shader_uniforms_follow_std140_layout() {
        let uniforms = ShaderUniforms::new(SurfaceSize::new(1920, 1080));
        let base = &uniforms as *const _ as usize;

        assert_eq!(align_of::<ShaderUniforms>(), 16);
        assert_eq!(size_of::<ShaderUniforms>(), 192);
        assert_eq!((&uniforms.i_resolution as *const _ as usize) - base, 0);
        assert_eq!((&uniforms.i_time as *const _ as usize) - base, 12);
        assert_eq!((&uniforms.i_frame as *const _ as usize) - base, 24);
        assert_eq!((&uniforms.i_mouse as *const _ as usize) - base, 32);
        assert_eq!((&uniforms.i_date as *const _ as usize) - base, 48);
        assert_eq!((&uniforms.i_channel_time as *const _ as usize) - base, 64);
        assert_eq!(
            (&uniforms.i_channel_resolution as *const _ as usize) - base,
            128
        );
    }

    #[test]
    fn reflected_locations_write_the_matching_fields() {
        let program = ShaderProgram::build(&ProgramSource::pattern()).expect("program");
        let locations = program.uniforms();
        let mut uniforms = ShaderUniforms::new(SurfaceSize::new(1, 1));

        uniforms.write(locations.resolution, UniformValue::Vec2([640.0, 480.0]));
        uniforms.write(locations.time, UniformValue::Float(3.25));

        assert_eq!(uniforms.i_resolution, [640.0, 480.0, 1.0]);
        assert_eq!(uniforms.i_time, 3.25);
    }

    #[test]
    fn out_of_range_location_is_ignored() {
        let mut uniforms = ShaderUniforms::new(SurfaceSize::new(4, 4));
        let before = uniforms;
        uniforms.write(
            UniformLocation {
                slot: UniformSlot::Time,
                offset: 4096,
            },
            UniformValue::Float(1.0),
        );
        assert_eq!(bytemuck::bytes_of(&before), bytemuck::bytes_of(&uniforms));
    }

    #[test]
    fn advance_frame_tracks_delta_and_frame_index() {
        let mut uniforms = ShaderUniforms::new(SurfaceSize::new(4, 4));
        let mut clock = FrameClock::default();

        uniforms.i_time = 1.0;
        uniforms.advance_frame(&mut clock);
        assert_eq!(uniforms.i_frame, 0);
        assert_eq!(uniforms.i_time_delta, 0.0);

        uniforms.i_time = 1.5;
        uniforms.advance_frame(&mut clock);
        assert_eq!(uniforms.i_frame, 1);
        assert!((uniforms.i_time_delta - 0.5).abs() < 1e-6);
        assert!((uniforms.i_frame_rate - 2.0).abs() < 1e-4);
        assert_eq!(uniforms.i_channel_time[2][0], 1.5);
    }
}
