//! wgpu backend for the renderer host.
//!
//! - `context` owns instance/device/surface wiring and rebuilds the swapchain
//!   when the window resizes.
//! - `pipeline` instantiates a [`crate::ShaderProgram`] as a render pipeline
//!   with one uniform bind group and the quad vertex buffer.
//! - `uniforms` mirrors the injected ShaderToy block; values land at the
//!   offsets reflected during linking.
//! - `graphics` implements [`crate::GraphicsContext`] on top of the rest.

mod context;
mod graphics;
mod pipeline;
mod uniforms;

pub use graphics::GpuGraphics;
