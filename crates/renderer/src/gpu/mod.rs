//! wgpu implementation of [`GraphicsBackend`](crate::backend::GraphicsBackend).
//!
//! - `context` owns instance/device/surface wiring, resolves capabilities and
//!   knows how to rebuild swapchain state when the window resizes.
//! - `textures` uploads decoded images and their samplers.
//! - `pipeline` turns a compiled fragment stage into a depth-tested pipeline
//!   sharing one vertex stage and layout.
//! - `uniforms` mirrors the GLSL uniform block and builds the projection.
//! - `state` interprets frames and exposes `GpuState` to `window`.

mod context;
mod pipeline;
mod state;
mod textures;
mod uniforms;

pub(crate) use state::GpuState;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;
