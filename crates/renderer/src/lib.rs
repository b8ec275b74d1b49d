//! Renderer crate for litbox, a lit textured box demo.
//!
//! The crate separates what is drawn from how it reaches the GPU:
//!
//! ```text
//!   CLI / litbox
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ window::run_window ──▶ winit event loop
//!                                │
//!                                ├─▶ Scene::init ──▶ load_shader / load_texture
//!                                └─▶ Scene::cycle ──▶ Animator::tick ──▶ build_frame
//!                                                                          │ Frame
//!                                                                          ▼
//!                                                           GraphicsBackend::submit (GpuState)
//! ```
//!
//! [`Scene`] owns the animation state and the two asset handles and turns
//! them into an ordered [`Frame`] of [`DrawCommand`]s. Anything implementing
//! [`GraphicsBackend`] can execute that frame; the `wgpu` implementation
//! lives in the private `gpu` module and is only reachable through the window
//! loop. Everything above the backend is plain data, so the scene, animator
//! and loaders run headless as well.

pub mod assets;
pub mod backend;
pub mod capabilities;
mod compile;
pub mod geometry;
mod gpu;
pub mod pcx;
pub mod runtime;
pub mod scene;
mod types;
mod window;

use anyhow::Result;

pub use assets::{
    decode_texture, decode_texture_with_info, load_placeholder_texture, load_shader, load_texture,
    DecodeError, DecodedTexture, ShaderLoadError, TextureLoadError,
};
pub use backend::{
    BackendError, DrawCommand, Frame, GraphicsBackend, ProgramKind, ProgramSource, ShaderHandle,
    TextureHandle, TextureSampling,
};
pub use capabilities::{Capabilities, Capability, CapabilityProbe, MissingCapability};
pub use pcx::{
    decode_pcx, decode_pcx_with_header, read_pcx, read_pcx_with_header, PcxError, PcxHeader,
};
pub use runtime::{BoxedTickSource, SteppedTickSource, SystemTickSource, TickSource};
pub use scene::{build_frame, Animator, Scene, SceneAssets, SceneError, SceneState};
pub use types::{
    Antialiasing, AssetPaths, ColorSpaceMode, MissingTexturePolicy, RendererConfig,
    DEFAULT_SHADER_PATH, DEFAULT_SURFACE_SIZE, DEFAULT_TEXTURE_PATH,
};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    /// Builds a renderer for the supplied configuration.
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the window and renders until it is closed.
    ///
    /// Returns an error if the GPU lacks a required capability, if either
    /// asset fails to load, or if rendering fails for a reason other than a
    /// transient surface loss.
    pub fn run(&self) -> Result<()> {
        window::run_window(self.config.clone())
    }
}
