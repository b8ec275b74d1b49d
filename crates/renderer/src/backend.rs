//! The seam between scene logic and a concrete graphics API.
//!
//! A [`Frame`] is an ordered list of [`DrawCommand`]s. The scene builds one per
//! tick and hands it to a [`GraphicsBackend`], which owns every GPU object and
//! refers to them through opaque, non-zero handles.

use std::fmt;
use std::num::NonZeroU32;

use glam::Mat4;
use image::RgbImage;

use crate::geometry::BoxVertex;

/// Opaque identifier of an uploaded fragment program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderHandle(NonZeroU32);

/// Opaque identifier of an uploaded texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(NonZeroU32);

macro_rules! handle_impl {
    ($name:ident) => {
        impl $name {
            /// Wraps the `index`-th allocation (zero based) as a handle.
            pub fn from_index(index: usize) -> Self {
                let raw = u32::try_from(index + 1).unwrap_or(u32::MAX);
                Self(NonZeroU32::new(raw).unwrap_or(NonZeroU32::MAX))
            }

            /// Zero-based allocation slot this handle refers to.
            pub fn index(self) -> usize {
                (self.0.get() - 1) as usize
            }

            pub fn get(self) -> u32 {
                self.0.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

handle_impl!(ShaderHandle);
handle_impl!(TextureHandle);

/// Pipeline stage a program source targets.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgramKind {
    Fragment,
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Program text handed to the backend for compilation.
#[derive(Clone, Debug)]
pub struct ProgramSource {
    pub kind: ProgramKind,
    pub label: String,
    pub text: String,
}

/// Sampling parameters attached to an uploaded texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureSampling {
    pub repeat: bool,
    pub linear: bool,
}

impl Default for TextureSampling {
    /// Repeat on both axes, linear magnification and minification.
    fn default() -> Self {
        Self {
            repeat: true,
            linear: true,
        }
    }
}

/// One step of the per-frame draw sequence. Order is significant.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear { color: bool, depth: bool },
    SetModelView(Mat4),
    SetColor([f32; 4]),
    BindTexture(TextureHandle),
    EnableProgram,
    BindProgram(ShaderHandle),
    Quads(Vec<BoxVertex>),
    DisableProgram,
    Present,
}

/// Ordered command list describing a single frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) -> &mut Self {
        self.commands.push(command);
        self
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{kind} program '{label}' failed to compile: {message}")]
    Compile {
        kind: ProgramKind,
        label: String,
        message: String,
    },
    #[error("{kind} programs are not supported by this backend")]
    UnsupportedProgram { kind: ProgramKind },
    #[error("texture is {width}x{height} but the device limit is {max_dimension}")]
    TextureTooLarge {
        width: u32,
        height: u32,
        max_dimension: u32,
    },
    #[error("unknown shader handle {0}")]
    UnknownShader(ShaderHandle),
    #[error("unknown texture handle {0}")]
    UnknownTexture(TextureHandle),
    #[error("frame issued quads before binding a texture")]
    NoTextureBound,
    #[error("surface error: {0:?}")]
    Surface(wgpu::SurfaceError),
}

impl From<wgpu::SurfaceError> for BackendError {
    fn from(value: wgpu::SurfaceError) -> Self {
        BackendError::Surface(value)
    }
}

impl BackendError {
    pub fn as_surface_error(&self) -> Option<&wgpu::SurfaceError> {
        match self {
            BackendError::Surface(err) => Some(err),
            _ => None,
        }
    }
}

/// Graphics API the scene renders through.
pub trait GraphicsBackend {
    /// Compiles and uploads a program, returning a handle valid for the
    /// backend's lifetime.
    fn create_program(&mut self, source: &ProgramSource) -> Result<ShaderHandle, BackendError>;

    /// Uploads an 8-bit RGB image as a 2D texture.
    fn create_texture(
        &mut self,
        image: &RgbImage,
        sampling: TextureSampling,
    ) -> Result<TextureHandle, BackendError>;

    /// Largest texture edge the backend accepts, if it is bounded.
    fn max_texture_dimension(&self) -> Option<u32> {
        None
    }

    /// Executes a frame's commands in order.
    fn submit(&mut self, frame: &Frame) -> Result<(), BackendError>;
}
