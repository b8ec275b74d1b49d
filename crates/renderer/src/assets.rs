//! Loading the scene's two assets: one fragment program and one wall texture.

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::backend::{
    BackendError, GraphicsBackend, ProgramKind, ProgramSource, ShaderHandle, TextureHandle,
    TextureSampling,
};
use crate::pcx::{self, PcxError, PcxHeader};

#[derive(Debug, thiserror::Error)]
pub enum ShaderLoadError {
    #[error("failed to read shader {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shader {path} is empty")]
    Empty { path: PathBuf },
    #[error("failed to compile shader {path}")]
    Compile {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum TextureLoadError {
    #[error("failed to decode texture {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
    #[error("failed to upload texture {path}")]
    Upload {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
}

/// Decoder-specific failure behind [`TextureLoadError::Decode`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Pcx(#[from] PcxError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Reads the program at `path` and uploads it to `backend`.
///
/// The whole file is read regardless of size. Files that are empty, contain
/// only whitespace or are not UTF-8 are rejected before the backend sees them.
pub fn load_shader<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    kind: ProgramKind,
    path: &Path,
) -> Result<ShaderHandle, ShaderLoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| ShaderLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Err(ShaderLoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    let source = ProgramSource {
        kind,
        label: path.display().to_string(),
        text,
    };
    let handle = backend
        .create_program(&source)
        .map_err(|source| ShaderLoadError::Compile {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!(
        path = %path.display(),
        %kind,
        bytes = source.text.len(),
        %handle,
        "loaded shader program"
    );
    Ok(handle)
}

/// Decodes the image at `path` and uploads it as a repeating, linearly
/// filtered texture.
///
/// Nothing is allocated on the backend when decoding fails.
pub fn load_texture<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    path: &Path,
) -> Result<TextureHandle, TextureLoadError> {
    let image = decode_texture(path).map_err(|source| TextureLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let (width, height) = image.dimensions();

    let handle = upload_texture(backend, &image).map_err(|source| TextureLoadError::Upload {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %path.display(), width, height, %handle, "loaded texture");
    Ok(handle)
}

/// Uploads a 1x1 opaque white texture.
pub fn load_placeholder_texture<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
) -> Result<TextureHandle, BackendError> {
    upload_texture(backend, &placeholder_image())
}

/// A decoded texture and, for PCX files, the header it was decoded from.
#[derive(Debug, Clone)]
pub struct DecodedTexture {
    pub image: RgbImage,
    pub pcx_header: Option<PcxHeader>,
}

/// Decodes a texture file into 8-bit RGB. `.pcx` files go through the
/// built-in decoder; anything else is handed to the `image` crate.
pub fn decode_texture(path: &Path) -> Result<RgbImage, DecodeError> {
    decode_texture_with_info(path).map(|decoded| decoded.image)
}

/// Like [`decode_texture`], keeping the PCX header when there is one.
pub fn decode_texture_with_info(path: &Path) -> Result<DecodedTexture, DecodeError> {
    if is_pcx(path) {
        let (header, image) = pcx::read_pcx_with_header(path)?;
        return Ok(DecodedTexture {
            image,
            pcx_header: Some(header),
        });
    }
    Ok(DecodedTexture {
        image: image::open(path)?.to_rgb8(),
        pcx_header: None,
    })
}

pub(crate) fn placeholder_image() -> RgbImage {
    RgbImage::from_pixel(1, 1, image::Rgb([255, 255, 255]))
}

fn upload_texture<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    image: &RgbImage,
) -> Result<TextureHandle, BackendError> {
    if let Some(max_dimension) = backend.max_texture_dimension() {
        let (width, height) = image.dimensions();
        if width > max_dimension || height > max_dimension {
            return Err(BackendError::TextureTooLarge {
                width,
                height,
                max_dimension,
            });
        }
    }
    backend.create_texture(image, TextureSampling::default())
}

fn is_pcx(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pcx"))
}
