use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default location of the fragment program, relative to the working directory.
pub const DEFAULT_SHADER_PATH: &str = "assets/shader.frag";
/// Default location of the wall texture, relative to the working directory.
pub const DEFAULT_TEXTURE_PATH: &str = "assets/texture.pcx";
/// Default window size in physical pixels.
pub const DEFAULT_SURFACE_SIZE: (u32, u32) = (800, 600);

/// Output color handling for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceMode {
    /// Prefer a gamma-encoded swapchain, matching how the texture art was authored.
    #[default]
    Auto,
    /// Treat program outputs and textures as gamma-encoded; use non-sRGB surfaces.
    Gamma,
    /// Treat program outputs as linear and use sRGB swapchains/textures for conversion.
    Linear,
}

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

/// What to do when the wall texture cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingTexturePolicy {
    /// Abort initialisation with the decode error.
    #[default]
    Fail,
    /// Log the error and continue with a 1x1 white texture.
    Placeholder,
}

impl fmt::Display for MissingTexturePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingTexturePolicy::Fail => f.write_str("fail"),
            MissingTexturePolicy::Placeholder => f.write_str("placeholder"),
        }
    }
}

impl FromStr for MissingTexturePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fail" | "error" => Ok(MissingTexturePolicy::Fail),
            "placeholder" | "white" => Ok(MissingTexturePolicy::Placeholder),
            other => Err(format!(
                "unknown missing-texture policy '{other}'; expected 'fail' or 'placeholder'"
            )),
        }
    }
}

/// Asset files the scene loads at start-up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetPaths {
    /// Fragment program source.
    pub shader: PathBuf,
    /// Wall texture (PCX, or any format the `image` crate decodes).
    pub texture: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            shader: PathBuf::from(DEFAULT_SHADER_PATH),
            texture: PathBuf::from(DEFAULT_TEXTURE_PATH),
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors CLI flags and the optional scene file: which assets
/// to load, how large the window should be and how to configure the surface.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Program and texture files.
    pub assets: AssetPaths,
    /// Behaviour when the texture fails to decode.
    pub missing_texture: MissingTexturePolicy,
    /// Anti-aliasing mode requested by the caller.
    pub antialiasing: Antialiasing,
    /// Desired color handling for swapchain/textures.
    pub color_space: ColorSpaceMode,
    /// Window title.
    pub title: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: DEFAULT_SURFACE_SIZE,
            assets: AssetPaths::default(),
            missing_texture: MissingTexturePolicy::default(),
            antialiasing: Antialiasing::default(),
            color_space: ColorSpaceMode::default(),
            title: String::from("litbox"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_bundled_assets() {
        let config = RendererConfig::default();
        assert_eq!(config.surface_size, (800, 600));
        assert_eq!(config.assets.shader, PathBuf::from("assets/shader.frag"));
        assert_eq!(config.assets.texture, PathBuf::from("assets/texture.pcx"));
        assert_eq!(config.missing_texture, MissingTexturePolicy::Fail);
    }

    #[test]
    fn missing_texture_policy_parses_aliases() {
        assert_eq!("Placeholder".parse(), Ok(MissingTexturePolicy::Placeholder));
        assert_eq!("white".parse(), Ok(MissingTexturePolicy::Placeholder));
        assert_eq!("fail".parse(), Ok(MissingTexturePolicy::Fail));
        assert!("maybe".parse::<MissingTexturePolicy>().is_err());
    }
}
