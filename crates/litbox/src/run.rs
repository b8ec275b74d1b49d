use anyhow::{Context, Result};
use renderer::{Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::config::{self, SceneSettings};
use crate::paths;

pub fn run(args: RunArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    tracing::info!(
        shader = %config.assets.shader.display(),
        texture = %config.assets.texture.display(),
        width = config.surface_size.0,
        height = config.surface_size.1,
        antialias = ?config.antialiasing,
        color_space = ?config.color_space,
        missing_texture = %config.missing_texture,
        "starting litbox"
    );
    Renderer::new(config).run()
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the renderer configuration. Flags win over the scene file, which
/// wins over built-in defaults.
pub fn resolve_config(args: &RunArgs) -> Result<RendererConfig> {
    let settings = match args.config.as_ref() {
        Some(path) => config::load(path)
            .with_context(|| format!("failed to load scene file {}", path.display()))?,
        None => {
            let path = paths::default_scene_file()?;
            tracing::debug!(path = %path.display(), "looking for scene file");
            config::load_or_default(&path)?
        }
    };
    Ok(merge(args, settings))
}

fn merge(args: &RunArgs, settings: SceneSettings) -> RendererConfig {
    let mut config = RendererConfig::default();

    if let Some(shader) = args.shader.clone().or(settings.shader) {
        config.assets.shader = shader;
    }
    if let Some(texture) = args.texture.clone().or(settings.texture) {
        config.assets.texture = texture;
    }
    if let Some(size) = args.size.or(settings.size) {
        config.surface_size = size;
    }
    if let Some(title) = settings.title {
        config.title = title;
    }
    if let Some(antialias) = args.antialias.or(settings.antialias) {
        config.antialiasing = antialias;
    }
    if let Some(color_space) = args.color_space.or(settings.color_space) {
        config.color_space = color_space;
    }
    if let Some(policy) = args.missing_texture.or(settings.missing_texture) {
        config.missing_texture = policy;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::{Antialiasing, ColorSpaceMode, MissingTexturePolicy};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_flags_or_file() {
        let config = merge(&RunArgs::default(), SceneSettings::default());
        assert_eq!(config.surface_size, (800, 600));
        assert_eq!(config.assets.shader, PathBuf::from("assets/shader.frag"));
        assert_eq!(config.assets.texture, PathBuf::from("assets/texture.pcx"));
        assert_eq!(config.title, "litbox");
    }

    #[test]
    fn flags_override_scene_file() {
        let args = RunArgs {
            shader: Some(PathBuf::from("cli.frag")),
            size: Some((320, 240)),
            ..RunArgs::default()
        };
        let settings = SceneSettings {
            shader: Some(PathBuf::from("file.frag")),
            texture: Some(PathBuf::from("file.pcx")),
            size: Some((1024, 768)),
            antialias: Some(Antialiasing::Off),
            color_space: Some(ColorSpaceMode::Linear),
            missing_texture: Some(MissingTexturePolicy::Placeholder),
            title: Some("from file".into()),
        };

        let config = merge(&args, settings);
        assert_eq!(config.assets.shader, PathBuf::from("cli.frag"));
        assert_eq!(config.assets.texture, PathBuf::from("file.pcx"));
        assert_eq!(config.surface_size, (320, 240));
        assert_eq!(config.antialiasing, Antialiasing::Off);
        assert_eq!(config.color_space, ColorSpaceMode::Linear);
        assert_eq!(config.missing_texture, MissingTexturePolicy::Placeholder);
        assert_eq!(config.title, "from file");
    }

    #[test]
    fn explicit_scene_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let args = RunArgs {
            config: Some(dir.path().join("missing.toml")),
            ..RunArgs::default()
        };
        assert!(resolve_config(&args).is_err());

        let path = dir.path().join("scene.toml");
        fs::write(&path, "texture = \"wall.pcx\"\n").unwrap();
        let args = RunArgs {
            config: Some(path),
            ..RunArgs::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.assets.texture, dir.path().join("wall.pcx"));
    }
}
