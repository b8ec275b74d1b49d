use std::fs;
use std::path::{Path, PathBuf};

use renderer::{Antialiasing, ColorSpaceMode, MissingTexturePolicy};
use serde::Deserialize;
use thiserror::Error;

use crate::cli::{parse_antialias, parse_color_space, parse_missing_texture, parse_size};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scene file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scene file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid `{field}` in scene file {path}: {message}")]
    Invalid {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

/// On-disk form of `scene.toml`. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneFile {
    pub shader: Option<PathBuf>,
    pub texture: Option<PathBuf>,
    pub size: Option<String>,
    pub title: Option<String>,
    pub antialias: Option<String>,
    pub color_space: Option<String>,
    pub missing_texture: Option<String>,
}

/// Scene file settings after validation, with asset paths anchored to the
/// directory the file lives in.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SceneSettings {
    pub shader: Option<PathBuf>,
    pub texture: Option<PathBuf>,
    pub size: Option<(u32, u32)>,
    pub title: Option<String>,
    pub antialias: Option<Antialiasing>,
    pub color_space: Option<ColorSpaceMode>,
    pub missing_texture: Option<MissingTexturePolicy>,
}

impl SceneFile {
    pub fn from_toml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn into_settings(self, path: &Path) -> Result<SceneSettings, ConfigError> {
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let invalid = |field: &'static str| {
            move |message: String| ConfigError::Invalid {
                path: path.to_path_buf(),
                field,
                message,
            }
        };

        Ok(SceneSettings {
            shader: self.shader.map(|p| anchor(base, p)),
            texture: self.texture.map(|p| anchor(base, p)),
            size: self
                .size
                .as_deref()
                .map(parse_size)
                .transpose()
                .map_err(invalid("size"))?,
            title: self.title,
            antialias: self
                .antialias
                .as_deref()
                .map(parse_antialias)
                .transpose()
                .map_err(invalid("antialias"))?,
            color_space: self
                .color_space
                .as_deref()
                .map(parse_color_space)
                .transpose()
                .map_err(invalid("color_space"))?,
            missing_texture: self
                .missing_texture
                .as_deref()
                .map(parse_missing_texture)
                .transpose()
                .map_err(invalid("missing_texture"))?,
        })
    }
}

fn anchor(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Reads and validates a scene file.
pub fn load(path: &Path) -> Result<SceneSettings, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    SceneFile::from_toml(path, &text)?.into_settings(path)
}

/// Like [`load`], but a missing file yields empty settings.
pub fn load_or_default(path: &Path) -> Result<SceneSettings, ConfigError> {
    if !path.exists() {
        return Ok(SceneSettings::default());
    }
    load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_full_scene_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scene.toml");
        fs::write(
            &path,
            r#"
shader = "shaders/glow.frag"
texture = "/opt/textures/brick.pcx"
size = "1024x768"
title = "bricks"
antialias = "4"
color_space = "linear"
missing_texture = "placeholder"
"#,
        )
        .unwrap();

        let settings = load(&path).unwrap();
        assert_eq!(settings.shader, Some(dir.path().join("shaders/glow.frag")));
        assert_eq!(
            settings.texture,
            Some(PathBuf::from("/opt/textures/brick.pcx"))
        );
        assert_eq!(settings.size, Some((1024, 768)));
        assert_eq!(settings.title.as_deref(), Some("bricks"));
        assert_eq!(settings.antialias, Some(Antialiasing::Samples(4)));
        assert_eq!(settings.color_space, Some(ColorSpaceMode::Linear));
        assert_eq!(
            settings.missing_texture,
            Some(MissingTexturePolicy::Placeholder)
        );
    }

    #[test]
    fn missing_file_yields_empty_settings() {
        let dir = TempDir::new().unwrap();
        let settings = load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, SceneSettings::default());
        assert!(matches!(
            load(&dir.path().join("absent.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SceneFile::from_toml(Path::new("scene.toml"), "fullscreen = true").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn invalid_values_name_the_field() {
        let file = SceneFile {
            size: Some("huge".into()),
            ..SceneFile::default()
        };
        let err = file.into_settings(Path::new("scene.toml")).unwrap_err();
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "size"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
