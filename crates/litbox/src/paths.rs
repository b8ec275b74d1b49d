use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "LITBOX_CONFIG_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "litbox";
const APPLICATION: &str = "litbox";

/// Name of the scene file inside the configuration directory.
pub const SCENE_FILE: &str = "scene.toml";

/// Directory holding `scene.toml`, honouring [`ENV_CONFIG_DIR`].
pub fn config_dir() -> Result<PathBuf> {
    if let Some(value) = env_override(ENV_CONFIG_DIR) {
        return Ok(value);
    }
    let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
        .ok_or_else(|| anyhow!("failed to determine user directories"))?;
    Ok(project_dirs.config_dir().to_path_buf())
}

pub fn default_scene_file() -> Result<PathBuf> {
    Ok(scene_file_in(&config_dir()?))
}

fn scene_file_in(dir: &Path) -> PathBuf {
    dir.join(SCENE_FILE)
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.as_os_str().is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
