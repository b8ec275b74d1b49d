use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use renderer::{Antialiasing, ColorSpaceMode, MissingTexturePolicy};

#[derive(Parser, Debug)]
#[command(
    name = "litbox",
    author,
    version,
    about = "Textured, per-pixel lit box demo",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Fragment program to light the box with (default `assets/shader.frag`).
    #[arg(long, value_name = "FILE")]
    pub shader: Option<PathBuf>,

    /// Wall texture, PCX or any common image format (default `assets/texture.pcx`).
    #[arg(long, value_name = "FILE")]
    pub texture: Option<PathBuf>,

    /// Window size (e.g. `1280x720`, default `800x600`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias)]
    pub antialias: Option<Antialiasing>,

    /// Output color space handling: `auto`, `gamma`, or `linear`.
    #[arg(long, value_name = "MODE", value_parser = parse_color_space)]
    pub color_space: Option<ColorSpaceMode>,

    /// What to do when the texture cannot be decoded: `fail` or `placeholder`.
    #[arg(long, value_name = "POLICY", value_parser = parse_missing_texture)]
    pub missing_texture: Option<MissingTexturePolicy>,

    /// Scene file to read instead of `<config dir>/scene.toml`.
    #[arg(long, value_name = "FILE", env = "LITBOX_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the animation headless with a fixed tick step and print the scene state.
    Simulate(SimulateArgs),
    /// Decode a texture and describe it.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number of ticks to run.
    #[arg(long, default_value_t = 10)]
    pub ticks: u32,

    /// Milliseconds between ticks.
    #[arg(long, value_name = "MILLISECONDS", default_value_t = 100)]
    pub step_ms: u32,

    /// Reading of the first tick, in milliseconds.
    #[arg(long, value_name = "MILLISECONDS", default_value_t = 0)]
    pub start_ms: u32,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Texture file to decode.
    #[arg(value_name = "FILE")]
    pub path: PathBuf,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("anti-alias mode must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(Antialiasing::Auto),
        "off" | "none" | "disable" | "disabled" | "0" => Ok(Antialiasing::Off),
        _ => {
            let samples: u32 = normalized.parse().map_err(|_| {
                format!("invalid anti-alias sample count '{trimmed}'; use auto/off or 2/4/8/16")
            })?;

            if samples == 1 {
                return Ok(Antialiasing::Off);
            }

            if !matches!(samples, 2 | 4 | 8 | 16) {
                return Err(format!(
                    "unsupported sample count {samples}; supported values are 2, 4, 8, or 16"
                ));
            }

            Ok(Antialiasing::Samples(samples))
        }
    }
}

pub fn parse_color_space(value: &str) -> Result<ColorSpaceMode, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("color space must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" => Ok(ColorSpaceMode::Auto),
        "gamma" | "srgb-off" => Ok(ColorSpaceMode::Gamma),
        "linear" | "srgb" => Ok(ColorSpaceMode::Linear),
        other => Err(format!(
            "unknown color space '{other}'; expected auto, gamma, or linear"
        )),
    }
}

pub fn parse_missing_texture(value: &str) -> Result<MissingTexturePolicy, String> {
    value.parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".into());
    }
    Ok((width, height))
}
