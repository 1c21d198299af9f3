use std::path::PathBuf;

use clap::Parser;
use renderer::{ColorSpaceMode, SurfaceSize};

#[derive(Parser, Debug)]
#[command(
    name = "fractalglow",
    author,
    version,
    about = "Full-screen animated fractal glow",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Open a regular desktop window instead of going fullscreen.
    #[arg(long, conflicts_with = "headless")]
    pub window: bool,

    /// Initial window or framebuffer size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<SurfaceSize>,

    /// Optional FPS cap (0 = uncapped, paced by the display refresh).
    #[arg(long, value_name = "FPS", value_parser = parse_fps)]
    pub fps: Option<f32>,

    /// Output color space handling: `auto`, `gamma`, or `linear`.
    #[arg(
        long,
        value_name = "MODE",
        value_parser = parse_color_space,
        default_value = "auto"
    )]
    pub color_space: ColorSpaceMode,

    /// Render with the CPU rasterizer without opening a window.
    #[arg(long)]
    pub headless: bool,

    /// Stop after this many frames.
    #[arg(long, value_name = "N")]
    pub frames: Option<u64>,

    /// Freeze the pattern at this timestamp instead of animating.
    #[arg(
        long,
        value_name = "SECONDS",
        allow_negative_numbers = true,
        value_parser = parse_time
    )]
    pub time: Option<f32>,

    /// Write the last headless frame to this PNG path.
    #[arg(long, value_name = "PATH", requires = "headless")]
    pub snapshot: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_surface_size(value: &str) -> Result<SurfaceSize, String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1920x1080".to_string())?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in size specification '{trimmed}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in size specification '{trimmed}'"))?;

    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".to_string());
    }

    Ok(SurfaceSize::new(width, height))
}

pub fn parse_fps(value: &str) -> Result<f32, String> {
    let fps: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid FPS value '{}'", value.trim()))?;
    if !fps.is_finite() || fps < 0.0 {
        return Err("FPS must be a finite, non-negative number".to_string());
    }
    Ok(fps)
}

pub fn parse_time(value: &str) -> Result<f32, String> {
    let time: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid time value '{}'", value.trim()))?;
    if !time.is_finite() {
        return Err("time must be a finite number of seconds".to_string());
    }
    Ok(time)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(
            parse_surface_size("1280x720").unwrap(),
            SurfaceSize::new(1280, 720)
        );
        assert_eq!(
            parse_surface_size(" 64 X 32 ").unwrap(),
            SurfaceSize::new(64, 32)
        );
        assert!(parse_surface_size("1280").is_err());
        assert!(parse_surface_size("0x720").is_err());
        assert!(parse_surface_size("widexhigh").is_err());
    }

    #[test]
    fn parses_fps() {
        assert_eq!(parse_fps("30").unwrap(), 30.0);
        assert_eq!(parse_fps("0").unwrap(), 0.0);
        assert!(parse_fps("-1").is_err());
        assert!(parse_fps("inf").is_err());
        assert!(parse_fps("fast").is_err());
    }

    #[test]
    fn parses_time() {
        assert_eq!(parse_time("2.5").unwrap(), 2.5);
        assert_eq!(parse_time("-2.5").unwrap(), -2.5);
        assert!(parse_time("NaN").is_err());
        assert!(parse_time("inf").is_err());
        assert!(parse_time("-infinity").is_err());
        assert!(parse_time("later").is_err());
        assert!(Cli::try_parse_from(["fractalglow", "--time", "nan"]).is_err());
    }

    #[test]
    fn parses_color_space_aliases() {
        assert_eq!(parse_color_space("AUTO").unwrap(), ColorSpaceMode::Auto);
        assert_eq!(parse_color_space("gamma").unwrap(), ColorSpaceMode::Gamma);
        assert_eq!(parse_color_space("srgb").unwrap(), ColorSpaceMode::Linear);
        assert!(parse_color_space("").is_err());
        assert!(parse_color_space("cmyk").is_err());
    }

    #[test]
    fn no_arguments_is_valid() {
        let cli = Cli::try_parse_from(["fractalglow"]).expect("parse");
        assert!(!cli.window);
        assert!(!cli.headless);
        assert_eq!(cli.color_space, ColorSpaceMode::Auto);
        assert!(cli.size.is_none() && cli.fps.is_none() && cli.time.is_none());
    }

    #[test]
    fn snapshot_requires_headless() {
        assert!(Cli::try_parse_from(["fractalglow", "--snapshot", "out.png"]).is_err());
        assert!(Cli::try_parse_from(["fractalglow", "--window", "--headless"]).is_err());
        let cli = Cli::try_parse_from([
            "fractalglow",
            "--headless",
            "--snapshot",
            "out.png",
            "--time",
            "-2.5",
        ])
        .expect("parse");
        assert_eq!(cli.time, Some(-2.5));
    }
}
