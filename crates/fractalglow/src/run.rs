use anyhow::Result;
use renderer::{Presentation, RenderPolicy, Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::signal;

pub fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli);
    tracing::debug!(?config, "resolved renderer configuration");
    let renderer = Renderer::new(config);
    signal::install_stop_on_interrupt(renderer.stop_handle())?;
    let frames = renderer.run()?;
    tracing::info!(frames, "fractalglow exiting");
    Ok(())
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn build_config(cli: &Cli) -> RendererConfig {
    let defaults = RendererConfig::default();

    let presentation = if cli.headless {
        Presentation::Headless
    } else if cli.window {
        Presentation::Windowed
    } else {
        Presentation::Fullscreen
    };

    let policy = match cli.time {
        Some(time) => RenderPolicy::Still { time },
        None => RenderPolicy::Animate {
            target_fps: cli.fps.filter(|fps| *fps > 0.0),
        },
    };
    if cli.time.is_some() && cli.fps.is_some() {
        tracing::warn!("--fps has no effect together with --time");
    }

    RendererConfig {
        surface_size: cli.size.unwrap_or(defaults.surface_size),
        presentation,
        policy,
        color_space: cli.color_space,
        frame_limit: cli.frames,
        snapshot: cli.snapshot.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use renderer::{ColorSpaceMode, SurfaceSize};

    fn config_for(args: &[&str]) -> RendererConfig {
        let cli = Cli::try_parse_from(std::iter::once("fractalglow").chain(args.iter().copied()))
            .expect("parse");
        build_config(&cli)
    }

    #[test]
    fn defaults_are_fullscreen_animated_uncapped() {
        let config = config_for(&[]);
        assert_eq!(config.presentation, Presentation::Fullscreen);
        assert_eq!(config.policy, RenderPolicy::Animate { target_fps: None });
        assert_eq!(config.color_space, ColorSpaceMode::Auto);
        assert_eq!(config.frame_limit, None);
        assert_eq!(config.surface_size, RendererConfig::default().surface_size);
    }

    #[test]
    fn zero_fps_means_uncapped() {
        let config = config_for(&["--fps", "0"]);
        assert_eq!(config.policy.target_fps(), None);
        let config = config_for(&["--fps", "24"]);
        assert_eq!(config.policy.target_fps(), Some(24.0));
    }

    #[test]
    fn time_freezes_the_pattern() {
        let config = config_for(&["--window", "--time", "3.5", "--size", "640x360"]);
        assert_eq!(config.presentation, Presentation::Windowed);
        assert_eq!(config.policy, RenderPolicy::Still { time: 3.5 });
        assert_eq!(config.surface_size, SurfaceSize::new(640, 360));
    }

    #[test]
    fn headless_carries_frames_and_snapshot() {
        let config = config_for(&["--headless", "--frames", "3", "--snapshot", "out.png"]);
        assert_eq!(config.presentation, Presentation::Headless);
        assert_eq!(config.frame_limit, Some(3));
        assert_eq!(
            config.snapshot.as_deref(),
            Some(std::path::Path::new("out.png"))
        );
    }
}
