//! Animate a binary N-body dump as a scatter plot.
//!
//! Usage: `render [INPUT] [OUTPUT]` (defaults `nbody.bin`, `nbody.mp4`).
//! `NBODY_FPS`, `NBODY_BITRATE`, `NBODY_SIZE`, `NBODY_LIMITS` and
//! `NBODY_FFMPEG` override the rendering defaults.

mod config;

use anyhow::{Context, Result};
use config::Config;
use frame_util::{animate, open_sink, ScatterPlot, ScatterStyle};
use nbody_anim::Trajectory;

fn run(config: &Config) -> Result<()> {
    let trajectory = Trajectory::load(&config.input)
        .with_context(|| format!("failed to load {}", config.input.display()))?;
    log::info!(
        "Loaded {} particles, {} steps",
        trajectory.num_particles(),
        trajectory.num_steps()
    );

    let limits = config.limits.resolve(&trajectory);
    log::debug!("axis limits {:?}", limits);

    let mut plot = ScatterPlot::new(ScatterStyle::square(config.size), limits);
    let sink = open_sink(&config.output, &config.sink_options())?;

    animate(&trajectory, &mut plot, sink)?;
    log::info!("Saved animation to {}", config.output.display());

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = Config::from_process().and_then(|config| run(&config));
    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
