use anyhow::{bail, Context, Result};
use frame_util::SinkOptions;
use nbody_anim::{Limits, Trajectory};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_INPUT: &str = "nbody.bin";
pub const DEFAULT_OUTPUT: &str = "nbody.mp4";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitsMode {
    /// `[-h, h]` on both axes.
    Fixed(f32),
    /// Fit the data bounds over all steps, padded by `margin` of the span.
    Auto { margin: f32 },
}

impl LimitsMode {
    pub fn resolve(&self, trajectory: &Trajectory) -> Limits {
        match *self {
            LimitsMode::Fixed(h) => Limits::fixed(h),
            LimitsMode::Auto { margin } => match trajectory.bounds() {
                Some(b) => Limits::fit(&b, margin),
                None => {
                    log::warn!("no finite positions to fit, using default limits");
                    Limits::default()
                }
            },
        }
    }
}

impl FromStr for LimitsMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "auto" {
            return Ok(LimitsMode::Auto { margin: 0.05 });
        }
        if let Some(m) = s.strip_prefix("auto:") {
            let margin: f32 = m.parse().with_context(|| format!("bad margin {:?}", m))?;
            if !(margin >= 0.0) {
                bail!("margin must be non-negative, got {}", margin);
            }
            return Ok(LimitsMode::Auto { margin });
        }

        let h: f32 = s
            .parse()
            .with_context(|| format!("expected `auto`, `auto:<margin>` or a number, got {:?}", s))?;
        if !(h > 0.0) || !h.is_finite() {
            bail!("half extent must be positive, got {}", h);
        }
        Ok(LimitsMode::Fixed(h))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub fps: u32,
    pub bitrate_kbps: u32,
    pub limits: LimitsMode,
    pub size: u32,
    pub ffmpeg: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            fps: 30,
            bitrate_kbps: 1800,
            limits: LimitsMode::Fixed(50.0),
            size: 600,
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl Config {
    /// `args` excludes the program name; `env` looks up a variable by name.
    pub fn from_env_and_args<I, F>(args: I, env: F) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        let mut args = args.into_iter();
        if let Some(input) = args.next() {
            config.input = PathBuf::from(input);
        }
        if let Some(output) = args.next() {
            config.output = PathBuf::from(output);
        }
        if let Some(extra) = args.next() {
            bail!("unexpected argument {:?}; usage: render [INPUT] [OUTPUT]", extra);
        }

        if let Some(v) = env("NBODY_FPS") {
            config.fps = parse_positive("NBODY_FPS", &v)?;
        }
        if let Some(v) = env("NBODY_BITRATE") {
            config.bitrate_kbps = parse_positive("NBODY_BITRATE", &v)?;
        }
        if let Some(v) = env("NBODY_SIZE") {
            config.size = parse_positive("NBODY_SIZE", &v)?;
        }
        if let Some(v) = env("NBODY_LIMITS") {
            config.limits = v.parse().context("invalid NBODY_LIMITS")?;
        }
        if let Some(v) = env("NBODY_FFMPEG") {
            config.ffmpeg = PathBuf::from(v);
        }

        Ok(config)
    }

    pub fn from_process() -> Result<Self> {
        Self::from_env_and_args(std::env::args().skip(1), |k| std::env::var(k).ok())
    }

    pub fn sink_options(&self) -> SinkOptions {
        SinkOptions {
            fps: self.fps,
            bitrate_kbps: self.bitrate_kbps,
            ffmpeg: self.ffmpeg.clone(),
        }
    }
}

fn parse_positive(name: &str, v: &str) -> Result<u32> {
    let n: u32 = v
        .trim()
        .parse()
        .with_context(|| format!("invalid {}: {:?}", name, v))?;
    if n == 0 {
        bail!("{} must be positive", name);
    }
    Ok(n)
}
