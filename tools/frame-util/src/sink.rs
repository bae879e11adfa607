//! Destinations for rendered frames.

use anyhow::{bail, ensure, Context, Result};
use image::RgbaImage;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

/// Receives frames in order and finalizes the output once all are pushed.
pub trait FrameSink {
    fn push(&mut self, frame: &RgbaImage) -> Result<()>;

    fn finish(self: Box<Self>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Gif,
    Mp4,
    PngSequence,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("gif") => Ok(OutputFormat::Gif),
            Some("mp4") => Ok(OutputFormat::Mp4),
            Some("png") => Ok(OutputFormat::PngSequence),
            _ => bail!(
                "output must end in .mp4, .gif or .png: {}",
                path.display()
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SinkOptions {
    pub fps: u32,
    pub bitrate_kbps: u32,
    pub ffmpeg: PathBuf,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            fps: 30,
            bitrate_kbps: 1800,
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

pub fn open_sink(path: &Path, options: &SinkOptions) -> Result<Box<dyn FrameSink>> {
    ensure!(options.fps > 0, "fps must be positive");

    Ok(match OutputFormat::from_path(path)? {
        OutputFormat::Gif => Box::new(GifSink::create(path, options.fps)?),
        OutputFormat::Mp4 => Box::new(FfmpegSink::new(path, options)),
        OutputFormat::PngSequence => Box::new(PngSequence::new(path)?),
    })
}

/// Remembers the first frame's size and rejects frames of any other size.
#[derive(Debug, Default)]
struct FrameSize(Option<(u32, u32)>);

impl FrameSize {
    fn check(&mut self, frame: &RgbaImage) -> Result<()> {
        let dims = frame.dimensions();
        match self.0 {
            None => self.0 = Some(dims),
            Some(first) => ensure!(
                first == dims,
                "frame size changed from {}x{} to {}x{}",
                first.0,
                first.1,
                dims.0,
                dims.1
            ),
        }
        Ok(())
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

/// Looping GIF.
///
/// The encoder is created on the first frame, once the frame size is known.
pub struct GifSink<W: Write> {
    writer: Option<W>,
    encoder: Option<gif::Encoder<W>>,
    delay_cs: u16,
    size: FrameSize,
}

impl GifSink<BufWriter<File>> {
    pub fn create(path: &Path, fps: u32) -> Result<Self> {
        create_parent(path)?;
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file), fps))
    }
}

impl<W: Write> GifSink<W> {
    pub fn new(writer: W, fps: u32) -> Self {
        Self {
            writer: Some(writer),
            encoder: None,
            delay_cs: gif_delay(fps),
            size: FrameSize::default(),
        }
    }

    fn start(&mut self, width: u16, height: u16) -> Result<()> {
        let writer = self.writer.take().context("GIF writer already consumed")?;
        let mut encoder =
            gif::Encoder::new(writer, width, height, &[]).context("failed to write GIF header")?;
        encoder
            .set_repeat(gif::Repeat::Infinite)
            .context("failed to write GIF loop extension")?;
        self.encoder = Some(encoder);
        Ok(())
    }
}

/// Frame delay in hundredths of a second, at least one.
fn gif_delay(fps: u32) -> u16 {
    ((100.0 / fps.max(1) as f32).round() as u16).max(1)
}

impl<W: Write> FrameSink for GifSink<W> {
    fn push(&mut self, frame: &RgbaImage) -> Result<()> {
        self.size.check(frame)?;

        let (w, h) = frame.dimensions();
        ensure!(
            w <= u16::MAX as u32 && h <= u16::MAX as u32,
            "frame {}x{} is too large for GIF",
            w,
            h
        );
        let (w, h) = (w as u16, h as u16);

        if self.encoder.is_none() {
            self.start(w, h)?;
        }

        let mut pixels = frame.as_raw().clone();
        let mut gif_frame = gif::Frame::from_rgba_speed(w, h, &mut pixels, 10);
        gif_frame.delay = self.delay_cs;

        if let Some(encoder) = self.encoder.as_mut() {
            encoder
                .write_frame(&gif_frame)
                .context("failed to write GIF frame")?;
        }
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        let encoder = self.encoder.take().context("no frames were written to GIF")?;
        let mut writer = encoder
            .into_inner()
            .context("failed to write GIF trailer")?;
        writer.flush().context("failed to flush GIF")?;
        Ok(())
    }
}

/// H.264 MP4 through an `ffmpeg` child process fed raw RGBA on stdin.
///
/// The process is started on the first frame, once the frame size is known.
pub struct FfmpegSink {
    path: PathBuf,
    options: SinkOptions,
    size: FrameSize,
    child: Option<(Child, BufWriter<ChildStdin>)>,
}

impl FfmpegSink {
    pub fn new(path: &Path, options: &SinkOptions) -> Self {
        Self {
            path: path.to_path_buf(),
            options: options.clone(),
            size: FrameSize::default(),
            child: None,
        }
    }

    fn args(&self, width: u32, height: u32) -> Vec<String> {
        vec![
            "-f".into(),
            "rawvideo".into(),
            "-vcodec".into(),
            "rawvideo".into(),
            "-s".into(),
            format!("{}x{}", width, height),
            "-pix_fmt".into(),
            "rgba".into(),
            "-framerate".into(),
            self.options.fps.to_string(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            "pipe:".into(),
            "-vf".into(),
            "pad=ceil(iw/2)*2:ceil(ih/2)*2".into(),
            "-vcodec".into(),
            "h264".into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-b:v".into(),
            format!("{}k", self.options.bitrate_kbps),
            "-y".into(),
            self.path.to_string_lossy().into_owned(),
        ]
    }

    fn spawn(&self, width: u32, height: u32) -> Result<(Child, BufWriter<ChildStdin>)> {
        create_parent(&self.path)?;

        let args = self.args(width, height);
        log::debug!("{} {}", self.options.ffmpeg.display(), args.join(" "));

        let mut child = Command::new(&self.options.ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to start {}", self.options.ffmpeg.display()))?;

        let stdin = child
            .stdin
            .take()
            .context("ffmpeg stdin was not captured")?;

        Ok((child, BufWriter::new(stdin)))
    }
}

impl FrameSink for FfmpegSink {
    fn push(&mut self, frame: &RgbaImage) -> Result<()> {
        self.size.check(frame)?;

        if self.child.is_none() {
            let (w, h) = frame.dimensions();
            self.child = Some(self.spawn(w, h)?);
        }

        if let Some((_, stdin)) = self.child.as_mut() {
            stdin
                .write_all(frame.as_raw())
                .context("failed to pipe frame to ffmpeg")?;
        }
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        let (mut child, mut stdin) = match self.child.take() {
            Some(c) => c,
            None => bail!("no frames were written to {}", self.path.display()),
        };

        stdin.flush().context("failed to flush frames to ffmpeg")?;
        // Closing stdin lets ffmpeg finish the file.
        drop(stdin);

        let status = child.wait().context("failed to wait for ffmpeg")?;
        ensure!(status.success(), "ffmpeg exited with {}", status);
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        // Reached with a live child only when `finish` was never called.
        if let Some((mut child, stdin)) = self.child.take() {
            drop(stdin);
            match child.wait() {
                Ok(status) => log::warn!(
                    "ffmpeg stopped early ({}); {} is incomplete",
                    status,
                    self.path.display()
                ),
                Err(e) => log::warn!("failed to wait for ffmpeg: {}", e),
            }
        }
    }
}

/// One PNG per frame: `dir/stem.png` becomes `dir/stem_000001.png`, `dir/stem_000002.png`, ...
pub struct PngSequence {
    dir: PathBuf,
    stem: String,
    index: usize,
    size: FrameSize,
}

impl PngSequence {
    pub fn new(path: &Path) -> Result<Self> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .context("png output needs a file name")?
            .to_string();
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }

        Ok(Self {
            dir,
            stem,
            index: 0,
            size: FrameSize::default(),
        })
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}_{:06}.png", self.stem, index))
    }
}

impl FrameSink for PngSequence {
    fn push(&mut self, frame: &RgbaImage) -> Result<()> {
        self.size.check(frame)?;
        self.index += 1;

        let path = self.frame_path(self.index);
        frame
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
