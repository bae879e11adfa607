use frame_util::{animate, open_sink, FrameSink, ScatterPlot, ScatterStyle, SinkOptions};
use image::RgbaImage;
use nbody_anim::{Limits, Trajectory};
use ndarray::Array3;
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Clone, Default)]
struct Recorder {
    frames: Rc<RefCell<Vec<RgbaImage>>>,
    finished: Rc<RefCell<bool>>,
}

impl FrameSink for Recorder {
    fn push(&mut self, frame: &RgbaImage) -> anyhow::Result<()> {
        self.frames.borrow_mut().push(frame.clone());
        Ok(())
    }

    fn finish(self: Box<Self>) -> anyhow::Result<()> {
        *self.finished.borrow_mut() = true;
        Ok(())
    }
}

/// Two particles orbiting the origin over `steps` frames.
fn orbit(steps: usize) -> Trajectory {
    let positions = Array3::from_shape_fn((steps, 2, 2), |(s, axis, p)| {
        let angle = s as f32 * 0.3 + p as f32 * std::f32::consts::PI;
        let r = 20.0;
        if axis == 0 {
            r * angle.cos()
        } else {
            r * angle.sin()
        }
    });
    Trajectory::from_positions(positions).unwrap()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nbody-anim-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn test_every_step_becomes_a_frame() {
    let recorder = Recorder::default();
    let mut plot = ScatterPlot::new(ScatterStyle::square(120), Limits::default());

    let written = animate(&orbit(5), &mut plot, Box::new(recorder.clone())).unwrap();

    assert_eq!(written, 5);
    assert!(*recorder.finished.borrow());

    let frames = recorder.frames.borrow();
    assert_eq!(frames.len(), 5);
    assert!(frames.iter().all(|f| f.dimensions() == (120, 120)));
    // Particles move between steps, so consecutive frames differ.
    assert_ne!(frames[0], frames[1]);
}

#[test]
fn test_empty_trajectory_is_rejected() {
    let recorder = Recorder::default();
    let mut plot = ScatterPlot::new(ScatterStyle::square(64), Limits::default());

    assert!(animate(&orbit(0), &mut plot, Box::new(recorder.clone())).is_err());
    assert!(recorder.frames.borrow().is_empty());
}

#[test]
fn test_png_sequence_output() {
    let dir = scratch_dir("png");
    let mut plot = ScatterPlot::new(ScatterStyle::square(64), Limits::default());
    let sink = open_sink(&dir.join("nbody.png"), &SinkOptions::default()).unwrap();

    animate(&orbit(3), &mut plot, sink).unwrap();

    for i in 1..=3 {
        let path = dir.join(format!("nbody_{:06}.png", i));
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (64, 64));
    }
    assert!(!dir.join("nbody_000004.png").exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_gif_output() {
    let dir = scratch_dir("gif");
    let path = dir.join("nbody.gif");
    let mut plot = ScatterPlot::new(ScatterStyle::square(64), Limits::default());
    let sink = open_sink(&path, &SinkOptions::default()).unwrap();

    animate(&orbit(4), &mut plot, sink).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..6], b"GIF89a");
    // Trailer byte
    assert_eq!(*bytes.last().unwrap(), 0x3b);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_unknown_extension_is_rejected() {
    assert!(open_sink(std::path::Path::new("nbody.webm"), &SinkOptions::default()).is_err());
}
