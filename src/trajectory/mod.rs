//! Binary trajectory dumps.

mod error;

pub use error::LoadError;

use ndarray::{Array3, ArrayView1, ArrayView2, Axis};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const HEADER_LEN: usize = 8;

/// Coordinate row inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis2 {
    X = 0,
    Y = 1,
}

/// Per-axis `(min, max)` over every finite position of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: (f32, f32),
    pub y: (f32, f32),
}

/// Particle positions for every step, shaped `(steps, 2, particles)`.
#[derive(Debug, Clone)]
pub struct Trajectory {
    num_particles: usize,
    num_steps: usize,
    positions: Array3<f32>,
}

impl Trajectory {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, LoadError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.len() < HEADER_LEN {
            return Err(LoadError::Header(format!(
                "need {} bytes, file has {}",
                HEADER_LEN,
                bytes.len()
            )));
        }

        let num_particles = read_count(&bytes[0..4], "particle count")?;
        let num_steps = read_count(&bytes[4..8], "step count")?;

        let expected = num_steps
            .checked_mul(2)
            .and_then(|n| n.checked_mul(num_particles))
            .ok_or(LoadError::Overflow {
                num_particles,
                num_steps,
            })?;

        let payload = &bytes[HEADER_LEN..];
        let actual = payload.len() / 4;
        let trailing_bytes = payload.len() % 4;

        if actual != expected || trailing_bytes != 0 {
            return Err(LoadError::ShapeMismatch {
                expected,
                actual,
                trailing_bytes,
            });
        }

        let data: Vec<f32> = payload
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        let positions = Array3::from_shape_vec((num_steps, 2, num_particles), data).map_err(
            |_| LoadError::ShapeMismatch {
                expected,
                actual,
                trailing_bytes,
            },
        )?;

        log::debug!(
            "parsed trajectory header: {} particles, {} steps",
            num_particles,
            num_steps
        );

        Ok(Self {
            num_particles,
            num_steps,
            positions,
        })
    }

    /// Wrap an already shaped `(steps, 2, particles)` array.
    pub fn from_positions(positions: Array3<f32>) -> Result<Self, LoadError> {
        let (num_steps, axes, num_particles) = positions.dim();
        if axes != 2 {
            return Err(LoadError::ShapeMismatch {
                expected: num_steps * 2 * num_particles,
                actual: positions.len(),
                trailing_bytes: 0,
            });
        }

        Ok(Self {
            num_particles,
            num_steps,
            positions,
        })
    }

    pub fn num_particles(&self) -> usize {
        self.num_particles
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    pub fn positions(&self) -> &Array3<f32> {
        &self.positions
    }

    /// `(2, particles)` view of one step. Panics if `step` is out of range.
    pub fn frame(&self, step: usize) -> ArrayView2<'_, f32> {
        self.positions.index_axis(Axis(0), step)
    }

    pub fn row(&self, step: usize, axis: Axis2) -> ArrayView1<'_, f32> {
        self.positions
            .index_axis(Axis(0), step)
            .index_axis_move(Axis(0), axis as usize)
    }

    pub fn xs(&self, step: usize) -> ArrayView1<'_, f32> {
        self.row(step, Axis2::X)
    }

    pub fn ys(&self, step: usize) -> ArrayView1<'_, f32> {
        self.row(step, Axis2::Y)
    }

    /// `(x, y)` pairs of one step, in particle order.
    pub fn points(&self, step: usize) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.xs(step)
            .into_iter()
            .zip(self.ys(step))
            .map(|(&x, &y)| (x, y))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let x = finite_range(self.positions.index_axis(Axis(1), Axis2::X as usize).iter())?;
        let y = finite_range(self.positions.index_axis(Axis(1), Axis2::Y as usize).iter())?;
        Some(Bounds { x, y })
    }
}

fn read_count(b: &[u8], what: &str) -> Result<usize, LoadError> {
    let v = i32::from_le_bytes([b[0], b[1], b[2], b[3]]);
    if v < 0 {
        return Err(LoadError::Header(format!("negative {}: {}", what, v)));
    }
    Ok(v as usize)
}

fn finite_range<'a, I: Iterator<Item = &'a f32>>(values: I) -> Option<(f32, f32)> {
    values
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::Cursor;

    fn dump(num_particles: i32, num_steps: i32, data: &[f32]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&num_particles.to_le_bytes());
        bytes.extend_from_slice(&num_steps.to_le_bytes());
        for v in data {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_layout_is_step_axis_particle() {
        // 3 particles, 2 steps
        let data = [
            0.0, 1.0, 2.0, // step 0 x
            10.0, 11.0, 12.0, // step 0 y
            20.0, 21.0, 22.0, // step 1 x
            30.0, 31.0, 32.0, // step 1 y
        ];
        let t = Trajectory::from_bytes(&dump(3, 2, &data)).unwrap();

        assert_eq!(t.num_particles(), 3);
        assert_eq!(t.num_steps(), 2);
        assert_eq!(t.positions().dim(), (2, 2, 3));

        assert_eq!(t.xs(0).to_vec(), vec![0.0, 1.0, 2.0]);
        assert_eq!(t.ys(0).to_vec(), vec![10.0, 11.0, 12.0]);
        assert_eq!(t.xs(1).to_vec(), vec![20.0, 21.0, 22.0]);
        assert_eq!(t.row(1, Axis2::Y).to_vec(), vec![30.0, 31.0, 32.0]);

        let pts: Vec<_> = t.points(1).collect();
        assert_eq!(pts, vec![(20.0, 30.0), (21.0, 31.0), (22.0, 32.0)]);
        assert_eq!(t.frame(1).dim(), (2, 3));
    }

    #[test]
    fn test_from_reader() {
        let bytes = dump(1, 1, &[4.0, -4.0]);
        let t = Trajectory::from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(t.points(0).collect::<Vec<_>>(), vec![(4.0, -4.0)]);
    }

    #[test]
    fn test_too_few_floats() {
        let err = Trajectory::from_bytes(&dump(2, 2, &[0.0; 7])).unwrap_err();
        match err {
            LoadError::ShapeMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, 8);
                assert_eq!(actual, 7);
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn test_too_many_floats() {
        let err = Trajectory::from_bytes(&dump(2, 1, &[0.0; 5])).unwrap_err();
        assert_eq!(err.to_string(), "Expected 4 floats, got 5");
    }

    #[test]
    fn test_trailing_partial_float() {
        let mut bytes = dump(1, 1, &[1.0, 2.0]);
        bytes.push(0xff);
        let err = Trajectory::from_bytes(&bytes).unwrap_err();
        match err {
            LoadError::ShapeMismatch {
                expected,
                actual,
                trailing_bytes,
            } => {
                assert_eq!((expected, actual, trailing_bytes), (2, 2, 1));
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(
            Trajectory::from_bytes(&[1, 0, 0]),
            Err(LoadError::Header(_))
        ));
        assert!(matches!(
            Trajectory::from_bytes(&dump(-1, 1, &[])),
            Err(LoadError::Header(_))
        ));
    }

    #[test]
    fn test_empty_dataset() {
        let t = Trajectory::from_bytes(&dump(5, 0, &[])).unwrap();
        assert_eq!(t.num_steps(), 0);
        assert_eq!(t.num_particles(), 5);
        assert_eq!(t.bounds(), None);
    }

    #[test]
    fn test_bounds_skip_non_finite() {
        let data = [
            -1.0, 3.0, // step 0 x
            2.0, f32::NAN, // step 0 y
            7.0, f32::INFINITY, // step 1 x
            -5.0, 0.5, // step 1 y
        ];
        let b = Trajectory::from_bytes(&dump(2, 2, &data))
            .unwrap()
            .bounds()
            .unwrap();

        assert_abs_diff_eq!(b.x.0, -1.0);
        assert_abs_diff_eq!(b.x.1, 7.0);
        assert_abs_diff_eq!(b.y.0, -5.0);
        assert_abs_diff_eq!(b.y.1, 2.0);
    }

    #[test]
    fn test_from_positions() {
        let t = Trajectory::from_positions(Array3::zeros((4, 2, 6))).unwrap();
        assert_eq!((t.num_steps(), t.num_particles()), (4, 6));

        match Trajectory::from_positions(Array3::zeros((4, 3, 6))) {
            Err(LoadError::ShapeMismatch {
                expected, actual, ..
            }) => assert_eq!((expected, actual), (48, 72)),
            r => panic!("unexpected result {:?}", r),
        }
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("nbody-anim-load-{}.bin", std::process::id()));
        std::fs::write(&path, dump(2, 1, &[1.0, 2.0, 3.0, 4.0])).unwrap();

        let t = Trajectory::load(&path);
        std::fs::remove_file(&path).unwrap();

        let t = t.unwrap();
        assert_eq!(t.points(0).collect::<Vec<_>>(), vec![(1.0, 3.0), (2.0, 4.0)]);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("nbody-anim-does-not-exist.bin");
        match Trajectory::load(&path) {
            Err(LoadError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            r => panic!("unexpected result {:?}", r),
        }
    }
}
