use std::fmt;
use std::io;

/// Failure while reading a trajectory dump.
#[derive(Debug)]
pub enum LoadError {
    Io(io::Error),
    /// The 8-byte header is missing or declares a negative count.
    Header(String),
    /// The position payload does not hold `steps * 2 * particles` floats.
    ShapeMismatch {
        expected: usize,
        actual: usize,
        trailing_bytes: usize,
    },
    /// `steps * 2 * particles` does not fit in `usize`.
    Overflow { num_particles: usize, num_steps: usize },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "failed to read trajectory: {}", e),
            LoadError::Header(msg) => write!(f, "invalid trajectory header: {}", msg),
            LoadError::ShapeMismatch {
                expected,
                actual,
                trailing_bytes,
            } => {
                write!(f, "Expected {} floats, got {}", expected, actual)?;
                if *trailing_bytes > 0 {
                    write!(f, " (plus {} trailing bytes)", trailing_bytes)?;
                }
                Ok(())
            }
            LoadError::Overflow {
                num_particles,
                num_steps,
            } => write!(
                f,
                "declared shape {} steps x 2 x {} particles is too large",
                num_steps, num_particles
            ),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(e: io::Error) -> Self {
        LoadError::Io(e)
    }
}
