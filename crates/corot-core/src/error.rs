use std::fmt;

#[derive(Debug)]
pub enum WaveformError {
    /// Input arrays or mode index tables disagree in shape.
    ShapeMismatch(String),
    /// Time grid is not strictly increasing or too short.
    InvalidTimeGrid(String),
    /// The second-moment tensor is singular at one time sample, so the
    /// instantaneous rotation axis is undefined there.
    SingularMoment { index: usize, time: f64 },
    /// Continuity-correction reference index outside the series.
    IndexOutOfRange { index: usize, len: usize },
    /// The requested alignment window resolved to too few samples, or the
    /// averaged axis is degenerate.
    DegenerateAlignment(String),
}

impl fmt::Display for WaveformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveformError::ShapeMismatch(msg) => write!(f, "shape mismatch: {msg}"),
            WaveformError::InvalidTimeGrid(msg) => write!(f, "invalid time grid: {msg}"),
            WaveformError::SingularMoment { index, time } => write!(
                f,
                "singular second-moment tensor at sample {index} (t = {time}): \
                 no well-defined rotation axis"
            ),
            WaveformError::IndexOutOfRange { index, len } => {
                write!(f, "reference index {index} out of range for {len} samples")
            }
            WaveformError::DegenerateAlignment(msg) => {
                write!(f, "degenerate alignment: {msg}")
            }
        }
    }
}

impl std::error::Error for WaveformError {}

pub type Result<T> = std::result::Result<T, WaveformError>;
