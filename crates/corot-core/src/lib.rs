//! Corotating-frame engine for spherical-harmonic mode series.
//!
//! Computes angular-momentum moments of a waveform's mode coefficients via
//! ladder-operator contractions, extracts the dominant principal axis of
//! the `⟨LL⟩` tensor with a continuity-corrected eigenvector walk, solves
//! for the waveform's intrinsic angular velocity, and integrates that
//! velocity into the corotating frame (with optional z-axis alignment).
//!
//! Zero I/O — pure math engine with no opinions about waveform formats or
//! persistence.

pub mod angular_velocity;
pub mod constants;
pub mod error;
pub mod frame;
pub mod ladder;
pub mod modes;
pub mod moments;
pub mod principal_axis;
pub mod quaternion;

#[cfg(test)]
pub(crate) mod testutil;

pub use angular_velocity::angular_velocity;
pub use constants::{DEFAULT_TOLERANCE, EPSILON, MIN_ALIGNMENT_SAMPLES, ROUGH_DIRECTION_WINDOW};
pub use error::{Result, WaveformError};
pub use frame::{corotating_frame, integrate_angular_velocity};
pub use ladder::ladder;
pub use modes::{ModeTimeSeries, mode_count};
pub use moments::{l_vector, ldt_vector, ll_comparison_matrix, ll_matrix};
pub use principal_axis::{dominant_eigenvector, ll_dominant_eigenvector};
pub use quaternion::Quaternion;
