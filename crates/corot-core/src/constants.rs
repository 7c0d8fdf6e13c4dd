/// Numerical epsilon for near-zero comparisons
pub const EPSILON: f64 = 1e-10;

/// Default absolute tolerance for the frame integration
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// Width of the window used to seed the rough precession direction
/// during z-alignment (centered on the start of the alignment interval)
pub const ROUGH_DIRECTION_WINDOW: usize = 21;

/// Minimum number of samples an alignment window must resolve to
pub const MIN_ALIGNMENT_SAMPLES: usize = 2;
