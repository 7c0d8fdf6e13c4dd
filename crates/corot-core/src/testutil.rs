//! Synthetic waveforms shared across unit tests.

use num_complex::Complex64;

use crate::modes::{ModeTimeSeries, mode_count};

/// Rigid rotation about z at rate `omega`: a single `(2, 2)` mode,
/// `f(t) = a(t) e^{-2iΩt}`, with the exact derivative supplied. The
/// amplitude envelope `a(t)` lets tests shape the peak-power time.
pub fn rigid_rotation_z(
    omega: f64,
    t: Vec<f64>,
    amplitude: impl Fn(f64) -> (f64, f64),
) -> ModeTimeSeries {
    let n_modes = mode_count(2, 2);
    let mut data = vec![Complex64::ZERO; t.len() * n_modes];
    let mut data_dot = vec![Complex64::ZERO; t.len() * n_modes];
    let k22 = 4;
    for (i, &ti) in t.iter().enumerate() {
        let (a, a_dot) = amplitude(ti);
        let phase = (Complex64::new(0.0, -2.0 * omega) * ti).exp();
        data[i * n_modes + k22] = a * phase;
        data_dot[i * n_modes + k22] =
            (Complex64::new(a_dot, 0.0) + a * Complex64::new(0.0, -2.0 * omega)) * phase;
    }
    ModeTimeSeries::with_data_dot(t, 2, 2, data, data_dot).unwrap()
}

/// Deterministic pseudo-random series with every mode populated.
pub fn scrambled_series(n: usize, ell_min: i64, ell_max: i64) -> ModeTimeSeries {
    let t: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
    let n_modes = mode_count(ell_min, ell_max);
    let mut data = Vec::with_capacity(n * n_modes);
    let mut x = 0.541_f64;
    for _ in 0..n * n_modes {
        x = (x * 997.0 + 0.173).fract();
        let y = (x * 631.0 + 0.377).fract();
        data.push(Complex64::new(x - 0.5, y - 0.5));
    }
    ModeTimeSeries::new(t, ell_min, ell_max, data).unwrap()
}

pub fn uniform_grid(n: usize, dt: f64) -> Vec<f64> {
    (0..n).map(|i| i as f64 * dt).collect()
}
