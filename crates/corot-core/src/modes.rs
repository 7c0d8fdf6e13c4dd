//! Time series of spin-weighted spherical-harmonic mode coefficients.
//!
//! Modes are stored row-major as `(n_times, n_modes)` with a fixed index
//! table covering every `m` in `[-ell, ell]` for each `ell` in
//! `[ell_min, ell_max]`. Within one `ell` block `m` varies contiguously,
//! so the neighbors `(ell, m±1)` and `(ell, m±2)` of a valid mode live at
//! row offsets `±1` and `±2`. The moment accumulators index neighbors
//! directly through that adjacency.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WaveformError};

/// A waveform as mode coefficients over a strictly increasing time grid,
/// together with their time derivatives.
///
/// All derived quantities (moments, angular velocity, frames) are computed
/// fresh from this series; nothing mutates it after construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModeTimeSeries {
    t: Vec<f64>,
    ell_min: i64,
    ell_max: i64,
    data: Vec<Complex64>,
    data_dot: Vec<Complex64>,
}

/// Number of `(ell, m)` pairs for a contiguous `ell` range.
pub fn mode_count(ell_min: i64, ell_max: i64) -> usize {
    ((ell_max + 1) * (ell_max + 1) - ell_min * ell_min) as usize
}

impl ModeTimeSeries {
    /// Build a series from raw mode data, computing the time derivative by
    /// second-order finite differences on the (possibly non-uniform) grid.
    ///
    /// `data` is row-major `(n_times, n_modes)` with the modes ordered
    /// `(ell_min, -ell_min) ... (ell_min, ell_min), (ell_min+1, ...)`.
    /// Requires at least three time samples for the derivative stencil.
    pub fn new(t: Vec<f64>, ell_min: i64, ell_max: i64, data: Vec<Complex64>) -> Result<Self> {
        if t.len() < 3 {
            return Err(WaveformError::InvalidTimeGrid(format!(
                "need at least 3 samples for the derivative stencil, got {}",
                t.len()
            )));
        }
        let data_dot = finite_difference(&t, &data, mode_count(ell_min, ell_max))?;
        Self::with_data_dot(t, ell_min, ell_max, data, data_dot)
    }

    /// Build a series with a caller-supplied time derivative (e.g. from an
    /// exact expression or external spline machinery).
    pub fn with_data_dot(
        t: Vec<f64>,
        ell_min: i64,
        ell_max: i64,
        data: Vec<Complex64>,
        data_dot: Vec<Complex64>,
    ) -> Result<Self> {
        if t.len() < 2 {
            return Err(WaveformError::InvalidTimeGrid(format!(
                "need at least 2 samples, got {}",
                t.len()
            )));
        }
        for w in t.windows(2) {
            if w[1] <= w[0] {
                return Err(WaveformError::InvalidTimeGrid(format!(
                    "time grid not strictly increasing at t = {}",
                    w[0]
                )));
            }
        }
        if ell_min < 0 || ell_max < ell_min {
            return Err(WaveformError::ShapeMismatch(format!(
                "invalid ell range [{ell_min}, {ell_max}]"
            )));
        }
        let n_modes = mode_count(ell_min, ell_max);
        if data.len() != t.len() * n_modes {
            return Err(WaveformError::ShapeMismatch(format!(
                "data has {} entries, expected {} times x {} modes",
                data.len(),
                t.len(),
                n_modes
            )));
        }
        if data_dot.len() != data.len() {
            return Err(WaveformError::ShapeMismatch(format!(
                "data_dot has {} entries, data has {}",
                data_dot.len(),
                data.len()
            )));
        }
        Ok(Self {
            t,
            ell_min,
            ell_max,
            data,
            data_dot,
        })
    }

    pub fn n_times(&self) -> usize {
        self.t.len()
    }

    pub fn n_modes(&self) -> usize {
        mode_count(self.ell_min, self.ell_max)
    }

    pub fn t(&self) -> &[f64] {
        &self.t
    }

    pub fn ell_min(&self) -> i64 {
        self.ell_min
    }

    pub fn ell_max(&self) -> i64 {
        self.ell_max
    }

    /// Forward lookup `k → (ell, m)`.
    pub fn lm(&self, k: usize) -> Option<(i64, i64)> {
        let mut idx = k as i64;
        for ell in self.ell_min..=self.ell_max {
            let width = 2 * ell + 1;
            if idx < width {
                return Some((ell, idx - ell));
            }
            idx -= width;
        }
        None
    }

    /// Reverse lookup `(ell, m) → k`.
    pub fn index_of(&self, ell: i64, m: i64) -> Option<usize> {
        if ell < self.ell_min || ell > self.ell_max || m < -ell || m > ell {
            return None;
        }
        Some((ell * ell - self.ell_min * self.ell_min + ell + m) as usize)
    }

    /// Mode coefficient at time sample `i`, mode row `k`.
    pub fn mode(&self, i: usize, k: usize) -> Complex64 {
        self.data[i * self.n_modes() + k]
    }

    /// Time derivative of the mode coefficient at `(i, k)`.
    pub fn mode_dot(&self, i: usize, k: usize) -> Complex64 {
        self.data_dot[i * self.n_modes() + k]
    }

    /// Iterate the mode index table as `(k, ell, m)`.
    pub fn mode_indices(&self) -> impl Iterator<Item = (usize, i64, i64)> + '_ {
        (self.ell_min..=self.ell_max)
            .flat_map(|ell| (-ell..=ell).map(move |m| (ell, m)))
            .enumerate()
            .map(|(k, (ell, m))| (k, ell, m))
    }

    /// Total mode power `Σ_k |data[i,k]|²` at each time sample.
    pub fn norm(&self) -> Vec<f64> {
        let n_modes = self.n_modes();
        (0..self.n_times())
            .map(|i| {
                self.data[i * n_modes..(i + 1) * n_modes]
                    .iter()
                    .map(|c| c.norm_sqr())
                    .sum()
            })
            .collect()
    }

    /// Time of peak total mode power.
    pub fn max_norm_time(&self) -> f64 {
        let norms = self.norm();
        let mut i_max = 0;
        for (i, n) in norms.iter().enumerate() {
            if *n > norms[i_max] {
                i_max = i;
            }
        }
        self.t[i_max]
    }

    /// Index of the sample whose time is nearest to `time`.
    pub fn index_nearest(&self, time: f64) -> usize {
        let mut best = 0;
        for (i, ti) in self.t.iter().enumerate() {
            if (ti - time).abs() < (self.t[best] - time).abs() {
                best = i;
            }
        }
        best
    }

    /// Copy out the sub-series over sample range `[i1, i2)`.
    pub fn slice(&self, i1: usize, i2: usize) -> Result<Self> {
        if i1 >= i2 || i2 > self.n_times() {
            return Err(WaveformError::IndexOutOfRange {
                index: i2,
                len: self.n_times(),
            });
        }
        let n_modes = self.n_modes();
        Ok(Self {
            t: self.t[i1..i2].to_vec(),
            ell_min: self.ell_min,
            ell_max: self.ell_max,
            data: self.data[i1 * n_modes..i2 * n_modes].to_vec(),
            data_dot: self.data_dot[i1 * n_modes..i2 * n_modes].to_vec(),
        })
    }

    /// Two series can be contracted against each other only if their mode
    /// index tables and sample counts agree.
    pub fn check_same_layout(&self, other: &Self) -> Result<()> {
        if self.ell_min != other.ell_min || self.ell_max != other.ell_max {
            return Err(WaveformError::ShapeMismatch(format!(
                "mode tables differ: ell [{}, {}] vs [{}, {}]",
                self.ell_min, self.ell_max, other.ell_min, other.ell_max
            )));
        }
        if self.n_times() != other.n_times() {
            return Err(WaveformError::ShapeMismatch(format!(
                "sample counts differ: {} vs {}",
                self.n_times(),
                other.n_times()
            )));
        }
        Ok(())
    }
}

/// Second-order finite differences on a non-uniform grid, column-wise over
/// the row-major `(n_times, n_modes)` layout. Three-point central stencil in
/// the interior, one-sided three-point stencils at the endpoints.
fn finite_difference(
    t: &[f64],
    data: &[Complex64],
    n_modes: usize,
) -> Result<Vec<Complex64>> {
    let n_times = t.len();
    if data.len() != n_times * n_modes {
        return Err(WaveformError::ShapeMismatch(format!(
            "data has {} entries, expected {} times x {} modes",
            data.len(),
            n_times,
            n_modes
        )));
    }
    let mut dot = vec![Complex64::ZERO; data.len()];
    let row = |i: usize| &data[i * n_modes..(i + 1) * n_modes];

    // Left endpoint
    let (h1, h2) = (t[1] - t[0], t[2] - t[1]);
    let (c0, c1, c2) = (
        -(2.0 * h1 + h2) / (h1 * (h1 + h2)),
        (h1 + h2) / (h1 * h2),
        -h1 / (h2 * (h1 + h2)),
    );
    for k in 0..n_modes {
        dot[k] = c0 * row(0)[k] + c1 * row(1)[k] + c2 * row(2)[k];
    }

    // Interior
    for i in 1..n_times - 1 {
        let hm = t[i] - t[i - 1];
        let hp = t[i + 1] - t[i];
        let (cm, c0, cp) = (
            -hp / (hm * (hm + hp)),
            (hp - hm) / (hm * hp),
            hm / (hp * (hm + hp)),
        );
        for k in 0..n_modes {
            dot[i * n_modes + k] = cm * row(i - 1)[k] + c0 * row(i)[k] + cp * row(i + 1)[k];
        }
    }

    // Right endpoint
    let n = n_times - 1;
    let (h1, h2) = (t[n] - t[n - 1], t[n - 1] - t[n - 2]);
    let (c0, c1, c2) = (
        (2.0 * h1 + h2) / (h1 * (h1 + h2)),
        -(h1 + h2) / (h1 * h2),
        h1 / (h2 * (h1 + h2)),
    );
    for k in 0..n_modes {
        dot[n * n_modes + k] = c0 * row(n)[k] + c1 * row(n - 1)[k] + c2 * row(n - 2)[k];
    }

    Ok(dot)
}
