//! Corotating-frame construction.
//!
//! The angular-velocity field fixes the frame's time dependence through the
//! quaternion kinematic equation `dR/dt = ½ R ω`, leaving one constant
//! rotation undetermined. The optional z-alignment step pins that residual
//! freedom by averaging the dominant `⟨LL⟩` eigenvector over a stretch of
//! the inspiral and rotating the whole frame field so the averaged axis
//! lands on the z axis.

use nalgebra::Vector3;

use crate::angular_velocity::angular_velocity;
use crate::constants::{EPSILON, MIN_ALIGNMENT_SAMPLES, ROUGH_DIRECTION_WINDOW};
use crate::error::{Result, WaveformError};
use crate::modes::ModeTimeSeries;
use crate::principal_axis::ll_dominant_eigenvector;
use crate::quaternion::Quaternion;

/// Piecewise-linear view of a sampled angular-velocity field, clamped at
/// the ends of the time grid.
struct OmegaField<'a> {
    t: &'a [f64],
    omega: &'a [Vector3<f64>],
}

impl OmegaField<'_> {
    fn at(&self, time: f64) -> Vector3<f64> {
        let n = self.t.len();
        if time <= self.t[0] {
            return self.omega[0];
        }
        if time >= self.t[n - 1] {
            return self.omega[n - 1];
        }
        let j = self.t.partition_point(|&ti| ti <= time);
        let s = (time - self.t[j - 1]) / (self.t[j] - self.t[j - 1]);
        self.omega[j - 1] * (1.0 - s) + self.omega[j] * s
    }

    /// Right-hand side of the kinematic equation at `(r, time)`.
    fn derivative(&self, r: Quaternion, time: f64) -> Quaternion {
        r * Quaternion::from_vector(self.at(time)) * 0.5
    }
}

fn rk4_step(field: &OmegaField<'_>, r: Quaternion, time: f64, h: f64) -> Quaternion {
    let k1 = field.derivative(r, time);
    let k2 = field.derivative(r + k1 * (0.5 * h), time + 0.5 * h);
    let k3 = field.derivative(r + k2 * (0.5 * h), time + 0.5 * h);
    let k4 = field.derivative(r + k3 * h, time + h);
    r + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
}

/// Integrate `dR/dt = ½ R ω` over the sample times, starting from `r0` at
/// `t[0]`, with adaptive step-doubling RK4 to absolute tolerance
/// `tolerance` per step. Returns one unit rotor per sample.
///
/// The integration is inherently sequential along the time axis; `ω` is
/// interpolated linearly between samples.
pub fn integrate_angular_velocity(
    t: &[f64],
    omega: &[Vector3<f64>],
    r0: Quaternion,
    tolerance: f64,
) -> Result<Vec<Quaternion>> {
    if t.len() != omega.len() {
        return Err(WaveformError::ShapeMismatch(format!(
            "{} time samples but {} angular-velocity samples",
            t.len(),
            omega.len()
        )));
    }
    if t.len() < 2 {
        return Err(WaveformError::InvalidTimeGrid(format!(
            "need at least 2 samples to integrate, got {}",
            t.len()
        )));
    }
    let tol = tolerance.max(f64::EPSILON);
    let field = OmegaField { t, omega };

    let mut frame = Vec::with_capacity(t.len());
    frame.push(r0.normalize());
    for i in 0..t.len() - 1 {
        let t_end = t[i + 1];
        let mut r = frame[i];
        let mut time = t[i];
        let mut h = t_end - time;
        let h_floor = (t_end - t[i]) * 1e-12;
        while t_end - time > h_floor {
            h = h.min(t_end - time);
            let full = rk4_step(&field, r, time, h);
            let half = rk4_step(&field, r, time, 0.5 * h);
            let double = rk4_step(&field, half, time + 0.5 * h, 0.5 * h);
            let err = (full.w - double.w)
                .abs()
                .max((full.x - double.x).abs())
                .max((full.y - double.y).abs())
                .max((full.z - double.z).abs());
            if err <= tol || h <= h_floor {
                r = double.normalize();
                time += h;
                if err < 0.03 * tol {
                    h *= 2.0;
                }
            } else {
                h *= 0.5;
            }
        }
        frame.push(r);
    }
    Ok(frame)
}

/// Corotating frame of a waveform: the rotor field taking the mode frame
/// into the frame in which the modes' time dependence is minimized.
///
/// `r0` is the frame at the first sample and `tolerance` the absolute
/// integration tolerance. If `z_alignment_region = Some((f1, f2))` the
/// residual constant rotation is fixed by aligning the averaged dominant
/// eigenvector of `⟨LL⟩` with the z axis, where `f1` and `f2` are
/// fractions of the inspiral (first sample to peak-power time) bounding
/// the averaging window.
pub fn corotating_frame(
    w: &ModeTimeSeries,
    r0: Quaternion,
    tolerance: f64,
    z_alignment_region: Option<(f64, f64)>,
) -> Result<Vec<Quaternion>> {
    let omega = angular_velocity(w)?;
    let frame = integrate_angular_velocity(w.t(), &omega, r0, tolerance)?;
    let correction = match z_alignment_region {
        None => Quaternion::identity(),
        Some((f1, f2)) => alignment_correction(w, &frame, f1, f2)?,
    };
    Ok(frame
        .iter()
        .map(|r| (*r * correction).normalize())
        .collect())
}

/// The fixed correction rotor for the z-alignment step.
fn alignment_correction(
    w: &ModeTimeSeries,
    frame: &[Quaternion],
    f1: f64,
    f2: f64,
) -> Result<Quaternion> {
    let initial_time = w.t()[0];
    let inspiral_time = w.max_norm_time() - initial_time;
    let i1 = w.index_nearest(initial_time + f1 * inspiral_time);
    let i2 = w.index_nearest(initial_time + f2 * inspiral_time);
    if i2 <= i1 || i2 - i1 < MIN_ALIGNMENT_SAMPLES {
        return Err(WaveformError::DegenerateAlignment(format!(
            "window ({f1}, {f2}) of the inspiral resolves to samples [{i1}, {i2})"
        )));
    }

    // Seed the eigenvector orientation from the angular velocity in a
    // small window around the start of the averaging interval
    let i1m = i1.saturating_sub(ROUGH_DIRECTION_WINDOW / 2);
    let i1p = (i1m + ROUGH_DIRECTION_WINDOW).min(w.n_times());
    let rough_window = w.slice(i1m, i1p)?;
    let rough = angular_velocity(&rough_window)?[i1 - i1m];

    let sub = w.slice(i1, i2)?;
    let vhat = ll_dominant_eigenvector(&sub, rough, 0)?;

    // Average the axis as seen from the corotating frame
    let mut mean = Vector3::zeros();
    for (r, v) in frame[i1..i2].iter().zip(&vhat) {
        mean += r.rotate_into_frame(*v);
    }
    mean /= (i2 - i1) as f64;
    if mean.norm() < EPSILON {
        return Err(WaveformError::DegenerateAlignment(
            "averaged eigenvector vanishes over the window".into(),
        ));
    }
    let vmean = mean / mean.norm();

    (Quaternion::from_vector(-Vector3::z()) * Quaternion::from_vector(vmean))
        .sqrt_rotor()
        .map(Quaternion::inverse)
        .ok_or_else(|| {
            WaveformError::DegenerateAlignment(
                "averaged eigenvector is anti-parallel to the z axis".into(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{rigid_rotation_z, uniform_grid};
    use approx::assert_relative_eq;

    fn assert_same_rotation(a: Quaternion, b: Quaternion, tol: f64) {
        let dot = a.dot(b).abs();
        assert!(dot > 1.0 - tol, "rotors differ: {a:?} vs {b:?} (|dot| = {dot})");
    }

    #[test]
    fn test_constant_omega_closed_form() {
        // dR/dt = ½ R ω with constant ω gives a rotation by |ω|t about ω̂
        let omega_vec = Vector3::new(0.0, 0.0, 2.0);
        let t = uniform_grid(101, 0.01);
        let omega = vec![omega_vec; t.len()];
        let frame =
            integrate_angular_velocity(&t, &omega, Quaternion::identity(), 1e-12).unwrap();
        for (&ti, r) in t.iter().zip(&frame) {
            let expected = Quaternion::from_axis_angle(omega_vec, omega_vec.norm() * ti);
            assert_same_rotation(*r, expected, 1e-9);
        }
    }

    #[test]
    fn test_constant_omega_tilted_axis() {
        let omega_vec = Vector3::new(0.3, -0.4, 1.2);
        let t = uniform_grid(51, 0.02);
        let omega = vec![omega_vec; t.len()];
        let frame =
            integrate_angular_velocity(&t, &omega, Quaternion::identity(), 1e-12).unwrap();
        let t_last = t[t.len() - 1];
        let expected = Quaternion::from_axis_angle(omega_vec, omega_vec.norm() * t_last);
        assert_same_rotation(frame[frame.len() - 1], expected, 1e-9);
    }

    #[test]
    fn test_initial_rotation_carried() {
        let r0 = Quaternion::from_axis_angle(Vector3::x(), 0.4);
        let t = uniform_grid(10, 0.1);
        let omega = vec![Vector3::z(); t.len()];
        let frame = integrate_angular_velocity(&t, &omega, r0, 1e-12).unwrap();
        assert_same_rotation(frame[0], r0, 1e-12);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let t = uniform_grid(5, 0.1);
        let omega = vec![Vector3::z(); 4];
        let err =
            integrate_angular_velocity(&t, &omega, Quaternion::identity(), 1e-12).unwrap_err();
        assert!(matches!(err, WaveformError::ShapeMismatch(_)));
    }

    /// Rigid rotation with an amplitude peaked inside the grid, so the
    /// inspiral spans a usable alignment window.
    fn peaked_waveform(omega: f64, n: usize, dt: f64, peak: f64) -> ModeTimeSeries {
        rigid_rotation_z(omega, uniform_grid(n, dt), move |ti| {
            let d = ti - peak;
            let a = 1.0 / (1.0 + d * d);
            (a, -2.0 * d * a * a)
        })
    }

    #[test]
    fn test_corotating_frame_rigid_rotation() {
        let omega = 0.8;
        let w = peaked_waveform(omega, 120, 0.05, 5.0);
        let frame = corotating_frame(&w, Quaternion::identity(), 1e-12, None).unwrap();
        for (&ti, r) in w.t().iter().zip(&frame) {
            let expected = Quaternion::from_axis_angle(Vector3::z(), omega * ti);
            assert_same_rotation(*r, expected, 1e-8);
        }
    }

    #[test]
    fn test_alignment_identity_when_already_aligned() {
        // Axis is exactly z throughout, so the correction rotor is identity
        let w = peaked_waveform(0.8, 200, 0.05, 8.0);
        let plain = corotating_frame(&w, Quaternion::identity(), 1e-12, None).unwrap();
        let aligned =
            corotating_frame(&w, Quaternion::identity(), 1e-12, Some((0.1, 0.9))).unwrap();
        for (p, a) in plain.iter().zip(&aligned) {
            assert_same_rotation(*p, *a, 1e-9);
        }
    }

    #[test]
    fn test_degenerate_alignment_window_fails() {
        // Strictly decaying amplitude peaks at the first sample, so the
        // inspiral has zero length and the window cannot resolve. A
        // constant envelope is not enough: |e^{-2iΩt}|² picks up
        // last-ulp noise that can move the peak off sample 0.
        let w = rigid_rotation_z(0.5, uniform_grid(50, 0.1), |ti| {
            let a = 1.0 / (1.0 + ti);
            (a, -a * a)
        });
        assert_eq!(w.max_norm_time(), 0.0);
        let err = corotating_frame(&w, Quaternion::identity(), 1e-12, Some((0.1, 0.9)))
            .unwrap_err();
        assert!(matches!(err, WaveformError::DegenerateAlignment(_)));
    }

    #[test]
    fn test_omega_field_interpolation_clamps() {
        let t = [0.0, 1.0, 2.0];
        let omega = [Vector3::x(), Vector3::y(), Vector3::z()];
        let field = OmegaField {
            t: &t,
            omega: &omega,
        };
        assert_relative_eq!((field.at(-5.0) - Vector3::x()).norm(), 0.0);
        assert_relative_eq!((field.at(9.0) - Vector3::z()).norm(), 0.0);
        let mid = field.at(0.5);
        assert_relative_eq!(mid.x, 0.5, epsilon = 1e-15);
        assert_relative_eq!(mid.y, 0.5, epsilon = 1e-15);
    }
}
