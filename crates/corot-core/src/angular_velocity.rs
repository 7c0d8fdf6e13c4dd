//! Angular velocity of the waveform's intrinsic rotation.

use nalgebra::Vector3;

use crate::error::{Result, WaveformError};
use crate::modes::ModeTimeSeries;
use crate::moments::{ldt_vector, ll_matrix};

/// Angular velocity `ω(t)` of the rotating frame in which the time
/// dependence of the modes is minimized, from the per-sample solve of
/// `⟨L̇⟩ = -⟨LL⟩·ω`.
///
/// The vector is given in the (possibly rotating) mode frame `(X, Y, Z)`.
/// Fails at the first sample whose second-moment tensor is singular: the
/// waveform has no well-defined instantaneous rotation axis there, and no
/// partial field is returned.
pub fn angular_velocity(w: &ModeTimeSeries) -> Result<Vec<Vector3<f64>>> {
    let ldt = ldt_vector(w);
    let ll = ll_matrix(w);

    ldt.iter()
        .zip(ll.iter())
        .enumerate()
        .map(|(i, (l, m))| {
            m.lu()
                .solve(&(-*l))
                .ok_or(WaveformError::SingularMoment {
                    index: i,
                    time: w.t()[i],
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{rigid_rotation_z, uniform_grid};
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_rotation_recovered() {
        let omega = 0.7;
        let w = rigid_rotation_z(omega, uniform_grid(40, 0.05), |_| (2.0, 0.0));
        for v in angular_velocity(&w).unwrap() {
            assert_relative_eq!(v.x, 0.0, epsilon = 1e-10);
            assert_relative_eq!(v.y, 0.0, epsilon = 1e-10);
            assert_relative_eq!(v.z, omega, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_amplitude_envelope_does_not_change_omega() {
        // A real envelope a(t) contributes nothing to ⟨L̇⟩'s imaginary parts
        let omega = 0.4;
        let t = uniform_grid(60, 0.1);
        let peak = 4.0;
        let w = rigid_rotation_z(omega, t, |ti| {
            let d = ti - peak;
            let a = 1.0 / (1.0 + d * d);
            (a, -2.0 * d * a * a)
        });
        for v in angular_velocity(&w).unwrap() {
            assert_relative_eq!(v.z, omega, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_singular_tensor_fails() {
        // Zero data → zero ⟨LL⟩ → no rotation axis anywhere
        let t = uniform_grid(5, 1.0);
        let data = vec![num_complex::Complex64::ZERO; 5 * 5];
        let w = ModeTimeSeries::new(t, 2, 2, data).unwrap();
        let err = angular_velocity(&w).unwrap_err();
        assert!(matches!(err, WaveformError::SingularMoment { index: 0, .. }));
    }
}
