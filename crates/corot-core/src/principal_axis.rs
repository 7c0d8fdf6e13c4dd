//! Dominant principal axis of the `⟨LL⟩` tensor field.
//!
//! Eigenvectors come out of the per-sample diagonalization with arbitrary
//! sign, so the raw field flips erratically between samples. The continuity
//! pass walks outward from a reference sample in both directions, flipping
//! any candidate that sits closer to the negative of its already-corrected
//! neighbor than to the neighbor itself.

use nalgebra::{Matrix3, SymmetricEigen, Vector3};

use crate::error::{Result, WaveformError};
use crate::modes::ModeTimeSeries;
use crate::moments::ll_matrix;

/// Continuous unit-vector field tracking the eigenvector of the largest
/// eigenvalue of a symmetric tensor field.
///
/// `rough` orients the field at the reference sample `i0`: the corrected
/// vector there has a non-negative dot product with it. For precessing
/// systems the z axis is usually a good rough direction.
pub fn dominant_eigenvector(
    ll: &[Matrix3<f64>],
    rough: Vector3<f64>,
    i0: usize,
) -> Result<Vec<Vector3<f64>>> {
    if i0 >= ll.len() {
        return Err(WaveformError::IndexOutOfRange {
            index: i0,
            len: ll.len(),
        });
    }
    let mut dpa: Vec<Vector3<f64>> = ll
        .iter()
        .map(|m| {
            let eigen = SymmetricEigen::new(*m);
            let mut dominant = 0;
            for j in 1..3 {
                if eigen.eigenvalues[j] > eigen.eigenvalues[dominant] {
                    dominant = j;
                }
            }
            eigen.eigenvectors.column(dominant).into_owned()
        })
        .collect();
    make_continuous(&mut dpa, rough, i0);
    Ok(dpa)
}

/// Dominant eigenvector field of a waveform's own `⟨LL⟩` matrix.
pub fn ll_dominant_eigenvector(
    w: &ModeTimeSeries,
    rough: Vector3<f64>,
    i0: usize,
) -> Result<Vec<Vector3<f64>>> {
    dominant_eigenvector(&ll_matrix(w), rough, i0)
}

/// Two-pass outward sign correction with deferred normalization.
///
/// The flip test compares the squared step to the neighbor against the
/// candidate's own squared norm, so each sample must stay unnormalized
/// until its own flip decision has been used by the next sample; the walk
/// carries the previous norm and normalizes one step behind. Zero- and
/// unit-norm samples skip the division.
fn make_continuous(dpa: &mut [Vector3<f64>], rough: Vector3<f64>, i0: usize) {
    if dpa[i0].dot(&rough) < 0.0 {
        dpa[i0] = -dpa[i0];
    }

    // Outward from i0 toward the start
    let mut last_norm = dpa[i0].norm();
    for i in (0..i0).rev() {
        let norm_sq = dpa[i].norm_squared();
        let step_sq = (dpa[i] - dpa[i + 1]).norm_squared();
        if step_sq > norm_sq {
            dpa[i] = -dpa[i];
        }
        // The neighbor's flip decision is settled; normalize it now
        if last_norm != 0.0 && last_norm != 1.0 {
            dpa[i + 1] /= last_norm;
        }
        last_norm = norm_sq.sqrt();
    }
    if last_norm != 0.0 && last_norm != 1.0 {
        dpa[0] /= last_norm;
    }

    // Outward from i0 toward the end
    let mut last_norm = dpa[i0].norm();
    for i in i0 + 1..dpa.len() {
        let norm_sq = dpa[i].norm_squared();
        let step_sq = (dpa[i] - dpa[i - 1]).norm_squared();
        if step_sq > norm_sq {
            dpa[i] = -dpa[i];
        }
        if last_norm != 0.0 && last_norm != 1.0 {
            dpa[i - 1] /= last_norm;
        }
        last_norm = norm_sq.sqrt();
    }
    if last_norm != 0.0 && last_norm != 1.0 {
        let last = dpa.len() - 1;
        dpa[last] /= last_norm;
    }
}
