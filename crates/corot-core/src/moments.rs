//! Angular-momentum moment accumulators.
//!
//! Everything is contracted in the raising/lowering/longitudinal basis
//! `(L+, L-, Lz)` first, because the ladder operators act on modes by
//! simple shifts (`L+|ell,m⟩ ∝ |ell,m+1⟩`) while `Lx`, `Ly` mix modes:
//!
//! ```text
//! L+ = Lx + i Ly      Lx =    (L+ + L-) / 2
//! L- = Lx - i Ly      Ly = -i (L+ - L-) / 2
//! ```
//!
//! Each ladder term is zeroed whenever an intermediate or final `m` falls
//! outside `[-ell, ell]`; those guards are the physical selection rules and
//! the reason the accumulated Cartesian tensors need an explicit
//! symmetrization pass at the end.
//!
//! The vectors and tensors are expressed in the (possibly non-inertial)
//! mode frame `(X, Y, Z)`, not the inertial frame.

use nalgebra::{Matrix3, Vector3};
use num_complex::Complex64;

use crate::error::Result;
use crate::ladder::ladder;
use crate::modes::ModeTimeSeries;

/// `⟨L̇⟩`: expectation of the angular-momentum operator between a series
/// and its own time derivative, `Im ⟨f| L_a |ḟ⟩` per Cartesian component.
pub fn ldt_vector(w: &ModeTimeSeries) -> Vec<Vector3<f64>> {
    let mut out = vec![Vector3::zeros(); w.n_times()];
    for (k, ell, m) in w.mode_indices() {
        for i in 0..w.n_times() {
            let lp = if m + 1 <= ell {
                w.mode(i, k + 1).conj() * w.mode_dot(i, k) * ladder(ell, m)
            } else {
                Complex64::ZERO
            };
            let lm = if m - 1 >= -ell {
                w.mode(i, k - 1).conj() * w.mode_dot(i, k) * ladder(ell, -m)
            } else {
                Complex64::ZERO
            };
            let lz = w.mode(i, k).conj() * w.mode_dot(i, k) * m as f64;

            out[i].x += 0.5 * (lp.im + lm.im);
            out[i].y += -0.5 * (lp.re - lm.re);
            out[i].z += lz.im;
        }
    }
    out
}

/// `⟨L⟩` between two series: `⟨f| L_a |g⟩` per Cartesian component, as a
/// complex 3-vector at each time sample.
pub fn l_vector(w1: &ModeTimeSeries, w2: &ModeTimeSeries) -> Result<Vec<Vector3<Complex64>>> {
    w1.check_same_layout(w2)?;
    let mut out = vec![Vector3::from_element(Complex64::ZERO); w1.n_times()];
    for (k, ell, m) in w1.mode_indices() {
        for i in 0..w1.n_times() {
            let lp = if m + 1 <= ell {
                w1.mode(i, k + 1).conj() * w2.mode(i, k) * ladder(ell, m)
            } else {
                Complex64::ZERO
            };
            let lm = if m - 1 >= -ell {
                w1.mode(i, k - 1).conj() * w2.mode(i, k) * ladder(ell, -m)
            } else {
                Complex64::ZERO
            };
            let lz = w1.mode(i, k).conj() * w2.mode(i, k) * m as f64;

            out[i].x += 0.5 * (lp + lm);
            out[i].y += -0.5 * Complex64::I * (lp - lm);
            out[i].z += lz;
        }
    }
    Ok(out)
}

/// `⟨LL⟩` for a single series: real, explicitly symmetrized tensor
/// `Re ⟨f| L_a L_b |f⟩` at each time sample.
pub fn ll_matrix(w: &ModeTimeSeries) -> Vec<Matrix3<f64>> {
    let mut out = vec![Matrix3::zeros(); w.n_times()];
    for (k, ell, m) in w.mode_indices() {
        for i in 0..w.n_times() {
            let t = ll_terms(w, w, i, k, ell, m);
            // Symmetrize: boundary-zeroed terms break a-b symmetry term by term
            out[i] += (t + t.transpose()).map(|c| 0.5 * c.re);
        }
    }
    out
}

/// `⟨LL⟩` between two series: complex comparison tensor
/// `⟨f| L_a L_b |g⟩`, symmetrized over the tensor indices.
pub fn ll_comparison_matrix(
    w1: &ModeTimeSeries,
    w2: &ModeTimeSeries,
) -> Result<Vec<Matrix3<Complex64>>> {
    w1.check_same_layout(w2)?;
    let mut out = vec![Matrix3::from_element(Complex64::ZERO); w1.n_times()];
    for (k, ell, m) in w1.mode_indices() {
        for i in 0..w1.n_times() {
            out[i] += ll_terms(w1, w2, i, k, ell, m);
        }
    }
    for m in &mut out {
        *m = (*m + m.transpose()).map(|c| 0.5 * c);
    }
    Ok(out)
}

/// One mode's contribution to `⟨f| L_a L_b |g⟩` at one time sample, in the
/// Cartesian basis.
///
/// Ladder basis products, with each term zeroed when its bra mode does not
/// exist at this `ell`:
///
/// ```text
/// LxLx =   (L+ + L-)(L+ + L-) / 4     LyLx = -i(L+ - L-)(L+ + L-) / 4
/// LxLy = -i(L+ + L-)(L+ - L-) / 4     LyLy =  -(L+ - L-)(L+ - L-) / 4
/// LxLz =   (L+ + L-)(  Lz   ) / 2     LyLz = -i(L+ - L-)(  Lz   ) / 2
/// LzLx =   (  Lz   )(L+ + L-) / 2     LzLy = -i(  Lz   )(L+ - L-) / 2
/// LzLz =   (  Lz   )(  Lz   )
/// ```
fn ll_terms(
    w1: &ModeTimeSeries,
    w2: &ModeTimeSeries,
    i: usize,
    k: usize,
    ell: i64,
    m: i64,
) -> Matrix3<Complex64> {
    let zero = Complex64::ZERO;
    let g = w2.mode(i, k);

    let lplp = if m + 2 <= ell {
        w1.mode(i, k + 2).conj() * g * (ladder(ell, m + 1) * ladder(ell, m))
    } else {
        zero
    };
    let lplm = if m - 1 >= -ell {
        w1.mode(i, k).conj() * g * (ladder(ell, m - 1) * ladder(ell, -m))
    } else {
        zero
    };
    let lmlp = if m + 1 <= ell {
        w1.mode(i, k).conj() * g * (ladder(ell, -(m + 1)) * ladder(ell, m))
    } else {
        zero
    };
    let lmlm = if m - 2 >= -ell {
        w1.mode(i, k - 2).conj() * g * (ladder(ell, -(m - 1)) * ladder(ell, -m))
    } else {
        zero
    };
    let lplz = if m + 1 <= ell {
        w1.mode(i, k + 1).conj() * g * (ladder(ell, m) * m as f64)
    } else {
        zero
    };
    let lzlp = if m + 1 <= ell {
        w1.mode(i, k + 1).conj() * g * ((m + 1) as f64 * ladder(ell, m))
    } else {
        zero
    };
    let lmlz = if m - 1 >= -ell {
        w1.mode(i, k - 1).conj() * g * (ladder(ell, -m) * m as f64)
    } else {
        zero
    };
    let lzlm = if m - 1 >= -ell {
        w1.mode(i, k - 1).conj() * g * ((m - 1) as f64 * ladder(ell, -m))
    } else {
        zero
    };
    let lzlz = w1.mode(i, k).conj() * g * (m * m) as f64;

    let mi = -Complex64::I;
    Matrix3::new(
        0.25 * (lplp + lmlm + lmlp + lplm),
        0.25 * mi * (lplp - lmlm + lmlp - lplm),
        0.5 * (lplz + lmlz),
        0.25 * mi * (lplp - lmlp + lplm - lmlm),
        -0.25 * (lplp - lmlp - lplm + lmlm),
        0.5 * mi * (lplz - lmlz),
        0.5 * (lzlp + lzlm),
        0.5 * mi * (lzlp - lzlm),
        lzlz,
    )
}
