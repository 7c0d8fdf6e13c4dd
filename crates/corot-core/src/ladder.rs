//! Angular-momentum ladder operator coefficients.

/// Coefficient of the raising operator: `⟨ell, m+1| L+ |ell, m⟩`.
///
/// Equals `sqrt(ell(ell+1) - m(m+1))`. The lowering coefficient
/// `⟨ell, m-1| L- |ell, m⟩` is `ladder(ell, -m)` by symmetry. Returns 0
/// when the target mode does not exist (the selection rules push
/// `ell(ell+1) - m(m+1)` to zero or below at the ladder boundaries).
pub fn ladder(ell: i64, m: i64) -> f64 {
    let c = (ell * (ell + 1) - m * (m + 1)) as f64;
    if c > 0.0 { c.sqrt() } else { 0.0 }
}
