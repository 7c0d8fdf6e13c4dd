use std::ops::{Add, Mul, Neg};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::EPSILON;

/// Quaternion used as a rotor on 3-vectors.
///
/// Frame fields store unit quaternions; intermediate integration state and
/// pure-vector quaternions are not normalized, so construction is raw and
/// normalization is explicit. Antipodal quaternions (q and -q) represent
/// the same rotation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PartialEq for Quaternion {
    fn eq(&self, other: &Self) -> bool {
        (self.w - other.w).abs() < EPSILON
            && (self.x - other.x).abs() < EPSILON
            && (self.y - other.y).abs() < EPSILON
            && (self.z - other.z).abs() < EPSILON
    }
}

impl Quaternion {
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Identity rotor (1, 0, 0, 0).
    pub fn identity() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Pure quaternion (0, v).
    pub fn from_vector(v: Vector3<f64>) -> Self {
        Self {
            w: 0.0,
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }

    /// Rotor for a rotation by `angle` about `axis` (axis need not be unit).
    pub fn from_axis_angle(axis: Vector3<f64>, angle: f64) -> Self {
        let n = axis.norm();
        if n < EPSILON {
            return Self::identity();
        }
        let (s, c) = (0.5 * angle).sin_cos();
        Self {
            w: c,
            x: s * axis.x / n,
            y: s * axis.y / n,
            z: s * axis.z / n,
        }
    }

    /// Vector (imaginary) part.
    pub fn vec(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Normalize to unit length. Returns identity if near-zero magnitude.
    pub fn normalize(self) -> Self {
        let norm = self.norm();
        if norm < EPSILON {
            return Self::identity();
        }
        Self {
            w: self.w / norm,
            x: self.x / norm,
            y: self.y / norm,
            z: self.z / norm,
        }
    }

    /// 4D dot product.
    pub fn dot(self, other: Self) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn conjugate(self) -> Self {
        Self {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    /// Multiplicative inverse: conjugate over squared norm. Returns the
    /// conjugate unchanged for a near-zero quaternion.
    pub fn inverse(self) -> Self {
        let n2 = self.dot(self);
        // n2 is a squared norm, so the zero guard compares against
        // EPSILON squared
        if n2 < EPSILON * EPSILON {
            return self.conjugate();
        }
        Self {
            w: self.w / n2,
            x: -self.x / n2,
            y: -self.y / n2,
            z: -self.z / n2,
        }
    }

    /// Rotate a vector by this rotor: `R v R⁻¹`.
    pub fn rotate(self, v: Vector3<f64>) -> Vector3<f64> {
        (self * Self::from_vector(v) * self.conjugate()).vec()
    }

    /// Express an inertial-frame vector in the frame this rotor defines:
    /// `R⁻¹ v R` (the conjugate sandwich of `rotate`).
    pub fn rotate_into_frame(self, v: Vector3<f64>) -> Vector3<f64> {
        (self.conjugate() * Self::from_vector(v) * self).vec()
    }

    /// Square root of a unit rotor: the rotor halving the rotation angle.
    ///
    /// `None` when `self` is a rotation by π with no preferred half-way
    /// axis (w ≈ -1), where the square root is not unique.
    pub fn sqrt_rotor(self) -> Option<Self> {
        let halfway = Self {
            w: self.w + 1.0,
            ..self
        };
        if halfway.norm() < EPSILON {
            return None;
        }
        Some(halfway.normalize())
    }
}

impl Neg for Quaternion {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            w: -self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl Add for Quaternion {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            w: self.w + rhs.w,
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

/// Hamilton product (quaternion multiplication).
impl Mul for Quaternion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        }
    }
}

impl Mul<f64> for Quaternion {
    type Output = Self;

    fn mul(self, s: f64) -> Self {
        Self {
            w: self.w * s,
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_unit(q: Quaternion) {
        assert!((q.norm() - 1.0).abs() < 1e-10, "not unit: norm = {}", q.norm());
    }

    fn assert_approx_eq(a: Quaternion, b: Quaternion, tol: f64) {
        // Check both q and -q (antipodal equivalence for rotations)
        let direct = (a.w - b.w)
            .abs()
            .max((a.x - b.x).abs())
            .max((a.y - b.y).abs())
            .max((a.z - b.z).abs());
        let antipodal = (a.w + b.w)
            .abs()
            .max((a.x + b.x).abs())
            .max((a.y + b.y).abs())
            .max((a.z + b.z).abs());
        let min_diff = direct.min(antipodal);
        assert!(
            min_diff < tol,
            "quaternions not approx equal: {a:?} vs {b:?} (min_diff = {min_diff})"
        );
    }

    #[test]
    fn test_normalize_near_zero() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 0.0).normalize();
        assert_eq!(q, Quaternion::identity());
    }

    #[test]
    fn test_hamilton_product_identity() {
        let q = Quaternion::from_axis_angle(Vector3::new(1.0, 2.0, -0.5), 0.8);
        assert_approx_eq(q * Quaternion::identity(), q, 1e-12);
        assert_approx_eq(Quaternion::identity() * q, q, 1e-12);
    }

    #[test]
    fn test_hamilton_product_associative() {
        let a = Quaternion::from_axis_angle(Vector3::x(), 0.3);
        let b = Quaternion::from_axis_angle(Vector3::y(), 1.1);
        let c = Quaternion::from_axis_angle(Vector3::z(), -0.7);
        assert_approx_eq((a * b) * c, a * (b * c), 1e-12);
    }

    #[test]
    fn test_inverse() {
        let q = Quaternion::from_axis_angle(Vector3::new(0.2, -1.0, 0.4), 2.1);
        assert_approx_eq(q * q.inverse(), Quaternion::identity(), 1e-12);
        assert_approx_eq(q.inverse() * q, Quaternion::identity(), 1e-12);
    }

    #[test]
    fn test_inverse_of_small_quaternion() {
        // A small but nonzero quaternion still gets a genuine inverse;
        // only norms below EPSILON fall back to the conjugate
        let q = Quaternion::new(1e-6, 0.0, 0.0, 0.0);
        let inv = q.inverse();
        assert_relative_eq!(inv.w, 1e6, epsilon = 1e-4);
        assert_approx_eq(q * inv, Quaternion::identity(), 1e-10);
    }

    #[test]
    fn test_rotate_z_quarter_turn() {
        let q = Quaternion::from_axis_angle(Vector3::z(), std::f64::consts::FRAC_PI_2);
        let v = q.rotate(Vector3::x());
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(v.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotate_into_frame_is_inverse_rotation() {
        let q = Quaternion::from_axis_angle(Vector3::new(1.0, 1.0, 0.0), 0.9);
        let v = Vector3::new(0.3, -0.2, 0.8);
        let there = q.rotate(v);
        let back = q.rotate_into_frame(there);
        assert_relative_eq!((back - v).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sqrt_rotor_squares_back() {
        let q = Quaternion::from_axis_angle(Vector3::new(0.1, 0.7, -0.3), 1.7);
        let s = q.sqrt_rotor().unwrap();
        assert_unit(s);
        assert_approx_eq(s * s, q, 1e-12);
    }

    #[test]
    fn test_sqrt_rotor_identity() {
        let s = Quaternion::identity().sqrt_rotor().unwrap();
        assert_approx_eq(s, Quaternion::identity(), 1e-12);
    }

    #[test]
    fn test_sqrt_rotor_half_turn_axis() {
        // Rotation by π about z: sqrt is rotation by π/2 about z
        let q = Quaternion::from_axis_angle(Vector3::z(), std::f64::consts::PI);
        let s = q.sqrt_rotor().unwrap();
        let expected = Quaternion::from_axis_angle(Vector3::z(), std::f64::consts::FRAC_PI_2);
        assert_approx_eq(s, expected, 1e-12);
    }

    #[test]
    fn test_sqrt_rotor_undefined_at_minus_one() {
        let q = Quaternion::new(-1.0, 0.0, 0.0, 0.0);
        assert!(q.sqrt_rotor().is_none());
    }

    #[test]
    fn test_vector_rotor_identity_between_unit_vectors() {
        // sqrt(-b a) rotates a onto b, for pure unit quaternions a, b
        let a = Vector3::new(1.0, 0.0, 0.0);
        let b = Vector3::new(0.0, 1.0, 0.0);
        let r = (Quaternion::from_vector(-b) * Quaternion::from_vector(a))
            .sqrt_rotor()
            .unwrap();
        let rotated = r.rotate(a);
        assert_relative_eq!((rotated - b).norm(), 0.0, epsilon = 1e-12);
    }
}
