//! Conversion between rotation matrices and the ZYZ Euler-angle triple
//! `(rot, tilt, psi)` shared by the RELION-family particle-list formats.
//!
//! The degenerate branch at `tilt ≈ 0` or `tilt ≈ π` mirrors the RELION
//! reference convention (`rot = 0`, the full in-plane rotation folded into
//! `psi`). Many exchange formats depend on this exact tie-break for round-trip
//! correctness; do not change it without checking against that reference.
//!
//! All functions are pure. Angles pass through a single `scale` parameter so
//! the radian and degree conventions share one code path: extracted angles are
//! radians multiplied by `scale`, composed angles are divided by `scale` first.

use nalgebra::{Matrix3, Rotation3};

/// Scale value selecting radians for [`matrix_to_angles`] / [`angles_to_matrix`].
pub const RADIANS: f64 = 1.0;
/// Scale value selecting degrees for [`matrix_to_angles`] / [`angles_to_matrix`].
pub const DEGREES: f64 = 180.0 / std::f64::consts::PI;

/// Threshold on `sqrt(m02² + m12²)` below which a matrix is treated as
/// gimbal-locked. Sixteen machine epsilons in the working precision.
pub const DEGENERACY_EPSILON: f64 = 16.0 * f64::EPSILON;

/// A coordinate axis for [`axis_rotation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Builds the standard right-handed rotation about a coordinate axis by
/// `angle_degrees`.
pub fn axis_rotation(axis: Axis, angle_degrees: f64) -> Rotation3<f64> {
    let (s, c) = angle_degrees.to_radians().sin_cos();
    let m = match axis {
        Axis::X => Matrix3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c),
        Axis::Y => Matrix3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c),
        Axis::Z => Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0),
    };
    Rotation3::from_matrix_unchecked(m)
}

/// Extracts the `(rot, tilt, psi)` triple from a rotation matrix.
///
/// The caller guarantees `m` is orthonormal with determinant +1; malformed
/// input yields a garbage result rather than an error, and is only caught by a
/// debug assertion so the release hot path stays branch-free.
///
/// In the regular case `tilt` lies in `(0, π)` and both `rot` and `psi` are
/// recovered. At the degenerate boundary only `psi − rot` (tilt ≈ 0) or
/// `psi + rot` (tilt ≈ π) is geometrically meaningful; by convention `rot` is
/// reported as zero and the whole in-plane angle as `psi`.
pub fn matrix_to_angles(m: &Matrix3<f64>, scale: f64) -> [f64; 3] {
    debug_assert!(
        is_rotation(m),
        "matrix_to_angles requires an orthonormal matrix with determinant +1"
    );

    let s = (m[(0, 2)] * m[(0, 2)] + m[(1, 2)] * m[(1, 2)]).sqrt();
    let tilt = s.atan2(m[(2, 2)]);

    let (rot, psi) = if s > DEGENERACY_EPSILON {
        (m[(2, 1)].atan2(m[(2, 0)]), m[(1, 2)].atan2(-m[(0, 2)]))
    } else if m[(2, 2)] > 0.0 {
        (0.0, (-m[(1, 0)]).atan2(m[(0, 0)]))
    } else {
        (0.0, m[(1, 0)].atan2(-m[(0, 0)]))
    };

    [rot * scale, tilt * scale, psi * scale]
}

/// Composes the `(rot, tilt, psi)` triple back into a rotation matrix:
/// `Rz(−psi) · Ry(−tilt) · Rz(−rot)`, the exact inverse of
/// [`matrix_to_angles`] on its non-degenerate image.
pub fn angles_to_matrix(rot: f64, tilt: f64, psi: f64, scale: f64) -> Rotation3<f64> {
    let to_deg = DEGREES / scale;
    axis_rotation(Axis::Z, -psi * to_deg)
        * axis_rotation(Axis::Y, -tilt * to_deg)
        * axis_rotation(Axis::Z, -rot * to_deg)
}

fn is_rotation(m: &Matrix3<f64>) -> bool {
    (m * m.transpose() - Matrix3::identity()).norm() < 1e-6 && (m.determinant() - 1.0).abs() < 1e-6
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const TOLERANCE: f64 = 1e-9;

    fn matrices_approx_equal(a: &Matrix3<f64>, b: &Matrix3<f64>, tolerance: f64) -> bool {
        (a - b).norm() < tolerance
    }

    #[test]
    fn axis_builders_are_orthonormal_with_unit_determinant() {
        for angle in (0..360).step_by(15) {
            for axis in [Axis::X, Axis::Y, Axis::Z] {
                let m = axis_rotation(axis, angle as f64);
                assert!(is_rotation(m.matrix()), "{:?} {}", axis, angle);
            }
        }
    }

    #[test]
    fn round_trip_preserves_non_degenerate_matrices() {
        for rot in [-150.0, -60.0, 0.0, 45.0, 120.0] {
            for tilt in [10.0, 45.0, 90.0, 135.0, 170.0] {
                for psi in [-170.0, -30.0, 0.0, 60.0, 155.0] {
                    let m = angles_to_matrix(rot, tilt, psi, DEGREES);
                    let [r, t, p] = matrix_to_angles(m.matrix(), DEGREES);
                    let back = angles_to_matrix(r, t, p, DEGREES);
                    assert!(
                        matrices_approx_equal(m.matrix(), back.matrix(), 1e-6),
                        "({}, {}, {}) -> ({}, {}, {})",
                        rot,
                        tilt,
                        psi,
                        r,
                        t,
                        p
                    );
                }
            }
        }
    }

    #[test]
    fn round_trip_recovers_angles_away_from_degeneracy() {
        let m = angles_to_matrix(25.0, 70.0, -110.0, DEGREES);
        let [r, t, p] = matrix_to_angles(m.matrix(), DEGREES);
        assert!((r - 25.0).abs() < 1e-9);
        assert!((t - 70.0).abs() < 1e-9);
        assert!((p + 110.0).abs() < 1e-9);
    }

    #[test]
    fn scale_parameter_selects_units() {
        let m = angles_to_matrix(0.5, 1.2, -0.7, RADIANS);
        let [r, t, p] = matrix_to_angles(m.matrix(), RADIANS);
        assert!((r - 0.5).abs() < TOLERANCE);
        assert!((t - 1.2).abs() < TOLERANCE);
        assert!((p + 0.7).abs() < TOLERANCE);

        let [rd, td, pd] = matrix_to_angles(m.matrix(), DEGREES);
        assert!((rd - 0.5 * DEGREES).abs() < 1e-6);
        assert!((td - 1.2 * DEGREES).abs() < 1e-6);
        assert!((pd + 0.7 * DEGREES).abs() < 1e-6);
    }

    #[test]
    fn identity_extracts_all_zero_angles() {
        let [r, t, p] = matrix_to_angles(&Matrix3::identity(), RADIANS);
        assert!(r.abs() < TOLERANCE);
        assert!(t.abs() < TOLERANCE);
        assert!(p.abs() < TOLERANCE);
    }

    #[test]
    fn tilt_zero_folds_in_plane_rotation_into_psi() {
        let m = angles_to_matrix(30.0, 0.0, 40.0, DEGREES);
        let [r, t, p] = matrix_to_angles(m.matrix(), DEGREES);
        assert!(r.abs() < TOLERANCE);
        assert!(t.abs() < 1e-6);
        assert!((p - 70.0).abs() < 1e-6);
    }

    #[test]
    fn tilt_pi_uses_the_flipped_degenerate_branch() {
        let flip = axis_rotation(Axis::X, 180.0);
        let [r, t, p] = matrix_to_angles(flip.matrix(), RADIANS);
        assert!(r.abs() < TOLERANCE);
        assert!((t - PI).abs() < 1e-9);

        let back = angles_to_matrix(r, t, p, RADIANS);
        assert!(matrices_approx_equal(flip.matrix(), back.matrix(), 1e-9));
    }

    #[test]
    fn double_x_flip_restores_the_original_orientation() {
        let original = angles_to_matrix(15.0, 80.0, -40.0, DEGREES);
        let flip = axis_rotation(Axis::X, 180.0);
        let flipped_twice = flip * flip * original;
        assert!(matrices_approx_equal(
            original.matrix(),
            flipped_twice.matrix(),
            1e-12
        ));
    }
}
