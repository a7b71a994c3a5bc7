// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Math utilities: Tait-Bryan rotations, axis-angle extraction and tolerances

use nalgebra::{Matrix3, Rotation3, Unit, UnitQuaternion, Vector3};

/// Rotation matrix for intrinsic Tait-Bryan xyz angles (radians): `Rx(a) * Ry(b) * Rz(c)`
pub fn tait_bryan_to_matrix(angles: &Vector3<f64>) -> Matrix3<f64> {
    let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), angles.x);
    let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), angles.y);
    let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), angles.z);
    (rx * ry * rz).into_inner()
}

/// Recover Tait-Bryan xyz angles from a rotation matrix.
///
/// At gimbal lock (`|m02| == 1`) the z angle is fixed to zero and the whole
/// residual rotation is attributed to x.
pub fn matrix_to_tait_bryan(m: &Matrix3<f64>) -> Vector3<f64> {
    let sy = m[(0, 2)].clamp(-1.0, 1.0);
    let b = sy.asin();
    if sy.abs() < 1.0 - 1e-12 {
        let a = (-m[(1, 2)]).atan2(m[(2, 2)]);
        let c = (-m[(0, 1)]).atan2(m[(0, 0)]);
        Vector3::new(a, b, c)
    } else {
        let a = m[(2, 1)].atan2(m[(1, 1)]);
        Vector3::new(a, b, 0.0)
    }
}

/// Axis and angle (radians) of a rotation matrix, `None` for the identity
pub fn matrix_to_axis_angle(m: &Matrix3<f64>) -> Option<(Unit<Vector3<f64>>, f64)> {
    let rotation = Rotation3::from_matrix_unchecked(*m);
    UnitQuaternion::from_rotation_matrix(&rotation).axis_angle()
}

/// Axis and angle (radians) of a Tait-Bryan xyz rotation
pub fn tait_bryan_to_axis_angle(angles: &Vector3<f64>) -> Option<(Unit<Vector3<f64>>, f64)> {
    matrix_to_axis_angle(&tait_bryan_to_matrix(angles))
}

/// Check if two floats are approximately equal
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Element-wise tolerance comparison of two matrices
pub fn matrix_approx_eq(a: &Matrix3<f64>, b: &Matrix3<f64>, epsilon: f64) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| approx_eq(*x, *y, epsilon))
}
