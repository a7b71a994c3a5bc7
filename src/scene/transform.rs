// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Affine placement transforms stored as a 3x3 matrix plus translation

use crate::error::GeometryError;
use crate::utils::math::{matrix_approx_eq, matrix_to_tait_bryan, tait_bryan_to_matrix};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Mul;
use std::str::FromStr;

/// How a placement's Tait-Bryan rotation enters the composed transform.
///
/// Geant4 placements store the rotation of the mother frame, so the daughter
/// is rotated by its inverse (`Inverse`). `Direct` composes the matrix as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationConvention {
    Direct,
    #[default]
    Inverse,
}

impl fmt::Display for RotationConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Inverse => f.write_str("inverse"),
        }
    }
}

impl FromStr for RotationConvention {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "inverse" => Ok(Self::Inverse),
            other => Err(GeometryError::InvalidParameter {
                solid: String::new(),
                details: format!("unknown rotation convention '{other}'"),
            }),
        }
    }
}

/// `x -> matrix * x + translation`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub matrix: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl Transform {
    pub fn new(matrix: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            matrix,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }

    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self::new(Matrix3::identity(), translation)
    }

    /// Local transform of a placement: `S * R` or `S * R^-1`, then translation
    pub fn from_placement(
        rotation: &Vector3<f64>,
        translation: &Vector3<f64>,
        scale: Option<&Vector3<f64>>,
        convention: RotationConvention,
    ) -> Self {
        let rotation = tait_bryan_to_matrix(rotation);
        let rotation = match convention {
            RotationConvention::Direct => rotation,
            // Orthonormal, so the transpose is the inverse
            RotationConvention::Inverse => rotation.transpose(),
        };
        let matrix = match scale {
            Some(s) => Matrix3::from_diagonal(s) * rotation,
            None => rotation,
        };
        Self::new(matrix, *translation)
    }

    /// Transform of `child` expressed in this transform's parent frame
    pub fn compose(&self, child: &Transform) -> Transform {
        Transform::new(
            self.matrix * child.matrix,
            self.matrix * child.translation + self.translation,
        )
    }

    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        let mut m = self.matrix.to_homogeneous();
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        m
    }

    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.matrix * point.coords + self.translation)
    }

    /// Tait-Bryan angles of the rotation part; only meaningful without scale
    pub fn rotation_angles(&self) -> Vector3<f64> {
        matrix_to_tait_bryan(&self.matrix)
    }

    pub fn approx_eq(&self, other: &Transform, epsilon: f64) -> bool {
        matrix_approx_eq(&self.matrix, &other.matrix, epsilon)
            && (self.translation - other.translation).amax() < epsilon
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.compose(&rhs)
    }
}
