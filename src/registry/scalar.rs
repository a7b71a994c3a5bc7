// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Scalar and vector parameters that are either literal or refer to a named define

use super::Registry;
use crate::error::GeometryResult;
use crate::utils::{AngleUnit, LengthUnit};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Literal value or the name of a define in the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Value(f64),
    Define(String),
}

impl Scalar {
    pub fn resolve(&self, registry: &Registry) -> GeometryResult<f64> {
        match self {
            Self::Value(v) => Ok(*v),
            Self::Define(name) => registry.define(name),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Scalar {
    fn from(name: &str) -> Self {
        Self::Define(name.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector3Expr {
    pub x: Scalar,
    pub y: Scalar,
    pub z: Scalar,
}

impl Vector3Expr {
    pub fn new(x: impl Into<Scalar>, y: impl Into<Scalar>, z: impl Into<Scalar>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            z: z.into(),
        }
    }

    pub fn zeros() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn resolve(&self, registry: &Registry) -> GeometryResult<Vector3<f64>> {
        Ok(Vector3::new(
            self.x.resolve(registry)?,
            self.y.resolve(registry)?,
            self.z.resolve(registry)?,
        ))
    }
}

impl From<Vector3<f64>> for Vector3Expr {
    fn from(v: Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Translation with a length unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub value: Vector3Expr,
    #[serde(default)]
    pub unit: LengthUnit,
}

impl Position {
    /// Literal position in millimetres
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::with_unit(Vector3Expr::new(x, y, z), LengthUnit::Mm)
    }

    pub fn with_unit(value: Vector3Expr, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub fn zeros() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Resolved translation in millimetres
    pub fn resolve(&self, registry: &Registry) -> GeometryResult<Vector3<f64>> {
        Ok(self.value.resolve(registry)? * self.unit.factor())
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::zeros()
    }
}

/// Tait-Bryan xyz rotation with an angle unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub value: Vector3Expr,
    #[serde(default)]
    pub unit: AngleUnit,
}

impl Rotation {
    /// Literal rotation in radians
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::with_unit(Vector3Expr::new(x, y, z), AngleUnit::Rad)
    }

    pub fn degrees(x: f64, y: f64, z: f64) -> Self {
        Self::with_unit(Vector3Expr::new(x, y, z), AngleUnit::Deg)
    }

    pub fn with_unit(value: Vector3Expr, unit: AngleUnit) -> Self {
        Self { value, unit }
    }

    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Resolved angles in radians
    pub fn resolve(&self, registry: &Registry) -> GeometryResult<Vector3<f64>> {
        Ok(self.value.resolve(registry)? * self.unit.factor())
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}
