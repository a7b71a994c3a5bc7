// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Solid definitions

use super::scalar::{Position, Rotation, Scalar, Vector3Expr};
use super::Registry;
use crate::error::GeometryResult;
use crate::geometry::{BooleanOp, Primitive, DEFAULT_NSLICE, DEFAULT_NSTACK};
use crate::utils::{AngleUnit, LengthUnit};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Rigid transform of the second operand relative to the first operand's frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BooleanTransform {
    pub rotation: Rotation,
    pub position: Position,
}

impl BooleanTransform {
    pub fn new(rotation: Rotation, position: Position) -> Self {
        Self { rotation, position }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    /// Literal transform: radians and millimetres
    pub fn from_values(rotation: [f64; 3], translation: [f64; 3]) -> Self {
        Self::new(
            Rotation::new(rotation[0], rotation[1], rotation[2]),
            Position::new(translation[0], translation[1], translation[2]),
        )
    }

    /// Resolved (angles in radians, translation in millimetres)
    pub fn resolve(&self, registry: &Registry) -> GeometryResult<(Vector3<f64>, Vector3<f64>)> {
        Ok((self.rotation.resolve(registry)?, self.position.resolve(registry)?))
    }
}

/// Two-operand boolean: `first` is the primary frame, `second` is placed by `transform`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanSolid {
    pub first: String,
    pub second: String,
    pub transform: BooleanTransform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolidKind {
    Box {
        x: Scalar,
        y: Scalar,
        z: Scalar,
        unit: LengthUnit,
    },
    Tet {
        vertices: [Vector3Expr; 4],
        unit: LengthUnit,
    },
    Orb {
        r: Scalar,
        unit: LengthUnit,
        nslice: u32,
        nstack: u32,
    },
    Tubs {
        rmin: Scalar,
        rmax: Scalar,
        z: Scalar,
        start_phi: Scalar,
        delta_phi: Scalar,
        lunit: LengthUnit,
        aunit: AngleUnit,
        nslice: u32,
    },
    Union(BooleanSolid),
    Subtraction(BooleanSolid),
    Intersection(BooleanSolid),
    MultiUnion {
        operands: Vec<String>,
        transforms: Vec<BooleanTransform>,
    },
}

impl SolidKind {
    /// Operation and operands of a two-operand boolean
    pub fn as_boolean(&self) -> Option<(BooleanOp, &BooleanSolid)> {
        match self {
            Self::Union(b) => Some((BooleanOp::Union, b)),
            Self::Subtraction(b) => Some((BooleanOp::Subtraction, b)),
            Self::Intersection(b) => Some((BooleanOp::Intersection, b)),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Box { .. } | Self::Tet { .. } | Self::Orb { .. } | Self::Tubs { .. }
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Box { .. } => "Box",
            Self::Tet { .. } => "Tet",
            Self::Orb { .. } => "Orb",
            Self::Tubs { .. } => "Tubs",
            Self::Union(_) => "Union",
            Self::Subtraction(_) => "Subtraction",
            Self::Intersection(_) => "Intersection",
            Self::MultiUnion { .. } => "MultiUnion",
        }
    }
}

/// Named solid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solid {
    pub name: String,
    pub kind: SolidKind,
}

impl Solid {
    pub fn new(name: impl Into<String>, kind: SolidKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Box with full edge lengths in millimetres
    pub fn cuboid(name: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self::new(
            name,
            SolidKind::Box {
                x: x.into(),
                y: y.into(),
                z: z.into(),
                unit: LengthUnit::Mm,
            },
        )
    }

    pub fn tet(name: impl Into<String>, vertices: [[f64; 3]; 4]) -> Self {
        Self::new(
            name,
            SolidKind::Tet {
                vertices: vertices.map(|[x, y, z]| Vector3Expr::new(x, y, z)),
                unit: LengthUnit::Mm,
            },
        )
    }

    pub fn orb(name: impl Into<String>, r: f64) -> Self {
        Self::new(
            name,
            SolidKind::Orb {
                r: r.into(),
                unit: LengthUnit::Mm,
                nslice: DEFAULT_NSLICE,
                nstack: DEFAULT_NSTACK,
            },
        )
    }

    /// Tube segment; lengths in millimetres, angles in radians
    pub fn tubs(
        name: impl Into<String>,
        rmin: f64,
        rmax: f64,
        z: f64,
        start_phi: f64,
        delta_phi: f64,
    ) -> Self {
        Self::new(
            name,
            SolidKind::Tubs {
                rmin: rmin.into(),
                rmax: rmax.into(),
                z: z.into(),
                start_phi: start_phi.into(),
                delta_phi: delta_phi.into(),
                lunit: LengthUnit::Mm,
                aunit: AngleUnit::Rad,
                nslice: DEFAULT_NSLICE,
            },
        )
    }

    pub fn boolean(
        name: impl Into<String>,
        op: BooleanOp,
        first: impl Into<String>,
        second: impl Into<String>,
        transform: BooleanTransform,
    ) -> Self {
        let operands = BooleanSolid {
            first: first.into(),
            second: second.into(),
            transform,
        };
        let kind = match op {
            BooleanOp::Union => SolidKind::Union(operands),
            BooleanOp::Subtraction => SolidKind::Subtraction(operands),
            BooleanOp::Intersection => SolidKind::Intersection(operands),
        };
        Self::new(name, kind)
    }

    pub fn union(
        name: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
        transform: BooleanTransform,
    ) -> Self {
        Self::boolean(name, BooleanOp::Union, first, second, transform)
    }

    pub fn subtraction(
        name: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
        transform: BooleanTransform,
    ) -> Self {
        Self::boolean(name, BooleanOp::Subtraction, first, second, transform)
    }

    pub fn intersection(
        name: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
        transform: BooleanTransform,
    ) -> Self {
        Self::boolean(name, BooleanOp::Intersection, first, second, transform)
    }

    pub fn multi_union(
        name: impl Into<String>,
        operands: Vec<String>,
        transforms: Vec<BooleanTransform>,
    ) -> Self {
        Self::new(name, SolidKind::MultiUnion { operands, transforms })
    }

    /// Names of the solids this one is built from, in operand order
    pub fn operands(&self) -> Vec<&str> {
        match &self.kind {
            SolidKind::Union(b) | SolidKind::Subtraction(b) | SolidKind::Intersection(b) => {
                vec![b.first.as_str(), b.second.as_str()]
            }
            SolidKind::MultiUnion { operands, .. } => operands.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Resolve a primitive solid's parameters; `None` for booleans
    pub fn primitive(&self, registry: &Registry) -> GeometryResult<Option<Primitive>> {
        let primitive = match &self.kind {
            SolidKind::Box { x, y, z, unit } => {
                let size = Vector3::new(
                    x.resolve(registry)?,
                    y.resolve(registry)?,
                    z.resolve(registry)?,
                );
                Primitive::cuboid(size * unit.factor())
            }
            SolidKind::Tet { vertices, unit } => {
                let mut points = [Point3::origin(); 4];
                for (point, expr) in points.iter_mut().zip(vertices) {
                    *point = Point3::from(expr.resolve(registry)? * unit.factor());
                }
                Primitive::tet(points)
            }
            SolidKind::Orb {
                r,
                unit,
                nslice,
                nstack,
            } => Primitive::Orb {
                r: r.resolve(registry)? * unit.factor(),
                nslice: *nslice,
                nstack: *nstack,
            },
            SolidKind::Tubs {
                rmin,
                rmax,
                z,
                start_phi,
                delta_phi,
                lunit,
                aunit,
                nslice,
            } => Primitive::Tubs {
                rmin: rmin.resolve(registry)? * lunit.factor(),
                rmax: rmax.resolve(registry)? * lunit.factor(),
                z: z.resolve(registry)? * lunit.factor(),
                start_phi: start_phi.resolve(registry)? * aunit.factor(),
                delta_phi: delta_phi.resolve(registry)? * aunit.factor(),
                nslice: *nslice,
            },
            _ => return Ok(None),
        };
        Ok(Some(primitive))
    }
}
