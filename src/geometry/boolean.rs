// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Boolean operations on polygon meshes

use super::{csg, Mesh};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOp {
    Union,
    Subtraction,
    Intersection,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Union => "Union",
            Self::Subtraction => "Subtraction",
            Self::Intersection => "Intersection",
        };
        f.write_str(name)
    }
}

/// Perform boolean operation between two meshes
pub fn perform_boolean_operation(mesh_a: &Mesh, mesh_b: &Mesh, op: BooleanOp) -> Mesh {
    match op {
        BooleanOp::Union => csg::csg_union(mesh_a, mesh_b),
        BooleanOp::Subtraction => csg::csg_difference(mesh_a, mesh_b),
        BooleanOp::Intersection => csg::csg_intersection(mesh_a, mesh_b),
    }
}
