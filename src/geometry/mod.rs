// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Geometry module - mesh representation and operations

mod bbox;
mod boolean;
pub mod csg;
mod mesh;
mod primitives;

pub use bbox::BoundingBox;
pub use boolean::{perform_boolean_operation, BooleanOp};
pub use mesh::{Mesh, Polygon, Vertex};
pub use primitives::{Primitive, DEFAULT_NSLICE, DEFAULT_NSTACK};
