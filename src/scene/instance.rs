// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Placed instances produced by traversal

use super::Transform;
use crate::geometry::{BoundingBox, Mesh};
use crate::render::VisOptions;
use std::sync::Arc;

/// One placed copy of a solid's mesh
#[derive(Debug, Clone)]
pub struct Instance {
    /// Display name: the placement name, or the root volume name
    pub name: String,
    pub solid: String,
    /// Local-frame mesh shared with the evaluator cache
    pub mesh: Arc<Mesh>,
    pub transform: Transform,
    pub material: Option<String>,
    /// Explicit visual override
    pub visual: Option<VisOptions>,
    /// Nesting depth below the traversal root
    pub depth: usize,
}

impl Instance {
    /// Copy of the mesh moved into the world frame
    pub fn world_mesh(&self) -> Mesh {
        let mut mesh = (*self.mesh).clone();
        mesh.transform(&self.transform.to_homogeneous());
        mesh
    }

    pub fn world_bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for vertex in &self.mesh.vertices {
            bbox.expand_to_include(&self.transform.transform_point(&vertex.position));
        }
        bbox
    }
}
