// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! In-memory reference backend: a flattened scene of meshes and nodes

use super::adapter::RenderBackend;
use super::visual::VisOptions;
use crate::geometry::{BoundingBox, Mesh};
use anyhow::Result;
use nalgebra::Matrix4;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct SceneMesh {
    /// Solid name the mesh was built from
    pub key: String,
    pub mesh: Mesh,
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    /// Index into [`SceneCollector::meshes`]
    pub mesh: usize,
    pub matrix: Matrix4<f64>,
    pub visual: VisOptions,
}

#[derive(Debug, Clone, Default)]
pub struct SceneCollector {
    pub meshes: Vec<SceneMesh>,
    pub nodes: Vec<SceneNode>,
}

impl SceneCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn mesh_of(&self, node: &SceneNode) -> Option<&Mesh> {
        self.meshes.get(node.mesh).map(|m| &m.mesh)
    }

    /// World-space bounds of every node
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for node in &self.nodes {
            let Some(mesh) = self.mesh_of(node) else {
                continue;
            };
            for vertex in &mesh.vertices {
                bbox.expand_to_include(&node.matrix.transform_point(&vertex.position));
            }
        }
        bbox
    }

    /// Write the scene as glTF 2.0 (`.glb` or `.gltf` plus `.bin`)
    pub fn export_gltf(&self, path: impl AsRef<Path>) -> Result<()> {
        super::export_gltf::export_scene(self, path.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl RenderBackend for SceneCollector {
    type MeshHandle = usize;

    fn create_mesh(&mut self, key: &str, mesh: &Mesh) -> Result<usize> {
        self.meshes.push(SceneMesh {
            key: key.to_string(),
            mesh: mesh.clone(),
        });
        Ok(self.meshes.len() - 1)
    }

    fn add_actor(
        &mut self,
        mesh: &usize,
        matrix: &Matrix4<f64>,
        name: &str,
        visual: &VisOptions,
    ) -> Result<()> {
        self.nodes.push(SceneNode {
            name: name.to_string(),
            mesh: *mesh,
            matrix: *matrix,
            visual: visual.clone(),
        });
        Ok(())
    }
}
