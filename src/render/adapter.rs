// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Render adapter: feeds placed instances to a rendering backend

use super::visual::{VisOptions, VisualResolver};
use crate::error::GeometryResult;
use crate::geometry::Mesh;
use crate::scene::Instance;
use ahash::AHashMap;
use anyhow::Result;
use nalgebra::Matrix4;
use tracing::{debug, info};

/// Renderer-side sink for meshes and actors
pub trait RenderBackend {
    /// Handle to a renderer-native mesh, shared by every actor using it
    type MeshHandle: Clone;

    fn create_mesh(&mut self, key: &str, mesh: &Mesh) -> Result<Self::MeshHandle>;

    /// Add one actor showing `mesh` at the world transform `matrix`
    fn add_actor(
        &mut self,
        mesh: &Self::MeshHandle,
        matrix: &Matrix4<f64>,
        name: &str,
        visual: &VisOptions,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub meshes_built: usize,
    pub actors_added: usize,
    pub hidden_skipped: usize,
}

/// Builds one backend mesh per solid name and one actor per visible instance.
///
/// An instance's own visual override wins; otherwise the resolver decides.
pub struct RenderAdapter<B: RenderBackend, V: VisualResolver> {
    backend: B,
    resolver: V,
    handles: AHashMap<String, B::MeshHandle>,
    stats: RenderStats,
}

impl<B: RenderBackend, V: VisualResolver> RenderAdapter<B, V> {
    pub fn new(backend: B, resolver: V) -> Self {
        Self {
            backend,
            resolver,
            handles: AHashMap::new(),
            stats: RenderStats::default(),
        }
    }

    pub fn render_instance(&mut self, instance: &Instance) -> Result<()> {
        let visual = match &instance.visual {
            Some(visual) => visual.clone(),
            None => self.resolver.resolve(instance),
        };
        if !visual.visible {
            self.stats.hidden_skipped += 1;
            return Ok(());
        }

        let handle = match self.handles.get(&instance.solid) {
            Some(handle) => handle.clone(),
            None => {
                let handle = self.backend.create_mesh(&instance.solid, &instance.mesh)?;
                self.handles.insert(instance.solid.clone(), handle.clone());
                self.stats.meshes_built += 1;
                debug!(solid = %instance.solid, "built backend mesh");
                handle
            }
        };

        self.backend.add_actor(
            &handle,
            &instance.transform.to_homogeneous(),
            &instance.name,
            &visual,
        )?;
        self.stats.actors_added += 1;
        Ok(())
    }

    /// Render every instance of a traversal, stopping at the first error
    pub fn render<I>(&mut self, instances: I) -> Result<RenderStats>
    where
        I: IntoIterator<Item = GeometryResult<Instance>>,
    {
        for instance in instances {
            self.render_instance(&instance?)?;
        }
        info!(
            meshes = self.stats.meshes_built,
            actors = self.stats.actors_added,
            hidden = self.stats.hidden_skipped,
            "rendered instances"
        );
        Ok(self.stats)
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use crate::render::{FixedVisuals, MaterialVisuals};
    use crate::scene::Transform;
    use nalgebra::Vector3;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        meshes: Vec<String>,
        actors: Vec<(usize, String, [f64; 3])>,
    }

    impl RenderBackend for Recorder {
        type MeshHandle = usize;

        fn create_mesh(&mut self, key: &str, _mesh: &Mesh) -> Result<usize> {
            self.meshes.push(key.to_string());
            Ok(self.meshes.len() - 1)
        }

        fn add_actor(
            &mut self,
            mesh: &usize,
            _matrix: &Matrix4<f64>,
            name: &str,
            visual: &VisOptions,
        ) -> Result<()> {
            self.actors.push((*mesh, name.to_string(), visual.colour));
            Ok(())
        }
    }

    fn instance(name: &str, solid: &str, material: &str) -> Instance {
        Instance {
            name: name.into(),
            solid: solid.into(),
            mesh: Arc::new(Primitive::cuboid(Vector3::new(1.0, 1.0, 1.0)).to_mesh()),
            transform: Transform::identity(),
            material: Some(material.into()),
            visual: None,
            depth: 1,
        }
    }

    #[test]
    fn test_meshes_shared_by_solid_name() {
        let mut adapter = RenderAdapter::new(Recorder::default(), FixedVisuals::default());
        let stats = adapter
            .render(vec![
                Ok(instance("a", "box", "G4_Fe")),
                Ok(instance("b", "box", "G4_Fe")),
                Ok(instance("c", "orb", "G4_Fe")),
            ])
            .unwrap();

        assert_eq!(stats.meshes_built, 2);
        assert_eq!(stats.actors_added, 3);
        let backend = adapter.into_backend();
        assert_eq!(backend.actors[1].0, backend.actors[0].0);
    }

    #[test]
    fn test_override_and_hidden() {
        let resolver = MaterialVisuals::default()
            .with_material("G4_AIR", VisOptions::default().hidden());
        let mut adapter = RenderAdapter::new(Recorder::default(), resolver);

        let mut red = instance("r", "box", "G4_AIR");
        red.visual = Some(VisOptions::new([1.0, 0.0, 0.0], 1.0));
        adapter.render_instance(&red).unwrap();
        adapter.render_instance(&instance("air", "box", "G4_AIR")).unwrap();

        assert_eq!(adapter.stats().hidden_skipped, 1);
        assert_eq!(adapter.backend().actors, vec![(0, "r".to_string(), [1.0, 0.0, 0.0])]);
    }
}
