// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Kernel API tying a registry to evaluation, traversal and rendering

use crate::config::SceneConfig;
use crate::error::GeometryResult;
use crate::eval::{boolean_operands, CacheStats, Evaluator};
use crate::geometry::Mesh;
use crate::registry::{PlacementKind, Registry, Solid};
use crate::render::{section_instances, RenderAdapter, RenderBackend, RenderStats, SceneCollector, Segment};
use crate::scene::{traverse, Instance, Transform, Traversal};
use ahash::AHashSet;
use anyhow::Result;
use nalgebra::{Point3, Vector3};
use std::sync::Arc;
use tracing::info;

/// Main kernel: owns the registry and a mesh-caching evaluator
pub struct Kernel {
    registry: Registry,
    evaluator: Evaluator,
    config: SceneConfig,
}

impl Kernel {
    /// Create a kernel with the default configuration
    pub fn new(registry: Registry) -> Self {
        Self::with_config(registry, SceneConfig::default())
    }

    pub fn with_config(registry: Registry, config: SceneConfig) -> Self {
        Self {
            evaluator: Evaluator::with_options(config.evaluator_options()),
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable registry access.
    ///
    /// Cached meshes are not invalidated here; use [`Kernel::replace_solid`]
    /// to change a solid that may already have been evaluated.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Evaluate a solid by name
    pub fn evaluate(&self, name: &str) -> GeometryResult<Arc<Mesh>> {
        self.evaluator.evaluate(&self.registry, name)
    }

    /// Swap a solid's definition and drop every cached mesh depending on it
    pub fn replace_solid(&mut self, solid: Solid) -> GeometryResult<Vec<String>> {
        let affected = self.registry.replace_solid(solid)?;
        self.evaluator.invalidate(&affected);
        Ok(affected)
    }

    /// Traverse from the logical volume `root` placed at `transform`
    pub fn traverse(&self, root: &str, transform: Transform) -> GeometryResult<Traversal<'_>> {
        traverse(
            &self.registry,
            &self.evaluator,
            root,
            transform,
            self.config.traversal_options(),
        )
    }

    /// Traverse the whole geometry from the world volume
    pub fn traverse_world(&self) -> GeometryResult<Traversal<'_>> {
        let world = self.registry.world_volume()?;
        Ok(Traversal::new(
            &self.registry,
            &self.evaluator,
            world,
            Transform::identity(),
            self.config.traversal_options(),
        ))
    }

    /// The evaluated solid plus its leaf operands, placed for display
    pub fn boolean_operands(&self, name: &str) -> GeometryResult<Vec<Instance>> {
        boolean_operands(&self.evaluator, &self.registry, name)
    }

    /// Evaluate every solid used below the world volume in parallel
    pub fn prepare(&self) -> GeometryResult<usize> {
        let world = self.registry.world_volume()?;
        let mut seen = AHashSet::new();
        let mut solids = Vec::new();
        let mut pending = vec![world];

        while let Some(lv) = pending.pop() {
            if !seen.insert(lv.name.as_str()) {
                continue;
            }
            if let Some(solid) = &lv.solid {
                solids.push(solid.as_str());
            }
            for pv in &lv.daughters {
                match &pv.kind {
                    PlacementKind::Placement { logical, .. } => {
                        pending.push(self.registry.logical_volume(logical)?);
                    }
                    PlacementKind::Replica(set)
                    | PlacementKind::Division(set)
                    | PlacementKind::Parametrised(set) => {
                        solids.extend(set.instances.iter().map(|copy| copy.solid.as_str()));
                    }
                }
            }
        }

        solids.sort_unstable();
        solids.dedup();
        self.evaluator.evaluate_many(&self.registry, &solids)?;
        info!(solids = solids.len(), "prepared world meshes");
        Ok(solids.len())
    }

    /// Render the world through `backend` using the configured material visuals
    pub fn render<B: RenderBackend>(&self, backend: B) -> Result<(B, RenderStats)> {
        if self.config.parallel {
            self.prepare()?;
        }
        let mut adapter = RenderAdapter::new(backend, self.config.material_visuals()?);
        let stats = adapter.render(self.traverse_world()?)?;
        Ok((adapter.into_backend(), stats))
    }

    /// Render the world into an in-memory scene
    pub fn render_scene(&self) -> Result<SceneCollector> {
        let (scene, _) = self.render(SceneCollector::new())?;
        Ok(scene)
    }

    /// Cut the world by a plane
    pub fn section(
        &self,
        origin: &Point3<f64>,
        normal: &Vector3<f64>,
    ) -> GeometryResult<Vec<(String, Vec<Segment>)>> {
        section_instances(self.traverse_world()?, origin, normal)
    }

    /// Get cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.evaluator.cache_stats(&self.registry)
    }
}
