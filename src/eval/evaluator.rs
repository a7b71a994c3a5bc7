// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Solid evaluator - converts registry solids to meshes

use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{BooleanOp, Mesh};
use crate::registry::{BooleanSolid, BooleanTransform, Registry, Solid, SolidKind};
use crate::utils::math::tait_bryan_to_axis_angle;
use ahash::AHashSet;
use dashmap::DashMap;
use nalgebra::Vector3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Thread-safe mesh cache, one slot per solid name
pub type MeshCache = Arc<DashMap<String, Arc<Mesh>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorOptions {
    /// Memoise meshes per solid name across calls
    pub cache_meshes: bool,
    /// Place MultiUnion operands on the rayon pool
    pub parallel: bool,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            cache_meshes: true,
            parallel: false,
        }
    }
}

/// Evaluator with per-solid caching
///
/// The registry is passed to every call and only read. Cached meshes are
/// shared templates: callers clone before mutating.
pub struct Evaluator {
    options: EvaluatorOptions,
    cache: MeshCache,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_options(EvaluatorOptions::default())
    }

    pub fn with_options(options: EvaluatorOptions) -> Self {
        Self {
            options,
            cache: Arc::new(DashMap::new()),
        }
    }

    pub fn options(&self) -> EvaluatorOptions {
        self.options
    }

    /// Evaluate a solid by name and return its local-frame mesh.
    ///
    /// The operand tree is checked before any mesh is built, so missing
    /// operands, malformed MultiUnions and cycles fail fast.
    pub fn evaluate(&self, registry: &Registry, name: &str) -> GeometryResult<Arc<Mesh>> {
        if let Some(mesh) = self.get_cached(name) {
            return Ok(mesh);
        }
        self.validate(registry, name)?;
        self.evaluate_solid(registry, name)
    }

    /// Check that every operand reachable from `name` resolves, that
    /// MultiUnions are well formed and that there are no cycles
    pub fn validate(&self, registry: &Registry, name: &str) -> GeometryResult<()> {
        let mut path = Vec::new();
        let mut done = AHashSet::new();
        validate_solid(registry, name, &mut path, &mut done)
    }

    pub fn get_cached(&self, name: &str) -> Option<Arc<Mesh>> {
        if !self.options.cache_meshes {
            return None;
        }
        self.cache.get(name).map(|entry| entry.value().clone())
    }

    /// Publish a mesh; if another thread got there first its mesh is kept
    pub(crate) fn store(&self, name: &str, mesh: Arc<Mesh>) -> Arc<Mesh> {
        if !self.options.cache_meshes {
            return mesh;
        }
        self.cache
            .entry(name.to_string())
            .or_insert(mesh)
            .value()
            .clone()
    }

    fn evaluate_solid(&self, registry: &Registry, name: &str) -> GeometryResult<Arc<Mesh>> {
        if let Some(mesh) = self.get_cached(name) {
            return Ok(mesh);
        }

        let solid = registry.solid_by_name(name)?;
        let mesh = self.build_mesh(registry, solid, |operand| {
            self.evaluate_solid(registry, operand)
        })?;

        Ok(self.store(name, Arc::new(mesh)))
    }

    /// Build the mesh of one solid, obtaining operand meshes through `operand`
    pub(crate) fn build_mesh<F>(&self, registry: &Registry, solid: &Solid, operand: F) -> GeometryResult<Mesh>
    where
        F: Fn(&str) -> GeometryResult<Arc<Mesh>> + Sync,
    {
        if let Some(primitive) = solid.primitive(registry)? {
            return primitive.try_to_mesh(&solid.name);
        }

        if let Some((op, boolean)) = solid.kind.as_boolean() {
            return self.evaluate_boolean(registry, &solid.name, op, boolean, &operand);
        }

        match &solid.kind {
            SolidKind::MultiUnion {
                operands,
                transforms,
            } => self.evaluate_multi_union(registry, &solid.name, operands, transforms, &operand),
            _ => Err(GeometryError::Configuration {
                solid: solid.name.clone(),
                details: format!("cannot mesh solid of type {}", solid.kind.type_name()),
            }),
        }
    }

    fn evaluate_boolean<F>(
        &self,
        registry: &Registry,
        name: &str,
        op: BooleanOp,
        boolean: &BooleanSolid,
        operand: &F,
    ) -> GeometryResult<Mesh>
    where
        F: Fn(&str) -> GeometryResult<Arc<Mesh>> + Sync,
    {
        debug!(solid = name, op = %op, first = %boolean.first, second = %boolean.second, "evaluating boolean");

        // The first operand is the primary frame and is used as-is
        let first = operand(&boolean.first)?;
        let second = operand(&boolean.second)?;
        let (rotation, translation) = boolean.transform.resolve(registry)?;
        let placed = place_operand(&second, &rotation, &translation);

        if op == BooleanOp::Subtraction && !first.overlaps(&placed) {
            warn!(solid = name, "subtraction operands do not overlap");
            return Err(GeometryError::NullMesh {
                solid: name.to_string(),
            });
        }

        let mesh = first.boolean_operation(&placed, op);
        if mesh.is_empty() {
            warn!(solid = name, op = %op, "boolean produced no polygons");
            return Err(GeometryError::NullMesh {
                solid: name.to_string(),
            });
        }
        Ok(mesh)
    }

    fn evaluate_multi_union<F>(
        &self,
        registry: &Registry,
        name: &str,
        operands: &[String],
        transforms: &[BooleanTransform],
        operand: &F,
    ) -> GeometryResult<Mesh>
    where
        F: Fn(&str) -> GeometryResult<Arc<Mesh>> + Sync,
    {
        check_multi_union(name, operands.len(), transforms.len())?;
        debug!(solid = name, operands = operands.len(), "evaluating multi-union");

        let place = |(solid, transform): (&String, &BooleanTransform)| -> GeometryResult<Mesh> {
            let mesh = operand(solid)?;
            let (rotation, translation) = transform.resolve(registry)?;
            Ok(place_operand(&mesh, &rotation, &translation))
        };

        let placed: GeometryResult<Vec<Mesh>> = if self.options.parallel {
            operands.par_iter().zip(transforms.par_iter()).map(place).collect()
        } else {
            operands.iter().zip(transforms.iter()).map(place).collect()
        };

        let mut placed = placed?.into_iter();
        let mut result = placed.next().unwrap_or_default();
        for mesh in placed {
            result = result.union(&mesh);
        }

        if result.is_empty() {
            warn!(solid = name, "multi-union produced no polygons");
            return Err(GeometryError::NullMesh {
                solid: name.to_string(),
            });
        }
        Ok(result)
    }

    /// Drop cached meshes for the given solids
    pub fn invalidate<S: AsRef<str>>(&self, names: &[S]) {
        for name in names {
            self.cache.remove(name.as_ref());
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Get cache statistics
    pub fn cache_stats(&self, registry: &Registry) -> CacheStats {
        CacheStats {
            cached_solids: self.cache.len(),
            total_solids: registry.solid_count(),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Clone `mesh`, rotate it by the inverse of the Tait-Bryan rotation, then translate
pub fn place_operand(mesh: &Mesh, rotation: &Vector3<f64>, translation: &Vector3<f64>) -> Mesh {
    let mut placed = mesh.clone();
    if let Some((axis, angle)) = tait_bryan_to_axis_angle(rotation) {
        // Stored angles are passive; the mesh rotation is active
        placed.rotate(&axis, -angle.to_degrees());
    }
    placed.translate(translation);
    placed
}

fn check_multi_union(name: &str, operands: usize, transforms: usize) -> GeometryResult<()> {
    if operands == 0 {
        return Err(GeometryError::Configuration {
            solid: name.to_string(),
            details: "multi-union has no operands".to_string(),
        });
    }
    if operands != transforms {
        return Err(GeometryError::Configuration {
            solid: name.to_string(),
            details: format!("{operands} operands but {transforms} transforms"),
        });
    }
    Ok(())
}

fn validate_solid(
    registry: &Registry,
    name: &str,
    path: &mut Vec<String>,
    done: &mut AHashSet<String>,
) -> GeometryResult<()> {
    if done.contains(name) {
        return Ok(());
    }
    if let Some(start) = path.iter().position(|p| p == name) {
        let mut cycle = path[start..].to_vec();
        cycle.push(name.to_string());
        return Err(GeometryError::CyclicReference { path: cycle });
    }

    let solid = registry.solid_by_name(name)?;
    if let SolidKind::MultiUnion {
        operands,
        transforms,
    } = &solid.kind
    {
        check_multi_union(name, operands.len(), transforms.len())?;
    }

    path.push(name.to_string());
    for operand in solid.operands() {
        validate_solid(registry, operand, path, done)?;
    }
    path.pop();
    done.insert(name.to_string());
    Ok(())
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub cached_solids: usize,
    pub total_solids: usize,
}

impl CacheStats {
    /// Percentage of registry solids with a cached mesh
    pub fn coverage(&self) -> f32 {
        if self.total_solids == 0 {
            0.0
        } else {
            (self.cached_solids as f32 / self.total_solids as f32) * 100.0
        }
    }
}
