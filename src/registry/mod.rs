// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Registry of named defines, solids and logical volumes
//!
//! The registry is the single source of truth for a geometry. It is filled
//! during model construction and passed explicitly (read-only) to the
//! evaluator and the placement traversal.

mod dependency_graph;
mod scalar;
mod solid;
mod volume;

pub use dependency_graph::DependencyGraph;
pub use scalar::{Position, Rotation, Scalar, Vector3Expr};
pub use solid::{BooleanSolid, BooleanTransform, Solid, SolidKind};
pub use volume::{
    LogicalVolume, PhysicalVolume, PlacementKind, ReplicaAxis, ReplicaInstance, ReplicaSet,
};

use crate::error::{GeometryError, GeometryResult};
use ahash::AHashMap;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Registry {
    defines: AHashMap<String, f64>,
    solids: AHashMap<String, Solid>,
    /// Solid names in insertion order
    solid_order: Vec<String>,
    logical_volumes: AHashMap<String, LogicalVolume>,
    world: Option<String>,
    graph: DependencyGraph,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite a named constant
    pub fn add_define(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.defines.insert(name.into(), value)
    }

    pub fn define(&self, name: &str) -> GeometryResult<f64> {
        self.defines
            .get(name)
            .copied()
            .ok_or_else(|| GeometryError::define_not_found(name))
    }

    /// Add a solid. Names must be unique; operands may be added later.
    pub fn add_solid(&mut self, solid: Solid) -> GeometryResult<()> {
        if self.contains_solid(&solid.name) {
            return Err(GeometryError::Configuration {
                solid: solid.name,
                details: "a solid with this name already exists".to_string(),
            });
        }
        self.graph.set_operands(&solid.name, &solid.operands());
        self.solid_order.push(solid.name.clone());
        self.solids.insert(solid.name.clone(), solid);
        Ok(())
    }

    /// Replace an existing solid's definition and return every solid whose
    /// mesh depends on it (the solid itself first)
    pub fn replace_solid(&mut self, solid: Solid) -> GeometryResult<Vec<String>> {
        if !self.contains_solid(&solid.name) {
            return Err(GeometryError::solid_not_found(solid.name));
        }
        self.graph.set_operands(&solid.name, &solid.operands());
        let affected = self.graph.affected_by(&solid.name);
        debug!(solid = %solid.name, affected = affected.len(), "replaced solid");
        self.solids.insert(solid.name.clone(), solid);
        Ok(affected)
    }

    pub fn solid_by_name(&self, name: &str) -> GeometryResult<&Solid> {
        self.solids
            .get(name)
            .ok_or_else(|| GeometryError::solid_not_found(name))
    }

    pub fn contains_solid(&self, name: &str) -> bool {
        self.solids.contains_key(name)
    }

    /// Solids in insertion order
    pub fn solids(&self) -> impl Iterator<Item = &Solid> {
        self.solid_order.iter().filter_map(|name| self.solids.get(name))
    }

    pub fn solid_count(&self) -> usize {
        self.solids.len()
    }

    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn add_logical_volume(&mut self, volume: LogicalVolume) -> GeometryResult<()> {
        if self.logical_volumes.contains_key(&volume.name) {
            return Err(GeometryError::Configuration {
                solid: volume.name,
                details: "a logical volume with this name already exists".to_string(),
            });
        }
        self.logical_volumes.insert(volume.name.clone(), volume);
        Ok(())
    }

    pub fn logical_volume(&self, name: &str) -> GeometryResult<&LogicalVolume> {
        self.logical_volumes
            .get(name)
            .ok_or_else(|| GeometryError::volume_not_found(name))
    }

    /// Place a daughter inside `mother`
    pub fn add_physical_volume(&mut self, mother: &str, daughter: PhysicalVolume) -> GeometryResult<()> {
        let volume = self
            .logical_volumes
            .get_mut(mother)
            .ok_or_else(|| GeometryError::volume_not_found(mother))?;
        volume.add_daughter(daughter);
        Ok(())
    }

    pub fn set_world(&mut self, name: &str) -> GeometryResult<()> {
        self.logical_volume(name)?;
        self.world = Some(name.to_string());
        Ok(())
    }

    pub fn world_volume(&self) -> GeometryResult<&LogicalVolume> {
        let name = self
            .world
            .as_deref()
            .ok_or_else(|| GeometryError::volume_not_found("<world>"))?;
        self.logical_volume(name)
    }
}
