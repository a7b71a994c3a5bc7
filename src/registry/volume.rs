// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Logical volumes and their placements

use super::scalar::{Position, Rotation};
use crate::render::VisOptions;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Volume with an optional solid. A volume without a solid is an assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalVolume {
    pub name: String,
    pub solid: Option<String>,
    pub material: Option<String>,
    pub daughters: Vec<PhysicalVolume>,
}

impl LogicalVolume {
    pub fn new(
        name: impl Into<String>,
        solid: impl Into<String>,
        material: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            solid: Some(solid.into()),
            material: Some(material.into()),
            daughters: Vec::new(),
        }
    }

    pub fn assembly(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            solid: None,
            material: None,
            daughters: Vec::new(),
        }
    }

    pub fn is_assembly(&self) -> bool {
        self.solid.is_none()
    }

    pub fn add_daughter(&mut self, daughter: PhysicalVolume) {
        self.daughters.push(daughter);
    }
}

/// A placed daughter of a logical volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalVolume {
    pub name: String,
    pub kind: PlacementKind,
    /// Explicit visual attributes, taking precedence over material lookup
    #[serde(default)]
    pub visual: Option<VisOptions>,
}

impl PhysicalVolume {
    pub fn new(name: impl Into<String>, kind: PlacementKind) -> Self {
        Self {
            name: name.into(),
            kind,
            visual: None,
        }
    }

    /// Single placement of `logical` at a rotation and position
    pub fn placement(
        name: impl Into<String>,
        logical: impl Into<String>,
        rotation: Rotation,
        position: Position,
    ) -> Self {
        Self::new(
            name,
            PlacementKind::Placement {
                logical: logical.into(),
                rotation,
                position,
                scale: None,
            },
        )
    }

    pub fn with_visual(mut self, visual: VisOptions) -> Self {
        self.visual = Some(visual);
        self
    }

    /// Name of the logical volume this placement refers to
    pub fn logical(&self) -> &str {
        match &self.kind {
            PlacementKind::Placement { logical, .. } => logical,
            PlacementKind::Replica(set)
            | PlacementKind::Division(set)
            | PlacementKind::Parametrised(set) => &set.logical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlacementKind {
    Placement {
        logical: String,
        rotation: Rotation,
        position: Position,
        scale: Option<Vector3<f64>>,
    },
    Replica(ReplicaSet),
    Division(ReplicaSet),
    Parametrised(ReplicaSet),
}

/// Axis along which a replica is repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicaAxis {
    X,
    Y,
    Z,
    Phi,
}

/// One pre-computed copy: its solid plus a local transform applied without inversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaInstance {
    pub solid: String,
    /// Tait-Bryan xyz angles in radians
    pub rotation: Vector3<f64>,
    /// Translation in millimetres
    pub position: Vector3<f64>,
}

/// Copies generated from one rule; the replicated logical volume supplies the material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaSet {
    pub logical: String,
    pub instances: Vec<ReplicaInstance>,
}

impl ReplicaSet {
    pub fn new(logical: impl Into<String>, instances: Vec<ReplicaInstance>) -> Self {
        Self {
            logical: logical.into(),
            instances,
        }
    }

    /// `count` copies of `solid` stepped by `width` along `axis`, centred on the mother.
    /// For [`ReplicaAxis::Phi`] `width` and `offset` are angles in radians.
    pub fn along_axis(
        logical: impl Into<String>,
        solid: impl Into<String>,
        axis: ReplicaAxis,
        count: usize,
        width: f64,
        offset: f64,
    ) -> Self {
        let solid = solid.into();
        let instances = (0..count)
            .map(|i| {
                let i = i as f64;
                let step = -width * (count as f64 - 1.0) * 0.5 + i * width + offset;
                let (rotation, position) = match axis {
                    ReplicaAxis::X => (Vector3::zeros(), Vector3::new(step, 0.0, 0.0)),
                    ReplicaAxis::Y => (Vector3::zeros(), Vector3::new(0.0, step, 0.0)),
                    ReplicaAxis::Z => (Vector3::zeros(), Vector3::new(0.0, 0.0, step)),
                    ReplicaAxis::Phi => (
                        Vector3::new(0.0, 0.0, offset + width * (i + 0.5)),
                        Vector3::zeros(),
                    ),
                };
                ReplicaInstance {
                    solid: solid.clone(),
                    rotation,
                    position,
                }
            })
            .collect();
        Self::new(logical, instances)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
