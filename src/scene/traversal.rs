// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Depth-first placement traversal
//!
//! [`Traversal`] is a lazy iterator over the placed instances below a root
//! logical volume. It keeps an explicit work stack instead of recursing, so
//! deep hierarchies cannot overflow the call stack, and meshes are only
//! evaluated when the corresponding instance is pulled.

use super::{Instance, RotationConvention, Transform};
use crate::error::{GeometryError, GeometryResult};
use crate::eval::Evaluator;
use crate::registry::{LogicalVolume, PhysicalVolume, PlacementKind, Registry, ReplicaSet};
use crate::render::VisOptions;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalOptions {
    /// How placement rotations are composed
    pub convention: RotationConvention,
    /// Fail with `CyclicReference` when a volume is placed inside itself
    pub detect_cycles: bool,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            convention: RotationConvention::default(),
            detect_cycles: true,
        }
    }
}

enum Work<'a> {
    /// Emit the volume (if it has a solid) and schedule its daughters
    Volume {
        lv: &'a LogicalVolume,
        name: String,
        transform: Transform,
        depth: usize,
        ancestors: Vec<String>,
        visual: Option<VisOptions>,
    },
    /// Resolve one placement inside a mother placed at `transform`
    Daughter {
        pv: &'a PhysicalVolume,
        transform: Transform,
        depth: usize,
        ancestors: Vec<String>,
    },
    /// Emit the remaining copies of a replica rule, starting at `index`
    Replicas {
        pv: &'a PhysicalVolume,
        set: &'a ReplicaSet,
        material: Option<&'a str>,
        transform: Transform,
        index: usize,
        depth: usize,
    },
}

pub struct Traversal<'a> {
    registry: &'a Registry,
    evaluator: &'a Evaluator,
    options: TraversalOptions,
    stack: Vec<Work<'a>>,
    failed: bool,
}

impl<'a> Traversal<'a> {
    /// Traverse from `root`, whose instance is placed at `transform`
    pub fn new(
        registry: &'a Registry,
        evaluator: &'a Evaluator,
        root: &'a LogicalVolume,
        transform: Transform,
        options: TraversalOptions,
    ) -> Self {
        Self {
            registry,
            evaluator,
            options,
            stack: vec![Work::Volume {
                lv: root,
                name: root.name.clone(),
                transform,
                depth: 0,
                ancestors: Vec::new(),
                visual: None,
            }],
            failed: false,
        }
    }

    pub fn options(&self) -> TraversalOptions {
        self.options
    }

    fn step(&mut self, work: Work<'a>) -> GeometryResult<Option<Instance>> {
        match work {
            Work::Volume {
                lv,
                name,
                transform,
                depth,
                ancestors,
                visual,
            } => self.visit_volume(lv, name, transform, depth, ancestors, visual),
            Work::Daughter {
                pv,
                transform,
                depth,
                ancestors,
            } => {
                self.place_daughter(pv, transform, depth, ancestors)?;
                Ok(None)
            }
            Work::Replicas {
                pv,
                set,
                material,
                transform,
                index,
                depth,
            } => {
                let Some(copy) = set.instances.get(index) else {
                    return Ok(None);
                };
                self.stack.push(Work::Replicas {
                    pv,
                    set,
                    material,
                    transform,
                    index: index + 1,
                    depth,
                });

                // Replica transforms are pre-computed and applied as given
                let local = Transform::from_placement(
                    &copy.rotation,
                    &copy.position,
                    None,
                    RotationConvention::Direct,
                );
                Ok(Some(Instance {
                    name: format!("{}_{}", pv.name, index),
                    solid: copy.solid.clone(),
                    mesh: self.evaluator.evaluate(self.registry, &copy.solid)?,
                    transform: transform.compose(&local),
                    material: material.map(str::to_string),
                    visual: pv.visual.clone(),
                    depth,
                }))
            }
        }
    }

    fn visit_volume(
        &mut self,
        lv: &'a LogicalVolume,
        name: String,
        transform: Transform,
        depth: usize,
        mut ancestors: Vec<String>,
        visual: Option<VisOptions>,
    ) -> GeometryResult<Option<Instance>> {
        if self.options.detect_cycles {
            ancestors.push(lv.name.clone());
        }
        // Reversed so daughters pop in insertion order
        for pv in lv.daughters.iter().rev() {
            self.stack.push(Work::Daughter {
                pv,
                transform,
                depth,
                ancestors: ancestors.clone(),
            });
        }

        let Some(solid) = lv.solid.as_deref() else {
            return Ok(None);
        };
        Ok(Some(Instance {
            name,
            solid: solid.to_string(),
            mesh: self.evaluator.evaluate(self.registry, solid)?,
            transform,
            material: lv.material.clone(),
            visual,
            depth,
        }))
    }

    fn place_daughter(
        &mut self,
        pv: &'a PhysicalVolume,
        transform: Transform,
        depth: usize,
        ancestors: Vec<String>,
    ) -> GeometryResult<()> {
        let registry: &'a Registry = self.registry;
        debug!(daughter = %pv.name, logical = pv.logical(), depth = depth + 1, "placing daughter");

        match &pv.kind {
            PlacementKind::Placement {
                logical,
                rotation,
                position,
                scale,
            } => {
                if self.options.detect_cycles && ancestors.iter().any(|a| a == logical) {
                    let mut path = ancestors;
                    path.push(logical.clone());
                    return Err(GeometryError::CyclicReference { path });
                }
                let lv = registry.logical_volume(logical)?;
                let local = Transform::from_placement(
                    &rotation.resolve(registry)?,
                    &position.resolve(registry)?,
                    scale.as_ref(),
                    self.options.convention,
                );
                self.stack.push(Work::Volume {
                    lv,
                    name: pv.name.clone(),
                    transform: transform.compose(&local),
                    depth: depth + 1,
                    ancestors,
                    visual: pv.visual.clone(),
                });
            }
            PlacementKind::Replica(set)
            | PlacementKind::Division(set)
            | PlacementKind::Parametrised(set) => {
                let lv = registry.logical_volume(&set.logical)?;
                self.stack.push(Work::Replicas {
                    pv,
                    set,
                    material: lv.material.as_deref(),
                    transform,
                    index: 0,
                    depth: depth + 1,
                });
            }
        }
        Ok(())
    }
}

impl Iterator for Traversal<'_> {
    type Item = GeometryResult<Instance>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        while let Some(work) = self.stack.pop() {
            match self.step(work) {
                Ok(Some(instance)) => return Some(Ok(instance)),
                Ok(None) => continue,
                Err(err) => {
                    self.failed = true;
                    self.stack.clear();
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

impl std::iter::FusedIterator for Traversal<'_> {}

/// Start a traversal at the logical volume called `root`
pub fn traverse<'a>(
    registry: &'a Registry,
    evaluator: &'a Evaluator,
    root: &str,
    transform: Transform,
    options: TraversalOptions,
) -> GeometryResult<Traversal<'a>> {
    let root = registry.logical_volume(root)?;
    Ok(Traversal::new(registry, evaluator, root, transform, options))
}
