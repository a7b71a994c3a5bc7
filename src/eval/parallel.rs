// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Level-by-level parallel evaluation using rayon
//!
//! Solids are grouped by their depth in the operand DAG. Every solid of a
//! level only depends on lower levels, so each level can be meshed on the
//! rayon pool without any locking beyond the result map. Each distinct
//! solid is computed exactly once.

use super::evaluator::Evaluator;
use crate::error::{GeometryError, GeometryResult};
use crate::geometry::Mesh;
use crate::registry::Registry;
use ahash::AHashMap;
use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

impl Evaluator {
    /// Evaluate several solids (and everything they depend on) on the rayon pool.
    ///
    /// Results are returned in the order of `names`. Already cached meshes are
    /// reused; new ones are published to the cache when caching is enabled.
    pub fn evaluate_many<S: AsRef<str> + Sync>(
        &self,
        registry: &Registry,
        names: &[S],
    ) -> GeometryResult<Vec<Arc<Mesh>>> {
        for name in names {
            self.validate(registry, name.as_ref())?;
        }

        let mut levels = AHashMap::new();
        for name in names {
            solid_level(registry, name.as_ref(), &mut levels)?;
        }

        let mut by_level: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
        for (name, level) in &levels {
            by_level.entry(*level).or_default().push(name.as_str());
        }

        info!(
            solids = levels.len(),
            levels = by_level.len(),
            "evaluating solids in parallel"
        );

        let results: DashMap<String, Arc<Mesh>> = DashMap::new();
        for (level, mut solids) in by_level {
            solids.sort_unstable();
            debug!(level, count = solids.len(), "evaluating level");

            solids.par_iter().try_for_each(|name| -> GeometryResult<()> {
                let mesh = match self.get_cached(name) {
                    Some(mesh) => mesh,
                    None => {
                        let solid = registry.solid_by_name(name)?;
                        let mesh = self.build_mesh(registry, solid, |operand| {
                            lookup(&results, operand)
                        })?;
                        Arc::new(mesh)
                    }
                };
                results.insert(name.to_string(), mesh);
                Ok(())
            })?;
        }

        let mut meshes = Vec::with_capacity(names.len());
        for name in names {
            let mesh = lookup(&results, name.as_ref())?;
            meshes.push(self.store(name.as_ref(), mesh));
        }
        // Publish dependencies too so later serial calls hit the cache
        for entry in results.iter() {
            self.store(entry.key(), entry.value().clone());
        }
        Ok(meshes)
    }
}

fn lookup(results: &DashMap<String, Arc<Mesh>>, name: &str) -> GeometryResult<Arc<Mesh>> {
    results
        .get(name)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| GeometryError::solid_not_found(name))
}

/// 0 for primitives, otherwise one more than the deepest operand.
/// Callers validate first, so the recursion terminates.
fn solid_level(
    registry: &Registry,
    name: &str,
    levels: &mut AHashMap<String, usize>,
) -> GeometryResult<usize> {
    if let Some(level) = levels.get(name) {
        return Ok(*level);
    }
    let solid = registry.solid_by_name(name)?;
    let mut level = 0;
    for operand in solid.operands() {
        level = level.max(solid_level(registry, operand, levels)? + 1);
    }
    levels.insert(name.to_string(), level);
    Ok(level)
}
