// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Dependency graph between solids, used to invalidate cached meshes

use ahash::{AHashMap, AHashSet};

/// Tracks which solids are built from which operands
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Maps a solid to its direct operands
    operands: AHashMap<String, Vec<String>>,
    /// Maps a solid to the solids that use it directly
    dependents: AHashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or re-record) the operands of `solid`
    pub fn set_operands(&mut self, solid: &str, operands: &[&str]) {
        self.remove(solid);
        for operand in operands {
            let users = self.dependents.entry(operand.to_string()).or_default();
            if !users.iter().any(|u| u == solid) {
                users.push(solid.to_string());
            }
        }
        self.operands.insert(
            solid.to_string(),
            operands.iter().map(|s| s.to_string()).collect(),
        );
    }

    /// Drop the outgoing operand edges of `solid`; solids that use it keep their edges
    pub fn remove(&mut self, solid: &str) {
        if let Some(previous) = self.operands.remove(solid) {
            for operand in previous {
                if let Some(users) = self.dependents.get_mut(&operand) {
                    users.retain(|u| u != solid);
                }
            }
        }
    }

    pub fn operands_of(&self, solid: &str) -> &[String] {
        self.operands.get(solid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All solids that transitively use `solid`
    pub fn dependents_of(&self, solid: &str) -> Vec<String> {
        let mut found = Vec::new();
        let mut visited = AHashSet::new();
        self.collect_dependents(solid, &mut found, &mut visited);
        found
    }

    fn collect_dependents(
        &self,
        solid: &str,
        found: &mut Vec<String>,
        visited: &mut AHashSet<String>,
    ) {
        if !visited.insert(solid.to_string()) {
            return;
        }
        if let Some(users) = self.dependents.get(solid) {
            for user in users {
                if !visited.contains(user) {
                    found.push(user.clone());
                }
                self.collect_dependents(user, found, visited);
            }
        }
    }

    /// Solids whose meshes change when `solid` changes (itself first)
    pub fn affected_by(&self, solid: &str) -> Vec<String> {
        let mut affected = vec![solid.to_string()];
        affected.extend(self.dependents_of(solid));
        affected
    }
}
