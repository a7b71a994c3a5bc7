// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Scene configuration system

use crate::eval::EvaluatorOptions;
use crate::render::{MaterialVisuals, VisOptions};
use crate::scene::{RotationConvention, TraversalOptions};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default configuration file looked up by [`SceneConfig::load`]
pub const CONFIG_FILE: &str = "detgeom.toml";

/// Evaluation, traversal and visualisation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Whether placement rotations are inverted before composition
    pub rotation_convention: RotationConvention,
    /// Evaluate independent solids on the rayon pool
    pub parallel: bool,
    /// Memoise meshes per solid name
    pub cache_meshes: bool,
    /// Fail on volumes placed inside themselves
    pub detect_cycles: bool,
    /// Give unlisted materials a seeded random colour
    pub random_colours: bool,
    pub colour_seed: u64,
    /// Visual used when no material entry matches
    pub default_visual: VisOptions,
    /// Material name -> `[r, g, b]` or `[r, g, b, a]`
    pub materials: BTreeMap<String, Vec<f64>>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            rotation_convention: RotationConvention::Inverse,
            parallel: false,
            cache_meshes: true,
            detect_cycles: true,
            random_colours: false,
            colour_seed: 0,
            default_visual: VisOptions::default(),
            materials: BTreeMap::new(),
        }
    }
}

impl SceneConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: SceneConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `detgeom.toml` if present, then apply environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `DETGEOM_*` overrides read through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(convention) = lookup("DETGEOM_ROTATION_CONVENTION") {
            self.rotation_convention = convention
                .parse()
                .context("Invalid DETGEOM_ROTATION_CONVENTION")?;
        }

        if let Some(parallel) = lookup("DETGEOM_PARALLEL") {
            self.parallel = parallel
                .parse()
                .with_context(|| format!("Invalid DETGEOM_PARALLEL: {parallel}"))?;
        }

        if let Some(seed) = lookup("DETGEOM_COLOUR_SEED") {
            self.colour_seed = seed
                .parse()
                .with_context(|| format!("Invalid DETGEOM_COLOUR_SEED: {seed}"))?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn evaluator_options(&self) -> EvaluatorOptions {
        EvaluatorOptions {
            cache_meshes: self.cache_meshes,
            parallel: self.parallel,
        }
    }

    pub fn traversal_options(&self) -> TraversalOptions {
        TraversalOptions {
            convention: self.rotation_convention,
            detect_cycles: self.detect_cycles,
        }
    }

    /// Build the material resolver described by this configuration
    pub fn material_visuals(&self) -> Result<MaterialVisuals> {
        let mut visuals = MaterialVisuals::new(self.default_visual.clone());
        if self.random_colours {
            visuals = visuals.with_random_colours(self.colour_seed);
        }
        for (material, values) in &self.materials {
            let Some(options) = VisOptions::from_rgba(values) else {
                bail!(
                    "material '{material}' needs 3 or 4 colour values, got {}",
                    values.len()
                );
            };
            visuals.insert(material.clone(), options);
        }
        Ok(visuals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::VisualResolver;
    use crate::scene::{Instance, Transform};
    use crate::geometry::Mesh;
    use std::sync::Arc;

    #[test]
    fn test_parse_partial_file() {
        let config: SceneConfig = toml::from_str(
            r#"
            rotation_convention = "direct"
            parallel = true

            [materials]
            G4_Fe = [255, 0, 0]
            G4_AIR = [0.0, 0.0, 1.0, 0.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.rotation_convention, RotationConvention::Direct);
        assert!(config.parallel);
        assert!(config.cache_meshes);
        assert_eq!(config.traversal_options().convention, RotationConvention::Direct);
        assert!(config.evaluator_options().parallel);

        let visuals = config.material_visuals().unwrap();
        let instance = Instance {
            name: "pv".into(),
            solid: "s".into(),
            mesh: Arc::new(Mesh::empty()),
            transform: Transform::identity(),
            material: Some("G4_Fe".into()),
            visual: None,
            depth: 1,
        };
        assert_eq!(visuals.resolve(&instance).colour, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_bad_material_entry() {
        let mut config = SceneConfig::default();
        config.materials.insert("G4_Pb".into(), vec![1.0]);
        assert!(config.material_visuals().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = SceneConfig::default();
        config
            .apply_overrides(|key| match key {
                "DETGEOM_ROTATION_CONVENTION" => Some("direct".into()),
                "DETGEOM_PARALLEL" => Some("true".into()),
                "DETGEOM_COLOUR_SEED" => Some("42".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.rotation_convention, RotationConvention::Direct);
        assert!(config.parallel);
        assert_eq!(config.colour_seed, 42);

        assert!(config
            .apply_overrides(|key| (key == "DETGEOM_COLOUR_SEED").then(|| "x".to_string()))
            .is_err());
    }

    #[test]
    fn test_invalid_parallel_override() {
        let mut config = SceneConfig::default();
        let err = config
            .apply_overrides(|key| (key == "DETGEOM_PARALLEL").then(|| "yes".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid DETGEOM_PARALLEL: yes"));
        assert!(!config.parallel);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("detgeom.toml");
        let mut config = SceneConfig {
            random_colours: true,
            colour_seed: 9,
            ..SceneConfig::default()
        };
        config.materials.insert("G4_Cu".into(), vec![0.8, 0.5, 0.2]);

        config.save(&path).unwrap();
        assert_eq!(SceneConfig::from_file(&path).unwrap(), config);
    }
}
