// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Visual attributes and the resolvers that pick them per instance

use crate::scene::Instance;
use ahash::{AHashMap, RandomState};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    #[default]
    Surface,
    Wireframe,
}

/// Colour, opacity and representation of a rendered instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisOptions {
    pub colour: [f64; 3],
    pub alpha: f64,
    pub representation: Representation,
    pub visible: bool,
    pub line_width: f64,
}

impl Default for VisOptions {
    fn default() -> Self {
        Self {
            colour: [0.5, 0.5, 0.5],
            alpha: 0.5,
            representation: Representation::Surface,
            visible: true,
            line_width: 1.0,
        }
    }
}

impl VisOptions {
    pub fn new(colour: [f64; 3], alpha: f64) -> Self {
        Self {
            colour,
            alpha,
            ..Self::default()
        }
    }

    /// Build from `[r, g, b]` or `[r, g, b, a]`.
    ///
    /// Components above 1 are read as 0-255 values. An alpha of 0 hides the
    /// instance. Returns `None` for any other length.
    pub fn from_rgba(values: &[f64]) -> Option<Self> {
        let (rgb, alpha) = match values {
            [r, g, b] => ([*r, *g, *b], None),
            [r, g, b, a] => ([*r, *g, *b], Some(*a)),
            _ => return None,
        };
        let colour = rgb.map(|c| if c > 1.0 { c / 255.0 } else { c });
        let mut options = Self {
            colour,
            ..Self::default()
        };
        if let Some(alpha) = alpha {
            options.alpha = if alpha > 1.0 { alpha / 255.0 } else { alpha };
            options.visible = alpha != 0.0;
        }
        Some(options)
    }

    pub fn wireframe(mut self) -> Self {
        self.representation = Representation::Wireframe;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Picks visual attributes for instances that carry no explicit override
pub trait VisualResolver {
    fn resolve(&self, instance: &Instance) -> VisOptions;
}

/// Same options for every instance
#[derive(Debug, Clone, Default)]
pub struct FixedVisuals(pub VisOptions);

impl VisualResolver for FixedVisuals {
    fn resolve(&self, _instance: &Instance) -> VisOptions {
        self.0.clone()
    }
}

/// Material-name lookup with a default and optional seeded random colours
#[derive(Debug, Clone)]
pub struct MaterialVisuals {
    materials: AHashMap<String, VisOptions>,
    default: VisOptions,
    random_colours: bool,
    seed: u64,
}

impl MaterialVisuals {
    pub fn new(default: VisOptions) -> Self {
        Self {
            materials: AHashMap::new(),
            default,
            random_colours: false,
            seed: 0,
        }
    }

    pub fn with_material(mut self, material: impl Into<String>, options: VisOptions) -> Self {
        self.insert(material, options);
        self
    }

    pub fn insert(&mut self, material: impl Into<String>, options: VisOptions) {
        self.materials.insert(material.into(), options);
    }

    /// Give unlisted materials a colour derived from `seed` and the material name
    pub fn with_random_colours(mut self, seed: u64) -> Self {
        self.random_colours = true;
        self.seed = seed;
        self
    }

    /// Material name without the `0x...` pointer suffix some exporters append
    pub fn strip_pointer(material: &str) -> &str {
        match material.find("0x") {
            Some(index) => &material[..index],
            None => material,
        }
    }

    fn random_options(&self, key: &str) -> VisOptions {
        let hash = RandomState::with_seeds(0x5eed, 0xc01, 0x0b, 0xd7).hash_one(key);
        let mut rng = StdRng::seed_from_u64(self.seed ^ hash);
        VisOptions {
            colour: [rng.gen(), rng.gen(), rng.gen()],
            ..self.default.clone()
        }
    }
}

impl Default for MaterialVisuals {
    fn default() -> Self {
        Self::new(VisOptions::default())
    }
}

impl VisualResolver for MaterialVisuals {
    fn resolve(&self, instance: &Instance) -> VisOptions {
        let Some(material) = instance.material.as_deref() else {
            return self.default.clone();
        };
        let material = Self::strip_pointer(material);
        if let Some(options) = self.materials.get(material) {
            return options.clone();
        }
        if self.random_colours {
            return self.random_options(material);
        }
        self.default.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Mesh;
    use crate::scene::Transform;
    use std::sync::Arc;

    fn instance(material: Option<&str>) -> Instance {
        Instance {
            name: "pv".into(),
            solid: "s".into(),
            mesh: Arc::new(Mesh::empty()),
            transform: Transform::identity(),
            material: material.map(str::to_string),
            visual: None,
            depth: 1,
        }
    }

    #[test]
    fn test_defaults() {
        let options = VisOptions::default();
        assert_eq!(options.colour, [0.5, 0.5, 0.5]);
        assert_eq!(options.alpha, 0.5);
        assert!(options.visible);
        assert_eq!(options.representation, Representation::Surface);
    }

    #[test]
    fn test_from_rgba() {
        let options = VisOptions::from_rgba(&[255.0, 0.0, 127.5]).unwrap();
        assert_eq!(options.colour, [1.0, 0.0, 0.5]);

        let hidden = VisOptions::from_rgba(&[1.0, 0.0, 0.0, 0.0]).unwrap();
        assert!(!hidden.visible);

        assert!(VisOptions::from_rgba(&[1.0, 0.0]).is_none());
    }

    #[test]
    fn test_material_lookup_strips_pointer() {
        let red = VisOptions::new([1.0, 0.0, 0.0], 1.0);
        let resolver = MaterialVisuals::default().with_material("G4_Fe", red.clone());

        assert_eq!(resolver.resolve(&instance(Some("G4_Fe0x7f3a2c"))), red);
        assert_eq!(resolver.resolve(&instance(Some("G4_Cu"))), VisOptions::default());
        assert_eq!(resolver.resolve(&instance(None)), VisOptions::default());
    }

    #[test]
    fn test_random_colours_are_seeded() {
        let a = MaterialVisuals::default().with_random_colours(7);
        let b = MaterialVisuals::default().with_random_colours(7);
        let first = a.resolve(&instance(Some("G4_Pb")));
        assert_eq!(first, b.resolve(&instance(Some("G4_Pb"))));
        assert!(first.colour.iter().all(|c| (0.0..1.0).contains(c)));
    }
}
