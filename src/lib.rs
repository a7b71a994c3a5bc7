// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Detgeom geometry kernel
//!
//! Evaluates Geant4-style constructive solid geometry (primitives combined by
//! union, subtraction, intersection and multi-union) into polygon meshes and
//! walks a volume placement hierarchy into placed, renderable instances.

pub mod config;
pub mod error;
pub mod eval;
pub mod geometry;
pub mod kernel;
pub mod registry;
pub mod render;
pub mod scene;
pub mod utils;

pub use config::SceneConfig;
pub use error::{GeometryError, GeometryResult};
pub use eval::{CacheStats, Evaluator, EvaluatorOptions};
pub use geometry::{BooleanOp, BoundingBox, Mesh, Primitive};
pub use kernel::Kernel;
pub use registry::{
    BooleanTransform, LogicalVolume, PhysicalVolume, PlacementKind, Position, Registry, Rotation,
    Solid, SolidKind,
};
pub use render::{RenderAdapter, RenderBackend, SceneCollector, VisOptions};
pub use scene::{traverse, Instance, RotationConvention, Transform, Traversal, TraversalOptions};

/// Evaluate one solid of `registry` with a fresh evaluator
pub fn evaluate(registry: &Registry, solid: &str) -> GeometryResult<std::sync::Arc<Mesh>> {
    Evaluator::new().evaluate(registry, solid)
}
