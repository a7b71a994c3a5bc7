// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Rendering boundary: visual options, the render adapter and a reference backend

mod adapter;
mod export_gltf;
mod scene;
mod section;
mod visual;

pub use adapter::{RenderAdapter, RenderBackend, RenderStats};
pub use export_gltf::export_scene;
pub use scene::{SceneCollector, SceneMesh, SceneNode};
pub use section::{section_instances, section_mesh, Segment};
pub use visual::{FixedVisuals, MaterialVisuals, Representation, VisOptions, VisualResolver};
