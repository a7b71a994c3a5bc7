// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Placement hierarchy: transforms, instances and the traversal producing them

mod instance;
mod transform;
mod traversal;

pub use instance::Instance;
pub use transform::{RotationConvention, Transform};
pub use traversal::{traverse, Traversal, TraversalOptions};
