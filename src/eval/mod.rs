// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Boolean evaluation of registry solids into meshes

mod evaluator;
mod operands;
mod parallel;

pub use evaluator::{place_operand, CacheStats, Evaluator, EvaluatorOptions, MeshCache};
pub use operands::{boolean_operands, operand_visual, result_visual};
