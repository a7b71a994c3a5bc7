// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Shared math and unit helpers

pub mod math;
pub mod units;

pub use units::{AngleUnit, LengthUnit};
