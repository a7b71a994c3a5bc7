// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Exploded view of a boolean solid: the result plus every leaf operand placed

use super::evaluator::Evaluator;
use crate::error::GeometryResult;
use crate::registry::{BooleanTransform, Registry, SolidKind};
use crate::render::VisOptions;
use crate::scene::{Instance, RotationConvention, Transform};
use tracing::debug;

/// Visual of the evaluated result
pub fn result_visual() -> VisOptions {
    VisOptions::new([0.5, 0.5, 0.5], 1.0)
}

/// Visual of a primitive operand
pub fn operand_visual() -> VisOptions {
    VisOptions::new([1.0, 0.0, 0.0], 0.5).wireframe()
}

/// Instances for the solid `name` and all primitive operands below it.
///
/// The first instance is the evaluated solid itself. Intermediate booleans are
/// only descended into. Operands sit where the evaluator places them, so the
/// rotation is always inverted.
pub fn boolean_operands(
    evaluator: &Evaluator,
    registry: &Registry,
    name: &str,
) -> GeometryResult<Vec<Instance>> {
    let mesh = evaluator.evaluate(registry, name)?;
    let mut instances = vec![Instance {
        name: name.to_string(),
        solid: name.to_string(),
        mesh,
        transform: Transform::identity(),
        material: None,
        visual: Some(result_visual()),
        depth: 0,
    }];

    collect_operands(
        evaluator,
        registry,
        name,
        &Transform::identity(),
        1,
        &mut instances,
    )?;
    debug!(solid = name, instances = instances.len(), "collected boolean operands");
    Ok(instances)
}

fn collect_operands(
    evaluator: &Evaluator,
    registry: &Registry,
    name: &str,
    parent: &Transform,
    depth: usize,
    out: &mut Vec<Instance>,
) -> GeometryResult<()> {
    let solid = registry.solid_by_name(name)?;
    match &solid.kind {
        SolidKind::Union(b) | SolidKind::Subtraction(b) | SolidKind::Intersection(b) => {
            visit(evaluator, registry, &b.first, parent, depth, out)?;
            let placed = place(registry, parent, &b.transform)?;
            visit(evaluator, registry, &b.second, &placed, depth, out)
        }
        SolidKind::MultiUnion {
            operands,
            transforms,
        } => {
            for (operand, transform) in operands.iter().zip(transforms) {
                let placed = place(registry, parent, transform)?;
                visit(evaluator, registry, operand, &placed, depth, out)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn visit(
    evaluator: &Evaluator,
    registry: &Registry,
    name: &str,
    transform: &Transform,
    depth: usize,
    out: &mut Vec<Instance>,
) -> GeometryResult<()> {
    let solid = registry.solid_by_name(name)?;
    if !solid.kind.is_primitive() {
        return collect_operands(evaluator, registry, name, transform, depth + 1, out);
    }
    out.push(Instance {
        name: name.to_string(),
        solid: name.to_string(),
        mesh: evaluator.evaluate(registry, name)?,
        transform: *transform,
        material: None,
        visual: Some(operand_visual()),
        depth,
    });
    Ok(())
}

fn place(
    registry: &Registry,
    parent: &Transform,
    transform: &BooleanTransform,
) -> GeometryResult<Transform> {
    let (rotation, translation) = transform.resolve(registry)?;
    Ok(parent.compose(&Transform::from_placement(
        &rotation,
        &translation,
        None,
        RotationConvention::Inverse,
    )))
}
