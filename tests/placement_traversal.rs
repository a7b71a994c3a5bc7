// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Placement traversal scenarios. Fixtures state their rotation convention
//! explicitly; the library default is `RotationConvention::Inverse`.

use approx::assert_relative_eq;
use detgeom::registry::{ReplicaAxis, ReplicaSet};
use detgeom::{
    traverse, Evaluator, GeometryError, Instance, LogicalVolume, PhysicalVolume, PlacementKind,
    Position, Registry, Rotation, RotationConvention, Solid, Transform, TraversalOptions,
};
use nalgebra::{Matrix3, Point3, Vector3};
use std::f64::consts::FRAC_PI_2;

fn world_with_box() -> Registry {
    let mut registry = Registry::new();
    registry.add_solid(Solid::cuboid("ws", 100.0, 100.0, 100.0)).unwrap();
    registry.add_solid(Solid::cuboid("bs", 10.0, 10.0, 10.0)).unwrap();
    registry.add_solid(Solid::cuboid("ss", 1.0, 1.0, 1.0)).unwrap();
    registry.add_logical_volume(LogicalVolume::new("wl", "ws", "G4_Galactic")).unwrap();
    registry.add_logical_volume(LogicalVolume::new("bl", "bs", "G4_Fe")).unwrap();
    registry.add_logical_volume(LogicalVolume::new("sl", "ss", "G4_Cu")).unwrap();
    registry.set_world("wl").unwrap();
    registry
}

fn run(registry: &Registry, convention: RotationConvention) -> Vec<Instance> {
    let evaluator = Evaluator::new();
    let options = TraversalOptions {
        convention,
        detect_cycles: true,
    };
    traverse(registry, &evaluator, "wl", Transform::identity(), options)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

/// Box rotated a quarter turn about z at x = 10 with a small box at local x = 1
fn rotated_nest() -> Registry {
    let mut registry = world_with_box();
    registry
        .add_physical_volume(
            "bl",
            PhysicalVolume::placement("sp", "sl", Rotation::identity(), Position::new(1.0, 0.0, 0.0)),
        )
        .unwrap();
    registry
        .add_physical_volume(
            "wl",
            PhysicalVolume::placement(
                "bp",
                "bl",
                Rotation::new(0.0, 0.0, FRAC_PI_2),
                Position::new(10.0, 0.0, 0.0),
            ),
        )
        .unwrap();
    registry
}

#[test]
fn test_world_with_single_daughter() {
    let mut registry = world_with_box();
    registry
        .add_physical_volume(
            "wl",
            PhysicalVolume::placement("bp", "bl", Rotation::identity(), Position::zeros()),
        )
        .unwrap();

    let instances = run(&registry, RotationConvention::Inverse);
    assert_eq!(instances.len(), 2);
    let daughter = &instances[1];
    assert_eq!(daughter.name, "bp");
    assert_eq!(daughter.solid, "bs");
    assert_relative_eq!(daughter.transform.matrix, Matrix3::identity(), epsilon = 1e-12);
    assert_relative_eq!(daughter.transform.translation, Vector3::zeros(), epsilon = 1e-12);
}

#[test]
fn test_inverse_convention_fixture() {
    let instances = run(&rotated_nest(), RotationConvention::Inverse);
    let names: Vec<&str> = instances.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["wl", "bp", "sp"]);

    // The daughter frame is rotated by -90 degrees about z
    assert_relative_eq!(
        instances[2].transform.translation,
        Vector3::new(10.0, -1.0, 0.0),
        epsilon = 1e-12
    );
    assert_eq!(instances[2].depth, 2);
}

#[test]
fn test_direct_convention_fixture() {
    let instances = run(&rotated_nest(), RotationConvention::Direct);
    assert_relative_eq!(
        instances[2].transform.translation,
        Vector3::new(10.0, 1.0, 0.0),
        epsilon = 1e-12
    );

    let inverse = run(&rotated_nest(), RotationConvention::Inverse);
    assert_relative_eq!(
        instances[1].transform.matrix * inverse[1].transform.matrix,
        Matrix3::identity(),
        epsilon = 1e-12
    );
}

#[test]
fn test_traversal_is_idempotent() {
    let registry = rotated_nest();
    let evaluator = Evaluator::new();
    let collect = || {
        traverse(
            &registry,
            &evaluator,
            "wl",
            Transform::identity(),
            TraversalOptions::default(),
        )
        .unwrap()
        .map(|i| {
            let i = i.unwrap();
            (i.name, i.transform)
        })
        .collect::<Vec<_>>()
    };
    assert_eq!(collect(), collect());
}

#[test]
fn test_composition_is_associative() {
    let convention = RotationConvention::Inverse;
    let a = Transform::from_placement(
        &Vector3::new(0.1, 0.2, 0.3),
        &Vector3::new(1.0, 2.0, 3.0),
        None,
        convention,
    );
    let b = Transform::from_placement(
        &Vector3::new(-0.7, 0.4, 1.1),
        &Vector3::new(-4.0, 0.5, 2.0),
        Some(&Vector3::new(1.0, -1.0, 2.0)),
        convention,
    );
    let c = Transform::from_placement(
        &Vector3::new(1.3, -0.2, 0.0),
        &Vector3::new(0.0, 0.0, 7.0),
        None,
        convention,
    );

    let left = a.compose(&b).compose(&c);
    let right = a.compose(&b.compose(&c));
    assert!(left.approx_eq(&right, 1e-9));

    let point = Point3::new(0.3, -2.0, 5.0);
    assert_relative_eq!(
        left.transform_point(&point),
        a.transform_point(&b.transform_point(&c.transform_point(&point))),
        epsilon = 1e-9
    );
}

#[test]
fn test_accumulated_root_transform() {
    let mut registry = world_with_box();
    registry
        .add_physical_volume(
            "wl",
            PhysicalVolume::placement("bp", "bl", Rotation::identity(), Position::new(0.0, 0.0, 5.0)),
        )
        .unwrap();

    let evaluator = Evaluator::new();
    let offset = Transform::from_translation(Vector3::new(100.0, 0.0, 0.0));
    let instances: Vec<Instance> = traverse(
        &registry,
        &evaluator,
        "wl",
        offset,
        TraversalOptions::default(),
    )
    .unwrap()
    .collect::<Result<_, _>>()
    .unwrap();

    assert_eq!(instances[0].transform, offset);
    assert_eq!(instances[1].transform.translation, Vector3::new(100.0, 0.0, 5.0));
}

#[test]
fn test_phi_replicas_and_divisions() {
    let mut registry = world_with_box();
    registry
        .add_physical_volume(
            "wl",
            PhysicalVolume::new(
                "ring",
                PlacementKind::Replica(ReplicaSet::along_axis(
                    "sl",
                    "ss",
                    ReplicaAxis::Phi,
                    4,
                    FRAC_PI_2,
                    0.0,
                )),
            ),
        )
        .unwrap();
    registry
        .add_physical_volume(
            "wl",
            PhysicalVolume::new(
                "slices",
                PlacementKind::Division(ReplicaSet::along_axis("bl", "bs", ReplicaAxis::Z, 2, 10.0, 0.0)),
            ),
        )
        .unwrap();

    let instances = run(&registry, RotationConvention::Inverse);
    let names: Vec<&str> = instances.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["wl", "ring_0", "ring_1", "ring_2", "ring_3", "slices_0", "slices_1"]
    );

    // Replica rotations are applied without inversion
    assert_relative_eq!(
        instances[1].transform.rotation_angles(),
        Vector3::new(0.0, 0.0, FRAC_PI_2 * 0.5),
        epsilon = 1e-12
    );
    assert_eq!(instances[1].material.as_deref(), Some("G4_Cu"));
    assert_relative_eq!(instances[5].transform.translation.z, -5.0, epsilon = 1e-12);
    assert_relative_eq!(instances[6].transform.translation.z, 5.0, epsilon = 1e-12);
}

#[test]
fn test_reflection_scale_flips_mesh() {
    let mut registry = world_with_box();
    registry
        .add_solid(Solid::tet(
            "tet",
            [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]],
        ))
        .unwrap();
    registry.add_logical_volume(LogicalVolume::new("tl", "tet", "G4_Si")).unwrap();
    registry
        .add_physical_volume(
            "wl",
            PhysicalVolume::new(
                "mirrored",
                PlacementKind::Placement {
                    logical: "tl".into(),
                    rotation: Rotation::identity(),
                    position: Position::zeros(),
                    scale: Some(Vector3::new(-1.0, 1.0, 1.0)),
                },
            ),
        )
        .unwrap();

    let instances = run(&registry, RotationConvention::Inverse);
    let world = instances[1].world_mesh();
    let bbox = world.bounding_box();
    assert_relative_eq!(bbox.min.x, -2.0, epsilon = 1e-12);
    assert_relative_eq!(bbox.max.x, 0.0, epsilon = 1e-12);
    // Winding is corrected, so the volume stays positive
    assert_relative_eq!(world.volume(), 8.0 / 6.0, epsilon = 1e-9);
}

#[test]
fn test_self_placement_is_cyclic() {
    let mut registry = world_with_box();
    registry
        .add_physical_volume(
            "bl",
            PhysicalVolume::placement("again", "bl", Rotation::identity(), Position::zeros()),
        )
        .unwrap();
    registry
        .add_physical_volume(
            "wl",
            PhysicalVolume::placement("bp", "bl", Rotation::identity(), Position::zeros()),
        )
        .unwrap();

    let evaluator = Evaluator::new();
    let result: Result<Vec<Instance>, _> = traverse(
        &registry,
        &evaluator,
        "wl",
        Transform::identity(),
        TraversalOptions::default(),
    )
    .unwrap()
    .collect();
    assert_eq!(
        result.unwrap_err(),
        GeometryError::CyclicReference {
            path: vec!["wl".into(), "bl".into(), "bl".into()]
        }
    );
}

#[test]
fn test_laziness_defers_mesh_errors() {
    let mut registry = world_with_box();
    registry.add_logical_volume(LogicalVolume::new("gl", "ghost_solid", "G4_Fe")).unwrap();
    registry
        .add_physical_volume(
            "wl",
            PhysicalVolume::placement("gp", "gl", Rotation::identity(), Position::zeros()),
        )
        .unwrap();

    let evaluator = Evaluator::new();
    let mut traversal = traverse(
        &registry,
        &evaluator,
        "wl",
        Transform::identity(),
        TraversalOptions::default(),
    )
    .unwrap();
    assert_eq!(traversal.next().unwrap().unwrap().name, "wl");
    assert!(matches!(
        traversal.next(),
        Some(Err(GeometryError::NotFound { kind: "solid", .. }))
    ));
    assert!(traversal.next().is_none());
}
