// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use detgeom::geometry::Primitive;
use detgeom::{
    BooleanTransform, Evaluator, EvaluatorOptions, Kernel, LogicalVolume, PhysicalVolume, Position,
    Registry, Rotation, Solid,
};
use nalgebra::Vector3;

fn bench_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives");

    group.bench_function("box", |b| {
        b.iter(|| Primitive::cuboid(black_box(Vector3::new(10.0, 10.0, 10.0))).to_mesh());
    });

    group.bench_function("orb", |b| {
        b.iter(|| Primitive::orb(black_box(10.0)).to_mesh());
    });

    group.bench_function("tubs", |b| {
        b.iter(|| {
            Primitive::tubs(
                black_box(2.0),
                black_box(5.0),
                black_box(20.0),
                0.0,
                std::f64::consts::TAU,
            )
            .to_mesh()
        });
    });

    group.finish();
}

fn bench_boolean(c: &mut Criterion) {
    let mut group = c.benchmark_group("boolean");

    let mut registry = Registry::new();
    registry.add_solid(Solid::cuboid("a", 10.0, 10.0, 10.0)).unwrap();
    registry.add_solid(Solid::orb("b", 6.0)).unwrap();
    registry
        .add_solid(Solid::subtraction(
            "sub",
            "a",
            "b",
            BooleanTransform::from_values([0.0, 0.3, 0.0], [5.0, 0.0, 0.0]),
        ))
        .unwrap();

    let uncached = EvaluatorOptions {
        cache_meshes: false,
        parallel: false,
    };
    group.bench_function("subtraction", |b| {
        let evaluator = Evaluator::with_options(uncached);
        b.iter(|| evaluator.evaluate(black_box(&registry), "sub").unwrap());
    });

    let mut operands = Vec::new();
    let mut transforms = Vec::new();
    for i in 0..15 {
        let name = format!("box{i}");
        registry.add_solid(Solid::cuboid(name.as_str(), 4.0, 4.0, 4.0)).unwrap();
        operands.push(name);
        transforms.push(BooleanTransform::from_values(
            [0.0, 0.0, 0.2 * i as f64],
            [3.0 * i as f64, 0.0, 0.0],
        ));
    }
    registry
        .add_solid(Solid::multi_union("row", operands, transforms))
        .unwrap();

    for parallel in [false, true] {
        let options = EvaluatorOptions {
            cache_meshes: false,
            parallel,
        };
        group.bench_with_input(
            BenchmarkId::new("multi_union_15", parallel),
            &options,
            |b, options| {
                let evaluator = Evaluator::with_options(*options);
                b.iter(|| evaluator.evaluate(black_box(&registry), "row").unwrap());
            },
        );
    }

    group.finish();
}

fn bench_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal");

    let mut registry = Registry::new();
    registry.add_solid(Solid::cuboid("ws", 1000.0, 1000.0, 1000.0)).unwrap();
    registry
        .add_solid(Solid::tet(
            "tet",
            [[0.0, 0.0, 0.0], [5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]],
        ))
        .unwrap();
    registry.add_logical_volume(LogicalVolume::new("wl", "ws", "G4_AIR")).unwrap();
    registry.add_logical_volume(LogicalVolume::new("tl", "tet", "G4_Si")).unwrap();
    registry.set_world("wl").unwrap();
    for i in 0..5 {
        for j in 0..5 {
            for k in 0..5 {
                registry
                    .add_physical_volume(
                        "wl",
                        PhysicalVolume::placement(
                            format!("tet_{i}_{j}_{k}"),
                            "tl",
                            Rotation::new(0.1 * i as f64, 0.1 * j as f64, 0.1 * k as f64),
                            Position::new(20.0 * i as f64, 20.0 * j as f64, 20.0 * k as f64),
                        ),
                    )
                    .unwrap();
            }
        }
    }

    let kernel = Kernel::new(registry);
    group.bench_function("world_125_tets", |b| {
        b.iter(|| {
            let count = kernel
                .traverse_world()
                .unwrap()
                .filter_map(Result::ok)
                .count();
            black_box(count)
        });
    });

    group.bench_function("render_scene_125_tets", |b| {
        b.iter(|| kernel.render_scene().unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_primitives, bench_boolean, bench_traversal);
criterion_main!(benches);
