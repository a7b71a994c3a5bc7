// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Mesh generators for the primitive solids. All shapes are centred on the
//! origin of their local frame; lengths are millimetres, angles radians.

use super::Mesh;
use crate::error::{GeometryError, GeometryResult};
use nalgebra::{Point3, Vector3};
use std::f64::consts::{PI, TAU};

pub const DEFAULT_NSLICE: u32 = 16;
pub const DEFAULT_NSTACK: u32 = 8;

/// Geometric primitives
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Rectangular box given by its full edge lengths
    Box { size: Vector3<f64> },
    /// Tetrahedron given by its four anchor points
    Tet { vertices: [Point3<f64>; 4] },
    /// Full solid sphere
    Orb { r: f64, nslice: u32, nstack: u32 },
    /// Tube segment: radial bounds, full z length and phi range
    Tubs {
        rmin: f64,
        rmax: f64,
        z: f64,
        start_phi: f64,
        delta_phi: f64,
        nslice: u32,
    },
}

impl Primitive {
    pub fn cuboid(size: Vector3<f64>) -> Self {
        Self::Box { size }
    }

    pub fn tet(vertices: [Point3<f64>; 4]) -> Self {
        Self::Tet { vertices }
    }

    pub fn orb(r: f64) -> Self {
        Self::Orb {
            r,
            nslice: DEFAULT_NSLICE,
            nstack: DEFAULT_NSTACK,
        }
    }

    pub fn tubs(rmin: f64, rmax: f64, z: f64, start_phi: f64, delta_phi: f64) -> Self {
        Self::Tubs {
            rmin,
            rmax,
            z,
            start_phi,
            delta_phi,
            nslice: DEFAULT_NSLICE,
        }
    }

    /// Reject parameters that cannot describe a closed solid
    pub fn validate(&self, solid: &str) -> GeometryResult<()> {
        let invalid = |details: String| {
            Err(GeometryError::InvalidParameter {
                solid: solid.to_string(),
                details,
            })
        };

        match self {
            Self::Box { size } => {
                if size.iter().any(|v| !(*v > 0.0)) {
                    return invalid(format!("box lengths must be positive, got {:?}", size.as_slice()));
                }
            }
            Self::Tet { vertices } => {
                let [a, b, c, d] = vertices;
                let det = (b - a).cross(&(c - a)).dot(&(d - a));
                if det.abs() < 1e-12 {
                    return invalid("tetrahedron vertices are coplanar".to_string());
                }
            }
            Self::Orb { r, nslice, nstack } => {
                if !(*r > 0.0) {
                    return invalid(format!("orb radius must be positive, got {r}"));
                }
                if *nslice < 3 || *nstack < 2 {
                    return invalid(format!("orb resolution too low: {nslice}x{nstack}"));
                }
            }
            Self::Tubs {
                rmin,
                rmax,
                z,
                delta_phi,
                nslice,
                ..
            } => {
                if !(*rmax > 0.0) || *rmin < 0.0 || rmin >= rmax {
                    return invalid(format!("tubs radii must satisfy 0 <= rmin < rmax, got {rmin}, {rmax}"));
                }
                if !(*z > 0.0) {
                    return invalid(format!("tubs length must be positive, got {z}"));
                }
                if !(*delta_phi > 0.0) {
                    return invalid(format!("tubs delta phi must be positive, got {delta_phi}"));
                }
                if *nslice < 3 {
                    return invalid(format!("tubs resolution too low: {nslice}"));
                }
            }
        }
        Ok(())
    }

    /// Validate and generate the mesh
    pub fn try_to_mesh(&self, solid: &str) -> GeometryResult<Mesh> {
        self.validate(solid)?;
        Ok(self.to_mesh())
    }

    pub fn to_mesh(&self) -> Mesh {
        match self {
            Self::Box { size } => generate_box_mesh(size),
            Self::Tet { vertices } => generate_tet_mesh(vertices),
            Self::Orb { r, nslice, nstack } => generate_orb_mesh(*r, *nslice, *nstack),
            Self::Tubs {
                rmin,
                rmax,
                z,
                start_phi,
                delta_phi,
                nslice,
            } => generate_tubs_mesh(*rmin, *rmax, *z, *start_phi, *delta_phi, *nslice),
        }
    }
}

fn generate_box_mesh(size: &Vector3<f64>) -> Mesh {
    let half = size / 2.0;

    // Corner i has +x when bit 0 is set, +y for bit 1, +z for bit 2
    let corner = |i: usize| {
        Point3::new(
            if i & 1 != 0 { half.x } else { -half.x },
            if i & 2 != 0 { half.y } else { -half.y },
            if i & 4 != 0 { half.z } else { -half.z },
        )
    };

    let faces: [([usize; 4], Vector3<f64>); 6] = [
        ([0, 4, 6, 2], -Vector3::x()),
        ([1, 3, 7, 5], Vector3::x()),
        ([0, 1, 5, 4], -Vector3::y()),
        ([2, 6, 7, 3], Vector3::y()),
        ([0, 2, 3, 1], -Vector3::z()),
        ([4, 5, 7, 6], Vector3::z()),
    ];

    let mut mesh = Mesh::with_capacity(24, 6);
    for (indices, normal) in faces {
        let points: Vec<Point3<f64>> = indices.iter().map(|&i| corner(i)).collect();
        mesh.push_polygon_with_normal(&points, normal);
    }
    mesh
}

fn generate_tet_mesh(vertices: &[Point3<f64>; 4]) -> Mesh {
    let centroid = Point3::from(
        vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v.coords)
            / 4.0,
    );

    let mut mesh = Mesh::with_capacity(12, 4);
    for [i, j, k] in [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]] {
        let (a, b, c) = (vertices[i], vertices[j], vertices[k]);
        let normal = (b - a).cross(&(c - a));
        if normal.dot(&(a - centroid)) >= 0.0 {
            mesh.push_polygon(&[a, b, c]);
        } else {
            mesh.push_polygon(&[a, c, b]);
        }
    }
    mesh
}

fn generate_orb_mesh(radius: f64, slices: u32, stacks: u32) -> Mesh {
    let point = |i: u32, j: u32| {
        let theta = TAU * i as f64 / slices as f64;
        let phi = PI * j as f64 / stacks as f64;
        Point3::new(
            radius * theta.cos() * phi.sin(),
            radius * phi.cos(),
            radius * theta.sin() * phi.sin(),
        )
    };

    let mut mesh = Mesh::with_capacity((slices * stacks * 4) as usize, (slices * stacks) as usize);
    for i in 0..slices {
        for j in 0..stacks {
            let mut points = Vec::with_capacity(4);
            points.push(point(i, j));
            if j > 0 {
                points.push(point(i + 1, j));
            }
            if j < stacks - 1 {
                points.push(point(i + 1, j + 1));
            }
            points.push(point(i, j + 1));
            mesh.push_polygon(&points);
        }
    }
    mesh
}

fn generate_tubs_mesh(
    rmin: f64,
    rmax: f64,
    length: f64,
    start_phi: f64,
    delta_phi: f64,
    slices: u32,
) -> Mesh {
    let full = delta_phi >= TAU - 1e-9;
    let delta_phi = delta_phi.min(TAU);
    let hz = length / 2.0;
    let n = slices as usize;

    let ring = |r: f64, z: f64| -> Vec<Point3<f64>> {
        (0..=n)
            .map(|k| {
                // Close the ring exactly on the first point for full circles
                let k = if full && k == n { 0 } else { k };
                let phi = start_phi + delta_phi * k as f64 / n as f64;
                Point3::new(r * phi.cos(), r * phi.sin(), z)
            })
            .collect()
    };

    let outer_bottom = ring(rmax, -hz);
    let outer_top = ring(rmax, hz);
    let hollow = rmin > 0.0;
    let inner_bottom = ring(rmin, -hz);
    let inner_top = ring(rmin, hz);
    let centre_bottom = Point3::new(0.0, 0.0, -hz);
    let centre_top = Point3::new(0.0, 0.0, hz);

    let mut mesh = Mesh::with_capacity(n * 16, n * 4 + 2);
    for k in 0..n {
        let (ob0, ob1) = (outer_bottom[k], outer_bottom[k + 1]);
        let (ot0, ot1) = (outer_top[k], outer_top[k + 1]);

        mesh.push_polygon(&[ob0, ob1, ot1, ot0]);

        if hollow {
            let (ib0, ib1) = (inner_bottom[k], inner_bottom[k + 1]);
            let (it0, it1) = (inner_top[k], inner_top[k + 1]);
            mesh.push_polygon(&[ib0, it0, it1, ib1]);
            mesh.push_polygon(&[it0, ot0, ot1, it1]);
            mesh.push_polygon(&[ib0, ib1, ob1, ob0]);
        } else {
            mesh.push_polygon(&[centre_top, ot0, ot1]);
            mesh.push_polygon(&[centre_bottom, ob1, ob0]);
        }
    }

    if !full {
        let (ib, it) = if hollow {
            (inner_bottom[0], inner_top[0])
        } else {
            (centre_bottom, centre_top)
        };
        mesh.push_polygon(&[ib, outer_bottom[0], outer_top[0], it]);

        let (ib, it) = if hollow {
            (inner_bottom[n], inner_top[n])
        } else {
            (centre_bottom, centre_top)
        };
        mesh.push_polygon(&[ib, it, outer_top[n], outer_bottom[n]]);
    }

    mesh
}
