// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Plane cross-sections of meshes and placed instances

use crate::error::GeometryResult;
use crate::geometry::Mesh;
use crate::scene::Instance;
use nalgebra::{Point3, Vector3};

/// Distance below which a vertex counts as lying on the cutting plane
const ON_PLANE: f64 = 1e-9;

/// Straight cut through one polygon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
}

impl Segment {
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Same end points in either direction
    fn coincides(&self, other: &Segment) -> bool {
        let close = |a: &Point3<f64>, b: &Point3<f64>| (a - b).norm() < ON_PLANE;
        (close(&self.start, &other.start) && close(&self.end, &other.end))
            || (close(&self.start, &other.end) && close(&self.end, &other.start))
    }
}

/// Intersect every (convex) polygon of `mesh` with the plane through `origin`
/// with normal `normal`. Polygons lying in the plane are skipped, and an edge
/// lying in the plane is reported once even though two polygons share it.
pub fn section_mesh(mesh: &Mesh, origin: &Point3<f64>, normal: &Vector3<f64>) -> Vec<Segment> {
    let Some(normal) = normal.try_normalize(1e-12) else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut plane_edges: Vec<Segment> = Vec::new();
    for polygon in mesh.to_polygons() {
        let distances: Vec<f64> = polygon.iter().map(|p| normal.dot(&(p - origin))).collect();
        if distances.iter().all(|d| d.abs() < ON_PLANE) {
            continue;
        }

        let mut points = Vec::with_capacity(2);
        let mut crossed = false;
        for i in 0..polygon.len() {
            let j = (i + 1) % polygon.len();
            let (di, dj) = (distances[i], distances[j]);
            if di.abs() < ON_PLANE {
                points.push(polygon[i]);
            } else if (di > ON_PLANE && dj < -ON_PLANE) || (di < -ON_PLANE && dj > ON_PLANE) {
                let t = di / (di - dj);
                points.push(polygon[i] + (polygon[j] - polygon[i]) * t);
                crossed = true;
            }
        }

        let Some(start) = points.first().copied() else {
            continue;
        };
        let end = points
            .iter()
            .copied()
            .max_by(|a, b| (a - start).norm().total_cmp(&(b - start).norm()))
            .unwrap_or(start);
        if (end - start).norm() <= ON_PLANE {
            continue;
        }
        let segment = Segment { start, end };
        if !crossed {
            // Both ends are vertices, so the segment is an edge in the plane
            if plane_edges.iter().any(|edge| edge.coincides(&segment)) {
                continue;
            }
            plane_edges.push(segment);
        }
        segments.push(segment);
    }
    segments
}

/// World-space sections of every instance, skipping instances the plane misses
pub fn section_instances<I>(
    instances: I,
    origin: &Point3<f64>,
    normal: &Vector3<f64>,
) -> GeometryResult<Vec<(String, Vec<Segment>)>>
where
    I: IntoIterator<Item = GeometryResult<Instance>>,
{
    let mut sections = Vec::new();
    for instance in instances {
        let instance = instance?;
        let segments = section_mesh(&instance.world_mesh(), origin, normal);
        if !segments.is_empty() {
            sections.push((instance.name, segments));
        }
    }
    Ok(sections)
}
