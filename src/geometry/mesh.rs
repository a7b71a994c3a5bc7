// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Mesh representation and utilities
//!
//! A [`Mesh`] is a polygon soup: every polygon owns its own vertices, and each
//! vertex carries the face normal of the polygon it belongs to. Meshes are
//! produced in the local frame of a solid and are cloned before any mutation
//! so evaluated meshes can be shared as immutable templates.

use super::{csg, BooleanOp, BoundingBox};
use nalgebra::{Matrix4, Point3, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }

    fn transform(&mut self, matrix: &Matrix4<f64>, normal_matrix: &Matrix4<f64>) {
        self.position = matrix.transform_point(&self.position);
        let normal = normal_matrix.transform_vector(&self.normal);
        if normal.norm_squared() > 0.0 {
            self.normal = normal.normalize();
        }
    }
}

/// Planar polygon defined by an ordered list of vertex indices (counter-clockwise seen from outside)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub indices: Vec<usize>,
    pub normal: Vector3<f64>,
}

impl Polygon {
    pub fn new(indices: Vec<usize>, normal: Vector3<f64>) -> Self {
        Self { indices, normal }
    }
}

/// Polygon mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub polygons: Vec<Polygon>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            polygons: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new()
    }

    pub fn with_capacity(vertex_count: usize, polygon_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            polygons: Vec::with_capacity(polygon_count),
        }
    }

    /// Build a mesh from lists of polygon corner positions.
    /// Polygons with fewer than three corners or zero area are skipped.
    pub fn from_polygons(polygons: &[Vec<Point3<f64>>]) -> Self {
        let mut mesh = Self::with_capacity(polygons.len() * 4, polygons.len());
        for points in polygons {
            mesh.push_polygon(points);
        }
        mesh
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a polygon over existing vertices
    pub fn add_polygon(&mut self, polygon: Polygon) {
        self.polygons.push(polygon);
    }

    /// Append a polygon given by its corner positions, computing its normal
    pub fn push_polygon(&mut self, points: &[Point3<f64>]) {
        let normal = newell_normal(points);
        if normal.norm_squared() > 0.0 {
            self.push_polygon_with_normal(points, normal.normalize());
        }
    }

    pub(crate) fn push_polygon_with_normal(&mut self, points: &[Point3<f64>], normal: Vector3<f64>) {
        if points.len() < 3 {
            return;
        }
        let start = self.vertices.len();
        self.vertices
            .extend(points.iter().map(|p| Vertex::new(*p, normal)));
        self.polygons
            .push(Polygon::new((start..self.vertices.len()).collect(), normal));
    }

    /// Corner positions of every polygon
    pub fn to_polygons(&self) -> Vec<Vec<Point3<f64>>> {
        self.polygons
            .iter()
            .map(|poly| {
                poly.indices
                    .iter()
                    .map(|&i| self.vertices[i].position)
                    .collect()
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get polygon count
    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    /// Number of triangles after fan triangulation
    pub fn triangle_count(&self) -> usize {
        self.polygons
            .iter()
            .map(|p| p.indices.len().saturating_sub(2))
            .sum()
    }

    /// Fan triangulation of every polygon (polygons are convex)
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        let mut triangles = Vec::with_capacity(self.triangle_count());
        for poly in &self.polygons {
            for k in 1..poly.indices.len().saturating_sub(1) {
                triangles.push([poly.indices[0], poly.indices[k], poly.indices[k + 1]]);
            }
        }
        triangles
    }

    /// Transform all vertices by an affine matrix.
    /// Winding is reversed for mirroring transforms so polygons stay outward-facing.
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        let normal_matrix = matrix
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(*matrix);
        for vertex in &mut self.vertices {
            vertex.transform(matrix, &normal_matrix);
        }
        for poly in &mut self.polygons {
            let normal = normal_matrix.transform_vector(&poly.normal);
            if normal.norm_squared() > 0.0 {
                poly.normal = normal.normalize();
            }
        }
        if matrix.fixed_view::<3, 3>(0, 0).into_owned().determinant() < 0.0 {
            for poly in &mut self.polygons {
                poly.indices.reverse();
            }
        }
    }

    /// Rotate about `axis` through the origin by `degrees` (right-handed)
    pub fn rotate(&mut self, axis: &Vector3<f64>, degrees: f64) {
        if axis.norm() < 1e-12 || degrees == 0.0 {
            return;
        }
        let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(*axis), degrees.to_radians());
        self.transform(&rotation.to_homogeneous());
    }

    pub fn translate(&mut self, offset: &Vector3<f64>) {
        for vertex in &mut self.vertices {
            vertex.position += offset;
        }
    }

    /// Non-uniform scale about the origin
    pub fn scale(&mut self, factors: &Vector3<f64>) {
        self.transform(&Matrix4::new_nonuniform_scaling(factors));
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.iter().map(|v| &v.position))
    }

    /// Enclosed volume (divergence theorem over the fan triangulation)
    pub fn volume(&self) -> f64 {
        self.triangles()
            .iter()
            .map(|[a, b, c]| {
                let p0 = self.vertices[*a].position.coords;
                let p1 = self.vertices[*b].position.coords;
                let p2 = self.vertices[*c].position.coords;
                p0.dot(&p1.cross(&p2))
            })
            .sum::<f64>()
            / 6.0
    }

    /// Merge with another mesh (concatenation without CSG)
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        for poly in &other.polygons {
            self.polygons.push(Polygon::new(
                poly.indices.iter().map(|i| i + offset).collect(),
                poly.normal,
            ));
        }
    }

    /// Perform boolean operation with another mesh
    pub fn boolean_operation(&self, other: &Mesh, op: BooleanOp) -> Mesh {
        super::boolean::perform_boolean_operation(self, other, op)
    }

    pub fn union(&self, other: &Mesh) -> Mesh {
        csg::csg_union(self, other)
    }

    pub fn subtract(&self, other: &Mesh) -> Mesh {
        csg::csg_difference(self, other)
    }

    pub fn intersect(&self, other: &Mesh) -> Mesh {
        csg::csg_intersection(self, other)
    }

    /// True when the two solids share a region of positive volume.
    /// The volume threshold scales with the smaller operand.
    pub fn overlaps(&self, other: &Mesh) -> bool {
        if !self
            .bounding_box()
            .overlaps(&other.bounding_box(), csg::PLANE_EPSILON)
        {
            return false;
        }
        let smaller = self.volume().abs().min(other.volume().abs());
        self.intersect(other).volume().abs() > csg::PLANE_EPSILON * smaller
    }
}

/// Newell's method: robust normal for planar polygons of any vertex count
fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    for (i, current) in points.iter().enumerate() {
        let next = &points[(i + 1) % points.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;

    fn unit_cube() -> Mesh {
        Primitive::cuboid(Vector3::new(1.0, 1.0, 1.0)).to_mesh()
    }

    #[test]
    fn test_from_polygons_computes_normals() {
        let mesh = Mesh::from_polygons(&[vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]]);
        assert_eq!(mesh.polygon_count(), 1);
        assert_eq!(mesh.triangle_count(), 2);
        assert_relative_eq!(mesh.polygons[0].normal, Vector3::z());
    }

    #[test]
    fn test_degenerate_polygons_skipped() {
        let mesh = Mesh::from_polygons(&[
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)],
        ]);
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_cube_volume_and_bbox() {
        let mesh = unit_cube();
        assert_relative_eq!(mesh.volume(), 1.0, epsilon = 1e-12);
        let bbox = mesh.bounding_box();
        assert_relative_eq!(bbox.min, Point3::new(-0.5, -0.5, -0.5));
        assert_relative_eq!(bbox.max, Point3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_rotate_and_translate() {
        let mut mesh = Primitive::cuboid(Vector3::new(2.0, 1.0, 1.0)).to_mesh();
        mesh.rotate(&Vector3::z(), 90.0);
        mesh.translate(&Vector3::new(10.0, 0.0, 0.0));

        let bbox = mesh.bounding_box();
        assert_relative_eq!(bbox.size(), Vector3::new(1.0, 2.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(bbox.center(), Point3::new(10.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(mesh.volume(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mirror_keeps_outward_winding() {
        let mut mesh = unit_cube();
        mesh.scale(&Vector3::new(-2.0, 1.0, 1.0));
        assert_relative_eq!(mesh.volume(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clone_leaves_template_untouched() {
        let template = unit_cube();
        let mut copy = template.clone();
        copy.translate(&Vector3::new(5.0, 5.0, 5.0));
        assert_relative_eq!(template.bounding_box().center(), Point3::origin());
    }

    #[test]
    fn test_overlaps() {
        let a = unit_cube();
        let mut touching = unit_cube();
        touching.translate(&Vector3::new(1.0, 0.0, 0.0));
        let mut crossing = unit_cube();
        crossing.translate(&Vector3::new(0.5, 0.0, 0.0));

        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&crossing));

        // Sub-millimetre solids overlapping by half
        let small = Primitive::cuboid(Vector3::new(0.02, 0.02, 0.02)).to_mesh();
        let mut shifted = small.clone();
        shifted.translate(&Vector3::new(0.01, 0.0, 0.0));
        assert!(small.overlaps(&shifted));
    }

    #[test]
    fn test_merge() {
        let mut a = unit_cube();
        let b = unit_cube();
        a.merge(&b);
        assert_eq!(a.polygon_count(), 12);
        assert!(a.polygons[11].indices.iter().all(|&i| i < a.vertex_count()));
    }
}
