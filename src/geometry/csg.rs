// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! CSG (Constructive Solid Geometry) operations using BSP trees
//!
//! Polygons are clipped against the BSP tree of the other operand. Spanning
//! polygons are split at the plane; fragments keep the plane of their parent.

use super::Mesh;
use nalgebra::{Point3, Vector3};

/// Tolerance used to classify a point as lying on a plane
pub const PLANE_EPSILON: f64 = 1e-5;

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

#[derive(Debug, Clone)]
struct Plane {
    normal: Vector3<f64>,
    w: f64,
}

impl Plane {
    fn new(normal: Vector3<f64>, point: &Point3<f64>) -> Self {
        let w = normal.dot(&point.coords);
        Self { normal, w }
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    fn classify_point(&self, point: &Point3<f64>) -> u8 {
        let t = self.normal.dot(&point.coords) - self.w;
        if t < -PLANE_EPSILON {
            BACK
        } else if t > PLANE_EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }

    /// Sort `polygon` into the four buckets, splitting it when it spans the plane
    fn split_polygon(
        &self,
        polygon: Polygon,
        coplanar_front: &mut Vec<Polygon>,
        coplanar_back: &mut Vec<Polygon>,
        front: &mut Vec<Polygon>,
        back: &mut Vec<Polygon>,
    ) {
        let types: Vec<u8> = polygon
            .vertices
            .iter()
            .map(|v| self.classify_point(v))
            .collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, t| acc | t);

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon);
                } else {
                    coplanar_back.push(polygon);
                }
            }
            FRONT => front.push(polygon),
            BACK => back.push(polygon),
            _ => {
                let n = polygon.vertices.len();
                let mut f = Vec::with_capacity(n + 1);
                let mut b = Vec::with_capacity(n + 1);

                for i in 0..n {
                    let j = (i + 1) % n;
                    let (ti, tj) = (types[i], types[j]);
                    let vi = polygon.vertices[i];
                    let vj = polygon.vertices[j];

                    if ti != BACK {
                        f.push(vi);
                    }
                    if ti != FRONT {
                        b.push(vi);
                    }
                    if (ti | tj) == SPANNING {
                        let t = (self.w - self.normal.dot(&vi.coords))
                            / self.normal.dot(&(vj - vi));
                        let v = vi + (vj - vi) * t;
                        f.push(v);
                        b.push(v);
                    }
                }

                if f.len() >= 3 {
                    front.push(Polygon::with_plane(f, polygon.plane.clone()));
                }
                if b.len() >= 3 {
                    back.push(Polygon::with_plane(b, polygon.plane));
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Polygon {
    vertices: Vec<Point3<f64>>,
    plane: Plane,
}

impl Polygon {
    fn with_plane(vertices: Vec<Point3<f64>>, plane: Plane) -> Self {
        Self { vertices, plane }
    }

    fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
    }
}

/// BSP tree node for CSG operations
#[derive(Debug, Clone, Default)]
struct BSPNode {
    plane: Option<Plane>,
    front: Option<Box<BSPNode>>,
    back: Option<Box<BSPNode>>,
    polygons: Vec<Polygon>,
}

impl BSPNode {
    fn new(polygons: Vec<Polygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    fn build(&mut self, polygons: Vec<Polygon>) {
        if polygons.is_empty() {
            return;
        }

        let plane = self
            .plane
            .get_or_insert_with(|| polygons[0].plane.clone())
            .clone();

        let mut coplanar = Vec::new();
        let mut front_polys = Vec::new();
        let mut back_polys = Vec::new();
        let mut coplanar_back = Vec::new();

        for poly in polygons {
            plane.split_polygon(
                poly,
                &mut coplanar,
                &mut coplanar_back,
                &mut front_polys,
                &mut back_polys,
            );
        }
        self.polygons.append(&mut coplanar);
        self.polygons.append(&mut coplanar_back);

        if !front_polys.is_empty() {
            self.front
                .get_or_insert_with(Box::default)
                .build(front_polys);
        }
        if !back_polys.is_empty() {
            self.back.get_or_insert_with(Box::default).build(back_polys);
        }
    }

    fn all_polygons(&self) -> Vec<Polygon> {
        let mut result = self.polygons.clone();
        if let Some(ref front) = self.front {
            result.extend(front.all_polygons());
        }
        if let Some(ref back) = self.back {
            result.extend(back.all_polygons());
        }
        result
    }

    /// Remove the parts of `polygons` that lie inside this tree
    fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let Some(ref plane) = self.plane else {
            return polygons;
        };

        let mut front = Vec::new();
        let mut back = Vec::new();
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();

        for poly in polygons {
            plane.split_polygon(
                poly,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
        }
        front.append(&mut coplanar_front);
        back.append(&mut coplanar_back);

        let mut front = match self.front {
            Some(ref node) => node.clip_polygons(front),
            None => front,
        };
        let back = match self.back {
            Some(ref node) => node.clip_polygons(back),
            None => Vec::new(),
        };

        front.extend(back);
        front
    }

    fn clip_to(&mut self, bsp: &BSPNode) {
        self.polygons = bsp.clip_polygons(std::mem::take(&mut self.polygons));
        if let Some(ref mut front) = self.front {
            front.clip_to(bsp);
        }
        if let Some(ref mut back) = self.back {
            back.clip_to(bsp);
        }
    }

    /// Swap solid space and empty space
    fn invert(&mut self) {
        for poly in &mut self.polygons {
            poly.flip();
        }
        if let Some(ref mut plane) = self.plane {
            plane.flip();
        }
        if let Some(ref mut front) = self.front {
            front.invert();
        }
        if let Some(ref mut back) = self.back {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }
}

/// Convert mesh to polygons
fn mesh_to_polygons(mesh: &Mesh) -> Vec<Polygon> {
    mesh.polygons
        .iter()
        .filter_map(|poly| {
            let vertices: Vec<Point3<f64>> = poly
                .indices
                .iter()
                .map(|&i| mesh.vertices[i].position)
                .collect();
            if vertices.len() < 3 {
                return None;
            }
            let normal = poly.normal;
            if normal.norm_squared() < f64::EPSILON {
                return None;
            }
            let plane = Plane::new(normal, &vertices[0]);
            Some(Polygon::with_plane(vertices, plane))
        })
        .collect()
}

/// Convert polygons back to mesh
fn polygons_to_mesh(polygons: Vec<Polygon>) -> Mesh {
    let mut mesh = Mesh::with_capacity(polygons.len() * 4, polygons.len());
    for poly in polygons {
        mesh.push_polygon_with_normal(&poly.vertices, poly.plane.normal);
    }
    mesh
}

/// Perform CSG union using BSP trees
pub fn csg_union(a: &Mesh, b: &Mesh) -> Mesh {
    let mut tree_a = BSPNode::new(mesh_to_polygons(a));
    let mut tree_b = BSPNode::new(mesh_to_polygons(b));

    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.build(tree_b.all_polygons());

    polygons_to_mesh(tree_a.all_polygons())
}

/// Perform CSG difference `a - b` using BSP trees
pub fn csg_difference(a: &Mesh, b: &Mesh) -> Mesh {
    let mut tree_a = BSPNode::new(mesh_to_polygons(a));
    let mut tree_b = BSPNode::new(mesh_to_polygons(b));

    tree_a.invert();
    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.build(tree_b.all_polygons());
    tree_a.invert();

    polygons_to_mesh(tree_a.all_polygons())
}

/// Perform CSG intersection using BSP trees
pub fn csg_intersection(a: &Mesh, b: &Mesh) -> Mesh {
    if a.is_empty() || b.is_empty() {
        return Mesh::empty();
    }

    let mut tree_a = BSPNode::new(mesh_to_polygons(a));
    let mut tree_b = BSPNode::new(mesh_to_polygons(b));

    tree_a.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_a.build(tree_b.all_polygons());
    tree_a.invert();

    polygons_to_mesh(tree_a.all_polygons())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn cube(size: f64) -> Mesh {
        Primitive::cuboid(Vector3::new(size, size, size)).to_mesh()
    }

    #[test]
    fn test_split_spanning_polygon() {
        let plane = Plane::new(Vector3::x(), &Point3::origin());
        let square = vec![
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ];
        let poly = Polygon::with_plane(square.clone(), Plane::new(Vector3::z(), &square[0]));

        let (mut cf, mut cb, mut f, mut b) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        plane.split_polygon(poly, &mut cf, &mut cb, &mut f, &mut b);

        assert!(cf.is_empty() && cb.is_empty());
        assert_eq!(f.len(), 1);
        assert_eq!(b.len(), 1);
        assert!(f[0].vertices.iter().all(|v| v.x >= -PLANE_EPSILON));
        assert!(b[0].vertices.iter().all(|v| v.x <= PLANE_EPSILON));
    }

    #[test]
    fn test_csg_union_of_overlapping_cubes() {
        let a = cube(2.0);
        let mut b = cube(2.0);
        b.translate(&Vector3::new(1.0, 0.0, 0.0));

        let mesh = csg_union(&a, &b);
        let bbox = mesh.bounding_box();
        assert_relative_eq!(bbox.min.x, -1.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.max.x, 2.0, epsilon = 1e-9);
        assert_relative_eq!(mesh.volume(), 12.0, epsilon = 1e-6);
    }

    #[test]
    fn test_csg_difference() {
        let a = cube(2.0);
        let mut b = cube(2.0);
        b.translate(&Vector3::new(1.0, 0.0, 0.0));

        let mesh = csg_difference(&a, &b);
        let bbox = mesh.bounding_box();
        assert_relative_eq!(bbox.max.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(mesh.volume(), 4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_csg_intersection() {
        let a = cube(2.0);
        let mut b = cube(2.0);
        b.translate(&Vector3::new(1.0, 1.0, 0.0));

        let mesh = csg_intersection(&a, &b);
        assert_relative_eq!(mesh.volume(), 2.0, epsilon = 1e-6);
        assert!(csg_intersection(&a, &Mesh::empty()).is_empty());
    }

    #[test]
    fn test_difference_of_contained_cube_is_empty() {
        let small = cube(1.0);
        let big = cube(4.0);
        assert!(csg_difference(&small, &big).is_empty());
    }
}
