//! Region boundary polygons and point containment.
//!
//! A [`Boundary`] keeps the polygon outline together with its triangulation. Every
//! [`BoundaryTriangle`] carries [`Barycentric`] data precomputed once, so a containment query is a
//! handful of dot products per triangle. The test itself sits behind [`TriangleContainment`];
//! [`BarycentricTest`] is the stock implementation.
use geo::{Coord, LineString, Polygon, TriangulateEarcut};
use glam::DVec2;

use crate::error::{Error, Result};

/// Precomputed barycentric basis of a triangle `(a, b, c)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barycentric {
    pub v0: DVec2,
    pub v1: DVec2,
    pub dot00: f64,
    pub dot01: f64,
    pub dot11: f64,
    pub inv_denom: f64,
}

impl Barycentric {
    /// Returns `None` for degenerate (zero-area) triangles.
    pub fn precompute(vertices: &[DVec2; 3]) -> Option<Self> {
        let [a, b, c] = *vertices;
        let v0 = c - a;
        let v1 = b - a;
        let dot00 = v0.dot(v0);
        let dot01 = v0.dot(v1);
        let dot11 = v1.dot(v1);
        let denom = dot00 * dot11 - dot01 * dot01;
        if denom <= f64::EPSILON * dot00 * dot11 {
            return None;
        }
        Some(Self {
            v0,
            v1,
            dot00,
            dot01,
            dot11,
            inv_denom: 1.0 / denom,
        })
    }

    /// Barycentric coordinates `(u, v)` of `point` relative to `origin` (the triangle's `a`).
    #[inline]
    pub fn coordinates(&self, origin: DVec2, point: DVec2) -> (f64, f64) {
        let v2 = point - origin;
        let dot02 = self.v0.dot(v2);
        let dot12 = self.v1.dot(v2);
        let u = (self.dot11 * dot02 - self.dot01 * dot12) * self.inv_denom;
        let v = (self.dot00 * dot12 - self.dot01 * dot02) * self.inv_denom;
        (u, v)
    }
}

/// One triangle of a boundary triangulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryTriangle {
    pub vertices: [DVec2; 3],
    pub barycentric: Barycentric,
}

impl BoundaryTriangle {
    pub fn new(vertices: [DVec2; 3]) -> Option<Self> {
        Barycentric::precompute(&vertices).map(|barycentric| Self {
            vertices,
            barycentric,
        })
    }
}

/// Point-in-triangle test used by [`Boundary::contains_with`].
pub trait TriangleContainment {
    fn point_in_triangle_fast(&self, point: DVec2, triangle: &BoundaryTriangle) -> bool;
}

/// Barycentric containment; points on an edge count as inside.
#[derive(Debug, Clone, Copy)]
pub struct BarycentricTest {
    pub epsilon: f64,
}

impl Default for BarycentricTest {
    fn default() -> Self {
        Self { epsilon: 1e-9 }
    }
}

impl TriangleContainment for BarycentricTest {
    #[inline]
    fn point_in_triangle_fast(&self, point: DVec2, triangle: &BoundaryTriangle) -> bool {
        let (u, v) = triangle
            .barycentric
            .coordinates(triangle.vertices[0], point);
        u >= -self.epsilon && v >= -self.epsilon && u + v <= 1.0 + self.epsilon
    }
}

/// A polygon outline plus its triangulation.
#[derive(Debug, Clone, Default)]
pub struct Boundary {
    vertices: Vec<DVec2>,
    triangles: Vec<BoundaryTriangle>,
}

impl Boundary {
    /// Boundary from an existing triangulation. Degenerate triangles are dropped.
    pub fn from_triangles(vertices: Vec<DVec2>, triangles: &[[DVec2; 3]]) -> Self {
        let triangles = triangles
            .iter()
            .filter_map(|t| BoundaryTriangle::new(*t))
            .collect();
        Self {
            vertices,
            triangles,
        }
    }

    /// Triangulates a simple polygon (either winding) with `geo`'s earcut.
    pub fn triangulate(vertices: Vec<DVec2>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(Error::InvalidConfig(format!(
                "boundary needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }

        let ring: Vec<Coord<f64>> = vertices.iter().map(|v| Coord { x: v.x, y: v.y }).collect();
        let polygon = Polygon::new(LineString::new(ring), Vec::new());
        let triangles: Vec<[DVec2; 3]> = polygon
            .earcut_triangles()
            .into_iter()
            .map(|t| t.to_array().map(|c| DVec2::new(c.x, c.y)))
            .collect();

        let boundary = Self::from_triangles(vertices, &triangles);
        if boundary.is_empty() {
            return Err(Error::InvalidConfig("boundary polygon has no area".into()));
        }
        Ok(boundary)
    }

    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[BoundaryTriangle] {
        &self.triangles
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Returns `true` as soon as one triangle contains the point.
    pub fn contains_with(&self, point: DVec2, test: &dyn TriangleContainment) -> bool {
        self.triangles
            .iter()
            .any(|t| test.point_in_triangle_fast(point, t))
    }

    pub fn contains(&self, point: DVec2) -> bool {
        self.contains_with(point, &BarycentricTest::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<DVec2> {
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(0.0, 10.0),
        ]
    }

    #[test]
    fn degenerate_triangle_has_no_barycentric_data() {
        let line = [DVec2::ZERO, DVec2::new(1.0, 1.0), DVec2::new(2.0, 2.0)];
        assert!(Barycentric::precompute(&line).is_none());
    }

    #[test]
    fn barycentric_test_includes_edges() {
        let t = BoundaryTriangle::new([DVec2::ZERO, DVec2::new(4.0, 0.0), DVec2::new(0.0, 4.0)])
            .unwrap();
        let test = BarycentricTest::default();
        assert!(test.point_in_triangle_fast(DVec2::new(1.0, 1.0), &t));
        assert!(test.point_in_triangle_fast(DVec2::new(2.0, 2.0), &t));
        assert!(test.point_in_triangle_fast(DVec2::new(2.0, 0.0), &t));
        assert!(!test.point_in_triangle_fast(DVec2::new(3.0, 3.0), &t));
        assert!(!test.point_in_triangle_fast(DVec2::new(-0.1, 1.0), &t));
    }

    #[test]
    fn square_triangulates_into_two_triangles() {
        let boundary = Boundary::triangulate(square()).unwrap();
        assert_eq!(boundary.triangles().len(), 2);
        assert!(boundary.contains(DVec2::new(2.0, 7.0)));
        assert!(boundary.contains(DVec2::new(8.0, 1.0)));
        assert!(!boundary.contains(DVec2::new(11.0, 5.0)));
        assert!(!boundary.contains(DVec2::new(5.0, -0.5)));
    }

    #[test]
    fn shared_diagonal_has_no_gap() {
        let boundary = Boundary::triangulate(square()).unwrap();
        // Both possible diagonals of the square pass through the center.
        assert!(boundary.contains(DVec2::new(5.0, 5.0)));
        let diagonal = boundary.triangles()[0].vertices;
        let mid = (diagonal[0] + diagonal[2]) * 0.5;
        assert!(boundary.contains(mid));
    }

    #[test]
    fn clockwise_concave_polygon_is_triangulated() {
        // L shape, clockwise.
        let mut l_shape = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(6.0, 0.0),
            DVec2::new(6.0, 2.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(2.0, 6.0),
            DVec2::new(0.0, 6.0),
        ];
        l_shape.reverse();
        let boundary = Boundary::triangulate(l_shape).unwrap();
        assert_eq!(boundary.triangles().len(), 4);
        assert!(boundary.contains(DVec2::new(1.0, 5.0)));
        assert!(boundary.contains(DVec2::new(5.0, 1.0)));
        assert!(!boundary.contains(DVec2::new(4.0, 4.0)));
    }

    #[test]
    fn too_few_vertices_is_an_error() {
        let err = Boundary::triangulate(vec![DVec2::ZERO, DVec2::X]).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn collinear_polygon_is_an_error() {
        let line = vec![DVec2::ZERO, DVec2::new(1.0, 0.0), DVec2::new(2.0, 0.0)];
        assert!(matches!(
            Boundary::triangulate(line),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_boundary_contains_nothing() {
        assert!(!Boundary::default().contains(DVec2::ZERO));
    }

    struct Never;

    impl TriangleContainment for Never {
        fn point_in_triangle_fast(&self, _point: DVec2, _triangle: &BoundaryTriangle) -> bool {
            false
        }
    }

    #[test]
    fn contains_with_delegates_to_test() {
        let boundary = Boundary::triangulate(square()).unwrap();
        assert!(!boundary.contains_with(DVec2::new(5.0, 5.0), &Never));
    }
}
