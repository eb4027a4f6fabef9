//! Flat faces

use crate::foundation::math::Vec3;
use crate::geometry::{GeometryError, Vertex};

/// Below this length a cross product is treated as zero
const DEGENERATE_EPSILON: f32 = 1e-8;

/// How a face's vertex list is split into primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveMode {
    /// Every three vertices form a triangle
    #[default]
    Triangles,
    /// Every four vertices form a quad
    Quads,
}

impl PrimitiveMode {
    /// Vertices per primitive
    pub const fn arity(self) -> usize {
        match self {
            Self::Triangles => 3,
            Self::Quads => 4,
        }
    }
}

/// A flat polygon made of one or more primitives
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    vertices: Vec<Vertex>,
    normal: Option<Vec3>,
    mode: PrimitiveMode,
}

impl Face {
    /// Create a face, checking the vertex count against the mode
    ///
    /// Fewer than three vertices is a degenerate face; otherwise the count
    /// must be a multiple of the mode's arity.
    pub fn new(vertices: Vec<Vertex>, mode: PrimitiveMode) -> Result<Self, GeometryError> {
        if vertices.len() < 3 {
            return Err(GeometryError::Validation(format!(
                "degenerate face: {} vertices, at least 3 are required",
                vertices.len()
            )));
        }
        if vertices.len() % mode.arity() != 0 {
            return Err(GeometryError::Validation(format!(
                "{} vertices cannot be split into {:?} of {}",
                vertices.len(),
                mode,
                mode.arity()
            )));
        }
        Ok(Self {
            vertices,
            normal: None,
            mode,
        })
    }

    /// Create a triangle-mode face
    pub fn triangles(vertices: Vec<Vertex>) -> Result<Self, GeometryError> {
        Self::new(vertices, PrimitiveMode::Triangles)
    }

    /// Build a rectangle from four corners as two triangles
    ///
    /// Corners are given in grid order as seen from the front: bottom-left,
    /// bottom-right, top-left, top-right. The triangles are `[0, 1, 3]` and
    /// `[0, 3, 2]`, both counter-clockwise from the front.
    pub fn rect(corners: [Vertex; 4]) -> Self {
        let [bl, br, tl, tr] = corners;
        Self {
            vertices: vec![bl, br, tr, bl, tr, tl],
            normal: None,
            mode: PrimitiveMode::Triangles,
        }
    }

    /// Builder pattern: give every vertex without a color this one
    pub fn with_color(mut self, color: Vec3) -> Self {
        self.apply_fallback_color(color);
        self
    }

    /// Builder pattern: set the per-face normal
    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = Some(normal);
        self
    }

    /// Color every vertex that has no color of its own
    pub fn apply_fallback_color(&mut self, color: Vec3) {
        for vertex in self.vertices.iter_mut().filter(|v| v.color.is_none()) {
            vertex.color = Some(color);
        }
    }

    /// The vertices, in primitive order
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub(crate) fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    /// Per-face normal, if one was set or generated
    pub fn normal(&self) -> Option<Vec3> {
        self.normal
    }

    pub(crate) fn set_normal(&mut self, normal: Vec3) {
        self.normal = Some(normal);
    }

    /// Primitive mode
    pub fn mode(&self) -> PrimitiveMode {
        self.mode
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Unit normal of the first triangle (right-hand rule)
    pub fn compute_normal(&self) -> Result<Vec3, GeometryError> {
        let [v0, v1, v2] = match self.vertices.as_slice() {
            [a, b, c, ..] => [a.position, b.position, c.position],
            _ => {
                return Err(GeometryError::Validation(
                    "cannot compute a normal for a face with fewer than 3 vertices".to_string(),
                ))
            }
        };
        let cross = (v1 - v0).cross(&(v2 - v0));
        if cross.norm() < DEGENERATE_EPSILON {
            return Err(GeometryError::Validation(
                "degenerate face: first triangle has no area".to_string(),
            ));
        }
        Ok(cross.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle() -> Vec<Vertex> {
        vec![
            Vertex::new(0.0, 0.0, 0.0),
            Vertex::new(1.0, 0.0, 0.0),
            Vertex::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_triangle_count_validation() {
        assert!(Face::triangles(triangle()).is_ok());

        let mut four = triangle();
        four.push(Vertex::new(1.0, 1.0, 0.0));
        assert!(matches!(Face::triangles(four.clone()), Err(GeometryError::Validation(_))));
        assert!(Face::new(four, PrimitiveMode::Quads).is_ok());
    }

    #[test]
    fn test_degenerate_face_rejected() {
        let two = vec![Vertex::new(0.0, 0.0, 0.0), Vertex::new(1.0, 0.0, 0.0)];
        assert!(matches!(Face::triangles(two), Err(GeometryError::Validation(_))));
    }

    #[test]
    fn test_fallback_color_only_fills_gaps() {
        let red = Vec3::new(1.0, 0.0, 0.0);
        let blue = Vec3::new(0.0, 0.0, 1.0);
        let mut vertices = triangle();
        vertices[0].color = Some(blue);

        let face = Face::triangles(vertices).unwrap().with_color(red);
        assert_eq!(face.vertices()[0].color, Some(blue));
        assert_eq!(face.vertices()[1].color, Some(red));
        assert_eq!(face.vertices()[2].color, Some(red));
    }

    #[test]
    fn test_rect_splits_into_triangles() {
        let face = Face::rect([
            Vertex::new(0.0, 0.0, 0.0),
            Vertex::new(1.0, 0.0, 0.0),
            Vertex::new(0.0, 1.0, 0.0),
            Vertex::new(1.0, 1.0, 0.0),
        ]);
        assert_eq!(face.vertex_count(), 6);
        assert_relative_eq!(face.compute_normal().unwrap(), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_collinear_normal_fails() {
        let face = Face::triangles(vec![
            Vertex::new(0.0, 0.0, 0.0),
            Vertex::new(1.0, 0.0, 0.0),
            Vertex::new(2.0, 0.0, 0.0),
        ])
        .unwrap();
        assert!(face.compute_normal().is_err());
    }
}
