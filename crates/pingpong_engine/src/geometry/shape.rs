//! Shapes: faces plus a transform
//!
//! A shape is the unit the rest of the engine refers to (by
//! [`ShapeKey`](crate::foundation::collections::ShapeKey)). Collision volumes
//! follow its translation, animators move it and render groups draw it.
//!
//! Geometry edits ([`gen_normals`](Shape::gen_normals),
//! [`center_and_normalize`](Shape::center_and_normalize), recoloring) bump
//! the shape's geometry revision so compiled copies know they are stale.

use std::collections::HashMap;

use crate::foundation::math::{EulerAngles, Mat4, Vec3};
use crate::geometry::{Face, GeometryError, PrimitiveMode, Vertex, VertexFormat};
use crate::transform::Transform;

/// Address of one vertex inside a shape: face index, then vertex index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexRef {
    /// Face index
    pub face: usize,
    /// Vertex index within the face
    pub vertex: usize,
}

impl VertexRef {
    /// Reference vertex `vertex` of face `face`
    pub const fn new(face: usize, vertex: usize) -> Self {
        Self { face, vertex }
    }
}

/// Options for [`Shape::compile_vertex_data`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompileOptions {
    /// Append a color to every vertex
    pub include_color: bool,
    /// Use this color for every vertex instead of the vertex colors
    pub force_color: Option<Vec3>,
}

impl CompileOptions {
    /// Positions and whatever normals/texture coordinates the vertices carry,
    /// plus their colors
    pub fn with_color() -> Self {
        Self {
            include_color: true,
            force_color: None,
        }
    }

    /// Like [`with_color`](Self::with_color) but every vertex gets `color`
    pub fn forced_color(color: Vec3) -> Self {
        Self {
            include_color: true,
            force_color: Some(color),
        }
    }
}

/// Interleaved vertex data ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledVertexData {
    /// Attributes present per vertex
    pub format: VertexFormat,
    /// `vertex_count * format.stride()` floats
    pub data: Vec<f32>,
    /// Number of vertices
    pub vertex_count: usize,
    /// Primitive mode the data is meant to be drawn with
    pub mode: PrimitiveMode,
}

/// A drawable, collidable, animatable piece of geometry
#[derive(Debug, Clone)]
pub struct Shape {
    faces: Vec<Face>,
    mode: PrimitiveMode,
    transform: Transform,
    geometry_revision: u64,
}

impl Shape {
    /// Create a shape from faces that all use `mode`
    pub fn new(faces: Vec<Face>, mode: PrimitiveMode) -> Result<Self, GeometryError> {
        if let Some(face) = faces.iter().find(|face| face.mode() != mode) {
            return Err(GeometryError::Validation(format!(
                "face mode {:?} does not match shape mode {:?}",
                face.mode(),
                mode
            )));
        }
        Ok(Self {
            faces,
            mode,
            transform: Transform::new(),
            geometry_revision: 0,
        })
    }

    /// Create a single-face shape straight from a vertex list
    pub fn from_vertices(vertices: Vec<Vertex>, mode: PrimitiveMode) -> Result<Self, GeometryError> {
        Self::new(vec![Face::new(vertices, mode)?], mode)
    }

    /// Axis-aligned box with its minimum corner at `origin`
    ///
    /// Six rectangular faces, each wound counter-clockwise when seen from
    /// outside. Uncolored vertices take `color`, if given.
    pub fn cuboid(width: f32, height: f32, depth: f32, origin: Vec3, color: Option<Vec3>) -> Self {
        let corner = |x: f32, y: f32, z: f32| {
            Vertex::from_position(origin + Vec3::new(x * width, y * height, z * depth))
        };
        // Grid order per side: bottom-left, bottom-right, top-left, top-right.
        let sides = [
            [corner(0.0, 0.0, 1.0), corner(1.0, 0.0, 1.0), corner(0.0, 1.0, 1.0), corner(1.0, 1.0, 1.0)],
            [corner(1.0, 0.0, 0.0), corner(0.0, 0.0, 0.0), corner(1.0, 1.0, 0.0), corner(0.0, 1.0, 0.0)],
            [corner(1.0, 0.0, 1.0), corner(1.0, 0.0, 0.0), corner(1.0, 1.0, 1.0), corner(1.0, 1.0, 0.0)],
            [corner(0.0, 0.0, 0.0), corner(0.0, 0.0, 1.0), corner(0.0, 1.0, 0.0), corner(0.0, 1.0, 1.0)],
            [corner(0.0, 1.0, 1.0), corner(1.0, 1.0, 1.0), corner(0.0, 1.0, 0.0), corner(1.0, 1.0, 0.0)],
            [corner(0.0, 0.0, 0.0), corner(1.0, 0.0, 0.0), corner(0.0, 0.0, 1.0), corner(1.0, 0.0, 1.0)],
        ];
        let faces = sides
            .into_iter()
            .map(|corners| {
                let face = Face::rect(corners);
                match color {
                    Some(color) => face.with_color(color),
                    None => face,
                }
            })
            .collect();
        Self {
            faces,
            mode: PrimitiveMode::Triangles,
            transform: Transform::new(),
            geometry_revision: 0,
        }
    }

    /// Cube of edge `size` with its minimum corner at `origin`
    pub fn cube(size: f32, origin: Vec3, color: Option<Vec3>) -> Self {
        Self::cuboid(size, size, size, origin, color)
    }

    /// Builder pattern: place the shape
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.transform.set_translation(translation);
        self
    }

    /// Builder pattern: color every uncolored vertex
    pub fn with_color(mut self, color: Vec3) -> Self {
        self.apply_fallback_color(color);
        self
    }

    /// Color every vertex that has no color of its own
    pub fn apply_fallback_color(&mut self, color: Vec3) {
        for face in &mut self.faces {
            face.apply_fallback_color(color);
        }
        self.geometry_revision += 1;
    }

    /// Faces in draw order
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Primitive mode shared by every face
    pub fn mode(&self) -> PrimitiveMode {
        self.mode
    }

    /// Total vertices across all faces
    pub fn vertex_count(&self) -> usize {
        self.faces.iter().map(Face::vertex_count).sum()
    }

    /// Look up a vertex by face and index
    pub fn vertex(&self, at: VertexRef) -> Option<&Vertex> {
        self.faces.get(at.face).and_then(|face| face.vertices().get(at.vertex))
    }

    /// Look up a vertex, failing with a validation error if it does not exist
    pub fn try_vertex(&self, at: VertexRef) -> Result<&Vertex, GeometryError> {
        self.vertex(at).ok_or_else(|| {
            GeometryError::Validation(format!(
                "no vertex {} in face {} (shape has {} faces)",
                at.vertex,
                at.face,
                self.faces.len()
            ))
        })
    }

    /// Changes whenever vertex data changes
    pub fn geometry_revision(&self) -> u64 {
        self.geometry_revision
    }

    /// Flag vertex data as changed so compiled copies are rebuilt
    pub fn mark_geometry_dirty(&mut self) {
        self.geometry_revision += 1;
    }

    /// Placement in the world
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Placement in the world, mutably
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// World translation
    pub fn translation(&self) -> Vec3 {
        self.transform.translation()
    }

    /// See [`Transform::set_translation`]
    pub fn set_translation(&mut self, translation: Vec3) {
        self.transform.set_translation(translation);
    }

    /// See [`Transform::translate_by`]
    pub fn translate_by(&mut self, delta: Vec3) {
        self.transform.translate_by(delta);
    }

    /// See [`Transform::set_rotation`]
    pub fn set_rotation(&mut self, rotation: EulerAngles) {
        self.transform.set_rotation(rotation);
    }

    /// See [`Transform::rotate_by`]
    pub fn rotate_by(&mut self, delta: EulerAngles) {
        self.transform.rotate_by(delta);
    }

    /// See [`Transform::set_scale`]
    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform.set_scale(scale);
    }

    /// Model matrix (cached)
    pub fn model_matrix(&mut self) -> Mat4 {
        self.transform.matrix()
    }

    /// Local-space axis-aligned bounds as `(min, max)`
    pub fn local_bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut positions = self.faces.iter().flat_map(|face| face.vertices()).map(|v| v.position);
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| (min.inf(&p), max.sup(&p))))
    }

    /// Flatten all faces into one interleaved float buffer
    ///
    /// The format follows the first vertex: position always, texture
    /// coordinates and normals if it has them (a face normal counts for
    /// vertices without their own), color if requested. Every other vertex
    /// must carry the same attributes.
    pub fn compile_vertex_data(&self, options: &CompileOptions) -> Result<CompiledVertexData, GeometryError> {
        let (first_face, first) = self
            .faces
            .iter()
            .find_map(|face| face.vertices().first().map(|v| (face, v)))
            .ok_or_else(|| GeometryError::Validation("shape has no vertices to compile".to_string()))?;

        let mut format = VertexFormat::POSITION;
        format.set(VertexFormat::TEX_COORD, first.tex_coord.is_some());
        format.set(
            VertexFormat::NORMAL,
            first.normal.or(first_face.normal()).is_some(),
        );
        format.set(VertexFormat::COLOR, options.include_color);

        let vertex_count = self.vertex_count();
        let mut data = Vec::with_capacity(vertex_count * format.stride());

        for face in &self.faces {
            for vertex in face.vertices() {
                data.extend_from_slice(vertex.position.as_slice());

                match (format.contains(VertexFormat::TEX_COORD), vertex.tex_coord) {
                    (true, Some(tex_coord)) => data.extend_from_slice(tex_coord.as_slice()),
                    (false, None) => {}
                    _ => return Err(format_mismatch(format, vertex)),
                }

                match (format.contains(VertexFormat::NORMAL), vertex.normal.or(face.normal())) {
                    (true, Some(normal)) => data.extend_from_slice(normal.as_slice()),
                    (false, None) => {}
                    _ => return Err(format_mismatch(format, vertex)),
                }

                if options.include_color {
                    let color = options.force_color.or(vertex.color).ok_or_else(|| {
                        GeometryError::MissingData(format!(
                            "vertex at {:?} has no color and no forced color was given",
                            vertex.position
                        ))
                    })?;
                    data.extend_from_slice(color.as_slice());
                }
            }
        }

        Ok(CompiledVertexData {
            format,
            data,
            vertex_count,
            mode: self.mode,
        })
    }

    /// Fill in missing normals
    ///
    /// Every face gets its own normal from its first triangle. Each vertex
    /// without a normal then gets the normalized sum of the normals of all
    /// faces that share its position.
    pub fn gen_normals(&mut self) -> Result<(), GeometryError> {
        // All or nothing: a degenerate face leaves the shape untouched.
        let normals = self
            .faces
            .iter()
            .map(Face::compute_normal)
            .collect::<Result<Vec<_>, _>>()?;

        let mut sums: HashMap<[u32; 3], Vec3> = HashMap::new();
        for (face, normal) in self.faces.iter_mut().zip(normals) {
            face.set_normal(normal);

            let mut seen = Vec::new();
            for vertex in face.vertices() {
                let key = position_key(vertex.position);
                if !seen.contains(&key) {
                    seen.push(key);
                    *sums.entry(key).or_insert_with(Vec3::zeros) += normal;
                }
            }
        }

        for face in &mut self.faces {
            let face_normal = face.normal();
            for vertex in face.vertices_mut().iter_mut().filter(|v| v.normal.is_none()) {
                let sum = sums.get(&position_key(vertex.position)).copied().unwrap_or_else(Vec3::zeros);
                vertex.normal = sum.try_normalize(f32::EPSILON).or(face_normal);
            }
        }

        self.geometry_revision += 1;
        log::debug!("Generated normals for {} faces", self.faces.len());
        Ok(())
    }

    /// Center the vertices on their centroid and scale them to a radius
    ///
    /// Afterwards the centroid is the origin and the farthest vertex lies
    /// exactly `radius` from it.
    #[allow(clippy::cast_precision_loss)]
    pub fn center_and_normalize(&mut self, radius: f32) -> Result<(), GeometryError> {
        let count = self.vertex_count();
        if count == 0 {
            return Err(GeometryError::Validation("shape has no vertices to normalize".to_string()));
        }
        let centroid = self
            .faces
            .iter()
            .flat_map(|face| face.vertices())
            .fold(Vec3::zeros(), |sum, v| sum + v.position)
            / count as f32;
        let farthest = self
            .faces
            .iter()
            .flat_map(|face| face.vertices())
            .map(|v| (v.position - centroid).norm())
            .fold(0.0_f32, f32::max);
        if farthest <= f32::EPSILON {
            return Err(GeometryError::Validation(
                "all vertices coincide, cannot normalize".to_string(),
            ));
        }

        let factor = radius / farthest;
        for face in &mut self.faces {
            for vertex in face.vertices_mut() {
                vertex.position = (vertex.position - centroid) * factor;
            }
        }
        self.geometry_revision += 1;
        Ok(())
    }
}

/// Hashable position; `+ 0.0` folds -0.0 into 0.0
fn position_key(p: Vec3) -> [u32; 3] {
    [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()]
}

fn format_mismatch(expected: VertexFormat, vertex: &Vertex) -> GeometryError {
    GeometryError::Validation(format!(
        "vertex at {:?} has format \"{}\", expected \"{}\"",
        vertex.position,
        vertex.format(),
        expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn red() -> Vec3 {
        Vec3::new(1.0, 0.0, 0.0)
    }

    fn triangle_shape() -> Shape {
        Shape::from_vertices(
            vec![
                Vertex::new(0.0, 0.0, 0.0),
                Vertex::new(1.0, 0.0, 0.0),
                Vertex::new(0.0, 1.0, 0.0),
            ],
            PrimitiveMode::Triangles,
        )
        .unwrap()
    }

    #[test]
    fn test_forced_color_compile() {
        let compiled = triangle_shape()
            .compile_vertex_data(&CompileOptions::forced_color(red()))
            .unwrap();
        assert_eq!(compiled.format.tag(), "vc");
        assert_eq!(compiled.vertex_count, 3);
        assert_eq!(compiled.data.len(), 18);
        assert_eq!(&compiled.data[..6], &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(&compiled.data[6..12], &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_color_fails() {
        let result = triangle_shape().compile_vertex_data(&CompileOptions::with_color());
        assert!(matches!(result, Err(GeometryError::MissingData(_))));
    }

    #[test]
    fn test_positions_only() {
        let compiled = triangle_shape()
            .compile_vertex_data(&CompileOptions::default())
            .unwrap();
        assert_eq!(compiled.format.tag(), "v");
        assert_eq!(compiled.data.len(), 9);
    }

    #[test]
    fn test_mixed_formats_rejected() {
        let shape = Shape::from_vertices(
            vec![
                Vertex::new(0.0, 0.0, 0.0).with_normal(Vec3::z()),
                Vertex::new(1.0, 0.0, 0.0),
                Vertex::new(0.0, 1.0, 0.0).with_normal(Vec3::z()),
            ],
            PrimitiveMode::Triangles,
        )
        .unwrap();
        let result = shape.compile_vertex_data(&CompileOptions::default());
        assert!(matches!(result, Err(GeometryError::Validation(_))));
    }

    #[test]
    fn test_later_normal_rejected() {
        let shape = Shape::from_vertices(
            vec![
                Vertex::new(0.0, 0.0, 0.0),
                Vertex::new(1.0, 0.0, 0.0).with_normal(Vec3::z()),
                Vertex::new(0.0, 1.0, 0.0),
            ],
            PrimitiveMode::Triangles,
        )
        .unwrap();
        let result = shape.compile_vertex_data(&CompileOptions::default());
        assert!(matches!(result, Err(GeometryError::Validation(_))));
    }

    #[test]
    fn test_later_face_normal_rejected() {
        let first = Face::triangles(vec![
            Vertex::new(0.0, 0.0, 0.0),
            Vertex::new(1.0, 0.0, 0.0),
            Vertex::new(0.0, 1.0, 0.0),
        ])
        .unwrap();
        let second = Face::triangles(vec![
            Vertex::new(0.0, 0.0, 1.0),
            Vertex::new(1.0, 0.0, 1.0),
            Vertex::new(0.0, 1.0, 1.0),
        ])
        .unwrap()
        .with_normal(Vec3::z());
        let shape = Shape::new(vec![first, second], PrimitiveMode::Triangles).unwrap();
        let result = shape.compile_vertex_data(&CompileOptions::default());
        assert!(matches!(result, Err(GeometryError::Validation(_))));
    }

    #[test]
    fn test_gen_normals_failure_leaves_shape_intact() {
        let good = Face::triangles(vec![
            Vertex::new(0.0, 0.0, 0.0),
            Vertex::new(1.0, 0.0, 0.0),
            Vertex::new(0.0, 1.0, 0.0),
        ])
        .unwrap();
        let collinear = Face::triangles(vec![
            Vertex::new(0.0, 0.0, 2.0),
            Vertex::new(1.0, 0.0, 2.0),
            Vertex::new(2.0, 0.0, 2.0),
        ])
        .unwrap();
        let mut shape = Shape::new(vec![good, collinear], PrimitiveMode::Triangles).unwrap();
        let revision = shape.geometry_revision();

        assert!(matches!(shape.gen_normals(), Err(GeometryError::Validation(_))));
        assert_eq!(shape.geometry_revision(), revision);
        assert!(shape.faces().iter().all(|face| face.normal().is_none()));
        let compiled = shape.compile_vertex_data(&CompileOptions::default()).unwrap();
        assert_eq!(compiled.format.tag(), "v");
    }

    #[test]
    fn test_mode_mismatch_rejected() {
        let face = Face::new(
            vec![
                Vertex::new(0.0, 0.0, 0.0),
                Vertex::new(1.0, 0.0, 0.0),
                Vertex::new(1.0, 1.0, 0.0),
                Vertex::new(0.0, 1.0, 0.0),
            ],
            PrimitiveMode::Quads,
        )
        .unwrap();
        assert!(Shape::new(vec![face], PrimitiveMode::Triangles).is_err());
    }

    #[test]
    fn test_cuboid_normals_point_outward() {
        let mut shape = Shape::cuboid(2.0, 1.0, 3.0, Vec3::zeros(), Some(red()));
        assert_eq!(shape.faces().len(), 6);
        assert_eq!(shape.vertex_count(), 36);

        shape.gen_normals().unwrap();
        let center = Vec3::new(1.0, 0.5, 1.5);
        for face in shape.faces() {
            let normal = face.normal().unwrap();
            let on_face = face.vertices()[0].position;
            assert!(normal.dot(&(on_face - center)) > 0.0);
        }
    }

    #[test]
    fn test_gen_normals_averages_shared_corners() {
        let mut shape = Shape::cube(1.0, Vec3::zeros(), None);
        shape.gen_normals().unwrap();

        // The corner at the origin touches the back, left and bottom faces.
        let corner = shape
            .faces()
            .iter()
            .flat_map(|face| face.vertices())
            .find(|v| v.position == Vec3::zeros())
            .unwrap();
        let expected = Vec3::new(-1.0, -1.0, -1.0).normalize();
        assert_relative_eq!(corner.normal.unwrap(), expected, epsilon = 1e-6);

        let compiled = shape.compile_vertex_data(&CompileOptions::forced_color(red())).unwrap();
        assert_eq!(compiled.format.tag(), "vnc");
    }

    #[test]
    fn test_gen_normals_keeps_existing() {
        let mut vertices = vec![
            Vertex::new(0.0, 0.0, 0.0),
            Vertex::new(1.0, 0.0, 0.0),
            Vertex::new(0.0, 1.0, 0.0),
        ];
        vertices[1].normal = Some(Vec3::x());
        let mut shape = Shape::from_vertices(vertices, PrimitiveMode::Triangles).unwrap();
        shape.gen_normals().unwrap();
        assert_eq!(shape.faces()[0].vertices()[1].normal, Some(Vec3::x()));
        assert_eq!(shape.faces()[0].vertices()[0].normal, Some(Vec3::z()));
    }

    #[test]
    fn test_center_and_normalize() {
        let mut shape = Shape::cube(4.0, Vec3::new(10.0, 10.0, 10.0), None);
        let before = shape.geometry_revision();
        shape.center_and_normalize(1.0).unwrap();
        assert!(shape.geometry_revision() > before);

        let (min, max) = shape.local_bounds().unwrap();
        assert_relative_eq!(min + max, Vec3::zeros(), epsilon = 1e-6);
        let farthest = shape
            .faces()
            .iter()
            .flat_map(|face| face.vertices())
            .map(|v| v.position.norm())
            .fold(0.0_f32, f32::max);
        assert_relative_eq!(farthest, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mark_geometry_dirty() {
        let mut shape = triangle_shape();
        let before = shape.geometry_revision();
        shape.translate_by(Vec3::x());
        assert_eq!(shape.geometry_revision(), before);
        shape.mark_geometry_dirty();
        assert_eq!(shape.geometry_revision(), before + 1);
    }

    #[test]
    fn test_vertex_lookup() {
        let shape = triangle_shape();
        assert_eq!(shape.vertex(VertexRef::new(0, 1)).unwrap().position, Vec3::x());
        assert!(shape.try_vertex(VertexRef::new(1, 0)).is_err());
        assert!(shape.try_vertex(VertexRef::new(0, 3)).is_err());
    }
}
