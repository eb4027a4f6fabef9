//! Vertex data and the format flags describing it

use std::fmt;

use bitflags::bitflags;

use crate::foundation::math::{Vec2, Vec3};
use crate::geometry::GeometryError;

bitflags! {
    /// Which attributes a compiled vertex carries
    ///
    /// The textual tag lists one letter per attribute in a fixed order:
    /// `v` position, `t` texture coordinate, `n` normal, `c` color.
    /// `"vnc"` therefore means position + normal + color.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VertexFormat: u8 {
        /// Position (3 floats), always present
        const POSITION = 1 << 0;
        /// Texture coordinate (2 floats)
        const TEX_COORD = 1 << 1;
        /// Normal (3 floats)
        const NORMAL = 1 << 2;
        /// Color (3 floats)
        const COLOR = 1 << 3;
    }
}

/// Attribute flag, tag letter and float count, in interleaving order
const ATTRIBUTE_ORDER: [(VertexFormat, char, usize); 4] = [
    (VertexFormat::POSITION, 'v', 3),
    (VertexFormat::TEX_COORD, 't', 2),
    (VertexFormat::NORMAL, 'n', 3),
    (VertexFormat::COLOR, 'c', 3),
];

impl VertexFormat {
    /// Canonical tag such as `"vnc"`
    pub fn tag(self) -> String {
        ATTRIBUTE_ORDER
            .iter()
            .filter(|(flag, _, _)| self.contains(*flag))
            .map(|(_, letter, _)| *letter)
            .collect()
    }

    /// Parse a tag back into flags
    ///
    /// Letters may come in any order but each at most once, and `v` is
    /// mandatory.
    pub fn from_tag(tag: &str) -> Result<Self, GeometryError> {
        let mut format = Self::empty();
        for letter in tag.chars() {
            let flag = ATTRIBUTE_ORDER
                .iter()
                .find(|(_, l, _)| *l == letter)
                .map(|(flag, _, _)| *flag)
                .ok_or_else(|| {
                    GeometryError::Validation(format!("unknown vertex format letter '{letter}' in \"{tag}\""))
                })?;
            if format.contains(flag) {
                return Err(GeometryError::Validation(format!(
                    "vertex format letter '{letter}' repeated in \"{tag}\""
                )));
            }
            format |= flag;
        }
        if !format.contains(Self::POSITION) {
            return Err(GeometryError::Validation(format!(
                "vertex format \"{tag}\" has no position"
            )));
        }
        Ok(format)
    }

    /// Floats per vertex
    pub fn stride(self) -> usize {
        ATTRIBUTE_ORDER
            .iter()
            .filter(|(flag, _, _)| self.contains(*flag))
            .map(|(_, _, size)| size)
            .sum()
    }

    /// `(attribute, offset in floats, float count)` for every present attribute
    pub fn attributes(self) -> Vec<(Self, usize, usize)> {
        let mut offset = 0;
        let mut attributes = Vec::new();
        for (flag, _, size) in ATTRIBUTE_ORDER {
            if self.contains(flag) {
                attributes.push((flag, offset, size));
                offset += size;
            }
        }
        attributes
    }
}

impl fmt::Display for VertexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// A single vertex
///
/// Only the position is mandatory. Vertices are plain values; once placed in
/// a [`Face`](crate::geometry::Face) they change only through the owning
/// shape's geometry operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in the shape's local space
    pub position: Vec3,
    /// Texture coordinate
    pub tex_coord: Option<Vec2>,
    /// Normal vector
    pub normal: Option<Vec3>,
    /// RGB color
    pub color: Option<Vec3>,
}

impl Vertex {
    /// Create a vertex with only a position
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self::from_position(Vec3::new(x, y, z))
    }

    /// Create a vertex from a position vector
    pub const fn from_position(position: Vec3) -> Self {
        Self {
            position,
            tex_coord: None,
            normal: None,
            color: None,
        }
    }

    /// Builder pattern: set the color
    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = Some(color);
        self
    }

    /// Builder pattern: set the normal
    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = Some(normal);
        self
    }

    /// Builder pattern: set the texture coordinate
    pub fn with_tex_coord(mut self, tex_coord: Vec2) -> Self {
        self.tex_coord = Some(tex_coord);
        self
    }

    /// Attributes this vertex carries
    pub fn format(&self) -> VertexFormat {
        let mut format = VertexFormat::POSITION;
        format.set(VertexFormat::TEX_COORD, self.tex_coord.is_some());
        format.set(VertexFormat::NORMAL, self.normal.is_some());
        format.set(VertexFormat::COLOR, self.color.is_some());
        format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        let format = VertexFormat::from_tag("vnc").unwrap();
        assert_eq!(
            format,
            VertexFormat::POSITION | VertexFormat::NORMAL | VertexFormat::COLOR
        );
        assert_eq!(format.tag(), "vnc");
        assert_eq!(format.stride(), 9);
    }

    #[test]
    fn test_tag_is_canonicalized() {
        let format = VertexFormat::from_tag("cv").unwrap();
        assert_eq!(format.tag(), "vc");
    }

    #[test]
    fn test_bad_tags() {
        assert!(matches!(VertexFormat::from_tag("vx"), Err(GeometryError::Validation(_))));
        assert!(matches!(VertexFormat::from_tag("vnn"), Err(GeometryError::Validation(_))));
        assert!(matches!(VertexFormat::from_tag("nc"), Err(GeometryError::Validation(_))));
    }

    #[test]
    fn test_attribute_offsets() {
        let format = VertexFormat::from_tag("vtnc").unwrap();
        let offsets: Vec<_> = format.attributes().iter().map(|(_, offset, _)| *offset).collect();
        assert_eq!(offsets, vec![0, 3, 5, 8]);
        assert_eq!(format.stride(), 11);
    }

    #[test]
    fn test_vertex_format_tracks_fields() {
        let vertex = Vertex::new(0.0, 1.0, 2.0).with_color(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(vertex.format().tag(), "vc");
    }
}
