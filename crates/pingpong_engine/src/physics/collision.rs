//! Bounding volumes and intersection tests
//!
//! A [`BoundingVolume`] is a box, sphere, point or a frame grouping other
//! volumes. Its base position is never stored: it is resolved from its
//! [`Attachment`] every time it is queried, so a volume attached to a shape
//! follows that shape wherever animators move it.
//!
//! Boundary conventions:
//! - box against box and point against box count touching as colliding
//! - anything against a sphere needs strict overlap

use std::fmt;

use thiserror::Error;

use crate::foundation::collections::{ShapeArena, ShapeKey, VolumeKey};
use crate::foundation::math::Vec3;
use crate::geometry::{GeometryError, VertexRef};

/// Errors raised by collision queries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollisionError {
    /// The pair has no intersection test and neither side suppresses that
    #[error("No collision test between {a} and {b}")]
    Unsupported {
        /// Kind of the first volume
        a: VolumeKind,
        /// Kind of the second volume
        b: VolumeKind,
    },

    /// A volume is attached to a shape that is no longer in the scene
    #[error("Volume is attached to missing shape {0:?}")]
    MissingShape(ShapeKey),

    /// A volume key that is not registered
    #[error("Unknown volume {0:?}")]
    MissingVolume(VolumeKey),

    /// Bad attachment data (vertex out of range, too few tracked points)
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Volume variant without its data, for error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeKind {
    /// Axis-aligned box
    Box,
    /// Sphere
    Sphere,
    /// Single point
    Point,
    /// Compound of other volumes
    Frame,
}

impl fmt::Display for VolumeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Box => "box",
            Self::Sphere => "sphere",
            Self::Point => "point",
            Self::Frame => "frame",
        };
        f.write_str(name)
    }
}

/// Geometry of a volume relative to its base
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeShape {
    /// Axis-aligned box; the base is the minimum corner
    Box {
        /// Extent along each axis
        size: Vec3,
    },
    /// Sphere centered on the base
    Sphere {
        /// Radius
        radius: f32,
    },
    /// The base itself
    Point,
    /// Members positioned relative to the frame's base
    Frame(Vec<BoundingVolume>),
}

/// Where a volume's base comes from
#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
    /// Fixed at the base offset
    Free,
    /// Shape translation plus base offset
    Shape(ShapeKey),
    /// Shape translation plus a vertex's local position plus base offset
    Vertex {
        /// Shape owning the vertex
        shape: ShapeKey,
        /// Which vertex
        vertex: VertexRef,
    },
    /// Box spanning the tracked vertices of a shape, re-fitted at every query
    BoundingBox {
        /// Shape owning the vertices
        shape: ShapeKey,
        /// Tracked vertices, at least two
        points: Vec<VertexRef>,
    },
}

/// A volume with its base resolved to world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedVolume {
    /// Box between two corners
    Box {
        /// Minimum corner
        near: Vec3,
        /// Maximum corner
        far: Vec3,
    },
    /// Sphere
    Sphere {
        /// Center
        center: Vec3,
        /// Radius
        radius: f32,
    },
    /// Point
    Point(Vec3),
}

/// A collision volume
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingVolume {
    shape: VolumeShape,
    base_offset: Vec3,
    attachment: Attachment,
    suppress_unsupported: bool,
}

impl BoundingVolume {
    fn with_shape(shape: VolumeShape) -> Self {
        Self {
            shape,
            base_offset: Vec3::zeros(),
            attachment: Attachment::Free,
            suppress_unsupported: false,
        }
    }

    /// Axis-aligned box with its near corner at the base
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Self::with_shape(VolumeShape::Box {
            size: Vec3::new(width, height, depth),
        })
    }

    /// Sphere centered on the base
    pub fn sphere(radius: f32) -> Self {
        Self::with_shape(VolumeShape::Sphere { radius })
    }

    /// A single point at the base
    pub fn point() -> Self {
        Self::with_shape(VolumeShape::Point)
    }

    /// Group of volumes that collides when any member does
    pub fn frame(members: Vec<BoundingVolume>) -> Self {
        Self::with_shape(VolumeShape::Frame(members))
    }

    /// Builder pattern: set the base offset
    pub fn at(mut self, offset: Vec3) -> Self {
        self.base_offset = offset;
        self
    }

    /// Builder pattern: attach to a shape's translation
    pub fn attached_to(mut self, shape: ShapeKey) -> Self {
        self.attach_to_shape(shape);
        self
    }

    /// Builder pattern: report unsupported pairs as non-colliding
    pub fn suppressing_unsupported(mut self) -> Self {
        self.suppress_unsupported = true;
        self
    }

    /// Geometry relative to the base
    pub fn volume_shape(&self) -> &VolumeShape {
        &self.shape
    }

    /// Variant without its data
    pub fn kind(&self) -> VolumeKind {
        match self.shape {
            VolumeShape::Box { .. } => VolumeKind::Box,
            VolumeShape::Sphere { .. } => VolumeKind::Sphere,
            VolumeShape::Point => VolumeKind::Point,
            VolumeShape::Frame(_) => VolumeKind::Frame,
        }
    }

    /// Where the base comes from
    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    /// The shape this volume follows, if any
    pub fn attached_shape(&self) -> Option<ShapeKey> {
        match &self.attachment {
            Attachment::Free => None,
            Attachment::Shape(shape)
            | Attachment::Vertex { shape, .. }
            | Attachment::BoundingBox { shape, .. } => Some(*shape),
        }
    }

    /// Offset added to the attachment point
    pub fn base_offset(&self) -> Vec3 {
        self.base_offset
    }

    /// Replace the base offset
    pub fn set_base_offset(&mut self, offset: Vec3) {
        self.base_offset = offset;
    }

    /// Move the base offset
    pub fn move_by(&mut self, delta: Vec3) {
        self.base_offset += delta;
    }

    /// Whether pairs without a test count as not colliding
    pub fn is_suppressing_unsupported(&self) -> bool {
        self.suppress_unsupported
    }

    /// Turn suppress mode on or off
    pub fn set_suppress_unsupported(&mut self, suppress: bool) {
        self.suppress_unsupported = suppress;
    }

    /// Follow a shape's translation
    pub fn attach_to_shape(&mut self, shape: ShapeKey) {
        self.attachment = Attachment::Shape(shape);
    }

    /// Follow one vertex of a shape
    pub fn attach_to_vertex(&mut self, shape: ShapeKey, vertex: VertexRef) {
        self.attachment = Attachment::Vertex { shape, vertex };
    }

    /// Make a box track the extent of some of a shape's vertices
    ///
    /// Only boxes can do this and at least two points are needed; the box's
    /// own size is ignored while attached this way.
    pub fn attach_as_bounding_box(
        &mut self,
        shape: ShapeKey,
        points: Vec<VertexRef>,
    ) -> Result<(), CollisionError> {
        if self.kind() != VolumeKind::Box {
            return Err(GeometryError::Validation(format!(
                "only boxes can track vertices, this volume is a {}",
                self.kind()
            ))
            .into());
        }
        if points.len() < 2 {
            return Err(GeometryError::Validation(format!(
                "a tracking box needs at least 2 points, got {}",
                points.len()
            ))
            .into());
        }
        self.attachment = Attachment::BoundingBox { shape, points };
        Ok(())
    }

    /// Go back to a fixed position at the base offset
    pub fn detach(&mut self) {
        self.attachment = Attachment::Free;
    }

    /// World position of the base
    ///
    /// For a tracking box this is the minimum corner of the tracked points.
    pub fn base(&self, shapes: &ShapeArena) -> Result<Vec3, CollisionError> {
        self.base_in(shapes, Vec3::zeros())
    }

    fn base_in(&self, shapes: &ShapeArena, parent: Vec3) -> Result<Vec3, CollisionError> {
        let anchor = match &self.attachment {
            Attachment::Free => Vec3::zeros(),
            Attachment::Shape(key) => lookup(shapes, *key)?.translation(),
            Attachment::Vertex { shape, vertex } => {
                let shape = lookup(shapes, *shape)?;
                shape.translation() + shape.try_vertex(*vertex)?.position
            }
            Attachment::BoundingBox { shape, points } => {
                let (min, _) = tracked_extent(shapes, *shape, points)?;
                min
            }
        };
        Ok(parent + anchor + self.base_offset)
    }

    /// Resolve a non-frame volume to world space
    ///
    /// Frames have no single resolved form; resolving one is a validation
    /// error. Use [`detect_collision`](Self::detect_collision) instead.
    pub fn resolve(&self, shapes: &ShapeArena) -> Result<ResolvedVolume, CollisionError> {
        self.resolve_in(shapes, Vec3::zeros())
    }

    fn resolve_in(&self, shapes: &ShapeArena, parent: Vec3) -> Result<ResolvedVolume, CollisionError> {
        let base = self.base_in(shapes, parent)?;
        match &self.shape {
            VolumeShape::Box { size } => {
                let size = match &self.attachment {
                    Attachment::BoundingBox { shape, points } => {
                        let (min, max) = tracked_extent(shapes, *shape, points)?;
                        max - min
                    }
                    _ => *size,
                };
                Ok(ResolvedVolume::Box {
                    near: base,
                    far: base + size,
                })
            }
            VolumeShape::Sphere { radius } => Ok(ResolvedVolume::Sphere {
                center: base,
                radius: *radius,
            }),
            VolumeShape::Point => Ok(ResolvedVolume::Point(base)),
            VolumeShape::Frame(_) => Err(GeometryError::Validation(
                "a frame has no single resolved volume".to_string(),
            )
            .into()),
        }
    }

    /// Test this volume against another
    ///
    /// Frames collide when any member does. A pair of primitives without an
    /// intersection test is an [`CollisionError::Unsupported`] error unless
    /// either side suppresses it, in which case it does not collide.
    pub fn detect_collision(
        &self,
        other: &BoundingVolume,
        shapes: &ShapeArena,
    ) -> Result<bool, CollisionError> {
        self.detect_in(other, shapes, Vec3::zeros(), Vec3::zeros())
    }

    fn detect_in(
        &self,
        other: &BoundingVolume,
        shapes: &ShapeArena,
        parent: Vec3,
        other_parent: Vec3,
    ) -> Result<bool, CollisionError> {
        if let VolumeShape::Frame(members) = &self.shape {
            let base = self.base_in(shapes, parent)?;
            for member in members {
                if member.detect_in(other, shapes, base, other_parent)? {
                    return Ok(true);
                }
            }
            return Ok(false);
        }
        if let VolumeShape::Frame(members) = &other.shape {
            let base = other.base_in(shapes, other_parent)?;
            for member in members {
                if self.detect_in(member, shapes, parent, base)? {
                    return Ok(true);
                }
            }
            return Ok(false);
        }

        let a = self.resolve_in(shapes, parent)?;
        let b = other.resolve_in(shapes, other_parent)?;
        match intersects(&a, &b) {
            Some(hit) => Ok(hit),
            None if self.suppress_unsupported || other.suppress_unsupported => Ok(false),
            None => Err(CollisionError::Unsupported {
                a: self.kind(),
                b: other.kind(),
            }),
        }
    }
}

fn lookup(shapes: &ShapeArena, key: ShapeKey) -> Result<&crate::geometry::Shape, CollisionError> {
    shapes.get(key).ok_or(CollisionError::MissingShape(key))
}

/// World-space `(min, max)` over the tracked vertices
fn tracked_extent(
    shapes: &ShapeArena,
    key: ShapeKey,
    points: &[VertexRef],
) -> Result<(Vec3, Vec3), CollisionError> {
    let shape = lookup(shapes, key)?;
    let translation = shape.translation();
    let mut extent: Option<(Vec3, Vec3)> = None;
    for point in points {
        let p = translation + shape.try_vertex(*point)?.position;
        extent = Some(match extent {
            Some((min, max)) => (min.inf(&p), max.sup(&p)),
            None => (p, p),
        });
    }
    extent.ok_or_else(|| GeometryError::Validation("tracking box has no points".to_string()).into())
}

/// Dispatch to the pairwise test; `None` when the pair has no test
pub fn intersects(a: &ResolvedVolume, b: &ResolvedVolume) -> Option<bool> {
    use ResolvedVolume::{Box, Point, Sphere};
    match (*a, *b) {
        (Box { near, far }, Box { near: other_near, far: other_far }) => {
            Some(box_box_collision(near, far, other_near, other_far))
        }
        (Box { near, far }, Sphere { center, radius }) | (Sphere { center, radius }, Box { near, far }) => {
            Some(box_sphere_collision(near, far, center, radius))
        }
        (Sphere { center, radius }, Sphere { center: other_center, radius: other_radius }) => {
            Some(sphere_sphere_collision(center, radius, other_center, other_radius))
        }
        (Point(point), Box { near, far }) | (Box { near, far }, Point(point)) => {
            Some(point_box_collision(point, near, far))
        }
        (Point(point), Sphere { center, radius }) | (Sphere { center, radius }, Point(point)) => {
            Some(point_sphere_collision(point, center, radius))
        }
        (Point(_), Point(_)) => None,
    }
}

/// Overlap on every axis, touching included
pub fn box_box_collision(near: Vec3, far: Vec3, other_near: Vec3, other_far: Vec3) -> bool {
    (0..3).all(|axis| near[axis] <= other_far[axis] && far[axis] >= other_near[axis])
}

/// Closest point of the box to the center, strictly inside the sphere
pub fn box_sphere_collision(near: Vec3, far: Vec3, center: Vec3, radius: f32) -> bool {
    let closest = center.sup(&near).inf(&far);
    (closest - center).norm_squared() < radius * radius
}

/// Centers strictly closer than the sum of the radii
pub fn sphere_sphere_collision(center: Vec3, radius: f32, other_center: Vec3, other_radius: f32) -> bool {
    let reach = radius + other_radius;
    (center - other_center).norm_squared() < reach * reach
}

/// Point inside the box, faces included
pub fn point_box_collision(point: Vec3, near: Vec3, far: Vec3) -> bool {
    (0..3).all(|axis| near[axis] <= point[axis] && point[axis] <= far[axis])
}

/// Point strictly inside the sphere
pub fn point_sphere_collision(point: Vec3, center: Vec3, radius: f32) -> bool {
    (point - center).norm_squared() < radius * radius
}
