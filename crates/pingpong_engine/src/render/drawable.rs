//! Things a render group can draw

use crate::foundation::collections::ShapeKey;
use crate::foundation::math::Vec2;
use crate::geometry::PrimitiveMode;
use crate::render::backend::{BufferHandle, GraphicsBackend, TextureHandle};
use crate::render::vertex_array::VertexArray;
use crate::render::RenderError;

/// A textured screen-space rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    /// Texture sampled over the whole rectangle
    pub texture: TextureHandle,
    /// Top-left corner in window pixels
    pub position: Vec2,
    /// Width and height in window pixels
    pub size: Vec2,
}

impl Sprite {
    /// Sprite covering `size` pixels from `position`
    pub fn new(texture: TextureHandle, position: Vec2, size: Vec2) -> Self {
        Self {
            texture,
            position,
            size,
        }
    }
}

/// A shape's geometry as uploaded to the backend
#[derive(Debug, Clone)]
pub struct GpuMesh {
    /// Scene shape the data was compiled from
    pub shape: ShapeKey,
    /// Attribute layout of the buffer
    pub vertex_array: VertexArray,
    /// Uploaded vertex data
    pub buffer: BufferHandle,
    /// Vertices per draw call
    pub vertex_count: usize,
    /// How the vertices are assembled
    pub mode: PrimitiveMode,
    /// Geometry revision of the shape when it was compiled
    pub revision: u64,
}

/// Entry of a render group
#[derive(Debug, Clone)]
pub enum Drawable {
    /// Compiled scene shape
    Mesh(GpuMesh),
    /// Screen-space texture
    Sprite(Sprite),
}

impl Drawable {
    /// Shape behind a mesh drawable
    pub fn shape(&self) -> Option<ShapeKey> {
        match self {
            Self::Mesh(mesh) => Some(mesh.shape),
            Self::Sprite(_) => None,
        }
    }

    /// Issue the draw call(s)
    ///
    /// Meshes expect the program to be in use and the `model` uniform set.
    pub fn draw(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), RenderError> {
        match self {
            Self::Mesh(mesh) => {
                mesh.vertex_array.bind();
                let result = mesh
                    .vertex_array
                    .bind_for_draw(backend)
                    .and_then(|()| backend.draw(mesh.mode, mesh.vertex_count));
                backend.unbind_buffer();
                mesh.vertex_array.unbind();
                result
            }
            Self::Sprite(sprite) => backend.draw_sprite(sprite.texture, sprite.position, sprite.size),
        }
    }
}
