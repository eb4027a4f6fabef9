//! Geometric primitives
//!
//! Vertices, flat faces and the shapes built from them. A [`Shape`] owns its
//! faces (and through them its vertices) together with the transform that
//! places it in the world.

pub mod error;
pub mod face;
pub mod shape;
pub mod vertex;

pub use error::GeometryError;
pub use face::{Face, PrimitiveMode};
pub use shape::{CompileOptions, CompiledVertexData, Shape, VertexRef};
pub use vertex::{Vertex, VertexFormat};
