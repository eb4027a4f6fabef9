//! # Rendering System
//!
//! The engine's side of drawing: shapes are flattened into interleaved
//! vertex data, uploaded once per geometry revision, and drawn by
//! [`RenderGroup`]s, one per shader program. Everything API-specific sits
//! behind the [`GraphicsBackend`] trait.
//!
//! ## Frame flow
//!
//! ```text
//! backend.clear()
//!   for each group: use program, set view/projection,
//!     for each drawable: refresh if stale, set model, bind, draw, unbind
//! backend.present()
//! ```
//!
//! Drawing errors are returned to the frame loop, which logs them and skips
//! the rest of the frame.

pub mod backend;
pub mod backends;
pub mod drawable;
pub mod error;
pub mod pipeline;
pub mod shader;
pub mod vertex_array;

pub use backend::{
    AttributePointer, BackendResult, BufferHandle, GraphicsBackend, ProgramHandle, ShaderHandle,
    ShaderStage, TextureHandle, UniformValue,
};
pub use drawable::{Drawable, GpuMesh, Sprite};
pub use error::{RenderError, RenderResult};
pub use pipeline::RenderGroup;
pub use shader::{CompiledShader, ShaderCache, ShaderSource, ShaderVar, StorageClass};
pub use vertex_array::{VertexArray, VertexLayout};
