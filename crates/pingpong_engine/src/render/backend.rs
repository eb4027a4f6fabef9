//! # Graphics Backend Abstraction
//!
//! The boundary between the engine's render model and a concrete graphics
//! API. Render groups, vertex arrays and the shader cache only talk to a
//! `dyn GraphicsBackend`; they never see API objects directly, only the
//! opaque handles defined here.
//!
//! ## Resource lifecycle
//!
//! Every handle a backend returns is owned by exactly one engine object and
//! must be released exactly once through the matching `release_*` call.
//! Releasing twice or using a released handle is an error the backend may
//! report as [`RenderError::ResourceState`].
//!
//! The crate ships [`HeadlessBackend`](crate::render::backends::HeadlessBackend),
//! which records every call instead of drawing.

use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};
use crate::geometry::PrimitiveMode;
use crate::render::RenderError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Compiled shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u64);

/// Linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

/// Vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Pipeline stage a shader belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Runs once per vertex
    Vertex,
    /// Runs once per fragment
    Fragment,
}

/// Value for a named program uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `mat4`
    Mat4(Mat4),
    /// `vec3`
    Vec3(Vec3),
    /// `vec4`
    Vec4(Vec4),
    /// `float`
    Float(f32),
}

/// How one vertex attribute is laid out in the bound buffer
///
/// `stride` and `offset` are in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributePointer {
    /// Shader input location
    pub location: u32,
    /// Floats per vertex for this attribute
    pub components: usize,
    /// Bytes between consecutive vertices
    pub stride: usize,
    /// Bytes from the start of a vertex to this attribute
    pub offset: usize,
}

/// # Graphics Backend Trait
///
/// Everything the engine needs from a graphics API. Calls are made from the
/// frame loop's thread only.
pub trait GraphicsBackend {
    /// Compile one shader stage
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> BackendResult<ShaderHandle>;

    /// Release a compiled shader stage
    fn release_shader(&mut self, shader: ShaderHandle);

    /// Link a vertex and a fragment stage into a program
    fn link_program(&mut self, vertex: ShaderHandle, fragment: ShaderHandle) -> BackendResult<ProgramHandle>;

    /// Release a linked program
    fn release_program(&mut self, program: ProgramHandle);

    /// Whether a linked program has a uniform with this name
    fn uniform_exists(&self, program: ProgramHandle, name: &str) -> bool;

    /// Make a program current (`None` unbinds)
    fn use_program(&mut self, program: Option<ProgramHandle>) -> BackendResult<()>;

    /// Set a uniform on the current program
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> BackendResult<()>;

    /// Upload interleaved vertex data into a new buffer
    fn compile_buffer(&mut self, data: &[f32]) -> BackendResult<BufferHandle>;

    /// Release a buffer
    fn release_buffer(&mut self, buffer: BufferHandle);

    /// Bind a buffer for attribute setup and drawing
    fn bind_buffer(&mut self, buffer: BufferHandle) -> BackendResult<()>;

    /// Unbind whatever buffer is bound
    fn unbind_buffer(&mut self);

    /// Describe one attribute of the bound buffer
    fn enable_attribute(&mut self, pointer: AttributePointer) -> BackendResult<()>;

    /// Draw `vertex_count` vertices from the bound buffer
    fn draw(&mut self, mode: PrimitiveMode, vertex_count: usize) -> BackendResult<()>;

    /// Upload an RGBA8 image
    fn load_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> BackendResult<TextureHandle>;

    /// Release a texture
    fn release_texture(&mut self, texture: TextureHandle);

    /// Draw a textured screen-space rectangle
    fn draw_sprite(&mut self, texture: TextureHandle, position: Vec2, size: Vec2) -> BackendResult<()>;

    /// Clear the frame
    fn clear(&mut self, color: [f32; 4]);

    /// Present the finished frame
    fn present(&mut self) -> BackendResult<()>;
}
