//! Headless backend
//!
//! Keeps track of the objects a real API would own and records every call
//! in order, without drawing anything. Used by the demo when no window is
//! available and by tests that check what the engine asked the GPU to do.

use std::collections::{HashMap, HashSet};

use crate::foundation::math::Vec2;
use crate::geometry::PrimitiveMode;
use crate::render::backend::{
    AttributePointer, BackendResult, BufferHandle, GraphicsBackend, ProgramHandle, ShaderHandle,
    ShaderStage, TextureHandle, UniformValue,
};
use crate::render::RenderError;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    /// A shader was compiled
    CompileShader(ShaderStage, ShaderHandle),
    /// A shader was released
    ReleaseShader(ShaderHandle),
    /// A program was linked
    LinkProgram(ProgramHandle),
    /// A program was released
    ReleaseProgram(ProgramHandle),
    /// A program was bound, or unbound with `None`
    UseProgram(Option<ProgramHandle>),
    /// A uniform was set by name
    SetUniform(String, UniformValue),
    /// A buffer was created with this many floats
    CompileBuffer(BufferHandle, usize),
    /// A buffer was released
    ReleaseBuffer(BufferHandle),
    /// A buffer was bound
    BindBuffer(BufferHandle),
    /// The bound buffer was unbound
    UnbindBuffer,
    /// An attribute pointer was enabled on the bound buffer
    EnableAttribute(AttributePointer),
    /// Vertices were drawn
    Draw(PrimitiveMode, usize),
    /// A texture was uploaded
    LoadTexture(TextureHandle),
    /// A texture was released
    ReleaseTexture(TextureHandle),
    /// A sprite was drawn
    DrawSprite(TextureHandle),
    /// The frame was cleared
    Clear,
    /// The frame was presented
    Present,
}

/// Recording backend
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    calls: Vec<BackendCall>,
    shaders: HashSet<ShaderHandle>,
    programs: HashSet<ProgramHandle>,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    textures: HashSet<TextureHandle>,
    bound_buffer: Option<BufferHandle>,
    current_program: Option<ProgramHandle>,
    missing_uniforms: HashSet<String>,
    fail_draws: bool,
    frames_presented: u64,
}

impl HeadlessBackend {
    /// Backend with no objects and an empty call log
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: report `name` as absent from every program
    pub fn without_uniform(mut self, name: &str) -> Self {
        self.missing_uniforms.insert(name.to_string());
        self
    }

    /// Make every draw call fail until switched off again
    pub fn set_fail_draws(&mut self, fail: bool) {
        self.fail_draws = fail;
    }

    /// Every call so far, oldest first
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Forget the recorded calls
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of draw calls recorded
    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, BackendCall::Draw(..) | BackendCall::DrawSprite(_)))
            .count()
    }

    /// Buffers created and not yet released
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Programs linked and not yet released
    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Shaders compiled and not yet released
    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    /// Textures created and not yet released
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Uploaded bytes of a live buffer
    pub fn buffer_bytes(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    /// Uploaded data of a live buffer, read back as floats
    pub fn buffer_floats(&self, buffer: BufferHandle) -> Option<Vec<f32>> {
        self.buffer_bytes(buffer).map(|bytes| {
            bytes
                .chunks_exact(std::mem::size_of::<f32>())
                .map(bytemuck::pod_read_unaligned::<f32>)
                .collect()
        })
    }

    /// Successful presents so far
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn next_handle(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> BackendResult<ShaderHandle> {
        if source.trim().is_empty() {
            return Err(RenderError::Shader(format!("empty {stage:?} shader source")));
        }
        let handle = ShaderHandle(self.next_handle());
        self.shaders.insert(handle);
        self.calls.push(BackendCall::CompileShader(stage, handle));
        Ok(handle)
    }

    fn release_shader(&mut self, shader: ShaderHandle) {
        if !self.shaders.remove(&shader) {
            log::warn!("Shader {shader:?} released twice");
        }
        self.calls.push(BackendCall::ReleaseShader(shader));
    }

    fn link_program(&mut self, vertex: ShaderHandle, fragment: ShaderHandle) -> BackendResult<ProgramHandle> {
        for stage in [vertex, fragment] {
            if !self.shaders.contains(&stage) {
                return Err(RenderError::ResourceState(format!(
                    "cannot link with unknown shader {stage:?}"
                )));
            }
        }
        let handle = ProgramHandle(self.next_handle());
        self.programs.insert(handle);
        self.calls.push(BackendCall::LinkProgram(handle));
        Ok(handle)
    }

    fn release_program(&mut self, program: ProgramHandle) {
        if !self.programs.remove(&program) {
            log::warn!("Program {program:?} released twice");
        }
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        self.calls.push(BackendCall::ReleaseProgram(program));
    }

    fn uniform_exists(&self, program: ProgramHandle, name: &str) -> bool {
        self.programs.contains(&program) && !self.missing_uniforms.contains(name)
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) -> BackendResult<()> {
        if let Some(handle) = program {
            if !self.programs.contains(&handle) {
                return Err(RenderError::ResourceState(format!(
                    "program {handle:?} is not linked"
                )));
            }
        }
        self.current_program = program;
        self.calls.push(BackendCall::UseProgram(program));
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> BackendResult<()> {
        let program = self
            .current_program
            .ok_or_else(|| RenderError::ResourceState(format!("set uniform '{name}' with no program in use")))?;
        if !self.uniform_exists(program, name) {
            return Err(RenderError::Shader(format!(
                "program {program:?} has no uniform '{name}'"
            )));
        }
        self.calls.push(BackendCall::SetUniform(name.to_string(), value));
        Ok(())
    }

    fn compile_buffer(&mut self, data: &[f32]) -> BackendResult<BufferHandle> {
        if data.is_empty() {
            return Err(RenderError::ResourceCreationFailed(
                "cannot create an empty vertex buffer".to_string(),
            ));
        }
        let handle = BufferHandle(self.next_handle());
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.buffers.insert(handle, bytes.to_vec());
        self.calls.push(BackendCall::CompileBuffer(handle, bytes.len()));
        Ok(handle)
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer).is_none() {
            log::warn!("Buffer {buffer:?} released twice");
        }
        if self.bound_buffer == Some(buffer) {
            self.bound_buffer = None;
        }
        self.calls.push(BackendCall::ReleaseBuffer(buffer));
    }

    fn bind_buffer(&mut self, buffer: BufferHandle) -> BackendResult<()> {
        if !self.buffers.contains_key(&buffer) {
            return Err(RenderError::ResourceState(format!(
                "buffer {buffer:?} does not exist"
            )));
        }
        self.bound_buffer = Some(buffer);
        self.calls.push(BackendCall::BindBuffer(buffer));
        Ok(())
    }

    fn unbind_buffer(&mut self) {
        self.bound_buffer = None;
        self.calls.push(BackendCall::UnbindBuffer);
    }

    fn enable_attribute(&mut self, pointer: AttributePointer) -> BackendResult<()> {
        if self.bound_buffer.is_none() {
            return Err(RenderError::ResourceState(format!(
                "attribute {} enabled with no buffer bound",
                pointer.location
            )));
        }
        self.calls.push(BackendCall::EnableAttribute(pointer));
        Ok(())
    }

    fn draw(&mut self, mode: PrimitiveMode, vertex_count: usize) -> BackendResult<()> {
        if self.fail_draws {
            return Err(RenderError::RenderingFailed("draw call rejected".to_string()));
        }
        if self.current_program.is_none() {
            return Err(RenderError::ResourceState("draw with no program in use".to_string()));
        }
        if self.bound_buffer.is_none() {
            return Err(RenderError::ResourceState("draw with no buffer bound".to_string()));
        }
        self.calls.push(BackendCall::Draw(mode, vertex_count));
        Ok(())
    }

    fn load_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> BackendResult<TextureHandle> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(RenderError::ResourceCreationFailed(format!(
                "{width}x{height} texture needs {expected} bytes, got {}",
                rgba.len()
            )));
        }
        let handle = TextureHandle(self.next_handle());
        self.textures.insert(handle);
        self.calls.push(BackendCall::LoadTexture(handle));
        Ok(handle)
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if !self.textures.remove(&texture) {
            log::warn!("Texture {texture:?} released twice");
        }
        self.calls.push(BackendCall::ReleaseTexture(texture));
    }

    fn draw_sprite(&mut self, texture: TextureHandle, _position: Vec2, _size: Vec2) -> BackendResult<()> {
        if self.fail_draws {
            return Err(RenderError::RenderingFailed("sprite draw rejected".to_string()));
        }
        if !self.textures.contains(&texture) {
            return Err(RenderError::ResourceState(format!(
                "texture {texture:?} does not exist"
            )));
        }
        self.calls.push(BackendCall::DrawSprite(texture));
        Ok(())
    }

    fn clear(&mut self, _color: [f32; 4]) {
        self.calls.push(BackendCall::Clear);
    }

    fn present(&mut self) -> BackendResult<()> {
        self.frames_presented += 1;
        self.calls.push(BackendCall::Present);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_upload_round_trips_floats() {
        let mut backend = HeadlessBackend::new();
        let handle = backend.compile_buffer(&[1.0, 2.5, -3.0]).unwrap();
        assert_eq!(backend.buffer_bytes(handle).unwrap().len(), 12);
        assert_eq!(backend.buffer_floats(handle).unwrap(), vec![1.0, 2.5, -3.0]);

        backend.release_buffer(handle);
        assert_eq!(backend.live_buffers(), 0);
        assert!(backend.bind_buffer(handle).is_err());
    }

    #[test]
    fn test_draw_requires_state() {
        let mut backend = HeadlessBackend::new();
        assert!(matches!(
            backend.draw(PrimitiveMode::Triangles, 3),
            Err(RenderError::ResourceState(_))
        ));

        let vs = backend.compile_shader(ShaderStage::Vertex, "void main() {}").unwrap();
        let fs = backend.compile_shader(ShaderStage::Fragment, "void main() {}").unwrap();
        let program = backend.link_program(vs, fs).unwrap();
        backend.use_program(Some(program)).unwrap();
        let buffer = backend.compile_buffer(&[0.0; 9]).unwrap();
        backend.bind_buffer(buffer).unwrap();
        backend.draw(PrimitiveMode::Triangles, 3).unwrap();
        assert_eq!(backend.draw_count(), 1);

        backend.set_fail_draws(true);
        assert!(matches!(
            backend.draw(PrimitiveMode::Triangles, 3),
            Err(RenderError::RenderingFailed(_))
        ));
    }

    #[test]
    fn test_missing_uniform() {
        let mut backend = HeadlessBackend::new().without_uniform("light");
        let vs = backend.compile_shader(ShaderStage::Vertex, "v").unwrap();
        let fs = backend.compile_shader(ShaderStage::Fragment, "f").unwrap();
        let program = backend.link_program(vs, fs).unwrap();
        assert!(backend.uniform_exists(program, "model"));
        assert!(!backend.uniform_exists(program, "light"));
    }

    #[test]
    fn test_texture_size_checked() {
        let mut backend = HeadlessBackend::new();
        assert!(backend.load_texture(2, 2, &[0; 16]).is_ok());
        assert!(backend.load_texture(2, 2, &[0; 15]).is_err());
    }
}
