//! Render groups
//!
//! A render group is one shader program plus everything drawn with it. Each
//! shape is compiled once; it is recompiled only when its geometry revision
//! moves on (normals generated, recentered, recolored). Transform changes
//! never trigger a recompile, they only change the `model` uniform.

use crate::foundation::collections::{ShapeArena, ShapeKey};
use crate::foundation::math::Mat4;
use crate::geometry::CompileOptions;
use crate::render::backend::{GraphicsBackend, ProgramHandle, UniformValue};
use crate::render::drawable::{Drawable, GpuMesh, Sprite};
use crate::render::shader::CompiledShader;
use crate::render::vertex_array::{VertexArray, VertexLayout};
use crate::render::RenderError;

/// A shader program and the drawables that use it
pub struct RenderGroup {
    name: String,
    program: ProgramHandle,
    shader_layout: Option<VertexLayout>,
    compile_options: CompileOptions,
    drawables: Vec<Drawable>,
    released: bool,
}

impl RenderGroup {
    /// Link a program from a vertex and a fragment shader
    ///
    /// Declared uniforms the linked program does not expose are reported as
    /// warnings; they usually mean the shader optimized them away.
    pub fn new(
        name: impl Into<String>,
        vertex: &CompiledShader,
        fragment: &CompiledShader,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<Self, RenderError> {
        let name = name.into();
        let program = backend.link_program(vertex.handle, fragment.handle)?;

        for uniform in vertex.source.uniforms().chain(fragment.source.uniforms()) {
            if !backend.uniform_exists(program, &uniform.name) {
                log::warn!(
                    "Render group '{name}': uniform '{}' is not used by the program",
                    uniform.name
                );
            }
        }

        let inputs = vertex.source.input_locations();
        let shader_layout = if inputs.is_empty() {
            None
        } else {
            match VertexLayout::from_shader_inputs(&inputs) {
                Ok(layout) => Some(layout),
                Err(e) => {
                    backend.release_program(program);
                    return Err(e);
                }
            }
        };

        log::debug!("Created render group '{name}'");
        Ok(Self {
            name,
            program,
            shader_layout,
            compile_options: CompileOptions::with_color(),
            drawables: Vec::new(),
            released: false,
        })
    }

    /// Builder pattern: how shapes are flattened for this group
    pub fn with_compile_options(mut self, options: CompileOptions) -> Self {
        self.compile_options = options;
        self
    }

    /// Name given at creation
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Linked program
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    /// Meshes and sprites in draw order
    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    /// Number of meshes in the group
    pub fn model_count(&self) -> usize {
        self.drawables.iter().filter(|d| d.shape().is_some()).count()
    }

    /// Whether `shape` is drawn by this group
    pub fn contains(&self, shape: ShapeKey) -> bool {
        self.drawables.iter().any(|d| d.shape() == Some(shape))
    }

    /// Compile a shape and add it to the group
    ///
    /// Adding a shape that is already present only recompiles it if its
    /// geometry changed since it was compiled.
    pub fn add_model(
        &mut self,
        shape: ShapeKey,
        shapes: &ShapeArena,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<(), RenderError> {
        let existing = self.drawables.iter().position(|d| d.shape() == Some(shape));
        match existing {
            Some(index) => self.refresh(index, shapes, backend),
            None => {
                let mesh = self.compile(shape, shapes, backend)?;
                self.drawables.push(Drawable::Mesh(mesh));
                Ok(())
            }
        }
    }

    /// Append a sprite; sprites draw in insertion order with the meshes
    pub fn add_sprite(&mut self, sprite: Sprite) {
        self.drawables.push(Drawable::Sprite(sprite));
    }

    /// Remove a shape and release its buffer
    pub fn remove_model(&mut self, shape: ShapeKey, backend: &mut dyn GraphicsBackend) -> bool {
        let Some(index) = self.drawables.iter().position(|d| d.shape() == Some(shape)) else {
            return false;
        };
        if let Drawable::Mesh(mut mesh) = self.drawables.remove(index) {
            release_mesh(&mut mesh, backend);
        }
        true
    }

    fn compile(
        &self,
        shape: ShapeKey,
        shapes: &ShapeArena,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<GpuMesh, RenderError> {
        let source = shapes.get(shape).ok_or(RenderError::MissingShape(shape))?;
        let compiled = source.compile_vertex_data(&self.compile_options)?;

        let layout = match &self.shader_layout {
            Some(layout) => {
                if layout.stride_floats() != compiled.format.stride() {
                    return Err(RenderError::LayoutMismatch {
                        expected: layout.stride_floats(),
                        found: compiled.format.stride(),
                    });
                }
                layout.clone()
            }
            None => VertexLayout::from_format(compiled.format),
        };

        let buffer = backend.compile_buffer(&compiled.data)?;
        let mut vertex_array = VertexArray::new(layout);
        vertex_array.bind();
        let added = vertex_array.add_buffer(buffer, backend);
        vertex_array.unbind();
        if let Err(e) = added {
            backend.release_buffer(buffer);
            return Err(e);
        }

        log::debug!(
            "Render group '{}': compiled {} vertices ({}) for {shape:?}",
            self.name,
            compiled.vertex_count,
            compiled.format
        );
        Ok(GpuMesh {
            shape,
            vertex_array,
            buffer,
            vertex_count: compiled.vertex_count,
            mode: compiled.mode,
            revision: source.geometry_revision(),
        })
    }

    /// Recompile drawable `index` if its shape's geometry moved on
    fn refresh(
        &mut self,
        index: usize,
        shapes: &ShapeArena,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<(), RenderError> {
        let Some(Drawable::Mesh(mesh)) = self.drawables.get(index) else {
            return Ok(());
        };
        let shape = mesh.shape;
        let revision = shapes
            .get(shape)
            .ok_or(RenderError::MissingShape(shape))?
            .geometry_revision();
        if revision == mesh.revision {
            return Ok(());
        }

        let fresh = self.compile(shape, shapes, backend)?;
        if let Some(Drawable::Mesh(old)) = self.drawables.get_mut(index) {
            let mut old = std::mem::replace(old, fresh);
            release_mesh(&mut old, backend);
        }
        Ok(())
    }

    /// Draw everything in the group
    ///
    /// The program stays in use only for the duration of the call. The first
    /// error stops the group; the program is still unbound.
    pub fn draw(
        &mut self,
        shapes: &mut ShapeArena,
        view: &Mat4,
        projection: &Mat4,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<(), RenderError> {
        if self.released {
            return Err(RenderError::ResourceState(format!(
                "render group '{}' was released",
                self.name
            )));
        }
        backend.use_program(Some(self.program))?;
        let result = self.draw_contents(shapes, view, projection, backend);
        backend.use_program(None)?;
        result
    }

    fn draw_contents(
        &mut self,
        shapes: &mut ShapeArena,
        view: &Mat4,
        projection: &Mat4,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<(), RenderError> {
        backend.set_uniform("view", UniformValue::Mat4(*view))?;
        backend.set_uniform("projection", UniformValue::Mat4(*projection))?;

        for index in 0..self.drawables.len() {
            self.refresh(index, shapes, backend)?;
            if let Some(shape) = self.drawables[index].shape() {
                let model = shapes
                    .get_mut(shape)
                    .ok_or(RenderError::MissingShape(shape))?
                    .model_matrix();
                backend.set_uniform("model", UniformValue::Mat4(model))?;
            }
            self.drawables[index].draw(backend)?;
        }
        Ok(())
    }

    /// Release every buffer and the program
    ///
    /// Safe to call more than once; only the first call releases anything.
    pub fn release(&mut self, backend: &mut dyn GraphicsBackend) {
        if self.released {
            return;
        }
        for drawable in &mut self.drawables {
            if let Drawable::Mesh(mesh) = drawable {
                release_mesh(mesh, backend);
            }
        }
        self.drawables.clear();
        backend.release_program(self.program);
        self.released = true;
        log::debug!("Released render group '{}'", self.name);
    }

    /// Whether [`release`](Self::release) has run
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for RenderGroup {
    fn drop(&mut self) {
        if !self.released {
            log::warn!(
                "Render group '{}' dropped without release; its GPU resources leak",
                self.name
            );
        }
    }
}

fn release_mesh(mesh: &mut GpuMesh, backend: &mut dyn GraphicsBackend) {
    for buffer in mesh.vertex_array.take_buffers() {
        backend.release_buffer(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec2, Vec3};
    use crate::geometry::Shape;
    use crate::render::backend::ShaderStage;
    use crate::render::backends::{BackendCall, HeadlessBackend};
    use crate::render::shader::ShaderCache;

    const VERTEX: &str = "layout (location = 0) in vec3 position;
layout (location = 1) in vec3 color;
uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;";
    const FRAGMENT: &str = "out vec4 frag;";

    fn group(backend: &mut HeadlessBackend) -> RenderGroup {
        let mut cache = ShaderCache::new("unused");
        let vs = cache
            .insert_source("flat_v", ShaderStage::Vertex, VERTEX, backend)
            .unwrap()
            .clone();
        let fs = cache
            .insert_source("flat_f", ShaderStage::Fragment, FRAGMENT, backend)
            .unwrap()
            .clone();
        RenderGroup::new("flat", &vs, &fs, backend).unwrap()
    }

    fn red() -> Vec3 {
        Vec3::new(1.0, 0.0, 0.0)
    }

    fn compile_count(backend: &HeadlessBackend) -> usize {
        backend
            .calls()
            .iter()
            .filter(|call| matches!(call, BackendCall::CompileBuffer(..)))
            .count()
    }

    #[test]
    fn test_shape_compiled_once() {
        let mut backend = HeadlessBackend::new();
        let mut shapes = ShapeArena::with_key();
        let cube = shapes.insert(Shape::cube(1.0, Vec3::zeros(), Some(red())));
        let mut group = group(&mut backend);

        group.add_model(cube, &shapes, &mut backend).unwrap();
        group.add_model(cube, &shapes, &mut backend).unwrap();
        shapes[cube].translate_by(Vec3::x());
        group
            .draw(&mut shapes, &Mat4::identity(), &Mat4::identity(), &mut backend)
            .unwrap();

        assert_eq!(group.model_count(), 1);
        assert_eq!(compile_count(&backend), 1);
        assert_eq!(backend.live_buffers(), 1);
        group.release(&mut backend);
    }

    #[test]
    fn test_geometry_change_recompiles() {
        let mut backend = HeadlessBackend::new();
        let mut shapes = ShapeArena::with_key();
        let cube = shapes.insert(Shape::cube(1.0, Vec3::zeros(), Some(red())));
        let mut group = group(&mut backend);
        group.add_model(cube, &shapes, &mut backend).unwrap();

        shapes[cube].center_and_normalize(1.0).unwrap();
        group
            .draw(&mut shapes, &Mat4::identity(), &Mat4::identity(), &mut backend)
            .unwrap();

        assert_eq!(compile_count(&backend), 2);
        assert_eq!(backend.live_buffers(), 1);
        group.release(&mut backend);
    }

    #[test]
    fn test_draw_order_and_uniforms() {
        let mut backend = HeadlessBackend::new();
        let mut shapes = ShapeArena::with_key();
        let cube = shapes.insert(Shape::cube(1.0, Vec3::zeros(), Some(red())));
        let texture = backend.load_texture(1, 1, &[255; 4]).unwrap();
        let mut group = group(&mut backend);
        group.add_model(cube, &shapes, &mut backend).unwrap();
        group.add_sprite(Sprite::new(texture, Vec2::zeros(), Vec2::new(1.0, 1.0)));

        backend.clear_calls();
        group
            .draw(&mut shapes, &Mat4::identity(), &Mat4::identity(), &mut backend)
            .unwrap();

        let calls = backend.calls();
        assert_eq!(calls.first(), Some(&BackendCall::UseProgram(Some(group.program()))));
        assert_eq!(calls.last(), Some(&BackendCall::UseProgram(None)));
        let names: Vec<_> = calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::SetUniform(name, _) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["view", "projection", "model"]);
        let draw = calls.iter().position(|c| matches!(c, BackendCall::Draw(..))).unwrap();
        let sprite = calls.iter().position(|c| matches!(c, BackendCall::DrawSprite(_))).unwrap();
        assert!(draw < sprite);
        assert!(calls.contains(&BackendCall::Draw(crate::geometry::PrimitiveMode::Triangles, 36)));
        group.release(&mut backend);
    }

    #[test]
    fn test_layout_mismatch() {
        let mut backend = HeadlessBackend::new();
        let mut shapes = ShapeArena::with_key();
        let mut cube = Shape::cube(1.0, Vec3::zeros(), Some(red()));
        cube.gen_normals().unwrap();
        let cube = shapes.insert(cube);
        let mut group = group(&mut backend);

        // Position + normal + color is 9 floats, the shader declares 6.
        assert_eq!(
            group.add_model(cube, &shapes, &mut backend),
            Err(RenderError::LayoutMismatch { expected: 6, found: 9 })
        );
        assert_eq!(backend.live_buffers(), 0);
        group.release(&mut backend);
    }

    #[test]
    fn test_release_frees_everything_once() {
        let mut backend = HeadlessBackend::new();
        let mut shapes = ShapeArena::with_key();
        let a = shapes.insert(Shape::cube(1.0, Vec3::zeros(), Some(red())));
        let b = shapes.insert(Shape::cube(2.0, Vec3::zeros(), Some(red())));
        let mut group = group(&mut backend);
        group.add_model(a, &shapes, &mut backend).unwrap();
        group.add_model(b, &shapes, &mut backend).unwrap();
        assert_eq!(backend.live_buffers(), 2);

        group.release(&mut backend);
        group.release(&mut backend);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.live_programs(), 0);
        let releases = backend
            .calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::ReleaseBuffer(_) | BackendCall::ReleaseProgram(_)))
            .count();
        assert_eq!(releases, 3);
        assert!(group
            .draw(&mut shapes, &Mat4::identity(), &Mat4::identity(), &mut backend)
            .is_err());
    }

    #[test]
    fn test_missing_shape() {
        let mut backend = HeadlessBackend::new();
        let mut shapes = ShapeArena::with_key();
        let cube = shapes.insert(Shape::cube(1.0, Vec3::zeros(), Some(red())));
        let mut group = group(&mut backend);
        group.add_model(cube, &shapes, &mut backend).unwrap();
        shapes.remove(cube);
        assert_eq!(
            group.draw(&mut shapes, &Mat4::identity(), &Mat4::identity(), &mut backend),
            Err(RenderError::MissingShape(cube))
        );
        assert!(group.remove_model(cube, &mut backend));
        group.release(&mut backend);
    }
}
