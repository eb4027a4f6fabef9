//! Vertex arrays: which buffers feed a draw and how their floats are laid out

use std::collections::BTreeMap;

use crate::geometry::VertexFormat;
use crate::render::backend::{AttributePointer, BufferHandle, GraphicsBackend};
use crate::render::shader::ShaderVar;
use crate::render::RenderError;

const FLOAT_SIZE: usize = std::mem::size_of::<f32>();

/// Attribute pointers for one interleaved vertex layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: Vec<AttributePointer>,
    stride_floats: usize,
}

impl VertexLayout {
    /// Layout of compiled vertex data; attribute locations count up from 0
    /// in interleaving order
    pub fn from_format(format: VertexFormat) -> Self {
        let stride_floats = format.stride();
        let attributes = format
            .attributes()
            .into_iter()
            .zip(0_u32..)
            .map(|((_, offset, components), location)| AttributePointer {
                location,
                components,
                stride: stride_floats * FLOAT_SIZE,
                offset: offset * FLOAT_SIZE,
            })
            .collect();
        Self {
            attributes,
            stride_floats,
        }
    }

    /// Layout declared by a vertex shader's located inputs, packed in
    /// location order
    pub fn from_shader_inputs(inputs: &BTreeMap<u32, &ShaderVar>) -> Result<Self, RenderError> {
        let mut sized = Vec::with_capacity(inputs.len());
        let mut stride_floats = 0;
        for (location, var) in inputs {
            let components = var.component_count()?;
            sized.push((*location, components, stride_floats));
            stride_floats += components;
        }
        let attributes = sized
            .into_iter()
            .map(|(location, components, offset)| AttributePointer {
                location,
                components,
                stride: stride_floats * FLOAT_SIZE,
                offset: offset * FLOAT_SIZE,
            })
            .collect();
        Ok(Self {
            attributes,
            stride_floats,
        })
    }

    /// Attribute pointers in location order
    pub fn attributes(&self) -> &[AttributePointer] {
        &self.attributes
    }

    /// Floats per vertex
    pub fn stride_floats(&self) -> usize {
        self.stride_floats
    }
}

/// Buffers plus the layout used to read them
///
/// Buffers can only be added while the array is bound.
#[derive(Debug, Clone)]
pub struct VertexArray {
    layout: VertexLayout,
    buffers: Vec<BufferHandle>,
    bound: bool,
}

impl VertexArray {
    /// Unbound vertex array with no buffers
    pub fn new(layout: VertexLayout) -> Self {
        Self {
            layout,
            buffers: Vec::new(),
            bound: false,
        }
    }

    /// Mark as bound
    pub fn bind(&mut self) {
        self.bound = true;
    }

    /// Mark as unbound
    pub fn unbind(&mut self) {
        self.bound = false;
    }

    /// Whether buffers may be added
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Attribute layout
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// Buffers added so far
    pub fn buffers(&self) -> &[BufferHandle] {
        &self.buffers
    }

    /// Attach a buffer and describe its attributes to the backend
    ///
    /// The buffer is unbound again afterwards, whether or not the attribute
    /// setup succeeded.
    pub fn add_buffer(
        &mut self,
        buffer: BufferHandle,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<(), RenderError> {
        if !self.bound {
            return Err(RenderError::ResourceState(
                "vertex array is not currently bound".to_string(),
            ));
        }
        backend.bind_buffer(buffer)?;
        let result = self
            .layout
            .attributes
            .iter()
            .try_for_each(|pointer| backend.enable_attribute(*pointer));
        backend.unbind_buffer();
        result?;
        self.buffers.push(buffer);
        Ok(())
    }

    /// Bind every buffer and attribute for a draw
    pub fn bind_for_draw(&self, backend: &mut dyn GraphicsBackend) -> Result<(), RenderError> {
        for buffer in &self.buffers {
            backend.bind_buffer(*buffer)?;
            for pointer in &self.layout.attributes {
                backend.enable_attribute(*pointer)?;
            }
        }
        Ok(())
    }

    /// Forget the buffers; the caller releases them
    pub fn take_buffers(&mut self) -> Vec<BufferHandle> {
        std::mem::take(&mut self.buffers)
    }
}
