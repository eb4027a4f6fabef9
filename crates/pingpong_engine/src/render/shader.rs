//! Shader sources and the shader cache
//!
//! Sources are scanned line by line for variable declarations so that the
//! engine knows which uniforms a program expects and, for vertex shaders,
//! where each input attribute lives:
//!
//! ```text
//! layout (location = 0) in vec3 position;
//! uniform mat4 model;
//! ```
//!
//! This is a light scan, not a GLSL parser. Lines it does not understand are
//! skipped.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::render::backend::{GraphicsBackend, ShaderHandle, ShaderStage};
use crate::render::RenderError;

/// Storage qualifier of a declared variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    /// `in`
    In,
    /// `out`
    Out,
    /// `inout`
    InOut,
    /// `uniform`
    Uniform,
    /// `attribute`, the legacy vertex input
    Attribute,
    /// `varying`, the legacy stage-to-stage value
    Varying,
}

impl StorageClass {
    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            "inout" => Some(Self::InOut),
            "uniform" => Some(Self::Uniform),
            "attribute" => Some(Self::Attribute),
            "varying" => Some(Self::Varying),
            _ => None,
        }
    }

    /// Whether the variable is fed per vertex
    ///
    /// A `varying` is written by the vertex stage, so it is never an input
    /// here.
    pub fn is_input(self) -> bool {
        matches!(self, Self::In | Self::InOut | Self::Attribute)
    }
}

/// One declared variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderVar {
    /// Storage qualifier
    pub class: StorageClass,
    /// GLSL type name, such as `vec3`
    pub ty: String,
    /// Variable name
    pub name: String,
    /// `layout(location = N)`, if declared
    pub location: Option<u32>,
}

impl ShaderVar {
    /// Number of floats a value of this type occupies
    pub fn component_count(&self) -> Result<usize, RenderError> {
        let ty = self.ty.as_str();
        match ty {
            "float" => Ok(1),
            "vec2" => Ok(2),
            "vec3" => Ok(3),
            "vec4" | "mat2" => Ok(4),
            "mat3" => Ok(9),
            "mat4" => Ok(16),
            _ => Err(RenderError::Shader(format!(
                "unsupported attribute type '{ty}' for '{}'",
                self.name
            ))),
        }
    }
}

const PRECISIONS: [&str; 3] = ["highp", "mediump", "lowp"];

/// Shader code plus the declarations found in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    name: String,
    stage: ShaderStage,
    code: String,
    declarations: Vec<ShaderVar>,
}

impl ShaderSource {
    /// Scan `code` for declarations
    pub fn parse(name: impl Into<String>, stage: ShaderStage, code: impl Into<String>) -> Self {
        let name = name.into();
        let code = code.into();
        let declarations = code
            .lines()
            .filter_map(|line| match parse_declaration(line) {
                Ok(declaration) => declaration,
                Err(reason) => {
                    log::warn!("Shader '{name}': skipping '{}': {reason}", line.trim());
                    None
                }
            })
            .collect();
        Self {
            name,
            stage,
            code,
            declarations,
        }
    }

    /// Cache key
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pipeline stage
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Source text
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Every declaration, in source order
    pub fn declarations(&self) -> &[ShaderVar] {
        &self.declarations
    }

    /// Declared uniforms
    pub fn uniforms(&self) -> impl Iterator<Item = &ShaderVar> {
        self.declarations
            .iter()
            .filter(|var| var.class == StorageClass::Uniform)
    }

    /// Vertex inputs with an explicit location, ordered by location
    ///
    /// Always empty for fragment shaders.
    pub fn input_locations(&self) -> BTreeMap<u32, &ShaderVar> {
        if self.stage != ShaderStage::Vertex {
            return BTreeMap::new();
        }
        self.declarations
            .iter()
            .filter(|var| var.class.is_input())
            .filter_map(|var| var.location.map(|location| (location, var)))
            .collect()
    }
}

/// Parse one line; `Ok(None)` for lines that declare nothing
fn parse_declaration(line: &str) -> Result<Option<ShaderVar>, String> {
    let line = line.trim();
    let (location, rest) = if line.starts_with("layout") {
        let (layout, rest) = line
            .split_once(')')
            .ok_or_else(|| "layout qualifier is not closed".to_string())?;
        let location = match layout.split_once("location") {
            Some((_, tail)) => {
                let value = tail
                    .split_once('=')
                    .map(|(_, value)| value.trim())
                    .ok_or_else(|| "location has no value".to_string())?;
                Some(
                    value
                        .parse::<u32>()
                        .map_err(|e| format!("bad location '{value}': {e}"))?,
                )
            }
            None => None,
        };
        (location, rest)
    } else {
        (None, line)
    };

    let words: Vec<&str> = rest.split_whitespace().collect();
    let Some(class) = words.first().and_then(|word| StorageClass::from_keyword(word)) else {
        return Ok(None);
    };
    let skip = usize::from(words.get(1).is_some_and(|word| PRECISIONS.contains(word)));
    let (Some(ty), Some(name)) = (words.get(1 + skip), words.get(2 + skip)) else {
        return Err("declaration is missing a type or a name".to_string());
    };
    Ok(Some(ShaderVar {
        class,
        ty: (*ty).to_string(),
        name: name.trim_end_matches(';').to_string(),
        location,
    }))
}

/// A source compiled by a backend
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledShader {
    /// Parsed source
    pub source: ShaderSource,
    /// Backend object
    pub handle: ShaderHandle,
}

/// Compiled shaders by name, each compiled at most once
///
/// Owned by the engine; named shaders are read from
/// `<shader_dir>/<name>.shader` the first time they are asked for.
#[derive(Debug)]
pub struct ShaderCache {
    shader_dir: PathBuf,
    shaders: HashMap<String, CompiledShader>,
}

impl ShaderCache {
    /// Cache loading `<name>.shader` files from `shader_dir`
    pub fn new(shader_dir: impl Into<PathBuf>) -> Self {
        Self {
            shader_dir: shader_dir.into(),
            shaders: HashMap::new(),
        }
    }

    /// Directory shader files are read from
    pub fn shader_dir(&self) -> &Path {
        &self.shader_dir
    }

    /// Compile a named shader from disk, or return the cached one
    pub fn load(
        &mut self,
        name: &str,
        stage: ShaderStage,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<&CompiledShader, RenderError> {
        if !self.shaders.contains_key(name) {
            let path = self.shader_dir.join(format!("{name}.shader"));
            let code = std::fs::read_to_string(&path).map_err(|e| {
                RenderError::Shader(format!("'{name}' is not an available shader ({}): {e}", path.display()))
            })?;
            return self.insert_source(name, stage, code, backend);
        }
        self.cached(name, stage)
    }

    /// Compile raw code under `name`, or return the cached one
    pub fn insert_source(
        &mut self,
        name: &str,
        stage: ShaderStage,
        code: impl Into<String>,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<&CompiledShader, RenderError> {
        if !self.shaders.contains_key(name) {
            let source = ShaderSource::parse(name, stage, code);
            let handle = backend.compile_shader(stage, source.code())?;
            log::debug!(
                "Compiled {stage:?} shader '{name}' with {} declarations",
                source.declarations().len()
            );
            self.shaders
                .insert(name.to_string(), CompiledShader { source, handle });
        }
        self.cached(name, stage)
    }

    fn cached(&self, name: &str, stage: ShaderStage) -> Result<&CompiledShader, RenderError> {
        let shader = self
            .shaders
            .get(name)
            .ok_or_else(|| RenderError::Shader(format!("'{name}' is not an available shader")))?;
        if shader.source.stage() != stage {
            return Err(RenderError::Shader(format!(
                "'{name}' is a {:?} shader, not {stage:?}",
                shader.source.stage()
            )));
        }
        Ok(shader)
    }

    /// A shader compiled earlier
    pub fn get(&self, name: &str) -> Option<&CompiledShader> {
        self.shaders.get(name)
    }

    /// Number of cached shaders
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// Release every compiled shader
    pub fn release_all(&mut self, backend: &mut dyn GraphicsBackend) {
        for (_, shader) in self.shaders.drain() {
            backend.release_shader(shader.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::HeadlessBackend;

    const VERTEX: &str = "#version 330 core
layout (location = 0) in vec3 position;
layout(location=1) in highp vec3 color;
uniform mat4 model;
uniform mat4 view;
out vec3 frag_color;
void main() {
    frag_color = color;
}
";

    #[test]
    fn test_scans_declarations() {
        let source = ShaderSource::parse("flat", ShaderStage::Vertex, VERTEX);
        assert_eq!(source.declarations().len(), 5);

        let uniforms: Vec<_> = source.uniforms().map(|var| var.name.as_str()).collect();
        assert_eq!(uniforms, vec!["model", "view"]);

        let inputs = source.input_locations();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[&0].name, "position");
        assert_eq!(inputs[&1].ty, "vec3");
        assert_eq!(inputs[&1].name, "color");
    }

    #[test]
    fn test_fragment_has_no_input_locations() {
        let source = ShaderSource::parse("f", ShaderStage::Fragment, "layout (location = 0) in vec3 c;");
        assert!(source.input_locations().is_empty());
    }

    #[test]
    fn test_varying_is_not_a_vertex_input() {
        let code = "layout (location = 0) attribute vec3 position;\nlayout (location = 1) varying vec3 tint;";
        let source = ShaderSource::parse("legacy", ShaderStage::Vertex, code);
        assert_eq!(source.declarations().len(), 2);
        assert_eq!(source.declarations()[1].class, StorageClass::Varying);

        let inputs = source.input_locations();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[&0].name, "position");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let source = ShaderSource::parse("bad", ShaderStage::Vertex, "uniform mat4;\nlayout (location = x) in vec3 p;\nuniform float t;");
        assert_eq!(source.declarations().len(), 1);
        assert_eq!(source.declarations()[0].name, "t");
    }

    #[test]
    fn test_component_counts() {
        let var = |ty: &str| ShaderVar {
            class: StorageClass::In,
            ty: ty.to_string(),
            name: "v".to_string(),
            location: Some(0),
        };
        assert_eq!(var("vec3").component_count().unwrap(), 3);
        assert_eq!(var("mat4").component_count().unwrap(), 16);
        assert!(var("sampler2D").component_count().is_err());
    }

    #[test]
    fn test_cache_compiles_once() {
        let mut backend = HeadlessBackend::new();
        let mut cache = ShaderCache::new("does/not/exist");
        let first = cache
            .insert_source("flat", ShaderStage::Vertex, VERTEX, &mut backend)
            .unwrap()
            .handle;
        let second = cache
            .insert_source("flat", ShaderStage::Vertex, "ignored", &mut backend)
            .unwrap()
            .handle;
        assert_eq!(first, second);
        assert_eq!(backend.live_shaders(), 1);

        // Cached by name, so loading does not touch the missing directory.
        assert!(cache.load("flat", ShaderStage::Vertex, &mut backend).is_ok());
        assert!(cache.load("flat", ShaderStage::Fragment, &mut backend).is_err());
        assert!(matches!(
            cache.load("missing", ShaderStage::Vertex, &mut backend),
            Err(RenderError::Shader(_))
        ));

        cache.release_all(&mut backend);
        assert_eq!(backend.live_shaders(), 0);
        assert!(cache.is_empty());
    }
}
