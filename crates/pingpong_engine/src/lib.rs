//! # Ping Pong Engine
//!
//! A small frame-stepped 3D engine core: shapes with lazily recomputed
//! transforms, a camera, axis-aligned collision volumes with per-volume
//! handlers, a force-stack animator and render groups drawn through a
//! backend trait.
//!
//! ## Features
//!
//! - **Lazy transforms**: model and view matrices are only rebuilt after a change
//! - **Collision**: box, sphere, point and frame volumes, attached to shapes or free
//! - **Animation**: momentum, spin and one-step forces applied each frame
//! - **Rendering**: one render group per shader program, any [`GraphicsBackend`](render::GraphicsBackend)
//! - **Headless**: a recording backend and scripted input for tests and demos
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pingpong_engine::prelude::*;
//!
//! struct MyApp;
//!
//! impl<B: GraphicsBackend> Application<B> for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine<B>) -> Result<(), AppError> {
//!         let ball = engine.scene.add_shape(Shape::cube(0.1, Vec3::zeros(), None));
//!         engine.scene.add_animator(PhysicsAnimator::gravity(0.01).targeting(ball));
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = ApplicationConfig::new("My Table");
//!     config.engine = config.engine.with_max_frames(120);
//!     let mut engine = Engine::new(config, HeadlessBackend::new())?;
//!     engine.run(&mut MyApp, &mut ScriptedEventSource::new())?;
//!     Ok(())
//! }
//! ```

pub mod animation;
pub mod config;
pub mod core;
pub mod events;
pub mod foundation;
pub mod geometry;
pub mod physics;
pub mod render;
pub mod scene;
pub mod transform;

mod application;
mod engine;

#[cfg(test)]
mod tests;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        animation::{AnimationError, PhysicsAnimator},
        core::config::{
            ApplicationConfig, Config, ConfigError, EngineConfig, PhysicsConfig, RendererConfig,
            WindowConfig,
        },
        events::{
            EventFlow, EventPayload, EventSource, EventType, InputEvent, KeyCode, MouseButton,
            ScriptedEventSource,
        },
        foundation::{
            collections::{AnimatorKey, ShapeKey, VolumeKey},
            math::{EulerAngles, Mat4, Vec2, Vec3, Vec4},
        },
        geometry::{CompileOptions, Face, PrimitiveMode, Shape, Vertex, VertexFormat},
        physics::{BoundingVolume, CollisionError, CollisionEvent, CollisionSystem},
        render::{
            backends::HeadlessBackend, GraphicsBackend, RenderError, RenderGroup, Sprite,
            TextureHandle,
        },
        scene::Scene,
        transform::{Camera, Transform},
        AppError, Application, Engine, EngineError,
    };
}
