//! Application trait and lifecycle management

use crate::animation::AnimationError;
use crate::engine::{Engine, EngineError};
use crate::geometry::GeometryError;
use crate::physics::CollisionError;
use crate::render::{GraphicsBackend, RenderError};
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to build a game on the engine. The engine calls
/// [`initialize`](Self::initialize) once, [`update`](Self::update) once per
/// frame (after input dispatch, before animators and collisions), and
/// [`cleanup`](Self::cleanup) once when the loop ends, whether it ended
/// normally or with an error.
pub trait Application<B: GraphicsBackend> {
    /// Initialize the application
    ///
    /// Build the scene, register collision volumes, event callbacks and
    /// render groups here.
    fn initialize(&mut self, engine: &mut Engine<B>) -> Result<(), AppError>;

    /// Update the application
    ///
    /// # Arguments
    /// * `engine` - Mutable reference to the engine
    /// * `delta_time` - Time since last frame in seconds
    fn update(&mut self, engine: &mut Engine<B>, delta_time: f32) -> Result<(), AppError> {
        let _ = (engine, delta_time);
        Ok(())
    }

    /// Cleanup the application
    ///
    /// Called before the engine releases its GPU resources.
    fn cleanup(&mut self, engine: &mut Engine<B>) {
        let _ = engine;
    }
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),

    /// Game logic error
    #[error("Game logic error: {0}")]
    GameLogic(String),
}

impl From<GeometryError> for AppError {
    fn from(error: GeometryError) -> Self {
        Self::Engine(error.into())
    }
}

impl From<CollisionError> for AppError {
    fn from(error: CollisionError) -> Self {
        Self::Engine(error.into())
    }
}

impl From<AnimationError> for AppError {
    fn from(error: AnimationError) -> Self {
        Self::Engine(error.into())
    }
}

impl From<RenderError> for AppError {
    fn from(error: RenderError) -> Self {
        Self::Engine(error.into())
    }
}
