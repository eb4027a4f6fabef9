//! # Core Engine Module
//!
//! Shared configuration used by every subsystem.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for the frame loop, window, renderer and physics

pub mod config;

pub use config::{
    ApplicationConfig, Config, ConfigError, EngineConfig, PhysicsConfig, RendererConfig,
    WindowConfig,
};
