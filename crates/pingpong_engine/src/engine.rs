//! Core engine implementation
//!
//! The engine owns the scene, the collision registry, the shader cache, the
//! render groups and the graphics backend, and drives them one frame at a
//! time:
//!
//! 1. poll input and run event callbacks
//! 2. [`Application::update`]
//! 3. step every animator
//! 4. detect collisions and run their handlers
//! 5. draw every render group
//!
//! Errors from steps 2 to 4 stop the loop. A failed draw only costs the rest
//! of that frame's drawing; it is logged and counted as a skipped frame.

use crate::{
    animation::AnimationError,
    application::Application,
    core::config::{ApplicationConfig, ConfigError},
    events::{EventCallback, EventDispatcher, EventSource, EventType},
    foundation::{
        collections::{ShapeKey, VolumeKey},
        math::{utils::deg_to_rad, Mat4, Mat4Ext},
        time::{FrameLimiter, Timer},
    },
    geometry::GeometryError,
    physics::{BoundingVolume, CollisionError, CollisionHandler, CollisionSystem},
    render::{GraphicsBackend, RenderError, RenderGroup, ShaderCache, ShaderStage},
    scene::Scene,
};
use thiserror::Error;

/// Main engine struct
///
/// Generic over the graphics backend so callers keep typed access to it
/// (the headless backend's call log, for instance).
pub struct Engine<B: GraphicsBackend> {
    /// Shapes, animators and cameras
    pub scene: Scene,

    /// Collision volumes and their handlers
    pub collisions: CollisionSystem,

    /// Compiled shaders by name
    pub shaders: ShaderCache,

    render_groups: Vec<RenderGroup>,
    backend: B,
    events: EventDispatcher,

    /// Frame timing
    timer: Timer,
    limiter: FrameLimiter,

    projection: Mat4,
    config: ApplicationConfig,

    /// Whether the engine should continue running
    running: bool,
    skipped_frames: u64,
}

impl<B: GraphicsBackend> Engine<B> {
    /// Create a new engine instance
    pub fn new(config: ApplicationConfig, backend: B) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");
        config.validate()?;

        let renderer = &config.renderer;
        let projection = Mat4::perspective(
            deg_to_rad(renderer.fov_degrees),
            config.window.aspect_ratio(),
            renderer.near,
            renderer.far,
        );

        Ok(Self {
            scene: Scene::new(),
            collisions: CollisionSystem::new(),
            shaders: ShaderCache::new(&renderer.shader_dir),
            render_groups: Vec::new(),
            backend,
            events: EventDispatcher::new(),
            timer: Timer::new(),
            limiter: FrameLimiter::new(config.engine.target_fps),
            projection,
            config,
            running: false,
            skipped_frames: 0,
        })
    }

    /// Run the main loop until it is asked to stop
    ///
    /// The loop stops at a frame boundary after a quit event, a callback
    /// returning [`EventFlow::Exit`](crate::events::EventFlow::Exit), a call
    /// to [`quit`](Self::quit) or once `max_frames` frames have run.
    /// [`Application::cleanup`] runs and GPU resources are released on every
    /// exit path, including errors.
    pub fn run<A: Application<B>>(
        &mut self,
        app: &mut A,
        events: &mut dyn EventSource,
    ) -> Result<(), EngineError> {
        app.initialize(self)
            .map_err(|e| EngineError::Application(format!("App initialization: {e}")))?;

        log::info!("Starting main loop...");
        self.running = true;
        self.events.reset_exit();

        let mut result = Ok(());
        while self.running && !self.frame_cap_reached() {
            if let Err(e) = self.run_frame(app, events) {
                log::error!("Stopping after frame {}: {e}", self.frame_count());
                result = Err(e);
                break;
            }
        }

        app.cleanup(self);
        self.shutdown();
        log::info!(
            "Engine shutdown complete after {} frames ({} skipped)",
            self.frame_count(),
            self.skipped_frames
        );
        result
    }

    /// Run exactly one frame
    pub fn run_frame<A: Application<B>>(
        &mut self,
        app: &mut A,
        events: &mut dyn EventSource,
    ) -> Result<(), EngineError> {
        self.limiter.begin_frame();
        self.timer.update();
        let delta_time = self.timer.delta_time();

        let batch = events.poll_events();
        self.events.dispatch(&batch, &mut self.scene);
        if self.events.exit_requested() {
            self.running = false;
        }

        app.update(self, delta_time)
            .map_err(|e| EngineError::Application(format!("App update: {e}")))?;
        self.tick()?;
        self.render_frame();

        if self.frame_cap_reached() {
            log::info!("Reached the frame cap of {} frames", self.frame_count());
            self.running = false;
        }
        self.limiter.wait();
        Ok(())
    }

    /// Advance the simulation one step: animators, then collisions
    pub fn tick(&mut self) -> Result<(), EngineError> {
        self.scene.step_animators()?;
        let collisions = self.collisions.detect(&mut self.scene)?;
        if !collisions.is_empty() {
            log::trace!("{} collisions this frame", collisions.len());
        }
        Ok(())
    }

    /// Draw every render group and present
    ///
    /// Returns whether the frame was presented. On the first error the rest
    /// of the frame is skipped.
    pub fn render_frame(&mut self) -> bool {
        match self.draw_groups() {
            Ok(()) => true,
            Err(e) => {
                self.skipped_frames += 1;
                log::error!("Skipping frame {}: {e}", self.frame_count());
                false
            }
        }
    }

    fn draw_groups(&mut self) -> Result<(), RenderError> {
        let view = self.scene.camera_mut().view_matrix();
        self.backend.clear(self.config.renderer.clear_color);
        for group in &mut self.render_groups {
            group.draw(self.scene.shapes_mut(), &view, &self.projection, &mut self.backend)?;
        }
        self.backend.present()
    }

    /// Load two named shaders and link them into a new render group
    ///
    /// Returns the group's index.
    pub fn create_render_group(
        &mut self,
        name: &str,
        vertex_shader: &str,
        fragment_shader: &str,
    ) -> Result<usize, EngineError> {
        let vertex = self
            .shaders
            .load(vertex_shader, ShaderStage::Vertex, &mut self.backend)?
            .clone();
        let fragment = self
            .shaders
            .load(fragment_shader, ShaderStage::Fragment, &mut self.backend)?
            .clone();
        let group = RenderGroup::new(name, &vertex, &fragment, &mut self.backend)?;
        Ok(self.add_render_group(group))
    }

    /// Like [`create_render_group`](Self::create_render_group), for shaders
    /// given as source text (registered in the cache under `<name>.vert`
    /// and `<name>.frag`)
    pub fn create_render_group_from_source(
        &mut self,
        name: &str,
        vertex_code: &str,
        fragment_code: &str,
    ) -> Result<usize, EngineError> {
        let vertex = self
            .shaders
            .insert_source(&format!("{name}.vert"), ShaderStage::Vertex, vertex_code, &mut self.backend)?
            .clone();
        let fragment = self
            .shaders
            .insert_source(&format!("{name}.frag"), ShaderStage::Fragment, fragment_code, &mut self.backend)?
            .clone();
        let group = RenderGroup::new(name, &vertex, &fragment, &mut self.backend)?;
        Ok(self.add_render_group(group))
    }

    /// Take ownership of a render group built elsewhere; returns its index
    pub fn add_render_group(&mut self, group: RenderGroup) -> usize {
        self.render_groups.push(group);
        self.render_groups.len() - 1
    }

    /// Compile a scene shape into a render group
    pub fn add_model(&mut self, group: usize, shape: ShapeKey) -> Result<(), EngineError> {
        let group = self.render_groups.get_mut(group).ok_or_else(|| {
            RenderError::ResourceState(format!("render group {group} does not exist"))
        })?;
        group.add_model(shape, self.scene.shapes(), &mut self.backend)?;
        Ok(())
    }

    /// Render groups in draw order
    pub fn render_groups(&self) -> &[RenderGroup] {
        &self.render_groups
    }

    /// Mutable access to one render group
    pub fn render_group_mut(&mut self, index: usize) -> Option<&mut RenderGroup> {
        self.render_groups.get_mut(index)
    }

    /// Register a collision volume
    ///
    /// The configured `suppress_unsupported_collisions` default is applied
    /// before registration.
    pub fn add_volume(
        &mut self,
        mut volume: BoundingVolume,
        handler: Option<CollisionHandler>,
    ) -> VolumeKey {
        if self.config.physics.suppress_unsupported_collisions {
            volume.set_suppress_unsupported(true);
        }
        self.collisions.add_volume(volume, handler)
    }

    /// Register the callback for one event type
    pub fn on_event(&mut self, event_type: EventType, callback: EventCallback) {
        if self.events.on(event_type, callback).is_some() {
            log::debug!("Replaced the {event_type:?} callback");
        }
    }

    /// Request engine shutdown at the end of the current frame
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the loop is (still) running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames run so far
    pub fn frame_count(&self) -> u64 {
        self.timer.frame_count()
    }

    /// Frames whose drawing failed
    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    /// Get the current frame delta time
    pub fn delta_time(&self) -> f32 {
        self.timer.delta_time()
    }

    /// The configuration the engine was built with
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// Projection matrix used for every render group
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Replace the projection matrix
    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    /// Get the graphics backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get mutable access to the graphics backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Release every render group and compiled shader
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.running = false;
        for group in &mut self.render_groups {
            group.release(&mut self.backend);
        }
        self.render_groups.clear();
        self.shaders.release_all(&mut self.backend);
    }

    fn frame_cap_reached(&self) -> bool {
        self.config
            .engine
            .max_frames
            .is_some_and(|cap| self.frame_count() >= cap)
    }
}

impl<B: GraphicsBackend> Drop for Engine<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// The configuration was rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Geometry could not be built or compiled
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Collision detection failed
    #[error("Collision error: {0}")]
    Collision(#[from] CollisionError),

    /// An animator could not step
    #[error("Animation error: {0}")]
    Animation(#[from] AnimationError),

    /// Rendering setup failed
    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    /// Application error
    #[error("Application error: {0}")]
    Application(String),
}
