//! Ping pong demo application
//!
//! Plays a headless match on the recording backend: the opponent's paddle
//! tracks the ball, the player's paddle is on autopilot, and a short input
//! script nudges it around. Pass a `.toml` or `.ron` config as the first
//! argument to override the defaults.

mod court;
mod game;

use pingpong_engine::foundation::logging;
use pingpong_engine::prelude::*;

use crate::game::PingPongMatch;

/// Frames the demo runs when no config is given
const DEMO_FRAMES: u64 = 600;

fn load_config() -> Result<ApplicationConfig, ConfigError> {
    if let Some(path) = std::env::args().nth(1) {
        return ApplicationConfig::load_from_file(&path);
    }

    let mut config = ApplicationConfig::new("Ping Pong");
    config.engine = config.engine.with_max_frames(DEMO_FRAMES).with_target_fps(None);
    config.renderer.shader_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/resources/shaders").to_string();
    config.physics.suppress_unsupported_collisions = true;
    Ok(config)
}

/// A few key presses spread over the first second, then nothing
fn input_script() -> ScriptedEventSource {
    ScriptedEventSource::new()
        .with_idle_frames(20)
        .with_frame(vec![InputEvent::key_down(KeyCode::Left)])
        .with_frame(vec![InputEvent::key_up(KeyCode::Left), InputEvent::mouse_wheel(1.0)])
        .with_idle_frames(20)
        .with_frame(vec![InputEvent::key_down(KeyCode::D), InputEvent::key_down(KeyCode::Up)])
        .with_frame(vec![InputEvent::mouse_wheel(-1.0)])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    logging::init(&config.engine.log_level);

    log::info!("Starting {}", config.window.title);
    let mut engine = Engine::new(config, HeadlessBackend::new())?;
    let mut game = PingPongMatch::new(true);
    let mut events = input_script();

    engine.run(&mut game, &mut events)?;

    let (player, opponent) = game.score();
    log::info!(
        "Match over: {player} - {opponent}, {} returns, {} frames presented, {} skipped",
        game.paddle_hits(),
        engine.backend().frames_presented(),
        engine.skipped_frames()
    );
    Ok(())
}
