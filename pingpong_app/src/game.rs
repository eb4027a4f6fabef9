//! The match: serving, bouncing, scoring and the paddles' autopilot

use std::cell::Cell;
use std::rc::Rc;

use pingpong_engine::prelude::*;
use rand::Rng;

use crate::court::{paddle_home, Court, Side, BALL_RADIUS, PADDLE_HEIGHT, PADDLE_WIDTH, TABLE_HEIGHT, TABLE_LENGTH, TABLE_WIDTH};

/// Fraction of vertical speed kept by a bounce off the table
const RESTITUTION: f32 = 0.9;
/// Fraction of forward speed kept when the ball clips the net
const NET_DAMPING: f32 = 0.3;
/// Upward speed a paddle gives the ball, per frame
const RETURN_LIFT: f32 = 0.025;
/// Forward speed of a serve, per frame
const SERVE_SPEED: f32 = 0.03;
/// Sideways drift of a serve is drawn from `-SERVE_DRIFT..SERVE_DRIFT`
const SERVE_DRIFT: f32 = 0.004;
/// How far a paddle on autopilot moves per frame
const PADDLE_SPEED: f32 = 0.015;
/// How far one key press moves the player's paddle
const KEY_STEP: f32 = 0.04;

const FLAT_VERTEX: &str = "flat_vertex";
const FLAT_FRAGMENT: &str = "flat_fragment";

const SCOREBOARD_SIZE: u32 = 4;

/// A best-of-nothing match that runs until the engine stops it
#[derive(Default)]
pub struct PingPongMatch {
    court: Option<Court>,
    gravity: Option<AnimatorKey>,
    flight: Option<AnimatorKey>,
    scoreboard: Option<TextureHandle>,
    server: Option<Side>,
    player_score: u32,
    opponent_score: u32,
    paddle_hits: Rc<Cell<u32>>,
    /// Let the player's paddle follow the ball on its own
    pub autopilot: bool,
}

impl PingPongMatch {
    pub fn new(autopilot: bool) -> Self {
        Self {
            autopilot,
            ..Self::default()
        }
    }

    /// `(player, opponent)`
    pub fn score(&self) -> (u32, u32) {
        (self.player_score, self.opponent_score)
    }

    /// Paddle returns over the whole match
    pub fn paddle_hits(&self) -> u32 {
        self.paddle_hits.get()
    }

    fn court(&self) -> Result<Court, AppError> {
        self.court
            .ok_or_else(|| AppError::GameLogic("the court was never built".to_string()))
    }

    /// Put the ball in the server's hand and send it across
    fn serve(&mut self, scene: &mut Scene) -> Result<(), AppError> {
        let court = self.court()?;
        let server = match self.server {
            Some(Side::Player) => Side::Opponent,
            _ => Side::Player,
        };
        self.server = Some(server);

        let start = Vec3::new(0.0, TABLE_HEIGHT + 0.3, server.z_sign() * (TABLE_LENGTH / 2.0 - 0.1));
        scene
            .shape_mut(court.ball)
            .ok_or_else(|| AppError::GameLogic("the ball left the scene".to_string()))?
            .set_translation(start);

        let drift = rand::thread_rng().gen_range(-SERVE_DRIFT..SERVE_DRIFT);
        if let Some(gravity) = self.gravity.and_then(|key| scene.animator_mut(key)) {
            gravity.set_momentum(Vec3::zeros());
        }
        if let Some(flight) = self.flight.and_then(|key| scene.animator_mut(key)) {
            flight.set_momentum(Vec3::new(drift, 0.0, -server.z_sign() * SERVE_SPEED));
        }
        log::debug!("{server:?} serves with drift {drift:.4}");
        Ok(())
    }

    /// The side that lost the rally, once the ball is out of play
    fn rally_loser(ball: Vec3) -> Option<Side> {
        let off_table = ball.y < TABLE_HEIGHT - 0.3
            || ball.z.abs() > TABLE_LENGTH
            || ball.x.abs() > TABLE_WIDTH;
        if !off_table {
            return None;
        }
        Some(if ball.z >= 0.0 { Side::Player } else { Side::Opponent })
    }

    /// Give the ball its volume and the handler that bounces it
    fn register_ball(
        &self,
        engine: &mut Engine<impl GraphicsBackend>,
        court: Court,
        gravity: AnimatorKey,
        flight: AnimatorKey,
    ) -> VolumeKey {
        let hits = Rc::clone(&self.paddle_hits);
        let bounce = move |event: CollisionEvent, scene: &mut Scene| {
            if event.other == court.table_volume {
                if let Some(animator) = scene.animator_mut(gravity) {
                    let v = animator.momentum();
                    animator.set_momentum(Vec3::new(v.x, v.y.abs() * RESTITUTION, v.z));
                }
                return;
            }

            let Some(animator) = scene.animator_mut(flight) else {
                return;
            };
            let v = animator.momentum();
            let returned = if event.other == court.net_volume {
                log::debug!("Ball clipped the net");
                Vec3::new(v.x, v.y, -v.z * NET_DAMPING)
            } else if event.other == court.player_volume {
                Vec3::new(v.x, v.y, -v.z.abs())
            } else if event.other == court.opponent_volume {
                Vec3::new(v.x, v.y, v.z.abs())
            } else {
                return;
            };
            animator.set_momentum(returned);

            if event.other != court.net_volume {
                hits.set(hits.get() + 1);
                if let Some(animator) = scene.animator_mut(gravity) {
                    let v = animator.momentum();
                    animator.set_momentum(Vec3::new(v.x, v.y.max(RETURN_LIFT), v.z));
                }
            }
        };
        engine.add_volume(
            BoundingVolume::sphere(BALL_RADIUS).attached_to(court.ball),
            Some(Box::new(bounce)),
        )
    }
}

impl<B: GraphicsBackend> Application<B> for PingPongMatch {
    fn initialize(&mut self, engine: &mut Engine<B>) -> Result<(), AppError> {
        log::info!("Setting up the table...");
        let court = Court::build(engine);
        self.court = Some(court);

        let gravity = engine.config().physics.gravity;
        let gravity = engine.scene.add_animator(PhysicsAnimator::gravity(gravity).targeting(court.ball));
        let flight = engine.scene.add_animator(PhysicsAnimator::new().targeting(court.ball));
        self.gravity = Some(gravity);
        self.flight = Some(flight);
        self.register_ball(engine, court, gravity, flight);

        let camera = engine.scene.camera_mut();
        camera.set_position(Vec3::new(0.0, 1.8, TABLE_LENGTH + 0.5));
        camera.look_at(Vec3::new(0.0, TABLE_HEIGHT, 0.0))?;

        let group = engine.create_render_group("court", FLAT_VERTEX, FLAT_FRAGMENT)?;
        for shape in court.shapes() {
            engine.add_model(group, shape)?;
        }

        let pixels = vec![255_u8; (SCOREBOARD_SIZE * SCOREBOARD_SIZE * 4) as usize];
        let scoreboard = engine
            .backend_mut()
            .load_texture(SCOREBOARD_SIZE, SCOREBOARD_SIZE, &pixels)?;
        self.scoreboard = Some(scoreboard);
        if let Some(group) = engine.render_group_mut(group) {
            group.add_sprite(Sprite::new(scoreboard, Vec2::new(16.0, 16.0), Vec2::new(96.0, 24.0)));
        }

        let paddle = court.player;
        engine.on_event(
            EventType::KeyDown,
            Box::new(move |event: &InputEvent, scene: &mut Scene| {
                let step = match event.key() {
                    Some(KeyCode::Escape) => return EventFlow::Exit,
                    Some(KeyCode::Left | KeyCode::A) => Vec3::new(-KEY_STEP, 0.0, 0.0),
                    Some(KeyCode::Right | KeyCode::D) => Vec3::new(KEY_STEP, 0.0, 0.0),
                    Some(KeyCode::Up | KeyCode::W) => Vec3::new(0.0, KEY_STEP, 0.0),
                    Some(KeyCode::Down | KeyCode::S) => Vec3::new(0.0, -KEY_STEP, 0.0),
                    _ => return EventFlow::Continue,
                };
                if let Some(shape) = scene.shape_mut(paddle) {
                    shape.translate_by(step);
                }
                EventFlow::Continue
            }),
        );
        engine.on_event(
            EventType::MouseWheel,
            Box::new(|event: &InputEvent, scene: &mut Scene| {
                if let EventPayload::Wheel(delta) = event.payload {
                    if let Err(e) = scene.camera_mut().relative_zoom(1.1_f32.powf(delta)) {
                        log::warn!("Ignoring zoom: {e}");
                    }
                }
                EventFlow::Continue
            }),
        );

        self.serve(&mut engine.scene)
    }

    fn update(&mut self, engine: &mut Engine<B>, _delta_time: f32) -> Result<(), AppError> {
        let court = self.court()?;
        let ball = engine
            .scene
            .shape(court.ball)
            .map(Shape::translation)
            .ok_or_else(|| AppError::GameLogic("the ball left the scene".to_string()))?;

        if let Some(loser) = Self::rally_loser(ball) {
            match loser {
                Side::Player => self.opponent_score += 1,
                Side::Opponent => self.player_score += 1,
            }
            log::info!(
                "Point to {:?}: {} - {}",
                if loser == Side::Player { Side::Opponent } else { Side::Player },
                self.player_score,
                self.opponent_score
            );
            for side in [Side::Player, Side::Opponent] {
                if let Some(paddle) = engine.scene.shape_mut(court.paddle(side)) {
                    paddle.set_translation(paddle_home(side));
                }
            }
            return self.serve(&mut engine.scene);
        }

        let mut sides = vec![Side::Opponent];
        if self.autopilot {
            sides.push(Side::Player);
        }
        for side in sides {
            if let Some(paddle) = engine.scene.shape_mut(court.paddle(side)) {
                follow(paddle, ball);
            }
        }
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine<B>) {
        if let Some(scoreboard) = self.scoreboard.take() {
            engine.backend_mut().release_texture(scoreboard);
        }
        log::info!(
            "Final score {} - {} after {} returns",
            self.player_score,
            self.opponent_score,
            self.paddle_hits()
        );
    }
}

/// Slide a paddle's blade center towards the ball, at most `PADDLE_SPEED`
/// per axis
fn follow(paddle: &mut Shape, ball: Vec3) {
    let at = paddle.translation();
    let center = Vec3::new(at.x + PADDLE_WIDTH / 2.0, at.y + PADDLE_HEIGHT / 2.0, at.z);
    let dx = (ball.x - center.x).clamp(-PADDLE_SPEED, PADDLE_SPEED);
    let dy = (ball.y - center.y).clamp(-PADDLE_SPEED, PADDLE_SPEED);
    let y = (at.y + dy).max(TABLE_HEIGHT - PADDLE_HEIGHT / 2.0) - at.y;
    paddle.translate_by(Vec3::new(dx, y, 0.0));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rally_loser() {
        assert_eq!(PingPongMatch::rally_loser(Vec3::new(0.0, TABLE_HEIGHT + 0.1, 0.5)), None);
        assert_eq!(PingPongMatch::rally_loser(Vec3::new(0.0, 0.0, 1.0)), Some(Side::Player));
        assert_eq!(PingPongMatch::rally_loser(Vec3::new(0.0, 1.0, -3.0)), Some(Side::Opponent));
    }

    #[test]
    fn test_follow_is_rate_limited() {
        let mut paddle = Shape::cube(0.1, Vec3::zeros(), None).with_translation(paddle_home(Side::Player));
        let before = paddle.translation();
        follow(&mut paddle, Vec3::new(5.0, TABLE_HEIGHT + PADDLE_HEIGHT / 2.0, before.z));
        let moved = paddle.translation() - before;
        assert!((moved.x - PADDLE_SPEED).abs() < 1e-6);
        assert!(moved.y.abs() < 1e-6);
    }
}
