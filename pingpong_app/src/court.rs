//! Table, net, paddles and ball
//!
//! Dimensions are regulation table tennis in meters: the table is 1.525 wide
//! (x), 2.74 long (z) and its playing surface sits 0.76 above the floor.
//! The player stands at +z, the opponent at -z.

use pingpong_engine::prelude::*;

pub const TABLE_WIDTH: f32 = 1.525;
pub const TABLE_LENGTH: f32 = 2.74;
pub const TABLE_HEIGHT: f32 = 0.76;
const TABLE_THICKNESS: f32 = 0.05;

pub const NET_HEIGHT: f32 = 0.1525;
const NET_OVERHANG: f32 = 0.15;
const NET_THICKNESS: f32 = 0.01;

pub const PADDLE_WIDTH: f32 = 0.16;
pub const PADDLE_HEIGHT: f32 = 0.3;
const PADDLE_THICKNESS: f32 = 0.02;
const HANDLE_WIDTH: f32 = 0.03;
const HANDLE_HEIGHT: f32 = 0.1;

pub const BALL_RADIUS: f32 = 0.02;

const TABLE_GREEN: [f32; 3] = [0.05, 0.35, 0.2];
const NET_WHITE: [f32; 3] = [0.96, 0.96, 0.96];
const PADDLE_RED: [f32; 3] = [0.75, 0.1, 0.1];
const PADDLE_BLACK: [f32; 3] = [0.1, 0.1, 0.1];
const BALL_ORANGE: [f32; 3] = [1.0, 0.55, 0.1];

fn color(rgb: [f32; 3]) -> Option<Vec3> {
    Some(Vec3::from(rgb))
}

/// Which end of the table a paddle defends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    /// Sign of z on this side of the net
    pub fn z_sign(self) -> f32 {
        match self {
            Self::Player => 1.0,
            Self::Opponent => -1.0,
        }
    }
}

/// Keys of everything on the court
#[derive(Debug, Clone, Copy)]
pub struct Court {
    pub table: ShapeKey,
    pub net: ShapeKey,
    pub player: ShapeKey,
    pub opponent: ShapeKey,
    pub ball: ShapeKey,
    pub table_volume: VolumeKey,
    pub net_volume: VolumeKey,
    pub player_volume: VolumeKey,
    pub opponent_volume: VolumeKey,
}

impl Court {
    /// Add the shapes to the scene and register the static volumes
    ///
    /// The ball's volume is registered separately, once the handler that
    /// bounces it knows the keys returned here.
    pub fn build<B: GraphicsBackend>(engine: &mut Engine<B>) -> Self {
        let table_origin = Vec3::new(-TABLE_WIDTH / 2.0, TABLE_HEIGHT - TABLE_THICKNESS, -TABLE_LENGTH / 2.0);
        let table = engine.scene.add_shape(Shape::cuboid(
            TABLE_WIDTH,
            TABLE_THICKNESS,
            TABLE_LENGTH,
            table_origin,
            color(TABLE_GREEN),
        ));
        let table_volume = engine.add_volume(
            BoundingVolume::cuboid(TABLE_WIDTH, TABLE_THICKNESS, TABLE_LENGTH).at(table_origin),
            None,
        );

        let net_width = TABLE_WIDTH + 2.0 * NET_OVERHANG;
        let net_origin = Vec3::new(-net_width / 2.0, TABLE_HEIGHT, -NET_THICKNESS / 2.0);
        let net = engine.scene.add_shape(Shape::cuboid(
            net_width,
            NET_HEIGHT,
            NET_THICKNESS,
            net_origin,
            color(NET_WHITE),
        ));
        let net_volume = engine.add_volume(
            BoundingVolume::cuboid(net_width, NET_HEIGHT, NET_THICKNESS).at(net_origin),
            None,
        );

        let (player, player_volume) = add_paddle(engine, Side::Player, PADDLE_RED);
        let (opponent, opponent_volume) = add_paddle(engine, Side::Opponent, PADDLE_BLACK);

        // Geometry centered on the shape's translation, like the ball's sphere.
        let ball = engine.scene.add_shape(Shape::cube(
            2.0 * BALL_RADIUS,
            Vec3::repeat(-BALL_RADIUS),
            color(BALL_ORANGE),
        ));

        Self {
            table,
            net,
            player,
            opponent,
            ball,
            table_volume,
            net_volume,
            player_volume,
            opponent_volume,
        }
    }

    /// Every shape, in draw order
    pub fn shapes(&self) -> [ShapeKey; 5] {
        [self.table, self.net, self.player, self.opponent, self.ball]
    }

    /// Paddle shape of a side
    pub fn paddle(&self, side: Side) -> ShapeKey {
        match side {
            Side::Player => self.player,
            Side::Opponent => self.opponent,
        }
    }
}

/// Where a paddle waits at the start of a rally
pub fn paddle_home(side: Side) -> Vec3 {
    Vec3::new(
        -PADDLE_WIDTH / 2.0,
        TABLE_HEIGHT,
        side.z_sign() * (TABLE_LENGTH / 2.0 + 0.1),
    )
}

/// Blade and handle, both anchored at the paddle's translation
fn add_paddle<B: GraphicsBackend>(engine: &mut Engine<B>, side: Side, rgb: [f32; 3]) -> (ShapeKey, VolumeKey) {
    let blade = Shape::cuboid(PADDLE_WIDTH, PADDLE_HEIGHT, PADDLE_THICKNESS, Vec3::zeros(), color(rgb))
        .with_translation(paddle_home(side));
    let key = engine.scene.add_shape(blade);

    let handle_offset = Vec3::new((PADDLE_WIDTH - HANDLE_WIDTH) / 2.0, -HANDLE_HEIGHT, 0.0);
    let volume = BoundingVolume::frame(vec![
        BoundingVolume::cuboid(PADDLE_WIDTH, PADDLE_HEIGHT, PADDLE_THICKNESS),
        BoundingVolume::cuboid(HANDLE_WIDTH, HANDLE_HEIGHT, PADDLE_THICKNESS).at(handle_offset),
    ])
    .attached_to(key);
    (key, engine.add_volume(volume, None))
}
