//! Bullet Hell - survive a growing field of projectiles
//!
//! Core modules:
//! - `sim`: Session state machine and spawn pattern generator
//! - `engine`: Bullet engine contract and the SoA bullet field
//! - `renderer`: SoA render bridge and WebGPU circle pipeline
//! - `platform`: Device detection and unified pointer/touch input
//! - `leaderboard`: Ranked score submission and leaderboard fetch
//! - `settings`: Persisted run configuration

pub mod engine;
pub mod leaderboard;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use engine::{BulletEngine, BulletField, ParticleView};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Maximum bullets the engine can hold at once
    pub const MAX_BULLETS: usize = 100_000;
    /// Player hit radius (pixels)
    pub const PLAYER_RADIUS: f32 = 3.0;
    /// Grace window after session start and after every hit (seconds)
    pub const INVINCIBLE_DURATION: f32 = 1.0;
    /// Largest frame delta accepted by the simulation (backgrounded tabs)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Bullets further than this outside the playfield are culled
    pub const OFFSCREEN_MARGIN: f32 = 50.0;

    /// Playfield used when no canvas is available (native runs, tests)
    pub const DEFAULT_WIDTH: f32 = 800.0;
    pub const DEFAULT_HEIGHT: f32 = 600.0;
}

/// Axis-aligned playfield in screen pixels, origin top-left, y down
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new(consts::DEFAULT_WIDTH, consts::DEFAULT_HEIGHT)
    }
}

impl Playfield {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Clamp a point to `[0, width] x [0, height]`
    #[inline]
    pub fn clamp(&self, pos: Vec2) -> Vec2 {
        Vec2::new(pos.x.clamp(0.0, self.width), pos.y.clamp(0.0, self.height))
    }

    /// True if the point lies within the playfield grown by `margin` on every side
    #[inline]
    pub fn contains_with_margin(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= -margin
            && pos.x <= self.width + margin
            && pos.y >= -margin
            && pos.y <= self.height + margin
    }
}
