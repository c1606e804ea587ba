//! Procedural bullet spawn patterns
//!
//! The spawner keeps a rate accumulator: each `advance` adds the frame delta
//! and runs one spawn cycle per elapsed `1 / spawn_rate` seconds. Long hitches
//! produce several cycles in one call instead of dropped spawns.
//!
//! Per cycle, depending on the pattern:
//! - Random: one aimed shot from a random playfield edge
//! - Circle: 10% chance of a 16-bullet ring at a random point
//! - Spiral: 5% chance of a 24-bullet ring from the center, rotated by wall-clock time
//! - Mixed: the Random shot every cycle, plus independent Circle (30% gate)
//!   and Spiral (20% gate) rolls

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{BulletPattern, Session};
use crate::Playfield;
use crate::engine::BulletEngine;

/// Packed `0xRRGGBBAA` colors
pub mod colors {
    pub const AIMED: u32 = 0xFF3333FF;
    pub const CIRCLE: u32 = 0xFFAA00FF;
    pub const SPIRAL: u32 = 0x00FFFFFF;
    pub const BURST: u32 = 0x00FFFFFF;
}

/// Aimed shot speed range before the difficulty multiplier
const AIMED_SPEED_MIN: f32 = 80.0;
const AIMED_SPEED_SPREAD: f32 = 60.0;
const AIMED_RADIUS_MIN: f32 = 3.0;
const AIMED_RADIUS_SPREAD: f32 = 2.0;

/// Direction used when the spawn point sits exactly on the aim target (screen down)
pub const FALLBACK_DIRECTION: Vec2 = Vec2::Y;

pub const CIRCLE_COUNT: u32 = 16;
pub const CIRCLE_SPEED: f32 = 120.0;
pub const CIRCLE_RADIUS: f32 = 3.0;
pub const CIRCLE_TRIGGER: f64 = 0.1;

pub const SPIRAL_COUNT: u32 = 24;
pub const SPIRAL_SPEED: f32 = 100.0;
pub const SPIRAL_RADIUS: f32 = 3.0;
pub const SPIRAL_TRIGGER: f64 = 0.05;

pub const BURST_COUNT: u32 = 32;
pub const BURST_SPEED: f32 = 200.0;
pub const BURST_RADIUS: f32 = 4.0;

/// Reduced gates the Mixed pattern rolls before each trigger
const MIXED_CIRCLE_GATE: f64 = 0.3;
const MIXED_SPIRAL_GATE: f64 = 0.2;

impl BulletPattern {
    fn fires_aimed(&self) -> bool {
        matches!(self, BulletPattern::Random | BulletPattern::Mixed)
    }

    fn circle_gate(&self) -> f64 {
        match self {
            BulletPattern::Circle => 1.0,
            BulletPattern::Mixed => MIXED_CIRCLE_GATE,
            _ => 0.0,
        }
    }

    fn spiral_gate(&self) -> f64 {
        match self {
            BulletPattern::Spiral => 1.0,
            BulletPattern::Mixed => MIXED_SPIRAL_GATE,
            _ => 0.0,
        }
    }
}

/// A ring of bullets sharing one origin, speed, radius and color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    pub center: Vec2,
    pub count: u32,
    pub speed: f32,
    pub radius: f32,
    pub color: u32,
    /// Angle of bullet 0 (radians)
    pub phase: f32,
}

impl Ring {
    /// Angular spacing between neighbours
    pub fn step(&self) -> f32 {
        TAU / self.count.max(1) as f32
    }

    /// Velocity of bullet `index`
    pub fn velocity(&self, index: u32) -> Vec2 {
        let angle = self.phase + self.step() * index as f32;
        Vec2::from_angle(angle) * self.speed
    }
}

/// Instruction for the bullet engine; produced and forwarded, never stored
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnEvent {
    Bullet {
        origin: Vec2,
        velocity: Vec2,
        radius: f32,
        color: u32,
    },
    Ring(Ring),
    /// Remove every live bullet
    Clear,
}

impl SpawnEvent {
    /// Bullets this event asks the engine to create
    pub fn bullet_count(&self) -> usize {
        match self {
            SpawnEvent::Bullet { .. } => 1,
            SpawnEvent::Ring(ring) => ring.count as usize,
            SpawnEvent::Clear => 0,
        }
    }

    /// Forward to the engine
    pub fn apply(&self, engine: &mut impl BulletEngine) {
        match *self {
            SpawnEvent::Bullet {
                origin,
                velocity,
                radius,
                color,
            } => engine.spawn_bullet(origin.x, origin.y, velocity.x, velocity.y, radius, color),
            SpawnEvent::Ring(ring) if ring.phase == 0.0 => engine.spawn_circle_pattern(
                ring.center.x,
                ring.center.y,
                ring.count as usize,
                ring.speed,
                ring.radius,
                ring.color,
            ),
            // Rotated rings go bullet by bullet; the engine's pattern call has no phase
            SpawnEvent::Ring(ring) => {
                for i in 0..ring.count {
                    let v = ring.velocity(i);
                    engine.spawn_bullet(ring.center.x, ring.center.y, v.x, v.y, ring.radius, ring.color);
                }
            }
            SpawnEvent::Clear => engine.clear_bullets(),
        }
    }
}

/// Per-call inputs the patterns place against
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext {
    pub playfield: Playfield,
    /// Wall-clock seconds, drives the spiral phase
    pub now_secs: f64,
}

/// Rate-controlled pattern generator
///
/// Pattern, rate, speed multiplier and aim target are read from the
/// [`Session`] on every call; the spawner only owns its timing and RNG.
#[derive(Debug, Clone)]
pub struct Spawner {
    /// Seconds owed to the rate controller
    accumulator: f64,
    /// Total cycles run since the last reset
    cycles: u64,
    rng: Pcg32,
}

impl Spawner {
    pub fn new(seed: u64) -> Self {
        Self {
            accumulator: 0.0,
            cycles: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Forget any owed time (new session)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.cycles = 0;
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Advance the rate controller by `dt` and push the resulting events into `out`
    pub fn advance(
        &mut self,
        dt: f32,
        session: &Session,
        ctx: &SpawnContext,
        out: &mut Vec<SpawnEvent>,
    ) {
        debug_assert!(dt >= 0.0, "negative frame delta {dt}");
        if session.spawn_rate <= 0.0 {
            return;
        }
        self.accumulator += f64::from(dt.max(0.0));

        let interval = 1.0 / f64::from(session.spawn_rate);
        while self.accumulator >= interval {
            self.accumulator -= interval;
            self.cycles += 1;
            self.run_cycle(session, ctx, out);
        }
    }

    fn run_cycle(&mut self, session: &Session, ctx: &SpawnContext, out: &mut Vec<SpawnEvent>) {
        let pattern = session.active_pattern;
        if pattern.fires_aimed() {
            out.push(self.aimed_shot(session, ctx));
        }

        let gate = pattern.circle_gate();
        if gate > 0.0 && self.rng.random_bool(gate) && self.rng.random_bool(CIRCLE_TRIGGER) {
            out.push(SpawnEvent::Ring(self.circle_ring(session, ctx)));
        }

        let gate = pattern.spiral_gate();
        if gate > 0.0 && self.rng.random_bool(gate) && self.rng.random_bool(SPIRAL_TRIGGER) {
            out.push(SpawnEvent::Ring(spiral_ring(session, ctx)));
        }
    }

    /// Shot from a uniform point on a uniform edge, aimed at the player
    fn aimed_shot(&mut self, session: &Session, ctx: &SpawnContext) -> SpawnEvent {
        let Playfield { width, height } = ctx.playfield;
        let origin = match self.rng.random_range(0..4u8) {
            0 => Vec2::new(self.rng.random::<f32>() * width, 0.0),
            1 => Vec2::new(width, self.rng.random::<f32>() * height),
            2 => Vec2::new(self.rng.random::<f32>() * width, height),
            _ => Vec2::new(0.0, self.rng.random::<f32>() * height),
        };

        let direction = (session.aim - origin)
            .try_normalize()
            .unwrap_or(FALLBACK_DIRECTION);
        let speed = (AIMED_SPEED_MIN + self.rng.random::<f32>() * AIMED_SPEED_SPREAD)
            * session.difficulty_multiplier;
        let radius = AIMED_RADIUS_MIN + self.rng.random::<f32>() * AIMED_RADIUS_SPREAD;

        SpawnEvent::Bullet {
            origin,
            velocity: direction * speed,
            radius,
            color: colors::AIMED,
        }
    }

    fn circle_ring(&mut self, session: &Session, ctx: &SpawnContext) -> Ring {
        let center = Vec2::new(
            self.rng.random::<f32>() * ctx.playfield.width,
            self.rng.random::<f32>() * ctx.playfield.height,
        );
        Ring {
            center,
            count: CIRCLE_COUNT,
            speed: CIRCLE_SPEED * session.difficulty_multiplier,
            radius: CIRCLE_RADIUS,
            color: colors::CIRCLE,
            phase: 0.0,
        }
    }
}

fn spiral_ring(session: &Session, ctx: &SpawnContext) -> Ring {
    Ring {
        center: ctx.playfield.center(),
        count: SPIRAL_COUNT,
        speed: SPIRAL_SPEED * session.difficulty_multiplier,
        radius: SPIRAL_RADIUS,
        color: colors::SPIRAL,
        phase: spiral_phase(ctx.now_secs),
    }
}

/// Manual burst at the player; bypasses the rate controller
pub fn burst(session: &Session) -> SpawnEvent {
    SpawnEvent::Ring(Ring {
        center: session.aim,
        count: BURST_COUNT,
        speed: BURST_SPEED * session.difficulty_multiplier,
        radius: BURST_RADIUS,
        color: colors::BURST,
        phase: 0.0,
    })
}

/// Spiral rotation for a wall-clock time, reduced to `[0, 2π)` before narrowing to f32
pub fn spiral_phase(now_secs: f64) -> f32 {
    now_secs.rem_euclid(std::f64::consts::TAU) as f32
}
