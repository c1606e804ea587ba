//! Structure-of-arrays bullet field
//!
//! Every attribute lives in its own fixed-length vector indexed by slot.
//! Free slots are tracked on a stack so spawning and retiring are O(1).

use std::f32::consts::TAU;

use glam::Vec2;

use super::{BulletEngine, ParticleView};
use crate::Playfield;
use crate::consts::OFFSCREEN_MARGIN;

pub struct BulletField {
    x: Vec<f32>,
    y: Vec<f32>,
    vx: Vec<f32>,
    vy: Vec<f32>,
    radius: Vec<f32>,
    color: Vec<u32>,
    alive: Vec<bool>,
    /// Free slot stack, top is the next slot handed out
    free_list: Vec<usize>,
    count: usize,
    playfield: Playfield,
}

impl BulletField {
    pub fn new(capacity: usize, width: f32, height: f32) -> Self {
        debug_assert!(capacity > 0, "bullet field needs a non-zero capacity");
        Self {
            x: vec![0.0; capacity],
            y: vec![0.0; capacity],
            vx: vec![0.0; capacity],
            vy: vec![0.0; capacity],
            radius: vec![0.0; capacity],
            color: vec![0; capacity],
            alive: vec![false; capacity],
            free_list: (0..capacity).rev().collect(),
            count: 0,
            playfield: Playfield::new(width, height),
        }
    }

    /// Culling bounds follow the canvas
    pub fn resize(&mut self, width: f32, height: f32) {
        self.playfield = Playfield::new(width, height);
    }

    fn kill(&mut self, index: usize) {
        self.alive[index] = false;
        self.free_list.push(index);
        self.count -= 1;
    }
}

impl BulletEngine for BulletField {
    fn spawn_bullet(&mut self, x: f32, y: f32, vx: f32, vy: f32, radius: f32, color: u32) {
        // Full field: the spawn is dropped
        let Some(i) = self.free_list.pop() else {
            return;
        };
        self.x[i] = x;
        self.y[i] = y;
        self.vx[i] = vx;
        self.vy[i] = vy;
        self.radius[i] = radius;
        self.color[i] = color;
        self.alive[i] = true;
        self.count += 1;
    }

    fn spawn_circle_pattern(
        &mut self,
        cx: f32,
        cy: f32,
        count: usize,
        speed: f32,
        radius: f32,
        color: u32,
    ) {
        if count == 0 {
            return;
        }
        let step = TAU / count as f32;
        for i in 0..count {
            let angle = step * i as f32;
            self.spawn_bullet(cx, cy, angle.cos() * speed, angle.sin() * speed, radius, color);
        }
    }

    fn clear_bullets(&mut self) {
        self.alive.fill(false);
        self.free_list.clear();
        self.free_list.extend((0..self.alive.len()).rev());
        self.count = 0;
    }

    fn update(&mut self, dt: f32) {
        for i in 0..self.alive.len() {
            if !self.alive[i] {
                continue;
            }

            self.x[i] += self.vx[i] * dt;
            self.y[i] += self.vy[i] * dt;

            let pos = Vec2::new(self.x[i], self.y[i]);
            if !self.playfield.contains_with_margin(pos, OFFSCREEN_MARGIN) {
                self.kill(i);
            }
        }
    }

    fn check_collision(&self, px: f32, py: f32, radius: f32) -> bool {
        (0..self.alive.len()).any(|i| {
            if !self.alive[i] {
                return false;
            }
            let dx = self.x[i] - px;
            let dy = self.y[i] - py;
            let reach = self.radius[i] + radius;
            dx * dx + dy * dy < reach * reach
        })
    }

    fn bullet_count(&self) -> usize {
        self.count
    }

    fn capacity(&self) -> usize {
        self.alive.len()
    }

    fn view(&self) -> ParticleView<'_> {
        ParticleView {
            x: &self.x,
            y: &self.y,
            radius: &self.radius,
            color: &self.color,
            alive: &self.alive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alive_count(field: &BulletField) -> usize {
        field.view().iter_alive().count()
    }

    #[test]
    fn test_spawn_and_count() {
        let mut field = BulletField::new(8, 800.0, 600.0);
        field.spawn_bullet(10.0, 10.0, 0.0, 0.0, 3.0, 0xFF3333FF);
        field.spawn_circle_pattern(400.0, 300.0, 4, 100.0, 3.0, 0xFFAA00FF);
        assert_eq!(field.bullet_count(), 5);
        assert_eq!(alive_count(&field), 5);
    }

    #[test]
    fn test_full_field_drops_spawns() {
        let mut field = BulletField::new(3, 800.0, 600.0);
        field.spawn_circle_pattern(400.0, 300.0, 16, 100.0, 3.0, 0xFFAA00FF);
        assert_eq!(field.bullet_count(), 3);
        assert_eq!(field.capacity(), 3);
    }

    #[test]
    fn test_offscreen_bullets_are_retired_and_slots_reused() {
        let mut field = BulletField::new(2, 800.0, 600.0);
        field.spawn_bullet(790.0, 300.0, 1000.0, 0.0, 3.0, 0xFF3333FF);
        field.spawn_bullet(400.0, 300.0, 0.0, 0.0, 3.0, 0xFF3333FF);
        field.update(0.1); // x = 890, past the 50px margin
        assert_eq!(field.bullet_count(), 1);
        assert_eq!(alive_count(&field), 1);

        field.spawn_bullet(100.0, 100.0, 0.0, 0.0, 3.0, 0x00FFFFFF);
        assert_eq!(field.bullet_count(), 2);
        // Field is full again
        field.spawn_bullet(100.0, 100.0, 0.0, 0.0, 3.0, 0x00FFFFFF);
        assert_eq!(field.bullet_count(), 2);
    }

    #[test]
    fn test_collision() {
        let mut field = BulletField::new(4, 800.0, 600.0);
        field.spawn_bullet(100.0, 100.0, 0.0, 0.0, 3.0, 0xFF3333FF);
        assert!(field.check_collision(104.0, 100.0, 3.0));
        assert!(!field.check_collision(106.0, 100.0, 3.0));
    }

    #[test]
    fn test_circle_pattern_directions() {
        let mut field = BulletField::new(4, 800.0, 600.0);
        field.spawn_circle_pattern(400.0, 300.0, 4, 100.0, 3.0, 0xFFAA00FF);
        field.update(0.1);
        let positions: Vec<Vec2> = field.view().iter_alive().map(|p| p.pos).collect();
        let expected = [
            Vec2::new(390.0, 300.0),
            Vec2::new(400.0, 290.0),
            Vec2::new(400.0, 310.0),
            Vec2::new(410.0, 300.0),
        ];
        for want in expected {
            assert!(
                positions.iter().any(|got| got.distance(want) < 0.01),
                "no bullet near {want:?} in {positions:?}"
            );
        }
    }

    #[test]
    fn test_clear_releases_every_slot() {
        let mut field = BulletField::new(16, 800.0, 600.0);
        field.spawn_circle_pattern(400.0, 300.0, 16, 100.0, 3.0, 0xFFAA00FF);
        field.clear_bullets();
        assert_eq!(field.bullet_count(), 0);
        assert!(!field.check_collision(400.0, 300.0, 3.0));
        field.spawn_circle_pattern(400.0, 300.0, 16, 100.0, 3.0, 0xFFAA00FF);
        assert_eq!(field.bullet_count(), 16);
    }
}
