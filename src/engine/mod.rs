//! Bullet engine contract
//!
//! The engine owns every bullet and the SoA buffers describing them. The
//! game only issues spawn/clear/update calls, asks for a collision verdict,
//! and borrows a [`ParticleView`] for exactly one draw.

pub mod field;

pub use field::BulletField;

use glam::Vec2;

/// Operations the simulation needs from a bullet engine
pub trait BulletEngine {
    fn spawn_bullet(&mut self, x: f32, y: f32, vx: f32, vy: f32, radius: f32, color: u32);

    /// Spawn `count` bullets at `(cx, cy)` with directions evenly spaced over the full circle
    fn spawn_circle_pattern(
        &mut self,
        cx: f32,
        cy: f32,
        count: usize,
        speed: f32,
        radius: f32,
        color: u32,
    );

    fn clear_bullets(&mut self);

    /// Integrate motion and retire bullets that left the playfield
    fn update(&mut self, dt: f32);

    /// True if any live bullet overlaps the circle at `(px, py)`
    fn check_collision(&self, px: f32, py: f32, radius: f32) -> bool;

    fn bullet_count(&self) -> usize;

    fn capacity(&self) -> usize;

    /// Borrow the SoA buffers for one frame
    fn view(&self) -> ParticleView<'_>;
}

/// One live bullet decoded from the SoA buffers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub radius: f32,
    /// Packed `0xRRGGBBAA`
    pub color: u32,
}

/// Read-only borrow of the engine's parallel buffers, all of length `capacity`
///
/// The view cannot outlive the engine borrow it came from, so slot indices
/// can never be carried into the next frame.
#[derive(Debug, Clone, Copy)]
pub struct ParticleView<'a> {
    x: &'a [f32],
    y: &'a [f32],
    radius: &'a [f32],
    color: &'a [u32],
    alive: &'a [bool],
}

impl<'a> ParticleView<'a> {
    /// Returns `None` if the buffers disagree on length
    pub fn new(
        x: &'a [f32],
        y: &'a [f32],
        radius: &'a [f32],
        color: &'a [u32],
        alive: &'a [bool],
    ) -> Option<Self> {
        let capacity = alive.len();
        if [x.len(), y.len(), radius.len(), color.len()]
            .iter()
            .any(|&len| len != capacity)
        {
            return None;
        }
        Some(Self {
            x,
            y,
            radius,
            color,
            alive,
        })
    }

    pub fn capacity(&self) -> usize {
        self.alive.len()
    }

    /// Decode slot `index`; dead or out-of-range slots yield `None`
    #[inline]
    pub fn get(&self, index: usize) -> Option<Particle> {
        if !*self.alive.get(index)? {
            return None;
        }
        Some(Particle {
            pos: Vec2::new(self.x[index], self.y[index]),
            radius: self.radius[index],
            color: self.color[index],
        })
    }

    /// Live bullets in slot order
    pub fn iter_alive(&self) -> impl Iterator<Item = Particle> + use<'a> {
        let view = *self;
        (0..view.capacity()).filter_map(move |i| view.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_rejects_mismatched_buffers() {
        let xs = [0.0; 4];
        let short = [0.0; 3];
        let colors = [0u32; 4];
        let alive = [false; 4];
        assert!(ParticleView::new(&xs, &xs, &short, &colors, &alive).is_none());
        assert!(ParticleView::new(&xs, &xs, &xs, &colors, &alive).is_some());
    }

    #[test]
    fn test_view_skips_dead_slots() {
        let x = [1.0, 2.0, 3.0];
        let y = [4.0, 5.0, 6.0];
        let r = [1.0, 1.0, 2.0];
        let c = [0xFF0000FF, 0xDEADBEEF, 0x00FF00FF];
        let alive = [true, false, true];
        let view = ParticleView::new(&x, &y, &r, &c, &alive).unwrap();

        assert_eq!(view.capacity(), 3);
        assert!(view.get(1).is_none());
        assert!(view.get(7).is_none());

        let live: Vec<Particle> = view.iter_alive().collect();
        assert_eq!(live.len(), 2);
        assert_eq!(live[1].pos, Vec2::new(3.0, 6.0));
        assert_eq!(live[1].color, 0x00FF00FF);
    }
}
