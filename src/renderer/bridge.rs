//! SoA render bridge
//!
//! Decodes the engine's parallel particle arrays once per frame and turns
//! live slots into draw calls on a [`Canvas`]. Dead slots are skipped without
//! looking at their other attributes.

use glam::Vec2;

use crate::consts::PLAYER_RADIUS;
use crate::engine::ParticleView;

/// Straight (non-premultiplied) sRGB color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in `[0, 1]`
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// `#RRGGBBAA` style constant
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r,
            g,
            b,
            a: a as f32 / 255.0,
        }
    }

    /// Unpack an engine color, `0xRRGGBBAA`
    pub fn from_packed(color: u32) -> Self {
        let [r, g, b, a] = color.to_be_bytes();
        Self::rgba(r, g, b, a)
    }

    /// Normalized sRGB components
    pub fn to_array(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            self.a,
        ]
    }

    /// Linear components for sRGB render targets
    pub fn to_linear(self) -> [f32; 4] {
        let [r, g, b, a] = self.to_array();
        [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a]
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Colors for game elements
pub mod colors {
    use super::Rgba;

    pub const BACKGROUND: Rgba = Rgba::rgb(0, 0, 0);
    pub const PLAYER: Rgba = Rgba::rgb(0x00, 0xFF, 0x00);
    pub const RING_VULNERABLE: Rgba = Rgba::rgba(0x00, 0xFF, 0x00, 0x88);
    pub const RING_INVINCIBLE: Rgba = Rgba::rgba(0x00, 0x88, 0xFF, 0x88);
}

pub const RING_WIDTH_VULNERABLE: f32 = 1.0;
pub const RING_WIDTH_INVINCIBLE: f32 = 2.0;
/// Flash half-period while invincible (milliseconds)
pub const FLASH_PERIOD_MS: f64 = 100.0;

/// Drawing surface the bridge paints on; coordinates are playfield pixels
pub trait Canvas {
    fn clear(&mut self, color: Rgba);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);
    /// Stroke centered on `radius`, `width` pixels wide
    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba);
}

/// Draw every live particle, returns how many were drawn
pub fn draw_bullets(view: &ParticleView<'_>, canvas: &mut impl Canvas) -> usize {
    let mut drawn = 0;
    for particle in view.iter_alive() {
        canvas.fill_circle(particle.pos, particle.radius, Rgba::from_packed(particle.color));
        drawn += 1;
    }
    drawn
}

/// Player marker for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerMarker {
    pub pos: Vec2,
    pub invincible: bool,
}

/// `true` on the visible half of the invincibility flash
#[inline]
pub fn flash_visible(now_ms: f64) -> bool {
    (now_ms / FLASH_PERIOD_MS).floor().rem_euclid(2.0) == 0.0
}

/// Filled marker plus state ring. Skipped on the dark half of the flash.
pub fn draw_player(marker: &PlayerMarker, now_ms: f64, canvas: &mut impl Canvas) {
    if marker.invincible && !flash_visible(now_ms) {
        return;
    }
    canvas.fill_circle(marker.pos, PLAYER_RADIUS, colors::PLAYER);
    let (width, color) = if marker.invincible {
        (RING_WIDTH_INVINCIBLE, colors::RING_INVINCIBLE)
    } else {
        (RING_WIDTH_VULNERABLE, colors::RING_VULNERABLE)
    };
    canvas.stroke_circle(marker.pos, PLAYER_RADIUS, width, color);
}

/// Paint one full frame: background, bullets, then the player while a run is active
pub fn draw_frame(
    view: &ParticleView<'_>,
    player: Option<PlayerMarker>,
    now_ms: f64,
    canvas: &mut impl Canvas,
) -> usize {
    canvas.clear(colors::BACKGROUND);
    let drawn = draw_bullets(view, canvas);
    if let Some(marker) = player {
        draw_player(&marker, now_ms, canvas);
    }
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Clear(Rgba),
        Fill(Vec2, f32, Rgba),
        Stroke(Vec2, f32, f32, Rgba),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl Canvas for Recorder {
        fn clear(&mut self, color: Rgba) {
            self.calls.push(Call::Clear(color));
        }

        fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
            self.calls.push(Call::Fill(center, radius, color));
        }

        fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba) {
            self.calls.push(Call::Stroke(center, radius, width, color));
        }
    }

    #[test]
    fn test_unpack_color() {
        let c = Rgba::from_packed(0xFF3333FF);
        assert_eq!((c.r, c.g, c.b), (0xFF, 0x33, 0x33));
        assert_eq!(c.a, 1.0);
        assert_eq!(Rgba::from_packed(0x00FFFF00).a, 0.0);
    }

    #[test]
    fn test_linear_conversion_endpoints() {
        assert_eq!(colors::BACKGROUND.to_linear(), [0.0, 0.0, 0.0, 1.0]);
        let [r, g, _, _] = Rgba::rgb(255, 128, 0).to_linear();
        assert!((r - 1.0).abs() < 1e-5);
        assert!((g - 0.2158).abs() < 1e-3);
    }

    #[test]
    fn test_only_alive_slots_are_drawn() {
        // Dead slots carry garbage that must never reach the canvas
        let x = [10.0, f32::NAN, 30.0, 1e9];
        let y = [20.0, f32::NAN, 40.0, -1e9];
        let radius = [3.0, -7.0, 4.0, 0.0];
        let color = [0xFF3333FF, 0xDEADBEEF, 0x00FFFFFF, 0];
        let alive = [true, false, true, false];
        let view = ParticleView::new(&x, &y, &radius, &color, &alive).unwrap();

        let mut canvas = Recorder::default();
        assert_eq!(draw_bullets(&view, &mut canvas), 2);
        assert_eq!(
            canvas.calls,
            vec![
                Call::Fill(Vec2::new(10.0, 20.0), 3.0, Rgba::from_packed(0xFF3333FF)),
                Call::Fill(Vec2::new(30.0, 40.0), 4.0, Rgba::from_packed(0x00FFFFFF)),
            ]
        );
    }

    #[test]
    fn test_flash_period() {
        assert!(flash_visible(0.0));
        assert!(flash_visible(99.9));
        assert!(!flash_visible(100.0));
        assert!(!flash_visible(199.0));
        assert!(flash_visible(200.0));
    }

    #[test]
    fn test_player_ring_reflects_invincibility() {
        let pos = Vec2::new(400.0, 300.0);
        let mut canvas = Recorder::default();
        draw_player(&PlayerMarker { pos, invincible: false }, 150.0, &mut canvas);
        assert_eq!(
            canvas.calls,
            vec![
                Call::Fill(pos, PLAYER_RADIUS, colors::PLAYER),
                Call::Stroke(pos, PLAYER_RADIUS, 1.0, colors::RING_VULNERABLE),
            ]
        );

        let mut canvas = Recorder::default();
        draw_player(&PlayerMarker { pos, invincible: true }, 150.0, &mut canvas);
        assert!(canvas.calls.is_empty());

        draw_player(&PlayerMarker { pos, invincible: true }, 250.0, &mut canvas);
        assert_eq!(
            canvas.calls[1],
            Call::Stroke(pos, PLAYER_RADIUS, 2.0, colors::RING_INVINCIBLE)
        );
    }

    #[test]
    fn test_frame_order() {
        let alive = [false; 3];
        let zeros = [0.0; 3];
        let color = [0u32; 3];
        let view = ParticleView::new(&zeros, &zeros, &zeros, &color, &alive).unwrap();
        let mut canvas = Recorder::default();
        assert_eq!(draw_frame(&view, None, 0.0, &mut canvas), 0);
        assert_eq!(canvas.calls, vec![Call::Clear(colors::BACKGROUND)]);
    }
}
