//! Unified pointer/touch input
//!
//! Browser event handlers feed edges into [`InputState`]; the simulation
//! reads one aim target and the held-key set per frame.
//!
//! Pointer positions are stored as reported (the canvas bounds the source
//! device). Touch positions are clamped to the playfield.

use std::collections::HashSet;

use glam::Vec2;

use super::device::DeviceClass;
use crate::Playfield;

/// Discrete game keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Fire a ring of bullets at the player
    Burst,
    /// Remove every live bullet
    Clear,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            " " => Some(Key::Burst),
            "c" | "C" => Some(Key::Clear),
            _ => None,
        }
    }
}

/// Input state shared between event handlers and the frame loop
#[derive(Debug, Clone)]
pub struct InputState {
    device: DeviceClass,
    playfield: Playfield,
    held: HashSet<Key>,
    pointer: Vec2,
    touch: Vec2,
    touch_active: bool,
}

impl InputState {
    pub fn new(device: DeviceClass, playfield: Playfield) -> Self {
        Self {
            device,
            playfield,
            held: HashSet::new(),
            pointer: Vec2::ZERO,
            touch: playfield.center(),
            touch_active: false,
        }
    }

    /// Canvas was resized; existing touch position is re-clamped
    pub fn resize(&mut self, playfield: Playfield) {
        self.playfield = playfield;
        self.touch = playfield.clamp(self.touch);
    }

    /// Key press edge. Returns true if the key is a game key.
    pub fn key_down(&mut self, name: &str) -> bool {
        match Key::from_key_name(name) {
            Some(key) => {
                self.held.insert(key);
                true
            }
            None => false,
        }
    }

    /// Key release edge
    pub fn key_up(&mut self, name: &str) {
        if let Some(key) = Key::from_key_name(name) {
            self.held.remove(&key);
        }
    }

    /// Drop all held keys (window lost focus, key-up events will not arrive)
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer = Vec2::new(x, y);
    }

    pub fn touch_started(&mut self, x: f32, y: f32) {
        self.touch_active = true;
        self.touch = self.playfield.clamp(Vec2::new(x, y));
    }

    /// Ignored unless a touch is in progress
    pub fn touch_moved(&mut self, x: f32, y: f32) {
        if self.touch_active {
            self.touch = self.playfield.clamp(Vec2::new(x, y));
        }
    }

    pub fn touch_ended(&mut self) {
        self.touch_active = false;
    }

    /// Put both aim sources back at the playfield center (session start)
    pub fn recenter(&mut self) {
        let center = self.playfield.center();
        self.pointer = center;
        self.touch = center;
    }

    /// Aim target for this frame, chosen by the pinned device class
    pub fn current_target(&self) -> Vec2 {
        match self.device {
            DeviceClass::Mobile => self.touch,
            DeviceClass::Pc => self.pointer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> Playfield {
        Playfield::new(800.0, 600.0)
    }

    #[test]
    fn test_held_key_reports_until_release() {
        let mut input = InputState::new(DeviceClass::Pc, field());
        assert!(input.key_down(" "));
        for _ in 0..3 {
            assert!(input.is_pressed(Key::Burst));
        }
        input.key_up(" ");
        assert!(!input.is_pressed(Key::Burst));
    }

    #[test]
    fn test_clear_key_both_cases() {
        let mut input = InputState::new(DeviceClass::Pc, field());
        input.key_down("C");
        assert!(input.is_pressed(Key::Clear));
        input.key_up("c");
        assert!(!input.is_pressed(Key::Clear));
        assert!(!input.key_down("x"));
    }

    #[test]
    fn test_pointer_is_not_clamped() {
        let mut input = InputState::new(DeviceClass::Pc, field());
        input.pointer_moved(-20.0, 900.0);
        assert_eq!(input.current_target(), Vec2::new(-20.0, 900.0));
    }

    #[test]
    fn test_touch_is_clamped_and_starts_centered() {
        let mut input = InputState::new(DeviceClass::Mobile, field());
        assert_eq!(input.current_target(), Vec2::new(400.0, 300.0));

        input.touch_started(-10.0, 50.0);
        assert_eq!(input.current_target(), Vec2::new(0.0, 50.0));

        input.touch_moved(1000.0, 700.0);
        assert_eq!(input.current_target(), Vec2::new(800.0, 600.0));
    }

    #[test]
    fn test_touch_move_ignored_without_active_touch() {
        let mut input = InputState::new(DeviceClass::Mobile, field());
        input.touch_moved(10.0, 10.0);
        assert_eq!(input.current_target(), field().center());

        input.touch_started(100.0, 100.0);
        input.touch_ended();
        input.touch_moved(200.0, 200.0);
        assert_eq!(input.current_target(), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_device_class_selects_source() {
        let mut pc = InputState::new(DeviceClass::Pc, field());
        pc.touch_started(5.0, 5.0);
        pc.pointer_moved(50.0, 60.0);
        assert_eq!(pc.current_target(), Vec2::new(50.0, 60.0));

        let mut mobile = InputState::new(DeviceClass::Mobile, field());
        mobile.pointer_moved(50.0, 60.0);
        assert_eq!(mobile.current_target(), field().center());
    }
}
