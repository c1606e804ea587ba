//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Device class detection (user agent)
//! - Input events (pointer, touch, keyboard)

pub mod device;
pub mod input;

pub use device::DeviceClass;
pub use input::{InputState, Key};
