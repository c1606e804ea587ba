//! Rendering module
//!
//! `bridge` decodes engine particle buffers into [`Canvas`] calls; `pipeline`
//! implements the canvas with WebGPU.

pub mod bridge;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use bridge::{Canvas, PlayerMarker, Rgba, draw_frame};
pub use pipeline::GpuCanvas;
