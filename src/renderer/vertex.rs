//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Corner of a circle quad
///
/// `local` is the corner position relative to the circle center in units of
/// the outer radius; the fragment shader derives coverage from its length.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub local: [f32; 2],
    pub color: [f32; 4],
    /// Inner edge as a fraction of the outer radius, 0 for a filled disc
    pub inner: f32,
}

impl Vertex {
    pub const fn new(position: [f32; 2], local: [f32; 2], color: [f32; 4], inner: f32) -> Self {
        Self {
            position,
            local,
            color,
            inner,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 4] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4, 3 => Float32];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_struct() {
        let desc = Vertex::desc();
        assert_eq!(desc.array_stride, 36);
        assert_eq!(desc.attributes[2].offset, 16);
        assert_eq!(desc.attributes[3].offset, 32);
    }
}
