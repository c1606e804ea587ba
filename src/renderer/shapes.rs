//! Shape generation for 2D primitives

use glam::Vec2;

use super::vertex::Vertex;

/// Extra pixels around each circle so the antialiased edge is not clipped
pub const EDGE_PADDING: f32 = 1.0;

pub const QUAD_VERTICES: usize = 6;

/// Two triangles covering a circle of `outer` radius in pixel space
///
/// `inner` is the inner edge radius; pass 0 for a filled disc.
pub fn circle_quad(center: Vec2, outer: f32, inner: f32, color: [f32; 4]) -> [Vertex; QUAD_VERTICES] {
    let outer = outer.max(f32::EPSILON);
    let half = outer + EDGE_PADDING;
    let extent = half / outer;
    let inner = (inner / outer).clamp(0.0, 1.0);

    let corner = |sx: f32, sy: f32| {
        let pos = center + Vec2::new(sx, sy) * half;
        Vertex::new(pos.into(), [sx * extent, sy * extent], color, inner)
    };

    let tl = corner(-1.0, -1.0);
    let tr = corner(1.0, -1.0);
    let bl = corner(-1.0, 1.0);
    let br = corner(1.0, 1.0);
    [tl, bl, tr, tr, bl, br]
}

/// Quad for a stroke centered on `radius`
pub fn ring_quad(center: Vec2, radius: f32, width: f32, color: [f32; 4]) -> [Vertex; QUAD_VERTICES] {
    let half_width = width.max(0.0) / 2.0;
    circle_quad(center, radius + half_width, (radius - half_width).max(0.0), color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_covers_padded_bounds() {
        let verts = circle_quad(Vec2::new(100.0, 50.0), 4.0, 0.0, [1.0; 4]);
        let xs: Vec<f32> = verts.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = verts.iter().map(|v| v.position[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), 95.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 105.0);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), 45.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 55.0);
        // Circle edge sits at local length 1
        assert!(verts.iter().all(|v| (v.local[0].abs() - 1.25).abs() < 1e-6));
        assert!(verts.iter().all(|v| v.inner == 0.0));
    }

    #[test]
    fn test_ring_edges() {
        let verts = ring_quad(Vec2::ZERO, 3.0, 2.0, [1.0; 4]);
        // Outer radius 4, inner radius 2
        assert!((verts[0].inner - 0.5).abs() < 1e-6);
        assert_eq!(verts[0].position, [-5.0, -5.0]);
    }
}
