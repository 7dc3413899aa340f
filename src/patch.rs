//! The patch-vertex contract shared with the downstream expansion shader.
//!
//! Every stroked primitive (segment body, join, cap) is one patch of
//! [`PATCH_VERTEX_COUNT`] vertices. Vertices 0-3 carry the primitive's
//! control points; vertex 4 carries packed metadata:
//!
//! | vertex 4 slot | segment body            | join                  | square cap |
//! |---------------|-------------------------|-----------------------|------------|
//! | `x`           | [`PATCH_SEGMENT`]       | join code             | [`PATCH_CAP_SQUARE`] |
//! | `y`           | forced segment count (0 = expand adaptively) | miter limit (miter joins) | 0 |
//!
//! Join and cap patches store radius-scaled *unit* tangent points rather
//! than raw control points, so two inputs with equal tangent directions
//! produce identical patches regardless of control-point magnitude.

use strokevg_core::math::{Point, Vector};

/// Number of vertices in one tessellation patch.
pub const PATCH_VERTEX_COUNT: usize = 5;

/// Worst-case patches emitted per path verb, used to size the up-front
/// vertex reservation.
pub const PATCH_ESTIMATE_INFLATION: usize = 3;

/// Metadata code for a segment body patch.
pub const PATCH_SEGMENT: f32 = 0.0;
/// Metadata code for a bevel join patch.
pub const PATCH_JOIN_BEVEL: f32 = 1.0;
/// Metadata code for a miter join patch.
pub const PATCH_JOIN_MITER: f32 = 2.0;
/// Metadata code for a round join patch.
pub const PATCH_JOIN_ROUND: f32 = 3.0;
/// Metadata code for a square cap patch.
pub const PATCH_CAP_SQUARE: f32 = 4.0;

/// A single vertex of a tessellation patch.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PatchVertex {
    pub position: [f32; 2],
}

impl PatchVertex {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { position: [x, y] }
    }

    #[inline]
    pub fn from_point(p: Point) -> Self {
        Self { position: [p.x, p.y] }
    }
}

/// One tessellation patch worth of vertices.
pub type Patch = [PatchVertex; PATCH_VERTEX_COUNT];

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

/// The vertex buffer layout consumers bind patch buffers with.
pub fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<PatchVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

/// Degree-elevates a line to a cubic with uniform parametrization.
pub fn line_to_cubic(p0: Point, p1: Point) -> [Point; 4] {
    let d = p1 - p0;
    [p0, p0 + d / 3.0, p0 + d * (2.0 / 3.0), p1]
}

/// Degree-elevates a quadratic to the cubic covering the same points.
pub fn quad_to_cubic(src: &[Point; 3]) -> [Point; 4] {
    let c1 = src[0] + (src[1] - src[0]) * (2.0 / 3.0);
    let c2 = src[2] + (src[1] - src[2]) * (2.0 / 3.0);
    [src[0], c1, c2, src[2]]
}

pub(crate) fn write_segment(patch: &mut Patch, pts: &[Point; 4], forced_segments: f32) {
    for (vertex, p) in patch.iter_mut().zip(pts) {
        *vertex = PatchVertex::from_point(*p);
    }
    patch[4] = PatchVertex::new(PATCH_SEGMENT, forced_segments);
}

/// `incoming` and `outgoing` are unit tangents of the adjacent segments at
/// `anchor`, pointing in the direction of travel.
pub(crate) fn write_join(
    patch: &mut Patch,
    code: f32,
    anchor: Point,
    incoming: Vector,
    outgoing: Vector,
    radius: f32,
    extra: f32,
) {
    patch[0] = PatchVertex::from_point(anchor);
    patch[1] = PatchVertex::from_point(anchor + incoming * radius);
    patch[2] = PatchVertex::from_point(anchor + outgoing * radius);
    patch[3] = PatchVertex::from_point(anchor);
    patch[4] = PatchVertex::new(code, extra);
}

/// `outward` is the unit tangent pointing away from the contour; the shader
/// projects the cap extension beyond `endpoint` along it.
pub(crate) fn write_square_cap(patch: &mut Patch, endpoint: Point, outward: Vector, radius: f32) {
    let tip = endpoint + outward * radius;
    patch[0] = PatchVertex::from_point(endpoint);
    patch[1] = PatchVertex::from_point(tip);
    patch[2] = PatchVertex::from_point(tip);
    patch[3] = PatchVertex::from_point(endpoint);
    patch[4] = PatchVertex::new(PATCH_CAP_SQUARE, 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use strokevg_core::math::point;

    #[test]
    fn quad_elevation_preserves_endpoints_and_midpoint() {
        let quad = [point(0.0, 0.0), point(5.0, 10.0), point(10.0, 0.0)];
        let cubic = quad_to_cubic(&quad);

        assert_eq!(cubic[0], quad[0]);
        assert_eq!(cubic[3], quad[2]);

        let quad_mid = crate::geometry::eval_quad(&quad, 0.5);
        let cubic_mid = crate::geometry::eval_cubic(&cubic, 0.5);
        assert!((quad_mid - cubic_mid).length() < 1e-4);
    }

    #[test]
    fn segment_patch_metadata() {
        let mut patch = Patch::default();
        let pts = line_to_cubic(point(0.0, 0.0), point(9.0, 0.0));
        write_segment(&mut patch, &pts, 1.0);

        assert_eq!(patch[0].position, [0.0, 0.0]);
        assert_eq!(patch[3].position, [9.0, 0.0]);
        assert_eq!(patch[4].position, [PATCH_SEGMENT, 1.0]);
    }
}
