use std::f32::consts::PI;

use smallvec::SmallVec;

use lyon::path::PathEvent;
use strokevg_core::math::Point;

use crate::chunk::{ChunkAllocator, VertexChunks};
use crate::geometry;
use crate::patch::{self, PATCH_ESTIMATE_INFLATION, PATCH_VERTEX_COUNT};
use crate::path::Path;
use crate::stroke::{LineCap, LineJoin, Stroke};
use crate::target::PatchTarget;

/// Maximum linearization error tolerated on the outer stroke edge, in
/// device-space pixels.
const LINEARIZATION_TOLERANCE: f32 = 0.25;

/// Tangent deviation below which a reduced curve's control direction is
/// treated as aligned with its chord.
const CUSP_EPSILON: f32 = 1e-2;

/// Expands stroked paths into tessellation patches for consumption by a
/// GPU expansion stage.
///
/// This is an RAII type: it locks the provided target for its entire
/// lifetime (enforced by the exclusive borrow) and reserves vertex space
/// for the estimated patch count up front. Call [`add_path`] for every
/// path in the batch, then drop the converter; dropping releases the
/// target by putting back whatever tail of the reservation went unwritten.
/// The chunk list then holds the patches, in emission order, ready to
/// upload and draw chunk by chunk.
///
/// [`add_path`]: Self::add_path
pub struct StrokePatchConverter<'a> {
    alloc: ChunkAllocator<'a>,
    max_expansion_segments: u32,

    // State for the path currently being converted.
    stroke_radius: f32,
    join_code: f32,
    miter_limit: f32,
    cap: LineCap,
    /// Turn one GPU-expanded segment may take at the current radius before
    /// linearization artifacts appear on the outer edge.
    segment_rotation: f32,
    /// Maximum tangent rotation a single patch may carry; anything sharper
    /// is subdivided here instead of on the GPU.
    max_patch_rotation: f32,

    // State for the contour currently being converted.
    has_previous_segment: bool,
    contour_start: Point,
    contour_first_control: Point,
    last_control: Point,
    current: Point,
}

impl<'a> StrokePatchConverter<'a> {
    /// `total_verb_count` is the combined verb count of every path that
    /// will be added; the up-front reservation is sized from it.
    pub fn new(
        target: &'a mut dyn PatchTarget,
        chunks: &'a mut VertexChunks,
        total_verb_count: usize,
    ) -> Self {
        let max_expansion_segments = target.max_expansion_segments();
        let alloc = ChunkAllocator::new(
            target,
            chunks,
            (total_verb_count * PATCH_ESTIMATE_INFLATION * PATCH_VERTEX_COUNT) as u32,
        );

        Self {
            alloc,
            max_expansion_segments,
            stroke_radius: 0.0,
            join_code: patch::PATCH_JOIN_MITER,
            miter_limit: 0.0,
            cap: LineCap::Butt,
            segment_rotation: PI,
            max_patch_rotation: PI,
            has_previous_segment: false,
            contour_start: Point::origin(),
            contour_first_control: Point::origin(),
            last_control: Point::origin(),
            current: Point::origin(),
        }
    }

    /// Converts one stroked path, appending its patches to the chunk list.
    pub fn add_path(&mut self, path: &Path, stroke: &Stroke) {
        log::trace!(
            "converting path with {} verbs, stroke width {}",
            path.verb_count(),
            stroke.width
        );

        self.begin_path(stroke);

        for event in path.raw.iter() {
            match event {
                PathEvent::Begin { at } => self.move_to(at),
                PathEvent::Line { to, .. } => self.line_to(to),
                PathEvent::Quadratic { ctrl, to, .. } => self.quadratic_to(ctrl, to),
                PathEvent::Cubic {
                    ctrl1, ctrl2, to, ..
                } => self.cubic_to(ctrl1, ctrl2, to),
                PathEvent::End { close: true, .. } => self.close(),
                PathEvent::End { close: false, .. } => self.write_caps(),
            }
        }
    }

    fn begin_path(&mut self, stroke: &Stroke) {
        debug_assert!(
            stroke.width > 0.0,
            "hairline and negative-width strokes are resolved by the caller"
        );
        let radius = stroke.width * 0.5;

        self.stroke_radius = radius;
        self.miter_limit = stroke.miter_limit;
        self.cap = stroke.line_cap;
        self.join_code = match stroke.line_join {
            LineJoin::Bevel => patch::PATCH_JOIN_BEVEL,
            LineJoin::Miter => patch::PATCH_JOIN_MITER,
            LineJoin::Round => patch::PATCH_JOIN_ROUND,
        };

        // Curvature on the original curve is magnified on the outer edge of
        // the stroke in proportion to the radius. One expanded segment of
        // turn theta sags r * (1 - cos(theta / 2)) from the true arc; hold
        // that under LINEARIZATION_TOLERANCE and give each patch as many
        // such segments as the expansion stage can emit.
        let cos_half_turn = 1.0 - LINEARIZATION_TOLERANCE / radius;
        self.segment_rotation = (2.0 * cos_half_turn.clamp(-1.0, 1.0).acos()).min(PI);
        self.max_patch_rotation =
            (self.segment_rotation * self.max_expansion_segments as f32).min(PI);

        self.has_previous_segment = false;
    }

    fn move_to(&mut self, to: Point) {
        self.contour_start = to;
        self.current = to;
        self.has_previous_segment = false;
    }

    fn line_to(&mut self, to: Point) {
        self.line_to_with_join(self.join_code, to);
    }

    fn line_to_with_join(&mut self, join_code: f32, to: Point) {
        let from = self.current;
        if (to - from).square_length() <= geometry::NEARLY_ZERO * geometry::NEARLY_ZERO {
            return;
        }

        self.add_join(join_code, from, to);
        patch::write_segment(
            self.alloc.reserve_patch(),
            &patch::line_to_cubic(from, to),
            1.0,
        );

        self.last_control = from;
        self.current = to;
        self.has_previous_segment = true;
    }

    fn quadratic_to(&mut self, ctrl: Point, to: Point) {
        let pts = [self.current, ctrl, to];
        if geometry::is_nearly_linear(&pts) {
            self.reduce_to_line(&pts);
            return;
        }

        let mut sections: SmallVec<[[Point; 3]; 2]> = SmallVec::new();
        let t = geometry::find_quad_max_curvature(&pts);
        if t > 0.0 && t < 1.0 {
            let (head, tail) = geometry::chop_quad_at(&pts, t);
            sections.push(head);
            sections.push(tail);
        } else {
            sections.push(pts);
        }

        let total: f32 = sections.iter().map(|s| section_rotation(s)).sum();
        if total <= self.max_patch_rotation {
            self.emit_quad(self.join_code, &pts, 0.0);
            return;
        }

        let mut join_code = self.join_code;
        for section in &sections {
            self.emit_quad_section(join_code, section);
            join_code = patch::PATCH_JOIN_ROUND;
        }
    }

    fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) {
        let pts = [self.current, ctrl1, ctrl2, to];
        if geometry::is_nearly_linear(&pts) {
            self.reduce_to_line(&pts);
            return;
        }

        // Chop at the curvature maxima so every section's end tangents
        // reflect its local sharpness; a near-cusp in the middle of a curve
        // is invisible to the end tangents of the whole.
        let mut roots = [0.0f32; 3];
        let count = geometry::find_cubic_max_curvature(&pts, &mut roots);

        let mut sections: SmallVec<[[Point; 4]; 4]> = SmallVec::new();
        let mut rest = pts;
        let mut prev_t = 0.0;
        for &t in roots[..count].iter().filter(|t| **t > 0.0 && **t < 1.0) {
            let local = (t - prev_t) / (1.0 - prev_t);
            if local <= 0.0 || local >= 1.0 {
                continue;
            }
            let (head, tail) = geometry::chop_cubic_at(&rest, local);
            sections.push(head);
            rest = tail;
            prev_t = t;
        }
        sections.push(rest);

        let total: f32 = sections.iter().map(|s| section_rotation(s)).sum();
        if total <= self.max_patch_rotation {
            self.emit_cubic(self.join_code, &pts, 0.0);
            return;
        }

        let mut join_code = self.join_code;
        for section in &sections {
            self.emit_cubic_section(join_code, section);
            join_code = patch::PATCH_JOIN_ROUND;
        }
    }

    fn close(&mut self) {
        if !self.has_previous_segment {
            return;
        }

        if (self.current - self.contour_start).square_length()
            > geometry::NEARLY_ZERO * geometry::NEARLY_ZERO
        {
            self.line_to_with_join(self.join_code, self.contour_start);
        }

        // Join the closing segment back to the contour's first control
        // point.
        self.write_join(
            self.join_code,
            self.contour_start,
            self.last_control,
            self.contour_first_control,
        );

        self.has_previous_segment = false;
    }

    /// Writes the start and end caps of an open contour. Butt caps have no
    /// geometry; round caps are 180-degree round joins; square caps project
    /// past the endpoint.
    fn write_caps(&mut self) {
        if !self.has_previous_segment {
            return;
        }

        match self.cap {
            LineCap::Butt => {}
            LineCap::Round => {
                self.write_join(
                    patch::PATCH_JOIN_ROUND,
                    self.contour_start,
                    self.contour_first_control,
                    self.contour_first_control,
                );
                self.write_join(
                    patch::PATCH_JOIN_ROUND,
                    self.current,
                    self.last_control,
                    self.last_control,
                );
            }
            LineCap::Square => {
                self.write_square_cap(self.contour_start, self.contour_first_control);
                self.write_square_cap(self.current, self.last_control);
            }
        }

        self.has_previous_segment = false;
    }

    /// Writes the join leading into a segment that leaves `anchor` towards
    /// `next_control`, or records the contour's first control point if
    /// there is no previous segment to join to.
    fn add_join(&mut self, join_code: f32, anchor: Point, next_control: Point) {
        if self.has_previous_segment {
            self.write_join(join_code, anchor, self.last_control, next_control);
        } else {
            self.contour_first_control = next_control;
        }
    }

    fn write_join(&mut self, code: f32, anchor: Point, prev_control: Point, next_control: Point) {
        // A zero-length side means there is no turn to render; emitting
        // would produce a degenerate patch.
        let Some(incoming) = geometry::unit_vector(anchor - prev_control) else {
            return;
        };
        let Some(outgoing) = geometry::unit_vector(next_control - anchor) else {
            return;
        };

        let extra = if code == patch::PATCH_JOIN_MITER {
            self.miter_limit
        } else {
            0.0
        };
        patch::write_join(
            self.alloc.reserve_patch(),
            code,
            anchor,
            incoming,
            outgoing,
            self.stroke_radius,
            extra,
        );
    }

    fn write_square_cap(&mut self, endpoint: Point, control: Point) {
        let Some(outward) = geometry::unit_vector(endpoint - control) else {
            return;
        };
        patch::write_square_cap(self.alloc.reserve_patch(), endpoint, outward, self.stroke_radius);
    }

    /// A curve whose control polygon collapses onto its chord is drawn as a
    /// line, but the joins at both ends must still follow the curve's true
    /// tangents.
    fn reduce_to_line(&mut self, pts: &[Point]) {
        let first = pts[0];
        let last = *pts.last().unwrap();

        let Some(lead) = geometry::leading_tangent(pts) else {
            // Every point coincides; nothing to draw.
            return;
        };
        let trail = geometry::trailing_tangent(pts).unwrap_or(lead);

        self.add_join(self.join_code, first, first + lead);

        if let Some(chord_dir) = geometry::unit_vector(last - first) {
            // Control points that run backwards along the chord put cusps
            // on the line itself; round joins cover the turn-arounds.
            if geometry::rotation_between(lead, chord_dir) > CUSP_EPSILON {
                self.write_join(
                    patch::PATCH_JOIN_ROUND,
                    first,
                    first - lead,
                    first + chord_dir,
                );
            }

            patch::write_segment(
                self.alloc.reserve_patch(),
                &patch::line_to_cubic(first, last),
                1.0,
            );

            if geometry::rotation_between(chord_dir, trail) > CUSP_EPSILON {
                self.write_join(
                    patch::PATCH_JOIN_ROUND,
                    last,
                    last - chord_dir,
                    last + trail,
                );
            }
        }

        self.rotate_to(last - trail);
        self.current = last;
        self.has_previous_segment = true;
    }

    /// Rotates the tracked control point without changing the current
    /// position and without emitting geometry, keeping the next join
    /// continuous after a curve was reduced to a line.
    fn rotate_to(&mut self, control: Point) {
        self.last_control = control;
    }

    /// Emits one curvature-bounded section, chopping it uniformly when its
    /// tangents rotate further than one patch may carry.
    fn emit_quad_section(&mut self, join_code: f32, pts: &[Point; 3]) {
        let rotation = section_rotation(pts);
        let pieces = self.piece_count(rotation);

        let mut join_code = join_code;
        let mut rest = *pts;
        for remaining in (2..=pieces).rev() {
            let (head, tail) = geometry::chop_quad_at(&rest, 1.0 / remaining as f32);
            let forced = self.forced_segment_count(section_rotation(&head));
            self.emit_quad(join_code, &head, forced);
            join_code = patch::PATCH_JOIN_ROUND;
            rest = tail;
        }
        let forced = self.forced_segment_count(section_rotation(&rest));
        self.emit_quad(join_code, &rest, forced);
    }

    fn emit_cubic_section(&mut self, join_code: f32, pts: &[Point; 4]) {
        let rotation = section_rotation(pts);
        let pieces = self.piece_count(rotation);

        let mut join_code = join_code;
        let mut rest = *pts;
        for remaining in (2..=pieces).rev() {
            let (head, tail) = geometry::chop_cubic_at(&rest, 1.0 / remaining as f32);
            let forced = self.forced_segment_count(section_rotation(&head));
            self.emit_cubic(join_code, &head, forced);
            join_code = patch::PATCH_JOIN_ROUND;
            rest = tail;
        }
        let forced = self.forced_segment_count(section_rotation(&rest));
        self.emit_cubic(join_code, &rest, forced);
    }

    fn emit_quad(&mut self, join_code: f32, pts: &[Point; 3], forced_segments: f32) {
        let Some(lead) = geometry::leading_tangent(pts) else {
            return;
        };
        let trail = geometry::trailing_tangent(pts).unwrap_or(lead);

        self.add_join(join_code, pts[0], pts[0] + lead);
        patch::write_segment(
            self.alloc.reserve_patch(),
            &patch::quad_to_cubic(pts),
            forced_segments,
        );

        self.current = pts[2];
        self.last_control = pts[2] - trail;
        self.has_previous_segment = true;
    }

    fn emit_cubic(&mut self, join_code: f32, pts: &[Point; 4], forced_segments: f32) {
        let Some(lead) = geometry::leading_tangent(pts) else {
            return;
        };
        let trail = geometry::trailing_tangent(pts).unwrap_or(lead);

        self.add_join(join_code, pts[0], pts[0] + lead);
        patch::write_segment(self.alloc.reserve_patch(), pts, forced_segments);

        self.current = pts[3];
        self.last_control = pts[3] - trail;
        self.has_previous_segment = true;
    }

    fn piece_count(&self, rotation: f32) -> usize {
        if rotation > self.max_patch_rotation {
            (rotation / self.max_patch_rotation).ceil() as usize
        } else {
            1
        }
    }

    /// Segment count to force on a patch whose rotation is already known,
    /// so the expansion stage skips its own curvature analysis. Never
    /// exceeds the hardware cap.
    fn forced_segment_count(&self, rotation: f32) -> f32 {
        (rotation / self.segment_rotation)
            .ceil()
            .max(1.0)
            .min(self.max_expansion_segments as f32)
    }
}

fn section_rotation(pts: &[Point]) -> f32 {
    match (
        geometry::leading_tangent(pts),
        geometry::trailing_tangent(pts),
    ) {
        (Some(lead), Some(trail)) => geometry::rotation_between(lead, trail),
        _ => 0.0,
    }
}
