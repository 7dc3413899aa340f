use strokevg::chunk::VertexChunks;
use strokevg::geometry;
use strokevg::math::{point, Point};
use strokevg::patch::{
    PATCH_CAP_SQUARE, PATCH_JOIN_MITER, PATCH_JOIN_ROUND, PATCH_SEGMENT, PATCH_VERTEX_COUNT,
};
use strokevg::{
    BufferId, LineCap, LineJoin, Path, PatchTarget, Stroke, StrokePatchConverter, VertexAllocation,
};

/// A CPU-side target that grants exactly what is asked for and records
/// every call.
#[derive(Default)]
struct RecordingTarget {
    reserves: Vec<u32>,
    put_backs: Vec<u32>,
    max_segments: u32,
}

impl RecordingTarget {
    fn new(max_segments: u32) -> Self {
        Self {
            max_segments,
            ..Default::default()
        }
    }
}

impl PatchTarget for RecordingTarget {
    fn reserve_vertices(&mut self, count: u32) -> VertexAllocation {
        self.reserves.push(count);
        VertexAllocation {
            buffer: BufferId(self.reserves.len() - 1),
            base_vertex: 0,
            vertex_capacity: count,
        }
    }

    fn put_back_vertices(&mut self, count: u32) {
        self.put_backs.push(count);
    }

    fn max_expansion_segments(&self) -> u32 {
        self.max_segments
    }
}

fn convert(path: &Path, stroke: &Stroke, target: &mut RecordingTarget) -> VertexChunks {
    let mut chunks = VertexChunks::new();
    let verb_count = path.verb_count();
    {
        let mut converter = StrokePatchConverter::new(target, &mut chunks, verb_count);
        converter.add_path(path, stroke);
    }
    chunks
}

/// The `(code, extra)` metadata of every emitted patch, in emission order.
fn metadata(chunks: &VertexChunks) -> Vec<(f32, f32)> {
    chunks
        .iter()
        .flat_map(|chunk| {
            chunk.vertices[..chunk.vertex_count as usize].chunks_exact(PATCH_VERTEX_COUNT)
        })
        .map(|patch| (patch[4].position[0], patch[4].position[1]))
        .collect()
}

fn codes(chunks: &VertexChunks) -> Vec<f32> {
    metadata(chunks).iter().map(|(code, _)| *code).collect()
}

fn count_code(chunks: &VertexChunks, code: f32) -> usize {
    codes(chunks).iter().filter(|c| **c == code).count()
}

fn total_vertex_count(chunks: &VertexChunks) -> u32 {
    chunks.iter().map(|chunk| chunk.vertex_count).sum()
}

#[test]
fn closed_triangle_patch_counts() {
    let path = Path::builder()
        .move_to(point(0.0, 0.0))
        .line_to(point(100.0, 0.0))
        .line_to(point(50.0, 80.0))
        .close()
        .build();

    let mut target = RecordingTarget::new(8);
    let chunks = convert(&path, &Stroke::default(), &mut target);

    // Three bodies, a join at each of the two interior boundaries, and
    // exactly one closing join. No caps on a closed contour.
    assert_eq!(count_code(&chunks, PATCH_SEGMENT), 3);
    assert_eq!(count_code(&chunks, PATCH_JOIN_MITER), 3);
    assert_eq!(codes(&chunks).len(), 6);

    // Miter joins carry the miter limit in the metadata slot.
    for (code, extra) in metadata(&chunks) {
        if code == PATCH_JOIN_MITER {
            assert_eq!(extra, 4.0);
        }
    }

    assert_eq!(total_vertex_count(&chunks), 6 * PATCH_VERTEX_COUNT as u32);
    assert_eq!(target.put_backs.len(), 1);
}

#[test]
fn closed_rectangle_patch_counts() {
    let path = Path::rectangle(point(10.0, 10.0), strokevg::math::size(80.0, 40.0));

    let mut target = RecordingTarget::new(8);
    let chunks = convert(&path, &Stroke::default(), &mut target);

    // Four bodies (three explicit edges plus the closing edge), three
    // boundary joins, one closing join.
    assert_eq!(count_code(&chunks, PATCH_SEGMENT), 4);
    assert_eq!(count_code(&chunks, PATCH_JOIN_MITER), 4);
    assert_eq!(codes(&chunks).len(), 8);
}

#[test]
fn explicit_line_back_to_start_then_close() {
    // Drawing the closing edge by hand must not double it up.
    let path = Path::builder()
        .move_to(point(0.0, 0.0))
        .line_to(point(100.0, 0.0))
        .line_to(point(100.0, 100.0))
        .line_to(point(0.0, 0.0))
        .close()
        .build();

    let mut target = RecordingTarget::new(8);
    let chunks = convert(&path, &Stroke::default(), &mut target);

    assert_eq!(count_code(&chunks, PATCH_SEGMENT), 3);
    assert_eq!(count_code(&chunks, PATCH_JOIN_MITER), 3);
}

#[test]
fn open_contour_cap_styles() {
    let path = Path::builder()
        .move_to(point(0.0, 0.0))
        .line_to(point(50.0, 0.0))
        .line_to(point(50.0, 50.0))
        .build();

    for (cap, expected_round, expected_square) in [
        (LineCap::Butt, 0, 0),
        (LineCap::Round, 2, 0),
        (LineCap::Square, 0, 2),
    ] {
        let stroke = Stroke {
            line_cap: cap,
            ..Stroke::default()
        };
        let mut target = RecordingTarget::new(8);
        let chunks = convert(&path, &stroke, &mut target);

        assert_eq!(count_code(&chunks, PATCH_SEGMENT), 2, "{cap:?}");
        assert_eq!(count_code(&chunks, PATCH_JOIN_MITER), 1, "{cap:?}");
        assert_eq!(count_code(&chunks, PATCH_JOIN_ROUND), expected_round, "{cap:?}");
        assert_eq!(count_code(&chunks, PATCH_CAP_SQUARE), expected_square, "{cap:?}");
    }
}

#[test]
fn single_point_contour_emits_nothing() {
    let path = Path::builder().move_to(point(5.0, 5.0)).build();

    let stroke = Stroke {
        line_cap: LineCap::Round,
        ..Stroke::default()
    };
    let mut target = RecordingTarget::new(8);
    let chunks = convert(&path, &stroke, &mut target);

    assert!(codes(&chunks).is_empty());
}

#[test]
fn zero_length_line_emits_nothing() {
    let path = Path::builder()
        .move_to(point(0.0, 0.0))
        .line_to(point(0.0, 0.0))
        .line_to(point(10.0, 0.0))
        .build();

    let mut target = RecordingTarget::new(8);
    let chunks = convert(&path, &Stroke::default(), &mut target);

    // The degenerate first line vanishes, so the real line is the first
    // segment of the contour and gets no leading join.
    assert_eq!(codes(&chunks), vec![PATCH_SEGMENT]);
}

#[test]
fn gentle_cubic_emits_one_adaptive_patch() {
    let path = Path::builder()
        .move_to(point(0.0, 0.0))
        .bezier_curve_to(point(30.0, 10.0), point(70.0, 10.0), point(100.0, 0.0))
        .build();

    let stroke = Stroke {
        width: 50.0,
        ..Stroke::default()
    };
    let mut target = RecordingTarget::new(8);
    let chunks = convert(&path, &stroke, &mut target);

    let meta = metadata(&chunks);
    assert_eq!(meta, vec![(PATCH_SEGMENT, 0.0)]);
}

#[test]
fn sharp_cubic_subdivides_with_round_joins() {
    let curve = [
        point(0.0, 0.0),
        point(25.0, 60.0),
        point(75.0, 60.0),
        point(100.0, 0.0),
    ];
    let path = Path::builder()
        .move_to(curve[0])
        .bezier_curve_to(curve[1], curve[2], curve[3])
        .build();

    // A wide stroke tightens the tolerance enough that this curve's turn
    // no longer fits in one patch.
    let stroke = Stroke {
        width: 50.0,
        ..Stroke::default()
    };
    let mut target = RecordingTarget::new(8);
    let chunks = convert(&path, &stroke, &mut target);

    let meta = metadata(&chunks);
    let bodies: Vec<&(f32, f32)> = meta.iter().filter(|(c, _)| *c == PATCH_SEGMENT).collect();
    let round_joins = meta.iter().filter(|(c, _)| *c == PATCH_JOIN_ROUND).count();

    assert!(bodies.len() >= 2);
    assert_eq!(round_joins, bodies.len() - 1);
    // Subdivided bodies carry an explicit segment count within the
    // hardware cap.
    for (_, forced) in &bodies {
        assert!(*forced >= 1.0 && *forced <= 8.0);
    }

    // The max-curvature point must land on a patch boundary.
    let max_curvature = geometry::eval_cubic(&curve, 0.5);
    let on_boundary = chunks
        .iter()
        .flat_map(|chunk| {
            chunk.vertices[..chunk.vertex_count as usize].chunks_exact(PATCH_VERTEX_COUNT)
        })
        .filter(|patch| patch[4].position[0] == PATCH_SEGMENT)
        .any(|patch| {
            let first = Point::new(patch[0].position[0], patch[0].position[1]);
            let last = Point::new(patch[3].position[0], patch[3].position[1]);
            (first - max_curvature).length() < 1e-3 || (last - max_curvature).length() < 1e-3
        });
    assert!(on_boundary);
}

#[test]
fn gentle_quadratic_emits_one_adaptive_patch() {
    let path = Path::builder()
        .move_to(point(0.0, 0.0))
        .quadratic_curve_to(point(50.0, 20.0), point(100.0, 0.0))
        .build();

    let stroke = Stroke {
        width: 50.0,
        ..Stroke::default()
    };
    let mut target = RecordingTarget::new(8);
    let chunks = convert(&path, &stroke, &mut target);

    assert_eq!(metadata(&chunks), vec![(PATCH_SEGMENT, 0.0)]);
}

#[test]
fn collinear_cubic_matches_equivalent_line() {
    let stroke = Stroke::default();

    let curved = Path::builder()
        .move_to(point(0.0, 0.0))
        .bezier_curve_to(point(25.0, 0.0), point(75.0, 0.0), point(100.0, 0.0))
        .line_to(point(150.0, 100.0))
        .build();
    let lined = Path::builder()
        .move_to(point(0.0, 0.0))
        .line_to(point(100.0, 0.0))
        .line_to(point(150.0, 100.0))
        .build();

    let mut target_a = RecordingTarget::new(8);
    let mut target_b = RecordingTarget::new(8);
    let chunks_a = convert(&curved, &stroke, &mut target_a);
    let chunks_b = convert(&lined, &stroke, &mut target_b);

    assert_eq!(chunks_a.len(), 1);
    assert_eq!(chunks_b.len(), 1);
    assert_eq!(chunks_a[0].vertex_count, chunks_b[0].vertex_count);
    assert_eq!(chunks_a[0].vertices, chunks_b[0].vertices);
}

#[test]
fn chunk_overflow_grows_once_and_reconciles() {
    // Reserve for 2 verbs (2 * 3 = 6 patches of capacity), then emit a
    // contour needing 7 patches: 4 bodies and 3 joins.
    let path = Path::builder()
        .move_to(point(0.0, 0.0))
        .line_to(point(10.0, 0.0))
        .line_to(point(20.0, 10.0))
        .line_to(point(30.0, 10.0))
        .line_to(point(40.0, 20.0))
        .build();

    let mut target = RecordingTarget::new(8);
    let mut chunks = VertexChunks::new();
    {
        let mut converter = StrokePatchConverter::new(&mut target, &mut chunks, 2);
        converter.add_path(&path, &Stroke::default());
    }

    let patch_vertices = PATCH_VERTEX_COUNT as u32;
    assert_eq!(target.reserves, vec![6 * patch_vertices, 6 * patch_vertices]);
    assert_eq!(chunks.len(), 2);

    // The first chunk filled completely and was finalized; the rest
    // spilled into the growth chunk.
    assert_eq!(chunks[0].vertex_count, 6 * patch_vertices);
    assert_eq!(chunks[1].vertex_count, patch_vertices);
    assert_eq!(total_vertex_count(&chunks), 7 * patch_vertices);
    assert_eq!(chunks[0].buffer, BufferId(0));
    assert_eq!(chunks[1].buffer, BufferId(1));

    // Teardown put back the growth chunk's unwritten tail exactly once.
    assert_eq!(target.put_backs, vec![5 * patch_vertices]);

    // Patches arrive in strict traversal order.
    assert_eq!(
        codes(&chunks),
        vec![
            PATCH_SEGMENT,
            PATCH_JOIN_MITER,
            PATCH_SEGMENT,
            PATCH_JOIN_MITER,
            PATCH_SEGMENT,
            PATCH_JOIN_MITER,
            PATCH_SEGMENT,
        ]
    );
}

#[test]
fn teardown_without_paths_returns_whole_reservation() {
    let mut target = RecordingTarget::new(8);
    let mut chunks = VertexChunks::new();
    {
        let _converter = StrokePatchConverter::new(&mut target, &mut chunks, 2);
    }

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].vertex_count, 0);
    assert_eq!(target.put_backs, vec![6 * PATCH_VERTEX_COUNT as u32]);
}

#[test]
fn round_join_patches_are_radius_scaled() {
    let path = Path::builder()
        .move_to(point(0.0, 0.0))
        .line_to(point(100.0, 0.0))
        .line_to(point(100.0, 100.0))
        .build();

    let stroke = Stroke {
        width: 20.0,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    let mut target = RecordingTarget::new(8);
    let chunks = convert(&path, &stroke, &mut target);

    let join = chunks
        .iter()
        .flat_map(|chunk| {
            chunk.vertices[..chunk.vertex_count as usize].chunks_exact(PATCH_VERTEX_COUNT)
        })
        .find(|patch| patch[4].position[0] == PATCH_JOIN_ROUND)
        .expect("a round join patch");

    // Anchor at the corner, tangent points one radius along the incoming
    // and outgoing directions.
    assert_eq!(join[0].position, [100.0, 0.0]);
    assert_eq!(join[1].position, [110.0, 0.0]);
    assert_eq!(join[2].position, [100.0, 10.0]);
    assert_eq!(join[3].position, [100.0, 0.0]);
}
