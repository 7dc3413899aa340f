//! Vertex chunks and the allocator that fills them.

use smallvec::SmallVec;

use crate::patch::{Patch, PatchVertex, PATCH_VERTEX_COUNT};
use crate::target::{BufferId, PatchTarget};

/// A contiguous run of patches in a single vertex buffer.
///
/// Chunks are append-only output: once a chunk is superseded by the next
/// one, its fields never change again. The chunk list outlives the
/// conversion pass and is consumed by the downstream draw step, in order.
#[derive(Debug)]
pub struct VertexChunk {
    /// The buffer this chunk's vertices belong in.
    pub buffer: BufferId,
    /// Offset of the chunk within the buffer, in vertices.
    pub base_vertex: u32,
    /// Vertices actually published to this chunk. Finalized when the chunk
    /// is superseded, or by teardown for the last chunk.
    pub vertex_count: u32,
    /// Staged vertex data, uploaded at `base_vertex` by the target's owner
    /// once conversion is done.
    pub vertices: Vec<PatchVertex>,
}

/// Normally there will only be one chunk, but the first can run out of
/// space if too many curves needed to be subdivided.
pub type VertexChunks = SmallVec<[VertexChunk; 1]>;

/// Doles out one patch slot at a time from pre-reserved target memory,
/// growing into a fresh chunk when the reservation runs out.
///
/// Dropping the allocator releases the target: the last chunk's count is
/// finalized and the unwritten tail of its reservation is put back.
pub(crate) struct ChunkAllocator<'a> {
    target: &'a mut dyn PatchTarget,
    chunks: &'a mut VertexChunks,

    curr_capacity: u32,
    min_alloc_count: u32,
}

impl<'a> ChunkAllocator<'a> {
    pub fn new(
        target: &'a mut dyn PatchTarget,
        chunks: &'a mut VertexChunks,
        min_vertex_alloc_count: u32,
    ) -> Self {
        let mut allocator = Self {
            target,
            chunks,
            curr_capacity: 0,
            min_alloc_count: min_vertex_alloc_count.max(PATCH_VERTEX_COUNT as u32),
        };
        allocator.alloc_chunk();
        allocator
    }

    fn alloc_chunk(&mut self) {
        let alloc = self.target.reserve_vertices(self.min_alloc_count);
        debug_assert!(alloc.vertex_capacity >= self.min_alloc_count);

        self.curr_capacity = alloc.vertex_capacity;
        self.chunks.push(VertexChunk {
            buffer: alloc.buffer,
            base_vertex: alloc.base_vertex,
            vertex_count: 0,
            vertices: Vec::with_capacity(alloc.vertex_capacity as usize),
        });
    }

    /// Returns a writable slot for exactly one patch.
    pub fn reserve_patch(&mut self) -> &mut Patch {
        let exhausted = {
            let chunk = self.chunks.last().unwrap();
            chunk.vertices.len() + PATCH_VERTEX_COUNT > self.curr_capacity as usize
        };

        if exhausted {
            // The current chunk is full; finalize it and start another. Its
            // sub-patch tail (if any) stays stranded, since put-back only
            // applies to the newest reservation at teardown.
            let chunk = self.chunks.last_mut().unwrap();
            chunk.vertex_count = chunk.vertices.len() as u32;
            log::debug!(
                "vertex chunk exhausted at {} vertices; allocating another",
                self.curr_capacity
            );
            self.alloc_chunk();
        }

        let chunk = self.chunks.last_mut().unwrap();
        let start = chunk.vertices.len();
        chunk
            .vertices
            .resize(start + PATCH_VERTEX_COUNT, PatchVertex::default());
        (&mut chunk.vertices[start..]).try_into().unwrap()
    }
}

impl Drop for ChunkAllocator<'_> {
    fn drop(&mut self) {
        let chunk = self.chunks.last_mut().unwrap();
        chunk.vertex_count = chunk.vertices.len() as u32;

        let unused = self.curr_capacity - chunk.vertex_count;
        if unused > 0 {
            self.target.put_back_vertices(unused);
        }
    }
}
