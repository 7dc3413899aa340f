//! A wgpu-backed implementation of the vertex-buffer target.

use strokevg_core::buffer::Buffer;

use crate::chunk::VertexChunk;
use crate::patch::PatchVertex;
use crate::target::{BufferId, PatchTarget, VertexAllocation};

/// Default segment capability reported when the consuming expansion stage
/// doesn't say otherwise.
pub const DEFAULT_MAX_EXPANSION_SEGMENTS: u32 = 64;

/// Smallest block of patch vertices worth allocating a GPU buffer for.
const MIN_BLOCK_VERTEX_COUNT: usize = 4096;

/// A pool of GPU vertex buffers that hands out patch storage in blocks.
///
/// Reservations grant the whole tail of the current block, so callers
/// usually get more capacity than they asked for; the unused tail comes
/// back through [`PatchTarget::put_back_vertices`] and is granted to the
/// next reservation.
pub struct GpuVertexPool {
    device: wgpu::Device,
    buffers: Vec<Buffer<PatchVertex>>,
    /// Vertices handed out from the newest block.
    head: u32,
    max_expansion_segments: u32,
}

impl GpuVertexPool {
    pub fn new(device: wgpu::Device) -> Self {
        Self::with_max_expansion_segments(device, DEFAULT_MAX_EXPANSION_SEGMENTS)
    }

    /// `max_expansion_segments` is the per-patch segment capability of the
    /// expansion stage that will consume the patches.
    pub fn with_max_expansion_segments(device: wgpu::Device, max_expansion_segments: u32) -> Self {
        Self {
            device,
            buffers: Vec::new(),
            head: 0,
            max_expansion_segments,
        }
    }

    /// The underlying buffer for a chunk's [`BufferId`], for binding by the
    /// draw step.
    pub fn buffer(&self, id: BufferId) -> &wgpu::Buffer {
        &self.buffers[id.0].raw
    }

    /// Uploads the staged vertices of every chunk to its reserved buffer
    /// range.
    pub fn upload(&self, queue: &wgpu::Queue, chunks: &[VertexChunk]) {
        for chunk in chunks {
            let count = chunk.vertex_count as usize;
            if count == 0 {
                continue;
            }
            self.buffers[chunk.buffer.0].write(
                queue,
                chunk.base_vertex as usize,
                &chunk.vertices[..count],
            );
        }
    }
}

impl PatchTarget for GpuVertexPool {
    fn reserve_vertices(&mut self, count: u32) -> VertexAllocation {
        let free = self
            .buffers
            .last()
            .map(|buffer| buffer.capacity() as u32 - self.head)
            .unwrap_or(0);

        if free < count {
            let amount = (count as usize).max(MIN_BLOCK_VERTEX_COUNT);
            log::debug!("allocating a vertex pool block of {} vertices", amount);

            self.buffers.push(Buffer::new(
                &self.device,
                "strokevg vertex pool block",
                amount,
                wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            ));
            self.head = 0;
        }

        let buffer = BufferId(self.buffers.len() - 1);
        let base_vertex = self.head;
        let vertex_capacity = self.buffers.last().unwrap().capacity() as u32 - self.head;
        self.head += vertex_capacity;

        VertexAllocation {
            buffer,
            base_vertex,
            vertex_capacity,
        }
    }

    fn put_back_vertices(&mut self, count: u32) {
        debug_assert!(count <= self.head);
        self.head -= count;
    }

    fn max_expansion_segments(&self) -> u32 {
        self.max_expansion_segments
    }
}
