//! Expands stroked vector paths into fixed-size vertex patches for a GPU
//! expansion stage, writing them into pre-reserved chunks of a shared
//! vertex-buffer target.

pub mod chunk;
pub mod geometry;
pub mod patch;
pub mod path;
pub mod pool;
pub mod stroke;
pub mod target;

mod converter;

pub use chunk::{VertexChunk, VertexChunks};
pub use converter::StrokePatchConverter;
pub use path::{Path, PathBuilder};
pub use pool::GpuVertexPool;
pub use stroke::{LineCap, LineJoin, Stroke};
pub use target::{BufferId, PatchTarget, VertexAllocation};

pub use strokevg_core::*;
