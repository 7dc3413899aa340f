use std::marker::PhantomData;
use std::ops::Range;

/// A helper struct for a [`wgpu::Buffer`].
pub struct Buffer<T> {
    pub raw: wgpu::Buffer,

    label: &'static str,
    size: u64,
    usage: wgpu::BufferUsages,
    type_: PhantomData<T>,
}

impl<T: bytemuck::Pod> Buffer<T> {
    pub fn new(
        device: &wgpu::Device,
        label: &'static str,
        amount: usize,
        usage: wgpu::BufferUsages,
    ) -> Self {
        let size = next_copy_size::<T>(amount);

        let raw = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        });

        Self {
            label,
            size,
            usage,
            raw,
            type_: PhantomData,
        }
    }

    /// The number of elements of `T` that fit in the allocated buffer.
    ///
    /// May be greater than the `amount` the buffer was created with because
    /// of copy-alignment rounding.
    pub fn capacity(&self) -> usize {
        (self.size as usize) / std::mem::size_of::<T>()
    }

    /// Returns the size of the written bytes.
    pub fn write(&self, queue: &wgpu::Queue, offset: usize, contents: &[T]) -> usize {
        let offset = offset as u64 * std::mem::size_of::<T>() as u64;

        let bytes: &[u8] = bytemuck::cast_slice(contents);
        queue.write_buffer(&self.raw, offset, bytes);

        bytes.len()
    }

    pub fn slice(&self, range: Range<usize>) -> wgpu::BufferSlice<'_> {
        self.raw.slice(
            range.start as u64 * std::mem::size_of::<T>() as u64
                ..range.end as u64 * std::mem::size_of::<T>() as u64,
        )
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn usage(&self) -> wgpu::BufferUsages {
        self.usage
    }
}

pub fn next_copy_size<T>(amount: usize) -> u64 {
    let align_mask = wgpu::COPY_BUFFER_ALIGNMENT - 1;

    (((std::mem::size_of::<T>() * amount).next_power_of_two() as u64 + align_mask) & !align_mask)
        .max(wgpu::COPY_BUFFER_ALIGNMENT)
}
