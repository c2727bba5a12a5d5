//! Staging readback of the entity-ID target.
//!
//! [`EntityIdReadback`] is the seam between picking and the GPU: picking drives
//! the staging state machine through it, [`WgpuEntityIdReadback`] implements it
//! on top of a `MAP_READ` staging buffer.
//!
//! Rows in the staging buffer are padded to
//! [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`], so the row pitch is usually larger
//! than `width * 4`. Readers must walk rows by pitch, see [`unpack_rows`].

use toy_core::{Result, ToyError};

use crate::entity_id::EntityIdTarget;

/// Bytes per entity-ID texel.
pub const ID_BYTES_PER_PIXEL: u32 = 4;

/// Row pitch of a `width` texel wide copy, padded to the copy alignment.
#[inline]
#[must_use]
pub const fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * ID_BYTES_PER_PIXEL).div_ceil(align) * align
}

/// Copies `height` rows of `width` ids out of `src`, whose rows start every
/// `row_pitch` bytes, into the tightly packed `dst`.
pub fn unpack_rows(
    src: &[u8],
    row_pitch: usize,
    width: u32,
    height: u32,
    dst: &mut Vec<u32>,
) -> Result<()> {
    let row_bytes = (width * ID_BYTES_PER_PIXEL) as usize;
    if row_pitch < row_bytes {
        return Err(ToyError::ReadbackFailed(format!(
            "row pitch {row_pitch} is smaller than a {width} texel row"
        )));
    }
    let required = match height {
        0 => 0,
        h => row_pitch * (h as usize - 1) + row_bytes,
    };
    if src.len() < required {
        return Err(ToyError::ReadbackFailed(format!(
            "staging data holds {} bytes, {required} required for {width}x{height}",
            src.len()
        )));
    }

    dst.clear();
    dst.reserve(width as usize * height as usize);
    for y in 0..height as usize {
        let start = y * row_pitch;
        let row = &src[start..start + row_bytes];
        dst.extend(
            row.chunks_exact(ID_BYTES_PER_PIXEL as usize)
                .map(bytemuck::pod_read_unaligned::<u32>),
        );
    }
    Ok(())
}

/// GPU side of picking.
pub trait EntityIdReadback {
    /// Current dimensions of the entity-ID target.
    fn target_size(&self) -> (u32, u32);

    /// Releases the staging resource (if any) and allocates a new one of
    /// exactly `width` x `height` texels.
    fn recreate_staging(&mut self, width: u32, height: u32) -> Result<()>;

    /// Records and submits a copy of the whole target into the staging
    /// resource.
    fn copy_target_to_staging(&mut self) -> Result<()>;

    /// Maps the staging resource, blocking until the last copy has finished,
    /// and hands `read` the mapped bytes plus their row pitch.
    fn read_staging(&mut self, read: &mut dyn FnMut(&[u8], usize)) -> Result<()>;
}

struct StagingBuffer {
    buffer: wgpu::Buffer,
    bytes_per_row: u32,
    width: u32,
    height: u32,
}

impl StagingBuffer {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let bytes_per_row = padded_bytes_per_row(width);
        let size = u64::from(bytes_per_row) * u64::from(height);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Entity ID Staging"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            bytes_per_row,
            width,
            height,
        }
    }
}

/// wgpu implementation of [`EntityIdReadback`]. Owns the entity-ID target.
pub struct WgpuEntityIdReadback {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target: EntityIdTarget,
    staging: Option<StagingBuffer>,
    pending: Option<wgpu::SubmissionIndex>,
}

impl WgpuEntityIdReadback {
    #[must_use]
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, target: EntityIdTarget) -> Self {
        Self {
            device,
            queue,
            target,
            staging: None,
            pending: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> &EntityIdTarget {
        &self.target
    }

    /// Resizes the entity-ID target. The staging buffer is left alone; picking
    /// notices the size drift and reallocates it on its next update.
    pub fn resize_target(&mut self, width: u32, height: u32) {
        self.target.resize(&self.device, width, height);
    }

    fn staging(&self) -> Result<&StagingBuffer> {
        self.staging
            .as_ref()
            .ok_or_else(|| ToyError::ReadbackFailed("staging buffer not allocated".to_string()))
    }
}

impl EntityIdReadback for WgpuEntityIdReadback {
    fn target_size(&self) -> (u32, u32) {
        self.target.size()
    }

    fn recreate_staging(&mut self, width: u32, height: u32) -> Result<()> {
        if let Some(old) = self.staging.take() {
            old.buffer.destroy();
        }
        self.staging = Some(StagingBuffer::new(&self.device, width, height));
        self.pending = None;
        Ok(())
    }

    fn copy_target_to_staging(&mut self) -> Result<()> {
        let staging = self.staging()?;
        if (staging.width, staging.height) != self.target.size() {
            return Err(ToyError::ReadbackFailed(format!(
                "staging {}x{} does not match target {:?}",
                staging.width,
                staging.height,
                self.target.size()
            )));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Entity ID Readback Encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: self.target.texture(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(staging.bytes_per_row),
                    rows_per_image: Some(staging.height),
                },
            },
            wgpu::Extent3d {
                width: staging.width,
                height: staging.height,
                depth_or_array_layers: 1,
            },
        );

        let index = self.queue.submit(std::iter::once(encoder.finish()));
        self.pending = Some(index);
        Ok(())
    }

    fn read_staging(&mut self, read: &mut dyn FnMut(&[u8], usize)) -> Result<()> {
        let submission_index = self.pending.take();
        let staging = self.staging()?;
        let slice = staging.buffer.slice(..);

        let (tx, rx) = flume::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        self.device
            .poll(wgpu::PollType::Wait {
                submission_index,
                timeout: None,
            })
            .map_err(|e| ToyError::ReadbackFailed(e.to_string()))?;

        rx.recv()
            .map_err(|e| ToyError::ReadbackFailed(e.to_string()))?
            .map_err(|e| ToyError::ReadbackFailed(e.to_string()))?;

        {
            let view = slice.get_mapped_range();
            let bytes: &[u8] = &view;
            read(bytes, staging.bytes_per_row as usize);
        }
        staging.buffer.unmap();
        Ok(())
    }
}
