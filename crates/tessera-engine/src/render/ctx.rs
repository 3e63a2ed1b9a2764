use crate::device::{Gpu, GpuFrame};

/// Device handles a [`WorldRenderer`](super::WorldRenderer) needs to create
/// and upload GPU resources.
///
/// `target_format` must match the view later passed in [`RenderTarget`];
/// pipelines are built against it.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub target_format: wgpu::TextureFormat,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            device,
            queue,
            target_format,
        }
    }

    /// Context for rendering into `gpu`'s offscreen target.
    #[inline]
    pub fn for_gpu(gpu: &'a Gpu) -> Self {
        Self::new(gpu.device(), gpu.queue(), gpu.target_format())
    }
}

/// Where a flush records its render pass: the frame's encoder and color view.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, color_view: &'a wgpu::TextureView) -> Self {
        Self { encoder, color_view }
    }

    /// Borrows the encoder and view of a frame begun with [`Gpu::begin_frame`].
    #[inline]
    pub fn for_frame(frame: &'a mut GpuFrame) -> Self {
        Self::new(&mut frame.encoder, &frame.view)
    }
}
