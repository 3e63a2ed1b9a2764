/// One frame's encoder plus the offscreen view it renders into.
///
/// Finalize with [`Gpu::submit`](super::Gpu::submit).
pub struct GpuFrame {
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
