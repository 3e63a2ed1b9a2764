use anyhow::{Context, Result};

use super::{GpuFrame, GpuInit};

/// Owns wgpu core objects and an offscreen color target.
///
/// No window or surface is involved: frames render into a texture that stays
/// on the GPU.
pub struct Gpu {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    target: wgpu::Texture,
    format: wgpu::TextureFormat,
    size: (u32, u32),
}

impl Gpu {
    /// Creates a device and an offscreen target of `init.width` x `init.height`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new_headless(init: GpuInit) -> Result<Self> {
        let GpuInit {
            width,
            height,
            format,
            required_features,
            required_limits,
            power_preference,
            force_fallback_adapter,
        } = init;
        anyhow::ensure!(width > 0 && height > 0, "offscreen target has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tessera-engine device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let target = create_target(&device, format, width, height);

        let info = adapter.get_info();
        log::info!(
            "gpu: {} ({:?}, {:?}), target {width}x{height} {format:?}",
            info.name,
            info.backend,
            info.device_type
        );

        Ok(Self {
            adapter,
            device,
            queue,
            target,
            format,
            size: (width, height),
        })
    }

    /// Blocking variant of [`new_headless`](Self::new_headless) for hosts without an executor.
    pub fn new_headless_blocking(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new_headless(init))
    }

    /// Returns the offscreen target format.
    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Returns the offscreen target size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Recreates the offscreen target. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == self.size {
            return;
        }
        self.target = create_target(&self.device, self.format, width, height);
        self.size = (width, height);
    }

    /// Creates an encoder and a view of the offscreen target.
    pub fn begin_frame(&self) -> GpuFrame {
        let view = self
            .target
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tessera frame encoder"),
            });
        GpuFrame { view, encoder }
    }

    /// Submits the recorded commands for the given frame.
    pub fn submit(&self, frame: GpuFrame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
    }
}

fn create_target(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("tessera offscreen target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}
