//! Headless GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - owning an offscreen color target
//! - providing per-frame encoders/views for rendering

mod frame;
mod gpu;
mod init;

pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
