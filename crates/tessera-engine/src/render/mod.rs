//! wgpu rendering of replayed draw lists.
//!
//! [`WorldRenderer`] is a [`ReplayBackend`](crate::replay::ReplayBackend):
//! replay records draws, [`WorldRenderer::flush`] submits them. It owns its
//! GPU resources (pipelines, buffers, textures) and creates them lazily.

mod common;
mod ctx;
mod world;

pub use ctx::{RenderCtx, RenderTarget};
pub use world::{FlushStats, WorldRenderer};
