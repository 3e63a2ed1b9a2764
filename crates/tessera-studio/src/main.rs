//! Headless host: rebuilds a synthetic world every frame, aggregates it into
//! draw lists and replays them through wgpu (or a counting backend when no
//! adapter is available).
//!
//! Usage: `tessera-studio [FRAMES]`

mod scene;
mod textures;

use anyhow::{Context, Result};
use tessera_engine::device::{Gpu, GpuInit};
use tessera_engine::draw::{DrawLists, DrawListsConfig};
use tessera_engine::logging::{LoggingConfig, init_logging};
use tessera_engine::render::{RenderCtx, RenderTarget, WorldRenderer};
use tessera_engine::replay::{CountingBackend, FrameStats, RenderPlan, ReplayConfig, Replayer};
use tessera_engine::vertex::{VertexStore, VertexStoreConfig};

use scene::Scene;

const DEFAULT_FRAMES: u64 = 120;
/// Frames between simulated level changes, which tear all lists down.
const LEVEL_LENGTH: u64 = 50;

/// Everything that lives across frames apart from the backend.
struct World {
    scene: Scene,
    store: VertexStore,
    lists: DrawLists,
    plan: RenderPlan,
    replayer: Replayer,
}

impl World {
    fn new() -> Self {
        Self {
            scene: Scene::new(),
            store: VertexStore::new(VertexStoreConfig::default()),
            lists: DrawLists::new(DrawListsConfig::default()),
            plan: RenderPlan::standard(&ReplayConfig::default()),
            replayer: Replayer::new(),
        }
    }

    /// Traversal phase: start from empty storage and append the scene.
    fn traverse(&mut self, frame: u64) {
        if frame > 0 && frame % LEVEL_LENGTH == 0 {
            log::info!("frame {frame}: level change, releasing draw lists");
            self.lists.clear();
        }
        self.store.truncate();
        self.lists.reset();
        let built = self.scene.build(frame, &mut self.store, &mut self.lists);
        log::debug!(
            "frame {frame}: built {} primitives over {} vertices",
            built.primitives,
            built.vertices
        );
    }

    fn report(&self, frame: u64, stats: &FrameStats) {
        if frame % 10 == 0 {
            let lists = self.lists.stats();
            log::info!(
                "frame {frame}: {stats} | {} lists ({} non-empty), arena {}/{} bytes",
                lists.lists,
                lists.non_empty,
                lists.arena_bytes_used,
                lists.arena_bytes_reserved
            );
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let frames = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("frame count must be a positive integer, got {arg:?}"))?,
        None => DEFAULT_FRAMES,
    };

    let mut world = World::new();
    match Gpu::new_headless_blocking(GpuInit::default()) {
        Ok(gpu) => run_gpu(&gpu, &mut world, frames)?,
        Err(err) => {
            log::warn!("no GPU available ({err:#}); replaying through the counting backend");
            run_counting(&mut world, frames);
        }
    }

    log::info!("replayed {} frames", world.replayer.frames());
    Ok(())
}

fn run_gpu(gpu: &Gpu, world: &mut World, frames: u64) -> Result<()> {
    let ctx = RenderCtx::for_gpu(gpu);
    let mut renderer = WorldRenderer::new();
    textures::register_all(&mut renderer, &ctx).context("failed to upload scene textures")?;
    renderer.set_view_proj(world.scene.view_proj());
    renderer.set_clear_color(Some(wgpu::Color {
        r: 0.02,
        g: 0.02,
        b: 0.04,
        a: 1.0,
    }));

    for frame in 0..frames {
        world.traverse(frame);

        let mut gpu_frame = gpu.begin_frame();
        let stats = world
            .replayer
            .render_plan(&world.lists, &world.store, &world.plan, &mut renderer);
        let flushed = {
            let mut target = RenderTarget::for_frame(&mut gpu_frame);
            renderer.flush(&ctx, &mut target, &world.store)
        };
        gpu.submit(gpu_frame);

        log::debug!(
            "frame {frame}: {} draw calls, {} pipeline switches, {} texture switches",
            flushed.draw_calls,
            flushed.pipeline_switches,
            flushed.texture_switches
        );
        world.report(frame, &stats);
    }
    Ok(())
}

fn run_counting(world: &mut World, frames: u64) {
    let mut backend = CountingBackend::new();
    for frame in 0..frames {
        world.traverse(frame);
        backend.clear();
        let stats = world
            .replayer
            .render_plan(&world.lists, &world.store, &world.plan, &mut backend);
        log::debug!(
            "frame {frame}: {} draws, {} triangle indices",
            backend.draw_count(),
            backend.triangle_indices()
        );
        world.report(frame, &stats);
    }
}
