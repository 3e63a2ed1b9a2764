use rustc_hash::FxHashMap;

use crate::draw::{BlendMode, Primitive, TexUnitId, TextureHandle, WrapMode};
use crate::replay::{DrawMode, LightPath, ListState, ReplayBackend};
use crate::render::{RenderCtx, RenderTarget};
use crate::vertex::VertexStore;

use super::common::{
    blend_state, interleave, CameraUniform, DrawUniform, WorldVertex, DRAW_FLAG_DETAIL,
    DRAW_FLAG_LIGHT_UNIT,
};

const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Blend state plus color-write toggle; one pipeline each.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    blend: Option<BlendMode>,
    color_writes: bool,
}

/// Textures bound for one list: base, interpolation target, light.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct TextureSet {
    textures: [Option<TextureHandle>; 3],
    wrap: (WrapMode, WrapMode),
}

/// State captured by `bind_list`, applied to every draw until the next bind.
#[derive(Debug, Copy, Clone)]
struct BoundList {
    textures: TextureSet,
    inter: f32,
    detail: bool,
    light_unit: bool,
    color_writes: bool,
}

#[derive(Debug, Copy, Clone)]
struct RecordedDraw {
    pipeline: PipelineKey,
    textures: TextureSet,
    first_index: u32,
    index_count: u32,
    uniform_slot: u32,
}

/// Counters returned by [`WorldRenderer::flush`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub draw_calls: usize,
    pub pipeline_switches: usize,
    pub texture_switches: usize,
    pub vertices: usize,
    pub indices: usize,
}

/// wgpu replay backend for world geometry.
///
/// Replay only records: each primitive is triangulated into a shared index
/// stream and gets its own uniform slot. [`flush`](Self::flush) uploads the
/// vertex store, indices and uniforms, then issues one `draw_indexed` per
/// primitive inside a single render pass.
///
/// There is no depth buffer; draws land in plan order.
#[derive(Default)]
pub struct WorldRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipelines: FxHashMap<PipelineKey, wgpu::RenderPipeline>,
    shader: Option<wgpu::ShaderModule>,
    pipeline_layout: Option<wgpu::PipelineLayout>,

    camera_bgl: Option<wgpu::BindGroupLayout>,
    draw_bgl: Option<wgpu::BindGroupLayout>,
    texture_bgl: Option<wgpu::BindGroupLayout>,

    camera_ubo: Option<wgpu::Buffer>,
    camera_bind_group: Option<wgpu::BindGroup>,

    draw_ubo: Option<wgpu::Buffer>,
    draw_bind_group: Option<wgpu::BindGroup>,
    draw_capacity: usize,
    uniform_stride: u64,

    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize,
    ibo: Option<wgpu::Buffer>,
    ibo_capacity: usize,

    textures: FxHashMap<TextureHandle, wgpu::TextureView>,
    white: Option<wgpu::TextureView>,
    samplers: FxHashMap<(WrapMode, WrapMode), wgpu::Sampler>,
    texture_bind_groups: FxHashMap<TextureSet, wgpu::BindGroup>,

    view_proj: Option<[[f32; 4]; 4]>,
    clear_color: Option<wgpu::Color>,

    // Recorded during replay, consumed by `flush`.
    bound: Option<BoundList>,
    blend: Option<BlendMode>,
    light_path: Option<LightPath>,
    draws: Vec<RecordedDraw>,
    indices: Vec<u32>,
    uniforms: Vec<DrawUniform>,
    vertices: Vec<WorldVertex>,
    staging: Vec<u8>,

    warned_missing_texture: bool,
    warned_no_bind: bool,
}

impl WorldRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_view_proj(&mut self, view_proj: [[f32; 4]; 4]) {
        self.view_proj = Some(view_proj);
    }

    /// Clears the target before drawing when set; otherwise its contents are kept.
    pub fn set_clear_color(&mut self, color: Option<wgpu::Color>) {
        self.clear_color = color;
    }

    /// Uploads an RGBA8 image for `handle`, replacing any previous one.
    pub fn register_texture(
        &mut self,
        ctx: &RenderCtx<'_>,
        handle: TextureHandle,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> anyhow::Result<()> {
        let expected = width as usize * height as usize * 4;
        anyhow::ensure!(width > 0 && height > 0, "texture {} has zero size", handle.0);
        anyhow::ensure!(
            rgba.len() == expected,
            "texture {}: expected {expected} bytes for {width}x{height}, got {}",
            handle.0,
            rgba.len()
        );

        let view = create_rgba_texture(ctx, "tessera world texture", width, height, rgba);
        self.textures.insert(handle, view);
        self.texture_bind_groups
            .retain(|set, _| !set.textures.contains(&Some(handle)));
        log::debug!("registered texture {} ({width}x{height})", handle.0);
        Ok(())
    }

    #[inline]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Draws recorded since the last flush.
    #[inline]
    pub fn pending_draws(&self) -> usize {
        self.draws.len()
    }

    /// Uploads recorded geometry and draws it into `target`.
    ///
    /// `store` must be the vertex store the recorded primitives index into.
    pub fn flush(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        store: &VertexStore,
    ) -> FlushStats {
        if self.draws.is_empty() && self.clear_color.is_none() {
            self.reset_recording();
            return FlushStats::default();
        }

        self.ensure_layouts(ctx);
        self.ensure_pipelines(ctx);
        self.ensure_camera(ctx);
        self.ensure_texture_bind_groups(ctx);

        interleave(store, &mut self.vertices);
        self.upload_geometry(ctx);
        self.upload_uniforms(ctx);

        let stats = self.encode(target);
        log::trace!(
            "world flush: {} draws, {} pipeline switches, {} texture switches",
            stats.draw_calls,
            stats.pipeline_switches,
            stats.texture_switches
        );
        self.reset_recording();
        stats
    }

    fn encode(&self, target: &mut RenderTarget<'_>) -> FlushStats {
        let mut stats = FlushStats {
            vertices: self.vertices.len(),
            indices: self.indices.len(),
            ..FlushStats::default()
        };

        let load = match self.clear_color {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        };
        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tessera world pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if self.draws.is_empty() {
            return stats;
        }

        let (Some(camera_bg), Some(draw_bg), Some(vbo), Some(ibo)) = (
            self.camera_bind_group.as_ref(),
            self.draw_bind_group.as_ref(),
            self.vbo.as_ref(),
            self.ibo.as_ref(),
        ) else {
            return stats;
        };

        rpass.set_bind_group(0, camera_bg, &[]);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);

        let stride = self.uniform_stride;
        let mut pipeline_key = None;
        let mut texture_key = None;

        for draw in &self.draws {
            if pipeline_key != Some(draw.pipeline) {
                let Some(pipeline) = self.pipelines.get(&draw.pipeline) else { continue };
                rpass.set_pipeline(pipeline);
                pipeline_key = Some(draw.pipeline);
                stats.pipeline_switches += 1;
            }
            if texture_key != Some(draw.textures) {
                let Some(bg) = self.texture_bind_groups.get(&draw.textures) else { continue };
                rpass.set_bind_group(2, bg, &[]);
                texture_key = Some(draw.textures);
                stats.texture_switches += 1;
            }

            let offset = (draw.uniform_slot as u64 * stride) as u32;
            rpass.set_bind_group(1, draw_bg, &[offset]);
            rpass.draw_indexed(draw.first_index..draw.first_index + draw.index_count, 0, 0..1);
            stats.draw_calls += 1;
        }
        stats
    }

    fn reset_recording(&mut self) {
        self.bound = None;
        self.blend = None;
        self.light_path = None;
        self.draws.clear();
        self.indices.clear();
        self.uniforms.clear();
    }


    // ── resources ─────────────────────────────────────────────────────────

    fn ensure_layouts(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_layout.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tessera world shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/world.wgsl").into()),
        });

        let camera_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessera world camera bgl"),
            entries: &[uniform_entry::<CameraUniform>(wgpu::ShaderStages::VERTEX, false)],
        });
        let draw_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessera world draw bgl"),
            entries: &[uniform_entry::<DrawUniform>(
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                true,
            )],
        });
        let texture_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessera world texture bgl"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessera world pipeline layout"),
            bind_group_layouts: &[&camera_bgl, &draw_bgl, &texture_bgl],
            immediate_size: 0,
        });

        let size = std::mem::size_of::<DrawUniform>() as u64;
        let align = u64::from(ctx.device.limits().min_uniform_buffer_offset_alignment).max(1);
        self.uniform_stride = size.div_ceil(align) * align;

        self.white = Some(create_rgba_texture(ctx, "tessera white texture", 1, 1, &[255; 4]));
        self.shader = Some(shader);
        self.camera_bgl = Some(camera_bgl);
        self.draw_bgl = Some(draw_bgl);
        self.texture_bgl = Some(texture_bgl);
        self.pipeline_layout = Some(pipeline_layout);

        // Everything bound against the old layouts is stale.
        self.pipelines.clear();
        self.camera_bind_group = None;
        self.draw_bind_group = None;
        self.draw_ubo = None;
        self.draw_capacity = 0;
        self.texture_bind_groups.clear();
    }

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format != Some(ctx.target_format) {
            self.pipelines.clear();
            self.pipeline_format = Some(ctx.target_format);
        }
        let (Some(shader), Some(layout)) = (self.shader.as_ref(), self.pipeline_layout.as_ref())
        else {
            return;
        };

        for draw in &self.draws {
            self.pipelines.entry(draw.pipeline).or_insert_with(|| {
                log::debug!(
                    "world pipeline: blend {:?}, color writes {}",
                    draw.pipeline.blend,
                    draw.pipeline.color_writes
                );
                create_pipeline(ctx, shader, layout, draw.pipeline)
            });
        }
    }

    fn ensure_camera(&mut self, ctx: &RenderCtx<'_>) {
        if self.camera_ubo.is_none() || self.camera_bind_group.is_none() {
            let Some(bgl) = self.camera_bgl.as_ref() else { return };
            let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tessera world camera ubo"),
                size: std::mem::size_of::<CameraUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.camera_bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tessera world camera bind group"),
                layout: bgl,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                }],
            }));
            self.camera_ubo = Some(ubo);
        }

        let Some(ubo) = self.camera_ubo.as_ref() else { return };
        let camera = CameraUniform {
            view_proj: self.view_proj.unwrap_or(IDENTITY),
        };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&camera));
    }

    fn ensure_texture_bind_groups(&mut self, ctx: &RenderCtx<'_>) {
        let (Some(bgl), Some(white)) = (self.texture_bgl.as_ref(), self.white.as_ref()) else {
            return;
        };

        for draw in &self.draws {
            let set = draw.textures;
            if self.texture_bind_groups.contains_key(&set) {
                continue;
            }

            let mut views = [white; 3];
            for (slot, handle) in views.iter_mut().zip(set.textures) {
                let Some(handle) = handle else { continue };
                match self.textures.get(&handle) {
                    Some(view) => *slot = view,
                    None if !self.warned_missing_texture => {
                        log::warn!("texture {} not registered; sampling white", handle.0);
                        self.warned_missing_texture = true;
                    }
                    None => {}
                }
            }

            let sampler = self
                .samplers
                .entry(set.wrap)
                .or_insert_with(|| create_sampler(ctx, set.wrap));

            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tessera world texture bind group"),
                layout: bgl,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(views[0]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(views[1]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(views[2]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            });
            self.texture_bind_groups.insert(set, bind_group);
        }
    }

    fn upload_geometry(&mut self, ctx: &RenderCtx<'_>) {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return;
        }

        if self.vbo.is_none() || self.vertices.len() > self.vbo_capacity {
            let cap = self.vertices.len().next_power_of_two().max(1024);
            self.vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tessera world vbo"),
                size: (cap * std::mem::size_of::<WorldVertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.vbo_capacity = cap;
        }
        if self.ibo.is_none() || self.indices.len() > self.ibo_capacity {
            let cap = self.indices.len().next_power_of_two().max(4096);
            self.ibo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tessera world ibo"),
                size: (cap * std::mem::size_of::<u32>()) as u64,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.ibo_capacity = cap;
        }

        if let Some(vbo) = self.vbo.as_ref() {
            ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&self.vertices));
        }
        if let Some(ibo) = self.ibo.as_ref() {
            ctx.queue.write_buffer(ibo, 0, bytemuck::cast_slice(&self.indices));
        }
    }

    fn upload_uniforms(&mut self, ctx: &RenderCtx<'_>) {
        let count = self.uniforms.len();
        if count == 0 {
            return;
        }
        let stride = self.uniform_stride as usize;

        if self.draw_ubo.is_none() || count > self.draw_capacity {
            let Some(bgl) = self.draw_bgl.as_ref() else { return };
            let cap = count.next_power_of_two().max(64);
            let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tessera world draw ubo"),
                size: (cap * stride) as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.draw_bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tessera world draw bind group"),
                layout: bgl,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &ubo,
                        offset: 0,
                        size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniform>() as u64),
                    }),
                }],
            }));
            self.draw_ubo = Some(ubo);
            self.draw_capacity = cap;
        }

        self.staging.clear();
        self.staging.resize(count * stride, 0);
        for (chunk, uniform) in self.staging.chunks_exact_mut(stride).zip(&self.uniforms) {
            let bytes = bytemuck::bytes_of(uniform);
            chunk[..bytes.len()].copy_from_slice(bytes);
        }
        if let Some(ubo) = self.draw_ubo.as_ref() {
            ctx.queue.write_buffer(ubo, 0, &self.staging);
        }
    }
}

impl ReplayBackend for WorldRenderer {
    fn begin_pass(&mut self, _mode: DrawMode) {
        self.bound = None;
        self.blend = None;
        self.light_path = None;
    }

    fn bind_list(&mut self, state: &ListState<'_>) {
        let base = state
            .unit(TexUnitId::Primary)
            .or(state.unit(TexUnitId::PrimaryDetail));
        let inter = state
            .unit(TexUnitId::Inter)
            .or(state.unit(TexUnitId::InterDetail));
        let light = state.unit(TexUnitId::Light);
        let wrap = base.map_or((WrapMode::Repeat, WrapMode::Repeat), |u| (u.wrap_s, u.wrap_t));

        self.bound = Some(BoundList {
            textures: TextureSet {
                textures: [base, inter, light].map(|u| u.and_then(|u| u.texture)),
                wrap,
            },
            inter: state.interpolation,
            detail: state.mode == DrawMode::Details,
            light_unit: light.is_some(),
            color_writes: state.color_writes,
        });
    }

    fn set_blend(&mut self, blend: Option<BlendMode>) {
        self.blend = blend;
    }

    fn set_light_path(&mut self, path: LightPath) {
        self.light_path = Some(path);
    }

    fn draw(&mut self, _store: &VertexStore, prim: &Primitive<'_>) {
        let Some(bound) = self.bound else {
            if !self.warned_no_bind {
                log::warn!("world renderer: draw without a bound list ignored");
                self.warned_no_bind = true;
            }
            return;
        };

        let first_index = self.indices.len() as u32;
        let index_count = prim.triangulate(&mut self.indices) as u32;
        if index_count == 0 {
            return;
        }

        let tex = if bound.detail {
            prim.detail_transform()
        } else {
            prim.tex_transform()
        };
        // Many lights are applied by the dynamic-light pass instead.
        let light_unit = bound.light_unit && self.light_path != Some(LightPath::Many);
        let mut flags = 0;
        if bound.detail {
            flags |= DRAW_FLAG_DETAIL;
        }
        if light_unit {
            flags |= DRAW_FLAG_LIGHT_UNIT;
        }

        let uniform_slot = self.uniforms.len() as u32;
        self.uniforms.push(DrawUniform {
            modulate: prim.mod_color(),
            tex_transform: [tex.scale.x, tex.scale.y, tex.offset.x, tex.offset.y],
            inter: bound.inter,
            flags,
            _pad: [0; 2],
        });
        self.draws.push(RecordedDraw {
            pipeline: PipelineKey {
                blend: self.blend,
                color_writes: bound.color_writes,
            },
            textures: bound.textures,
            first_index,
            index_count,
            uniform_slot,
        });
    }
}

// ── construction helpers ──────────────────────────────────────────────────

fn uniform_entry<T>(visibility: wgpu::ShaderStages, dynamic: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn create_pipeline(
    ctx: &RenderCtx<'_>,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    key: PipelineKey,
) -> wgpu::RenderPipeline {
    let write_mask = if key.color_writes {
        wgpu::ColorWrites::ALL
    } else {
        wgpu::ColorWrites::empty()
    };

    ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("tessera world pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[WorldVertex::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: ctx.target_format,
                blend: key.blend.map(blend_state),
                write_mask,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

fn address_mode(wrap: WrapMode) -> wgpu::AddressMode {
    match wrap {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
    }
}

fn create_sampler(ctx: &RenderCtx<'_>, (wrap_s, wrap_t): (WrapMode, WrapMode)) -> wgpu::Sampler {
    ctx.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("tessera world sampler"),
        address_mode_u: address_mode(wrap_s),
        address_mode_v: address_mode(wrap_t),
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

fn create_rgba_texture(
    ctx: &RenderCtx<'_>,
    label: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;
    use crate::draw::{
        DrawLists, DrawListSpec, GeomGroup, GlTexUnit, LightRef, PrimitiveDesc, PrimitiveFlags,
        TexTransform,
    };
    use crate::replay::Replayer;

    fn record(mode: DrawMode, lists: &DrawLists, store: &VertexStore) -> WorldRenderer {
        let mut renderer = WorldRenderer::new();
        Replayer::new().render_pass(lists, store, mode, &mut renderer);
        renderer
    }

    fn lit_spec() -> DrawListSpec {
        DrawListSpec::new(GeomGroup::Lit)
            .with_unit(TexUnitId::Primary, GlTexUnit::new(TextureHandle(1)))
            .with_unit(TexUnitId::PrimaryDetail, GlTexUnit::new(TextureHandle(2)))
            .with_unit(TexUnitId::Light, GlTexUnit::new(TextureHandle(3)))
    }

    #[test]
    fn records_one_draw_per_primitive() {
        let mut store = VertexStore::default();
        let mut lists = DrawLists::default();
        let quad = store.allocate(4);
        let caps = store.allocate(8);
        let list = lists.find(&lit_spec());
        list.add_primitive(&store, PrimitiveDesc::fan(quad, 4));
        list.add_primitive(&store, PrimitiveDesc::double_fan(caps, 8, 4));

        let r = record(DrawMode::Lit, &lists, &store);
        assert_eq!(r.pending_draws(), 2);
        assert_eq!(r.indices.len(), 18);
        assert_eq!(r.draws[0].first_index, 0);
        assert_eq!(r.draws[1].first_index, 6);
        assert_eq!(r.draws[1].index_count, 12);
        assert_eq!(
            r.draws[0].textures.textures,
            [Some(TextureHandle(1)), None, Some(TextureHandle(3))]
        );
    }

    #[test]
    fn detail_pass_uses_detail_transform_and_units() {
        let mut store = VertexStore::default();
        let mut lists = DrawLists::default();
        let base = store.allocate(4);
        let detail = TexTransform::new(Vec2::new(4.0, 4.0), Vec2::new(0.5, 0.0));
        lists.find(&lit_spec()).add_primitive(
            &store,
            PrimitiveDesc::fan(base, 4).with_detail_transform(detail),
        );

        let r = record(DrawMode::Details, &lists, &store);
        assert_eq!(r.pending_draws(), 1);
        let u = r.uniforms[0];
        assert_eq!(u.tex_transform, [4.0, 4.0, 0.5, 0.0]);
        assert_eq!(u.flags & DRAW_FLAG_DETAIL, DRAW_FLAG_DETAIL);
        assert_eq!(r.draws[0].textures.textures[0], Some(TextureHandle(2)));
        assert_eq!(r.draws[0].pipeline.blend, Some(BlendMode::Multiply));
    }

    #[test]
    fn many_lights_drop_the_light_unit() {
        let mut store = VertexStore::default();
        let mut lists = DrawLists::default();
        let a = store.allocate(4);
        let b = store.allocate(4);
        let list = lists.find(&lit_spec());
        list.add_primitive(&store, PrimitiveDesc::fan(a, 4).with_light(LightRef(0)));
        list.add_primitive(
            &store,
            PrimitiveDesc::fan(b, 4)
                .with_flags(PrimitiveFlags::MANY_LIGHTS)
                .with_mod_color([0.5, 0.5, 0.5, 1.0]),
        );

        let r = record(DrawMode::Lit, &lists, &store);
        assert_eq!(r.uniforms[0].flags & DRAW_FLAG_LIGHT_UNIT, DRAW_FLAG_LIGHT_UNIT);
        assert_eq!(r.uniforms[1].flags & DRAW_FLAG_LIGHT_UNIT, 0);
        assert_eq!(r.uniforms[1].modulate, [0.5, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn pipeline_key_tracks_blend_and_color_writes() {
        let mut store = VertexStore::default();
        let mut lists = DrawLists::default();
        let a = store.allocate(4);
        let b = store.allocate(4);
        let spec = DrawListSpec::new(GeomGroup::Unlit)
            .with_unit(TexUnitId::Primary, GlTexUnit::new(TextureHandle(1)));
        let list = lists.find(&spec);
        list.add_primitive(&store, PrimitiveDesc::fan(a, 4));
        list.add_primitive(&store, PrimitiveDesc::fan(b, 4).blended(BlendMode::Add));

        let r = record(DrawMode::Unlit, &lists, &store);
        assert_eq!(r.draws[0].pipeline, PipelineKey { blend: None, color_writes: true });
        assert_eq!(
            r.draws[1].pipeline,
            PipelineKey { blend: Some(BlendMode::Add), color_writes: true }
        );

        let sky = store.allocate(4);
        lists
            .find(&DrawListSpec::new(GeomGroup::SkyMask))
            .add_primitive(&store, PrimitiveDesc::fan(sky, 4));
        let r = record(DrawMode::SkyMask, &lists, &store);
        assert_eq!(r.draws[0].pipeline, PipelineKey { blend: None, color_writes: false });
        assert_eq!(r.draws[0].textures.textures, [None; 3]);
    }

    #[test]
    fn draw_without_bind_is_ignored() {
        let mut store = VertexStore::default();
        let mut lists = DrawLists::default();
        let base = store.allocate(4);
        let spec = DrawListSpec::new(GeomGroup::Unlit);
        let list = lists.find(&spec);
        list.add_primitive(&store, PrimitiveDesc::fan(base, 4));

        let mut r = WorldRenderer::new();
        if let Some(prim) = lists.find(&spec).last_primitive() {
            r.draw(&store, &prim);
        }
        assert_eq!(r.pending_draws(), 0);
        assert!(r.warned_no_bind);
    }
}
