//! Synthetic tiled world rebuilt every frame.
//!
//! Covers every geometry group: plain and lit floor tiles, crossfading
//! tiles (interpolation target), scrolling and glass tiles, shiny strips,
//! dynamic lights, shadows under pillars, and a sky-mask cap.

use tessera_engine::coords::{Rgba8, Vec2, Vec3};
use tessera_engine::draw::{
    BlendMode, DrawLists, DrawListSpec, GeomGroup, GlTexUnit, LightRef, PrimitiveDesc,
    PrimitiveFlags, TexTransform, TexUnitId, TextureHandle, WrapMode,
};
use tessera_engine::vertex::{TexCoordChannel, Vertex, VertexIndex, VertexStore};

use crate::textures;

pub const GRID_W: u32 = 16;
pub const GRID_H: u32 = 10;

const DETAIL_SCALE: f32 = 4.0;

#[derive(Debug, Copy, Clone)]
struct Light {
    center: Vec2,
    orbit: f32,
    radius: f32,
    speed: f32,
}

impl Light {
    fn position(&self, frame: u64) -> Vec2 {
        let a = frame as f32 * self.speed;
        self.center + Vec2::new(a.cos(), a.sin()) * self.orbit
    }
}

/// Counts of what one frame produced.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub primitives: usize,
    pub vertices: usize,
}

pub struct Scene {
    lights: Vec<Light>,
    pillars: Vec<Vec2>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            lights: vec![
                Light { center: Vec2::new(4.0, 4.0), orbit: 2.0, radius: 2.5, speed: 0.05 },
                Light { center: Vec2::new(11.0, 5.0), orbit: 3.0, radius: 3.0, speed: -0.03 },
                Light { center: Vec2::new(8.0, 2.0), orbit: 1.0, radius: 2.0, speed: 0.08 },
            ],
            pillars: vec![Vec2::new(3.5, 7.5), Vec2::new(12.5, 2.5)],
        }
    }

    /// Orthographic projection of the grid onto clip space (column-major).
    pub fn view_proj(&self) -> [[f32; 4]; 4] {
        let sx = 2.0 / GRID_W as f32;
        let sy = 2.0 / GRID_H as f32;
        [
            [sx, 0.0, 0.0, 0.0],
            [0.0, sy, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
            [-1.0, -1.0, 0.5, 1.0],
        ]
    }

    /// Appends this frame's geometry. The caller truncates `store` and resets
    /// `lists` beforehand.
    pub fn build(&self, frame: u64, store: &mut VertexStore, lists: &mut DrawLists) -> SceneStats {
        let before = store.len();
        let mut prims = 0;
        let lights: Vec<(Vec2, f32)> = self
            .lights
            .iter()
            .map(|l| (l.position(frame), l.radius))
            .collect();

        for y in 0..GRID_H {
            for x in 0..GRID_W {
                prims += self.tile(frame, x, y, &lights, store, lists);
            }
        }

        for (i, &(pos, radius)) in lights.iter().enumerate() {
            let base = push_quad(store, pos - Vec2::new(radius, radius), pos + Vec2::new(radius, radius), Rgba8::WHITE);
            let spec = DrawListSpec::new(GeomGroup::Light).with_unit(
                TexUnitId::Primary,
                GlTexUnit::new(textures::LIGHT_GLOW).with_wrap(WrapMode::ClampToEdge, WrapMode::ClampToEdge),
            );
            lists
                .find(&spec)
                .add_primitive(store, PrimitiveDesc::fan(base, 4).with_light(LightRef(i as u32)));
            prims += 1;
        }

        for &pillar in &self.pillars {
            prims += push_pillar(pillar, store, lists);
        }

        prims += push_sky(store, lists);

        SceneStats {
            primitives: prims,
            vertices: store.len() - before,
        }
    }

    fn tile(
        &self,
        frame: u64,
        x: u32,
        y: u32,
        lights: &[(Vec2, f32)],
        store: &mut VertexStore,
        lists: &mut DrawLists,
    ) -> usize {
        let min = Vec2::new(x as f32, y as f32);
        let max = min + Vec2::ONE;
        let center = min + Vec2::new(0.5, 0.5);
        let primary = if (x + y) % 3 == 0 { textures::FLOOR_MOSS } else { textures::FLOOR_STONE };

        let mut spec = DrawListSpec::new(GeomGroup::Unlit).with_unit(TexUnitId::Primary, GlTexUnit::new(primary));
        if primary == textures::FLOOR_STONE {
            spec = spec.with_unit(TexUnitId::PrimaryDetail, GlTexUnit::new(textures::DETAIL_GRIT));
        }
        let mut desc_flags = PrimitiveFlags::empty();
        let mut light = None;
        let mut blend = None;
        let mut tex = TexTransform::IDENTITY;

        match y {
            // Crossfading material.
            3 => {
                let phase = (frame as f32 * 0.1 + x as f32 * 0.3).sin() * 0.5 + 0.5;
                spec = spec.with_unit(
                    TexUnitId::Inter,
                    GlTexUnit::new(other_floor(primary)).with_opacity(phase),
                );
            }
            // Scrolling conveyor.
            1 => {
                let offset = (frame as f32 * 0.05).fract();
                tex = TexTransform::new(Vec2::ONE, Vec2::new(offset, 0.0));
            }
            // Glass.
            7 if x % 3 == 0 => {
                spec = DrawListSpec::new(GeomGroup::Unlit).with_unit(TexUnitId::Primary, GlTexUnit::new(textures::GLASS));
                blend = Some(BlendMode::Normal);
            }
            _ => {}
        }

        // Every fourth column is lit by the lightmap and nearby dynamic lights.
        if x % 4 == 0 && blend.is_none() {
            spec.group = GeomGroup::Lit;
            spec = spec.with_unit(TexUnitId::Light, GlTexUnit::new(textures::LIGHTMAP));
            let touching: Vec<u32> = lights
                .iter()
                .enumerate()
                .filter(|(_, (pos, radius))| {
                    let d = *pos - center;
                    d.x * d.x + d.y * d.y <= radius * radius
                })
                .map(|(i, _)| i as u32)
                .collect();
            match touching.as_slice() {
                [] => {}
                [one] => light = Some(LightRef(*one)),
                _ => desc_flags |= PrimitiveFlags::MANY_LIGHTS,
            }
        }

        let color = if blend.is_some() { Rgba8::new(255, 255, 255, 160) } else { Rgba8::WHITE };
        let base = push_quad(store, min, max, color);
        let mut desc = PrimitiveDesc::fan(base, 4)
            .with_flags(desc_flags)
            .with_tex_transform(tex)
            .with_detail_transform(TexTransform::new(Vec2::ONE, tex.offset * DETAIL_SCALE));
        if let Some(light) = light {
            desc = desc.with_light(light).with_mod_color([1.0, 0.95, 0.85, 1.0]);
        }
        if let Some(mode) = blend {
            desc = desc.blended(mode);
        }
        lists.find(&spec).add_primitive(store, desc);
        let mut added = 1;

        // Shiny strip reuses the tile's vertices.
        if y == 5 {
            let shine = DrawListSpec::new(GeomGroup::Shine).with_unit(TexUnitId::Primary, GlTexUnit::new(textures::SHINY_ENV));
            lists
                .find(&shine)
                .add_primitive(store, PrimitiveDesc::fan(base, 4).blended(BlendMode::Add));
            added += 1;
        }
        added
    }
}

fn other_floor(tex: TextureHandle) -> TextureHandle {
    if tex == textures::FLOOR_STONE { textures::FLOOR_MOSS } else { textures::FLOOR_STONE }
}

/// Appends an axis-aligned quad, counter-clockwise from `min`.
fn push_quad(store: &mut VertexStore, min: Vec2, max: Vec2, color: Rgba8) -> VertexIndex {
    const CORNERS: [(f32, f32); 4] = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];

    let base = store.allocate(CORNERS.len());
    let size = max - min;
    for (k, (u, v)) in CORNERS.into_iter().enumerate() {
        let uv = Vec2::new(u, v);
        let pos = Vec3::new(min.x + size.x * u, min.y + size.y * v, 0.0);
        store.set(
            base + k as VertexIndex,
            Vertex::new(pos)
                .with_tex_coord(TexCoordChannel::Main, uv)
                .with_tex_coord(TexCoordChannel::Blend, uv)
                .with_tex_coord(TexCoordChannel::Detail, uv * DETAIL_SCALE)
                .with_tex_coord(TexCoordChannel::BlendDetail, uv * DETAIL_SCALE)
                .with_tex_coord(TexCoordChannel::Light, uv)
                .with_color(color),
        );
    }
    base
}

/// Hexagonal pillar as an indexed triangle list, plus its shadow.
fn push_pillar(center: Vec2, store: &mut VertexStore, lists: &mut DrawLists) -> usize {
    const SIDES: u32 = 6;
    const RADIUS: f32 = 0.4;

    let shadow = push_quad(store, center - Vec2::new(0.8, 0.8), center + Vec2::new(0.8, 0.8), Rgba8::WHITE);
    let shadow_spec = DrawListSpec::new(GeomGroup::Shadow).with_unit(
        TexUnitId::Primary,
        GlTexUnit::new(textures::SHADOW_BLOB).with_wrap(WrapMode::ClampToEdge, WrapMode::ClampToEdge),
    );
    lists.find(&shadow_spec).add_primitive(store, PrimitiveDesc::fan(shadow, 4));

    let base = store.allocate(SIDES as usize + 1);
    store.set(
        base,
        Vertex::new(Vec3::new(center.x, center.y, 1.0))
            .with_tex_coord(TexCoordChannel::Main, Vec2::new(0.5, 0.5)),
    );
    for k in 0..SIDES {
        let a = k as f32 / SIDES as f32 * std::f32::consts::TAU;
        let dir = Vec2::new(a.cos(), a.sin());
        let pos = center + dir * RADIUS;
        store.set(
            base + 1 + k,
            Vertex::new(Vec3::new(pos.x, pos.y, 1.0))
                .with_tex_coord(TexCoordChannel::Main, Vec2::new(0.5, 0.5) + dir * 0.5)
                .with_color(Rgba8::new(220, 220, 220, 255)),
        );
    }

    let indices: Vec<VertexIndex> = (0..SIDES)
        .flat_map(|k| [base, base + 1 + k, base + 1 + (k + 1) % SIDES])
        .collect();
    let spec = DrawListSpec::new(GeomGroup::Unlit).with_unit(TexUnitId::Primary, GlTexUnit::new(textures::PILLAR));
    lists
        .find(&spec)
        .add_primitive(store, PrimitiveDesc::triangles(base, SIDES + 1, &indices));
    2
}

/// Sky cap over the top row: two fans sharing one vertex run.
fn push_sky(store: &mut VertexStore, lists: &mut DrawLists) -> usize {
    let top = GRID_H as f32;
    let first = push_quad(store, Vec2::new(0.0, top - 0.5), Vec2::new(GRID_W as f32 * 0.5, top), Rgba8::BLACK);
    let second = push_quad(store, Vec2::new(GRID_W as f32 * 0.5, top - 0.5), Vec2::new(GRID_W as f32, top), Rgba8::BLACK);
    debug_assert_eq!(second, first + 4);

    lists
        .find(&DrawListSpec::new(GeomGroup::SkyMask))
        .add_primitive(store, PrimitiveDesc::double_fan(first, 8, 4));
    1
}
