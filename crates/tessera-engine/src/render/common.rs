//! GPU-side types shared by the world renderer.

use bytemuck::{Pod, Zeroable};

use crate::draw::BlendMode;
use crate::vertex::{TexCoordChannel, VertexStore};

// ── blend ─────────────────────────────────────────────────────────────────

const fn component(
    src_factor: wgpu::BlendFactor,
    dst_factor: wgpu::BlendFactor,
    operation: wgpu::BlendOperation,
) -> wgpu::BlendComponent {
    wgpu::BlendComponent {
        src_factor,
        dst_factor,
        operation,
    }
}

/// Fixed-function blend state for `mode`.
pub(super) fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    use wgpu::BlendFactor as F;
    use wgpu::BlendOperation as Op;

    let color = match mode {
        BlendMode::Normal => component(F::SrcAlpha, F::OneMinusSrcAlpha, Op::Add),
        BlendMode::Add => component(F::SrcAlpha, F::One, Op::Add),
        BlendMode::Subtract => component(F::SrcAlpha, F::One, Op::Subtract),
        BlendMode::ReverseSubtract => component(F::SrcAlpha, F::One, Op::ReverseSubtract),
        BlendMode::Multiply => component(F::Zero, F::Src, Op::Add),
        BlendMode::Dark => component(F::Dst, F::OneMinusSrcAlpha, Op::Add),
        BlendMode::Alpha => component(F::One, F::OneMinusSrcAlpha, Op::Add),
    };
    wgpu::BlendState {
        color,
        alpha: component(F::One, F::OneMinusSrcAlpha, Op::Add),
    }
}

// ── uniforms ──────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

pub(super) const DRAW_FLAG_DETAIL: u32 = 1 << 0;
pub(super) const DRAW_FLAG_LIGHT_UNIT: u32 = 1 << 1;

/// Per-draw uniform block, addressed with a dynamic offset.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct DrawUniform {
    pub modulate: [f32; 4],
    /// xy = scale, zw = offset
    pub tex_transform: [f32; 4],
    pub inter: f32,
    pub flags: u32,
    pub _pad: [u32; 2],
}

// ── vertex ────────────────────────────────────────────────────────────────

/// Interleaved copy of one [`VertexStore`] entry.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct WorldVertex {
    pub pos: [f32; 3],
    pub uv: [[f32; 2]; 5],
    pub color: [u8; 4],
}

impl WorldVertex {
    const ATTRS: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
        0 => Float32x3, // pos
        1 => Float32x2, // main
        2 => Float32x2, // blend
        3 => Float32x2, // detail
        4 => Float32x2, // blend detail
        5 => Float32x2, // light
        6 => Unorm8x4   // color
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<WorldVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Interleaves every vertex of `store` into `out` (cleared first).
pub(super) fn interleave(store: &VertexStore, out: &mut Vec<WorldVertex>) {
    out.clear();
    out.reserve(store.len());
    let channels = TexCoordChannel::ALL.map(|ch| store.tex_coords(ch));
    for (i, (pos, color)) in store.positions().iter().zip(store.colors()).enumerate() {
        out.push(WorldVertex {
            pos: pos.to_array(),
            uv: channels.map(|c| c[i].to_array()),
            color: [color.r, color.g, color.b, color.a],
        });
    }
}
