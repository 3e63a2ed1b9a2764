use bitflags::bitflags;

use crate::coords::Vec2;
use crate::vertex::VertexIndex;

use super::arena::RecordHeader;

/// Drawable topology of a primitive record.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimitiveKind {
    Triangles = 0,
    Fan = 1,
    /// Two fans sharing one index run, split at `begin_other` (two-sided sky caps).
    DoubleFan = 2,
}

impl PrimitiveKind {
    #[inline]
    pub(crate) fn from_raw(raw: u32) -> Self {
        match raw {
            0 => PrimitiveKind::Triangles,
            1 => PrimitiveKind::Fan,
            _ => PrimitiveKind::DoubleFan,
        }
    }
}

bitflags! {
    /// Per-primitive replay toggles.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct PrimitiveFlags: u32 {
        /// Blending must be enabled while drawing this primitive.
        const BLEND = 1 << 0;
        /// Lit by more than one dynamic light; replay takes the many-light path.
        const MANY_LIGHTS = 1 << 1;
    }
}

/// Blend equation applied when a primitive is blended.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Normal = 0,
    Add = 1,
    Subtract = 2,
    ReverseSubtract = 3,
    Multiply = 4,
    Dark = 5,
    /// Premultiplied alpha.
    Alpha = 6,
}

impl BlendMode {
    #[inline]
    pub(crate) fn from_raw(raw: u32) -> Self {
        match raw {
            1 => BlendMode::Add,
            2 => BlendMode::Subtract,
            3 => BlendMode::ReverseSubtract,
            4 => BlendMode::Multiply,
            5 => BlendMode::Dark,
            6 => BlendMode::Alpha,
            _ => BlendMode::Normal,
        }
    }
}

/// Non-owning reference to a dynamic light in the host's frame-scoped light list.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LightRef(pub u32);

/// Texture-space scale and offset applied to one primitive.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TexTransform {
    pub scale: Vec2,
    pub offset: Vec2,
}

impl Default for TexTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TexTransform {
    pub const IDENTITY: TexTransform = TexTransform { scale: Vec2::ONE, offset: Vec2::ZERO };

    #[inline]
    pub fn new(scale: Vec2, offset: Vec2) -> Self {
        Self { scale, offset }
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    #[inline]
    pub fn apply(&self, uv: Vec2) -> Vec2 {
        uv.scale(self.scale) + self.offset
    }
}

/// Input for [`DrawList::add_primitive`](super::DrawList::add_primitive).
///
/// The primitive references the vertex run `base..base + vertex_count`. When
/// `indices` is `None` the run itself is the index list.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveDesc<'a> {
    pub kind: PrimitiveKind,
    pub flags: PrimitiveFlags,
    pub base: VertexIndex,
    pub vertex_count: u32,
    pub indices: Option<&'a [VertexIndex]>,
    /// DoubleFan only: offset into the index run where the second fan begins.
    pub begin_other: u32,
    pub light: Option<LightRef>,
    pub blend_mode: BlendMode,
    pub tex: TexTransform,
    pub detail_tex: TexTransform,
    /// Color applied to the light/modulation unit.
    pub mod_color: [f32; 4],
}

impl<'a> PrimitiveDesc<'a> {
    fn with_kind(kind: PrimitiveKind, base: VertexIndex, vertex_count: u32) -> Self {
        Self {
            kind,
            flags: PrimitiveFlags::empty(),
            base,
            vertex_count,
            indices: None,
            begin_other: 0,
            light: None,
            blend_mode: BlendMode::Normal,
            tex: TexTransform::IDENTITY,
            detail_tex: TexTransform::IDENTITY,
            mod_color: [1.0; 4],
        }
    }

    /// Triangle fan over `base..base + vertex_count`.
    pub fn fan(base: VertexIndex, vertex_count: u32) -> Self {
        Self::with_kind(PrimitiveKind::Fan, base, vertex_count)
    }

    /// Two fans over one run; the second starts at `base + begin_other`.
    pub fn double_fan(base: VertexIndex, vertex_count: u32, begin_other: u32) -> Self {
        Self {
            begin_other,
            ..Self::with_kind(PrimitiveKind::DoubleFan, base, vertex_count)
        }
    }

    /// Indexed triangle list drawing from `base..base + vertex_count`.
    pub fn triangles(base: VertexIndex, vertex_count: u32, indices: &'a [VertexIndex]) -> Self {
        Self {
            indices: Some(indices),
            ..Self::with_kind(PrimitiveKind::Triangles, base, vertex_count)
        }
    }

    #[inline]
    pub fn with_flags(mut self, flags: PrimitiveFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Marks the primitive as blended with `mode`.
    #[inline]
    pub fn blended(mut self, mode: BlendMode) -> Self {
        self.flags |= PrimitiveFlags::BLEND;
        self.blend_mode = mode;
        self
    }

    #[inline]
    pub fn with_light(mut self, light: LightRef) -> Self {
        self.light = Some(light);
        self
    }

    #[inline]
    pub fn with_tex_transform(mut self, tex: TexTransform) -> Self {
        self.tex = tex;
        self
    }

    #[inline]
    pub fn with_detail_transform(mut self, detail_tex: TexTransform) -> Self {
        self.detail_tex = detail_tex;
        self
    }

    #[inline]
    pub fn with_mod_color(mut self, mod_color: [f32; 4]) -> Self {
        self.mod_color = mod_color;
        self
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.map_or(self.vertex_count as usize, <[VertexIndex]>::len)
    }
}

/// Stable handle of a record inside one draw list's arena.
///
/// Valid until that list is rewound or cleared.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RecordHandle(pub(crate) u32);

impl RecordHandle {
    /// Word offset of the record within its arena.
    #[inline]
    pub fn offset(self) -> u32 {
        self.0
    }
}

/// Read-only view of one primitive record.
#[derive(Debug, Copy, Clone)]
pub struct Primitive<'a> {
    pub(crate) handle: RecordHandle,
    pub(crate) header: &'a RecordHeader,
    pub(crate) indices: &'a [VertexIndex],
}

impl<'a> Primitive<'a> {
    #[inline]
    pub fn handle(&self) -> RecordHandle {
        self.handle
    }

    #[inline]
    pub fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::from_raw(self.header.kind)
    }

    #[inline]
    pub fn flags(&self) -> PrimitiveFlags {
        PrimitiveFlags::from_bits_truncate(self.header.flags)
    }

    #[inline]
    pub fn is_blended(&self) -> bool {
        self.flags().contains(PrimitiveFlags::BLEND)
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.header.vertex_count
    }

    /// Size of the record in bytes, header and index run included.
    #[inline]
    pub fn size_bytes(&self) -> u32 {
        self.header.size
    }

    #[inline]
    pub fn indices(&self) -> &'a [VertexIndex] {
        self.indices
    }

    /// First vertex of the referenced run.
    #[inline]
    pub fn base_index(&self) -> VertexIndex {
        self.header.base
    }

    /// Vertex range referenced by this primitive.
    #[inline]
    pub fn vertex_range(&self) -> core::ops::Range<usize> {
        let base = self.header.base as usize;
        base..base + self.header.vertex_count as usize
    }

    #[inline]
    pub fn begin_other(&self) -> u32 {
        self.header.begin_other
    }

    #[inline]
    pub fn light(&self) -> Option<LightRef> {
        (self.header.light != RecordHeader::NO_LIGHT).then_some(LightRef(self.header.light))
    }

    #[inline]
    pub fn blend_mode(&self) -> BlendMode {
        BlendMode::from_raw(self.header.blend_mode)
    }

    #[inline]
    pub fn tex_transform(&self) -> TexTransform {
        TexTransform::new(self.header.tex_scale.into(), self.header.tex_offset.into())
    }

    #[inline]
    pub fn detail_transform(&self) -> TexTransform {
        TexTransform::new(self.header.detail_scale.into(), self.header.detail_offset.into())
    }

    #[inline]
    pub fn mod_color(&self) -> [f32; 4] {
        self.header.mod_color
    }

    /// Appends this primitive as a triangle list to `out`; returns the number
    /// of indices written.
    pub fn triangulate(&self, out: &mut Vec<VertexIndex>) -> usize {
        let start = out.len();
        match self.kind() {
            PrimitiveKind::Triangles => {
                debug_assert!(self.indices.len() % 3 == 0, "triangle list not a multiple of 3");
                out.extend_from_slice(self.indices);
            }
            PrimitiveKind::Fan => push_fan(self.indices, out),
            PrimitiveKind::DoubleFan => {
                let split = (self.header.begin_other as usize).min(self.indices.len());
                let (first, second) = self.indices.split_at(split);
                push_fan(first, out);
                push_fan(second, out);
            }
        }
        out.len() - start
    }
}

fn push_fan(fan: &[VertexIndex], out: &mut Vec<VertexIndex>) {
    let Some((&hub, rim)) = fan.split_first() else { return };
    out.reserve(rim.len().saturating_sub(1) * 3);
    for pair in rim.windows(2) {
        out.extend_from_slice(&[hub, pair[0], pair[1]]);
    }
}
