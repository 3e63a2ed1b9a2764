use bitflags::bitflags;

use crate::vertex::VertexStore;

use super::arena::{ArenaConfig, PrimitiveArena, Primitives};
use super::primitive::{Primitive, PrimitiveDesc, PrimitiveFlags, RecordHandle};
use super::{DrawListSpec, GeomGroup, TexUnitId};

/// Identity of a draw list, unique for the lifetime of its [`DrawLists`](super::DrawLists).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct DrawListId(pub(crate) u32);

impl DrawListId {
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

bitflags! {
    /// List-level hints for the replay stage, rebuilt as primitives are added.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct ListFlags: u32 {
        /// At least one primitive references a dynamic light.
        const HAS_LIGHTS = 1 << 0;
        /// At least one primitive requires blending.
        const HAS_BLENDED = 1 << 1;
        /// Every primitive requires blending.
        const ALL_BLENDED = 1 << 2;
    }
}

/// Primitives sharing one GL-state specification.
#[derive(Debug)]
pub struct DrawList {
    id: DrawListId,
    spec: DrawListSpec,
    arena: PrimitiveArena,
    flags: ListFlags,
}

impl DrawList {
    pub(crate) fn new(id: DrawListId, spec: DrawListSpec, arena: ArenaConfig) -> Self {
        Self {
            id,
            spec,
            arena: PrimitiveArena::new(arena),
            flags: ListFlags::empty(),
        }
    }

    #[inline]
    pub fn id(&self) -> DrawListId {
        self.id
    }

    #[inline]
    pub fn spec(&self) -> &DrawListSpec {
        &self.spec
    }

    /// Mutable spec. Retargeting a non-empty list changes how its committed
    /// primitives are drawn; the selector only does so for empty lists.
    #[inline]
    pub fn spec_mut(&mut self) -> &mut DrawListSpec {
        &mut self.spec
    }

    #[inline]
    pub fn group(&self) -> GeomGroup {
        self.spec.group
    }

    /// Blend factor between the primary texture and the interpolation target.
    #[inline]
    pub fn interpolation_target(&self) -> f32 {
        let inter = self.spec.unit(TexUnitId::Inter);
        if inter.has_texture() { inter.opacity.clamp(0.0, 1.0) } else { 0.0 }
    }

    #[inline]
    pub fn flags(&self) -> ListFlags {
        self.flags
    }

    #[inline]
    pub fn has_lights(&self) -> bool {
        self.flags.contains(ListFlags::HAS_LIGHTS)
    }

    #[inline]
    pub fn is_all_blended(&self) -> bool {
        self.flags.contains(ListFlags::ALL_BLENDED)
    }

    /// Appends a primitive referencing vertices already written to `store`.
    ///
    /// Every index must lie in `base..base + vertex_count`, and that run must
    /// lie inside the store. Both are checked in debug builds only.
    pub fn add_primitive(&mut self, store: &VertexStore, desc: PrimitiveDesc<'_>) -> RecordHandle {
        debug_assert!(
            (desc.base as usize + desc.vertex_count as usize) <= store.len(),
            "primitive references vertices {}..{} past the store length {}",
            desc.base,
            desc.base + desc.vertex_count,
            store.len()
        );
        debug_assert!(
            desc.indices.is_none_or(|idx| idx
                .iter()
                .all(|&i| i >= desc.base && i - desc.base < desc.vertex_count)),
            "primitive index outside its vertex run"
        );
        debug_assert!(
            desc.begin_other as usize <= desc.index_count(),
            "double fan split past the index run"
        );

        let first = self.arena.is_empty();
        let handle = self.arena.append(&desc);

        if desc.light.is_some() || desc.flags.contains(PrimitiveFlags::MANY_LIGHTS) {
            self.flags |= ListFlags::HAS_LIGHTS;
        }
        if desc.flags.contains(PrimitiveFlags::BLEND) {
            self.flags |= ListFlags::HAS_BLENDED;
            if first {
                self.flags |= ListFlags::ALL_BLENDED;
            }
        } else {
            self.flags.remove(ListFlags::ALL_BLENDED);
        }

        handle
    }

    /// True iff nothing was appended since the last rewind/clear.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Number of primitives.
    #[inline]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    pub fn primitives(&self) -> Primitives<'_> {
        self.arena.iter()
    }

    #[inline]
    pub fn primitive(&self, handle: RecordHandle) -> Option<Primitive<'_>> {
        self.arena.get(handle)
    }

    #[inline]
    pub fn last_primitive(&self) -> Option<Primitive<'_>> {
        self.arena.last()
    }

    #[inline]
    pub fn arena(&self) -> &PrimitiveArena {
        &self.arena
    }

    /// Empties the list for reuse next frame, keeping its arena allocation and spec.
    ///
    /// The interpolation target varies frame to frame, so its texture and
    /// opacity are zeroed instead of being carried over.
    pub fn rewind(&mut self) {
        self.arena.rewind();
        self.flags = ListFlags::empty();
        self.spec.unit_mut(TexUnitId::Inter).unset();
    }

    /// Releases the arena.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.flags = ListFlags::empty();
    }
}
