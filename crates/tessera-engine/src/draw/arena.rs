use bytemuck::{Pod, Zeroable};

use crate::fatal::alloc_exhausted;

use super::primitive::{Primitive, PrimitiveDesc, RecordHandle};

/// Arena sizing policy.
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// Bytes reserved on the first append. Arenas allocate nothing until then.
    pub initial_bytes: usize,
    /// Extra bytes added on top of the required size when doubling is not enough.
    pub growth_padding_bytes: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_bytes: 1024,
            growth_padding_bytes: 1024,
        }
    }
}

/// Fixed-size record header. The index run follows it directly.
///
/// Every field is 4 bytes wide so headers and indices share one `u32` buffer
/// without padding.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct RecordHeader {
    /// Record length in bytes, header and index run included.
    pub size: u32,
    pub kind: u32,
    pub flags: u32,
    pub base: u32,
    pub vertex_count: u32,
    pub index_count: u32,
    pub begin_other: u32,
    pub light: u32,
    pub blend_mode: u32,
    pub tex_scale: [f32; 2],
    pub tex_offset: [f32; 2],
    pub detail_scale: [f32; 2],
    pub detail_offset: [f32; 2],
    pub mod_color: [f32; 4],
}

impl RecordHeader {
    pub const NO_LIGHT: u32 = u32::MAX;
    pub const WORDS: usize = core::mem::size_of::<RecordHeader>() / 4;
}

const _: () = assert!(core::mem::size_of::<RecordHeader>() % 4 == 0);
const _: () = assert!(core::mem::align_of::<RecordHeader>() == 4);

/// Bump allocator for variable-length primitive records.
///
/// Records are packed back to back in a `u32` buffer and addressed by word
/// offset, never by pointer, so growing the buffer leaves every handle and
/// the `last` reference valid without a fix-up pass. A record's `size` field
/// is the link to the next record.
#[derive(Debug)]
pub struct PrimitiveArena {
    words: Vec<u32>,
    last: Option<RecordHandle>,
    count: u32,
    growths: u32,
    config: ArenaConfig,
}

impl PrimitiveArena {
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            words: Vec::new(),
            last: None,
            count: 0,
            growths: 0,
            config,
        }
    }

    /// Ensures `extra_bytes` more bytes fit without reallocating.
    ///
    /// Grows to twice the current capacity, or to the required size plus the
    /// configured padding when doubling falls short.
    ///
    /// # Panics
    /// Panics when the allocation fails; a truncated record would corrupt replay.
    pub fn ensure_space(&mut self, extra_bytes: usize) {
        let extra_words = extra_bytes.div_ceil(4);
        let needed = self.words.len() + extra_words;
        let capacity = self.words.capacity();
        if needed <= capacity {
            return;
        }

        let target = (capacity * 2)
            .max(needed + self.config.growth_padding_bytes.div_ceil(4))
            .max(self.config.initial_bytes.div_ceil(4));
        let additional = target - self.words.len();
        if let Err(err) = self.words.try_reserve_exact(additional) {
            alloc_exhausted("primitive arena", additional, err);
        }

        self.growths += 1;
        log::debug!(
            "primitive arena grew {} -> {} bytes",
            capacity * 4,
            self.words.capacity() * 4
        );
    }

    /// Writes a header plus index run and links it after the last record.
    pub fn append(&mut self, desc: &PrimitiveDesc<'_>) -> RecordHandle {
        let index_count = desc.index_count();
        let record_words = record_len_words(index_count);
        self.ensure_space(record_words * 4);

        let offset = self.words.len();
        debug_assert!(
            self.last
                .and_then(|h| self.get(h))
                .is_none_or(|p| p.handle.0 as usize + p.size_bytes() as usize / 4 == offset),
            "arena cursor does not follow the last record"
        );

        let header = RecordHeader {
            size: (record_words * 4) as u32,
            kind: desc.kind as u32,
            flags: desc.flags.bits(),
            base: desc.base,
            vertex_count: desc.vertex_count,
            index_count: index_count as u32,
            begin_other: desc.begin_other,
            light: desc.light.map_or(RecordHeader::NO_LIGHT, |l| l.0),
            blend_mode: desc.blend_mode as u32,
            tex_scale: desc.tex.scale.to_array(),
            tex_offset: desc.tex.offset.to_array(),
            detail_scale: desc.detail_tex.scale.to_array(),
            detail_offset: desc.detail_tex.offset.to_array(),
            mod_color: desc.mod_color,
        };
        self.words
            .extend_from_slice(bytemuck::cast_slice(core::slice::from_ref(&header)));

        match desc.indices {
            Some(indices) => self.words.extend_from_slice(indices),
            None => self
                .words
                .extend((0..desc.vertex_count).map(|i| desc.base + i)),
        }

        let handle = RecordHandle(offset as u32);
        self.last = Some(handle);
        self.count += 1;
        log::trace!("primitive {:?} at word {offset} ({index_count} indices)", desc.kind);
        handle
    }

    /// Resolves `handle`, or `None` when it lies past the cursor (e.g. stale after rewind).
    pub fn get(&self, handle: RecordHandle) -> Option<Primitive<'_>> {
        let offset = handle.0 as usize;
        let header_words = self.words.get(offset..offset + RecordHeader::WORDS)?;
        let header: &RecordHeader = bytemuck::from_bytes(bytemuck::cast_slice(header_words));
        let start = offset + RecordHeader::WORDS;
        let indices = self.words.get(start..start + header.index_count as usize)?;
        Some(Primitive { handle, header, indices })
    }

    /// Most recently appended record.
    #[inline]
    pub fn last(&self) -> Option<Primitive<'_>> {
        self.last.and_then(|h| self.get(h))
    }

    /// Records in append order.
    #[inline]
    pub fn iter(&self) -> Primitives<'_> {
        Primitives { arena: self, cursor: 0 }
    }

    /// Number of records since the last rewind/clear.
    #[inline]
    pub fn len(&self) -> usize {
        self.count as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn used_bytes(&self) -> usize {
        self.words.len() * 4
    }

    #[inline]
    pub fn capacity_bytes(&self) -> usize {
        self.words.capacity() * 4
    }

    /// Number of reallocations since construction.
    #[inline]
    pub fn growth_count(&self) -> u32 {
        self.growths
    }

    /// Moves the cursor back to the start; the allocation is kept.
    pub fn rewind(&mut self) {
        self.words.clear();
        self.last = None;
        self.count = 0;
    }

    /// Releases the allocation.
    pub fn clear(&mut self) {
        self.words = Vec::new();
        self.last = None;
        self.count = 0;
    }
}

/// Iterator over an arena's records in append order.
pub struct Primitives<'a> {
    arena: &'a PrimitiveArena,
    cursor: usize,
}

impl<'a> Iterator for Primitives<'a> {
    type Item = Primitive<'a>;

    fn next(&mut self) -> Option<Primitive<'a>> {
        let prim = self.arena.get(RecordHandle(self.cursor as u32))?;
        self.cursor += prim.size_bytes() as usize / 4;
        Some(prim)
    }
}

/// Word length of a record holding `index_count` indices.
#[inline]
fn record_len_words(index_count: usize) -> usize {
    RecordHeader::WORDS + index_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{BlendMode, LightRef, PrimitiveFlags, PrimitiveKind};

    fn small() -> PrimitiveArena {
        PrimitiveArena::new(ArenaConfig { initial_bytes: 0, growth_padding_bytes: 0 })
    }

    #[test]
    fn append_writes_sequential_run_for_fans() {
        let mut arena = small();
        let h = arena.append(&PrimitiveDesc::fan(10, 4));
        let p = arena.get(h).unwrap();
        assert_eq!(p.kind(), PrimitiveKind::Fan);
        assert_eq!(p.indices(), &[10, 11, 12, 13]);
        assert_eq!(p.base_index(), 10);
        assert_eq!(p.size_bytes() as usize, record_len_words(4) * 4);
    }

    #[test]
    fn records_survive_repeated_growth() {
        let mut arena = small();
        let mut written = Vec::new();
        for i in 0..240u32 {
            let count = 4 + i % 7;
            let base = i * 16;
            let tri = [base, base + 1, base + 2, base, base + 2, base + count - 1];
            let desc = match i % 4 {
                0 => PrimitiveDesc::fan(base, count).blended(BlendMode::Add),
                1 => PrimitiveDesc::double_fan(base, count, count / 2).with_light(LightRef(i)),
                2 => PrimitiveDesc::triangles(base, count, &tri),
                _ => PrimitiveDesc::fan(base, count).with_light(LightRef(i)),
            };
            let expect: Vec<u32> = match desc.kind {
                PrimitiveKind::Triangles => tri.to_vec(),
                _ => (base..base + count).collect(),
            };
            let h = arena.append(&desc);
            written.push((h, desc.kind, desc.flags, count, desc.begin_other, desc.light, expect));
        }
        assert!(arena.growth_count() >= 2, "growths: {}", arena.growth_count());

        for (h, kind, flags, count, begin_other, light, expect) in &written {
            let p = arena.get(*h).unwrap();
            assert_eq!(p.kind(), *kind);
            assert_eq!(p.flags(), *flags);
            assert_eq!(p.vertex_count(), *count);
            assert_eq!(p.begin_other(), *begin_other);
            assert_eq!(p.light(), *light);
            assert_eq!(p.indices(), expect.as_slice());
        }

        let iterated: Vec<_> = arena.iter().map(|p| p.handle()).collect();
        let handles: Vec<_> = written.iter().map(|w| w.0).collect();
        assert_eq!(iterated, handles);
    }

    #[test]
    fn last_tracks_most_recent_record() {
        let mut arena = small();
        assert!(arena.last().is_none());
        arena.append(&PrimitiveDesc::fan(0, 3));
        let h = arena.append(&PrimitiveDesc::fan(3, 5));
        assert_eq!(arena.last().unwrap().handle(), h);
    }

    #[test]
    fn rewind_keeps_allocation_and_invalidates_handles() {
        let mut arena = small();
        let h = arena.append(&PrimitiveDesc::fan(0, 8));
        let cap = arena.capacity_bytes();
        arena.rewind();

        assert!(arena.is_empty());
        assert!(arena.last().is_none());
        assert!(arena.get(h).is_none());
        assert_eq!(arena.capacity_bytes(), cap);
        assert_eq!(arena.iter().count(), 0);
    }

    #[test]
    fn clear_releases_allocation() {
        let mut arena = small();
        arena.append(&PrimitiveDesc::fan(0, 8));
        arena.clear();
        assert_eq!(arena.capacity_bytes(), 0);
        assert!(arena.is_empty());
    }

    #[test]
    fn explicit_indices_and_double_fan_split_are_stored() {
        let mut arena = small();
        let idx = [4, 5, 6, 6, 5, 7];
        let t = arena.append(&PrimitiveDesc::triangles(4, 4, &idx));
        let d = arena.append(&PrimitiveDesc::double_fan(20, 8, 4).with_flags(PrimitiveFlags::MANY_LIGHTS));

        assert_eq!(arena.get(t).unwrap().indices(), &idx);
        let d = arena.get(d).unwrap();
        assert_eq!(d.kind(), PrimitiveKind::DoubleFan);
        assert_eq!(d.begin_other(), 4);
        assert!(d.flags().contains(PrimitiveFlags::MANY_LIGHTS));
    }

    #[test]
    fn ensure_space_honors_padding() {
        let mut arena = PrimitiveArena::new(ArenaConfig { initial_bytes: 0, growth_padding_bytes: 400 });
        arena.ensure_space(4);
        assert!(arena.capacity_bytes() >= 404);
        assert_eq!(arena.growth_count(), 1);
        arena.ensure_space(4);
        assert_eq!(arena.growth_count(), 1);
    }
}
