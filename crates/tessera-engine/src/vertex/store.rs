use crate::coords::{Rgba8, Vec2, Vec3};
use crate::fatal::alloc_exhausted;

use super::{TEX_COORD_CHANNELS, TexCoordChannel};

/// Index of a vertex in the [`VertexStore`]. Valid only within the frame that produced it.
pub type VertexIndex = u32;

/// Vertex store configuration.
#[derive(Debug, Clone)]
pub struct VertexStoreConfig {
    /// Vertices reserved up front in every parallel array.
    pub initial_capacity: usize,
}

impl Default for VertexStoreConfig {
    fn default() -> Self {
        Self { initial_capacity: 4096 }
    }
}

/// One logical vertex: a position, one coordinate per channel, and a color.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub tex_coords: [Vec2; TEX_COORD_CHANNELS],
    pub color: Rgba8,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            tex_coords: [Vec2::ZERO; TEX_COORD_CHANNELS],
            color: Rgba8::WHITE,
        }
    }
}

impl Vertex {
    #[inline]
    pub fn new(position: Vec3) -> Self {
        Self { position, ..Self::default() }
    }

    #[inline]
    pub fn with_tex_coord(mut self, channel: TexCoordChannel, uv: Vec2) -> Self {
        self.tex_coords[channel.index()] = uv;
        self
    }

    #[inline]
    pub fn with_color(mut self, color: Rgba8) -> Self {
        self.color = color;
        self
    }
}

/// Structure-of-arrays vertex storage.
///
/// Invariant: `positions`, every `tex_coords[k]` and `colors` always have the
/// same length. All growth goes through [`reserve`](Self::reserve), which
/// reserves every array before any of them is written.
///
/// Lifecycle: constructed once by the renderer, [`truncate`](Self::truncate)d
/// at frame start, grown monotonically during scene traversal.
#[derive(Debug)]
pub struct VertexStore {
    positions: Vec<Vec3>,
    tex_coords: [Vec<Vec2>; TEX_COORD_CHANNELS],
    colors: Vec<Rgba8>,
}

impl Default for VertexStore {
    fn default() -> Self {
        Self::new(VertexStoreConfig::default())
    }
}

impl VertexStore {
    pub fn new(config: VertexStoreConfig) -> Self {
        let n = config.initial_capacity;
        Self {
            positions: Vec::with_capacity(n),
            tex_coords: std::array::from_fn(|_| Vec::with_capacity(n)),
            colors: Vec::with_capacity(n),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of vertices that fit before the next reallocation.
    pub fn capacity(&self) -> usize {
        self.tex_coords
            .iter()
            .map(Vec::capacity)
            .fold(self.positions.capacity().min(self.colors.capacity()), usize::min)
    }

    /// Ensures room for at least `additional` more vertices in every array.
    ///
    /// # Panics
    /// Panics if any array cannot grow, or if the store would exceed
    /// `u32::MAX` vertices.
    pub fn reserve(&mut self, additional: usize) {
        let needed = self.len().saturating_add(additional);
        if needed > VertexIndex::MAX as usize {
            log::error!("vertex store: {needed} vertices exceed the index range");
            panic!("vertex store exhausted: {needed} vertices exceed the index range");
        }

        if let Err(err) = self.positions.try_reserve(additional) {
            alloc_exhausted("vertex store positions", additional, err);
        }
        for coords in &mut self.tex_coords {
            if let Err(err) = coords.try_reserve(additional) {
                alloc_exhausted("vertex store texcoords", additional, err);
            }
        }
        if let Err(err) = self.colors.try_reserve(additional) {
            alloc_exhausted("vertex store colors", additional, err);
        }
    }

    /// Appends one vertex to every parallel array and returns its index.
    pub fn append(&mut self, vertex: Vertex) -> VertexIndex {
        self.reserve(1);
        let index = self.len() as VertexIndex;

        self.positions.push(vertex.position);
        for (coords, uv) in self.tex_coords.iter_mut().zip(vertex.tex_coords) {
            coords.push(uv);
        }
        self.colors.push(vertex.color);

        self.debug_assert_parallel();
        index
    }

    /// Appends `count` default vertices and returns the index of the first one.
    ///
    /// The run is contiguous: `base..base + count`. Fill it with [`set`](Self::set).
    pub fn allocate(&mut self, count: usize) -> VertexIndex {
        self.reserve(count);
        let base = self.len() as VertexIndex;
        let new_len = self.len() + count;
        let v = Vertex::default();

        self.positions.resize(new_len, v.position);
        for (coords, uv) in self.tex_coords.iter_mut().zip(v.tex_coords) {
            coords.resize(new_len, uv);
        }
        self.colors.resize(new_len, v.color);

        self.debug_assert_parallel();
        base
    }

    /// Overwrites the vertex at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn set(&mut self, index: VertexIndex, vertex: Vertex) {
        let i = index as usize;
        self.positions[i] = vertex.position;
        for (coords, uv) in self.tex_coords.iter_mut().zip(vertex.tex_coords) {
            coords[i] = uv;
        }
        self.colors[i] = vertex.color;
    }

    /// Drops every vertex but keeps the allocations for the next frame.
    pub fn truncate(&mut self) {
        self.positions.clear();
        for coords in &mut self.tex_coords {
            coords.clear();
        }
        self.colors.clear();
    }

    /// Reassembles the vertex at `index`, or `None` if out of range.
    pub fn get(&self, index: VertexIndex) -> Option<Vertex> {
        let i = index as usize;
        let position = *self.positions.get(i)?;
        Some(Vertex {
            position,
            tex_coords: std::array::from_fn(|k| self.tex_coords[k][i]),
            color: self.colors[i],
        })
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn tex_coords(&self, channel: TexCoordChannel) -> &[Vec2] {
        &self.tex_coords[channel.index()]
    }

    #[inline]
    pub fn colors(&self) -> &[Rgba8] {
        &self.colors
    }

    #[inline]
    fn debug_assert_parallel(&self) {
        debug_assert!(
            self.tex_coords.iter().all(|c| c.len() == self.positions.len())
                && self.colors.len() == self.positions.len(),
            "vertex store arrays out of step"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lens(store: &VertexStore) -> Vec<usize> {
        let mut v = vec![store.positions().len(), store.colors().len()];
        v.extend(TexCoordChannel::ALL.iter().map(|&c| store.tex_coords(c).len()));
        v
    }

    fn assert_parallel(store: &VertexStore) {
        let l = lens(store);
        assert!(l.iter().all(|&n| n == store.len()), "lengths diverged: {l:?}");
    }

    #[test]
    fn append_grows_every_array_together() {
        let mut store = VertexStore::new(VertexStoreConfig { initial_capacity: 1 });
        for i in 0..100 {
            let idx = store.append(Vertex::new(Vec3::new(i as f32, 0.0, 0.0)));
            assert_eq!(idx, i);
            assert_parallel(&store);
        }
        assert_eq!(store.len(), 100);
    }

    #[test]
    fn allocate_returns_contiguous_base() {
        let mut store = VertexStore::default();
        store.append(Vertex::default());
        let base = store.allocate(4);
        assert_eq!(base, 1);
        assert_eq!(store.len(), 5);
        assert_parallel(&store);

        let again = store.allocate(2);
        assert_eq!(again, 5);
    }

    #[test]
    fn set_and_get_round_trip_every_attribute() {
        let mut store = VertexStore::default();
        let base = store.allocate(2);
        let v = Vertex::new(Vec3::new(1.0, 2.0, 3.0))
            .with_tex_coord(TexCoordChannel::Main, Vec2::new(0.25, 0.5))
            .with_tex_coord(TexCoordChannel::Light, Vec2::new(0.75, 1.0))
            .with_color(Rgba8::new(10, 20, 30, 40));
        store.set(base + 1, v);

        assert_eq!(store.get(base + 1), Some(v));
        assert_eq!(store.get(base), Some(Vertex::default()));
        assert_eq!(store.get(2), None);
    }

    #[test]
    fn truncate_keeps_capacity() {
        let mut store = VertexStore::new(VertexStoreConfig { initial_capacity: 0 });
        store.allocate(256);
        let cap = store.capacity();
        assert!(cap >= 256);

        store.truncate();
        assert!(store.is_empty());
        assert_parallel(&store);
        assert_eq!(store.capacity(), cap);
    }

    #[test]
    fn reserve_raises_capacity_of_every_array() {
        let mut store = VertexStore::new(VertexStoreConfig { initial_capacity: 0 });
        store.reserve(64);
        assert!(store.capacity() >= 64);
        assert!(store.is_empty());
    }
}
