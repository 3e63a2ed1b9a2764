use crate::draw::{
    BlendMode, DrawListId, GeomGroup, GlTexUnit, LightRef, NUM_TEXTURE_UNITS, Primitive,
    TexUnitId,
};
use crate::vertex::VertexStore;

use super::DrawMode;

/// GL state of one list as seen by a backend: bound once before its primitives.
#[derive(Debug, Clone, Copy)]
pub struct ListState<'a> {
    pub id: DrawListId,
    pub mode: DrawMode,
    pub group: GeomGroup,
    /// Units bound by `mode`, indexed by [`TexUnitId::index`]; `None` when unbound.
    pub units: [Option<&'a GlTexUnit>; NUM_TEXTURE_UNITS],
    /// Blend factor toward the interpolation target.
    pub interpolation: f32,
    pub color_writes: bool,
}

impl<'a> ListState<'a> {
    #[inline]
    pub fn unit(&self, id: TexUnitId) -> Option<&'a GlTexUnit> {
        self.units[id.index()]
    }
}

/// Shading path for lit primitives.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LightPath {
    None,
    Single(LightRef),
    Many,
}

/// Sink for replayed draw lists.
///
/// The replayer guarantees `bind_list` precedes the draws of that list, and
/// that `set_blend`/`set_light_path` are only called when the value changes
/// within a pass.
pub trait ReplayBackend {
    fn begin_pass(&mut self, _mode: DrawMode) {}

    fn bind_list(&mut self, state: &ListState<'_>);

    /// `None` disables blending.
    fn set_blend(&mut self, blend: Option<BlendMode>);

    fn set_light_path(&mut self, path: LightPath);

    fn draw(&mut self, store: &VertexStore, prim: &Primitive<'_>);

    fn end_pass(&mut self, _mode: DrawMode) {}
}
