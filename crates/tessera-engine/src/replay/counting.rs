use crate::draw::{
    BlendMode, DrawListId, NUM_TEXTURE_UNITS, Primitive, RecordHandle, TextureHandle,
};
use crate::vertex::VertexStore;

use super::{DrawMode, LightPath, ListState, ReplayBackend};

/// One call received by a [`CountingBackend`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ReplayEvent {
    BeginPass(DrawMode),
    Bind {
        list: DrawListId,
        mode: DrawMode,
        /// Texture of each bound unit.
        units: [Option<TextureHandle>; NUM_TEXTURE_UNITS],
        interpolation: f32,
        color_writes: bool,
    },
    Blend(Option<BlendMode>),
    LightPath(LightPath),
    Draw {
        list: DrawListId,
        handle: RecordHandle,
        /// Indices after triangulation.
        triangle_indices: usize,
    },
    EndPass(DrawMode),
}

/// Backend that records every call without rendering.
///
/// Used when no GPU adapter is available and for checking replay order.
#[derive(Debug, Default)]
pub struct CountingBackend {
    events: Vec<ReplayEvent>,
    current: Option<DrawListId>,
    scratch: Vec<u32>,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn events(&self) -> &[ReplayEvent] {
        &self.events
    }

    /// Forgets recorded events, keeping allocations.
    pub fn clear(&mut self) {
        self.events.clear();
        self.current = None;
    }

    /// Lists in bind order.
    pub fn bound_lists(&self) -> Vec<DrawListId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReplayEvent::Bind { list, .. } => Some(*list),
                _ => None,
            })
            .collect()
    }

    pub fn draws_for(&self, id: DrawListId) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ReplayEvent::Draw { list, .. } if *list == id))
            .count()
    }

    pub fn draw_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ReplayEvent::Draw { .. }))
            .count()
    }

    pub fn triangle_indices(&self) -> usize {
        self.events
            .iter()
            .map(|e| match e {
                ReplayEvent::Draw { triangle_indices, .. } => *triangle_indices,
                _ => 0,
            })
            .sum()
    }

    pub fn blend_changes(&self) -> Vec<Option<BlendMode>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReplayEvent::Blend(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    pub fn light_paths(&self) -> Vec<LightPath> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReplayEvent::LightPath(p) => Some(*p),
                _ => None,
            })
            .collect()
    }
}

impl ReplayBackend for CountingBackend {
    fn begin_pass(&mut self, mode: DrawMode) {
        self.events.push(ReplayEvent::BeginPass(mode));
    }

    fn bind_list(&mut self, state: &ListState<'_>) {
        self.current = Some(state.id);
        self.events.push(ReplayEvent::Bind {
            list: state.id,
            mode: state.mode,
            units: state.units.map(|u| u.and_then(|u| u.texture)),
            interpolation: state.interpolation,
            color_writes: state.color_writes,
        });
    }

    fn set_blend(&mut self, blend: Option<BlendMode>) {
        self.events.push(ReplayEvent::Blend(blend));
    }

    fn set_light_path(&mut self, path: LightPath) {
        self.events.push(ReplayEvent::LightPath(path));
    }

    fn draw(&mut self, _store: &VertexStore, prim: &Primitive<'_>) {
        let Some(list) = self.current else {
            log::warn!("draw without a bound list");
            return;
        };
        self.scratch.clear();
        let triangle_indices = prim.triangulate(&mut self.scratch);
        self.events.push(ReplayEvent::Draw {
            list,
            handle: prim.handle(),
            triangle_indices,
        });
    }

    fn end_pass(&mut self, mode: DrawMode) {
        self.events.push(ReplayEvent::EndPass(mode));
        self.current = None;
    }
}
