use crate::draw::{BlendMode, DrawList, DrawLists, NUM_TEXTURE_UNITS, Primitive, PrimitiveFlags};
use crate::vertex::VertexStore;

use super::{DrawMode, FrameStats, LightPath, ListState, PassStats, RenderPlan, ReplayBackend};

/// Drives a [`ReplayBackend`] over the non-empty lists of each pass.
#[derive(Debug, Default)]
pub struct Replayer {
    frames: u64,
}

impl Replayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames replayed through [`render_plan`](Self::render_plan).
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Replays every pass of `plan` in order.
    pub fn render_plan<B: ReplayBackend + ?Sized>(
        &mut self,
        lists: &DrawLists,
        store: &VertexStore,
        plan: &RenderPlan,
        backend: &mut B,
    ) -> FrameStats {
        let mut frame = FrameStats::default();
        for &mode in plan.modes() {
            frame.passes.push(self.render_pass(lists, store, mode, backend));
        }
        self.frames += 1;
        log::trace!("frame {}: {frame}", self.frames);
        frame
    }

    /// Replays one pass: binds each non-empty list of the mode's groups once,
    /// then draws its primitives in append order.
    ///
    /// Blend and light-path toggles are issued only when they differ from the
    /// value last applied in this pass.
    pub fn render_pass<B: ReplayBackend + ?Sized>(
        &mut self,
        lists: &DrawLists,
        store: &VertexStore,
        mode: DrawMode,
        backend: &mut B,
    ) -> PassStats {
        let mut stats = PassStats::new(mode);
        let mut visible = Vec::new();
        let mut blend: Option<Option<BlendMode>> = None;
        let mut light: Option<LightPath> = None;

        backend.begin_pass(mode);
        for &group in mode.groups() {
            lists.find_all(group, &mut visible);
            for list in &visible {
                if mode.skips_list(list) {
                    stats.lists_skipped += 1;
                    continue;
                }
                backend.bind_list(&list_state(mode, list));
                stats.lists_bound += 1;

                for prim in list.primitives() {
                    let want = blend_for(mode, &prim);
                    if blend != Some(want) {
                        backend.set_blend(want);
                        blend = Some(want);
                        stats.blend_changes += 1;
                    }

                    if mode.uses_light_path() {
                        let path = light_path_for(&prim);
                        if light != Some(path) {
                            backend.set_light_path(path);
                            light = Some(path);
                            stats.light_path_changes += 1;
                        }
                    }

                    backend.draw(store, &prim);
                    stats.primitives += 1;
                    stats.indices += prim.indices().len();
                }
            }
        }
        backend.end_pass(mode);
        stats
    }
}

fn list_state(mode: DrawMode, list: &DrawList) -> ListState<'_> {
    let mut units = [None; NUM_TEXTURE_UNITS];
    for &id in mode.units() {
        units[id.index()] = Some(list.spec().unit(id));
    }
    ListState {
        id: list.id(),
        mode,
        group: list.group(),
        units,
        interpolation: list.interpolation_target(),
        color_writes: mode.writes_color(),
    }
}

fn blend_for(mode: DrawMode, prim: &Primitive<'_>) -> Option<BlendMode> {
    if !mode.writes_color() {
        return None;
    }
    mode.forced_blend()
        .or_else(|| prim.is_blended().then(|| prim.blend_mode()))
}

fn light_path_for(prim: &Primitive<'_>) -> LightPath {
    if prim.flags().contains(PrimitiveFlags::MANY_LIGHTS) {
        return LightPath::Many;
    }
    match prim.light() {
        Some(light) => LightPath::Single(light),
        None => LightPath::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{
        DrawListId, DrawListSpec, GeomGroup, GlTexUnit, LightRef, PrimitiveDesc, TexUnitId,
        TextureHandle,
    };
    use crate::replay::{CountingBackend, ReplayConfig, ReplayEvent};

    fn spec(group: GeomGroup, primary: u32) -> DrawListSpec {
        DrawListSpec::new(group).with_unit(TexUnitId::Primary, GlTexUnit::new(TextureHandle(primary)))
    }

    struct Frame {
        store: VertexStore,
        lists: DrawLists,
    }

    impl Frame {
        fn new() -> Self {
            Self {
                store: VertexStore::default(),
                lists: DrawLists::default(),
            }
        }

        fn add(&mut self, spec: DrawListSpec, f: impl FnOnce(PrimitiveDesc<'static>) -> PrimitiveDesc<'static>) -> DrawListId {
            let base = self.store.allocate(4);
            let list = self.lists.find(&spec);
            list.add_primitive(&self.store, f(PrimitiveDesc::fan(base, 4)));
            list.id()
        }

        fn replay(&self, mode: DrawMode) -> (CountingBackend, PassStats) {
            let mut backend = CountingBackend::new();
            let stats = Replayer::new().render_pass(&self.lists, &self.store, mode, &mut backend);
            (backend, stats)
        }
    }

    // ── list binding ──────────────────────────────────────────────────────

    #[test]
    fn each_non_empty_list_bound_once() {
        let mut f = Frame::new();
        let a = f.add(spec(GeomGroup::Unlit, 1), |d| d);
        f.add(spec(GeomGroup::Unlit, 1), |d| d);
        let b = f.add(spec(GeomGroup::Unlit, 2), |d| d);
        f.lists.find(&spec(GeomGroup::Unlit, 3));

        let (backend, stats) = f.replay(DrawMode::Unlit);
        assert_eq!(backend.bound_lists(), vec![a, b]);
        assert_eq!(backend.draws_for(a), 2);
        assert_eq!(backend.draws_for(b), 1);
        assert_eq!(stats.lists_bound, 2);
        assert_eq!(stats.primitives, 3);
        assert_eq!(stats.indices, 12);
    }

    #[test]
    fn draws_follow_their_bind() {
        let mut f = Frame::new();
        f.add(spec(GeomGroup::Unlit, 1), |d| d);
        f.add(spec(GeomGroup::Unlit, 2), |d| d);
        f.add(spec(GeomGroup::Unlit, 1), |d| d);

        let (backend, _) = f.replay(DrawMode::Unlit);
        let mut current = None;
        for event in backend.events() {
            match *event {
                ReplayEvent::Bind { list, .. } => current = Some(list),
                ReplayEvent::Draw { list, .. } => assert_eq!(Some(list), current),
                _ => {}
            }
        }
    }

    #[test]
    fn other_groups_are_not_visited() {
        let mut f = Frame::new();
        f.add(spec(GeomGroup::Lit, 1), |d| d);
        let (backend, stats) = f.replay(DrawMode::Unlit);
        assert!(backend.bound_lists().is_empty());
        assert_eq!(stats.primitives, 0);
    }

    #[test]
    fn bound_units_follow_mode() {
        let mut f = Frame::new();
        let lit = spec(GeomGroup::Lit, 1)
            .with_unit(TexUnitId::Inter, GlTexUnit::new(TextureHandle(2)).with_opacity(0.25))
            .with_unit(TexUnitId::Light, GlTexUnit::new(TextureHandle(3)));
        f.add(lit, |d| d);

        let (backend, _) = f.replay(DrawMode::Lit);
        let ReplayEvent::Bind { units, interpolation, color_writes, .. } = backend.events()[1] else {
            panic!("expected bind, got {:?}", backend.events()[1]);
        };
        assert_eq!(units[TexUnitId::Primary.index()], Some(TextureHandle(1)));
        assert_eq!(units[TexUnitId::Inter.index()], Some(TextureHandle(2)));
        assert_eq!(units[TexUnitId::Light.index()], Some(TextureHandle(3)));
        assert_eq!(units[TexUnitId::PrimaryDetail.index()], None);
        assert!((interpolation - 0.25).abs() < 1e-6);
        assert!(color_writes);
    }

    #[test]
    fn details_pass_skips_lists_without_detail_texture() {
        let mut f = Frame::new();
        f.add(spec(GeomGroup::Unlit, 1), |d| d);
        let detailed = f.add(
            spec(GeomGroup::Lit, 1).with_unit(TexUnitId::PrimaryDetail, GlTexUnit::new(TextureHandle(9))),
            |d| d,
        );

        let (backend, stats) = f.replay(DrawMode::Details);
        assert_eq!(backend.bound_lists(), vec![detailed]);
        assert_eq!(stats.lists_skipped, 1);
        assert!(backend.events().contains(&ReplayEvent::Blend(Some(BlendMode::Multiply))));
    }

    #[test]
    fn sky_mask_pass_disables_color_and_blending() {
        let mut f = Frame::new();
        let base = f.store.allocate(8);
        f.lists
            .find(&DrawListSpec::new(GeomGroup::SkyMask))
            .add_primitive(&f.store, PrimitiveDesc::double_fan(base, 8, 4).blended(BlendMode::Add));

        let (backend, stats) = f.replay(DrawMode::SkyMask);
        let ReplayEvent::Bind { units, color_writes, .. } = backend.events()[1] else {
            panic!("expected bind");
        };
        assert!(!color_writes);
        assert!(units.iter().all(Option::is_none));
        assert!(backend.events().contains(&ReplayEvent::Blend(None)));
        assert_eq!(stats.primitives, 1);
    }

    // ── toggles ───────────────────────────────────────────────────────────

    #[test]
    fn blend_toggles_only_on_change() {
        let mut f = Frame::new();
        let s = spec(GeomGroup::Unlit, 1);
        f.add(s, |d| d);
        f.add(s, |d| d);
        f.add(s, |d| d.blended(BlendMode::Add));
        f.add(s, |d| d.blended(BlendMode::Add));
        f.add(s, |d| d);

        let (backend, stats) = f.replay(DrawMode::Unlit);
        assert_eq!(
            backend.blend_changes(),
            vec![None, Some(BlendMode::Add), None]
        );
        assert_eq!(stats.blend_changes, 3);
        assert_eq!(stats.primitives, 5);
    }

    #[test]
    fn forced_blend_is_set_once_per_pass() {
        let mut f = Frame::new();
        f.add(spec(GeomGroup::Light, 1), |d| d);
        f.add(spec(GeomGroup::Light, 2), |d| d.blended(BlendMode::Subtract));

        let (backend, _) = f.replay(DrawMode::DynamicLights);
        assert_eq!(backend.blend_changes(), vec![Some(BlendMode::Add)]);
    }

    #[test]
    fn light_path_follows_primitive_lights() {
        let mut f = Frame::new();
        let s = spec(GeomGroup::Lit, 1);
        f.add(s, |d| d.with_light(LightRef(4)));
        f.add(s, |d| d.with_light(LightRef(4)));
        f.add(s, |d| d.with_flags(PrimitiveFlags::MANY_LIGHTS));
        f.add(s, |d| d);

        let (backend, stats) = f.replay(DrawMode::Lit);
        assert_eq!(
            backend.light_paths(),
            vec![LightPath::Single(LightRef(4)), LightPath::Many, LightPath::None]
        );
        assert_eq!(stats.light_path_changes, 3);

        let (unlit, _) = {
            let mut g = Frame::new();
            g.add(spec(GeomGroup::Unlit, 1), |d| d.with_light(LightRef(4)));
            g.replay(DrawMode::Unlit)
        };
        assert!(unlit.light_paths().is_empty());
    }

    // ── frames ────────────────────────────────────────────────────────────

    #[test]
    fn plan_replays_every_pass_in_order() {
        let mut f = Frame::new();
        f.add(spec(GeomGroup::Unlit, 1), |d| d);
        f.add(spec(GeomGroup::Lit, 1), |d| d);
        f.add(spec(GeomGroup::Shine, 1), |d| d);

        let plan = RenderPlan::standard(&ReplayConfig::default());
        let mut backend = CountingBackend::new();
        let mut replayer = Replayer::new();
        let stats = replayer.render_plan(&f.lists, &f.store, &plan, &mut backend);

        assert_eq!(replayer.frames(), 1);
        assert_eq!(stats.passes.len(), plan.len());
        assert_eq!(stats.lists_bound(), 3);
        assert_eq!(stats.primitives(), 3);
        assert_eq!(stats.pass(DrawMode::Shiny).map(|p| p.primitives), Some(1));

        let passes: Vec<_> = backend
            .events()
            .iter()
            .filter_map(|e| match e {
                ReplayEvent::BeginPass(m) => Some(*m),
                _ => None,
            })
            .collect();
        assert_eq!(passes, plan.modes());
    }

    #[test]
    fn reset_lists_replay_nothing() {
        let mut f = Frame::new();
        f.add(spec(GeomGroup::Unlit, 1), |d| d);
        f.lists.reset();
        f.store.truncate();

        let plan = RenderPlan::standard(&ReplayConfig::default());
        let mut backend = CountingBackend::new();
        let stats = Replayer::new().render_plan(&f.lists, &f.store, &plan, &mut backend);
        assert_eq!(stats.primitives(), 0);
        assert_eq!(stats.state_changes(), 0);
        assert!(backend.bound_lists().is_empty());
    }
}
