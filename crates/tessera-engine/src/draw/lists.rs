use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::arena::ArenaConfig;
use super::compare::ComparePolicy;
use super::list::{DrawList, DrawListId};
use super::spec::TextureKey;
use super::{DrawListSpec, GeomGroup, HASHED_GROUPS, TexUnitId};

/// Selector configuration.
#[derive(Debug, Clone, Default)]
pub struct DrawListsConfig {
    /// Arena policy applied to every list the selector creates.
    pub arena: ArenaConfig,
    /// Which units take part in list matching, per group.
    pub compare: ComparePolicy,
}

/// One group's lists plus its texture-keyed hash table.
///
/// `lists` keeps creation order, which is also replay order.
#[derive(Debug, Default)]
struct GroupLists {
    lists: Vec<DrawList>,
    buckets: FxHashMap<TextureKey, SmallVec<[usize; 2]>>,
}

/// Summary of the selector's current contents.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ListStats {
    /// Lists allocated, sky-mask included.
    pub lists: usize,
    /// Lists allocated per group, indexed in [`GeomGroup::ALL`] order.
    pub lists_per_group: [usize; GeomGroup::ALL.len()],
    /// Lists holding at least one primitive.
    pub non_empty: usize,
    pub primitives: usize,
    pub arena_bytes_used: usize,
    pub arena_bytes_reserved: usize,
}

/// Draw list selector.
///
/// Owns every draw list. Lists are bucketed per geometry group by the
/// primary texture; sky-mask geometry has a single dedicated list.
#[derive(Debug)]
pub struct DrawLists {
    config: DrawListsConfig,
    groups: [GroupLists; HASHED_GROUPS],
    sky_mask: DrawList,
    next_id: u32,
}

impl Default for DrawLists {
    fn default() -> Self {
        Self::new(DrawListsConfig::default())
    }
}

impl DrawLists {
    pub fn new(config: DrawListsConfig) -> Self {
        let sky_mask = DrawList::new(
            DrawListId(0),
            DrawListSpec::new(GeomGroup::SkyMask),
            config.arena.clone(),
        );
        Self {
            config,
            groups: Default::default(),
            sky_mask,
            next_id: 1,
        }
    }

    #[inline]
    pub fn config(&self) -> &DrawListsConfig {
        &self.config
    }

    /// Returns a list whose GL state is compatible with `spec`, creating one if needed.
    ///
    /// Candidates must match the request's primary, light and (per policy)
    /// primary-detail units. Lookup order within the bucket of `spec`'s
    /// primary texture:
    /// 1. a list whose interpolation target is unset, as is the request's;
    /// 2. a list whose interpolation target (and inter detail, per policy) matches;
    /// 3. the first empty list found, retargeted to the request's interpolation target;
    /// 4. a new list.
    ///
    /// Sky-mask requests always return the sky-mask list; their units are ignored.
    pub fn find(&mut self, spec: &DrawListSpec) -> &mut DrawList {
        let Some(slot) = spec.group.bucket() else {
            return &mut self.sky_mask;
        };

        let key = spec.key();
        let policy = self.config.compare;
        let group = &self.groups[slot];
        let wants_inter = spec.unit(TexUnitId::Inter).has_texture();

        let mut found = None;
        let mut convertible = None;
        if let Some(bucket) = group.buckets.get(&key) {
            for &i in bucket {
                let list = &group.lists[i];
                let list_spec = list.spec();
                if !policy.primary_matches(list_spec, spec) {
                    continue;
                }
                if !list_spec.unit(TexUnitId::Inter).has_texture() && !wants_inter {
                    found = Some(i);
                    break;
                }
                // First empty candidate wins.
                if convertible.is_none() && list.is_empty() && wants_inter {
                    convertible = Some(i);
                }
                if policy.inter_matches(list_spec, spec) {
                    found = Some(i);
                    break;
                }
            }
        }

        if let Some(i) = found {
            return &mut self.groups[slot].lists[i];
        }

        if let Some(i) = convertible {
            let list = &mut self.groups[slot].lists[i];
            policy.retarget(list.spec_mut(), spec);
            log::debug!(
                "draw list {} ({}) retargeted to interpolation texture {:?}",
                list.id().get(),
                spec.group,
                spec.unit(TexUnitId::Inter).texture
            );
            return list;
        }

        let id = DrawListId(self.next_id);
        self.next_id += 1;
        log::debug!("draw list {} created for {} texture key {key}", id.get(), spec.group);

        let group = &mut self.groups[slot];
        let index = group.lists.len();
        group.lists.push(DrawList::new(id, *spec, self.config.arena.clone()));
        group.buckets.entry(key).or_default().push(index);
        &mut group.lists[index]
    }

    /// Collects every non-empty list of `group` into `out` (cleared first) and
    /// returns how many were found.
    pub fn find_all<'a>(&'a self, group: GeomGroup, out: &mut Vec<&'a DrawList>) -> usize {
        out.clear();
        out.extend(self.iter_non_empty(group));
        out.len()
    }

    /// Non-empty lists of `group` in creation order.
    pub fn iter_non_empty(&self, group: GeomGroup) -> impl Iterator<Item = &DrawList> + '_ {
        let (hashed, sky): (&[DrawList], Option<&DrawList>) = match group.bucket() {
            Some(slot) => (&self.groups[slot].lists, None),
            None => (&[], Some(&self.sky_mask)),
        };
        hashed.iter().chain(sky).filter(|l| !l.is_empty())
    }

    #[inline]
    pub fn sky_mask(&self) -> &DrawList {
        &self.sky_mask
    }

    /// Lists allocated for `group`, empty ones included.
    pub fn list_count(&self, group: GeomGroup) -> usize {
        match group.bucket() {
            Some(slot) => self.groups[slot].lists.len(),
            None => 1,
        }
    }

    /// Rewinds every list in place for reuse next frame.
    ///
    /// List identities and specs survive, except each interpolation target,
    /// which is zeroed.
    pub fn reset(&mut self) {
        for group in &mut self.groups {
            for list in &mut group.lists {
                list.rewind();
            }
        }
        self.sky_mask.rewind();
        log::debug!("draw lists reset");
    }

    /// Destroys every list and recreates an empty sky-mask list.
    ///
    /// Ids are not reused: lists created afterwards get fresh ids.
    pub fn clear(&mut self) {
        let dropped: usize = self.groups.iter().map(|g| g.lists.len()).sum();
        self.groups = Default::default();

        let id = DrawListId(self.next_id);
        self.next_id += 1;
        self.sky_mask = DrawList::new(id, DrawListSpec::new(GeomGroup::SkyMask), self.config.arena.clone());
        log::debug!("draw lists cleared ({dropped} lists destroyed)");
    }

    pub fn stats(&self) -> ListStats {
        let all = self
            .groups
            .iter()
            .flat_map(|g| g.lists.iter())
            .chain(core::iter::once(&self.sky_mask));

        let mut stats = ListStats::default();
        for list in all {
            stats.lists += 1;
            stats.lists_per_group[list.group() as usize] += 1;
            stats.non_empty += usize::from(!list.is_empty());
            stats.primitives += list.len();
            stats.arena_bytes_used += list.arena().used_bytes();
            stats.arena_bytes_reserved += list.arena().capacity_bytes();
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Rgba8, Vec3};
    use crate::draw::{GlTexUnit, PrimitiveDesc, PrimitiveKind, TextureHandle};
    use crate::vertex::{Vertex, VertexStore};

    fn tex(group: GeomGroup, primary: u32) -> DrawListSpec {
        DrawListSpec::new(group).with_unit(TexUnitId::Primary, GlTexUnit::new(TextureHandle(primary)))
    }

    fn with_inter(spec: DrawListSpec, inter: u32) -> DrawListSpec {
        spec.with_unit(TexUnitId::Inter, GlTexUnit::new(TextureHandle(inter)).with_opacity(0.5))
    }

    fn quad(store: &mut VertexStore) -> PrimitiveDesc<'static> {
        let base = store.allocate(4);
        PrimitiveDesc::fan(base, 4)
    }

    // ── matching ──────────────────────────────────────────────────────────

    #[test]
    fn same_spec_returns_same_list() {
        let mut lists = DrawLists::default();
        let a = lists.find(&tex(GeomGroup::Unlit, 7)).id();
        let b = lists.find(&tex(GeomGroup::Unlit, 7)).id();
        assert_eq!(a, b);
        assert_eq!(lists.list_count(GeomGroup::Unlit), 1);
    }

    #[test]
    fn empty_list_is_retargeted_to_interpolation_target() {
        let mut lists = DrawLists::default();
        let first = lists.find(&tex(GeomGroup::Unlit, 7)).id();

        let list = lists.find(&with_inter(tex(GeomGroup::Unlit, 7), 8));
        assert_eq!(list.id(), first);
        assert_eq!(list.spec().unit(TexUnitId::Inter).texture, Some(TextureHandle(8)));
        assert_eq!(lists.list_count(GeomGroup::Unlit), 1);
    }

    #[test]
    fn non_empty_list_is_not_retargeted() {
        let mut store = VertexStore::default();
        let mut lists = DrawLists::default();
        let prim = quad(&mut store);
        let first = {
            let list = lists.find(&tex(GeomGroup::Unlit, 7));
            list.add_primitive(&store, prim);
            list.id()
        };

        let second = lists.find(&with_inter(tex(GeomGroup::Unlit, 7), 8));
        assert_ne!(second.id(), first);
        assert_eq!(second.spec().unit(TexUnitId::Inter).texture, Some(TextureHandle(8)));
        assert_eq!(lists.list_count(GeomGroup::Unlit), 2);
    }

    #[test]
    fn populated_interpolation_match_is_reused() {
        let mut store = VertexStore::default();
        let mut lists = DrawLists::default();

        // Empty list keyed on 7 without inter, then a populated list with inter 8.
        let empty = lists.find(&tex(GeomGroup::Unlit, 7)).id();
        let prim = quad(&mut store);
        let blended = {
            let list = lists.find(&with_inter(tex(GeomGroup::Unlit, 7), 8));
            assert_eq!(list.id(), empty);
            list.add_primitive(&store, prim);
            list.id()
        };
        lists.find(&tex(GeomGroup::Unlit, 7));

        let again = lists.find(&with_inter(tex(GeomGroup::Unlit, 7), 8)).id();
        assert_eq!(again, blended);
    }

    #[test]
    fn different_lightmaps_get_different_lists() {
        let mut store = VertexStore::default();
        let mut lists = DrawLists::default();
        let lightmap = |light: u32| {
            tex(GeomGroup::Lit, 1).with_unit(TexUnitId::Light, GlTexUnit::new(TextureHandle(light)))
        };

        let prim = quad(&mut store);
        let first = {
            let list = lists.find(&lightmap(10));
            list.add_primitive(&store, prim);
            list.id()
        };

        let second = lists.find(&lightmap(11));
        assert_ne!(second.id(), first);
        assert_eq!(second.spec().unit(TexUnitId::Light).texture, Some(TextureHandle(11)));

        let again = lists.find(&lightmap(10));
        assert_eq!(again.id(), first);
        assert_eq!(again.spec().unit(TexUnitId::Light).texture, Some(TextureHandle(10)));
        assert_eq!(lists.list_count(GeomGroup::Lit), 2);
    }

    #[test]
    fn empty_list_with_other_lightmap_is_not_reused() {
        let mut lists = DrawLists::default();
        let a = lists
            .find(&tex(GeomGroup::Lit, 1).with_unit(TexUnitId::Light, GlTexUnit::new(TextureHandle(10))))
            .id();
        let b = lists
            .find(&with_inter(tex(GeomGroup::Lit, 1), 4).with_unit(
                TexUnitId::Light,
                GlTexUnit::new(TextureHandle(11)),
            ))
            .id();
        assert_ne!(a, b);
    }

    #[test]
    fn groups_are_isolated() {
        let mut lists = DrawLists::default();
        let unlit = lists.find(&tex(GeomGroup::Unlit, 7)).id();
        let lit = lists.find(&tex(GeomGroup::Lit, 7)).id();
        assert_ne!(unlit, lit);
    }

    #[test]
    fn different_primary_textures_get_different_lists() {
        let mut lists = DrawLists::default();
        let a = lists.find(&tex(GeomGroup::Unlit, 1)).id();
        let b = lists.find(&tex(GeomGroup::Unlit, 2)).id();
        let c = lists.find(&tex(GeomGroup::Unlit, 1).with_unit(
            TexUnitId::Primary,
            GlTexUnit::new(TextureHandle(1)).with_opacity(0.25),
        ))
        .id();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn sky_mask_is_a_singleton_ignoring_units() {
        let mut lists = DrawLists::default();
        let a = lists.find(&DrawListSpec::new(GeomGroup::SkyMask)).id();
        let b = lists.find(&tex(GeomGroup::SkyMask, 99)).id();
        let c = lists.find(&with_inter(tex(GeomGroup::SkyMask, 3), 4)).id();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(lists.sky_mask().id(), a);
        assert!(!lists.sky_mask().spec().unit(TexUnitId::Primary).has_texture());
    }

    #[test]
    fn shine_ignores_detail_units_by_default() {
        let mut lists = DrawLists::default();
        let detail = |d: u32| {
            tex(GeomGroup::Shine, 5).with_unit(TexUnitId::PrimaryDetail, GlTexUnit::new(TextureHandle(d)))
        };
        let a = lists.find(&detail(1)).id();
        let b = lists.find(&detail(2)).id();
        assert_eq!(a, b);

        let unlit_detail = |d: u32| {
            tex(GeomGroup::Unlit, 5).with_unit(TexUnitId::PrimaryDetail, GlTexUnit::new(TextureHandle(d)))
        };
        let c = lists.find(&unlit_detail(1)).id();
        let d = lists.find(&unlit_detail(2)).id();
        assert_ne!(c, d);
    }

    #[test]
    fn compare_policy_is_configurable() {
        let config = DrawListsConfig {
            compare: ComparePolicy::default().with_detail(GeomGroup::Unlit, false),
            ..DrawListsConfig::default()
        };
        let mut lists = DrawLists::new(config);
        let detail = |d: u32| {
            tex(GeomGroup::Unlit, 5).with_unit(TexUnitId::PrimaryDetail, GlTexUnit::new(TextureHandle(d)))
        };
        let a = lists.find(&detail(1)).id();
        let b = lists.find(&detail(2)).id();
        assert_eq!(a, b);
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn reset_preserves_identity_and_empties_lists() {
        let mut store = VertexStore::default();
        let mut lists = DrawLists::default();
        let prim = quad(&mut store);
        let spec = with_inter(tex(GeomGroup::Lit, 3), 4);
        let id = {
            let list = lists.find(&spec);
            list.add_primitive(&store, prim);
            list.id()
        };

        lists.reset();
        let mut out = Vec::new();
        assert_eq!(lists.find_all(GeomGroup::Lit, &mut out), 0);
        drop(out);

        let list = lists.find(&tex(GeomGroup::Lit, 3));
        assert_eq!(list.id(), id);
        assert!(list.is_empty());
        assert_eq!(list.spec().unit(TexUnitId::Primary).texture, Some(TextureHandle(3)));
        assert!(!list.spec().unit(TexUnitId::Inter).has_texture());
        assert_eq!(list.spec().unit(TexUnitId::Inter).opacity, 0.0);
    }

    #[test]
    fn clear_tears_down_and_allocates_fresh_lists() {
        let mut lists = DrawLists::default();
        let before = lists.find(&tex(GeomGroup::Unlit, 3)).id();
        let sky_before = lists.sky_mask().id();

        lists.clear();
        assert_eq!(lists.list_count(GeomGroup::Unlit), 0);
        let after = lists.find(&tex(GeomGroup::Unlit, 3)).id();
        assert_ne!(before, after);
        assert_ne!(lists.sky_mask().id(), sky_before);
        assert!(lists.sky_mask().is_empty());
    }

    #[test]
    fn find_all_returns_only_non_empty_lists_of_group() {
        let mut store = VertexStore::default();
        let mut lists = DrawLists::default();

        let mut add = |lists: &mut DrawLists, spec: DrawListSpec| {
            let prim = quad(&mut store);
            let list = lists.find(&spec);
            list.add_primitive(&store, prim);
            list.id()
        };
        let u1 = add(&mut lists, tex(GeomGroup::Unlit, 1));
        let u2 = add(&mut lists, tex(GeomGroup::Unlit, 2));
        let l1 = add(&mut lists, tex(GeomGroup::Lit, 1));
        lists.find(&tex(GeomGroup::Unlit, 9));

        let mut out = Vec::new();
        assert_eq!(lists.find_all(GeomGroup::Unlit, &mut out), 2);
        let ids: Vec<_> = out.iter().map(|l| l.id()).collect();
        assert_eq!(ids, vec![u1, u2]);

        assert_eq!(lists.find_all(GeomGroup::Lit, &mut out), 1);
        assert_eq!(out[0].id(), l1);
        assert_eq!(lists.find_all(GeomGroup::Shadow, &mut out), 0);
        assert_eq!(lists.find_all(GeomGroup::SkyMask, &mut out), 0);
    }

    #[test]
    fn find_all_sky_mask_returns_singleton_when_populated() {
        let mut store = VertexStore::default();
        let mut lists = DrawLists::default();
        let base = store.allocate(8);
        lists
            .find(&DrawListSpec::new(GeomGroup::SkyMask))
            .add_primitive(&store, PrimitiveDesc::double_fan(base, 8, 4));

        let mut out = Vec::new();
        assert_eq!(lists.find_all(GeomGroup::SkyMask, &mut out), 1);
        assert_eq!(out[0].id(), lists.sky_mask().id());
    }

    #[test]
    fn stats_count_lists_and_primitives() {
        let mut store = VertexStore::default();
        let mut lists = DrawLists::default();
        let prim = quad(&mut store);
        lists.find(&tex(GeomGroup::Unlit, 1)).add_primitive(&store, prim);
        lists.find(&tex(GeomGroup::Lit, 1));

        let s = lists.stats();
        assert_eq!(s.lists, 3);
        assert_eq!(s.lists_per_group, [1, 1, 0, 0, 0, 1]);
        assert_eq!(s.non_empty, 1);
        assert_eq!(s.primitives, 1);
        assert!(s.arena_bytes_used > 0);
        assert!(s.arena_bytes_reserved >= s.arena_bytes_used);
    }

    // ── end to end ────────────────────────────────────────────────────────

    #[test]
    fn quad_fan_round_trips_through_find_all() {
        let positions = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let mut store = VertexStore::default();
        let base = store.allocate(0);
        for p in positions {
            store.append(Vertex::new(p).with_color(Rgba8::new(255, 255, 255, 255)));
        }

        let mut lists = DrawLists::default();
        lists
            .find(&tex(GeomGroup::Unlit, 7))
            .add_primitive(&store, PrimitiveDesc::fan(base, 4));

        let mut out = Vec::new();
        assert_eq!(lists.find_all(GeomGroup::Unlit, &mut out), 1);
        assert!(!out[0].is_empty());

        let prims: Vec<_> = out[0].primitives().collect();
        assert_eq!(prims.len(), 1);
        assert_eq!(prims[0].kind(), PrimitiveKind::Fan);
        assert_eq!(prims[0].vertex_count(), 4);
        assert_eq!(prims[0].indices().len(), 4);

        let resolved: Vec<_> = prims[0]
            .indices()
            .iter()
            .map(|&i| store.positions()[i as usize])
            .collect();
        assert_eq!(resolved, positions);
    }
}
