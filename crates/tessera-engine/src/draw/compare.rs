use super::{DrawListSpec, GeomGroup, HASHED_GROUPS, TexUnitId};

/// Per-group list-matching policy.
///
/// Decides whether detail units take part when a requested spec is compared
/// with an existing list. Shiny geometry never carries detail maps, so by
/// default it compares the primary/inter units alone.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ComparePolicy {
    compare_detail: [bool; HASHED_GROUPS],
}

impl Default for ComparePolicy {
    fn default() -> Self {
        let mut compare_detail = [true; HASHED_GROUPS];
        if let Some(shine) = GeomGroup::Shine.bucket() {
            compare_detail[shine] = false;
        }
        Self { compare_detail }
    }
}

impl ComparePolicy {
    /// Sets whether `group` compares detail units. Sky-mask is never compared.
    pub fn with_detail(mut self, group: GeomGroup, compare: bool) -> Self {
        if let Some(slot) = group.bucket() {
            self.compare_detail[slot] = compare;
        }
        self
    }

    #[inline]
    pub fn compares_detail(&self, group: GeomGroup) -> bool {
        group.bucket().is_some_and(|slot| self.compare_detail[slot])
    }

    /// Primary (and primary-detail) units of `list` match the request.
    ///
    /// The light unit is bound per list and is always compared.
    pub(crate) fn primary_matches(&self, list: &DrawListSpec, req: &DrawListSpec) -> bool {
        list.unit(TexUnitId::Primary).matches(req.unit(TexUnitId::Primary))
            && list.unit(TexUnitId::Light).matches(req.unit(TexUnitId::Light))
            && (!self.compares_detail(req.group)
                || list
                    .unit(TexUnitId::PrimaryDetail)
                    .matches(req.unit(TexUnitId::PrimaryDetail)))
    }

    /// Interpolation-target (and inter-detail) units of `list` match the request.
    pub(crate) fn inter_matches(&self, list: &DrawListSpec, req: &DrawListSpec) -> bool {
        list.unit(TexUnitId::Inter).matches(req.unit(TexUnitId::Inter))
            && (!self.compares_detail(req.group)
                || list
                    .unit(TexUnitId::InterDetail)
                    .matches(req.unit(TexUnitId::InterDetail)))
    }

    /// Copies the request's interpolation target onto an empty list.
    pub(crate) fn retarget(&self, list: &mut DrawListSpec, req: &DrawListSpec) {
        *list.unit_mut(TexUnitId::Inter) = *req.unit(TexUnitId::Inter);
        if self.compares_detail(req.group) {
            *list.unit_mut(TexUnitId::InterDetail) = *req.unit(TexUnitId::InterDetail);
        }
    }
}
