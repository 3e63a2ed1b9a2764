use smallvec::SmallVec;

use crate::draw::{BlendMode, DrawList, GeomGroup, TexUnitId};

/// One replay pass: which groups it draws and how it configures state.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DrawMode {
    /// Depth-only sky mask; color writes disabled.
    SkyMask,
    Unlit,
    /// Lit geometry; selects the single- or many-light path per primitive.
    Lit,
    /// Detail textures multiplied over unlit and lit geometry.
    Details,
    /// Dynamic light contributions, added on top.
    DynamicLights,
    Shadows,
    /// Shiny reflections.
    Shiny,
}

impl DrawMode {
    pub const ALL: [DrawMode; 7] = [
        DrawMode::SkyMask,
        DrawMode::Unlit,
        DrawMode::Lit,
        DrawMode::Details,
        DrawMode::DynamicLights,
        DrawMode::Shadows,
        DrawMode::Shiny,
    ];

    /// Geometry groups visited by this mode, in order.
    pub const fn groups(self) -> &'static [GeomGroup] {
        match self {
            DrawMode::SkyMask => &[GeomGroup::SkyMask],
            DrawMode::Unlit => &[GeomGroup::Unlit],
            DrawMode::Lit => &[GeomGroup::Lit],
            DrawMode::Details => &[GeomGroup::Unlit, GeomGroup::Lit],
            DrawMode::DynamicLights => &[GeomGroup::Light],
            DrawMode::Shadows => &[GeomGroup::Shadow],
            DrawMode::Shiny => &[GeomGroup::Shine],
        }
    }

    /// Texture units bound for each list.
    pub const fn units(self) -> &'static [TexUnitId] {
        match self {
            DrawMode::SkyMask => &[],
            DrawMode::Unlit => &[TexUnitId::Primary, TexUnitId::Inter],
            DrawMode::Lit => &[TexUnitId::Primary, TexUnitId::Inter, TexUnitId::Light],
            DrawMode::Details => &[TexUnitId::PrimaryDetail, TexUnitId::InterDetail],
            DrawMode::DynamicLights | DrawMode::Shadows => &[TexUnitId::Primary],
            DrawMode::Shiny => &[TexUnitId::Primary, TexUnitId::Inter],
        }
    }

    /// Blend applied to every primitive of the pass regardless of its flags.
    pub const fn forced_blend(self) -> Option<BlendMode> {
        match self {
            DrawMode::Details => Some(BlendMode::Multiply),
            DrawMode::DynamicLights => Some(BlendMode::Add),
            DrawMode::Shadows => Some(BlendMode::Normal),
            _ => None,
        }
    }

    /// Whether `list` has nothing to contribute to this mode.
    pub fn skips_list(self, list: &DrawList) -> bool {
        match self {
            DrawMode::Details => !list.spec().unit(TexUnitId::PrimaryDetail).has_texture(),
            _ => false,
        }
    }

    /// Per-primitive light path selection is active.
    pub const fn uses_light_path(self) -> bool {
        matches!(self, DrawMode::Lit)
    }

    pub const fn writes_color(self) -> bool {
        !matches!(self, DrawMode::SkyMask)
    }

    pub const fn name(self) -> &'static str {
        match self {
            DrawMode::SkyMask => "sky-mask",
            DrawMode::Unlit => "unlit",
            DrawMode::Lit => "lit",
            DrawMode::Details => "details",
            DrawMode::DynamicLights => "dynamic-lights",
            DrawMode::Shadows => "shadows",
            DrawMode::Shiny => "shiny",
        }
    }
}

impl core::fmt::Display for DrawMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Toggles for the optional passes of [`RenderPlan::standard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayConfig {
    pub detail_pass: bool,
    pub shiny_pass: bool,
    pub dynlight_pass: bool,
    pub shadow_pass: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            detail_pass: true,
            shiny_pass: true,
            dynlight_pass: true,
            shadow_pass: true,
        }
    }
}

/// Ordered sequence of draw modes replayed each frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderPlan {
    modes: SmallVec<[DrawMode; 8]>,
}

impl RenderPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sky mask, unlit, lit, then the optional detail, dynamic light, shadow
    /// and shiny passes enabled in `config`.
    pub fn standard(config: &ReplayConfig) -> Self {
        let mut plan = Self::new();
        plan.push(DrawMode::SkyMask)
            .push(DrawMode::Unlit)
            .push(DrawMode::Lit);
        if config.detail_pass {
            plan.push(DrawMode::Details);
        }
        if config.dynlight_pass {
            plan.push(DrawMode::DynamicLights);
        }
        if config.shadow_pass {
            plan.push(DrawMode::Shadows);
        }
        if config.shiny_pass {
            plan.push(DrawMode::Shiny);
        }
        plan
    }

    pub fn push(&mut self, mode: DrawMode) -> &mut Self {
        self.modes.push(mode);
        self
    }

    #[inline]
    pub fn modes(&self) -> &[DrawMode] {
        &self.modes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

impl FromIterator<DrawMode> for RenderPlan {
    fn from_iter<I: IntoIterator<Item = DrawMode>>(iter: I) -> Self {
        Self {
            modes: iter.into_iter().collect(),
        }
    }
}
