/// Number of groups that own a texture-keyed hash table (every group but sky-mask).
pub const HASHED_GROUPS: usize = 5;

/// Geometry group: decides which pass consumes a list and how lists are matched.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GeomGroup {
    /// Fullbright or pre-lit geometry.
    Unlit,
    /// Geometry modulated by a light texture unit.
    Lit,
    /// Dynamic light contributions drawn on top of lit geometry.
    Light,
    /// Fake radiosity and object shadows.
    Shadow,
    /// Shiny surface reflections.
    Shine,
    /// Sky-masked geometry. Never textured; always one list.
    SkyMask,
}

impl GeomGroup {
    pub const ALL: [GeomGroup; 6] = [
        GeomGroup::Unlit,
        GeomGroup::Lit,
        GeomGroup::Light,
        GeomGroup::Shadow,
        GeomGroup::Shine,
        GeomGroup::SkyMask,
    ];

    /// Slot of this group's hash table, or `None` for sky-mask geometry.
    #[inline]
    pub const fn bucket(self) -> Option<usize> {
        match self {
            GeomGroup::SkyMask => None,
            g => Some(g as usize),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            GeomGroup::Unlit => "unlit",
            GeomGroup::Lit => "lit",
            GeomGroup::Light => "light",
            GeomGroup::Shadow => "shadow",
            GeomGroup::Shine => "shine",
            GeomGroup::SkyMask => "sky-mask",
        }
    }
}

impl core::fmt::Display for GeomGroup {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
