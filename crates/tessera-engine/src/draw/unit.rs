use crate::coords::Vec2;

/// Number of texture units carried by a [`DrawListSpec`](super::DrawListSpec).
pub const NUM_TEXTURE_UNITS: usize = 5;

/// Opacity comparisons treat values closer than this as equal.
const OPACITY_EPSILON: f32 = 1.0e-5;

/// Opaque host texture name. Only identity matters to draw lists.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TextureHandle(pub u32);

/// Texture unit slot within a list spec.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TexUnitId {
    Primary,
    PrimaryDetail,
    /// Interpolation target (secondary texture) blended over the primary.
    Inter,
    InterDetail,
    /// Light/modulation texture.
    Light,
}

impl TexUnitId {
    pub const ALL: [TexUnitId; NUM_TEXTURE_UNITS] = [
        TexUnitId::Primary,
        TexUnitId::PrimaryDetail,
        TexUnitId::Inter,
        TexUnitId::InterDetail,
        TexUnitId::Light,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    ClampToEdge,
}

/// GL-state description of one texture unit.
///
/// `scale`/`offset` are the unit's default texture transform. They are not
/// part of list identity: primitives carry their own transform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlTexUnit {
    pub texture: Option<TextureHandle>,
    pub opacity: f32,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub scale: Vec2,
    pub offset: Vec2,
}

impl Default for GlTexUnit {
    fn default() -> Self {
        Self {
            texture: None,
            opacity: 1.0,
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            scale: Vec2::ONE,
            offset: Vec2::ZERO,
        }
    }
}

impl GlTexUnit {
    #[inline]
    pub fn new(texture: TextureHandle) -> Self {
        Self { texture: Some(texture), ..Self::default() }
    }

    #[inline]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    #[inline]
    pub fn with_wrap(mut self, wrap_s: WrapMode, wrap_t: WrapMode) -> Self {
        self.wrap_s = wrap_s;
        self.wrap_t = wrap_t;
        self
    }

    #[inline]
    pub fn with_transform(mut self, scale: Vec2, offset: Vec2) -> Self {
        self.scale = scale;
        self.offset = offset;
        self
    }

    #[inline]
    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    /// Drops the texture and zeroes opacity. Wrap modes and transform are kept.
    #[inline]
    pub fn unset(&mut self) {
        self.texture = None;
        self.opacity = 0.0;
    }

    /// List-identity comparison: texture, wrap modes and opacity.
    ///
    /// Scale and offset are primitive-specific and never compared.
    pub fn matches(&self, other: &GlTexUnit) -> bool {
        self.texture == other.texture
            && self.wrap_s == other.wrap_s
            && self.wrap_t == other.wrap_t
            && (self.opacity - other.opacity).abs() <= OPACITY_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_ignores_transform() {
        let a = GlTexUnit::new(TextureHandle(3));
        let b = a.with_transform(Vec2::new(2.0, 2.0), Vec2::new(0.5, 0.0));
        assert!(a.matches(&b));
    }

    #[test]
    fn matches_tolerates_float_noise_in_opacity() {
        let a = GlTexUnit::new(TextureHandle(3)).with_opacity(0.5);
        let b = a.with_opacity(0.5 + 1.0e-7);
        let c = a.with_opacity(0.6);
        assert!(a.matches(&b));
        assert!(!a.matches(&c));
    }

    #[test]
    fn matches_compares_texture_and_wrap() {
        let a = GlTexUnit::new(TextureHandle(3));
        assert!(!a.matches(&GlTexUnit::new(TextureHandle(4))));
        assert!(!a.matches(&a.with_wrap(WrapMode::ClampToEdge, WrapMode::Repeat)));
        assert!(!a.matches(&GlTexUnit::default()));
    }

    #[test]
    fn unset_clears_texture_and_opacity_only() {
        let mut u = GlTexUnit::new(TextureHandle(9))
            .with_opacity(0.3)
            .with_wrap(WrapMode::ClampToEdge, WrapMode::ClampToEdge);
        u.unset();
        assert!(!u.has_texture());
        assert_eq!(u.opacity, 0.0);
        assert_eq!(u.wrap_s, WrapMode::ClampToEdge);
    }
}
