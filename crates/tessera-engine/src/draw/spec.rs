use super::{GeomGroup, GlTexUnit, NUM_TEXTURE_UNITS, TexUnitId};

/// Hash key of a draw list: the primary unit's texture name, `0` when untextured.
pub type TextureKey = u32;

/// GL-state key of a draw list: geometry group plus texture units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawListSpec {
    pub group: GeomGroup,
    pub units: [GlTexUnit; NUM_TEXTURE_UNITS],
}

impl DrawListSpec {
    pub fn new(group: GeomGroup) -> Self {
        Self {
            group,
            units: [GlTexUnit::default(); NUM_TEXTURE_UNITS],
        }
    }

    #[inline]
    pub fn with_unit(mut self, id: TexUnitId, unit: GlTexUnit) -> Self {
        self.units[id.index()] = unit;
        self
    }

    #[inline]
    pub fn unit(&self, id: TexUnitId) -> &GlTexUnit {
        &self.units[id.index()]
    }

    #[inline]
    pub fn unit_mut(&mut self, id: TexUnitId) -> &mut GlTexUnit {
        &mut self.units[id.index()]
    }

    #[inline]
    pub fn key(&self) -> TextureKey {
        self.unit(TexUnitId::Primary).texture.map_or(0, |t| t.0)
    }
}
