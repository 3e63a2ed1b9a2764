//! Draw list aggregation.
//!
//! World geometry is sorted into [`DrawList`]s keyed by the GL state it needs
//! (geometry group plus texture units). [`DrawLists`] owns the lists and picks
//! one per request; each list stores its primitives in a compact
//! [`PrimitiveArena`] of variable-length records.

mod arena;
mod compare;
mod group;
mod list;
mod lists;
mod primitive;
mod spec;
mod unit;

pub use arena::{ArenaConfig, PrimitiveArena, Primitives};
pub use compare::ComparePolicy;
pub use group::{GeomGroup, HASHED_GROUPS};
pub use list::{DrawList, DrawListId, ListFlags};
pub use lists::{DrawLists, DrawListsConfig, ListStats};
pub use primitive::{
    BlendMode, LightRef, Primitive, PrimitiveDesc, PrimitiveFlags, PrimitiveKind, RecordHandle,
    TexTransform,
};
pub use spec::{DrawListSpec, TextureKey};
pub use unit::{GlTexUnit, NUM_TEXTURE_UNITS, TexUnitId, TextureHandle, WrapMode};
