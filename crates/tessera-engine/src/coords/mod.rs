//! Plain value types shared by the vertex store, draw lists and renderers.
//!
//! World space is right-handed with +Z up. Texture coordinates are in texels
//! divided by texture size (i.e. normalized), origin top-left.

mod color;
mod vec2;
mod vec3;

pub use color::Rgba8;
pub use vec2::Vec2;
pub use vec3::Vec3;
