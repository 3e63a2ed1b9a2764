//! Vertex Buffer Store.
//!
//! Flat, index-addressed vertex attribute arrays shared by every draw list in
//! a frame. Draw lists never hold pointers into the store, only indices; the
//! store may reallocate whenever it grows.

mod channel;
mod store;

pub use channel::{TEX_COORD_CHANNELS, TexCoordChannel};
pub use store::{Vertex, VertexIndex, VertexStore, VertexStoreConfig};
