//! Tessera engine crate.
//!
//! Per-frame draw list aggregation for world geometry:
//! - [`vertex`]: the shared vertex buffer store every primitive indexes into
//! - [`draw`]: GL-state keyed draw lists, their primitive arenas and the selector
//! - [`replay`]: pass-ordered replay of the collected lists through a backend
//! - [`render`]: a wgpu replay backend
//!
//! A frame truncates the store and resets the lists, traverses the scene
//! (append), then replays. The two phases never overlap.

pub mod coords;
pub mod device;
pub mod draw;
pub mod logging;
pub mod render;
pub mod replay;
pub mod vertex;

mod fatal;
