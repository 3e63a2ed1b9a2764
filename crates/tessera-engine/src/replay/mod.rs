//! Render-list replay.
//!
//! A [`RenderPlan`] is an ordered list of [`DrawMode`]s. For each mode the
//! [`Replayer`] visits the non-empty lists of the mode's groups, binds each
//! list's state once through a [`ReplayBackend`], and draws its primitives.

mod backend;
mod counting;
mod mode;
mod replayer;
mod stats;

pub use backend::{LightPath, ListState, ReplayBackend};
pub use counting::{CountingBackend, ReplayEvent};
pub use mode::{DrawMode, RenderPlan, ReplayConfig};
pub use replayer::Replayer;
pub use stats::{FrameStats, PassStats};
