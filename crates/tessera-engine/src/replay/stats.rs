use core::fmt;

use smallvec::SmallVec;

use super::DrawMode;

/// Counters for one replayed pass.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PassStats {
    pub mode: DrawMode,
    pub lists_bound: usize,
    /// Non-empty lists the mode had nothing to draw for.
    pub lists_skipped: usize,
    pub primitives: usize,
    pub indices: usize,
    pub blend_changes: usize,
    pub light_path_changes: usize,
}

impl PassStats {
    pub fn new(mode: DrawMode) -> Self {
        Self {
            mode,
            lists_bound: 0,
            lists_skipped: 0,
            primitives: 0,
            indices: 0,
            blend_changes: 0,
            light_path_changes: 0,
        }
    }

    /// State transitions issued: list binds plus toggles.
    pub fn state_changes(&self) -> usize {
        self.lists_bound + self.blend_changes + self.light_path_changes
    }
}

/// Counters for a whole frame, one entry per pass in plan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub passes: SmallVec<[PassStats; 8]>,
}

impl FrameStats {
    pub fn pass(&self, mode: DrawMode) -> Option<&PassStats> {
        self.passes.iter().find(|p| p.mode == mode)
    }

    pub fn lists_bound(&self) -> usize {
        self.passes.iter().map(|p| p.lists_bound).sum()
    }

    pub fn primitives(&self) -> usize {
        self.passes.iter().map(|p| p.primitives).sum()
    }

    pub fn indices(&self) -> usize {
        self.passes.iter().map(|p| p.indices).sum()
    }

    pub fn state_changes(&self) -> usize {
        self.passes.iter().map(PassStats::state_changes).sum()
    }
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lists, {} primitives, {} indices, {} state changes",
            self.lists_bound(),
            self.primitives(),
            self.indices(),
            self.state_changes()
        )?;
        for p in &self.passes {
            if p.primitives > 0 {
                write!(f, "; {}: {}/{}", p.mode, p.lists_bound, p.primitives)?;
            }
        }
        Ok(())
    }
}
