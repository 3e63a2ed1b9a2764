use std::collections::TryReserveError;

/// Aborts the frame after an allocation failure in frame-scoped storage.
///
/// Vertex and primitive storage have no degraded mode: a dropped primitive
/// would desynchronize replay from the visible scene.
#[cold]
#[inline(never)]
pub(crate) fn alloc_exhausted(what: &str, additional: usize, err: TryReserveError) -> ! {
    log::error!("{what}: failed to reserve {additional} more elements: {err}");
    panic!("{what} exhausted: {err}");
}
