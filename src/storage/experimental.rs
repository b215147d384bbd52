use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tracing::warn;

/// Process-wide gate for the "experimental engine" warning.
///
/// Set exactly once by compare-and-swap, no matter how many stores are
/// opened or from how many threads.
pub(crate) static EXPERIMENTAL_ENGINE_NOTICE: ExperimentalNotice = ExperimentalNotice::new();

#[derive(Debug)]
pub(crate) struct ExperimentalNotice {
    emitted: AtomicBool,
}

impl ExperimentalNotice {
    pub(crate) const fn new() -> Self {
        Self {
            emitted: AtomicBool::new(false),
        }
    }

    /// Emits the warning for `engine` if no warning was emitted before.
    /// Returns `true` for the single call that emitted it.
    pub(crate) fn warn_once(
        &self,
        engine: &str,
    ) -> bool {
        if self
            .emitted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            warn!("{} support is experimental, DO NOT USE IN PRODUCTION", engine);
            return true;
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn is_emitted(&self) -> bool {
        self.emitted.load(Ordering::Acquire)
    }
}
