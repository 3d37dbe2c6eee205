use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Walk progress handed to a yield hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
}

/// Called every few nodes during a walk. Returning `Break` cancels the import; this is the
/// only point where cancellation is observed.
pub trait YieldHook {
    fn on_yield(&mut self, progress: Progress) -> ControlFlow<()>;
}

impl<F> YieldHook for F
where
    F: FnMut(Progress) -> ControlFlow<()>,
{
    fn on_yield(&mut self, progress: Progress) -> ControlFlow<()> {
        self(progress)
    }
}

/// Never yields, never cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoYield;

impl YieldHook for NoYield {
    fn on_yield(&mut self, _progress: Progress) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Shared cancellation flag. As a hook it gives up the thread's time slice and stops the
/// walk once cancelled.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl YieldHook for CancelToken {
    fn on_yield(&mut self, progress: Progress) -> ControlFlow<()> {
        std::thread::yield_now();
        if self.is_cancelled() {
            tracing::info!(processed = progress.processed, "import cancelled");
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/materialize/pacing.rs"]
mod tests;
