use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Set-once done flag shared between a running action (tween, track move,
/// clip sequence) and whoever is waiting on it. The frame loop is
/// single-threaded and cooperative; the atomic only buys `Send` handles.
#[derive(Clone, Debug, Default)]
pub struct Completion {
    flag: Arc<AtomicBool>,
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that is already resolved, for actions that finish inline.
    pub fn resolved() -> Self {
        let signal = Self::new();
        signal.finish();
        signal
    }

    pub fn finish(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_done(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
