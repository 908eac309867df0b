//! Cooperative cancellation for a background training run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop flag.
///
/// The trainer polls it once per step and once per episode; a step in
/// progress always completes before the stop is honoured.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the run to stop.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Clears a previous request so the run can be resumed.
    pub fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let a = StopHandle::new();
        let b = a.clone();
        assert!(!b.is_stopped());
        a.stop();
        assert!(b.is_stopped());
        b.clear();
        assert!(!a.is_stopped());
    }

    #[test]
    fn visible_across_threads() {
        let handle = StopHandle::new();
        let remote = handle.clone();
        std::thread::spawn(move || remote.stop()).join().unwrap();
        assert!(handle.is_stopped());
    }
}
