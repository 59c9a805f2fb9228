//! The shared view container
//!
//! Rendering itself lives outside this crate. The controller only needs to
//! wipe the container between pages, and pages need somewhere to put their
//! output, so the boundary is a small trait. [`MemoryView`] is the in-process
//! implementation used by the `opshell-nav` binary and by tests.

use std::sync::{Arc, Mutex};

/// Surface a page renders into
pub trait ViewContainer: Send + Sync {
    /// Append a rendered fragment
    fn render(&self, fragment: String);

    /// Remove everything the previous page rendered
    fn clear(&self);

    /// Current content, oldest fragment first
    fn snapshot(&self) -> Vec<String>;

    fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

/// Shared handle to a view container
pub type SharedView = Arc<dyn ViewContainer>;

/// View container that keeps fragments in memory
#[derive(Debug, Default)]
pub struct MemoryView {
    fragments: Mutex<Vec<String>>,
}

impl MemoryView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl ViewContainer for MemoryView {
    fn render(&self, fragment: String) {
        self.fragments
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(fragment);
    }

    fn clear(&self) {
        self.fragments
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    fn snapshot(&self) -> Vec<String> {
        self.fragments
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
