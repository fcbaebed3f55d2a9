//! Thread-safe handle to a filter engine.

use crate::engine::FilterEngine;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle serializing access to one [`FilterEngine`].
///
/// Remove hooks run while the lock is held and must not use the handle.
#[derive(Debug, Clone, Default)]
pub struct SharedFilterEngine {
    inner: Arc<Mutex<FilterEngine>>,
}

impl SharedFilterEngine {
    pub fn new(engine: FilterEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut FilterEngine) -> R) -> R {
        let mut engine = self.inner.lock();
        f(&mut engine)
    }

    /// TQL of the active filters.
    pub fn to_tql(&self) -> String {
        self.inner.lock().to_tql()
    }
}

impl From<FilterEngine> for SharedFilterEngine {
    fn from(engine: FilterEngine) -> Self {
        Self::new(engine)
    }
}
