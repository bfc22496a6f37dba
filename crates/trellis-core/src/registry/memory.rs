use std::sync::Arc;

use parking_lot::RwLock;

use crate::model::Tests;

use super::TestRegistry;

/// Process-local registry backed by a lock-protected slot.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    slot: RwLock<Option<Arc<Tests>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestRegistry for InMemoryRegistry {
    fn get(&self) -> Option<Arc<Tests>> {
        self.slot.read().clone()
    }

    fn set(&self, tests: Arc<Tests>) {
        *self.slot.write() = Some(tests);
    }

    fn clear(&self) {
        *self.slot.write() = None;
    }
}
