mod memory;

pub use memory::InMemoryRegistry;

use std::sync::Arc;

use crate::model::Tests;

/// Slot holding the last successfully discovered inventory.
///
/// The manager publishes into it after each discovery and clears it when
/// discovery fails; the selector reads from it. Readers must cope with an
/// empty slot.
pub trait TestRegistry: Send + Sync {
    /// Returns the published inventory, if any.
    fn get(&self) -> Option<Arc<Tests>>;

    /// Replaces the published inventory.
    fn set(&self, tests: Arc<Tests>);

    /// Removes the published inventory.
    fn clear(&self);
}
