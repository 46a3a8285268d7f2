//! Shared handle to the currently published record.

use std::sync::Arc;

use arc_swap::ArcSwap;

/// A record that can be replaced atomically while readers hold earlier snapshots.
///
/// Clones share the same slot. Readers never observe a partially resolved record: a
/// reload resolves into a private copy and publishes it with a single swap.
pub struct Live<T> {
    slot: Arc<ArcSwap<T>>,
}

impl<T> Live<T> {
    pub fn new(value: T) -> Self {
        Self {
            slot: Arc::new(ArcSwap::from_pointee(value)),
        }
    }

    /// Snapshot of the current record.
    pub fn load(&self) -> Arc<T> {
        self.slot.load_full()
    }

    /// Publish `value`, replacing the current record for all future loads.
    pub fn store(&self, value: Arc<T>) {
        self.slot.store(value);
    }
}

impl<T> Clone for Live<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Live<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Live").field(&self.load()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshots_survive_swaps() {
        let live = Live::new(String::from("v1"));
        let reader = live.clone();
        let before = reader.load();

        live.store(Arc::new(String::from("v2")));
        assert_eq!(*before, "v1");
        assert_eq!(*reader.load(), "v2");
    }
}
