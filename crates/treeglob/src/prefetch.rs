use std::sync::Arc;

use parking_lot::Mutex;
use treeglob_store::ObjectId;

/// Collects the content ids of files matched during an evaluation.
///
/// Clones share the same underlying list, so a list can be handed to several
/// concurrent evaluations and drained once they all complete.
#[derive(Debug, Clone, Default)]
pub struct PrefetchList {
    ids: Arc<Mutex<Vec<ObjectId>>>,
}

impl PrefetchList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an id.
    pub fn push(&self, id: ObjectId) {
        self.ids.lock().push(id);
    }

    /// The number of collected ids, duplicates included.
    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    /// Returns true if nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.ids.lock().is_empty()
    }

    /// Takes all collected ids, leaving the list empty.
    pub fn drain(&self) -> Vec<ObjectId> {
        std::mem::take(&mut *self.ids.lock())
    }
}
