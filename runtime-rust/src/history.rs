use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use kanon_validator::base::Transformation;
use kanon_validator::config::HistoryConfig;

use crate::groupify::HashGroupify;

/// Bounded cache of equivalence classes of checked nodes, oldest evicted first.
///
/// Snapshots are immutable once stored, and shared with the checks deriving from them.
#[derive(Debug)]
pub struct History {
    snapshots: RwLock<VecDeque<(Transformation, Arc<HashGroupify>)>>,
    size: usize,
    /// Largest number of classes of a stored snapshot.
    max_classes: usize,
}

impl History {
    pub fn new(config: &HistoryConfig, rows: usize) -> Self {
        History {
            snapshots: RwLock::new(VecDeque::with_capacity(config.size)),
            size: config.size,
            max_classes: (config.snapshot_ratio * rows as f64).floor() as usize,
        }
    }

    /// Store the classes of a node, unless there are too many of them to pay off.
    pub fn store(&self, transformation: &Transformation, groupify: &HashGroupify) -> bool {
        if self.size == 0 || groupify.len() > self.max_classes {
            return false;
        }
        let mut snapshots = self.snapshots.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if snapshots.iter().any(|(stored, _)| stored == transformation) {
            return false;
        }
        if snapshots.len() == self.size {
            snapshots.pop_front();
        }
        snapshots.push_back((transformation.clone(), Arc::new(groupify.clone())));
        true
    }

    /// The smallest snapshot of a node the transformation generalizes.
    pub fn lookup(&self, transformation: &Transformation) -> Option<(Transformation, Arc<HashGroupify>)> {
        let snapshots = self.snapshots.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        snapshots.iter()
            .filter(|(stored, _)| transformation.is_generalization_of(stored))
            .min_by_key(|(_, snapshot)| snapshot.len())
            .map(|(stored, snapshot)| (stored.clone(), Arc::clone(snapshot)))
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
