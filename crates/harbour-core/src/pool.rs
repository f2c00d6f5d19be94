//! Pool of containers waiting for their scheduled arrival.
//!
//! The pool is filled once from the manifest and drained as simulated time
//! passes. A container leaves the pool exactly once, when
//! [`ContainerPool::extract_due`] hands it to the distribution engine.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::NaiveDateTime;
use harbour_types::{Container, ContainerId};
use tracing::warn;

/// Pending containers keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ContainerPool {
    containers: BTreeMap<ContainerId, Container>,
}

impl ContainerPool {
    /// Create an empty pool.
    pub const fn new() -> Self {
        Self {
            containers: BTreeMap::new(),
        }
    }

    /// Merge a batch into the pool and return how many were added.
    ///
    /// A container whose id is already pooled is skipped with a warning;
    /// the first occurrence wins.
    pub fn add_all(&mut self, batch: impl IntoIterator<Item = Container>) -> usize {
        let mut added: usize = 0;
        for container in batch {
            match self.containers.entry(container.id().clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(container);
                    added = added.saturating_add(1);
                }
                Entry::Occupied(existing) => {
                    warn!(container_id = %existing.key(), "Duplicate container id, keeping first");
                }
            }
        }
        added
    }

    /// Remove and return every container scheduled strictly before `now`.
    ///
    /// The pool is partitioned in a single pass and its backing map
    /// replaced by the remainder. The returned batch is sorted by
    /// arrival, then id.
    pub fn extract_due(&mut self, now: NaiveDateTime) -> Vec<Container> {
        let (mut due, remaining): (Vec<Container>, BTreeMap<ContainerId, Container>) =
            std::mem::take(&mut self.containers)
                .into_values()
                .fold((Vec::new(), BTreeMap::new()), |(mut due, mut remaining), container| {
                    if container.is_due(now) {
                        due.push(container);
                    } else {
                        remaining.insert(container.id().clone(), container);
                    }
                    (due, remaining)
                });
        self.containers = remaining;

        due.sort_by(|a, b| a.arrival().cmp(&b.arrival()).then_with(|| a.id().cmp(b.id())));
        due
    }

    /// Number of pending containers.
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Whether no containers are pending.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Whether a container with this id is pending.
    pub fn contains(&self, id: &ContainerId) -> bool {
        self.containers.contains_key(id)
    }

    /// Earliest scheduled arrival among pending containers.
    pub fn next_arrival(&self) -> Option<NaiveDateTime> {
        self.containers.values().map(Container::arrival).min()
    }
}
