//! Runtime graph statistics shared between the driver and tasklets.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Node counts and the muted-vertex set.
///
/// Muted vertices stay scheduled but skip evaluation and emit the empty
/// unit until unmuted. The set may be changed between ticks by an operator.
#[derive(Debug, Default)]
pub struct GraphStats {
    node_count: AtomicUsize,
    muted: RwLock<HashSet<String>>,
}

impl GraphStats {
    /// Create empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_node_count(&self, count: usize) {
        self.node_count.store(count, Ordering::Relaxed);
    }

    /// Total number of vertices in the graph.
    pub fn node_count(&self) -> usize {
        self.node_count.load(Ordering::Relaxed)
    }

    /// Mute a vertex by name.
    pub fn mute(&self, vertex: impl Into<String>) {
        self.muted.write().insert(vertex.into());
    }

    /// Unmute a vertex.
    pub fn unmute(&self, vertex: &str) {
        self.muted.write().remove(vertex);
    }

    /// Whether a vertex is currently muted.
    pub fn is_muted(&self, vertex: &str) -> bool {
        self.muted.read().contains(vertex)
    }

    /// Number of muted vertices.
    pub fn muted_count(&self) -> usize {
        self.muted.read().len()
    }

    /// Names of the muted vertices, sorted.
    pub fn muted(&self) -> Vec<String> {
        let mut names: Vec<String> = self.muted.read().iter().cloned().collect();
        names.sort();
        names
    }
}
