use fwdarg_core::{Edge, EdgeTable, Node, NodeId, NodeTable, Time};

/// Ancestry recorded since the last compaction.
///
/// Nodes hold forward time (their birth generation) until
/// [`AncestryBuffer::rebase_time`] converts them.
/// Node and edge rows are flushed by every compaction.
/// The sample sets are not: the current samples are replaced on
/// every [`AncestryBuffer::append`], and the ancestral samples
/// accumulate for the whole run.
#[derive(Clone, Debug, Default)]
pub struct AncestryBuffer {
    nodes: NodeTable,
    edges: EdgeTable,
    current_samples: Vec<NodeId>,
    ancestral_samples: Vec<NodeId>,
}

impl AncestryBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one generation.
    ///
    /// `nodes` and `edges` are appended to the buffered rows,
    /// `current_samples` replaces the stored current samples,
    /// and `new_ancestral_samples` is appended to the stored
    /// ancestral samples.
    pub fn append(
        &mut self,
        nodes: &[Node],
        edges: &[Edge],
        current_samples: &[NodeId],
        new_ancestral_samples: &[NodeId],
    ) {
        self.nodes.extend_from_slice(nodes);
        self.edges.extend_from_slice(edges);
        self.current_samples.clear();
        self.current_samples.extend_from_slice(current_samples);
        self.ancestral_samples
            .extend_from_slice(new_ancestral_samples);
    }

    /// Convert buffered node times from forward to backward time.
    ///
    /// Each time becomes `max - time`, where `max` is the largest
    /// buffered time, so the youngest nodes end up at zero.
    /// Apply exactly once per flush.
    pub fn rebase_time(&mut self) {
        let max = self
            .nodes
            .iter()
            .map(|n| n.time)
            .fold(None, |acc: Option<Time>, t| match acc {
                Some(m) if m >= t => Some(m),
                _ => Some(t),
            });
        if let Some(max) = max {
            for n in self.nodes.iter_mut() {
                n.time = max - n.time;
            }
        }
    }

    /// Remove buffered nodes and edges.
    ///
    /// The sample sets are kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    /// Clear the buffer if a compaction just happened.
    pub fn post_compaction_cleanup(&mut self, did_compact: bool) {
        if did_compact {
            self.clear();
        }
    }

    /// `true` if no nodes are buffered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Buffered nodes
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Buffered edges
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Ids of the most recently appended generation.
    pub fn current_samples(&self) -> &[NodeId] {
        &self.current_samples
    }

    /// Ids of every retained ancestral sample.
    pub fn ancestral_samples(&self) -> &[NodeId] {
        &self.ancestral_samples
    }

    pub(crate) fn set_ancestral_samples(&mut self, samples: Vec<NodeId>) {
        self.ancestral_samples = samples;
    }
}
