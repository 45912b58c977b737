use crate::buffer::AncestryBuffer;
use crate::error::{FwdargError, Result};
use crate::samples::SampleSet;
use fwdarg_core::{
    simplify_tables, Edge, Node, NodeFlags, NodeId, SimplificationBuffers, SimplificationFlags,
    SimplificationOutput, TableCollection,
};
use fwdarg_prior::FounderAncestry;
use tracing::debug;

/// Row counts around one compaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompactionRecord {
    /// Generation at which the compaction ran.
    pub generation: u64,
    /// Node rows after merging the buffer.
    pub nodes_before: usize,
    /// Node rows after the reduction.
    pub nodes_after: usize,
    /// Edge rows after merging the buffer.
    pub edges_before: usize,
    /// Edge rows after the reduction.
    pub edges_after: usize,
}

// Maps ids assigned by the driver onto rows of the merged tables.
//
// Before the first compaction the driver numbers founders
// [0, num_founders) and everything later from num_founders on.
// The founder ancestry puts the founders at the same rows and
// adds its ancestors after them, so only later ids move.
#[derive(Clone, Copy, Debug)]
struct IdShift {
    threshold: NodeId,
    offset: usize,
}

impl IdShift {
    fn none() -> Self {
        Self {
            threshold: NodeId::MAX,
            offset: 0,
        }
    }

    fn apply(&self, id: NodeId) -> Result<NodeId> {
        if id < self.threshold || self.offset == 0 {
            Ok(id)
        } else {
            id.checked_add(self.offset).ok_or(FwdargError::IdOverflow {
                id,
                delta: self.offset,
            })
        }
    }
}

/// Owns the global ancestry tables and compacts them.
///
/// A compaction merges an [`AncestryBuffer`] into the tables,
/// then reduces the tables to the ancestry of the current
/// generation plus the retained ancestral samples.
///
/// The founder ancestry is generated by `P` when the first
/// compaction happens.
pub struct Compactor<P: FounderAncestry> {
    tables: TableCollection,
    interval: u64,
    num_founders: usize,
    last_compaction: Option<u64>,
    prior: P,
    samples: SampleSet,
    state: SimplificationBuffers,
    output: SimplificationOutput,
    records: Vec<CompactionRecord>,
}

impl<P: FounderAncestry> Compactor<P> {
    /// Create a new instance.
    ///
    /// # Parameters
    ///
    /// * `num_founders`: number of founder chromosomes, `2N`.
    /// * `interval`: generations between compactions.
    ///   Zero disables [`Compactor::maybe_compact`].
    /// * `prior`: generates the founder ancestry.
    pub fn new(num_founders: usize, interval: u64, prior: P) -> Result<Self> {
        Ok(Self {
            tables: TableCollection::new(1.0)?,
            interval,
            num_founders,
            last_compaction: None,
            prior,
            samples: SampleSet::new(),
            state: SimplificationBuffers::new(),
            output: SimplificationOutput::new(),
            records: vec![],
        })
    }

    /// `true` if [`Compactor::maybe_compact`] would compact
    /// at `generation`.
    ///
    /// Compaction happens when `generation > 0` and either
    /// `generation == 1` or `generation` is a multiple of the
    /// interval. An interval of zero never compacts.
    pub fn should_compact(&self, generation: u64) -> bool {
        self.interval > 0 && generation > 0 && (generation == 1 || generation % self.interval == 0)
    }

    /// Compact if [`Compactor::should_compact`].
    ///
    /// # Returns
    ///
    /// * `Some(next_id)` after a compaction, where `next_id` is the
    ///   number of node rows and the next id to assign.
    /// * `None` if nothing happened.
    ///
    /// The buffer is not cleared here.
    /// See [`AncestryBuffer::post_compaction_cleanup`].
    pub fn maybe_compact(
        &mut self,
        generation: u64,
        buffer: &mut AncestryBuffer,
    ) -> Result<Option<NodeId>> {
        if self.should_compact(generation) {
            Ok(Some(self.compact(generation, buffer)?))
        } else {
            Ok(None)
        }
    }

    /// Merge `buffer` into the tables and reduce them.
    ///
    /// The buffer must hold the nodes created since the last
    /// compaction, numbered consecutively from the row count the
    /// last compaction returned (or from `2N` before the first).
    /// Its newest nodes must have been born at `generation`.
    ///
    /// On success the ancestral samples in `buffer` are replaced
    /// by their new ids.
    ///
    /// # Returns
    ///
    /// The number of node rows, which is the next id to assign.
    ///
    /// # Errors
    ///
    /// * [`FwdargError::BufferedChildOutOfRange`] or
    ///   [`FwdargError::BufferedParentOutOfRange`] if buffered edges
    ///   do not match buffered nodes. Nothing is modified.
    /// * [`FwdargError::AncestralSampleLost`] if an ancestral
    ///   sample did not survive.
    /// * [`FwdargError::IdOverflow`] if shifted ids do not fit.
    /// * Errors from the founder ancestry or from the reduction.
    pub fn compact(&mut self, generation: u64, buffer: &mut AncestryBuffer) -> Result<NodeId> {
        let first_compaction = self.last_compaction.is_none();
        let first_buffered = if first_compaction {
            NodeId::try_from(self.num_founders)?
        } else {
            NodeId::try_from(self.tables.num_nodes())?
        };
        self.validate_buffer(first_buffered, buffer)?;

        // Age existing nodes, or seed the founder ancestry
        let shift = if first_compaction {
            self.tables = self.prior.generate(self.num_founders)?;
            self.tables.shift_node_times(generation as f64)?;
            let offset = self.tables.num_nodes().saturating_sub(self.num_founders);
            IdShift {
                threshold: first_buffered,
                offset,
            }
        } else {
            let last = self.last_compaction.unwrap_or(0);
            self.tables
                .shift_node_times(generation.saturating_sub(last) as f64)?;
            IdShift::none()
        };

        // Merge
        buffer.rebase_time();
        let nodes = buffer
            .nodes()
            .iter()
            .map(|n| Node {
                flags: n.flags | NodeFlags::IS_SAMPLE.bits(),
                ..*n
            })
            .collect::<Vec<_>>();
        self.tables.append_nodes(&nodes)?;
        let edges = buffer
            .edges()
            .iter()
            .map(|e| {
                Ok(Edge {
                    parent: shift.apply(e.parent)?,
                    child: shift.apply(e.child)?,
                    ..*e
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.tables.append_edges(&edges)?;
        self.tables.sort_edges();

        let nodes_before = self.tables.num_nodes();
        let edges_before = self.tables.num_edges();

        // Samples
        let ancestral = buffer
            .ancestral_samples()
            .iter()
            .map(|&id| shift.apply(id))
            .collect::<Result<Vec<_>>>()?;
        let current = buffer
            .current_samples()
            .iter()
            .map(|&id| shift.apply(id))
            .collect::<Result<Vec<_>>>()?;
        self.samples
            .rebuild_from_union(ancestral.iter().copied(), current);

        let flags = if cfg!(debug_assertions) {
            SimplificationFlags::VALIDATE_EDGES
        } else {
            SimplificationFlags::empty()
        };
        simplify_tables(
            self.samples.as_slice(),
            flags,
            &mut self.state,
            &mut self.tables,
            &mut self.output,
        )?;

        // Remap ancestral samples
        let mut remapped = Vec::with_capacity(ancestral.len());
        for (&original, &shifted) in buffer.ancestral_samples().iter().zip(ancestral.iter()) {
            match self.output.remap(shifted) {
                Some(id) => remapped.push(id),
                None => return Err(FwdargError::AncestralSampleLost { id: original }),
            }
        }
        buffer.set_ancestral_samples(remapped);

        self.last_compaction = Some(generation);
        let record = CompactionRecord {
            generation,
            nodes_before,
            nodes_after: self.tables.num_nodes(),
            edges_before,
            edges_after: self.tables.num_edges(),
        };
        debug!(
            generation,
            nodes_before = record.nodes_before,
            nodes_after = record.nodes_after,
            edges_before = record.edges_before,
            edges_after = record.edges_after,
            samples = self.samples.len(),
            "compacted ancestry"
        );
        self.records.push(record);

        Ok(NodeId::try_from(self.tables.num_nodes())?)
    }

    fn validate_buffer(&self, first: NodeId, buffer: &AncestryBuffer) -> Result<()> {
        let last = first
            .checked_add(buffer.nodes().len())
            .ok_or(FwdargError::IdOverflow {
                id: first,
                delta: buffer.nodes().len(),
            })?;
        for e in buffer.edges() {
            if e.child.is_null() || e.child < first || e.child >= last {
                return Err(FwdargError::BufferedChildOutOfRange {
                    child: e.child,
                    first,
                    last,
                });
            }
            if e.parent.is_null() || e.parent >= last {
                return Err(FwdargError::BufferedParentOutOfRange {
                    parent: e.parent,
                    last,
                });
            }
        }
        Ok(())
    }

    /// The global tables.
    pub fn tables(&self) -> &TableCollection {
        &self.tables
    }

    /// Consume `self`, returning the global tables.
    pub fn into_tables(self) -> TableCollection {
        self.tables
    }

    /// Generations between compactions.
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Generation of the most recent compaction, if any.
    pub fn last_compaction_generation(&self) -> Option<u64> {
        self.last_compaction
    }

    /// Record of the most recent compaction, if any.
    pub fn last_compaction(&self) -> Option<&CompactionRecord> {
        self.records.last()
    }

    /// Records of every compaction so far.
    pub fn compaction_records(&self) -> &[CompactionRecord] {
        &self.records
    }
}
